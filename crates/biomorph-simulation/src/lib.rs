//! Segment data and contact reactions for Biomorph
//!
//! This crate provides the foundational data types shared by the organism
//! and world crates:
//! - Segment types and their registry (SegmentType, SegmentDef, SegmentTypes)
//! - Reaction categories used by per-gene reaction codes (ReactionCategory)
//! - Organism trait and state bits (OrganismFlags)
//! - The contact reaction table (ReactionRule, Effect, ReactionRegistry)

mod flags;
mod reactions;
mod segments;

pub use flags::OrganismFlags;
pub use reactions::{
    Drain, Effect, ReactionConfig, ReactionRegistry, ReactionRule, ReactionTable,
    ReactionTableError, Recolor, Shield,
};
pub use segments::{ReactionCategory, SegmentDef, SegmentType, SegmentTypes};
