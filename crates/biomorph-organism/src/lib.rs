//! Evolving multi-segment organisms for Biomorph
//!
//! This crate implements:
//! - Genetic codes with per-field mutation and bounded structural edits
//! - Symmetric body plan generation with derived mass and inertia
//! - Rigid-body movement, segment collision and impulse exchange
//! - Contact resolution (predation, infection, healing, freezing, pushing)
//! - World access traits for occupancy, atmosphere and id issuance

#![allow(clippy::module_inception)]

pub mod config;
pub mod contact;
pub mod genome;
pub mod morphology;
pub mod organism;
pub mod physics;
pub mod rng_trait;
pub mod traits;
pub mod types;

// Re-export main types for convenience
pub use config::{LifeConfig, OrganismConfig, SimContext};
pub use contact::{Relation, TouchReport};
pub use genome::{Gene, GeneticCode, MutationConfig, ReactionCode};
pub use morphology::{BodyPlan, BodySegment};
pub use organism::{LifeOutcome, MoveOutcome, Organism};
pub use physics::{Contact, Motion, PhysicsConfig};
pub use rng_trait::SimRng;
pub use traits::{AtmosphereAccess, WorldAccess, WorldMutAccess};
pub use types::{CorridorId, OrganismId, Rect};
