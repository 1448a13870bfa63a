//! Organism flag bits
//!
//! Genetic behavior traits occupy the low 16 bits and are copied or mutated
//! on reproduction. Transient state bits sit above them and are owned by the
//! living organism. Reaction rules match against the union of both.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct OrganismFlags: u32 {
        // Genetic traits
        /// Plague variant: white segments also drain their victims
        const PLAGUE = 1 << 0;
        /// Children are placed further away and pushed off
        const DISPERSE_CHILDREN = 1 << 1;
        /// Parent and child fight each other
        const GENERATION_BATTLE = 1 << 2;
        /// Siblings fight each other
        const SIBLING_BATTLE = 1 << 3;
        /// Befriends organisms sharing its kin signature
        const ALTRUIST = 1 << 4;
        /// Befriends its whole lineage regardless of battle traits
        const FAMILIAL = 1 << 5;
        /// Befriends social organisms sharing its kin signature
        const SOCIAL = 1 << 6;
        /// Befriends other peaceful organisms
        const PEACEFUL = 1 << 7;
        /// Never starts hostile reactions
        const PASSIVE = 1 << 8;
        /// Self-propulsion spins clockwise
        const CLOCKWISE = 1 << 9;
        /// Kin signature matches any other mimic
        const MIMIC_ALL = 1 << 10;
        /// Pink segments also feed on living organisms
        const MODIFIES_PINK = 1 << 11;
        /// Cream segments also feed on plants
        const MODIFIES_CREAM = 1 << 12;
        /// Lilac segments push what they touch
        const MODIFIES_LILAC = 1 << 13;
        /// Never shares energy
        const SELFISH = 1 << 14;

        // Runtime state
        /// Carries a foreign genetic code
        const INFECTED = 1 << 16;
        /// Movement and photosynthesis segments are frozen
        const FROZEN = 1 << 17;
        /// The next hostile contact against it is deflected
        const DODGING = 1 << 18;
        /// Dead and decaying
        const DEAD = 1 << 19;
    }
}

impl OrganismFlags {
    /// Every heritable trait bit
    pub const GENETIC: OrganismFlags = OrganismFlags::PLAGUE
        .union(OrganismFlags::DISPERSE_CHILDREN)
        .union(OrganismFlags::GENERATION_BATTLE)
        .union(OrganismFlags::SIBLING_BATTLE)
        .union(OrganismFlags::ALTRUIST)
        .union(OrganismFlags::FAMILIAL)
        .union(OrganismFlags::SOCIAL)
        .union(OrganismFlags::PEACEFUL)
        .union(OrganismFlags::PASSIVE)
        .union(OrganismFlags::CLOCKWISE)
        .union(OrganismFlags::MIMIC_ALL)
        .union(OrganismFlags::MODIFIES_PINK)
        .union(OrganismFlags::MODIFIES_CREAM)
        .union(OrganismFlags::MODIFIES_LILAC)
        .union(OrganismFlags::SELFISH);

    /// Heritable traits one at a time, in mutation order
    pub fn genetic_traits() -> impl Iterator<Item = OrganismFlags> {
        OrganismFlags::GENETIC.iter()
    }
}
