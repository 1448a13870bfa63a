//! Tunable organism parameters

use crate::genome::MutationConfig;
use crate::physics::PhysicsConfig;
use biomorph_simulation::{ReactionConfig, ReactionRegistry, SegmentTypes};
use serde::{Deserialize, Serialize};

/// Energy budget and lifecycle parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifeConfig {
    /// Energy a newborn starts with
    pub initial_energy: f64,
    /// Ticks per unit of age
    pub ticks_per_age_unit: u32,
    /// Mass divided by this is paid every tick to stay alive
    pub segment_cost_divisor: f64,
    /// Photosynthetic weight divided by this is requested every tick
    pub green_obtained_energy_divisor: f64,
    /// Atmospheric CO2 divided by this caps one photosynthesis draw
    pub drain_subs_divisor: f64,
    /// Energy a corpse loses every tick
    pub decay_energy: f64,
    /// Ticks between growth stage checks
    pub growth_interval: u32,
    /// Placement attempts for a newborn
    pub placement_attempts: u32,
    /// Launch speed of a dispersed child
    pub disperse_speed: f64,
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self {
            initial_energy: 40.0,
            ticks_per_age_unit: 256,
            segment_cost_divisor: 5000.0,
            green_obtained_energy_divisor: 500.0,
            drain_subs_divisor: 5000.0,
            decay_energy: 0.1,
            growth_interval: 8,
            placement_attempts: 4,
            disperse_speed: 1.0,
        }
    }
}

/// Everything an organism needs to know about the rules of the world
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganismConfig {
    pub mutation: MutationConfig,
    pub life: LifeConfig,
    pub physics: PhysicsConfig,
    pub reactions: ReactionConfig,
}

/// Borrowed rule set threaded through every organism operation
#[derive(Clone, Copy)]
pub struct SimContext<'a> {
    pub types: &'a SegmentTypes,
    pub reactions: &'a ReactionRegistry,
    pub config: &'a OrganismConfig,
}

impl<'a> SimContext<'a> {
    pub fn new(
        types: &'a SegmentTypes,
        reactions: &'a ReactionRegistry,
        config: &'a OrganismConfig,
    ) -> Self {
        Self {
            types,
            reactions,
            config,
        }
    }

    /// Energy below this counts as none
    pub fn tolerance(&self) -> f64 {
        self.config.physics.tolerance
    }
}
