pub mod config;
pub mod world;

pub use config::WorldConfig;
pub use world::{Atmosphere, OccupancyIndex, PopulationStats, World};

// Re-export the organism model for downstream users
pub mod organism {
    pub use biomorph_organism::*;
}
