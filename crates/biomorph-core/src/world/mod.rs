//! World management - organism arena, atmosphere and the tick stepper

mod atmosphere;
mod occupancy;
pub mod stats;
#[allow(clippy::module_inception)]
mod world;

pub use atmosphere::Atmosphere;
pub use occupancy::OccupancyIndex;
pub use stats::PopulationStats;
pub use world::World;
