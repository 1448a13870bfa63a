//! World geometry and population settings

use biomorph_organism::Rect;
use serde::{Deserialize, Serialize};

/// Shape of the world and how it is seeded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f64,
    pub height: f64,
    /// Random founders placed by `World::populate`
    pub initial_organisms: usize,
    pub initial_o2: f64,
    pub initial_co2: f64,
    /// Living organisms above which nobody reproduces
    pub max_population: usize,
    /// Placement tries per founder
    pub spawn_attempts: u32,
    /// Rectangles through which organisms leave the world
    pub corridors: Vec<Rect>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 3000.0,
            height: 3000.0,
            initial_organisms: 100,
            initial_o2: 0.0,
            initial_co2: 100_000.0,
            max_population: 5000,
            spawn_attempts: 32,
            corridors: Vec::new(),
        }
    }
}

impl WorldConfig {
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width.max(0.0), self.height.max(0.0))
    }
}
