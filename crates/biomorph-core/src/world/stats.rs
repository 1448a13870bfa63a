//! Population statistics collected by the world stepper

use serde::{Deserialize, Serialize};
use std::fmt;

/// Running counters for one world.
///
/// `population` counts living organisms; corpses still in the arena are
/// not part of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationStats {
    pub population: usize,
    pub peak_population: usize,
    pub founders: u64,
    pub births: u64,
    pub deaths: u64,
    pub kills: u64,
    pub infections: u64,
    pub migrations: u64,
}

impl PopulationStats {
    /// A founder was placed into the world
    pub fn record_founder(&mut self) {
        self.founders += 1;
        self.grow();
    }

    pub fn record_birth(&mut self) {
        self.births += 1;
        self.grow();
    }

    pub fn record_death(&mut self) {
        self.deaths += 1;
        self.population = self.population.saturating_sub(1);
    }

    pub fn record_kill(&mut self) {
        self.kills += 1;
    }

    pub fn record_infection(&mut self) {
        self.infections += 1;
    }

    /// A living organism left through a corridor
    pub fn record_migration(&mut self) {
        self.migrations += 1;
        self.population = self.population.saturating_sub(1);
    }

    pub fn is_extinct(&self) -> bool {
        self.population == 0
    }

    fn grow(&mut self) {
        self.population += 1;
        self.peak_population = self.peak_population.max(self.population);
    }
}

impl fmt::Display for PopulationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "population {} (peak {}), births {}, deaths {}, kills {}, infections {}, migrations {}",
            self.population,
            self.peak_population,
            self.births,
            self.deaths,
            self.kills,
            self.infections,
            self.migrations
        )
    }
}
