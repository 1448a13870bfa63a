//! Headless run loop with periodic statistics

use anyhow::{Context, Result};
use biomorph_core::{Atmosphere, PopulationStats, World};
use std::fs;

use crate::config::AppConfig;

/// Final state of a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub extinct: bool,
    pub stats: PopulationStats,
    pub atmosphere: Atmosphere,
}

/// Owns the world for one run
pub struct Runner {
    world: World,
    ticks: u64,
    report_every: u64,
}

impl Runner {
    /// Build an unpopulated world from `config`, applying the configured
    /// reaction table file if there is one
    pub fn new(config: &AppConfig) -> Result<Self> {
        let mut world = World::new(
            config.world.clone(),
            config.organism_config(),
            config.run.seed,
        );

        if let Some(path) = &config.run.reaction_table {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read reaction table {}", path.display()))?;
            world
                .reactions_mut()
                .extend_from_ron(&text)
                .with_context(|| format!("Failed to load reaction table {}", path.display()))?;
            log::info!(
                "Loaded reaction table {} ({} rules in effect)",
                path.display(),
                world.reactions().len()
            );
        }

        Ok(Self {
            world,
            ticks: config.run.ticks,
            report_every: config.run.report_every,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Reaction table currently in effect, as RON
    pub fn reaction_table_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(
            &self.world.reactions().to_table(),
            ron::ser::PrettyConfig::default(),
        )
        .context("Failed to serialize reaction table")
    }

    /// Place the founders and step until the tick budget is spent or the
    /// population dies out
    pub fn run(&mut self) -> RunSummary {
        if self.world.is_empty() {
            self.world.populate();
        }

        while self.world.tick() < self.ticks && !self.world.is_extinct() {
            self.world.step();
            let tick = self.world.tick();
            if self.report_every > 0 && tick % self.report_every == 0 {
                self.report();
            }
        }

        if self.world.is_extinct() {
            log::info!("Simulation ended: extinction at tick {}", self.world.tick());
        }
        self.summary()
    }

    /// Log one statistics line
    pub fn report(&self) {
        let atmosphere = self.world.atmosphere();
        log::info!(
            "tick {}: {}, O2 {:.1}, CO2 {:.1}",
            self.world.tick(),
            self.world.stats(),
            atmosphere.o2,
            atmosphere.co2
        );
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            ticks: self.world.tick(),
            extinct: self.world.is_extinct(),
            stats: self.world.stats().clone(),
            atmosphere: *self.world.atmosphere(),
        }
    }
}
