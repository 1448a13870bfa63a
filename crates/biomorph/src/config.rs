//! Simulator configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. `biomorph.ron` file (if exists), or the file given on the command line
//! 3. Environment variables prefixed with `BIOMORPH_`
//!
//! Example environment variable: `BIOMORPH_PHYSICS__ELASTICITY=1.0`

use anyhow::{Context, Result};
use biomorph_core::WorldConfig;
use biomorph_organism::{LifeConfig, MutationConfig, OrganismConfig, PhysicsConfig};
use biomorph_simulation::ReactionConfig;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main simulator configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub world: WorldConfig,

    #[serde(default)]
    pub mutation: MutationConfig,

    #[serde(default)]
    pub life: LifeConfig,

    #[serde(default)]
    pub physics: PhysicsConfig,

    #[serde(default)]
    pub reactions: ReactionConfig,

    #[serde(default)]
    pub run: RunConfig,
}

/// Run loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Seed of the single random stream driving the whole run
    pub seed: u64,
    /// Ticks to simulate (the run stops earlier on extinction)
    pub ticks: u64,
    /// Ticks between statistics lines; 0 disables them
    pub report_every: u64,
    /// RON reaction table applied over the built-in rules
    #[serde(default)]
    pub reaction_table: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            ticks: 10_000,
            report_every: 500,
            reaction_table: None,
        }
    }
}

impl AppConfig {
    /// Load configuration with layered priority:
    /// 1. Compiled defaults (lowest priority)
    /// 2. `path`, or `biomorph.ron` if it exists
    /// 3. Environment variables prefixed with `BIOMORPH_` (highest priority)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Ron).required(true),
            None => File::with_name("biomorph")
                .format(FileFormat::Ron)
                .required(false),
        };

        let builder = Config::builder()
            // Layer 1: Compiled defaults (simulation sections use their serde defaults)
            .set_default("run.seed", 1_i64)?
            .set_default("run.ticks", 10_000_i64)?
            .set_default("run.report_every", 500_i64)?
            // Layer 2: Config file
            .add_source(file)
            // Layer 3: Environment variables (BIOMORPH_PHYSICS__ELASTICITY, etc.)
            .add_source(
                Environment::with_prefix("BIOMORPH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Rules every organism is simulated under
    pub fn organism_config(&self) -> OrganismConfig {
        OrganismConfig {
            mutation: self.mutation.clone(),
            life: self.life.clone(),
            physics: self.physics.clone(),
            reactions: self.reactions.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.world.width, 3000.0);
        assert_eq!(config.world.initial_co2, 100_000.0);
        assert_eq!(config.mutation.mutation_rate, 0.01);
        assert_eq!(config.life.initial_energy, 40.0);
        assert_eq!(config.physics.elasticity, 0.8);
        assert_eq!(config.reactions.healing, 4500.0);
        assert_eq!(config.run.seed, 1);
        assert!(config.run.reaction_table.is_none());
    }

    #[test]
    fn test_load_config_with_defaults() {
        // Should load defaults when no config file exists
        let config = AppConfig::load(None).expect("Failed to load config");
        assert_eq!(config.run.report_every, 500);
        assert_eq!(config.physics.rubbing, 0.98);
        assert_eq!(config.organism_config(), OrganismConfig::default());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            "(world: (width: 800.0, initial_organisms: 12), physics: (elasticity: 1.0), run: (seed: 9))"
        )
        .expect("write config");

        let config = AppConfig::load(Some(file.path())).expect("Failed to load config");
        assert_eq!(config.world.width, 800.0);
        assert_eq!(config.world.height, 3000.0);
        assert_eq!(config.world.initial_organisms, 12);
        assert_eq!(config.physics.elasticity, 1.0);
        assert_eq!(config.physics.max_velocity, 5.0);
        assert_eq!(config.run.seed, 9);
        assert_eq!(config.run.ticks, 10_000);
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "(world: (max_population: 10, spawn_attempts: 5))").expect("write config");

        // Only keys no other test asserts on, since tests share the environment
        std::env::set_var("BIOMORPH_WORLD__MAX_POPULATION", "77");
        let config = AppConfig::load(Some(file.path()));
        std::env::remove_var("BIOMORPH_WORLD__MAX_POPULATION");

        let config = config.expect("Failed to load config");
        assert_eq!(config.world.max_population, 77);
        assert_eq!(config.world.spawn_attempts, 5);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = AppConfig::load(Some(Path::new("definitely/not/here.ron")));
        assert!(result.is_err());
    }
}
