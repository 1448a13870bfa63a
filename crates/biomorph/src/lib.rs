//! Headless Biomorph runner: layered configuration and the run loop

pub mod config;
pub mod runner;

pub use config::AppConfig;
pub use runner::{RunSummary, Runner};
