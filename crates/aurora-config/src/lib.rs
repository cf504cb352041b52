//! Configuration system for the Aurora pipeline.
//!
//! Provides runtime-configurable settings that persist to disk as RON files,
//! with CLI overrides via clap and change detection on reload.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{Config, DebugConfig, EnvironmentConfig, RenderConfig, default_config_dir};
pub use error::ConfigError;
