//! Configuration system for the drift movement stack.
//!
//! Provides runtime-configurable movement, unstuck, and gravity settings that
//! persist to disk as RON files. Supports CLI overrides via clap, hot-reload
//! detection, and forward/backward compatible serialization.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, GravityConfig, MovementConfig, SourceSelectionConfig, UnstuckConfig,
    default_config_dir,
};
pub use error::ConfigError;
