//! Command-line argument parsing for the drift demo driver.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Drift command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "drift", about = "Gravity-aware movement demo")]
pub struct CliArgs {
    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of simulation ticks to run.
    #[arg(long, default_value_t = 120)]
    pub ticks: u32,

    /// Step-up height.
    #[arg(long)]
    pub step_size: Option<f32>,

    /// Base gravity pull multiplier.
    #[arg(long)]
    pub gravity_scale: Option<f32>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if let Some(step) = args.step_size {
            self.movement.step_size = step;
        }
        if let Some(scale) = args.gravity_scale {
            self.gravity.base_pull *= scale;
        }
    }
}
