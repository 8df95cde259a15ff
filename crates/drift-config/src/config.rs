//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration for the movement stack.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Mover tuning: bounce, slopes, steps, friction.
    pub movement: MovementConfig,
    /// Unstuck recovery search.
    pub unstuck: UnstuckConfig,
    /// Gravity pull and source selection.
    pub gravity: GravityConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Mover configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MovementConfig {
    /// Fraction of the into-floor velocity reflected back on contact.
    pub ground_bounce: f32,
    /// Fraction of the into-wall velocity reflected back on contact.
    pub wall_bounce: f32,
    /// Steepest surface (degrees from "up") still treated as floor.
    pub max_standable_angle: f32,
    /// Maximum height a body climbs in one step-up probe.
    pub step_size: f32,
    /// Ground friction amount passed to `apply_friction`.
    pub friction: f32,
    /// Speed below which friction acts as if the body moved this fast.
    pub stop_speed: f32,
    /// Distance a body is pushed off a surface after each hit.
    pub surface_nudge: f32,
    /// Maximum clip planes (and bumps) per move step.
    pub max_clip_planes: usize,
    /// Joint resolution passes over the clip planes per bump.
    pub clip_iterations: usize,
}

/// Unstuck recovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UnstuckConfig {
    /// Number of straight-up probes before falling back to random ones.
    pub up_attempts: u32,
    /// Number of random-direction probes.
    pub random_attempts: u32,
    /// Distance kept between a recovered body and the surface below it.
    pub snap_margin: f32,
    /// Seed for the random-direction probe sequence.
    pub rng_seed: u64,
}

/// How the active gravity source is picked when several overlap.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceSelectionConfig {
    /// First registered source wins.
    #[default]
    FirstRegistered,
    /// Source whose position is nearest the body wins.
    Closest,
    /// Source with the largest scale wins.
    StrongestPull,
    /// Source with the highest priority wins.
    HighestPriority,
}

/// Gravity configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GravityConfig {
    /// Pull magnitude of a source with scale 1.0.
    pub base_pull: f32,
    /// World "down" used by engine-default sources.
    pub world_down: [f32; 3],
    /// Policy for picking the active source.
    pub selection: SourceSelectionConfig,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            ground_bounce: 0.0,
            wall_bounce: 0.0,
            max_standable_angle: 50.0,
            step_size: 18.0,
            friction: 4.0,
            stop_speed: 100.0,
            surface_nudge: 0.031_25,
            max_clip_planes: 5,
            clip_iterations: 8,
        }
    }
}

impl Default for UnstuckConfig {
    fn default() -> Self {
        Self {
            up_attempts: 20,
            random_attempts: 100,
            snap_margin: 0.5,
            rng_seed: 0x5eed_d41f,
        }
    }
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            base_pull: 800.0,
            world_down: [0.0, -1.0, 0.0],
            selection: SourceSelectionConfig::FirstRegistered,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Platform config directory for drift (`<config_dir>/drift`), if one exists.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("drift"))
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("max_standable_angle: 50.0"));
        assert!(ron_str.contains("base_pull: 800.0"));
        assert!(ron_str.contains("FirstRegistered"));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.gravity.selection = SourceSelectionConfig::HighestPriority;
        config.movement.wall_bounce = 0.25;
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_field_uses_default() {
        // Config missing the `unstuck` section entirely
        let ron_str = "(movement: (), gravity: (), debug: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.unstuck, UnstuckConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let ron_str = "(movement: (step_size: 12.0))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.movement.step_size, 12.0);
        assert_eq!(config.movement.max_clip_planes, 5);
    }

    #[test]
    fn test_extra_field_ignored() {
        let ron_str = "(future_setting: true)";
        let result: Result<Config, _> = ron::from_str(ron_str);
        assert!(result.is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.movement.ground_bounce = 0.1;
        config.unstuck.up_attempts = 7;
        config.gravity.world_down = [0.0, 0.0, -1.0];

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join("config.ron").exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.movement.step_size = 24.0;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert!(result.is_some());
        assert_eq!(result.unwrap().movement.step_size, 24.0);
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_reload_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::default().reload(dir.path());
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let result: Result<Config, _> = ron::from_str("{{not valid}}");
        assert!(result.is_err());
    }
}
