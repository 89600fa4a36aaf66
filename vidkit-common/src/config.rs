//! Configuration loading and resolution
//!
//! Player behavior is plain configuration (no commands): autoplay, looping,
//! buffering threshold, notification edge triggering and the four
//! application-lifecycle flags.
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `VIDKIT_CONFIG` environment variable
//! 3. `<config_dir>/vidkit/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! A missing config file is not an error; a malformed one is.

use crate::events::FillMode;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "VIDKIT_CONFIG";

/// Top-level TOML configuration file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Player behavior (`[player]` table)
    #[serde(default)]
    pub player: PlayerSettings,

    /// Logging configuration (`[logging]` table)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Player behavior settings
///
/// Every field has a default so a partial `[player]` table is valid.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Start playback as soon as newly loaded media is ready
    pub autoplay: bool,

    /// Restart from zero at end of media
    pub playback_loops: bool,

    /// Stop on the last frame at end of media instead of rewinding
    pub playback_freezes_at_end: bool,

    /// Buffered backlog (seconds) considered enough to nudge a stalled engine
    pub buffer_size_secs: f64,

    /// Only notify state changes when the value actually changes
    pub playback_edge_triggered: bool,

    pub pauses_when_resigning_active: bool,
    pub pauses_when_backgrounded: bool,
    pub resumes_when_became_active: bool,
    pub resumes_when_entering_foreground: bool,

    /// Video layout within the surface
    pub fill_mode: FillMode,

    /// Period of current-time notifications while media is loaded
    pub time_observer_interval_ms: u64,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            autoplay: true,
            playback_loops: false,
            playback_freezes_at_end: false,
            buffer_size_secs: 10.0,
            playback_edge_triggered: true,
            pauses_when_resigning_active: true,
            pauses_when_backgrounded: true,
            resumes_when_became_active: true,
            resumes_when_entering_foreground: true,
            fill_mode: FillMode::AspectFit,
            time_observer_interval_ms: 10,
        }
    }
}

/// Largest accepted `buffer_size_secs` (one day)
pub const MAX_BUFFER_SIZE_SECS: f64 = 86_400.0;

impl PlayerSettings {
    /// Buffer target, clamped to `0..=MAX_BUFFER_SIZE_SECS`
    pub fn buffer_size(&self) -> Duration {
        let secs = if self.buffer_size_secs.is_nan() {
            0.0
        } else {
            self.buffer_size_secs.clamp(0.0, MAX_BUFFER_SIZE_SECS)
        };
        Duration::from_secs_f64(secs)
    }

    pub fn time_observer_interval(&self) -> Duration {
        Duration::from_millis(self.time_observer_interval_ms.max(1))
    }

    /// Reject values the player cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.buffer_size_secs.is_finite() || self.buffer_size_secs < 0.0 {
            return Err(Error::Config(format!(
                "buffer_size_secs must be a non-negative number, got {}",
                self.buffer_size_secs
            )));
        }
        if self.buffer_size_secs > MAX_BUFFER_SIZE_SECS {
            return Err(Error::Config(format!(
                "buffer_size_secs must be at most {}, got {}",
                MAX_BUFFER_SIZE_SECS, self.buffer_size_secs
            )));
        }
        if self.time_observer_interval_ms == 0 {
            return Err(Error::Config(
                "time_observer_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.player.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

/// Resolves which config file to use and loads it
///
/// Follows the priority order documented at module level.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Config file path to load, if any source names one
    pub fn resolve_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cli_path {
            debug!("Using config path from command line: {}", path.display());
            return Some(path.clone());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.is_empty() {
                debug!("Using config path from {}: {}", CONFIG_ENV_VAR, path);
                return Some(PathBuf::from(path));
            }
        }

        default_config_path().filter(|p| p.exists())
    }

    /// Load the resolved configuration
    ///
    /// Missing file: warn and fall back to compiled defaults.
    /// Unreadable or malformed file: error.
    pub fn load(&self) -> Result<TomlConfig> {
        match self.resolve_path() {
            Some(path) if path.exists() => TomlConfig::load(&path),
            Some(path) => {
                warn!(
                    "Config file {} not found, using built-in defaults",
                    path.display()
                );
                Ok(TomlConfig::default())
            }
            None => {
                debug!("No config file found, using built-in defaults");
                Ok(TomlConfig::default())
            }
        }
    }
}

/// Platform config location: `<config_dir>/vidkit/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("vidkit").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_settings_defaults() {
        let settings = PlayerSettings::default();
        assert!(settings.autoplay);
        assert!(!settings.playback_loops);
        assert!(!settings.playback_freezes_at_end);
        assert_eq!(settings.buffer_size(), Duration::from_secs(10));
        assert!(settings.playback_edge_triggered);
        assert!(settings.pauses_when_resigning_active);
        assert!(settings.pauses_when_backgrounded);
        assert!(settings.resumes_when_became_active);
        assert!(settings.resumes_when_entering_foreground);
        assert_eq!(settings.fill_mode, FillMode::AspectFit);
        assert_eq!(settings.time_observer_interval(), Duration::from_millis(10));
    }

    #[test]
    fn test_partial_player_table() {
        let config = TomlConfig::from_toml_str(
            r#"
            [player]
            playback_loops = true
            buffer_size_secs = 4.5
            fill_mode = "aspect_fill"
            "#,
        )
        .unwrap();

        assert!(config.player.playback_loops);
        assert!(config.player.autoplay);
        assert_eq!(config.player.buffer_size_secs, 4.5);
        assert_eq!(config.player.fill_mode, FillMode::AspectFill);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.player, PlayerSettings::default());
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_negative_buffer_size_rejected() {
        let err = TomlConfig::from_toml_str("[player]\nbuffer_size_secs = -1.0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_oversized_buffer_size_rejected() {
        let err = TomlConfig::from_toml_str("[player]\nbuffer_size_secs = 1e20\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let at_limit = format!("[player]\nbuffer_size_secs = {:.1}\n", MAX_BUFFER_SIZE_SECS);
        assert!(TomlConfig::from_toml_str(&at_limit).is_ok());
    }

    #[test]
    fn test_buffer_size_clamps_unvalidated_values() {
        let limit = Duration::from_secs_f64(MAX_BUFFER_SIZE_SECS);
        let with = |secs| PlayerSettings {
            buffer_size_secs: secs,
            ..PlayerSettings::default()
        };
        assert_eq!(with(1e20).buffer_size(), limit);
        assert_eq!(with(f64::INFINITY).buffer_size(), limit);
        assert_eq!(with(f64::NAN).buffer_size(), Duration::ZERO);
        assert_eq!(with(-3.0).buffer_size(), Duration::ZERO);
    }

    #[test]
    fn test_zero_time_interval_rejected() {
        let err =
            TomlConfig::from_toml_str("[player]\ntime_observer_interval_ms = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let err = TomlConfig::from_toml_str("[player\nautoplay = ").unwrap_err();
        assert!(matches!(err, Error::TomlParse(_)));
    }
}
