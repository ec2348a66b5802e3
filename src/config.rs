//! Configuration file support.
//!
//! Settings are stored as pretty-printed JSON. Every field has a default, so a
//! partial file (or none at all) yields a working configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::compositor::DisplayOptions;
use crate::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_DEBOUNCE_DELAY, DEFAULT_PRELOAD_RADIUS,
    DEFAULT_PREVIEW_INTERVAL,
};
use crate::model::ClassLabelMap;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Viewer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Maximum number of decoded images kept in memory
    pub cache_capacity: usize,

    /// Number of images warmed on each side of the current one
    pub preload_radius: usize,

    /// Minimum milliseconds between preview renders while dragging
    pub preview_interval_ms: u64,

    /// Quiet period in milliseconds before a deferred full render
    pub debounce_ms: u64,

    /// Initial overlay settings
    pub display: DisplayOptions,

    /// Initial class id to name mapping
    pub labels: ClassLabelMap,

    /// Log verbosity level
    pub log_level: LogLevel,
}

impl ViewerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            preload_radius: DEFAULT_PRELOAD_RADIUS,
            preview_interval_ms: DEFAULT_PREVIEW_INTERVAL.as_millis() as u64,
            debounce_ms: DEFAULT_DEBOUNCE_DELAY.as_millis() as u64,
            display: DisplayOptions::default(),
            labels: ClassLabelMap::default(),
            log_level: LogLevel::default(),
        }
    }

    pub fn preview_interval(&self) -> Duration {
        Duration::from_millis(self.preview_interval_ms)
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        let alpha = config.display.segment_alpha;
        config.display.set_segment_alpha(alpha);
        Ok(config)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "yview-config.json"
    }

    /// Get the default config file path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("yview").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("yview")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from a file.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Save configuration to a file, creating parent directories as needed.
    pub fn save(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.cache_capacity, 30);
        assert_eq!(config.preload_radius, 3);
        assert_eq!(config.preview_interval(), Duration::from_millis(50));
        assert_eq!(config.debounce_delay(), Duration::from_millis(30));
        assert_eq!(config.labels, ClassLabelMap::default());
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_roundtrip() {
        let mut config = ViewerConfig::new();
        config.cache_capacity = 8;
        config.labels.set(7, "truck");
        config.display.show_labels = false;

        let json = config.to_json().unwrap();
        let restored = ViewerConfig::from_json(&json).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config =
            ViewerConfig::from_json(r#"{"cache_capacity": 5, "display": {"show_boxes": false}}"#)
                .unwrap();
        assert_eq!(config.cache_capacity, 5);
        assert!(!config.display.show_boxes);
        assert!(config.display.show_segments);
        assert_eq!(config.preload_radius, 3);
        assert_eq!(config.labels.len(), 4);
    }

    #[test]
    fn test_labels_from_json() {
        let config =
            ViewerConfig::from_json(r#"{"labels": {"0": "person", "2": "bike"}}"#).unwrap();
        assert_eq!(config.labels.get(0), Some("person"));
        assert_eq!(config.labels.get(2), Some("bike"));
        assert_eq!(config.labels.get(1), None);
    }

    #[test]
    fn test_alpha_clamped_on_load() {
        let config = ViewerConfig::from_json(r#"{"display": {"segment_alpha": 3.0}}"#).unwrap();
        assert_eq!(config.display.segment_alpha, 1.0);
    }

    #[test]
    fn test_version_too_new() {
        let result = ViewerConfig::from_json(r#"{"version": 99}"#);
        assert!(matches!(result, Err(ConfigError::VersionTooNew { .. })));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            ViewerConfig::from_json("{not json"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("yview-config.json");
        let mut config = ViewerConfig::new();
        config.log_level = LogLevel::Debug;
        config.save(&path).unwrap();

        let loaded = ViewerConfig::load(&path).unwrap();
        assert_eq!(loaded.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
        assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
    }
}
