//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Meshlock has two configuration scopes:
//! - **Global**: User-level settings (overlay style, chords, logging)
//! - **Scene**: Per-scene overrides, stored beside the scene document
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Scene config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$MESHLOCK_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/meshlock/config.toml`
//! 3. `~/.meshlock/config.toml`
//!
//! # Scene Config Location
//!
//! `meshlock.toml` in the directory that holds the scene document.
//!
//! # Example
//!
//! ```no_run
//! use meshlock::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/scenes"))).unwrap();
//! let config = result.config;
//!
//! println!("Lock layer: {}", config.layer());
//! println!("Show locked: {}", config.show_locked());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, KeymapConfig, LogConfig, OverlayConfig, SceneConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::addon::overlay::OverlayStyle;
use crate::core::types::LayerName;

/// File name of the scene config.
pub const SCENE_CONFIG_FILE: &str = "meshlock.toml";

/// Default chord for "lock selection".
pub const DEFAULT_LOCK_CHORD: &str = "ctrl+shift+L";

/// Default chord for "begin unlock selection".
pub const DEFAULT_BEGIN_UNLOCK_CHORD: &str = "ctrl+shift+U";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
}

/// Merged configuration from all sources.
///
/// This struct provides accessor methods that apply precedence rules
/// automatically. Scene config overrides global config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Scene configuration (if present)
    pub scene: Option<SceneConfig>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the scene config file (if loaded)
    scene_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `scene_dir` is provided, also loads the scene config found there.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or fail
    /// validation. Missing config files are not an error (defaults are used).
    pub fn load(scene_dir: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        Self::load_with(Self::find_global(), scene_dir)
    }

    /// Load configuration from an explicit global path.
    pub fn load_with(
        global_path: Option<PathBuf>,
        scene_dir: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let global = match &global_path {
            Some(path) => Self::read_config::<GlobalConfig>(path)?,
            None => GlobalConfig::default(),
        };

        let (scene, scene_path) = match scene_dir {
            Some(dir) => {
                let path = Self::scene_config_path(dir);
                if path.exists() {
                    (Some(Self::read_config::<SceneConfig>(&path)?), Some(path))
                } else {
                    (None, None)
                }
            }
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref s) = scene {
            s.validate()?;
        }

        Ok(ConfigLoadResult {
            config: Config {
                global,
                scene,
                global_path,
                scene_path,
            },
        })
    }

    /// Locate the global config file, if any exists.
    fn find_global() -> Option<PathBuf> {
        // 1. Check $MESHLOCK_CONFIG
        if let Ok(path) = std::env::var("MESHLOCK_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/meshlock/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("meshlock/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.meshlock/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".meshlock/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    /// Read and parse a config file.
    fn read_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the path for scene config in the given directory.
    pub fn scene_config_path(scene_dir: &Path) -> PathBuf {
        scene_dir.join(SCENE_CONFIG_FILE)
    }

    /// Write scene config atomically.
    ///
    /// Creates parent directories if needed. Uses atomic write
    /// (write to temp file, then rename) to prevent corruption.
    pub fn write_scene(scene_dir: &Path, config: &SceneConfig) -> Result<PathBuf, ConfigError> {
        let path = Self::scene_config_path(scene_dir);
        Self::write_config_atomic(&path, config)?;
        Ok(path)
    }

    /// Write a config file atomically.
    fn write_config_atomic<T: serde::Serialize>(
        path: &Path,
        config: &T,
    ) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Get the lock layer name.
    ///
    /// Defaults to `mesh_lock_vert` if not configured.
    pub fn layer(&self) -> LayerName {
        self.scene
            .as_ref()
            .and_then(|s| s.layer.as_deref())
            .and_then(|l| LayerName::new(l).ok())
            .unwrap_or_default()
    }

    /// Check if locked elements are drawn while revealed.
    ///
    /// Scene overrides global. Defaults to `true`.
    pub fn show_locked(&self) -> bool {
        self.scene
            .as_ref()
            .and_then(|s| s.show_locked)
            .or_else(|| self.global.overlay.as_ref().and_then(|o| o.show_locked))
            .unwrap_or(true)
    }

    /// Overlay style with defaults filled in.
    pub fn overlay_style(&self) -> OverlayStyle {
        let defaults = OverlayStyle::default();
        let Some(overlay) = self.global.overlay.as_ref() else {
            return defaults;
        };
        OverlayStyle {
            base_color: overlay.base_color.unwrap_or(defaults.base_color),
            highlight_color: overlay.highlight_color.unwrap_or(defaults.highlight_color),
            point_size: overlay.point_size.unwrap_or(defaults.point_size),
            line_width: overlay.line_width.unwrap_or(defaults.line_width),
        }
    }

    /// Chord for "lock selection".
    pub fn lock_chord(&self) -> &str {
        self.global
            .keymap
            .as_ref()
            .and_then(|k| k.lock.as_deref())
            .unwrap_or(DEFAULT_LOCK_CHORD)
    }

    /// Chord for "begin unlock selection".
    pub fn begin_unlock_chord(&self) -> &str {
        self.global
            .keymap
            .as_ref()
            .and_then(|k| k.begin_unlock.as_deref())
            .unwrap_or(DEFAULT_BEGIN_UNLOCK_CHORD)
    }

    /// Configured log filter directive, if any.
    pub fn log_filter(&self) -> Option<&str> {
        self.global.log.as_ref().and_then(|l| l.filter.as_deref())
    }

    /// Whether logs should be emitted as JSON.
    ///
    /// Defaults to `false` (compact).
    pub fn log_json(&self) -> bool {
        self.global
            .log
            .as_ref()
            .and_then(|l| l.format.as_deref())
            .is_some_and(|f| f == "json")
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded scene config file.
    pub fn scene_config_loaded_from(&self) -> Option<&Path> {
        self.scene_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_empty_defaults() {
        let result = Config::load_with(None, None).unwrap();
        let config = result.config;

        assert_eq!(config.layer(), LayerName::default());
        assert!(config.show_locked());
        assert_eq!(config.lock_chord(), DEFAULT_LOCK_CHORD);
        assert_eq!(config.begin_unlock_chord(), DEFAULT_BEGIN_UNLOCK_CHORD);
        assert_eq!(config.overlay_style(), OverlayStyle::default());
        assert!(config.log_filter().is_none());
        assert!(!config.log_json());
    }

    #[test]
    fn load_global_from_path() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");

        fs::write(
            &config_path,
            r#"
            [overlay]
            point_size = 12.0
            show_locked = false

            [log]
            format = "json"
            "#,
        )
        .unwrap();

        let result = Config::load_with(Some(config_path.clone()), None).unwrap();
        let config = result.config;

        assert!(!config.show_locked());
        assert_eq!(config.overlay_style().point_size, 12.0);
        assert!(config.log_json());
        assert_eq!(config.global_config_loaded_from(), Some(config_path.as_path()));
    }

    #[test]
    fn load_scene_config() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(SCENE_CONFIG_FILE),
            r#"
            layer = "lock_v2"
            "#,
        )
        .unwrap();

        let result = Config::load_with(None, Some(temp.path())).unwrap();
        assert_eq!(result.config.layer().as_str(), "lock_v2");
        assert!(result.config.scene_config_loaded_from().is_some());
    }

    #[test]
    fn write_scene_config_atomic() {
        let temp = TempDir::new().unwrap();
        let config = SceneConfig {
            layer: Some("pinned".to_string()),
            show_locked: Some(false),
        };

        let path = Config::write_scene(temp.path(), &config).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("toml.tmp").exists());
        let loaded = Config::load_with(None, Some(temp.path())).unwrap();
        assert_eq!(loaded.config.layer().as_str(), "pinned");
    }

    #[test]
    fn invalid_layer_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(SCENE_CONFIG_FILE), "layer = \"no spaces\"").unwrap();

        let result = Config::load_with(None, Some(temp.path()));
        assert!(result.is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(SCENE_CONFIG_FILE),
            r#"
            layer = "lock"
            unknown_field = true
            "#,
        )
        .unwrap();

        let result = Config::load_with(None, Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn precedence_scene_overrides_global() {
        let config = Config {
            global: GlobalConfig {
                overlay: Some(OverlayConfig {
                    show_locked: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            },
            scene: Some(SceneConfig {
                show_locked: Some(false),
                ..Default::default()
            }),
            global_path: None,
            scene_path: None,
        };

        assert!(!config.show_locked());
    }

    #[test]
    fn chords_from_global() {
        let config = Config {
            global: GlobalConfig {
                keymap: Some(KeymapConfig {
                    lock: Some("alt+L".to_string()),
                    begin_unlock: None,
                }),
                ..Default::default()
            },
            ..Default::default()
        };

        assert_eq!(config.lock_chord(), "alt+L");
        assert_eq!(config.begin_unlock_chord(), DEFAULT_BEGIN_UNLOCK_CHORD);
    }
}
