//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$MESHLOCK_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/meshlock/config.toml`
//! 3. `~/.meshlock/config.toml`
//!
//! # Scene Config
//!
//! Located at `meshlock.toml` in the directory holding the scene document.
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they conform to
//! expected formats (e.g., the layer must be a valid attribute name, chords
//! must parse).

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::addon::keymap::KeyChord;
use crate::core::types::LayerName;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// [overlay]
/// show_locked = true
/// base_color = [1.0, 0.3, 0.3, 0.9]
/// point_size = 8.0
///
/// [keymap]
/// lock = "ctrl+shift+L"
/// begin_unlock = "ctrl+shift+U"
///
/// [log]
/// filter = "meshlock=debug"
/// format = "compact"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Overlay appearance
    pub overlay: Option<OverlayConfig>,

    /// Chords for the add-on's own commands
    pub keymap: Option<KeymapConfig>,

    /// Log output settings
    pub log: Option<LogConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(overlay) = &self.overlay {
            overlay.validate()?;
        }
        if let Some(keymap) = &self.keymap {
            keymap.validate()?;
        }
        if let Some(log) = &self.log {
            log.validate()?;
        }
        Ok(())
    }
}

/// Scene configuration.
///
/// # Example
///
/// ```toml
/// layer = "mesh_lock_vert"
/// show_locked = false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Name of the lock layer and attribute
    pub layer: Option<String>,

    /// Override of the global overlay toggle
    pub show_locked: Option<bool>,
}

impl SceneConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(layer) = &self.layer {
            LayerName::new(layer.as_str())
                .map_err(|e| ConfigError::InvalidValue(format!("invalid lock layer: {}", e)))?;
        }
        Ok(())
    }
}

/// Overlay appearance.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayConfig {
    /// Draw locked elements while revealed for unlock
    pub show_locked: Option<bool>,

    /// RGBA for unselected locked elements
    pub base_color: Option<[f32; 4]>,

    /// RGBA for selected locked elements
    pub highlight_color: Option<[f32; 4]>,

    /// Point size in pixels (1 to 20)
    pub point_size: Option<f32>,

    /// Line width in pixels (1 to 10)
    pub line_width: Option<f32>,
}

impl OverlayConfig {
    /// Accepted point size range.
    pub const POINT_SIZE: (f32, f32) = (1.0, 20.0);

    /// Accepted line width range.
    pub const LINE_WIDTH: (f32, f32) = (1.0, 10.0);

    /// Validate the overlay configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, color) in [
            ("base_color", &self.base_color),
            ("highlight_color", &self.highlight_color),
        ] {
            if let Some(rgba) = color {
                if rgba.iter().any(|c| !(0.0..=1.0).contains(c)) {
                    return Err(ConfigError::InvalidValue(format!(
                        "{} components must be between 0 and 1",
                        name
                    )));
                }
            }
        }

        check_range("point_size", self.point_size, Self::POINT_SIZE)?;
        check_range("line_width", self.line_width, Self::LINE_WIDTH)?;
        Ok(())
    }
}

fn check_range(name: &str, value: Option<f32>, (min, max): (f32, f32)) -> Result<(), ConfigError> {
    match value {
        Some(v) if !(min..=max).contains(&v) => Err(ConfigError::InvalidValue(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, v
        ))),
        _ => Ok(()),
    }
}

/// Chords for the add-on's own commands.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct KeymapConfig {
    /// Chord for "lock selection"
    pub lock: Option<String>,

    /// Chord for "begin unlock selection"
    pub begin_unlock: Option<String>,
}

impl KeymapConfig {
    /// Validate the keymap configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, chord) in [("lock", &self.lock), ("begin_unlock", &self.begin_unlock)] {
            if let Some(chord) = chord {
                chord.parse::<KeyChord>().map_err(|e| {
                    ConfigError::InvalidValue(format!("invalid keymap.{}: {}", name, e))
                })?;
            }
        }
        Ok(())
    }
}

/// Log output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// `tracing` filter directive
    pub filter: Option<String>,

    /// Output format ("compact" or "json")
    pub format: Option<String>,
}

impl LogConfig {
    /// Valid output formats.
    pub const VALID_FORMATS: &'static [&'static str] = &["compact", "json"];

    /// Validate the log configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(format) = &self.format {
            if !Self::VALID_FORMATS.contains(&format.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid log format '{}', must be one of: {}",
                    format,
                    Self::VALID_FORMATS.join(", ")
                )));
            }
        }
        if let Some(filter) = &self.filter {
            if filter.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "log filter cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod global_config {
        use super::*;

        #[test]
        fn defaults() {
            let config = GlobalConfig::default();
            assert!(config.overlay.is_none());
            assert!(config.keymap.is_none());
            assert!(config.log.is_none());
            assert!(config.validate().is_ok());
        }

        #[test]
        fn roundtrip() {
            let config = GlobalConfig {
                overlay: Some(OverlayConfig {
                    show_locked: Some(false),
                    base_color: Some([1.0, 0.5, 0.25, 1.0]),
                    highlight_color: None,
                    point_size: Some(6.0),
                    line_width: Some(2.0),
                }),
                keymap: Some(KeymapConfig {
                    lock: Some("ctrl+alt+L".to_string()),
                    begin_unlock: None,
                }),
                log: Some(LogConfig {
                    filter: Some("debug".to_string()),
                    format: Some("json".to_string()),
                }),
            };

            let toml = toml::to_string_pretty(&config).unwrap();
            let parsed: GlobalConfig = toml::from_str(&toml).unwrap();
            assert_eq!(config, parsed);
        }

        #[test]
        fn reject_unknown_fields() {
            let toml = r#"
                [overlay]
                glow = true
            "#;

            let result: Result<GlobalConfig, _> = toml::from_str(toml);
            assert!(result.is_err());
        }
    }

    mod overlay_config {
        use super::*;

        #[test]
        fn point_size_bounds() {
            let ok = OverlayConfig {
                point_size: Some(20.0),
                ..Default::default()
            };
            assert!(ok.validate().is_ok());

            let too_big = OverlayConfig {
                point_size: Some(21.0),
                ..Default::default()
            };
            assert!(too_big.validate().is_err());
        }

        #[test]
        fn line_width_bounds() {
            let config = OverlayConfig {
                line_width: Some(0.5),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn color_components() {
            let config = OverlayConfig {
                highlight_color: Some([1.0, 1.0, 1.5, 1.0]),
                ..Default::default()
            };
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("highlight_color"));
        }
    }

    mod keymap_config {
        use super::*;

        #[test]
        fn valid_chord() {
            let config = KeymapConfig {
                lock: Some("ctrl+shift+K".to_string()),
                begin_unlock: None,
            };
            assert!(config.validate().is_ok());
        }

        #[test]
        fn invalid_chord() {
            let config = KeymapConfig {
                lock: None,
                begin_unlock: Some("hyper+".to_string()),
            };
            assert!(config.validate().is_err());
        }
    }

    mod log_config {
        use super::*;

        #[test]
        fn valid_formats() {
            for format in LogConfig::VALID_FORMATS {
                let config = LogConfig {
                    filter: None,
                    format: Some(format.to_string()),
                };
                assert!(config.validate().is_ok());
            }
        }

        #[test]
        fn invalid_format() {
            let config = LogConfig {
                filter: None,
                format: Some("xml".to_string()),
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn empty_filter_rejected() {
            let config = LogConfig {
                filter: Some("  ".to_string()),
                format: None,
            };
            assert!(config.validate().is_err());
        }
    }

    mod scene_config {
        use super::*;

        #[test]
        fn valid_layer() {
            let config = SceneConfig {
                layer: Some("lock_v2".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_ok());
        }

        #[test]
        fn invalid_layer() {
            let config = SceneConfig {
                layer: Some("bad layer".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }
    }
}
