//! Run configuration loaded from YAML.
//!
//! A [`Config`] lists the icons to convert, the sources they are fetched
//! from and the output settings. It is validated once at load time; the rest
//! of the pipeline trusts it.
//!
//! # Example
//!
//! ```
//! use icon_press::Config;
//!
//! let config = Config::from_yaml_str(
//!     r##"
//! icons: [home.svg, search.svg]
//! sources:
//!   - source: https://example.com/icons/outline/
//!     suffix: _outline
//! settings:
//!   size: 64
//!   color: "#1e293b"
//!   outputDirectory: out
//! "##,
//! )
//! .unwrap();
//!
//! let wide = config.settings.wide_layout();
//! assert_eq!((wide.width, wide.height), (320, 180));
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::geometry::SizePx;

/// Largest accepted square output size in pixels.
pub const MAX_SIZE: u32 = 2048;

pub const DEFAULT_WIDE_WIDTH: u32 = 320;
pub const DEFAULT_WIDE_HEIGHT: u32 = 180;
pub const DEFAULT_WIDE_SUFFIX: &str = "_wide";

// ============================================================================
// ConfigError
// ============================================================================

/// Failure to produce a usable [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml_ng::Error),

    /// Every schema violation found, each naming the offending field.
    #[error("invalid config:\n  - {}", violations.join("\n  - "))]
    Invalid { violations: Vec<String> },
}

impl ConfigError {
    /// Returns the list of violations for [`ConfigError::Invalid`].
    pub fn violations(&self) -> &[String] {
        match self {
            Self::Invalid { violations } => violations,
            _ => &[],
        }
    }
}

// ============================================================================
// Config
// ============================================================================

/// A source the icons are fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct SourceConfig {
    /// Base URL or local directory.
    #[serde(rename = "source", alias = "location")]
    pub location: String,

    /// Appended to the icon's base name in output filenames.
    #[serde(default)]
    pub suffix: String,
}

impl SourceConfig {
    pub fn new(location: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            suffix: suffix.into(),
        }
    }
}

/// Letterboxed output settings as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct WideSettings {
    #[serde(default = "default_wide_width")]
    pub width: u32,

    #[serde(default = "default_wide_height")]
    pub height: u32,

    /// Size of the square icon drawn in the middle. Defaults to `settings.size`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_size: Option<u32>,

    #[serde(default = "default_wide_suffix")]
    pub wide_suffix: String,
}

/// Output settings shared by every task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Edge length of the square output.
    pub size: u32,

    /// Color applied to every icon. `None` keeps the original styling.
    #[serde(default)]
    pub color: Option<String>,

    pub output_directory: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wide: Option<WideSettings>,
}

/// Resolved wide layout with all defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideLayout {
    pub width: u32,
    pub height: u32,
    pub icon_size: u32,
    pub suffix: String,
}

impl Settings {
    /// Returns the wide layout, filling in defaults for anything omitted.
    ///
    /// Without an explicit `iconSize` the icon takes `size`, clamped to the
    /// canvas' shorter side.
    pub fn wide_layout(&self) -> WideLayout {
        let (width, height, icon_size, suffix) = match &self.wide {
            Some(wide) => (
                wide.width,
                wide.height,
                wide.icon_size,
                wide.wide_suffix.clone(),
            ),
            None => (
                DEFAULT_WIDE_WIDTH,
                DEFAULT_WIDE_HEIGHT,
                None,
                DEFAULT_WIDE_SUFFIX.to_string(),
            ),
        };

        WideLayout {
            width,
            height,
            icon_size: icon_size.unwrap_or_else(|| self.size.min(width.min(height))),
            suffix,
        }
    }
}

/// The full run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Config {
    /// Icon filenames, e.g. `home.svg`.
    pub icons: Vec<String>,
    pub sources: Vec<SourceConfig>,
    pub settings: Settings,
}

impl Config {
    /// Reads, parses and validates a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Parses and validates YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml_ng::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every invariant and reports all violations at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut violations = Vec::new();

        if self.icons.is_empty() {
            violations.push("icons must contain at least one entry".to_string());
        }
        for (i, icon) in self.icons.iter().enumerate() {
            if icon.trim().is_empty() {
                violations.push(format!("icons[{i}] must not be empty"));
            }
        }

        if self.sources.is_empty() {
            violations.push("sources must contain at least one entry".to_string());
        }
        for (i, source) in self.sources.iter().enumerate() {
            if source.location.trim().is_empty() {
                violations.push(format!("sources[{i}].source must not be empty"));
            }
        }

        let settings = &self.settings;
        if settings.size == 0 || settings.size > MAX_SIZE {
            violations.push(format!(
                "settings.size must be between 1 and {MAX_SIZE}, got {}",
                settings.size
            ));
        }
        if settings.color.as_deref().is_some_and(|c| c.trim().is_empty()) {
            violations.push("settings.color must not be empty when set".to_string());
        }
        if settings.output_directory.as_os_str().is_empty() {
            violations.push("settings.outputDirectory must not be empty".to_string());
        }

        if let Some(wide) = &settings.wide {
            if wide.width == 0 {
                violations.push("settings.wide.width must be greater than 0".to_string());
            }
            if wide.height == 0 {
                violations.push("settings.wide.height must be greater than 0".to_string());
            }
            if let Some(icon_size) = wide.icon_size {
                let canvas = SizePx::new(wide.width, wide.height);
                if icon_size == 0 {
                    violations.push("settings.wide.iconSize must be greater than 0".to_string());
                } else if !canvas.contains(SizePx::square(icon_size)) {
                    violations.push(format!(
                        "settings.wide.iconSize must not exceed min(width, height) = {}, got {icon_size}",
                        wide.width.min(wide.height)
                    ));
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid { violations })
        }
    }

    /// Returns the JSON schema of the config file format.
    #[cfg(feature = "jsonschema")]
    pub fn json_schema() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&schemars::schema_for!(Config))
    }
}

fn default_wide_width() -> u32 {
    DEFAULT_WIDE_WIDTH
}

fn default_wide_height() -> u32 {
    DEFAULT_WIDE_HEIGHT
}

fn default_wide_suffix() -> String {
    DEFAULT_WIDE_SUFFIX.to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
icons: [a.svg]
sources:
  - source: ./x
    suffix: _s
settings:
  size: 10
  color: null
  outputDirectory: out
"#;

    #[test]
    fn minimal_config_parses() {
        let config = Config::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(config.icons, vec!["a.svg"]);
        assert_eq!(config.sources[0], SourceConfig::new("./x", "_s"));
        assert_eq!(config.settings.size, 10);
        assert!(config.settings.color.is_none());
        assert_eq!(config.settings.output_directory, PathBuf::from("out"));
    }

    #[test]
    fn wide_defaults_when_omitted() {
        let config = Config::from_yaml_str(MINIMAL).unwrap();
        let wide = config.settings.wide_layout();
        assert_eq!(
            wide,
            WideLayout {
                width: 320,
                height: 180,
                icon_size: 10,
                suffix: "_wide".into(),
            }
        );
    }

    #[test]
    fn default_icon_size_is_clamped_to_canvas() {
        let mut config = Config::from_yaml_str(MINIMAL).unwrap();
        config.settings.size = 512;
        assert_eq!(config.settings.wide_layout().icon_size, 180);
    }

    #[test]
    fn partial_wide_section_fills_defaults() {
        let yaml = MINIMAL.replace(
            "outputDirectory: out",
            "outputDirectory: out\n  wide:\n    iconSize: 100",
        );
        let config = Config::from_yaml_str(&yaml).unwrap();
        let wide = config.settings.wide_layout();
        assert_eq!((wide.width, wide.height, wide.icon_size), (320, 180, 100));
        assert_eq!(wide.suffix, "_wide");
    }

    #[test]
    fn oversized_wide_icon_is_rejected() {
        let yaml = MINIMAL.replace(
            "outputDirectory: out",
            "outputDirectory: out\n  wide:\n    width: 180\n    height: 320\n    iconSize: 200\n    wideSuffix: _w",
        );
        let err = Config::from_yaml_str(&yaml).unwrap_err();
        assert_eq!(err.violations().len(), 1);
        assert!(err.violations()[0].contains("settings.wide.iconSize"));
    }

    #[test]
    fn all_violations_are_reported_together() {
        let yaml = r#"
icons: []
sources: []
settings:
  size: 0
  outputDirectory: ""
  wide:
    width: 0
    height: 10
"#;
        let err = Config::from_yaml_str(yaml).unwrap_err();
        let violations = err.violations();
        assert_eq!(violations.len(), 5, "{violations:?}");
        assert!(violations.iter().any(|v| v.starts_with("icons")));
        assert!(violations.iter().any(|v| v.starts_with("sources")));
        assert!(violations.iter().any(|v| v.starts_with("settings.size")));
        assert!(violations.iter().any(|v| v.starts_with("settings.outputDirectory")));
        assert!(violations.iter().any(|v| v.starts_with("settings.wide.width")));
    }

    #[test]
    fn size_above_limit_is_rejected() {
        let yaml = MINIMAL.replace("size: 10", "size: 4096");
        let err = Config::from_yaml_str(&yaml).unwrap_err();
        assert!(err.to_string().contains("settings.size"));
    }

    #[test]
    fn missing_required_field_is_a_parse_error() {
        let yaml = MINIMAL.replace("  size: 10\n", "");
        let err = Config::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn location_alias_is_accepted() {
        let yaml = MINIMAL.replace("- source: ./x", "- location: ./x");
        let config = Config::from_yaml_str(&yaml).unwrap();
        assert_eq!(config.sources[0].location, "./x");
    }

    #[cfg(feature = "jsonschema")]
    #[test]
    fn schema_names_camel_case_fields() {
        let schema = Config::json_schema().unwrap();
        assert!(schema.contains("outputDirectory"));
        assert!(schema.contains("wideSuffix"));
    }
}
