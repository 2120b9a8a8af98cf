//! Session configuration.
//!
//! Every field has a default, so an empty (or absent) config file is valid.
//! Values can be loaded from a TOML file named explicitly or through the
//! `CRIME_RADIUS_CONFIG` environment variable.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use crime_radius_source::query::RadiusQuery;
use crime_radius_source::registry::DEFAULT_DATASET_ID;
use serde::{Deserialize, Serialize};

use crate::MapError;

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "CRIME_RADIUS_CONFIG";

/// Search, debounce, and display settings for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Dataset id from the embedded registry.
    pub dataset: String,
    /// Half-width of the square search window, in feet.
    pub radius_feet: f64,
    /// How many days back to include events.
    pub lookback_days: u32,
    /// Minimum time between admitted clicks, in milliseconds.
    pub cooldown_ms: u64,
    /// Exclude rows with the dataset's redacted-location sentinel.
    pub exclude_redacted: bool,
    /// Optional cap on rows per query.
    pub max_results: Option<u64>,
    /// Style of the search window highlight.
    pub rectangle: RectangleStyle,
    /// Camera movement after a result is drawn.
    pub fly_to: FlyToOptions,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            dataset: DEFAULT_DATASET_ID.to_string(),
            radius_feet: 500.0,
            lookback_days: 182,
            cooldown_ms: 1000,
            exclude_redacted: true,
            max_results: None,
            rectangle: RectangleStyle::default(),
            fly_to: FlyToOptions::default(),
        }
    }
}

/// Stroke and fill of the search window rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectangleStyle {
    /// CSS color of the outline and fill.
    pub color: String,
    /// Outline width in pixels.
    pub weight: u32,
    /// Fill opacity, `0.0`-`1.0`.
    pub fill_opacity: f64,
}

impl Default for RectangleStyle {
    fn default() -> Self {
        Self {
            color: "#ff7800".to_string(),
            weight: 1,
            fill_opacity: 0.1,
        }
    }
}

/// Padding and animation for fitting the map to the search window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyToOptions {
    /// Padding around the bounds, in pixels.
    pub padding_px: u32,
    /// Animation duration in seconds.
    pub duration_secs: f64,
}

impl Default for FlyToOptions {
    fn default() -> Self {
        Self {
            padding_px: 50,
            duration_secs: 0.5,
        }
    }
}

impl MapConfig {
    /// Parses and validates a TOML config.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Config`] if the TOML is malformed or a value is
    /// out of range.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, MapError> {
        let config: Self = toml::de::from_str(toml_str).map_err(|e| MapError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the config from `path`, else from the file named by
    /// [`CONFIG_ENV_VAR`], else returns the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Io`] if the file cannot be read, or
    /// [`MapError::Config`] if it is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, MapError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));

        let Some(path) = path else {
            log::debug!("No config file given, using defaults");
            return Ok(Self::default());
        };

        log::info!("Loading config from {}", path.display());
        let contents = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&contents)
    }

    /// Checks that numeric settings are usable.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Config`] naming the first invalid value.
    pub fn validate(&self) -> Result<(), MapError> {
        if !self.radius_feet.is_finite() || self.radius_feet < 0.0 {
            return Err(MapError::Config {
                message: format!(
                    "radius_feet must be a non-negative number, got {}",
                    self.radius_feet
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.rectangle.fill_opacity) {
            return Err(MapError::Config {
                message: format!(
                    "rectangle.fill_opacity must be between 0 and 1, got {}",
                    self.rectangle.fill_opacity
                ),
            });
        }
        if !self.fly_to.duration_secs.is_finite() || self.fly_to.duration_secs < 0.0 {
            return Err(MapError::Config {
                message: format!(
                    "fly_to.duration_secs must be a non-negative number, got {}",
                    self.fly_to.duration_secs
                ),
            });
        }
        Ok(())
    }

    /// Lookback window as a duration.
    #[must_use]
    pub fn lookback(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.lookback_days))
    }

    /// Gate cooldown as a duration.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Query parameters derived from this config.
    #[must_use]
    pub fn radius_query(&self) -> RadiusQuery {
        RadiusQuery {
            radius_feet: self.radius_feet,
            lookback: self.lookback(),
            exclude_redacted: self.exclude_redacted,
            limit: self.max_results,
        }
    }
}
