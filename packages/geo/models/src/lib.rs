#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate and search window value types.
//!
//! [`Coordinate`] is the WGS84 latitude/longitude pair that flows through the
//! whole click-to-markers pipeline. [`SearchWindow`] is the axis-aligned box
//! (in degree space) that approximates a circular search radius around a
//! clicked point.

use serde::{Deserialize, Serialize};

/// Errors raised when constructing geographic values from raw input.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeoError {
    /// A numeric input was NaN or infinite.
    #[error("{field} must be a finite number, got {value}")]
    NonFinite {
        /// Which input was rejected (e.g. `"latitude"`, `"north_feet"`).
        field: &'static str,
        /// The offending value.
        value: f64,
    },

    /// Latitude outside of `[-90, 90]`.
    #[error("latitude {0} is outside of [-90, 90]")]
    LatitudeOutOfRange(f64),

    /// Longitude outside of `[-180, 180]`.
    #[error("longitude {0} is outside of [-180, 180]")]
    LongitudeOutOfRange(f64),

    /// Search radius that is negative or non-finite.
    #[error("search radius must be a finite, non-negative number of feet, got {0}")]
    InvalidRadius(f64),
}

/// A WGS84 point in decimal degrees.
///
/// Always holds a finite latitude in `[-90, 90]` and a finite longitude in
/// `[-180, 180]`; construct through [`Coordinate::new`] to get that check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = GeoError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    /// Creates a coordinate, rejecting non-finite or out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if either component is NaN/infinite or outside of
    /// its valid range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() {
            return Err(GeoError::NonFinite {
                field: "latitude",
                value: latitude,
            });
        }
        if !longitude.is_finite() {
            return Err(GeoError::NonFinite {
                field: "longitude",
                value: longitude,
            });
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::LongitudeOutOfRange(longitude));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Creates a coordinate by clamping finite components into range.
    ///
    /// Used for points derived from arithmetic (offsets near the poles or the
    /// antimeridian) where a tiny overshoot should saturate instead of fail.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::NonFinite`] if either component is NaN/infinite.
    pub fn clamped(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() {
            return Err(GeoError::NonFinite {
                field: "latitude",
                value: latitude,
            });
        }
        if !longitude.is_finite() {
            return Err(GeoError::NonFinite {
                field: "longitude",
                value: longitude,
            });
        }

        Ok(Self {
            latitude: latitude.clamp(-90.0, 90.0),
            longitude: longitude.clamp(-180.0, 180.0),
        })
    }

    /// Latitude in decimal degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Axis-aligned bounding box around a search center, in degree space.
///
/// This is a square approximation of a circular search radius; points in the
/// corners are farther than the radius from the center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchWindow {
    /// The point the window was built around.
    pub center: Coordinate,
    /// Southwest corner (minimum latitude and longitude).
    pub min: Coordinate,
    /// Northeast corner (maximum latitude and longitude).
    pub max: Coordinate,
}

impl SearchWindow {
    /// Returns `true` if `point` falls inside the window (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: &Coordinate) -> bool {
        (self.min.latitude..=self.max.latitude).contains(&point.latitude)
            && (self.min.longitude..=self.max.longitude).contains(&point.longitude)
    }

    /// Midpoint of the two corners.
    ///
    /// # Errors
    ///
    /// Never fails for a window built from valid corners; the [`Result`]
    /// comes from re-validating the computed point.
    pub fn midpoint(&self) -> Result<Coordinate, GeoError> {
        Coordinate::new(
            f64::midpoint(self.min.latitude, self.max.latitude),
            f64::midpoint(self.min.longitude, self.max.longitude),
        )
    }
}
