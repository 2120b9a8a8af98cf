#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geometry helpers for radius searches.
//!
//! Converts feet-based offsets into new coordinates using an equirectangular
//! approximation, measures great-circle distances in feet, and builds the
//! square [`SearchWindow`] used to bound a query. The [`shapes`] module turns
//! these values into `geo`/`GeoJSON` geometries for rendering.

pub mod shapes;

pub use crime_radius_geo_models::{Coordinate, GeoError, SearchWindow};

/// Equatorial radius of the earth in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6378.137;

/// Feet per meter.
pub const FEET_PER_METER: f64 = 3.2808;

/// Feet per statute mile.
pub const FEET_PER_MILE: f64 = 5280.0;

/// Statute miles per degree of arc (60 nautical miles × 1.1515).
pub const MILES_PER_DEGREE: f64 = 60.0 * 1.1515;

/// Latitude magnitude used for the longitude scale factor near the poles.
///
/// At exactly ±90° the cosine is zero and the east offset would divide by
/// zero, so the scale factor is computed at this latitude instead.
pub const MAX_SCALE_LATITUDE: f64 = 89.999;

/// Size of one meter in degrees of latitude.
#[must_use]
pub fn meter_in_degrees() -> f64 {
    1.0 / ((2.0 * std::f64::consts::PI / 360.0) * EARTH_RADIUS_KM * 1000.0)
}

/// Moves `center` by `north_feet` and `east_feet`.
///
/// North offsets are applied directly to latitude. East offsets are scaled by
/// `1 / cos(latitude)` to account for meridians converging away from the
/// equator. The result saturates at the valid coordinate range.
///
/// # Errors
///
/// Returns [`GeoError::NonFinite`] if either offset is NaN or infinite.
pub fn offset(center: Coordinate, north_feet: f64, east_feet: f64) -> Result<Coordinate, GeoError> {
    if !north_feet.is_finite() {
        return Err(GeoError::NonFinite {
            field: "north_feet",
            value: north_feet,
        });
    }
    if !east_feet.is_finite() {
        return Err(GeoError::NonFinite {
            field: "east_feet",
            value: east_feet,
        });
    }

    let degrees_per_meter = meter_in_degrees();
    let north_meters = north_feet / FEET_PER_METER;
    let east_meters = east_feet / FEET_PER_METER;

    let scale_latitude = center
        .latitude()
        .clamp(-MAX_SCALE_LATITUDE, MAX_SCALE_LATITUDE);

    let latitude = north_meters.mul_add(degrees_per_meter, center.latitude());
    let longitude =
        center.longitude() + (east_meters * degrees_per_meter) / scale_latitude.to_radians().cos();

    Coordinate::clamped(latitude, longitude)
}

/// Great-circle distance between two coordinates in feet.
///
/// Uses the spherical law of cosines. Bit-identical inputs short-circuit to
/// zero.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn distance_feet(a: Coordinate, b: Coordinate) -> f64 {
    if a.latitude() == b.latitude() && a.longitude() == b.longitude() {
        return 0.0;
    }

    let lat_a = a.latitude().to_radians();
    let lat_b = b.latitude().to_radians();
    let theta = (a.longitude() - b.longitude()).to_radians();

    let cos_angle = lat_a
        .sin()
        .mul_add(lat_b.sin(), lat_a.cos() * lat_b.cos() * theta.cos())
        .clamp(-1.0, 1.0);

    cos_angle.acos().to_degrees() * MILES_PER_DEGREE * FEET_PER_MILE
}

/// Builds the square search window of half-width `radius_feet` around
/// `center`.
///
/// # Errors
///
/// Returns [`GeoError::InvalidRadius`] if the radius is negative or
/// non-finite.
pub fn search_window(center: Coordinate, radius_feet: f64) -> Result<SearchWindow, GeoError> {
    if !radius_feet.is_finite() || radius_feet < 0.0 {
        return Err(GeoError::InvalidRadius(radius_feet));
    }

    Ok(SearchWindow {
        center,
        min: offset(center, -radius_feet, -radius_feet)?,
        max: offset(center, radius_feet, radius_feet)?,
    })
}
