//! Conversions from search values into `geo` and `GeoJSON` geometries.
//!
//! `GeoJSON` and `geo` both order coordinates as `(x = longitude,
//! y = latitude)`, the reverse of [`Coordinate`]'s `(latitude, longitude)`.

use geo::{Point, Polygon, Rect, coord};

use crate::{Coordinate, SearchWindow};

/// Converts a coordinate into a `geo` point.
#[must_use]
pub fn to_point(coordinate: &Coordinate) -> Point<f64> {
    Point::new(coordinate.longitude(), coordinate.latitude())
}

/// Converts a search window into a `geo` rectangle.
#[must_use]
pub fn to_rect(window: &SearchWindow) -> Rect<f64> {
    Rect::new(
        coord! { x: window.min.longitude(), y: window.min.latitude() },
        coord! { x: window.max.longitude(), y: window.max.latitude() },
    )
}

/// Converts a search window into a closed polygon ring.
#[must_use]
pub fn to_polygon(window: &SearchWindow) -> Polygon<f64> {
    to_rect(window).to_polygon()
}

/// `GeoJSON` point geometry for a coordinate.
#[must_use]
pub fn point_geometry(coordinate: &Coordinate) -> geojson::Geometry {
    geojson::Geometry::new(geojson::Value::from(&to_point(coordinate)))
}

/// `GeoJSON` polygon geometry for a search window.
#[must_use]
pub fn window_geometry(window: &SearchWindow) -> geojson::Geometry {
    geojson::Geometry::new(geojson::Value::from(&to_polygon(window)))
}

/// `[west, south, east, north]` bounds, as used by `GeoJSON` `bbox` members
/// and map `fitBounds` calls.
#[must_use]
pub fn bbox(window: &SearchWindow) -> Vec<f64> {
    vec![
        window.min.longitude(),
        window.min.latitude(),
        window.max.longitude(),
        window.max.latitude(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search_window;

    fn window() -> SearchWindow {
        search_window(Coordinate::new(47.6, -122.3).unwrap(), 500.0).unwrap()
    }

    #[test]
    fn point_uses_lng_lat_order() {
        let p = to_point(&Coordinate::new(47.6, -122.3).unwrap());
        assert!((p.x() - -122.3).abs() < f64::EPSILON);
        assert!((p.y() - 47.6).abs() < f64::EPSILON);
    }

    #[test]
    fn polygon_ring_is_closed_rectangle() {
        let polygon = to_polygon(&window());
        let ring = polygon.exterior();
        assert_eq!(ring.0.len(), 5);
        assert_eq!(ring.0.first(), ring.0.last());
    }

    #[test]
    fn window_geometry_is_polygon() {
        let geometry = window_geometry(&window());
        assert!(matches!(geometry.value, geojson::Value::Polygon(_)));
    }

    #[test]
    fn bbox_is_west_south_east_north() {
        let w = window();
        let b = bbox(&w);
        assert_eq!(b.len(), 4);
        assert!(b[0] < b[2]);
        assert!(b[1] < b[3]);
        assert!((b[1] - w.min.latitude()).abs() < f64::EPSILON);
    }
}
