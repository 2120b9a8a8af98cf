//! Rendering collaborator interface and an in-memory `GeoJSON` implementation.
//!
//! The session never draws anything itself. It hands markers and the search
//! window to a [`MapRenderer`], which owns their on-screen lifetime and
//! handles clustering.

use std::collections::BTreeMap;

use crime_radius_geo::shapes;
use crime_radius_geo_models::SearchWindow;
use crime_radius_incident::markers::MarkerDescriptor;
use serde::{Deserialize, Serialize};

use crate::config::{FlyToOptions, RectangleStyle};

/// Handle to something a renderer has drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OverlayId(pub u64);

/// What the session needs from a mapping surface.
pub trait MapRenderer: Send {
    /// Draws a marker and returns its handle.
    fn add_marker(&mut self, marker: &MarkerDescriptor) -> OverlayId;

    /// Draws the search window highlight and returns its handle.
    fn add_rectangle(&mut self, window: &SearchWindow, style: &RectangleStyle) -> OverlayId;

    /// Removes a previously drawn marker or rectangle. Unknown handles are
    /// ignored.
    fn remove_overlay(&mut self, id: OverlayId);

    /// Pans/zooms so `window` fills the view.
    fn fly_to_bounds(&mut self, window: &SearchWindow, options: &FlyToOptions);

    /// Shows a non-fatal message to the user.
    fn show_notice(&mut self, message: &str) {
        log::warn!("{message}");
    }
}

/// Camera request recorded by [`GeoJsonRenderer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    /// `[west, south, east, north]`.
    pub bbox: Vec<f64>,
    /// Padding in pixels.
    pub padding_px: u32,
    /// Animation duration in seconds.
    pub duration_secs: f64,
}

/// Keeps the current overlays as `GeoJSON` features.
///
/// Suitable for headless use or for handing a `FeatureCollection` to any web
/// map: markers are `Point` features, the search window a `Polygon`.
#[derive(Debug, Clone, Default)]
pub struct GeoJsonRenderer {
    next_id: u64,
    overlays: BTreeMap<OverlayId, geojson::Feature>,
    viewport: Option<Viewport>,
    notices: Vec<String>,
}

impl GeoJsonRenderer {
    /// Creates an empty renderer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All overlays currently drawn, in the order they were added.
    #[must_use]
    pub fn feature_collection(&self) -> geojson::FeatureCollection {
        geojson::FeatureCollection {
            bbox: self.viewport.as_ref().map(|v| v.bbox.clone()),
            features: self.overlays.values().cloned().collect(),
            foreign_members: None,
        }
    }

    /// Number of overlays currently drawn.
    #[must_use]
    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    /// Number of marker overlays currently drawn.
    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.overlays
            .values()
            .filter(|f| {
                f.property("kind")
                    .and_then(serde_json::Value::as_str)
                    .is_some_and(|k| k == "marker")
            })
            .count()
    }

    /// Last camera request.
    #[must_use]
    pub const fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    /// Notices shown so far.
    #[must_use]
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    fn insert(
        &mut self,
        geometry: geojson::Geometry,
        properties: serde_json::Map<String, serde_json::Value>,
    ) -> OverlayId {
        let id = OverlayId(self.next_id);
        self.next_id += 1;

        self.overlays.insert(
            id,
            geojson::Feature {
                bbox: None,
                geometry: Some(geometry),
                id: Some(geojson::feature::Id::Number(id.0.into())),
                properties: Some(properties),
                foreign_members: None,
            },
        );

        id
    }
}

impl MapRenderer for GeoJsonRenderer {
    fn add_marker(&mut self, marker: &MarkerDescriptor) -> OverlayId {
        let mut properties = serde_json::Map::new();
        properties.insert("kind".to_string(), "marker".into());
        properties.insert("incidentId".to_string(), marker.incident_id.clone().into());
        properties.insert("title".to_string(), marker.title.clone().into());
        properties.insert("popup".to_string(), marker.popup.clone().into());
        properties.insert("groupCount".to_string(), marker.group_count.into());

        self.insert(shapes::point_geometry(&marker.coordinate), properties)
    }

    fn add_rectangle(&mut self, window: &SearchWindow, style: &RectangleStyle) -> OverlayId {
        let mut properties = serde_json::Map::new();
        properties.insert("kind".to_string(), "searchWindow".into());
        properties.insert("color".to_string(), style.color.clone().into());
        properties.insert("weight".to_string(), style.weight.into());
        properties.insert("fillOpacity".to_string(), style.fill_opacity.into());

        self.insert(shapes::window_geometry(window), properties)
    }

    fn remove_overlay(&mut self, id: OverlayId) {
        if self.overlays.remove(&id).is_none() {
            log::debug!("Ignoring removal of unknown overlay {id:?}");
        }
    }

    fn fly_to_bounds(&mut self, window: &SearchWindow, options: &FlyToOptions) {
        self.viewport = Some(Viewport {
            bbox: shapes::bbox(window),
            padding_px: options.padding_px,
            duration_secs: options.duration_secs,
        });
    }

    fn show_notice(&mut self, message: &str) {
        log::warn!("{message}");
        self.notices.push(message.to_string());
    }
}
