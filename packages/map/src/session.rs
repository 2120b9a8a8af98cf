//! The per-user interaction session.
//!
//! A click cycle is split in two so overlapping fetches can be driven
//! explicitly:
//!
//! 1. [`Session::begin_click`] asks the gate for admission and builds the
//!    query, tagging it with a sequence number.
//! 2. [`Session::complete_click`] takes the fetch result and, unless a newer
//!    click has already been applied, replaces the drawn overlays.
//!
//! [`Session::handle_click`] runs both halves around the fetcher.

use crime_radius_gate::{ClickGate, Clock, GateState, SystemClock};
use crime_radius_geo_models::{Coordinate, SearchWindow};
use crime_radius_incident::aggregate;
use crime_radius_incident::markers::{MarkerDescriptor, markers};
use crime_radius_source::dataset::DatasetDefinition;
use crime_radius_source::query::{BoundedQuery, RadiusQuery};
use crime_radius_source::registry::dataset_by_id;
use crime_radius_source::{IncidentFetcher, SourceError};
use crime_radius_source_models::{EventRecord, RawEventRecord};

use crate::MapError;
use crate::config::{FlyToOptions, MapConfig, RectangleStyle};
use crate::renderer::{MapRenderer, OverlayId};

/// An admitted click waiting for its fetch to finish.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingClick {
    /// Position of this click among admitted clicks, starting at 1.
    pub sequence: u64,
    /// Where the user clicked.
    pub center: Coordinate,
    /// The query to fetch.
    pub query: BoundedQuery,
}

/// What a click turned into.
#[derive(Debug)]
pub enum ClickOutcome {
    /// The gate was closed; nothing happened.
    Ignored,
    /// New markers and search window are on the map.
    Rendered {
        /// Sequence number of the applied click.
        sequence: u64,
        /// Distinct incidents in the response.
        incidents: usize,
        /// Markers drawn (incidents with a usable location).
        markers: usize,
        /// Rows dropped for lacking an incident identifier.
        dropped: usize,
    },
    /// A newer click was already applied; this response was discarded.
    Stale {
        /// Sequence number of the discarded click.
        sequence: u64,
    },
    /// The fetch failed; the previous overlays were left in place.
    Failed {
        /// Sequence number of the failed click.
        sequence: u64,
        /// Why the fetch failed.
        error: SourceError,
    },
}

#[derive(Debug, Default)]
struct DrawnOverlays {
    markers: Vec<OverlayId>,
    window: Option<OverlayId>,
}

/// Session state for one map: gate, drawn overlays, and request sequencing.
pub struct Session<F, R, C = SystemClock> {
    dataset: DatasetDefinition,
    query: RadiusQuery,
    rectangle: RectangleStyle,
    fly_to: FlyToOptions,
    fetcher: F,
    renderer: R,
    gate: ClickGate<C>,
    drawn: DrawnOverlays,
    current_markers: Vec<MarkerDescriptor>,
    current_window: Option<SearchWindow>,
    next_sequence: u64,
    last_applied: u64,
}

impl<F, R> Session<F, R, SystemClock>
where
    F: IncidentFetcher,
    R: MapRenderer,
{
    /// Creates a session on the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] if the config is invalid or names an unknown
    /// dataset.
    pub fn new(config: &MapConfig, fetcher: F, renderer: R) -> Result<Self, MapError> {
        Self::with_clock(config, fetcher, renderer, SystemClock)
    }
}

impl<F, R, C> Session<F, R, C>
where
    F: IncidentFetcher,
    R: MapRenderer,
    C: Clock,
{
    /// Creates a session on the given clock.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] if the config is invalid or names an unknown
    /// dataset.
    pub fn with_clock(
        config: &MapConfig,
        fetcher: F,
        renderer: R,
        clock: C,
    ) -> Result<Self, MapError> {
        config.validate()?;
        let dataset = dataset_by_id(&config.dataset)?;
        log::debug!(
            "Session on {} ({}), radius {} ft, lookback {} days",
            dataset.name,
            dataset.api_url,
            config.radius_feet,
            config.lookback_days
        );

        Ok(Self {
            dataset,
            query: config.radius_query(),
            rectangle: config.rectangle.clone(),
            fly_to: config.fly_to,
            fetcher,
            renderer,
            gate: ClickGate::with_clock(clock, config.cooldown()),
            drawn: DrawnOverlays::default(),
            current_markers: Vec::new(),
            current_window: None,
            next_sequence: 1,
            last_applied: 0,
        })
    }

    /// Runs a full click cycle: admit, query, fetch, aggregate, render.
    ///
    /// Fetch failures are reported through [`ClickOutcome::Failed`] (and a
    /// renderer notice), not as an `Err`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Query`] if the query cannot be built.
    pub async fn handle_click(&mut self, center: Coordinate) -> Result<ClickOutcome, MapError> {
        let Some(pending) = self.begin_click(center)? else {
            return Ok(ClickOutcome::Ignored);
        };

        let result = self.fetcher.fetch(&pending.query.url).await;
        Ok(self.complete_click(pending, result))
    }

    /// Admits a click and builds its query, or returns `None` if the gate is
    /// closed.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Query`] if the query cannot be built.
    pub fn begin_click(&mut self, center: Coordinate) -> Result<Option<PendingClick>, MapError> {
        if !self.gate.try_admit() {
            return Ok(None);
        }

        let now = self.gate.clock().local_now();
        let query = self.query.build(&self.dataset, center, now)?;

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        log::debug!("Click #{sequence} admitted at {center}");

        Ok(Some(PendingClick {
            sequence,
            center,
            query,
        }))
    }

    /// Applies a fetch result for a pending click.
    pub fn complete_click(
        &mut self,
        pending: PendingClick,
        result: Result<Vec<RawEventRecord>, SourceError>,
    ) -> ClickOutcome {
        let sequence = pending.sequence;
        if sequence <= self.last_applied {
            log::info!(
                "Discarding response for click #{sequence}, click #{} already applied",
                self.last_applied
            );
            return ClickOutcome::Stale { sequence };
        }
        self.last_applied = sequence;

        let records = match result {
            Ok(records) => records,
            Err(error) => {
                log::warn!("Fetch for click #{sequence} failed: {error}");
                self.renderer
                    .show_notice(&format!("Could not load crime reports: {error}"));
                return ClickOutcome::Failed { sequence, error };
            }
        };

        let events = records
            .iter()
            .map(|raw| EventRecord::from_raw(raw, &self.dataset.fields));
        let groups = aggregate(events);
        let new_markers = markers(&groups);

        log::info!(
            "Click #{sequence}: {} records, {} incidents, {} markers",
            records.len(),
            groups.len(),
            new_markers.len()
        );
        if groups.dropped() > 0 {
            log::info!(
                "Click #{sequence}: dropped {} records without a {}",
                groups.dropped(),
                self.dataset.fields.incident_id
            );
        }

        self.replace_overlays(new_markers, pending.query.window);

        ClickOutcome::Rendered {
            sequence,
            incidents: groups.len(),
            markers: self.current_markers.len(),
            dropped: groups.dropped(),
        }
    }

    fn replace_overlays(&mut self, new_markers: Vec<MarkerDescriptor>, window: SearchWindow) {
        let old = std::mem::take(&mut self.drawn);
        for id in old.markers.into_iter().chain(old.window) {
            self.renderer.remove_overlay(id);
        }

        self.drawn.markers = new_markers
            .iter()
            .map(|marker| self.renderer.add_marker(marker))
            .collect();
        self.drawn.window = Some(self.renderer.add_rectangle(&window, &self.rectangle));
        self.renderer.fly_to_bounds(&window, &self.fly_to);

        self.current_markers = new_markers;
        self.current_window = Some(window);
    }

    /// Gate state as of now.
    #[must_use]
    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    /// Markers from the last applied response.
    #[must_use]
    pub fn current_markers(&self) -> &[MarkerDescriptor] {
        &self.current_markers
    }

    /// Search window of the last applied response.
    #[must_use]
    pub const fn current_window(&self) -> Option<&SearchWindow> {
        self.current_window.as_ref()
    }

    /// The dataset being queried.
    #[must_use]
    pub const fn dataset(&self) -> &DatasetDefinition {
        &self.dataset
    }

    /// The fetcher, for driving overlapping requests by hand.
    #[must_use]
    pub const fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// The rendering collaborator.
    #[must_use]
    pub const fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Consumes the session, returning the renderer.
    #[must_use]
    pub fn into_renderer(self) -> R {
        self.renderer
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::NaiveDateTime;
    use crime_radius_gate::ManualClock;

    use super::*;
    use crate::renderer::GeoJsonRenderer;

    /// Replays canned responses in order and remembers requested URLs.
    #[derive(Default)]
    struct ScriptedFetcher {
        responses: Mutex<VecDeque<Result<Vec<RawEventRecord>, SourceError>>>,
        urls: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn push(&self, response: Result<Vec<RawEventRecord>, SourceError>) {
            self.responses.lock().unwrap().push_back(response);
        }

        fn urls(&self) -> Vec<String> {
            self.urls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl IncidentFetcher for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<RawEventRecord>, SourceError> {
            self.urls.lock().unwrap().push(url.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn start() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2023-06-15 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn session() -> (
        Session<ScriptedFetcher, GeoJsonRenderer, ManualClock>,
        ManualClock,
    ) {
        let clock = ManualClock::new(start());
        let session = Session::with_clock(
            &MapConfig::default(),
            ScriptedFetcher::default(),
            GeoJsonRenderer::new(),
            clock.clone(),
        )
        .unwrap();
        (session, clock)
    }

    fn center() -> Coordinate {
        Coordinate::new(47.6, -122.3).unwrap()
    }

    fn row(id: &str, offense: &str, lat: &str, lng: &str) -> RawEventRecord {
        serde_json::from_value(serde_json::json!({
            "report_number": id,
            "offense": offense,
            "offense_start_datetime": "2023-06-01T10:30:00.000",
            "latitude": lat,
            "longitude": lng,
            "_100_block_address": "1XX BLOCK OF PIKE ST"
        }))
        .unwrap()
    }

    fn two_incidents() -> Vec<RawEventRecord> {
        vec![
            row("2020-925762", "Theft From Motor Vehicle", "47.6001", "-122.3001"),
            row("2020-925762", "Destruction/Damage/Vandalism of Property", "47.6001", "-122.3001"),
            row("2020-100000", "Burglary/Breaking & Entering", "47.5999", "-122.2999"),
        ]
    }

    #[tokio::test]
    async fn admitted_click_renders_one_marker_per_incident() {
        let (mut session, _) = session();
        session.fetcher().push(Ok(two_incidents()));

        let outcome = session.handle_click(center()).await.unwrap();
        assert!(matches!(
            outcome,
            ClickOutcome::Rendered {
                sequence: 1,
                incidents: 2,
                markers: 2,
                dropped: 0
            }
        ));

        let markers = session.current_markers();
        assert_eq!(markers[0].incident_id, "2020-925762");
        assert!(markers[0].title.starts_with("Theft From Motor Vehicle"));
        assert_eq!(markers[0].group_count, 2);

        let renderer = session.renderer();
        assert_eq!(renderer.marker_count(), 2);
        assert_eq!(renderer.overlay_count(), 3);
        assert!(renderer.viewport().is_some());
        assert!(session.current_window().unwrap().contains(&center()));
    }

    #[tokio::test]
    async fn request_url_targets_dataset_with_lookback() {
        let (mut session, _) = session();
        session.handle_click(center()).await.unwrap();

        let urls = session.fetcher().urls();
        assert_eq!(urls.len(), 1);
        assert!(urls[0].starts_with("https://data.seattle.gov/resource/tazs-3rd5.json?"));
        // 182 days before 2023-06-15T12:00
        assert!(urls[0].contains("'2022-12-15T12:00:00.000'"), "{}", urls[0]);
    }

    #[tokio::test]
    async fn clicks_during_cooldown_are_ignored() {
        let (mut session, clock) = session();
        session.fetcher().push(Ok(two_incidents()));
        session.handle_click(center()).await.unwrap();

        clock.advance(Duration::from_millis(500));
        let outcome = session.handle_click(center()).await.unwrap();
        assert!(matches!(outcome, ClickOutcome::Ignored));
        assert_eq!(session.fetcher().urls().len(), 1);
        assert_eq!(session.gate_state(), GateState::Closed);

        clock.advance(Duration::from_millis(500));
        assert_eq!(session.gate_state(), GateState::Open);
        let outcome = session.handle_click(center()).await.unwrap();
        assert!(matches!(
            outcome,
            ClickOutcome::Rendered { sequence: 2, .. }
        ));
    }

    #[tokio::test]
    async fn new_result_replaces_previous_overlays() {
        let (mut session, clock) = session();
        session.fetcher().push(Ok(two_incidents()));
        session.handle_click(center()).await.unwrap();

        clock.advance(Duration::from_secs(2));
        session
            .fetcher()
            .push(Ok(vec![row("2023-1", "Robbery", "47.61", "-122.31")]));
        session
            .handle_click(Coordinate::new(47.61, -122.31).unwrap())
            .await
            .unwrap();

        let renderer = session.renderer();
        assert_eq!(renderer.marker_count(), 1);
        assert_eq!(renderer.overlay_count(), 2);
        assert_eq!(session.current_markers()[0].incident_id, "2023-1");
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_markers_and_notifies() {
        let (mut session, clock) = session();
        session.fetcher().push(Ok(two_incidents()));
        session.handle_click(center()).await.unwrap();

        clock.advance(Duration::from_secs(2));
        session.fetcher().push(Err(SourceError::InvalidResponse {
            message: "boom".to_string(),
        }));
        let outcome = session.handle_click(center()).await.unwrap();
        assert!(matches!(
            outcome,
            ClickOutcome::Failed { sequence: 2, .. }
        ));

        let renderer = session.renderer();
        assert_eq!(renderer.marker_count(), 2);
        assert_eq!(renderer.notices().len(), 1);
        assert!(renderer.notices()[0].contains("boom"));
        assert_eq!(session.current_markers().len(), 2);
    }

    #[test]
    fn slow_older_response_is_discarded() {
        let (mut session, clock) = session();
        let first = session.begin_click(center()).unwrap().unwrap();
        clock.advance(Duration::from_secs(1));
        let second = session
            .begin_click(Coordinate::new(47.61, -122.31).unwrap())
            .unwrap()
            .unwrap();
        assert_eq!((first.sequence, second.sequence), (1, 2));

        let outcome = session.complete_click(
            second,
            Ok(vec![row("new", "Robbery", "47.61", "-122.31")]),
        );
        assert!(matches!(outcome, ClickOutcome::Rendered { sequence: 2, .. }));

        let outcome = session.complete_click(first, Ok(two_incidents()));
        assert!(matches!(outcome, ClickOutcome::Stale { sequence: 1 }));
        assert_eq!(session.current_markers().len(), 1);
        assert_eq!(session.current_markers()[0].incident_id, "new");
    }

    #[test]
    fn rows_without_identifier_or_location_are_not_drawn() {
        let (mut session, _) = session();
        let pending = session.begin_click(center()).unwrap().unwrap();
        let mut missing_id = row("x", "Arson", "47.6", "-122.3");
        missing_id.0.remove("report_number");

        let outcome = session.complete_click(
            pending,
            Ok(vec![
                missing_id,
                row("redacted", "Assault", "REDACTED", "REDACTED"),
                row("ok", "Burglary", "47.6", "-122.3"),
            ]),
        );
        assert!(matches!(
            outcome,
            ClickOutcome::Rendered {
                incidents: 2,
                markers: 1,
                dropped: 1,
                ..
            }
        ));
        assert_eq!(session.renderer().marker_count(), 1);
    }

    #[test]
    fn unknown_dataset_is_rejected() {
        let config = MapConfig {
            dataset: "atlantis".to_string(),
            ..MapConfig::default()
        };
        let result = Session::new(&config, ScriptedFetcher::default(), GeoJsonRenderer::new());
        assert!(matches!(result, Err(MapError::Query(SourceError::Dataset { .. }))));
    }
}
