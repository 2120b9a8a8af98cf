//! Marker generation: one marker per incident.

use chrono::NaiveDateTime;
use crime_radius_geo_models::Coordinate;
use serde::{Deserialize, Serialize};

use crate::{IncidentGroup, IncidentGroups};

/// Display format for marker timestamps (e.g. `Nov 12, 2020 1:11 AM`).
pub const DISPLAY_TIME_FORMAT: &str = "%b %-d, %Y %-I:%M %p";

const UNKNOWN_OFFENSE: &str = "Unknown offense";

/// Everything a map needs to draw one incident marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerDescriptor {
    /// Incident identifier the marker stands for.
    pub incident_id: String,
    /// Marker position.
    pub coordinate: Coordinate,
    /// Hover title: offense and time.
    pub title: String,
    /// Popup body, one fact per line.
    pub popup: String,
    /// How many offense rows were folded into this marker.
    pub group_count: usize,
}

/// Formats a timestamp for marker titles and popups.
#[must_use]
pub fn format_time(time: &NaiveDateTime) -> String {
    time.format(DISPLAY_TIME_FORMAT).to_string()
}

/// Builds the marker for a group from its representative row.
///
/// Returns `None` if the representative has no usable coordinate.
#[must_use]
pub fn to_marker(group: &IncidentGroup) -> Option<MarkerDescriptor> {
    let representative = group.representative();
    let Some(coordinate) = representative.coordinate else {
        log::warn!(
            "Incident {} has no usable coordinate, skipping marker",
            group.incident_id()
        );
        return None;
    };

    let offense = representative.offense.as_deref().unwrap_or(UNKNOWN_OFFENSE);
    let time = representative.occurred_at.as_ref().map(format_time);

    let title = match &time {
        Some(time) => format!("{offense} - {time}"),
        None => offense.to_string(),
    };

    let mut lines = vec![offense.to_string()];
    if let Some(time) = time {
        lines.push(time);
    }
    lines.push(format!("Report {}", group.incident_id()));
    if let Some(address) = &representative.block_address {
        lines.push(address.clone());
    }

    Some(MarkerDescriptor {
        incident_id: group.incident_id().to_string(),
        coordinate,
        title,
        popup: lines.join("\n"),
        group_count: group.len(),
    })
}

/// Builds the full replacement marker set for a query result.
#[must_use]
pub fn markers(groups: &IncidentGroups) -> Vec<MarkerDescriptor> {
    groups.iter().filter_map(to_marker).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate;
    use crime_radius_source_models::{DatasetFields, EventRecord, RawEventRecord};

    fn fields() -> DatasetFields {
        DatasetFields {
            incident_id: "report_number".to_string(),
            offense: "offense".to_string(),
            timestamp: "offense_start_datetime".to_string(),
            latitude: "latitude".to_string(),
            longitude: "longitude".to_string(),
            block_address: "_100_block_address".to_string(),
        }
    }

    fn parse(value: serde_json::Value) -> EventRecord {
        let raw: RawEventRecord = serde_json::from_value(value).unwrap();
        EventRecord::from_raw(&raw, &fields())
    }

    #[test]
    fn shared_report_number_yields_one_marker_from_first_row() {
        let records = vec![
            parse(serde_json::json!({
                "report_number": "2020-925762",
                "offense": "Theft From Motor Vehicle",
                "offense_start_datetime": "2020-11-12T01:11:00.000",
                "latitude": "47.635193980",
                "longitude": "-122.284032940",
                "_100_block_address": "18XX BLOCK OF 38TH AVE E"
            })),
            parse(serde_json::json!({
                "report_number": "2020-925762",
                "offense": "Destruction/Damage/Vandalism of Property",
                "offense_start_datetime": "2020-11-12T01:11:00.000",
                "latitude": "47.635193980",
                "longitude": "-122.284032940",
                "_100_block_address": "18XX BLOCK OF 38TH AVE E"
            })),
        ];

        let groups = aggregate(records);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups.get("2020-925762").unwrap().len(), 2);

        let markers = markers(&groups);
        assert_eq!(markers.len(), 1);
        let marker = &markers[0];
        assert_eq!(
            marker.title,
            "Theft From Motor Vehicle - Nov 12, 2020 1:11 AM"
        );
        assert!(!marker.title.contains("Vandalism"));
        assert!(!marker.popup.contains("Vandalism"));
        assert_eq!(
            marker.popup,
            "Theft From Motor Vehicle\nNov 12, 2020 1:11 AM\nReport 2020-925762\n18XX BLOCK OF 38TH AVE E"
        );
        assert_eq!(marker.group_count, 2);
    }

    #[test]
    fn missing_offense_and_time_still_make_a_marker() {
        let groups = aggregate(vec![parse(serde_json::json!({
            "report_number": "1",
            "latitude": "47.6",
            "longitude": "-122.3"
        }))]);
        let marker = to_marker(groups.get("1").unwrap()).unwrap();
        assert_eq!(marker.title, "Unknown offense");
        assert_eq!(marker.popup, "Unknown offense\nReport 1");
    }

    #[test]
    fn representative_without_coordinate_is_skipped() {
        let groups = aggregate(vec![
            parse(serde_json::json!({
                "report_number": "1",
                "offense": "Burglary",
                "latitude": "REDACTED",
                "longitude": "REDACTED"
            })),
            parse(serde_json::json!({
                "report_number": "2",
                "offense": "Robbery",
                "latitude": "47.6",
                "longitude": "-122.3"
            })),
        ]);
        let markers = markers(&groups);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].incident_id, "2");
    }

    #[test]
    fn afternoon_times_use_pm() {
        let time = crime_radius_source_models::parse_floating_timestamp("2024-03-05T15:07:00")
            .unwrap();
        assert_eq!(format_time(&time), "Mar 5, 2024 3:07 PM");
    }
}
