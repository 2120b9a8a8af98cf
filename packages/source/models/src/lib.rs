#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime event record types and the structured query spec.
//!
//! Socrata datasets return flat JSON objects whose values are all strings.
//! [`RawEventRecord`] keeps that shape untouched; [`EventRecord`] is the
//! typed view produced by reading only the fields named in a
//! [`DatasetFields`] mapping. [`QuerySpec`] describes a bounded,
//! time-filtered request before it is rendered to `SoQL`.

use std::fmt::Write as _;

use chrono::NaiveDateTime;
use crime_radius_geo_models::Coordinate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Timestamp format used in `SoQL` floating timestamp literals.
pub const SOQL_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// A record exactly as returned by the remote data source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawEventRecord(pub serde_json::Map<String, serde_json::Value>);

impl RawEventRecord {
    /// Reads a field as a trimmed, non-empty string.
    ///
    /// Numbers are accepted and rendered with their JSON representation so a
    /// source that sends `47.6` instead of `"47.6"` still parses.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<String> {
        match self.0.get(field)? {
            serde_json::Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for RawEventRecord {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(map)
    }
}

/// Names of the columns a dataset uses for each field the pipeline reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetFields {
    /// Report number shared by every offense row of one incident.
    pub incident_id: String,
    /// Human-readable offense description.
    pub offense: String,
    /// When the offense happened; used for filtering and ordering.
    pub timestamp: String,
    /// Latitude column (stored as text).
    pub latitude: String,
    /// Longitude column (stored as text).
    pub longitude: String,
    /// Block-level address.
    pub block_address: String,
}

impl DatasetFields {
    /// Columns requested in `$select`, in a stable order.
    #[must_use]
    pub fn projection(&self) -> Vec<String> {
        vec![
            self.timestamp.clone(),
            self.offense.clone(),
            self.latitude.clone(),
            self.longitude.clone(),
            self.incident_id.clone(),
            self.block_address.clone(),
        ]
    }
}

/// Typed view of a [`RawEventRecord`].
///
/// Every field is optional: the parse step never fails, it just leaves out
/// what it could not read. Consumers decide which fields they require.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Incident (report) identifier.
    pub incident_id: Option<String>,
    /// Offense description.
    pub offense: Option<String>,
    /// When the offense happened, in the source's local time.
    pub occurred_at: Option<NaiveDateTime>,
    /// Location, when both components parse into a valid, non-placeholder
    /// coordinate.
    pub coordinate: Option<Coordinate>,
    /// Block-level address (e.g. `"18XX BLOCK OF 38TH AVE E"`).
    pub block_address: Option<String>,
}

impl EventRecord {
    /// Reads the mapped fields out of a raw record.
    #[must_use]
    pub fn from_raw(raw: &RawEventRecord, fields: &DatasetFields) -> Self {
        let coordinate = match (raw.text(&fields.latitude), raw.text(&fields.longitude)) {
            (Some(lat), Some(lng)) => parse_coordinate(&lat, &lng),
            _ => None,
        };

        Self {
            incident_id: raw.text(&fields.incident_id),
            offense: raw.text(&fields.offense),
            occurred_at: raw
                .text(&fields.timestamp)
                .as_deref()
                .and_then(parse_floating_timestamp),
            coordinate,
            block_address: raw.text(&fields.block_address),
        }
    }
}

/// Parses a Socrata floating timestamp (with or without fractional seconds,
/// with either a `T` or a space separator).
#[must_use]
pub fn parse_floating_timestamp(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];

    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

/// Parses a coordinate from text. Returns `None` if either side is not a
/// number, is out of range, or the pair is exactly `0,0` (the "null island"
/// placeholder some sources use for missing locations). Points on the
/// equator or the prime meridian alone are kept.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn parse_coordinate(lat: &str, lng: &str) -> Option<Coordinate> {
    let latitude = lat.trim().parse::<f64>().ok()?;
    let longitude = lng.trim().parse::<f64>().ok()?;
    if latitude == 0.0 && longitude == 0.0 {
        return None;
    }
    Coordinate::new(latitude, longitude).ok()
}

/// Sort direction of an `$order` clause.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SortDirection {
    /// Oldest first.
    Asc,
    /// Newest first.
    Desc,
}

/// A single `$where` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    /// `field::number <= value`
    NumberAtMost {
        /// Text column holding a number.
        field: String,
        /// Inclusive upper bound.
        value: f64,
    },
    /// `field::number >= value`
    NumberAtLeast {
        /// Text column holding a number.
        field: String,
        /// Inclusive lower bound.
        value: f64,
    },
    /// `field >= 'timestamp'`
    TimestampAtLeast {
        /// Floating timestamp column.
        field: String,
        /// Inclusive lower bound.
        value: NaiveDateTime,
    },
    /// `field != 'value'`
    NotEqual {
        /// Column to compare.
        field: String,
        /// Excluded value.
        value: String,
    },
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NumberAtMost { field, value } => write!(f, "{field}::number <= {value}"),
            Self::NumberAtLeast { field, value } => write!(f, "{field}::number >= {value}"),
            Self::TimestampAtLeast { field, value } => write!(
                f,
                "{field} >= '{}'",
                value.format(SOQL_TIMESTAMP_FORMAT)
            ),
            Self::NotEqual { field, value } => {
                write!(f, "{field} != '{}'", value.replace('\'', "''"))
            }
        }
    }
}

/// A bounded, time-filtered, projected, ordered query.
///
/// Built once per admitted click and rendered with
/// [`QuerySpec::to_query_string`]; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySpec {
    /// Columns for `$select`.
    pub select: Vec<String>,
    /// Predicates joined with `AND` for `$where`.
    pub filters: Vec<Predicate>,
    /// Column for `$order`.
    pub order_by: String,
    /// Direction for `$order`.
    pub direction: SortDirection,
    /// Optional `$limit`.
    pub limit: Option<u64>,
}

impl QuerySpec {
    /// Renders the `$where` expression.
    #[must_use]
    pub fn where_clause(&self) -> String {
        self.filters
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Renders `$select`, `$where`, `$order` (and `$limit`) joined with `&`.
    ///
    /// The result is not percent-encoded.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut query = format!("$select={}", self.select.join(","));

        if !self.filters.is_empty() {
            write!(query, "&$where={}", self.where_clause()).unwrap();
        }

        write!(query, "&$order={} {}", self.order_by, self.direction).unwrap();

        if let Some(limit) = self.limit {
            write!(query, "&$limit={limit}").unwrap();
        }

        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seattle_fields() -> DatasetFields {
        DatasetFields {
            incident_id: "report_number".to_string(),
            offense: "offense".to_string(),
            timestamp: "offense_start_datetime".to_string(),
            latitude: "latitude".to_string(),
            longitude: "longitude".to_string(),
            block_address: "_100_block_address".to_string(),
        }
    }

    fn raw(value: serde_json::Value) -> RawEventRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn parses_full_record() {
        let record = raw(serde_json::json!({
            "report_number": "2020-925762",
            "offense": "Theft From Motor Vehicle",
            "offense_start_datetime": "2020-11-12T01:11:00.000",
            "latitude": "47.635193980",
            "longitude": "-122.284032940",
            "_100_block_address": "18XX BLOCK OF 38TH AVE E",
            "beat": "C2"
        }));
        let event = EventRecord::from_raw(&record, &seattle_fields());

        assert_eq!(event.incident_id.as_deref(), Some("2020-925762"));
        assert_eq!(event.offense.as_deref(), Some("Theft From Motor Vehicle"));
        assert_eq!(
            event.occurred_at.unwrap().to_string(),
            "2020-11-12 01:11:00"
        );
        let c = event.coordinate.unwrap();
        assert!((c.latitude() - 47.635_193_98).abs() < 1e-9);
        assert_eq!(
            event.block_address.as_deref(),
            Some("18XX BLOCK OF 38TH AVE E")
        );
    }

    #[test]
    fn missing_and_empty_fields_read_as_none() {
        let record = raw(serde_json::json!({
            "report_number": "  ",
            "latitude": "REDACTED",
            "longitude": "-122.3"
        }));
        let event = EventRecord::from_raw(&record, &seattle_fields());

        assert!(event.incident_id.is_none());
        assert!(event.offense.is_none());
        assert!(event.occurred_at.is_none());
        assert!(event.coordinate.is_none());
        assert!(event.block_address.is_none());
    }

    #[test]
    fn numeric_json_values_are_read() {
        let record = raw(serde_json::json!({
            "report_number": 12345,
            "latitude": 47.6,
            "longitude": -122.3
        }));
        let event = EventRecord::from_raw(&record, &seattle_fields());
        assert_eq!(event.incident_id.as_deref(), Some("12345"));
        assert!(event.coordinate.is_some());
    }

    #[test]
    fn parses_space_separated_timestamp() {
        let dt = parse_floating_timestamp("2020-11-14 10:12:31").unwrap();
        assert_eq!(dt.to_string(), "2020-11-14 10:12:31");
        assert!(parse_floating_timestamp("yesterday").is_none());
    }

    #[test]
    fn rejects_null_island_and_out_of_range() {
        assert!(parse_coordinate("0.0", "0.0").is_none());
        assert!(parse_coordinate("0", "-0.0").is_none());
        assert!(parse_coordinate("95.0", "-122.3").is_none());
        assert!(parse_coordinate("47.6", "abc").is_none());
    }

    #[test]
    fn keeps_points_on_equator_or_prime_meridian() {
        let greenwich = parse_coordinate("51.4779", "0.0").unwrap();
        assert!((greenwich.latitude() - 51.4779).abs() < 1e-12);
        assert!(greenwich.longitude().abs() < f64::EPSILON);

        let quito = parse_coordinate("0.0", "-78.4678").unwrap();
        assert!(quito.latitude().abs() < f64::EPSILON);
        assert!((quito.longitude() + 78.4678).abs() < 1e-12);
    }

    #[test]
    fn renders_predicates() {
        let at_most = Predicate::NumberAtMost {
            field: "latitude".to_string(),
            value: 47.5,
        };
        assert_eq!(at_most.to_string(), "latitude::number <= 47.5");

        let since = Predicate::TimestampAtLeast {
            field: "offense_start_datetime".to_string(),
            value: parse_floating_timestamp("2020-01-02T03:04:05.006").unwrap(),
        };
        assert_eq!(
            since.to_string(),
            "offense_start_datetime >= '2020-01-02T03:04:05.006'"
        );

        let not_equal = Predicate::NotEqual {
            field: "block".to_string(),
            value: "O'NEIL".to_string(),
        };
        assert_eq!(not_equal.to_string(), "block != 'O''NEIL'");
    }

    #[test]
    fn renders_query_string() {
        let spec = QuerySpec {
            select: vec!["a".to_string(), "b".to_string()],
            filters: vec![
                Predicate::NumberAtLeast {
                    field: "a".to_string(),
                    value: 1.0,
                },
                Predicate::NumberAtMost {
                    field: "a".to_string(),
                    value: 2.0,
                },
            ],
            order_by: "b".to_string(),
            direction: SortDirection::Desc,
            limit: Some(10),
        };
        assert_eq!(
            spec.to_query_string(),
            "$select=a,b&$where=a::number >= 1 AND a::number <= 2&$order=b DESC&$limit=10"
        );
    }

    #[test]
    fn projection_has_every_rendered_field() {
        let fields = seattle_fields();
        let projection = fields.projection();
        assert_eq!(projection.len(), 6);
        assert!(projection.contains(&fields.incident_id));
        assert!(projection.contains(&fields.block_address));
    }
}
