//! Radius query construction.
//!
//! A click becomes a square [`SearchWindow`] around the clicked point, a
//! lower bound on the offense timestamp, a projection of the columns the
//! markers need, and a newest-first ordering. The resulting [`QuerySpec`] is
//! rendered to `$select=...&$where=...&$order=...` and percent-encoded with
//! `encodeURI` rules.

use chrono::{NaiveDateTime, TimeDelta};
use crime_radius_geo::search_window;
use crime_radius_geo_models::{Coordinate, SearchWindow};
use crime_radius_source_models::{Predicate, QuerySpec, SortDirection};

use crate::SourceError;
use crate::dataset::DatasetDefinition;

/// Parameters shared by every query a session issues.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusQuery {
    /// Half-width of the square search window, in feet.
    pub radius_feet: f64,
    /// How far back from "now" to include events.
    pub lookback: TimeDelta,
    /// Whether to exclude rows carrying the dataset's redaction sentinel.
    pub exclude_redacted: bool,
    /// Optional cap on the number of returned rows.
    pub limit: Option<u64>,
}

/// A built query: the window it covers, its structured form, and the
/// encoded request URL.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedQuery {
    /// Search window, also drawn as the highlight rectangle.
    pub window: SearchWindow,
    /// Structured query.
    pub spec: QuerySpec,
    /// Percent-encoded request URL.
    pub url: String,
}

impl RadiusQuery {
    /// Creates query parameters with redaction exclusion on and no limit.
    #[must_use]
    pub const fn new(radius_feet: f64, lookback: TimeDelta) -> Self {
        Self {
            radius_feet,
            lookback,
            exclude_redacted: true,
            limit: None,
        }
    }

    /// Builds the query for a click at `center`, with the timestamp bound
    /// measured back from `now` (the source's local wall-clock time).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Geo`] if the radius is invalid, or
    /// [`SourceError::Dataset`] if the lookback reaches outside of the
    /// representable date range.
    pub fn build(
        &self,
        dataset: &DatasetDefinition,
        center: Coordinate,
        now: NaiveDateTime,
    ) -> Result<BoundedQuery, SourceError> {
        let window = search_window(center, self.radius_feet)?;
        let since = now
            .checked_sub_signed(self.lookback)
            .ok_or_else(|| SourceError::Dataset {
                message: format!("lookback of {} overflows the date range", self.lookback),
            })?;

        let fields = &dataset.fields;
        let mut filters = Vec::with_capacity(6);

        // The sentinel can't be cast to a number, so it has to be excluded
        // before the numeric comparisons.
        if self.exclude_redacted
            && let Some(redaction) = &dataset.redaction
        {
            filters.push(Predicate::NotEqual {
                field: redaction.field.clone(),
                value: redaction.sentinel.clone(),
            });
        }

        filters.extend([
            Predicate::NumberAtMost {
                field: fields.latitude.clone(),
                value: window.max.latitude(),
            },
            Predicate::NumberAtMost {
                field: fields.longitude.clone(),
                value: window.max.longitude(),
            },
            Predicate::NumberAtLeast {
                field: fields.latitude.clone(),
                value: window.min.latitude(),
            },
            Predicate::NumberAtLeast {
                field: fields.longitude.clone(),
                value: window.min.longitude(),
            },
            Predicate::TimestampAtLeast {
                field: fields.timestamp.clone(),
                value: since,
            },
        ]);

        let spec = QuerySpec {
            select: fields.projection(),
            filters,
            order_by: fields.timestamp.clone(),
            direction: SortDirection::Desc,
            limit: self.limit,
        };

        let url = encode_uri(&format!("{}?{}", dataset.api_url, spec.to_query_string()));
        log::debug!("Built query for {center} within {} ft: {url}", self.radius_feet);

        Ok(BoundedQuery { window, spec, url })
    }
}

/// Builds the encoded request URL for a click at `center`.
///
/// Shorthand for [`RadiusQuery::build`] with default options.
///
/// # Errors
///
/// See [`RadiusQuery::build`].
pub fn build_query(
    dataset: &DatasetDefinition,
    center: Coordinate,
    radius_feet: f64,
    lookback: TimeDelta,
    now: NaiveDateTime,
) -> Result<String, SourceError> {
    Ok(RadiusQuery::new(radius_feet, lookback)
        .build(dataset, center, now)?
        .url)
}

/// Percent-encodes a full URL the way `encodeURI` does: URI reserved
/// characters and unreserved marks are kept, every other byte of the UTF-8
/// encoding becomes `%XX`.
#[must_use]
pub fn encode_uri(s: &str) -> String {
    const KEEP: &[u8] = b"-_.!~*'();,/?:@&=+$#";

    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        if byte.is_ascii_alphanumeric() || KEEP.contains(&byte) {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}
