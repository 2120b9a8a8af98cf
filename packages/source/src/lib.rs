#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Remote crime data access for radius searches.
//!
//! A [`dataset::DatasetDefinition`] names a Socrata endpoint and the columns
//! it uses. [`query`] turns a center point, radius, and lookback window into
//! a bounded `SoQL` request URL, and any [`IncidentFetcher`] (the live
//! [`socrata::SocrataClient`] or a test double) resolves that URL into raw
//! event records.

pub mod dataset;
pub mod query;
pub mod registry;
pub mod socrata;

use async_trait::async_trait;
use crime_radius_geo_models::GeoError;
use crime_radius_source_models::RawEventRecord;

/// Errors that can occur while building or running a query.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Response status code.
        status: reqwest::StatusCode,
        /// Request URL.
        url: String,
    },

    /// The response body was JSON but not an array of flat objects.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Description of what went wrong.
        message: String,
    },

    /// Unknown or malformed dataset definition.
    #[error("Dataset error: {message}")]
    Dataset {
        /// Description of what went wrong.
        message: String,
    },

    /// Center, radius, or offset input was rejected.
    #[error("Invalid query input: {0}")]
    Geo(#[from] GeoError),
}

/// Resolves a fully-encoded request URL into raw event records.
///
/// This is the only suspending step of a click cycle. Implementations do not
/// retry; a failure is reported once and left to the caller.
#[async_trait]
pub trait IncidentFetcher: Send + Sync {
    /// Issues the request and decodes the response body.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails, the server returns a
    /// non-success status, or the body is not an array of objects.
    async fn fetch(&self, url: &str) -> Result<Vec<RawEventRecord>, SourceError>;
}

/// Decodes a response body into raw records.
///
/// # Errors
///
/// Returns [`SourceError::InvalidResponse`] if the body is not a JSON array
/// or any element is not an object.
pub fn decode_records(body: serde_json::Value) -> Result<Vec<RawEventRecord>, SourceError> {
    let serde_json::Value::Array(items) = body else {
        return Err(SourceError::InvalidResponse {
            message: "expected a JSON array of records".to_string(),
        });
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            serde_json::Value::Object(map) => Ok(RawEventRecord(map)),
            other => Err(SourceError::InvalidResponse {
                message: format!("record {index} is not an object: {other}"),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_array_of_objects() {
        let body = serde_json::json!([
            {"report_number": "1", "offense": "Burglary"},
            {"report_number": "2"}
        ]);
        let records = decode_records(body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text("offense").as_deref(), Some("Burglary"));
    }

    #[test]
    fn decodes_empty_array() {
        assert!(decode_records(serde_json::json!([])).unwrap().is_empty());
    }

    #[test]
    fn rejects_non_array_body() {
        let body = serde_json::json!({"error": true, "message": "query.soql.no-such-column"});
        assert!(matches!(
            decode_records(body),
            Err(SourceError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn rejects_non_object_record() {
        let body = serde_json::json!([{"report_number": "1"}, "oops"]);
        let err = decode_records(body).unwrap_err();
        assert!(err.to_string().contains("record 1"));
    }
}
