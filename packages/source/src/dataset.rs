//! Config-driven dataset definitions.
//!
//! [`DatasetDefinition`] captures everything the radius query needs to know
//! about one Socrata dataset: where it lives and which columns hold the
//! incident id, offense, timestamp, location, and address.

use crime_radius_source_models::DatasetFields;
use serde::Deserialize;

use crate::SourceError;

/// A Socrata dataset that can be searched by radius.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatasetDefinition {
    /// Unique identifier (e.g., `"seattle"`).
    pub id: String,
    /// Human-readable name (e.g., `"Seattle Police Department"`).
    pub name: String,
    /// City covered by the dataset.
    pub city: String,
    /// Two-letter state abbreviation.
    pub state: String,
    /// Resource endpoint (e.g., `"https://data.seattle.gov/resource/tazs-3rd5.json"`).
    pub api_url: String,
    /// Human-readable portal page for the dataset.
    #[serde(default)]
    pub portal_url: Option<String>,
    /// Column names for each field the pipeline reads.
    pub fields: DatasetFields,
    /// How the dataset marks rows whose location was withheld.
    #[serde(default)]
    pub redaction: Option<Redaction>,
}

/// Sentinel a dataset writes into a column for redacted rows.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Redaction {
    /// Column holding the sentinel.
    pub field: String,
    /// The sentinel value (e.g., `"REDACTED"`).
    pub sentinel: String,
}

/// Parses a TOML string into a [`DatasetDefinition`].
///
/// # Errors
///
/// Returns [`SourceError::Dataset`] if the TOML is malformed, missing a
/// required field, or names an endpoint that is not an absolute `http(s)`
/// URL.
pub fn parse_dataset_toml(toml_str: &str) -> Result<DatasetDefinition, SourceError> {
    let dataset: DatasetDefinition =
        toml::de::from_str(toml_str).map_err(|e| SourceError::Dataset {
            message: e.to_string(),
        })?;

    let url = reqwest::Url::parse(&dataset.api_url).map_err(|e| SourceError::Dataset {
        message: format!("{}: invalid api_url {:?}: {e}", dataset.id, dataset.api_url),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SourceError::Dataset {
            message: format!("{}: api_url must be http(s)", dataset.id),
        });
    }

    Ok(dataset)
}
