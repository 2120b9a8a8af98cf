//! Live Socrata SODA API fetcher.
//!
//! Issues a single GET per admitted click. Unlike a bulk sync there is no
//! pagination, no retry, and no backoff: a failed request is reported to the
//! caller, which leaves the previous results on screen.

use async_trait::async_trait;
use crime_radius_source_models::RawEventRecord;

use crate::{IncidentFetcher, SourceError, decode_records};

/// [`IncidentFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct SocrataClient {
    client: reqwest::Client,
}

impl SocrataClient {
    /// Creates a client with default `reqwest` settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing `reqwest` client (to share its connection pool or
    /// apply custom timeouts).
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IncidentFetcher for SocrataClient {
    async fn fetch(&self, url: &str) -> Result<Vec<RawEventRecord>, SourceError> {
        log::info!("Fetching {url}");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status,
                url: url.to_string(),
            });
        }

        let body: serde_json::Value = response.json().await?;
        let records = decode_records(body)?;
        log::info!("Received {} records", records.len());

        Ok(records)
    }
}
