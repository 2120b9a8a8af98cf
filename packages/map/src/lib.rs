#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Click-to-markers orchestration.
//!
//! A [`session::Session`] owns everything that lives across clicks: the
//! debounce gate, the overlays currently on the map, and the sequence
//! counter that keeps slow responses from overwriting newer ones. Each
//! admitted click runs one cycle: build the radius query, fetch, group rows
//! by incident, and replace the drawn markers and search window.

pub mod config;
pub mod renderer;
pub mod session;

use crime_radius_source::SourceError;

pub use config::MapConfig;
pub use renderer::{GeoJsonRenderer, MapRenderer, OverlayId};
pub use session::{ClickOutcome, PendingClick, Session};

/// Errors that can occur while setting up or running a session.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// Query construction or dataset lookup failed.
    #[error(transparent)]
    Query(#[from] SourceError),

    /// The configuration is malformed or out of range.
    #[error("Invalid config: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },

    /// I/O error (config file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
