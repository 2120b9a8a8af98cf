#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Click debounce gate.
//!
//! The gate is the only admission control between a user and the remote data
//! source. It starts [`GateState::Open`]; an admitted click closes it until a
//! fixed cooldown has passed. Clicks while closed are ignored outright (no
//! queueing). Instead of a timer callback, the gate stores the instant it
//! reopens and compares against an injected [`Clock`] on every request.

pub mod clock;

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use clock::{Clock, ManualClock, SystemClock};

/// Default cooldown between admitted clicks.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(1000);

/// Whether the gate will admit the next click.
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
pub enum GateState {
    /// The next click triggers a query.
    Open,
    /// Clicks are ignored until the cooldown elapses.
    Closed,
}

/// Two-state debounce gate driven by a monotonic "reopen at" instant.
#[derive(Debug, Clone)]
pub struct ClickGate<C = SystemClock> {
    clock: C,
    cooldown: Duration,
    reopen_at: Option<Instant>,
}

impl ClickGate<SystemClock> {
    /// Creates an open gate on the system clock.
    #[must_use]
    pub const fn new(cooldown: Duration) -> Self {
        Self::with_clock(SystemClock, cooldown)
    }
}

impl Default for ClickGate<SystemClock> {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl<C: Clock> ClickGate<C> {
    /// Creates an open gate on the given clock.
    #[must_use]
    pub const fn with_clock(clock: C, cooldown: Duration) -> Self {
        Self {
            clock,
            cooldown,
            reopen_at: None,
        }
    }

    /// Current state, as of the clock's current instant.
    #[must_use]
    pub fn state(&self) -> GateState {
        match self.reopen_at {
            Some(reopen_at) if self.clock.now() < reopen_at => GateState::Closed,
            _ => GateState::Open,
        }
    }

    /// Requests admission for a click.
    ///
    /// Returns `true` and closes the gate for the cooldown if it was open;
    /// returns `false` without changing anything if it was closed.
    pub fn try_admit(&mut self) -> bool {
        let now = self.clock.now();
        if let Some(reopen_at) = self.reopen_at
            && now < reopen_at
        {
            log::debug!(
                "Click ignored, gate reopens in {:?}",
                reopen_at.duration_since(now)
            );
            return false;
        }

        self.reopen_at = Some(now + self.cooldown);
        true
    }

    /// The configured cooldown.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// The gate's clock.
    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }
}
