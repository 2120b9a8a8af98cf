//! Time sources for the gate and the query lookback.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{NaiveDateTime, TimeDelta};

/// Supplies monotonic time for cooldowns and local wall-clock time for
/// lookback bounds.
pub trait Clock: Send + Sync {
    /// Monotonic instant used for cooldown arithmetic.
    fn now(&self) -> Instant;

    /// Local wall-clock time, without a timezone.
    fn local_now(&self) -> NaiveDateTime;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn local_now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same elapsed time, so a test can keep one handle while a
/// gate or session owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    start: Instant,
    start_local: NaiveDateTime,
    elapsed_ms: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock whose wall-clock time starts at `start_local`.
    #[must_use]
    pub fn new(start_local: NaiveDateTime) -> Self {
        Self {
            start: Instant::now(),
            start_local,
            elapsed_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Moves time forward (millisecond resolution).
    pub fn advance(&self, by: Duration) {
        let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.elapsed_ms.fetch_add(ms, Ordering::SeqCst);
    }

    fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms.load(Ordering::SeqCst))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    fn local_now(&self) -> NaiveDateTime {
        let elapsed = TimeDelta::from_std(self.elapsed()).unwrap_or(TimeDelta::MAX);
        self.start_local
            .checked_add_signed(elapsed)
            .unwrap_or(NaiveDateTime::MAX)
    }
}
