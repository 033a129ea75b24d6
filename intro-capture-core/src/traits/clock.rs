use std::time::Instant;

use chrono::{DateTime, Utc};

/// Time source for countdowns, recording limits and persisted timestamps.
pub trait Clock: Send + Sync {
    /// Monotonic time, used for elapsed-time measurements.
    fn instant(&self) -> Instant;

    /// Wall-clock time, used for persisted timestamps and lock evaluation.
    fn utc_now(&self) -> DateTime<Utc>;
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn instant(&self) -> Instant {
        Instant::now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
