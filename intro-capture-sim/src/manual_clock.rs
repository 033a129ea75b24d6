use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use intro_capture_core::traits::clock::Clock;

/// Clock that only moves when told to. Monotonic and wall-clock time advance together.
pub struct ManualClock {
    origin: Instant,
    state: Mutex<(Duration, DateTime<Utc>)>,
}

impl ManualClock {
    pub fn new(utc_now: DateTime<Utc>) -> Self {
        Self {
            origin: Instant::now(),
            state: Mutex::new((Duration::ZERO, utc_now)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut state = self.state.lock();
        state.0 += by;
        state.1 += chrono::Duration::from_std(by).unwrap_or(chrono::Duration::zero());
    }

    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }

    pub fn advance_days(&self, days: u32) {
        self.advance(Duration::from_secs(u64::from(days) * 86_400));
    }

    /// Jump the wall clock without moving monotonic time.
    pub fn set_utc(&self, utc_now: DateTime<Utc>) {
        self.state.lock().1 = utc_now;
    }
}

impl Clock for ManualClock {
    fn instant(&self) -> Instant {
        self.origin + self.state.lock().0
    }

    fn utc_now(&self) -> DateTime<Utc> {
        self.state.lock().1
    }
}
