//! Wall-clock sources
//!
//! The timeline never reads `Instant::now()` directly. It asks a [`Clock`],
//! so the same scheduling code runs against the system clock, tokio's clock,
//! or a [`ManualClock`] that only moves when told to.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A source of wall-clock instants
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Shared clock handle
pub type SharedClock = Arc<dyn Clock>;

/// The process monotonic clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves through [`advance`](Self::advance) or [`set`](Self::set)
///
/// Clones share the same reading.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    /// Start at the current system instant
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }

    /// Advance by fractional seconds
    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }

    /// Move the reading to `instant`; moving backwards is ignored
    pub fn set(&self, instant: Instant) {
        let mut now = self.now.lock().unwrap();
        if instant > *now {
            *now = instant;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
}
