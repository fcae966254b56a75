//! Timeline scheduler
//!
//! Owns the virtual clock of a play/pause-able timeline and publishes
//! `playing` / `current_time` to its subscribers.
//!
//! The scheduler never polls on a frame cadence. It knows every "wake time"
//! (each segment window start, the loop length, and any extra times given at
//! construction) and arms a single one-shot timer for the next one. When the
//! timer fires, the clock position is recomputed from the wall clock elapsed
//! since play started, published, and the next wake-up is armed. While
//! paused, no timer is armed.
//!
//! ```
//! use pauseline_animation::TimelineScheduler;
//! use pauseline_core::ManualClock;
//! use std::sync::Arc;
//!
//! let clock = ManualClock::new();
//! let mut timeline = TimelineScheduler::with_clock(3.5, Arc::new(clock.clone())).unwrap();
//! timeline.register_wake_time(1.0).unwrap();
//!
//! timeline.toggle_playing();
//! assert_eq!(timeline.next_wake_time(), Some(1.0));
//!
//! clock.advance_secs(1.0);
//! assert!(timeline.poll());
//! assert_eq!(timeline.current_time(), 1.0);
//! ```

use pauseline_core::{
    Clock, Publisher, Result, SharedClock, SubscriptionId, SystemClock, TimelineError, TimerId,
    TimerQueue,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest timeline (and latest window end) accepted, in seconds
///
/// Every wake-up delay and segment duration is at most this long, so they
/// always fit in a [`Duration`] and an [`Instant`] offset.
pub const MAX_TIMELINE_SECS: f64 = 1.0e9;

/// Which published signal changed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimelineSignal {
    Playing,
    CurrentTime,
}

/// A published change, carrying the full state after the change
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelineUpdate {
    pub signal: TimelineSignal,
    pub playing: bool,
    pub current_time: f64,
}

/// Wall-clock instant and virtual time at which playback (re)started
#[derive(Clone, Copy, Debug)]
struct PlayEpoch {
    started: Instant,
    time: f64,
}

/// The armed wake-up and the virtual time it was armed for
#[derive(Clone, Copy, Debug)]
struct PendingWake {
    timer: TimerId,
    at: f64,
}

/// The authoritative clock of one timeline
pub struct TimelineScheduler {
    clock: SharedClock,
    timers: TimerQueue,
    observers: Publisher<TimelineUpdate>,
    playing: bool,
    current_time: f64,
    max_time: f64,
    /// Sorted, deduplicated; always contains `max_time`
    wake_times: Vec<f64>,
    epoch: PlayEpoch,
    pending: Option<PendingWake>,
}

impl TimelineScheduler {
    /// Create a paused timeline of length `max_time` on the system clock
    pub fn new(max_time: f64) -> Result<Self> {
        Self::with_clock(max_time, Arc::new(SystemClock))
    }

    /// Create a paused timeline of length `max_time` on the given clock
    ///
    /// `max_time` must be finite, positive and at most [`MAX_TIMELINE_SECS`].
    pub fn with_clock(max_time: f64, clock: SharedClock) -> Result<Self> {
        if !max_time.is_finite() || max_time <= 0.0 || max_time > MAX_TIMELINE_SECS {
            return Err(TimelineError::InvalidMaxTime { max_time });
        }
        let epoch = PlayEpoch {
            started: clock.now(),
            time: 0.0,
        };
        Ok(Self {
            clock,
            timers: TimerQueue::new(),
            observers: Publisher::new(),
            playing: false,
            current_time: 0.0,
            max_time,
            wake_times: vec![max_time],
            epoch,
            pending: None,
        })
    }

    /// Add wake times that are not tied to any segment
    pub fn with_extra_wake_times<I>(mut self, times: I) -> Result<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        for time in times {
            self.register_wake_time(time)?;
        }
        Ok(self)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Last published clock position
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn max_time(&self) -> f64 {
        self.max_time
    }

    /// All wake times, ascending
    pub fn wake_times(&self) -> &[f64] {
        &self.wake_times
    }

    /// Smallest wake time strictly after the current time
    pub fn next_wake_time(&self) -> Option<f64> {
        let idx = self.wake_times.partition_point(|&t| t <= self.current_time);
        self.wake_times.get(idx).copied()
    }

    /// The armed wake-up timer, if any
    pub fn pending_wake(&self) -> Option<TimerId> {
        self.pending.map(|p| p.timer)
    }

    /// Wall-clock instant at which the armed wake-up is due
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Live clock reading, without publishing it
    ///
    /// While paused this is the frozen `current_time`.
    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_at(self.clock.now())
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Subscribe to `playing` / `current_time` changes
    ///
    /// The subscriber immediately receives the current `playing` value and
    /// then the current time, the same way it would see a live change.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&TimelineUpdate) + Send + 'static,
    {
        let id = self.observers.subscribe(callback);
        let playing = self.update(TimelineSignal::Playing);
        let time = self.update(TimelineSignal::CurrentTime);
        self.observers.publish_to(id, &playing);
        self.observers.publish_to(id, &time);
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }

    // =========================================================================
    // Control
    // =========================================================================

    /// Add a wake time
    ///
    /// When playing, a wake time between the current time and the armed
    /// wake-up replaces that wake-up: the clock is resynchronised from the
    /// wall clock and the earlier wake-up is armed instead.
    pub fn register_wake_time(&mut self, time: f64) -> Result<()> {
        if !time.is_finite() {
            tracing::warn!(time, "ignoring non-finite wake time");
            return Err(TimelineError::InvalidWakeTime { time });
        }

        let idx = self.wake_times.partition_point(|&t| t < time);
        if self.wake_times.get(idx) == Some(&time) {
            return Ok(());
        }
        self.wake_times.insert(idx, time);
        tracing::trace!(time, "wake time registered");

        if !self.playing {
            return Ok(());
        }

        // A wake-up that is already due belongs to the old schedule
        self.poll();

        let earlier = match self.pending {
            Some(pending) => time > self.current_time && time < pending.at,
            None => time > self.current_time,
        };
        if earlier {
            self.cancel_pending();
            let now = self.elapsed_time();
            self.set_current_time(now);
            self.schedule_next_wake();
        }
        Ok(())
    }

    /// Flip between playing and paused
    pub fn toggle_playing(&mut self) {
        self.set_playing(!self.playing);
    }

    /// Play or pause; a no-op if already in the requested state
    pub fn set_playing(&mut self, playing: bool) {
        if playing == self.playing {
            return;
        }

        if playing {
            self.epoch = PlayEpoch {
                started: self.clock.now(),
                time: self.current_time,
            };
            self.playing = true;
            tracing::debug!(current_time = self.current_time, "timeline playing");
            self.publish(TimelineSignal::Playing);
            self.schedule_next_wake();
        } else {
            self.cancel_pending();
            // Elapsed reading needs `playing` still set
            self.current_time = self.elapsed_time();
            self.playing = false;
            tracing::debug!(current_time = self.current_time, "timeline paused");
            self.publish(TimelineSignal::Playing);
            self.publish(TimelineSignal::CurrentTime);
        }
    }

    /// Fire the armed wake-up if it is due
    ///
    /// Returns `true` if a wake-up fired. The realtime driver calls this when
    /// its sleep until [`next_deadline`](Self::next_deadline) ends; offline
    /// callers step their clock and call it directly.
    pub fn poll(&mut self) -> bool {
        let Some(pending) = self.pending else {
            return false;
        };
        let now = self.clock.now();
        match self.timers.pop_due(now) {
            Some(id) if id == pending.timer => {
                self.pending = None;
                // Never land short of the boundary this wake-up was armed for
                let time = self.elapsed_at(now).max(pending.at);
                tracing::trace!(time, armed_for = pending.at, "wake-up fired");
                if time >= self.max_time {
                    // Observers see the loop as a jump straight to 0
                    self.seek_to_beginning();
                } else {
                    self.set_current_time(time);
                }
                self.schedule_next_wake();
                true
            }
            Some(stale) => {
                tracing::trace!(?stale, "dropped stale timer");
                false
            }
            None => false,
        }
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn schedule_next_wake(&mut self) {
        if self.current_time >= self.max_time {
            self.seek_to_beginning();
        }

        if !self.playing {
            return;
        }
        let Some(next) = self.next_wake_time() else {
            return;
        };

        // next > current_time by construction; sub-nanosecond gaps still arm a
        // positive delay
        let delay = Duration::from_secs_f64(next - self.current_time).max(Duration::from_nanos(1));
        let timer = self.timers.arm(self.clock.now() + delay);
        self.pending = Some(PendingWake { timer, at: next });
        tracing::trace!(next, delay_secs = delay.as_secs_f64(), "wake-up armed");
    }

    fn seek_to_beginning(&mut self) {
        tracing::debug!(max_time = self.max_time, "timeline looped to start");
        self.epoch = PlayEpoch {
            started: self.clock.now(),
            time: 0.0,
        };
        self.set_current_time(0.0);
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.timers.cancel(pending.timer);
        }
    }

    fn elapsed_at(&self, now: Instant) -> f64 {
        if self.playing {
            self.epoch.time + now.saturating_duration_since(self.epoch.started).as_secs_f64()
        } else {
            self.current_time
        }
    }

    fn set_current_time(&mut self, time: f64) {
        self.current_time = time;
        self.publish(TimelineSignal::CurrentTime);
    }

    fn update(&self, signal: TimelineSignal) -> TimelineUpdate {
        TimelineUpdate {
            signal,
            playing: self.playing,
            current_time: self.current_time,
        }
    }

    fn publish(&mut self, signal: TimelineSignal) {
        let update = self.update(signal);
        self.observers.publish(&update);
    }
}

impl std::fmt::Debug for TimelineScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimelineScheduler")
            .field("playing", &self.playing)
            .field("current_time", &self.current_time)
            .field("max_time", &self.max_time)
            .field("wake_times", &self.wake_times)
            .field("pending", &self.pending)
            .finish()
    }
}
