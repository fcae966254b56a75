//! Cancellable one-shot timers
//!
//! [`TimerQueue`] tracks armed deadlines by [`TimerId`]. It never runs code
//! on its own: whoever owns the queue asks for the next deadline, sleeps (or
//! steps a manual clock) until then, and pops the due timer. Cancelling is
//! idempotent, so a stale handle is harmless.

use slotmap::{new_key_type, SlotMap};
use std::time::Instant;

new_key_type! {
    /// Handle to an armed one-shot timer
    pub struct TimerId;
}

#[derive(Clone, Copy, Debug)]
struct ArmedTimer {
    deadline: Instant,
    /// Arming order, breaks ties between equal deadlines
    seq: u64,
}

/// A set of armed one-shot timers
#[derive(Debug, Default)]
pub struct TimerQueue {
    timers: SlotMap<TimerId, ArmedTimer>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self {
            timers: SlotMap::with_key(),
            next_seq: 0,
        }
    }

    /// Arm a timer that becomes due at `deadline`
    pub fn arm(&mut self, deadline: Instant) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let id = self.timers.insert(ArmedTimer { deadline, seq });
        tracing::trace!(?id, "timer armed");
        id
    }

    /// Cancel a timer
    ///
    /// Returns `false` (and does nothing) if the timer already fired or was
    /// already cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let removed = self.timers.remove(id).is_some();
        if removed {
            tracing::trace!(?id, "timer cancelled");
        }
        removed
    }

    /// Check whether a timer is still armed
    pub fn is_armed(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    /// Earliest deadline among armed timers
    pub fn next_deadline(&self) -> Option<Instant> {
        self.earliest().map(|(_, t)| t.deadline)
    }

    /// Remove and return the earliest timer whose deadline is at or before `now`
    pub fn pop_due(&mut self, now: Instant) -> Option<TimerId> {
        let (id, timer) = self.earliest()?;
        if timer.deadline > now {
            return None;
        }
        self.timers.remove(id);
        tracing::trace!(?id, "timer fired");
        Some(id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    fn earliest(&self) -> Option<(TimerId, ArmedTimer)> {
        self.timers
            .iter()
            .min_by_key(|(_, t)| (t.deadline, t.seq))
            .map(|(id, t)| (id, *t))
    }
}
