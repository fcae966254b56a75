//! Time-window segments
//!
//! A [`TimeWindowSegment`] binds one animated property to a half-open window
//! `[start, end)` of a timeline. While the timeline plays inside the window,
//! the property animates toward its target over the time left in the window;
//! pausing inside the window freezes it where it is.
//!
//! Transitions are edge-triggered: a segment only commands its property when
//! its phase actually changes, and leaving the window resets the phase so the
//! next entry (for example after the timeline loops) triggers again.

use crate::easing::Easing;
use crate::property::AnimatableProperty;
use crate::scheduler::{TimelineScheduler, TimelineSignal, TimelineUpdate, MAX_TIMELINE_SECS};
use pauseline_core::{Result, SubscriptionId, TimelineError};
use std::time::Duration;

/// Earliest allowed window start
///
/// Time 0 is where the timeline loops back to; windows start strictly after
/// it so a reset never doubles as a window entry.
pub const MIN_WINDOW_START: f64 = 0.1;

/// A half-open interval `[start, end)` on the timeline
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeWindow {
    start: f64,
    end: f64,
}

impl TimeWindow {
    /// Create a window, clamping `start` up to [`MIN_WINDOW_START`]
    ///
    /// `end` may not lie past [`MAX_TIMELINE_SECS`].
    pub fn new(start: f64, end: f64) -> Result<Self> {
        if !start.is_finite() || !end.is_finite() || end > MAX_TIMELINE_SECS {
            return Err(TimelineError::InvalidWindow { start, end });
        }
        let start = start.max(MIN_WINDOW_START);
        if start >= end {
            return Err(TimelineError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time < self.end
    }

    /// Time left in the window at `time`
    pub fn remaining(&self, time: f64) -> f64 {
        (self.end - time).max(0.0)
    }
}

/// Whether a segment is driving its animation or holding its value
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SegmentPhase {
    #[default]
    Inactive,
    Active,
}

/// One animated property bound to a window of the timeline
pub struct TimeWindowSegment<P> {
    name: String,
    window: TimeWindow,
    target_value: f64,
    easing: Easing,
    /// Value restored when the timeline is published at exactly 0
    rewind_value: Option<f64>,
    property: P,
    phase: SegmentPhase,
    playing: bool,
    current_time: f64,
}

impl<P: AnimatableProperty> TimeWindowSegment<P> {
    pub fn new(window: TimeWindow, target_value: f64, property: P) -> Result<Self> {
        if !target_value.is_finite() {
            return Err(TimelineError::InvalidValue {
                name: "target_value".to_string(),
                value: target_value,
            });
        }
        Ok(Self {
            name: String::new(),
            window,
            target_value,
            easing: Easing::EaseInOut,
            rewind_value: None,
            property,
            phase: SegmentPhase::Inactive,
            playing: false,
            current_time: 0.0,
        })
    }

    /// Set a name used in log output
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Restore `value` whenever the timeline returns to 0
    pub fn with_rewind_value(mut self, value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(TimelineError::InvalidValue {
                name: "rewind_value".to_string(),
                value,
            });
        }
        self.rewind_value = Some(value);
        Ok(self)
    }

    /// Register this segment's window start with `scheduler` and subscribe
    ///
    /// The scheduler takes ownership of the segment; share the property
    /// (see [`SharedProperty`](crate::property::SharedProperty)) to keep
    /// reading it.
    pub fn attach(mut self, scheduler: &mut TimelineScheduler) -> Result<SubscriptionId>
    where
        P: 'static,
    {
        scheduler.register_wake_time(self.window.start())?;
        let id = scheduler.subscribe(move |update| self.on_update(update));
        Ok(id)
    }

    /// React to one published timeline change
    pub fn on_update(&mut self, update: &TimelineUpdate) {
        self.playing = update.playing;
        self.current_time = update.current_time;

        match update.signal {
            TimelineSignal::CurrentTime => {
                if self.current_time == 0.0 {
                    if let Some(value) = self.rewind_value {
                        self.property.animate_to(value, Duration::ZERO, self.easing);
                    }
                }
                if !self.window.contains(self.current_time) {
                    self.phase = SegmentPhase::Inactive;
                }
                self.update_phase();
            }
            TimelineSignal::Playing => self.update_phase(),
        }
    }

    fn update_phase(&mut self) {
        if !self.window.contains(self.current_time) {
            return;
        }
        let desired = if self.playing {
            SegmentPhase::Active
        } else {
            SegmentPhase::Inactive
        };
        if desired == self.phase {
            return;
        }
        self.phase = desired;

        match desired {
            SegmentPhase::Inactive => {
                let held = self.property.value();
                tracing::debug!(segment = %self.name, time = self.current_time, held, "segment frozen");
                self.property.animate_to(held, Duration::ZERO, self.easing);
            }
            SegmentPhase::Active => {
                let remaining = self.window.remaining(self.current_time);
                tracing::debug!(
                    segment = %self.name,
                    time = self.current_time,
                    remaining,
                    target = self.target_value,
                    "segment animating"
                );
                self.property.animate_to(
                    self.target_value,
                    Duration::from_secs_f64(remaining),
                    self.easing,
                );
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn target_value(&self) -> f64 {
        self.target_value
    }

    pub fn phase(&self) -> SegmentPhase {
        self.phase
    }

    /// Current value of the bound property
    pub fn current_value(&self) -> f64 {
        self.property.value()
    }

    pub fn property(&self) -> &P {
        &self.property
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{AnimationCommand, RecordingProperty, TweenedProperty};
    use pauseline_core::ManualClock;
    use std::sync::Arc;

    fn segment(start: f64, end: f64, target: f64) -> TimeWindowSegment<RecordingProperty<TweenedProperty>> {
        let clock = ManualClock::new();
        let property = RecordingProperty::new(TweenedProperty::new(Arc::new(clock), -30.0));
        TimeWindowSegment::new(TimeWindow::new(start, end).unwrap(), target, property).unwrap()
    }

    fn time(current_time: f64, playing: bool) -> TimelineUpdate {
        TimelineUpdate {
            signal: TimelineSignal::CurrentTime,
            playing,
            current_time,
        }
    }

    fn playing(current_time: f64, playing: bool) -> TimelineUpdate {
        TimelineUpdate {
            signal: TimelineSignal::Playing,
            playing,
            current_time,
        }
    }

    fn commands<P: AnimatableProperty>(seg: &TimeWindowSegment<RecordingProperty<P>>) -> Vec<AnimationCommand> {
        seg.property().commands().to_vec()
    }

    #[test]
    fn test_window_clamps_start() {
        let w = TimeWindow::new(0.0, 1.0).unwrap();
        assert_eq!(w.start(), MIN_WINDOW_START);
        assert!(!w.contains(0.0));
        assert!(w.contains(0.1));
        assert!(!w.contains(1.0));
    }

    #[test]
    fn test_window_rejects_malformed() {
        assert!(TimeWindow::new(2.0, 1.0).is_err());
        assert!(TimeWindow::new(1.0, 1.0).is_err());
        assert!(TimeWindow::new(0.0, 0.05).is_err());
        assert!(TimeWindow::new(f64::NAN, 1.0).is_err());
        assert!(TimeWindow::new(1.0, 1e20).is_err());
    }

    #[test]
    fn test_longest_window_activates() {
        let mut seg = segment(1.0, MAX_TIMELINE_SECS, 0.0);
        seg.on_update(&time(1.0, true));

        let cmds = commands(&seg);
        assert_eq!(cmds.len(), 1);
        assert_eq!(
            cmds[0].duration,
            Duration::from_secs_f64(MAX_TIMELINE_SECS - 1.0)
        );
    }

    #[test]
    fn test_rejects_non_finite_target() {
        let clock = ManualClock::new();
        let property = TweenedProperty::new(Arc::new(clock), 0.0);
        let window = TimeWindow::new(1.0, 2.0).unwrap();
        assert!(TimeWindowSegment::new(window, f64::NAN, property).is_err());
    }

    #[test]
    fn test_entering_window_while_playing_activates() {
        let mut seg = segment(1.0, 1.7, 0.0);
        seg.on_update(&time(1.0, true));

        assert_eq!(seg.phase(), SegmentPhase::Active);
        let cmds = commands(&seg);
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].target, 0.0);
        assert!((cmds[0].duration.as_secs_f64() - 0.7).abs() < 1e-9);
        assert_eq!(cmds[0].easing, Easing::EaseInOut);
    }

    #[test]
    fn test_outside_window_is_ignored() {
        let mut seg = segment(1.0, 1.7, 0.0);
        seg.on_update(&time(0.5, true));
        seg.on_update(&playing(0.5, false));
        seg.on_update(&time(2.0, true));
        assert!(commands(&seg).is_empty());
        assert_eq!(seg.phase(), SegmentPhase::Inactive);
    }

    #[test]
    fn test_redundant_updates_do_not_retrigger() {
        let mut seg = segment(1.0, 1.7, 0.0);
        seg.on_update(&time(1.0, true));
        seg.on_update(&playing(1.0, true));
        seg.on_update(&time(1.2, true));
        assert_eq!(commands(&seg).len(), 1);
    }

    #[test]
    fn test_pause_mid_window_freezes() {
        let mut seg = segment(1.0, 1.7, 0.0);
        seg.on_update(&time(1.0, true));
        seg.on_update(&time(1.3, true));
        seg.on_update(&playing(1.3, false));

        assert_eq!(seg.phase(), SegmentPhase::Inactive);
        let cmds = commands(&seg);
        assert_eq!(cmds.len(), 2);
        assert!(cmds[1].is_freeze());
        assert_eq!(cmds[1].target, seg.current_value());
    }

    #[test]
    fn test_resume_mid_window_uses_remaining_time() {
        let mut seg = segment(1.0, 1.7, 0.0);
        seg.on_update(&time(1.0, true));
        seg.on_update(&time(1.3, false));
        seg.on_update(&playing(1.3, false));
        seg.on_update(&playing(1.3, true));

        let cmds = commands(&seg);
        let last = cmds.last().unwrap();
        assert_eq!(last.target, 0.0);
        assert!((last.duration.as_secs_f64() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_leaving_window_resets_phase() {
        let mut seg = segment(1.0, 1.7, 0.0);
        seg.on_update(&time(1.0, true));
        seg.on_update(&time(2.0, true));
        assert_eq!(seg.phase(), SegmentPhase::Inactive);

        seg.on_update(&time(0.0, true));
        seg.on_update(&time(1.0, true));
        assert_eq!(seg.phase(), SegmentPhase::Active);
        assert_eq!(commands(&seg).len(), 2);
    }

    #[test]
    fn test_rewind_value_restores_on_zero() {
        let mut seg = segment(1.0, 1.7, 0.0).with_rewind_value(-30.0).unwrap();
        seg.on_update(&time(1.0, true));
        seg.on_update(&time(0.0, true));

        let cmds = commands(&seg);
        assert_eq!(cmds.len(), 2);
        assert!(cmds[1].is_freeze());
        assert_eq!(cmds[1].target, -30.0);
        assert_eq!(seg.current_value(), -30.0);
    }

    #[test]
    fn test_attach_registers_window_start() {
        let clock = ManualClock::new();
        let mut scheduler = TimelineScheduler::with_clock(3.5, Arc::new(clock.clone())).unwrap();
        let seg = segment(0.0, 1.0, 1.0);

        let id = seg.attach(&mut scheduler).unwrap();
        assert_eq!(scheduler.wake_times(), &[MIN_WINDOW_START, 3.5]);
        assert_eq!(scheduler.subscriber_count(), 1);
        assert!(scheduler.unsubscribe(id));
    }
}
