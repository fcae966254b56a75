//! Animated property contract
//!
//! A timeline segment never draws anything. It drives an
//! [`AnimatableProperty`]: something with a readable/settable float value and
//! an "animate to X over D using curve C" command whose effect is only
//! observable through the value getter over time.

use crate::easing::Easing;
use crate::values::{Interpolate, Transition};
use pauseline_core::SharedClock;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// The rendering-side half of an animated property
pub trait AnimatableProperty: Send {
    /// Current (possibly mid-transition) value
    fn value(&self) -> f64;

    /// Jump to `value`, dropping any running transition
    fn set_value(&mut self, value: f64);

    /// Start animating from the current value to `target`
    ///
    /// A zero `duration` behaves like [`set_value`](Self::set_value).
    fn animate_to(&mut self, target: f64, duration: Duration, easing: Easing);
}

/// A property shared between a segment and whoever renders it
pub type SharedProperty<P> = Arc<Mutex<P>>;

impl<P: AnimatableProperty> AnimatableProperty for Arc<Mutex<P>> {
    fn value(&self) -> f64 {
        self.lock().unwrap().value()
    }

    fn set_value(&mut self, value: f64) {
        self.lock().unwrap().set_value(value);
    }

    fn animate_to(&mut self, target: f64, duration: Duration, easing: Easing) {
        self.lock().unwrap().animate_to(target, duration, easing);
    }
}

/// One `animate_to` call as seen by the property
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationCommand {
    pub target: f64,
    pub duration: Duration,
    pub easing: Easing,
}

impl AnimationCommand {
    /// True for the zero-duration "hold this value" command
    pub fn is_freeze(&self) -> bool {
        self.duration.is_zero()
    }
}

// ============================================================================
// Tweened Property
// ============================================================================

/// A float property that tweens between values on a clock
///
/// Starting a new transition mid-flight begins from wherever the property
/// currently sits, so pausing (a zero-duration move to the current value)
/// and resuming never makes the value jump.
pub struct TweenedProperty {
    clock: SharedClock,
    base: f64,
    transition: Option<Transition<f64>>,
}

impl TweenedProperty {
    pub fn new(clock: SharedClock, initial: f64) -> Self {
        Self {
            clock,
            base: initial,
            transition: None,
        }
    }

    /// Check if a transition is still running
    pub fn is_animating(&self) -> bool {
        self.transition
            .as_ref()
            .is_some_and(|t| !t.is_finished(self.clock.now()))
    }

    /// Target of the running (or last) transition, or the resting value
    pub fn target(&self) -> f64 {
        self.transition
            .as_ref()
            .map(|t| *t.target())
            .unwrap_or(self.base)
    }
}

impl AnimatableProperty for TweenedProperty {
    fn value(&self) -> f64 {
        match &self.transition {
            Some(transition) => transition.sample(self.clock.now()),
            None => self.base,
        }
    }

    fn set_value(&mut self, value: f64) {
        self.base = value;
        self.transition = None;
    }

    fn animate_to(&mut self, target: f64, duration: Duration, easing: Easing) {
        if duration.is_zero() {
            self.set_value(target);
            return;
        }
        let from = self.value();
        if from.approx_eq(&target, f64::EPSILON) {
            self.set_value(target);
            return;
        }
        self.transition = Some(Transition::new(
            from,
            target,
            self.clock.now(),
            duration,
            easing,
        ));
    }
}

impl std::fmt::Debug for TweenedProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TweenedProperty")
            .field("value", &self.value())
            .field("target", &self.target())
            .finish()
    }
}

// ============================================================================
// Recording Property
// ============================================================================

/// Wraps a property and records every command issued to it
#[derive(Debug)]
pub struct RecordingProperty<P> {
    inner: P,
    commands: Vec<AnimationCommand>,
}

impl<P: AnimatableProperty> RecordingProperty<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[AnimationCommand] {
        &self.commands
    }

    pub fn last_command(&self) -> Option<&AnimationCommand> {
        self.commands.last()
    }

    /// Drain recorded commands
    pub fn take_commands(&mut self) -> Vec<AnimationCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: AnimatableProperty> AnimatableProperty for RecordingProperty<P> {
    fn value(&self) -> f64 {
        self.inner.value()
    }

    fn set_value(&mut self, value: f64) {
        self.inner.set_value(value);
    }

    fn animate_to(&mut self, target: f64, duration: Duration, easing: Easing) {
        self.commands.push(AnimationCommand {
            target,
            duration,
            easing,
        });
        self.inner.animate_to(target, duration, easing);
    }
}
