//! Animatable value types
//!
//! Provides the interpolation trait and a single eased transition between
//! two values, sampled against wall-clock instants.

use crate::easing::Easing;
use std::time::{Duration, Instant};

/// Trait for values that can be linearly interpolated
pub trait Interpolate: Clone {
    /// Linearly interpolate between self and other by factor t (0.0 to 1.0)
    fn lerp(&self, other: &Self, t: f64) -> Self;

    /// Check if two values are approximately equal
    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool;
}

// ============================================================================
// Scalar Implementations
// ============================================================================

impl Interpolate for f64 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t
    }

    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self - other).abs() < epsilon
    }
}

// ============================================================================
// Transition
// ============================================================================

/// One eased move from `from` to `to`, starting at a wall-clock instant
#[derive(Clone, Debug)]
pub struct Transition<T: Interpolate> {
    from: T,
    to: T,
    started: Instant,
    duration: Duration,
    easing: Easing,
}

impl<T: Interpolate> Transition<T> {
    pub fn new(from: T, to: T, started: Instant, duration: Duration, easing: Easing) -> Self {
        Self {
            from,
            to,
            started,
            duration,
            easing,
        }
    }

    /// Get linear progress (0.0 to 1.0) at `now`
    pub fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Sample the eased value at `now`
    pub fn sample(&self, now: Instant) -> T {
        let eased = self.easing.apply(self.progress(now));
        self.from.lerp(&self.to, eased)
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }

    pub fn target(&self) -> &T {
        &self.to
    }
}
