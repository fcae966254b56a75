//! Pauseline Animation
//!
//! Play/pause-able virtual timelines that wake only at the moments something
//! changes, and the time-window segments that animate on them.
//!
//! # Features
//!
//! - **Timeline Scheduler**: a virtual clock with one armed wake-up at a time
//! - **Time-Window Segments**: edge-triggered animations bound to `[start, end)`
//! - **Pause Anywhere**: pausing mid-window freezes, resuming finishes on time
//! - **Looping**: reaching the loop length rewinds to 0 and keeps playing
//! - **Compositions**: TOML descriptions of a timeline and its segments
//! - **Realtime Driver**: a tokio task that sleeps until the next wake-up
//!
//! # Example
//!
//! ```
//! use pauseline_animation::{
//!     AnimatableProperty, TimeWindow, TimeWindowSegment, TimelineScheduler, TweenedProperty,
//! };
//! use pauseline_core::ManualClock;
//! use std::sync::{Arc, Mutex};
//!
//! let clock = ManualClock::new();
//! let mut timeline = TimelineScheduler::with_clock(3.5, Arc::new(clock.clone())).unwrap();
//!
//! let rotation = Arc::new(Mutex::new(TweenedProperty::new(Arc::new(clock.clone()), -30.0)));
//! TimeWindowSegment::new(TimeWindow::new(1.0, 1.7).unwrap(), 0.0, rotation.clone())
//!     .unwrap()
//!     .attach(&mut timeline)
//!     .unwrap();
//!
//! timeline.toggle_playing();
//! clock.advance_secs(1.0);
//! timeline.poll();
//! clock.advance_secs(0.7);
//! assert!(rotation.value().abs() < 1e-9);
//! ```

pub mod composition;
pub mod driver;
pub mod easing;
pub mod property;
pub mod scheduler;
pub mod segment;
pub mod values;


pub use composition::{Composition, CompositionConfig, SegmentConfig};
pub use driver::{ConfigureFn, TimelineCommand, TimelineController, TimelineDriver, TokioClock};
pub use easing::Easing;
pub use property::{
    AnimatableProperty, AnimationCommand, RecordingProperty, SharedProperty, TweenedProperty,
};
pub use scheduler::{TimelineScheduler, TimelineSignal, TimelineUpdate, MAX_TIMELINE_SECS};
pub use segment::{SegmentPhase, TimeWindow, TimeWindowSegment, MIN_WINDOW_START};
pub use values::{Interpolate, Transition};
