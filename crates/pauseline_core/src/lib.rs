//! Pauseline Core Runtime
//!
//! Foundational primitives for the pauseline timeline:
//!
//! - **Publisher**: explicit, synchronous observer lists
//! - **Timers**: cancellable one-shot timers keyed by [`TimerId`]
//! - **Clocks**: wall-clock sources, including a manually stepped clock
//!
//! # Example
//!
//! ```rust
//! use pauseline_core::{Clock, ManualClock, TimerQueue};
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let mut timers = TimerQueue::new();
//!
//! let id = timers.arm(clock.now() + Duration::from_millis(500));
//! assert_eq!(timers.pop_due(clock.now()), None);
//!
//! clock.advance(Duration::from_millis(500));
//! assert_eq!(timers.pop_due(clock.now()), Some(id));
//! ```

pub mod clock;
pub mod error;
pub mod publisher;
pub mod timer;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::{Result, TimelineError};
pub use publisher::{Publisher, Subscriber, SubscriptionId};
pub use timer::{TimerId, TimerQueue};
