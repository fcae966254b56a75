//! Error types for pauseline

use thiserror::Error;

/// Errors raised while building or driving a timeline
///
/// Scheduling itself is plain arithmetic and cannot fail; these errors come
/// from malformed configuration, which is rejected up front.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimelineError {
    /// Loop length out of range
    #[error("Invalid max time: {max_time} (must be finite, > 0 and within range)")]
    InvalidMaxTime { max_time: f64 },

    /// Segment window must satisfy start < end, with end within range
    #[error("Invalid time window: [{start}, {end})")]
    InvalidWindow { start: f64, end: f64 },

    /// Wake times must be finite
    #[error("Invalid wake time: {time}")]
    InvalidWakeTime { time: f64 },

    /// Property values must be finite
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: f64 },

    /// Composition description could not be parsed
    #[error("Invalid composition: {0}")]
    InvalidConfig(String),

    /// The realtime driver task is no longer running
    #[error("Timeline driver stopped")]
    DriverStopped,
}

/// Result type for pauseline operations
pub type Result<T> = std::result::Result<T, TimelineError>;
