//! Compositions
//!
//! A composition is a timeline plus the segments that animate on it,
//! described in TOML:
//!
//! ```toml
//! max_time = 3.5
//! autoplay = false
//!
//! [[segment]]
//! name = "rotation"
//! start = 1.0
//! end = 1.7
//! from = -30.0
//! to = 0.0
//! easing = "ease-in-out"
//! ```

use crate::easing::Easing;
use crate::property::{AnimatableProperty, SharedProperty, TweenedProperty};
use crate::scheduler::{TimelineScheduler, MAX_TIMELINE_SECS};
use crate::segment::{TimeWindow, TimeWindowSegment};
use pauseline_core::{Result, SharedClock, TimelineError};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Top-level composition description
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CompositionConfig {
    /// Loop length in seconds
    pub max_time: f64,
    /// Wake times not tied to any segment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_wake_times: Vec<f64>,
    /// Start playing as soon as the composition is built
    #[serde(default)]
    pub autoplay: bool,
    #[serde(default, rename = "segment")]
    pub segments: Vec<SegmentConfig>,
}

/// One animated property of a composition
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SegmentConfig {
    pub name: String,
    pub start: f64,
    pub end: f64,
    /// Initial value, restored whenever the timeline loops
    pub from: f64,
    /// Value reached at the end of the window
    pub to: f64,
    #[serde(default)]
    pub easing: Easing,
}

impl CompositionConfig {
    /// The clapper composition: a board that swings shut, then slides away
    pub fn demo() -> Self {
        Self {
            max_time: 3.5,
            extra_wake_times: Vec::new(),
            autoplay: false,
            segments: vec![
                SegmentConfig {
                    name: "rotation".to_string(),
                    start: 1.0,
                    end: 1.7,
                    from: -30.0,
                    to: 0.0,
                    easing: Easing::EaseInOut,
                },
                SegmentConfig {
                    name: "offset".to_string(),
                    start: 2.0,
                    end: 3.0,
                    from: 0.0,
                    to: -300.0,
                    easing: Easing::EaseInOut,
                },
            ],
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|err| TimelineError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|err| TimelineError::InvalidConfig(err.to_string()))
    }

    /// Check every value without building anything
    pub fn validate(&self) -> Result<()> {
        if !self.max_time.is_finite() || self.max_time <= 0.0 || self.max_time > MAX_TIMELINE_SECS {
            return Err(TimelineError::InvalidMaxTime {
                max_time: self.max_time,
            });
        }
        if let Some(&time) = self.extra_wake_times.iter().find(|t| !t.is_finite()) {
            return Err(TimelineError::InvalidWakeTime { time });
        }
        for segment in &self.segments {
            TimeWindow::new(segment.start, segment.end)?;
            for (field, value) in [("from", segment.from), ("to", segment.to)] {
                if !value.is_finite() {
                    return Err(TimelineError::InvalidValue {
                        name: format!("{}.{}", segment.name, field),
                        value,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self::demo()
    }
}

/// A built composition: the scheduler with every segment attached
pub struct Composition {
    pub scheduler: TimelineScheduler,
    properties: Vec<(String, SharedProperty<TweenedProperty>)>,
}

impl Composition {
    /// Build the scheduler and one tweened property and segment per entry
    pub fn build(config: &CompositionConfig, clock: SharedClock) -> Result<Self> {
        config.validate()?;

        let mut scheduler = TimelineScheduler::with_clock(config.max_time, clock.clone())?
            .with_extra_wake_times(config.extra_wake_times.iter().copied())?;

        let mut properties = Vec::with_capacity(config.segments.len());
        for entry in &config.segments {
            let property: SharedProperty<TweenedProperty> =
                Arc::new(Mutex::new(TweenedProperty::new(clock.clone(), entry.from)));
            let window = TimeWindow::new(entry.start, entry.end)?;
            TimeWindowSegment::new(window, entry.to, property.clone())?
                .with_name(entry.name.clone())
                .with_easing(entry.easing)
                .with_rewind_value(entry.from)?
                .attach(&mut scheduler)?;
            properties.push((entry.name.clone(), property));
        }

        tracing::debug!(
            max_time = config.max_time,
            segments = properties.len(),
            "composition built"
        );

        if config.autoplay {
            scheduler.set_playing(true);
        }

        Ok(Self {
            scheduler,
            properties,
        })
    }

    /// Named properties, in configuration order
    pub fn properties(&self) -> &[(String, SharedProperty<TweenedProperty>)] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&SharedProperty<TweenedProperty>> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p)
    }

    /// Current value of every property
    pub fn values(&self) -> Vec<(String, f64)> {
        self.properties
            .iter()
            .map(|(name, property)| (name.clone(), property.value()))
            .collect()
    }

    /// Split into the scheduler (for a driver) and the property handles
    pub fn into_parts(self) -> (TimelineScheduler, Vec<(String, SharedProperty<TweenedProperty>)>) {
        (self.scheduler, self.properties)
    }
}
