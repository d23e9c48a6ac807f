use crate::classifier::ClassifierConfig;
use crate::ingestion::RawEvent;

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// An admitted event plus pipeline bookkeeping.
///
/// Created on admission, dropped when a worker finishes with it or when it is shed.
#[derive(Debug, Clone)]
pub struct QueuedRecord {
    pub event: RawEvent,
    pub enqueued_at: Instant,
    /// How many times the drain task moved this record from overflow into primary.
    pub readmissions: u32,
}

impl QueuedRecord {
    pub fn new(event: RawEvent) -> Self {
        Self {
            event,
            enqueued_at: Instant::now(),
            readmissions: 0,
        }
    }

    /// Time spent between admission and now.
    pub fn queued_for(&self) -> Duration {
        self.enqueued_at.elapsed()
    }
}

/// Sizing and classification settings consumed by the pipeline.
///
/// Defaults mirror the production deployment: a small primary queue, a ten times
/// larger overflow buffer and five workers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Capacity of the primary queue (`P`).
    pub primary_capacity: usize,
    /// Capacity of the overflow queue (`F`).
    pub overflow_capacity: usize,
    /// Number of workers (`W`). Zero is allowed and leaves admitted events queued.
    pub workers: usize,
    /// Period of the overflow drain task.
    pub drain_interval_ms: u64,
    pub classifier: ClassifierConfig,
}

impl PipelineConfig {
    pub fn drain_interval(&self) -> Duration {
        Duration::from_millis(self.drain_interval_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            primary_capacity: 10,
            overflow_capacity: 100,
            workers: 5,
            drain_interval_ms: 100,
            classifier: ClassifierConfig::default(),
        }
    }
}

/// Where `submit` put an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Primary,
    Overflow,
    Dropped,
    /// The pipeline is shutting down.
    Refused,
}

impl PipelineConfig {
    /// Rejects settings the queues cannot be built with.
    pub fn validate(&self) -> Result<(), crate::config::ConfigError> {
        use crate::config::ConfigError;

        if self.primary_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "primary_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.overflow_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "overflow_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.drain_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "drain_interval_ms",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
