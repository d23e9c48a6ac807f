//! Pipeline Counters
//!
//! One injectable object per pipeline instance. Every counter is an independent
//! atomic, so workers, the drain task and producers update them without locking.
//! Readers either copy the current values (`snapshot`) or copy and zero them in one
//! atomic swap per counter (`take`), which is what periodic reporters use.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct PipelineStats {
    submitted: AtomicU64,
    admitted_primary: AtomicU64,
    admitted_overflow: AtomicU64,
    readmitted: AtomicU64,
    dropped: AtomicU64,
    refused: AtomicU64,
    processed: AtomicU64,
    candidates: AtomicU64,
    accepted: AtomicU64,
    published: AtomicU64,
    publish_failures: AtomicU64,
    identity_fallbacks: AtomicU64,
}

/// Plain copy of [`PipelineStats`] at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub submitted: u64,
    pub admitted_primary: u64,
    pub admitted_overflow: u64,
    pub readmitted: u64,
    pub dropped: u64,
    pub refused: u64,
    pub processed: u64,
    pub candidates: u64,
    pub accepted: u64,
    pub published: u64,
    pub publish_failures: u64,
    pub identity_fallbacks: u64,
}

impl StatsSnapshot {
    /// Events that made it into either queue.
    pub fn admitted(&self) -> u64 {
        self.admitted_primary + self.admitted_overflow
    }
}

macro_rules! counters {
    ($($field:ident => $record:ident),* $(,)?) => {
        impl PipelineStats {
            $(
                pub fn $record(&self, n: u64) {
                    self.$field.fetch_add(n, Ordering::Relaxed);
                }

                pub fn $field(&self) -> u64 {
                    self.$field.load(Ordering::Relaxed)
                }
            )*

            pub fn snapshot(&self) -> StatsSnapshot {
                StatsSnapshot {
                    $($field: self.$field.load(Ordering::Relaxed),)*
                }
            }

            /// Reads and zeroes every counter.
            pub fn take(&self) -> StatsSnapshot {
                StatsSnapshot {
                    $($field: self.$field.swap(0, Ordering::Relaxed),)*
                }
            }
        }

        impl StatsSnapshot {
            /// Adds `window` to these totals.
            pub fn accumulate(&mut self, window: &StatsSnapshot) {
                $(self.$field += window.$field;)*
            }
        }
    };
}

counters! {
    submitted => record_submitted,
    admitted_primary => record_admitted_primary,
    admitted_overflow => record_admitted_overflow,
    readmitted => record_readmitted,
    dropped => record_dropped,
    refused => record_refused,
    processed => record_processed,
    candidates => record_candidates,
    accepted => record_accepted,
    published => record_published,
    publish_failures => record_publish_failures,
    identity_fallbacks => record_identity_fallbacks,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }
}
