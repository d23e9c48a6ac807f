//! Ingestion Pipeline Module
//!
//! Bounded-latency processing of the event stream.
//!
//! ## Architecture Overview
//! 1. **Admission**: `submit` pushes into a bounded primary queue, falls back to a
//!    bounded overflow queue, and drops (counting the drop) when both are full.
//! 2. **Draining**: A periodic task moves overflow records back into primary as
//!    workers free up room.
//! 3. **Processing**: `W` workers pop from primary and run the detector
//!    (normalize -> classify -> segment).
//! 4. **Publishing**: Confirmed palindromes are resolved to an author handle and
//!    handed to the publisher, outside of any shared lock.
//!
//! ## Submodules
//! - **`queue`**: Bounded FIFO with non-blocking push/pop and awaiting pop.
//! - **`stats`**: Atomic counters shared by producers, workers and the drain task.
//! - **`detector`**: The synchronous classification chain.
//! - **`pipeline`**: `IngestionPipeline` itself: admission, workers, drain, shutdown.
//! - **`types`**: Records, configuration and admission outcomes.

pub mod detector;
pub mod pipeline;
pub mod queue;
pub mod stats;
pub mod types;

pub use detector::{Detection, PalindromeDetector, Verdict};
pub use pipeline::IngestionPipeline;
pub use queue::{BoundedQueue, PushError};
pub use stats::{PipelineStats, StatsSnapshot};
pub use types::{Admission, PipelineConfig, QueuedRecord};

#[cfg(test)]
mod tests;
