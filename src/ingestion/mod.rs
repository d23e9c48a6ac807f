//! Ingestion Module
//!
//! The producer side of the pipeline.
//!
//! ## Workflow
//! 1. **Decode**: An `EventSource` turns its upstream feed into `RawEvent`s.
//! 2. **Submit**: Each event is handed to `IngestionPipeline::submit`, which never blocks.
//! 3. **Account**: Admission outcome (primary, overflow, dropped) is counted by the pipeline.
//!
//! Decoding the network firehose is the job of an adapter outside this crate. The
//! binary ships with `JsonLinesSource`, which reads one JSON event per line.

pub mod source;
pub mod types;

pub use source::{EventLine, EventSource, JsonLinesSource};
pub use types::{extract_post_id, RawEvent};
