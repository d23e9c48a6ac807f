//! Palindrome Detection Pipeline Library
//!
//! Consumes a high-rate stream of short text posts under bounded memory, finds the
//! posts whose letters read the same both ways and split into dictionary words, and
//! announces them. The binary (`main.rs`) wires these modules together.
//!
//! ## Architecture Modules
//! - **`text`**: Normalization of raw post text into the letter-only form the
//!   classifier works on, keeping the verbatim span for display.
//! - **`classifier`**: Ordered quality rules that discard trivial inputs, then the
//!   palindrome check itself.
//! - **`segmenter`**: The word list and the exhaustive dictionary split of a candidate.
//! - **`pipeline`**: Bounded primary/overflow queues, the overflow drain task, the
//!   worker pool, counters and shutdown.
//! - **`publish`**: Author handle resolution, reply composition and the publisher seam.
//! - **`ingestion`**: Event sources that feed `submit`.
//! - **`api`**: `/health` and `/stats` over HTTP.
//! - **`bench`**: Throughput benchmark over a grid of queue sizes and worker counts.
//! - **`config`**: Environment and command-line configuration.

pub mod api;
pub mod bench;
pub mod classifier;
pub mod config;
pub mod ingestion;
pub mod pipeline;
pub mod publish;
pub mod segmenter;
pub mod text;
