//! Ingestion Data Types
//!
//! The event record handed over by an `EventSource`.

use serde::{Deserialize, Serialize};

/// One post as delivered by the upstream feed.
///
/// Immutable once created; it lives for exactly one pass through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub text: String,
    /// Decentralized identifier of the author (e.g. `did:plc:...`).
    pub author_id: String,
    pub post_id: String,
}

impl RawEvent {
    pub fn new(
        text: impl Into<String>,
        author_id: impl Into<String>,
        post_id: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            author_id: author_id.into(),
            post_id: post_id.into(),
        }
    }
}

/// Returns the record key after the last `/` of a repository path,
/// e.g. `app.bsky.feed.post/3k2a...` -> `3k2a...`.
///
/// Paths without a `/` carry no key and yield an empty string.
pub fn extract_post_id(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => "",
    }
}
