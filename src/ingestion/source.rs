use super::types::{extract_post_id, RawEvent};
use crate::pipeline::IngestionPipeline;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Anything that can feed events into the pipeline.
///
/// Implementations own their upstream decoding and call `submit` once per event.
/// `run` returns when the upstream is exhausted, with the number of events submitted.
#[async_trait]
pub trait EventSource: Send {
    async fn run(&mut self, pipeline: &IngestionPipeline) -> Result<u64>;
}

/// One line of input. The post is identified either directly by `post_id` or by
/// the repository `path` of its record (`app.bsky.feed.post/<rkey>`), as firehose
/// commit operations report it.
#[derive(Debug, Deserialize)]
pub struct EventLine {
    pub text: String,
    #[serde(alias = "did")]
    pub author_id: String,
    #[serde(default)]
    pub post_id: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

impl EventLine {
    pub fn into_event(self) -> Result<RawEvent> {
        let post_id = match (self.post_id, self.path.as_deref()) {
            (Some(id), _) if !id.is_empty() => id,
            (_, Some(path)) if !extract_post_id(path).is_empty() => {
                extract_post_id(path).to_string()
            }
            _ => return Err(anyhow!("event has neither post_id nor a record path")),
        };

        Ok(RawEvent::new(self.text, self.author_id, post_id))
    }
}

/// Reads newline-delimited JSON events, e.g. from stdin.
///
/// Lines that fail to decode are logged and skipped; they never reach the pipeline.
pub struct JsonLinesSource<R> {
    reader: R,
    skipped: u64,
}

impl<R> JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self { reader, skipped: 0 }
    }

    /// Lines that were not valid events.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

#[async_trait]
impl<R> EventSource for JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn run(&mut self, pipeline: &IngestionPipeline) -> Result<u64> {
        let mut submitted = 0u64;
        let mut lines = (&mut self.reader).lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let decoded = serde_json::from_str::<EventLine>(line)
                .map_err(anyhow::Error::from)
                .and_then(EventLine::into_event);

            match decoded {
                Ok(event) => {
                    pipeline.submit(event);
                    submitted += 1;
                }
                Err(e) => {
                    self.skipped += 1;
                    tracing::warn!("Skipping undecodable event line: {}", e);
                }
            }
        }

        tracing::info!(
            "Event source exhausted: {} submitted, {} skipped",
            submitted,
            self.skipped
        );

        Ok(submitted)
    }
}
