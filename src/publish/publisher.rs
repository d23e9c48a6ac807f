use super::reply::Reply;

use anyhow::Result;
use async_trait::async_trait;

/// Sink for confirmed palindromes.
///
/// Called once per accepted event from a pipeline worker. An error is logged and
/// counted by the caller; the event is still considered processed.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, reply: &Reply) -> Result<()>;
}

/// Dry-run publisher: writes the reply to the log instead of the network.
#[derive(Debug, Default, Clone)]
pub struct LogPublisher;

#[async_trait]
impl Publisher for LogPublisher {
    async fn publish(&self, reply: &Reply) -> Result<()> {
        tracing::info!(
            link = %reply.link_url,
            mention = %reply.mention_handle,
            "Publishing reply:\n{}",
            reply.text
        );
        Ok(())
    }
}

/// Discards every reply. Used by the benchmark so publishing cost is not measured.
#[derive(Debug, Default, Clone)]
pub struct NullPublisher;

#[async_trait]
impl Publisher for NullPublisher {
    async fn publish(&self, _reply: &Reply) -> Result<()> {
        Ok(())
    }
}
