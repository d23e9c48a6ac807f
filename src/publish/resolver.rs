//! Author Identity Resolution
//!
//! Maps an author's decentralized identifier to the handle shown in replies.
//! Only called after a positive classification, so lookups are rare relative to
//! the event rate; results are cached for the life of the process.

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_PLC_DIRECTORY: &str = "https://plc.directory";

const HANDLE_PREFIX: &str = "at://";

/// Resolves an author identifier to a display handle.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, author_id: &str) -> Result<String>;
}

/// Echoes the identifier back as the handle. Used offline and by the benchmark.
#[derive(Debug, Default, Clone)]
pub struct StaticResolver;

#[async_trait]
impl IdentityResolver for StaticResolver {
    async fn resolve(&self, author_id: &str) -> Result<String> {
        Ok(author_id.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct DidDocument {
    #[serde(rename = "alsoKnownAs", default)]
    pub also_known_as: Vec<String>,
}

impl DidDocument {
    /// First known alias with the `at://` scheme stripped.
    pub fn handle(&self) -> Option<String> {
        let alias = self.also_known_as.first()?;
        let handle = alias.strip_prefix(HANDLE_PREFIX).unwrap_or(alias);
        if handle.is_empty() {
            None
        } else {
            Some(handle.to_string())
        }
    }
}

/// Looks handles up in a PLC directory (`GET <base>/<did>`).
pub struct PlcDirectoryResolver {
    base_url: String,
    http_client: reqwest::Client,
    timeout: Duration,
    attempts: usize,
    cache: DashMap<String, String>,
}

impl PlcDirectoryResolver {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client: reqwest::Client::new(),
            timeout: Duration::from_secs(3),
            attempts: 2,
            cache: DashMap::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cached_handles(&self) -> usize {
        self.cache.len()
    }

    async fn fetch_document(&self, author_id: &str) -> Result<DidDocument> {
        let url = format!("{}/{}", self.base_url, author_id);
        tracing::debug!("Fetching DID document from {}", url);

        let response = self.get_with_retry(&url).await?;
        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "DID lookup for {} failed: {}",
                author_id,
                response.status()
            ));
        }

        Ok(response.json::<DidDocument>().await?)
    }

    async fn get_with_retry(&self, url: &str) -> Result<reqwest::Response> {
        let mut delay_ms = 100u64;

        for attempt in 0..self.attempts {
            let response = self
                .http_client
                .get(url)
                .timeout(self.timeout)
                .send()
                .await;

            match response {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == self.attempts {
                        return Err(anyhow::anyhow!(e));
                    }
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(800);
                }
            }
        }

        Err(anyhow::anyhow!("Retry attempts exhausted"))
    }
}

impl Default for PlcDirectoryResolver {
    fn default() -> Self {
        Self::new(DEFAULT_PLC_DIRECTORY)
    }
}

#[async_trait]
impl IdentityResolver for PlcDirectoryResolver {
    async fn resolve(&self, author_id: &str) -> Result<String> {
        if let Some(handle) = self.cache.get(author_id) {
            return Ok(handle.value().clone());
        }

        let document = self.fetch_document(author_id).await?;
        let handle = document
            .handle()
            .ok_or_else(|| anyhow::anyhow!("No known handles found for {}", author_id))?;

        self.cache.insert(author_id.to_string(), handle.clone());
        Ok(handle)
    }
}
