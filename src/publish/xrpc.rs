//! Bluesky Publisher
//!
//! Posts replies to a PDS over XRPC: one `com.atproto.server.createSession` login,
//! then `com.atproto.repo.createRecord` per reply. The session is reused until the
//! server rejects its token, at which point the publisher logs in again once.

use super::publisher::Publisher;
use super::reply::{ByteSpan, Reply};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;

pub const DEFAULT_BSKY_SERVICE: &str = "https://bsky.social";

const POST_COLLECTION: &str = "app.bsky.feed.post";
const CREATE_SESSION: &str = "com.atproto.server.createSession";
const CREATE_RECORD: &str = "com.atproto.repo.createRecord";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    access_jwt: String,
    did: String,
}

#[derive(Serialize)]
struct CreateSessionRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct CreateRecordRequest<'a> {
    repo: &'a str,
    collection: &'static str,
    record: &'a PostRecord,
}

#[derive(Debug, Deserialize)]
struct CreateRecordResponse {
    uri: String,
    cid: String,
}

/// An `app.bsky.feed.post` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    #[serde(rename = "$type")]
    pub record_type: String,
    pub text: String,
    pub created_at: String,
    pub facets: Vec<Facet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Facet {
    pub index: FacetIndex,
    pub features: Vec<FacetFeature>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetIndex {
    pub byte_start: usize,
    pub byte_end: usize,
}

impl From<ByteSpan> for FacetIndex {
    fn from(span: ByteSpan) -> Self {
        Self {
            byte_start: span.start,
            byte_end: span.end,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "$type")]
pub enum FacetFeature {
    #[serde(rename = "app.bsky.richtext.facet#link")]
    Link { uri: String },
    #[serde(rename = "app.bsky.richtext.facet#mention")]
    Mention { did: String },
}

/// Builds the post for `reply`: a link facet over the quoted palindrome and a
/// mention facet over the author handle.
pub fn post_record(reply: &Reply, created_at: String) -> PostRecord {
    let mut facets = vec![Facet {
        index: reply.link_span.into(),
        features: vec![FacetFeature::Link {
            uri: reply.link_url.clone(),
        }],
    }];

    // Mentions must point at a DID
    if reply.mention_id.starts_with("did:") {
        facets.push(Facet {
            index: reply.mention_span.into(),
            features: vec![FacetFeature::Mention {
                did: reply.mention_id.clone(),
            }],
        });
    }

    PostRecord {
        record_type: POST_COLLECTION.to_string(),
        text: reply.text.clone(),
        created_at,
        facets,
    }
}

pub struct XrpcPublisher {
    service_url: String,
    identifier: String,
    password: String,
    http_client: reqwest::Client,
    timeout: Duration,
    session: Mutex<Option<Session>>,
}

impl XrpcPublisher {
    pub fn new(service_url: &str, identifier: &str, password: &str) -> Self {
        Self {
            service_url: service_url.trim_end_matches('/').to_string(),
            identifier: identifier.to_string(),
            password: password.to_string(),
            http_client: reqwest::Client::new(),
            timeout: Duration::from_secs(10),
            session: Mutex::new(None),
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/xrpc/{}", self.service_url, method)
    }

    /// Returns the cached session, logging in first when there is none or when
    /// `renew` is set.
    async fn session(&self, renew: bool) -> Result<Session> {
        let mut session = self.session.lock().await;

        if !renew {
            if let Some(current) = session.as_ref() {
                return Ok(current.clone());
            }
        }

        tracing::info!("Creating session for {}", self.identifier);
        let response = self
            .http_client
            .post(self.endpoint(CREATE_SESSION))
            .timeout(self.timeout)
            .json(&CreateSessionRequest {
                identifier: &self.identifier,
                password: &self.password,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            *session = None;
            return Err(anyhow!(
                "Login as {} failed: {}",
                self.identifier,
                response.status()
            ));
        }

        let created: Session = response.json().await?;
        *session = Some(created.clone());
        Ok(created)
    }

    /// `Ok(None)` when the server rejected the access token.
    async fn create_record(
        &self,
        session: &Session,
        record: &PostRecord,
    ) -> Result<Option<CreateRecordResponse>> {
        let response = self
            .http_client
            .post(self.endpoint(CREATE_RECORD))
            .timeout(self.timeout)
            .bearer_auth(&session.access_jwt)
            .json(&CreateRecordRequest {
                repo: &session.did,
                collection: POST_COLLECTION,
                record,
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(Some(response.json().await?));
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED
            || body.contains("ExpiredToken")
            || body.contains("InvalidToken")
        {
            return Ok(None);
        }

        Err(anyhow!("createRecord failed: {} {}", status, body))
    }
}

#[async_trait]
impl Publisher for XrpcPublisher {
    async fn publish(&self, reply: &Reply) -> Result<()> {
        let created_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let record = post_record(reply, created_at);

        let session = self.session(false).await?;
        let created = match self.create_record(&session, &record).await? {
            Some(created) => created,
            None => {
                tracing::debug!("Access token rejected, logging in again");
                let session = self.session(true).await?;
                self.create_record(&session, &record)
                    .await?
                    .ok_or_else(|| anyhow!("createRecord rejected a fresh session"))?
            }
        };

        tracing::info!("Posted to feed: uri={} cid={}", created.uri, created.cid);
        Ok(())
    }
}
