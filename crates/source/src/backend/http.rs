//! HTTP source backed by the public Hacker News Firebase API.
//!
//! Every call is a plain `GET` of a JSON document. Unknown items and users
//! are served as a `null` body with a `200` status, which is reported here as
//! [`NotFound`](crate::error::ErrorKind::NotFound).

use crate::error::{ErrorKind, Result};
use crate::models::{Author, Item, StoryId};
use crate::Source;
use async_trait::async_trait;
use exn::{OptionExt, ResultExt};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::instrument;

/// Base URL of the official API.
pub const DEFAULT_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";
/// Per-request timeout, covering connect through to the end of the body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Generous default for concurrent requests; comfortably above the number a
/// single sample issues at once.
pub const DEFAULT_CONCURRENT_REQUESTS: usize = 100;
pub const DEFAULT_USER_AGENT: &str = concat!("hnsample/", env!("CARGO_PKG_VERSION"));

/// HTTP source.
///
/// # Examples
///
/// ```no_run
/// use hnsample_source::{HttpSource, Source};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let source = HttpSource::new("hn", "https://hacker-news.firebaseio.com/v0")?;
/// let ranking = source.top_stories().await?;
/// println!("{} stories ranked", ranking.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpSource {
    name: String,
    client: Client,
    /// Without trailing slash.
    base_url: String,
    /// Rate limiter for concurrent requests.
    limiter: Arc<Semaphore>,
}
impl HttpSource {
    /// Create a source with the default timeout, concurrency and user agent.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        Self::with_options(name, base_url, DEFAULT_TIMEOUT, DEFAULT_CONCURRENT_REQUESTS, DEFAULT_USER_AGENT)
    }

    /// Create a source with explicit client settings.
    ///
    /// # Errors
    ///
    /// Returns [`Client`](ErrorKind::Client) if the base URL is not an
    /// `http(s)://` URL, if `max_concurrent_requests` is zero, or if the
    /// underlying client cannot be built.
    pub fn with_options(
        name: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
        max_concurrent_requests: usize,
        user_agent: &str,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            exn::bail!(ErrorKind::Client(format!("base URL must be http(s): `{base_url}`")));
        }
        if max_concurrent_requests == 0 {
            exn::bail!(ErrorKind::Client("at least one concurrent request must be allowed".to_string()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .or_raise(|| ErrorKind::Client("failed to build HTTP client".to_string()))?;
        Ok(Self {
            name: name.into(),
            client,
            base_url,
            limiter: Arc::new(Semaphore::new(max_concurrent_requests)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// `GET` a JSON document, where `null` means "no such entity".
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = self.url(path);
        let _permit =
            self.limiter.acquire().await.or_raise(|| ErrorKind::Network("request limiter closed".to_string()))?;
        let response = self.client.get(&url).send().await.map_err(|e| ErrorKind::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            exn::bail!(ErrorKind::Status { status: status.as_u16(), url });
        }
        let body = response.bytes().await.map_err(|e| ErrorKind::Network(e.to_string()))?;
        tracing::trace!(%url, bytes = body.len(), "Received response");
        decode(&url, &body)
    }
}

/// Decode a response body. A literal `null` decodes to `None`.
fn decode<T: DeserializeOwned>(url: &str, body: &[u8]) -> Result<Option<T>> {
    serde_json::from_slice::<Option<T>>(body).or_raise(|| ErrorKind::InvalidResponse(url.to_string()))
}

#[async_trait]
impl Source for HttpSource {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(source = %self.name))]
    async fn top_stories(&self) -> Result<Vec<StoryId>> {
        let ids: Option<Vec<StoryId>> = self.get_json("topstories.json").await?;
        ids.ok_or_raise(|| ErrorKind::InvalidResponse(self.url("topstories.json")))
    }

    #[instrument(skip(self), fields(source = %self.name))]
    async fn item(&self, id: StoryId) -> Result<Item> {
        let item: Option<Item> = self.get_json(&format!("item/{id}.json")).await?;
        item.ok_or_raise(|| ErrorKind::NotFound(format!("item {id}")))
    }

    #[instrument(skip(self), fields(source = %self.name))]
    async fn author(&self, id: &str) -> Result<Author> {
        let author: Option<Author> = self.get_json(&format!("user/{id}.json")).await?;
        author.ok_or_raise(|| ErrorKind::NotFound(format!("user {id}")))
    }
}
