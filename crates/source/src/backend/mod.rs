//! Source trait and implementations.
//!
//! This module defines the `Source` trait, which provides a unified interface
//! for the three Hacker News API calls across different backends (HTTP, or an
//! in-memory mock for tests).

mod http;
#[cfg(feature = "mock")]
mod mock;

pub use self::http::{
    DEFAULT_BASE_URL, DEFAULT_CONCURRENT_REQUESTS, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, HttpSource,
};
#[cfg(feature = "mock")]
pub use self::mock::{Calls, MockSource};
use crate::error::Result;
use crate::models::{Author, Item, StoryId};
use async_trait::async_trait;

/// Unified interface for story sources.
///
/// Every call is a single request with a single response, and any of them may
/// fail. Implementations must be usable from many concurrent tasks through a
/// shared reference; the pipeline issues item and author requests for every
/// sampled story at the same time.
///
/// # Examples
///
/// ```
/// use hnsample_source::{Source, error::Result};
///
/// async fn karma_of_top_author(source: &dyn Source) -> Result<Option<i64>> {
///     let Some(id) = source.top_stories().await?.first().copied() else {
///         return Ok(None);
///     };
///     let item = source.item(id).await?;
///     Ok(Some(source.author(&item.by).await?.karma))
/// }
/// ```
#[async_trait]
pub trait Source: Send + Sync {
    /// Name of the source, used for logging only.
    fn name(&self) -> &str;

    /// List the identifiers of the current top stories, in ranking order.
    async fn top_stories(&self) -> Result<Vec<StoryId>>;

    /// Fetch the details of a single item.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the API has
    /// no item under `id`.
    async fn item(&self, id: StoryId) -> Result<Item>;

    /// Fetch a user by username.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the API has
    /// no user under `id`.
    async fn author(&self, id: &str) -> Result<Author>;
}
