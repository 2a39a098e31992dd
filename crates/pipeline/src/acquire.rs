//! Sampling and concurrent enrichment of top stories.
//!
//! One acquisition makes `1 + 2 × n` requests for a sample of `n` stories:
//! the ranking, then an item request per sampled identifier, each followed by
//! a request for that item's author. The per-story chains all run at once and
//! are joined back in sample order.

use crate::SAMPLE_LIMIT;
use crate::error::{ErrorKind, Result};
use crate::sample::sample;
use crate::story::Story;
use futures::future::try_join_all;
use hnsample_source::{SourceHandle, StoryId};
use rand::Rng;
use tracing::instrument;

/// Samples top stories from a [`Source`](hnsample_source::Source) and
/// resolves each of them into a [`Story`].
#[derive(Clone)]
pub struct Aggregator {
    source: SourceHandle,
    limit: usize,
}
impl Aggregator {
    /// Create an aggregator sampling up to [`SAMPLE_LIMIT`] stories.
    pub fn new(source: SourceHandle) -> Self {
        Self { source, limit: SAMPLE_LIMIT }
    }

    /// Change the maximum sample size.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Sample and resolve stories using the thread-local RNG.
    ///
    /// Returns exactly `min(limit, ranking length)` stories, in sample order.
    /// The first failing request fails the whole acquisition and any other
    /// requests still in flight are abandoned.
    #[instrument(skip(self), fields(source = self.source.name(), limit = self.limit))]
    pub async fn acquire(&self) -> Result<Vec<Story>> {
        let ranking = self.ranking().await?;
        let picked = sample(ranking, self.limit, &mut rand::thread_rng());
        self.resolve_all(picked).await
    }

    /// Same as [`acquire`](Self::acquire), drawing the sample from `rng`.
    pub async fn acquire_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<Story>> {
        let ranking = self.ranking().await?;
        let picked = sample(ranking, self.limit, rng);
        self.resolve_all(picked).await
    }

    async fn ranking(&self) -> Result<Vec<StoryId>> {
        let ranking = self.source.top_stories().await.map_err(ErrorKind::ranking)?;
        tracing::debug!(ranked = ranking.len(), "Fetched top stories");
        Ok(ranking)
    }

    async fn resolve_all(&self, picked: Vec<StoryId>) -> Result<Vec<Story>> {
        tracing::debug!(sample = ?picked, "Resolving sampled stories");
        // Every chain is polled before any of them is awaited to completion,
        // and the output keeps the position of its input.
        try_join_all(picked.into_iter().map(|id| self.resolve(id))).await
    }

    /// Fetch one item, then its author. The author request depends on the
    /// item's `by` field, so the two are strictly sequential.
    async fn resolve(&self, id: StoryId) -> Result<Story> {
        let item = self.source.item(id).await.map_err(|e| ErrorKind::item(id, e))?;
        let author = self.source.author(&item.by).await.map_err(|e| ErrorKind::author(&item.by, e))?;
        tracing::debug!(id, by = %item.by, score = item.score, karma = author.karma, "Resolved story");
        Story::assemble(item, author)
    }
}
