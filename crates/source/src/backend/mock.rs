//! In-memory source for testing.

use crate::error::{ErrorKind, Result};
use crate::models::{Author, Item, StoryId};
use crate::Source;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

type ItemFn = Box<dyn Fn(StoryId) -> Item + Send + Sync>;
type AuthorFn = Box<dyn Fn(&str) -> Author + Send + Sync>;

/// Every call a [`MockSource`] has answered, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Calls {
    pub top_stories: usize,
    pub items: Vec<StoryId>,
    pub authors: Vec<String>,
}

/// In-memory source for testing.
///
/// Items and authors are served from fixed tables, falling back to generator
/// functions when set. Failures and latency can be injected per call so that
/// tests can force errors in the middle of a fan-out, or make requests
/// complete in a different order than they were issued.
///
/// # Examples
///
/// ```
/// use hnsample_source::backend::MockSource;
/// use hnsample_source::{Author, Source};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = MockSource::with_ranking([1, 2, 3])
///     .with_author_fn(|id| Author::new(id, 100));
/// assert_eq!(source.top_stories().await?, vec![1, 2, 3]);
/// assert_eq!(source.author("pg").await?.karma, 100);
/// assert!(source.item(1).await.is_err());
/// # Ok(())
/// # }
/// ```
pub struct MockSource {
    name: String,
    ranking: Vec<StoryId>,
    items: HashMap<StoryId, Item>,
    authors: HashMap<String, Author>,
    item_fn: Option<ItemFn>,
    author_fn: Option<AuthorFn>,
    ranking_failure: Option<String>,
    item_failures: HashMap<StoryId, String>,
    author_failures: HashMap<String, String>,
    item_delays: HashMap<StoryId, Duration>,
    calls: RwLock<Calls>,
    items_in_flight: AtomicUsize,
    peak_items_in_flight: AtomicUsize,
}

impl MockSource {
    /// Create a mock source serving the given ranking, with no items or
    /// authors.
    pub fn with_ranking(ranking: impl IntoIterator<Item = StoryId>) -> Self {
        Self {
            name: "mock".to_string(),
            ranking: ranking.into_iter().collect(),
            items: HashMap::new(),
            authors: HashMap::new(),
            item_fn: None,
            author_fn: None,
            ranking_failure: None,
            item_failures: HashMap::new(),
            author_failures: HashMap::new(),
            item_delays: HashMap::new(),
            calls: RwLock::new(Calls::default()),
            items_in_flight: AtomicUsize::new(0),
            peak_items_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_items(mut self, items: impl IntoIterator<Item = Item>) -> Self {
        self.items.extend(items.into_iter().map(|item| (item.id, item)));
        self
    }

    /// Generate items that are not in the fixed table.
    pub fn with_item_fn(mut self, f: impl Fn(StoryId) -> Item + Send + Sync + 'static) -> Self {
        self.item_fn = Some(Box::new(f));
        self
    }

    pub fn with_authors(mut self, authors: impl IntoIterator<Item = Author>) -> Self {
        self.authors.extend(authors.into_iter().map(|author| (author.id.clone(), author)));
        self
    }

    /// Generate authors that are not in the fixed table.
    pub fn with_author_fn(mut self, f: impl Fn(&str) -> Author + Send + Sync + 'static) -> Self {
        self.author_fn = Some(Box::new(f));
        self
    }

    /// Make the ranking call fail with [`Rejected`](ErrorKind::Rejected).
    pub fn fail_ranking(mut self, message: impl Into<String>) -> Self {
        self.ranking_failure = Some(message.into());
        self
    }

    /// Make the item call for `id` fail with [`Rejected`](ErrorKind::Rejected).
    pub fn fail_item(mut self, id: StoryId, message: impl Into<String>) -> Self {
        self.item_failures.insert(id, message.into());
        self
    }

    /// Make the author call for `id` fail with [`Rejected`](ErrorKind::Rejected).
    pub fn fail_author(mut self, id: impl Into<String>, message: impl Into<String>) -> Self {
        self.author_failures.insert(id.into(), message.into());
        self
    }

    /// Hold the item call for `id` for `delay` before answering (or failing).
    pub fn delay_item(mut self, id: StoryId, delay: Duration) -> Self {
        self.item_delays.insert(id, delay);
        self
    }

    /// Snapshot of the calls answered so far.
    pub async fn calls(&self) -> Calls {
        self.calls.read().await.clone()
    }

    /// Highest number of item calls that were in progress at the same time.
    pub fn peak_items_in_flight(&self) -> usize {
        self.peak_items_in_flight.load(Ordering::SeqCst)
    }

    async fn resolve_item(&self, id: StoryId) -> Result<Item> {
        if let Some(delay) = self.item_delays.get(&id) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(message) = self.item_failures.get(&id) {
            exn::bail!(ErrorKind::Rejected(message.clone()));
        }
        match (self.items.get(&id), &self.item_fn) {
            (Some(item), _) => Ok(item.clone()),
            (None, Some(f)) => Ok(f(id)),
            (None, None) => Err(exn::Exn::from(ErrorKind::NotFound(format!("item {id}")))),
        }
    }
}

#[async_trait]
impl Source for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn top_stories(&self) -> Result<Vec<StoryId>> {
        self.calls.write().await.top_stories += 1;
        if let Some(message) = &self.ranking_failure {
            exn::bail!(ErrorKind::Rejected(message.clone()));
        }
        Ok(self.ranking.clone())
    }

    async fn item(&self, id: StoryId) -> Result<Item> {
        self.calls.write().await.items.push(id);
        let current = self.items_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_items_in_flight.fetch_max(current, Ordering::SeqCst);
        let result = self.resolve_item(id).await;
        self.items_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn author(&self, id: &str) -> Result<Author> {
        self.calls.write().await.authors.push(id.to_string());
        if let Some(message) = self.author_failures.get(id) {
            exn::bail!(ErrorKind::Rejected(message.clone()));
        }
        match (self.authors.get(id), &self.author_fn) {
            (Some(author), _) => Ok(author.clone()),
            (None, Some(f)) => Ok(f(id)),
            (None, None) => Err(exn::Exn::from(ErrorKind::NotFound(format!("user {id}")))),
        }
    }
}
