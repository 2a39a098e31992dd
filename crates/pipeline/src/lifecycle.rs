//! One-shot retrieval lifecycle.
//!
//! A [`Controller`] wraps an [`Aggregator`] in a small state machine that a
//! front end can observe:
//!
//! ```text
//! Idle ──start()──▶ Loading ──▶ Success(records)
//!                          └──▶ Failure(failure)
//! ```
//!
//! Terminal states are only left by calling [`start`](Controller::start)
//! again, which resets to `Loading` and runs a fresh acquisition. Nothing is
//! retried automatically.

use crate::acquire::Aggregator;
use crate::error::Error;
use crate::story::Story;
use async_stream::stream;
use derive_more::Display;
use futures::Stream;
use hnsample_source::SourceHandle;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Message used when a failure carries no description of its own.
pub const GENERIC_FAILURE: &str = "An error occurred";

/// A failed retrieval, reduced to a message fit for display.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("{message}")]
pub struct Failure {
    message: String,
}
impl Failure {
    /// Blank messages are replaced by [`GENERIC_FAILURE`].
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            return Self::generic();
        }
        Self { message }
    }

    pub fn generic() -> Self {
        Self { message: GENERIC_FAILURE.to_string() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
impl From<&Error> for Failure {
    fn from(err: &Error) -> Self {
        Self::new(err.reason())
    }
}

/// Where a [`Controller`] is in its lifecycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RetrievalState {
    /// Not activated yet.
    #[default]
    Idle,
    Loading,
    /// Stories ordered by ascending score.
    Success(Arc<[Story]>),
    Failure(Failure),
}
impl RetrievalState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Failure(_))
    }

    /// Flatten into the read-only view consumed by front ends.
    ///
    /// `Idle` reports as in progress: until a result exists, the only thing
    /// to show is a loading indicator.
    pub fn view(&self) -> Retrieval {
        match self {
            Self::Idle | Self::Loading => Retrieval { records: Arc::from([]), in_progress: true, failure: None },
            Self::Success(records) => Retrieval { records: Arc::clone(records), in_progress: false, failure: None },
            Self::Failure(failure) => Retrieval {
                records: Arc::from([]),
                in_progress: false,
                failure: Some(failure.clone()),
            },
        }
    }
}

/// Read-only result of a retrieval.
///
/// `records` is already ordered by ascending score; front ends should
/// display it as is.
#[derive(Debug, Clone, PartialEq)]
pub struct Retrieval {
    pub records: Arc<[Story]>,
    pub in_progress: bool,
    pub failure: Option<Failure>,
}

/// Drives one acquisition per activation and publishes its state.
///
/// # Examples
///
/// ```
/// use hnsample_pipeline::Controller;
/// use hnsample_source::backend::MockSource;
/// use hnsample_source::{Author, Item};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let source = MockSource::with_ranking([1, 2])
///     .with_item_fn(|id| Item {
///         id, title: format!("Story {id}"), url: None, score: 10 - id, time: 0,
///         by: "pg".into(), kids: vec![], kind: "story".into(), descendants: 0,
///     })
///     .with_author_fn(|id| Author::new(id, 155_000));
/// let controller = Controller::new(Arc::new(source));
/// assert!(controller.view().in_progress);
///
/// let retrieval = controller.start().await;
/// assert!(!retrieval.in_progress);
/// assert_eq!(retrieval.records.iter().map(|s| s.item.id).collect::<Vec<_>>(), vec![2, 1]);
/// # }
/// ```
pub struct Controller {
    aggregator: Aggregator,
    state: watch::Sender<RetrievalState>,
    /// Incremented by every activation; only the latest may publish.
    activation: AtomicU64,
}
impl Controller {
    pub fn new(source: SourceHandle) -> Self {
        Self::from_aggregator(Aggregator::new(source))
    }

    pub fn from_aggregator(aggregator: Aggregator) -> Self {
        let (state, _) = watch::channel(RetrievalState::Idle);
        Self {
            aggregator,
            state,
            activation: AtomicU64::new(0),
        }
    }

    /// Change the maximum sample size.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.aggregator = self.aggregator.with_limit(limit);
        self
    }

    /// Current state, cloned.
    pub fn state(&self) -> RetrievalState {
        self.state.borrow().clone()
    }

    pub fn view(&self) -> Retrieval {
        self.state.borrow().view()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<RetrievalState> {
        self.state.subscribe()
    }

    /// Stream of states, starting with the current one.
    ///
    /// Intermediate states may be skipped if the consumer falls behind; the
    /// most recent state is always delivered. The stream ends when the
    /// controller is dropped.
    pub fn changes(&self) -> impl Stream<Item = RetrievalState> + Send + use<> {
        let mut receiver = self.state.subscribe();
        stream! {
            let current = receiver.borrow_and_update().clone();
            yield current;
            while receiver.changed().await.is_ok() {
                let next = receiver.borrow_and_update().clone();
                yield next;
            }
        }
    }

    /// Run one acquisition and return the resulting view.
    ///
    /// Resets the state to `Loading`, then publishes `Success` with the
    /// stories sorted by ascending score (stable: equal scores keep their
    /// sample order), or `Failure` with a normalized message. If another
    /// activation starts before this one finishes, this one's outcome is
    /// discarded.
    pub async fn start(&self) -> Retrieval {
        // The counter only moves under the state lock, so the check before
        // publishing cannot race with a newer activation.
        let mut activation = 0;
        self.state.send_modify(|state| {
            activation = self.activation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = RetrievalState::Loading;
        });
        tracing::info!(activation, limit = self.aggregator.limit(), "Retrieval started");

        // Own task: a panic during acquisition comes back as a `JoinError`
        // and still ends in `Failure`.
        let aggregator = self.aggregator.clone();
        let outcome = tokio::spawn(async move { aggregator.acquire().await }).await;
        let next = match outcome {
            Ok(Ok(mut records)) => {
                records.sort_by_key(Story::score);
                tracing::info!(activation, records = records.len(), "Retrieval succeeded");
                RetrievalState::Success(records.into())
            },
            Ok(Err(err)) => {
                tracing::warn!(activation, error = ?err, "Retrieval failed");
                RetrievalState::Failure(Failure::from(&err))
            },
            Err(err) => {
                tracing::warn!(activation, error = %err, "Retrieval task did not complete");
                RetrievalState::Failure(Failure::generic())
            },
        };

        let published = self.state.send_if_modified(|state| {
            if self.activation.load(Ordering::SeqCst) != activation {
                return false;
            }
            *state = next;
            true
        });
        if !published {
            tracing::debug!(activation, "Discarding outcome of superseded retrieval");
        }
        self.view()
    }

    /// Spawn [`start`](Self::start) on the current runtime.
    pub fn activate(self: &Arc<Self>) -> JoinHandle<Retrieval> {
        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.start().await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use hnsample_source::backend::MockSource;
    use hnsample_source::{Author, Item, StoryId};
    use rstest::rstest;
    use std::time::Duration;

    fn item(id: StoryId, score: u64) -> Item {
        Item {
            id,
            title: format!("Story {id}"),
            url: Some(format!("https://example.com/{id}")),
            score,
            time: 1_620_000_000 + id as i64,
            by: format!("user{id}"),
            kids: vec![],
            kind: "story".to_string(),
            descendants: 0,
        }
    }

    fn mock(ranking: impl IntoIterator<Item = StoryId>) -> MockSource {
        MockSource::with_ranking(ranking)
            .with_item_fn(|id| item(id, id))
            .with_author_fn(|id| Author::new(id, 100))
    }

    fn assert_ascending(records: &[Story]) {
        assert!(records.windows(2).all(|w| w[0].score() <= w[1].score()), "not ascending: {records:?}");
    }

    #[test]
    fn test_initial_view_is_loading() {
        let controller = Controller::new(Arc::new(mock([1])));
        assert_eq!(controller.state(), RetrievalState::Idle);
        let view = controller.view();
        assert!(view.in_progress);
        assert!(view.records.is_empty());
        assert_eq!(view.failure, None);
    }

    #[tokio::test]
    async fn test_success_sorted_by_score() {
        let controller = Controller::new(Arc::new(mock(1..=15))).with_limit(3);
        let retrieval = controller.start().await;

        assert!(!retrieval.in_progress);
        assert_eq!(retrieval.failure, None);
        assert_eq!(retrieval.records.len(), 3);
        assert_ascending(&retrieval.records);
        for story in retrieval.records.iter() {
            assert_eq!(story.author.id, story.item.by);
        }
        assert!(controller.state().is_terminal());
        assert_eq!(controller.view(), retrieval);
    }

    #[tokio::test]
    async fn test_short_ranking() {
        let controller = Controller::new(Arc::new(mock([1, 2, 3]))).with_limit(15);
        let retrieval = controller.start().await;
        assert_eq!(retrieval.records.len(), 3);
        assert_eq!(retrieval.failure, None);
        assert_ascending(&retrieval.records);
    }

    #[tokio::test]
    async fn test_equal_scores_keep_sample_order() {
        // Completion order is the reverse of the request order.
        let mut source = MockSource::with_ranking(1..=5)
            .with_item_fn(|id| item(id, 7))
            .with_author_fn(|id| Author::new(id, 1));
        for id in 1..=5 {
            source = source.delay_item(id, Duration::from_millis(60 - 10 * id));
        }
        let source = Arc::new(source);
        let retrieval = Controller::new(source.clone()).start().await;

        let sampled = source.calls().await.items;
        let returned: Vec<_> = retrieval.records.iter().map(|s| s.item.id).collect();
        assert_eq!(returned, sampled);
    }

    #[tokio::test]
    async fn test_ranking_failure() {
        let controller = Controller::new(Arc::new(mock(1..=15).fail_ranking("API Error")));
        let retrieval = controller.start().await;

        assert!(!retrieval.in_progress);
        assert!(retrieval.records.is_empty());
        assert_eq!(retrieval.failure.as_ref().map(Failure::message), Some("API Error"));
        assert_eq!(controller.state(), RetrievalState::Failure(Failure::new("API Error")));
    }

    #[tokio::test]
    async fn test_failure_after_other_chains_progressed() {
        let source = mock(1..=5).delay_item(4, Duration::from_millis(30)).fail_item(4, "Story not found");
        let source = Arc::new(source);
        let retrieval = Controller::new(source.clone()).with_limit(5).start().await;

        assert!(!source.calls().await.authors.is_empty());
        assert!(retrieval.records.is_empty());
        assert_eq!(retrieval.failure, Some(Failure::new("Story not found")));
    }

    #[tokio::test]
    async fn test_author_failure() {
        let retrieval = Controller::new(Arc::new(mock([1]).fail_author("user1", "Author not found"))).start().await;
        assert!(retrieval.records.is_empty());
        assert_eq!(retrieval.failure, Some(Failure::new("Author not found")));
    }

    #[tokio::test]
    async fn test_undescribed_failure_is_generic() {
        let retrieval = Controller::new(Arc::new(mock([1]).fail_ranking(""))).start().await;
        assert_eq!(retrieval.failure.as_ref().map(Failure::message), Some(GENERIC_FAILURE));
    }

    #[tokio::test]
    async fn test_panicking_source_is_generic_failure() {
        let source = MockSource::with_ranking([1]).with_item_fn(|_| panic!("boom")).with_author_fn(|id| Author::new(id, 1));
        let retrieval = Controller::new(Arc::new(source)).start().await;
        assert!(!retrieval.in_progress);
        assert_eq!(retrieval.failure, Some(Failure::generic()));
    }

    #[rstest]
    #[case("API Error", "API Error")]
    #[case("", GENERIC_FAILURE)]
    #[case("   ", GENERIC_FAILURE)]
    fn test_failure_normalization(#[case] message: &str, #[case] expected: &str) {
        assert_eq!(Failure::new(message).message(), expected);
        assert_eq!(Failure::new(message).to_string(), expected);
    }

    #[tokio::test]
    async fn test_reactivation_resets_and_reruns() {
        let source = Arc::new(mock(1..=15));
        let controller = Controller::new(source.clone()).with_limit(3);
        controller.start().await;
        let mut receiver = controller.subscribe();
        let second = controller.start().await;

        assert_eq!(second.records.len(), 3);
        assert_eq!(source.calls().await.top_stories, 2);
        assert!(receiver.has_changed().unwrap());
        assert!(receiver.borrow_and_update().is_terminal());
    }

    #[tokio::test]
    async fn test_superseded_outcome_is_discarded() {
        let mut source = mock(1..=3);
        for id in 1..=3 {
            source = source.delay_item(id, Duration::from_millis(100));
        }
        let controller = Arc::new(Controller::new(Arc::new(source)));
        let first = controller.activate();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = controller.activate();

        // The first acquisition finishes while the second is still loading.
        let stale = first.await.unwrap();
        assert!(stale.in_progress);
        assert_eq!(controller.state(), RetrievalState::Loading);

        let latest = second.await.unwrap();
        assert_eq!(latest.records.len(), 3);
        assert!(controller.state().is_terminal());
    }

    #[tokio::test]
    async fn test_activate_and_observe_changes() {
        let controller = Arc::new(Controller::new(Arc::new(mock(1..=15).delay_item(1, Duration::from_millis(5)))));
        let mut changes = Box::pin(controller.changes());
        assert_eq!(changes.next().await, Some(RetrievalState::Idle));

        let retrieval = controller.activate().await.unwrap();
        assert_eq!(retrieval.records.len(), 10);
        // Whatever was skipped, the latest state is delivered.
        let mut last = None;
        while let Some(state) = changes.next().await {
            let done = state.is_terminal();
            last = Some(state);
            if done {
                break;
            }
        }
        assert!(matches!(last, Some(RetrievalState::Success(records)) if records.len() == 10));
    }
}
