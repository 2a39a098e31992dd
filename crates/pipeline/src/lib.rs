//! Random sample of top stories, enriched with author karma.
//!
//! The pipeline lists the ranked story identifiers of a
//! [`Source`](hnsample_source::Source), picks a random subset of them, and
//! resolves every picked identifier into a [`Story`] (item details plus the
//! author's karma) with all requests in flight at once. [`Aggregator`] does
//! the work; [`Controller`] wraps it in an observable loading / success /
//! failure lifecycle for front ends.

mod acquire;
pub mod error;
mod lifecycle;
mod sample;
mod story;

pub use crate::acquire::Aggregator;
pub use crate::lifecycle::{Controller, Failure, GENERIC_FAILURE, Retrieval, RetrievalState};
pub use crate::sample::sample;
pub use crate::story::{AuthorSummary, Story};

/// Maximum number of stories in one sample.
pub const SAMPLE_LIMIT: usize = 10;
