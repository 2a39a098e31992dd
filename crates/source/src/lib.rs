//! Transport for the Hacker News API.
//!
//! Exposes the three calls the sampling pipeline depends on (ranked story
//! identifiers, item details, user details) behind the [`Source`] trait, with
//! an HTTP implementation and, behind the `mock` feature, an in-memory one.

pub mod backend;
pub mod error;
mod models;

pub use crate::backend::{HttpSource, Source};
pub use crate::models::{Author, Item, StoryId};
use std::sync::Arc;

pub type SourceHandle = Arc<dyn Source + Send + Sync>;
