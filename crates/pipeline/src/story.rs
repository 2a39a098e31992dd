use crate::error::{ErrorKind, Result};
use hnsample_source::{Author, Item};
use serde::Serialize;

/// The part of an [`Author`] shown next to a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorSummary {
    pub id: String,
    pub karma: i64,
}

/// A sampled story together with its author's karma.
///
/// Serializes flat: every [`Item`] field at the top level, plus an `author`
/// object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Story {
    #[serde(flatten)]
    pub item: Item,
    pub author: AuthorSummary,
}
impl Story {
    /// Combine an item with the author fetched for its `by` field.
    ///
    /// Fails with [`AuthorMismatch`](ErrorKind::AuthorMismatch) if `author`
    /// is somebody else, so `story.author.id == story.item.by` always holds.
    pub fn assemble(item: Item, author: Author) -> Result<Self> {
        if author.id != item.by {
            exn::bail!(ErrorKind::AuthorMismatch { expected: item.by, actual: author.id });
        }
        Ok(Self {
            author: AuthorSummary { id: author.id, karma: author.karma },
            item,
        })
    }

    pub fn score(&self) -> u64 {
        self.item.score
    }
}
