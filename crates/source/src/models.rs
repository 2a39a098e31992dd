//! API models.
//!
//! These types mirror the JSON documents served by the Hacker News API, so
//! field names follow the wire format (`by`, `kids`, `type`).

use serde::{Deserialize, Serialize};

/// Identifier of a ranked item.
pub type StoryId = u64;

/// A ranked item (story, job, poll...) as returned by `item/{id}.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: StoryId,
    #[serde(default)]
    pub title: String,
    /// Target link. Self posts ("Ask HN") don't have one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub score: u64,
    /// Creation time, seconds since the Unix epoch.
    pub time: i64,
    /// Username of the author.
    pub by: String,
    #[serde(default)]
    pub kids: Vec<StoryId>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub descendants: u64,
}

/// A user as returned by `user/{id}.json`.
///
/// Only the fields we consume are decoded; everything else in the document
/// (`about`, `created`, `submitted`) is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub karma: i64,
}
impl Author {
    pub fn new(id: impl Into<String>, karma: i64) -> Self {
        Self { id: id.into(), karma }
    }
}
