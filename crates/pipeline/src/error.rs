//! Pipeline Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Failures coming from a
//! [`Source`](hnsample_source::Source) keep the source's error as a child
//! frame, and copy its description so that it survives to the
//! [`Controller`](crate::Controller) boundary.

use derive_more::{Display, Error};
use hnsample_source::StoryId;
use hnsample_source::error::Error as SourceError;

/// A pipeline error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which stage of an acquisition failed.
///
/// Any of these aborts the whole acquisition; there are no partial results.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Listing the ranked story identifiers failed.
    #[display("failed to list top stories: {reason}")]
    Ranking { reason: String, retryable: bool },
    /// Fetching the details of a sampled story failed.
    #[display("failed to fetch item {id}: {reason}")]
    Item { id: StoryId, reason: String, retryable: bool },
    /// Fetching the author of a sampled story failed.
    #[display("failed to fetch author {id}: {reason}")]
    Author { id: String, reason: String, retryable: bool },
    /// The source answered an author request with a different user.
    #[display("requested author {expected} but received {actual}")]
    AuthorMismatch { expected: String, actual: String },
}

impl ErrorKind {
    /// Wrap a ranking failure, preserving the source's `Exn` frame as a child
    /// in its own error tree.
    #[track_caller]
    pub fn ranking(err: SourceError) -> Error {
        let (reason, retryable) = describe(&err);
        err.raise(Self::Ranking { reason, retryable })
    }

    #[track_caller]
    pub fn item(id: StoryId, err: SourceError) -> Error {
        let (reason, retryable) = describe(&err);
        err.raise(Self::Item { id, reason, retryable })
    }

    #[track_caller]
    pub fn author(id: impl Into<String>, err: SourceError) -> Error {
        let (reason, retryable) = describe(&err);
        err.raise(Self::Author { id: id.into(), reason, retryable })
    }

    /// Description of the underlying failure, without the stage prefix. May
    /// be empty when the source gave no description.
    pub fn reason(&self) -> String {
        match self {
            Self::Ranking { reason, .. } | Self::Item { reason, .. } | Self::Author { reason, .. } => reason.clone(),
            Self::AuthorMismatch { .. } => self.to_string(),
        }
    }

    /// Returns `true` if retrying might succeed, as judged by the source.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Ranking { retryable, .. } | Self::Item { retryable, .. } | Self::Author { retryable, .. } => {
                *retryable
            },
            Self::AuthorMismatch { .. } => false,
        }
    }
}

fn describe(err: &SourceError) -> (String, bool) {
    let kind = &**err;
    (kind.to_string(), kind.is_retryable())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hnsample_source::error::ErrorKind as SourceErrorKind;
    use rstest::rstest;

    #[test]
    fn error_kind_display() {
        let ranking = ErrorKind::Ranking { reason: "API Error".to_string(), retryable: false };
        assert_eq!(ranking.to_string(), "failed to list top stories: API Error");
        assert_eq!(
            ErrorKind::Item { id: 42, reason: "not found: item 42".to_string(), retryable: false }.to_string(),
            "failed to fetch item 42: not found: item 42"
        );
        assert_eq!(
            ErrorKind::AuthorMismatch { expected: "pg".to_string(), actual: "dang".to_string() }.to_string(),
            "requested author pg but received dang"
        );
    }

    #[test]
    fn wrapping_keeps_source_description() {
        let source: SourceError = exn::Exn::from(SourceErrorKind::Rejected("API Error".to_string()));
        let err = ErrorKind::ranking(source);
        assert_eq!(*err, ErrorKind::Ranking { reason: "API Error".to_string(), retryable: false });
        assert_eq!(err.reason(), "API Error");

        let source: SourceError = exn::Exn::from(SourceErrorKind::Network("timed out".to_string()));
        let err = ErrorKind::author("pg", source);
        assert_eq!(err.reason(), "network error: timed out");
    }

    #[test]
    fn undescribed_source_failure_has_empty_reason() {
        let source: SourceError = exn::Exn::from(SourceErrorKind::Rejected(String::new()));
        assert_eq!(ErrorKind::item(1, source).reason(), "");
    }

    #[rstest]
    #[case(SourceErrorKind::Network("connection reset".to_string()), true)]
    #[case(SourceErrorKind::Status { status: 503, url: "u".to_string() }, true)]
    #[case(SourceErrorKind::Status { status: 404, url: "u".to_string() }, false)]
    #[case(SourceErrorKind::NotFound("item 1".to_string()), false)]
    #[case(SourceErrorKind::Rejected("API Error".to_string()), false)]
    fn wrapping_keeps_retryable_flag(#[case] kind: SourceErrorKind, #[case] expected: bool) {
        let err = ErrorKind::ranking(exn::Exn::from(kind.clone()));
        assert_eq!(err.is_retryable(), expected);
        let err = ErrorKind::item(1, exn::Exn::from(kind.clone()));
        assert_eq!(err.is_retryable(), expected);
        let err = ErrorKind::author("pg", exn::Exn::from(kind));
        assert_eq!(err.is_retryable(), expected);
    }

    #[test]
    fn author_mismatch_is_not_retryable() {
        let kind = ErrorKind::AuthorMismatch { expected: "pg".to_string(), actual: "dang".to_string() };
        assert!(!kind.is_retryable());
    }
}
