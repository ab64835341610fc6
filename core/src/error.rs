//! Error types for index construction, lookups and the cache.

use crate::DocId;
use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Debug, Error)]
pub enum SearchError {
    /// A single-term operation got zero or several terms after normalization.
    #[error("expected exactly one term in {input:?}, found {tokens}")]
    MalformedQuery { input: String, tokens: usize },

    #[error("document {0} is not in the index")]
    DocumentNotFound(DocId),

    /// A cache artifact is missing, unreadable or does not decode.
    #[error("index artifact `{artifact}` unavailable: {source}")]
    IoFailure {
        artifact: String,
        #[source]
        source: io::Error,
    },
}

impl SearchError {
    pub fn io(artifact: impl Into<String>, source: io::Error) -> Self {
        SearchError::IoFailure { artifact: artifact.into(), source }
    }

    pub fn corrupt(artifact: impl Into<String>, reason: impl ToString) -> Self {
        SearchError::io(artifact, io::Error::new(io::ErrorKind::InvalidData, reason.to_string()))
    }

    pub fn is_io(&self) -> bool {
        matches!(self, SearchError::IoFailure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_failure_names_the_artifact() {
        let err = SearchError::io("postings.bin", io::Error::new(io::ErrorKind::NotFound, "no such file"));
        assert!(err.is_io());
        let msg = err.to_string();
        assert!(msg.contains("postings.bin"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn malformed_query_display() {
        let err = SearchError::MalformedQuery { input: "two words".into(), tokens: 2 };
        assert!(!err.is_io());
        assert_eq!(err.to_string(), "expected exactly one term in \"two words\", found 2");
    }
}
