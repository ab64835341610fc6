//! Lexical search over a movie corpus: tokenizer, inverted index, BM25 ranking
//! and a persisted index cache.

pub mod bm25;
pub mod error;
pub mod index;
pub mod persist;
pub mod query;
pub mod tokenizer;

use serde::{Deserialize, Serialize};

pub use bm25::{Bm25Params, BM25_B, BM25_K1};
pub use error::{Result, SearchError};
pub use index::InvertedIndex;
pub use query::{keyword_search, ranked_search, ScoredDocument, DEFAULT_SEARCH_LIMIT};
pub use tokenizer::{Stopwords, Tokenizer};

pub type DocId = u32;
pub type TermFrequency = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub title: String,
    pub description: String,
}

impl Document {
    pub fn new(id: DocId, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { id, title: title.into(), description: description.into() }
    }

    /// Text that gets indexed for this document: title, then description.
    pub fn indexed_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}
