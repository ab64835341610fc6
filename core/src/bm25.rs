//! BM25 scoring over an [`InvertedIndex`].
//!
//! IDF uses `ln((N - df + 0.5) / (df + 0.5) + 1)`, which never goes negative,
//! even for a term present in every document.

use crate::error::Result;
use crate::index::InvertedIndex;
use crate::{DocId, TermFrequency};
use serde::{Deserialize, Serialize};

/// Term frequency saturation parameter.
pub const BM25_K1: f32 = 1.5;

/// Document length normalization parameter. 0.0 disables normalization.
pub const BM25_B: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    pub k1: f32,
    pub b: f32,
}

impl Bm25Params {
    pub fn new(k1: f32, b: f32) -> Self {
        Self { k1, b }
    }
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: BM25_K1, b: BM25_B }
    }
}

/// Inverse document frequency for a term found in `df` of `n` documents.
pub fn bm25_idf(n: usize, df: usize) -> f32 {
    let n = n as f32;
    let df = df as f32;
    ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// Saturated term frequency with length normalization. An average length of
/// zero (empty index) disables normalization.
pub fn bm25_saturation(tf: TermFrequency, params: Bm25Params, doc_len: u32, avg_len: f32) -> f32 {
    if tf == 0 {
        return 0.0;
    }
    let Bm25Params { k1, b } = params;
    let norm = if avg_len > 0.0 { 1.0 - b + b * (doc_len as f32 / avg_len) } else { 1.0 };
    let tf = tf as f32;
    tf * (k1 + 1.0) / (tf + k1 * norm)
}

impl InvertedIndex {
    /// IDF of a single raw word.
    pub fn idf(&self, term: &str) -> Result<f32> {
        let term = self.tokenizer().tokenize_single(term)?;
        Ok(self.term_idf(&term))
    }

    pub(crate) fn term_idf(&self, term: &str) -> f32 {
        bm25_idf(self.len(), self.document_frequency(term))
    }

    /// Saturated, length-normalized term frequency of a single raw word in `doc_id`.
    pub fn saturated_tf(&self, doc_id: DocId, term: &str, params: Bm25Params) -> Result<f32> {
        let term = self.tokenizer().tokenize_single(term)?;
        let avg = self.get_average_document_length();
        self.term_saturated_tf(doc_id, &term, params, avg)
    }

    fn term_saturated_tf(&self, doc_id: DocId, term: &str, params: Bm25Params, avg: f32) -> Result<f32> {
        let tf = self.term_frequency(doc_id, term)?;
        let len = self.document_length(doc_id)?;
        Ok(bm25_saturation(tf, params, len, avg))
    }

    /// BM25 contribution of one raw word to `doc_id`.
    pub fn bm25(&self, doc_id: DocId, term: &str, params: Bm25Params) -> Result<f32> {
        let term = self.tokenizer().tokenize_single(term)?;
        let avg = self.get_average_document_length();
        Ok(self.term_idf(&term) * self.term_saturated_tf(doc_id, &term, params, avg)?)
    }

    /// BM25 score of `doc_id` for already tokenized query terms. Terms the
    /// document does not contain add nothing.
    pub fn score(&self, doc_id: DocId, terms: &[String], params: Bm25Params) -> Result<f32> {
        let len = self.document_length(doc_id)?;
        let avg = self.get_average_document_length();
        let mut total = 0.0;
        for term in terms {
            let tf = self.term_frequency(doc_id, term)?;
            if tf == 0 {
                continue;
            }
            total += self.term_idf(term) * bm25_saturation(tf, params, len, avg);
        }
        Ok(total)
    }
}
