//! Query evaluation: unranked keyword matching and BM25-ranked search.

use crate::bm25::Bm25Params;
use crate::error::Result;
use crate::index::InvertedIndex;
use crate::{DocId, Document};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

pub const DEFAULT_SEARCH_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

/// Union of the postings of each query term, in query-term order, ids
/// ascending within a term, stopping once `limit` documents are collected.
pub fn keyword_search<'a>(index: &'a InvertedIndex, query: &str, limit: usize) -> Vec<&'a Document> {
    let mut seen: HashSet<DocId> = HashSet::new();
    let mut results = Vec::new();
    for term in index.tokenizer().tokenize(query) {
        for doc in index.get_documents(&term) {
            if seen.insert(doc.id) {
                results.push(doc);
            }
        }
        if results.len() >= limit {
            break;
        }
    }
    results.truncate(limit);
    results
}

/// Score every document matching at least one query term and return the
/// best `limit`, highest score first. Equal scores keep ascending id order.
pub fn ranked_search(index: &InvertedIndex, query: &str, limit: usize, params: Bm25Params) -> Result<Vec<ScoredDocument>> {
    let terms = index.tokenizer().tokenize(query);
    let candidates: BTreeSet<DocId> =
        terms.iter().flat_map(|t| index.get_documents(t)).map(|doc| doc.id).collect();

    let mut scored: Vec<(DocId, f32)> = Vec::with_capacity(candidates.len());
    for doc_id in candidates {
        scored.push((doc_id, index.score(doc_id, &terms, params)?));
    }
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
    tracing::debug!(query, candidates = scored.len(), "ranked query");

    Ok(scored
        .into_iter()
        .take(limit)
        .filter_map(|(id, score)| index.document(id).map(|doc| ScoredDocument { document: doc.clone(), score }))
        .collect())
}
