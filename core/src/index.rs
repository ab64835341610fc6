use crate::error::{Result, SearchError};
use crate::tokenizer::Tokenizer;
use crate::{DocId, Document, TermFrequency};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

pub type Postings = HashMap<String, BTreeSet<DocId>>;
pub type DocMap = HashMap<DocId, Document>;
pub type TermFrequencies = HashMap<DocId, HashMap<String, TermFrequency>>;
pub type DocLengths = HashMap<DocId, u32>;

/// The four tables persisted for an index.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexTables {
    /// term -> ids of documents containing it, ascending
    pub postings: Postings,
    pub docmap: DocMap,
    pub term_frequencies: TermFrequencies,
    /// number of terms kept after stopword filtering
    pub doc_lengths: DocLengths,
}

/// Build-once, query-many inverted index over a document corpus.
#[derive(Debug, Clone)]
pub struct InvertedIndex {
    tokenizer: Arc<Tokenizer>,
    pub(crate) tables: IndexTables,
}

impl InvertedIndex {
    pub fn new(tokenizer: Arc<Tokenizer>) -> Self {
        Self { tokenizer, tables: IndexTables::default() }
    }

    pub(crate) fn from_tables(tokenizer: Arc<Tokenizer>, tables: IndexTables) -> Self {
        Self { tokenizer, tables }
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn tables(&self) -> &IndexTables {
        &self.tables
    }

    /// Replace the whole index with one built from `documents`.
    pub fn build(&mut self, documents: &[Document]) {
        self.tables = IndexTables::default();
        for doc in documents {
            self.add_document(doc);
        }
        tracing::info!(num_docs = self.len(), num_terms = self.term_count(), "built inverted index");
    }

    fn add_document(&mut self, doc: &Document) {
        if self.tables.docmap.contains_key(&doc.id) {
            tracing::warn!(doc_id = doc.id, "duplicate document id, replacing earlier entry");
            self.drop_postings(doc.id);
        }

        let terms = self.tokenizer.tokenize(&doc.indexed_text());
        let mut counts: HashMap<String, TermFrequency> = HashMap::new();
        for term in &terms {
            self.tables.postings.entry(term.clone()).or_default().insert(doc.id);
            *counts.entry(term.clone()).or_insert(0) += 1;
        }

        self.tables.doc_lengths.insert(doc.id, terms.len() as u32);
        self.tables.term_frequencies.insert(doc.id, counts);
        self.tables.docmap.insert(doc.id, doc.clone());
    }

    fn drop_postings(&mut self, doc_id: DocId) {
        if let Some(counts) = self.tables.term_frequencies.get(&doc_id) {
            for term in counts.keys() {
                if let Some(ids) = self.tables.postings.get_mut(term) {
                    ids.remove(&doc_id);
                    if ids.is_empty() {
                        self.tables.postings.remove(term);
                    }
                }
            }
        }
    }

    /// Corpus size `N`.
    pub fn len(&self) -> usize {
        self.tables.docmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.docmap.is_empty()
    }

    /// Number of distinct terms.
    pub fn term_count(&self) -> usize {
        self.tables.postings.len()
    }

    pub fn document(&self, doc_id: DocId) -> Option<&Document> {
        self.tables.docmap.get(&doc_id)
    }

    /// Documents whose posting set holds `term`, ascending by id.
    ///
    /// `term` is looked up as-is; callers normalize it first.
    pub fn get_documents(&self, term: &str) -> Vec<&Document> {
        self.tables
            .postings
            .get(term)
            .map(|ids| ids.iter().filter_map(|id| self.tables.docmap.get(id)).collect())
            .unwrap_or_default()
    }

    /// Document frequency of an already-normalized term.
    pub fn document_frequency(&self, term: &str) -> usize {
        self.tables.postings.get(term).map_or(0, BTreeSet::len)
    }

    pub fn get_term_frequency(&self, doc_id: DocId, term: &str) -> Result<TermFrequency> {
        let term = self.tokenizer.tokenize_single(term)?;
        self.term_frequency(doc_id, &term)
    }

    pub(crate) fn term_frequency(&self, doc_id: DocId, term: &str) -> Result<TermFrequency> {
        let counts = self.tables.term_frequencies.get(&doc_id).ok_or(SearchError::DocumentNotFound(doc_id))?;
        Ok(counts.get(term).copied().unwrap_or(0))
    }

    pub fn document_length(&self, doc_id: DocId) -> Result<u32> {
        self.tables.doc_lengths.get(&doc_id).copied().ok_or(SearchError::DocumentNotFound(doc_id))
    }

    pub fn get_average_document_length(&self) -> f32 {
        let lengths = &self.tables.doc_lengths;
        if lengths.is_empty() {
            return 0.0;
        }
        let total: u64 = lengths.values().map(|&l| l as u64).sum();
        total as f32 / lengths.len() as f32
    }
}
