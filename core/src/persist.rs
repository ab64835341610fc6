use crate::error::{Result, SearchError};
use crate::index::{IndexTables, InvertedIndex};
use crate::tokenizer::Tokenizer;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, create_dir_all, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

pub const FORMAT_VERSION: u32 = 1;

pub const POSTINGS: &str = "postings.bin";
pub const DOCMAP: &str = "docmap.bin";
pub const TERM_FREQUENCIES: &str = "term_frequencies.bin";
pub const DOC_LENGTHS: &str = "doc_lengths.bin";
pub const META: &str = "meta.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub version: u32,
    /// unix nanoseconds
    pub built_at: i64,
    pub created_at: String,
}

impl MetaFile {
    pub fn now(num_docs: u32) -> Self {
        let now = time::OffsetDateTime::now_utc();
        Self {
            num_docs,
            version: FORMAT_VERSION,
            built_at: now.unix_timestamp_nanos() as i64,
            created_at: now.format(&time::format_description::well_known::Rfc3339).unwrap_or_else(|_| "".into()),
        }
    }
}

/// Named blob storage backing the index cache.
pub trait ArtifactStore {
    fn put(&self, name: &str, bytes: &[u8]) -> io::Result<()>;
    fn get(&self, name: &str) -> io::Result<Vec<u8>>;
    fn describe(&self) -> String;
}

/// Cache directory on disk. Each artifact is written to a temp file and
/// renamed into place.
#[derive(Debug, Clone)]
pub struct DirStore {
    pub root: PathBuf,
}

impl DirStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn tmp_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.tmp"))
    }
}

impl ArtifactStore for DirStore {
    fn put(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        create_dir_all(&self.root)?;
        let tmp = self.tmp_path(name);
        let mut f = File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
        fs::rename(&tmp, self.path(name))?;
        Ok(())
    }

    fn get(&self, name: &str) -> io::Result<Vec<u8>> {
        fs::read(self.path(name))
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// In-memory store, for tests and throwaway indexes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    artifacts: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove(&self, name: &str) -> Option<Vec<u8>> {
        self.artifacts.lock().remove(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.artifacts.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

impl ArtifactStore for MemoryStore {
    fn put(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        self.artifacts.lock().insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, name: &str) -> io::Result<Vec<u8>> {
        self.artifacts
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no artifact named {name}")))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

fn save_artifact<T: Serialize>(store: &dyn ArtifactStore, name: &str, value: &T) -> Result<()> {
    let bytes = bincode::serialize(value).map_err(|e| SearchError::corrupt(name, e))?;
    store.put(name, &bytes).map_err(|e| SearchError::io(name, e))?;
    tracing::debug!(artifact = name, bytes = bytes.len(), "wrote index artifact");
    Ok(())
}

fn load_artifact<T: DeserializeOwned>(store: &dyn ArtifactStore, name: &str) -> Result<T> {
    let buf = store.get(name).map_err(|e| SearchError::io(name, e))?;
    let value = bincode::deserialize(&buf).map_err(|e| SearchError::corrupt(name, e))?;
    tracing::debug!(artifact = name, bytes = buf.len(), "read index artifact");
    Ok(value)
}

pub fn save_meta(store: &dyn ArtifactStore, meta: &MetaFile) -> Result<()> {
    let json = serde_json::to_vec_pretty(meta).map_err(|e| SearchError::corrupt(META, e))?;
    store.put(META, &json).map_err(|e| SearchError::io(META, e))
}

pub fn load_meta(store: &dyn ArtifactStore) -> Result<MetaFile> {
    let buf = store.get(META).map_err(|e| SearchError::io(META, e))?;
    let meta: MetaFile = serde_json::from_slice(&buf).map_err(|e| SearchError::corrupt(META, e))?;
    if meta.version != FORMAT_VERSION {
        return Err(SearchError::corrupt(META, format!("unsupported format version {}", meta.version)));
    }
    Ok(meta)
}

/// Write the four index tables and the manifest.
pub fn save_tables(store: &dyn ArtifactStore, tables: &IndexTables) -> Result<MetaFile> {
    save_artifact(store, POSTINGS, &tables.postings)?;
    save_artifact(store, DOCMAP, &tables.docmap)?;
    save_artifact(store, TERM_FREQUENCIES, &tables.term_frequencies)?;
    save_artifact(store, DOC_LENGTHS, &tables.doc_lengths)?;
    let meta = MetaFile::now(tables.docmap.len() as u32);
    save_meta(store, &meta)?;
    tracing::info!(store = %store.describe(), num_docs = meta.num_docs, "saved index");
    Ok(meta)
}

/// Read all tables back, rejecting a cache whose tables disagree.
pub fn load_tables(store: &dyn ArtifactStore) -> Result<IndexTables> {
    let meta = load_meta(store)?;
    let tables = IndexTables {
        postings: load_artifact(store, POSTINGS)?,
        docmap: load_artifact(store, DOCMAP)?,
        term_frequencies: load_artifact(store, TERM_FREQUENCIES)?,
        doc_lengths: load_artifact(store, DOC_LENGTHS)?,
    };
    validate(&tables, &meta)?;
    tracing::info!(store = %store.describe(), num_docs = meta.num_docs, created_at = %meta.created_at, "loaded index");
    Ok(tables)
}

fn validate(tables: &IndexTables, meta: &MetaFile) -> Result<()> {
    let n = tables.docmap.len();
    if meta.num_docs as usize != n {
        return Err(SearchError::corrupt(META, format!("manifest lists {} documents, docmap has {n}", meta.num_docs)));
    }
    if tables.doc_lengths.len() != n {
        return Err(SearchError::corrupt(DOC_LENGTHS, format!("{} lengths for {n} documents", tables.doc_lengths.len())));
    }
    if tables.term_frequencies.len() != n {
        return Err(SearchError::corrupt(
            TERM_FREQUENCIES,
            format!("{} entries for {n} documents", tables.term_frequencies.len()),
        ));
    }
    // equal sizes, so a subset check is a key-set check
    if let Some(id) = tables.docmap.keys().find(|id| !tables.doc_lengths.contains_key(*id)) {
        return Err(SearchError::corrupt(DOC_LENGTHS, format!("no length for document {id}")));
    }
    if let Some(id) = tables.docmap.keys().find(|id| !tables.term_frequencies.contains_key(*id)) {
        return Err(SearchError::corrupt(TERM_FREQUENCIES, format!("no term frequencies for document {id}")));
    }
    let dangling = tables.postings.values().flatten().find(|id| !tables.docmap.contains_key(*id));
    if let Some(id) = dangling {
        return Err(SearchError::corrupt(POSTINGS, format!("posting for unknown document {id}")));
    }
    Ok(())
}

pub fn load_index(store: &dyn ArtifactStore, tokenizer: Arc<Tokenizer>) -> Result<InvertedIndex> {
    Ok(InvertedIndex::from_tables(tokenizer, load_tables(store)?))
}

impl InvertedIndex {
    pub fn save(&self, store: &dyn ArtifactStore) -> Result<()> {
        save_tables(store, &self.tables).map(|_| ())
    }

    /// Replace this index's tables with the cached ones. On error the index is
    /// left untouched.
    pub fn load(&mut self, store: &dyn ArtifactStore) -> Result<()> {
        self.tables = load_tables(store)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    Fresh,
    Stale(String),
}

/// Compare a manifest against the corpus file it was built from. A corpus
/// modified at or after the build time makes the cache stale.
pub fn check_staleness(meta: &MetaFile, corpus: &Path) -> io::Result<CacheStatus> {
    let modified = fs::metadata(corpus)?
        .modified()?
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0);
    if modified >= meta.built_at {
        return Ok(CacheStatus::Stale(format!("{} changed after the index was built", corpus.display())));
    }
    Ok(CacheStatus::Fresh)
}
