use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use moviesearch_core::persist::{check_staleness, load_index, load_meta, CacheStatus, DirStore};
use moviesearch_core::{
    keyword_search, ranked_search, Bm25Params, DocId, Document, InvertedIndex, SearchError, Stopwords, Tokenizer, BM25_B,
    BM25_K1, DEFAULT_SEARCH_LIMIT,
};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct MovieFile {
    movies: Vec<Document>,
}

#[derive(Parser, Debug)]
#[command(name = "moviesearch")]
#[command(about = "Keyword search over a movie corpus with BM25 ranking", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Index cache directory
    #[arg(long, global = true, env = "MOVIESEARCH_CACHE_DIR", default_value = "cache")]
    pub cache_dir: PathBuf,
    /// Movie corpus, a JSON object with a `movies` array
    #[arg(long, global = true, env = "MOVIESEARCH_MOVIES", default_value = "data/movies.json")]
    pub movies: PathBuf,
    /// Stopword list, one word per line. The built-in English list is used if the file is absent
    #[arg(long, global = true, env = "MOVIESEARCH_STOPWORDS", default_value = "data/stopwords.txt")]
    pub stopwords: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the inverted index from the corpus and write it to the cache
    Build,
    /// Search movies by keyword
    Search {
        query: String,
        /// Rank matches by BM25 score instead of keyword order
        #[arg(long, default_value_t = false)]
        ranked: bool,
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },
    /// Print how often a term occurs in a document
    Tf { doc_id: DocId, term: String },
    /// Print the inverse document frequency of a term
    Idf { term: String },
    /// Print the saturated BM25 term frequency of a term in a document
    #[command(name = "bm25tf")]
    Bm25Tf {
        doc_id: DocId,
        term: String,
        #[arg(default_value_t = BM25_K1)]
        k1: f32,
        #[arg(default_value_t = BM25_B)]
        b: f32,
    },
    /// Print the BM25 score contribution of a term to a document
    Bm25 { doc_id: DocId, term: String },
}

pub fn load_movies(path: &Path) -> Result<Vec<Document>> {
    let f = File::open(path).with_context(|| format!("opening corpus {}", path.display()))?;
    let file: MovieFile =
        serde_json::from_reader(BufReader::new(f)).with_context(|| format!("parsing corpus {}", path.display()))?;
    Ok(file.movies)
}

pub fn load_tokenizer(config: &Config) -> Result<Arc<Tokenizer>> {
    let stopwords = if config.stopwords.is_file() {
        Stopwords::from_file(&config.stopwords)?
    } else {
        tracing::info!(path = %config.stopwords.display(), "stopword list not found, using built-in English list");
        Stopwords::english()
    };
    Ok(Arc::new(Tokenizer::new(stopwords)))
}

/// Load the cached index. Cache failures come back as `SearchError::IoFailure`.
pub fn open_index(config: &Config) -> Result<InvertedIndex> {
    let store = DirStore::new(&config.cache_dir);
    let index = load_index(&store, load_tokenizer(config)?)?;
    if config.movies.is_file() {
        let status = load_meta(&store).and_then(|meta| {
            check_staleness(&meta, &config.movies).map_err(|e| SearchError::io("corpus", e))
        });
        match status {
            Ok(CacheStatus::Stale(reason)) => tracing::warn!(%reason, "index cache is stale, run `build` to refresh"),
            Ok(CacheStatus::Fresh) => {}
            Err(err) => tracing::debug!(%err, "could not check cache staleness"),
        }
    }
    Ok(index)
}

/// Exit status for any failed command.
pub const FAILURE_EXIT_CODE: u8 = 1;

/// Exit status and stderr message for a failed command. A missing or broken
/// cache points the user at `build`.
pub fn failure_report(err: &anyhow::Error) -> (u8, String) {
    let message = match err.downcast_ref::<SearchError>() {
        Some(e) if e.is_io() => format!("Error: {e}. Run `moviesearch build` first."),
        _ => format!("Error: {err:#}"),
    };
    (FAILURE_EXIT_CODE, message)
}

pub fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
    let config = &cli.config;
    match &cli.command {
        Commands::Build => build_index(config, out),
        Commands::Search { query, ranked, limit } => {
            let index = open_index(config)?;
            writeln!(out, "Searching for: {query}")?;
            if *ranked {
                let hits = ranked_search(&index, query, *limit, Bm25Params::default())?;
                for (i, hit) in hits.iter().enumerate() {
                    writeln!(out, "{}. ({}) {} - Score: {:.2}", i + 1, hit.document.id, hit.document.title, hit.score)?;
                }
            } else {
                for (i, doc) in keyword_search(&index, query, *limit).iter().enumerate() {
                    writeln!(out, "{}. {} ({})", i + 1, doc.title, doc.id)?;
                }
            }
            Ok(())
        }
        Commands::Tf { doc_id, term } => {
            let tf = open_index(config)?.get_term_frequency(*doc_id, term)?;
            writeln!(out, "{tf}")?;
            Ok(())
        }
        Commands::Idf { term } => {
            let idf = open_index(config)?.idf(term)?;
            writeln!(out, "Inverse document frequency of '{term}': {idf:.2}")?;
            Ok(())
        }
        Commands::Bm25Tf { doc_id, term, k1, b } => {
            let tf = open_index(config)?.saturated_tf(*doc_id, term, Bm25Params::new(*k1, *b))?;
            writeln!(out, "BM25 TF score of '{term}' in document '{doc_id}': {tf:.2}")?;
            Ok(())
        }
        Commands::Bm25 { doc_id, term } => {
            let score = open_index(config)?.bm25(*doc_id, term, Bm25Params::default())?;
            writeln!(out, "BM25 score of '{term}' in document '{doc_id}': {score:.2}")?;
            Ok(())
        }
    }
}

fn build_index<W: Write>(config: &Config, out: &mut W) -> Result<()> {
    let movies = load_movies(&config.movies)?;
    let mut index = InvertedIndex::new(load_tokenizer(config)?);
    index.build(&movies);
    let store = DirStore::new(&config.cache_dir);
    index.save(&store)?;
    writeln!(
        out,
        "Indexed {} movies ({} terms) into {}",
        index.len(),
        index.term_count(),
        config.cache_dir.display()
    )?;
    Ok(())
}
