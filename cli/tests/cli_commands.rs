use clap::Parser;
use moviesearch::{failure_report, run, Cli, FAILURE_EXIT_CODE};
use moviesearch_core::SearchError;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const MOVIES: &str = r#"{
  "movies": [
    {"id": 1, "title": "The Bear", "description": ""},
    {"id": 2, "title": "Bear Market", "description": ""},
    {"id": 3, "title": "Cat Nap", "description": ""}
  ]
}"#;

fn write_corpus(dir: &Path) {
    fs::write(dir.join("movies.json"), MOVIES).unwrap();
    fs::write(dir.join("stopwords.txt"), "the\na\nof\n").unwrap();
}

fn exec(dir: &Path, args: &[&str]) -> anyhow::Result<String> {
    let cache = dir.join("cache");
    let movies = dir.join("movies.json");
    let stopwords = dir.join("stopwords.txt");
    let mut argv = vec![
        "moviesearch",
        "--cache-dir",
        cache.to_str().unwrap(),
        "--movies",
        movies.to_str().unwrap(),
        "--stopwords",
        stopwords.to_str().unwrap(),
    ];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();
    let mut out = Vec::new();
    run(&cli, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn build_then_keyword_search() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());

    let built = exec(dir.path(), &["build"]).unwrap();
    assert!(built.starts_with("Indexed 3 movies"));
    assert!(dir.path().join("cache").join("postings.bin").is_file());

    let out = exec(dir.path(), &["search", "bear"]).unwrap();
    assert_eq!(out, "Searching for: bear\n1. The Bear (1)\n2. Bear Market (2)\n");

    let none = exec(dir.path(), &["search", "nonexistent_token"]).unwrap();
    assert_eq!(none, "Searching for: nonexistent_token\n");
}

#[test]
fn ranked_search_prints_scores() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    exec(dir.path(), &["build"]).unwrap();

    let out = exec(dir.path(), &["search", "bear", "--ranked", "--limit", "1"]).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("1. (1) The Bear - Score: "));
}

#[test]
fn tf_and_idf_commands() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    exec(dir.path(), &["build"]).unwrap();

    assert_eq!(exec(dir.path(), &["tf", "2", "bears"]).unwrap(), "1\n");
    assert_eq!(exec(dir.path(), &["tf", "3", "bear"]).unwrap(), "0\n");
    // ln((3 - 2 + 0.5) / (2 + 0.5) + 1) = ln(1.6)
    assert_eq!(exec(dir.path(), &["idf", "bear"]).unwrap(), "Inverse document frequency of 'bear': 0.47\n");
    let bm25tf = exec(dir.path(), &["bm25tf", "1", "bear"]).unwrap();
    assert!(bm25tf.starts_with("BM25 TF score of 'bear' in document '1': "));
}

#[test]
fn malformed_and_unknown_inputs_fail() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    exec(dir.path(), &["build"]).unwrap();

    let err = exec(dir.path(), &["tf", "1", "two words"]).unwrap_err();
    assert!(matches!(err.downcast_ref::<SearchError>(), Some(SearchError::MalformedQuery { .. })));
    let err = exec(dir.path(), &["tf", "42", "bear"]).unwrap_err();
    assert!(matches!(err.downcast_ref::<SearchError>(), Some(SearchError::DocumentNotFound(42))));
}

#[test]
fn commands_without_cache_report_io_failure() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());

    for args in [&["tf", "1", "bear"][..], &["idf", "bear"][..], &["search", "bear"][..]] {
        let err = exec(dir.path(), args).unwrap_err();
        let search_err = err.downcast_ref::<SearchError>().expect("search error");
        assert!(search_err.is_io());
    }
}

#[test]
fn missing_cache_exits_one_and_points_at_build() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());

    let err = exec(dir.path(), &["idf", "bear"]).unwrap_err();
    let (code, message) = failure_report(&err);
    assert_eq!(code, 1);
    assert!(message.contains("meta.json"));
    assert!(message.ends_with("Run `moviesearch build` first."));
}

#[test]
fn other_failures_exit_one_without_build_hint() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    exec(dir.path(), &["build"]).unwrap();

    let err = exec(dir.path(), &["tf", "42", "bear"]).unwrap_err();
    let (code, message) = failure_report(&err);
    assert_eq!(code, FAILURE_EXIT_CODE);
    assert_eq!(message, "Error: document 42 is not in the index");
}
