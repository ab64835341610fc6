use crate::error::{Result, SearchError};
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref PUNCT: Regex = Regex::new(r"[[:punct:]]").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// Built-in English stopword list, used when no list file is configured.
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
    "be","because","been","before","being","below","between","both","but","by",
    "can","can't","cannot","could","couldn't",
    "did","didn't","do","does","doesn't","doing","don't","down","during",
    "each","few","for","from","further",
    "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
    "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
    "let's","me","more","most","mustn't","my","myself",
    "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
    "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
    "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
    "under","until","up","very",
    "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
    "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves",
];

/// Stopword configuration for a [`Tokenizer`].
///
/// `Unloaded` is a legal state: a tokenizer built from it filters nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Stopwords {
    #[default]
    Unloaded,
    Loaded(HashSet<String>),
}

impl Stopwords {
    pub fn unloaded() -> Self {
        Stopwords::Unloaded
    }

    pub fn english() -> Self {
        Self::from_words(ENGLISH_STOPWORDS.iter().copied())
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Stopwords::Loaded(words.into_iter().map(Into::into).collect())
    }

    /// One word per line; surrounding whitespace and blank lines are ignored.
    pub fn parse(text: &str) -> Self {
        Self::from_words(text.lines().map(str::trim).filter(|l| !l.is_empty()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| SearchError::io(path.display().to_string(), e))?;
        Ok(Self::parse(&text))
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Stopwords::Loaded(_))
    }

    pub fn contains(&self, word: &str) -> bool {
        match self {
            Stopwords::Unloaded => false,
            Stopwords::Loaded(words) => words.contains(word),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Stopwords::Unloaded => 0,
            Stopwords::Loaded(words) => words.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lowercase and stem a single word. No stopword filtering.
pub fn normalize_word(word: &str) -> String {
    STEMMER.stem(&word.to_lowercase()).into_owned()
}

/// Deterministic text-to-terms pipeline shared by index build and queries.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    stopwords: Stopwords,
    // Lowercased list entries. Tokens are dropped when their normalized form is listed.
    filtered: HashSet<String>,
}

impl Tokenizer {
    pub fn new(stopwords: Stopwords) -> Self {
        let filtered = match &stopwords {
            Stopwords::Unloaded => HashSet::new(),
            Stopwords::Loaded(words) => words.iter().map(|w| w.to_lowercase()).collect(),
        };
        Self { stopwords, filtered }
    }

    pub fn shared(stopwords: Stopwords) -> Arc<Self> {
        Arc::new(Self::new(stopwords))
    }

    pub fn stopwords(&self) -> &Stopwords {
        &self.stopwords
    }

    fn is_stopword(&self, term: &str) -> bool {
        self.filtered.contains(term)
    }

    /// Tokenize text with NFKC normalization, punctuation removal, whitespace
    /// splitting, lowercasing, stemming and stopword removal.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = text.nfkc().collect::<String>();
        let stripped = PUNCT.replace_all(&normalized, "");
        stripped
            .split_whitespace()
            .map(normalize_word)
            .filter(|term| !self.is_stopword(term))
            .collect()
    }

    /// Tokenize input that must name exactly one term.
    pub fn tokenize_single(&self, input: &str) -> Result<String> {
        let mut tokens = self.tokenize(input);
        match tokens.len() {
            1 => Ok(tokens.remove(0)),
            n => Err(SearchError::MalformedQuery { input: input.to_string(), tokens: n }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = Tokenizer::new(Stopwords::english()).tokenize("Running, runner's run!");
        assert!(t.iter().any(|w| w == "run"));
    }

    #[test]
    fn empty_and_punctuation_only_input() {
        let tok = Tokenizer::new(Stopwords::english());
        assert!(tok.tokenize("").is_empty());
        assert!(tok.tokenize("  ...!?;  ").is_empty());
    }

    #[test]
    fn punctuation_is_removed_not_split() {
        let tok = Tokenizer::new(Stopwords::unloaded());
        assert_eq!(tok.tokenize("spider-man"), vec!["spiderman".to_string()]);
    }

    #[test]
    fn unloaded_stopwords_filter_nothing() {
        let tok = Tokenizer::new(Stopwords::unloaded());
        assert!(!tok.stopwords().is_loaded());
        assert_eq!(tok.tokenize("The Bear"), vec!["the".to_string(), "bear".to_string()]);
    }

    #[test]
    fn list_entries_match_normalized_tokens() {
        let tok = Tokenizer::new(Stopwords::from_words(["Movi"]));
        assert!(tok.tokenize("movie movies").is_empty());
        // entries are not stemmed themselves
        let tok = Tokenizer::new(Stopwords::from_words(["movies"]));
        assert_eq!(tok.tokenize("movies"), vec!["movi".to_string()]);
    }

    #[test]
    fn contraction_entries_keep_content_words() {
        let tok = Tokenizer::new(Stopwords::english());
        assert_eq!(
            tok.tokenize("wedding hell shells well letting"),
            vec!["wed", "hell", "shell", "well", "let"].into_iter().map(String::from).collect::<Vec<_>>()
        );
    }

    #[test]
    fn parse_ignores_blank_lines() {
        let words = Stopwords::parse("the\n\n  a  \nan\n");
        assert_eq!(words.len(), 3);
        assert!(words.contains("a"));
    }

    #[test]
    fn single_term_rule() {
        let tok = Tokenizer::new(Stopwords::english());
        assert_eq!(tok.tokenize_single("Bears").unwrap(), "bear");
        assert!(matches!(tok.tokenize_single(""), Err(SearchError::MalformedQuery { tokens: 0, .. })));
        assert!(matches!(tok.tokenize_single("two words"), Err(SearchError::MalformedQuery { tokens: 2, .. })));
        assert!(matches!(tok.tokenize_single("the"), Err(SearchError::MalformedQuery { tokens: 0, .. })));
    }
}
