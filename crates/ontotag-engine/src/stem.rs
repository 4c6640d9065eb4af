//! English stemming and inflection-tolerant boundary regexes.

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::fmt;

/// Inflections a root may carry and still count as the same word.
pub const INFLECTION_SUFFIXES: &str = "e|ed|ing|es|eth|er|esses|ly";

pub struct EnglishStemmer {
    inner: Stemmer,
}

impl EnglishStemmer {
    pub fn new() -> Self {
        Self {
            inner: Stemmer::create(Algorithm::English),
        }
    }

    pub fn stem(&self, word: &str) -> String {
        self.inner.stem(&word.to_lowercase()).to_string()
    }

    /// Stem every whitespace token and rejoin with single spaces.
    pub fn stem_text(&self, text: &str) -> String {
        text.split_whitespace()
            .map(|w| self.stem(w))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for EnglishStemmer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EnglishStemmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EnglishStemmer")
    }
}

/// Whole-word regex for `root` followed by an optional inflection, so a root
/// like `certif` never matches an arbitrary substring.
///
/// Boundaries are whitespace or the ends of the text, matching
/// [`ontotag_ontology::contains_word`].
pub fn boundary_regex(root: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"(?:^|\s){}(?:{})?(?:$|\s)",
        regex::escape(root),
        INFLECTION_SUFFIXES
    ))
}
