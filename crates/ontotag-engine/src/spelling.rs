//! Edit-distance-1 spelling correction against the ontology vocabulary.
//!
//! Only single lowercase ASCII words are considered. Words the ontology or the
//! stopword list already knows, words containing digits or symbols, and
//! multi-word tokens pass through untouched. The words of multi-word terms
//! (`data` in `data_science`) count as known but are never offered as
//! corrections.
//!
//! When several candidates are known, entity labels win over synonym terms,
//! which win over stopwords; ties inside a group go to the lexicographically
//! smallest candidate, so results never depend on hash order.

use ahash::AHashSet;

use ontotag_ontology::{OntologyIndex, STOPWORDS};

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Shorter words have too many edit-distance-1 neighbours to correct safely.
pub const MIN_CORRECTABLE_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CandidateRank {
    Entity,
    Synonym,
    Stopword,
}

#[derive(Debug, Clone)]
pub struct SpellingCorrector<'a> {
    index: &'a OntologyIndex,
    stopwords: AHashSet<String>,
}

impl<'a> SpellingCorrector<'a> {
    pub fn new(index: &'a OntologyIndex) -> Self {
        Self::with_stopwords(index, &[])
    }

    pub fn with_stopwords(index: &'a OntologyIndex, extra: &[String]) -> Self {
        let stopwords = STOPWORDS
            .iter()
            .map(|w| w.to_string())
            .chain(extra.iter().map(|w| w.trim().to_lowercase()))
            .filter(|w| !w.is_empty())
            .collect();
        Self { index, stopwords }
    }

    pub fn is_known(&self, word: &str) -> bool {
        self.index.is_known_word(word)
            || self.index.is_component_word(word)
            || self.stopwords.contains(word)
    }

    /// Best known word within one edit of `token`, or `token` itself.
    pub fn correct(&self, token: &str) -> String {
        if !is_correctable(token) || self.is_known(token) {
            return token.to_string();
        }
        edits1(token)
            .into_iter()
            .filter_map(|candidate| self.rank(&candidate).map(|rank| (rank, candidate)))
            .min()
            .map(|(_, candidate)| candidate)
            .unwrap_or_else(|| token.to_string())
    }

    /// Correct every whitespace token of normalized text.
    pub fn correct_text(&self, text: &str) -> String {
        text.split_whitespace()
            .map(|w| self.correct(w))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn rank(&self, word: &str) -> Option<CandidateRank> {
        if self.index.resolve(word).is_some() {
            Some(CandidateRank::Entity)
        } else if self.index.is_known_word(word) {
            Some(CandidateRank::Synonym)
        } else if self.stopwords.contains(word) {
            Some(CandidateRank::Stopword)
        } else {
            None
        }
    }
}

fn is_correctable(token: &str) -> bool {
    token.len() >= MIN_CORRECTABLE_LEN && token.bytes().all(|b| b.is_ascii_lowercase())
}

/// Deletes, transposes, replaces and inserts over `a..z`.
fn edits1(word: &str) -> AHashSet<String> {
    let bytes = word.as_bytes();
    let n = bytes.len();
    let mut out = AHashSet::with_capacity(54 * n + 25);

    for i in 0..n {
        let mut deleted = bytes.to_vec();
        deleted.remove(i);
        out.insert(deleted);
    }
    for i in 0..n.saturating_sub(1) {
        let mut swapped = bytes.to_vec();
        swapped.swap(i, i + 1);
        out.insert(swapped);
    }
    for i in 0..n {
        for &c in ALPHABET {
            if bytes[i] != c {
                let mut replaced = bytes.to_vec();
                replaced[i] = c;
                out.insert(replaced);
            }
        }
    }
    for i in 0..=n {
        for &c in ALPHABET {
            let mut inserted = bytes.to_vec();
            inserted.insert(i, c);
            out.insert(inserted);
        }
    }

    // Inputs are ASCII lowercase, so every edit is valid UTF-8.
    out.into_iter()
        .filter_map(|b| String::from_utf8(b).ok())
        .filter(|w| w != word)
        .collect()
}
