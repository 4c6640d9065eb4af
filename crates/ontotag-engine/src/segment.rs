//! Segmentation of canonicalized text into tokens, n-grams and skip-grams.
//!
//! The orchestrator only depends on the [`Segmenter`] trait; [`WindowSegmenter`]
//! is the default whitespace-based implementation.

use ahash::{AHashMap, AHashSet};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub position: usize,
    /// Surface form as it appeared in the segmented text.
    pub original: String,
    /// Form used for matching.
    pub normalized: String,
}

/// Contiguous windows of one to three tokens, space-joined, in text order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NgramSet {
    pub gram1: Vec<String>,
    pub gram2: Vec<String>,
    pub gram3: Vec<String>,
}

impl NgramSet {
    pub fn all(&self) -> impl Iterator<Item = &str> + '_ {
        self.gram1
            .iter()
            .chain(&self.gram2)
            .chain(&self.gram3)
            .map(String::as_str)
    }

    pub fn distinct_count(&self) -> usize {
        self.all().collect::<AHashSet<_>>().len()
    }
}

/// Skip-gram windows keyed `n{n}k{k}`: `n` tokens in order with at most `k`
/// skipped tokens in total. Contiguous windows are included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipgramSet {
    windows: BTreeMap<String, Vec<Vec<String>>>,
}

impl SkipgramSet {
    pub fn window_key(n: usize, k: usize) -> String {
        format!("n{n}k{k}")
    }

    pub fn get(&self, n: usize, k: usize) -> &[Vec<String>] {
        self.windows
            .get(&Self::window_key(n, k))
            .map_or(&[], |w| w.as_slice())
    }

    pub fn insert(&mut self, n: usize, k: usize, grams: Vec<Vec<String>>) {
        self.windows.insert(Self::window_key(n, k), grams);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Vec<String>])> + '_ {
        self.windows
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Every skip-gram across all windows, deduplicated, first-seen order.
    pub fn candidates(&self) -> Vec<&[String]> {
        let mut seen = AHashSet::new();
        let mut out = Vec::new();
        for grams in self.windows.values() {
            for gram in grams {
                if seen.insert(gram.join(" ")) {
                    out.push(gram.as_slice());
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizedText {
    pub normalized: String,
    pub tokens: Vec<Token>,
    pub ngrams: NgramSet,
    pub skipgrams: SkipgramSet,
}

impl TokenizedText {
    pub fn total_tokens(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// `log10(max(distinct n-grams, 10))`, the length damping term shared by
    /// every scoring formula.
    pub fn ngram_log(&self) -> f64 {
        (self.ngrams.distinct_count().max(10) as f64).log10()
    }

    /// Normalized token → every position it occurs at, ascending.
    pub fn positions(&self) -> AHashMap<&str, Vec<usize>> {
        let mut map: AHashMap<&str, Vec<usize>> = AHashMap::new();
        for token in &self.tokens {
            map.entry(token.normalized.as_str())
                .or_default()
                .push(token.position);
        }
        map
    }
}

pub trait Segmenter: Send + Sync {
    /// Segment already canonicalized text.
    fn segment(&self, normalized: &str) -> TokenizedText;
}

#[derive(Debug, Clone)]
pub struct WindowSegmenter {
    max_ngram: usize,
    skipgram_windows: Vec<(usize, usize)>,
}

impl Default for WindowSegmenter {
    fn default() -> Self {
        Self {
            max_ngram: 3,
            skipgram_windows: vec![(2, 2), (3, 2), (3, 3), (4, 3)],
        }
    }
}

impl WindowSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skipgram_windows(mut self, windows: &[(usize, usize)]) -> Self {
        self.skipgram_windows = windows.iter().copied().filter(|(n, _)| *n > 0).collect();
        self
    }
}

impl Segmenter for WindowSegmenter {
    fn segment(&self, normalized: &str) -> TokenizedText {
        // Input is already normalized, so both token forms coincide here.
        let tokens: Vec<Token> = normalized
            .split_whitespace()
            .enumerate()
            .map(|(position, word)| Token {
                position,
                original: word.to_string(),
                normalized: word.to_string(),
            })
            .collect();
        let words: Vec<&str> = tokens.iter().map(|t| t.normalized.as_str()).collect();

        let mut ngrams = NgramSet::default();
        for n in 1..=self.max_ngram.min(3) {
            let grams: Vec<String> = words.windows(n).map(|w| w.join(" ")).collect();
            match n {
                1 => ngrams.gram1 = grams,
                2 => ngrams.gram2 = grams,
                _ => ngrams.gram3 = grams,
            }
        }

        let mut skipgrams = SkipgramSet::default();
        for &(n, k) in &self.skipgram_windows {
            skipgrams.insert(n, k, skip_grams(&words, n, k));
        }

        TokenizedText {
            normalized: words.join(" "),
            tokens,
            ngrams,
            skipgrams,
        }
    }
}

/// All ordered selections of `n` words with at most `k` skipped words in
/// total, deduplicated, in order of first occurrence.
fn skip_grams(words: &[&str], n: usize, k: usize) -> Vec<Vec<String>> {
    let mut out = Vec::new();
    let mut seen = AHashSet::new();
    let mut current = Vec::with_capacity(n);
    for start in 0..words.len() {
        current.clear();
        current.push(start);
        extend_gram(words, n, k, &mut current, &mut |idx: &[usize]| {
            let gram: Vec<String> = idx.iter().map(|&i| words[i].to_string()).collect();
            if seen.insert(gram.join(" ")) {
                out.push(gram);
            }
        });
    }
    out
}

fn extend_gram(
    words: &[&str],
    n: usize,
    skips_left: usize,
    current: &mut Vec<usize>,
    emit: &mut dyn FnMut(&[usize]),
) {
    if current.len() == n {
        emit(current.as_slice());
        return;
    }
    let Some(&last) = current.last() else {
        return;
    };
    for skip in 0..=skips_left {
        let next = last + 1 + skip;
        if next >= words.len() {
            break;
        }
        current.push(next);
        extend_gram(words, n, skips_left - skip, current, emit);
        current.pop();
    }
}
