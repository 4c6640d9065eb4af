//! Exact entity matching over contiguous n-grams and skip-grams.
//!
//! Every 1–3 gram is looked up as an entity label (labels and patterns are
//! keyed by `normalize_key`, so `machine learning` and `machine_learning` are
//! the same lookup). Every skip-gram is looked up in the `+` pattern map and
//! credited to each owning entity.
//!
//! Scores shrink with document length relative to the entity's word count:
//!
//! ```text
//! n-gram:    100 - total_tokens / label_words  - log10(max(distinct_ngrams, 10))
//! skip-gram:  75 - total_tokens / parent_words - log10(max(distinct_ngrams, 10))
//! ```
//!
//! rounded to one decimal and floored at zero.

use ahash::AHashSet;

use ontotag_ontology::{normalize_key, word_count, OntologyIndex};

use crate::matcher::Matcher;
use crate::segment::TokenizedText;
use crate::tag::{clamp_exact, MatchAccumulator, MatchSubtype, MatchType, Tag};

pub const NGRAM_BASE: f64 = 100.0;
pub const SKIPGRAM_BASE: f64 = 75.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExactEntityMatcher;

impl ExactEntityMatcher {
    pub fn new() -> Self {
        Self
    }
}

pub(crate) fn exact_score(base: f64, total_tokens: usize, words: usize, ngram_log: f64) -> f64 {
    clamp_exact(base - total_tokens as f64 / words.max(1) as f64 - ngram_log)
}

impl Matcher for ExactEntityMatcher {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn match_into(&self, index: &OntologyIndex, text: &TokenizedText, acc: &mut MatchAccumulator) {
        if text.is_empty() {
            return;
        }
        let total = text.total_tokens();
        let ngram_log = text.ngram_log();
        let lookup = index.lookup();

        let mut seen = AHashSet::new();
        for candidate in text.ngrams.all() {
            if !seen.insert(normalize_key(candidate)) {
                continue;
            }
            let Some(label) = lookup.label(candidate) else {
                continue;
            };
            acc.push(Tag::new(
                label,
                exact_score(NGRAM_BASE, total, word_count(label), ngram_log),
                MatchType::Exact,
                MatchSubtype::NGram,
            ));
        }

        if index.skipgram_pattern_count() == 0 {
            return;
        }
        for gram in text.skipgrams.candidates() {
            let candidate = gram.join("+");
            for &owner in index.skipgram_owners(&candidate) {
                let Some(label) = index.label_of(owner) else {
                    continue;
                };
                acc.push(Tag::new(
                    label,
                    exact_score(SKIPGRAM_BASE, total, word_count(label), ngram_log),
                    MatchType::Exact,
                    MatchSubtype::SkipGram,
                ));
            }
        }
    }
}
