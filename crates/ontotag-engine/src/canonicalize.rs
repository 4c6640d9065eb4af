//! Synonym canonicalization: rewrite every known variant in a text to its
//! canonical term.
//!
//! Variants are bucketed once at construction time:
//! - variants using bracket alternation (`manag[e|ed|ing]`) compile to one
//!   anchored regex each and run first;
//! - every other variant lands in a swap level keyed by its word count, and
//!   levels run longest first so `machine learning` is rewritten before `ml`
//!   could touch part of it.
//!
//! Replacement is always whole-word ([`replace_word`]). A pass that changes
//! nothing ends the loop early; otherwise passes repeat up to the configured
//! iteration count so chains (`locating → locate → find`) converge.

use regex::Regex;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use ontotag_ontology::{replace_word, OntologyIndex};

use crate::config::TaggerConfig;

#[derive(Debug, Clone)]
struct RegexSwap {
    canonical: String,
    regex: Regex,
}

#[derive(Debug, Clone)]
struct SwapLevel {
    words: usize,
    /// `(variant, canonical)`, variant order within a level follows the
    /// canonical key order of the index.
    swaps: Vec<(String, String)>,
}

/// Outcome of one canonicalization run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonicalized {
    pub text: String,
    pub passes: usize,
    /// False when the iteration limit was hit while passes still made changes.
    pub converged: bool,
}

#[derive(Debug, Clone)]
pub struct SynonymCanonicalizer {
    regex_bucket: Vec<RegexSwap>,
    levels: Vec<SwapLevel>,
    iterations: usize,
    slow_pass: Duration,
}

impl SynonymCanonicalizer {
    pub fn new(index: &OntologyIndex, config: &TaggerConfig) -> Self {
        Self::build(index, config.iterations, config.slow_pass_threshold())
    }

    pub fn with_iterations(index: &OntologyIndex, iterations: usize) -> Self {
        let defaults = TaggerConfig::default();
        Self::build(index, iterations, defaults.slow_pass_threshold())
    }

    fn build(index: &OntologyIndex, iterations: usize, slow_pass: Duration) -> Self {
        let mut regex_bucket = Vec::new();
        let mut by_words: BTreeMap<usize, Vec<(String, String)>> = BTreeMap::new();
        let mut skipped = 0usize;

        for (canonical, variants) in index.synonyms() {
            for variant in variants {
                if is_alternation(variant) {
                    let pattern = format!(r"(^|\s)(?:{})($|\s)", alternation_to_regex(variant));
                    match Regex::new(&pattern) {
                        Ok(regex) => regex_bucket.push(RegexSwap {
                            canonical: canonical.to_string(),
                            regex,
                        }),
                        Err(err) => {
                            skipped += 1;
                            tracing::warn!(
                                variant = %variant,
                                canonical = %canonical,
                                error = %err,
                                "skipping synonym variant with an invalid pattern"
                            );
                        }
                    }
                    continue;
                }
                let words = variant.split_whitespace().count().max(1);
                by_words
                    .entry(words)
                    .or_default()
                    .push((variant.clone(), canonical.to_string()));
            }
        }

        let levels: Vec<SwapLevel> = by_words
            .into_iter()
            .rev()
            .map(|(words, swaps)| SwapLevel { words, swaps })
            .collect();

        tracing::debug!(
            regex_variants = regex_bucket.len(),
            levels = levels.len(),
            max_words = levels.first().map_or(0, |l| l.words),
            skipped,
            "built synonym canonicalizer"
        );

        Self {
            regex_bucket,
            levels,
            iterations: iterations.max(1),
            slow_pass,
        }
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Canonicalize already normalized text.
    pub fn canonicalize(&self, text: &str) -> String {
        self.canonicalize_traced(text).text
    }

    pub fn canonicalize_traced(&self, text: &str) -> Canonicalized {
        let mut working = text.to_string();
        let mut passes = 0;
        while passes < self.iterations {
            passes += 1;
            let started = Instant::now();
            let next = self.pass(&working);
            let elapsed = started.elapsed();
            if elapsed > self.slow_pass {
                tracing::warn!(
                    pass = passes,
                    elapsed_ms = elapsed.as_millis() as u64,
                    text_len = working.len(),
                    "slow canonicalization pass"
                );
            }
            match next {
                Some(changed) => working = changed,
                None => {
                    return Canonicalized {
                        text: working,
                        passes,
                        converged: true,
                    }
                }
            }
        }
        // Converged only if one more pass would be a no-op.
        let converged = self.pass(&working).is_none();
        Canonicalized {
            text: working,
            passes,
            converged,
        }
    }

    /// One full pass; `None` when the text came out unchanged.
    fn pass(&self, text: &str) -> Option<String> {
        let mut working = text.to_string();
        let mut changed = false;

        for swap in &self.regex_bucket {
            if let Some(next) = replace_anchored(&swap.regex, &working, &swap.canonical) {
                if next != working {
                    working = next;
                    changed = true;
                }
            }
        }

        for level in &self.levels {
            for (variant, canonical) in &level.swaps {
                if !working.contains(variant.as_str()) {
                    continue;
                }
                if let Some(next) = replace_word(&working, variant, canonical) {
                    if next != working {
                        working = next;
                        changed = true;
                    }
                }
            }
        }

        changed.then_some(working)
    }
}

/// Replace every match of an anchored `(^|\s)(?:..)($|\s)` regex, keeping
/// the boundary groups. The trailing boundary is not consumed, so adjacent
/// occurrences sharing one space are all rewritten in a single call.
fn replace_anchored(regex: &Regex, text: &str, canonical: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut pos = 0;
    let mut replaced = false;

    while pos <= text.len() {
        let Some(caps) = regex.captures_at(text, pos) else {
            break;
        };
        let (Some(whole), Some(lead), Some(trail)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            break;
        };
        let (start, end) = (lead.end(), trail.start());
        out.push_str(&text[last..start]);
        out.push_str(canonical);
        last = end;
        replaced = true;

        pos = if whole.end() > pos && end > pos {
            end
        } else {
            // Empty match: step over one char to guarantee progress.
            pos + text[pos..].chars().next().map_or(1, char::len_utf8)
        };
    }

    if !replaced {
        return None;
    }
    out.push_str(&text[last..]);
    Some(out)
}

/// Bracket alternation syntax: `manag[e|ed|ing]`.
pub fn is_alternation(variant: &str) -> bool {
    match (variant.find('['), variant.rfind(']')) {
        (Some(open), Some(close)) => open < close && variant[open..close].contains('|'),
        _ => false,
    }
}

/// Translate bracket alternation into a regex fragment, escaping everything
/// else: `manag[e|ing]` → `manag(?:e|ing)`.
pub fn alternation_to_regex(variant: &str) -> String {
    let mut out = String::with_capacity(variant.len() + 8);
    let mut group: Option<String> = None;
    for c in variant.chars() {
        match (&mut group, c) {
            (None, '[') => group = Some(String::new()),
            (Some(alts), ']') => {
                let alts: Vec<String> = alts.split('|').map(regex::escape).collect();
                out.push_str("(?:");
                out.push_str(&alts.join("|"));
                out.push(')');
                group = None;
            }
            (Some(alts), c) => alts.push(c),
            (None, c) => out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    if let Some(unclosed) = group {
        out.push_str(&regex::escape(&format!("[{unclosed}")));
    }
    out
}
