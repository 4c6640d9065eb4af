//! Long-distance matching: multi-word entities whose words occur in the text
//! but not next to each other ("natural killer (NK) cells", "managed the
//! project and its budget").
//!
//! A formation is an entity label or pattern of two or more words. For each
//! formation the tiers below are tried in order and the first success wins:
//!
//! | tier | subtype   | test                                       | score                |
//! |------|-----------|--------------------------------------------|----------------------|
//! | 1    | `n-tuple` | every token verbatim                       | positional closeness |
//! | 2    | `s-tuple` | every stem plus an inflection, on the text | 70 - length term     |
//! | 3    | `e-tuple` | every stem equals some text stem           | 80 - length term     |
//! | 4    | `n-tuple` | every token plus an inflection, on text    | 90 - length term     |
//!
//! where the length term is `total_tokens / label_words - log10(max(ngrams, 10))`.
//! All scores are clamped into `[0.01, 100]`.
//!
//! The inflection group only covers `e|ed|ing|es|eth|er|esses|ly`, so tier 2
//! misses forms like `management` or `projects` that tier 3 still catches
//! through their stems. Tier 4 covers tokens the stemmer rewrites (`fly` →
//! `fli`) when the text carries the token itself plus an inflection
//! (`flyer`).
//!
//! Stems and boundary regexes for every formation token are compiled once at
//! construction.

use ahash::{AHashMap, AHashSet};
use regex::Regex;

use ontotag_ontology::{normalize_key, word_count, OntologyIndex};

use crate::config::LongDistanceConfig;
use crate::error::Result;
use crate::matcher::Matcher;
use crate::segment::TokenizedText;
use crate::stem::{boundary_regex, EnglishStemmer};
use crate::tag::{clamp_long_distance, MatchAccumulator, MatchSubtype, MatchType, Tag};

pub const STUPLE_BASE: f64 = 70.0;
pub const ETUPLE_BASE: f64 = 80.0;
pub const NTUPLE_REGEX_BASE: f64 = 90.0;

/// A multi-word surface form attributed to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Formation {
    pub label: String,
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone)]
struct CompiledFormation {
    label: String,
    label_words: usize,
    tokens: Vec<String>,
    stems: Vec<String>,
}

#[derive(Debug)]
pub struct LongDistanceMatcher {
    formations: Vec<CompiledFormation>,
    stemmer: EnglishStemmer,
    raw_regex: AHashMap<String, Regex>,
    stem_regex: AHashMap<String, Regex>,
    /// Stem (or raw token) → words stripped from the text before testing it.
    exclusions: AHashMap<String, Vec<String>>,
    penalty: f64,
}

/// Every label and pattern with at least two words, deduplicated, in entity
/// order.
pub fn collect_formations(index: &OntologyIndex) -> Vec<Formation> {
    let mut seen = AHashSet::new();
    let mut out = Vec::new();
    for id in index.entity_ids() {
        let Some(node) = index.node(id) else {
            continue;
        };
        let surfaces = std::iter::once(node.label.as_str())
            .chain(node.patterns.iter().map(String::as_str));
        for surface in surfaces {
            let tokens: Vec<String> = normalize_key(surface)
                .split('_')
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
            if tokens.len() < 2 {
                continue;
            }
            let formation = Formation {
                label: node.label.clone(),
                tokens,
            };
            if seen.insert(formation.clone()) {
                out.push(formation);
            }
        }
    }
    out
}

impl LongDistanceMatcher {
    pub fn new(index: &OntologyIndex, config: &LongDistanceConfig) -> Result<Self> {
        Self::from_formations(collect_formations(index), config)
    }

    pub fn from_formations(
        formations: Vec<Formation>,
        config: &LongDistanceConfig,
    ) -> Result<Self> {
        let stemmer = EnglishStemmer::new();
        let mut raw_regex = AHashMap::new();
        let mut stem_regex = AHashMap::new();
        let mut compiled = Vec::with_capacity(formations.len());

        for formation in formations {
            let stems: Vec<String> = formation.tokens.iter().map(|t| stemmer.stem(t)).collect();
            for token in &formation.tokens {
                if !raw_regex.contains_key(token) {
                    raw_regex.insert(token.clone(), boundary_regex(token)?);
                }
            }
            for stem in &stems {
                if !stem_regex.contains_key(stem) {
                    stem_regex.insert(stem.clone(), boundary_regex(stem)?);
                }
            }
            compiled.push(CompiledFormation {
                label_words: word_count(&formation.label),
                label: formation.label,
                tokens: formation.tokens,
                stems,
            });
        }

        let exclusions = config
            .stem_exclusions
            .iter()
            .map(|(stem, words)| {
                let words = words.iter().map(|w| w.trim().to_lowercase()).collect();
                (stem.trim().to_lowercase(), words)
            })
            .collect();

        tracing::debug!(
            formations = compiled.len(),
            token_regexes = raw_regex.len(),
            stem_regexes = stem_regex.len(),
            "built long-distance matcher"
        );

        Ok(Self {
            formations: compiled,
            stemmer,
            raw_regex,
            stem_regex,
            exclusions,
            penalty: config.penalty,
        })
    }

    pub fn formation_count(&self) -> usize {
        self.formations.len()
    }

    fn match_formation(&self, formation: &CompiledFormation, doc: &Document<'_>) -> Option<Tag> {
        if !doc.could_match(formation) {
            return None;
        }
        let length_term = doc.total as f64 / formation.label_words as f64 - doc.ngram_log;
        let tiered = |base: f64| clamp_long_distance(base - length_term);

        // Tier 1: every token verbatim.
        let lists: Option<Vec<&[usize]>> = formation
            .tokens
            .iter()
            .map(|t| doc.positions.get(t.as_str()).map(Vec::as_slice))
            .collect();
        if let Some(lists) = lists {
            let score = clamp_long_distance(positional_score(&lists) + self.penalty);
            return Some(ldm_tag(formation, score, MatchSubtype::NTuple));
        }

        // Tier 2: stems with inflections, over the raw text.
        let stemmed = formation.tokens.iter().zip(&formation.stems).all(|(token, stem)| {
            let excluded = self.excluded_words(token, stem);
            self.stem_regex
                .get(stem)
                .is_some_and(|re| re.is_match(&doc.raw_haystack(excluded)))
        });
        if stemmed {
            return Some(ldm_tag(formation, tiered(STUPLE_BASE), MatchSubtype::STuple));
        }

        // Tier 3: stems equal.
        let exact_stems = formation
            .tokens
            .iter()
            .zip(&formation.stems)
            .all(|(token, stem)| doc.has_stem(stem, self.excluded_words(token, stem)));
        if exact_stems {
            return Some(ldm_tag(formation, tiered(ETUPLE_BASE), MatchSubtype::ETuple));
        }

        // Tier 4: raw tokens with inflections.
        let raw = formation.tokens.iter().zip(&formation.stems).all(|(token, stem)| {
            let excluded = self.excluded_words(token, stem);
            self.raw_regex
                .get(token)
                .is_some_and(|re| re.is_match(&doc.raw_haystack(excluded)))
        });
        if raw {
            return Some(ldm_tag(formation, tiered(NTUPLE_REGEX_BASE), MatchSubtype::NTuple));
        }

        None
    }

    /// Exclusions keyed by the stem, falling back to the raw token.
    fn excluded_words(&self, token: &str, stem: &str) -> Option<&[String]> {
        self.exclusions
            .get(stem)
            .or_else(|| self.exclusions.get(token))
            .map(Vec::as_slice)
    }
}

impl Matcher for LongDistanceMatcher {
    fn name(&self) -> &'static str {
        "long-distance"
    }

    fn match_into(&self, _index: &OntologyIndex, text: &TokenizedText, acc: &mut MatchAccumulator) {
        if text.total_tokens() < 2 || self.formations.is_empty() {
            return;
        }
        let doc = Document::new(text, &self.stemmer);
        for formation in &self.formations {
            if let Some(tag) = self.match_formation(formation, &doc) {
                acc.push(tag);
            }
        }
    }
}

fn ldm_tag(formation: &CompiledFormation, confidence: f64, subtype: MatchSubtype) -> Tag {
    Tag::new(formation.label.clone(), confidence, MatchType::Ldm, subtype)
}

/// Per-document view shared by every formation test.
struct Document<'t> {
    total: usize,
    ngram_log: f64,
    words: Vec<&'t str>,
    stems: Vec<String>,
    positions: AHashMap<&'t str, Vec<usize>>,
    raw_text: String,
}

impl<'t> Document<'t> {
    fn new(text: &'t TokenizedText, stemmer: &EnglishStemmer) -> Self {
        let words: Vec<&str> = text.tokens.iter().map(|t| t.normalized.as_str()).collect();
        let stems: Vec<String> = words.iter().map(|w| stemmer.stem(w)).collect();
        Self {
            total: text.total_tokens(),
            ngram_log: text.ngram_log(),
            raw_text: words.join(" "),
            positions: text.positions(),
            words,
            stems,
        }
    }

    /// Cheap necessary condition for every tier: each formation token is a
    /// prefix of some word, or its stem a prefix of some word's stem.
    fn could_match(&self, formation: &CompiledFormation) -> bool {
        formation.tokens.iter().zip(&formation.stems).all(|(token, stem)| {
            self.words
                .iter()
                .zip(&self.stems)
                .any(|(w, s)| w.starts_with(token.as_str()) || s.starts_with(stem.as_str()))
        })
    }

    fn is_excluded(&self, i: usize, excluded: &[String]) -> bool {
        excluded
            .iter()
            .any(|e| e == self.words[i] || *e == self.stems[i])
    }

    fn raw_haystack(&self, excluded: Option<&[String]>) -> std::borrow::Cow<'_, str> {
        match excluded {
            None => self.raw_text.as_str().into(),
            Some(excluded) => (0..self.words.len())
                .filter(|&i| !self.is_excluded(i, excluded))
                .map(|i| self.words[i])
                .collect::<Vec<_>>()
                .join(" ")
                .into(),
        }
    }

    fn has_stem(&self, stem: &str, excluded: Option<&[String]>) -> bool {
        (0..self.stems.len()).any(|i| {
            self.stems[i] == stem && !excluded.is_some_and(|e| self.is_excluded(i, e))
        })
    }
}

/// Closeness of the best placement of a formation's tokens, in `(0, 100]`.
///
/// For each occurrence of the first token, every other token takes its
/// nearest occurrence; the placement with the smallest sum of pairwise
/// distances is compared against the sum for adjacent tokens.
pub fn positional_score(lists: &[&[usize]]) -> f64 {
    let m = lists.len();
    if m < 2 {
        return 100.0;
    }
    let ideal: usize = (1..m).map(|d| d * (m - d)).sum();

    let mut best: Option<usize> = None;
    let Some(anchors) = lists.first() else {
        return 100.0;
    };
    for &anchor in anchors.iter() {
        let mut chosen = Vec::with_capacity(m);
        chosen.push(anchor);
        for list in &lists[1..] {
            let Some(nearest) = list.iter().copied().min_by_key(|&p| (p.abs_diff(anchor), p)) else {
                return 0.0;
            };
            chosen.push(nearest);
        }
        let mut sum = 0usize;
        for i in 0..chosen.len() {
            for j in (i + 1)..chosen.len() {
                sum += chosen[i].abs_diff(chosen[j]);
            }
        }
        best = Some(best.map_or(sum, |b| b.min(sum)));
    }

    match best {
        Some(actual) => 100.0 * ideal as f64 / actual.max(ideal) as f64,
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{Segmenter, WindowSegmenter};
    use crate::tag::LDM_FLOOR;
    use approx::assert_relative_eq;

    fn matcher(index: &OntologyIndex) -> LongDistanceMatcher {
        LongDistanceMatcher::new(index, &LongDistanceConfig::default()).unwrap()
    }

    fn run(m: &LongDistanceMatcher, index: &OntologyIndex, text: &str) -> Vec<Tag> {
        let tokenized = WindowSegmenter::new().segment(text);
        let mut acc = MatchAccumulator::new();
        m.match_into(index, &tokenized, &mut acc);
        acc.into_tags()
    }

    #[test]
    fn formations_need_two_words() {
        let index = OntologyIndex::builder()
            .label("scala")
            .patterns("natural_killer_cell", &["nk_cell", "natural+killer+cells"])
            .build()
            .unwrap();
        let formations = collect_formations(&index);
        let tokens: Vec<Vec<String>> = formations.iter().map(|f| f.tokens.clone()).collect();
        assert_eq!(formations.len(), 3);
        assert!(tokens.contains(&vec!["nk".to_string(), "cell".to_string()]));
        assert!(formations.iter().all(|f| f.label == "natural_killer_cell"));
    }

    #[test]
    fn verbatim_tokens_use_positional_tier() {
        let index = OntologyIndex::builder()
            .label("project_management")
            .build()
            .unwrap();
        let m = matcher(&index);
        let tags = run(&m, &index, "management of the project");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].match_subtype, MatchSubtype::NTuple);
        // positions 3 and 0: ideal 1, actual 3
        assert_relative_eq!(tags[0].confidence, 33.33);
    }

    #[test]
    fn adjacent_tokens_score_full_marks() {
        let index = OntologyIndex::builder().label("data_science").build().unwrap();
        let m = matcher(&index);
        let tags = run(&m, &index, "data science");
        assert_eq!(tags[0].confidence, 100.0);
    }

    #[test]
    fn stemmed_tier_catches_inflections() {
        let index = OntologyIndex::builder()
            .label("project_management")
            .build()
            .unwrap();
        let m = matcher(&index);
        let tags = run(&m, &index, "managed a large project");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].match_subtype, MatchSubtype::STuple);
        // 70 - (4/2 - 1)
        assert_relative_eq!(tags[0].confidence, 69.0);
    }

    #[test]
    fn stem_equality_catches_forms_outside_the_inflection_group() {
        let index = OntologyIndex::builder()
            .label("project_management")
            .build()
            .unwrap();
        let m = matcher(&index);
        let tags = run(&m, &index, "management of projects");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].match_subtype, MatchSubtype::ETuple);
        // 80 - (3/2 - 1)
        assert_relative_eq!(tags[0].confidence, 79.5);
    }

    #[test]
    fn raw_inflections_cover_tokens_the_stemmer_rewrites() {
        let index = OntologyIndex::builder().label("fly_fishing").build().unwrap();
        let m = matcher(&index);
        // "fly" stems to "fli", which "flyer" neither starts with nor stems to.
        let tags = run(&m, &index, "flyer went fishing");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].match_subtype, MatchSubtype::NTuple);
        // 90 - (3/2 - 1)
        assert_relative_eq!(tags[0].confidence, 89.5);
    }

    #[test]
    fn every_tier_is_reachable() {
        let index = OntologyIndex::builder()
            .label("project_management")
            .build()
            .unwrap();
        let m = matcher(&index);
        let subtypes: Vec<MatchSubtype> = [
            "project management",
            "managing the project",
            "management of projects",
        ]
        .iter()
        .map(|text| run(&m, &index, text)[0].match_subtype)
        .collect();
        assert_eq!(
            subtypes,
            vec![MatchSubtype::NTuple, MatchSubtype::STuple, MatchSubtype::ETuple]
        );
    }

    #[test]
    fn exclusions_strip_false_positive_words() {
        let index = OntologyIndex::builder()
            .label("project_management")
            .build()
            .unwrap();
        let mut config = LongDistanceConfig::default();
        config
            .stem_exclusions
            .insert("manag".to_string(), vec!["manager".to_string()]);
        let m = LongDistanceMatcher::new(&index, &config).unwrap();
        assert!(run(&m, &index, "project manager").is_empty());
        assert_eq!(run(&matcher(&index), &index, "project manager").len(), 1);
    }

    #[test]
    fn exclusions_fall_back_to_the_raw_token() {
        let index = OntologyIndex::builder()
            .label("project_management")
            .build()
            .unwrap();
        let mut config = LongDistanceConfig::default();
        config
            .stem_exclusions
            .insert("management".to_string(), vec!["manager".to_string()]);
        let m = LongDistanceMatcher::new(&index, &config).unwrap();
        assert!(run(&m, &index, "project manager").is_empty());
    }

    #[test]
    fn default_exclusion_key_is_a_real_stem() {
        let stemmer = EnglishStemmer::new();
        let config = LongDistanceConfig::default();
        for word in ["share", "shared", "sharing"] {
            assert!(config.stem_exclusions.contains_key(&stemmer.stem(word)));
        }
    }

    #[test]
    fn unrelated_text_never_matches() {
        let index = OntologyIndex::builder()
            .label("natural_killer_cell")
            .build()
            .unwrap();
        let m = matcher(&index);
        assert!(run(&m, &index, "natural language processing").is_empty());
        assert!(run(&m, &index, "").is_empty());
    }

    #[test]
    fn positional_score_bounds() {
        assert_eq!(positional_score(&[&[0], &[1]]), 100.0);
        assert_eq!(positional_score(&[&[5], &[5]]), 100.0);
        let far = positional_score(&[&[0], &[1000]]);
        assert!(far > 0.0 && far < 1.0);
        assert!(clamp_long_distance(positional_score(&[&[0], &[100_000]])) >= LDM_FLOOR);
    }
}
