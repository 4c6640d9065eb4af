//! Tag orchestration: the end-to-end pipeline for one document.
//!
//! ```text
//! raw text → normalize → [spell] → canonicalize → segment
//!          → matchers (exact, long-distance, ...) → strongest per entity
//!          → subsumption → certification adjustment → min confidence → sort
//! ```
//!
//! A [`TagOrchestrator`] is built once per ontology and configuration; all of
//! its tables are immutable afterwards, so it can be shared across threads and
//! [`TagOrchestrator::process_batch`] fans documents out over rayon.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use ontotag_ontology::{normalize_text, OntologyIndex};

use crate::canonicalize::{Canonicalized, SynonymCanonicalizer};
use crate::confidence::CertificationAdjuster;
use crate::config::TaggerConfig;
use crate::error::Result;
use crate::exact::ExactEntityMatcher;
use crate::long_distance::LongDistanceMatcher;
use crate::matcher::Matcher;
use crate::segment::{Segmenter, WindowSegmenter};
use crate::spelling::SpellingCorrector;
use crate::subsume::subsume;
use crate::tag::{sort_tags, MatchAccumulator, Tag};

// ============================================================================
// Output types
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagGroups {
    pub supervised: Vec<(String, f64)>,
    pub unsupervised: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ups {
    pub original: String,
    pub normalized: String,
}

/// Structured result of [`TagOrchestrator::process`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagResult {
    pub tags: TagGroups,
    pub total_tags: usize,
    pub ups: Ups,
}

/// One row of the flat tabular output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRow {
    #[serde(rename = "InputText")]
    pub input_text: String,
    #[serde(rename = "NormalizedText")]
    pub normalized_text: String,
    #[serde(rename = "Tag")]
    pub tag: String,
    #[serde(rename = "Confidence")]
    pub confidence: f64,
}

/// Full diagnostic output: every surviving [`Tag`] with its match type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagRun {
    pub original: String,
    pub normalized: String,
    pub tags: Vec<Tag>,
}

impl From<TagRun> for TagResult {
    fn from(run: TagRun) -> Self {
        let mut groups = TagGroups::default();
        for tag in run.tags {
            if tag.is_supervised() {
                groups.supervised.push((tag.entity, tag.confidence));
            } else {
                groups.unsupervised.insert(tag.entity, tag.confidence);
            }
        }
        TagResult {
            total_tags: groups.supervised.len() + groups.unsupervised.len(),
            tags: groups,
            ups: Ups {
                original: run.original,
                normalized: run.normalized,
            },
        }
    }
}

impl TagResult {
    /// Flatten into one row per tag, supervised first.
    pub fn rows(&self) -> Vec<TagRow> {
        let row = |tag: &str, confidence: f64| TagRow {
            input_text: self.ups.original.clone(),
            normalized_text: self.ups.normalized.clone(),
            tag: tag.to_string(),
            confidence,
        };
        self.tags
            .supervised
            .iter()
            .map(|(t, c)| row(t, *c))
            .chain(self.tags.unsupervised.iter().map(|(t, c)| row(t, *c)))
            .collect()
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

pub struct TagOrchestrator<S: Segmenter = WindowSegmenter> {
    index: Arc<OntologyIndex>,
    config: TaggerConfig,
    canonicalizer: SynonymCanonicalizer,
    matchers: Vec<Box<dyn Matcher>>,
    segmenter: S,
}

impl TagOrchestrator<WindowSegmenter> {
    pub fn new(index: Arc<OntologyIndex>, config: TaggerConfig) -> Result<Self> {
        Self::with_segmenter(index, config, WindowSegmenter::default())
    }
}

impl<S: Segmenter> TagOrchestrator<S> {
    pub fn with_segmenter(
        index: Arc<OntologyIndex>,
        config: TaggerConfig,
        segmenter: S,
    ) -> Result<Self> {
        config.validate()?;
        let canonicalizer = SynonymCanonicalizer::new(&index, &config);

        let mut matchers: Vec<Box<dyn Matcher>> = vec![Box::new(ExactEntityMatcher::new())];
        if config.long_distance.enabled {
            matchers.push(Box::new(LongDistanceMatcher::new(&index, &config.long_distance)?));
        }

        tracing::debug!(
            entities = index.entity_count(),
            matchers = matchers.len(),
            spell_correct = config.spell_correct,
            "built tag orchestrator"
        );

        Ok(Self {
            index,
            config,
            canonicalizer,
            matchers,
            segmenter,
        })
    }

    /// Register an additional matching strategy, run after the built-in ones.
    pub fn with_matcher(mut self, matcher: Box<dyn Matcher>) -> Self {
        self.matchers.push(matcher);
        self
    }

    pub fn index(&self) -> &OntologyIndex {
        &self.index
    }

    pub fn config(&self) -> &TaggerConfig {
        &self.config
    }

    pub fn canonicalizer(&self) -> &SynonymCanonicalizer {
        &self.canonicalizer
    }

    pub fn matcher_names(&self) -> Vec<&'static str> {
        self.matchers.iter().map(|m| m.name()).collect()
    }

    pub fn spelling(&self) -> SpellingCorrector<'_> {
        SpellingCorrector::with_stopwords(&self.index, &self.config.stopwords)
    }

    /// Normalize, optionally spell-correct, and canonicalize `text`.
    pub fn canonicalize(&self, text: &str) -> String {
        self.canonicalize_traced(text).text
    }

    /// [`Self::canonicalize`], also reporting passes and convergence.
    pub fn canonicalize_traced(&self, text: &str) -> Canonicalized {
        let normalized = self.prepare(text);
        if normalized.is_empty() {
            return Canonicalized {
                text: normalized,
                passes: 0,
                converged: true,
            };
        }
        self.canonicalizer.canonicalize_traced(&normalized)
    }

    pub fn process(&self, text: &str) -> TagResult {
        self.process_tags(text).into()
    }

    pub fn process_rows(&self, text: &str) -> Vec<TagRow> {
        self.process(text).rows()
    }

    pub fn process_tags(&self, text: &str) -> TagRun {
        let prepared = self.prepare(text);
        if prepared.is_empty() {
            return TagRun {
                original: text.to_string(),
                ..TagRun::default()
            };
        }
        let canonical = self.canonicalizer.canonicalize(&prepared);
        let tokenized = self.segmenter.segment(&canonical);

        let mut acc = MatchAccumulator::new();
        for matcher in &self.matchers {
            matcher.match_into(&self.index, &tokenized, &mut acc);
        }
        let raw_count = acc.len();

        let mut tags = subsume(acc.strongest(), self.config.subsumption);
        CertificationAdjuster::new(&self.index, &self.config.certification)
            .adjust(&mut tags, &[prepared.as_str(), canonical.as_str()]);
        tags.retain(|t| t.confidence >= self.config.min_confidence);
        sort_tags(&mut tags);

        tracing::trace!(raw = raw_count, kept = tags.len(), "tagged document");

        TagRun {
            original: text.to_string(),
            normalized: canonical,
            tags,
        }
    }

    /// Tag many documents in parallel; output order follows input order.
    pub fn process_batch<T: AsRef<str> + Sync>(&self, texts: &[T]) -> Vec<TagResult> {
        let results: Vec<TagResult> = texts.par_iter().map(|t| self.process(t.as_ref())).collect();
        tracing::info!(
            documents = results.len(),
            tags = results.iter().map(|r| r.total_tags).sum::<usize>(),
            "tagged batch"
        );
        results
    }

    fn prepare(&self, text: &str) -> String {
        let normalized = normalize_text(text);
        if self.config.spell_correct && !normalized.is_empty() {
            self.spelling().correct_text(&normalized)
        } else {
            normalized
        }
    }
}
