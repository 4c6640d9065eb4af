//! Post-selection confidence adjustment for certification entities.
//!
//! A certification tag (the certification root or any of its descendants)
//! found in text that never mentions certifying anything is most likely a job
//! title or skill, so it loses a fixed penalty, floored at the lower bound of
//! its tier.

use ontotag_ontology::{contains_word, normalize_key, OntologyIndex};

use crate::config::CertificationConfig;
use crate::tag::{MatchType, Tag, LDM_FLOOR};

#[derive(Debug, Clone)]
pub struct CertificationAdjuster<'a> {
    index: &'a OntologyIndex,
    root: String,
    cues: Vec<String>,
    penalty: f64,
    enabled: bool,
}

impl<'a> CertificationAdjuster<'a> {
    pub fn new(index: &'a OntologyIndex, config: &CertificationConfig) -> Self {
        Self {
            index,
            root: normalize_key(&config.root),
            cues: config
                .cues
                .iter()
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty())
                .collect(),
            penalty: config.penalty,
            enabled: config.enabled && !config.root.trim().is_empty(),
        }
    }

    pub fn is_certification(&self, entity: &str) -> bool {
        normalize_key(entity) == self.root
            || self
                .index
                .lookup()
                .has_ancestor_from_list(entity, &[self.root.as_str()])
    }

    /// True if any cue word appears as a whole word in any of `texts`.
    pub fn has_cue(&self, texts: &[&str]) -> bool {
        texts
            .iter()
            .any(|text| self.cues.iter().any(|cue| contains_word(text, cue)))
    }

    /// Apply the penalty in place. Returns how many tags were adjusted.
    pub fn adjust(&self, tags: &mut [Tag], texts: &[&str]) -> usize {
        if !self.enabled || self.penalty == 0.0 || self.has_cue(texts) {
            return 0;
        }
        let mut adjusted = 0;
        for tag in tags.iter_mut().filter(|t| self.is_certification(&t.entity)) {
            let floor = if tag.match_type == MatchType::Ldm { LDM_FLOOR } else { 0.0 };
            tag.confidence = (tag.confidence - self.penalty).max(floor);
            adjusted += 1;
        }
        if adjusted > 0 {
            tracing::debug!(adjusted, penalty = self.penalty, "certification tags without cue");
        }
        adjusted
    }
}
