//! Tagger configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is a
//! valid configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::error::{EngineError, Result};

/// How the subsumption filter decides that one tag is contained in another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubsumptionMode {
    /// Contained as whole words (`cloud` in `cloud_computing`, but not
    /// `java` in `javascript`).
    #[default]
    WordBoundary,
    /// Plain substring containment.
    Substring,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LongDistanceConfig {
    pub enabled: bool,
    /// Added to the positional n-tuple score before clamping.
    pub penalty: f64,
    /// Stem → words that must be stripped from the text before testing it.
    pub stem_exclusions: BTreeMap<String, Vec<String>>,
}

impl Default for LongDistanceConfig {
    fn default() -> Self {
        let mut stem_exclusions = BTreeMap::new();
        stem_exclusions.insert("share".to_string(), vec!["sharepoint".to_string()]);
        Self {
            enabled: true,
            penalty: 0.0,
            stem_exclusions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificationConfig {
    pub enabled: bool,
    /// Entity whose descendants count as certifications.
    pub root: String,
    /// Words whose presence in the text licenses a certification tag.
    pub cues: Vec<String>,
    pub penalty: f64,
}

impl Default for CertificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            root: "certification".to_string(),
            cues: [
                "certification",
                "certifications",
                "certified",
                "certificate",
                "certificates",
                "cert",
                "certs",
                "accredited",
                "accreditation",
                "licensed",
                "license",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            penalty: 25.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggerConfig {
    /// Maximum canonicalization passes.
    pub iterations: usize,
    pub slow_pass_warn_secs: f64,
    pub subsumption: SubsumptionMode,
    pub long_distance: LongDistanceConfig,
    /// Run the edit-distance-1 spelling pass before canonicalization.
    pub spell_correct: bool,
    pub certification: CertificationConfig,
    /// Tags below this confidence are dropped from the final set.
    pub min_confidence: f64,
    /// Extra stopwords, on top of the built-in English list.
    pub stopwords: Vec<String>,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            iterations: 3,
            slow_pass_warn_secs: 25.0,
            subsumption: SubsumptionMode::default(),
            long_distance: LongDistanceConfig::default(),
            spell_correct: false,
            certification: CertificationConfig::default(),
            min_confidence: 0.0,
            stopwords: Vec::new(),
        }
    }
}

impl TaggerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: TaggerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(EngineError::Config("iterations must be at least 1".into()));
        }
        if !(self.slow_pass_warn_secs.is_finite() && self.slow_pass_warn_secs > 0.0) {
            return Err(EngineError::Config(format!(
                "slow_pass_warn_secs must be positive, got {}",
                self.slow_pass_warn_secs
            )));
        }
        if !self.long_distance.penalty.is_finite() {
            return Err(EngineError::Config("long_distance.penalty must be finite".into()));
        }
        let cert = &self.certification;
        if !(cert.penalty.is_finite() && cert.penalty >= 0.0) {
            return Err(EngineError::Config(format!(
                "certification.penalty must be non-negative, got {}",
                cert.penalty
            )));
        }
        if cert.enabled && cert.root.trim().is_empty() {
            return Err(EngineError::Config("certification.root must not be empty".into()));
        }
        if !(0.0..=100.0).contains(&self.min_confidence) {
            return Err(EngineError::Config(format!(
                "min_confidence must be within [0, 100], got {}",
                self.min_confidence
            )));
        }
        Ok(())
    }

    pub fn slow_pass_threshold(&self) -> Duration {
        Duration::from_secs_f64(self.slow_pass_warn_secs)
    }
}
