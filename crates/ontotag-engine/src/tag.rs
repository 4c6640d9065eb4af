//! Tag values produced by the matchers and the accumulator that collects them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lower bound for every long-distance confidence.
pub const LDM_FLOOR: f64 = 0.01;
pub const MAX_CONFIDENCE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Ldm,
    Unsupervised,
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchType::Exact => "exact",
            MatchType::Ldm => "ldm",
            MatchType::Unsupervised => "unsupervised",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MatchSubtype {
    #[serde(rename = "n-gram")]
    NGram,
    #[serde(rename = "skip-gram")]
    SkipGram,
    #[serde(rename = "n-tuple")]
    NTuple,
    #[serde(rename = "s-tuple")]
    STuple,
    #[serde(rename = "e-tuple")]
    ETuple,
}

impl fmt::Display for MatchSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchSubtype::NGram => "n-gram",
            MatchSubtype::SkipGram => "skip-gram",
            MatchSubtype::NTuple => "n-tuple",
            MatchSubtype::STuple => "s-tuple",
            MatchSubtype::ETuple => "e-tuple",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub entity: String,
    pub confidence: f64,
    pub match_type: MatchType,
    pub match_subtype: MatchSubtype,
}

impl Tag {
    pub fn new(
        entity: impl Into<String>,
        confidence: f64,
        match_type: MatchType,
        match_subtype: MatchSubtype,
    ) -> Self {
        Self {
            entity: entity.into(),
            confidence,
            match_type,
            match_subtype,
        }
    }

    pub fn is_supervised(&self) -> bool {
        self.match_type != MatchType::Unsupervised
    }
}

/// Raw matcher output for one document. Duplicates per entity are allowed;
/// [`MatchAccumulator::strongest`] picks one tag per entity.
#[derive(Debug, Clone, Default)]
pub struct MatchAccumulator {
    tags: Vec<Tag>,
}

impl MatchAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tag: Tag) {
        self.tags.push(tag);
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> + '_ {
        self.tags.iter()
    }

    /// Highest-confidence tag per entity, in entity order. On equal
    /// confidence the tag recorded first wins, so exact matches beat
    /// long-distance ones.
    pub fn strongest(self) -> Vec<Tag> {
        let mut best: BTreeMap<String, Tag> = BTreeMap::new();
        for tag in self.tags {
            match best.get(&tag.entity) {
                Some(current) if current.confidence >= tag.confidence => {}
                _ => {
                    best.insert(tag.entity.clone(), tag);
                }
            }
        }
        best.into_values().collect()
    }

    pub fn into_tags(self) -> Vec<Tag> {
        self.tags
    }
}

impl Extend<Tag> for MatchAccumulator {
    fn extend<I: IntoIterator<Item = Tag>>(&mut self, iter: I) {
        self.tags.extend(iter);
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Exact-tier scores: one decimal, within `[0, 100]`.
pub(crate) fn clamp_exact(score: f64) -> f64 {
    round_to(score, 1).clamp(0.0, MAX_CONFIDENCE)
}

/// Long-distance scores: two decimals, within `[LDM_FLOOR, 100]`.
pub(crate) fn clamp_long_distance(score: f64) -> f64 {
    if score.is_nan() {
        return LDM_FLOOR;
    }
    round_to(score, 2).clamp(LDM_FLOOR, MAX_CONFIDENCE)
}

/// Descending confidence, then ascending entity name.
pub(crate) fn sort_tags(tags: &mut [Tag]) {
    tags.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.entity.cmp(&b.entity))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strongest_keeps_max_per_entity() {
        let mut acc = MatchAccumulator::new();
        acc.push(Tag::new("scala", 70.0, MatchType::Ldm, MatchSubtype::STuple));
        acc.push(Tag::new("scala", 97.0, MatchType::Exact, MatchSubtype::NGram));
        acc.push(Tag::new("java", 90.0, MatchType::Exact, MatchSubtype::NGram));
        acc.push(Tag::new("java", 90.0, MatchType::Ldm, MatchSubtype::NTuple));

        let best = acc.strongest();
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].entity, "java");
        assert_eq!(best[0].match_type, MatchType::Exact);
        assert_eq!(best[1].confidence, 97.0);
    }

    #[test]
    fn clamps_respect_tier_ranges() {
        assert_eq!(clamp_exact(-3.0), 0.0);
        assert_eq!(clamp_exact(96.96), 97.0);
        assert_eq!(clamp_long_distance(-10.0), LDM_FLOOR);
        assert_eq!(clamp_long_distance(f64::NAN), LDM_FLOOR);
        assert_eq!(clamp_long_distance(140.0), MAX_CONFIDENCE);
    }

    #[test]
    fn sort_is_confidence_then_name() {
        let mut tags = vec![
            Tag::new("b", 50.0, MatchType::Exact, MatchSubtype::NGram),
            Tag::new("a", 50.0, MatchType::Exact, MatchSubtype::NGram),
            Tag::new("c", 90.0, MatchType::Exact, MatchSubtype::NGram),
        ];
        sort_tags(&mut tags);
        let names: Vec<&str> = tags.iter().map(|t| t.entity.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn subtypes_serialize_with_hyphens() {
        let tag = Tag::new("x", 1.0, MatchType::Ldm, MatchSubtype::ETuple);
        let json = serde_json::to_string(&tag).unwrap();
        assert!(json.contains(r#""match_type":"ldm""#));
        assert!(json.contains(r#""match_subtype":"e-tuple""#));
        assert_eq!(MatchSubtype::SkipGram.to_string(), "skip-gram");
    }
}
