//! Subsumption: drop a tag whose text is contained in another tag's text, so
//! `cloud` disappears when `cloud_computing` was also found.

use ontotag_ontology::{contains_word, normalize_key};

use crate::config::SubsumptionMode;
use crate::tag::Tag;

/// True if `inner` is contained in `outer` under `mode`. A tag never
/// subsumes itself.
pub fn is_subsumed(inner: &str, outer: &str, mode: SubsumptionMode) -> bool {
    let inner = normalize_key(inner);
    let outer = normalize_key(outer);
    if inner.is_empty() || inner == outer {
        return false;
    }
    match mode {
        SubsumptionMode::Substring => outer.contains(&inner),
        SubsumptionMode::WordBoundary => {
            contains_word(&outer.replace('_', " "), &inner.replace('_', " "))
        }
    }
}

/// Keep only tags not contained in any other tag. Input order is preserved.
pub fn subsume(tags: Vec<Tag>, mode: SubsumptionMode) -> Vec<Tag> {
    let keep: Vec<bool> = tags
        .iter()
        .map(|tag| {
            !tags
                .iter()
                .any(|other| is_subsumed(&tag.entity, &other.entity, mode))
        })
        .collect();
    tags.into_iter()
        .zip(keep)
        .filter_map(|(tag, keep)| keep.then_some(tag))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::{MatchSubtype, MatchType};

    fn tag(entity: &str, confidence: f64) -> Tag {
        Tag::new(entity, confidence, MatchType::Exact, MatchSubtype::NGram)
    }

    fn names(tags: &[Tag]) -> Vec<&str> {
        tags.iter().map(|t| t.entity.as_str()).collect()
    }

    #[test]
    fn contained_tag_is_dropped() {
        let tags = vec![tag("cloud", 80.0), tag("cloud computing", 85.0)];
        let kept = subsume(tags, SubsumptionMode::WordBoundary);
        assert_eq!(names(&kept), vec!["cloud computing"]);
    }

    #[test]
    fn word_boundary_mode_keeps_partial_words() {
        let tags = vec![tag("java", 90.0), tag("javascript", 90.0)];
        let kept = subsume(tags.clone(), SubsumptionMode::WordBoundary);
        assert_eq!(names(&kept), vec!["java", "javascript"]);

        let kept = subsume(tags, SubsumptionMode::Substring);
        assert_eq!(names(&kept), vec!["javascript"]);
    }

    #[test]
    fn chains_collapse_to_the_longest() {
        let tags = vec![
            tag("learning", 50.0),
            tag("machine_learning", 90.0),
            tag("applied_machine_learning", 70.0),
            tag("scala", 60.0),
        ];
        let kept = subsume(tags, SubsumptionMode::WordBoundary);
        assert_eq!(names(&kept), vec!["applied_machine_learning", "scala"]);
    }

    #[test]
    fn identical_names_do_not_subsume_each_other() {
        assert!(!is_subsumed("cloud", "cloud", SubsumptionMode::Substring));
        assert!(!is_subsumed("Cloud Computing", "cloud_computing", SubsumptionMode::Substring));
        assert!(is_subsumed("cloud", "Cloud Computing", SubsumptionMode::WordBoundary));
    }
}
