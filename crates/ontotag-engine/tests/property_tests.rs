use std::sync::Arc;

use ontotag_engine::{SynonymCanonicalizer, TagOrchestrator, TaggerConfig, LDM_FLOOR};
use ontotag_engine::{MatchType, MAX_CONFIDENCE};
use ontotag_ontology::{normalize_text, OntologyIndex};
use proptest::prelude::*;

const VOCAB: &[&str] = &[
    "i", "have", "ml", "machine", "learning", "skills", "cloud", "computing", "aws", "csa",
    "natural", "killer", "cells", "managed", "project", "projects", "management", "scala",
    "certified", "solutions", "architect", "data", "science", "and", "the",
];

fn index() -> OntologyIndex {
    OntologyIndex::builder()
        .synonyms("machine_learning", &["ml", "machine learning"])
        .synonyms("aws_certified_solutions_architect", &["aws csa", "aws solutions architect"])
        .synonyms("find", &["locate"])
        .synonyms("locate", &["locating"])
        .parents("machine_learning", &["data_science"])
        .parents("aws_certified_solutions_architect", &["certification"])
        .label("cloud")
        .label("cloud_computing")
        .label("project_management")
        .label("scala")
        .patterns("natural_killer_cell", &["natural+killer+cells", "nk_cell"])
        .build()
        .unwrap()
}

fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(VOCAB), 0..24).prop_map(|words| words.join(" "))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 96,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn canonicalization_is_idempotent(text in text_strategy()) {
        let index = index();
        let canonicalizer = SynonymCanonicalizer::with_iterations(&index, 3);
        let once = canonicalizer.canonicalize(&normalize_text(&text));
        let twice = canonicalizer.canonicalize(&once);
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn confidences_stay_in_range(text in text_strategy()) {
        let tagger = TagOrchestrator::new(Arc::new(index()), TaggerConfig::default()).unwrap();
        let run = tagger.process_tags(&text);
        for tag in &run.tags {
            prop_assert!(tag.confidence >= 0.0 && tag.confidence <= MAX_CONFIDENCE);
            if tag.match_type == MatchType::Ldm {
                prop_assert!(tag.confidence >= LDM_FLOOR);
            }
        }
    }

    #[test]
    fn one_tag_per_entity_sorted(text in text_strategy()) {
        let tagger = TagOrchestrator::new(Arc::new(index()), TaggerConfig::default()).unwrap();
        let result = tagger.process(&text);
        prop_assert_eq!(result.total_tags, result.tags.supervised.len());

        let mut names: Vec<&str> = result.tags.supervised.iter().map(|(n, _)| n.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        prop_assert_eq!(names.len(), result.tags.supervised.len());

        for pair in result.tags.supervised.windows(2) {
            prop_assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn arbitrary_unicode_never_panics(text in "\\PC{0,64}") {
        let tagger = TagOrchestrator::new(Arc::new(index()), TaggerConfig::default()).unwrap();
        let result = tagger.process(&text);
        prop_assert_eq!(result.ups.original, text);
    }
}
