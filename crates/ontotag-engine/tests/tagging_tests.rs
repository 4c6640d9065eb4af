//! Behavioural checks for the full tagging pipeline on a small ontology.

use std::sync::Arc;

use approx::assert_relative_eq;
use ontotag_engine::{
    LongDistanceConfig, MatchSubtype, MatchType, SpellingCorrector, SubsumptionMode,
    SynonymCanonicalizer, TagOrchestrator, TaggerConfig,
};
use ontotag_ontology::OntologyIndex;

fn skills_index() -> OntologyIndex {
    OntologyIndex::builder()
        .synonyms("machine_learning", &["ml", "machine learning"])
        .synonyms("aws_certified_solutions_architect", &["aws csa"])
        .parents("machine_learning", &["data_science"])
        .parents("aws_certified_solutions_architect", &["certification"])
        .label("cloud")
        .label("cloud_computing")
        .label("scala")
        .label("java")
        .label("javascript")
        .patterns("natural_killer_cell", &["natural+killer+cells"])
        .build()
        .unwrap()
}

fn tagger(config: TaggerConfig) -> TagOrchestrator {
    TagOrchestrator::new(Arc::new(skills_index()), config).unwrap()
}

#[test]
fn synonym_mention_is_tagged_with_its_canonical() {
    let result = tagger(TaggerConfig::default()).process("I have ML skills");
    assert_eq!(result.tags.supervised.len(), 1);
    let (name, confidence) = &result.tags.supervised[0];
    assert_eq!(name, "machine_learning");
    assert_relative_eq!(*confidence, 97.0);
}

#[test]
fn empty_input_serializes_to_empty_groups() {
    let result = tagger(TaggerConfig::default()).process("");
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["tags"]["supervised"], serde_json::json!([]));
    assert_eq!(json["tags"]["unsupervised"], serde_json::json!({}));
    assert_eq!(json["total_tags"], 0);
}

#[test]
fn synonym_chain_converges_to_root_term() {
    let index = OntologyIndex::builder()
        .synonyms("find", &["locate"])
        .synonyms("locate", &["locating"])
        .build()
        .unwrap();
    let canonicalizer = SynonymCanonicalizer::with_iterations(&index, 3);
    assert_eq!(canonicalizer.canonicalize("locating"), "find");
}

#[test]
fn verbatim_long_distance_match_beats_stemmed_tiers() {
    let index = Arc::new(OntologyIndex::builder().label("natural_killer_cells").build().unwrap());
    let config = TaggerConfig::default();
    let tagger = TagOrchestrator::new(index, config).unwrap();

    let run = tagger.process_tags("natural cells are killer cells");
    let tag = run
        .tags
        .iter()
        .find(|t| t.entity == "natural_killer_cells")
        .unwrap();
    assert_eq!(tag.match_type, MatchType::Ldm);
    assert_eq!(tag.match_subtype, MatchSubtype::NTuple);
}

#[test]
fn stemmed_mentions_fall_back_to_lower_tiers() {
    let index = Arc::new(OntologyIndex::builder().label("natural_killer_cell").build().unwrap());
    let tagger = TagOrchestrator::new(index, TaggerConfig::default()).unwrap();

    // "cells" is no inflection of "cell", but both stem to "cell".
    let run = tagger.process_tags("natural and killer cells");
    let tag = &run.tags[0];
    assert_eq!(tag.match_subtype, MatchSubtype::ETuple);
    // 80 - (4/3 - 1)
    assert_relative_eq!(tag.confidence, 79.67);
}

#[test]
fn inflected_mentions_use_the_stem_regex_tier() {
    let index = Arc::new(OntologyIndex::builder().label("project_management").build().unwrap());
    let tagger = TagOrchestrator::new(index, TaggerConfig::default()).unwrap();

    let run = tagger.process_tags("managed a large project");
    assert_eq!(run.tags[0].match_subtype, MatchSubtype::STuple);
    assert_relative_eq!(run.tags[0].confidence, 69.0);
}

#[test]
fn skipgram_pattern_tags_its_owner() {
    let exact_only = TaggerConfig {
        long_distance: LongDistanceConfig {
            enabled: false,
            ..LongDistanceConfig::default()
        },
        ..TaggerConfig::default()
    };
    let run = tagger(exact_only).process_tags("natural born killer cells");
    let tag = run
        .tags
        .iter()
        .find(|t| t.entity == "natural_killer_cell")
        .unwrap();
    // 75 - 4/3 - 1
    assert_eq!(tag.match_subtype, MatchSubtype::SkipGram);
    assert_relative_eq!(tag.confidence, 72.7);

    // With long-distance matching on, the stem-equality formation of the
    // label (80 - (4/3 - 1)) outscores the skip-gram.
    let run = tagger(TaggerConfig::default()).process_tags("natural born killer cells");
    let tag = run
        .tags
        .iter()
        .find(|t| t.entity == "natural_killer_cell")
        .unwrap();
    assert_eq!(tag.match_subtype, MatchSubtype::ETuple);
    assert_relative_eq!(tag.confidence, 79.67);
}

#[test]
fn spelling_leaves_multi_word_tokens_alone() {
    let index = skills_index();
    let speller = SpellingCorrector::new(&index);
    assert_eq!(speller.correct("data scienc"), "data scienc");
    assert_eq!(speller.correct("scal"), "scala");
}

#[test]
fn spelling_pass_keeps_multi_word_entities_intact() {
    let index = Arc::new(
        OntologyIndex::builder()
            .label("data_science")
            .label("date")
            .build()
            .unwrap(),
    );
    let config = TaggerConfig {
        spell_correct: true,
        ..TaggerConfig::default()
    };
    let result = TagOrchestrator::new(index, config).unwrap().process("Data Science");
    assert_eq!(result.ups.normalized, "data science");
    assert_eq!(result.tags.supervised, vec![("data_science".to_string(), 100.0)]);
}

#[test]
fn broader_tags_are_subsumed() {
    let result = tagger(TaggerConfig::default()).process("cloud computing");
    let names: Vec<&str> = result.tags.supervised.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["cloud_computing"]);
}

#[test]
fn subsumption_mode_controls_partial_word_overlap() {
    let text = "java and javascript";
    let default = tagger(TaggerConfig::default()).process(text);
    assert_eq!(default.total_tags, 2);

    let substring = tagger(TaggerConfig {
        subsumption: SubsumptionMode::Substring,
        ..TaggerConfig::default()
    })
    .process(text);
    assert_eq!(substring.tags.supervised[0].0, "javascript");
    assert_eq!(substring.total_tags, 1);
}

#[test]
fn certification_without_cue_is_penalized() {
    let tagger = tagger(TaggerConfig::default());
    let plain = tagger.process("aws csa");
    let cued = tagger.process("certified aws csa");

    let plain = plain.tags.supervised[0].1;
    let cued = cued.tags.supervised[0].1;
    assert_relative_eq!(cued - plain, 25.0, epsilon = 1.0);
}

#[test]
fn results_sort_by_confidence_then_name() {
    let result = tagger(TaggerConfig::default()).process("scala and java");
    let names: Vec<&str> = result.tags.supervised.iter().map(|(n, _)| n.as_str()).collect();
    // Equal scores fall back to name order.
    assert_eq!(names, vec!["java", "scala"]);
}
