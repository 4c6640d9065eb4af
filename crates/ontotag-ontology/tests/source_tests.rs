use ontotag_ontology::{OntologyError, OntologyIndex, OntologySource};
use std::io::Write;

const SNAPSHOT: &str = r#"{
  "synonyms": {
    "machine_learning": ["ml", "machine learning"],
    "aws_certified_solutions_architect": ["aws csa", "aws solutions architect"]
  },
  "see_also": { "machine_learning": ["statistics"] },
  "entity_labels": ["python", "scala", "certification"],
  "entity_parents": {
    "machine_learning": ["data_science"],
    "aws_certified_solutions_architect": ["certification"]
  },
  "entity_patterns": { "natural_killer_cell": ["natural+killer+cell"] },
  "dimension_schemas": {
    "skills": { "analytics": ["data_science"] }
  }
}"#;

#[test]
fn loads_snapshot_from_file_and_builds_index() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SNAPSHOT.as_bytes()).unwrap();

    let source = OntologySource::from_json_file(file.path()).unwrap();
    let index = OntologyIndex::from_source(source).unwrap();
    let lookup = index.lookup();

    assert_eq!(lookup.label("ML Skills"), None);
    assert_eq!(lookup.label("machine learning"), Some("machine_learning"));
    assert_eq!(lookup.ancestors("machine_learning"), vec!["data_science"]);
    assert_eq!(lookup.see_also("machine_learning"), vec!["statistics"]);
    assert_eq!(
        index.dimensions().classify("skills", "machine_learning").unwrap(),
        vec!["analytics"]
    );
    assert_eq!(index.canonical_of("aws csa"), Some("aws_certified_solutions_architect"));
}

#[test]
fn snapshot_round_trips_through_pretty_json() {
    let source = OntologySource::from_json_str(SNAPSHOT).unwrap();
    let json = source.to_json_pretty().unwrap();
    assert_eq!(OntologySource::from_json_str(&json).unwrap(), source);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = OntologySource::from_json_file(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, OntologyError::Io(_)));
}
