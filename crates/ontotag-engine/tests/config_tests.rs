use std::io::Write;

use ontotag_engine::{EngineError, SubsumptionMode, TaggerConfig};

#[test]
fn loads_config_file_with_defaults_for_missing_fields() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "subsumption": "substring",
            "long_distance": {{ "enabled": false }},
            "stopwords": ["etc"]
        }}"#
    )
    .unwrap();

    let config = TaggerConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.subsumption, SubsumptionMode::Substring);
    assert!(!config.long_distance.enabled);
    assert!(config.long_distance.stem_exclusions.contains_key("share"));
    assert_eq!(config.stopwords, vec!["etc".to_string()]);
    assert_eq!(config.iterations, 3);
}

#[test]
fn config_round_trips_through_json() {
    let config = TaggerConfig::default();
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(TaggerConfig::from_json_str(&json).unwrap(), config);
}

#[test]
fn missing_config_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = TaggerConfig::from_json_file(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, EngineError::Io(_)));
}
