//! Pre-parsed ontology tables.
//!
//! Parsing OWL/TTL ontologies and CSV synonym files happens upstream; by the
//! time data reaches ontotag it is a set of plain mappings. `OntologySource` is
//! that shape, serializable so a parsed ontology can be snapshotted to JSON and
//! reloaded without re-running the upstream loaders.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{OntologyError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OntologySource {
    /// `canonical_term -> [variant_phrase, ...]` (order is preserved).
    #[serde(default)]
    pub synonyms: BTreeMap<String, Vec<String>>,

    /// `term -> [related_term, ...]`
    #[serde(default)]
    pub see_also: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub entity_labels: Vec<String>,

    /// `entity -> [parent_entity, ...]`; empty for root entities.
    #[serde(default)]
    pub entity_parents: BTreeMap<String, Vec<String>>,

    /// `entity -> [pattern_string, ...]`; `_` separates words, `+` marks the
    /// skip-gram join form.
    #[serde(default)]
    pub entity_patterns: BTreeMap<String, Vec<String>>,

    /// `schema_name -> dimension -> [member_entity, ...]`
    #[serde(default)]
    pub dimension_schemas: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl OntologySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let source: OntologySource = serde_json::from_str(json)?;
        source.validate()?;
        Ok(source)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject tables with blank keys. Blank names cannot be tagged or looked up
    /// and usually mean a column shifted in the upstream export.
    pub fn validate(&self) -> Result<()> {
        if let Some(k) = self.synonyms.keys().find(|k| k.trim().is_empty()) {
            return Err(OntologyError::InvalidSource(format!(
                "blank canonical synonym key {k:?}"
            )));
        }
        if self.entity_labels.iter().any(|l| l.trim().is_empty()) {
            return Err(OntologyError::InvalidSource(
                "blank entity label".to_string(),
            ));
        }
        if self.entity_parents.keys().any(|k| k.trim().is_empty()) {
            return Err(OntologyError::InvalidSource(
                "blank entity in parent table".to_string(),
            ));
        }
        for (schema, dims) in &self.dimension_schemas {
            if schema.trim().is_empty() {
                return Err(OntologyError::InvalidSource(
                    "blank dimension schema name".to_string(),
                ));
            }
            if dims.keys().any(|d| d.trim().is_empty()) {
                return Err(OntologyError::InvalidSource(format!(
                    "blank dimension name in schema {schema:?}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_json_with_defaults() {
        let json = r#"{
            "synonyms": {"machine_learning": ["ml", "machine learning"]},
            "entity_parents": {"machine_learning": ["data_science"]}
        }"#;
        let source = OntologySource::from_json_str(json).unwrap();
        assert_eq!(source.synonyms["machine_learning"], vec!["ml", "machine learning"]);
        assert!(source.entity_labels.is_empty());
        assert!(source.dimension_schemas.is_empty());
    }

    #[test]
    fn rejects_blank_keys() {
        let json = r#"{"synonyms": {" ": ["x"]}}"#;
        let err = OntologySource::from_json_str(json).unwrap_err();
        assert!(matches!(err, OntologyError::InvalidSource(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = OntologySource::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, OntologyError::Json(_)));
    }
}
