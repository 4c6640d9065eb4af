//! Error types for the tagging engine.

use ontotag_ontology::OntologyError;

/// Result alias used throughout `ontotag-engine`.
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Ontology(#[from] OntologyError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
