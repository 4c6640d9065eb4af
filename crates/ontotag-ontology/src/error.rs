//! Error types for ontology construction and lookup.

/// Result alias used throughout `ontotag-ontology`.
pub type Result<T> = std::result::Result<T, OntologyError>;

#[derive(Debug, thiserror::Error)]
pub enum OntologyError {
    /// A schema/ontology name that was never loaded. This is a configuration
    /// defect, not a data condition.
    #[error("Unknown ontology: {0}")]
    UnknownOntology(String),

    #[error("Invalid ontology source: {0}")]
    InvalidSource(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
