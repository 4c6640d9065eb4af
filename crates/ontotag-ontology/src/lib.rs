//! Ontology index for ontotag.
//!
//! Holds the hand-curated domain ontology that tagging runs against:
//! - canonical terms and their surface variants (forward + reverse),
//! - the see-also relation,
//! - the parent/child entity taxonomy (not guaranteed acyclic),
//! - per-entity surface patterns,
//! - dimension-classification schemas.
//!
//! Parsing the upstream OWL/TTL/CSV files is out of scope; this crate starts
//! from already-parsed tables ([`OntologySource`]) and builds an immutable
//! [`OntologyIndex`] once. Every query surface ([`EntityLookup`],
//! [`DimensionClassifier`]) borrows the index read-only.

pub mod dimension;
pub mod error;
pub mod index;
pub mod lookup;
pub mod source;
pub mod text;

pub use dimension::{DimensionClassifier, DimensionTable, GENERIC_DIMENSIONS, UNLISTED};
pub use error::{OntologyError, Result};
pub use index::{EntityId, EntityNode, OntologyIndex, OntologyIndexBuilder};
pub use lookup::EntityLookup;
pub use source::OntologySource;
pub use text::{
    contains_word, is_stopword, normalize_key, normalize_phrase, normalize_plus_key,
    normalize_text, replace_word, word_count, STOPWORDS,
};
