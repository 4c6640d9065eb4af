//! Rule-based ontology tagging engine.
//!
//! Turns free text into a ranked set of ontology entities:
//!
//! - [`SynonymCanonicalizer`] rewrites surface variants to canonical terms.
//! - [`Segmenter`] splits canonical text into tokens, n-grams and skip-grams.
//! - [`ExactEntityMatcher`] and [`LongDistanceMatcher`] propose scored tags.
//! - [`TagOrchestrator`] keeps the strongest tag per entity, removes subsumed
//!   tags, applies confidence adjustments and produces a [`TagResult`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ontotag_engine::{TagOrchestrator, TaggerConfig};
//! use ontotag_ontology::OntologyIndex;
//!
//! let index = OntologyIndex::builder()
//!     .synonyms("machine_learning", &["ml", "machine learning"])
//!     .parents("machine_learning", &["data_science"])
//!     .build()
//!     .unwrap();
//! let tagger = TagOrchestrator::new(Arc::new(index), TaggerConfig::default()).unwrap();
//!
//! let result = tagger.process("I have ML skills");
//! assert_eq!(result.tags.supervised[0].0, "machine_learning");
//! ```

pub mod canonicalize;
pub mod confidence;
pub mod config;
pub mod error;
pub mod exact;
pub mod long_distance;
pub mod matcher;
pub mod orchestrator;
pub mod segment;
pub mod spelling;
pub mod stem;
pub mod subsume;
pub mod tag;

pub use canonicalize::{Canonicalized, SynonymCanonicalizer};
pub use confidence::CertificationAdjuster;
pub use config::{CertificationConfig, LongDistanceConfig, SubsumptionMode, TaggerConfig};
pub use error::{EngineError, Result};
pub use exact::ExactEntityMatcher;
pub use long_distance::{collect_formations, Formation, LongDistanceMatcher};
pub use matcher::Matcher;
pub use orchestrator::{TagGroups, TagOrchestrator, TagResult, TagRow, TagRun, Ups};
pub use segment::{NgramSet, Segmenter, SkipgramSet, Token, TokenizedText, WindowSegmenter};
pub use spelling::SpellingCorrector;
pub use stem::EnglishStemmer;
pub use subsume::{is_subsumed, subsume};
pub use tag::{MatchAccumulator, MatchSubtype, MatchType, Tag, LDM_FLOOR, MAX_CONFIDENCE};
