//! The seam between the orchestrator and individual matching strategies.

use ontotag_ontology::OntologyIndex;

use crate::segment::TokenizedText;
use crate::tag::MatchAccumulator;

/// A matching strategy. Implementations are built once and shared across
/// threads; `match_into` must not do I/O.
pub trait Matcher: Send + Sync {
    fn name(&self) -> &'static str;

    fn match_into(&self, index: &OntologyIndex, text: &TokenizedText, acc: &mut MatchAccumulator);
}
