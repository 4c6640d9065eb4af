//! OntologyIndex: the immutable in-memory ontology.
//!
//! Built once per process from an [`OntologySource`] and then only read. Every
//! matching component holds a shared reference to the same index, so there is
//! no lazily populated global state and the index is freely `Send + Sync`.
//!
//! Layout:
//! - Entities live in an arena (`Vec<EntityNode>`) indexed by [`EntityId`].
//!   Ids are assigned in key order so iteration is deterministic.
//! - `label_index`: normalized label key → entity.
//! - `pattern_index`: normalized `_` pattern key → entity (label fallback).
//! - `skipgram_index`: normalized `+` pattern key → owning entities.
//! - Synonyms are kept forward (`canonical → ordered variants`) and reverse
//!   (`variant → canonical`); reverse is derived from forward, so every reverse
//!   entry resolves to a forward key by construction.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::dimension::{DimensionClassifier, DimensionTable};
use crate::error::Result;
use crate::lookup::EntityLookup;
use crate::source::OntologySource;
use crate::text::{normalize_key, normalize_phrase, normalize_plus_key};

// ============================================================================
// Entity arena
// ============================================================================

/// Arena index of an entity (4 bytes, stable for the lifetime of the index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct EntityId(u32);

impl EntityId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct EntityNode {
    /// Label as declared in the source tables (trimmed).
    pub label: String,
    /// Lookup key (`normalize_key(label)`).
    pub key: String,
    pub parents: Vec<EntityId>,
    pub children: Vec<EntityId>,
    pub patterns: Vec<String>,
}

// ============================================================================
// Index
// ============================================================================

#[derive(Debug, Clone)]
pub struct OntologyIndex {
    synonyms_forward: BTreeMap<String, Vec<String>>,
    synonyms_reverse: AHashMap<String, String>,
    see_also: AHashMap<String, BTreeSet<String>>,
    entities: Vec<EntityNode>,
    label_index: AHashMap<String, EntityId>,
    pattern_index: AHashMap<String, EntityId>,
    skipgram_index: AHashMap<String, Vec<EntityId>>,
    dimension_schemas: BTreeMap<String, DimensionTable>,
    /// Single-word terms known to the ontology (labels, patterns, synonyms).
    vocabulary: AHashSet<String>,
    /// Words that only occur inside multi-word terms (`data` of `data_science`).
    component_words: AHashSet<String>,
}

impl OntologyIndex {
    pub fn builder() -> OntologyIndexBuilder {
        OntologyIndexBuilder::new()
    }

    pub fn from_source(source: OntologySource) -> Result<Self> {
        OntologyIndexBuilder::from_source(source).build()
    }

    pub fn lookup(&self) -> EntityLookup<'_> {
        EntityLookup::new(self)
    }

    pub fn dimensions(&self) -> DimensionClassifier<'_> {
        DimensionClassifier::new(self)
    }

    // ------------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------------

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        (0..self.entities.len() as u32).map(EntityId)
    }

    pub fn node(&self, id: EntityId) -> Option<&EntityNode> {
        self.entities.get(id.index())
    }

    pub fn label_of(&self, id: EntityId) -> Option<&str> {
        self.node(id).map(|n| n.label.as_str())
    }

    pub fn parents_of(&self, id: EntityId) -> &[EntityId] {
        self.node(id).map_or(&[], |n| n.parents.as_slice())
    }

    pub fn children_of(&self, id: EntityId) -> &[EntityId] {
        self.node(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Resolve a token to an entity: exact (case-insensitive) label first, then
    /// the reverse pattern map.
    pub fn resolve(&self, token: &str) -> Option<EntityId> {
        let key = normalize_key(token);
        if key.is_empty() {
            return None;
        }
        self.label_index
            .get(&key)
            .or_else(|| self.pattern_index.get(&key))
            .copied()
    }

    /// Entities owning a `+`-joined skip-gram pattern equal to `candidate`.
    pub fn skipgram_owners(&self, candidate: &str) -> &[EntityId] {
        let key = normalize_plus_key(candidate);
        self.skipgram_index
            .get(&key)
            .map_or(&[], |owners| owners.as_slice())
    }

    pub fn skipgram_pattern_count(&self) -> usize {
        self.skipgram_index.len()
    }

    // ------------------------------------------------------------------------
    // Synonyms
    // ------------------------------------------------------------------------

    /// `(canonical, variants)` in canonical key order.
    pub fn synonyms(&self) -> impl Iterator<Item = (&str, &[String])> + '_ {
        self.synonyms_forward
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn variants_of(&self, canonical: &str) -> &[String] {
        self.synonyms_forward
            .get(&normalize_key(canonical))
            .map_or(&[], |v| v.as_slice())
    }

    pub fn canonical_of(&self, variant: &str) -> Option<&str> {
        self.synonyms_reverse
            .get(&normalize_phrase(variant))
            .map(String::as_str)
    }

    pub fn is_canonical(&self, term: &str) -> bool {
        self.synonyms_forward.contains_key(&normalize_key(term))
    }

    pub fn see_also_of(&self, term: &str) -> Option<&BTreeSet<String>> {
        self.see_also.get(&normalize_key(term))
    }

    // ------------------------------------------------------------------------
    // Dimensions / vocabulary
    // ------------------------------------------------------------------------

    pub fn dimension_table(&self, schema: &str) -> Option<&DimensionTable> {
        self.dimension_schemas.get(schema.trim())
    }

    pub fn schema_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.dimension_schemas.keys().map(String::as_str)
    }

    /// True if `word` is a single-word term the ontology knows about.
    pub fn is_known_word(&self, word: &str) -> bool {
        self.vocabulary.contains(word)
    }

    /// True if `word` is one of the words of a multi-word term.
    pub fn is_component_word(&self, word: &str) -> bool {
        self.component_words.contains(word)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Collects source tables and builds an [`OntologyIndex`].
///
/// The convenience methods append to the underlying [`OntologySource`], which
/// keeps small synthetic ontologies in tests readable.
#[derive(Debug, Clone, Default)]
pub struct OntologyIndexBuilder {
    source: OntologySource,
}

impl OntologyIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_source(source: OntologySource) -> Self {
        Self { source }
    }

    pub fn synonyms(mut self, canonical: &str, variants: &[&str]) -> Self {
        self.source
            .synonyms
            .entry(canonical.to_string())
            .or_default()
            .extend(variants.iter().map(|v| v.to_string()));
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.source.entity_labels.push(label.to_string());
        self
    }

    pub fn parents(mut self, entity: &str, parents: &[&str]) -> Self {
        self.source
            .entity_parents
            .entry(entity.to_string())
            .or_default()
            .extend(parents.iter().map(|p| p.to_string()));
        self
    }

    pub fn patterns(mut self, entity: &str, patterns: &[&str]) -> Self {
        self.source
            .entity_patterns
            .entry(entity.to_string())
            .or_default()
            .extend(patterns.iter().map(|p| p.to_string()));
        self
    }

    pub fn see_also(mut self, term: &str, related: &[&str]) -> Self {
        self.source
            .see_also
            .entry(term.to_string())
            .or_default()
            .extend(related.iter().map(|r| r.to_string()));
        self
    }

    pub fn dimension(mut self, schema: &str, dimension: &str, members: &[&str]) -> Self {
        self.source
            .dimension_schemas
            .entry(schema.to_string())
            .or_default()
            .entry(dimension.to_string())
            .or_default()
            .extend(members.iter().map(|m| m.to_string()));
        self
    }

    pub fn build(self) -> Result<OntologyIndex> {
        self.source.validate()?;
        let src = self.source;

        // Pass 1: collect every label, keyed so ids come out in key order.
        let mut declared: BTreeMap<String, String> = BTreeMap::new();
        let labels = src
            .entity_labels
            .iter()
            .chain(src.entity_parents.keys())
            .chain(src.entity_patterns.keys());
        for label in labels {
            let key = normalize_key(label);
            if !key.is_empty() {
                declared
                    .entry(key)
                    .or_insert_with(|| label.trim().to_string());
            }
        }

        let mut undeclared_parents = 0usize;
        for parent in src.entity_parents.values().flatten() {
            let key = normalize_key(parent);
            if key.is_empty() || declared.contains_key(&key) {
                continue;
            }
            undeclared_parents += 1;
            declared.insert(key, parent.trim().to_string());
        }
        if undeclared_parents > 0 {
            tracing::warn!(
                count = undeclared_parents,
                "parent entities missing from the label table; registering them as labels"
            );
        }

        let mut entities = Vec::with_capacity(declared.len());
        let mut label_index = AHashMap::with_capacity(declared.len());
        for (i, (key, label)) in declared.into_iter().enumerate() {
            label_index.insert(key.clone(), EntityId(i as u32));
            entities.push(EntityNode {
                label,
                key,
                parents: Vec::new(),
                children: Vec::new(),
                patterns: Vec::new(),
            });
        }

        // Pass 2: parent/child edges (cycles are kept; traversals guard them).
        for (child, parents) in &src.entity_parents {
            let Some(&child_id) = label_index.get(&normalize_key(child)) else {
                continue;
            };
            for parent in parents {
                let Some(&parent_id) = label_index.get(&normalize_key(parent)) else {
                    continue;
                };
                if entities[child_id.index()].parents.contains(&parent_id) {
                    continue;
                }
                entities[child_id.index()].parents.push(parent_id);
                entities[parent_id.index()].children.push(child_id);
            }
        }
        for node in &mut entities {
            node.parents.sort_unstable();
            node.children.sort_unstable();
        }

        // Pass 3: surface patterns.
        let mut pattern_index: AHashMap<String, EntityId> = AHashMap::new();
        let mut skipgram_index: AHashMap<String, Vec<EntityId>> = AHashMap::new();
        for (entity, patterns) in &src.entity_patterns {
            let Some(&id) = label_index.get(&normalize_key(entity)) else {
                continue;
            };
            for pattern in patterns {
                let pattern = pattern.trim().to_lowercase();
                if pattern.is_empty() {
                    continue;
                }
                if pattern.contains('+') {
                    let owners = skipgram_index
                        .entry(normalize_plus_key(&pattern))
                        .or_default();
                    if !owners.contains(&id) {
                        owners.push(id);
                    }
                } else {
                    let key = normalize_key(&pattern);
                    if !label_index.contains_key(&key) {
                        pattern_index.entry(key).or_insert(id);
                    }
                }
                let node = &mut entities[id.index()];
                if !node.patterns.contains(&pattern) {
                    node.patterns.push(pattern);
                }
            }
        }

        // Pass 4: synonyms. A variant claimed by two canonicals stays with the
        // first (key order) so forward and reverse never disagree.
        let mut synonyms_forward: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut synonyms_reverse: AHashMap<String, String> = AHashMap::new();
        let mut conflicts = 0usize;
        for (canonical, variants) in &src.synonyms {
            let canonical_key = normalize_key(canonical);
            let ordered = synonyms_forward.entry(canonical_key.clone()).or_default();
            for variant in variants {
                let variant = normalize_phrase(variant);
                if variant.is_empty() || variant == canonical_key || ordered.contains(&variant) {
                    continue;
                }
                match synonyms_reverse.get(&variant) {
                    Some(existing) if existing != &canonical_key => {
                        conflicts += 1;
                        continue;
                    }
                    Some(_) => {}
                    None => {
                        synonyms_reverse.insert(variant.clone(), canonical_key.clone());
                    }
                }
                ordered.push(variant);
            }
        }
        if conflicts > 0 {
            tracing::warn!(
                count = conflicts,
                "synonym variants claimed by more than one canonical term; keeping the first"
            );
        }

        let mut see_also: AHashMap<String, BTreeSet<String>> = AHashMap::new();
        for (term, related) in &src.see_also {
            let entry = see_also.entry(normalize_key(term)).or_default();
            entry.extend(
                related
                    .iter()
                    .map(|r| normalize_key(r))
                    .filter(|r| !r.is_empty()),
            );
        }

        let dimension_schemas = src
            .dimension_schemas
            .iter()
            .map(|(schema, dims)| (schema.trim().to_string(), DimensionTable::from_source(dims)))
            .collect();

        let mut vocabulary = AHashSet::new();
        let mut component_words = AHashSet::new();
        let terms = entities
            .iter()
            .map(|n| n.key.as_str())
            .chain(pattern_index.keys().map(String::as_str))
            .chain(skipgram_index.keys().map(String::as_str))
            .chain(synonyms_forward.keys().map(String::as_str))
            .chain(synonyms_reverse.keys().map(String::as_str));
        for term in terms {
            if term.contains(['_', ' ', '+']) {
                component_words.extend(
                    term.split(['_', ' ', '+'])
                        .filter(|w| !w.is_empty())
                        .map(str::to_string),
                );
            } else {
                vocabulary.insert(term.to_string());
            }
        }

        tracing::debug!(
            entities = entities.len(),
            canonical_terms = synonyms_forward.len(),
            variants = synonyms_reverse.len(),
            patterns = pattern_index.len(),
            skipgram_patterns = skipgram_index.len(),
            schemas = src.dimension_schemas.len(),
            "built ontology index"
        );

        Ok(OntologyIndex {
            synonyms_forward,
            synonyms_reverse,
            see_also,
            entities,
            label_index,
            pattern_index,
            skipgram_index,
            dimension_schemas,
            vocabulary,
            component_words,
        })
    }
}
