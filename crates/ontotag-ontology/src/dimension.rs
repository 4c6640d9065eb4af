//! Dimension classification: map an entity onto the broad business categories
//! of a named schema (e.g. "cloud", "database") for downstream aggregation.
//!
//! Classification walks the entity and then its ancestors level by level:
//!
//! - The shallowest level with a real (non-generic) dimension wins, and every
//!   real dimension found at that level is returned, sorted. Ties are never
//!   broken arbitrarily.
//! - Generic buckets (`unlisted`, `other`) are only reported when no level
//!   yields a real dimension.
//! - An entity with no classification at all is `unlisted`.
//!
//! Asking for a schema that was never loaded is a configuration defect and
//! fails with [`OntologyError::UnknownOntology`].

use ahash::AHashMap;
use roaring::RoaringBitmap;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{OntologyError, Result};
use crate::index::{EntityId, OntologyIndex};
use crate::text::normalize_key;

pub const UNLISTED: &str = "unlisted";
pub const GENERIC_DIMENSIONS: &[&str] = &[UNLISTED, "other"];

fn is_generic(dimension: &str) -> bool {
    GENERIC_DIMENSIONS.contains(&dimension)
}

/// One schema: `dimension -> {member}` plus the reverse map.
#[derive(Debug, Clone, Default)]
pub struct DimensionTable {
    dimensions: BTreeMap<String, BTreeSet<String>>,
    by_member: AHashMap<String, BTreeSet<String>>,
}

impl DimensionTable {
    pub(crate) fn from_source(dims: &BTreeMap<String, Vec<String>>) -> Self {
        let mut table = DimensionTable::default();
        for (dimension, members) in dims {
            let dimension = dimension.trim().to_lowercase();
            let set = table.dimensions.entry(dimension.clone()).or_default();
            for member in members {
                let key = normalize_key(member);
                if key.is_empty() {
                    continue;
                }
                set.insert(key.clone());
                table
                    .by_member
                    .entry(key)
                    .or_default()
                    .insert(dimension.clone());
            }
        }
        table
    }

    pub fn dimension_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.dimensions.keys().map(String::as_str)
    }

    pub fn members(&self, dimension: &str) -> Option<&BTreeSet<String>> {
        self.dimensions.get(dimension)
    }

    fn dimensions_of(&self, key: &str) -> Option<&BTreeSet<String>> {
        self.by_member.get(key)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DimensionClassifier<'a> {
    index: &'a OntologyIndex,
}

impl<'a> DimensionClassifier<'a> {
    pub fn new(index: &'a OntologyIndex) -> Self {
        Self { index }
    }

    pub fn classify(&self, schema: &str, token: &str) -> Result<Vec<String>> {
        let table = self
            .index
            .dimension_table(schema)
            .ok_or_else(|| OntologyError::UnknownOntology(schema.to_string()))?;

        let Some(start) = self.index.resolve(token) else {
            // Not an entity: only its own key can carry a classification.
            let found = table
                .dimensions_of(&normalize_key(token))
                .cloned()
                .unwrap_or_default();
            return Ok(settle(found).unwrap_or_else(unlisted));
        };

        let mut visited = RoaringBitmap::new();
        visited.insert(start.raw());
        let mut frontier = vec![start];
        let mut fallback: Option<Vec<String>> = None;

        while !frontier.is_empty() {
            let mut found = BTreeSet::new();
            for id in &frontier {
                let Some(node) = self.index.node(*id) else {
                    continue;
                };
                if let Some(dims) = table.dimensions_of(&node.key) {
                    found.extend(dims.iter().cloned());
                }
            }

            let (real, generic): (Vec<String>, Vec<String>) =
                found.into_iter().partition(|d| !is_generic(d));
            if !real.is_empty() {
                return Ok(real);
            }
            if fallback.is_none() && !generic.is_empty() {
                fallback = Some(generic);
            }

            frontier = self.next_level(&frontier, &mut visited);
        }

        Ok(fallback.unwrap_or_else(unlisted))
    }

    /// Classify many entities under one schema; the schema is checked once.
    pub fn classify_all<'t>(
        &self,
        schema: &str,
        tokens: impl IntoIterator<Item = &'t str>,
    ) -> Result<BTreeMap<String, Vec<String>>> {
        if self.index.dimension_table(schema).is_none() {
            return Err(OntologyError::UnknownOntology(schema.to_string()));
        }
        tokens
            .into_iter()
            .map(|t| Ok((t.to_string(), self.classify(schema, t)?)))
            .collect()
    }

    fn next_level(&self, frontier: &[EntityId], visited: &mut RoaringBitmap) -> Vec<EntityId> {
        let mut next = Vec::new();
        for id in frontier {
            for &parent in self.index.parents_of(*id) {
                if visited.insert(parent.raw()) {
                    next.push(parent);
                }
            }
        }
        next
    }
}

/// Prefer real dimensions over generic buckets; `None` when nothing matched.
fn settle(found: BTreeSet<String>) -> Option<Vec<String>> {
    if found.is_empty() {
        return None;
    }
    let (real, generic): (Vec<String>, Vec<String>) =
        found.into_iter().partition(|d| !is_generic(d));
    Some(if real.is_empty() { generic } else { real })
}

fn unlisted() -> Vec<String> {
    vec![UNLISTED.to_string()]
}
