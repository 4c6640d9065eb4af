//! Read-only entity/relationship queries over an [`OntologyIndex`].
//!
//! None of these operations fail on unknown input: absence is `None` or an
//! empty list. Closures walk the arena iteratively with a visited bitmap, so a
//! cyclic parent table (which the source data does not rule out) terminates
//! and never reports the start entity as its own ancestor.

use roaring::RoaringBitmap;

use crate::index::{EntityId, EntityNode, OntologyIndex};
use crate::text::normalize_key;

#[derive(Debug, Clone, Copy)]
pub struct EntityLookup<'a> {
    index: &'a OntologyIndex,
}

impl<'a> EntityLookup<'a> {
    pub fn new(index: &'a OntologyIndex) -> Self {
        Self { index }
    }

    /// Canonical label for `token`, or `None`. Never echoes the input back.
    pub fn label(&self, token: &str) -> Option<&'a str> {
        let id = self.index.resolve(token)?;
        self.index.label_of(id)
    }

    pub fn exists(&self, token: &str) -> bool {
        self.label(token).is_some()
    }

    /// Direct parents only.
    pub fn parents(&self, token: &str) -> Vec<&'a str> {
        self.neighbours(token, |n| &n.parents)
    }

    /// Direct children only.
    pub fn children(&self, token: &str) -> Vec<&'a str> {
        self.neighbours(token, |n| &n.children)
    }

    /// Transitive parents, sorted, excluding `token` itself.
    pub fn ancestors(&self, token: &str) -> Vec<&'a str> {
        let Some(id) = self.index.resolve(token) else {
            return Vec::new();
        };
        self.sorted_labels(self.ancestor_ids(id))
    }

    /// Transitive children, sorted, excluding `token` itself.
    pub fn descendants(&self, token: &str) -> Vec<&'a str> {
        let Some(id) = self.index.resolve(token) else {
            return Vec::new();
        };
        self.sorted_labels(self.descendant_ids(id))
    }

    pub fn has_ancestor_from_list(&self, token: &str, candidates: &[&str]) -> bool {
        let Some(id) = self.index.resolve(token) else {
            return false;
        };
        let wanted: Vec<String> = candidates.iter().map(|c| normalize_key(c)).collect();
        if wanted.is_empty() {
            return false;
        }
        self.ancestor_ids(id).into_iter().any(|a| {
            self.index
                .node(a)
                .is_some_and(|n| wanted.iter().any(|w| *w == n.key))
        })
    }

    /// Related terms from the see-also table, sorted.
    pub fn see_also(&self, term: &str) -> Vec<&'a str> {
        self.index
            .see_also_of(term)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn ancestor_ids(&self, id: EntityId) -> Vec<EntityId> {
        closure(self.index, id, |n| &n.parents)
    }

    pub fn descendant_ids(&self, id: EntityId) -> Vec<EntityId> {
        closure(self.index, id, |n| &n.children)
    }

    fn neighbours(&self, token: &str, edges: fn(&EntityNode) -> &Vec<EntityId>) -> Vec<&'a str> {
        let Some(node) = self.index.resolve(token).and_then(|id| self.index.node(id)) else {
            return Vec::new();
        };
        edges(node)
            .iter()
            .filter_map(|&id| self.index.label_of(id))
            .collect()
    }

    fn sorted_labels(&self, ids: Vec<EntityId>) -> Vec<&'a str> {
        let mut labels: Vec<&'a str> = ids
            .into_iter()
            .filter_map(|id| self.index.label_of(id))
            .collect();
        labels.sort_unstable();
        labels
    }
}

/// Depth-first closure over `edges`, excluding `start`.
fn closure(
    index: &OntologyIndex,
    start: EntityId,
    edges: impl Fn(&EntityNode) -> &Vec<EntityId>,
) -> Vec<EntityId> {
    let mut visited = RoaringBitmap::new();
    visited.insert(start.raw());

    let mut out = Vec::new();
    let mut stack = vec![start];
    while let Some(current) = stack.pop() {
        let Some(node) = index.node(current) else {
            continue;
        };
        for &next in edges(node) {
            if visited.insert(next.raw()) {
                out.push(next);
                stack.push(next);
            }
        }
    }
    out
}
