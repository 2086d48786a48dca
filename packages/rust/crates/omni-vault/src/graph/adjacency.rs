use super::{GraphEdge, is_phantom_id};
use std::collections::{BTreeSet, HashMap};

/// Symmetric document neighbor map.
///
/// Phantom endpoints are left out since there is no document to expand into.
/// Neighbor sets are ordered so traversal is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencyMap {
    neighbors: HashMap<String, BTreeSet<String>>,
}

impl AdjacencyMap {
    /// Build from a deduplicated edge list in O(E).
    #[must_use]
    pub fn build(edges: &[GraphEdge]) -> Self {
        let mut neighbors: HashMap<String, BTreeSet<String>> = HashMap::new();
        for edge in edges {
            if is_phantom_id(&edge.source) || is_phantom_id(&edge.target) {
                continue;
            }
            if edge.source == edge.target {
                continue;
            }
            neighbors
                .entry(edge.source.clone())
                .or_default()
                .insert(edge.target.clone());
            neighbors
                .entry(edge.target.clone())
                .or_default()
                .insert(edge.source.clone());
        }
        Self { neighbors }
    }

    /// Neighbors of `doc_id` in ascending id order; empty when unknown.
    pub fn neighbors(&self, doc_id: &str) -> impl Iterator<Item = &str> {
        self.neighbors
            .get(doc_id)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Whether `left` and `right` share an edge.
    #[must_use]
    pub fn is_adjacent(&self, left: &str, right: &str) -> bool {
        self.neighbors
            .get(left)
            .is_some_and(|set| set.contains(right))
    }

    /// Neighbor count of `doc_id`.
    #[must_use]
    pub fn degree(&self, doc_id: &str) -> usize {
        self.neighbors.get(doc_id).map_or(0, BTreeSet::len)
    }

    /// Documents with at least one neighbor.
    #[must_use]
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    /// Whether no document has a neighbor.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}

/// Build the symmetric neighbor map for `edges`.
#[must_use]
pub fn build_adjacency_map(edges: &[GraphEdge]) -> AdjacencyMap {
    AdjacencyMap::build(edges)
}
