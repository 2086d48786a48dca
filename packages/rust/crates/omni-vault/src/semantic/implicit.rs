use super::{SemanticHit, SemanticIndex};
use crate::graph::AdjacencyMap;
use rayon::prelude::*;
use std::collections::HashMap;

/// Per-document "related but unlinked" neighbors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImplicitLinks {
    by_doc: HashMap<String, Vec<SemanticHit>>,
}

impl ImplicitLinks {
    /// Implicit neighbors of `doc_id`, best first.
    #[must_use]
    pub fn for_doc(&self, doc_id: &str) -> &[SemanticHit] {
        self.by_doc.get(doc_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Documents with at least one implicit neighbor.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_doc.len()
    }

    /// Whether no implicit neighbor was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_doc.is_empty()
    }
}

impl SemanticIndex {
    /// For every document, find similar documents not already adjacent.
    #[must_use]
    pub fn find_implicit_links(
        &self,
        adjacency: &AdjacencyMap,
        limit: usize,
        min_score: f64,
    ) -> ImplicitLinks {
        if limit == 0 {
            return ImplicitLinks::default();
        }
        let by_doc: HashMap<String, Vec<SemanticHit>> = self
            .doc_ids
            .par_iter()
            .filter_map(|doc_id| {
                let hits = self.similar_to(doc_id, limit, min_score, |candidate| {
                    adjacency.is_adjacent(doc_id, candidate)
                });
                if hits.is_empty() {
                    None
                } else {
                    Some((doc_id.clone(), hits))
                }
            })
            .collect();
        log::debug!(
            "implicit links computed: documents_with_links={}",
            by_doc.len()
        );
        ImplicitLinks { by_doc }
    }
}
