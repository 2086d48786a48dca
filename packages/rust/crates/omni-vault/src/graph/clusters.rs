use super::{GraphEdge, GraphNode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Disjoint-set forest with path compression and union by rank.
#[derive(Debug, Clone)]
pub(crate) struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    pub(crate) fn find(&mut self, node: usize) -> usize {
        let mut root = node;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cursor = node;
        while self.parent[cursor] != root {
            let next = self.parent[cursor];
            self.parent[cursor] = root;
            cursor = next;
        }
        root
    }

    /// Merge the sets of `left` and `right`; false when already joined.
    pub(crate) fn union(&mut self, left: usize, right: usize) -> bool {
        let left_root = self.find(left);
        let right_root = self.find(right);
        if left_root == right_root {
            return false;
        }
        match self.rank[left_root].cmp(&self.rank[right_root]) {
            std::cmp::Ordering::Less => self.parent[left_root] = right_root,
            std::cmp::Ordering::Greater => self.parent[right_root] = left_root,
            std::cmp::Ordering::Equal => {
                self.parent[right_root] = left_root;
                self.rank[left_root] = self.rank[left_root].saturating_add(1);
            }
        }
        true
    }
}

/// One connected topic area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentCluster {
    /// Position in size order, 0 is the largest.
    pub cluster_id: usize,
    /// Member doc ids, ascending.
    pub members: Vec<String>,
}

impl DocumentCluster {
    /// Member count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the cluster has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Partition document nodes into connected components.
///
/// Edges touching ids outside `nodes` (phantoms) are ignored. Clusters are
/// ordered by size descending, then by first member id.
#[must_use]
pub fn find_clusters(nodes: &[GraphNode], edges: &[GraphEdge]) -> Vec<DocumentCluster> {
    let node_to_idx: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| (node.id.as_str(), idx))
        .collect();
    let mut forest = UnionFind::new(nodes.len());
    for edge in edges {
        let (Some(&left), Some(&right)) = (
            node_to_idx.get(edge.source.as_str()),
            node_to_idx.get(edge.target.as_str()),
        ) else {
            continue;
        };
        forest.union(left, right);
    }

    let mut members_by_root: HashMap<usize, Vec<String>> = HashMap::new();
    for (idx, node) in nodes.iter().enumerate() {
        let root = forest.find(idx);
        members_by_root
            .entry(root)
            .or_default()
            .push(node.id.clone());
    }

    let mut groups: Vec<Vec<String>> = members_by_root
        .into_values()
        .map(|mut members| {
            members.sort();
            members
        })
        .collect();
    groups.sort_by(|left, right| {
        right
            .len()
            .cmp(&left.len())
            .then_with(|| left.first().cmp(&right.first()))
    });
    groups
        .into_iter()
        .enumerate()
        .map(|(cluster_id, members)| DocumentCluster {
            cluster_id,
            members,
        })
        .collect()
}
