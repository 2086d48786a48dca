use super::{GraphEdge, GraphNode};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Probability of following a link rather than teleporting.
pub const PAGERANK_DAMPING: f64 = 0.85;
/// Fixed iteration count; no convergence check.
pub const PAGERANK_ITERATIONS: usize = 25;

/// PageRank score for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubScore {
    /// Document id.
    pub doc_id: String,
    /// Stationary probability, all scores sum to 1.
    pub score: f64,
}

/// Rank document nodes by PageRank over incoming links.
///
/// Each node pulls rank from its incoming neighbors. Mass from nodes without
/// outgoing links is spread uniformly so the total stays 1. Output is sorted
/// by score descending, ties by doc id.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute_pagerank(nodes: &[GraphNode], edges: &[GraphEdge]) -> Vec<HubScore> {
    let node_count = nodes.len();
    if node_count == 0 {
        return Vec::new();
    }
    let node_to_idx: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| (node.id.as_str(), idx))
        .collect();

    let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut out_degree: Vec<usize> = vec![0; node_count];
    for edge in edges {
        let (Some(&from), Some(&to)) = (
            node_to_idx.get(edge.source.as_str()),
            node_to_idx.get(edge.target.as_str()),
        ) else {
            continue;
        };
        if from == to {
            continue;
        }
        incoming[to].push(from);
        out_degree[from] += 1;
    }

    let n = node_count as f64;
    let teleport = (1.0 - PAGERANK_DAMPING) / n;
    let mut rank = vec![1.0 / n; node_count];
    let mut next = vec![0.0; node_count];
    for _ in 0..PAGERANK_ITERATIONS {
        let dangling_mass: f64 = rank
            .iter()
            .zip(&out_degree)
            .filter(|(_, degree)| **degree == 0)
            .map(|(score, _)| *score)
            .sum();
        let dangling_share = PAGERANK_DAMPING * dangling_mass / n;
        for (idx, slot) in next.iter_mut().enumerate() {
            let pulled: f64 = incoming[idx]
                .iter()
                .map(|&from| rank[from] / out_degree[from] as f64)
                .sum();
            *slot = teleport + dangling_share + PAGERANK_DAMPING * pulled;
        }
        std::mem::swap(&mut rank, &mut next);
    }

    let mut ranked: Vec<HubScore> = nodes
        .iter()
        .zip(rank)
        .map(|(node, score)| HubScore {
            doc_id: node.id.clone(),
            score,
        })
        .collect();
    ranked.sort_by(|left, right| {
        right
            .score
            .partial_cmp(&left.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| left.doc_id.cmp(&right.doc_id))
    });
    ranked
}
