use super::{ContextEntry, SelectionReason};
use crate::config::RetrievalConfig;
use crate::graph::AdjacencyMap;
use crate::semantic::ImplicitLinks;
use std::collections::HashSet;

/// Breadth-first expansion from `seeds` under per-hop and overall budgets.
///
/// Seeds count against the overall budget at hop 0. A document is selected at
/// most once, at its first hop. Leftover budget may be filled with implicit
/// neighbors of the seeds, reported at hop 1.
pub(super) fn expand_from_seeds(
    adjacency: &AdjacencyMap,
    implicit_links: Option<&ImplicitLinks>,
    seeds: Vec<ContextEntry>,
    config: &RetrievalConfig,
) -> Vec<ContextEntry> {
    let overall_budget = config.overall_budget;
    let mut visited: HashSet<String> = HashSet::new();
    let mut selected: Vec<ContextEntry> = Vec::new();

    for seed in seeds {
        if selected.len() >= overall_budget {
            break;
        }
        if visited.insert(seed.doc_id.clone()) {
            selected.push(seed);
        }
    }
    let seed_ids: Vec<String> = selected.iter().map(|entry| entry.doc_id.clone()).collect();

    let mut frontier = seed_ids.clone();
    'hops: for hop in 1..=config.max_hops {
        if frontier.is_empty() {
            break;
        }
        let hop_budget = config.hop_budget(hop);
        let mut hop_count = 0usize;
        let mut next_frontier: Vec<String> = Vec::new();
        'frontier: for node in &frontier {
            for neighbor in adjacency.neighbors(node) {
                if selected.len() >= overall_budget {
                    break 'hops;
                }
                if hop_count >= hop_budget {
                    break 'frontier;
                }
                if !visited.insert(neighbor.to_string()) {
                    continue;
                }
                selected.push(ContextEntry {
                    doc_id: neighbor.to_string(),
                    hop,
                    reason: SelectionReason::Linked { via: node.clone() },
                });
                next_frontier.push(neighbor.to_string());
                hop_count += 1;
            }
        }
        frontier = next_frontier;
    }

    if config.max_hops == 0 {
        return selected;
    }
    let Some(implicit_links) = implicit_links else {
        return selected;
    };
    let mut implicit_count = 0usize;
    'seeds: for seed_id in &seed_ids {
        for hit in implicit_links.for_doc(seed_id) {
            if selected.len() >= overall_budget || implicit_count >= config.implicit_link_budget {
                break 'seeds;
            }
            if !visited.insert(hit.doc_id.clone()) {
                continue;
            }
            selected.push(ContextEntry {
                doc_id: hit.doc_id.clone(),
                hop: 1,
                reason: SelectionReason::ImplicitLink {
                    of: seed_id.clone(),
                    score: hit.score,
                },
            });
            implicit_count += 1;
        }
    }
    selected
}
