//! Vault link graph: one node per document, phantom nodes for dangling links.
//!
//! Wikilink resolution order for a slug:
//! 1. a section id of some document links to that section's document
//! 2. a filename, filename stem or derived id links to that document
//! 3. anything else links to the phantom node `_phantom_<slug>`
//!
//! Edges are deduplicated per unordered document pair and self references are
//! dropped.

mod adjacency;
mod clusters;
mod pagerank;

pub use adjacency::{AdjacencyMap, build_adjacency_map};
pub use clusters::{DocumentCluster, find_clusters};
pub use pagerank::{HubScore, PAGERANK_DAMPING, PAGERANK_ITERATIONS, compute_pagerank};

use crate::models::{Document, Speaker};
use crate::parser::{UNTITLED_DOC_ID, file_path_to_doc_id};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Id prefix reserved for phantom nodes.
pub const PHANTOM_PREFIX: &str = "_phantom_";

/// Whether `id` names a phantom node.
#[must_use]
pub fn is_phantom_id(id: &str) -> bool {
    id.starts_with(PHANTOM_PREFIX)
}

/// One node per document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Same as `doc_id`.
    pub id: String,
    /// Backing document id.
    pub doc_id: String,
    /// Authoring persona.
    pub speaker: Speaker,
    /// Filename without extension.
    pub label: String,
    /// Parent folder, absent at the vault root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_path: Option<String>,
    /// Document tags, absent when there are none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Placeholder for an unresolved wikilink target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhantomNode {
    /// `_phantom_<slug>`.
    pub id: String,
    /// Unresolved slug as written.
    pub slug: String,
    /// Display label.
    pub label: String,
}

/// Link between two node ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Linking document.
    pub source: String,
    /// Linked document or phantom node.
    pub target: String,
}

/// Nodes, edges and phantom nodes for the graph-visualization consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultGraph {
    /// Document nodes in input order.
    pub nodes: Vec<GraphNode>,
    /// Deduplicated edges in first-seen order.
    pub edges: Vec<GraphEdge>,
    /// Phantom nodes in first-seen order.
    pub phantom_nodes: Vec<PhantomNode>,
}

impl VaultGraph {
    /// Whether `id` is a document node or phantom node.
    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|node| node.id == id)
            || self.phantom_nodes.iter().any(|node| node.id == id)
    }

    /// Edges whose endpoints are both documents.
    pub fn document_edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges
            .iter()
            .filter(|edge| !is_phantom_id(&edge.source) && !is_phantom_id(&edge.target))
    }
}

/// Build the node list, one entry per document.
#[must_use]
pub fn build_graph_nodes(docs: &[Document]) -> Vec<GraphNode> {
    docs.iter()
        .map(|doc| GraphNode {
            id: doc.id.clone(),
            doc_id: doc.id.clone(),
            speaker: doc.speaker,
            label: doc.label().to_string(),
            folder_path: Some(doc.folder_path.clone()).filter(|path| !path.is_empty()),
            tags: Some(doc.tags.clone()).filter(|tags| !tags.is_empty()),
        })
        .collect()
}

struct LinkResolver<'a> {
    section_owner: HashMap<&'a str, &'a str>,
    doc_alias: HashMap<&'a str, &'a str>,
}

impl<'a> LinkResolver<'a> {
    fn new(docs: &'a [Document]) -> Self {
        let mut section_owner: HashMap<&'a str, &'a str> = HashMap::new();
        let mut doc_alias: HashMap<&'a str, &'a str> = HashMap::new();
        for doc in docs {
            for section in &doc.sections {
                section_owner
                    .entry(section.id.as_str())
                    .or_insert(doc.id.as_str());
            }
            for alias in [doc.id.as_str(), doc.filename.as_str(), doc.label()] {
                if !alias.is_empty() {
                    doc_alias.entry(alias).or_insert(doc.id.as_str());
                }
            }
        }
        Self {
            section_owner,
            doc_alias,
        }
    }

    fn lookup(&self, key: &str) -> Option<&'a str> {
        self.section_owner
            .get(key)
            .or_else(|| self.doc_alias.get(key))
            .copied()
    }

    fn resolve(&self, slug: &str) -> Option<&'a str> {
        if let Some(doc_id) = self.lookup(slug) {
            return Some(doc_id);
        }
        let normalized = file_path_to_doc_id(slug);
        if normalized == UNTITLED_DOC_ID || normalized == slug {
            return None;
        }
        self.lookup(&normalized)
    }
}

struct EdgeSet {
    edges: Vec<GraphEdge>,
    seen_pairs: HashSet<(String, String)>,
}

impl EdgeSet {
    fn insert(&mut self, source: &str, target: &str) {
        let key = if source <= target {
            (source.to_string(), target.to_string())
        } else {
            (target.to_string(), source.to_string())
        };
        if self.seen_pairs.insert(key) {
            self.edges.push(GraphEdge {
                source: source.to_string(),
                target: target.to_string(),
            });
        }
    }
}

/// Build the full link graph from parsed documents.
#[must_use]
pub fn build_graph(docs: &[Document]) -> VaultGraph {
    let resolver = LinkResolver::new(docs);
    let mut edge_set = EdgeSet {
        edges: Vec::new(),
        seen_pairs: HashSet::new(),
    };
    let mut phantom_nodes: Vec<PhantomNode> = Vec::new();
    let mut phantom_ids: HashSet<String> = HashSet::new();

    for doc in docs {
        for slug in doc.wiki_links() {
            match resolver.resolve(slug) {
                Some(target) if target == doc.id => {}
                Some(target) => edge_set.insert(&doc.id, target),
                None => {
                    let phantom_id = format!("{PHANTOM_PREFIX}{slug}");
                    if phantom_ids.insert(phantom_id.clone()) {
                        phantom_nodes.push(PhantomNode {
                            id: phantom_id.clone(),
                            slug: slug.to_string(),
                            label: slug.to_string(),
                        });
                    }
                    edge_set.insert(&doc.id, &phantom_id);
                }
            }
        }
    }

    let graph = VaultGraph {
        nodes: build_graph_nodes(docs),
        edges: edge_set.edges,
        phantom_nodes,
    };
    log::debug!(
        "vault graph built: nodes={} edges={} phantoms={}",
        graph.nodes.len(),
        graph.edges.len(),
        graph.phantom_nodes.len()
    );
    graph
}
