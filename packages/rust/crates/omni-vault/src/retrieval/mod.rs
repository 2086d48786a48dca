//! Graph-augmented retrieval: query to a bounded, provenance-tagged context.
//!
//! Per query:
//! 1. overview intent short-circuits to hubs plus all clusters
//! 2. semantic seeds, filtered and re-ranked with a PageRank boost
//! 3. hub fallback when fewer than two seeds survive
//! 4. bounded breadth-first expansion over the adjacency map
//! 5. Markdown assembly with structural headers first
//!
//! Missing index, empty corpus or no starting documents all produce an empty
//! context rather than an error.

mod expand;
mod intent;
mod render;

pub use intent::{QueryIntent, detect_intent};

use crate::config::RetrievalConfig;
use crate::models::Speaker;
use crate::semantic::{SemanticIndex, rank_hits};
use crate::vault::{VaultCorpus, VaultSnapshot};
use serde::{Deserialize, Serialize};

/// Hubs needed before fallback stops adding seeds.
pub const MIN_SEED_COUNT: usize = 2;

/// Which path produced a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    /// Seeds plus graph expansion.
    Focused,
    /// Overview query answered from hubs and clusters.
    Global,
    /// Nothing selected.
    Empty,
}

/// Why a document made it into the context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionReason {
    /// Semantic seed with its re-ranked score.
    Seed {
        /// Re-ranked similarity.
        score: f64,
    },
    /// PageRank hub added because too few seeds survived.
    HubFallback {
        /// PageRank score.
        score: f64,
    },
    /// Reached over a wikilink edge.
    Linked {
        /// Document expanded from.
        via: String,
    },
    /// Similar to a seed without being linked to it.
    ImplicitLink {
        /// Seed it is similar to.
        of: String,
        /// Cosine similarity.
        score: f64,
    },
    /// Top hub selected for an overview query.
    GlobalHub {
        /// PageRank score.
        score: f64,
    },
}

/// One selected document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// Document id.
    pub doc_id: String,
    /// Traversal distance from the seed set.
    pub hop: usize,
    /// Selection reason.
    pub reason: SelectionReason,
}

/// Hub header row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubSummary {
    /// Document id.
    pub doc_id: String,
    /// Filename without extension.
    pub label: String,
    /// Authoring persona.
    pub speaker: Speaker,
    /// PageRank score.
    pub score: f64,
}

/// Cluster header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSummary {
    /// Cluster id, 0 is the largest.
    pub cluster_id: usize,
    /// Member count.
    pub size: usize,
    /// First few member labels.
    pub preview: Vec<String>,
}

/// Per-query retrieval result. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalContext {
    /// Query as given.
    pub query: String,
    /// Path taken.
    pub mode: RetrievalMode,
    /// Selected documents in selection order.
    pub entries: Vec<ContextEntry>,
    /// Hub header rows.
    pub hubs: Vec<HubSummary>,
    /// Cluster header rows.
    pub clusters: Vec<ClusterSummary>,
}

impl RetrievalContext {
    /// Context with nothing selected.
    #[must_use]
    pub fn empty(query: &str) -> Self {
        Self {
            query: query.to_string(),
            mode: RetrievalMode::Empty,
            entries: Vec::new(),
            hubs: Vec::new(),
            clusters: Vec::new(),
        }
    }

    /// Whether no document was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Direct search result with its best-matching section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Document id.
    pub doc_id: String,
    /// File name with extension.
    pub filename: String,
    /// Authoring persona.
    pub speaker: Speaker,
    /// Document tags.
    pub tags: Vec<String>,
    /// Cosine similarity.
    pub score: f64,
    /// Id of the section sharing the most query weight.
    pub section_id: String,
    /// Heading of that section, empty for an intro.
    pub heading: String,
    /// Section body, truncated to the excerpt cap.
    pub content: String,
}

/// Retrieval over one snapshot, borrowed for the duration of a query.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalEngine<'a> {
    snapshot: &'a VaultSnapshot,
    config: &'a RetrievalConfig,
}

impl<'a> RetrievalEngine<'a> {
    /// Engine over `snapshot` with `config` budgets.
    #[must_use]
    pub fn new(snapshot: &'a VaultSnapshot, config: &'a RetrievalConfig) -> Self {
        Self { snapshot, config }
    }

    fn corpus(&self) -> &'a VaultCorpus {
        self.snapshot.corpus()
    }

    /// Run the retrieval state machine for `query`.
    #[must_use]
    pub fn retrieve(&self, query: &str) -> RetrievalContext {
        let corpus = self.corpus();
        if corpus.documents().is_empty() || self.config.overall_budget == 0 {
            return RetrievalContext::empty(query);
        }
        let Some(semantic) = self.snapshot.semantic() else {
            log::debug!("retrieval skipped: semantic index not ready");
            return RetrievalContext::empty(query);
        };

        if detect_intent(query, &self.config.overview_triggers) == QueryIntent::Overview {
            return self.global_context(query);
        }

        let mut seeds = self.select_seeds(semantic.index(), query);
        self.append_hub_fallback(&mut seeds);
        if seeds.is_empty() {
            return RetrievalContext::empty(query);
        }

        let entries = expand::expand_from_seeds(
            corpus.adjacency(),
            Some(semantic.implicit_links()),
            seeds,
            self.config,
        );
        let (hubs, clusters) = if self.config.include_structural_headers {
            (
                self.hub_summaries(self.config.header_hub_count),
                self.cluster_summaries(Some(self.config.header_cluster_limit), 2),
            )
        } else {
            (Vec::new(), Vec::new())
        };
        log::debug!(
            "retrieval selected {} documents for query '{query}'",
            entries.len()
        );
        RetrievalContext {
            query: query.to_string(),
            mode: RetrievalMode::Focused,
            entries,
            hubs,
            clusters,
        }
    }

    /// Semantic search without graph expansion; empty while the index is pending.
    #[must_use]
    pub fn search(&self, query: &str, limit: usize, min_score: f64) -> Vec<SearchHit> {
        let Some(semantic) = self.snapshot.semantic() else {
            return Vec::new();
        };
        let corpus = self.corpus();
        semantic
            .index()
            .query(query, limit, min_score)
            .into_iter()
            .filter_map(|hit| {
                let doc = corpus.document(&hit.doc_id)?;
                let (section_id, heading, content) =
                    render::best_section(doc, query, semantic.index()).map_or_else(
                        Default::default,
                        |section| {
                            (
                                section.id.clone(),
                                section.heading.clone(),
                                render::truncate_chars(
                                    section.body.trim(),
                                    self.config.excerpt_chars,
                                ),
                            )
                        },
                    );
                Some(SearchHit {
                    doc_id: hit.doc_id,
                    filename: doc.filename.clone(),
                    speaker: doc.speaker,
                    tags: doc.tags.clone(),
                    score: hit.score,
                    section_id,
                    heading,
                    content,
                })
            })
            .collect()
    }

    /// Retrieve and render as Markdown; empty string when nothing was selected.
    #[must_use]
    pub fn assemble_context(&self, query: &str) -> String {
        let context = self.retrieve(query);
        self.render(&context)
    }

    /// Render a context produced by this engine's snapshot.
    #[must_use]
    pub fn render(&self, context: &RetrievalContext) -> String {
        render::render_context(
            self.corpus(),
            self.snapshot.semantic().map(|layer| layer.index()),
            context,
            self.config,
        )
    }

    fn select_seeds(&self, index: &SemanticIndex, query: &str) -> Vec<ContextEntry> {
        let corpus = self.corpus();
        let mut hits = index.query(
            query,
            self.config.candidate_count,
            self.config.min_seed_score,
        );
        for hit in &mut hits {
            let bounded = hit.score.clamp(0.0, 1.0);
            let rank = corpus.normalized_rank(&hit.doc_id);
            hit.score = (bounded + (1.0 - bounded) * rank * self.config.rank_boost).clamp(0.0, 1.0);
        }
        rank_hits(&mut hits, self.config.max_seeds);
        hits.into_iter()
            .map(|hit| ContextEntry {
                doc_id: hit.doc_id,
                hop: 0,
                reason: SelectionReason::Seed { score: hit.score },
            })
            .collect()
    }

    fn append_hub_fallback(&self, seeds: &mut Vec<ContextEntry>) {
        if seeds.len() >= MIN_SEED_COUNT {
            return;
        }
        let fallback: Vec<ContextEntry> = self
            .corpus()
            .hubs()
            .iter()
            .filter(|hub| !seeds.iter().any(|seed| seed.doc_id == hub.doc_id))
            .take(self.config.hub_fallback_count)
            .map(|hub| ContextEntry {
                doc_id: hub.doc_id.clone(),
                hop: 0,
                reason: SelectionReason::HubFallback { score: hub.score },
            })
            .collect();
        if !fallback.is_empty() {
            log::debug!("hub fallback added {} seeds", fallback.len());
        }
        seeds.extend(fallback);
    }

    fn global_context(&self, query: &str) -> RetrievalContext {
        let limit = self.config.global_hub_count.min(self.config.overall_budget);
        let entries = self
            .corpus()
            .hubs()
            .iter()
            .take(limit)
            .map(|hub| ContextEntry {
                doc_id: hub.doc_id.clone(),
                hop: 0,
                reason: SelectionReason::GlobalHub { score: hub.score },
            })
            .collect();
        RetrievalContext {
            query: query.to_string(),
            mode: RetrievalMode::Global,
            entries,
            hubs: self.hub_summaries(self.config.header_hub_count),
            clusters: self.cluster_summaries(None, 1),
        }
    }

    fn hub_summaries(&self, limit: usize) -> Vec<HubSummary> {
        let corpus = self.corpus();
        corpus
            .hubs()
            .iter()
            .filter_map(|hub| {
                let doc = corpus.document(&hub.doc_id)?;
                Some(HubSummary {
                    doc_id: hub.doc_id.clone(),
                    label: doc.label().to_string(),
                    speaker: doc.speaker,
                    score: hub.score,
                })
            })
            .take(limit)
            .collect()
    }

    fn cluster_summaries(&self, limit: Option<usize>, min_size: usize) -> Vec<ClusterSummary> {
        let corpus = self.corpus();
        corpus
            .clusters()
            .iter()
            .filter(|cluster| cluster.len() >= min_size)
            .take(limit.unwrap_or(usize::MAX))
            .map(|cluster| ClusterSummary {
                cluster_id: cluster.cluster_id,
                size: cluster.len(),
                preview: cluster
                    .members
                    .iter()
                    .take(self.config.cluster_member_preview)
                    .map(|doc_id| {
                        corpus
                            .document(doc_id)
                            .map_or_else(|| doc_id.clone(), |doc| doc.label().to_string())
                    })
                    .collect(),
            })
            .collect()
    }
}
