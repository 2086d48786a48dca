//! Vault snapshots and the reload lifecycle.
//!
//! A [`VaultCorpus`] bundles everything derived from one parse: documents,
//! graph, adjacency, hubs and clusters. A [`VaultSnapshot`] pairs a corpus
//! with its semantic layer once that is ready. [`VaultRuntime`] is the single
//! writer: it publishes the graph-only snapshot first and swaps in the
//! indexed snapshot afterwards, as long as no newer reload has happened.

use crate::cache::IndexCacheStore;
use crate::config::{SemanticConfig, VaultConfig};
use crate::graph::{
    AdjacencyMap, DocumentCluster, HubScore, VaultGraph, build_adjacency_map, build_graph,
    compute_pagerank, find_clusters,
};
use crate::models::{Document, VaultFile};
use crate::parser::{ParsedVault, SkippedFile, parse_batch_incremental};
use crate::retrieval::{RetrievalContext, RetrievalEngine};
use crate::semantic::{
    ImplicitLinks, IndexBuildMeta, IndexCacheStatus, SemanticIndex, load_or_build_index,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::JoinHandle;

fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Everything derived from one parsed document set.
#[derive(Debug, Clone, Default)]
pub struct VaultCorpus {
    generation: u64,
    root: PathBuf,
    documents: Vec<Document>,
    doc_index: HashMap<String, usize>,
    graph: VaultGraph,
    adjacency: AdjacencyMap,
    hubs: Vec<HubScore>,
    clusters: Vec<DocumentCluster>,
    skipped: Vec<SkippedFile>,
}

impl VaultCorpus {
    /// Derive graph, adjacency, hubs and clusters from parsed documents.
    #[must_use]
    pub fn from_parsed(root: &Path, parsed: ParsedVault) -> Self {
        let ParsedVault { documents, skipped } = parsed;
        let graph = build_graph(&documents);
        let adjacency = build_adjacency_map(&graph.edges);
        let hubs = compute_pagerank(&graph.nodes, &graph.edges);
        let clusters = find_clusters(&graph.nodes, &graph.edges);
        let doc_index = documents
            .iter()
            .enumerate()
            .map(|(idx, doc)| (doc.id.clone(), idx))
            .collect();
        Self {
            generation: 0,
            root: root.to_path_buf(),
            documents,
            doc_index,
            graph,
            adjacency,
            hubs,
            clusters,
            skipped,
        }
    }

    /// Shorthand for [`VaultCorpus::from_parsed`] with no skipped files.
    #[must_use]
    pub fn from_documents(root: &Path, documents: Vec<Document>) -> Self {
        Self::from_parsed(
            root,
            ParsedVault {
                documents,
                skipped: Vec::new(),
            },
        )
    }

    /// Reload counter value this corpus was published under.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Vault root the documents were read from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parsed documents.
    #[must_use]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Document by id.
    #[must_use]
    pub fn document(&self, doc_id: &str) -> Option<&Document> {
        self.doc_index
            .get(doc_id)
            .and_then(|idx| self.documents.get(*idx))
    }

    /// Link graph.
    #[must_use]
    pub fn graph(&self) -> &VaultGraph {
        &self.graph
    }

    /// Document neighbor map.
    #[must_use]
    pub fn adjacency(&self) -> &AdjacencyMap {
        &self.adjacency
    }

    /// PageRank hubs, best first.
    #[must_use]
    pub fn hubs(&self) -> &[HubScore] {
        &self.hubs
    }

    /// PageRank score of `doc_id` divided by the top score, in `[0, 1]`.
    #[must_use]
    pub fn normalized_rank(&self, doc_id: &str) -> f64 {
        let Some(top) = self.hubs.first().map(|hub| hub.score).filter(|v| *v > 0.0) else {
            return 0.0;
        };
        self.hubs
            .iter()
            .find(|hub| hub.doc_id == doc_id)
            .map_or(0.0, |hub| (hub.score / top).clamp(0.0, 1.0))
    }

    /// Connected components, largest first.
    #[must_use]
    pub fn clusters(&self) -> &[DocumentCluster] {
        &self.clusters
    }

    /// Files the parser refused.
    #[must_use]
    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }
}

/// Semantic index plus the precomputed implicit links for one corpus.
#[derive(Debug, Clone)]
pub struct SemanticLayer {
    index: SemanticIndex,
    implicit_links: ImplicitLinks,
    meta: IndexBuildMeta,
}

impl SemanticLayer {
    /// Restore or build the index for `corpus` and precompute implicit links.
    #[must_use]
    pub fn build(
        corpus: &VaultCorpus,
        store: Option<&IndexCacheStore>,
        config: &SemanticConfig,
    ) -> Self {
        let (index, meta) = load_or_build_index(corpus.documents(), store, corpus.root());
        let implicit_links = index.find_implicit_links(
            corpus.adjacency(),
            config.implicit_link_limit,
            config.implicit_link_min_score,
        );
        Self {
            index,
            implicit_links,
            meta,
        }
    }

    /// TF-IDF index.
    #[must_use]
    pub fn index(&self) -> &SemanticIndex {
        &self.index
    }

    /// Related-but-unlinked neighbors.
    #[must_use]
    pub fn implicit_links(&self) -> &ImplicitLinks {
        &self.implicit_links
    }

    /// Cache bookkeeping.
    #[must_use]
    pub fn meta(&self) -> &IndexBuildMeta {
        &self.meta
    }
}

/// Summary counters for a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultStats {
    /// Reload counter.
    pub generation: u64,
    /// Parsed documents.
    pub document_count: usize,
    /// Sections across all documents.
    pub section_count: usize,
    /// Graph edges, phantom edges included.
    pub edge_count: usize,
    /// Phantom nodes.
    pub phantom_count: usize,
    /// Connected components.
    pub cluster_count: usize,
    /// Files the parser refused.
    pub skipped_count: usize,
    /// Whether retrieval can use the semantic index.
    pub index_ready: bool,
    /// Distinct indexed terms, 0 while the index is pending.
    pub indexed_term_count: usize,
    /// Cache status, absent while the index is pending.
    pub index_status: Option<IndexCacheStatus>,
    /// Cache miss reason, when there was one.
    pub index_miss_reason: Option<String>,
}

/// Immutable view handed to readers.
#[derive(Debug, Clone, Default)]
pub struct VaultSnapshot {
    corpus: Arc<VaultCorpus>,
    semantic: Option<Arc<SemanticLayer>>,
}

impl VaultSnapshot {
    /// Snapshot with the given corpus and no semantic layer yet.
    #[must_use]
    pub fn pending(corpus: Arc<VaultCorpus>) -> Self {
        Self {
            corpus,
            semantic: None,
        }
    }

    /// Snapshot with both the corpus and its semantic layer.
    #[must_use]
    pub fn indexed(corpus: Arc<VaultCorpus>, semantic: Arc<SemanticLayer>) -> Self {
        Self {
            corpus,
            semantic: Some(semantic),
        }
    }

    /// Documents, graph and structure.
    #[must_use]
    pub fn corpus(&self) -> &VaultCorpus {
        &self.corpus
    }

    /// Shared handle to the corpus.
    #[must_use]
    pub fn corpus_handle(&self) -> Arc<VaultCorpus> {
        Arc::clone(&self.corpus)
    }

    /// Semantic layer, `None` until the index is attached.
    #[must_use]
    pub fn semantic(&self) -> Option<&SemanticLayer> {
        self.semantic.as_deref()
    }

    /// Whether retrieval can run.
    #[must_use]
    pub fn is_index_ready(&self) -> bool {
        self.semantic.is_some()
    }

    /// Summary counters.
    #[must_use]
    pub fn stats(&self) -> VaultStats {
        let corpus = self.corpus();
        let semantic = self.semantic();
        VaultStats {
            generation: corpus.generation(),
            document_count: corpus.documents().len(),
            section_count: corpus.documents().iter().map(|doc| doc.sections.len()).sum(),
            edge_count: corpus.graph().edges.len(),
            phantom_count: corpus.graph().phantom_nodes.len(),
            cluster_count: corpus.clusters().len(),
            skipped_count: corpus.skipped().len(),
            index_ready: semantic.is_some(),
            indexed_term_count: semantic.map_or(0, |layer| layer.index().term_count()),
            index_status: semantic.map(|layer| layer.meta().status),
            index_miss_reason: semantic.and_then(|layer| layer.meta().miss_reason.clone()),
        }
    }
}

/// Owner of the current snapshot; the only writer.
#[derive(Debug)]
pub struct VaultRuntime {
    config: VaultConfig,
    cache: Option<IndexCacheStore>,
    current: RwLock<Arc<VaultSnapshot>>,
    generation: AtomicU64,
}

impl VaultRuntime {
    /// Runtime with an empty snapshot and the configured cache store.
    #[must_use]
    pub fn new(config: VaultConfig) -> Self {
        let cache = IndexCacheStore::from_config(&config.cache);
        Self {
            config,
            cache,
            current: RwLock::new(Arc::new(VaultSnapshot::default())),
            generation: AtomicU64::new(0),
        }
    }

    /// Replace the cache store; `None` disables caching.
    #[must_use]
    pub fn with_cache_store(mut self, store: Option<IndexCacheStore>) -> Self {
        self.cache = store;
        self
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Cache store in use.
    #[must_use]
    pub fn cache_store(&self) -> Option<&IndexCacheStore> {
        self.cache.as_ref()
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<VaultSnapshot> {
        Arc::clone(&read_lock(&self.current))
    }

    /// Parse `files`, publish the graph-only snapshot and return its corpus.
    pub fn load_graph(&self, root: &Path, files: &[VaultFile]) -> Arc<VaultCorpus> {
        let mut batches = parse_batch_incremental(files, self.config.parser.batch_size);
        for progress in batches.by_ref() {
            log::debug!("parsed {}/{} vault files", progress.parsed, progress.total);
        }
        self.publish_corpus(root, batches.finish())
    }

    /// Publish an already parsed document set without a semantic layer.
    pub fn publish_corpus(&self, root: &Path, parsed: ParsedVault) -> Arc<VaultCorpus> {
        let mut corpus = VaultCorpus::from_parsed(root, parsed);
        corpus.generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let corpus = Arc::new(corpus);
        *write_lock(&self.current) = Arc::new(VaultSnapshot::pending(Arc::clone(&corpus)));
        log::info!(
            "vault graph published: generation={} documents={} edges={} skipped={}",
            corpus.generation(),
            corpus.documents().len(),
            corpus.graph().edges.len(),
            corpus.skipped().len()
        );
        corpus
    }

    /// Build or restore the index for `corpus` and publish it.
    ///
    /// Returns false when a newer corpus was published in the meantime; the
    /// stale layer is dropped so index and graph never mix generations.
    pub fn attach_index(&self, corpus: &Arc<VaultCorpus>) -> bool {
        let layer = Arc::new(SemanticLayer::build(
            corpus,
            self.cache.as_ref(),
            &self.config.semantic,
        ));
        let mut current = write_lock(&self.current);
        if current.corpus().generation() != corpus.generation() {
            log::debug!(
                "discarding semantic index for stale generation {}",
                corpus.generation()
            );
            return false;
        }
        log::info!(
            "semantic index attached: generation={} terms={} cache={:?}",
            corpus.generation(),
            layer.index().term_count(),
            layer.meta().status
        );
        *current = Arc::new(VaultSnapshot::indexed(Arc::clone(corpus), layer));
        true
    }

    /// Parse, publish the graph, then attach the index on this thread.
    pub fn reload(&self, root: &Path, files: &[VaultFile]) -> Arc<VaultSnapshot> {
        let corpus = self.load_graph(root, files);
        self.attach_index(&corpus);
        self.snapshot()
    }

    /// Parse and publish the graph now; build the index on a worker thread.
    ///
    /// The returned handle yields [`VaultRuntime::attach_index`]'s result.
    pub fn reload_in_background(
        self: &Arc<Self>,
        root: &Path,
        files: &[VaultFile],
    ) -> (Arc<VaultCorpus>, JoinHandle<bool>) {
        let corpus = self.load_graph(root, files);
        let runtime = Arc::clone(self);
        let pending = Arc::clone(&corpus);
        let handle = std::thread::spawn(move || runtime.attach_index(&pending));
        (corpus, handle)
    }

    /// Structured retrieval against the current snapshot.
    #[must_use]
    pub fn retrieve(&self, query: &str) -> RetrievalContext {
        let snapshot = self.snapshot();
        RetrievalEngine::new(&snapshot, &self.config.retrieval).retrieve(query)
    }

    /// Markdown context for the chat consumer; empty when nothing applies.
    #[must_use]
    pub fn assemble_context(&self, query: &str) -> String {
        let snapshot = self.snapshot();
        RetrievalEngine::new(&snapshot, &self.config.retrieval).assemble_context(query)
    }
}
