//! omni-vault - Link graph, semantic index and retrieval context for markdown vaults.
//!
//! Module layout (by pipeline stage):
//! - `loader` / `parser`: vault scan, frontmatter, sections and wikilinks
//! - `graph`: document graph with phantom targets, adjacency, clusters, PageRank
//! - `semantic` / `cache`: TF-IDF index with a fingerprint-validated file cache
//! - `retrieval`: intent check, seeding, bounded expansion, Markdown assembly
//! - `vault`: snapshots and the reload lifecycle
//!
//! # Examples
//!
//! ```rust
//! use omni_vault::{VaultConfig, VaultFile, VaultRuntime};
//! use std::path::Path;
//!
//! let runtime = VaultRuntime::new(VaultConfig::default()).with_cache_store(None);
//! let files = vec![
//!     VaultFile::new("combat.md", "## Boss\nThe boss fight links to [[arena]]."),
//!     VaultFile::new("arena.md", "## Layout\nArena layout for the boss fight."),
//! ];
//! runtime.reload(Path::new("vault"), &files);
//!
//! let context = runtime.retrieve("boss fight");
//! assert!(!context.is_empty());
//! ```

pub mod cache;
pub mod config;
mod error;
pub mod graph;
pub mod loader;
pub mod models;
pub mod parser;
pub mod retrieval;
pub mod semantic;
pub mod vault;

pub use cache::IndexCacheStore;
pub use config::{
    CacheConfig, ParserConfig, RetrievalConfig, SemanticConfig, VAULT_CONFIG_FILE_NAME,
    VaultConfig,
};
pub use error::VaultError;
pub use graph::{
    AdjacencyMap, DocumentCluster, GraphEdge, GraphNode, HubScore, PhantomNode, VaultGraph,
    build_adjacency_map, build_graph, compute_pagerank, find_clusters,
};
pub use loader::scan_vault;
pub use models::{Document, Section, Speaker, VaultFile};
pub use parser::{
    ParseProgress, ParsedVault, SkippedFile, file_path_to_doc_id, parse_batch,
    parse_batch_incremental, parse_document,
};
pub use retrieval::{
    ContextEntry, RetrievalContext, RetrievalEngine, RetrievalMode, SearchHit, SelectionReason,
};
pub use semantic::{
    CacheLookupOutcome, IndexBuildMeta, IndexCacheStatus, SemanticHit, SemanticIndex,
};
pub use vault::{SemanticLayer, VaultCorpus, VaultRuntime, VaultSnapshot, VaultStats};
