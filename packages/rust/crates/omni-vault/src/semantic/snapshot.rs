use super::{SemanticIndex, TermVector, corpus_fingerprint};
use crate::cache::IndexCacheStore;
use crate::error::VaultError;
use crate::models::Document;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Version tag embedded in every serialized index.
pub const SEMANTIC_INDEX_SCHEMA_VERSION: &str = "omni_vault.semantic_index.v1";

#[derive(Debug, Serialize, Deserialize)]
struct SemanticIndexSnapshot {
    schema_version: String,
    fingerprint: String,
    term_weights: HashMap<String, f64>,
    document_vectors: BTreeMap<String, TermVector>,
}

/// Result of validating a cached blob against the live corpus.
#[derive(Debug)]
pub enum CacheLookupOutcome {
    /// Blob is current and decoded.
    Hit(SemanticIndex),
    /// Blob unusable; the reason is a stable machine-readable tag.
    Miss(&'static str),
}

/// How the index for a snapshot was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexCacheStatus {
    /// Restored from the cache.
    Hit,
    /// Rebuilt after a cache miss.
    Miss,
    /// Built without consulting a cache.
    Disabled,
}

/// Cache bookkeeping reported alongside a built or restored index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexBuildMeta {
    /// `file` when a cache store was used, otherwise `none`.
    pub backend: String,
    /// Hit, miss or disabled.
    pub status: IndexCacheStatus,
    /// Why the cache was not used.
    pub miss_reason: Option<String>,
    /// Snapshot schema version.
    pub schema_version: String,
    /// Fingerprint of the indexed corpus.
    pub fingerprint: String,
}

impl SemanticIndex {
    /// Encode the index, fingerprint included, as a JSON blob.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Encode`] when serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>, VaultError> {
        let snapshot = SemanticIndexSnapshot {
            schema_version: SEMANTIC_INDEX_SCHEMA_VERSION.to_string(),
            fingerprint: self.fingerprint.clone(),
            term_weights: self.term_weights.clone(),
            document_vectors: self.document_vectors.clone(),
        };
        serde_json::to_vec(&snapshot).map_err(|err| VaultError::Encode(err.to_string()))
    }

    /// Decode a blob, accepting it only for the given live fingerprint.
    #[must_use]
    pub fn restore(blob: &[u8], live_fingerprint: &str) -> CacheLookupOutcome {
        let Ok(snapshot) = serde_json::from_slice::<SemanticIndexSnapshot>(blob) else {
            return CacheLookupOutcome::Miss("payload_parse_error");
        };
        if snapshot.schema_version != SEMANTIC_INDEX_SCHEMA_VERSION {
            return CacheLookupOutcome::Miss("schema_version_mismatch");
        }
        if snapshot.fingerprint != live_fingerprint {
            return CacheLookupOutcome::Miss("content_fingerprint_mismatch");
        }
        CacheLookupOutcome::Hit(Self::from_parts(
            snapshot.fingerprint,
            snapshot.term_weights,
            snapshot.document_vectors,
        ))
    }
}

/// Restore the index from `store` when current, otherwise build and save it.
///
/// Cache failures never surface; they only cost a rebuild.
#[must_use]
pub fn load_or_build_index(
    documents: &[Document],
    store: Option<&IndexCacheStore>,
    vault_root: &Path,
) -> (SemanticIndex, IndexBuildMeta) {
    let live_fingerprint = corpus_fingerprint(documents);
    let meta = |status: IndexCacheStatus, miss_reason: Option<&str>| IndexBuildMeta {
        backend: if store.is_some() { "file" } else { "none" }.to_string(),
        status,
        miss_reason: miss_reason.map(str::to_string),
        schema_version: SEMANTIC_INDEX_SCHEMA_VERSION.to_string(),
        fingerprint: live_fingerprint.clone(),
    };

    let Some(store) = store else {
        return (
            SemanticIndex::build(documents),
            meta(IndexCacheStatus::Disabled, None),
        );
    };

    let miss_reason = match store.read(vault_root) {
        None => "key_not_found",
        Some(blob) => match SemanticIndex::restore(&blob, &live_fingerprint) {
            CacheLookupOutcome::Hit(index) => {
                log::debug!(
                    "semantic index cache hit for '{}' (fingerprint {live_fingerprint})",
                    vault_root.display()
                );
                return (index, meta(IndexCacheStatus::Hit, None));
            }
            CacheLookupOutcome::Miss(reason) => reason,
        },
    };
    log::debug!(
        "semantic index cache miss for '{}': {miss_reason}",
        vault_root.display()
    );

    let index = SemanticIndex::build(documents);
    match index.serialize() {
        Ok(blob) => {
            store.write(vault_root, &blob);
        }
        Err(err) => log::warn!("semantic index not cached: {err}"),
    }
    (index, meta(IndexCacheStatus::Miss, Some(miss_reason)))
}
