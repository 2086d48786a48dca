//! On-disk store for serialized semantic indexes, one blob per vault root.
//!
//! Reads and writes are best effort: failures are logged and reported as a
//! missing blob, never as an error to the caller.

use crate::config::CacheConfig;
use crate::error::VaultError;
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::xxh3_64;

const CACHE_FILE_PREFIX: &str = "semantic-index";

/// Directory-backed index cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCacheStore {
    dir: PathBuf,
}

/// Hash of the resolved vault root, so `.` and its absolute path share a slot.
fn cache_slot_key(vault_root: &Path) -> String {
    let resolved =
        std::fs::canonicalize(vault_root).unwrap_or_else(|_| vault_root.to_path_buf());
    let normalized = resolved.to_string_lossy().replace('\\', "/");
    format!("{:016x}", xxh3_64(normalized.trim_end_matches('/').as_bytes()))
}

impl IndexCacheStore {
    /// Store blobs under `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store for the configured directory, `None` when caching is disabled.
    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        config.resolved_dir().map(Self::new)
    }

    /// Cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Blob path for a vault root.
    #[must_use]
    pub fn slot_path(&self, vault_root: &Path) -> PathBuf {
        self.dir.join(format!(
            "{CACHE_FILE_PREFIX}-{}.json",
            cache_slot_key(vault_root)
        ))
    }

    /// Read the cached blob for `vault_root`, if any.
    #[must_use]
    pub fn read(&self, vault_root: &Path) -> Option<Vec<u8>> {
        let path = self.slot_path(vault_root);
        match std::fs::read(&path) {
            Ok(blob) => Some(blob),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                log::warn!("failed to read index cache '{}': {err}", path.display());
                None
            }
        }
    }

    /// Atomically replace the blob for `vault_root`. Failures are logged only.
    pub fn write(&self, vault_root: &Path, blob: &[u8]) {
        let path = self.slot_path(vault_root);
        if let Err(err) = self.write_atomic(&path, blob) {
            log::warn!("failed to write index cache '{}': {err}", path.display());
        }
    }

    fn write_atomic(&self, path: &Path, blob: &[u8]) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, blob)?;
        std::fs::rename(&staging, path)
    }

    /// Remove the blob for `vault_root`; `Ok(false)` when there was none.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be removed.
    pub fn clear(&self, vault_root: &Path) -> Result<bool, VaultError> {
        let path = self.slot_path(vault_root);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(VaultError::io(path, err)),
        }
    }
}
