//! Error types for vault parsing, loading and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by fallible vault operations.
///
/// Cache and retrieval paths never return these; they degrade to a miss or an
/// empty context instead.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Frontmatter block exists but is not valid YAML.
    #[error("malformed frontmatter in '{path}': {reason}")]
    MalformedFrontmatter {
        /// Vault-relative path of the offending file.
        path: String,
        /// YAML parser message.
        reason: String,
    },

    /// Frontmatter parsed but is not a key/value mapping.
    #[error("frontmatter in '{path}' is not a mapping")]
    FrontmatterNotMapping {
        /// Vault-relative path of the offending file.
        path: String,
    },

    /// Filesystem failure while reading a vault or config file.
    #[error("io error at '{}': {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be read or merged.
    #[error("invalid vault config '{}': {reason}", path.display())]
    Config {
        /// Config file path.
        path: PathBuf,
        /// Parser or merge message.
        reason: String,
    },

    /// Index snapshot could not be encoded.
    #[error("failed to encode semantic index snapshot: {0}")]
    Encode(String),
}

impl VaultError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
