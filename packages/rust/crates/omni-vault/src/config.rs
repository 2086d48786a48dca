//! Runtime configuration: defaults, YAML overlay and environment overrides.
//!
//! Resolution order (later wins):
//! 1. built-in defaults
//! 2. `<vault root>/.omni-vault.yaml`, or the explicit `--conf` file
//! 3. `OMNI_VAULT_CACHE_DIR` / `OMNI_VAULT_CACHE_DISABLED`

use crate::error::VaultError;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::{Path, PathBuf};

/// Config file looked up at the vault root.
pub const VAULT_CONFIG_FILE_NAME: &str = ".omni-vault.yaml";
/// Overrides the semantic index cache directory.
pub const CACHE_DIR_ENV: &str = "OMNI_VAULT_CACHE_DIR";
/// Disables the semantic index cache when truthy.
pub const CACHE_DISABLED_ENV: &str = "OMNI_VAULT_CACHE_DISABLED";
const DEFAULT_CACHE_SUBDIR: &str = "omni-vault";

const DEFAULT_EXCLUDED_DIR_NAMES: &[&str] = &[
    ".git",
    ".obsidian",
    ".trash",
    ".cache",
    ".venv",
    "target",
    "node_modules",
];

const DEFAULT_OVERVIEW_TRIGGERS: &[&str] = &[
    "overview",
    "whole project",
    "entire project",
    "big picture",
    "summary",
    "summarize the project",
    "overall picture",
    "전체",
    "전반",
    "개요",
    "요약",
    "총정리",
    "큰 그림",
];

/// Parser settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Files parsed between progress events.
    pub batch_size: usize,
    /// Directory names skipped while scanning a vault.
    pub excluded_dirs: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            batch_size: crate::parser::DEFAULT_PARSE_BATCH_SIZE,
            excluded_dirs: DEFAULT_EXCLUDED_DIR_NAMES
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
        }
    }
}

/// Semantic index settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticConfig {
    /// Related-but-unlinked documents kept per document.
    pub implicit_link_limit: usize,
    /// Minimum cosine score for an implicit link.
    pub implicit_link_min_score: f64,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            implicit_link_limit: 3,
            implicit_link_min_score: 0.2,
        }
    }
}

/// Retrieval engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Semantic candidates fetched before filtering.
    pub candidate_count: usize,
    /// Candidates at or below this score are dropped.
    pub min_seed_score: f64,
    /// Seeds kept after re-ranking.
    pub max_seeds: usize,
    /// Hubs appended when fewer than two seeds survive.
    pub hub_fallback_count: usize,
    /// Maximum PageRank boost applied during seed re-ranking.
    pub rank_boost: f64,
    /// Breadth-first expansion depth.
    pub max_hops: usize,
    /// Document budget for hop 1, 2, ...; the last entry repeats.
    pub hop_budgets: Vec<usize>,
    /// Cap on selected documents, seeds included.
    pub overall_budget: usize,
    /// Implicit-link neighbors allowed to fill leftover budget.
    pub implicit_link_budget: usize,
    /// Emit hub and cluster headers ahead of document bodies.
    pub include_structural_headers: bool,
    /// Hubs listed in the structural header.
    pub header_hub_count: usize,
    /// Clusters listed in the structural header.
    pub header_cluster_limit: usize,
    /// Member labels shown per cluster.
    pub cluster_member_preview: usize,
    /// Hub documents selected for overview queries.
    pub global_hub_count: usize,
    /// Character cap per document excerpt.
    pub excerpt_chars: usize,
    /// Words or phrases marking an overview query.
    pub overview_triggers: Vec<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            candidate_count: 8,
            min_seed_score: 0.1,
            max_seeds: 4,
            hub_fallback_count: 3,
            rank_boost: 0.15,
            max_hops: 2,
            hop_budgets: vec![5, 3],
            overall_budget: 10,
            implicit_link_budget: 2,
            include_structural_headers: true,
            header_hub_count: 5,
            header_cluster_limit: 6,
            cluster_member_preview: 5,
            global_hub_count: 8,
            excerpt_chars: 1200,
            overview_triggers: DEFAULT_OVERVIEW_TRIGGERS
                .iter()
                .map(|trigger| (*trigger).to_string())
                .collect(),
        }
    }
}

impl RetrievalConfig {
    /// Budget for a hop distance (1-based).
    #[must_use]
    pub fn hop_budget(&self, hop: usize) -> usize {
        if hop == 0 {
            return self.overall_budget;
        }
        self.hop_budgets
            .get(hop - 1)
            .or_else(|| self.hop_budgets.last())
            .copied()
            .unwrap_or(self.overall_budget)
    }
}

/// Semantic index cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Persist and restore the semantic index.
    pub enabled: bool,
    /// Cache directory; defaults to the user cache dir.
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

impl CacheConfig {
    /// Directory the cache store should use, `None` when disabled.
    #[must_use]
    pub fn resolved_dir(&self) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }
        self.dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join(DEFAULT_CACHE_SUBDIR)))
    }
}

/// Full vault configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Parser settings.
    pub parser: ParserConfig,
    /// Semantic index settings.
    pub semantic: SemanticConfig,
    /// Retrieval settings.
    pub retrieval: RetrievalConfig,
    /// Cache settings.
    pub cache: CacheConfig,
}

fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                if let Some(existing) = base_map.get_mut(&key) {
                    deep_merge(existing, value);
                } else {
                    base_map.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

fn setting_value_to_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn first_non_empty(values: &[Option<String>]) -> Option<String> {
    values.iter().flatten().find_map(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

impl VaultConfig {
    /// Merge a YAML document over the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Config`] when the YAML is invalid or a field has
    /// the wrong shape.
    pub fn from_yaml_str(raw: &str, origin: &Path) -> Result<Self, VaultError> {
        let config_error = |reason: String| VaultError::Config {
            path: origin.to_path_buf(),
            reason,
        };
        let mut merged = serde_yaml::to_value(Self::default())
            .map_err(|err| config_error(err.to_string()))?;
        let overlay = serde_yaml::from_str::<Value>(raw).map_err(|err| config_error(err.to_string()))?;
        match overlay {
            Value::Null => {}
            Value::Mapping(_) => deep_merge(&mut merged, overlay),
            _ => return Err(config_error("top level must be a mapping".to_string())),
        }
        serde_yaml::from_value(merged).map_err(|err| config_error(err.to_string()))
    }

    /// Load and merge one YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, VaultError> {
        let raw = std::fs::read_to_string(path).map_err(|err| VaultError::io(path, err))?;
        Self::from_yaml_str(&raw, path)
    }

    /// Resolve config for a vault: explicit file, else the vault-root file when
    /// present, else defaults; environment overrides applied last.
    ///
    /// # Errors
    ///
    /// Returns an error when a config file exists but is invalid.
    pub fn resolve(vault_root: &Path, explicit: Option<&Path>) -> Result<Self, VaultError> {
        let candidate = explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| vault_root.join(VAULT_CONFIG_FILE_NAME));
        let config = if explicit.is_some() || candidate.is_file() {
            log::debug!("loading vault config from '{}'", candidate.display());
            Self::load(&candidate)?
        } else {
            Self::default()
        };
        Ok(config.with_env_overrides())
    }

    /// Apply `OMNI_VAULT_CACHE_DIR` and `OMNI_VAULT_CACHE_DISABLED`.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(dir) = first_non_empty(&[std::env::var(CACHE_DIR_ENV).ok()]) {
            self.cache.dir = Some(PathBuf::from(dir));
        }
        if let Some(disabled) = std::env::var(CACHE_DISABLED_ENV)
            .ok()
            .as_deref()
            .and_then(setting_value_to_bool)
        {
            self.cache.enabled = !disabled;
        }
        self
    }
}
