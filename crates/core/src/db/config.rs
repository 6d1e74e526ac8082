use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::db::ResolverLayout;

/// Paths of the three corpus artifacts. The working copy is rebuilt from
/// `decompressed` when it is valid, otherwise from `compressed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Compressed (`.xz`) corpus as distributed. Required.
    pub compressed: String,
    /// Optional pre-decompressed intermediate copied in preference to decompressing.
    pub decompressed: String,
    /// Working copy that lookups are served from.
    pub working: String,
}

/// Serializable configuration of a resolver workspace.
///
/// This lives (optionally) at `.sigmatch/config.json` in the workspace root.
/// Relative paths are resolved against the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Optional description / notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Config format version.
    pub config_version: String,
    /// Directory for the ABI cache and other derived artifacts.
    pub cache_dir: String,
    pub corpus: CorpusConfig,
}

impl ResolverConfig {
    /// Default configuration for a layout, with paths stored relative to its root.
    pub fn for_layout(layout: &ResolverLayout) -> Self {
        Self {
            description: None,
            config_version: "0.1.0".to_string(),
            cache_dir: layout.relative_string(&layout.cache_dir),
            corpus: CorpusConfig {
                compressed: layout.relative_string(&layout.compressed_corpus),
                decompressed: layout.relative_string(&layout.decompressed_corpus),
                working: layout.relative_string(&layout.working_corpus),
            },
        }
    }

    /// Resolve every configured path against `root`.
    pub fn resolve(&self, root: &Path) -> ResolvedPaths {
        ResolvedPaths {
            cache_dir: resolve_path(root, &self.cache_dir),
            compressed: resolve_path(root, &self.corpus.compressed),
            decompressed: resolve_path(root, &self.corpus.decompressed),
            working: resolve_path(root, &self.corpus.working),
        }
    }
}

/// Absolute paths derived from a `ResolverConfig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub cache_dir: PathBuf,
    pub compressed: PathBuf,
    pub decompressed: PathBuf,
    pub working: PathBuf,
}

fn resolve_path(root: &Path, configured: &str) -> PathBuf {
    let path = Path::new(configured);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Load a config file, choosing the format (JSON or YAML) by extension.
pub fn load_config_file(path: &Path) -> Result<ResolverConfig> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read resolver config at {}", path.display()))?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let config = if matches!(ext, "yaml" | "yml") {
        serde_yaml::from_str(&body).context("Failed to parse resolver config YAML")?
    } else {
        serde_json::from_str(&body).context("Failed to parse resolver config JSON")?
    };
    Ok(config)
}

/// Load the workspace config if present, otherwise fall back to layout defaults.
pub fn load_or_default(layout: &ResolverLayout) -> Result<ResolverConfig> {
    if layout.config_path.is_file() {
        load_config_file(&layout.config_path)
    } else {
        Ok(ResolverConfig::for_layout(layout))
    }
}
