use std::path::{Path, PathBuf};

/// Name of the ABI cache namespace below the cache directory.
pub const ABI_CACHE_NAMESPACE: &str = "pabi";

/// Extension of persisted ABI map files.
pub const ABI_CACHE_EXTENSION: &str = "pabi";

/// Logical layout of a resolver workspace on disk.
///
/// This is derived from a chosen root path. It does *not* perform any IO itself.
#[derive(Debug, Clone)]
pub struct ResolverLayout {
    /// Root directory of the workspace.
    pub root: PathBuf,
    /// Directory for internal metadata (.sigmatch).
    pub meta_dir: PathBuf,
    /// Path to the optional config file (JSON).
    pub config_path: PathBuf,
    /// Directory for derived artifacts (working corpus, ABI cache).
    pub cache_dir: PathBuf,
    /// Directory holding the distributed corpus files.
    pub data_dir: PathBuf,
    /// Compressed corpus as distributed.
    pub compressed_corpus: PathBuf,
    /// Decompressed intermediate copy next to the compressed one.
    pub decompressed_corpus: PathBuf,
    /// Working copy actually queried.
    pub working_corpus: PathBuf,
}

impl ResolverLayout {
    /// Compute the default layout for a workspace rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let meta_dir = root.join(".sigmatch");
        let config_path = meta_dir.join("config.json");
        let cache_dir = meta_dir.join("cache");
        let data_dir = root.join("data");
        let compressed_corpus = data_dir.join("supplement.db.xz");
        let decompressed_corpus = data_dir.join("supplement.db");
        let working_corpus = cache_dir.join("supplement.db");

        Self {
            root,
            meta_dir,
            config_path,
            cache_dir,
            data_dir,
            compressed_corpus,
            decompressed_corpus,
            working_corpus,
        }
    }

    /// Express `path` relative to the root when possible, for storing in config.
    pub fn relative_string(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(rel) => rel.to_string_lossy().to_string(),
            Err(_) => path.to_string_lossy().to_string(),
        }
    }
}

/// Location of a persisted ABI map for a given cache key (hex digest).
///
/// Files are sharded by the first three hex characters of the key.
pub fn abi_cache_path(cache_dir: &Path, key: &str) -> PathBuf {
    let shard = key.get(..3).unwrap_or(key);
    cache_dir
        .join(ABI_CACHE_NAMESPACE)
        .join(shard)
        .join(format!("{key}.{ABI_CACHE_EXTENSION}"))
}
