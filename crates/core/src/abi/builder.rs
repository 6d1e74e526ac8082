use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::abi::score::best_candidate;
use crate::abi::AbiContext;
use crate::db::{
    abi_cache_path, AbiEntry, AbiMap, CorpusError, Selector, SignatureStore, TargetRef,
};

/// Distinguishes temp files of concurrent writers within one process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Error)]
pub enum AbiError {
    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error("I/O error on ABI cache {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize ABI: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type for ABI building.
pub type AbiResult<T> = Result<T, AbiError>;

/// Content hash identifying a selector set: SHA-256 (hex) of the JSON-encoded,
/// sorted selector list. Independent of input order.
pub fn cache_key<'a, I>(selectors: I) -> String
where
    I: IntoIterator<Item = &'a Selector>,
{
    let mut sorted: Vec<&str> = selectors.into_iter().map(Selector::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();
    let encoded = serde_json::to_string(&sorted).unwrap_or_default();
    format!("{:x}", Sha256::digest(encoded.as_bytes()))
}

/// Resolves the selectors of one decompilation target into an `AbiMap`,
/// caching the result on disk by selector set.
pub struct AbiBuilder<'a> {
    pub store: &'a dyn SignatureStore,
    pub cache_dir: &'a Path,
}

impl<'a> AbiBuilder<'a> {
    pub fn new(store: &'a dyn SignatureStore, cache_dir: &'a Path) -> Self {
        Self { store, cache_dir }
    }

    /// Build (or load from cache) the ABI for the observed selectors and their targets.
    pub fn build<I>(&self, targets: I) -> AbiResult<AbiMap>
    where
        I: IntoIterator<Item = (Selector, TargetRef)>,
    {
        let targets: BTreeMap<Selector, TargetRef> = targets.into_iter().collect();
        let key = cache_key(targets.keys());
        let cache_path = abi_cache_path(self.cache_dir, &key);

        if let Some(abi) = load_cached(&cache_path) {
            info!(key = %key, "Cache for ABI found");
            return Ok(abi);
        }

        info!(key = %key, selectors = targets.len(), "Cache for ABI not found, generating");
        let observed: BTreeSet<Selector> = targets.keys().cloned().collect();
        let mut abi = AbiMap::new();
        for (selector, target) in targets {
            let entry = self.resolve_entry(&selector, target, &observed)?;
            abi.insert(selector, entry);
        }

        persist(&cache_path, &abi)?;
        info!(key = %key, path = %cache_path.display(), "Cache for ABI generated");
        Ok(abi)
    }

    /// Build the ABI and bind it as the active context of a new analysis run.
    pub fn activate<I>(&self, targets: I) -> AbiResult<AbiContext>
    where
        I: IntoIterator<Item = (Selector, TargetRef)>,
    {
        Ok(AbiContext::new(self.build(targets)?))
    }

    fn resolve_entry(
        &self,
        selector: &Selector,
        target: TargetRef,
        observed: &BTreeSet<Selector>,
    ) -> AbiResult<AbiEntry> {
        if !selector.is_hex() {
            return Ok(AbiEntry::synthetic(selector, target));
        }

        let candidates = self.store.lookup(selector)?;
        match best_candidate(&candidates, observed) {
            Some((record, score)) => {
                debug!(
                    selector = %selector,
                    name = %record.folded_name,
                    score,
                    candidates = candidates.len(),
                    "selected signature"
                );
                Ok(AbiEntry::from_record(record, target))
            }
            None => {
                debug!(selector = %selector, candidates = candidates.len(), "no signature match");
                Ok(AbiEntry::unknown(selector, target))
            }
        }
    }
}

/// Read a persisted ABI; an unreadable or malformed file counts as a miss.
fn load_cached(path: &Path) -> Option<AbiMap> {
    if !path.is_file() {
        return None;
    }
    let parsed = fs::read_to_string(path)
        .map_err(|err| err.to_string())
        .and_then(|body| serde_json::from_str::<AbiMap>(&body).map_err(|err| err.to_string()));
    match parsed {
        Ok(abi) => Some(abi),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Ignoring unreadable ABI cache file");
            None
        }
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> AbiError + '_ {
    move |source| AbiError::Io { path: path.to_path_buf(), source }
}

/// Write through a unique temp file and rename, so concurrent builders of the
/// same key never expose a partial file (last writer wins).
fn persist(path: &Path, abi: &AbiMap) -> AbiResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    let body = serde_json::to_string_pretty(abi)?;
    let unique = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let temp = path.with_extension(format!("{}.{unique}.tmp", std::process::id()));
    fs::write(&temp, body).map_err(io_err(&temp))?;
    fs::rename(&temp, path).map_err(io_err(path))
}
