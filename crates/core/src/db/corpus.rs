//! Signature corpus: selector -> candidate signature records.
//!
//! The corpus is a SQLite database distributed xz-compressed. Lookups are served
//! from a working copy which is materialized on first use and rebuilt whenever
//! it fails a structural probe. Table layout:
//!
//! ```text
//! functions(hash TEXT, name TEXT, folded_name TEXT, params TEXT, cooccurs TEXT)
//! ```
//!
//! where `params` is a JSON array of `{type, name}` and `cooccurs` a comma-joined
//! selector list.

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use parking_lot::{const_mutex, Mutex};
use rusqlite::{params, Connection, OpenFlags};
use thiserror::Error;
use tracing::{debug, info, warn};
use xz2::read::XzDecoder;

use crate::db::{Param, ResolvedPaths, Selector, SignatureRecord};

/// Serializes every create/delete of corpus files across the process.
static MATERIALIZE_LOCK: Mutex<()> = const_mutex(());

/// Error type for signature corpus operations.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Neither a usable intermediate nor the compressed corpus exists.
    #[error("Signature corpus source not found at {}", .0.display())]
    MissingSource(PathBuf),

    /// Materialization finished but the result still fails the probe.
    #[error("Signature corpus materialized at {} is not a valid database", .0.display())]
    UnusableSource(PathBuf),

    #[error("Malformed params for {selector}: {source}")]
    Params {
        selector: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience result type for corpus operations.
pub type CorpusResult<T> = Result<T, CorpusError>;

pub(crate) fn io_error(path: &Path) -> impl FnOnce(io::Error) -> CorpusError + '_ {
    move |source| CorpusError::Io { path: path.to_path_buf(), source }
}

/// Key-value lookup from a selector to its candidate signatures.
pub trait SignatureStore: Send + Sync {
    /// All candidate records for `selector`, in a stable order. Empty is not an error.
    fn lookup(&self, selector: &Selector) -> CorpusResult<Vec<SignatureRecord>>;

    /// The single most relevant record: the one seen alongside the most other
    /// selectors. The first such record wins ties.
    fn best(&self, selector: &Selector) -> CorpusResult<Option<SignatureRecord>> {
        let mut best: Option<SignatureRecord> = None;
        for record in self.lookup(selector)? {
            let better = match &best {
                Some(current) => record.cooccurs.len() > current.cooccurs.len(),
                None => true,
            };
            if better {
                best = Some(record);
            }
        }
        Ok(best)
    }
}

/// Lifecycle state of a corpus file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkingCopyState {
    Absent,
    Valid,
    Corrupt,
}

/// Classify a corpus file by running the integrity probe against it.
pub fn probe(path: &Path) -> WorkingCopyState {
    if !path.is_file() {
        return WorkingCopyState::Absent;
    }
    match integrity_probe(path) {
        Ok(rows) => {
            debug!(path = %path.display(), rows, "signature corpus probe ok");
            WorkingCopyState::Valid
        }
        Err(err) => {
            debug!(path = %path.display(), error = %err, "signature corpus probe failed");
            WorkingCopyState::Corrupt
        }
    }
}

fn integrity_probe(path: &Path) -> rusqlite::Result<i64> {
    let conn = open_read_only(path)?;
    conn.query_row("SELECT COUNT(1) FROM functions", [], |row| row.get(0))
}

fn open_read_only(path: &Path) -> rusqlite::Result<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
}

/// Locations of the corpus artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusPaths {
    pub compressed: PathBuf,
    pub decompressed: PathBuf,
    pub working: PathBuf,
}

impl From<&ResolvedPaths> for CorpusPaths {
    fn from(paths: &ResolvedPaths) -> Self {
        Self {
            compressed: paths.compressed.clone(),
            decompressed: paths.decompressed.clone(),
            working: paths.working.clone(),
        }
    }
}

/// SQLite-backed signature corpus with a self-healing working copy.
///
/// Lookups are memoized per selector for the lifetime of the value; share one
/// instance (e.g. behind an `Arc`) across analysis runs.
#[derive(Debug)]
pub struct SupplementDb {
    paths: CorpusPaths,
    memo: DashMap<Selector, Vec<SignatureRecord>>,
}

impl SupplementDb {
    pub fn new(paths: CorpusPaths) -> Self {
        Self { paths, memo: DashMap::new() }
    }

    pub fn paths(&self) -> &CorpusPaths {
        &self.paths
    }

    /// Current state of the working copy (probes the file).
    pub fn state(&self) -> WorkingCopyState {
        probe(&self.paths.working)
    }

    /// Make sure the working copy exists and passes the probe.
    ///
    /// A corrupt working copy is purged and rebuilt from the decompressed
    /// intermediate or, failing that, the compressed original. Idempotent.
    pub fn ensure_ready(&self) -> CorpusResult<()> {
        let _guard = MATERIALIZE_LOCK.lock();
        let working = &self.paths.working;

        match probe(working) {
            WorkingCopyState::Valid => return Ok(()),
            WorkingCopyState::Corrupt => {
                warn!(path = %working.display(), "Invalid signature corpus, rebuilding");
                purge(working)?;
            }
            WorkingCopyState::Absent => {}
        }

        self.materialize()?;

        match probe(working) {
            WorkingCopyState::Valid => Ok(()),
            _ => {
                purge(working)?;
                Err(CorpusError::UnusableSource(working.clone()))
            }
        }
    }

    /// Must be called with `MATERIALIZE_LOCK` held and the working copy absent.
    fn materialize(&self) -> CorpusResult<()> {
        let CorpusPaths { compressed, decompressed, working } = &self.paths;
        if let Some(parent) = working.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }

        if decompressed != working {
            match probe(decompressed) {
                WorkingCopyState::Valid => {
                    info!(
                        from = %decompressed.display(),
                        to = %working.display(),
                        "Copying signature corpus"
                    );
                    return write_atomically(working, |partial| {
                        fs::copy(decompressed, partial).map(|_| ()).map_err(io_error(decompressed))
                    });
                }
                WorkingCopyState::Corrupt => {
                    warn!(path = %decompressed.display(), "Ignoring unusable decompressed corpus");
                }
                WorkingCopyState::Absent => {}
            }
        }

        if !compressed.is_file() {
            return Err(CorpusError::MissingSource(compressed.clone()));
        }
        info!(
            from = %compressed.display(),
            to = %working.display(),
            "Decompressing signature corpus"
        );
        write_atomically(working, |partial| decompress(compressed, partial))
    }

    fn query(&self, selector: &Selector) -> CorpusResult<Vec<SignatureRecord>> {
        self.ensure_ready()?;
        let conn = open_read_only(&self.paths.working)?;
        let mut stmt = conn.prepare(
            r#"
            SELECT hash, name, folded_name, params, cooccurs
            FROM functions
            WHERE hash = ?1
            ORDER BY rowid
            "#,
        )?;
        let rows = stmt.query_map(params![selector.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        // A bad record only costs its own candidate.
        let mut out = Vec::new();
        for row in rows {
            let (hash, name, folded_name, params_json, cooccurs) = match row {
                Ok(row) => row,
                Err(
                    err @ (rusqlite::Error::InvalidColumnType(..)
                    | rusqlite::Error::FromSqlConversionFailure(..)),
                ) => {
                    warn!(selector = %selector, error = %err, "Skipping malformed corpus record");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            let params: Vec<Param> = match serde_json::from_str(&params_json) {
                Ok(params) => params,
                Err(err) => {
                    warn!(selector = %selector, error = %err, "Skipping malformed corpus record");
                    continue;
                }
            };
            out.push(SignatureRecord {
                selector: Selector::new(hash),
                name,
                folded_name,
                params,
                cooccurs: split_cooccurs(cooccurs.as_deref().unwrap_or_default()),
            });
        }
        Ok(out)
    }
}

impl SignatureStore for SupplementDb {
    fn lookup(&self, selector: &Selector) -> CorpusResult<Vec<SignatureRecord>> {
        if let Some(hit) = self.memo.get(selector) {
            return Ok(hit.value().clone());
        }
        let records = self.query(selector)?;
        self.memo.insert(selector.clone(), records.clone());
        Ok(records)
    }
}

fn split_cooccurs(raw: &str) -> BTreeSet<Selector> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(Selector::new).collect()
}

fn purge(path: &Path) -> CorpusResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(CorpusError::Io { path: path.to_path_buf(), source: err }),
    }
}

/// Produce `target` through a sibling `.partial` file so a crash never leaves a
/// half-written working copy behind.
fn write_atomically<F>(target: &Path, write: F) -> CorpusResult<()>
where
    F: FnOnce(&Path) -> CorpusResult<()>,
{
    let mut name = target.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    let partial = target.with_file_name(name);

    if let Err(err) = write(&partial) {
        let _ = fs::remove_file(&partial);
        return Err(err);
    }
    fs::rename(&partial, target).map_err(io_error(target))
}

fn decompress(compressed: &Path, out_path: &Path) -> CorpusResult<()> {
    let input = fs::File::open(compressed).map_err(io_error(compressed))?;
    let mut decoder = XzDecoder::new(BufReader::new(input));
    let mut output = fs::File::create(out_path).map_err(io_error(out_path))?;
    io::copy(&mut decoder, &mut output).map_err(io_error(compressed))?;
    output.sync_all().map_err(io_error(out_path))
}
