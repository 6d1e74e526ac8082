use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use rusqlite::{params, Connection};
use xz2::write::XzEncoder;

use crate::db::corpus::{io_error, CorpusResult};
use crate::db::SignatureRecord;

/// xz preset used when packing a corpus for distribution.
const XZ_PRESET: u32 = 6;

/// Writer for signature corpus databases.
///
/// Used to produce fixtures and to pack corpora assembled by external tooling.
#[derive(Debug)]
pub struct SupplementWriter {
    conn: Connection,
}

impl SupplementWriter {
    /// Open (or create) a corpus database at `path` and ensure the table exists.
    pub fn create(path: &Path) -> CorpusResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS functions (
                hash        TEXT NOT NULL,
                name        TEXT NOT NULL,
                folded_name TEXT NOT NULL,
                params      TEXT NOT NULL,
                cooccurs    TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS functions_hash ON functions (hash);
            "#,
        )?;
        Ok(Self { conn })
    }

    /// Insert one record and return its row id.
    pub fn insert(&self, record: &SignatureRecord) -> CorpusResult<i64> {
        let params_json = serde_json::to_string(&record.params).map_err(|source| {
            crate::db::CorpusError::Params { selector: record.selector.to_string(), source }
        })?;
        let cooccurs =
            record.cooccurs.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(",");
        self.conn.execute(
            r#"
            INSERT INTO functions (hash, name, folded_name, params, cooccurs)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                record.selector.as_str(),
                record.name,
                record.folded_name,
                params_json,
                cooccurs
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert many records in one transaction, preserving their order.
    pub fn insert_all(&self, records: &[SignatureRecord]) -> CorpusResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for record in records {
            self.insert(record)?;
        }
        tx.commit()?;
        Ok(())
    }
}

/// Compress a corpus database into the xz form it is distributed in.
pub fn compress_corpus(source: &Path, destination: &Path) -> CorpusResult<()> {
    let input = fs::File::open(source).map_err(io_error(source))?;
    let output = fs::File::create(destination).map_err(io_error(destination))?;
    let mut encoder = XzEncoder::new(BufWriter::new(output), XZ_PRESET);
    io::copy(&mut BufReader::new(input), &mut encoder).map_err(io_error(destination))?;
    let mut writer = encoder.finish().map_err(io_error(destination))?;
    io::Write::flush(&mut writer).map_err(io_error(destination))
}
