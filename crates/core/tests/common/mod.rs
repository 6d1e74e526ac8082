#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::Path;

use sigmatch_core::db::{
    compress_corpus, CorpusPaths, Param, ResolverLayout, Selector, SignatureRecord,
    SupplementWriter,
};

pub const TRANSFER: &str = "0xa9059cbb";
pub const APPROVE: &str = "0x095ea7b3";
pub const BALANCE_OF: &str = "0x70a08231";

pub fn record(
    selector: &str,
    name: &str,
    params: &[(&str, &str)],
    cooccurs: &[&str],
) -> SignatureRecord {
    let types: Vec<&str> = params.iter().map(|(ty, _)| *ty).collect();
    SignatureRecord {
        selector: Selector::new(selector),
        name: name.to_string(),
        folded_name: format!("{name}({})", types.join(",")),
        params: params.iter().map(|(ty, n)| Param::new(*ty, *n)).collect(),
        cooccurs: cooccurs.iter().map(|s| Selector::new(*s)).collect::<BTreeSet<_>>(),
    }
}

/// The usual ERC-20 trio, all co-occurring with each other.
pub fn erc20_records() -> Vec<SignatureRecord> {
    let all = [TRANSFER, APPROVE, BALANCE_OF];
    vec![
        record(TRANSFER, "transfer", &[("address", "_to"), ("uint256", "_value")], &all),
        record(APPROVE, "approve", &[("address", "_spender"), ("uint256", "_value")], &all),
        record(BALANCE_OF, "balanceOf", &[("address", "_owner")], &all),
    ]
}

/// Write `records` into a plain corpus database at `path`.
pub fn write_corpus(path: &Path, records: &[SignatureRecord]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create corpus dir");
    }
    let writer = SupplementWriter::create(path).expect("create corpus");
    writer.insert_all(records).expect("insert records");
}

/// Append a row verbatim, bypassing record serialization.
pub fn insert_raw_row(
    path: &Path,
    hash: &str,
    name: impl rusqlite::ToSql,
    params: &str,
    cooccurs: &str,
) {
    let conn = rusqlite::Connection::open(path).expect("open corpus");
    conn.execute(
        "INSERT INTO functions (hash, name, folded_name, params, cooccurs) \
         VALUES (?1, ?2, 'broken()', ?3, ?4)",
        rusqlite::params![hash, name, params, cooccurs],
    )
    .expect("insert raw row");
}

/// Lay out a workspace under `root` whose only corpus source is the compressed file.
pub fn compressed_workspace(root: &Path, records: &[SignatureRecord]) -> ResolverLayout {
    let layout = ResolverLayout::new(root);
    let plain = root.join("scratch.db");
    write_corpus(&plain, records);
    std::fs::create_dir_all(&layout.data_dir).expect("create data dir");
    compress_corpus(&plain, &layout.compressed_corpus).expect("compress corpus");
    std::fs::remove_file(&plain).expect("remove scratch");
    layout
}

pub fn corpus_paths(layout: &ResolverLayout) -> CorpusPaths {
    CorpusPaths {
        compressed: layout.compressed_corpus.clone(),
        decompressed: layout.decompressed_corpus.clone(),
        working: layout.working_corpus.clone(),
    }
}
