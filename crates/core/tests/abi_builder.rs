mod common;

use std::collections::BTreeSet;
use std::sync::Mutex;

use common::{
    compressed_workspace, corpus_paths, erc20_records, insert_raw_row, record, write_corpus,
    APPROVE, BALANCE_OF, TRANSFER,
};
use sigmatch_core::abi::{cache_key, AbiBuilder};
use sigmatch_core::db::{
    abi_cache_path, AbiMap, CorpusResult, Param, Selector, SignatureRecord, SignatureStore,
    SupplementDb, TargetRef,
};
use sigmatch_core::expr::Expr;
use tempfile::tempdir;

/// In-memory store that also records which selectors were looked up.
struct FixedStore {
    records: Vec<SignatureRecord>,
    calls: Mutex<Vec<Selector>>,
}

impl FixedStore {
    fn new(records: Vec<SignatureRecord>) -> Self {
        Self { records, calls: Mutex::new(Vec::new()) }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }
}

impl SignatureStore for FixedStore {
    fn lookup(&self, selector: &Selector) -> CorpusResult<Vec<SignatureRecord>> {
        self.calls.lock().expect("calls lock").push(selector.clone());
        Ok(self.records.iter().filter(|r| &r.selector == selector).cloned().collect())
    }
}

fn targets(pairs: &[(&str, u64)]) -> Vec<(Selector, TargetRef)> {
    pairs.iter().map(|(s, t)| (Selector::new(*s), TargetRef::Offset(*t))).collect()
}

#[test]
fn transfer_resolves_end_to_end() {
    let dir = tempdir().expect("tempdir");
    let layout = compressed_workspace(dir.path(), &erc20_records());
    let store = SupplementDb::new(corpus_paths(&layout));
    let builder = AbiBuilder::new(&store, &layout.cache_dir);

    let mut ctx = builder.activate(targets(&[(TRANSFER, 0x40)])).expect("activate");
    let selector = Selector::new(TRANSFER);
    let entry = ctx.abi_entry_for(&selector).expect("entry");
    assert_eq!(
        entry.params,
        Some(vec![Param::new("address", "_to"), Param::new("uint256", "_value")])
    );
    assert_eq!(entry.target, TargetRef::Offset(0x40));

    ctx.enter_function(&selector).expect("enter");
    let name = ctx.param_name(&Expr::calldata(Expr::Num(36)), false);
    assert_eq!(name.to_string(), "_value");
}

#[test]
fn build_is_deterministic_and_order_independent() {
    let dir = tempdir().expect("tempdir");
    let store = FixedStore::new(erc20_records());
    let builder = AbiBuilder::new(&store, dir.path());

    let forward = builder.build(targets(&[(TRANSFER, 1), (APPROVE, 2)])).expect("forward");
    let key = cache_key(forward.keys());
    let path = abi_cache_path(dir.path(), &key);
    let first_bytes = std::fs::read(&path).expect("cache file written");

    let backward = builder.build(targets(&[(APPROVE, 2), (TRANSFER, 1)])).expect("backward");
    assert_eq!(forward, backward);
    assert_eq!(std::fs::read(&path).expect("cache file"), first_bytes);

    let second_dir = tempdir().expect("tempdir");
    let fresh = AbiBuilder::new(&store, second_dir.path())
        .build(targets(&[(APPROVE, 2), (TRANSFER, 1)]))
        .expect("fresh build");
    let fresh_bytes =
        std::fs::read(abi_cache_path(second_dir.path(), &key)).expect("second cache file");
    assert_eq!(fresh, forward);
    assert_eq!(fresh_bytes, first_bytes);
}

#[test]
fn cache_file_is_sharded_by_key_prefix() {
    let dir = tempdir().expect("tempdir");
    let store = FixedStore::new(erc20_records());
    AbiBuilder::new(&store, dir.path()).build(targets(&[(TRANSFER, 1)])).expect("build");

    let key = cache_key([&Selector::new(TRANSFER)]);
    let expected = dir.path().join("pabi").join(&key[..3]).join(format!("{key}.pabi"));
    assert!(expected.is_file(), "missing {}", expected.display());
}

#[test]
fn cached_abi_is_returned_verbatim_without_lookups() {
    let dir = tempdir().expect("tempdir");
    let store = FixedStore::new(erc20_records());
    let builder = AbiBuilder::new(&store, dir.path());
    let abi = builder.build(targets(&[(TRANSFER, 1)])).expect("build");
    assert_eq!(store.call_count(), 1);

    // Edit the persisted map: a pure cache hands it back untouched.
    let path = abi_cache_path(dir.path(), &cache_key(abi.keys()));
    let mut edited: AbiMap =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("parse");
    edited.get_mut(&Selector::new(TRANSFER)).expect("entry").name = "edited".into();
    std::fs::write(&path, serde_json::to_string(&edited).expect("encode")).expect("write");

    let again = builder.build(targets(&[(TRANSFER, 1)])).expect("cached build");
    assert_eq!(again[&Selector::new(TRANSFER)].name, "edited");
    assert_eq!(store.call_count(), 1);
}

#[test]
fn malformed_cache_file_is_regenerated() {
    let dir = tempdir().expect("tempdir");
    let store = FixedStore::new(erc20_records());
    let builder = AbiBuilder::new(&store, dir.path());
    let path = abi_cache_path(dir.path(), &cache_key([&Selector::new(TRANSFER)]));
    std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    std::fs::write(&path, b"{ not json").expect("write junk");

    let abi = builder.build(targets(&[(TRANSFER, 1)])).expect("build");
    assert_eq!(abi[&Selector::new(TRANSFER)].name, "transfer");
    let reread: AbiMap =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("parse");
    assert_eq!(reread, abi);
}

#[test]
fn unknown_selector_gets_placeholder_entry() {
    let dir = tempdir().expect("tempdir");
    let store = FixedStore::new(erc20_records());
    let abi = AbiBuilder::new(&store, dir.path())
        .build(targets(&[("0xdeadbeef", 7)]))
        .expect("build");

    let entry = &abi[&Selector::new("0xdeadbeef")];
    assert!(entry.params.is_none());
    assert!(entry.name.contains("deadbeef"));
    assert_eq!(entry.folded_name, "unknowndeadbeef(?)");
}

#[test]
fn synthetic_tags_resolve_to_themselves_without_lookup() {
    let dir = tempdir().expect("tempdir");
    let store = FixedStore::new(erc20_records());
    let abi = AbiBuilder::new(&store, dir.path())
        .build(vec![(Selector::new("_fallback()"), TargetRef::from("fallback"))])
        .expect("build");

    let entry = &abi[&Selector::new("_fallback()")];
    assert_eq!(entry.name, "_fallback()");
    assert_eq!(entry.folded_name, "_fallback()");
    assert!(entry.params.is_none());
    assert_eq!(entry.target, TargetRef::Label("fallback".into()));
    assert_eq!(store.call_count(), 0);
}

#[test]
fn co_occurrence_disambiguates_colliding_selectors() {
    let dir = tempdir().expect("tempdir");
    let colliding = "0x12345678";
    let store = FixedStore::new(vec![
        record(colliding, "unrelated", &[("uint256", "_x")], &[colliding, "0x99999999"]),
        record(colliding, "related", &[("uint256", "_y")], &[colliding, TRANSFER, APPROVE]),
    ]);
    let abi = AbiBuilder::new(&store, dir.path())
        .build(targets(&[(colliding, 1), (TRANSFER, 2), (APPROVE, 3)]))
        .expect("build");
    assert_eq!(abi[&Selector::new(colliding)].name, "related");
}

#[test]
fn named_parameters_beat_generic_ones() {
    let dir = tempdir().expect("tempdir");
    let store = FixedStore::new(vec![
        record(BALANCE_OF, "balanceOf", &[("address", "_param1")], &[BALANCE_OF, TRANSFER]),
        record(BALANCE_OF, "balanceOf", &[("address", "_owner")], &[]),
    ]);
    let abi = AbiBuilder::new(&store, dir.path())
        .build(targets(&[(BALANCE_OF, 1), (TRANSFER, 2)]))
        .expect("build");
    let params = abi[&Selector::new(BALANCE_OF)].params.clone().expect("params");
    assert_eq!(params[0].name, "_owner");
}

#[test]
fn candidates_scoring_zero_leave_the_placeholder() {
    let dir = tempdir().expect("tempdir");
    let store = FixedStore::new(vec![record(
        "0x12345678",
        "guess",
        &[("uint256", "_param1")],
        &["0x87654321"],
    )]);
    let abi = AbiBuilder::new(&store, dir.path())
        .build(targets(&[("0x12345678", 1)]))
        .expect("build");
    let entry = &abi[&Selector::new("0x12345678")];
    assert_eq!(entry.name, "unknown12345678");
    assert!(entry.params.is_none());
}

#[test]
fn every_observed_selector_gets_an_entry() {
    let dir = tempdir().expect("tempdir");
    let store = FixedStore::new(erc20_records());
    let abi = AbiBuilder::new(&store, dir.path())
        .build(targets(&[(TRANSFER, 1), (APPROVE, 2), ("0xdeadbeef", 3)]))
        .expect("build");
    let keys: BTreeSet<&str> = abi.keys().map(Selector::as_str).collect();
    assert_eq!(keys, BTreeSet::from([TRANSFER, APPROVE, "0xdeadbeef"]));
}

#[test]
fn malformed_corpus_row_does_not_abort_the_build() {
    let dir = tempdir().expect("tempdir");
    let layout = compressed_workspace(dir.path(), &[]);
    write_corpus(&layout.decompressed_corpus, &erc20_records());
    insert_raw_row(&layout.decompressed_corpus, "0x12345678", "broken", "not json", "");
    let store = SupplementDb::new(corpus_paths(&layout));

    let abi = AbiBuilder::new(&store, &layout.cache_dir)
        .build(targets(&[(TRANSFER, 1), ("0x12345678", 2)]))
        .expect("build");
    assert_eq!(abi[&Selector::new(TRANSFER)].folded_name, "transfer(address,uint256)");
    assert_eq!(abi[&Selector::new("0x12345678")].name, "unknown12345678");
}
