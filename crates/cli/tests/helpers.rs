use sigmatch::canonicalize_or_current;
use sigmatch::commands::{parse_hex_selector, parse_target_arg};
use sigmatch_core::db::{Selector, TargetRef};
use tempfile::tempdir;

#[test]
fn canonicalize_or_current_returns_cwd_for_dot() {
    let original = std::env::current_dir().expect("cwd");
    let tmp = tempdir().expect("tempdir");
    std::env::set_current_dir(tmp.path()).expect("chdir tmp");

    let result = canonicalize_or_current(".").expect("canonicalize").canonicalize().expect("canon");
    let expected = tmp.path().canonicalize().expect("canon tmp");
    assert_eq!(result, expected);

    std::env::set_current_dir(original).expect("restore cwd");
}

#[test]
fn canonicalize_or_current_joins_missing_paths_onto_cwd() {
    let result = canonicalize_or_current("does/not/exist/yet").expect("canonicalize");
    assert!(result.is_absolute());
    assert!(result.ends_with("does/not/exist/yet"));
}

#[test]
fn target_args_parse_offsets_and_labels() {
    let (selector, target) = parse_target_arg("0xA9059CBB=0x1f4").expect("hex target");
    assert_eq!(selector, Selector::new("0xa9059cbb"));
    assert_eq!(target, TargetRef::Offset(0x1f4));

    let (_, decimal) = parse_target_arg("a9059cbb=500").expect("decimal target");
    assert_eq!(decimal, TargetRef::Offset(500));

    let (tag, label) = parse_target_arg("_fallback()=entry").expect("tag");
    assert_eq!(tag, Selector::new("_fallback()"));
    assert_eq!(label, TargetRef::Label("entry".into()));

    let (_, default) = parse_target_arg("0x095ea7b3").expect("no target");
    assert_eq!(default, TargetRef::Label("0x095ea7b3".into()));

    assert!(parse_target_arg("=12").is_err());
}

#[test]
fn hex_selector_parsing_rejects_tags() {
    assert_eq!(parse_hex_selector("0x70a08231").expect("valid"), Selector::new("0x70a08231"));
    let err = parse_hex_selector("_fallback()").unwrap_err();
    assert!(err.to_string().contains("Invalid selector"));
}
