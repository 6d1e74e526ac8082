use anyhow::{anyhow, Result};
use sigmatch_core::db::{
    load_or_default, CorpusPaths, ResolvedPaths, ResolverConfig, ResolverLayout, Selector,
    SupplementDb, TargetRef,
};

use crate::canonicalize_or_current;

/// Layout, config, and resolved paths for a workspace root.
#[derive(Debug)]
pub struct Workspace {
    pub layout: ResolverLayout,
    pub config: ResolverConfig,
    pub paths: ResolvedPaths,
}

impl Workspace {
    /// Load the workspace config (or defaults) for `root`.
    pub fn open(root: &str) -> Result<Self> {
        let root_path = canonicalize_or_current(root)?;
        let layout = ResolverLayout::new(&root_path);
        let config = load_or_default(&layout)?;
        let paths = config.resolve(&layout.root);
        Ok(Self { layout, config, paths })
    }

    pub fn store(&self) -> SupplementDb {
        SupplementDb::new(CorpusPaths::from(&self.paths))
    }
}

/// Parse a selector that must be in hex form (`0x`-prefixed or bare).
pub fn parse_hex_selector(raw: &str) -> Result<Selector> {
    Selector::parse(raw)
        .ok_or_else(|| anyhow!("Invalid selector '{}': expected up to 8 hex digits", raw))
}

/// Parse a `SELECTOR[=TARGET]` argument.
///
/// Hex selectors are canonicalized; anything else is kept verbatim as a synthetic
/// tag (e.g. `_fallback()`). A numeric target (decimal or `0x` hex) becomes a
/// bytecode offset, any other target a label. Without a target the selector
/// itself is used as the label.
pub fn parse_target_arg(raw: &str) -> Result<(Selector, TargetRef)> {
    let (selector_raw, target_raw) = match raw.split_once('=') {
        Some((s, t)) => (s.trim(), Some(t.trim())),
        None => (raw.trim(), None),
    };
    if selector_raw.is_empty() {
        return Err(anyhow!("Empty selector in '{}'", raw));
    }
    let selector = Selector::parse(selector_raw).unwrap_or_else(|| Selector::new(selector_raw));
    let target = match target_raw {
        Some(t) => parse_target(t),
        None => TargetRef::Label(selector.to_string()),
    };
    Ok((selector, target))
}

fn parse_target(raw: &str) -> TargetRef {
    let parsed = match raw.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse::<u64>().ok(),
    };
    parsed.map(TargetRef::Offset).unwrap_or_else(|| TargetRef::Label(raw.to_string()))
}
