use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a function entry point.
///
/// Usually the canonical `0x` + 8 hex digits form of a 4-byte call selector, but
/// pseudo-functions (e.g. `_fallback()`) are keyed by an arbitrary tag instead.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selector(String);

impl Selector {
    /// Wrap a selector string verbatim (hex selectors and synthetic tags alike).
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Canonical form of a numeric selector: `0x` followed by 8 lowercase hex digits.
    pub fn from_u32(value: u32) -> Self {
        Self(format!("{:#010x}", value))
    }

    /// Parse a hex selector, with or without the `0x` prefix, into canonical form.
    ///
    /// Returns `None` when the input is not a hex number that fits in 4 bytes.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.is_empty() || digits.len() > 8 {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Self::from_u32)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when this selector is in `0x`-prefixed hex form, i.e. can be looked up
    /// in the signature corpus. Synthetic tags are not.
    pub fn is_hex(&self) -> bool {
        self.0.contains("0x")
    }

    /// The selector without its `0x` prefix; used to build placeholder names.
    pub fn suffix(&self) -> &str {
        self.0.strip_prefix("0x").unwrap_or(&self.0)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Selector {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One ABI parameter. Position in the owning list is the calldata slot index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    #[serde(rename = "type")]
    pub ty: String,
    pub name: String,
}

impl Param {
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self { ty: ty.into(), name: name.into() }
    }
}

/// A learned (selector -> human name) fact from the signature corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub selector: Selector,
    pub name: String,
    /// `name(type,type,...)` without parameter names.
    pub folded_name: String,
    pub params: Vec<Param>,
    /// Selectors seen in the same source contract when this record was learned.
    pub cooccurs: BTreeSet<Selector>,
}

impl SignatureRecord {
    /// True when at least one parameter carries the generic `param<N>` name the
    /// corpus importer assigns to unnamed inputs.
    pub fn has_placeholder_params(&self) -> bool {
        self.params.iter().any(|p| p.name.contains("param"))
    }
}

/// Reference handed in by the decompiler identifying where a function lives.
///
/// Opaque to this crate; it is only carried through and persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetRef {
    /// Bytecode offset of the function body.
    Offset(u64),
    /// Any other decompiler label.
    Label(String),
}

impl From<u64> for TargetRef {
    fn from(value: u64) -> Self {
        TargetRef::Offset(value)
    }
}

impl From<&str> for TargetRef {
    fn from(value: &str) -> Self {
        TargetRef::Label(value.to_string())
    }
}

/// Resolved name and parameters for one selector of an analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiEntry {
    pub name: String,
    pub folded_name: String,
    /// Present only when a confident match was found (or the decompiler supplied them).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<Param>>,
    pub target: TargetRef,
}

impl AbiEntry {
    /// Placeholder for a selector with no usable corpus match.
    pub fn unknown(selector: &Selector, target: TargetRef) -> Self {
        Self {
            name: format!("unknown{}", selector.suffix()),
            folded_name: format!("unknown{}(?)", selector.suffix()),
            params: None,
            target,
        }
    }

    /// Entry for a synthetic tag such as `_fallback()`: the tag is its own name.
    pub fn synthetic(selector: &Selector, target: TargetRef) -> Self {
        Self {
            name: selector.as_str().to_string(),
            folded_name: selector.as_str().to_string(),
            params: None,
            target,
        }
    }

    pub fn from_record(record: &SignatureRecord, target: TargetRef) -> Self {
        Self {
            name: record.name.clone(),
            folded_name: record.folded_name.clone(),
            params: Some(record.params.clone()),
            target,
        }
    }
}

/// The resolved ABI of one analysis run. Sorted so its JSON form is stable.
pub type AbiMap = BTreeMap<Selector, AbiEntry>;
