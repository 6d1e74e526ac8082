//! Signature corpus integration and workspace layout definitions.
//!
//! This module wraps the SQLite signature corpus and the files around it:
//! - `ResolverLayout`: computed paths for the workspace, cache, and corpus files.
//! - `ResolverConfig`: serializable workspace configuration.
//! - `SupplementDb`: the self-healing, memoized corpus store.
//! - `SupplementWriter`: corpus creation for fixtures and tooling.
//! - Value types shared by the rest of the crate (`Selector`, `SignatureRecord`, ...).

pub mod config;
pub mod corpus;
pub mod layout;
pub mod models;
pub mod writer;

pub use config::*;
pub use corpus::*;
pub use layout::*;
pub use models::*;
pub use writer::*;
