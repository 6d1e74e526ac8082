//! sigmatch-core
//!
//! Resolution of EVM call selectors into human-readable signatures, and of
//! symbolic calldata reads into parameter names, for use by a decompiler.
//!
//! - `db`: the signature corpus (self-healing SQLite store), workspace layout and config.
//! - `abi`: candidate scoring, the cached per-target ABI builder, and the run-local
//!   active ABI context.
//! - `expr` / `resolver`: symbolic calldata expressions and the parameter name resolver.

pub mod abi;
pub mod db;
pub mod expr;
pub mod render;
pub mod resolver;
