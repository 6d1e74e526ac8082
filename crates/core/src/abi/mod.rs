//! Per-run ABI resolution: candidate scoring, the cached ABI builder, and the
//! run-local active ABI context.

pub mod builder;
pub mod context;
pub mod score;

pub use builder::{cache_key, AbiBuilder, AbiError, AbiResult};
pub use context::{AbiContext, ContextError};
pub use score::{best_candidate, match_score};
