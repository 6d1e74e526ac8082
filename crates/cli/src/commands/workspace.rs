use std::fs;

use anyhow::{Context, Result};
use sigmatch_core::db::{ResolverConfig, ResolverLayout};

use crate::canonicalize_or_current;

/// Initialize a resolver workspace at `root`: directories plus a default config.
///
/// An existing config file is left untouched.
pub fn init_command(root: &str) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = ResolverLayout::new(&root_path);

    fs::create_dir_all(&layout.meta_dir)
        .with_context(|| format!("Failed to create meta dir: {}", layout.meta_dir.display()))?;
    fs::create_dir_all(&layout.cache_dir)
        .with_context(|| format!("Failed to create cache dir: {}", layout.cache_dir.display()))?;
    fs::create_dir_all(&layout.data_dir)
        .with_context(|| format!("Failed to create data dir: {}", layout.data_dir.display()))?;

    let wrote_config = if layout.config_path.exists() {
        false
    } else {
        let config = ResolverConfig::for_layout(&layout);
        let json = serde_json::to_string_pretty(&config)?;
        fs::write(&layout.config_path, json).with_context(|| {
            format!("Failed to write config: {}", layout.config_path.display())
        })?;
        true
    };

    println!("Initialized sigmatch workspace:");
    println!("  Root: {}", layout.root.display());
    println!(
        "  Config: {}{}",
        layout.config_path.display(),
        if wrote_config { "" } else { " (kept existing)" }
    );
    println!("  Cache dir: {}", layout.cache_dir.display());
    println!("  Corpus (compressed): {}", layout.compressed_corpus.display());

    Ok(())
}
