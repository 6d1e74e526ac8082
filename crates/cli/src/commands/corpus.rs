use anyhow::{Context, Result};
use serde::Serialize;
use sigmatch_core::db::{SignatureStore, WorkingCopyState};

use crate::commands::{parse_hex_selector, Workspace};

#[derive(Serialize)]
pub struct CorpusStatus {
    pub working: String,
    pub before: String,
    pub after: String,
}

fn state_label(state: WorkingCopyState) -> &'static str {
    match state {
        WorkingCopyState::Absent => "absent",
        WorkingCopyState::Valid => "valid",
        WorkingCopyState::Corrupt => "corrupt",
    }
}

/// Probe the working corpus, rebuilding it if needed, and report what happened.
pub fn check_corpus_command(root: &str, json: bool) -> Result<()> {
    let workspace = Workspace::open(root)?;
    let store = workspace.store();

    let before = store.state();
    store.ensure_ready().context("Signature corpus is unavailable")?;
    let after = store.state();

    let status = CorpusStatus {
        working: store.paths().working.display().to_string(),
        before: state_label(before).to_string(),
        after: state_label(after).to_string(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Signature corpus:");
    println!("  Working copy: {}", status.working);
    println!("  Before: {}", status.before);
    println!("  After: {}", status.after);
    Ok(())
}

/// List every corpus candidate for a selector.
pub fn lookup_command(root: &str, selector: &str, json: bool) -> Result<()> {
    let selector = parse_hex_selector(selector)?;
    let workspace = Workspace::open(root)?;
    let records = workspace
        .store()
        .lookup(&selector)
        .with_context(|| format!("Failed to look up {}", selector))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!("Candidates for {}:", selector);
    if records.is_empty() {
        println!("(none)");
        return Ok(());
    }
    for record in records {
        println!("- {} (co-occurs with {} selectors)", record.folded_name, record.cooccurs.len());
    }
    Ok(())
}

/// Show the single most relevant corpus record for a selector.
pub fn best_command(root: &str, selector: &str, json: bool) -> Result<()> {
    let selector = parse_hex_selector(selector)?;
    let workspace = Workspace::open(root)?;
    let best = workspace
        .store()
        .best(&selector)
        .with_context(|| format!("Failed to look up {}", selector))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&best)?);
        return Ok(());
    }

    match best {
        Some(record) => println!("{} {}", selector, record.folded_name),
        None => println!("{} (no signature known)", selector),
    }
    Ok(())
}
