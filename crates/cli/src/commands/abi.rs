use anyhow::{anyhow, Context, Result};
use sigmatch_core::abi::{AbiBuilder, AbiContext};
use sigmatch_core::expr::Expr;

use crate::commands::{parse_target_arg, Workspace};

/// Build (or load from cache) the ABI for a set of `SELECTOR[=TARGET]` arguments.
fn activate(root: &str, selectors: &[String]) -> Result<AbiContext> {
    if selectors.is_empty() {
        return Err(anyhow!("At least one --selector is required"));
    }
    let targets = selectors.iter().map(|raw| parse_target_arg(raw)).collect::<Result<Vec<_>>>()?;

    let workspace = Workspace::open(root)?;
    let store = workspace.store();
    let builder = AbiBuilder::new(&store, &workspace.paths.cache_dir);
    builder.activate(targets).context("Failed to build ABI")
}

/// Resolve the observed selectors into an ABI and print it.
pub fn build_abi_command(root: &str, selectors: &[String], json: bool) -> Result<()> {
    let ctx = activate(root, selectors)?;

    if json {
        println!("{}", serde_json::to_string_pretty(ctx.current_abi())?);
        return Ok(());
    }

    println!("ABI:");
    for (selector, entry) in ctx.current_abi() {
        println!("- {} {}", selector, entry.folded_name);
    }
    Ok(())
}

/// Print the display signature (`name(type paramName, ...)`) of every selector.
pub fn signatures_command(root: &str, selectors: &[String], color: bool) -> Result<()> {
    let ctx = activate(root, selectors)?;
    for selector in ctx.current_abi().keys() {
        if let Some(name) = ctx.func_name(selector, color) {
            println!("{}", name);
        }
    }
    Ok(())
}

/// Name the calldata word at `offset` inside `function`.
pub fn resolve_command(
    root: &str,
    selectors: &[String],
    function: &str,
    offset: u64,
    color: bool,
) -> Result<()> {
    let mut ctx = activate(root, selectors)?;
    let (function, _) = parse_target_arg(function)?;
    ctx.enter_function(&function)?;

    let resolved = ctx.param_name(&Expr::calldata(Expr::Num(offset)), color);
    println!("{}", resolved);
    Ok(())
}
