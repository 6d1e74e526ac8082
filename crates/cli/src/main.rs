use anyhow::Result;
use clap::{Parser, Subcommand};
use sigmatch::commands::{
    best_command, build_abi_command, check_corpus_command, init_command, lookup_command,
    resolve_command, signatures_command,
};

/// EVM selector and calldata parameter resolution CLI.
///
/// This CLI is a thin wrapper around `sigmatch-core` (exposed in code as `sigmatch_core`).
/// All substantive logic lives in the library so it can be tested thoroughly
/// and reused from a decompiler.
#[derive(Parser, Debug)]
#[command(
    name = "sigmatch",
    version,
    about = "Resolve EVM call selectors into signatures and calldata reads into parameter names",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a workspace: `.sigmatch/` metadata, cache dir, `data/` dir and a default config.
    Init {
        /// Workspace root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,
    },

    /// Verify the working signature corpus, rebuilding it from the distributed copy if needed.
    CheckCorpus {
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List every known signature for a selector.
    Lookup {
        #[arg(long, default_value = ".")]
        root: String,

        /// Selector in hex (e.g. 0xa9059cbb).
        selector: String,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show the most relevant known signature for a selector.
    Best {
        #[arg(long, default_value = ".")]
        root: String,

        selector: String,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Resolve the selectors observed in one contract into an ABI (cached by selector set).
    BuildAbi {
        #[arg(long, default_value = ".")]
        root: String,

        /// Observed selector, optionally with its target: `0xa9059cbb=0x1f4`. Repeatable.
        #[arg(long = "selector", required = true)]
        selectors: Vec<String>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the display signature of every observed selector.
    Signatures {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long = "selector", required = true)]
        selectors: Vec<String>,

        /// Highlight parameter names with ANSI colors.
        #[arg(long, default_value_t = false)]
        color: bool,
    },

    /// Name the calldata word read at a constant offset inside one function.
    Resolve {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long = "selector", required = true)]
        selectors: Vec<String>,

        /// Function being rendered; must be one of the observed selectors.
        #[arg(long)]
        function: String,

        /// Calldata byte offset of the read.
        #[arg(long)]
        offset: u64,

        #[arg(long, default_value_t = false)]
        color: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Init { root } => init_command(&root)?,
        Command::CheckCorpus { root, json } => check_corpus_command(&root, json)?,
        Command::Lookup { root, selector, json } => lookup_command(&root, &selector, json)?,
        Command::Best { root, selector, json } => best_command(&root, &selector, json)?,
        Command::BuildAbi { root, selectors, json } => build_abi_command(&root, &selectors, json)?,
        Command::Signatures { root, selectors, color } => {
            signatures_command(&root, &selectors, color)?
        }
        Command::Resolve { root, selectors, function, offset, color } => {
            resolve_command(&root, &selectors, &function, offset, color)?
        }
    }

    Ok(())
}
