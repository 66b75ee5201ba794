//! # docchat CLI
//!
//! The `docchat` binary is the interactive surface for the crate. All
//! commands accept a `--config` flag pointing to a TOML configuration file;
//! a missing file falls back to built-in defaults (docs directory `./docs`,
//! model `gpt-3.5-turbo`, two context documents per turn).
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docchat chat` | Start an interactive chat session |
//! | `docchat ask "<question>"` | Ask one question and stream the answer |
//! | `docchat docs` | List the loaded documents |
//! | `docchat retrieve "<query>"` | Show retrieval ranking for a query |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

use docchat::{chat, config};

/// docchat — chat with a language model over your local text documents.
#[derive(Parser)]
#[command(
    name = "docchat",
    about = "docchat — a retrieval-augmented chat CLI over local text documents",
    version,
    long_about = "docchat loads plain-text documents from a directory, retrieves the ones \
    overlapping each question, and streams answers from an OpenAI-style chat completions \
    endpoint. The API key is read from OPENAI_API_KEY or prompted for interactively."
)]
struct Cli {
    /// Path to configuration file (TOML). Built-in defaults apply if absent.
    #[arg(long, global = true, default_value = "./config/docchat.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session.
    ///
    /// Reads questions line by line. `/reload` re-scans the docs directory,
    /// `/quit` exits. The transcript lives in memory for the session only.
    Chat,

    /// Ask a single question and stream the answer.
    Ask {
        /// The question to ask.
        question: String,
    },

    /// List the documents loaded from the docs directory.
    Docs,

    /// Show which documents a query would retrieve, with overlap scores.
    Retrieve {
        /// The query to rank documents against.
        query: String,

        /// Number of documents to return (defaults to retrieval.top_k).
        #[arg(long)]
        k: Option<usize>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Chat => {
            chat::run_chat(&cfg).await?;
        }
        Commands::Ask { question } => {
            chat::run_ask(&cfg, &question).await?;
        }
        Commands::Docs => {
            chat::run_docs(&cfg)?;
        }
        Commands::Retrieve { query, k } => {
            chat::run_retrieve(&cfg, &query, k)?;
        }
    }

    Ok(())
}
