//! # docqa CLI
//!
//! ## Usage
//!
//! ```bash
//! docqa --config ./config/docqa.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docqa ask [URL] "<question>"` | Answer one question about a document |
//! | `docqa repl [URL]` | Load a document once, ask many questions |
//! | `docqa chat` | Multi-turn chat without a document |
//! | `docqa inspect [URL]` | Show how a document is chunked |
//! | `docqa completions <shell>` | Print shell completions |
//!
//! `URL` defaults to `loader.default_url`. The API key is read from the
//! environment variable named by `llm.api_key_env` (default `LITELLM_KEY`).

use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use docqa::ask::{run_ask, OutputFormat};
use docqa::chat::run_chat;
use docqa::config::{self, Config};
use docqa::inspect::run_inspect;
use docqa::llm::ChatModel;
use docqa::progress::ProgressMode;
use docqa::qa::DocumentQa;
use docqa::repl::run_repl;
use docqa::session::ChatSession;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// docqa: ask questions about a document with retrieval-augmented generation.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/docqa.example.toml` for every key. Without `--config`
/// and without `./config/docqa.toml` the built-in defaults are used.
#[derive(Parser)]
#[command(name = "docqa", version, about)]
struct Cli {
    /// Path to configuration file (TOML). Defaults to `./config/docqa.toml`
    /// when that file exists.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Progress on stderr: `off`, `human`, or `json`. Defaults to human on a TTY.
    #[arg(long, global = true, value_parser = parse_progress)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer one question about a document.
    ///
    /// With one positional argument it is the question and the document is
    /// `loader.default_url`.
    Ask {
        /// Document URL or path, then the question.
        #[arg(num_args = 1..=2, required = true, value_names = ["URL", "QUESTION"])]
        args: Vec<String>,

        /// Number of chunks to retrieve (overrides `retrieval.top_k`).
        #[arg(long)]
        top_k: Option<usize>,

        /// Output format: `text` or `json`.
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Print the retrieved chunks after the answer.
        #[arg(long)]
        show_context: bool,
    },

    /// Load a document once, then answer questions from stdin.
    Repl {
        /// Document URL or path.
        url: Option<String>,
    },

    /// Multi-turn chat with the configured model, no document.
    Chat {
        /// Model to chat with (overrides `llm.model`).
        #[arg(long)]
        model: Option<String>,
    },

    /// Fetch and chunk a document without embedding it.
    Inspect {
        /// Document URL or path.
        url: Option<String>,
    },

    /// Print shell completions.
    Completions {
        shell: clap_complete::Shell,
    },
}

fn parse_progress(s: &str) -> Result<ProgressMode, String> {
    match s {
        "off" => Ok(ProgressMode::Off),
        "human" => Ok(ProgressMode::Human),
        "json" => Ok(ProgressMode::Json),
        other => Err(format!("unknown progress mode '{other}': use off, human, or json")),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "docqa=debug,docqa_core=debug"
    } else {
        "docqa=info,docqa_core=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Commands that don't require config
    if let Commands::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "docqa", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::load_or_default(cli.config.as_deref())?;
    let progress = cli.progress.unwrap_or_else(ProgressMode::default_for_tty);
    let document_url = |url: Option<String>, cfg: &Config| {
        url.unwrap_or_else(|| cfg.loader.default_url.clone())
    };

    match cli.command {
        Commands::Ask {
            mut args,
            top_k,
            format,
            show_context,
        } => {
            let question = args.pop().unwrap_or_default();
            let url = document_url(args.pop(), &cfg);
            let mut qa = DocumentQa::from_config(&cfg, progress.reporter())?;
            run_ask(&mut qa, &url, &question, top_k, format, show_context).await?;
        }
        Commands::Repl { url } => {
            let url = document_url(url, &cfg);
            let mut qa = DocumentQa::from_config(&cfg, progress.reporter())?;
            run_repl(&mut qa, &url).await?;
        }
        Commands::Chat { model } => {
            let base = ChatModel::from_config(&cfg.llm)?;
            let model = match model {
                Some(name) => base.with_model(name),
                None => base,
            };
            let mut session = ChatSession::new(Arc::new(model));
            run_chat(&mut session).await?;
        }
        Commands::Inspect { url } => {
            let url = document_url(url, &cfg);
            let mut inspect_cfg = cfg.clone();
            // Chunking needs no embedder.
            inspect_cfg.embedding.provider = "disabled".to_string();
            let qa = DocumentQa::from_config(&inspect_cfg, progress.reporter())?;
            run_inspect(&qa, &url).await?;
        }
        Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
