//! marginalia - Command-line front end for the notes query engine

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use marginalia::config::{ProviderMode, Settings};
use marginalia::domain::{Query, DEFAULT_MAX_CONTEXT_DOCUMENTS};
use marginalia::storage::KeychainAccess;
use marginalia::synthesis::NoPhrases;
use marginalia::{EngineComponents, QueryService};

#[derive(Debug, Parser)]
#[command(name = "marginalia", version, about = "Ask questions about your notes")]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Answer a question from the notes under ROOT
    Ask {
        root: PathBuf,
        #[arg(required = true)]
        question: Vec<String>,
        /// Override the configured mode for this question
        #[arg(long)]
        mode: Option<ProviderMode>,
        /// Maximum notes used as context
        #[arg(long, default_value_t = DEFAULT_MAX_CONTEXT_DOCUMENTS)]
        max_docs: usize,
        /// Skip the conversational opener in local answers
        #[arg(long)]
        no_opener: bool,
        /// Print the answer and citations as JSON
        #[arg(long)]
        json: bool,
    },
    /// Store the remote provider's API key in the OS keychain (read from stdin)
    SetKey {
        /// Provider name (defaults to the configured provider)
        #[arg(long)]
        provider: Option<String>,
    },
    /// Remove the remote provider's API key from the OS keychain
    ClearKey {
        /// Provider name (defaults to the configured provider)
        #[arg(long)]
        provider: Option<String>,
    },
    /// Show or change the default mode
    Mode { mode: Option<ProviderMode> },
}

fn settings_path(cli: &Cli) -> anyhow::Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => Settings::default_path().context("could not determine a config directory"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let path = settings_path(&cli)?;
    let mut settings = Settings::load(&path)
        .with_context(|| format!("failed to load settings from {}", path.display()))?;

    match cli.command {
        Command::Ask {
            root,
            question,
            mode,
            max_docs,
            no_opener,
            json,
        } => {
            if let Some(mode) = mode {
                settings.mode = mode;
            }

            let mut components = EngineComponents::from_settings(&settings)?;
            if no_opener {
                components.phrases = Arc::new(NoPhrases);
            }
            let service = QueryService::new(components, &settings);

            if let Some(mut rx) = service.subscribe_load_state() {
                tokio::spawn(async move {
                    while rx.changed().await.is_ok() {
                        let state = rx.borrow_and_update().clone();
                        if state.is_loading() {
                            tracing::info!(progress = state.progress(), "Loading model");
                        }
                    }
                });
            }

            let query = Query::new(question.join(" ")).with_max_context_documents(max_docs);
            let result = service.query(&root, &query).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result.answer);
            }
        }
        Command::SetKey { provider } => {
            let provider = provider.unwrap_or_else(|| settings.remote.provider.clone());
            let mut key = String::new();
            std::io::stdin().lock().read_line(&mut key)?;
            let key = key.trim();
            if key.is_empty() {
                bail!("no API key given on stdin");
            }

            KeychainAccess::new()
                .store(&KeychainAccess::ai_api_key(&provider), key)
                .await?;
            tracing::info!(%provider, "Stored API key");
        }
        Command::ClearKey { provider } => {
            let provider = provider.unwrap_or_else(|| settings.remote.provider.clone());
            KeychainAccess::new()
                .delete(&KeychainAccess::ai_api_key(&provider))
                .await?;
            tracing::info!(%provider, "Removed API key");
        }
        Command::Mode { mode } => match mode {
            Some(mode) => {
                settings.mode = mode;
                settings.save(&path)?;
                println!("{mode}");
            }
            None => println!("{}", settings.mode),
        },
    }

    Ok(())
}
