//! agentctl - ask, read, extract and dispatch against a local Ollama model

use agent_cli::{parse_functions, resolution_json, AppConfig, ConfigLoader, Session, StatusReport};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use llm::OllamaClient;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agentctl")]
#[command(about = "Query a local LLM through structured agents", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Config file to use instead of ./.agentctl/agentctl.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured model
    #[arg(short, long, global = true, env = "OLLAMA_MODEL")]
    model: Option<String>,

    /// Override the configured server URL
    #[arg(long, global = true, env = "OLLAMA_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a free-form prompt
    Ask {
        prompt: String,
        /// Custom system prompt; may use {additional_instructions}
        #[arg(short, long)]
        system: Option<String>,
    },

    /// Answer a question from the contents of documents
    Read {
        question: String,
        /// Documents to read
        #[arg(short, long = "doc", required = true)]
        documents: Vec<PathBuf>,
    },

    /// Extract named fields from text
    Extract {
        /// Fields to extract, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        keys: Vec<String>,
        /// Text to extract from
        #[arg(short, long, conflicts_with = "file")]
        text: Option<String>,
        /// File holding the text to extract from
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Print the model's reply without parsing it
        #[arg(long)]
        raw: bool,
    },

    /// Ask the model which declared function fits a request
    Resolve {
        request: String,
        /// JSON file with the function declarations
        #[arg(short, long)]
        functions: PathBuf,
    },

    /// Check the server and the configured model
    Status {
        /// Output format: text (default), json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(ref path) = cli.config {
        loader = loader.with_explicit(path);
    }
    let mut config = loader.load().await?;
    apply_overrides(&mut config, &cli);

    init_tracing(&config);

    // Extraction parses the reply, so ask the server for JSON
    let llm_config = match &cli.command {
        Commands::Extract { raw: false, .. } => config.json_llm_config()?,
        _ => config.llm_config()?,
    };
    let client = OllamaClient::new(llm_config)?;

    match cli.command {
        Commands::Status { format } => {
            let report = StatusReport::check(&client).await?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.to_text());
            }
        }
        command => {
            let session = Session::from_config(&config, Arc::new(client))?;
            run(&session, command).await?;
        }
    }

    Ok(())
}

async fn run(session: &Session, command: Commands) -> Result<()> {
    match command {
        Commands::Ask { prompt, system } => {
            println!("{}", session.ask(&prompt, system).await?);
        }
        Commands::Read {
            question,
            documents,
        } => {
            println!("{}", session.read(&question, &documents).await?);
        }
        Commands::Extract {
            keys,
            text,
            file,
            raw,
        } => {
            let information = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => anyhow::bail!("either --text or --file is required"),
            };
            println!("{}", session.extract(&information, &keys, raw).await?);
        }
        Commands::Resolve { request, functions } => {
            let content = tokio::fs::read_to_string(&functions)
                .await
                .with_context(|| format!("Failed to read {}", functions.display()))?;
            let resolution = session.resolve(&request, parse_functions(&content)?).await?;
            println!("{}", serde_json::to_string_pretty(&resolution_json(&resolution))?);
            if !resolution.is_resolved() {
                anyhow::bail!("no declared function matched the request");
            }
        }
        Commands::Status { .. } => unreachable!("handled before a session is built"),
    }
    Ok(())
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(ref model) = cli.model {
        config.llm.model = model.clone();
    }
    if let Some(ref base_url) = cli.base_url {
        config.llm.base_url = base_url.clone();
    }
}

/// `RUST_LOG` wins over `[logging] level`; logs go to stderr
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
