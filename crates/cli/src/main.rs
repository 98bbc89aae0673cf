//! salesrag CLI: the main entry point.
//!
//! Commands:
//! - `init`: Write a default config file
//! - `serve`: Start the HTTP gateway
//! - `ask`: Answer one question from the terminal
//! - `load-text`: Chunk, embed and store the source document
//! - `load-orders`: Create sales orders from a JSON file
//! - `embed-orders`: Index every stored order for semantic search
//! - `status`: Show configuration and store counts

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "salesrag",
    about = "salesrag: hybrid retrieval and answer composition over sales orders",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to ~/.salesrag/config.toml)
    #[arg(short, long, global = true, env = "SALESRAG_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Answer a single question
    Ask {
        /// The question to answer
        question: String,

        /// Requester role (SALES_REP, RISK_MANAGER, FINANCE, ...)
        #[arg(short, long)]
        role: Option<String>,

        /// Print the full JSON response
        #[arg(long)]
        json: bool,
    },

    /// Ingest the source document into the vector store
    LoadText {
        /// Override the configured source file
        #[arg(short, long)]
        source: Option<PathBuf>,
    },

    /// Create sales orders from a JSON array file
    LoadOrders {
        /// Path to the order file
        file: PathBuf,
    },

    /// Index every stored sales order in the vector store
    EmbedOrders,

    /// Show configuration, store counts and provider health
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Init => commands::init::run(config_path).await?,
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
        Commands::Ask {
            question,
            role,
            json,
        } => commands::ask::run(config_path, &question, role.as_deref(), json).await?,
        Commands::LoadText { source } => commands::load_text::run(config_path, source).await?,
        Commands::LoadOrders { file } => commands::load_orders::run(config_path, &file).await?,
        Commands::EmbedOrders => commands::embed_orders::run(config_path).await?,
        Commands::Status => commands::status::run(config_path).await?,
    }

    Ok(())
}
