//! attest CLI - publish claims to the ledger from the terminal.
//!
//! Thin operator surface over the engine: publish a single claim, publish a
//! batch from a JSON file, read current creation costs, or check whether an
//! entity exists under an id.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// attest CLI application
#[derive(Parser)]
#[command(name = "attest")]
#[command(about = "Publish subject-predicate-object claims to the attest ledger", long_about = None)]
#[command(version)]
struct Cli {
    /// Ledger RPC endpoint
    #[arg(
        long,
        env = "ATTEST_LEDGER_URL",
        default_value = "http://localhost:8545"
    )]
    ledger_url: String,

    /// Pinning service endpoint
    #[arg(
        long,
        env = "ATTEST_PINNING_URL",
        default_value = "http://localhost:3100"
    )]
    pinning_url: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish one claim
    Publish {
        /// Subject metadata name (usually the caller's identity)
        #[arg(long)]
        subject_name: String,
        /// Subject metadata URL
        #[arg(long)]
        subject_url: String,
        /// Relation name, e.g. "trusts"
        #[arg(long)]
        predicate: String,
        /// Object metadata name
        #[arg(long)]
        object_name: String,
        /// Object metadata URL
        #[arg(long)]
        object_url: String,
        /// Optional object description
        #[arg(long)]
        object_description: Option<String>,
        /// Application-level id keying the publication record
        #[arg(long)]
        origin: Option<String>,
    },

    /// Publish a batch of candidate triples from a JSON file
    Batch {
        /// Path to a JSON array of candidate triples
        file: String,
        /// Subject metadata name shared by the whole batch
        #[arg(long)]
        subject_name: String,
        /// Subject metadata URL
        #[arg(long)]
        subject_url: String,
    },

    /// Show current atom and triple creation costs
    Costs,

    /// Check whether an entity exists under a hex id
    Check {
        /// 32-byte entity id, hex encoded
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let endpoints = commands::Endpoints {
        ledger_url: cli.ledger_url,
        pinning_url: cli.pinning_url,
    };

    match cli.command {
        Commands::Publish {
            subject_name,
            subject_url,
            predicate,
            object_name,
            object_url,
            object_description,
            origin,
        } => {
            commands::publish(
                &endpoints,
                subject_name,
                subject_url,
                predicate,
                object_name,
                object_url,
                object_description,
                origin,
            )
            .await
        }
        Commands::Batch {
            file,
            subject_name,
            subject_url,
        } => commands::batch(&endpoints, &file, subject_name, subject_url).await,
        Commands::Costs => commands::costs(&endpoints).await,
        Commands::Check { id } => commands::check(&endpoints, &id).await,
    }
}
