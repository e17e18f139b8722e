use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use mail_sorter::config::{FilterConfig, SorterConfig, StorageBackend};
use mail_sorter::filter::{ReceiptEvent, SenderFilter};
use mail_sorter::mail::{MailComposer, MailSender, SmtpMailSender};
use mail_sorter::pipeline::{Classifier, KeyRouter, ObjectRef, Pipeline, exit_code};
use mail_sorter::storage::{FsObjectStore, ObjectStore, S3ObjectStore};
use mail_sorter::trigger::{parse_event, read_payload};

/// Sort stored inbound email and forward giveaway notifications.
#[derive(Parser)]
#[command(name = "mail-sorter", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route one stored email
    Route {
        /// Object-created notification JSON (file path, or `-` for stdin)
        #[arg(long, conflicts_with_all = ["bucket", "key"], required_unless_present_all = ["bucket", "key"])]
        event: Option<String>,

        /// Container holding the email (manual mode)
        #[arg(long, requires = "key")]
        bucket: Option<String>,

        /// Key of the email (manual mode)
        #[arg(long, requires = "bucket")]
        key: Option<String>,
    },

    /// Evaluate a receipt notification against the sender blocklist
    Filter {
        /// Receipt notification JSON (file path, or `-` for stdin)
        #[arg(long)]
        event: String,
    },
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Logs go to stderr; stdout carries the filter reply
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Route { event, bucket, key } => route(event, bucket, key).await,
        Commands::Filter { event } => filter(&event).await.map(|()| 0),
    }
    .unwrap_or_else(|e| {
        error!(error = %format!("{e:#}"), "Run failed");
        1
    });

    std::process::exit(code);
}

async fn route(event: Option<String>, bucket: Option<String>, key: Option<String>) -> Result<i32> {
    let source = match (event, bucket, key) {
        (Some(path), _, _) => parse_event(&read_payload(&path).await?)?,
        (None, Some(bucket), Some(key)) => {
            ObjectRef::new(bucket, key).context("--bucket must not be empty")?
        }
        _ => anyhow::bail!("either --event or both --bucket and --key are required"),
    };

    let config = SorterConfig::from_env()?;

    let pipeline = build_pipeline(&config).await?;
    info!(pipeline = ?pipeline, "Mail sorter ready");

    let result = pipeline.run(&source).await;
    match &result {
        Ok(outcome) => info!(
            stage = %outcome.stage(),
            destination = %outcome.destination().map(ToString::to_string).unwrap_or_default(),
            "Run finished"
        ),
        Err(e) => error!(source = %source, error = %e, "Run failed"),
    }
    Ok(exit_code(&result))
}

async fn build_pipeline(config: &SorterConfig) -> mail_sorter::error::Result<Pipeline> {
    let store: Arc<dyn ObjectStore> = match &config.storage {
        StorageBackend::S3 => Arc::new(S3ObjectStore::from_env().await),
        StorageBackend::Filesystem(root) => Arc::new(FsObjectStore::new(root.clone())),
    };
    let mailer: Arc<dyn MailSender> = Arc::new(SmtpMailSender::new(&config.smtp)?);
    let classifier = Classifier::new(config.notification_sender.clone(), config.forward.clone());

    Ok(Pipeline::new(
        store,
        mailer,
        classifier,
        KeyRouter::default(),
        MailComposer::default(),
    ))
}

async fn filter(event: &str) -> Result<()> {
    let payload = read_payload(event).await?;
    let event: ReceiptEvent =
        serde_json::from_str(&payload).context("Invalid receipt notification")?;

    let config = FilterConfig::from_env();
    let filter = SenderFilter::new(config.blocked_senders);
    println!("{}", filter.disposition_json(&event)?);
    Ok(())
}
