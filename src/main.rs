use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use quill::{
    audit::AuditRunner,
    blog::BlogService,
    config::LogFormat,
    models::timestamp,
    store::{BlogStore, InMemoryStore, PgStore},
    Config,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "quill")]
#[command(version)]
#[command(about = "Blog service and consistency auditor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Check stored blog records for inconsistencies
    Audit {
        /// Print findings as JSON lines
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "quill=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn BlogStore>> {
    match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url)
                .await
                .context("Failed to connect to database")?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("QUILL_DATABASE_URL is not set, using an in-memory store");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let store = open_store(&config).await?;

    match cli.command {
        Command::Serve => {
            let blog = BlogService::new(store, config.limits());

            tracing::info!("Starting quill");
            tracing::info!("Web server will listen on: {}", config.web_addr());

            quill::web::serve(config.web_addr(), quill::web::AppState::new(blog)).await?;
        }
        Command::Audit { json } => {
            let started_at = timestamp::now();
            let dataset = store.snapshot().await?;

            tracing::info!(
                posts = dataset.posts.len(),
                summaries = dataset.summaries.len(),
                rights = dataset.rights.len(),
                "Starting audit"
            );

            let report = AuditRunner::new(config.audit_workers, config.limits())
                .run(&dataset, started_at)
                .await?;

            for finding in &report.findings {
                if json {
                    println!("{}", serde_json::to_string(finding)?);
                } else {
                    println!("{}", finding);
                }
            }

            if !report.is_clean() {
                anyhow::bail!(
                    "{} findings in {} records",
                    report.findings.len(),
                    report.records_checked
                );
            }
        }
    }

    Ok(())
}
