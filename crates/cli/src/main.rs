mod args;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wpaudit_core::{
    load_config, validate_config, HttpArchiveFetcher, OpenMode, Pipeline, PipelineError,
    PipelineSettings, SemgrepScanner, SqliteStore, StoreError, WordPressCatalogClient,
};

use args::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(cli).await {
        if is_schema_missing(&e) {
            error!("{}", e.root_cause());
        } else {
            error!("Fatal error: {:#}", e);
        }
        std::process::exit(1);
    }
}

/// Whether the run stopped because the database tables do not exist yet.
fn is_schema_missing(err: &anyhow::Error) -> bool {
    if let Some(e) = err.downcast_ref::<PipelineError>() {
        return e.is_schema_missing();
    }
    err.downcast_ref::<StoreError>()
        .is_some_and(StoreError::is_fatal)
}

async fn run(cli: Cli) -> Result<()> {
    info!("Loading configuration from {:?}", cli.settings);
    let config = load_config(&cli.settings)
        .with_context(|| format!("Failed to load config from {:?}", cli.settings))?;
    validate_config(&config).context("Configuration validation failed")?;
    info!("Database path: {:?}", config.database.path);

    let mode = if cli.create_schema {
        OpenMode::CreateSchema
    } else {
        OpenMode::Existing
    };
    let store = Arc::new(SqliteStore::open(&config.database.path, mode)?);

    let catalog = WordPressCatalogClient::new(config.catalog.clone())
        .context("Failed to create catalog client")?;
    let fetcher = HttpArchiveFetcher::new(
        &cli.download_dir,
        config.catalog.download_timeout(),
        &config.catalog.user_agent,
    )
    .context("Failed to create archive fetcher")?;
    let scanner = SemgrepScanner::new(config.scanner.clone());

    let pipeline = Pipeline::new(
        Arc::new(catalog),
        Arc::new(fetcher),
        Arc::new(scanner),
        store.clone(),
        PipelineSettings {
            download_dir: cli.download_dir.clone(),
            ruleset: cli.ruleset.clone(),
            per_page: config.catalog.per_page,
        },
    );

    let summary = pipeline.run(&cli.run_options()).await?;
    info!(
        "Run complete: {}",
        serde_json::to_string(&summary).unwrap_or_default()
    );

    drop(pipeline);
    if let Ok(store) = Arc::try_unwrap(store) {
        store.close().context("Failed to close database")?;
    }

    Ok(())
}
