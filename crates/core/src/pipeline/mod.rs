//! Pipeline driver.
//!
//! Runs the selected stages in order: optional findings reset, then catalog
//! ingestion for plugins and themes, then the audit. Everything happens
//! sequentially on the caller's task.

mod ingest;

pub use ingest::{IngestSummary, Ingestor};

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::catalog::CatalogClient;
use crate::fetcher::ArchiveFetcher;
use crate::item::ItemKind;
use crate::scanner::{AuditSummary, Auditor, Scanner};
use crate::store::{ItemStore, StoreError};

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The per-kind download directory could not be created.
    #[error("Failed to create download directory {path}: {source}")]
    DownloadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Whether the error means the database schema has to be created first.
    pub fn is_schema_missing(&self) -> bool {
        matches!(self, PipelineError::Store(e) if e.is_fatal())
    }
}

/// Which stages to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub download: bool,
    pub audit: bool,
    pub clear_results: bool,
}

/// Outcome of a run. Stages that were not selected are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub results_cleared: bool,
    pub plugins: Option<IngestSummary>,
    pub themes: Option<IngestSummary>,
    pub audit: Option<AuditSummary>,
}

/// Wires the ingestion and audit stages to shared collaborators.
pub struct Pipeline {
    store: Arc<dyn ItemStore>,
    ingestor: Ingestor,
    auditor: Auditor,
}

impl Pipeline {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        fetcher: Arc<dyn ArchiveFetcher>,
        scanner: Arc<dyn Scanner>,
        store: Arc<dyn ItemStore>,
        settings: PipelineSettings,
    ) -> Self {
        let ingestor = Ingestor::new(
            catalog,
            fetcher,
            store.clone(),
            settings.download_dir.clone(),
            settings.per_page,
        );
        let auditor = Auditor::new(
            settings.download_dir,
            settings.ruleset,
            store.clone(),
            scanner,
        );

        Self {
            store,
            ingestor,
            auditor,
        }
    }

    pub async fn run(&self, options: &RunOptions) -> Result<RunSummary, PipelineError> {
        let mut summary = RunSummary::default();

        if options.clear_results {
            self.store.reset_findings()?;
            summary.results_cleared = true;
            info!("Cleared previous audit results");
        }

        if options.download {
            summary.plugins = Some(self.ingestor.ingest(ItemKind::Plugin).await?);
            summary.themes = Some(self.ingestor.ingest(ItemKind::Theme).await?);
        }

        if options.audit {
            summary.audit = Some(self.auditor.run().await?);
        }

        Ok(summary)
    }
}

/// Run parameters that are not collaborators.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Root of the `plugins/` and `themes/` extraction directories.
    pub download_dir: PathBuf,
    /// Ruleset handed to the scanner.
    pub ruleset: String,
    pub per_page: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("."),
            ruleset: crate::scanner::DEFAULT_RULESET.to_string(),
            per_page: crate::catalog::DEFAULT_PER_PAGE,
        }
    }
}
