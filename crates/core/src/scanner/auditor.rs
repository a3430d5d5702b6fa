//! Audit runner: scans every extracted item and records its findings.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{parse_scan_output, ScanError, Scanner, OUTPUT_FILE_NAME};
use crate::item::{Finding, ItemKind};
use crate::store::{ItemStore, StoreError};

/// Counters for one audit pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    /// Item directories the scanner was run on.
    pub scanned: usize,
    pub scanner_failures: usize,
    /// Reports that were missing or malformed.
    pub parse_failures: usize,
    pub record_failures: usize,
    pub findings_recorded: usize,
    /// Findings computed for kinds whose findings are not persisted.
    pub findings_unpersisted: usize,
}

/// Walks `{download_dir}/{kind}s/*` and audits each item directory.
pub struct Auditor {
    download_dir: PathBuf,
    ruleset: String,
    store: Arc<dyn ItemStore>,
    scanner: Arc<dyn Scanner>,
}

impl Auditor {
    pub fn new(
        download_dir: impl Into<PathBuf>,
        ruleset: impl Into<String>,
        store: Arc<dyn ItemStore>,
        scanner: Arc<dyn Scanner>,
    ) -> Self {
        Self {
            download_dir: download_dir.into(),
            ruleset: ruleset.into(),
            store,
            scanner,
        }
    }

    /// Audit plugins, then themes.
    ///
    /// Per-item failures are logged and skipped. Only a fatal store error
    /// aborts the pass.
    pub async fn run(&self) -> Result<AuditSummary, StoreError> {
        let mut summary = AuditSummary::default();

        for kind in ItemKind::ALL {
            let kind_dir = self.download_dir.join(kind.plural());
            if !kind_dir.is_dir() {
                debug!("No {} directory at {}", kind, kind_dir.display());
                continue;
            }

            let slugs = match list_item_dirs(&kind_dir).await {
                Ok(slugs) => slugs,
                Err(e) => {
                    warn!("Failed to list {}: {}", kind_dir.display(), e);
                    continue;
                }
            };

            info!("Auditing {} {}", slugs.len(), kind.plural());
            for slug in slugs {
                self.audit_item(kind, &kind_dir, &slug, &mut summary).await?;
            }
        }

        info!(
            "Audit complete: {} scanned, {} findings recorded, {} findings not stored, {} scanner failures",
            summary.scanned,
            summary.findings_recorded,
            summary.findings_unpersisted,
            summary.scanner_failures
        );
        Ok(summary)
    }

    async fn audit_item(
        &self,
        kind: ItemKind,
        kind_dir: &Path,
        slug: &str,
        summary: &mut AuditSummary,
    ) -> Result<(), StoreError> {
        let item_path = kind_dir.join(slug);
        let output = item_path.join(OUTPUT_FILE_NAME);
        summary.scanned += 1;

        if let Err(e) = self.scanner.scan(&self.ruleset, &item_path, &output).await {
            warn!("Semgrep failed for {} {}: {}", kind, slug, e);
            summary.scanner_failures += 1;
            return Ok(());
        }
        debug!("Semgrep analysis completed for {} {}", kind, slug);

        let findings = match read_report(&output).await {
            Ok(findings) => findings,
            Err(e) => {
                warn!("Failed to read scanner output for {} {}: {}", kind, slug, e);
                summary.parse_failures += 1;
                return Ok(());
            }
        };

        match self.store.record_findings(kind, slug, &findings) {
            Ok(count) => {
                debug!("Recorded {} findings for {} {}", count, kind, slug);
                summary.findings_recorded += count;
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(StoreError::UnsupportedKind(_)) => {
                if !findings.is_empty() {
                    warn!(
                        "Dropping {} findings for {} {}: findings are not stored for {}s",
                        findings.len(),
                        kind,
                        slug,
                        kind
                    );
                }
                summary.findings_unpersisted += findings.len();
            }
            Err(e) => {
                warn!("Failed to record findings for {} {}: {}", kind, slug, e);
                summary.record_failures += 1;
            }
        }

        Ok(())
    }
}

async fn read_report(path: &Path) -> Result<Vec<Finding>, ScanError> {
    let json = tokio::fs::read_to_string(path).await?;
    parse_scan_output(&json)
}

/// Names of the sub-directories of `dir`, sorted.
async fn list_item_dirs(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut slugs = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            slugs.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    slugs.sort();
    Ok(slugs)
}
