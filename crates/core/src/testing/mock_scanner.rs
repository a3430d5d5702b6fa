//! Mock scanner for testing.

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::item::Finding;
use crate::scanner::{ScanError, Scanner};

/// A recorded scan for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedScan {
    pub ruleset: String,
    pub target: PathBuf,
    pub output: PathBuf,
}

/// Mock implementation of the Scanner trait.
///
/// Items are keyed by the final component of the scanned directory (the
/// slug). A successful scan writes a semgrep-shaped report containing the
/// findings configured for that slug, or an empty `results` array.
///
/// # Example
///
/// ```rust,ignore
/// use wpaudit_core::testing::{MockScanner, fixtures};
///
/// let scanner = MockScanner::new();
/// scanner.set_findings("akismet", vec![fixtures::finding("php.eval", 10)]).await;
/// scanner.set_exit_code("broken", 1).await;
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockScanner {
    scans: Arc<RwLock<Vec<RecordedScan>>>,
    findings: Arc<RwLock<HashMap<String, Vec<Finding>>>>,
    exit_codes: Arc<RwLock<HashMap<String, i32>>>,
    raw_outputs: Arc<RwLock<HashMap<String, String>>>,
    /// If set, the next scan will fail with this error.
    next_error: Arc<RwLock<Option<ScanError>>>,
}

impl MockScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Findings reported for `slug`.
    pub async fn set_findings(&self, slug: &str, findings: Vec<Finding>) {
        self.findings.write().await.insert(slug.to_string(), findings);
    }

    /// Make the scan of `slug` exit with `code` (non-zero means failure).
    pub async fn set_exit_code(&self, slug: &str, code: i32) {
        self.exit_codes.write().await.insert(slug.to_string(), code);
    }

    /// Write `output` verbatim as the report for `slug`.
    pub async fn set_raw_output(&self, slug: &str, output: &str) {
        self.raw_outputs
            .write()
            .await
            .insert(slug.to_string(), output.to_string());
    }

    /// Configure the next scan to fail with the given error.
    pub async fn set_next_error(&self, error: ScanError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get all recorded scans.
    pub async fn recorded_scans(&self) -> Vec<RecordedScan> {
        self.scans.read().await.clone()
    }

    fn report(findings: &[Finding]) -> String {
        let results: Vec<_> = findings
            .iter()
            .map(|f| {
                json!({
                    "check_id": f.check_id,
                    "path": f.file_path,
                    "start": {"line": f.start_line, "col": 1},
                    "end": {"line": f.end_line, "col": 1},
                    "extra": {"lines": f.vuln_lines, "severity": "WARNING"},
                })
            })
            .collect();

        json!({ "results": results, "errors": [] }).to_string()
    }
}

#[async_trait]
impl Scanner for MockScanner {
    async fn scan(&self, ruleset: &str, target: &Path, output: &Path) -> Result<(), ScanError> {
        self.scans.write().await.push(RecordedScan {
            ruleset: ruleset.to_string(),
            target: target.to_path_buf(),
            output: output.to_path_buf(),
        });

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let slug = target
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        if let Some(&code) = self.exit_codes.read().await.get(&slug) {
            if code != 0 {
                return Err(ScanError::NonZeroExit { code: Some(code) });
            }
        }

        let report = match self.raw_outputs.read().await.get(&slug) {
            Some(raw) => raw.clone(),
            None => {
                let findings = self.findings.read().await;
                Self::report(findings.get(&slug).map(Vec::as_slice).unwrap_or(&[]))
            }
        };

        tokio::fs::write(output, report).await?;
        Ok(())
    }
}
