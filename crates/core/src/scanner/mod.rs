//! Static analysis of extracted source trees.
//!
//! A [`Scanner`] runs the external analysis tool over one item directory and
//! leaves its JSON report in a file; the [`Auditor`] walks every extracted
//! item, reads those reports back and records the findings.

mod auditor;
mod output;
mod semgrep;

pub use auditor::{AuditSummary, Auditor};
pub use output::parse_scan_output;
pub use semgrep::{ScannerConfig, SemgrepScanner};

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

/// Name of the report file written inside each item directory.
pub const OUTPUT_FILE_NAME: &str = "semgrep_output.json";

/// Default ruleset passed to the scanner.
pub const DEFAULT_RULESET: &str = "p/php";

/// Errors from running the scanner or reading its report.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Scanner binary could not be found.
    #[error("Scanner binary not found: {path}")]
    BinaryNotFound { path: PathBuf },

    /// Scanner exited unsuccessfully.
    #[error("Scanner exited with code {code:?}")]
    NonZeroExit { code: Option<i32> },

    /// Scanner exceeded its time limit.
    #[error("Scanner timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Report could not be parsed.
    #[error("Failed to parse scanner output: {0}")]
    ParseError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs the static-analysis tool over a directory.
#[async_trait]
pub trait Scanner: Send + Sync {
    /// Scan `target` with `ruleset`, writing the JSON report to `output`.
    async fn scan(&self, ruleset: &str, target: &Path, output: &Path) -> Result<(), ScanError>;
}
