//! Semgrep process wrapper.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::{ScanError, Scanner};

/// Scanner process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Path or name of the semgrep binary.
    #[serde(default = "default_binary")]
    pub binary: PathBuf,
    /// Per-item time limit. Unset means no limit.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_binary() -> PathBuf {
    PathBuf::from("semgrep")
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            timeout_secs: None,
        }
    }
}

/// [`Scanner`] backed by the semgrep CLI.
pub struct SemgrepScanner {
    config: ScannerConfig,
}

impl SemgrepScanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// Command-line arguments for one scan.
    pub fn build_args(ruleset: &str, target: &Path, output: &Path) -> Vec<String> {
        vec![
            "--config".to_string(),
            ruleset.to_string(),
            "--json".to_string(),
            "--no-git-ignore".to_string(),
            "--output".to_string(),
            output.to_string_lossy().to_string(),
            "--quiet".to_string(),
            target.to_string_lossy().to_string(),
        ]
    }
}

#[async_trait]
impl Scanner for SemgrepScanner {
    async fn scan(&self, ruleset: &str, target: &Path, output: &Path) -> Result<(), ScanError> {
        let args = Self::build_args(ruleset, target, output);
        debug!("Running {} {}", self.config.binary.display(), args.join(" "));

        let mut child = Command::new(&self.config.binary)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ScanError::BinaryNotFound {
                        path: self.config.binary.clone(),
                    }
                } else {
                    ScanError::Io(e)
                }
            })?;

        let status = match self.config.timeout_secs {
            Some(secs) => timeout(Duration::from_secs(secs), child.wait())
                .await
                .map_err(|_| ScanError::Timeout { timeout_secs: secs })??,
            None => child.wait().await?,
        };

        if !status.success() {
            return Err(ScanError::NonZeroExit {
                code: status.code(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args() {
        let args = SemgrepScanner::build_args(
            "p/php",
            Path::new("/data/plugins/foo"),
            Path::new("/data/plugins/foo/semgrep_output.json"),
        );

        assert_eq!(
            args,
            vec![
                "--config",
                "p/php",
                "--json",
                "--no-git-ignore",
                "--output",
                "/data/plugins/foo/semgrep_output.json",
                "--quiet",
                "/data/plugins/foo",
            ]
        );
    }

    #[test]
    fn test_default_config() {
        let config = ScannerConfig::default();
        assert_eq!(config.binary, PathBuf::from("semgrep"));
        assert!(config.timeout_secs.is_none());
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let scanner = SemgrepScanner::new(ScannerConfig {
            binary: PathBuf::from("/nonexistent/wpaudit-semgrep"),
            timeout_secs: None,
        });

        let result = scanner
            .scan("p/php", Path::new("."), Path::new("out.json"))
            .await;
        assert!(matches!(result, Err(ScanError::BinaryNotFound { .. })));
    }
}
