use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use wpaudit_core::RunOptions;

/// Harvest popular WordPress plugins and themes and audit their source with semgrep.
#[derive(Debug, Parser)]
#[command(name = "wpaudit", version)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .multiple(true)
        .args(["download", "audit"])
))]
pub struct Cli {
    /// Download plugins and themes and record their metadata
    #[arg(long)]
    pub download: bool,

    /// Audit downloaded plugins and themes sequentially
    #[arg(long)]
    pub audit: bool,

    /// The directory to save/audit downloaded items
    #[arg(long, default_value = ".")]
    pub download_dir: PathBuf,

    /// Semgrep config/rules to run
    #[arg(long = "config", default_value = "p/php")]
    pub ruleset: String,

    /// Create the database and schema if missing
    #[arg(long)]
    pub create_schema: bool,

    /// Clear audit results tables before running
    #[arg(long)]
    pub clear_results: bool,

    /// Print detailed messages
    #[arg(long)]
    pub verbose: bool,

    /// Settings file (database, catalog and scanner configuration)
    #[arg(long, env = "WPAUDIT_CONFIG", default_value = "config.toml")]
    pub settings: PathBuf,
}

impl Cli {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            download: self.download,
            audit: self.audit,
            clear_results: self.clear_results,
        }
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "info,wpaudit=debug,wpaudit_core=debug"
        } else {
            "info"
        }
    }
}
