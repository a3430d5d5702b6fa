pub mod catalog;
pub mod config;
pub mod date;
pub mod fetcher;
pub mod item;
pub mod pipeline;
pub mod scanner;
pub mod store;
pub mod testing;

pub use catalog::{
    CatalogClient, CatalogError, CatalogItem, CatalogPage, WordPressCatalogClient,
    WordPressCatalogConfig,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
};
pub use fetcher::{ArchiveFetcher, FetchError, FetchOutcome, HttpArchiveFetcher};
pub use item::{Finding, ItemKind, ItemRecord, StoredFinding};
pub use pipeline::{
    IngestSummary, Ingestor, Pipeline, PipelineError, PipelineSettings, RunOptions, RunSummary,
};
pub use scanner::{AuditSummary, Auditor, ScanError, Scanner, ScannerConfig, SemgrepScanner};
pub use store::{ItemStore, OpenMode, SqliteStore, StoreError};
