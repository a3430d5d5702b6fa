//! Relational persistence for catalog items and audit findings.
//!
//! Four tables are maintained: `PluginData` / `ThemeData` hold one row per
//! slug (upserted on every ingestion), and `PluginResults` / `ThemeResults`
//! hold the scanner findings, each row pointing at its item through a
//! foreign key on `slug`.

mod schema;
mod sqlite;

pub use schema::{data_table_sql, results_table_sql};
pub use sqlite::{OpenMode, SqliteStore};

use thiserror::Error;

use crate::item::{Finding, ItemKind, ItemRecord};

/// Errors for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database or one of its tables has not been created yet.
    #[error(
        "Database schema is not initialized ({detail}). Please run with the '--create-schema' flag to create the database and tables."
    )]
    SchemaNotInitialized { detail: String },

    /// Findings were submitted for a kind whose findings are not persisted.
    #[error("Cannot record findings for item kind '{0}': only plugin findings are persisted")]
    UnsupportedKind(ItemKind),

    /// A finding referenced a slug with no catalog row.
    #[error("No {kind} record exists for slug '{slug}'")]
    UnknownItem { kind: ItemKind, slug: String },

    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Whether this error must terminate the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::SchemaNotInitialized { .. })
    }
}

/// Persistence operations used by the pipeline.
pub trait ItemStore: Send + Sync {
    /// Insert or overwrite the catalog row for `record.slug`. Committed immediately.
    fn upsert_item(&self, kind: ItemKind, record: &ItemRecord) -> Result<(), StoreError>;

    /// Insert a single finding row. Committed immediately.
    fn record_finding(
        &self,
        kind: ItemKind,
        slug: &str,
        finding: &Finding,
    ) -> Result<(), StoreError>;

    /// Insert all findings for one slug in a single transaction.
    ///
    /// Either every row is committed or none is. Returns the number of rows inserted.
    fn record_findings(
        &self,
        kind: ItemKind,
        slug: &str,
        findings: &[Finding],
    ) -> Result<usize, StoreError>;

    /// Drop and recreate both findings tables.
    fn reset_findings(&self) -> Result<(), StoreError>;
}
