//! SQLite-backed store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{ffi, params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::schema::{data_table_sql, required_tables, results_table_sql};
use super::{ItemStore, StoreError};
use crate::item::{Finding, ItemKind, ItemRecord, StoredFinding};

/// How [`SqliteStore::open`] treats a missing database or schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Create the database file and any missing tables.
    CreateSchema,
    /// Require the database and all tables to exist already.
    Existing,
}

/// SQLite-backed item and findings store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open the database at `path`.
    ///
    /// With [`OpenMode::Existing`], a missing database file or missing table
    /// yields [`StoreError::SchemaNotInitialized`].
    pub fn open(path: &Path, mode: OpenMode) -> Result<Self, StoreError> {
        if mode == OpenMode::Existing && !path.exists() {
            return Err(StoreError::SchemaNotInitialized {
                detail: format!("database {} does not exist", path.display()),
            });
        }

        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        let store = Self::from_connection(conn)?;

        match mode {
            OpenMode::CreateSchema => {
                store.ensure_schema()?;
                info!("Database schema ensured at {}", path.display());
            }
            OpenMode::Existing => store.verify_schema()?,
        }

        Ok(store)
    }

    /// Create an in-memory store with the full schema (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        let store = Self::from_connection(conn)?;
        store.ensure_schema()?;
        Ok(store)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))
    }

    /// Create all four tables if they do not exist.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn()?;
        for kind in ItemKind::ALL {
            conn.execute_batch(&data_table_sql(kind))
                .map_err(|e| StoreError::Database(e.to_string()))?;
        }
        for kind in ItemKind::ALL {
            conn.execute_batch(&results_table_sql(kind))
                .map_err(|e| StoreError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Fail with [`StoreError::SchemaNotInitialized`] if any table is missing.
    pub fn verify_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let mut missing = Vec::new();
        for table in required_tables() {
            if !table_exists(&conn, table)? {
                missing.push(table);
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(StoreError::SchemaNotInitialized {
                detail: format!("missing tables: {}", missing.join(", ")),
            })
        }
    }

    /// Close the underlying connection.
    pub fn close(self) -> Result<(), StoreError> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))?;
        conn.close()
            .map_err(|(_, e)| StoreError::Database(e.to_string()))
    }

    /// Look up one catalog row.
    pub fn get_item(&self, kind: ItemKind, slug: &str) -> Result<Option<ItemRecord>, StoreError> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT slug, version, active_installs, downloaded, last_updated, added_date, download_link
             FROM {} WHERE slug = ?1",
            kind.data_table()
        );

        conn.query_row(&sql, params![slug], |row| {
            Ok(ItemRecord {
                slug: row.get(0)?,
                version: row.get(1)?,
                active_installs: row.get::<_, i64>(2)? as u64,
                downloaded: row.get::<_, i64>(3)? as u64,
                last_updated: row.get(4)?,
                added_date: row.get(5)?,
                download_link: row.get(6)?,
            })
        })
        .optional()
        .map_err(|e| read_error(&conn, kind.data_table(), e))
    }

    /// Number of catalog rows for a kind.
    pub fn count_items(&self, kind: ItemKind) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        count_rows(&conn, kind.data_table())
    }

    /// Number of findings rows for a kind.
    pub fn count_findings(&self, kind: ItemKind) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        count_rows(&conn, kind.results_table())
    }

    /// All findings recorded for a slug, in insertion order.
    pub fn findings_for(
        &self,
        kind: ItemKind,
        slug: &str,
    ) -> Result<Vec<StoredFinding>, StoreError> {
        let conn = self.conn()?;
        let table = kind.results_table();
        let sql = format!(
            "SELECT id, slug, file_path, check_id, start_line, end_line, vuln_lines
             FROM {} WHERE slug = ?1 ORDER BY id",
            table
        );

        let mut stmt = conn.prepare(&sql).map_err(|e| read_error(&conn, table, e))?;
        let rows = stmt
            .query_map(params![slug], |row| {
                Ok(StoredFinding {
                    id: row.get(0)?,
                    slug: row.get(1)?,
                    finding: Finding {
                        file_path: row.get(2)?,
                        check_id: row.get(3)?,
                        start_line: row.get(4)?,
                        end_line: row.get(5)?,
                        vuln_lines: row.get(6)?,
                    },
                })
            })
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut findings = Vec::new();
        for row in rows {
            findings.push(row.map_err(|e| StoreError::Database(e.to_string()))?);
        }
        Ok(findings)
    }

    fn insert_finding(
        conn: &Connection,
        kind: ItemKind,
        slug: &str,
        finding: &Finding,
    ) -> Result<(), StoreError> {
        let table = findings_table(kind)?;
        let sql = format!(
            "INSERT INTO {} (slug, file_path, check_id, start_line, end_line, vuln_lines)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            table
        );

        conn.execute(
            &sql,
            params![
                slug,
                &finding.file_path,
                &finding.check_id,
                finding.start_line,
                finding.end_line,
                &finding.vuln_lines,
            ],
        )
        .map_err(|e| write_error(conn, kind, table, slug, e))?;

        Ok(())
    }
}

impl ItemStore for SqliteStore {
    fn upsert_item(&self, kind: ItemKind, record: &ItemRecord) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let table = kind.data_table();
        let sql = format!(
            "INSERT INTO {} (slug, version, active_installs, downloaded, last_updated, added_date, download_link)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(slug) DO UPDATE SET
                version = excluded.version,
                active_installs = excluded.active_installs,
                downloaded = excluded.downloaded,
                last_updated = excluded.last_updated,
                added_date = excluded.added_date,
                download_link = excluded.download_link",
            table
        );

        conn.execute(
            &sql,
            params![
                &record.slug,
                &record.version,
                record.active_installs as i64,
                record.downloaded as i64,
                &record.last_updated,
                &record.added_date,
                &record.download_link,
            ],
        )
        .map_err(|e| write_error(&conn, kind, table, &record.slug, e))?;

        debug!("Upserted {} {}", kind, record.slug);
        Ok(())
    }

    fn record_finding(
        &self,
        kind: ItemKind,
        slug: &str,
        finding: &Finding,
    ) -> Result<(), StoreError> {
        findings_table(kind)?;
        let conn = self.conn()?;
        Self::insert_finding(&conn, kind, slug, finding)
    }

    fn record_findings(
        &self,
        kind: ItemKind,
        slug: &str,
        findings: &[Finding],
    ) -> Result<usize, StoreError> {
        findings_table(kind)?;
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        for finding in findings {
            Self::insert_finding(&tx, kind, slug, finding)?;
        }

        tx.commit()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(findings.len())
    }

    fn reset_findings(&self) -> Result<(), StoreError> {
        let conn = self.conn()?;
        for kind in ItemKind::ALL {
            conn.execute_batch(&format!("DROP TABLE IF EXISTS {};", kind.results_table()))
                .map_err(|e| StoreError::Database(e.to_string()))?;
            conn.execute_batch(&results_table_sql(kind))
                .map_err(|e| StoreError::Database(e.to_string()))?;
        }
        info!("Findings tables dropped and recreated");
        Ok(())
    }
}

/// The findings table for a kind, if findings of that kind are persisted.
fn findings_table(kind: ItemKind) -> Result<&'static str, StoreError> {
    match kind {
        ItemKind::Plugin => Ok(kind.results_table()),
        ItemKind::Theme => Err(StoreError::UnsupportedKind(kind)),
    }
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool, StoreError> {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![table],
        |_| Ok(true),
    )
    .optional()
    .map(|found| found.unwrap_or(false))
    .map_err(|e| StoreError::Database(e.to_string()))
}

fn count_rows(conn: &Connection, table: &str) -> Result<u64, StoreError> {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get::<_, i64>(0)
    })
    .map(|count| count as u64)
    .map_err(|e| read_error(conn, table, e))
}

fn missing_table(conn: &Connection, table: &str) -> bool {
    matches!(table_exists(conn, table), Ok(false))
}

fn read_error(conn: &Connection, table: &str, err: rusqlite::Error) -> StoreError {
    if missing_table(conn, table) {
        return StoreError::SchemaNotInitialized {
            detail: format!("table {} does not exist", table),
        };
    }
    StoreError::Database(err.to_string())
}

fn write_error(
    conn: &Connection,
    kind: ItemKind,
    table: &str,
    slug: &str,
    err: rusqlite::Error,
) -> StoreError {
    if let rusqlite::Error::SqliteFailure(ref failure, _) = err {
        if failure.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY {
            return StoreError::UnknownItem {
                kind,
                slug: slug.to_string(),
            };
        }
    }
    read_error(conn, table, err)
}
