//! Table definitions.

use crate::item::ItemKind;

/// `CREATE TABLE IF NOT EXISTS` statement for a kind's catalog table.
pub fn data_table_sql(kind: ItemKind) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            slug TEXT PRIMARY KEY,
            version TEXT,
            active_installs INTEGER,
            downloaded INTEGER,
            last_updated TEXT,
            added_date TEXT,
            download_link TEXT
        );
        "#,
        table = kind.data_table()
    )
}

/// `CREATE TABLE IF NOT EXISTS` statement for a kind's findings table.
pub fn results_table_sql(kind: ItemKind) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            slug TEXT NOT NULL,
            file_path TEXT,
            check_id TEXT,
            start_line INTEGER,
            end_line INTEGER,
            vuln_lines TEXT,
            FOREIGN KEY (slug) REFERENCES {parent}(slug)
        );

        CREATE INDEX IF NOT EXISTS idx_{table}_slug ON {table}(slug);
        "#,
        table = kind.results_table(),
        parent = kind.data_table()
    )
}

/// Every table the store requires.
pub(crate) fn required_tables() -> Vec<&'static str> {
    ItemKind::ALL
        .iter()
        .flat_map(|kind| [kind.data_table(), kind.results_table()])
        .collect()
}
