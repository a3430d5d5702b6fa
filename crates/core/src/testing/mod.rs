//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of every external seam of the
//! pipeline (catalog API, archive downloads, the scanner process and the
//! store), so the whole download/audit flow can be exercised without network
//! access or a semgrep install.
//!
//! # Example
//!
//! ```rust,ignore
//! use wpaudit_core::testing::{MockArchiveFetcher, MockCatalogClient, MockScanner, fixtures};
//!
//! let catalog = MockCatalogClient::new();
//! catalog.set_item_pages(ItemKind::Plugin, vec![
//!     vec![fixtures::catalog_item("akismet", 5_000_000)],
//! ]).await;
//!
//! let fetcher = MockArchiveFetcher::new();
//! let scanner = MockScanner::new();
//! ```

mod mock_catalog;
mod mock_fetcher;
mod mock_scanner;
mod mock_store;

pub use mock_catalog::{MockCatalogClient, RecordedPageRequest};
pub use mock_fetcher::{MockArchiveFetcher, RecordedFetch};
pub use mock_scanner::{MockScanner, RecordedScan};
pub use mock_store::MockItemStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::catalog::CatalogItem;
    use crate::item::Finding;

    /// Create a catalog item with reasonable defaults.
    pub fn catalog_item(slug: &str, active_installs: u64) -> CatalogItem {
        CatalogItem {
            slug: slug.to_string(),
            version: Some("1.0.0".to_string()),
            active_installs: Some(active_installs),
            downloaded: Some(active_installs * 10),
            modified: Some("2024-01-15T08:30:00+0000".to_string()),
            last_updated: Some("2024-01-15 8:30am GMT".to_string()),
            added: Some("2018-03-02".to_string()),
            download_link: None,
        }
    }

    /// Create a theme catalog item last updated on the given date.
    pub fn theme_item(slug: &str, active_installs: u64, last_updated: &str) -> CatalogItem {
        CatalogItem {
            slug: slug.to_string(),
            version: Some("2.1".to_string()),
            active_installs: Some(active_installs),
            last_updated: Some(last_updated.to_string()),
            added: Some("2019-07-01".to_string()),
            ..Default::default()
        }
    }

    /// Create a finding spanning two lines.
    pub fn finding(check_id: &str, line: u32) -> Finding {
        Finding {
            file_path: "includes/admin.php".to_string(),
            check_id: check_id.to_string(),
            start_line: line,
            end_line: line + 1,
            vuln_lines: "echo $_GET['page'];".to_string(),
        }
    }
}
