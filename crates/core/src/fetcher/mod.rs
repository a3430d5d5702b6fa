//! Archive download and extraction.
//!
//! Every accepted catalog item is downloaded as a zip archive and unpacked
//! into `{download_dir}/{kind}s/{slug}`, replacing whatever a previous run
//! left there.

mod http;

pub use http::{extract_archive, HttpArchiveFetcher};

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDateTime};
use thiserror::Error;

use crate::catalog::CatalogItem;
use crate::item::ItemKind;

/// Themes last updated more than this many years before the current year are skipped.
pub const THEME_MAX_AGE_YEARS: i32 = 2;

/// Errors from downloading or extracting an archive.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("Download of {url} failed with status {status}")]
    HttpStatus { status: u16, url: String },

    /// Payload is not a readable zip archive.
    #[error("Invalid archive: {0}")]
    Archive(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a fetch attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Archive extracted to `path`, containing `entries` files and directories.
    Extracted { path: PathBuf, entries: usize },
    /// Item not downloaded because it has not been updated recently.
    SkippedStale,
}

/// Downloads and extracts item archives.
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    async fn fetch(&self, kind: ItemKind, item: &CatalogItem) -> Result<FetchOutcome, FetchError>;
}

/// The URL an item's archive is downloaded from.
///
/// The catalog's link wins when present and non-empty; otherwise the
/// conventional WordPress.org download URL for the kind is used.
pub fn resolve_download_url(kind: ItemKind, slug: &str, link: Option<&str>) -> String {
    match link.map(str::trim).filter(|link| !link.is_empty()) {
        Some(link) => link.to_string(),
        None => kind.fallback_download_url(slug),
    }
}

/// Whether an item with the given last update time should be downloaded.
///
/// Plugins always are. Themes need a known update time no older than
/// [`THEME_MAX_AGE_YEARS`] years before `current_year`.
pub fn should_download(
    kind: ItemKind,
    last_updated: Option<NaiveDateTime>,
    current_year: i32,
) -> bool {
    match kind {
        ItemKind::Plugin => true,
        ItemKind::Theme => match last_updated {
            Some(updated) => updated.year() >= current_year - THEME_MAX_AGE_YEARS,
            None => false,
        },
    }
}

/// Extraction directory for an item.
pub fn item_dir(download_dir: &Path, kind: ItemKind, slug: &str) -> PathBuf {
    download_dir.join(kind.plural()).join(slug)
}
