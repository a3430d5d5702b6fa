//! Types for catalog API responses.

use serde::{Deserialize, Serialize};

use crate::item::ItemKind;

/// A plugin or theme as returned by the catalog API.
///
/// Only the fields the pipeline requests are modeled; anything else in the
/// payload is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Stable identifier.
    pub slug: String,
    /// Latest version string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Active installation count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_installs: Option<u64>,
    /// Cumulative downloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloaded: Option<u64>,
    /// Plugin modification date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    /// Last update date (themes; human-readable form for plugins).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    /// Date the item was added to the directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added: Option<String>,
    /// Direct archive URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_link: Option<String>,
}

impl CatalogItem {
    pub fn active_installs(&self) -> u64 {
        self.active_installs.unwrap_or(0)
    }

    pub fn downloaded(&self) -> u64 {
        self.downloaded.unwrap_or(0)
    }

    /// The raw update date relevant for this kind.
    ///
    /// Plugins report `modified`, falling back to `last_updated`; themes
    /// only report `last_updated`.
    pub fn updated_at(&self, kind: ItemKind) -> Option<&str> {
        match kind {
            ItemKind::Plugin => self.modified.as_deref().or(self.last_updated.as_deref()),
            ItemKind::Theme => self.last_updated.as_deref(),
        }
    }

    /// The catalog's download link, if present and non-empty.
    pub fn stated_download_link(&self) -> Option<&str> {
        self.download_link
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty())
    }
}

/// One page of catalog results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogPage {
    /// Total page count from `info.pages`, when the response carried an `info` block.
    pub total_pages: Option<u32>,
    /// The page's items, when the response carried an item array.
    pub items: Option<Vec<CatalogItem>>,
}
