//! Item kinds and the records persisted for them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogItem;
use crate::date::{normalize_optional, DateStyle};

/// Items below this many active installs are ignored entirely.
pub const MIN_ACTIVE_INSTALLS: u64 = 1000;

/// Placeholder stored when the catalog omits a text field.
pub const NOT_AVAILABLE: &str = "N/A";

/// The two kinds of catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Plugin,
    Theme,
}

impl ItemKind {
    /// All kinds, in processing order.
    pub const ALL: [ItemKind; 2] = [ItemKind::Plugin, ItemKind::Theme];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Plugin => "plugin",
            ItemKind::Theme => "theme",
        }
    }

    /// Plural name, used both for the download sub-directory and the API's item array key.
    pub fn plural(&self) -> &'static str {
        match self {
            ItemKind::Plugin => "plugins",
            ItemKind::Theme => "themes",
        }
    }

    /// Catalog table name.
    pub fn data_table(&self) -> &'static str {
        match self {
            ItemKind::Plugin => "PluginData",
            ItemKind::Theme => "ThemeData",
        }
    }

    /// Findings table name.
    pub fn results_table(&self) -> &'static str {
        match self {
            ItemKind::Plugin => "PluginResults",
            ItemKind::Theme => "ThemeResults",
        }
    }

    /// Value of the catalog API's `action` parameter.
    pub fn api_action(&self) -> &'static str {
        match self {
            ItemKind::Plugin => "query_plugins",
            ItemKind::Theme => "query_themes",
        }
    }

    /// Catalog field carrying the item's last modification date.
    pub fn updated_field(&self) -> &'static str {
        match self {
            ItemKind::Plugin => "modified",
            ItemKind::Theme => "last_updated",
        }
    }

    /// Conventional archive URL used when the catalog gives no download link.
    pub fn fallback_download_url(&self, slug: &str) -> String {
        match self {
            ItemKind::Plugin => {
                format!("https://downloads.wordpress.org/plugin/{}.latest-stable.zip", slug)
            }
            ItemKind::Theme => format!("https://downloads.wordpress.org/theme/{}.zip", slug),
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of `PluginData` / `ThemeData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub slug: String,
    pub version: String,
    pub active_installs: u64,
    pub downloaded: u64,
    /// `YYYY-MM-DD HH:MM:SS`
    pub last_updated: Option<String>,
    /// `YYYY-MM-DD`
    pub added_date: Option<String>,
    pub download_link: String,
}

impl ItemRecord {
    /// Build the persisted record for a catalog item, normalizing its dates.
    pub fn from_catalog(kind: ItemKind, item: &CatalogItem) -> Self {
        Self {
            slug: item.slug.clone(),
            version: item
                .version
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            active_installs: item.active_installs(),
            downloaded: item.downloaded(),
            last_updated: normalize_optional(item.updated_at(kind), DateStyle::DateTime),
            added_date: normalize_optional(item.added.as_deref(), DateStyle::DateOnly),
            download_link: item
                .download_link
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        }
    }
}

/// One static-analysis finding for an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Path of the file the finding was reported in.
    pub file_path: String,
    /// Identifier of the violated rule.
    pub check_id: String,
    /// 1-based first line.
    pub start_line: u32,
    /// 1-based last line.
    pub end_line: u32,
    /// Source snippet implicated by the finding.
    pub vuln_lines: String,
}

/// A finding as stored, with its surrogate key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFinding {
    pub id: i64,
    pub slug: String,
    #[serde(flatten)]
    pub finding: Finding,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_download_urls() {
        assert_eq!(
            ItemKind::Plugin.fallback_download_url("akismet"),
            "https://downloads.wordpress.org/plugin/akismet.latest-stable.zip"
        );
        assert_eq!(
            ItemKind::Theme.fallback_download_url("astra"),
            "https://downloads.wordpress.org/theme/astra.zip"
        );
    }

    #[test]
    fn test_table_names() {
        assert_eq!(ItemKind::Plugin.data_table(), "PluginData");
        assert_eq!(ItemKind::Plugin.results_table(), "PluginResults");
        assert_eq!(ItemKind::Theme.data_table(), "ThemeData");
        assert_eq!(ItemKind::Theme.results_table(), "ThemeResults");
    }

    #[test]
    fn test_kind_serialization() {
        assert_eq!(serde_json::to_string(&ItemKind::Plugin).unwrap(), "\"plugin\"");
        assert_eq!(ItemKind::Theme.to_string(), "theme");
        assert_eq!(ItemKind::Theme.plural(), "themes");
    }

    #[test]
    fn test_record_from_plugin_item() {
        let item = CatalogItem {
            slug: "contact-form-7".to_string(),
            version: Some("5.9".to_string()),
            active_installs: Some(5_000_000),
            downloaded: Some(300_000_000),
            modified: Some("2024-03-01T10:00:00+0000".to_string()),
            last_updated: Some("2020-01-01 1:00pm GMT".to_string()),
            added: Some("2007-08-02".to_string()),
            download_link: None,
        };

        let record = ItemRecord::from_catalog(ItemKind::Plugin, &item);
        assert_eq!(record.slug, "contact-form-7");
        assert_eq!(record.active_installs, 5_000_000);
        assert_eq!(record.last_updated.as_deref(), Some("2024-03-01 10:00:00"));
        assert_eq!(record.added_date.as_deref(), Some("2007-08-02"));
        assert_eq!(record.download_link, NOT_AVAILABLE);
    }

    #[test]
    fn test_record_from_theme_item_uses_last_updated() {
        let item = CatalogItem {
            slug: "astra".to_string(),
            version: None,
            active_installs: Some(1_000_000),
            downloaded: None,
            modified: Some("2001-01-01".to_string()),
            last_updated: Some("2024-05-06".to_string()),
            added: Some("not a date".to_string()),
            download_link: Some("https://example.test/astra.zip".to_string()),
        };

        let record = ItemRecord::from_catalog(ItemKind::Theme, &item);
        assert_eq!(record.version, NOT_AVAILABLE);
        assert_eq!(record.downloaded, 0);
        assert_eq!(record.last_updated.as_deref(), Some("2024-05-06 00:00:00"));
        assert_eq!(record.added_date, None);
        assert_eq!(record.download_link, "https://example.test/astra.zip");
    }
}
