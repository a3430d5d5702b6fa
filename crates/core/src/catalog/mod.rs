//! WordPress.org catalog integration.
//!
//! The catalog is a paginated JSON API listing plugins and themes. Callers
//! walk it page by page through the [`CatalogClient`] trait so that tests can
//! substitute a scripted catalog.

mod types;
mod wordpress;

pub use types::{CatalogItem, CatalogPage};
pub use wordpress::{WordPressCatalogClient, WordPressCatalogConfig};

use async_trait::async_trait;
use thiserror::Error;

use crate::item::ItemKind;

/// Default number of items requested per page.
pub const DEFAULT_PER_PAGE: u32 = 100;

/// Errors that can occur when querying the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// A source of catalog pages.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch one page (1-based) of the given kind, ordered by popularity.
    async fn fetch_page(
        &self,
        kind: ItemKind,
        page: u32,
        per_page: u32,
    ) -> Result<CatalogPage, CatalogError>;
}
