//! WordPress.org plugin/theme info API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::types::{CatalogItem, CatalogPage};
use super::{CatalogClient, CatalogError};
use crate::item::ItemKind;

/// WordPress.org catalog client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordPressCatalogConfig {
    /// Plugin info endpoint.
    #[serde(default = "default_plugins_url")]
    pub plugins_url: String,
    /// Theme info endpoint.
    #[serde(default = "default_themes_url")]
    pub themes_url: String,
    /// Items requested per page.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Catalog request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Whole-download limit for archives in seconds. Unset means no limit.
    #[serde(default)]
    pub download_timeout_secs: Option<u64>,
    /// User-Agent header.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_plugins_url() -> String {
    "https://api.wordpress.org/plugins/info/1.2/".to_string()
}

fn default_themes_url() -> String {
    "https://api.wordpress.org/themes/info/1.2/".to_string()
}

fn default_per_page() -> u32 {
    super::DEFAULT_PER_PAGE
}

fn default_timeout() -> u64 {
    120
}

fn default_user_agent() -> String {
    format!("wpaudit/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for WordPressCatalogConfig {
    fn default() -> Self {
        Self {
            plugins_url: default_plugins_url(),
            themes_url: default_themes_url(),
            per_page: default_per_page(),
            timeout_secs: default_timeout(),
            download_timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

impl WordPressCatalogConfig {
    /// Endpoint for the given kind.
    pub fn endpoint(&self, kind: ItemKind) -> &str {
        match kind {
            ItemKind::Plugin => &self.plugins_url,
            ItemKind::Theme => &self.themes_url,
        }
    }

    pub fn download_timeout(&self) -> Option<Duration> {
        self.download_timeout_secs.map(Duration::from_secs)
    }
}

/// Catalog client backed by the public WordPress.org API.
pub struct WordPressCatalogClient {
    client: Client,
    config: WordPressCatalogConfig,
}

impl WordPressCatalogClient {
    /// Create a new client.
    pub fn new(config: WordPressCatalogConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Query parameters for one page request.
    pub fn query_params(kind: ItemKind, page: u32, per_page: u32) -> Vec<(String, String)> {
        let mut params = vec![
            ("action".to_string(), kind.api_action().to_string()),
            ("request[page]".to_string(), page.to_string()),
            ("request[per_page]".to_string(), per_page.to_string()),
        ];

        let fields = [
            "slug",
            "version",
            "active_installs",
            "downloaded",
            kind.updated_field(),
            "added",
            "download_link",
        ];
        for field in fields {
            params.push((format!("request[fields][{}]", field), "true".to_string()));
        }

        params.push(("request[browse]".to_string(), "popular".to_string()));
        params
    }

    /// Parse a catalog response body for the given kind.
    ///
    /// Individual items that fail to deserialize are dropped with a warning
    /// rather than failing the whole page.
    pub fn parse_page(kind: ItemKind, body: &str) -> Result<CatalogPage, CatalogError> {
        let raw: RawPage = serde_json::from_str(body)
            .map_err(|e| CatalogError::ParseError(format!("Invalid {} page: {}", kind, e)))?;

        let values = match kind {
            ItemKind::Plugin => raw.plugins,
            ItemKind::Theme => raw.themes,
        };

        let items = values.map(|values| {
            values
                .into_iter()
                .filter_map(|value| match serde_json::from_value::<CatalogItem>(value) {
                    Ok(item) => Some(item),
                    Err(e) => {
                        warn!("Skipping malformed {} entry: {}", kind, e);
                        None
                    }
                })
                .collect()
        });

        Ok(CatalogPage {
            total_pages: raw.info.and_then(|info| info.pages),
            items,
        })
    }
}

#[async_trait]
impl CatalogClient for WordPressCatalogClient {
    async fn fetch_page(
        &self,
        kind: ItemKind,
        page: u32,
        per_page: u32,
    ) -> Result<CatalogPage, CatalogError> {
        let url = self.config.endpoint(kind);
        debug!("Catalog request: kind={}, page={}, per_page={}", kind, page, per_page);

        let response = self
            .client
            .get(url)
            .query(&Self::query_params(kind, page, per_page))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        Self::parse_page(kind, &body)
    }
}

// ============================================================================
// API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawPage {
    #[serde(default)]
    info: Option<RawInfo>,
    #[serde(default)]
    plugins: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    themes: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct RawInfo {
    #[serde(default)]
    pages: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer one request with `status` and `body`. The handle yields the
    /// request head that was received.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{}/plugins/info/1.2/", addr), handle)
    }

    fn client_for(url: &str) -> WordPressCatalogClient {
        WordPressCatalogClient::new(WordPressCatalogConfig {
            plugins_url: url.to_string(),
            themes_url: url.to_string(),
            timeout_secs: 5,
            ..Default::default()
        })
        .unwrap()
    }

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_query_params_plugins() {
        let params = WordPressCatalogClient::query_params(ItemKind::Plugin, 3, 100);
        assert_eq!(param(&params, "action"), Some("query_plugins"));
        assert_eq!(param(&params, "request[page]"), Some("3"));
        assert_eq!(param(&params, "request[per_page]"), Some("100"));
        assert_eq!(param(&params, "request[browse]"), Some("popular"));
        assert_eq!(param(&params, "request[fields][modified]"), Some("true"));
        assert_eq!(param(&params, "request[fields][download_link]"), Some("true"));
        assert_eq!(param(&params, "request[fields][last_updated]"), None);
    }

    #[test]
    fn test_query_params_themes() {
        let params = WordPressCatalogClient::query_params(ItemKind::Theme, 1, 50);
        assert_eq!(param(&params, "action"), Some("query_themes"));
        assert_eq!(param(&params, "request[fields][last_updated]"), Some("true"));
        assert_eq!(param(&params, "request[fields][active_installs]"), Some("true"));
    }

    #[test]
    fn test_parse_plugin_page() {
        let body = r#"{
            "info": {"page": 1, "pages": 42, "results": 4200},
            "plugins": [
                {"slug": "akismet", "version": "5.3", "active_installs": 5000000,
                 "downloaded": 1, "added": "2005-10-20", "download_link": "https://x.test/a.zip"},
                {"slug": "tiny", "active_installs": 10}
            ]
        }"#;

        let page = WordPressCatalogClient::parse_page(ItemKind::Plugin, body).unwrap();
        assert_eq!(page.total_pages, Some(42));
        let items = page.items.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].slug, "akismet");
        assert_eq!(items[1].active_installs(), 10);
    }

    #[test]
    fn test_parse_page_uses_kind_key() {
        let body = r#"{"info": {"pages": 1}, "plugins": [{"slug": "a"}]}"#;
        let page = WordPressCatalogClient::parse_page(ItemKind::Theme, body).unwrap();
        assert_eq!(page.total_pages, Some(1));
        assert!(page.items.is_none());
    }

    #[test]
    fn test_parse_page_skips_malformed_items() {
        let body = r#"{"themes": [{"slug": "ok"}, {"version": "1.0"}, "garbage"]}"#;
        let page = WordPressCatalogClient::parse_page(ItemKind::Theme, body).unwrap();
        assert!(page.total_pages.is_none());
        let items = page.items.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].slug, "ok");
    }

    #[test]
    fn test_parse_page_invalid_json() {
        let result = WordPressCatalogClient::parse_page(ItemKind::Plugin, "<html>");
        assert!(matches!(result, Err(CatalogError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_fetch_page_over_http() {
        let (url, request) = serve_once(
            "200 OK",
            r#"{"info": {"pages": 7}, "plugins": [{"slug": "akismet", "active_installs": 5000000}]}"#,
        )
        .await;

        let page = client_for(&url)
            .fetch_page(ItemKind::Plugin, 2, 50)
            .await
            .unwrap();

        assert_eq!(page.total_pages, Some(7));
        assert_eq!(page.items.unwrap()[0].slug, "akismet");

        let request = request.await.unwrap();
        let request_line = request.lines().next().unwrap();
        assert!(request_line.starts_with("GET /plugins/info/1.2/?action=query_plugins"));
        assert!(request_line.contains("request%5Bpage%5D=2"));
        assert!(request_line.contains("request%5Bper_page%5D=50"));
    }

    #[tokio::test]
    async fn test_fetch_page_error_status() {
        let (url, _request) = serve_once("503 Service Unavailable", "maintenance").await;

        let result = client_for(&url).fetch_page(ItemKind::Theme, 1, 100).await;

        match result {
            Err(CatalogError::ApiError { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("expected ApiError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_page_transport_error() {
        // Nothing listens on port 1.
        let result = client_for("http://127.0.0.1:1/")
            .fetch_page(ItemKind::Plugin, 1, 100)
            .await;

        assert!(matches!(result, Err(CatalogError::HttpError(_))));
    }

    #[test]
    fn test_endpoint_selection() {
        let config = WordPressCatalogConfig::default();
        assert_eq!(
            config.endpoint(ItemKind::Plugin),
            "https://api.wordpress.org/plugins/info/1.2/"
        );
        assert_eq!(
            config.endpoint(ItemKind::Theme),
            "https://api.wordpress.org/themes/info/1.2/"
        );
        assert_eq!(config.per_page, 100);
    }
}
