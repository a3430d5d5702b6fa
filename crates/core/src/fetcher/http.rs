//! HTTP archive fetcher.

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use reqwest::Client;
use tracing::{debug, info};

use super::{
    item_dir, resolve_download_url, should_download, ArchiveFetcher, FetchError, FetchOutcome,
};
use crate::catalog::CatalogItem;
use crate::date::parse_date;
use crate::item::ItemKind;

/// Fetcher that downloads archives over HTTP and unpacks them under `download_dir`.
pub struct HttpArchiveFetcher {
    client: Client,
    download_dir: PathBuf,
}

impl HttpArchiveFetcher {
    /// `timeout` bounds each whole download; `None` lets large archives take
    /// as long as they need.
    pub fn new(
        download_dir: impl Into<PathBuf>,
        timeout: Option<Duration>,
        user_agent: &str,
    ) -> Result<Self, FetchError> {
        let mut builder = Client::builder().user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            download_dir: download_dir.into(),
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ArchiveFetcher for HttpArchiveFetcher {
    async fn fetch(&self, kind: ItemKind, item: &CatalogItem) -> Result<FetchOutcome, FetchError> {
        let slug = item.slug.as_str();
        if !is_safe_slug(slug) {
            return Err(FetchError::Archive(format!("refusing unsafe slug '{}'", slug)));
        }

        let last_updated = item.updated_at(kind).and_then(parse_date);
        if !should_download(kind, last_updated, Utc::now().year()) {
            debug!("Skipping stale {} {}", kind, slug);
            return Ok(FetchOutcome::SkippedStale);
        }

        let url = resolve_download_url(kind, slug, item.stated_download_link());
        let target = item_dir(&self.download_dir, kind, slug);

        if clear_target(&target).await? {
            debug!("{} folder already exists, deleted {}", kind, target.display());
        }

        debug!("Downloading and extracting {} {} from {}", kind, slug, url);
        let bytes = self.download(&url).await?;

        let dest = target.clone();
        let entries = tokio::task::spawn_blocking(move || extract_archive(&bytes, &dest))
            .await
            .map_err(|e| FetchError::Archive(format!("extraction task failed: {}", e)))??;

        info!("Extracted {} {} ({} entries)", kind, slug, entries);
        Ok(FetchOutcome::Extracted {
            path: target,
            entries,
        })
    }
}

/// Unpack a zip archive held in memory into `dest`.
///
/// Entries whose names would resolve outside `dest` are rejected. Returns the
/// number of entries written.
pub fn extract_archive(bytes: &[u8], dest: &Path) -> Result<usize, FetchError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| FetchError::Archive(e.to_string()))?;

    std::fs::create_dir_all(dest)?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| FetchError::Archive(e.to_string()))?;

        let relative = match file.enclosed_name() {
            Some(path) => path.to_path_buf(),
            None => {
                return Err(FetchError::Archive(format!(
                    "entry '{}' escapes the extraction directory",
                    file.name()
                )))
            }
        };
        let out_path = dest.join(relative);

        if file.is_dir() {
            std::fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| FetchError::Archive(format!("{}: {}", file.name(), e)))?;
        std::fs::write(&out_path, contents)?;
    }

    Ok(archive.len())
}

/// Remove a previous extraction. Returns whether anything was removed.
async fn clear_target(target: &Path) -> Result<bool, FetchError> {
    match tokio::fs::remove_dir_all(target).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug != "."
        && slug != ".."
        && !slug.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use zip::write::SimpleFileOptions;

    fn build_zip(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, contents) in files {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(contents.as_bytes()).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    /// Serve a single HTTP response on a local port and return its URL.
    async fn serve_once(status: &'static str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
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

            let header = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                body.len()
            );
            socket.write_all(header.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}/archive.zip", addr)
    }

    fn fetcher(dir: &Path) -> HttpArchiveFetcher {
        HttpArchiveFetcher::new(dir, Some(Duration::from_secs(5)), "wpaudit-test").unwrap()
    }

    fn item_with_link(slug: &str, link: String) -> CatalogItem {
        CatalogItem {
            slug: slug.to_string(),
            active_installs: Some(5000),
            last_updated: Some(format!("{}-01-01", Utc::now().year())),
            download_link: Some(link),
            ..Default::default()
        }
    }

    #[test]
    fn test_extract_archive_writes_nested_files() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("plugins").join("foo");
        let bytes = build_zip(&[
            ("foo/", ""),
            ("foo/foo.php", "<?php echo 1;"),
            ("foo/includes/util.php", "<?php"),
        ]);

        let entries = extract_archive(&bytes, &dest).unwrap();

        assert_eq!(entries, 3);
        assert_eq!(
            std::fs::read_to_string(dest.join("foo/foo.php")).unwrap(),
            "<?php echo 1;"
        );
        assert!(dest.join("foo/includes/util.php").is_file());
    }

    #[test]
    fn test_extract_archive_rejects_corrupt_payload() {
        let dir = TempDir::new().unwrap();
        let result = extract_archive(b"<html>not found</html>", dir.path());
        assert!(matches!(result, Err(FetchError::Archive(_))));
    }

    #[test]
    fn test_extract_archive_rejects_escaping_entries() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("inner");
        let bytes = build_zip(&[("../evil.php", "<?php")]);

        let result = extract_archive(&bytes, &dest);
        assert!(matches!(result, Err(FetchError::Archive(_))));
        assert!(!dir.path().join("evil.php").exists());
    }

    #[test]
    fn test_unsafe_slugs() {
        assert!(is_safe_slug("contact-form-7"));
        assert!(!is_safe_slug(""));
        assert!(!is_safe_slug(".."));
        assert!(!is_safe_slug("a/b"));
    }

    #[tokio::test]
    async fn test_fetch_replaces_previous_extraction() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("plugins").join("foo");
        std::fs::create_dir_all(&target).unwrap();
        std::fs::write(target.join("stale.php"), "old").unwrap();

        let url = serve_once("200 OK", build_zip(&[("foo.php", "new")])).await;
        let outcome = fetcher(dir.path())
            .fetch(ItemKind::Plugin, &item_with_link("foo", url))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            FetchOutcome::Extracted {
                path: target.clone(),
                entries: 1
            }
        );
        assert!(!target.join("stale.php").exists());
        assert_eq!(std::fs::read_to_string(target.join("foo.php")).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_fetch_without_download_timeout() {
        let dir = TempDir::new().unwrap();
        let url = serve_once("200 OK", build_zip(&[("big.php", "<?php")])).await;

        let fetcher = HttpArchiveFetcher::new(dir.path(), None, "wpaudit-test").unwrap();
        let outcome = fetcher
            .fetch(ItemKind::Plugin, &item_with_link("big", url))
            .await
            .unwrap();

        assert!(matches!(outcome, FetchOutcome::Extracted { entries: 1, .. }));
        assert!(dir.path().join("plugins/big/big.php").is_file());
    }

    #[tokio::test]
    async fn test_fetch_reports_http_status() {
        let dir = TempDir::new().unwrap();
        let url = serve_once("404 Not Found", b"missing".to_vec()).await;

        let result = fetcher(dir.path())
            .fetch(ItemKind::Plugin, &item_with_link("gone", url))
            .await;

        assert!(matches!(result, Err(FetchError::HttpStatus { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_fetch_skips_stale_theme_without_request() {
        let dir = TempDir::new().unwrap();
        let item = CatalogItem {
            slug: "old-theme".to_string(),
            last_updated: Some("2001-05-05".to_string()),
            // Nothing listens here, so a request would fail instead of skipping.
            download_link: Some("http://127.0.0.1:1/old.zip".to_string()),
            ..Default::default()
        };

        let outcome = fetcher(dir.path()).fetch(ItemKind::Theme, &item).await.unwrap();

        assert_eq!(outcome, FetchOutcome::SkippedStale);
        assert!(!dir.path().join("themes").join("old-theme").exists());
    }
}
