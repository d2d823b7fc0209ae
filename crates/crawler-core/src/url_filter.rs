//! `UrlFilter`: decides whether a URL is a binary/asset to skip (§4.7).

use std::time::Duration;

use tracing::debug;
use url::Url;

/// Lowercased path-extension set treated as "binary/asset, don't fetch."
/// Part of the behavioral contract (§6) — do not reorder or trim casually.
pub const BINARY_EXTENSIONS: &[&str] = &[
    // documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp", "rtf", "txt", "csv",
    "tsv", "epub", "mobi", "azw3", "djvu",
    // archives
    "zip", "rar", "7z", "tar", "gz", "tgz", "bz2", "xz", "iso", "dmg",
    // images
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "tiff", "ico", "svg", "heic", "psd", "ai", "raw",
    "cr2",
    // audio
    "mp3", "wav", "flac", "aac", "ogg", "wma", "m4a", "opus",
    // video
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "mpeg", "mpg", "m4v", "3gp",
    // installers
    "exe", "msi", "apk", "app", "deb", "rpm", "jar", "bin", "sh", "bat", "cmd", "ps1", "pkg",
    // other
    "json", "xml", "yaml", "sql", "db", "sqlite", "ttf", "otf", "woff", "woff2", "dwg", "dxf",
    "stl", "obj", "fbx", "blend",
];

const HEAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Decides whether a URL is worth fetching with a full headless-browser
/// navigation, or should be skipped as a non-HTML asset.
pub struct UrlFilter {
    client: reqwest::Client,
}

impl UrlFilter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(HEAD_TIMEOUT)
                .build()
                .expect("reqwest client with static timeout config is always buildable"),
        }
    }

    /// `ShouldSkip` (§4.7): extension-based fast path, else a HEAD probe.
    pub async fn should_skip(&self, url: &Url) -> bool {
        if let Some(ext) = path_extension(url) {
            return BINARY_EXTENSIONS.contains(&ext.as_str());
        }
        !self.is_html_by_head(url).await
    }

    async fn is_html_by_head(&self, url: &Url) -> bool {
        match self.client.head(url.clone()).send().await {
            Ok(resp) => resp
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|ct| ct.starts_with("text/html")),
            Err(err) => {
                debug!(%url, error = %err, "HEAD probe failed, treating as skip");
                false
            }
        }
    }
}

impl Default for UrlFilter {
    fn default() -> Self {
        Self::new()
    }
}

fn path_extension(url: &Url) -> Option<String> {
    let last_segment = url.path_segments()?.next_back()?;
    let (_, ext) = last_segment.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_lowercased_extension() {
        let url = Url::parse("https://example.test/reports/Q3.PDF").unwrap();
        assert_eq!(path_extension(&url).as_deref(), Some("pdf"));
    }

    #[test]
    fn no_extension_on_bare_path() {
        let url = Url::parse("https://example.test/about").unwrap();
        assert_eq!(path_extension(&url), None);
    }

    #[test]
    fn no_extension_on_trailing_slash() {
        let url = Url::parse("https://example.test/docs/").unwrap();
        assert_eq!(path_extension(&url), None);
    }

    #[tokio::test]
    async fn skips_known_binary_extensions() {
        let filter = UrlFilter::new();
        let url = Url::parse("https://example.test/archive.zip").unwrap();
        assert!(filter.should_skip(&url).await);
    }
}
