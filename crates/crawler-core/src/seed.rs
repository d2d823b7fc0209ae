//! `SeedLoader`: parses a URL list file into starting `CrawlJob`s (§6).

use std::fs;
use std::path::Path;

use tracing::warn;
use url::Url;

use crate::job::CrawlJob;

/// Loads the seed URLs a crawl starts from.
pub struct SeedLoader;

impl SeedLoader {
    /// Reads `path` as UTF-8, one URL per line. Blank lines and lines
    /// beginning with `#` (after trimming) are ignored; lines that don't
    /// parse as a URL are logged and skipped. Fatal if zero valid seeds
    /// remain, since a crawl with no jobs would silently do nothing.
    pub fn load(path: &Path) -> std::io::Result<Vec<CrawlJob>> {
        let contents = fs::read_to_string(path)?;
        let mut jobs = Vec::new();
        for (lineno, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match Url::parse(line) {
                Ok(url) => jobs.push(CrawlJob::new(url, 0)),
                Err(err) => {
                    warn!(file = %path.display(), line = lineno + 1, %err, "skipping unparsable seed URL");
                }
            }
        }
        if jobs.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("no valid seed URLs found in {}", path.display()),
            ));
        }
        Ok(jobs)
    }
}
