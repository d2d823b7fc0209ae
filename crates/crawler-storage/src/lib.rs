//! Output directory layout for crawled page snapshots (§6).
//!
//! One MHTML file per successfully fetched page, at
//! `<root>/<host>/<url-path>/<UTC-yyyymmddThhmmss>.mhtml`.

use std::fs;
use std::path::{Path, PathBuf};

use crawler_core::ErrorKind;
use time::{format_description, OffsetDateTime};
use tracing::debug;
use url::Url;

pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Writes `contents` under the directory derived from `url`, naming the
    /// file after `timestamp` (UTC). Directories are created as needed at
    /// mode 0755.
    pub fn write(&self, url: &Url, timestamp: OffsetDateTime, contents: &[u8]) -> Result<PathBuf, ErrorKind> {
        let dir = self.directory_for(url);
        fs::create_dir_all(&dir).map_err(|err| ErrorKind::DiskWriteFailed(err.to_string()))?;
        set_dir_permissions(&dir).map_err(|err| ErrorKind::DiskWriteFailed(err.to_string()))?;

        let path = dir.join(format!("{}.mhtml", format_timestamp(timestamp)));
        fs::write(&path, contents).map_err(|err| ErrorKind::DiskWriteFailed(err.to_string()))?;
        debug!(path = %path.display(), bytes = contents.len(), "wrote snapshot");
        Ok(path)
    }

    fn directory_for(&self, url: &Url) -> PathBuf {
        let mut dir = self.root.clone();
        dir.push(url.host_str().unwrap_or("unknown-host"));
        if let Some(segments) = url.path_segments() {
            for segment in segments.filter(|s| !s.is_empty()) {
                dir.push(segment);
            }
        }
        dir
    }
}

fn format_timestamp(ts: OffsetDateTime) -> String {
    let format = format_description::parse("[year][month][day]T[hour][minute][second]")
        .expect("static format description is always valid");
    ts.format(&format).expect("formatting a valid datetime never fails")
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn writes_under_host_and_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let url = Url::parse("https://example.test/blog/post-1").unwrap();
        let ts = datetime!(2024-03-05 12:30:00 UTC);

        let written = store.write(&url, ts, b"<html></html>").unwrap();
        assert_eq!(
            written,
            dir.path().join("example.test/blog/post-1/20240305T123000.mhtml")
        );
        assert_eq!(fs::read(&written).unwrap(), b"<html></html>");
    }

    #[test]
    fn root_path_writes_directly_under_host() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let url = Url::parse("https://example.test/").unwrap();
        let ts = datetime!(2024-01-01 00:00:00 UTC);

        let written = store.write(&url, ts, b"x").unwrap();
        assert_eq!(written, dir.path().join("example.test/20240101T000000.mhtml"));
    }
}
