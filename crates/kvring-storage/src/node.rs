//! `StorageNode`: a single replica — an in-memory map plus a durable,
//! append-only write-ahead log.
//!
//! # Durability contract
//!
//! After `put`/`delete` returns success, the record is on stable storage
//! (the file has been `fsync`'d). A crash between the write and the
//! `fsync` may lose the record; a crash after the `fsync` must not. The
//! log append + fsync + in-memory update happen inside a single exclusive
//! critical section so the map can never observe a value that isn't yet
//! durable.

use crate::wal::{self, Record};
use kvring_core::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::info;

struct Inner {
    map: HashMap<String, Vec<u8>>,
    file: File,
}

/// A single replica: durable key/value storage backed by an append-only log.
pub struct StorageNode {
    name: String,
    inner: RwLock<Inner>,
}

impl StorageNode {
    /// Opens (creating if absent) the log at `<wal_dir>/<name>.aof`, replays
    /// it to rebuild the in-memory map, then reopens the file for
    /// subsequent appends.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Recovery`] if the log contains a malformed record —
    /// this is treated as fatal rather than skipped, because silently
    /// skipping a corrupt record would let this replica's state diverge
    /// from its peers without anyone noticing.
    pub fn open(name: impl Into<String>, wal_dir: impl AsRef<Path>) -> Result<Self> {
        let name = name.into();
        let wal_dir = wal_dir.as_ref();
        fs::create_dir_all(wal_dir)
            .map_err(|e| Error::Recovery(format!("failed to create wal dir: {e}")))?;
        set_dir_permissions(wal_dir);

        let log_path = log_path(wal_dir, &name);
        let map = Self::replay(&log_path)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .write(true)
            .open(&log_path)
            .map_err(|e| Error::Recovery(format!("failed to open wal file: {e}")))?;
        set_file_permissions(&file);

        info!(node = %name, records = map.len(), "storage node recovered");
        Ok(Self { name, inner: RwLock::new(Inner { map, file }) })
    }

    fn replay(log_path: &Path) -> Result<HashMap<String, Vec<u8>>> {
        let mut map = HashMap::new();
        let file = match File::open(log_path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(map),
            Err(e) => return Err(Error::Recovery(format!("failed to open wal for replay: {e}"))),
        };

        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| Error::Recovery(format!("failed to read wal line: {e}")))?;
            if line.is_empty() {
                continue;
            }
            match wal::parse_line(&line)? {
                Record::Set { key, value } => {
                    map.insert(key, value);
                }
                Record::Del { key } => {
                    map.remove(&key);
                }
            }
        }
        Ok(map)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Writes a `SET` record, `fsync`s, then updates the in-memory map.
    pub fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        wal::validate_key(key)?;
        let record = wal::encode_set(key, value);

        let mut inner = self.inner.write();
        inner
            .file
            .write_all(record.as_bytes())
            .map_err(|e| Error::Recovery(format!("wal write failed: {e}")))?;
        inner
            .file
            .sync_all()
            .map_err(|e| Error::Recovery(format!("wal fsync failed: {e}")))?;
        inner.map.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    /// Writes a `DEL` record, `fsync`s, then removes the key.
    ///
    /// Idempotent: deleting an absent key still writes a tombstone and
    /// returns success, so replaying the log always converges.
    pub fn delete(&self, key: &str) -> Result<()> {
        wal::validate_key(key)?;
        let record = wal::encode_del(key);

        let mut inner = self.inner.write();
        inner
            .file
            .write_all(record.as_bytes())
            .map_err(|e| Error::Recovery(format!("wal write failed: {e}")))?;
        inner
            .file
            .sync_all()
            .map_err(|e| Error::Recovery(format!("wal fsync failed: {e}")))?;
        inner.map.remove(key);
        Ok(())
    }

    /// Looks up a key under a shared read lock.
    pub fn get(&self, key: &str) -> (Option<Vec<u8>>, bool) {
        let inner = self.inner.read();
        match inner.map.get(key) {
            Some(v) => (Some(v.clone()), true),
            None => (None, false),
        }
    }

    /// Number of live keys. Read-only; does not affect durability.
    pub fn len(&self) -> usize {
        self.inner.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all live keys, for CLI/debug inspection.
    pub fn keys(&self) -> Vec<String> {
        self.inner.read().map.keys().cloned().collect()
    }
}

fn log_path(wal_dir: &Path, name: &str) -> PathBuf {
    wal_dir.join(format!("{name}.aof"))
}

#[cfg(unix)]
fn set_dir_permissions(dir: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(meta) = fs::metadata(dir) {
        let mut perms = meta.permissions();
        perms.set_mode(0o755);
        let _ = fs::set_permissions(dir, perms);
    }
}

#[cfg(not(unix))]
fn set_dir_permissions(_dir: &Path) {}

#[cfg(unix)]
fn set_file_permissions(file: &File) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(meta) = file.metadata() {
        let mut perms = meta.permissions();
        perms.set_mode(0o755);
        let _ = file.set_permissions(perms);
    }
}

#[cfg(not(unix))]
fn set_file_permissions(_file: &File) {}
