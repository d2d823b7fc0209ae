//! Boot-time configuration for `NodeServer`, read from the environment.
//!
//! `NODE_NAME` is required — it's both the node's durable identity and the
//! write-ahead log's filename stem (§4.6). Everything else has a sensible
//! default so a single-node smoke test needs no configuration at all.

use std::net::SocketAddr;
use std::path::PathBuf;

pub struct ServerConfig {
    pub node_name: String,
    pub listen_addr: SocketAddr,
    pub wal_dir: PathBuf,
}

impl ServerConfig {
    /// Reads configuration from the environment. Returns an error if
    /// `NODE_NAME` is unset — the caller is expected to log it and exit
    /// with code 1, per §4.6/§6.
    pub fn from_env() -> anyhow::Result<Self> {
        let node_name = std::env::var("NODE_NAME")
            .map_err(|_| anyhow::anyhow!("NODE_NAME environment variable is required"))?;

        let listen_addr = std::env::var("KVRING_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:50051".to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid KVRING_LISTEN_ADDR: {e}"))?;

        let wal_dir = std::env::var("KVRING_WAL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./wal"));

        Ok(Self { node_name, listen_addr, wal_dir })
    }
}
