//! `NodeServer` entry point: owns one `StorageNode` and exposes `Put`/
//! `Get`/`Delete` on a listening QUIC socket (default port 50051).
//!
//! Startup requires `NODE_NAME` in the environment; missing it is fatal
//! (§4.6).

mod config;

use config::ServerConfig;
use kvring_storage::StorageNode;
use kvring_transport::{server::serve_connection, tls};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match ServerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "fatal: missing required configuration");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        error!(error = %e, "node server exited with error");
        std::process::exit(1);
    }
}

async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let node = Arc::new(StorageNode::open(&config.node_name, &config.wal_dir)?);
    info!(node = %config.node_name, addr = %config.listen_addr, "storage node ready");

    let server_config = tls::server_config(&config.node_name);
    let endpoint = quinn::Endpoint::server(server_config, config.listen_addr)?;
    info!(addr = %config.listen_addr, "listening for kvring rpc");

    while let Some(connecting) = endpoint.accept().await {
        let node = node.clone();
        tokio::spawn(async move {
            match connecting.await {
                Ok(connection) => serve_connection(connection, node).await,
                Err(e) => tracing::warn!(error = %e, "failed to complete handshake"),
            }
        });
    }

    Ok(())
}
