//! Server-side plumbing shared by `kvring-server`: accept QUIC connections,
//! read one `Request` per bidirectional stream, dispatch to a
//! `StorageNode`, write back the `Response`.

use crate::wire::{read_frame, write_frame, Request, Response};
use kvring_storage::StorageNode;
use std::sync::Arc;
use tracing::{debug, warn};

/// Serves one accepted QUIC connection until the peer closes it.
///
/// Each bidirectional stream opened by the peer is handled independently
/// and concurrently (one task per stream), so a slow client on one stream
/// never blocks another.
pub async fn serve_connection(connection: quinn::Connection, node: Arc<StorageNode>) {
    loop {
        match connection.accept_bi().await {
            Ok((send, recv)) => {
                let node = node.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_stream(send, recv, node).await {
                        warn!(error = %e, "error handling kvring rpc stream");
                    }
                });
            }
            Err(quinn::ConnectionError::ApplicationClosed(_))
            | Err(quinn::ConnectionError::ConnectionClosed(_)) => {
                debug!("connection closed");
                return;
            }
            Err(e) => {
                warn!(error = %e, "connection error, dropping connection");
                return;
            }
        }
    }
}

async fn handle_stream(
    mut send: quinn::SendStream,
    mut recv: quinn::RecvStream,
    node: Arc<StorageNode>,
) -> std::io::Result<()> {
    let payload = read_frame(&mut recv).await?;
    let request: Request = bincode::deserialize(&payload)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let response = match request {
        Request::Put { key, value } => {
            let success = node.put(&key, &value).is_ok();
            Response::Put { success }
        }
        Request::Get { key } => {
            let (value, found) = node.get(&key);
            Response::Get { value, found }
        }
        Request::Delete { key } => {
            let success = node.delete(&key).is_ok();
            Response::Delete { success }
        }
        Request::Describe => Response::Describe { key_count: node.len() },
    };

    let encoded = bincode::serialize(&response)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    write_frame(&mut send, &encoded).await?;
    send.finish().await.ok();
    Ok(())
}
