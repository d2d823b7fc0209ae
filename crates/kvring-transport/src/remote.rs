//! `NodeTransport` over the network: encodes the request, ships it to a
//! `NodeServer` over a QUIC stream, decodes the response.
//!
//! One lazily-established connection is reused across calls; a fresh
//! bidirectional stream is opened per RPC (QUIC streams are cheap). Every
//! call is wrapped in a per-RPC timeout (default 5s, per §5) so a wedged
//! replica can never block a coordinator task indefinitely.

use crate::tls;
use crate::wire::{read_frame, write_frame, Request, Response};
use async_trait::async_trait;
use kvring_core::transport::{
    DeleteResponse, DescribeResponse, GetResponse, NodeTransport, PutResponse, TransportError,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub struct RemoteTransport {
    endpoint: quinn::Endpoint,
    server_addr: SocketAddr,
    server_name: String,
    connection: Mutex<Option<quinn::Connection>>,
    rpc_timeout: Duration,
}

impl RemoteTransport {
    /// Creates a client transport targeting `server_addr`. `server_name`
    /// must match the SAN the server's self-signed certificate was
    /// generated with (see `tls::generate_self_signed`).
    pub fn new(server_addr: SocketAddr, server_name: impl Into<String>) -> Result<Self, TransportError> {
        let bind_addr: SocketAddr = if server_addr.is_ipv6() { "[::]:0" } else { "0.0.0.0:0" }
            .parse()
            .expect("hardcoded bind address is always valid");
        let mut endpoint = quinn::Endpoint::client(bind_addr)
            .map_err(|e| TransportError::new(format!("failed to bind client endpoint: {e}")))?;
        endpoint.set_default_client_config(tls::insecure_client_config());

        Ok(Self {
            endpoint,
            server_addr,
            server_name: server_name.into(),
            connection: Mutex::new(None),
            rpc_timeout: Duration::from_secs(5),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }

    async fn connection(&self) -> Result<quinn::Connection, TransportError> {
        let mut guard = self.connection.lock().await;
        if let Some(conn) = guard.as_ref() {
            if conn.close_reason().is_none() {
                return Ok(conn.clone());
            }
        }
        let connecting = self
            .endpoint
            .connect(self.server_addr, &self.server_name)
            .map_err(|e| TransportError::new(format!("connect failed: {e}")))?;
        let conn = connecting
            .await
            .map_err(|e| TransportError::new(format!("handshake failed: {e}")))?;
        *guard = Some(conn.clone());
        Ok(conn)
    }

    async fn call(&self, request: Request) -> Result<Response, TransportError> {
        let attempt = async {
            let conn = self.connection().await?;
            let (mut send, mut recv) = conn
                .open_bi()
                .await
                .map_err(|e| TransportError::new(format!("failed to open stream: {e}")))?;

            let payload = bincode::serialize(&request)
                .map_err(|e| TransportError::new(format!("encode failed: {e}")))?;
            write_frame(&mut send, &payload)
                .await
                .map_err(|e| TransportError::new(format!("write failed: {e}")))?;
            send.finish()
                .await
                .map_err(|e| TransportError::new(format!("stream finish failed: {e}")))?;

            let response_bytes = read_frame(&mut recv)
                .await
                .map_err(|e| TransportError::new(format!("read failed: {e}")))?;
            bincode::deserialize(&response_bytes)
                .map_err(|e| TransportError::new(format!("decode failed: {e}")))
        };

        match tokio::time::timeout(self.rpc_timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::new("rpc timed out")),
        }
    }
}

#[async_trait]
impl NodeTransport for RemoteTransport {
    async fn put(&self, key: &str, value: &[u8]) -> Result<PutResponse, TransportError> {
        match self.call(Request::Put { key: key.to_string(), value: value.to_vec() }).await? {
            Response::Put { success } => Ok(PutResponse { success }),
            _ => Err(TransportError::new("unexpected response variant for Put")),
        }
    }

    async fn get(&self, key: &str) -> Result<GetResponse, TransportError> {
        match self.call(Request::Get { key: key.to_string() }).await? {
            Response::Get { value, found } => Ok(GetResponse { value, found }),
            _ => Err(TransportError::new("unexpected response variant for Get")),
        }
    }

    async fn delete(&self, key: &str) -> Result<DeleteResponse, TransportError> {
        match self.call(Request::Delete { key: key.to_string() }).await? {
            Response::Delete { success } => Ok(DeleteResponse { success }),
            _ => Err(TransportError::new("unexpected response variant for Delete")),
        }
    }

    async fn describe(&self) -> Result<DescribeResponse, TransportError> {
        match self.call(Request::Describe).await? {
            Response::Describe { key_count } => Ok(DescribeResponse { key_count }),
            _ => Err(TransportError::new("unexpected response variant for Describe")),
        }
    }
}

/// Shared helper so `kvring-server` doesn't need its own quinn/rustls glue:
/// builds a client `Arc<dyn NodeTransport>` for `addr`.
pub fn connect(addr: SocketAddr, server_name: impl Into<String>) -> Result<Arc<dyn NodeTransport>, TransportError> {
    Ok(Arc::new(RemoteTransport::new(addr, server_name)?))
}
