//! `NodeTransport`: the capability a `Ring` addresses its nodes through.
//!
//! Two implementations are expected outside this crate (see `kvring-transport`):
//! a `Local` transport that delegates directly to an in-process `StorageNode`
//! (used by tests and single-process deployments), and a `Remote` transport
//! that ships the request to a `NodeServer` over the network. `Ring` only
//! ever sees the trait object, so it is oblivious to which one it's talking to.

use async_trait::async_trait;
use std::fmt;

/// Opaque transport/RPC failure. Deliberately string-based: the caller
/// (`Coordinator`) only needs to know "this replica failed", not the
/// specific IO/codec error — that detail is logged at the transport layer.
#[derive(Debug, Clone)]
pub struct TransportError(pub String);

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TransportError {}

impl TransportError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Response to a `Put` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutResponse {
    pub success: bool,
}

/// Response to a `Delete` call. Deletes are idempotent (§4.3): deleting an
/// absent key still returns `success: true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Response to a `Get` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetResponse {
    pub value: Option<Vec<u8>>,
    pub found: bool,
}

/// Response to a `Describe` call: operator-facing introspection of a single
/// replica, surfaced by `kvring-cli`'s `describe` subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeResponse {
    pub key_count: usize,
}

/// The capability `Ring`/`Coordinator` use to reach a single replica,
/// in-process or over the network.
///
/// Implementations must be `Send + Sync` — the coordinator fans out one
/// task per replica (§4.4 step 4) and every task shares the same transport
/// handles via `Arc`.
#[async_trait]
pub trait NodeTransport: Send + Sync {
    async fn put(&self, key: &str, value: &[u8]) -> Result<PutResponse, TransportError>;
    async fn get(&self, key: &str) -> Result<GetResponse, TransportError>;
    async fn delete(&self, key: &str) -> Result<DeleteResponse, TransportError>;
    /// Reports this replica's live key count, via `StorageNode::len` (§3).
    /// Not part of the Put/Get/Delete quorum path — `kvring-cli describe`
    /// is its only caller.
    async fn describe(&self) -> Result<DescribeResponse, TransportError>;
}
