//! Error types shared across the kvring crates.

use std::fmt;

/// Result type alias used throughout kvring.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur anywhere in the kvring subsystem.
///
/// This mirrors the `ErrorKind` taxonomy in the specification: ring errors,
/// quorum errors, and the opaque `Transport`/`Recovery` wrappers that let a
/// lower layer's failure bubble up without the caller needing to know which
/// layer produced it.
#[derive(Debug, Clone)]
pub enum Error {
    /// `Ring::AddNode` called with an identity already present.
    AlreadyExists(String),
    /// A node was used before the ring/coordinator was constructed with any members.
    NotInitialized,
    /// The requested quorum (R or W) exceeds the number of nodes in the ring.
    InsufficientReplicas { requested: usize, available: usize },
    /// `SuccessorsFor` returned zero replicas for a key.
    NoReplicas,
    /// Replicas responded but fewer than `R` reported `found = true`.
    QuorumReadFailed { r: usize, n: usize },
    /// Replicas responded but fewer than `W` succeeded.
    QuorumWriteFailed { w: usize, n: usize },
    /// Every replica responded and all reported `found = false`.
    NotFoundAtAnyReplica,
    /// An underlying RPC/IO error, opaque to the caller.
    Transport(String),
    /// Write-ahead log replay encountered a malformed record; fatal on node boot.
    Recovery(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::AlreadyExists(id) => write!(f, "node already exists: {id}"),
            Error::NotInitialized => write!(f, "ring used before initialization"),
            Error::InsufficientReplicas { requested, available } => write!(
                f,
                "insufficient replicas: requested {requested}, only {available} node(s) available"
            ),
            Error::NoReplicas => write!(f, "no replicas found for key"),
            Error::QuorumReadFailed { r, n } => {
                write!(f, "quorum read failed: needed R={r} of N={n}")
            }
            Error::QuorumWriteFailed { w, n } => {
                write!(f, "quorum write failed: needed W={w} of N={n}")
            }
            Error::NotFoundAtAnyReplica => write!(f, "key not found at any replica"),
            Error::Transport(msg) => write!(f, "transport error: {msg}"),
            Error::Recovery(msg) => write!(f, "log recovery failed: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<crate::transport::TransportError> for Error {
    fn from(err: crate::transport::TransportError) -> Self {
        Error::Transport(err.0)
    }
}
