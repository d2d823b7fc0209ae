//! Core library for the quorum-replicated consistent hash ring ("KVRing").
//!
//! This crate provides the fundamental abstractions shared by every other
//! `kvring-*` crate:
//! - [`hash`] — the frozen 64-bit hash used to place keys and virtual nodes.
//! - [`node`] — node identity.
//! - [`ring`] — the consistent-hash virtual-node map and successor lookup.
//! - [`transport`] — the `NodeTransport` capability `Ring` addresses nodes through.
//! - [`error`] — the shared error taxonomy.

pub mod error;
pub mod hash;
pub mod node;
pub mod ring;
pub mod transport;

pub use error::{Error, Result};
pub use hash::hash_key;
pub use node::{Node, NodeId};
pub use ring::Ring;
pub use transport::{DeleteResponse, GetResponse, NodeTransport, PutResponse, TransportError};
