//! Durable single-replica storage for the kvring subsystem.

pub mod node;
pub mod wal;

pub use node::StorageNode;
