//! Quorum dispatcher layered on the consistent hash ring.

pub mod coordinator;
pub mod strategy;

pub use coordinator::Coordinator;
pub use strategy::{ReplicationStrategy, RingStrategy};
