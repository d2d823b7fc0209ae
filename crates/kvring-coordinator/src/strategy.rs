//! Replication strategy abstraction.
//!
//! A replication strategy decides which nodes hold the replicas for a key.
//! `Coordinator` is generic over this so alternate placement policies
//! (rack/datacenter-aware, etc.) can be swapped in without touching the
//! quorum dispatch logic. This specification only requires the ring's own
//! clockwise-successor placement, so [`RingStrategy`] is the only
//! implementation shipped here.

use kvring_core::{NodeId, Ring};

/// Decides which node identities hold the replicas for a key.
pub trait ReplicationStrategy: Send + Sync + 'static {
    /// Replicas for `key`, primary first. Length is at most
    /// `ring.replication_factor()`, deduplicated, deterministic for a fixed
    /// ring snapshot.
    fn replicas_for_key(&self, ring: &Ring, key: &[u8]) -> Vec<NodeId>;

    fn name(&self) -> &'static str;
}

/// Places replicas using the ring's own clockwise successor walk — the
/// only placement policy the specification defines (§4.2/§4.4).
#[derive(Debug, Clone, Default)]
pub struct RingStrategy;

impl ReplicationStrategy for RingStrategy {
    fn replicas_for_key(&self, ring: &Ring, key: &[u8]) -> Vec<NodeId> {
        ring.successors_for(key, ring.replication_factor())
    }

    fn name(&self) -> &'static str {
        "RingStrategy"
    }
}
