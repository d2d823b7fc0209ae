//! Consistent hash ring: the virtual-node map `Coordinator` routes through.
//!
//! # Virtual nodes
//!
//! Each physical node contributes [`VIRTUAL_SPOTS`] positions to the ring,
//! synthesized as `hash(node_id + "#" + i)` for `i in 0..VIRTUAL_SPOTS`.
//! More positions per node means smoother key distribution, at the cost of
//! `O(VIRTUAL_SPOTS)` extra entries per node in the sorted position table.
//!
//! # Thread safety
//!
//! `positions` is a single `parking_lot::RwLock<Vec<(u64, NodeId)>>`:
//! `SuccessorsFor` takes a shared read lock, `AddNode` takes the exclusive
//! write lock for its entire critical section (generate positions, merge,
//! re-sort). The `nodes` map is a `DashMap` so `ClientFor` never blocks on
//! the positions lock at all.

use crate::error::{Error, Result};
use crate::hash::hash_key;
use crate::node::NodeId;
use crate::transport::NodeTransport;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

/// Number of virtual positions each physical node contributes to the ring.
pub const VIRTUAL_SPOTS: usize = 100;

struct RingState {
    /// Sorted ascending by position. Never shrinks in this version of the
    /// ring — removal is supported for operator tooling but is not part of
    /// the automatic coordinator path (no dynamic rebalancing, per the
    /// specification's Non-goals).
    positions: Vec<(u64, NodeId)>,
}

/// The consistent-hash virtual-node map.
///
/// Pure in-memory structure over node identities and their transports.
/// Cheap to clone: internally it's two `Arc`s, so handing a `Ring` to every
/// worker task is the idiomatic way to share it.
#[derive(Clone)]
pub struct Ring {
    state: Arc<RwLock<RingState>>,
    nodes: Arc<DashMap<NodeId, Arc<dyn NodeTransport>>>,
    replication_factor: usize,
}

impl Ring {
    /// Creates an empty ring with a fixed replication factor.
    ///
    /// `replication_factor` is the `N` the rest of the specification refers
    /// to: the number of successive distinct physical nodes that host each
    /// key. It never changes for the lifetime of this `Ring`.
    pub fn new(replication_factor: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(RingState { positions: Vec::new() })),
            nodes: Arc::new(DashMap::new()),
            replication_factor,
        }
    }

    pub fn replication_factor(&self) -> usize {
        self.replication_factor
    }

    /// Number of distinct physical nodes currently in the ring.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Registers a new physical node, generating its [`VIRTUAL_SPOTS`]
    /// virtual positions.
    ///
    /// Uses a two-phase check (shared read, then exclusive write with a
    /// re-check) so that two concurrent `AddNode(same_id, ..)` calls can't
    /// both slip past the presence check and double-register a node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyExists`] if `id` is already registered.
    pub fn add_node(&self, id: NodeId, transport: Arc<dyn NodeTransport>) -> Result<()> {
        // Phase 1: optimistic read-lock check to fail fast on the common
        // "definitely not present" case without taking the write lock.
        if self.nodes.contains_key(&id) {
            return Err(Error::AlreadyExists(id.to_string()));
        }

        let mut state = self.state.write();

        // Phase 2: re-check under the lock we're about to mutate under.
        // `self.nodes` is a separate map from `positions`, so the
        // authoritative "already registered" check is against `positions`
        // membership, decided while holding the write lock.
        if state.positions.iter().any(|(_, nid)| nid == &id) {
            return Err(Error::AlreadyExists(id.to_string()));
        }

        let mut new_positions = Vec::with_capacity(VIRTUAL_SPOTS);
        for i in 0..VIRTUAL_SPOTS {
            let vnode_key = format!("{id}#{i}");
            let position = hash_key(vnode_key.as_bytes());
            // Collision with an existing position: skip this single spot
            // but still record the node via the remaining spots. An
            // astronomically unlikely event with a 64-bit hash and a
            // handful of nodes.
            if state.positions.iter().any(|(p, _)| *p == position)
                || new_positions.iter().any(|(p, _)| *p == position)
            {
                continue;
            }
            new_positions.push((position, id.clone()));
        }

        state.positions.extend(new_positions);
        state.positions.sort_unstable_by_key(|(p, _)| *p);

        self.nodes.insert(id.clone(), transport);
        info!(node = %id, "added node to ring");
        Ok(())
    }

    /// Removes a physical node and all of its virtual positions.
    ///
    /// Not used by `Coordinator` or `NodeServer` — ring membership changes
    /// are operator-driven (see `kvring-cli`), never automatic, per the
    /// specification's "no dynamic ring rebalancing" Non-goal. Returns
    /// `true` if the node was present.
    pub fn remove_node(&self, id: &NodeId) -> bool {
        let mut state = self.state.write();
        let before = state.positions.len();
        state.positions.retain(|(_, nid)| nid != id);
        let removed = state.positions.len() != before;
        if removed {
            self.nodes.remove(id);
            info!(node = %id, "removed node from ring");
        }
        removed
    }

    /// Computes the distinct physical nodes responsible for `key`, walking
    /// clockwise from the first position at or after `hash(key)`.
    ///
    /// Returns at most `min(k, node_count())` identities, with no
    /// duplicates, deterministic for a fixed ring snapshot (§8 properties
    /// 1–3).
    pub fn successors_for(&self, key: &[u8], k: usize) -> Vec<NodeId> {
        let state = self.state.read();
        if state.positions.is_empty() || k == 0 {
            return Vec::new();
        }

        let h = hash_key(key);
        // Smallest position >= h; wrap to index 0 if none (partition_point
        // returns positions.len() in that case).
        let start = state
            .positions
            .partition_point(|(p, _)| *p < h);
        let start = if start == state.positions.len() { 0 } else { start };

        let mut result = Vec::with_capacity(k);
        let len = state.positions.len();
        for i in 0..len {
            let idx = (start + i) % len;
            let (_, node_id) = &state.positions[idx];
            if !result.contains(node_id) {
                result.push(node_id.clone());
                if result.len() == k {
                    break;
                }
            }
        }
        result
    }

    /// Fetches the transport handle for a given node identity, if present.
    pub fn client_for(&self, node_id: &NodeId) -> Option<Arc<dyn NodeTransport>> {
        self.nodes.get(node_id).map(|entry| entry.value().clone())
    }

    /// Snapshot of all registered node identities (unordered).
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|entry| entry.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{DeleteResponse, DescribeResponse, GetResponse, PutResponse, TransportError};
    use async_trait::async_trait;

    struct NoopTransport;

    #[async_trait]
    impl NodeTransport for NoopTransport {
        async fn put(&self, _key: &str, _value: &[u8]) -> Result<PutResponse, TransportError> {
            Ok(PutResponse { success: true })
        }
        async fn get(&self, _key: &str) -> Result<GetResponse, TransportError> {
            Ok(GetResponse { value: None, found: false })
        }
        async fn delete(&self, _key: &str) -> Result<DeleteResponse, TransportError> {
            Ok(DeleteResponse { success: true })
        }
        async fn describe(&self) -> Result<DescribeResponse, TransportError> {
            Ok(DescribeResponse { key_count: 0 })
        }
    }

    fn ring_with(names: &[&str]) -> Ring {
        let ring = Ring::new(3);
        for name in names {
            ring.add_node(NodeId::from(*name), Arc::new(NoopTransport)).unwrap();
        }
        ring
    }

    #[test]
    fn empty_ring_has_no_successors() {
        let ring = Ring::new(3);
        assert!(ring.successors_for(b"key", 3).is_empty());
    }

    #[test]
    fn add_node_rejects_duplicates() {
        let ring = ring_with(&["n1"]);
        let err = ring.add_node(NodeId::from("n1"), Arc::new(NoopTransport)).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[test]
    fn successors_are_distinct_and_saturated() {
        let ring = ring_with(&["n1", "n2", "n3"]);
        let successors = ring.successors_for(b"Mahmut", 3);
        assert_eq!(successors.len(), 3);
        let unique: std::collections::HashSet<_> = successors.iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn successors_saturate_at_node_count() {
        let ring = ring_with(&["n1", "n2"]);
        // asking for more replicas than exist should return only the nodes present
        assert_eq!(ring.successors_for(b"key", 5).len(), 2);
    }

    #[test]
    fn successors_are_deterministic_regardless_of_insertion_order() {
        let ring_a = ring_with(&["n1", "n2", "n3"]);
        let ring_b = ring_with(&["n3", "n1", "n2"]);

        for key in [&b"Mahmut"[..], b"Ozer", b"key-3"] {
            let mut a = ring_a.successors_for(key, 3);
            let mut b = ring_b.successors_for(key, 3);
            a.sort();
            b.sort();
            assert_eq!(a, b, "insertion order must not affect placement for key {key:?}");
        }
    }

    #[test]
    fn remove_node_drops_its_positions() {
        let ring = ring_with(&["n1", "n2"]);
        assert!(ring.remove_node(&NodeId::from("n1")));
        assert_eq!(ring.node_count(), 1);
        assert!(ring.successors_for(b"key", 5).iter().all(|id| id.as_str() == "n2"));
    }
}
