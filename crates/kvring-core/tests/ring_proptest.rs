//! Property tests for the quantified ring invariants (determinism,
//! distinctness, saturation — independent of node insertion order).

use async_trait::async_trait;
use kvring_core::transport::{
    DeleteResponse, DescribeResponse, GetResponse, NodeTransport, PutResponse, TransportError,
};
use kvring_core::{NodeId, Ring};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

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

fn build_ring(node_names: &[String], replication_factor: usize) -> Ring {
    let ring = Ring::new(replication_factor);
    for name in node_names {
        ring.add_node(NodeId::from(name.as_str()), Arc::new(NoopTransport)).unwrap();
    }
    ring
}

proptest! {
    #[test]
    fn successors_are_order_independent(
        mut names in prop::collection::hash_set("[a-z]{3,8}", 1..8),
        key in "[a-zA-Z0-9]{1,16}",
        r in 1usize..6,
    ) {
        let names: Vec<String> = names.drain().collect();
        let forward = build_ring(&names, r);
        let mut shuffled = names.clone();
        shuffled.reverse();
        let backward = build_ring(&shuffled, r);

        prop_assert_eq!(
            forward.successors_for(key.as_bytes(), r),
            backward.successors_for(key.as_bytes(), r),
        );
    }

    #[test]
    fn successors_are_distinct_and_saturated(
        mut names in prop::collection::hash_set("[a-z]{3,8}", 1..8),
        key in "[a-zA-Z0-9]{1,16}",
        r in 1usize..6,
    ) {
        let names: Vec<String> = names.drain().collect();
        let ring = build_ring(&names, r);
        let replicas = ring.successors_for(key.as_bytes(), r);

        let distinct: HashSet<_> = replicas.iter().collect();
        prop_assert_eq!(distinct.len(), replicas.len());
        prop_assert_eq!(replicas.len(), r.min(names.len()));
    }
}
