//! End-to-end quorum scenarios, using in-process storage nodes so the
//! tests exercise the real durability path without any network.

use async_trait::async_trait;
use kvring_coordinator::Coordinator;
use kvring_core::transport::{
    DeleteResponse, DescribeResponse, GetResponse, NodeTransport, PutResponse, TransportError,
};
use kvring_core::{Error, NodeId, Ring};
use kvring_storage::StorageNode;
use kvring_transport::LocalTransport;
use std::sync::Arc;
use tempfile::tempdir;

fn local_node(dir: &tempfile::TempDir, name: &str) -> Arc<StorageNode> {
    Arc::new(StorageNode::open(name, dir.path()).unwrap())
}

/// A transport that always fails writes, used to exercise the
/// "quorum write failure" scenario.
struct AlwaysFailsTransport;

#[async_trait]
impl NodeTransport for AlwaysFailsTransport {
    async fn put(&self, _key: &str, _value: &[u8]) -> Result<PutResponse, TransportError> {
        Ok(PutResponse { success: false })
    }
    async fn get(&self, _key: &str) -> Result<GetResponse, TransportError> {
        Ok(GetResponse { value: None, found: false })
    }
    async fn delete(&self, _key: &str) -> Result<DeleteResponse, TransportError> {
        Ok(DeleteResponse { success: false })
    }
    async fn describe(&self) -> Result<DescribeResponse, TransportError> {
        Ok(DescribeResponse { key_count: 0 })
    }
}

#[tokio::test]
async fn quorum_write_then_read_happy_path() {
    // Literal spec scenario: 3 in-process nodes, N=3, W=2.
    let dir = tempdir().unwrap();
    let ring = Ring::new(3);
    for name in ["n1", "n2", "n3"] {
        ring.add_node(NodeId::from(name), Arc::new(LocalTransport::new(local_node(&dir, name)))).unwrap();
    }
    let coordinator = Coordinator::new(ring);

    coordinator.put("Mahmut", b"Ozer".to_vec(), 2).await.unwrap();

    let values = coordinator.get("Mahmut", 2).await.unwrap();
    assert!(values.len() >= 2);
    for value in values.values() {
        assert_eq!(value, b"Ozer");
    }
}

#[tokio::test]
async fn quorum_write_failure_then_relaxed_quorum_succeeds() {
    let dir = tempdir().unwrap();
    let ring = Ring::new(3);
    ring.add_node(NodeId::from("n1"), Arc::new(LocalTransport::new(local_node(&dir, "n1")))).unwrap();
    ring.add_node(NodeId::from("n2"), Arc::new(LocalTransport::new(local_node(&dir, "n2")))).unwrap();
    ring.add_node(NodeId::from("n3"), Arc::new(AlwaysFailsTransport)).unwrap();
    let coordinator = Coordinator::new(ring);

    let err = coordinator.put("k", b"v".to_vec(), 3).await.unwrap_err();
    assert!(matches!(err, Error::QuorumWriteFailed { w: 3, n: 3 }));

    coordinator.put("k", b"v".to_vec(), 2).await.unwrap();
}

#[tokio::test]
async fn insufficient_replicas_rejected_before_dispatch() {
    let dir = tempdir().unwrap();
    let ring = Ring::new(3);
    ring.add_node(NodeId::from("n1"), Arc::new(LocalTransport::new(local_node(&dir, "n1")))).unwrap();
    let coordinator = Coordinator::new(ring);

    let err = coordinator.put("k", b"v".to_vec(), 2).await.unwrap_err();
    assert!(matches!(err, Error::InsufficientReplicas { requested: 2, available: 1 }));
}

#[tokio::test]
async fn delete_is_idempotent_and_then_not_found() {
    let dir = tempdir().unwrap();
    let ring = Ring::new(2);
    for name in ["n1", "n2"] {
        ring.add_node(NodeId::from(name), Arc::new(LocalTransport::new(local_node(&dir, name)))).unwrap();
    }
    let coordinator = Coordinator::new(ring);

    coordinator.put("k", b"v".to_vec(), 2).await.unwrap();
    coordinator.delete("k", 2).await.unwrap();
    coordinator.delete("k", 2).await.unwrap();

    let err = coordinator.get("k", 2).await.unwrap_err();
    assert!(matches!(err, Error::NotFoundAtAnyReplica));
}

#[tokio::test]
async fn get_result_values_are_all_reported_found_by_some_replica() {
    let dir = tempdir().unwrap();
    let ring = Ring::new(3);
    for name in ["n1", "n2", "n3"] {
        ring.add_node(NodeId::from(name), Arc::new(LocalTransport::new(local_node(&dir, name)))).unwrap();
    }
    let coordinator = Coordinator::new(ring);

    coordinator.put("k", b"v".to_vec(), 3).await.unwrap();
    let values = coordinator.get("k", 2).await.unwrap();
    assert!(!values.is_empty());
    for v in values.values() {
        assert_eq!(v, b"v");
    }
}
