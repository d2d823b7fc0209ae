//! In-process `NodeTransport`: directly delegates to a `StorageNode` in the
//! same address space. Used for single-process deployments and tests where
//! the network hop would only add noise.

use async_trait::async_trait;
use kvring_core::transport::{
    DeleteResponse, DescribeResponse, GetResponse, NodeTransport, PutResponse, TransportError,
};
use kvring_storage::StorageNode;
use std::sync::Arc;

pub struct LocalTransport {
    node: Arc<StorageNode>,
}

impl LocalTransport {
    pub fn new(node: Arc<StorageNode>) -> Self {
        Self { node }
    }
}

#[async_trait]
impl NodeTransport for LocalTransport {
    async fn put(&self, key: &str, value: &[u8]) -> Result<PutResponse, TransportError> {
        match self.node.put(key, value) {
            Ok(()) => Ok(PutResponse { success: true }),
            Err(e) => Err(TransportError::new(e.to_string())),
        }
    }

    async fn get(&self, key: &str) -> Result<GetResponse, TransportError> {
        let (value, found) = self.node.get(key);
        Ok(GetResponse { value, found })
    }

    async fn delete(&self, key: &str) -> Result<DeleteResponse, TransportError> {
        match self.node.delete(key) {
            Ok(()) => Ok(DeleteResponse { success: true }),
            Err(e) => Err(TransportError::new(e.to_string())),
        }
    }

    async fn describe(&self) -> Result<DescribeResponse, TransportError> {
        Ok(DescribeResponse { key_count: self.node.len() })
    }
}
