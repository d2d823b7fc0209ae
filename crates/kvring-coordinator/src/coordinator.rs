//! `Coordinator`: the quorum dispatcher layered on `Ring`.
//!
//! Executes `Put`/`Get`/`Delete` against the `N` replicas for a key,
//! waiting only for the caller's requested `W`/`R` successes before
//! returning — the remaining in-flight replica tasks are best-effort and
//! never influence the result (§4.4 step 6).

use crate::strategy::{ReplicationStrategy, RingStrategy};
use kvring_core::{Error, NodeId, Result, Ring};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// The quorum dispatcher.
///
/// Cheap to clone (wraps an `Arc<dyn ReplicationStrategy>` and a `Ring`,
/// itself already `Clone`).
#[derive(Clone)]
pub struct Coordinator {
    ring: Ring,
    strategy: Arc<dyn ReplicationStrategy>,
}

impl Coordinator {
    pub fn new(ring: Ring) -> Self {
        Self::with_strategy(ring, Arc::new(RingStrategy))
    }

    pub fn with_strategy(ring: Ring, strategy: Arc<dyn ReplicationStrategy>) -> Self {
        Self { ring, strategy }
    }

    fn replicas_for(&self, key: &[u8], quorum: usize) -> Result<Vec<NodeId>> {
        let available = self.ring.node_count();
        if available < quorum {
            return Err(Error::InsufficientReplicas { requested: quorum, available });
        }
        let replicas = self.strategy.replicas_for_key(&self.ring, key);
        if replicas.is_empty() {
            return Err(Error::NoReplicas);
        }
        Ok(replicas)
    }

    /// Writes `key = value` to `W` of the key's `N` replicas.
    pub async fn put(&self, key: &str, value: Vec<u8>, w: usize) -> Result<()> {
        self.put_cancellable(key, value, w, CancellationToken::new()).await
    }

    pub async fn put_cancellable(
        &self,
        key: &str,
        value: Vec<u8>,
        w: usize,
        cancel: CancellationToken,
    ) -> Result<()> {
        let replicas = self.replicas_for(key.as_bytes(), w)?;
        let n = self.ring.replication_factor();

        let (tx, mut rx) = tokio::sync::mpsc::channel::<bool>(replicas.len());
        for node_id in &replicas {
            let Some(transport) = self.ring.client_for(node_id) else { continue };
            let tx = tx.clone();
            let key = key.to_string();
            let value = value.clone();
            let node_id = node_id.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let outcome = tokio::select! {
                    _ = cancel.cancelled() => false,
                    res = transport.put(&key, &value) => match res {
                        Ok(resp) => resp.success,
                        Err(e) => {
                            warn!(node = %node_id, error = %e, "put failed at replica");
                            false
                        }
                    },
                };
                let _ = tx.send(outcome).await;
            });
        }
        drop(tx);

        let mut successes = 0usize;
        let mut failures = 0usize;
        let total = replicas.len();
        while let Some(ok) = rx.recv().await {
            if ok {
                successes += 1;
            } else {
                failures += 1;
            }
            if successes == w {
                return Ok(());
            }
            if successes + failures == total && successes < w {
                return Err(Error::QuorumWriteFailed { w, n });
            }
        }
        Err(Error::QuorumWriteFailed { w, n })
    }

    /// Deletes `key` from `W` of its `N` replicas. Idempotent at the
    /// storage layer (§4.3); repeated calls both succeed.
    pub async fn delete(&self, key: &str, w: usize) -> Result<()> {
        self.delete_cancellable(key, w, CancellationToken::new()).await
    }

    pub async fn delete_cancellable(&self, key: &str, w: usize, cancel: CancellationToken) -> Result<()> {
        let replicas = self.replicas_for(key.as_bytes(), w)?;
        let n = self.ring.replication_factor();

        let (tx, mut rx) = tokio::sync::mpsc::channel::<bool>(replicas.len());
        for node_id in &replicas {
            let Some(transport) = self.ring.client_for(node_id) else { continue };
            let tx = tx.clone();
            let key = key.to_string();
            let node_id = node_id.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let outcome = tokio::select! {
                    _ = cancel.cancelled() => false,
                    res = transport.delete(&key) => match res {
                        Ok(resp) => resp.success,
                        Err(e) => {
                            warn!(node = %node_id, error = %e, "delete failed at replica");
                            false
                        }
                    },
                };
                let _ = tx.send(outcome).await;
            });
        }
        drop(tx);

        let mut successes = 0usize;
        let mut failures = 0usize;
        let total = replicas.len();
        while let Some(ok) = rx.recv().await {
            if ok {
                successes += 1;
            } else {
                failures += 1;
            }
            if successes == w {
                return Ok(());
            }
            if successes + failures == total && successes < w {
                return Err(Error::QuorumWriteFailed { w, n });
            }
        }
        Err(Error::QuorumWriteFailed { w, n })
    }

    /// Reads `key` from `R` of its `N` replicas, returning every replying
    /// replica's value keyed by node identity.
    ///
    /// A replica reporting `found = false`, or a transport error, both
    /// count as a failure for quorum purposes (§4.4): only a replica that
    /// responds with `found = true` counts toward `R`.
    pub async fn get(&self, key: &str, r: usize) -> Result<HashMap<NodeId, Vec<u8>>> {
        self.get_cancellable(key, r, CancellationToken::new()).await
    }

    pub async fn get_cancellable(
        &self,
        key: &str,
        r: usize,
        cancel: CancellationToken,
    ) -> Result<HashMap<NodeId, Vec<u8>>> {
        let replicas = self.replicas_for(key.as_bytes(), r)?;
        let n = self.ring.replication_factor();

        type ReplicaResult = (NodeId, Option<Vec<u8>>);
        let (tx, mut rx) = tokio::sync::mpsc::channel::<ReplicaResult>(replicas.len());
        for node_id in &replicas {
            let Some(transport) = self.ring.client_for(node_id) else { continue };
            let tx = tx.clone();
            let key = key.to_string();
            let node_id = node_id.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let outcome = tokio::select! {
                    _ = cancel.cancelled() => None,
                    res = transport.get(&key) => match res {
                        Ok(resp) if resp.found => resp.value,
                        Ok(_) => None,
                        Err(e) => {
                            warn!(node = %node_id, error = %e, "get failed at replica");
                            None
                        }
                    },
                };
                let _ = tx.send((node_id, outcome)).await;
            });
        }
        drop(tx);

        let mut values: HashMap<NodeId, Vec<u8>> = HashMap::new();
        let mut successes = 0usize;
        let mut failures = 0usize;
        let total = replicas.len();
        while let Some((node_id, outcome)) = rx.recv().await {
            match outcome {
                Some(value) => {
                    values.insert(node_id, value);
                    successes += 1;
                }
                None => failures += 1,
            }
            if successes == r {
                return Ok(values);
            }
            if failures == total {
                return Err(Error::NotFoundAtAnyReplica);
            }
            if successes + failures == total && successes < r {
                return Err(Error::QuorumReadFailed { r, n });
            }
        }
        if successes >= r {
            Ok(values)
        } else {
            Err(Error::QuorumReadFailed { r, n })
        }
    }
}
