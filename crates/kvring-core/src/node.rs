//! Node identity for the consistent hash ring.

use std::fmt;

/// Stable, durable identity for a physical node.
///
/// Plain `String` rather than a newtype over an integer: node identity in
/// this system is operator-assigned (it doubles as the write-ahead log's
/// filename stem, per §4.3), so it needs to be human-chosen, not generated.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

/// Logical node participating in the ring.
///
/// Kept intentionally small: the heavy mutable state (the transport handle,
/// the storage node itself) lives behind `Ring`'s `nodes` map, not here.
#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
}

impl Node {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self { id: id.into() }
    }
}
