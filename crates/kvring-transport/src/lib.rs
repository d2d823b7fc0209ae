//! `NodeTransport` implementations: in-process `Local` and QUIC-framed
//! `Remote`, plus the server-side plumbing `kvring-server` builds on.

pub mod local;
pub mod remote;
pub mod server;
pub mod tls;
pub mod wire;

pub use local::LocalTransport;
pub use remote::RemoteTransport;
