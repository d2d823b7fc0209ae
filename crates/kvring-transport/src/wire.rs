//! Wire format for the `NodeTransport` RPC: 4-byte big-endian length prefix
//! followed by a `bincode`-serialized [`Request`]/[`Response`].
//!
//! The specification allows "any cross-process RPC with length-prefixed
//! binary messages"; this repository ships requests over `quinn` QUIC
//! streams rather than gRPC since the teacher crate this workspace is
//! descended from already depends on `quinn` for its streaming protocol.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum Request {
    Put { key: String, value: Vec<u8> },
    Get { key: String },
    Delete { key: String },
    Describe,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum Response {
    Put { success: bool },
    Get { value: Option<Vec<u8>>, found: bool },
    Delete { success: bool },
    Describe { key_count: usize },
}

/// Maximum frame size accepted on either side of the wire: guards against a
/// malformed or malicious length prefix driving an unbounded allocation.
pub const MAX_FRAME_BYTES: u32 = 64 * 1024 * 1024;

pub async fn write_frame<W: AsyncWrite + Unpin>(w: &mut W, bytes: &[u8]) -> std::io::Result<()> {
    let len = bytes.len() as u32;
    w.write_all(&len.to_be_bytes()).await?;
    w.write_all(bytes).await?;
    Ok(())
}

pub async fn read_frame<R: AsyncRead + Unpin>(r: &mut R) -> std::io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    r.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_BYTES {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("frame of {len} bytes exceeds maximum of {MAX_FRAME_BYTES}"),
        ));
    }
    let mut buf = vec![0u8; len as usize];
    r.read_exact(&mut buf).await?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn frame_round_trips_through_a_buffer() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"hello quorum").await.unwrap();

        let mut cursor = Cursor::new(buf);
        let read_back = read_frame(&mut cursor).await.unwrap();
        assert_eq!(read_back, b"hello quorum");
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected_before_allocating() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(MAX_FRAME_BYTES + 1).to_be_bytes());

        let mut cursor = Cursor::new(buf);
        let err = read_frame(&mut cursor).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn request_response_round_trip_via_bincode() {
        let request = Request::Put { key: "k".into(), value: b"v".to_vec() };
        let mut buf = Vec::new();
        write_frame(&mut buf, &bincode::serialize(&request).unwrap()).await.unwrap();

        let mut cursor = Cursor::new(buf);
        let payload = read_frame(&mut cursor).await.unwrap();
        let decoded: Request = bincode::deserialize(&payload).unwrap();
        match decoded {
            Request::Put { key, value } => {
                assert_eq!(key, "k");
                assert_eq!(value, b"v");
            }
            _ => panic!("unexpected variant"),
        }
    }
}
