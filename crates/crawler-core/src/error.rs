//! Error taxonomy for the crawler subsystem (§7).

use std::fmt;

pub type Result<T> = std::result::Result<T, ErrorKind>;

#[derive(Debug, Clone)]
pub enum ErrorKind {
    InvalidUrl(String),
    RobotsFetchFailed(String),
    Navigation(String),
    SnapshotFailed(String),
    DiskWriteFailed(String),
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidUrl(u) => write!(f, "invalid url: {u}"),
            ErrorKind::RobotsFetchFailed(msg) => write!(f, "robots.txt fetch failed: {msg}"),
            ErrorKind::Navigation(msg) => write!(f, "navigation failed: {msg}"),
            ErrorKind::SnapshotFailed(msg) => write!(f, "snapshot failed: {msg}"),
            ErrorKind::DiskWriteFailed(msg) => write!(f, "disk write failed: {msg}"),
            ErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::error::Error for ErrorKind {}
