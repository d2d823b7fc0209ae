//! Write-ahead log record format.
//!
//! Line-oriented, UTF-8, one record per line:
//!
//! ```text
//! SET,<key>,<base64(value)>\n      -- upsert
//! DEL,<key>\n                      -- tombstone
//! ```
//!
//! Keys must not contain `,` or `\n` (values are arbitrary bytes, armored
//! with base64 so they can't break the line format).

use base64::Engine;
use kvring_core::{Error, Result};

/// A single decoded log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Set { key: String, value: Vec<u8> },
    Del { key: String },
}

const B64: base64::engine::general_purpose::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// Validates that a key can be safely written to the log.
pub fn validate_key(key: &str) -> Result<()> {
    if key.contains(',') || key.contains('\n') {
        return Err(Error::Recovery(format!(
            "key {key:?} contains a reserved character (',' or newline)"
        )));
    }
    Ok(())
}

/// Renders a `SET` record as a log line, including the trailing newline.
pub fn encode_set(key: &str, value: &[u8]) -> String {
    format!("SET,{key},{}\n", B64.encode(value))
}

/// Renders a `DEL` record as a log line, including the trailing newline.
pub fn encode_del(key: &str) -> String {
    format!("DEL,{key}\n")
}

/// Parses a single log line (without its trailing newline).
///
/// Any malformed line is a fatal recovery error: the log is truncated or
/// corrupted, and silently skipping it would let this replica diverge from
/// its peers.
pub fn parse_line(line: &str) -> Result<Record> {
    if let Some(rest) = line.strip_prefix("SET,") {
        let (key, encoded) = rest
            .split_once(',')
            .ok_or_else(|| Error::Recovery(format!("malformed SET record: {line:?}")))?;
        let value = B64
            .decode(encoded)
            .map_err(|e| Error::Recovery(format!("malformed base64 in SET record: {e}")))?;
        Ok(Record::Set { key: key.to_string(), value })
    } else if let Some(key) = line.strip_prefix("DEL,") {
        Ok(Record::Del { key: key.to_string() })
    } else {
        Err(Error::Recovery(format!("unrecognized record: {line:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_set() {
        let line = encode_set("a", b"hello");
        let parsed = parse_line(line.trim_end_matches('\n')).unwrap();
        assert_eq!(parsed, Record::Set { key: "a".into(), value: b"hello".to_vec() });
    }

    #[test]
    fn round_trips_del() {
        let line = encode_del("a");
        let parsed = parse_line(line.trim_end_matches('\n')).unwrap();
        assert_eq!(parsed, Record::Del { key: "a".into() });
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse_line("GARBAGE,a").is_err());
        assert!(parse_line("SET,onlykey").is_err());
        assert!(parse_line("SET,a,not-valid-base64!!!").is_err());
    }

    #[test]
    fn rejects_reserved_characters_in_keys() {
        assert!(validate_key("a,b").is_err());
        assert!(validate_key("a\nb").is_err());
        assert!(validate_key("plain").is_ok());
    }
}
