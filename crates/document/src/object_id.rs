//! Record identifiers
//!
//! Identifiers are generated on the writer side, so a store can hand one back
//! to the caller as soon as the insert completes.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, TimeZone, Utc};
use hex::FromHexError;
use rand::Rng;

/// Errors produced when parsing an identifier from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectIdError {
    /// Input was not exactly 24 characters long
    #[error("Invalid object id length: expected 24 hex characters, got {0}")]
    InvalidLength(usize),

    /// Input contained a non-hex character
    #[error("Invalid object id character {0:?}")]
    InvalidCharacter(char),
}

/// Random bytes fixed for the lifetime of the process
static PROCESS_UNIQUE: LazyLock<[u8; 5]> = LazyLock::new(|| rand::rng().random());

static COUNTER: LazyLock<AtomicU32> =
    LazyLock::new(|| AtomicU32::new(rand::rng().random::<u32>() & 0x00ff_ffff));

/// A 12-byte record identifier.
///
/// Layout: 4-byte big-endian seconds since the epoch, 5 process-unique bytes,
/// 3-byte wrapping counter. The text form is 24 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or_default();
        let count = COUNTER.fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        Self(bytes)
    }

    /// Build an identifier from raw bytes
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Raw bytes of this identifier
    pub const fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Creation time encoded in the first four bytes
    pub fn timestamp(&self) -> DateTime<Utc> {
        let secs = u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]);
        Utc.timestamp_opt(i64::from(secs), 0)
            .single()
            .unwrap_or_default()
    }

    /// Lowercase hex form
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 24 {
            return Err(ObjectIdError::InvalidLength(s.len()));
        }

        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| match e {
            FromHexError::InvalidHexCharacter { c, .. } => ObjectIdError::InvalidCharacter(c),
            FromHexError::OddLength | FromHexError::InvalidStringLength => {
                ObjectIdError::InvalidLength(s.len())
            }
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_within_process() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
        assert_eq!(a.bytes()[4..9], b.bytes()[4..9]);
    }

    #[test]
    fn test_hex_parse() {
        let id: ObjectId = "5f1e2d3c4b5a69788796a5b4".parse().unwrap();
        assert_eq!(id.to_string(), "5f1e2d3c4b5a69788796a5b4");
        assert_eq!(id.timestamp().timestamp(), 0x5f1e2d3c);

        let fresh = ObjectId::new();
        assert_eq!(fresh.to_hex().len(), 24);
        assert_eq!(fresh.to_hex().parse::<ObjectId>(), Ok(fresh));
        assert_eq!(fresh.to_hex().to_uppercase().parse::<ObjectId>(), Ok(fresh));
    }

    #[test]
    fn test_invalid_hex() {
        assert_eq!(
            "abc".parse::<ObjectId>(),
            Err(ObjectIdError::InvalidLength(3))
        );
        assert_eq!(
            "zz1e2d3c4b5a69788796a5b4".parse::<ObjectId>(),
            Err(ObjectIdError::InvalidCharacter('z'))
        );
        // 24 bytes but not 24 characters
        assert!("é1e2d3c4b5a69788796a5b4".parse::<ObjectId>().is_err());
    }

    #[test]
    fn test_timestamp_is_recent() {
        let id = ObjectId::new();
        let age = Utc::now() - id.timestamp();
        assert!(age.num_seconds() < 60);
    }
}
