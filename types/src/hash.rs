//! 32-byte content identifiers: transition ids and attachment references.

use crate::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a transition: the Blake2b-256 digest of its canonical encoding.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransitionId([u8; 32]);

impl TransitionId {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransitionId({}\u{2026})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for TransitionId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_32(s, "transition id").map(Self)
    }
}

/// Opaque reference to externally stored attachment content.
///
/// The agreement only ever carries the reference; content lives in an
/// attachment store and is never inspected by the protocol.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachmentRef([u8; 32]);

impl AttachmentRef {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for AttachmentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttachmentRef({}\u{2026})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for AttachmentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for AttachmentRef {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_32(s, "attachment ref").map(Self)
    }
}

fn decode_32(s: &str, what: &'static str) -> Result<[u8; 32], TypesError> {
    let bytes = hex::decode(s.trim()).map_err(|e| TypesError::InvalidHex {
        what,
        reason: e.to_string(),
    })?;
    bytes.try_into().map_err(|b: Vec<u8>| TypesError::InvalidHex {
        what,
        reason: format!("expected 32 bytes, got {}", b.len()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_id_hex_roundtrip() {
        let id = TransitionId::new([0xab; 32]);
        let parsed: TransitionId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn short_hex_is_rejected() {
        let err = "abcd".parse::<AttachmentRef>().unwrap_err();
        assert!(matches!(err, TypesError::InvalidHex { what: "attachment ref", .. }));
    }

    #[test]
    fn non_hex_is_rejected() {
        assert!("zz".repeat(32).parse::<TransitionId>().is_err());
    }

    #[test]
    fn debug_is_abbreviated() {
        let id = TransitionId::new([0x01; 32]);
        assert_eq!(format!("{id:?}"), "TransitionId(01010101\u{2026})");
    }
}
