//! Blake2b hashing for transition ids and attachment references.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use ehr_types::{AttachmentRef, TransitionId};

type Blake2b256 = Blake2b<U32>;

/// Domain separators so a transition and an attachment with identical bytes
/// never share an id.
const TRANSITION_DOMAIN: &[u8] = b"ehr/transition/v1";
const ATTACHMENT_DOMAIN: &[u8] = b"ehr/attachment/v1";

/// 256-bit Blake2b digest of `data`.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    blake2b_256_multi(&[data])
}

/// Digest of several slices hashed in sequence, without concatenating them.
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// Id of a transition from its canonical encoding.
pub fn hash_transition(encoded: &[u8]) -> TransitionId {
    TransitionId::new(blake2b_256_multi(&[TRANSITION_DOMAIN, encoded]))
}

/// Content reference of an attachment.
pub fn hash_attachment(content: &[u8]) -> AttachmentRef {
    AttachmentRef::new(blake2b_256_multi(&[ATTACHMENT_DOMAIN, content]))
}
