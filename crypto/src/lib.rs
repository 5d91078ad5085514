//! Cryptographic primitives for EHR share agreements.
//!
//! - **Ed25519** for endorsing transitions and checking endorsements
//! - **Blake2b-256** for transition ids and attachment references

pub mod hash;
pub mod keys;
pub mod sign;

pub use hash::{blake2b_256, blake2b_256_multi, hash_attachment, hash_transition};
pub use keys::{generate_keypair, keypair_from_name, keypair_from_private, keypair_from_seed, public_from_private};
pub use sign::{sign_message, verify_signature};
