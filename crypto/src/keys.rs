//! Ed25519 key generation and derivation.

use crate::hash::blake2b_256_multi;
use ed25519_dalek::SigningKey;
use ehr_types::{KeyPair, PartyName, PrivateKey, PublicKey};
use rand::rngs::OsRng;

/// Generate a new key pair from the operating system's secure random source.
pub fn generate_keypair() -> KeyPair {
    let signing_key = SigningKey::generate(&mut OsRng);
    KeyPair {
        public: PublicKey(signing_key.verifying_key().to_bytes()),
        private: PrivateKey(signing_key.to_bytes()),
    }
}

/// Derive the public key of a private key.
pub fn public_from_private(private: &PrivateKey) -> PublicKey {
    let signing_key = SigningKey::from_bytes(&private.0);
    PublicKey(signing_key.verifying_key().to_bytes())
}

/// Rebuild a full key pair around a private key.
pub fn keypair_from_private(private: PrivateKey) -> KeyPair {
    let public = public_from_private(&private);
    KeyPair { public, private }
}

/// Deterministic key pair from a 32-byte seed.
pub fn keypair_from_seed(seed: &[u8; 32]) -> KeyPair {
    keypair_from_private(PrivateKey(*seed))
}

/// Deterministic key pair bound to a party name under a shared secret.
///
/// For local devnets and tests only: anyone holding `secret` can derive
/// every party's key.
pub fn keypair_from_name(secret: &[u8], name: &PartyName) -> KeyPair {
    let seed = blake2b_256_multi(&[b"ehr/devnet-key/v1", secret, name.as_str().as_bytes()]);
    keypair_from_seed(&seed)
}
