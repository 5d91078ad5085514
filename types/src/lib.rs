//! Fundamental types for EHR share agreements.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! the agreement state model and its versions, parties, keys, transition ids,
//! attachment references and timestamps.

pub mod agreement;
pub mod error;
pub mod hash;
pub mod keys;
pub mod party;
pub mod time;

pub use agreement::{Agreement, AgreementId, AgreementStatus, Role, StateAndRef, StateRef};
pub use error::TypesError;
pub use hash::{AttachmentRef, TransitionId};
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use party::{Party, PartyName};
pub use time::{Clock, SystemClock, Timestamp};
