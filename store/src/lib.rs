//! Storage traits for EHR share agreements.
//!
//! Every backend (the in-memory nullables, or a durable store) implements
//! these traits. The ledger and the flows depend only on the traits.

pub mod agreement;
pub mod error;
pub mod transition;

pub use agreement::{AgreementRecord, AgreementStore, VersionChange};
pub use error::StoreError;
pub use transition::TransitionStore;
