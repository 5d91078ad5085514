//! Finality for agreement transitions.
//!
//! The [`FinalityService`] is the sole arbiter of ordering: at most one
//! transition consuming a given agreement version is ever accepted.
//! [`LedgerNotary`] is the reference implementation over the `ehr-store`
//! traits.

pub mod error;
pub mod finality;
pub mod notary;

pub use error::{CommitError, Conflict};
pub use finality::{CommitReceipt, FinalityService};
pub use notary::{LedgerNotary, LedgerSummary};
