//! Agreement transitions and the rules that decide whether they are legal.
//!
//! A [`Transition`] consumes at most one prior agreement version, produces at
//! most one new version, and declares an [`Intent`] plus the exact set of keys
//! that must endorse it. [`verify_transition`] is a pure function over the
//! transition alone: every participant, and the finality service, runs the
//! same check and reaches the same verdict.
//!
//! Intents:
//! - **Create**: origin custodian issues a `PENDING` agreement
//! - **Approve** / **Activate** / **Reject** / **Suspend**: subject moves the
//!   agreement to the named status
//! - **Share**: subject and target endorse an unchanged version
//! - **Delete**: participants retire the agreement

pub mod error;
pub mod intent;
pub mod signed;
pub mod transition;
pub mod validation;

pub use error::ContractError;
pub use intent::Intent;
pub use signed::{SignedTransition, TransitionSignature};
pub use transition::{Command, Transition};
pub use validation::verify_transition;
