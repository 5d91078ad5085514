//! Nullable infrastructure for deterministic testing.
//!
//! Inspired by the "A-frame architecture" pattern from RsNano.
//! Every external collaborator of a flow (clock, identity directory, session
//! transport, notices, attachment storage, agreement storage) sits behind a
//! trait. This crate provides implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically (unreachable or silent parties,
//!   failing notices)
//! - Never touch the filesystem or a real network
//!
//! Usage: swap real implementations for nullables in tests and devnets.

pub mod attachments;
pub mod clock;
pub mod directory;
pub mod network;
pub mod notifier;
pub mod store;

pub use attachments::NullAttachments;
pub use clock::NullClock;
pub use directory::NullDirectory;
pub use network::{NullEndpoint, NullNetwork, SentMessage};
pub use notifier::NullNotifier;
pub use store::NullStore;
