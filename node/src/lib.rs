//! EHR agreement node — one party's view of the share-agreement network.
//!
//! The node wires a party's identity and key to the flow services and is
//! the caller-facing surface:
//! - Starts create, request, approve, activate, suspend, reject, share and
//!   delete flows
//! - Answers other parties' flows through its responder
//! - Answers queries over the agreements its vault holds
//! - Stores and fetches attachment content
//! - Collects notices, metrics and structured logs

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod shutdown;

pub use config::NodeConfig;
pub use error::NodeError;
pub use events::{EventBus, Inbox, Notice};
pub use logging::{init_logging, LogFormat};
pub use metrics::NodeMetrics;
pub use node::{AgreementNode, NodeServices, NodeStatus};
pub use shutdown::{until_shutdown, ShutdownController};
