//! Flow orchestrators for EHR share agreements.
//!
//! A flow builds a candidate transition, checks it against the contract,
//! signs it, collects the counterparties' signatures over sessions, submits
//! it for finality, and then tells the other participants. The [`Responder`]
//! is the counterparty side of every flow.
//!
//! Flows:
//! - [`CreateFlow`]: origin custodian issues a `PENDING` agreement
//!   (also the basis of the request flow, which distributes it)
//! - [`StatusFlow`]: subject approves, activates, rejects or suspends
//! - [`ShareFlow`]: subject and target endorse an `ACTIVE` agreement
//! - [`DeleteFlow`]: a participant and a counterparty retire the agreement

pub mod boundary;
pub mod context;
pub mod error;
pub mod event;
pub mod flows;
pub mod message;
pub mod notify;
pub mod pipeline;
pub mod responder;

pub use boundary::{
    AttachmentError, AttachmentStore, FlowSession, IdentityService, Notifier, SessionTransport,
    TransportError,
};
pub use context::{FlowContext, FlowServices};
pub use error::{CoordinationFailure, FlowError};
pub use event::{FlowEvent, FlowObserver};
pub use flows::{run_flow, CreateFlow, DeleteFlow, Flow, FlowOutcome, ShareFlow, StatusFlow};
pub use message::FlowMessage;
pub use notify::SessionNotifier;
pub use responder::Responder;
