//! # Sender Negotiation
//!
//! The sender side of a two-party confidential payment. One
//! [`SenderNegotiation`] per payment: it funds the transaction from the
//! keychain, sends the invitation, verifies the receiver's signature share
//! before releasing its own, and settles coin state on the outcome.
//!
//! - **messages**: wire payloads and bincode framing.
//! - **context**: per-negotiation state and the blinding/signature arithmetic.
//! - **state**: states, events, effects and the pure transition function.
//! - **sender**: the driver that executes effects against the collaborators.
//! - **router**: `txId` routing for many concurrent negotiations.

pub mod context;
pub mod messages;
pub mod router;
pub mod sender;
pub mod state;

mod error;

pub use context::{Funding, PaymentRequest, TransactionContext};
pub use error::NegotiationError;
pub use messages::{
    decode, encode, Confirmation, FailureReason, InboundMessage, Invitation, OutputConfirmation,
    TxFailed, TxInitCompleted, TxOutputConfirmCompleted,
};
pub use router::NegotiationRouter;
pub use sender::{NegotiationOutcome, SenderNegotiation};
pub use state::{transition, Effect, Environment, Event, SenderState, Transition};
