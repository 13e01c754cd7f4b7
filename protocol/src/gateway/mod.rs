//! # Gateway
//!
//! The outbound side of the message transport. Sends are fire-and-forget:
//! the engine hands a payload to the gateway and returns to waiting. A lost
//! or undeliverable message surfaces later as an inbound `TxFailed` event,
//! never as a return value here.
//!
//! Retry and timeout policy live behind this trait, not in the engine.

pub mod channel;

pub use channel::{ChannelGateway, OutboundMessage};

use crate::negotiation::messages::{Confirmation, Invitation, OutputConfirmation};

/// Asynchronous, at-most-once delivery to the counterpart.
pub trait Gateway: Send + Sync {
    /// Deliver the sender's invitation.
    fn send_invitation(&self, invitation: Invitation);

    /// Deliver the sender's partial signature.
    fn send_confirmation(&self, confirmation: Confirmation);

    /// Ask the counterpart to confirm the change output.
    fn send_output_confirmation(&self, confirmation: OutputConfirmation);
}
