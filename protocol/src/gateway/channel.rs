//! A [`Gateway`] that pushes outbound messages onto a tokio channel.
//!
//! The receiving half belongs to whatever carries messages to the
//! counterpart (a socket writer, an in-process receiver in tests). If that
//! half has been dropped, sends are logged and discarded; the transport's
//! own timeout will raise `TxFailed` for the negotiation.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::Gateway;
use crate::negotiation::messages::{Confirmation, Invitation, OutputConfirmation};

/// Everything the sender can put on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboundMessage {
    /// Step 1: the invitation.
    Invitation(Invitation),
    /// Step 2: the sender's partial signature.
    Confirmation(Confirmation),
    /// Step 3: change-output confirmation request.
    OutputConfirmation(OutputConfirmation),
}

impl OutboundMessage {
    /// The negotiation this message belongs to.
    pub fn tx_id(&self) -> Uuid {
        match self {
            Self::Invitation(m) => m.tx_id,
            Self::Confirmation(m) => m.tx_id,
            Self::OutputConfirmation(m) => m.tx_id,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Invitation(_) => "invitation",
            Self::Confirmation(_) => "confirmation",
            Self::OutputConfirmation(_) => "output_confirmation",
        }
    }
}

/// Channel-backed gateway.
#[derive(Clone)]
pub struct ChannelGateway {
    outbound: mpsc::UnboundedSender<OutboundMessage>,
}

impl ChannelGateway {
    /// Create a gateway and the receiver its messages arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        (Self { outbound }, rx)
    }

    fn push(&self, message: OutboundMessage) {
        let tx_id = message.tx_id();
        let kind = message.kind();
        match self.outbound.send(message) {
            Ok(()) => debug!(tx_id = %tx_id, kind, "message handed to transport"),
            Err(_) => warn!(tx_id = %tx_id, kind, "transport closed, message dropped"),
        }
    }
}

impl Gateway for ChannelGateway {
    fn send_invitation(&self, invitation: Invitation) {
        self.push(OutboundMessage::Invitation(invitation));
    }

    fn send_confirmation(&self, confirmation: Confirmation) {
        self.push(OutboundMessage::Confirmation(confirmation));
    }

    fn send_output_confirmation(&self, confirmation: OutputConfirmation) {
        self.push(OutboundMessage::OutputConfirmation(confirmation));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_arrive_in_send_order() {
        let (gateway, mut rx) = ChannelGateway::new();
        let tx_id = Uuid::new_v4();

        gateway.send_output_confirmation(OutputConfirmation { tx_id });
        gateway.send_output_confirmation(OutputConfirmation { tx_id });

        assert_eq!(rx.try_recv().unwrap().tx_id(), tx_id);
        assert!(matches!(
            rx.try_recv().unwrap(),
            OutboundMessage::OutputConfirmation(_)
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_transport_does_not_panic() {
        let (gateway, rx) = ChannelGateway::new();
        drop(rx);
        gateway.send_output_confirmation(OutputConfirmation {
            tx_id: Uuid::new_v4(),
        });
    }
}
