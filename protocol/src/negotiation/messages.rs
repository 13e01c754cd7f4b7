//! # Negotiation Messages
//!
//! Payloads exchanged with the counterpart. Outbound messages are built
//! from a [`TransactionContext`](super::TransactionContext) and immutable
//! once sent; inbound messages are untrusted until verified.
//!
//! ```text
//!   Sender                                   Receiver
//!     │  Invitation (inputs, change, X_S, R_S) │
//!     ├───────────────────────────────────────►│
//!     │  TxInitCompleted (X_R, R_R, s_R)       │
//!     │◄───────────────────────────────────────┤
//!     │  Confirmation (s_S)                    │
//!     ├───────────────────────────────────────►│
//!     │  OutputConfirmation                    │
//!     ├───────────────────────────────────────►│
//!     │  TxOutputConfirmCompleted              │
//!     │◄───────────────────────────────────────┤
//! ```
//!
//! `TxFailed` may arrive at any point. Points and scalars travel as hex of
//! their canonical compressed encoding; whole messages are framed with
//! [`encode`] / [`decode`] (bincode).

use std::fmt;

use ark_ed_on_bn254::{EdwardsAffine, Fr};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::NegotiationError;
use crate::transaction::{Input, Output};

/// The sender's opening message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    /// Negotiation id.
    pub tx_id: Uuid,
    /// Protocol version string.
    pub version: String,
    /// Payment amount (excluding fee).
    pub amount: u64,
    /// Input commitments, in selection order.
    pub inputs: Vec<Input>,
    /// The sender's outputs (the change output) with range proofs.
    pub outputs: Vec<Output>,
    /// Kernel fee.
    pub fee: u64,
    /// Kernel lower height bound.
    pub min_height: u64,
    /// Kernel upper height bound.
    pub max_height: u64,
    /// Kernel message hash both parties sign.
    pub message: [u8; 32],
    /// Sender public blinding excess `X_S`.
    #[serde(with = "crate::crypto::encoding")]
    pub public_excess: EdwardsAffine,
    /// Sender public nonce `R_S`.
    #[serde(with = "crate::crypto::encoding")]
    pub public_nonce: EdwardsAffine,
}

/// The receiver's reply to an invitation, carrying its half of the signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInitCompleted {
    /// Negotiation id.
    pub tx_id: Uuid,
    /// Receiver public blinding excess `X_R`.
    #[serde(with = "crate::crypto::encoding")]
    pub public_excess: EdwardsAffine,
    /// Receiver public nonce `R_R`.
    #[serde(with = "crate::crypto::encoding")]
    pub public_nonce: EdwardsAffine,
    /// Receiver partial signature `s_R`.
    #[serde(with = "crate::crypto::encoding")]
    pub partial_signature: Fr,
}

/// The sender's partial signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    /// Negotiation id.
    pub tx_id: Uuid,
    /// Sender partial signature `s_S`.
    #[serde(with = "crate::crypto::encoding")]
    pub partial_signature: Fr,
}

/// Request to confirm the sender's change output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfirmation {
    /// Negotiation id.
    pub tx_id: Uuid,
}

/// Final acknowledgement from the network side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutputConfirmCompleted {
    /// Negotiation id.
    pub tx_id: Uuid,
}

/// Why the counterpart or transport gave up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// The receiver declined the payment.
    Cancelled,
    /// No reply arrived in time.
    Timeout,
    /// The message could not be delivered.
    NetworkFailure,
    /// The receiver rejected the invitation's contents.
    InvalidInvitation,
    /// Anything else, as reported.
    Other(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("cancelled"),
            Self::Timeout => f.write_str("timeout"),
            Self::NetworkFailure => f.write_str("network failure"),
            Self::InvalidInvitation => f.write_str("invalid invitation"),
            Self::Other(reason) => f.write_str(reason),
        }
    }
}

/// Abort notice, valid at any stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxFailed {
    /// Negotiation id.
    pub tx_id: Uuid,
    /// Reason code.
    pub reason: FailureReason,
}

/// Everything the sender can receive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InboundMessage {
    /// Receiver's signature share.
    TxInitCompleted(TxInitCompleted),
    /// Final acknowledgement.
    TxOutputConfirmCompleted(TxOutputConfirmCompleted),
    /// Abort.
    TxFailed(TxFailed),
}

impl InboundMessage {
    /// The negotiation this message claims to belong to.
    pub fn tx_id(&self) -> Uuid {
        match self {
            Self::TxInitCompleted(m) => m.tx_id,
            Self::TxOutputConfirmCompleted(m) => m.tx_id,
            Self::TxFailed(m) => m.tx_id,
        }
    }
}

/// Serialize a message for the wire.
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, NegotiationError> {
    Ok(bincode::serialize(message)?)
}

/// Deserialize a message from the wire. Curve points are subgroup-checked.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, NegotiationError> {
    Ok(bincode::deserialize(bytes)?)
}
