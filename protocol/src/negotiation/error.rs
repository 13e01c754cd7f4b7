//! Error types for the sender negotiation.
//!
//! A [`NegotiationError`] plays two roles. Returned from a call, it means
//! the event was rejected and the negotiation did not move. Carried inside
//! `SenderState::Failed`, it is the cause the negotiation ended with.

use thiserror::Error;
use uuid::Uuid;

use super::messages::FailureReason;
use crate::keychain::KeychainError;
use crate::transaction::CoinTransitionError;

/// Errors that can occur while negotiating a payment.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NegotiationError {
    /// A payment of zero was requested.
    #[error("payment amount must be greater than zero")]
    ZeroAmount,

    /// The keychain cannot fund the payment.
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Amount requested.
        required: u64,
        /// Amount the keychain could offer.
        available: u64,
    },

    /// The counterpart's partial signature failed verification.
    #[error("counterpart partial signature is invalid")]
    InvalidCounterpartSignature,

    /// The counterpart or the transport aborted the negotiation.
    #[error("counterpart failed: {0}")]
    CounterpartFailed(FailureReason),

    /// An inbound message names a different negotiation.
    #[error("transaction id mismatch: expected {expected}, got {got}")]
    TxIdMismatch {
        /// The negotiation's own id.
        expected: Uuid,
        /// The id the message carried.
        got: Uuid,
    },

    /// The event is not valid in the current state.
    #[error("unexpected event: in {state}, received {event}")]
    InvalidState {
        /// The state the negotiation is in.
        state: &'static str,
        /// The event that was received.
        event: &'static str,
    },

    /// The single-use nonce has already signed.
    #[error("nonce already consumed")]
    NonceConsumed,

    /// The negotiation has no transaction context yet.
    #[error("negotiation has not started")]
    NotStarted,

    /// A coin was not in the status the operation requires.
    #[error("coin state: {0}")]
    CoinState(String),

    /// The keychain could not make coin state durable.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Range proof generation failed.
    #[error("range proof: {0}")]
    RangeProof(String),

    /// A message could not be encoded or decoded.
    #[error("encoding: {0}")]
    Encoding(String),

    /// The task driving the negotiation panicked or was cancelled.
    #[error("negotiation task aborted: {0}")]
    TaskAborted(String),
}

impl From<KeychainError> for NegotiationError {
    fn from(err: KeychainError) -> Self {
        match err {
            KeychainError::InsufficientFunds {
                required,
                available,
            } => Self::InsufficientFunds {
                required,
                available,
            },
            KeychainError::CoinNotAvailable(e) => Self::CoinState(e.to_string()),
            other => Self::Storage(other.to_string()),
        }
    }
}

impl From<CoinTransitionError> for NegotiationError {
    fn from(err: CoinTransitionError) -> Self {
        Self::CoinState(err.to_string())
    }
}

impl From<anyhow::Error> for NegotiationError {
    fn from(err: anyhow::Error) -> Self {
        Self::RangeProof(format!("{err:#}"))
    }
}

impl From<bincode::Error> for NegotiationError {
    fn from(err: bincode::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}
