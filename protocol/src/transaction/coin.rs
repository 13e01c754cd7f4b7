//! # Coins
//!
//! A [`Coin`] is a spendable unit of value owned by this wallet: an amount,
//! the secret blinding key that hides it, and a lifecycle status.
//!
//! ```text
//!   Unconfirmed ──confirm──► Unspent ──lock──► Locked ──spend──► Spent
//!                               ▲                 │
//!                               └────release──────┘
//! ```
//!
//! The negotiation engine only drives `Locked → Spent`, `Locked → Unspent`
//! (on failure) and `Unconfirmed → Unspent` (change activation). Locking is
//! the keychain's job, done atomically with selection.

use std::fmt;

use ark_ed_on_bn254::Fr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::secret::SecretScalar;
use crate::zkp::commitment::{commit, Commitment, PedersenParams};

/// Keychain-assigned identity of a coin. Derived from the key index, so two
/// coins never share an id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CoinId(pub u64);

impl fmt::Display for CoinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "coin#{}", self.0)
    }
}

/// Lifecycle status of a coin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoinStatus {
    /// Created by a negotiation in flight; not yet on the ledger.
    Unconfirmed,
    /// Confirmed and available for selection.
    Unspent,
    /// Reserved by exactly one negotiation.
    Locked,
    /// Consumed by a completed transaction.
    Spent,
}

/// An illegal status change was requested.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{coin}: cannot move from {from:?} to {to:?}")]
pub struct CoinTransitionError {
    /// The coin concerned.
    pub coin: CoinId,
    /// Status before the attempted change.
    pub from: CoinStatus,
    /// Requested status.
    pub to: CoinStatus,
}

/// A coin owned by this wallet.
///
/// Cloning copies the key into a fresh [`SecretScalar`], so every copy
/// wipes its key when dropped.
pub struct Coin {
    /// Keychain identity.
    pub id: CoinId,
    /// Value in the smallest unit.
    pub amount: u64,
    /// Secret blinding key. Never logged, never transmitted.
    key: SecretScalar,
    /// Block height the coin was created at.
    pub height: u64,
    /// Whether the coin is a coinbase output.
    pub coinbase: bool,
    /// Current lifecycle status.
    pub status: CoinStatus,
}

impl Coin {
    /// Create a coin record.
    pub fn new(
        id: CoinId,
        key: Fr,
        amount: u64,
        status: CoinStatus,
        height: u64,
        coinbase: bool,
    ) -> Self {
        Self {
            id,
            amount,
            key: SecretScalar::new(key),
            height,
            coinbase,
            status,
        }
    }

    /// The secret blinding key.
    pub fn key(&self) -> &Fr {
        self.key.expose()
    }

    /// Public Pedersen commitment `amount * G + key * H`.
    pub fn commitment(&self, params: &PedersenParams) -> Commitment {
        commit(params, self.amount, *self.key.expose())
    }

    /// Whether the coin may be selected by a new negotiation.
    pub fn is_available(&self) -> bool {
        self.status == CoinStatus::Unspent
    }

    /// `Unspent → Locked`.
    pub fn lock(&mut self) -> Result<(), CoinTransitionError> {
        self.transition(CoinStatus::Unspent, CoinStatus::Locked)
    }

    /// `Locked → Unspent`.
    pub fn release(&mut self) -> Result<(), CoinTransitionError> {
        self.transition(CoinStatus::Locked, CoinStatus::Unspent)
    }

    /// `Locked → Spent`.
    pub fn spend(&mut self) -> Result<(), CoinTransitionError> {
        self.transition(CoinStatus::Locked, CoinStatus::Spent)
    }

    /// `Unconfirmed → Unspent`.
    pub fn confirm(&mut self) -> Result<(), CoinTransitionError> {
        self.transition(CoinStatus::Unconfirmed, CoinStatus::Unspent)
    }

    fn transition(&mut self, from: CoinStatus, to: CoinStatus) -> Result<(), CoinTransitionError> {
        if self.status != from {
            return Err(CoinTransitionError {
                coin: self.id,
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

impl Clone for Coin {
    fn clone(&self) -> Self {
        Self::new(
            self.id,
            *self.key.expose(),
            self.amount,
            self.status,
            self.height,
            self.coinbase,
        )
    }
}

impl PartialEq for Coin {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.amount == other.amount
            && self.key.expose() == other.key.expose()
            && self.height == other.height
            && self.coinbase == other.coinbase
            && self.status == other.status
    }
}

impl Eq for Coin {}

impl fmt::Debug for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coin")
            .field("id", &self.id)
            .field("amount", &self.amount)
            .field("key", &"<redacted>")
            .field("height", &self.height)
            .field("coinbase", &self.coinbase)
            .field("status", &self.status)
            .finish()
    }
}
