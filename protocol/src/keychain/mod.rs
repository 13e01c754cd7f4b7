//! # Keychain
//!
//! The coin store a negotiation draws from. The engine never touches
//! storage directly; everything goes through the [`Keychain`] trait so a
//! wallet can back it with whatever durable store it likes.
//!
//! ## Contract
//!
//! - [`Keychain::select_coins`] picks coins covering an amount and locks
//!   them in the same atomic step. Two concurrent negotiations must never
//!   receive the same coin. If the available coins cannot cover the amount,
//!   nothing is locked and `InsufficientFunds` is returned.
//! - [`Keychain::derive_blinding_factor`] never returns a previously issued
//!   secret. The derivation index doubles as the new coin's id.
//! - [`Keychain::store`] makes an unconfirmed change coin durable before any
//!   message references it.
//! - [`Keychain::persist`] writes the final coin set of a completed
//!   negotiation. Called exactly once per success.
//! - [`Keychain::release`] / [`Keychain::discard`] undo a failed
//!   negotiation's locks and its unconfirmed change coin.

pub mod memory;

pub use memory::MemoryKeychain;

use thiserror::Error;

use crate::crypto::secret::SecretScalar;
use crate::transaction::{Coin, CoinId, CoinTransitionError};

/// Errors raised by a keychain.
#[derive(Debug, Error)]
pub enum KeychainError {
    /// No combination of available coins reaches the requested amount.
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Amount requested.
        required: u64,
        /// Sum of all currently available coins.
        available: u64,
    },

    /// The coin is not known to this keychain.
    #[error("unknown coin: {0}")]
    UnknownCoin(CoinId),

    /// The coin exists but its status forbids the operation.
    #[error(transparent)]
    CoinNotAvailable(#[from] CoinTransitionError),

    /// The durable store rejected a write.
    #[error("storage failure: {0}")]
    Storage(String),
}

/// A freshly derived blinding factor together with the coin id it names.
#[derive(Debug)]
pub struct DerivedKey {
    /// Id for the coin this key will blind.
    pub id: CoinId,
    /// The secret blinding factor.
    pub key: SecretScalar,
}

/// Durable storage of owned coins plus key derivation.
pub trait Keychain: Send + Sync {
    /// Select and lock coins whose amounts sum to at least `amount`.
    /// Every returned coin has status `Locked`.
    fn select_coins(&self, amount: u64) -> Result<Vec<Coin>, KeychainError>;

    /// Derive a never-before-issued blinding factor.
    fn derive_blinding_factor(&self) -> Result<DerivedKey, KeychainError>;

    /// Durably store a single new coin.
    fn store(&self, coin: &Coin) -> Result<(), KeychainError>;

    /// Durably write the final state of a set of coins.
    fn persist(&self, coins: &[Coin]) -> Result<(), KeychainError>;

    /// Return locked coins to `Unspent`.
    fn release(&self, coins: &[CoinId]) -> Result<(), KeychainError>;

    /// Forget an unconfirmed coin that will never reach the ledger.
    fn discard(&self, coin: CoinId) -> Result<(), KeychainError>;
}
