//! # Transactions
//!
//! The data a negotiation builds: the wallet's [`Coin`]s, the [`Input`] and
//! [`Output`] records that reference them on the wire, and the [`Kernel`]
//! both parties sign.

pub mod coin;
pub mod kernel;
pub mod types;

pub use coin::{Coin, CoinId, CoinStatus, CoinTransitionError};
pub use kernel::Kernel;
pub use types::{Input, Output};
