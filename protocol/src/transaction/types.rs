//! Transaction inputs and outputs as they appear on the wire.
//!
//! Neither carries an amount or a key: an input is a reference to a coin's
//! public commitment, an output is a fresh commitment plus the range proof
//! that keeps its hidden value honest.

use ark_ed_on_bn254::EdwardsAffine;
use serde::{Deserialize, Serialize};

use super::coin::Coin;
use crate::zkp::commitment::{Commitment, PedersenParams};
use crate::zkp::prover::RangeProof;

/// A reference to a coin being spent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    /// EC commitment of the spent coin.
    #[serde(with = "crate::crypto::encoding")]
    pub commitment: EdwardsAffine,
    /// Height the spent coin was created at.
    pub height: u64,
    /// Whether the spent coin is a coinbase output.
    pub coinbase: bool,
}

impl Input {
    /// Build the input reference for a locked coin.
    pub fn from_coin(coin: &Coin, params: &PedersenParams) -> Self {
        Self {
            commitment: coin.commitment(params).point,
            height: coin.height,
            coinbase: coin.coinbase,
        }
    }
}

/// A newly created output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    /// Pedersen commitment (EC point and scalar form).
    #[serde(with = "crate::crypto::encoding")]
    pub commitment: Commitment,
    /// Proof that the committed value is a non-negative u64.
    pub range_proof: RangeProof,
    /// Always `false` for negotiated outputs.
    pub coinbase: bool,
}
