//! # Transaction Context
//!
//! The working state of one negotiation, owned by exactly one
//! [`SenderNegotiation`](super::SenderNegotiation) and never shared.
//!
//! ## Blinding arithmetic
//!
//! Inputs contribute their keys with a positive sign, outputs with a
//! negative one:
//!
//! ```text
//!   x_S = Σ r_in − r_change              blinding excess
//!   X_S = x_S · H                        public blinding excess
//!   Σ C_in − C_change − amount·G == X_S  balance identity (fee 0)
//! ```
//!
//! The receiver adds `amount·G + r_R·H` and contributes `X_R = −r_R·H`, so
//! the full transaction balances against `X_S + X_R`, which is exactly the
//! key the aggregate kernel signature verifies under.
//!
//! ## Secrets
//!
//! `blinding_excess` and `nonce` are moved in at construction and never
//! leave. The nonce is an `Option` that cosigning `take`s, so a second
//! signature attempt fails with `NonceConsumed` instead of leaking the key.

use ark_ed_on_bn254::EdwardsAffine;
use tracing::debug;
use uuid::Uuid;

use super::error::NegotiationError;
use super::messages::{Confirmation, Invitation, TxInitCompleted};
use crate::config::{self, NegotiationConfig};
use crate::crypto::schnorr;
use crate::crypto::secret::{SecretNonce, SecretScalar};
use crate::keychain::DerivedKey;
use crate::transaction::{Coin, CoinId, CoinStatus, Input, Kernel, Output};
use crate::zkp::{commit, ProofSystem};

/// What the caller asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Amount to pay, excluding fee.
    pub amount: u64,
    /// Current chain height, recorded on the change coin.
    pub height: u64,
}

/// Everything the keychain hands over before the invitation is built.
#[derive(Debug)]
pub struct Funding {
    /// Negotiation id.
    pub tx_id: Uuid,
    /// The payment request.
    pub request: PaymentRequest,
    /// Selected coins, already `Locked`.
    pub coins: Vec<Coin>,
    /// Fresh key for the change output.
    pub change_key: DerivedKey,
}

impl Funding {
    /// Ids of the selected coins.
    pub fn coin_ids(&self) -> Vec<CoinId> {
        self.coins.iter().map(|c| c.id).collect()
    }
}

/// Per-negotiation state.
#[derive(Debug)]
pub struct TransactionContext {
    /// Correlates every message of this negotiation.
    pub tx_id: Uuid,
    /// Requested payment amount.
    pub amount: u64,
    /// Coins funding the payment, in selection order.
    pub selected_coins: Vec<Coin>,
    /// The change coin. Always present for negotiations started by this
    /// engine, possibly with amount zero.
    pub change_coin: Option<Coin>,
    /// The kernel both parties sign.
    pub kernel: Kernel,
    /// Input references, parallel to `selected_coins`.
    pub inputs: Vec<Input>,
    /// Outputs created by the sender.
    pub outputs: Vec<Output>,
    /// `X_S = x_S · H`.
    pub public_excess: EdwardsAffine,
    /// `R_S = k_S · H`.
    pub public_nonce: EdwardsAffine,
    blinding_excess: SecretScalar,
    nonce: Option<SecretNonce>,
    generator: EdwardsAffine,
}

impl TransactionContext {
    /// Build the context from locked funding (initTx steps 3, 4, 6 and 7).
    ///
    /// Pure apart from randomness: no keychain or gateway call happens here.
    pub fn prepare(
        funding: Funding,
        config: &NegotiationConfig,
        proofs: &ProofSystem,
    ) -> Result<Self, NegotiationError> {
        let Funding {
            tx_id,
            request,
            coins,
            change_key,
        } = funding;

        if request.amount == 0 {
            return Err(NegotiationError::ZeroAmount);
        }

        let params = proofs.params();
        let generator = *params.blinding_generator();

        let mut blinding_excess = SecretScalar::zero();
        let mut inputs = Vec::with_capacity(coins.len());
        let mut total: u64 = 0;
        for coin in &coins {
            if coin.status != CoinStatus::Locked {
                return Err(NegotiationError::CoinState(format!(
                    "{} is {:?}, expected Locked",
                    coin.id, coin.status
                )));
            }
            total = total
                .checked_add(coin.amount)
                .ok_or_else(|| NegotiationError::CoinState("input total overflows".into()))?;
            inputs.push(Input::from_coin(coin, params));
            blinding_excess += coin.key();
        }

        let change = total
            .checked_sub(request.amount)
            .ok_or(NegotiationError::InsufficientFunds {
                required: request.amount,
                available: total,
            })?;

        let change_coin = Coin::new(
            change_key.id,
            *change_key.key.expose(),
            change,
            CoinStatus::Unconfirmed,
            request.height,
            false,
        );
        let commitment = commit(params, change, *change_key.key.expose());
        let range_proof = proofs.prover().prove(
            change,
            *change_key.key.expose(),
            config::CHANGE_RANGE_FLOOR,
            &commitment,
        )?;
        if !proofs
            .verifier()
            .verify(&range_proof, &commitment, config::CHANGE_RANGE_FLOOR)?
        {
            return Err(NegotiationError::RangeProof(
                "change proof does not verify under the shared key".into(),
            ));
        }
        blinding_excess -= change_key.key.expose();

        let outputs = vec![Output {
            commitment,
            range_proof,
            coinbase: false,
        }];

        let nonce = SecretNonce::generate();
        let public_excess = blinding_excess.public(&generator);
        let public_nonce = nonce.public(&generator);

        debug!(
            tx_id = %tx_id,
            amount = request.amount,
            inputs = inputs.len(),
            change,
            "transaction context prepared"
        );

        Ok(Self {
            tx_id,
            amount: request.amount,
            selected_coins: coins,
            change_coin: Some(change_coin),
            kernel: Kernel::from_config(config),
            inputs,
            outputs,
            public_excess,
            public_nonce,
            blinding_excess,
            nonce: Some(nonce),
            generator,
        })
    }

    /// The invitation payload.
    pub fn invitation(&self) -> Invitation {
        Invitation {
            tx_id: self.tx_id,
            version: config::PROTOCOL_VERSION.to_string(),
            amount: self.amount,
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            fee: self.kernel.fee,
            min_height: self.kernel.min_height,
            max_height: self.kernel.max_height,
            message: self.kernel.message(),
            public_excess: self.public_excess,
            public_nonce: self.public_nonce,
        }
    }

    /// Ids of the selected coins.
    pub fn input_ids(&self) -> Vec<CoinId> {
        self.selected_coins.iter().map(|c| c.id).collect()
    }

    /// Whether the counterpart's partial signature verifies against its own
    /// public nonce and excess, under the challenge both sides derive.
    pub fn is_valid_signature(&self, share: &TxInitCompleted) -> bool {
        let nonce_sum = schnorr::combine(&self.public_nonce, &share.public_nonce);
        let e = schnorr::challenge(&nonce_sum, &self.kernel.message());
        schnorr::verify_partial(
            &self.generator,
            &share.public_nonce,
            &share.public_excess,
            &e,
            &share.partial_signature,
        )
    }

    /// Negation of [`Self::is_valid_signature`].
    pub fn is_invalid_signature(&self, share: &TxInitCompleted) -> bool {
        !self.is_valid_signature(share)
    }

    /// `x_S · H == X_S`.
    pub fn blinding_excess_matches(&self) -> bool {
        self.blinding_excess.public(&self.generator) == self.public_excess
    }

    /// Whether the nonce is still available to sign.
    pub fn has_nonce(&self) -> bool {
        self.nonce.is_some()
    }

    /// Produce the sender's partial signature, consuming the nonce, and
    /// finalize the kernel with the aggregate signature and excess.
    ///
    /// The caller must already have checked the share with
    /// [`Self::is_valid_signature`].
    pub fn confirm(&mut self, share: &TxInitCompleted) -> Result<Confirmation, NegotiationError> {
        let nonce = self.nonce.take().ok_or(NegotiationError::NonceConsumed)?;

        let nonce_sum = schnorr::combine(&self.public_nonce, &share.public_nonce);
        let e = schnorr::challenge(&nonce_sum, &self.kernel.message());
        let partial = schnorr::cosign(nonce, &self.blinding_excess, &e);

        let signature = schnorr::aggregate(nonce_sum, &[partial, share.partial_signature]);
        let excess = schnorr::combine(&self.public_excess, &share.public_excess);
        self.kernel.finalize(excess, signature);

        if !self.kernel.is_signed_by_excess(&self.generator) {
            return Err(NegotiationError::InvalidCounterpartSignature);
        }

        Ok(Confirmation {
            tx_id: self.tx_id,
            partial_signature: partial,
        })
    }

    /// Mark inputs spent and the change coin unspent; returns the full coin
    /// set to persist.
    pub fn complete(&mut self) -> Result<Vec<Coin>, NegotiationError> {
        let mut settled = self.selected_coins.clone();
        for coin in &mut settled {
            coin.spend()?;
        }
        if let Some(change) = &self.change_coin {
            let mut change = change.clone();
            change.confirm()?;
            settled.push(change);
        }

        self.selected_coins = settled[..self.selected_coins.len()].to_vec();
        if self.change_coin.is_some() {
            self.change_coin = settled.last().cloned();
        }
        Ok(settled)
    }
}
