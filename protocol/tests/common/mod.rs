//! Shared fixtures for the integration tests: a cached proof system, a
//! funded sender wired to a channel gateway, and an honest (or not)
//! receiver that cosigns invitations.

#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use ark_ec::CurveGroup;
use ark_ed_on_bn254::{EdwardsAffine, Fr};
use ark_ff::UniformRand;
use ark_std::rand::{rngs::StdRng, SeedableRng};
use rand::rngs::OsRng;
use tokio::sync::mpsc;

use cloak_protocol::config::NegotiationConfig;
use cloak_protocol::crypto::schnorr;
use cloak_protocol::gateway::{ChannelGateway, OutboundMessage};
use cloak_protocol::keychain::MemoryKeychain;
use cloak_protocol::negotiation::{
    Confirmation, Invitation, SenderNegotiation, TxInitCompleted,
};
use cloak_protocol::zkp::{commit, PedersenParams, ProofSystem};

/// Groth16 setup once per test binary.
pub fn proofs() -> Arc<ProofSystem> {
    static SYSTEM: OnceLock<Arc<ProofSystem>> = OnceLock::new();
    SYSTEM
        .get_or_init(|| Arc::new(ProofSystem::setup(&mut StdRng::seed_from_u64(2026))))
        .clone()
}

/// A wallet holding `amounts`, plus the receiving end of its gateway.
pub struct Sender {
    pub keychain: Arc<MemoryKeychain>,
    pub gateway: Arc<ChannelGateway>,
    pub outbound: mpsc::UnboundedReceiver<OutboundMessage>,
}

impl Sender {
    pub fn with_coins(amounts: &[u64]) -> Self {
        let keychain = Arc::new(MemoryKeychain::random());
        for amount in amounts {
            keychain.receive(*amount, 100, false);
        }
        let (gateway, outbound) = ChannelGateway::new();
        Self {
            keychain,
            gateway: Arc::new(gateway),
            outbound,
        }
    }

    /// A new negotiation drawing on this wallet.
    pub fn negotiation(&self) -> SenderNegotiation {
        SenderNegotiation::new(
            self.keychain.clone(),
            self.gateway.clone(),
            proofs(),
            NegotiationConfig::default(),
        )
    }

    /// Everything sent so far.
    pub fn sent(&mut self) -> Vec<OutboundMessage> {
        let mut sent = Vec::new();
        while let Ok(message) = self.outbound.try_recv() {
            sent.push(message);
        }
        sent
    }

    /// The next message, which must be an invitation.
    pub fn invitation(&mut self) -> Invitation {
        match self.outbound.try_recv() {
            Ok(OutboundMessage::Invitation(invitation)) => invitation,
            other => panic!("expected an invitation, got {other:?}"),
        }
    }
}

/// The counterpart. Owns one output of `amount` blinded by `blinding`, so
/// its excess is `-blinding`.
pub struct TestReceiver {
    blinding: Fr,
    nonce: Fr,
}

impl TestReceiver {
    pub fn new() -> Self {
        Self {
            blinding: Fr::rand(&mut OsRng),
            nonce: Fr::rand(&mut OsRng),
        }
    }

    fn excess(&self) -> Fr {
        -self.blinding
    }

    /// Commitment of the receiver's output for `amount`.
    pub fn output(&self, params: &PedersenParams, amount: u64) -> EdwardsAffine {
        commit(params, amount, self.blinding).point
    }

    /// An honest reply.
    pub fn respond(&self, params: &PedersenParams, invitation: &Invitation) -> TxInitCompleted {
        let advertised = (params.h * self.nonce).into_affine();
        self.sign(params, invitation, advertised, self.nonce)
    }

    /// Advertise one nonce, sign with another.
    pub fn respond_with_mismatched_nonce(
        &self,
        params: &PedersenParams,
        invitation: &Invitation,
    ) -> TxInitCompleted {
        let advertised = (params.h * self.nonce).into_affine();
        self.sign(params, invitation, advertised, Fr::rand(&mut OsRng))
    }

    fn sign(
        &self,
        params: &PedersenParams,
        invitation: &Invitation,
        advertised: EdwardsAffine,
        signing_nonce: Fr,
    ) -> TxInitCompleted {
        let nonce_sum = schnorr::combine(&invitation.public_nonce, &advertised);
        let e = schnorr::challenge(&nonce_sum, &invitation.message);
        TxInitCompleted {
            tx_id: invitation.tx_id,
            public_excess: (params.h * self.excess()).into_affine(),
            public_nonce: advertised,
            partial_signature: signing_nonce - e * self.excess(),
        }
    }
}

/// What the receiver checks on the sender's confirmation.
pub fn sender_share_verifies(
    params: &PedersenParams,
    invitation: &Invitation,
    share: &TxInitCompleted,
    confirmation: &Confirmation,
) -> bool {
    let nonce_sum = schnorr::combine(&invitation.public_nonce, &share.public_nonce);
    let e = schnorr::challenge(&nonce_sum, &invitation.message);
    schnorr::verify_partial(
        &params.h,
        &invitation.public_nonce,
        &invitation.public_excess,
        &e,
        &confirmation.partial_signature,
    )
}

/// A point no honest party produced.
pub fn random_point(params: &PedersenParams) -> EdwardsAffine {
    (params.h * Fr::rand(&mut OsRng)).into_affine()
}
