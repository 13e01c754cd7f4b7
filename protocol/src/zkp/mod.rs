//! # Commitments and Range Proofs
//!
//! Pedersen commitments on Baby Jubjub and a Groth16 range proof showing a
//! committed value is a non-negative u64 (at or above a public floor).
//!
//! The commitment scheme lives in [`commitment`], the R1CS statement in
//! [`circuit`], and the two halves of the Groth16 keys in [`prover`] and
//! [`verifier`].
//!
//! [`ProofSystem`] bundles the generators and both keys, which the two
//! negotiating parties must agree on.

pub mod circuit;
pub mod commitment;
pub mod prover;
pub mod verifier;

pub use circuit::RangeProofCircuit;
pub use commitment::{commit, Commitment, PedersenParams};
pub use prover::{RangeProof, RangeProver};
pub use verifier::RangeVerifier;

use ark_std::rand::{CryptoRng, Rng};

/// Shared cryptographic setup for a deployment.
///
/// Immutable after construction; share it behind an `Arc` across every
/// negotiation in the process.
pub struct ProofSystem {
    prover: RangeProver,
    verifier: RangeVerifier,
}

impl ProofSystem {
    /// Derive the Pedersen parameters and run the range-circuit setup.
    pub fn setup<R: Rng + CryptoRng>(rng: &mut R) -> Self {
        let (prover, verifier) = RangeProver::setup(PedersenParams::derive(), rng);
        Self { prover, verifier }
    }

    /// Commitment parameters (generators `G` and `H`).
    pub fn params(&self) -> &PedersenParams {
        self.prover.pedersen_params()
    }

    /// The range prover.
    pub fn prover(&self) -> &RangeProver {
        &self.prover
    }

    /// The range verifier.
    pub fn verifier(&self) -> &RangeVerifier {
        &self.verifier
    }
}

/// Process-wide setup for unit tests. Groth16 setup is slow; run it once.
#[cfg(test)]
pub(crate) fn test_proof_system() -> &'static ProofSystem {
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use std::sync::OnceLock;

    static SYSTEM: OnceLock<ProofSystem> = OnceLock::new();
    SYSTEM.get_or_init(|| ProofSystem::setup(&mut StdRng::seed_from_u64(7)))
}

/// A prover whose key the shared verifier does not accept.
#[cfg(test)]
pub(crate) fn mismatched_proof_system() -> &'static ProofSystem {
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use std::sync::OnceLock;

    static SYSTEM: OnceLock<ProofSystem> = OnceLock::new();
    SYSTEM.get_or_init(|| {
        let shared = test_proof_system().verifier();
        let (prover, _) = RangeProver::setup(PedersenParams::derive(), &mut StdRng::seed_from_u64(8));
        let vk = shared.vk_to_bytes().expect("verification key encodes");
        let verifier = RangeVerifier::vk_from_bytes(&vk, shared.pedersen_params().clone())
            .expect("verification key decodes");
        ProofSystem { prover, verifier }
    })
}
