//! # Range Proof Generation
//!
//! [`RangeProver::setup`] generates the circuit-specific Groth16 keys for
//! one set of Pedersen parameters and hands back both halves; the sender
//! keeps the prover, the receiver needs the verifier. A [`RangeProof`] is
//! the compressed proof, a few hundred bytes, carried next to the output
//! commitment it covers.

use anyhow::{ensure, Context, Result};
use ark_bn254::Bn254;
use ark_ed_on_bn254::Fr;
use ark_groth16::{Groth16, Proof, ProvingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use ark_std::rand::{CryptoRng, Rng};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use super::circuit::RangeProofCircuit;
use super::commitment::{Commitment, PedersenParams};
use super::verifier::RangeVerifier;

/// Proving half of the range-proof setup. Immutable; share behind an `Arc`.
pub struct RangeProver {
    pk: ProvingKey<Bn254>,
    // Generators are circuit constants; the key is tied to them.
    params: PedersenParams,
}

impl RangeProver {
    /// Local key generation. A deployment would take its keys from a
    /// multi-party ceremony instead.
    ///
    /// # Panics
    ///
    /// If the range circuit cannot be synthesized, which is a bug.
    pub fn setup<R: Rng + CryptoRng>(params: PedersenParams, rng: &mut R) -> (Self, RangeVerifier) {
        let shape = RangeProofCircuit::for_setup(&params);
        let (pk, vk) = Groth16::<Bn254>::circuit_specific_setup(shape, rng)
            .expect("range circuit synthesizes without an assignment");

        let verifier = RangeVerifier::from_vk(vk, params.clone());
        (Self { pk, params }, verifier)
    }

    pub fn pedersen_params(&self) -> &PedersenParams {
        &self.params
    }

    /// Prove that `commitment` opens to `value` under `blinding` and that
    /// `value >= floor`.
    ///
    /// An out-of-range value is refused here rather than handed to the
    /// prover, which would panic on the unsatisfied witness.
    pub fn prove(
        &self,
        value: u64,
        blinding: Fr,
        floor: u64,
        commitment: &Commitment,
    ) -> Result<RangeProof> {
        ensure!(value >= floor, "value {value} is below the range floor {floor}");

        let circuit = RangeProofCircuit::new(&self.params, value, blinding, commitment, floor);
        let proof = Groth16::<Bn254>::prove(&self.pk, circuit, &mut OsRng)
            .context("range proof generation failed")?;
        RangeProof::encode(&proof)
    }
}

/// A compressed Groth16 range proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeProof {
    bytes: Vec<u8>,
}

impl RangeProof {
    fn encode(proof: &Proof<Bn254>) -> Result<Self> {
        let mut bytes = Vec::with_capacity(proof.compressed_size());
        proof
            .serialize_compressed(&mut bytes)
            .context("range proof encoding failed")?;
        Ok(Self { bytes })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    /// Accepts only bytes that decode to a well-formed proof.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let proof = Proof::<Bn254>::deserialize_compressed(data).context("malformed range proof")?;
        Self::encode(&proof)
    }

    pub(crate) fn to_ark_proof(&self) -> Result<Proof<Bn254>> {
        Proof::<Bn254>::deserialize_compressed(self.bytes.as_slice())
            .context("malformed range proof")
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zkp::commitment::commit;
    use crate::zkp::test_proof_system;

    #[test]
    fn change_proof_is_compact() {
        let system = test_proof_system();
        let blinding = Fr::from(77u64);
        let c = commit(system.params(), 40, blinding);

        let proof = system.prover().prove(40, blinding, 0, &c).unwrap();
        assert!((100..400).contains(&proof.size()), "size {}", proof.size());
    }

    #[test]
    fn value_below_floor_is_refused() {
        let system = test_proof_system();
        let blinding = Fr::from(77u64);
        let c = commit(system.params(), 10, blinding);

        let err = system.prover().prove(10, blinding, 100, &c).unwrap_err();
        assert!(err.to_string().contains("below the range floor"));
    }

    #[test]
    fn bytes_survive_a_decode() {
        let system = test_proof_system();
        let blinding = Fr::from(5u64);
        let c = commit(system.params(), 0, blinding);
        let proof = system.prover().prove(0, blinding, 0, &c).unwrap();

        assert_eq!(RangeProof::from_bytes(&proof.to_bytes()).unwrap(), proof);
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(RangeProof::from_bytes(&[0xAB; 17]).is_err());
    }
}
