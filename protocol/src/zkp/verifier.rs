//! # Range Proof Verification
//!
//! The receiver checks every output's range proof before it cosigns; the
//! sender keeps a verifier to self-check its change output. The key is
//! prepared once at construction so each check is a single pairing
//! product.

use anyhow::{Context, Result};
use ark_bn254::Bn254;
use ark_groth16::{Groth16, PreparedVerifyingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use super::circuit;
use super::commitment::{Commitment, PedersenParams};
use super::prover::RangeProof;

/// Verification half of the range-proof setup.
pub struct RangeVerifier {
    prepared: PreparedVerifyingKey<Bn254>,
    params: PedersenParams,
}

impl RangeVerifier {
    pub(crate) fn from_vk(vk: VerifyingKey<Bn254>, params: PedersenParams) -> Self {
        Self {
            prepared: ark_groth16::prepare_verifying_key(&vk),
            params,
        }
    }

    pub fn pedersen_params(&self) -> &PedersenParams {
        &self.params
    }

    /// Does `proof` show that `commitment` opens to a value of at least `floor`?
    ///
    /// A proof that decodes but does not verify is `Ok(false)`. Undecodable
    /// bytes are an error.
    pub fn verify(&self, proof: &RangeProof, commitment: &Commitment, floor: u64) -> Result<bool> {
        let proof = proof.to_ark_proof()?;
        Groth16::<Bn254>::verify_proof(
            &self.prepared,
            &proof,
            &circuit::public_inputs(commitment, floor),
        )
        .context("range proof pairing check errored")
    }

    /// Compressed verification key, for handing to a counterpart.
    pub fn vk_to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.prepared
            .vk
            .serialize_compressed(&mut out)
            .context("verification key encoding failed")?;
        Ok(out)
    }

    pub fn vk_from_bytes(data: &[u8], params: PedersenParams) -> Result<Self> {
        let vk = VerifyingKey::<Bn254>::deserialize_compressed(data)
            .context("malformed verification key")?;
        Ok(Self::from_vk(vk, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zkp::commitment::commit;
    use crate::zkp::test_proof_system;
    use ark_ec::CurveGroup;
    use ark_ed_on_bn254::Fr;

    fn change_output(value: u64) -> (Commitment, RangeProof) {
        let system = test_proof_system();
        let blinding = Fr::from(0x5EEDu64 + value);
        let c = commit(system.params(), value, blinding);
        let proof = system.prover().prove(value, blinding, 0, &c).unwrap();
        (c, proof)
    }

    #[test]
    fn honest_change_proof_verifies() {
        let (c, proof) = change_output(40);
        assert!(test_proof_system().verifier().verify(&proof, &c, 0).unwrap());
    }

    #[test]
    fn proof_is_bound_to_its_commitment() {
        let system = test_proof_system();
        let (_, proof) = change_output(40);
        let other = commit(system.params(), 40, Fr::from(1u64));
        assert!(!system.verifier().verify(&proof, &other, 0).unwrap());
    }

    #[test]
    fn zero_value_proof_does_not_cover_a_negative_point() {
        let system = test_proof_system();
        let params = system.params();
        let r = Fr::from(0x5EEDu64);
        let (honest, proof) = change_output(0);

        let negative = Commitment {
            point: (params.g * -Fr::from(1000u64) + params.h * r).into_affine(),
        };
        assert_ne!(negative, honest);
        assert!(!system.verifier().verify(&proof, &negative, 0).unwrap());
    }

    #[test]
    fn proof_is_bound_to_its_floor() {
        let (c, proof) = change_output(40);
        assert!(!test_proof_system().verifier().verify(&proof, &c, 30).unwrap());
    }

    #[test]
    fn distributed_key_verifies_the_same_proofs() {
        let system = test_proof_system();
        let bytes = system.verifier().vk_to_bytes().unwrap();
        let remote = RangeVerifier::vk_from_bytes(&bytes, system.params().clone()).unwrap();

        let (c, proof) = change_output(100);
        assert!(remote.verify(&proof, &c, 0).unwrap());
    }

    #[test]
    fn truncated_key_is_rejected() {
        let bytes = test_proof_system().verifier().vk_to_bytes().unwrap();
        assert!(RangeVerifier::vk_from_bytes(&bytes[..bytes.len() / 2], PedersenParams::derive())
            .is_err());
    }
}
