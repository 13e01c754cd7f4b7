//! # Pedersen Commitments on the BN254 Embedded Curve
//!
//! ```text
//! C = v·G + r·H     on Baby Jubjub (ed_on_bn254), prime-order subgroup
//! ```
//!
//! Baby Jubjub's base field is the BN254 scalar field, so a Groth16 circuit
//! over BN254 can recompute `C` natively from the opening. That is what lets
//! the range proof speak about the very point that balances the
//! transaction: inputs minus outputs minus `amount·G` leaves the net
//! blinding times `H`, the kernel's public excess.
//!
//! Generators are hashed onto the curve from a fixed context and the
//! cofactor is cleared, so both parties agree on them and nobody knows
//! `log_G(H)`.

use ark_ec::{AffineRepr, CurveGroup};
use ark_ed_on_bn254::{EdwardsAffine, EdwardsProjective, Fq, Fr};
use ark_ff::PrimeField;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use crate::config;
use crate::crypto::hash::tagged_hash;

/// Commitment generators.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct PedersenParams {
    /// Value generator `G`.
    pub g: EdwardsAffine,
    /// Blinding generator `H`, which doubles as the Schnorr generator.
    pub h: EdwardsAffine,
}

/// A Pedersen commitment point.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Commitment {
    pub point: EdwardsAffine,
}

impl PedersenParams {
    /// The protocol's generators. Deterministic.
    pub fn derive() -> Self {
        Self::derive_with_context(config::PEDERSEN_GENERATOR_CONTEXT)
    }

    pub fn derive_with_context(context: &str) -> Self {
        Self {
            g: point_from_label(context, config::VALUE_GENERATOR_LABEL),
            h: point_from_label(context, config::BLINDING_GENERATOR_LABEL),
        }
    }

    pub fn blinding_generator(&self) -> &EdwardsAffine {
        &self.h
    }

    /// `value·G`: what the receiver's output adds over its own excess.
    pub fn value_point(&self, value: u64) -> EdwardsAffine {
        (self.g * Fr::from(value)).into_affine()
    }
}

/// Try-and-increment: hash `(label, counter)` to a y coordinate until it
/// lands on the curve, then multiply by the cofactor.
fn point_from_label(context: &str, label: &[u8]) -> EdwardsAffine {
    (0u32..)
        .find_map(|counter| {
            let digest = tagged_hash(context, &[label, &counter.to_le_bytes()]);
            let y = Fq::from_le_bytes_mod_order(&digest);
            EdwardsAffine::get_point_from_y_unchecked(y, digest[31] & 1 == 1)
                .map(|point| point.clear_cofactor())
                .filter(|point| !point.is_zero())
        })
        .unwrap_or_default()
}

/// Commit to `value` under `blinding`.
pub fn commit(params: &PedersenParams, value: u64, blinding: Fr) -> Commitment {
    let point: EdwardsProjective = params.g * Fr::from(value) + params.h * blinding;
    Commitment {
        point: point.into_affine(),
    }
}

/// Check an opening in the clear. Reveals the value; tests and audits only.
pub fn verify_commitment(
    params: &PedersenParams,
    commitment: &Commitment,
    value: u64,
    blinding: Fr,
) -> bool {
    commit(params, value, blinding) == *commitment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generators_are_reproducible() {
        assert_eq!(PedersenParams::derive(), PedersenParams::derive());
    }

    #[test]
    fn generators_are_distinct_subgroup_points() {
        let params = PedersenParams::derive();
        for point in [params.g, params.h] {
            assert!(point.is_on_curve());
            assert!(point.is_in_correct_subgroup_assuming_on_curve());
            assert!(!point.is_zero());
            assert_ne!(point, EdwardsAffine::generator());
        }
        assert_ne!(params.g, params.h);
    }

    #[test]
    fn another_context_gives_other_generators() {
        let ours = PedersenParams::derive();
        let theirs = PedersenParams::derive_with_context("somebody else");
        assert_ne!(ours.g, theirs.g);
        assert_ne!(ours.h, theirs.h);
    }

    #[test]
    fn blinding_hides_the_value() {
        let params = PedersenParams::derive();
        assert_ne!(
            commit(&params, 100, Fr::from(1u64)),
            commit(&params, 100, Fr::from(2u64))
        );
    }

    #[test]
    fn opening_must_match_exactly() {
        let params = PedersenParams::derive();
        let r = Fr::from(0xABCDu64);
        let c = commit(&params, 42, r);

        assert!(verify_commitment(&params, &c, 42, r));
        assert!(!verify_commitment(&params, &c, 43, r));
        assert!(!verify_commitment(&params, &c, 42, r + Fr::from(1u64)));
    }

    #[test]
    fn change_plus_payment_balances_the_input() {
        let params = PedersenParams::derive();
        let (r_in, r_change) = (Fr::from(11u64), Fr::from(4u64));

        let input = commit(&params, 100, r_in).point;
        let change = commit(&params, 40, r_change).point;
        let excess = (input - change - params.value_point(60)).into_affine();

        assert_eq!(excess, (params.h * (r_in - r_change)).into_affine());
    }
}
