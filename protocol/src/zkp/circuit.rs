//! # Range Proof R1CS Circuit
//!
//! Statement: "I know `(v, r)` such that `C = v·G + r·H` on Baby Jubjub and
//! `v − floor` fits in [`RANGE_BITS`] bits."
//!
//! ```text
//!   public:  C.x, C.y, floor
//!   private: v_0 .. v_63, d_0 .. d_63, r_0 .. r_250
//!
//!   Σ v_i·2^i · G + Σ r_i·2^i · H == C       opening, on the curve point
//!   Σ d_i·2^i == Σ v_i·2^i − floor           range
//! ```
//!
//! The curve's base field is the circuit field, so point arithmetic is
//! native. `C` is the same point inputs and outputs carry, and `G`, `H` are
//! circuit constants, so a proof cannot be moved to another commitment.
//! Both sums of bits are below `2^64 < |Fr|`, hence `floor <= v < 2^64`.
//!
//! Public inputs are allocated `C.x`, `C.y`, then `floor`; [`public_inputs`]
//! mirrors that order for the verifier.

use ark_bn254::Fr;
use ark_ed_on_bn254::constraints::EdwardsVar;
use ark_ed_on_bn254::{EdwardsAffine, EdwardsProjective, Fr as Scalar};
use ark_ff::{BigInteger, Field, PrimeField};
use ark_r1cs_std::{
    alloc::AllocVar,
    boolean::Boolean,
    eq::EqGadget,
    fields::{fp::FpVar, FieldVar},
    groups::CurveVar,
};
use ark_relations::ns;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use super::commitment::{Commitment, PedersenParams};
use crate::config::RANGE_BITS;

#[derive(Clone, Copy)]
struct Opening {
    value: u64,
    blinding: Scalar,
}

#[derive(Clone, Copy)]
struct Statement {
    point: EdwardsAffine,
    floor: u64,
}

/// Groth16 circuit proving a committed value lies at or above a floor.
///
/// Built with [`RangeProofCircuit::new`] for proving and
/// [`RangeProofCircuit::for_setup`] (no assignment, same shape) for key
/// generation.
#[derive(Clone)]
pub struct RangeProofCircuit {
    g: EdwardsProjective,
    h: EdwardsProjective,
    opening: Option<Opening>,
    statement: Option<Statement>,
}

impl RangeProofCircuit {
    /// A fully assigned circuit.
    pub fn new(
        params: &PedersenParams,
        value: u64,
        blinding: Scalar,
        commitment: &Commitment,
        floor: u64,
    ) -> Self {
        Self {
            g: params.g.into(),
            h: params.h.into(),
            opening: Some(Opening { value, blinding }),
            statement: Some(Statement {
                point: commitment.point,
                floor,
            }),
        }
    }

    /// An unassigned circuit for CRS generation.
    pub fn for_setup(params: &PedersenParams) -> Self {
        Self {
            g: params.g.into(),
            h: params.h.into(),
            opening: None,
            statement: None,
        }
    }
}

/// Little-endian bits of `n`, truncated to `len`.
fn bits_of(n: impl BigInteger, len: usize) -> Vec<bool> {
    n.to_bits_le().into_iter().take(len).collect()
}

fn witness_bits(
    cs: &ConstraintSystemRef<Fr>,
    bits: Option<Vec<bool>>,
    len: usize,
) -> Result<Vec<Boolean<Fr>>, SynthesisError> {
    (0..len)
        .map(|i| {
            Boolean::<Fr>::new_witness(ns!(cs, "bit"), || {
                bits.as_ref()
                    .map(|b| b[i])
                    .ok_or(SynthesisError::AssignmentMissing)
            })
        })
        .collect()
}

/// `Σ b_i · 2^i` as a field element.
fn pack(bits: &[Boolean<Fr>]) -> FpVar<Fr> {
    let mut sum = FpVar::<Fr>::zero();
    let mut weight = Fr::from(1u64);
    for bit in bits {
        sum += FpVar::<Fr>::from(bit.clone()) * weight;
        weight.double_in_place();
    }
    sum
}

impl ConstraintSynthesizer<Fr> for RangeProofCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let statement = self.statement;
        let opening = self.opening;
        let missing = || SynthesisError::AssignmentMissing;

        let x = FpVar::<Fr>::new_input(ns!(cs, "commitment x"), || {
            statement.map(|s| s.point.x).ok_or_else(missing)
        })?;
        let y = FpVar::<Fr>::new_input(ns!(cs, "commitment y"), || {
            statement.map(|s| s.point.y).ok_or_else(missing)
        })?;
        let floor = FpVar::<Fr>::new_input(ns!(cs, "floor"), || {
            statement.map(|s| Fr::from(s.floor)).ok_or_else(missing)
        })?;

        let value_bits = witness_bits(
            &cs,
            opening.map(|o| bits_of(Fr::from(o.value).into_bigint(), RANGE_BITS)),
            RANGE_BITS,
        )?;
        let blinding_len = Scalar::MODULUS_BIT_SIZE as usize;
        let blinding_bits = witness_bits(
            &cs,
            opening.map(|o| bits_of(o.blinding.into_bigint(), blinding_len)),
            blinding_len,
        )?;
        // Below the floor this wraps around the field and leaves the range
        // constraint unsatisfied.
        let delta = match (opening, statement) {
            (Some(o), Some(s)) => Some(bits_of(
                (Fr::from(o.value) - Fr::from(s.floor)).into_bigint(),
                RANGE_BITS,
            )),
            _ => None,
        };
        let delta_bits = witness_bits(&cs, delta, RANGE_BITS)?;

        // Opening, on the curve point itself.
        let g = EdwardsVar::constant(self.g);
        let h = EdwardsVar::constant(self.h);
        let recomputed = g.scalar_mul_le(value_bits.iter())? + h.scalar_mul_le(blinding_bits.iter())?;
        recomputed.enforce_equal(&EdwardsVar::new(x, y))?;

        // Range.
        pack(&delta_bits).enforce_equal(&(pack(&value_bits) - &floor))
    }
}

/// Verifier-side public inputs, in allocation order.
pub fn public_inputs(commitment: &Commitment, floor: u64) -> Vec<Fr> {
    vec![commitment.point.x, commitment.point.y, Fr::from(floor)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zkp::commitment::commit;
    use ark_ec::CurveGroup;
    use ark_relations::r1cs::ConstraintSystem;

    fn constraint_system(
        value: u64,
        statement: Commitment,
        floor: u64,
    ) -> ConstraintSystemRef<Fr> {
        let params = PedersenParams::derive();
        let cs = ConstraintSystem::<Fr>::new_ref();
        RangeProofCircuit::new(&params, value, Scalar::from(0xC0FFEEu64), &statement, floor)
            .generate_constraints(cs.clone())
            .unwrap();
        cs
    }

    fn committed(value: u64) -> Commitment {
        commit(&PedersenParams::derive(), value, Scalar::from(0xC0FFEEu64))
    }

    #[test]
    fn change_at_zero_floor_is_satisfiable() {
        assert!(constraint_system(40, committed(40), 0).is_satisfied().unwrap());
    }

    #[test]
    fn zero_change_is_satisfiable() {
        assert!(constraint_system(0, committed(0), 0).is_satisfied().unwrap());
    }

    #[test]
    fn max_u64_is_satisfiable() {
        assert!(constraint_system(u64::MAX, committed(u64::MAX), 0)
            .is_satisfied()
            .unwrap());
    }

    #[test]
    fn value_below_floor_is_unsatisfiable() {
        assert!(!constraint_system(50, committed(50), 100).is_satisfied().unwrap());
    }

    #[test]
    fn opening_of_another_point_is_unsatisfiable() {
        assert!(!constraint_system(40, committed(999), 0).is_satisfied().unwrap());
    }

    #[test]
    fn negative_value_point_cannot_borrow_an_honest_opening() {
        // −1000·G + r·H with the witness of commit(0, r).
        let params = PedersenParams::derive();
        let r = Scalar::from(0xC0FFEEu64);
        let forged = Commitment {
            point: (params.g * -Scalar::from(1000u64) + params.h * r).into_affine(),
        };
        assert!(!constraint_system(0, forged, 0).is_satisfied().unwrap());
    }

    #[test]
    fn public_inputs_follow_allocation_order() {
        let c = committed(500);
        assert_eq!(
            public_inputs(&c, 7),
            vec![c.point.x, c.point.y, Fr::from(7u64)]
        );
    }
}
