//! # Two-Party Schnorr Cosigning
//!
//! Both parties sign the same kernel message under the *sum* of their keys:
//!
//! ```text
//!   R = R_S + R_R                      combined public nonce
//!   e = H(R || m)                      shared challenge
//!   s_S = k_S - e·x_S                  sender partial signature
//!   s_R = k_R - e·x_R                  receiver partial signature
//!   s   = s_S + s_R                    aggregate scalar
//!
//!   verify:  R - e·X == s·H            with X = X_S + X_R
//! ```
//!
//! The same equation checks a single party's share against that party's own
//! public nonce and public excess: `R_R - e·X_R == s_R·H`. This is how the
//! sender validates the receiver's contribution before releasing its own.
//!
//! `H` is the Pedersen blinding generator, so the public excess doubles as
//! the kernel excess commitment: a commitment to zero value.

use ark_ec::{AffineRepr, CurveGroup};
use ark_ed_on_bn254::{EdwardsAffine, EdwardsProjective, Fr};
use serde::{Deserialize, Serialize};

use super::encoding::to_compressed_bytes;
use super::hash::tagged_scalar;
use super::secret::{SecretNonce, SecretScalar};
use crate::config;

/// A complete Schnorr signature over a kernel message: `(R, s)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSignature {
    /// Combined public nonce `R = R_S + R_R`.
    #[serde(with = "crate::crypto::encoding")]
    pub nonce: EdwardsAffine,
    /// Aggregate scalar `s = s_S + s_R`.
    #[serde(with = "crate::crypto::encoding")]
    pub scalar: Fr,
}

/// Sum of two public points, normalised to affine form.
pub fn combine(a: &EdwardsAffine, b: &EdwardsAffine) -> EdwardsAffine {
    (*a + *b).into_affine()
}

/// Derive the challenge `e = H(compress(R) || m)` into the scalar field.
pub fn challenge(nonce_sum: &EdwardsAffine, message: &[u8; 32]) -> Fr {
    let r_bytes = to_compressed_bytes(nonce_sum);
    tagged_scalar(config::SCHNORR_CHALLENGE_CONTEXT, &[&r_bytes, message])
}

/// Produce a partial signature `s = k - e·x`, consuming the nonce.
///
/// Taking the nonce by value is the whole point: a second call with the
/// same nonce does not type-check.
pub fn cosign(nonce: SecretNonce, secret: &SecretScalar, challenge: &Fr) -> Fr {
    *nonce.expose() - *challenge * secret.expose()
}

/// Check one party's partial signature: `R_i - e·X_i == s_i·H`.
pub fn verify_partial(
    generator: &EdwardsAffine,
    public_nonce: &EdwardsAffine,
    public_excess: &EdwardsAffine,
    challenge: &Fr,
    signature: &Fr,
) -> bool {
    let lhs: EdwardsProjective = public_nonce.into_group() - *public_excess * *challenge;
    let rhs: EdwardsProjective = *generator * *signature;
    lhs == rhs
}

/// Assemble the aggregate signature from the combined nonce and both shares.
pub fn aggregate(nonce_sum: EdwardsAffine, partials: &[Fr]) -> AggregateSignature {
    AggregateSignature {
        nonce: nonce_sum,
        scalar: partials.iter().sum(),
    }
}

/// Verify an aggregate signature against the combined excess and message.
pub fn verify_aggregate(
    generator: &EdwardsAffine,
    signature: &AggregateSignature,
    public_excess: &EdwardsAffine,
    message: &[u8; 32],
) -> bool {
    let e = challenge(&signature.nonce, message);
    verify_partial(
        generator,
        &signature.nonce,
        public_excess,
        &e,
        &signature.scalar,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
