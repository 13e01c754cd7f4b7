//! # Secret Scalars
//!
//! Move-only wrappers for the secret values a negotiation holds: blinding
//! factors, the aggregate blinding excess and the single-use Schnorr nonce.
//!
//! - Neither type implements `Clone` or `Copy`. A secret lives in exactly one
//!   place and moves into the [`TransactionContext`] or [`Coin`] that owns it.
//! - Both zeroize their scalar on drop, so secrets do not outlive the context.
//! - `Debug` prints `<redacted>`. Logging a context cannot leak a key.
//!
//! [`SecretNonce`] is additionally consumed by value when cosigning (see
//! [`super::schnorr::cosign`]): once a partial signature has been produced
//! the nonce is gone and cannot be reused.
//!
//! [`TransactionContext`]: crate::negotiation::TransactionContext
//! [`Coin`]: crate::transaction::Coin

use std::fmt;
use std::ops::{AddAssign, SubAssign};

use ark_ec::CurveGroup;
use ark_ed_on_bn254::{EdwardsAffine, Fr};
use ark_ff::{UniformRand, Zero};
use rand::rngs::OsRng;
use zeroize::Zeroize;

// ---------------------------------------------------------------------------
// SecretScalar
// ---------------------------------------------------------------------------

/// A secret element of the Baby Jubjub scalar field.
pub struct SecretScalar(Fr);

impl SecretScalar {
    /// Wrap an existing scalar. The caller gives up its copy by convention.
    pub fn new(value: Fr) -> Self {
        Self(value)
    }

    /// The additive identity, used as the starting point for accumulation.
    pub fn zero() -> Self {
        Self(Fr::zero())
    }

    /// Sample a fresh uniformly random scalar from the OS CSPRNG.
    pub fn random() -> Self {
        Self(Fr::rand(&mut OsRng))
    }

    /// Borrow the underlying scalar for arithmetic.
    pub fn expose(&self) -> &Fr {
        &self.0
    }

    /// Public form of the secret: `secret · generator`.
    pub fn public(&self, generator: &EdwardsAffine) -> EdwardsAffine {
        (*generator * self.0).into_affine()
    }
}

impl AddAssign<&Fr> for SecretScalar {
    fn add_assign(&mut self, rhs: &Fr) {
        self.0 += rhs;
    }
}

impl SubAssign<&Fr> for SecretScalar {
    fn sub_assign(&mut self, rhs: &Fr) {
        self.0 -= rhs;
    }
}

impl Drop for SecretScalar {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for SecretScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretScalar(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// SecretNonce
// ---------------------------------------------------------------------------

/// A single-use Schnorr nonce.
///
/// Generated once per negotiation and consumed by the one cosign call that
/// uses it. Reusing a nonce across two challenges reveals the signing key,
/// so the type makes reuse impossible rather than merely discouraged.
pub struct SecretNonce(SecretScalar);

impl SecretNonce {
    /// Draw a fresh nonce from the OS CSPRNG.
    pub fn generate() -> Self {
        Self(SecretScalar::random())
    }

    /// Public nonce `k · generator`. Safe to send to the counterpart.
    pub fn public(&self, generator: &EdwardsAffine) -> EdwardsAffine {
        self.0.public(generator)
    }

    /// Borrow the scalar. Crate-private: only cosigning may read it.
    pub(crate) fn expose(&self) -> &Fr {
        self.0.expose()
    }
}

impl fmt::Debug for SecretNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretNonce(<redacted>)")
    }
}
