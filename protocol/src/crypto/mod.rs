//! # Cryptographic Primitives for Cloak
//!
//! Thin, type-safe wrappers around audited implementations. Nothing here
//! holds state; every function is deterministic given its inputs, except
//! nonce and secret sampling which draw from the OS CSPRNG.
//!
//! - **hash**: context-tagged BLAKE3 and hash-to-scalar.
//! - **secret**: move-only secret scalars, zeroized on drop.
//! - **schnorr**: two-party Schnorr cosigning on Baby Jubjub.
//! - **encoding**: serde bridge for arkworks points and scalars.
//!
//! Pedersen commitments and range proofs live in [`crate::zkp`].

pub mod encoding;
pub mod hash;
pub mod schnorr;
pub mod secret;

pub use hash::{tagged_hash, tagged_scalar};
pub use schnorr::{
    aggregate, challenge, combine, cosign, verify_aggregate, verify_partial, AggregateSignature,
};
pub use secret::{SecretNonce, SecretScalar};
