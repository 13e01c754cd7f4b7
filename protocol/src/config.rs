//! # Protocol Configuration & Constants
//!
//! Every magic number in Cloak lives here. Domain tags in particular: if two
//! parties disagree on a single byte of these, every commitment, challenge
//! and kernel hash diverges and no negotiation will ever verify.
//!
//! Runtime knobs that a deployment may reasonably tune live in
//! [`NegotiationConfig`]. Everything else is a compile-time constant.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Major version. Bump on wire-incompatible changes to negotiation messages.
pub const PROTOCOL_VERSION_MAJOR: u16 = 0;

/// Minor version. Bump on backward-compatible additions.
pub const PROTOCOL_VERSION_MINOR: u16 = 1;

/// The full version string.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Domain Separation Tags
// ---------------------------------------------------------------------------

/// BLAKE3 `derive_key` context for hash-to-curve of the Pedersen generators.
pub const PEDERSEN_GENERATOR_CONTEXT: &str = "cloak 2026-01 pedersen generator";

/// BLAKE3 `derive_key` context for the Schnorr challenge `e = H(R || m)`.
pub const SCHNORR_CHALLENGE_CONTEXT: &str = "cloak 2026-01 schnorr challenge";

/// BLAKE3 `derive_key` context for the kernel message both parties sign.
pub const KERNEL_MESSAGE_CONTEXT: &str = "cloak 2026-01 kernel message";

/// BLAKE3 `derive_key` context for keychain blinding-factor derivation.
pub const KEY_DERIVATION_CONTEXT: &str = "cloak 2026-01 keychain derivation";

/// Label for the value generator `G`.
pub const VALUE_GENERATOR_LABEL: &[u8] = b"value";

/// Label for the blinding generator `H`. This is also the Schnorr generator.
pub const BLINDING_GENERATOR_LABEL: &[u8] = b"blinding";

// ---------------------------------------------------------------------------
// Range Proofs
// ---------------------------------------------------------------------------

/// Number of bits used for range proofs. 64 bits covers the full u64 domain.
pub const RANGE_BITS: usize = 64;

/// Lower bound proven for change outputs. Change can be zero, never negative.
pub const CHANGE_RANGE_FLOOR: u64 = 0;

// ---------------------------------------------------------------------------
// Kernel Defaults
// ---------------------------------------------------------------------------

/// Default kernel fee. This design performs no fee negotiation.
pub const DEFAULT_KERNEL_FEE: u64 = 0;

/// Default lowest height at which the kernel is valid (no minimum).
pub const DEFAULT_MIN_HEIGHT: u64 = 0;

/// Default highest height at which the kernel is valid (unbounded).
pub const DEFAULT_MAX_HEIGHT: u64 = u64::MAX;

// ---------------------------------------------------------------------------
// Runtime Configuration
// ---------------------------------------------------------------------------

/// Tunable kernel parameters for a single negotiation.
///
/// Defaults reproduce the fixed behaviour of the protocol: zero fee and the
/// widest valid height range. Real deployments will want to set both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationConfig {
    /// Fee carried by the kernel, in the smallest unit.
    pub fee: u64,
    /// Lowest block height at which the kernel is valid.
    pub min_height: u64,
    /// Highest block height at which the kernel is valid.
    pub max_height: u64,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            fee: DEFAULT_KERNEL_FEE,
            min_height: DEFAULT_MIN_HEIGHT,
            max_height: DEFAULT_MAX_HEIGHT,
        }
    }
}
