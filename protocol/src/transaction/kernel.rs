//! # Transaction Kernel
//!
//! The kernel is the signed heart of a transaction: fee, validity height
//! bounds, the aggregate excess and the aggregate Schnorr signature. Its
//! message hash covers only the first three, so both parties can sign it
//! before either knows the final excess:
//!
//! ```text
//! m = BLAKE3-derive-key("kernel message", fee || min_height || max_height)
//! ```
//!
//! All integers little-endian u64.

use ark_ed_on_bn254::EdwardsAffine;

use crate::config::{self, NegotiationConfig};
use crate::crypto::hash::tagged_hash;
use crate::crypto::schnorr::{self, AggregateSignature};

/// The transaction kernel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Kernel {
    /// Fee in the smallest unit.
    pub fee: u64,
    /// Lowest height at which the kernel is valid.
    pub min_height: u64,
    /// Highest height at which the kernel is valid.
    pub max_height: u64,
    /// Aggregate excess `X_S + X_R`, set once both parties have signed.
    pub excess: Option<EdwardsAffine>,
    /// Aggregate signature, set once both parties have signed.
    pub signature: Option<AggregateSignature>,
}

impl Kernel {
    /// An unsigned kernel with explicit parameters.
    pub fn new(fee: u64, min_height: u64, max_height: u64) -> Self {
        Self {
            fee,
            min_height,
            max_height,
            excess: None,
            signature: None,
        }
    }

    /// An unsigned kernel from a negotiation's configuration.
    pub fn from_config(config: &NegotiationConfig) -> Self {
        Self::new(config.fee, config.min_height, config.max_height)
    }

    /// The message both parties' Schnorr shares sign.
    pub fn message(&self) -> [u8; 32] {
        tagged_hash(
            config::KERNEL_MESSAGE_CONTEXT,
            &[
                &self.fee.to_le_bytes(),
                &self.min_height.to_le_bytes(),
                &self.max_height.to_le_bytes(),
            ],
        )
    }

    /// Attach the aggregate excess and signature.
    pub fn finalize(&mut self, excess: EdwardsAffine, signature: AggregateSignature) {
        self.excess = Some(excess);
        self.signature = Some(signature);
    }

    /// Whether the kernel carries a valid aggregate signature under its excess.
    pub fn is_signed_by_excess(&self, generator: &EdwardsAffine) -> bool {
        match (&self.excess, &self.signature) {
            (Some(excess), Some(signature)) => {
                schnorr::verify_aggregate(generator, signature, excess, &self.message())
            }
            _ => false,
        }
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::from_config(&NegotiationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::AffineRepr;

    #[test]
    fn default_kernel_has_zero_fee_and_open_heights() {
        let kernel = Kernel::default();
        assert_eq!(kernel.fee, 0);
        assert_eq!(kernel.min_height, 0);
        assert_eq!(kernel.max_height, u64::MAX);
        assert!(kernel.excess.is_none());
    }

    #[test]
    fn message_binds_every_parameter() {
        let base = Kernel::new(0, 0, u64::MAX).message();
        assert_eq!(base, Kernel::default().message());
        assert_ne!(base, Kernel::new(1, 0, u64::MAX).message());
        assert_ne!(base, Kernel::new(0, 1, u64::MAX).message());
        assert_ne!(base, Kernel::new(0, 0, 1000).message());
    }

    #[test]
    fn unsigned_kernel_is_not_signed() {
        assert!(!Kernel::default().is_signed_by_excess(&EdwardsAffine::generator()));
    }
}
