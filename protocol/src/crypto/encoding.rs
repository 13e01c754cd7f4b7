//! # Canonical Encodings for Curve Types
//!
//! arkworks types speak `CanonicalSerialize`, negotiation messages speak
//! `serde`. This module bridges the two: points and scalars are carried as
//! the hex string of their canonical compressed encoding.
//!
//! Use it as a field attribute:
//!
//! ```ignore
//! #[serde(with = "crate::crypto::encoding")]
//! pub public_nonce: EdwardsAffine,
//! ```
//!
//! Deserialization goes through `deserialize_compressed`, which validates
//! that a point is on the curve and in the prime-order subgroup. Remote
//! input that fails those checks never becomes a `EdwardsAffine`.

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use serde::{de, ser, Deserialize, Deserializer, Serializer};

/// Canonical compressed bytes of any arkworks-serializable value.
///
/// Writing into a `Vec` cannot run out of space, so this is infallible.
pub fn to_compressed_bytes<T: CanonicalSerialize>(value: &T) -> Vec<u8> {
    let mut buf = Vec::with_capacity(value.compressed_size());
    value
        .serialize_compressed(&mut buf)
        .expect("serialization into a Vec must not fail");
    buf
}

/// `serde` serializer: canonical compressed bytes, hex-encoded.
pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: CanonicalSerialize,
    S: Serializer,
{
    let mut buf = Vec::with_capacity(value.compressed_size());
    value
        .serialize_compressed(&mut buf)
        .map_err(ser::Error::custom)?;
    serializer.serialize_str(&hex::encode(buf))
}

/// `serde` deserializer: hex string, then validated canonical decoding.
pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: CanonicalDeserialize,
    D: Deserializer<'de>,
{
    let encoded = String::deserialize(deserializer)?;
    let bytes = hex::decode(&encoded).map_err(de::Error::custom)?;
    T::deserialize_compressed(&bytes[..]).map_err(de::Error::custom)
}
