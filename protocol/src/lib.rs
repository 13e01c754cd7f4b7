// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Cloak Protocol, Sender Negotiation Engine
//!
//! Two parties who do not trust each other build a confidential payment by
//! exchanging asynchronous messages. Amounts are hidden in Pedersen
//! commitments; the transaction is authorized by a two-party Schnorr
//! signature whose key is the net blinding excess of both sides.
//!
//! This crate is the sender. It selects and locks coins, builds a change
//! output with a range proof, verifies the receiver's partial signature
//! before releasing its own, and settles coin state on success, rejection
//! or abort without ever leaving coins stuck in `Locked`.
//!
//! ## Architecture
//!
//! - **crypto**: hashing, secret wrappers, Schnorr cosigning, serde bridge.
//! - **zkp**: Pedersen commitments on Baby Jubjub, Groth16 range proofs over BN254.
//! - **transaction**: coins, inputs, outputs and the kernel.
//! - **keychain**: the coin store contract and an in-memory implementation.
//! - **gateway**: the outbound transport contract and a channel implementation.
//! - **negotiation**: the state machine, its driver and the message router.
//! - **config**: protocol constants and negotiation parameters.
//! - **logging**: `tracing` subscriber setup.
//!
//! ## Ground Rules
//!
//! 1. Every counterpart message is untrusted until its signature verifies.
//! 2. Secrets are move-only, zeroized on drop and never logged.
//! 3. State machine transitions are pure; side effects are values.
//! 4. If it touches coins, it has tests. Plural.

pub mod config;
pub mod crypto;
pub mod gateway;
pub mod keychain;
pub mod logging;
pub mod negotiation;
pub mod transaction;
pub mod zkp;

pub use negotiation::{
    NegotiationError, NegotiationOutcome, NegotiationRouter, PaymentRequest, SenderNegotiation,
    SenderState,
};
