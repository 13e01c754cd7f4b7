// Negotiation benchmarks for the Cloak protocol.
//
// Covers the per-negotiation hot spots on the sender: building the
// invitation (dominated by the change output's range proof), verifying the
// counterpart's partial signature, and cosigning.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use ark_ec::CurveGroup;
use ark_ed_on_bn254::Fr;
use ark_ff::UniformRand;
use ark_std::rand::{rngs::StdRng, SeedableRng};
use uuid::Uuid;

use cloak_protocol::config::NegotiationConfig;
use cloak_protocol::crypto::schnorr;
use cloak_protocol::crypto::secret::{SecretNonce, SecretScalar};
use cloak_protocol::keychain::{Keychain, MemoryKeychain};
use cloak_protocol::negotiation::{Funding, PaymentRequest, TransactionContext, TxInitCompleted};
use cloak_protocol::zkp::ProofSystem;

fn funding(keychain: &MemoryKeychain) -> Funding {
    keychain.receive(100, 1, false);
    Funding {
        tx_id: Uuid::new_v4(),
        request: PaymentRequest {
            amount: 60,
            height: 2,
        },
        coins: keychain.select_coins(60).unwrap(),
        change_key: keychain.derive_blinding_factor().unwrap(),
    }
}

fn bench_prepare_invitation(c: &mut Criterion) {
    let proofs = ProofSystem::setup(&mut StdRng::seed_from_u64(42));
    let config = NegotiationConfig::default();
    let keychain = MemoryKeychain::new([1u8; 32]);

    c.bench_function("negotiation/prepare_invitation", |b| {
        b.iter_batched(
            || funding(&keychain),
            |funding| {
                let ctx = TransactionContext::prepare(funding, &config, &proofs).unwrap();
                ctx.invitation()
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_verify_counterpart(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let proofs = ProofSystem::setup(&mut rng);
    let keychain = MemoryKeychain::new([2u8; 32]);
    let ctx =
        TransactionContext::prepare(funding(&keychain), &NegotiationConfig::default(), &proofs)
            .unwrap();

    let h = proofs.params().h;
    let x = Fr::rand(&mut rng);
    let k = Fr::rand(&mut rng);
    let public_nonce = (h * k).into_affine();
    let e = schnorr::challenge(
        &schnorr::combine(&ctx.public_nonce, &public_nonce),
        &ctx.kernel.message(),
    );
    let share = TxInitCompleted {
        tx_id: ctx.tx_id,
        public_excess: (h * x).into_affine(),
        public_nonce,
        partial_signature: k - e * x,
    };

    c.bench_function("negotiation/verify_counterpart", |b| {
        b.iter(|| ctx.is_valid_signature(&share));
    });
}

fn bench_cosign(c: &mut Criterion) {
    let secret = SecretScalar::random();
    let e = Fr::from(7u64);

    c.bench_function("negotiation/cosign", |b| {
        b.iter_batched(
            SecretNonce::generate,
            |nonce| schnorr::cosign(nonce, &secret, &e),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_prepare_invitation,
    bench_verify_counterpart,
    bench_cosign
);
criterion_main!(benches);
