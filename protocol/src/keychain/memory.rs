//! In-memory [`Keychain`] for tests, simulations and embedding.
//!
//! All coin state sits behind one `parking_lot::Mutex`, which makes
//! select-and-lock a single critical section: concurrent negotiations
//! serialize on it and can never lock the same coin.
//!
//! Blinding factors are derived deterministically from a 32-byte seed and a
//! monotonically increasing index:
//!
//! ```text
//! key_i = Fr(BLAKE3-derive-key("keychain derivation", seed || i))
//! ```
//!
//! so a wallet restored from the same seed re-derives the same keys, and no
//! index is ever issued twice.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rand::RngCore;
use tracing::debug;

use super::{DerivedKey, Keychain, KeychainError};
use crate::config;
use crate::crypto::hash::tagged_scalar;
use crate::crypto::secret::SecretScalar;
use crate::transaction::{Coin, CoinId, CoinStatus};

struct Inner {
    next_index: u64,
    coins: BTreeMap<CoinId, Coin>,
}

/// A keychain that keeps every coin in process memory.
pub struct MemoryKeychain {
    seed: [u8; 32],
    inner: Mutex<Inner>,
    /// When set, `store` and `persist` fail as if the disk were gone.
    fail_writes: AtomicBool,
}

impl MemoryKeychain {
    /// Create an empty keychain from a derivation seed.
    pub fn new(seed: [u8; 32]) -> Self {
        Self {
            seed,
            inner: Mutex::new(Inner {
                next_index: 0,
                coins: BTreeMap::new(),
            }),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Create an empty keychain with a random seed.
    pub fn random() -> Self {
        let mut seed = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut seed);
        Self::new(seed)
    }

    /// Add a confirmed, spendable coin (e.g. an incoming payment).
    pub fn receive(&self, amount: u64, height: u64, coinbase: bool) -> CoinId {
        let mut inner = self.inner.lock();
        let (id, key) = self.next_key(&mut inner);
        let coin = Coin::new(id, *key.expose(), amount, CoinStatus::Unspent, height, coinbase);
        inner.coins.insert(id, coin);
        id
    }

    /// Snapshot of a single coin.
    pub fn coin(&self, id: CoinId) -> Option<Coin> {
        self.inner.lock().coins.get(&id).cloned()
    }

    /// Snapshot of every coin, ordered by id.
    pub fn coins(&self) -> Vec<Coin> {
        self.inner.lock().coins.values().cloned().collect()
    }

    /// Sum of coins currently available for selection.
    pub fn available_balance(&self) -> u64 {
        self.inner
            .lock()
            .coins
            .values()
            .filter(|c| c.is_available())
            .map(|c| c.amount)
            .sum()
    }

    /// Simulate (or stop simulating) a failing durable store.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn next_key(&self, inner: &mut Inner) -> (CoinId, SecretScalar) {
        let index = inner.next_index;
        inner.next_index += 1;
        let key = tagged_scalar(
            config::KEY_DERIVATION_CONTEXT,
            &[&self.seed, &index.to_le_bytes()],
        );
        (CoinId(index), SecretScalar::new(key))
    }

    fn check_writable(&self) -> Result<(), KeychainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(KeychainError::Storage("write rejected".to_string()));
        }
        Ok(())
    }
}

/// Pick coin ids covering `amount`: the smallest single coin that covers it
/// if one exists, otherwise largest-first accumulation.
fn choose(available: &[&Coin], amount: u64) -> Option<Vec<CoinId>> {
    if let Some(single) = available
        .iter()
        .filter(|c| c.amount >= amount)
        .min_by_key(|c| (c.amount, c.id))
    {
        return Some(vec![single.id]);
    }

    let mut by_size: Vec<&&Coin> = available.iter().collect();
    by_size.sort_by(|a, b| b.amount.cmp(&a.amount).then(a.id.cmp(&b.id)));

    let mut chosen = Vec::new();
    let mut total: u64 = 0;
    for coin in by_size {
        chosen.push(coin.id);
        total = total.saturating_add(coin.amount);
        if total >= amount {
            return Some(chosen);
        }
    }
    None
}

impl Keychain for MemoryKeychain {
    fn select_coins(&self, amount: u64) -> Result<Vec<Coin>, KeychainError> {
        let mut inner = self.inner.lock();

        let available: Vec<&Coin> = inner.coins.values().filter(|c| c.is_available()).collect();
        let Some(ids) = choose(&available, amount) else {
            return Err(KeychainError::InsufficientFunds {
                required: amount,
                available: available.iter().map(|c| c.amount).sum(),
            });
        };

        let mut selected = Vec::with_capacity(ids.len());
        for id in ids {
            let coin = inner
                .coins
                .get_mut(&id)
                .ok_or(KeychainError::UnknownCoin(id))?;
            coin.lock()?;
            selected.push(coin.clone());
        }

        debug!(amount, inputs = selected.len(), "coins selected and locked");
        Ok(selected)
    }

    fn derive_blinding_factor(&self) -> Result<DerivedKey, KeychainError> {
        let mut inner = self.inner.lock();
        let (id, key) = self.next_key(&mut inner);
        Ok(DerivedKey { id, key })
    }

    fn store(&self, coin: &Coin) -> Result<(), KeychainError> {
        self.check_writable()?;
        self.inner.lock().coins.insert(coin.id, coin.clone());
        Ok(())
    }

    fn persist(&self, coins: &[Coin]) -> Result<(), KeychainError> {
        self.check_writable()?;
        let mut inner = self.inner.lock();
        for coin in coins {
            inner.coins.insert(coin.id, coin.clone());
        }
        Ok(())
    }

    fn release(&self, ids: &[CoinId]) -> Result<(), KeychainError> {
        let mut inner = self.inner.lock();

        // Validate everything first so a bad id leaves no partial release.
        for id in ids {
            match inner.coins.get(id) {
                None => return Err(KeychainError::UnknownCoin(*id)),
                Some(coin) if coin.status != CoinStatus::Locked => {
                    let mut trial = coin.clone();
                    trial.release()?;
                }
                Some(_) => {}
            }
        }
        for id in ids {
            if let Some(coin) = inner.coins.get_mut(id) {
                coin.release()?;
            }
        }
        Ok(())
    }

    fn discard(&self, id: CoinId) -> Result<(), KeychainError> {
        let mut inner = self.inner.lock();
        match inner.coins.get(&id) {
            None => Err(KeychainError::UnknownCoin(id)),
            Some(coin) if coin.status == CoinStatus::Unconfirmed => {
                inner.coins.remove(&id);
                Ok(())
            }
            Some(coin) => Err(KeychainError::CoinNotAvailable(
                crate::transaction::CoinTransitionError {
                    coin: id,
                    from: coin.status,
                    to: CoinStatus::Unconfirmed,
                },
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keychain_with(amounts: &[u64]) -> MemoryKeychain {
        let keychain = MemoryKeychain::new([7u8; 32]);
        for amount in amounts {
            keychain.receive(*amount, 1, false);
        }
        keychain
    }

    #[test]
    fn selection_locks_returned_coins() {
        let keychain = keychain_with(&[100]);
        let coins = keychain.select_coins(60).unwrap();

        assert_eq!(coins.len(), 1);
        assert_eq!(coins[0].status, CoinStatus::Locked);
        assert_eq!(keychain.coin(coins[0].id).unwrap().status, CoinStatus::Locked);
        assert_eq!(keychain.available_balance(), 0);
    }

    #[test]
    fn insufficient_funds_locks_nothing() {
        let keychain = keychain_with(&[10, 20]);
        let err = keychain.select_coins(60).unwrap_err();

        assert!(matches!(
            err,
            KeychainError::InsufficientFunds {
                required: 60,
                available: 30
            }
        ));
        assert_eq!(keychain.available_balance(), 30);
    }

    #[test]
    fn prefers_smallest_covering_coin() {
        let keychain = keychain_with(&[500, 70, 65]);
        let coins = keychain.select_coins(60).unwrap();
        assert_eq!(coins.len(), 1);
        assert_eq!(coins[0].amount, 65);
    }

    #[test]
    fn accumulates_largest_first_when_no_single_coin_covers() {
        let keychain = keychain_with(&[10, 40, 30, 5]);
        let coins = keychain.select_coins(65).unwrap();
        let amounts: Vec<u64> = coins.iter().map(|c| c.amount).collect();
        assert_eq!(amounts, vec![40, 30]);
    }

    #[test]
    fn locked_coins_are_not_selected_twice() {
        let keychain = keychain_with(&[100, 100]);
        let first = keychain.select_coins(50).unwrap();
        let second = keychain.select_coins(50).unwrap();
        assert_ne!(first[0].id, second[0].id);
        assert!(keychain.select_coins(50).is_err());
    }

    #[test]
    fn release_restores_availability() {
        let keychain = keychain_with(&[100]);
        let coins = keychain.select_coins(60).unwrap();
        keychain.release(&[coins[0].id]).unwrap();
        assert_eq!(keychain.available_balance(), 100);
    }

    #[test]
    fn release_of_unlocked_coin_changes_nothing() {
        let keychain = keychain_with(&[100, 50]);
        let locked = keychain.select_coins(100).unwrap()[0].id;
        let unlocked = keychain
            .coins()
            .into_iter()
            .find(|c| c.id != locked)
            .unwrap()
            .id;

        assert!(keychain.release(&[locked, unlocked]).is_err());
        assert_eq!(keychain.coin(locked).unwrap().status, CoinStatus::Locked);
    }

    #[test]
    fn derived_keys_never_repeat() {
        let keychain = MemoryKeychain::new([1u8; 32]);
        let a = keychain.derive_blinding_factor().unwrap();
        let b = keychain.derive_blinding_factor().unwrap();
        assert_ne!(a.id, b.id);
        assert_ne!(a.key.expose(), b.key.expose());
    }

    #[test]
    fn derivation_is_reproducible_from_seed() {
        let a = MemoryKeychain::new([3u8; 32]).derive_blinding_factor().unwrap();
        let b = MemoryKeychain::new([3u8; 32]).derive_blinding_factor().unwrap();
        assert_eq!(a.key.expose(), b.key.expose());
    }

    #[test]
    fn failing_store_rejects_writes() {
        let keychain = MemoryKeychain::new([0u8; 32]);
        keychain.set_fail_writes(true);
        let derived = keychain.derive_blinding_factor().unwrap();
        let coin = Coin::new(
            derived.id,
            *derived.key.expose(),
            5,
            CoinStatus::Unconfirmed,
            1,
            false,
        );
        assert!(matches!(keychain.store(&coin), Err(KeychainError::Storage(_))));
        assert!(keychain.coin(derived.id).is_none());
    }

    #[test]
    fn discard_only_removes_unconfirmed() {
        let keychain = keychain_with(&[100]);
        let spendable = keychain.coins()[0].id;
        assert!(keychain.discard(spendable).is_err());

        let derived = keychain.derive_blinding_factor().unwrap();
        let change = Coin::new(
            derived.id,
            *derived.key.expose(),
            40,
            CoinStatus::Unconfirmed,
            1,
            false,
        );
        keychain.store(&change).unwrap();
        keychain.discard(change.id).unwrap();
        assert!(keychain.coin(change.id).is_none());
    }
}
