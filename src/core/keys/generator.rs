//! Object key generation
//!
//! Zotero's sync protocol identifies every item and collection by an
//! 8-character key that must be unique within the store for its whole
//! lifetime. The generator draws keys uniformly from [`KEY_ALPHABET`] and
//! remembers every key it has seen, existing or issued, so a key is never
//! handed out twice.

use crate::domain::{is_valid_key, ItemKey, Result, KEY_ALPHABET, KEY_LENGTH};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sqlx::SqliteConnection;
use std::collections::HashSet;

/// Run-scoped key generator
pub struct KeyGenerator {
    rng: StdRng,
    taken: HashSet<String>,
    issued: usize,
}

impl KeyGenerator {
    /// Creates a generator seeded from OS entropy with an empty taken set.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Creates a deterministic generator, for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            taken: HashSet::new(),
            issued: 0,
        }
    }

    /// Marks keys as taken so they are never generated.
    ///
    /// Malformed keys are recorded too; they are harmless since a generated
    /// key can never equal one.
    pub fn seed<I, S>(&mut self, existing: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.taken.extend(existing.into_iter().map(Into::into));
    }

    /// Loads every item and collection key already in the store.
    pub async fn seed_from_store(&mut self, conn: &mut SqliteConnection) -> Result<usize> {
        let before = self.taken.len();
        let keys: Vec<String> =
            sqlx::query_scalar("SELECT key FROM items UNION SELECT key FROM collections")
                .fetch_all(&mut *conn)
                .await?;
        self.seed(keys);
        let loaded = self.taken.len() - before;
        tracing::debug!(existing_keys = loaded, "Key generator seeded");
        Ok(loaded)
    }

    /// Returns a fresh key not seen by this generator before.
    ///
    /// Loops until it draws a key outside the taken set; it never gives up.
    pub fn generate(&mut self) -> ItemKey {
        loop {
            let candidate: String = (0..KEY_LENGTH)
                .map(|_| KEY_ALPHABET[self.rng.gen_range(0..KEY_ALPHABET.len())] as char)
                .collect();
            if self.taken.insert(candidate.clone()) {
                self.issued += 1;
                return ItemKey::from_generated(candidate);
            }
            tracing::trace!(key = %candidate, "Key collision; drawing again");
        }
    }

    /// Format check only; see [`is_valid_key`].
    pub fn is_valid(token: &str) -> bool {
        is_valid_key(token)
    }

    /// Number of keys handed out by [`generate`](Self::generate)
    pub fn issued(&self) -> usize {
        self.issued
    }

    /// Number of keys known to be taken, existing plus issued
    pub fn known(&self) -> usize {
        self.taken.len()
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_keys_are_valid_and_distinct() {
        let mut generator = KeyGenerator::with_seed(7);
        let keys: HashSet<String> = (0..5_000)
            .map(|_| generator.generate().as_str().to_string())
            .collect();
        assert_eq!(keys.len(), 5_000);
        assert!(keys.iter().all(|k| KeyGenerator::is_valid(k)));
        assert_eq!(generator.issued(), 5_000);
    }

    #[test]
    fn test_seeded_keys_are_never_generated() {
        // Replay the same seed to learn the first keys, then forbid them.
        let mut probe = KeyGenerator::with_seed(42);
        let first: Vec<String> = (0..3).map(|_| probe.generate().to_string()).collect();

        let mut generator = KeyGenerator::with_seed(42);
        generator.seed(first.clone());
        for _ in 0..100 {
            let key = generator.generate();
            assert!(!first.contains(&key.to_string()));
        }
        assert_eq!(generator.known(), 103);
    }

    #[test]
    fn test_exhausted_draws_keep_looping_until_a_miss() {
        let mut generator = KeyGenerator::with_seed(1);
        let mut probe = KeyGenerator::with_seed(1);
        let taken: Vec<String> = (0..50).map(|_| probe.generate().to_string()).collect();
        generator.seed(taken.iter().cloned());

        let key = generator.generate();
        assert!(!taken.contains(&key.to_string()));
        assert_eq!(generator.issued(), 1);
    }
}
