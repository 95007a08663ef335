//! Deterministic session seeding.
//!
//! Every stochastic component in the engine draws from a `StdRng` that is
//! ultimately derived from one master seed, so a session replays exactly
//! given the same seed and the same sequence of calls. Sub-seeds are
//! derived via BLAKE3 hashing rather than counter arithmetic, so adding a
//! new consumer never shifts the streams of existing ones.

use crate::config::SessionConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Master seed for a game, expanded into per-round engine seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSeed {
    master: u64,
}

impl SessionSeed {
    pub fn new(master: u64) -> Self {
        Self { master }
    }

    pub fn master(&self) -> u64 {
        self.master
    }

    /// Deterministic sub-seed for a labeled consumer within a round.
    pub fn sub_seed(&self, label: &str, round: u32) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master.to_le_bytes());
        hasher.update(label.as_bytes());
        hasher.update(&round.to_le_bytes());
        let hash = hasher.finalize();
        u64::from_le_bytes(hash.as_bytes()[..8].try_into().unwrap())
    }

    /// Seeded RNG for the market engine of one round.
    pub fn engine_rng(&self, round: u32) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed("engine", round))
    }
}

/// Stable fingerprint of a session setup (config + master seed).
///
/// Two runs with the same fingerprint replay the same tape. Hashes a
/// canonical JSON serialization so the value is stable across builds and
/// platforms.
pub fn session_fingerprint(config: &SessionConfig, master_seed: u64) -> String {
    let canonical = serde_json::json!({
        "config": config,
        "seed": master_seed,
    });
    blake3::hash(canonical.to_string().as_bytes())
        .to_hex()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn sub_seeds_are_deterministic() {
        let seed = SessionSeed::new(42);
        assert_eq!(seed.sub_seed("engine", 1), seed.sub_seed("engine", 1));
    }

    #[test]
    fn different_rounds_different_seeds() {
        let seed = SessionSeed::new(42);
        assert_ne!(seed.sub_seed("engine", 1), seed.sub_seed("engine", 2));
    }

    #[test]
    fn different_labels_different_seeds() {
        let seed = SessionSeed::new(42);
        assert_ne!(seed.sub_seed("engine", 1), seed.sub_seed("events", 1));
    }

    #[test]
    fn different_masters_different_streams() {
        let mut a = SessionSeed::new(1).engine_rng(1);
        let mut b = SessionSeed::new(2).engine_rng(1);
        let draws_a: Vec<f64> = (0..4).map(|_| a.gen()).collect();
        let draws_b: Vec<f64> = (0..4).map(|_| b.gen()).collect();
        assert_ne!(draws_a, draws_b);
    }

    #[test]
    fn fingerprint_is_stable_and_seed_sensitive() {
        let config = SessionConfig::default();
        let a = session_fingerprint(&config, 42);
        let b = session_fingerprint(&config, 42);
        let c = session_fingerprint(&config, 43);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut other = config.clone();
        other.starting_cash = 20_000.0;
        assert_ne!(a, session_fingerprint(&other, 42));
    }
}
