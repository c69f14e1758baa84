//! Seed handling. Every random choice draws from an explicit `ChaCha8Rng`.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seeded generator, or one seeded from OS entropy when `seed` is `None`.
pub fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_os_rng(),
    }
}

/// Derive a child seed from a parent seed and a stable key.
pub fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
