use rand::prelude::*;
use rand::rngs::StdRng;
use std::collections::HashSet;
use tracing::debug;

/// Creates the generator behind every randomized choice of a run.
///
/// A fixed seed makes identifier assignment and every permutation reproducible.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => {
            debug!(seed, "Using fixed random seed.");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    }
}

/// Draws `count` distinct identifiers of sixteen lowercase hex digits.
pub fn random_keys(rng: &mut impl Rng, count: usize) -> Vec<String> {
    let mut seen = HashSet::with_capacity(count);
    let mut keys = Vec::with_capacity(count);
    while keys.len() < count {
        let key = format!("{:016x}", rng.r#gen::<u64>());
        if seen.insert(key.clone()) {
            keys.push(key);
        }
    }
    keys
}

/// Shuffles `items` in place when `enabled`; otherwise leaves them untouched.
#[inline]
pub fn permute<T>(items: &mut [T], enabled: bool, rng: &mut impl Rng) {
    if enabled {
        items.shuffle(rng);
    }
}
