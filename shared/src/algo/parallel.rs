//! Parallel processing utilities with deterministic seeding
//!
//! Monte Carlo work is split into independent tasks. Every task gets its own
//! RNG seeded from a base seed and the task index, so the output does not
//! depend on how rayon schedules the tasks across threads.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

/// Derive the seed for one task from a base seed and the task index.
///
/// Uses a SplitMix64 finalizer so that neighbouring indices produce
/// decorrelated seeds even for small base seeds.
pub fn task_seed(base_seed: u64, index: u64) -> u64 {
    let mut z = base_seed
        .wrapping_add(index.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Run `count` independent tasks in parallel with deterministic seeding.
///
/// Task `i` receives its index and an RNG seeded with `task_seed(seed, i)`.
/// Results are returned in index order.
///
/// # Arguments
/// * `count` - Number of tasks
/// * `seed` - Base seed for random number generation
/// * `task` - Closure run once per task with its own RNG
pub fn map_indexed_in_parallel<T, F>(count: usize, seed: u64, task: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize, &mut StdRng) -> T + Send + Sync,
{
    (0..count)
        .into_par_iter()
        .map(|index| {
            let mut rng = StdRng::seed_from_u64(task_seed(seed, index as u64));
            task(index, &mut rng)
        })
        .collect()
}
