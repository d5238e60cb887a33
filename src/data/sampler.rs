// ============================================================
// Layer 4 — Sample Selection
// ============================================================
// Picks which held-out images end up in the reconstruction
// figure: a uniform random permutation of all indices, cut to
// the requested count.
//
// With a seed the permutation is the same on every run; without
// one it is drawn from OS entropy.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Return `count` distinct indices from `0..len` in random order.
/// Asking for more than `len` yields all of them.
pub fn sample_indices(len: usize, count: usize, seed: Option<u64>) -> Vec<usize> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None       => StdRng::from_entropy(),
    };

    let mut indices: Vec<usize> = (0..len).collect();
    indices.shuffle(&mut rng);
    indices.truncate(count);

    tracing::debug!("Selected {} of {} held-out samples", indices.len(), len);
    indices
}
