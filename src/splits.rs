//! Train/validation splitting.

use crate::types::Sample;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Shuffle and split the dataset, reserving a `test_size` fraction for
/// validation. Deterministic for a fixed seed.
pub fn split_samples(
    mut samples: Vec<Sample>,
    test_size: f32,
    seed: u64,
) -> (Vec<Sample>, Vec<Sample>) {
    let test_size = test_size.clamp(0.0, 1.0);
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let val_len = ((samples.len() as f32) * test_size).round() as usize;
    let val_len = val_len.min(samples.len());
    let val = samples.split_off(samples.len() - val_len);
    (samples, val)
}
