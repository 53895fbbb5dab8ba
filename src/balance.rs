//! Steering-angle rebalancing.
//!
//! Recorded driving is dominated by straight road, so near-zero angles swamp
//! the dataset. The balancer buckets the angle domain, caps each bucket, and
//! drops the excess so the model sees a flatter angle distribution.

use crate::types::{Sample, STEERING_MAX, STEERING_MIN};
use rand::seq::SliceRandom;
use rand::SeedableRng;

#[derive(Debug, Clone)]
pub struct BalanceConfig {
    /// Number of equal-width buckets over the steering range.
    pub num_buckets: usize,
    /// Cap on samples retained per bucket.
    pub max_per_bucket: usize,
    /// Floor on samples retained per bucket; the cap is clamped up to this,
    /// so no bucket with data is ever emptied by an aggressive cap.
    pub min_per_bucket: usize,
    /// Seed for the drop selection within over-cap buckets.
    pub seed: u64,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            num_buckets: 25,
            max_per_bucket: 400,
            min_per_bucket: 50,
            seed: 0,
        }
    }
}

/// Index of the bucket containing `angle`.
pub fn bucket_index(angle: f32, num_buckets: usize) -> usize {
    let span = STEERING_MAX - STEERING_MIN;
    let t = (angle.clamp(STEERING_MIN, STEERING_MAX) - STEERING_MIN) / span;
    ((t * num_buckets as f32) as usize).min(num_buckets - 1)
}

/// Drop excess samples from over-cap buckets. Under-cap buckets pass through
/// untouched, and surviving samples keep their original log order. Identical
/// output for identical (input, config).
pub fn balance_samples(samples: Vec<Sample>, cfg: &BalanceConfig) -> Vec<Sample> {
    let num_buckets = cfg.num_buckets.max(1);
    let cap = cfg.max_per_bucket.max(cfg.min_per_bucket).max(1);

    let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); num_buckets];
    for (i, sample) in samples.iter().enumerate() {
        buckets[bucket_index(sample.steering, num_buckets)].push(i);
    }

    let mut rng = rand::rngs::StdRng::seed_from_u64(cfg.seed);
    let mut keep = vec![false; samples.len()];
    for bucket in buckets.iter_mut() {
        if bucket.len() > cap {
            bucket.shuffle(&mut rng);
            bucket.truncate(cap);
        }
        for &i in bucket.iter() {
            keep[i] = true;
        }
    }

    samples
        .into_iter()
        .enumerate()
        .filter_map(|(i, s)| keep[i].then_some(s))
        .collect()
}
