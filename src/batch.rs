//! Infinite batch generation for training and validation.
//!
//! Each generator owns its RNG stream, draws samples with replacement, and
//! never runs out: the training loop bounds iteration with steps-per-epoch.

use crate::aug::{AugmentConfig, Augmentor};
use crate::types::{
    CameraView, DatasetError, DatasetResult, Sample, INPUT_CHANNELS, INPUT_HEIGHT, INPUT_WIDTH,
    RAW_HEIGHT, RAW_WIDTH,
};
use rand::{Rng, SeedableRng};
use std::path::Path;
use std::time::{Duration, Instant};

const DEFAULT_LOG_EVERY_SAMPLES: usize = 1000;

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub batch_size: usize,
    /// Training generators randomize; validation generators run the
    /// deterministic center-camera path.
    pub is_training: bool,
    pub seed: u64,
    pub augment: AugmentConfig,
}

#[derive(Debug)]
pub struct SteeringBatch<B: burn::tensor::backend::Backend> {
    /// Model-input images, shape [batch, 3, INPUT_HEIGHT, INPUT_WIDTH].
    pub images: burn::tensor::Tensor<B, 4>,
    /// Steering targets, shape [batch, 1].
    pub angles: burn::tensor::Tensor<B, 2>,
}

pub struct BatchGenerator {
    samples: Vec<Sample>,
    cfg: GeneratorConfig,
    augmentor: Augmentor,
    rng: rand::rngs::StdRng,
    images_buf: Vec<f32>,
    angles_buf: Vec<f32>,
    processed_samples: usize,
    processed_batches: usize,
    started: Instant,
    last_log: Instant,
    last_logged_samples: usize,
    log_every_samples: Option<usize>,
}

impl BatchGenerator {
    pub fn new(samples: Vec<Sample>, cfg: GeneratorConfig) -> DatasetResult<Self> {
        if samples.is_empty() {
            return Err(DatasetError::Other(
                "cannot build a batch generator over an empty dataset".to_string(),
            ));
        }
        if cfg.batch_size == 0 {
            return Err(DatasetError::Other("batch_size must be > 0".to_string()));
        }
        let log_every_samples = match std::env::var("STEERNET_LOG_EVERY") {
            Ok(val) => {
                if val.eq_ignore_ascii_case("off") || val.trim() == "0" {
                    None
                } else {
                    val.parse::<usize>().ok().filter(|v| *v > 0)
                }
            }
            Err(_) => Some(DEFAULT_LOG_EVERY_SAMPLES),
        };
        let now = Instant::now();
        Ok(Self {
            samples,
            augmentor: Augmentor::new(cfg.augment.clone()),
            rng: rand::rngs::StdRng::seed_from_u64(cfg.seed),
            cfg,
            images_buf: Vec::new(),
            angles_buf: Vec::new(),
            processed_samples: 0,
            processed_batches: 0,
            started: now,
            last_log: now,
            last_logged_samples: 0,
            log_every_samples,
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Assemble the next batch. Always yields exactly `batch_size` samples;
    /// an unreadable image fails the call rather than shrinking the batch.
    pub fn next_batch<B: burn::tensor::backend::Backend>(
        &mut self,
        device: &B::Device,
    ) -> DatasetResult<SteeringBatch<B>> {
        let batch_size = self.cfg.batch_size;
        self.images_buf.clear();
        self.angles_buf.clear();
        let elems = batch_size * INPUT_CHANNELS * (INPUT_WIDTH * INPUT_HEIGHT) as usize;
        if self.images_buf.capacity() < elems {
            self.images_buf.reserve(elems - self.images_buf.capacity());
        }

        for _ in 0..batch_size {
            let idx = self.rng.random_range(0..self.samples.len());
            let (view, correction) = if self.cfg.is_training {
                self.augmentor.pick_view(&mut self.rng)
            } else {
                (CameraView::Center, 0.0)
            };
            let sample = &self.samples[idx];
            let img = load_frame(sample.view_path(view))?;
            let (pixels, angle) = self.augmentor.apply(
                img,
                sample.steering + correction,
                self.cfg.is_training,
                &mut self.rng,
            );
            self.images_buf.extend_from_slice(&pixels);
            self.angles_buf.push(angle);
        }

        let images =
            burn::tensor::Tensor::<B, 1>::from_floats(self.images_buf.as_slice(), device)
                .reshape([
                    batch_size,
                    INPUT_CHANNELS,
                    INPUT_HEIGHT as usize,
                    INPUT_WIDTH as usize,
                ]);
        let angles =
            burn::tensor::Tensor::<B, 1>::from_floats(self.angles_buf.as_slice(), device)
                .reshape([batch_size, 1]);

        self.processed_samples += batch_size;
        self.processed_batches += 1;
        self.maybe_log_progress();

        Ok(SteeringBatch { images, angles })
    }

    fn maybe_log_progress(&mut self) {
        let Some(threshold) = self.log_every_samples else {
            return;
        };
        let processed_since = self
            .processed_samples
            .saturating_sub(self.last_logged_samples);
        let should_log =
            processed_since >= threshold || self.last_log.elapsed() >= Duration::from_secs(30);
        if !should_log {
            return;
        }
        let secs = self.started.elapsed().as_secs_f32().max(0.001);
        let rate = self.processed_samples as f32 / secs;
        eprintln!(
            "[generator] batches={} samples={} elapsed={:.1}s rate={:.1} img/s",
            self.processed_batches, self.processed_samples, secs, rate
        );
        self.last_logged_samples = self.processed_samples;
        self.last_log = Instant::now();
    }
}

/// Read one raw simulator frame, enforcing the fixed frame geometry.
fn load_frame(path: &Path) -> DatasetResult<image::RgbImage> {
    let img = image::open(path)
        .map_err(|source| DatasetError::Image {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgb8();
    let (width, height) = img.dimensions();
    if width != RAW_WIDTH || height != RAW_HEIGHT {
        return Err(DatasetError::FrameSize {
            path: path.to_path_buf(),
            width,
            height,
        });
    }
    Ok(img)
}
