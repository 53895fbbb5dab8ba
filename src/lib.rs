//! Behavioral-cloning steering trainer.
//!
//! This crate provides:
//! - Driving-log ingestion and steering-angle balancing
//! - Randomized image augmentation for training samples
//! - Infinite Burn-compatible batch generation
//! - A convolutional steering regressor and its training loop

#![recursion_limit = "256"]

pub mod aug;
pub mod balance;
pub mod batch;
pub mod log;
pub mod model;
pub mod splits;
pub mod train;
pub mod types;

pub use aug::{AugmentConfig, Augmentor};
pub use balance::{balance_samples, bucket_index, BalanceConfig};
pub use batch::{BatchGenerator, GeneratorConfig, SteeringBatch};
pub use log::load_driving_log;
pub use model::{SteeringNet, SteeringNetConfig};
pub use splits::split_samples;
pub use train::{load_checkpoint, run_train, TrainArgs};
pub use types::*;

/// Backend used for training and evaluation.
pub type TrainBackend = burn_ndarray::NdArray<f32>;
