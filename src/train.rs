//! Training loop, CLI surface, and checkpointing.

use burn::backend::Autodiff;
use burn::module::{AutodiffModule, Module};
use burn::nn::loss::{MseLoss, Reduction};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::record::{BinFileRecorder, FullPrecisionSettings, RecorderError};
use clap::Parser;
use std::fs;
use std::path::Path;

use crate::aug::AugmentConfig;
use crate::balance::{balance_samples, BalanceConfig};
use crate::batch::{BatchGenerator, GeneratorConfig};
use crate::log::load_driving_log;
use crate::model::{SteeringNet, SteeringNetConfig};
use crate::splits::split_samples;
use crate::TrainBackend;

type ADBackend = Autodiff<TrainBackend>;

#[derive(Parser, Debug)]
#[command(name = "train", about = "Train the behavioral-cloning steering model")]
pub struct TrainArgs {
    /// Data directory containing driving_log.csv and the recorded frames.
    #[arg(long, default_value = "data")]
    pub data_dir: String,
    /// Fraction of the balanced dataset reserved for validation.
    #[arg(long, default_value_t = 0.2)]
    pub test_size: f32,
    /// Dropout probability after the first dense layer.
    #[arg(long, default_value_t = 0.25)]
    pub keep_prob: f64,
    /// Number of epochs.
    #[arg(long, default_value_t = 1)]
    pub epochs: usize,
    /// Training steps (batches) per epoch; also bounds validation batches.
    #[arg(long, default_value_t = 10)]
    pub samples_per_epoch: usize,
    /// Batch size.
    #[arg(long, default_value_t = 40)]
    pub batch_size: usize,
    /// Write the checkpoint only when validation loss improves.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub save_best_only: bool,
    /// Learning rate.
    #[arg(long, default_value_t = 1.0e-4)]
    pub lr: f64,
    /// Base seed; balancer, split, and each generator derive their own
    /// stream from it.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
    /// Checkpoint output path.
    #[arg(long, default_value = "checkpoints/steernet.bin")]
    pub checkpoint_out: String,
}

pub fn run_train(args: TrainArgs) -> anyhow::Result<()> {
    print_params(&args);

    let data_dir = Path::new(&args.data_dir);
    let samples = load_driving_log(data_dir)?;
    println!("loaded {} log rows from {}", samples.len(), data_dir.display());

    let balanced = balance_samples(
        samples,
        &BalanceConfig {
            seed: args.seed,
            ..Default::default()
        },
    );
    println!("{} rows after steering-angle balancing", balanced.len());

    let (train, val) = split_samples(balanced, args.test_size, args.seed);
    println!("split: {} train / {} validation", train.len(), val.len());
    if train.is_empty() || val.is_empty() {
        anyhow::bail!("dataset too small to split: adjust --test-size or record more data");
    }

    let mut train_gen = BatchGenerator::new(
        train,
        GeneratorConfig {
            batch_size: args.batch_size,
            is_training: true,
            seed: args.seed.wrapping_add(1),
            augment: AugmentConfig::default(),
        },
    )?;
    let mut val_gen = BatchGenerator::new(
        val,
        GeneratorConfig {
            batch_size: args.batch_size,
            is_training: false,
            seed: args.seed.wrapping_add(2),
            augment: AugmentConfig::default(),
        },
    )?;

    if let Some(parent) = Path::new(&args.checkpoint_out).parent() {
        fs::create_dir_all(parent)?;
    }

    let device = <ADBackend as burn::tensor::backend::Backend>::Device::default();
    let mut model = SteeringNet::<ADBackend>::new(
        SteeringNetConfig {
            dropout: args.keep_prob,
        },
        &device,
    );
    let mut optim = AdamConfig::new().init();
    let mse = MseLoss::new();
    let mut best_val = f32::INFINITY;

    for epoch in 0..args.epochs {
        let mut losses = Vec::new();
        for _ in 0..args.samples_per_epoch {
            let batch = train_gen.next_batch::<ADBackend>(&device)?;
            let preds = model.forward(batch.images);
            let loss = mse.forward(preds, batch.angles, Reduction::Mean);
            let loss_detached = loss.clone().detach();
            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(args.lr, model, grads);
            losses.push(scalar(loss_detached));
        }
        let train_loss = mean(&losses);

        let model_valid = model.valid();
        let val_device = <TrainBackend as burn::tensor::backend::Backend>::Device::default();
        let mut val_losses = Vec::new();
        for _ in 0..args.samples_per_epoch {
            let batch = val_gen.next_batch::<TrainBackend>(&val_device)?;
            let preds = model_valid.forward(batch.images);
            let loss = mse.forward(preds, batch.angles, Reduction::Mean);
            val_losses.push(scalar(loss));
        }
        let val_loss = mean(&val_losses);

        let improved = val_loss < best_val;
        if improved {
            best_val = val_loss;
        }
        let save = !args.save_best_only || improved;
        if save {
            save_checkpoint(&model, &args.checkpoint_out)
                .map_err(|e| anyhow::anyhow!("failed to save checkpoint: {e}"))?;
        }
        println!(
            "epoch {epoch}: train loss {train_loss:.4}, val loss {val_loss:.4}{}",
            if save { " (checkpoint saved)" } else { "" }
        );
    }

    println!("done; best val loss {best_val:.4}");
    Ok(())
}

fn save_checkpoint(model: &SteeringNet<ADBackend>, path: &str) -> Result<(), RecorderError> {
    let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
    model.clone().save_file(Path::new(path), &recorder)
}

/// Load a trained model for inference on the default backend.
pub fn load_checkpoint<P: AsRef<Path>>(
    path: P,
    cfg: SteeringNetConfig,
    device: &<TrainBackend as burn::tensor::backend::Backend>::Device,
) -> Result<SteeringNet<TrainBackend>, RecorderError> {
    let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
    SteeringNet::<TrainBackend>::new(cfg, device).load_file(path.as_ref(), &recorder, device)
}

fn scalar<B: burn::tensor::backend::Backend>(t: burn::tensor::Tensor<B, 1>) -> f32 {
    t.into_data()
        .to_vec::<f32>()
        .unwrap_or_default()
        .into_iter()
        .next()
        .unwrap_or(0.0)
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}

fn print_params(args: &TrainArgs) {
    println!("{}", "-".repeat(30));
    println!("Parameters");
    println!("{}", "-".repeat(30));
    println!("{:<20} := {}", "data_dir", args.data_dir);
    println!("{:<20} := {}", "test_size", args.test_size);
    println!("{:<20} := {}", "keep_prob", args.keep_prob);
    println!("{:<20} := {}", "epochs", args.epochs);
    println!("{:<20} := {}", "samples_per_epoch", args.samples_per_epoch);
    println!("{:<20} := {}", "batch_size", args.batch_size);
    println!("{:<20} := {}", "save_best_only", args.save_best_only);
    println!("{:<20} := {}", "lr", args.lr);
    println!("{:<20} := {}", "seed", args.seed);
    println!("{:<20} := {}", "checkpoint_out", args.checkpoint_out);
    println!("{}", "-".repeat(30));
}
