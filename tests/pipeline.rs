//! Integration tests for the log -> balance -> split -> batch pipeline over
//! a synthetic on-disk dataset.

use image::{Rgb, RgbImage};
use std::fs;
use std::io::Write;
use std::path::Path;
use steernet::{
    load_driving_log, AugmentConfig, BatchGenerator, DatasetError, GeneratorConfig,
    INPUT_CHANNELS, INPUT_HEIGHT, INPUT_WIDTH, RAW_HEIGHT, RAW_WIDTH,
};

/// Write a synthetic recording: `frame_count` rows in driving_log.csv plus
/// three camera PNGs per row under IMG/.
fn create_synthetic_recording(data_dir: &Path, frame_count: usize) -> anyhow::Result<()> {
    let img_dir = data_dir.join("IMG");
    fs::create_dir_all(&img_dir)?;

    let mut log = fs::File::create(data_dir.join("driving_log.csv"))?;
    for i in 0..frame_count {
        let steering = -0.5 + i as f32 / frame_count as f32;
        for view in ["center", "left", "right"] {
            let mut img = RgbImage::new(RAW_WIDTH, RAW_HEIGHT);
            for pixel in img.pixels_mut() {
                *pixel = Rgb([(i * 20) as u8, 100, 180]);
            }
            img.save(img_dir.join(format!("{view}_{i:05}.png")))?;
        }
        writeln!(
            log,
            "IMG/center_{i:05}.png,IMG/left_{i:05}.png,IMG/right_{i:05}.png,{steering},0.5,0.0,22.0"
        )?;
    }
    Ok(())
}

fn generator_cfg(is_training: bool, seed: u64, batch_size: usize) -> GeneratorConfig {
    GeneratorConfig {
        batch_size,
        is_training,
        seed,
        augment: AugmentConfig::default(),
    }
}

#[test]
fn log_rows_load_with_resolved_paths() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    create_synthetic_recording(tmp.path(), 5)?;

    let samples = load_driving_log(tmp.path())?;
    assert_eq!(samples.len(), 5);
    assert!(samples[0].center.starts_with(tmp.path()));
    assert!(samples[0].center.exists());
    assert_eq!(samples[2].throttle, 0.5);
    assert_eq!(samples[2].speed, 22.0);
    Ok(())
}

#[test]
fn malformed_log_row_fails_the_load() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    fs::write(
        tmp.path().join("driving_log.csv"),
        "a.png,b.png,c.png,not_a_number,0.0,0.0,10.0\n",
    )?;
    let err = load_driving_log(tmp.path()).unwrap_err();
    assert!(matches!(err, DatasetError::Log { .. }));

    fs::write(tmp.path().join("driving_log.csv"), "a.png,b.png\n")?;
    assert!(load_driving_log(tmp.path()).is_err());
    Ok(())
}

#[test]
fn missing_log_is_an_io_error() {
    let tmp = tempfile::tempdir().unwrap();
    let err = load_driving_log(&tmp.path().join("nope")).unwrap_err();
    assert!(matches!(err, DatasetError::Io { .. }));
}

#[test]
fn generator_yields_fixed_shapes_indefinitely() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    create_synthetic_recording(tmp.path(), 6)?;
    let samples = load_driving_log(tmp.path())?;

    let device = Default::default();
    let mut generator = BatchGenerator::new(samples, generator_cfg(true, 3, 4))?;
    // More draws than the dataset holds: sampling is with replacement, so
    // the generator never runs dry.
    for _ in 0..30 {
        let batch = generator.next_batch::<steernet::TrainBackend>(&device)?;
        assert_eq!(
            batch.images.dims(),
            [4, INPUT_CHANNELS, INPUT_HEIGHT as usize, INPUT_WIDTH as usize]
        );
        assert_eq!(batch.angles.dims(), [4, 1]);
    }
    Ok(())
}

#[test]
fn batch_size_larger_than_dataset_still_fills() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    create_synthetic_recording(tmp.path(), 2)?;
    let samples = load_driving_log(tmp.path())?;

    let device = Default::default();
    let mut generator = BatchGenerator::new(samples, generator_cfg(false, 0, 8))?;
    let batch = generator.next_batch::<steernet::TrainBackend>(&device)?;
    assert_eq!(batch.images.dims()[0], 8);
    Ok(())
}

#[test]
fn same_seed_generators_draw_identical_batches() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    create_synthetic_recording(tmp.path(), 6)?;
    let samples = load_driving_log(tmp.path())?;

    let device = Default::default();
    let mut gen_a = BatchGenerator::new(samples.clone(), generator_cfg(true, 42, 3))?;
    let mut gen_b = BatchGenerator::new(samples, generator_cfg(true, 42, 3))?;
    for _ in 0..5 {
        let a = gen_a.next_batch::<steernet::TrainBackend>(&device)?;
        let b = gen_b.next_batch::<steernet::TrainBackend>(&device)?;
        assert_eq!(
            a.angles.into_data().to_vec::<f32>().unwrap(),
            b.angles.into_data().to_vec::<f32>().unwrap()
        );
        assert_eq!(
            a.images.into_data().to_vec::<f32>().unwrap(),
            b.images.into_data().to_vec::<f32>().unwrap()
        );
    }
    Ok(())
}

#[test]
fn validation_angles_match_the_log() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    create_synthetic_recording(tmp.path(), 4)?;
    let samples = load_driving_log(tmp.path())?;
    let logged: Vec<f32> = samples.iter().map(|s| s.steering).collect();

    let device = Default::default();
    let mut generator = BatchGenerator::new(samples, generator_cfg(false, 7, 6))?;
    let batch = generator.next_batch::<steernet::TrainBackend>(&device)?;
    for angle in batch.angles.into_data().to_vec::<f32>().unwrap() {
        assert!(
            logged.iter().any(|&a| (a - angle).abs() < 1e-6),
            "validation emitted an angle {angle} not present in the log"
        );
    }
    Ok(())
}

#[test]
fn unreadable_image_fails_the_batch() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    create_synthetic_recording(tmp.path(), 2)?;
    // Point every row at a frame that does not exist.
    fs::write(
        tmp.path().join("driving_log.csv"),
        "IMG/gone.png,IMG/gone.png,IMG/gone.png,0.0,0.0,0.0,10.0\n",
    )?;
    let samples = load_driving_log(tmp.path())?;

    let device = Default::default();
    let mut generator = BatchGenerator::new(samples, generator_cfg(false, 0, 2))?;
    let err = generator
        .next_batch::<steernet::TrainBackend>(&device)
        .unwrap_err();
    assert!(matches!(err, DatasetError::Image { .. }));
    Ok(())
}

#[test]
fn wrong_frame_geometry_is_rejected() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let img_dir = tmp.path().join("IMG");
    fs::create_dir_all(&img_dir)?;
    RgbImage::new(64, 64).save(img_dir.join("small.png"))?;
    fs::write(
        tmp.path().join("driving_log.csv"),
        "IMG/small.png,IMG/small.png,IMG/small.png,0.0,0.0,0.0,10.0\n",
    )?;
    let samples = load_driving_log(tmp.path())?;

    let device = Default::default();
    let mut generator = BatchGenerator::new(samples, generator_cfg(false, 0, 1))?;
    let err = generator
        .next_batch::<steernet::TrainBackend>(&device)
        .unwrap_err();
    assert!(matches!(err, DatasetError::FrameSize { .. }));
    Ok(())
}

#[test]
fn empty_dataset_is_rejected_up_front() {
    assert!(BatchGenerator::new(Vec::new(), generator_cfg(true, 0, 4)).is_err());
}
