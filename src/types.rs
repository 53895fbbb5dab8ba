//! Core types, error definitions, and fixed image geometry for steernet.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Raw simulator frame width in pixels.
pub const RAW_WIDTH: u32 = 320;
/// Raw simulator frame height in pixels.
pub const RAW_HEIGHT: u32 = 160;

/// Rows removed from the top of the frame (sky/horizon).
pub const CROP_TOP: u32 = 75;
/// Rows removed from the bottom of the frame (hood).
pub const CROP_BOTTOM: u32 = 25;
/// Columns removed from each side of the frame.
pub const CROP_SIDE: u32 = 10;

/// Model input width after the fixed crop.
pub const INPUT_WIDTH: u32 = RAW_WIDTH - 2 * CROP_SIDE;
/// Model input height after the fixed crop.
pub const INPUT_HEIGHT: u32 = RAW_HEIGHT - CROP_TOP - CROP_BOTTOM;
/// Model input channels (RGB).
pub const INPUT_CHANNELS: usize = 3;

/// Steering command range emitted by the simulator.
pub const STEERING_MIN: f32 = -1.0;
pub const STEERING_MAX: f32 = 1.0;

pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("driving log parse error at {path}: {source}")]
    Log {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("image decode error at {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("unexpected frame size {width}x{height} at {path} (expected {RAW_WIDTH}x{RAW_HEIGHT})")]
    FrameSize {
        path: PathBuf,
        width: u32,
        height: u32,
    },
    #[error("{0}")]
    Other(String),
}

/// One row of the driving log as recorded by the simulator.
#[derive(Debug, Clone, Deserialize)]
pub struct LogRecord {
    pub center: String,
    pub left: String,
    pub right: String,
    pub steering: f32,
    pub throttle: f32,
    pub brake: f32,
    pub speed: f32,
}

/// A recorded frame with its three camera views resolved against the data
/// directory. Immutable once loaded; only the balancer drops entries.
#[derive(Debug, Clone)]
pub struct Sample {
    pub center: PathBuf,
    pub left: PathBuf,
    pub right: PathBuf,
    pub steering: f32,
    pub throttle: f32,
    pub brake: f32,
    pub speed: f32,
}

impl Sample {
    pub fn view_path(&self, view: CameraView) -> &PathBuf {
        match view {
            CameraView::Center => &self.center,
            CameraView::Left => &self.left,
            CameraView::Right => &self.right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraView {
    Center,
    Left,
    Right,
}

impl CameraView {
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraView::Center => "center",
            CameraView::Left => "left",
            CameraView::Right => "right",
        }
    }
}
