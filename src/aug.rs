//! Per-sample image augmentation.
//!
//! Training samples go through camera selection, a random translation, the
//! fixed crop, an optional horizontal flip, and brightness/contrast jitter.
//! Validation samples get the deterministic path only (center camera, fixed
//! crop) and consume no randomness.

use crate::types::{
    CameraView, CROP_SIDE, CROP_TOP, INPUT_HEIGHT, INPUT_WIDTH, STEERING_MAX, STEERING_MIN,
};
use image::RgbImage;
use rand::Rng;

#[derive(Debug, Clone)]
pub struct AugmentConfig {
    /// Relative weights for the center/left/right camera pick.
    pub view_weights: [f32; 3],
    /// Steering correction applied for the left (+) and right (−) cameras.
    pub side_correction: f32,
    /// Max horizontal shift in pixels (drawn uniformly in ±).
    pub max_translate_x: i32,
    /// Max vertical shift in pixels (drawn uniformly in ±).
    pub max_translate_y: i32,
    /// Steering adjustment per pixel of horizontal shift.
    pub angle_per_px: f32,
    /// Probability of a horizontal flip (negating the angle).
    pub flip_prob: f32,
    /// Probability of brightness/contrast jitter.
    pub jitter_prob: f32,
    /// Max jitter scale for brightness/contrast.
    pub jitter_strength: f32,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            view_weights: [0.4, 0.3, 0.3],
            side_correction: 0.2,
            max_translate_x: 40,
            max_translate_y: 10,
            angle_per_px: 0.002,
            flip_prob: 0.5,
            jitter_prob: 0.5,
            jitter_strength: 0.3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Augmentor {
    cfg: AugmentConfig,
}

impl Augmentor {
    pub fn new(cfg: AugmentConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &AugmentConfig {
        &self.cfg
    }

    /// Weighted camera pick, returning the view and its steering correction.
    pub fn pick_view(&self, rng: &mut dyn rand::RngCore) -> (CameraView, f32) {
        let [c, l, r] = self.cfg.view_weights;
        let total = (c + l + r).max(f32::EPSILON);
        let roll = rng.random_range(0.0..total);
        if roll < c {
            (CameraView::Center, 0.0)
        } else if roll < c + l {
            (CameraView::Left, self.cfg.side_correction)
        } else {
            (CameraView::Right, -self.cfg.side_correction)
        }
    }

    /// Transform one raw frame into model-input pixels and an adjusted angle.
    ///
    /// Pure over (inputs, RNG stream); the RNG is untouched when
    /// `is_training` is false.
    pub fn apply(
        &self,
        img: RgbImage,
        angle: f32,
        is_training: bool,
        rng: &mut dyn rand::RngCore,
    ) -> (Vec<f32>, f32) {
        if !is_training {
            return (image_to_chw(&crop_to_input(&img)), angle);
        }

        let (img, angle) = translate(
            img,
            angle,
            self.cfg.max_translate_x,
            self.cfg.max_translate_y,
            self.cfg.angle_per_px,
            rng,
        );
        let mut img = crop_to_input(&img);
        let angle = maybe_flip(&mut img, angle, self.cfg.flip_prob, rng);
        maybe_jitter(&mut img, self.cfg.jitter_prob, self.cfg.jitter_strength, rng);

        (
            image_to_chw(&img),
            angle.clamp(STEERING_MIN, STEERING_MAX),
        )
    }
}

/// The fixed crop down to the model input window.
pub fn crop_to_input(img: &RgbImage) -> RgbImage {
    image::imageops::crop_imm(img, CROP_SIDE, CROP_TOP, INPUT_WIDTH, INPUT_HEIGHT).to_image()
}

/// Shift the frame on a black canvas, adjusting the angle proportionally to
/// the horizontal component.
pub(crate) fn translate(
    img: RgbImage,
    angle: f32,
    max_x: i32,
    max_y: i32,
    angle_per_px: f32,
    rng: &mut dyn rand::RngCore,
) -> (RgbImage, f32) {
    if max_x <= 0 && max_y <= 0 {
        return (img, angle);
    }
    let tx = if max_x > 0 {
        rng.random_range(-max_x..=max_x)
    } else {
        0
    };
    let ty = if max_y > 0 {
        rng.random_range(-max_y..=max_y)
    } else {
        0
    };
    let mut canvas = RgbImage::new(img.width(), img.height());
    image::imageops::replace(&mut canvas, &img, tx as i64, ty as i64);
    (canvas, angle + tx as f32 * angle_per_px)
}

/// Flip horizontally with probability `prob`, exactly negating the angle.
pub(crate) fn maybe_flip(
    img: &mut RgbImage,
    angle: f32,
    prob: f32,
    rng: &mut dyn rand::RngCore,
) -> f32 {
    if prob <= 0.0 {
        return angle;
    }
    if rng.random_range(0.0..1.0) < prob {
        image::imageops::flip_horizontal_in_place(img);
        -angle
    } else {
        angle
    }
}

pub(crate) fn maybe_jitter(
    img: &mut RgbImage,
    prob: f32,
    strength: f32,
    rng: &mut dyn rand::RngCore,
) {
    if prob <= 0.0 || strength <= 0.0 {
        return;
    }
    if rng.random_range(0.0..1.0) >= prob {
        return;
    }
    let bright = 1.0 + rng.random_range(-strength..strength);
    let contrast = 1.0 + rng.random_range(-strength..strength);
    for pixel in img.pixels_mut() {
        for c in 0..3 {
            let v = pixel[c] as f32 / 255.0;
            let mut v = (v - 0.5) * contrast + 0.5;
            v *= bright;
            pixel[c] = (v.clamp(0.0, 1.0) * 255.0) as u8;
        }
    }
}

/// Pack pixels into CHW order, normalized to [0, 1].
pub(crate) fn image_to_chw(img: &RgbImage) -> Vec<f32> {
    let (width, height) = img.dimensions();
    let plane = (width * height) as usize;
    let mut chw = vec![0.0f32; plane * 3];
    for (x, y, pixel) in img.enumerate_pixels() {
        let base = (y * width + x) as usize;
        chw[base] = pixel[0] as f32 / 255.0;
        chw[plane + base] = pixel[1] as f32 / 255.0;
        chw[2 * plane + base] = pixel[2] as f32 / 255.0;
    }
    chw
}
