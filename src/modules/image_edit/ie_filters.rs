//! Destructive per-pixel filters.
//!
//! All filters work on straight RGBA and leave alpha untouched. The combined
//! pass always runs brightness, then contrast, then the effect.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tracing::debug;

use super::ie_helpers::{clamp_channel, luma};
use crate::error::{EditorError, Result};

pub const DELTA_RANGE: RangeInclusive<i32> = -255..=255;

/// Effects that are accepted and recorded but do not touch pixels yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaceholderEffect {
    Blur, Sharpen, Saturation, Hue, Noise, Posterize, Emboss,
    EdgeDetect, OilPaint, Solarize, Vignette, Pixelate, Distort, Warp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterKind {
    /// Brightness and contrast only.
    Adjust,
    Grayscale,
    Invert,
    Sepia,
    Unimplemented(PlaceholderEffect),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    pub brightness: i32,
    pub contrast: i32,
}

impl FilterParams {
    pub fn new(brightness: i32, contrast: i32) -> Self { Self { brightness, contrast } }

    pub fn validate(&self) -> Result<()> {
        check_delta("brightness", self.brightness)?;
        check_delta("contrast", self.contrast)
    }
}

fn check_delta(field: &'static str, delta: i32) -> Result<()> {
    if DELTA_RANGE.contains(&delta) { return Ok(()); }
    Err(EditorError::validation(field, format!("{} is outside {}..={}", delta, DELTA_RANGE.start(), DELTA_RANGE.end())))
}

type Effect = fn([f32; 3]) -> [f32; 3];

fn keep(rgb: [f32; 3]) -> [f32; 3] { rgb }

fn gray(rgb: [f32; 3]) -> [f32; 3] {
    let y: f32 = luma(rgb[0], rgb[1], rgb[2]);
    [y, y, y]
}

fn negate(rgb: [f32; 3]) -> [f32; 3] { [255.0 - rgb[0], 255.0 - rgb[1], 255.0 - rgb[2]] }

fn tone_sepia(rgb: [f32; 3]) -> [f32; 3] {
    let [r, g, b] = rgb;
    [
        (r * 0.393 + g * 0.769 + b * 0.189).min(255.0),
        (r * 0.349 + g * 0.686 + b * 0.168).min(255.0),
        (r * 0.272 + g * 0.534 + b * 0.131).min(255.0),
    ]
}

fn contrast_factor(delta: i32) -> f32 {
    let d: f32 = delta as f32;
    (259.0 * (d + 255.0)) / (255.0 * (259.0 - d))
}

fn run(buf: &mut RgbaImage, brightness: i32, contrast: i32, effect: Effect) {
    let shift: f32 = brightness as f32;
    let factor: f32 = contrast_factor(contrast);
    for pixel in buf.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let mut rgb: [f32; 3] = [r as f32, g as f32, b as f32];
        for c in &mut rgb {
            let bright: f32 = (*c + shift).clamp(0.0, 255.0);
            *c = (factor * (bright - 128.0) + 128.0).clamp(0.0, 255.0);
        }
        let [r2, g2, b2] = effect(rgb);
        pixel.0 = [clamp_channel(r2), clamp_channel(g2), clamp_channel(b2), a];
    }
}

/// Combined filter pass. Parameters are validated before any pixel changes.
pub fn apply(buf: &mut RgbaImage, kind: FilterKind, params: FilterParams) -> Result<()> {
    params.validate()?;
    let effect: Effect = match kind {
        FilterKind::Unimplemented(effect) => {
            debug!(?effect, "placeholder filter, pixels left untouched");
            return Ok(());
        }
        FilterKind::Adjust => keep,
        FilterKind::Grayscale => gray,
        FilterKind::Invert => negate,
        FilterKind::Sepia => tone_sepia,
    };
    run(buf, params.brightness, params.contrast, effect);
    Ok(())
}

pub fn brightness(buf: &mut RgbaImage, delta: i32) -> Result<()> {
    check_delta("brightness", delta)?;
    run(buf, delta, 0, keep);
    Ok(())
}

/// `delta` is limited to `[-255, 255]`, where the factor's denominator stays positive.
pub fn contrast(buf: &mut RgbaImage, delta: i32) -> Result<()> {
    check_delta("contrast", delta)?;
    run(buf, 0, delta, keep);
    Ok(())
}

pub fn grayscale(buf: &mut RgbaImage) { run(buf, 0, 0, gray); }

pub fn invert(buf: &mut RgbaImage) {
    for pixel in buf.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        pixel.0 = [255 - r, 255 - g, 255 - b, a];
    }
}

pub fn sepia(buf: &mut RgbaImage) { run(buf, 0, 0, tone_sepia); }
