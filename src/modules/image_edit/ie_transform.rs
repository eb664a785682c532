use image::{imageops, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EditorError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaceholderTransform { Perspective, Resize }

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transform {
    /// Keep the top-left `width x height` region.
    Crop { width: u32, height: u32 },
    /// Keep the top-left region scaled by the ratio on both axes.
    CropRatio(f32),
    Rotate90,
    Rotate270,
    FlipHorizontal,
    FlipVertical,
    Unimplemented(PlaceholderTransform),
}

impl Transform {
    pub const DEFAULT_CROP_RATIO: f32 = 0.8;

    pub fn crop() -> Self { Transform::CropRatio(Self::DEFAULT_CROP_RATIO) }
}

pub fn crop(buf: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage> {
    if width == 0 || height == 0 {
        return Err(EditorError::validation("crop size", "width and height must be at least 1"));
    }
    if width > buf.width() || height > buf.height() {
        return Err(EditorError::validation(
            "crop size",
            format!("{}x{} does not fit inside {}x{}", width, height, buf.width(), buf.height()),
        ));
    }
    Ok(imageops::crop_imm(buf, 0, 0, width, height).to_image())
}

pub fn crop_ratio(buf: &RgbaImage, ratio: f32) -> Result<RgbaImage> {
    if !(ratio > 0.0 && ratio <= 1.0) {
        return Err(EditorError::validation("crop ratio", format!("{} is outside (0, 1]", ratio)));
    }
    let width: u32 = ((buf.width() as f32 * ratio).floor() as u32).max(1);
    let height: u32 = ((buf.height() as f32 * ratio).floor() as u32).max(1);
    crop(buf, width, height)
}

/// Clockwise; output is `height x width`.
pub fn rotate90(buf: &RgbaImage) -> RgbaImage { imageops::rotate90(buf) }

pub fn rotate270(buf: &RgbaImage) -> RgbaImage { imageops::rotate270(buf) }

pub fn flip_horizontal(buf: &RgbaImage) -> RgbaImage { imageops::flip_horizontal(buf) }

pub fn flip_vertical(buf: &RgbaImage) -> RgbaImage { imageops::flip_vertical(buf) }

/// Resamples `buf`. `Ok(None)` means the transform is a placeholder and the
/// buffer stays as it is.
pub fn apply(buf: &RgbaImage, transform: Transform) -> Result<Option<RgbaImage>> {
    let out: RgbaImage = match transform {
        Transform::Crop { width, height } => crop(buf, width, height)?,
        Transform::CropRatio(ratio) => crop_ratio(buf, ratio)?,
        Transform::Rotate90 => rotate90(buf),
        Transform::Rotate270 => rotate270(buf),
        Transform::FlipHorizontal => flip_horizontal(buf),
        Transform::FlipVertical => flip_vertical(buf),
        Transform::Unimplemented(kind) => {
            debug!(?kind, "placeholder transform, buffer left untouched");
            return Ok(None);
        }
    };
    Ok(Some(out))
}
