use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use crate::error::{EditorError, Result};

const ICO_MAX_SIDE: u32 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Jpeg,
    #[default]
    Png,
    Webp,
    Bmp,
    Tiff,
    Ico,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Jpeg => "JPEG",
            ExportFormat::Png => "PNG",
            ExportFormat::Webp => "WebP",
            ExportFormat::Bmp => "BMP",
            ExportFormat::Tiff => "TIFF",
            ExportFormat::Ico => "ICO",
        }
    }

    pub fn extension(&self) -> &str {
        match self {
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Png => "png",
            ExportFormat::Webp => "webp",
            ExportFormat::Bmp => "bmp",
            ExportFormat::Tiff => "tiff",
            ExportFormat::Ico => "ico",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ExportFormat::Jpeg),
            "png" => Some(ExportFormat::Png),
            "webp" => Some(ExportFormat::Webp),
            "bmp" => Some(ExportFormat::Bmp),
            "tif" | "tiff" => Some(ExportFormat::Tiff),
            "ico" => Some(ExportFormat::Ico),
            _ => None,
        }
    }

    pub fn all() -> Vec<ExportFormat> {
        vec![
            ExportFormat::Jpeg,
            ExportFormat::Png,
            ExportFormat::Webp,
            ExportFormat::Bmp,
            ExportFormat::Tiff,
            ExportFormat::Ico,
        ]
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            ExportFormat::Jpeg => ImageFormat::Jpeg,
            ExportFormat::Png => ImageFormat::Png,
            ExportFormat::Webp => ImageFormat::WebP,
            ExportFormat::Bmp => ImageFormat::Bmp,
            ExportFormat::Tiff => ImageFormat::Tiff,
            ExportFormat::Ico => ImageFormat::Ico,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub jpeg_quality: u8,
    /// 0..=3 fast, 4..=6 default, anything higher best.
    pub png_compression: u8,
    pub auto_scale_ico: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { format: ExportFormat::Png, jpeg_quality: 90, png_compression: 6, auto_scale_ico: true }
    }
}

/// Rasterizes encoded image bytes into an RGBA buffer.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage> {
    let img: DynamicImage = image::load_from_memory(bytes).map_err(EditorError::Decode)?;
    Ok(img.to_rgba8())
}

/// Encodes a buffer into the format named by `options`.
pub fn encode(buf: &RgbaImage, options: &ExportOptions) -> Result<Vec<u8>> {
    let mut export_img: DynamicImage = DynamicImage::ImageRgba8(buf.clone());

    if options.format == ExportFormat::Ico
        && (export_img.width() > ICO_MAX_SIDE || export_img.height() > ICO_MAX_SIDE)
    {
        if !options.auto_scale_ico {
            return Err(EditorError::validation(
                "ico size",
                format!(
                    "ICO requires dimensions <= {}px, surface is {}x{}",
                    ICO_MAX_SIDE, export_img.width(), export_img.height()
                ),
            ));
        }
        let scale: f32 = ICO_MAX_SIDE as f32 / export_img.width().max(export_img.height()) as f32;
        let new_width: u32 = ((export_img.width() as f32 * scale) as u32).max(1);
        let new_height: u32 = ((export_img.height() as f32 * scale) as u32).max(1);
        export_img = export_img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3);
    }

    let mut out: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    match options.format {
        ExportFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb: image::RgbImage = export_img.to_rgb8();
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, options.jpeg_quality.clamp(1, 100))
                .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
                .map_err(EditorError::Encode)?;
        }
        ExportFormat::Png => {
            let compression = match options.png_compression {
                0..=3 => image::codecs::png::CompressionType::Fast,
                4..=6 => image::codecs::png::CompressionType::Default,
                _ => image::codecs::png::CompressionType::Best,
            };
            image::codecs::png::PngEncoder::new_with_quality(
                &mut out,
                compression,
                image::codecs::png::FilterType::Adaptive,
            )
            .write_image(
                export_img.as_bytes(),
                export_img.width(),
                export_img.height(),
                export_img.color().into(),
            )
            .map_err(EditorError::Encode)?;
        }
        ExportFormat::Webp | ExportFormat::Bmp | ExportFormat::Tiff | ExportFormat::Ico => {
            export_img.write_to(&mut out, options.format.image_format()).map_err(EditorError::Encode)?;
        }
    }

    Ok(out.into_inner())
}
