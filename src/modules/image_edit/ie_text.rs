use ab_glyph::{Font as AbFont, FontRef, PxScale, ScaleFont};
use image::RgbaImage;

use super::ie_helpers::blend_over;
use crate::error::{EditorError, Result};
use crate::settings::RgbaColor;

pub(super) static FONT_DEJAVU: &[u8] = include_bytes!("../../../assets/DejaVu/DejaVuSans.ttf");

pub(super) const TEXT_PX: f32 = 30.0;
/// Each character reserves this much width in the layer.
pub(super) const TEXT_CELL_WIDTH: u32 = 20;
pub(super) const TEXT_HEIGHT: u32 = 40;
pub(super) const TEXT_BASELINE: f32 = 30.0;

/// Rasterizes a single line of `text` into a `chars * 20 x 40` buffer.
/// Glyphs that run past the right edge are clipped.
pub(super) fn render_text(text: &str, font_data: &[u8], color: RgbaColor) -> Result<RgbaImage> {
    let chars: u32 = text.chars().count() as u32;
    if chars == 0 { return Err(EditorError::validation("text", "must not be empty")); }
    let font: FontRef<'_> = FontRef::try_from_slice(font_data).map_err(|e| EditorError::validation("font", e.to_string()))?;

    let scale: PxScale = PxScale::from(TEXT_PX);
    let scaled: ab_glyph::PxScaleFont<&FontRef<'_>> = font.as_scaled(scale);
    let mut buf: RgbaImage = RgbaImage::new(chars * TEXT_CELL_WIDTH, TEXT_HEIGHT);
    let (bw, bh) = (buf.width() as i32, buf.height() as i32);
    let rgba: [u8; 4] = color.to_array();

    let mut cx: f32 = 0.0;
    for ch in text.chars() {
        let gid: ab_glyph::GlyphId = font.glyph_id(ch);
        let glyph: ab_glyph::Glyph = gid.with_scale_and_position(scale, ab_glyph::point(cx, 0.0));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds: ab_glyph::Rect = outlined.px_bounds();
            outlined.draw(|gx, gy, cov| {
                let tx: i32 = (bounds.min.x + gx as f32) as i32;
                let ty: i32 = (TEXT_BASELINE + bounds.min.y + gy as f32) as i32;
                if tx < 0 || ty < 0 || tx >= bw || ty >= bh { return; }
                let pixel = buf.get_pixel_mut(tx as u32, ty as u32);
                pixel.0 = blend_over(pixel.0, rgba, cov.clamp(0.0, 1.0));
            });
        }
        cx += scaled.h_advance(gid);
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_size_follows_character_count() {
        let buf = render_text("Hi!", FONT_DEJAVU, RgbaColor::BLACK).unwrap();
        assert_eq!(buf.dimensions(), (60, 40));
        assert!(buf.pixels().any(|p| p.0[3] > 0));
        assert!(buf.pixels().filter(|p| p.0[3] > 0).all(|p| p.0[..3] == [0, 0, 0]));
    }

    #[test]
    fn glyphs_sit_above_the_baseline() {
        let buf = render_text("H", FONT_DEJAVU, RgbaColor::WHITE).unwrap();
        let inked_rows: Vec<u32> = (0..buf.height())
            .filter(|&y| (0..buf.width()).any(|x| buf.get_pixel(x, y).0[3] > 0))
            .collect();
        assert!(!inked_rows.is_empty());
        assert!(inked_rows.iter().all(|&y| y < 31));
    }

    #[test]
    fn empty_text_and_bad_fonts_are_rejected() {
        assert!(matches!(render_text("", FONT_DEJAVU, RgbaColor::BLACK), Err(EditorError::Validation { field: "text", .. })));
        assert!(matches!(render_text("a", b"not a font", RgbaColor::BLACK), Err(EditorError::Validation { field: "font", .. })));
    }
}
