use image::RgbaImage;
use serde::{Deserialize, Serialize};

use super::ie_helpers::{blend_over, distance_to_segment, erase};
use super::ie_layers::LayerId;
use crate::settings::{EditorSettings, RgbaColor};

/// Tools that only lay down a faint generic stroke for now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegradedTool { Clone, Heal, Smudge, Dodge, Burn, Sponge }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Brush,
    Eraser,
    Degraded(DegradedTool),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct StrokeStyle {
    color: [u8; 4],
    radius: f32,
    alpha: f32,
    erase: bool,
}

impl StrokeStyle {
    pub(super) fn for_tool(tool: ToolKind, settings: &EditorSettings) -> Self {
        let radius: f32 = (settings.brush_width / 2.0).max(0.5);
        let (color, alpha, erase) = match tool {
            ToolKind::Brush => (settings.brush_color, 1.0, false),
            ToolKind::Eraser => (RgbaColor::BLACK, 1.0, true),
            ToolKind::Degraded(DegradedTool::Dodge) => (RgbaColor::WHITE, settings.degraded_alpha, false),
            ToolKind::Degraded(_) => (RgbaColor::BLACK, settings.degraded_alpha, false),
        };
        Self { color: color.to_array(), radius, alpha: alpha.clamp(0.0, 1.0), erase }
    }
}

/// A stroke in progress; points are kept in surface coordinates.
#[derive(Debug, Clone)]
pub(super) struct Stroke {
    pub layer: LayerId,
    pub tool: ToolKind,
    pub style: StrokeStyle,
    pub last: (f32, f32),
    pub segments: usize,
}

/// Paints one round-capped segment into `buf`. Each pixel is blended at most
/// once per segment, so a translucent stroke does not build up within it.
pub(super) fn paint_segment(buf: &mut RgbaImage, from: (f32, f32), to: (f32, f32), style: &StrokeStyle) {
    let (width, height) = buf.dimensions();
    if width == 0 || height == 0 { return; }
    let r: f32 = style.radius;

    let min_x: f32 = (from.0.min(to.0) - r).floor().max(0.0);
    let min_y: f32 = (from.1.min(to.1) - r).floor().max(0.0);
    let max_x: f32 = (from.0.max(to.0) + r).ceil().min(width as f32);
    let max_y: f32 = (from.1.max(to.1) + r).ceil().min(height as f32);
    if min_x >= max_x || min_y >= max_y { return; }

    for py in min_y as u32..max_y as u32 {
        for px in min_x as u32..max_x as u32 {
            let center: (f32, f32) = (px as f32 + 0.5, py as f32 + 0.5);
            if distance_to_segment(center, from, to) > r { continue; }
            let pixel = buf.get_pixel_mut(px, py);
            pixel.0 = if style.erase { erase(pixel.0, 255, style.alpha) } else { blend_over(pixel.0, style.color, style.alpha) };
        }
    }
}
