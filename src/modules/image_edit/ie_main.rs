use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::ie_filters::{self, FilterKind, FilterParams};
use super::ie_history::{History, RestoreMode, Snapshot};
use super::ie_layers::{BlendMode, Layer, LayerId, LayerKind, LayerStack};
use super::ie_paint::{paint_segment, Stroke, StrokeStyle, ToolKind};
use super::ie_text::{render_text, FONT_DEJAVU};
use super::ie_transform::{self, Transform};
use crate::error::{EditorError, Result};
use crate::modules::helpers::image_export::{self, ExportFormat, ExportOptions};
use crate::settings::EditorSettings;

pub(super) const SHAPE_SIZE: u32 = 100;
pub(super) const SHAPE_FILL: [u8; 4] = [255, 0, 0, 128];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind { Rect, Circle }

/// One editing session: the layer stack, its composite surface and the
/// undo/redo history.
///
/// Every successful mutating call recomposites the surface and then records a
/// snapshot. Calls that fail leave the session untouched.
#[derive(Debug)]
pub struct EditSession {
    layers: LayerStack,
    history: History,
    surface: RgbaImage,
    stroke: Option<Stroke>,
    settings: EditorSettings,
}

impl Default for EditSession {
    fn default() -> Self { Self::new(EditorSettings::default()) }
}

impl EditSession {
    pub fn new(settings: EditorSettings) -> Self {
        Self {
            layers: LayerStack::new(),
            history: History::new(settings.history_depth),
            surface: RgbaImage::new(settings.canvas_width, settings.canvas_height),
            stroke: None,
            settings,
        }
    }

    pub fn surface(&self) -> &RgbaImage { &self.surface }
    pub fn layers(&self) -> &LayerStack { &self.layers }
    pub fn active_layer(&self) -> Option<&Layer> { self.layers.active_layer() }
    pub fn settings(&self) -> &EditorSettings { &self.settings }
    pub fn can_undo(&self) -> bool { self.history.can_undo() }
    pub fn can_redo(&self) -> bool { self.history.can_redo() }
    pub fn history_len(&self) -> usize { self.history.undo_len() }
    pub fn is_stroking(&self) -> bool { self.stroke.is_some() }

    fn commit(&mut self, action: &'static str) {
        self.layers.composite(&mut self.surface);
        let layers: Option<LayerStack> = match self.settings.restore_mode {
            RestoreMode::Structured => Some(self.layers.clone()),
            RestoreMode::Flatten => None,
        };
        self.history.record(Snapshot { surface: self.surface.clone(), layers });
        debug!(action, history = self.history.undo_len(), "edit recorded");
    }

    fn restore(&mut self, snapshot: Snapshot) {
        if self.stroke.take().is_some() { warn!("stroke in progress discarded by history move"); }
        match snapshot.layers {
            Some(stack) => self.layers.restore(stack),
            None => { self.layers.replace_with_single(snapshot.surface.clone(), LayerKind::Flattened); }
        }
        self.surface = snapshot.surface;
    }

    pub fn load_image_as_layer(&mut self, bytes: &[u8]) -> Result<LayerId> {
        let image: RgbaImage = image_export::decode(bytes)?;
        if self.settings.fit_canvas_on_load {
            let w: u32 = image.width().min(self.settings.max_canvas_width);
            let h: u32 = image.height().min(self.settings.max_canvas_height);
            if (w, h) != self.surface.dimensions() {
                debug!(w, h, "fitting canvas to loaded image");
                self.surface = RgbaImage::new(w, h);
            }
        }
        Ok(self.add_generated_layer(image, LayerKind::Image))
    }

    pub fn add_generated_layer(&mut self, buffer: RgbaImage, kind: LayerKind) -> LayerId {
        let (w, h) = buffer.dimensions();
        let id: LayerId = self.layers.add(buffer, kind);
        info!(layer = %id, ?kind, w, h, "layer added");
        self.commit("add layer");
        id
    }

    pub fn add_shape_layer(&mut self, shape: ShapeKind) -> LayerId {
        let center: f32 = SHAPE_SIZE as f32 / 2.0;
        let buffer: RgbaImage = RgbaImage::from_fn(SHAPE_SIZE, SHAPE_SIZE, |x, y| {
            let inside: bool = match shape {
                ShapeKind::Rect => true,
                ShapeKind::Circle => {
                    let (dx, dy) = (x as f32 + 0.5 - center, y as f32 + 0.5 - center);
                    dx * dx + dy * dy <= center * center
                }
            };
            if inside { Rgba(SHAPE_FILL) } else { Rgba([0, 0, 0, 0]) }
        });
        self.add_generated_layer(buffer, LayerKind::Shape)
    }

    /// Adds a one-line text layer in the brush colour. `font` defaults to the
    /// bundled DejaVu Sans.
    pub fn add_text_layer(&mut self, text: &str, font: Option<&[u8]>) -> Result<LayerId> {
        let buffer: RgbaImage = render_text(text, font.unwrap_or(FONT_DEJAVU), self.settings.brush_color)?;
        Ok(self.add_generated_layer(buffer, LayerKind::Text))
    }

    /// Selection only; not recorded in history.
    pub fn set_active_layer(&mut self, id: LayerId) -> Result<()> {
        self.layers.set_active(id)
    }

    pub fn set_layer_opacity(&mut self, id: LayerId, value: f32) -> Result<()> {
        self.layers.set_opacity(id, value)?;
        self.commit("opacity");
        Ok(())
    }

    pub fn set_layer_blend_mode(&mut self, id: LayerId, mode: BlendMode) -> Result<()> {
        self.layers.set_blend_mode(id, mode)?;
        self.commit("blend mode");
        Ok(())
    }

    pub fn set_layer_position(&mut self, id: LayerId, x: i32, y: i32) -> Result<()> {
        self.layers.set_position(id, x, y)?;
        self.commit("move layer");
        Ok(())
    }

    pub fn remove_layer(&mut self, id: LayerId) -> Result<()> {
        self.layers.remove(id)?;
        if self.stroke.as_ref().is_some_and(|s| s.layer == id) { self.stroke = None; }
        info!(layer = %id, "layer removed");
        self.commit("remove layer");
        Ok(())
    }

    pub fn apply_filter(&mut self, kind: FilterKind, params: FilterParams) -> Result<()> {
        let layer: &mut Layer = self.layers.active_layer_mut().ok_or(EditorError::NoActiveLayer)?;
        ie_filters::apply(layer.image_mut(), kind, params)?;
        info!(layer = %layer.id(), ?kind, brightness = params.brightness, contrast = params.contrast, "filter applied");
        self.commit("filter");
        Ok(())
    }

    pub fn apply_transform(&mut self, transform: Transform) -> Result<()> {
        let layer: &mut Layer = self.layers.active_layer_mut().ok_or(EditorError::NoActiveLayer)?;
        if let Some(next) = ie_transform::apply(layer.image(), transform)? {
            layer.replace_image(next);
        }
        info!(layer = %layer.id(), ?transform, size = ?layer.size(), "transform applied");
        self.commit("transform");
        Ok(())
    }

    /// Starts painting on the active layer. A stroke that was never ended is
    /// committed first.
    pub fn begin_stroke(&mut self, x: f32, y: f32, tool: ToolKind) -> Result<()> {
        let layer: LayerId = self.layers.active().ok_or(EditorError::NoActiveLayer)?;
        if self.stroke.is_some() {
            warn!("begin_stroke while a stroke is open; ending the previous one");
            self.end_stroke();
        }
        let style: StrokeStyle = StrokeStyle::for_tool(tool, &self.settings);
        self.stroke = Some(Stroke { layer, tool, style, last: (x, y), segments: 0 });
        Ok(())
    }

    /// Paints from the previous point to `(x, y)` and recomposites. Ignored
    /// when no stroke is open.
    pub fn extend_stroke(&mut self, x: f32, y: f32) {
        let Some(stroke) = self.stroke.as_mut() else { return; };
        let Some(layer) = self.layers.get_mut(stroke.layer) else {
            self.stroke = None;
            return;
        };
        let (lx, ly) = layer.position();
        let from: (f32, f32) = (stroke.last.0 - lx as f32, stroke.last.1 - ly as f32);
        let to: (f32, f32) = (x - lx as f32, y - ly as f32);
        paint_segment(layer.image_mut(), from, to, &stroke.style);
        stroke.last = (x, y);
        stroke.segments += 1;
        self.layers.composite(&mut self.surface);
    }

    /// Closes the open stroke and records it as a single history entry.
    pub fn end_stroke(&mut self) -> bool {
        let Some(stroke) = self.stroke.take() else { return false; };
        info!(layer = %stroke.layer, tool = ?stroke.tool, segments = stroke.segments, "stroke finished");
        self.commit("stroke");
        true
    }

    pub fn undo(&mut self) -> Result<&RgbaImage> {
        let snapshot: Snapshot = self.history.undo()?.clone();
        self.restore(snapshot);
        info!(history = self.history.undo_len(), redo = self.history.redo_len(), "undo");
        Ok(&self.surface)
    }

    pub fn redo(&mut self) -> Result<&RgbaImage> {
        let snapshot: Snapshot = self.history.redo()?.clone();
        self.restore(snapshot);
        info!(history = self.history.undo_len(), redo = self.history.redo_len(), "redo");
        Ok(&self.surface)
    }

    pub fn export_surface(&self, format: ExportFormat) -> Result<Vec<u8>> {
        let options: ExportOptions = ExportOptions { format, ..self.settings.export };
        image_export::encode(&self.surface, &options)
    }

    /// Resets the visible surface size. Layer content and history are left
    /// alone, so the next undo or redo brings back the snapshot's canvas size.
    pub fn resize_canvas(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(EditorError::validation("canvas size", format!("{}x{} has an empty side", width, height)));
        }
        self.surface = RgbaImage::new(width, height);
        self.layers.composite(&mut self.surface);
        debug!(width, height, "canvas resized");
        Ok(())
    }
}
