use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ie_helpers::{blend_over, erase};
use crate::error::{EditorError, Result};

/// Session-unique handle for a layer. Ids are never reused, so a stale id
/// simply fails lookups with `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "#{}", self.0) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind { Image, Text, Shape, Generated, Flattened }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    #[default]
    Normal,
    /// Destination-out: the layer's alpha punches holes into what lies beneath.
    Erase,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    id: LayerId,
    pub kind: LayerKind,
    image: RgbaImage,
    pub x: i32,
    pub y: i32,
    opacity: f32,
    pub blend_mode: BlendMode,
}

impl Layer {
    fn new(id: LayerId, image: RgbaImage, kind: LayerKind) -> Self {
        Self { id, kind, image, x: 0, y: 0, opacity: 1.0, blend_mode: BlendMode::Normal }
    }

    pub fn id(&self) -> LayerId { self.id }
    pub fn image(&self) -> &RgbaImage { &self.image }
    pub fn opacity(&self) -> f32 { self.opacity }
    pub fn position(&self) -> (i32, i32) { (self.x, self.y) }

    /// Always the dimensions of the owned buffer.
    pub fn size(&self) -> (u32, u32) { self.image.dimensions() }

    pub(super) fn image_mut(&mut self) -> &mut RgbaImage { &mut self.image }

    /// Swaps in a new buffer; size follows the buffer in the same step.
    pub(super) fn replace_image(&mut self, image: RgbaImage) -> RgbaImage {
        std::mem::replace(&mut self.image, image)
    }

    fn draw_onto(&self, target: &mut RgbaImage) {
        if self.opacity <= 0.0 { return; }
        let (lw, lh) = self.image.dimensions();
        let (tw, th) = target.dimensions();
        let (ox, oy) = (i64::from(self.x), i64::from(self.y));

        let left: i64 = ox.max(0);
        let top: i64 = oy.max(0);
        let right: i64 = (ox + i64::from(lw)).min(i64::from(tw));
        let bottom: i64 = (oy + i64::from(lh)).min(i64::from(th));

        for ty in top..bottom {
            for tx in left..right {
                let src: [u8; 4] = self.image.get_pixel((tx - ox) as u32, (ty - oy) as u32).0;
                let dst: &mut Rgba<u8> = target.get_pixel_mut(tx as u32, ty as u32);
                dst.0 = match self.blend_mode {
                    BlendMode::Normal => blend_over(dst.0, src, self.opacity),
                    BlendMode::Erase => erase(dst.0, src[3], self.opacity),
                };
            }
        }
    }
}

/// Ordered layers, bottom first, plus the active selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerStack {
    layers: Vec<Layer>,
    active: Option<LayerId>,
    next_id: u64,
}

impl LayerStack {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.layers.len() }
    pub fn is_empty(&self) -> bool { self.layers.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = &Layer> { self.layers.iter() }
    pub fn get(&self, id: LayerId) -> Option<&Layer> { self.layers.iter().find(|l| l.id == id) }
    pub fn index_of(&self, id: LayerId) -> Option<usize> { self.layers.iter().position(|l| l.id == id) }
    pub fn at(&self, index: usize) -> Option<&Layer> { self.layers.get(index) }

    pub fn active(&self) -> Option<LayerId> { self.active }
    pub fn active_layer(&self) -> Option<&Layer> { self.active.and_then(|id| self.get(id)) }

    pub(super) fn get_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    pub(super) fn active_layer_mut(&mut self) -> Option<&mut Layer> {
        let id: LayerId = self.active?;
        self.get_mut(id)
    }

    fn get_mut_or_err(&mut self, id: LayerId) -> Result<&mut Layer> {
        self.get_mut(id).ok_or(EditorError::NotFound(id))
    }

    /// Pushes a layer on top and makes it active.
    pub fn add(&mut self, image: RgbaImage, kind: LayerKind) -> LayerId {
        self.next_id += 1;
        let id: LayerId = LayerId(self.next_id);
        self.layers.push(Layer::new(id, image, kind));
        self.active = Some(id);
        id
    }

    pub fn set_active(&mut self, id: LayerId) -> Result<()> {
        if self.get(id).is_none() { return Err(EditorError::NotFound(id)); }
        self.active = Some(id);
        Ok(())
    }

    /// Non-finite values are rejected; finite values are clamped into `[0, 1]`.
    pub fn set_opacity(&mut self, id: LayerId, value: f32) -> Result<()> {
        if !value.is_finite() {
            return Err(EditorError::validation("opacity", format!("{} is not a finite number", value)));
        }
        self.get_mut_or_err(id)?.opacity = value.clamp(0.0, 1.0);
        Ok(())
    }

    pub fn set_blend_mode(&mut self, id: LayerId, mode: BlendMode) -> Result<()> {
        self.get_mut_or_err(id)?.blend_mode = mode;
        Ok(())
    }

    pub fn set_position(&mut self, id: LayerId, x: i32, y: i32) -> Result<()> {
        let layer: &mut Layer = self.get_mut_or_err(id)?;
        layer.x = x; layer.y = y;
        Ok(())
    }

    /// Removes a layer. If it was active, the new top layer (if any) becomes active.
    pub fn remove(&mut self, id: LayerId) -> Result<Layer> {
        let index: usize = self.index_of(id).ok_or(EditorError::NotFound(id))?;
        let removed: Layer = self.layers.remove(index);
        if self.active == Some(id) { self.active = self.layers.last().map(|l| l.id); }
        Ok(removed)
    }

    /// Drops every layer and wraps `image` as the only, active layer.
    pub(super) fn replace_with_single(&mut self, image: RgbaImage, kind: LayerKind) -> LayerId {
        self.layers.clear();
        self.active = None;
        self.add(image, kind)
    }

    /// Adopts the layers and selection of `saved`. The id counter only moves
    /// forward so ids handed out after the save are never issued twice.
    pub(super) fn restore(&mut self, saved: LayerStack) {
        let next_id: u64 = self.next_id.max(saved.next_id);
        *self = saved;
        self.next_id = next_id;
    }

    /// Clears `target` and draws every layer bottom to top.
    pub fn composite(&self, target: &mut RgbaImage) {
        for p in target.pixels_mut() { *p = Rgba([0, 0, 0, 0]); }
        for layer in &self.layers { layer.draw_onto(target); }
    }
}
