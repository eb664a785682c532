//! Core of a layered raster image editor.
//!
//! An [`EditSession`] owns a stack of RGBA layers, composites them onto a
//! single surface after every edit and keeps a snapshot history for undo and
//! redo. Everything runs synchronously on the caller's thread.

pub mod error;
pub mod modules;
pub mod script;
pub mod settings;

pub use error::{EditorError, Result};
pub use modules::helpers::image_export::{ExportFormat, ExportOptions};
pub use modules::image_edit::{
    BlendMode, DegradedTool, EditSession, FilterKind, FilterParams, Layer, LayerId, LayerKind, LayerStack,
    PlaceholderEffect, PlaceholderTransform, RestoreMode, ShapeKind, ToolKind, Transform,
};
pub use settings::{EditorSettings, RgbaColor};
