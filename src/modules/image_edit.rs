//! Layered raster editing: layer stack and compositor, destructive filters
//! and transforms, freehand strokes, and snapshot-based undo/redo, all driven
//! through [`EditSession`].

mod ie_helpers;
mod ie_history;
mod ie_layers;
mod ie_main;
mod ie_paint;
mod ie_text;
pub mod ie_filters;
pub mod ie_transform;

pub use ie_filters::{FilterKind, FilterParams, PlaceholderEffect};
pub use ie_history::{History, RestoreMode, Snapshot};
pub use ie_layers::{BlendMode, Layer, LayerId, LayerKind, LayerStack};
pub use ie_main::{EditSession, ShapeKind};
pub use ie_paint::{DegradedTool, ToolKind};
pub use ie_transform::{PlaceholderTransform, Transform};
