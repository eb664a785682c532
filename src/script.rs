//! Replays a JSON list of editing commands against an [`EditSession`].
//!
//! ```json
//! {
//!   "canvas": [320, 240],
//!   "steps": [
//!     { "op": "shape", "shape": "circle" },
//!     { "op": "text", "text": "Hello" },
//!     { "op": "opacity", "value": 0.5 },
//!     { "op": "filter", "kind": "sepia", "brightness": 10 },
//!     { "op": "transform", "transform": "rotate90" },
//!     { "op": "stroke", "tool": "brush", "points": [[0, 0], [40, 40]] },
//!     { "op": "undo" }
//!   ],
//!   "output": "out.png"
//! }
//! ```
//!
//! Layers are addressed by stack index (0 is the bottom). Steps that omit
//! `layer` target the active layer.

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::EditorError;
use crate::modules::image_edit::{
    BlendMode, EditSession, FilterKind, FilterParams, LayerId, ShapeKind, ToolKind, Transform,
};

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed script: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error("no layer at index {0}")]
    NoLayerAt(usize),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Step {
    Load { path: PathBuf },
    Shape { shape: ShapeKind },
    /// `font` is a TrueType/OpenType file; the bundled font is used when absent.
    Text { text: String, font: Option<PathBuf> },
    Select { layer: usize },
    Opacity { layer: Option<usize>, value: f32 },
    Blend { layer: Option<usize>, mode: BlendMode },
    Move { layer: Option<usize>, x: i32, y: i32 },
    Remove { layer: Option<usize> },
    Filter {
        kind: FilterKind,
        #[serde(flatten)]
        params: FilterParams,
    },
    Transform { transform: Transform },
    Stroke { tool: ToolKind, points: Vec<(f32, f32)> },
    Undo,
    Redo,
    Resize { width: u32, height: u32 },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub canvas: Option<(u32, u32)>,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ScriptReport {
    /// Set when the script's `canvas` size could not be applied.
    pub canvas: Option<ScriptError>,
    pub applied: usize,
    /// Failed steps by index into `steps`.
    pub failed: Vec<(usize, ScriptError)>,
}

impl ScriptReport {
    pub fn is_clean(&self) -> bool { self.canvas.is_none() && self.failed.is_empty() }
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self, ScriptError> { Ok(serde_json::from_str(json)?) }

    pub fn from_path(path: &Path) -> Result<Self, ScriptError> { Self::from_json(&fs::read_to_string(path)?) }

    /// Runs every step in order. Failing steps are logged and skipped; the
    /// session stays usable after any of them.
    pub fn run(&self, session: &mut EditSession, base_dir: &Path) -> ScriptReport {
        let mut report: ScriptReport = ScriptReport::default();
        if let Some((w, h)) = self.canvas {
            if let Err(e) = session.resize_canvas(w, h) {
                warn!(width = w, height = h, error = %e, "canvas size rejected");
                report.canvas = Some(e.into());
            }
        }
        for (i, step) in self.steps.iter().enumerate() {
            match run_step(session, step, base_dir) {
                Ok(()) => report.applied += 1,
                Err(e) => {
                    warn!(step = i, error = %e, "step failed");
                    report.failed.push((i, e));
                }
            }
        }
        info!(applied = report.applied, failed = report.failed.len(), "script finished");
        report
    }
}

fn layer_at(session: &EditSession, index: usize) -> Result<LayerId, ScriptError> {
    session.layers().at(index).map(|l| l.id()).ok_or(ScriptError::NoLayerAt(index))
}

fn target(session: &EditSession, index: Option<usize>) -> Result<LayerId, ScriptError> {
    match index {
        Some(i) => layer_at(session, i),
        None => session.layers().active().ok_or(ScriptError::Editor(EditorError::NoActiveLayer)),
    }
}

fn run_step(session: &mut EditSession, step: &Step, base_dir: &Path) -> Result<(), ScriptError> {
    match step {
        Step::Load { path } => {
            let bytes: Vec<u8> = fs::read(base_dir.join(path))?;
            session.load_image_as_layer(&bytes)?;
        }
        Step::Shape { shape } => { session.add_shape_layer(*shape); }
        Step::Text { text, font } => {
            let font_data: Option<Vec<u8>> = match font {
                Some(path) => Some(fs::read(base_dir.join(path))?),
                None => None,
            };
            session.add_text_layer(text, font_data.as_deref())?;
        }
        Step::Select { layer } => session.set_active_layer(layer_at(session, *layer)?)?,
        Step::Opacity { layer, value } => session.set_layer_opacity(target(session, *layer)?, *value)?,
        Step::Blend { layer, mode } => session.set_layer_blend_mode(target(session, *layer)?, *mode)?,
        Step::Move { layer, x, y } => session.set_layer_position(target(session, *layer)?, *x, *y)?,
        Step::Remove { layer } => session.remove_layer(target(session, *layer)?)?,
        Step::Filter { kind, params } => session.apply_filter(*kind, *params)?,
        Step::Transform { transform } => session.apply_transform(*transform)?,
        Step::Stroke { tool, points } => {
            let Some(&(x, y)) = points.first() else { return Ok(()); };
            session.begin_stroke(x, y, *tool)?;
            for &(x, y) in &points[1..] { session.extend_stroke(x, y); }
            session.end_stroke();
        }
        Step::Undo => { session.undo()?; }
        Step::Redo => { session.redo()?; }
        Step::Resize { width, height } => session.resize_canvas(*width, *height)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::image_edit::{DegradedTool, LayerKind, PlaceholderEffect};
    use crate::settings::EditorSettings;

    #[test]
    fn parses_every_step_shape() {
        let script = Script::from_json(r#"{
            "canvas": [64, 48],
            "steps": [
                { "op": "load", "path": "in.png" },
                { "op": "shape", "shape": "rect" },
                { "op": "text", "text": "Hi", "font": "fonts/a.ttf" },
                { "op": "select", "layer": 0 },
                { "op": "opacity", "value": 0.5 },
                { "op": "blend", "layer": 1, "mode": "erase" },
                { "op": "move", "x": 3, "y": -2 },
                { "op": "remove" },
                { "op": "filter", "kind": "grayscale", "brightness": 12 },
                { "op": "filter", "kind": { "unimplemented": "oil-paint" } },
                { "op": "transform", "transform": { "crop": { "width": 10, "height": 5 } } },
                { "op": "transform", "transform": "flip-horizontal" },
                { "op": "stroke", "tool": { "degraded": "sponge" }, "points": [[1, 2], [3.5, 4]] },
                { "op": "undo" },
                { "op": "redo" },
                { "op": "resize", "width": 10, "height": 20 }
            ]
        }"#).unwrap();

        assert_eq!(script.canvas, Some((64, 48)));
        assert_eq!(script.steps.len(), 16);
        assert_eq!(script.steps[2], Step::Text { text: "Hi".into(), font: Some(PathBuf::from("fonts/a.ttf")) });
        assert_eq!(script.steps[5], Step::Blend { layer: Some(1), mode: BlendMode::Erase });
        assert_eq!(script.steps[8], Step::Filter { kind: FilterKind::Grayscale, params: FilterParams::new(12, 0) });
        assert_eq!(
            script.steps[9],
            Step::Filter { kind: FilterKind::Unimplemented(PlaceholderEffect::OilPaint), params: FilterParams::default() }
        );
        assert_eq!(script.steps[10], Step::Transform { transform: Transform::Crop { width: 10, height: 5 } });
        assert_eq!(
            script.steps[12],
            Step::Stroke { tool: ToolKind::Degraded(DegradedTool::Sponge), points: vec![(1.0, 2.0), (3.5, 4.0)] }
        );
        assert!(script.output.is_none());
    }

    #[test]
    fn failing_steps_are_reported_and_skipped() {
        let script = Script::from_json(r#"{
            "canvas": [16, 16],
            "steps": [
                { "op": "filter", "kind": "invert" },
                { "op": "shape", "shape": "rect" },
                { "op": "select", "layer": 4 },
                { "op": "load", "path": "missing-file.png" },
                { "op": "filter", "kind": "invert" },
                { "op": "redo" }
            ]
        }"#).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let mut session = EditSession::new(EditorSettings { fit_canvas_on_load: false, ..EditorSettings::default() });
        let report = script.run(&mut session, dir.path());

        assert_eq!(report.applied, 2);
        let failed: Vec<usize> = report.failed.iter().map(|(i, _)| *i).collect();
        assert_eq!(failed, vec![0, 2, 3, 5]);
        assert!(matches!(report.failed[0].1, ScriptError::Editor(EditorError::NoActiveLayer)));
        assert!(matches!(report.failed[1].1, ScriptError::NoLayerAt(4)));
        assert!(matches!(report.failed[2].1, ScriptError::Io(_)));
        assert!(matches!(report.failed[3].1, ScriptError::Editor(EditorError::NothingToRedo)));
        assert_eq!(session.surface().dimensions(), (16, 16));
        assert_eq!(session.history_len(), 2);
    }

    #[test]
    fn canvas_failure_is_reported_apart_from_steps() {
        let script = Script::from_json(r#"{
            "canvas": [0, 10],
            "steps": [
                { "op": "text", "text": "ok" },
                { "op": "text", "text": "" }
            ]
        }"#).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let mut session = EditSession::default();
        let report = script.run(&mut session, dir.path());

        assert!(matches!(report.canvas, Some(ScriptError::Editor(EditorError::Validation { .. }))));
        assert_eq!(report.applied, 1);
        let failed: Vec<usize> = report.failed.iter().map(|(i, _)| *i).collect();
        assert_eq!(failed, vec![1]);
        assert!(!report.is_clean());
        assert_eq!(session.layers().at(0).map(|l| l.kind), Some(LayerKind::Text));
    }
}
