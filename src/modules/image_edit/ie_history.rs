use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::ie_layers::LayerStack;
use crate::error::{EditorError, Result};

/// How a snapshot is turned back into layers on undo/redo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestoreMode {
    /// The stack collapses into one layer holding the snapshot pixels.
    #[default]
    Flatten,
    /// The full layer stack captured with the snapshot comes back.
    Structured,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub surface: RgbaImage,
    /// Only captured in `RestoreMode::Structured`.
    pub layers: Option<LayerStack>,
}

/// Linear undo/redo over full-surface snapshots.
///
/// The bottom entry of the undo stack is the seed: it is the state undo
/// returns to last, and is never popped itself.
#[derive(Debug, Default)]
pub struct History {
    undo_stack: VecDeque<Snapshot>,
    redo_stack: VecDeque<Snapshot>,
    max_depth: usize,
}

impl History {
    /// `max_depth == 0` keeps every snapshot.
    pub fn new(max_depth: usize) -> Self {
        Self { undo_stack: VecDeque::new(), redo_stack: VecDeque::new(), max_depth }
    }

    pub fn record(&mut self, snapshot: Snapshot) {
        self.undo_stack.push_back(snapshot);
        if self.max_depth > 0 {
            while self.undo_stack.len() > self.max_depth.max(1) { self.undo_stack.pop_front(); }
        }
        self.redo_stack.clear();
    }

    /// Moves the newest snapshot to the redo stack and returns the one to restore.
    pub fn undo(&mut self) -> Result<&Snapshot> {
        if self.undo_stack.len() <= 1 { return Err(EditorError::NothingToUndo); }
        if let Some(top) = self.undo_stack.pop_back() { self.redo_stack.push_back(top); }
        self.undo_stack.back().ok_or(EditorError::NothingToUndo)
    }

    pub fn redo(&mut self) -> Result<&Snapshot> {
        let next: Snapshot = self.redo_stack.pop_back().ok_or(EditorError::NothingToRedo)?;
        self.undo_stack.push_back(next);
        self.undo_stack.back().ok_or(EditorError::NothingToRedo)
    }

    pub fn current(&self) -> Option<&Snapshot> { self.undo_stack.back() }
    pub fn can_undo(&self) -> bool { self.undo_stack.len() > 1 }
    pub fn can_redo(&self) -> bool { !self.redo_stack.is_empty() }
    pub fn undo_len(&self) -> usize { self.undo_stack.len() }
    pub fn redo_len(&self) -> usize { self.redo_stack.len() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn snap(tag: u8) -> Snapshot {
        Snapshot { surface: RgbaImage::from_pixel(1, 1, Rgba([tag, 0, 0, 255])), layers: None }
    }

    fn tag(s: &Snapshot) -> u8 { s.surface.get_pixel(0, 0).0[0] }

    #[test]
    fn empty_history_has_nothing_to_undo_or_redo() {
        let mut history = History::new(0);
        assert!(matches!(history.undo(), Err(EditorError::NothingToUndo)));
        assert!(matches!(history.redo(), Err(EditorError::NothingToRedo)));
        assert!(history.current().is_none());
    }

    #[test]
    fn seed_snapshot_is_the_undo_floor() {
        let mut history = History::new(0);
        history.record(snap(1));
        assert!(!history.can_undo());
        assert!(matches!(history.undo(), Err(EditorError::NothingToUndo)));
        assert_eq!(history.undo_len(), 1);
        assert_eq!(history.redo_len(), 0);
    }

    #[test]
    fn undo_then_redo_walks_the_stacks() {
        let mut history = History::new(0);
        for t in 1..=3 { history.record(snap(t)); }
        assert_eq!(history.undo_len(), 3);

        assert_eq!(tag(history.undo().unwrap()), 2);
        assert_eq!(tag(history.undo().unwrap()), 1);
        assert!(history.undo().is_err());
        assert_eq!(history.redo_len(), 2);

        assert_eq!(tag(history.redo().unwrap()), 2);
        assert_eq!(tag(history.redo().unwrap()), 3);
        assert!(matches!(history.redo(), Err(EditorError::NothingToRedo)));
        assert_eq!(history.undo_len(), 3);
    }

    #[test]
    fn recording_after_undo_discards_redo() {
        let mut history = History::new(0);
        history.record(snap(1));
        history.record(snap(2));
        history.undo().unwrap();
        assert!(history.can_redo());

        history.record(snap(9));
        assert!(!history.can_redo());
        assert!(matches!(history.redo(), Err(EditorError::NothingToRedo)));
        assert_eq!(tag(history.current().unwrap()), 9);
    }

    #[test]
    fn depth_limit_drops_oldest_entries() {
        let mut history = History::new(2);
        for t in 1..=5 { history.record(snap(t)); }
        assert_eq!(history.undo_len(), 2);
        assert_eq!(tag(history.undo().unwrap()), 4);
        assert!(history.undo().is_err());
    }
}
