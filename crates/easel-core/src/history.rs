//! Bounded snapshot history for undo/redo.
//!
//! Every committing operation captures the full layer list plus the
//! viewport state, tagged with a human-readable action label. Snapshots
//! share unchanged layers with the live store through [`Arc`]; the store's
//! copy-on-write mutation path guarantees a snapshot can never observe a
//! later edit, so commit cost is proportional to the layers that changed.

use crate::canvas::CanvasState;
use crate::layer::Layer;
use log::debug;
use std::sync::Arc;

/// Maximum number of snapshots retained, counting the session baseline.
pub const MAX_HISTORY: usize = 50;

/// One history entry: an immutable snapshot of layers + viewport.
#[derive(Debug, Clone)]
pub struct HistorySnapshot {
    pub label: String,
    pub layers: Vec<Arc<Layer>>,
    pub canvas: CanvasState,
}

/// Cursor-based undo/redo stack.
///
/// The cursor always points at the snapshot describing the live state.
/// Committing truncates any undone ("future") entries, pushes, and evicts
/// the oldest entry beyond [`MAX_HISTORY`]. Undo/redo move the cursor and
/// are no-ops at their respective boundary.
#[derive(Debug, Default)]
pub struct HistoryManager {
    entries: Vec<HistorySnapshot>,
    cursor: usize,
}

impl HistoryManager {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.cursor + 1 < self.entries.len()
    }

    /// Labels oldest to newest, for UI history panels and tests.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    /// Label of the snapshot the cursor sits on.
    pub fn current_label(&self) -> Option<&str> {
        self.entries.get(self.cursor).map(|e| e.label.as_str())
    }

    /// Push a snapshot of the given state, discarding the redo branch.
    pub fn commit(&mut self, label: impl Into<String>, layers: Vec<Arc<Layer>>, canvas: CanvasState) {
        let label = label.into();
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        debug!("history commit '{label}' ({} layers)", layers.len());
        self.entries.push(HistorySnapshot {
            label,
            layers,
            canvas,
        });
        if self.entries.len() > MAX_HISTORY {
            self.entries.remove(0);
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Step back one snapshot. `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<&HistorySnapshot> {
        if self.cursor == 0 || self.entries.is_empty() {
            return None;
        }
        self.cursor -= 1;
        debug!("undo to '{}'", self.entries[self.cursor].label);
        Some(&self.entries[self.cursor])
    }

    /// Step forward one snapshot. `None` at the newest entry.
    pub fn redo(&mut self) -> Option<&HistorySnapshot> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        debug!("redo to '{}'", self.entries[self.cursor].label);
        Some(&self.entries[self.cursor])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{LayerKind, TextLayer};

    fn snapshot_with(names: &[&str]) -> Vec<Arc<Layer>> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mut layer = Layer::new(LayerKind::Text(TextLayer::new(*name)));
                layer.name = name.to_string();
                layer.z_index = i;
                Arc::new(layer)
            })
            .collect()
    }

    fn commit(history: &mut HistoryManager, label: &str, names: &[&str]) {
        history.commit(label, snapshot_with(names), CanvasState::default());
    }

    #[test]
    fn test_undo_redo_boundaries() {
        let mut history = HistoryManager::new();
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());

        commit(&mut history, "baseline", &[]);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_undo_moves_cursor_back() {
        let mut history = HistoryManager::new();
        commit(&mut history, "baseline", &[]);
        commit(&mut history, "add a", &["a"]);
        commit(&mut history, "add b", &["a", "b"]);

        let snap = history.undo().unwrap();
        assert_eq!(snap.label, "add a");
        assert_eq!(snap.layers.len(), 1);

        let snap = history.undo().unwrap();
        assert_eq!(snap.label, "baseline");
        assert!(snap.layers.is_empty());
        assert!(history.undo().is_none());

        let snap = history.redo().unwrap();
        assert_eq!(snap.label, "add a");
    }

    #[test]
    fn test_commit_after_undo_discards_redo_branch() {
        let mut history = HistoryManager::new();
        commit(&mut history, "baseline", &[]);
        commit(&mut history, "add a", &["a"]);
        commit(&mut history, "add b", &["a", "b"]);

        history.undo();
        commit(&mut history, "add c", &["a", "c"]);

        assert!(!history.can_redo());
        assert!(history.redo().is_none());
        let labels: Vec<&str> = history.labels().collect();
        assert_eq!(labels, vec!["baseline", "add a", "add c"]);
    }

    #[test]
    fn test_bounded_to_max_entries() {
        let mut history = HistoryManager::new();
        commit(&mut history, "baseline", &[]);
        for i in 0..51 {
            commit(&mut history, &format!("edit {i}"), &["a"]);
        }
        assert_eq!(history.len(), MAX_HISTORY);
        // The baseline and the first edit were evicted.
        assert_eq!(history.labels().next(), Some("edit 1"));
        assert_eq!(history.current_label(), Some("edit 50"));
    }

    #[test]
    fn test_eviction_keeps_cursor_on_newest() {
        let mut history = HistoryManager::new();
        for i in 0..60 {
            commit(&mut history, &format!("edit {i}"), &[]);
        }
        assert_eq!(history.len(), MAX_HISTORY);
        assert!(history.can_undo());
        assert!(!history.can_redo());
        // Walking all the way back stops at the oldest retained entry.
        let mut steps = 0;
        while history.undo().is_some() {
            steps += 1;
        }
        assert_eq!(steps, MAX_HISTORY - 1);
        assert_eq!(history.current_label(), Some("edit 10"));
    }

    #[test]
    fn test_snapshots_share_until_mutated() {
        let layers = snapshot_with(&["a"]);
        let mut history = HistoryManager::new();
        history.commit("one", layers.clone(), CanvasState::default());
        history.commit("two", layers.clone(), CanvasState::default());
        // Same Arc backing both snapshots.
        assert_eq!(history.len(), 2);
        let first = history.undo().unwrap();
        assert!(Arc::ptr_eq(&first.layers[0], &layers[0]));
    }
}
