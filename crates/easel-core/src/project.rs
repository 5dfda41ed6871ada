//! Project export and import.
//!
//! [`ProjectDocument`] is the flat JSON snapshot a host saves and restores:
//! the document name, every layer record, the viewport and an export
//! timestamp. [`ProjectMeta`] is the listing-level record for project
//! pickers. This module stops at the interface: JSON plus plain file
//! helpers, no storage backend and no autosave.

use crate::canvas::{CanvasState, Editor};
use crate::history::HistoryManager;
use crate::layer::Layer;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// Document format version written into [`ProjectMeta`].
pub const PROJECT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("io error: {0}")]
    Io(String),
}

/// Exported document snapshot: everything needed to reopen a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    pub name: String,
    pub layers: Vec<Layer>,
    pub canvas_state: CanvasState,
    /// Export time in milliseconds since the Unix epoch.
    pub exported_at: u64,
}

impl ProjectDocument {
    /// Snapshot an editor session for export.
    pub fn from_editor(editor: &Editor) -> Self {
        Self {
            name: editor.name.clone(),
            layers: editor.store.layers().cloned().collect(),
            canvas_state: editor.canvas.clone(),
            exported_at: now_ms(),
        }
    }

    /// Replace an editor's session with this document. History restarts at
    /// a fresh baseline; selection and clipboard are cleared.
    pub fn install(self, editor: &mut Editor) {
        info!("opening project '{}' ({} layers)", self.name, self.layers.len());
        editor.name = self.name;
        editor.canvas = self.canvas_state;
        editor.store.load_layers(self.layers);
        editor.history = HistoryManager::new();
        editor.commit("open project");
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Write the document as JSON to `path`.
    pub fn save(&self, path: &Path) -> Result<(), ProjectError> {
        let json = self
            .to_json()
            .map_err(|e| ProjectError::Serialization(e.to_string()))?;
        fs::write(path, json)
            .map_err(|e| ProjectError::Io(format!("failed to write {}: {e}", path.display())))
    }

    /// Read a document from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let json = fs::read_to_string(path)
            .map_err(|e| ProjectError::Io(format!("failed to read {}: {e}", path.display())))?;
        Self::from_json(&json)
            .map_err(|e| ProjectError::Serialization(format!("failed to parse {}: {e}", path.display())))
    }
}

/// Listing-level project record for pickers and share sheets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    pub id: String,
    pub name: String,
    /// Data-URI or remote reference to a preview image.
    pub thumbnail: Option<String>,
    pub created_at: u64,
    pub updated_at: u64,
    pub collaborators: Vec<String>,
    pub version: u32,
}

impl ProjectMeta {
    pub fn new(name: impl Into<String>) -> Self {
        let now = now_ms();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            thumbnail: None,
            created_at: now,
            updated_at: now,
            collaborators: Vec::new(),
            version: PROJECT_VERSION,
        }
    }

    /// Bump the update timestamp to now.
    pub fn touch(&mut self) {
        self.updated_at = now_ms();
    }
}

/// Milliseconds since the Unix epoch; zero if the clock predates it.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
