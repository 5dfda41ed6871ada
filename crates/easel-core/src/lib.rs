//! Easel Core Library
//!
//! Platform-agnostic state and interaction logic for the Easel layer canvas.

pub mod ai;
pub mod canvas;
pub mod history;
pub mod input;
pub mod layer;
pub mod project;
pub mod selection;
pub mod snap;
pub mod store;
pub mod tools;

pub use ai::{AiBridge, AiError, AiRequest, AiService, GenerateRequest, JobKey, OutpaintDirection, Upscale};
pub use canvas::{CanvasBackground, CanvasState, Editor, ToolSettings};
pub use history::HistoryManager;
pub use input::{Key, Modifiers, MouseButton, PointerEvent};
pub use layer::{Color, Layer, LayerId, LayerKind, LayerPatch};
pub use project::{ProjectDocument, ProjectError, ProjectMeta};
pub use selection::TransformUpdate;
pub use snap::{SNAP_THRESHOLD, SnapGuide, SnapOutcome, compute_snap};
pub use store::LayerStore;
pub use tools::{GestureState, ToolController, ToolKind};
