//! Interaction engine for the InkAI canvas.
//!
//! `Editor` owns the graph, viewport, selection and undo history, and turns
//! pointer, wheel and keyboard input into edits. Everything else in this
//! crate is a piece it is built from.

pub mod arrange;
pub mod drop;
pub mod editor;
pub mod frame;
pub mod generation;
pub mod history;
pub mod input;
pub mod selection;
pub mod session;
pub mod shortcuts;

pub use drop::{AssetDrop, AssetKind};
pub use editor::Editor;
pub use generation::{GenerationOutcome, GenerationRequest, GenerationTicket};
pub use history::History;
pub use input::{InputEvent, Modifiers};
pub use selection::Selection;
pub use session::Session;
pub use shortcuts::{ShortcutAction, ShortcutMap};
