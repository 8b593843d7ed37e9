//! WASM bridge for InkAI. Exposes the canvas interaction engine to the
//! browser host.
//!
//! Compiled via `wasm-pack build --target web`. Structured values cross the
//! boundary as JSON strings; everything else is plain numbers, bools and
//! strings.

mod render2d;

use ink_core::id::{GroupId, NodeId};
use ink_core::model::NodeKind;
use ink_core::{EditorConfig, Graph, PayloadPatch, Rect};
use ink_editor::{AssetDrop, Editor, GenerationTicket, Modifiers};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

/// The main WASM-facing canvas controller.
///
/// Holds the editor and the display state the host does not care about.
/// All interaction from the page goes through this struct.
#[wasm_bindgen]
pub struct InkCanvas {
    editor: Editor,
    /// Dark mode flag: `false` = light (default), `true` = dark.
    dark_mode: bool,
}

/// Selection as the host sees it: ids and connection keys.
#[derive(Serialize)]
struct SelectionView {
    nodes: Vec<String>,
    connections: Vec<String>,
    group: Option<String>,
}

#[wasm_bindgen]
impl InkCanvas {
    /// Create a new canvas controller with the given dimensions.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> Self {
        // Set up panic hook for better error messages in console
        console_error_panic_hook_setup();
        Self {
            editor: Editor::new(width as f32, height as f32),
            dark_mode: false,
        }
    }

    /// Apply a (possibly partial) JSON config. The canvas is kept but
    /// history restarts. Returns `false` on invalid JSON.
    pub fn set_config(&mut self, json: &str) -> bool {
        let config = match EditorConfig::from_json(json) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("{e}");
                return false;
            }
        };
        let vp = self.editor.viewport;
        let graph = std::mem::take(&mut self.editor.graph);
        self.editor = Editor::with_config(config, vp.width, vp.height);
        self.editor.viewport.pan_x = vp.pan_x;
        self.editor.viewport.pan_y = vp.pan_y;
        self.editor.viewport.scale = self.editor.viewport.clamp_scale(vp.scale);
        self.editor.load(graph);
        true
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Replace the canvas from stored JSON. Returns `false` on parse error.
    pub fn load_json(&mut self, json: &str) -> bool {
        match Graph::from_json(json) {
            Ok(graph) => {
                self.editor.load(graph);
                true
            }
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }

    /// Current canvas as JSON (empty string on failure).
    pub fn save_json(&self) -> String {
        self.editor.graph.to_json().unwrap_or_default()
    }

    /// Compact binary snapshot of the canvas.
    pub fn export_snapshot(&self) -> Vec<u8> {
        self.editor.graph.to_msgpack().unwrap_or_default()
    }

    pub fn import_snapshot(&mut self, bytes: &[u8]) -> bool {
        match Graph::from_msgpack(bytes) {
            Ok(graph) => {
                self.editor.load(graph);
                true
            }
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }

    // ─── Rendering & viewport ────────────────────────────────────────────

    /// Render the canvas to a Canvas2D context.
    pub fn render(&self, ctx: &CanvasRenderingContext2d) {
        let theme = if self.dark_mode {
            render2d::CanvasTheme::dark()
        } else {
            render2d::CanvasTheme::light()
        };
        render2d::render_canvas(ctx, &self.editor, &theme);
    }

    /// Set the canvas theme.
    pub fn set_theme(&mut self, is_dark: bool) {
        self.dark_mode = is_dark;
    }

    /// Resize the canvas.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.editor.resize(width as f32, height as f32);
    }

    /// Viewport as JSON: `{"panX":..,"panY":..,"scale":..,...}`.
    pub fn get_viewport(&self) -> String {
        serde_json::to_string(&self.editor.viewport).unwrap_or_default()
    }

    pub fn set_viewport(&mut self, pan_x: f32, pan_y: f32, scale: f32) {
        let vp = &mut self.editor.viewport;
        vp.pan_x = pan_x;
        vp.pan_y = pan_y;
        vp.scale = vp.clamp_scale(scale);
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Handle pointer down event. Returns true if a redraw is needed.
    pub fn handle_pointer_down(
        &mut self,
        x: f32,
        y: f32,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let mods = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        self.editor.pointer_down(x, y, mods)
    }

    /// Handle pointer move event immediately. Returns true if a redraw is
    /// needed.
    pub fn handle_pointer_move(&mut self, x: f32, y: f32) -> bool {
        self.editor.pointer_move(x, y)
    }

    /// Coalesce a pointer move until the next animation frame. Returns true
    /// when the host should call `requestAnimationFrame`.
    pub fn queue_pointer_move(&mut self, x: f32, y: f32) -> bool {
        self.editor.queue_pointer_move(x, y)
    }

    /// Apply the move queued since the last frame.
    pub fn on_frame(&mut self) -> bool {
        self.editor.on_frame()
    }

    /// Handle pointer up event. Returns true if a redraw is needed.
    pub fn handle_pointer_up(&mut self, x: f32, y: f32) -> bool {
        self.editor.pointer_up(x, y)
    }

    /// Wheel zoom about the cursor.
    pub fn handle_wheel(&mut self, x: f32, y: f32, delta_y: f32) -> bool {
        self.editor.wheel(x, y, delta_y)
    }

    /// Handle a keyboard event. Returns true if anything changed.
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> bool {
        let mods = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        self.editor.key_down(key, mods)
    }

    pub fn handle_key_up(&mut self, key: &str) -> bool {
        self.editor.key_up(key)
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Selection as JSON: `{"nodes":[..],"connections":[..],"group":..}`.
    pub fn get_selection(&self) -> String {
        let sel = &self.editor.selection;
        let view = SelectionView {
            nodes: sel.nodes.iter().map(|id| id.as_str().to_string()).collect(),
            connections: sel.connections.iter().map(|c| c.key()).collect(),
            group: sel.group.map(|g| g.as_str().to_string()),
        };
        serde_json::to_string(&view).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn select_all(&mut self) -> bool {
        self.editor.select_all()
    }

    pub fn deselect(&mut self) -> bool {
        self.editor.deselect()
    }

    /// Delete selected nodes, group and connections as one undo step.
    pub fn delete_selected(&mut self) -> bool {
        self.editor.delete_selected()
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        self.editor.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.editor.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.editor.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.editor.can_redo()
    }

    // ─── Nodes & connections ─────────────────────────────────────────────

    /// Add a node of `kind` (e.g. `"IMAGE_GENERATOR"`) at the default
    /// placement. Returns the new id, or an empty string for an unknown kind.
    pub fn add_node(&mut self, kind: &str) -> String {
        self.add_node_with(kind, None)
    }

    /// Add a node at a world position.
    pub fn add_node_at(&mut self, kind: &str, x: f32, y: f32) -> String {
        self.add_node_with(kind, Some((x, y)))
    }

    /// Merge a JSON payload patch into a node. Keys set to `null` clear the
    /// field. Not recorded in history.
    pub fn update_node(&mut self, node_id: &str, patch_json: &str) -> bool {
        let Some(patch) = parse_patch(patch_json) else {
            return false;
        };
        self.editor.update_node(NodeId::intern(node_id), patch, None, None)
    }

    pub fn set_node_title(&mut self, node_id: &str, title: &str) -> bool {
        self.editor
            .update_node(NodeId::intern(node_id), PayloadPatch::default(), None, Some(title))
    }

    pub fn delete_node(&mut self, node_id: &str) -> bool {
        self.editor.delete_nodes(&[NodeId::intern(node_id)]) > 0
    }

    /// Connect two nodes. Returns an empty string on success, otherwise
    /// the reason it was refused.
    pub fn connect(&mut self, from: &str, to: &str) -> String {
        match self.editor.connect(NodeId::intern(from), NodeId::intern(to)) {
            Ok(_) => String::new(),
            Err(e) => e.to_string(),
        }
    }

    /// Delete a connection by its `"{from}-{to}"` key.
    pub fn delete_connection(&mut self, key: &str) -> bool {
        match self.editor.graph.connection_by_key(key) {
            Some(conn) => self.editor.delete_connections(&[conn]) > 0,
            None => false,
        }
    }

    // ─── Groups ──────────────────────────────────────────────────────────

    pub fn add_group(&mut self, x: f32, y: f32, width: f32, height: f32, title: &str) -> String {
        let id = self.editor.add_group(Rect::new(x, y, width, height), title);
        id.as_str().to_string()
    }

    pub fn delete_group(&mut self, group_id: &str) -> bool {
        self.editor.delete_group(GroupId::intern(group_id))
    }

    pub fn auto_arrange(&mut self, group_id: &str) -> bool {
        self.editor.auto_arrange(GroupId::intern(group_id))
    }

    /// Fan a JSON array of shot prompts out of `source`. Returns
    /// `{"group":..,"shots":[..]}` or an empty string.
    pub fn spawn_storyboard(&mut self, source: &str, prompts_json: &str) -> String {
        let prompts: Vec<String> = match serde_json::from_str(prompts_json) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("invalid storyboard prompts: {e}");
                return String::new();
            }
        };
        match self.editor.spawn_storyboard(NodeId::intern(source), &prompts) {
            Some(board) => serde_json::json!({
                "group": board.group.as_str(),
                "shots": board.shots.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            })
            .to_string(),
            None => String::new(),
        }
    }

    // ─── Assets ──────────────────────────────────────────────────────────

    /// Apply a dropped `(assetType, assetSrc)` pair to a node.
    pub fn drop_asset(&mut self, node_id: &str, asset_type: &str, asset_src: &str) -> bool {
        match AssetDrop::from_parts(asset_type, asset_src) {
            Some(asset) => self.editor.drop_asset(NodeId::intern(node_id), &asset),
            None => false,
        }
    }

    /// Create a generator node preloaded with a dropped asset. Returns the
    /// new id or an empty string.
    pub fn add_node_from_asset(&mut self, asset_type: &str, asset_src: &str) -> String {
        AssetDrop::from_parts(asset_type, asset_src)
            .and_then(|asset| self.editor.add_node_from_asset(&asset))
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    // ─── Generation ──────────────────────────────────────────────────────

    /// Mark a node as working and return the request JSON for the host to
    /// dispatch, or an empty string for an unknown node.
    pub fn begin_generation(&mut self, node_id: &str, prompt_override: Option<String>) -> String {
        self.editor
            .begin_generation(NodeId::intern(node_id), prompt_override.as_deref())
            .and_then(|req| serde_json::to_string(&req).ok())
            .unwrap_or_default()
    }

    /// Report a generation result. `error` wins over `patch_json` when set.
    /// Returns false for stale tickets.
    pub fn complete_generation(
        &mut self,
        ticket_json: &str,
        patch_json: &str,
        error: Option<String>,
    ) -> bool {
        let ticket: GenerationTicket = match serde_json::from_str(ticket_json) {
            Ok(t) => t,
            Err(e) => {
                log::warn!("invalid generation ticket: {e}");
                return false;
            }
        };
        let outcome = match error {
            Some(message) => Err(message),
            None => match parse_patch(patch_json) {
                Some(patch) => Ok(patch),
                None => Err("unreadable generation result".to_string()),
            },
        };
        self.editor.complete_generation(ticket, outcome)
    }

    /// Ids of nodes that should start generating now, as a JSON array.
    pub fn take_auto_starts(&mut self) -> String {
        let ids: Vec<String> = self
            .editor
            .pending_auto_starts()
            .iter()
            .map(|id| id.as_str().to_string())
            .collect();
        serde_json::to_string(&ids).unwrap_or_else(|_| "[]".to_string())
    }
}

impl InkCanvas {
    fn add_node_with(&mut self, kind: &str, at: Option<(f32, f32)>) -> String {
        match parse_kind(kind) {
            Some(kind) => self
                .editor
                .add_node(kind, at, PayloadPatch::default())
                .as_str()
                .to_string(),
            None => String::new(),
        }
    }
}

fn parse_kind(name: &str) -> Option<NodeKind> {
    serde_json::from_value(serde_json::Value::String(name.to_string()))
        .inspect_err(|e| log::warn!("unknown node kind {name:?}: {e}"))
        .ok()
}

fn parse_patch(json: &str) -> Option<PayloadPatch> {
    if json.trim().is_empty() {
        return Some(PayloadPatch::default());
    }
    serde_json::from_str(json)
        .inspect_err(|e| log::warn!("invalid payload patch: {e}"))
        .ok()
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("InkAI WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
