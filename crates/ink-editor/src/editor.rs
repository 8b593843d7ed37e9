//! The editor context: one canvas, its viewport, selection, history and
//! in-flight gesture.
//!
//! Every mutation of the canvas goes through an `Editor` method. Structural
//! operations settle the history cursor before mutating and record the
//! result after; drag, group-drag and resize gestures settle it when they
//! first move and record once when they end. Payload edits never add an
//! entry.

use crate::arrange::{self, Storyboard};
use crate::drop::{self, AssetDrop};
use crate::frame::FrameThrottle;
use crate::generation::{self, GenerationOutcome, GenerationRequest, GenerationTicket, Generations};
use crate::history::History;
use crate::input::{InputEvent, Modifiers};
use crate::selection::Selection;
use crate::session::{self, DragStart, Session};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use ink_core::geometry::Rect;
use ink_core::id::{GroupId, NodeId};
use ink_core::model::{Connection, Group, Node, NodeKind};
use ink_core::{ConnectError, EditorConfig, Graph, PayloadPatch, Viewport};
use ink_render::{Hit, HitTolerance, Route, hit_test, hit_test_rect};

pub struct Editor {
    pub graph: Graph,
    pub viewport: Viewport,
    pub selection: Selection,
    config: EditorConfig,
    tolerance: HitTolerance,
    history: History,
    session: Session,
    throttle: FrameThrottle,
    generations: Generations,
    /// Space held: pointer drags pan instead of selecting.
    pan_mode: bool,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

impl Editor {
    pub fn new(width: f32, height: f32) -> Self {
        Self::with_config(EditorConfig::default(), width, height)
    }

    pub fn with_config(config: EditorConfig, width: f32, height: f32) -> Self {
        let graph = Graph::new();
        let mut history = History::new(config.history_depth);
        history.reset(&graph);
        Self {
            graph,
            viewport: Viewport::with_config(width, height, &config),
            selection: Selection::default(),
            tolerance: HitTolerance::from(&config),
            history,
            session: Session::Idle,
            throttle: FrameThrottle::new(),
            generations: Generations::new(),
            pan_mode: false,
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn pan_mode(&self) -> bool {
        self.pan_mode
    }

    /// Replace the whole canvas (e.g. after loading a workflow). History
    /// restarts from the loaded state.
    pub fn load(&mut self, graph: Graph) {
        self.graph = graph;
        self.history.reset(&self.graph);
        self.selection.clear();
        self.session = Session::Idle;
        self.throttle.cancel();
        self.generations.cancel_all();
        log::debug!(
            "loaded canvas: {} nodes, {} connections, {} groups",
            self.graph.nodes.len(),
            self.graph.connections.len(),
            self.graph.groups.len()
        );
    }

    /// Settle the entry under the cursor before a structural edit.
    fn checkpoint(&mut self) {
        self.history.checkpoint(&self.graph);
    }

    /// Record the result of a structural edit.
    fn commit(&mut self) {
        self.history.push(&self.graph);
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    /// World position where a node without explicit coordinates goes:
    /// horizontally centered on the viewport, a fixed offset above center.
    pub fn default_placement(&self) -> (f32, f32) {
        let (cx, cy) = self.viewport.center_world();
        let x = cx - self.config.default_node_width / 2.0;
        let y = cy - self.config.placement_offset_y;
        if x.is_finite() && y.is_finite() {
            (x, y)
        } else {
            (100.0, 100.0)
        }
    }

    /// Add a node of `kind` at `at` (or the default placement) with the
    /// kind's defaults overlaid by `initial`.
    pub fn add_node(&mut self, kind: NodeKind, at: Option<(f32, f32)>, initial: PayloadPatch) -> NodeId {
        self.checkpoint();
        let (x, y) = at.unwrap_or_else(|| self.default_placement());
        let mut node = Node::new(NodeId::generate(), kind, x, y);
        node.width = Some(self.config.default_node_width);
        node.payload.merge(initial);
        let id = node.id;
        self.graph.add_node(node);
        self.commit();
        log::debug!("added {kind:?} node {id} at ({x}, {y})");
        id
    }

    /// Merge a payload patch and optional size/title. Never pushes history.
    pub fn update_node(
        &mut self,
        id: NodeId,
        patch: PayloadPatch,
        size: Option<(f32, f32)>,
        title: Option<&str>,
    ) -> bool {
        self.graph.update_node(id, patch, size, title)
    }

    /// Delete nodes and every connection touching them. In-flight
    /// generations on them are cancelled. Returns the number removed.
    pub fn delete_nodes(&mut self, ids: &[NodeId]) -> usize {
        if !ids.iter().any(|id| self.graph.contains(*id)) {
            return 0;
        }
        self.checkpoint();
        let removed = self.graph.remove_nodes(ids);
        self.commit();
        for id in ids {
            if self.generations.cancel(*id) {
                log::debug!("cancelled generation on deleted node {id}");
            }
        }
        self.selection.nodes.clear();
        let graph = &self.graph;
        self.selection.connections.retain(|c| graph.has_connection(*c));
        log::debug!("deleted {removed} nodes");
        removed
    }

    // ─── Connections ─────────────────────────────────────────────────────

    /// Connect `from → to`. Rejected edges leave graph and history alone.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<Connection, ConnectError> {
        self.graph.can_connect(from, to)?;
        self.checkpoint();
        let conn = self.graph.connect(from, to)?;
        self.commit();
        Ok(conn)
    }

    pub fn delete_connections(&mut self, conns: &[Connection]) -> usize {
        if !conns.iter().any(|c| self.graph.has_connection(*c)) {
            return 0;
        }
        self.checkpoint();
        let removed = self.graph.disconnect(conns);
        self.commit();
        self.selection.connections.retain(|c| !conns.contains(c));
        removed
    }

    // ─── Groups ──────────────────────────────────────────────────────────

    pub fn add_group(&mut self, bounds: Rect, title: &str) -> GroupId {
        self.checkpoint();
        let group = Group::new(GroupId::generate(), bounds, title);
        let id = group.id;
        self.graph.add_group(group);
        self.commit();
        id
    }

    pub fn delete_group(&mut self, id: GroupId) -> bool {
        if self.graph.group(id).is_none() {
            return false;
        }
        self.checkpoint();
        self.graph.remove_group(id);
        self.commit();
        if self.selection.group == Some(id) {
            self.selection.group = None;
        }
        true
    }

    /// Members of a group by the anchor-point test.
    pub fn group_members(&self, id: GroupId) -> Vec<NodeId> {
        self.graph
            .group(id)
            .map(|g| arrange::members(&self.graph, g, self.config.group_anchor_offset))
            .unwrap_or_default()
    }

    /// Grid-arrange a group's members. No-op (and no history entry) for an
    /// unknown or empty group.
    pub fn auto_arrange(&mut self, id: GroupId) -> bool {
        if self.group_members(id).is_empty() {
            return false;
        }
        self.checkpoint();
        let moved = arrange::auto_arrange(&mut self.graph, id, &self.config);
        self.commit();
        moved > 0
    }

    pub fn spawn_storyboard(&mut self, source: NodeId, prompts: &[String]) -> Option<Storyboard> {
        if !self.graph.contains(source) || prompts.is_empty() {
            return None;
        }
        self.checkpoint();
        let board = arrange::spawn_storyboard(&mut self.graph, source, prompts, &self.config);
        self.commit();
        board
    }

    // ─── Generation ──────────────────────────────────────────────────────

    pub fn begin_generation(
        &mut self,
        id: NodeId,
        prompt_override: Option<&str>,
    ) -> Option<GenerationRequest> {
        generation::begin(&mut self.graph, &mut self.generations, id, prompt_override)
    }

    pub fn complete_generation(&mut self, ticket: GenerationTicket, outcome: GenerationOutcome) -> bool {
        generation::complete(&mut self.graph, &mut self.generations, ticket, outcome)
    }

    /// Nodes waiting to be started automatically (storyboard shots).
    pub fn pending_auto_starts(&mut self) -> Vec<NodeId> {
        generation::take_auto_starts(&mut self.graph)
    }

    pub fn generations_in_flight(&self) -> usize {
        self.generations.in_flight()
    }

    // ─── Assets ──────────────────────────────────────────────────────────

    /// Apply a dropped asset to a node. A payload edit: no history.
    pub fn drop_asset(&mut self, id: NodeId, asset: &AssetDrop) -> bool {
        let Some(patch) = self.graph.node(id).and_then(|n| drop::drop_patch(n, asset)) else {
            return false;
        };
        self.graph.update_node(id, patch, None, None)
    }

    /// Create a generator preloaded with the asset at the default placement.
    pub fn add_node_from_asset(&mut self, asset: &AssetDrop) -> Option<NodeId> {
        let (kind, patch) = drop::node_seed(asset)?;
        Some(self.add_node(kind, None, patch))
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn select_all(&mut self) -> bool {
        let all: Vec<NodeId> = self.graph.nodes.iter().map(|n| n.id).collect();
        self.selection.clear();
        self.selection.set_nodes(all);
        true
    }

    pub fn deselect(&mut self) -> bool {
        let had = !self.selection.is_empty();
        self.selection.clear();
        if matches!(self.session, Session::Selecting { .. }) {
            self.session = Session::Idle;
        }
        had
    }

    /// Delete every non-empty selection category at once: nodes, the
    /// group and connections. One history entry.
    pub fn delete_selected(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        self.checkpoint();
        let Selection {
            nodes,
            connections,
            group,
        } = std::mem::take(&mut self.selection);
        if !nodes.is_empty() {
            self.graph.remove_nodes(&nodes);
            for id in &nodes {
                self.generations.cancel(*id);
            }
        }
        if let Some(g) = group {
            self.graph.remove_group(g);
        }
        if !connections.is_empty() {
            self.graph.disconnect(&connections);
        }
        self.commit();
        log::debug!(
            "deleted selection: {} nodes, {} connections, group {:?}",
            nodes.len(),
            connections.len(),
            group
        );
        true
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn can_undo(&self) -> bool {
        self.history.can_undo() || self.session.has_moved()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo(&self.graph)
    }

    /// Step back one recorded state. A gesture still in progress is
    /// committed first, so undo reverts it and redo brings it back.
    pub fn undo(&mut self) -> bool {
        if self.session.has_moved() {
            self.commit();
        }
        self.session = Session::Idle;
        self.throttle.cancel();
        let changed = self.history.undo(&mut self.graph);
        if changed {
            self.after_restore();
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        self.session = Session::Idle;
        self.throttle.cancel();
        let changed = self.history.redo(&mut self.graph);
        if changed {
            self.after_restore();
        }
        changed
    }

    /// Drop selection entries and tickets that point at things the
    /// restored graph no longer has.
    fn after_restore(&mut self) {
        let graph = &self.graph;
        self.selection.retain_nodes(|id| graph.contains(id));
        self.selection.connections.retain(|c| graph.has_connection(*c));
        if self.selection.group.is_some_and(|g| graph.group(g).is_none()) {
            self.selection.group = None;
        }
        self.generations.retain(|id| graph.contains(id));
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport.resize(width, height);
    }

    /// Wheel zoom about the cursor.
    pub fn wheel(&mut self, x: f32, y: f32, delta_y: f32) -> bool {
        self.viewport
            .zoom_at(x, y, delta_y, self.config.zoom_intensity)
    }

    /// Step zoom about the viewport center.
    pub fn zoom_by(&mut self, step: f32) -> bool {
        let (cx, cy) = (self.viewport.width / 2.0, self.viewport.height / 2.0);
        let target = self.viewport.scale + step;
        self.viewport.set_scale_about(cx, cy, target)
    }

    // ─── Hit testing ─────────────────────────────────────────────────────

    pub fn hit_test(&self, x: f32, y: f32) -> Option<Hit> {
        hit_test(&self.graph, &self.viewport, x, y, &self.tolerance)
    }

    /// Rubber-band rectangle (screen space) while one is being dragged.
    pub fn selection_rect(&self) -> Option<Rect> {
        self.session.selection_rect()
    }

    /// Wire following the pointer while a connection is being dragged
    /// (world space).
    pub fn pending_connection(&self) -> Option<Route> {
        match self.session {
            Session::Connecting { from, pointer } => {
                let node = self.graph.node(from)?;
                Some(Route::pending(node, self.viewport.to_world(pointer.0, pointer.1)))
            }
            _ => None,
        }
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Route one input event. Pointer moves are applied immediately; hosts
    /// that want per-frame coalescing use `queue_pointer_move` and
    /// `on_frame` instead. Returns `true` if a redraw is needed.
    pub fn handle(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown { x, y, modifiers } => self.pointer_down(*x, *y, *modifiers),
            InputEvent::PointerMove { x, y, .. } => self.pointer_move(*x, *y),
            InputEvent::PointerUp { x, y, .. } => self.pointer_up(*x, *y),
            InputEvent::Wheel { x, y, delta_y } => self.wheel(*x, *y, *delta_y),
            InputEvent::KeyDown { key, modifiers } => self.key_down(key, *modifiers),
            InputEvent::KeyUp { key } => self.key_up(key),
        }
    }

    pub fn pointer_down(&mut self, x: f32, y: f32, mods: Modifiers) -> bool {
        // Settle whatever was still in flight.
        if !self.session.is_idle() {
            self.pointer_up(x, y);
        }
        self.throttle.cancel();

        if self.pan_mode {
            if mods.shift {
                return false;
            }
            self.session = Session::Panning { last: (x, y) };
            return true;
        }

        match self.hit_test(x, y) {
            Some(Hit::OutputPort(from)) => {
                self.session = Session::Connecting {
                    from,
                    pointer: (x, y),
                };
            }
            Some(Hit::InputPort(id)) | Some(Hit::Node(id)) => self.press_node(id, (x, y), mods),
            Some(Hit::ResizeHandle(id)) => {
                if let Some(node) = self.graph.node(id) {
                    self.session = Session::Resizing {
                        node: id,
                        initial: (node.width(), node.height()),
                        pointer_start: (x, y),
                        moved: false,
                    };
                }
            }
            Some(Hit::Connection(conn)) => self.selection.select_connection(conn),
            Some(Hit::Group(id)) => self.press_group(id, (x, y)),
            None => {
                self.selection.group = None;
                if mods.shift {
                    return true;
                }
                let base = if mods.command() {
                    self.selection.nodes.clone()
                } else {
                    self.selection.clear();
                    Vec::new()
                };
                self.session = Session::Selecting {
                    anchor: (x, y),
                    current: (x, y),
                    base,
                };
            }
        }
        true
    }

    fn press_node(&mut self, id: NodeId, pointer: (f32, f32), mods: Modifiers) {
        if mods.toggles_selection() {
            self.selection.toggle_node(id);
        } else if !self.selection.contains_node(id) {
            self.selection.set_nodes([id]);
        }
        // Pressing an already-selected node keeps the batch for a multi-drag.
        self.selection.group = None;
        self.selection.connections.clear();

        let others = self.selection.nodes.iter().copied().filter(|n| *n != id);
        let starts = DragStart::capture(&self.graph, std::iter::once(id).chain(others));
        self.session = Session::DraggingNodes {
            anchor: id,
            pointer_start: pointer,
            starts,
            moved: false,
        };
    }

    fn press_group(&mut self, id: GroupId, pointer: (f32, f32)) {
        let Some(group) = self.graph.group(id) else {
            return;
        };
        let group_start = (group.x, group.y);
        self.selection.select_group(id);
        let members = DragStart::capture(&self.graph, self.group_members(id));
        self.session = Session::DraggingGroup {
            group: id,
            group_start,
            pointer_start: pointer,
            members,
            moved: false,
        };
    }

    /// Queue a pointer move for the next frame. Returns `true` when the
    /// host needs to request an animation frame.
    pub fn queue_pointer_move(&mut self, x: f32, y: f32) -> bool {
        self.throttle.queue(x, y)
    }

    /// Apply the move queued since the last frame, if any.
    pub fn on_frame(&mut self) -> bool {
        match self.throttle.take() {
            Some((x, y)) => self.pointer_move(x, y),
            None => false,
        }
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        let now = (x, y);
        let delta = match &self.session {
            Session::DraggingNodes { pointer_start, .. }
            | Session::DraggingGroup { pointer_start, .. }
            | Session::Resizing { pointer_start, .. } => {
                let d = session::world_delta(&self.viewport, *pointer_start, now);
                if d == (0.0, 0.0) && !self.session.has_moved() {
                    return false;
                }
                d
            }
            _ => (0.0, 0.0),
        };
        // First real movement: settle the pre-gesture state.
        if self.session.mark_moved() {
            self.checkpoint();
        }

        match &mut self.session {
            Session::Idle => false,
            Session::Panning { last } => {
                self.viewport.pan_by(x - last.0, y - last.1);
                *last = now;
                true
            }
            Session::Selecting {
                anchor,
                current,
                base,
            } => {
                *current = now;
                let rect = Rect::from_corners(anchor.0, anchor.1, x, y);
                let hits = hit_test_rect(&self.graph, &self.viewport, &rect);
                self.selection.set_nodes(base.iter().copied().chain(hits));
                true
            }
            Session::DraggingNodes { starts, .. } => {
                session::apply_drag(&mut self.graph, starts, delta);
                true
            }
            Session::DraggingGroup {
                group,
                group_start,
                members,
                ..
            } => {
                if let Some(g) = self.graph.group_mut(*group) {
                    g.x = group_start.0 + delta.0;
                    g.y = group_start.1 + delta.1;
                }
                session::apply_drag(&mut self.graph, members, delta);
                true
            }
            Session::Resizing { node, initial, .. } => {
                let min = (self.config.min_node_width, self.config.min_node_height);
                let (w, h) = session::resized(*initial, delta, min);
                if let Some(n) = self.graph.node_mut(*node) {
                    n.width = Some(w);
                    n.height = Some(h);
                }
                true
            }
            Session::Connecting { pointer, .. } => {
                *pointer = now;
                true
            }
        }
    }

    /// End the current gesture. A pending coalesced move is applied first.
    pub fn pointer_up(&mut self, x: f32, y: f32) -> bool {
        if let Some((px, py)) = self.throttle.take() {
            self.pointer_move(px, py);
        }
        if self.session.is_idle() {
            return false;
        }
        self.pointer_move(x, y);

        match std::mem::take(&mut self.session) {
            Session::Connecting { from, .. } => {
                // Only a port completes the wire; bodies and grips do not.
                let target = match self.hit_test(x, y) {
                    Some(Hit::InputPort(to) | Hit::OutputPort(to)) => Some(to),
                    _ => None,
                };
                match target {
                    Some(to) if to != from => {
                        if let Err(e) = self.connect(from, to) {
                            log::debug!("connection rejected: {e}");
                        }
                    }
                    _ => log::trace!("pending connection from {from} discarded"),
                }
            }
            ended if ended.has_moved() => {
                self.commit();
                log::debug!("gesture committed");
            }
            _ => {}
        }
        true
    }

    pub fn key_down(&mut self, key: &str, mods: Modifiers) -> bool {
        let Some(action) = ShortcutMap::resolve(key, mods) else {
            return false;
        };
        match action {
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::Delete => self.delete_selected(),
            ShortcutAction::SelectAll => self.select_all(),
            ShortcutAction::Deselect => self.deselect(),
            ShortcutAction::ZoomIn => self.zoom_by(self.config.zoom_step),
            ShortcutAction::ZoomOut => self.zoom_by(-self.config.zoom_step),
            ShortcutAction::PanStart => !std::mem::replace(&mut self.pan_mode, true),
            ShortcutAction::PanEnd => false,
        }
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        if ShortcutMap::resolve_release(key) != Some(ShortcutAction::PanEnd) {
            return false;
        }
        self.pan_mode = false;
        if matches!(self.session, Session::Panning { .. }) {
            self.session = Session::Idle;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn editor_with(nodes: &[(&str, f32, f32)]) -> Editor {
        let mut graph = Graph::new();
        for (name, x, y) in nodes {
            let mut n = Node::new(NodeId::intern(name), NodeKind::PromptInput, *x, *y);
            n.height = Some(200.0);
            graph.add_node(n);
        }
        let mut ed = Editor::new(1200.0, 800.0);
        ed.load(graph);
        ed
    }

    fn pos(ed: &Editor, name: &str) -> (f32, f32) {
        let n = ed.graph.node(NodeId::intern(name)).unwrap();
        (n.x, n.y)
    }

    #[test]
    fn add_node_places_at_viewport_center() {
        let mut ed = Editor::new(1000.0, 800.0);
        let id = ed.add_node(NodeKind::VideoGenerator, None, PayloadPatch::default());
        let n = ed.graph.node(id).unwrap();
        assert_eq!((n.x, n.y), (500.0 - 210.0, 400.0 - 180.0));
        assert_eq!(n.payload.model.as_deref(), Some("veo-3.1-fast-generate-preview"));
        assert!(id.as_str().starts_with("n-"));
        assert!(ed.undo());
        assert!(ed.graph.is_empty());
    }

    #[test]
    fn click_on_node_then_drag_moves_it() {
        let mut ed = editor_with(&[("ed-a", 100.0, 100.0)]);
        assert!(ed.pointer_down(150.0, 150.0, Modifiers::NONE));
        assert_eq!(ed.selection.nodes, vec![NodeId::intern("ed-a")]);
        ed.pointer_move(180.0, 140.0);
        ed.pointer_up(180.0, 140.0);
        assert_eq!(pos(&ed, "ed-a"), (130.0, 90.0));
        assert!(ed.session().is_idle());

        assert!(ed.undo());
        assert_eq!(pos(&ed, "ed-a"), (100.0, 100.0));
        assert!(ed.redo());
        assert_eq!(pos(&ed, "ed-a"), (130.0, 90.0));
    }

    #[test]
    fn click_without_motion_records_nothing() {
        let mut ed = editor_with(&[("ed-a", 100.0, 100.0)]);
        ed.pointer_down(150.0, 150.0, Modifiers::NONE);
        ed.pointer_up(150.0, 150.0);
        assert_eq!(ed.history().len(), 1);
        assert!(!ed.can_undo());
    }

    #[test]
    fn modifier_click_toggles() {
        let mut ed = editor_with(&[("ed-a", 0.0, 0.0), ("ed-b", 600.0, 0.0)]);
        ed.pointer_down(50.0, 50.0, Modifiers::NONE);
        ed.pointer_up(50.0, 50.0);
        ed.pointer_down(650.0, 50.0, Modifiers::shift());
        ed.pointer_up(650.0, 50.0);
        assert_eq!(
            ed.selection.nodes,
            vec![NodeId::intern("ed-a"), NodeId::intern("ed-b")]
        );
        ed.pointer_down(50.0, 50.0, Modifiers::ctrl());
        ed.pointer_up(50.0, 50.0);
        assert_eq!(ed.selection.nodes, vec![NodeId::intern("ed-b")]);
    }

    #[test]
    fn resize_is_clamped_and_undoable() {
        let mut ed = editor_with(&[("ed-r", 0.0, 0.0)]);
        // Bottom-right grip of a 420x200 node.
        ed.pointer_down(415.0, 195.0, Modifiers::NONE);
        assert!(matches!(ed.session(), Session::Resizing { .. }));
        ed.pointer_move(0.0, 395.0);
        ed.pointer_up(0.0, 395.0);
        let n = ed.graph.node(NodeId::intern("ed-r")).unwrap();
        assert_eq!((n.width(), n.height()), (200.0, 400.0));
        assert!(ed.undo());
        let n = ed.graph.node(NodeId::intern("ed-r")).unwrap();
        assert_eq!((n.width(), n.height()), (420.0, 200.0));
    }

    #[test]
    fn port_drag_creates_connection() {
        let mut ed = editor_with(&[("ed-a", 0.0, 0.0), ("ed-b", 600.0, 0.0)]);
        // Output port of ed-a is at (420, 100).
        ed.pointer_down(420.0, 100.0, Modifiers::NONE);
        ed.pointer_move(500.0, 100.0);
        assert!(ed.pending_connection().is_some());
        // Input port of ed-b is at (600, 100).
        ed.pointer_up(604.0, 96.0);
        assert_eq!(
            ed.graph.inputs_of(NodeId::intern("ed-b")),
            vec![NodeId::intern("ed-a")]
        );
        assert!(ed.pending_connection().is_none());
    }

    #[test]
    fn port_drag_to_nowhere_or_self_is_discarded() {
        let mut ed = editor_with(&[("ed-a", 0.0, 0.0)]);
        ed.pointer_down(420.0, 100.0, Modifiers::NONE);
        ed.pointer_up(900.0, 700.0);
        ed.pointer_down(420.0, 100.0, Modifiers::NONE);
        ed.pointer_up(0.0, 100.0);
        assert!(ed.graph.connections.is_empty());
        assert!(!ed.can_undo());
    }

    #[test]
    fn port_drag_released_on_node_body_or_grip_connects_nothing() {
        let mut ed = editor_with(&[("ed-a", 0.0, 0.0), ("ed-b", 600.0, 0.0)]);
        ed.pointer_down(420.0, 100.0, Modifiers::NONE);
        ed.pointer_move(700.0, 120.0);
        ed.pointer_up(800.0, 150.0);
        assert!(ed.graph.connections.is_empty());

        // Bottom-right grip of ed-b.
        ed.pointer_down(420.0, 100.0, Modifiers::NONE);
        ed.pointer_up(1015.0, 195.0);
        assert!(ed.graph.connections.is_empty());
        assert!(!ed.can_undo());
        assert!(ed.session().is_idle());
    }

    #[test]
    fn clicking_connection_selects_only_it() {
        let mut ed = editor_with(&[("ed-a", 0.0, 0.0), ("ed-b", 800.0, 0.0)]);
        ed.connect(NodeId::intern("ed-a"), NodeId::intern("ed-b")).unwrap();
        ed.select_all();
        ed.pointer_down(610.0, 100.0, Modifiers::NONE);
        ed.pointer_up(610.0, 100.0);
        assert!(ed.selection.nodes.is_empty());
        assert_eq!(ed.selection.connections.len(), 1);

        assert!(ed.key_down("Backspace", Modifiers::NONE));
        assert!(ed.graph.connections.is_empty());
        assert_eq!(ed.graph.nodes.len(), 2);
    }

    #[test]
    fn space_drag_pans() {
        let mut ed = editor_with(&[("ed-a", 0.0, 0.0)]);
        assert!(ed.key_down(" ", Modifiers::NONE));
        // Pressing on a node still pans while space is held.
        ed.pointer_down(50.0, 50.0, Modifiers::NONE);
        ed.pointer_move(80.0, 20.0);
        ed.pointer_up(80.0, 20.0);
        assert_eq!((ed.viewport.pan_x, ed.viewport.pan_y), (30.0, -30.0));
        assert_eq!(pos(&ed, "ed-a"), (0.0, 0.0));
        assert!(ed.key_up(" "));
        assert!(!ed.pan_mode());
    }

    #[test]
    fn group_drag_moves_members() {
        let mut ed = editor_with(&[("ed-in", 100.0, 100.0), ("ed-out", 2000.0, 0.0)]);
        let g = ed.add_group(Rect::new(0.0, 0.0, 1000.0, 600.0), "Scene");
        // Grab the group outside any node.
        ed.pointer_down(800.0, 500.0, Modifiers::NONE);
        assert_eq!(ed.selection.group, Some(g));
        ed.pointer_move(850.0, 520.0);
        ed.pointer_up(850.0, 520.0);
        assert_eq!(pos(&ed, "ed-in"), (150.0, 120.0));
        assert_eq!(pos(&ed, "ed-out"), (2000.0, 0.0));
        let grp = ed.graph.group(g).unwrap();
        assert_eq!((grp.x, grp.y), (50.0, 20.0));
    }

    #[test]
    fn throttled_moves_coalesce_and_flush_on_up() {
        let mut ed = editor_with(&[("ed-a", 100.0, 100.0)]);
        ed.pointer_down(150.0, 150.0, Modifiers::NONE);
        assert!(ed.queue_pointer_move(160.0, 150.0));
        assert!(!ed.queue_pointer_move(170.0, 150.0));
        assert!(ed.on_frame());
        assert_eq!(pos(&ed, "ed-a"), (120.0, 100.0));
        assert!(!ed.on_frame());
        ed.queue_pointer_move(200.0, 160.0);
        ed.pointer_up(200.0, 160.0);
        assert_eq!(pos(&ed, "ed-a"), (150.0, 110.0));
    }

    #[test]
    fn delete_cancels_generation() {
        let mut ed = editor_with(&[("ed-g", 0.0, 0.0)]);
        let id = NodeId::intern("ed-g");
        let req = ed.begin_generation(id, None).unwrap();
        assert_eq!(ed.generations_in_flight(), 1);
        assert_eq!(ed.delete_nodes(&[id]), 1);
        assert!(!ed.complete_generation(req.ticket, Ok(PayloadPatch::default())));
        assert!(ed.graph.is_empty());
    }

    #[test]
    fn zoom_shortcuts_step_about_center() {
        let mut ed = Editor::new(800.0, 600.0);
        assert!(ed.key_down("=", Modifiers::ctrl()));
        assert!((ed.viewport.scale - 1.1).abs() < 1e-5);
        let (wx, wy) = ed.viewport.to_world(400.0, 300.0);
        assert!((wx - 400.0).abs() < 1e-2 && (wy - 300.0).abs() < 1e-2);
        assert!(ed.key_down("-", Modifiers::ctrl()));
        assert!((ed.viewport.scale - 1.0).abs() < 1e-5);
    }
}
