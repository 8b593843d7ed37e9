//! Pointer gesture state.
//!
//! A `Session` starts on pointer-down, is advanced by (coalesced) pointer
//! moves and ends on pointer-up. Drag sessions capture start positions once
//! and recompute from them on every move, so rounding never accumulates.
//! Screen deltas are divided by the current scale before touching world
//! coordinates.

use ink_core::geometry::Rect;
use ink_core::id::{GroupId, NodeId};
use ink_core::{Graph, Viewport};

/// Start position of one node taking part in a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragStart {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
}

impl DragStart {
    /// Capture the current position of every id that exists.
    pub fn capture(graph: &Graph, ids: impl IntoIterator<Item = NodeId>) -> Vec<DragStart> {
        ids.into_iter()
            .filter_map(|id| graph.node(id).map(|n| DragStart { id, x: n.x, y: n.y }))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Session {
    #[default]
    Idle,
    /// Space-drag panning. `last` is the previous pointer position.
    Panning { last: (f32, f32) },
    /// Rubber-band selection in screen space. `base` holds the nodes kept
    /// from before the gesture (ctrl/meta held), empty otherwise.
    Selecting {
        anchor: (f32, f32),
        current: (f32, f32),
        base: Vec<NodeId>,
    },
    /// Moving the pressed node plus every co-selected node.
    DraggingNodes {
        anchor: NodeId,
        pointer_start: (f32, f32),
        starts: Vec<DragStart>,
        moved: bool,
    },
    /// Moving a group together with its members.
    DraggingGroup {
        group: GroupId,
        group_start: (f32, f32),
        pointer_start: (f32, f32),
        members: Vec<DragStart>,
        moved: bool,
    },
    Resizing {
        node: NodeId,
        initial: (f32, f32),
        pointer_start: (f32, f32),
        moved: bool,
    },
    /// Dragging a new wire out of `from`'s output port. `pointer` is in
    /// screen space.
    Connecting { from: NodeId, pointer: (f32, f32) },
}

impl Session {
    pub fn is_idle(&self) -> bool {
        matches!(self, Session::Idle)
    }

    /// Normalized rubber-band rectangle in screen space.
    pub fn selection_rect(&self) -> Option<Rect> {
        match self {
            Session::Selecting {
                anchor, current, ..
            } => Some(Rect::from_corners(anchor.0, anchor.1, current.0, current.1)),
            _ => None,
        }
    }

    /// Whether this gesture has changed the graph and needs a history entry
    /// when it ends.
    pub fn has_moved(&self) -> bool {
        match self {
            Session::DraggingNodes { moved, .. }
            | Session::DraggingGroup { moved, .. }
            | Session::Resizing { moved, .. } => *moved,
            _ => false,
        }
    }

    /// Flag a drag/resize as having changed the graph. Returns `true` the
    /// first time, which is when the pre-gesture snapshot must be taken.
    pub fn mark_moved(&mut self) -> bool {
        match self {
            Session::DraggingNodes { moved, .. }
            | Session::DraggingGroup { moved, .. }
            | Session::Resizing { moved, .. } => !std::mem::replace(moved, true),
            _ => false,
        }
    }
}

/// Screen-space pointer travel converted to world units.
pub fn world_delta(viewport: &Viewport, start: (f32, f32), now: (f32, f32)) -> (f32, f32) {
    (
        viewport.to_world_len(now.0 - start.0),
        viewport.to_world_len(now.1 - start.1),
    )
}

/// Place every captured node at its start plus `delta`.
pub fn apply_drag(graph: &mut Graph, starts: &[DragStart], delta: (f32, f32)) {
    for s in starts {
        if let Some(node) = graph.node_mut(s.id) {
            node.x = s.x + delta.0;
            node.y = s.y + delta.1;
        }
    }
}

/// Size after a resize gesture, clamped to `min`.
pub fn resized(initial: (f32, f32), delta: (f32, f32), min: (f32, f32)) -> (f32, f32) {
    (
        (initial.0 + delta.0).max(min.0),
        (initial.1 + delta.1).max(min.1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ink_core::model::{Node, NodeKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn delta_is_divided_by_scale() {
        let vp = Viewport {
            scale: 2.0,
            pan_x: 300.0,
            ..Viewport::default()
        };
        assert_eq!(world_delta(&vp, (10.0, 10.0), (110.0, -30.0)), (50.0, -20.0));
    }

    #[test]
    fn drag_applies_one_delta_to_all() {
        let mut g = Graph::new();
        g.add_node(Node::new(NodeId::intern("ss-a"), NodeKind::PromptInput, 0.0, 0.0));
        g.add_node(Node::new(NodeId::intern("ss-b"), NodeKind::PromptInput, 700.0, 300.0));
        let starts = DragStart::capture(
            &g,
            [NodeId::intern("ss-a"), NodeId::intern("ss-b"), NodeId::intern("ss-gone")],
        );
        assert_eq!(starts.len(), 2);
        apply_drag(&mut g, &starts, (5.0, 5.0));
        // Recomputed from the start, not accumulated.
        apply_drag(&mut g, &starts, (50.0, -20.0));
        let b = g.node(NodeId::intern("ss-b")).unwrap();
        assert_eq!((b.x, b.y), (750.0, 280.0));
    }

    #[test]
    fn resize_is_clamped() {
        assert_eq!(resized((420.0, 380.0), (-400.0, 20.0), (200.0, 150.0)), (200.0, 400.0));
    }

    #[test]
    fn mark_moved_reports_first_time_only() {
        let mut s = Session::Resizing {
            node: NodeId::intern("ss-r"),
            initial: (1.0, 1.0),
            pointer_start: (0.0, 0.0),
            moved: false,
        };
        assert!(!s.has_moved());
        assert!(s.mark_moved());
        assert!(!s.mark_moved());
        assert!(s.has_moved());
        assert!(!Session::Idle.clone().mark_moved());
    }

    #[test]
    fn selection_rect_is_normalized() {
        let s = Session::Selecting {
            anchor: (300.0, 40.0),
            current: (100.0, 90.0),
            base: vec![],
        };
        assert_eq!(s.selection_rect(), Some(Rect::new(100.0, 40.0, 200.0, 50.0)));
        assert_eq!(Session::Idle.selection_rect(), None);
    }
}
