//! Hit testing: screen point → canvas element, screen rect → nodes.
//!
//! Tolerances are given in screen pixels and converted to world units with
//! the current scale, so ports and connections stay equally easy to grab at
//! every zoom level.

use crate::route::connection_route;
use ink_core::geometry::Rect;
use ink_core::id::{GroupId, NodeId};
use ink_core::model::Connection;
use ink_core::{EditorConfig, Graph, Viewport};

/// What lies under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    OutputPort(NodeId),
    InputPort(NodeId),
    ResizeHandle(NodeId),
    Node(NodeId),
    Connection(Connection),
    Group(GroupId),
}

impl Hit {
    /// The node this hit belongs to, if any.
    pub fn node(&self) -> Option<NodeId> {
        match *self {
            Hit::OutputPort(id) | Hit::InputPort(id) | Hit::ResizeHandle(id) | Hit::Node(id) => {
                Some(id)
            }
            _ => None,
        }
    }
}

/// Pick tolerances in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTolerance {
    pub port_radius: f32,
    pub handle_size: f32,
    /// Full width of the invisible pick stroke along a connection.
    pub connection_width: f32,
}

impl Default for HitTolerance {
    fn default() -> Self {
        Self::from(&EditorConfig::default())
    }
}

impl From<&EditorConfig> for HitTolerance {
    fn from(cfg: &EditorConfig) -> Self {
        Self {
            port_radius: cfg.port_hit_radius,
            handle_size: cfg.resize_handle_size,
            connection_width: cfg.connection_hit_width,
        }
    }
}

fn within(p: (f32, f32), q: (f32, f32), radius: f32) -> bool {
    let (dx, dy) = (p.0 - q.0, p.1 - q.1);
    dx * dx + dy * dy <= radius * radius
}

/// Find the topmost element at screen position `(sx, sy)`.
///
/// Order: ports (they overhang node edges), resize handles and node bodies
/// from the last-drawn node down, then connections, then groups.
pub fn hit_test(
    graph: &Graph,
    viewport: &Viewport,
    sx: f32,
    sy: f32,
    tol: &HitTolerance,
) -> Option<Hit> {
    let p = viewport.to_world(sx, sy);
    let port_r = viewport.to_world_len(tol.port_radius);
    let handle = viewport.to_world_len(tol.handle_size);

    for node in graph.nodes.iter().rev() {
        if within(p, node.output_anchor(), port_r) {
            return Some(Hit::OutputPort(node.id));
        }
        if within(p, node.input_anchor(), port_r) {
            return Some(Hit::InputPort(node.id));
        }
    }

    for node in graph.nodes.iter().rev() {
        let b = node.bounds();
        if !b.contains(p.0, p.1) {
            continue;
        }
        let grip = Rect::new(b.right() - handle, b.bottom() - handle, handle, handle);
        if grip.contains(p.0, p.1) {
            return Some(Hit::ResizeHandle(node.id));
        }
        return Some(Hit::Node(node.id));
    }

    if let Some(conn) = hit_connection(graph, viewport, sx, sy, tol.connection_width) {
        return Some(Hit::Connection(conn));
    }

    graph
        .groups
        .iter()
        .rev()
        .find(|g| g.bounds().contains(p.0, p.1))
        .map(|g| Hit::Group(g.id))
}

/// Topmost connection whose pick stroke (`width` screen px wide) covers the
/// screen point.
pub fn hit_connection(
    graph: &Graph,
    viewport: &Viewport,
    sx: f32,
    sy: f32,
    width: f32,
) -> Option<Connection> {
    let (wx, wy) = viewport.to_world(sx, sy);
    let reach = viewport.to_world_len(width / 2.0);
    graph.connections.iter().rev().copied().find(|conn| {
        connection_route(graph, conn).is_some_and(|route| {
            let b = route.bounds();
            // Cheap reject before the nearest-point search.
            Rect::new(b.x - reach, b.y - reach, b.width + 2.0 * reach, b.height + 2.0 * reach)
                .contains(wx, wy)
                && route.distance_to(wx, wy) <= reach
        })
    })
}

/// All nodes whose on-screen box intersects the screen-space `rect`.
/// Used for rubber-band selection.
pub fn hit_test_rect(graph: &Graph, viewport: &Viewport, rect: &Rect) -> Vec<NodeId> {
    let (x1, y1, x2, y2) = (rect.x, rect.y, rect.right(), rect.bottom());
    graph
        .nodes
        .iter()
        .filter(|n| {
            let s = viewport.world_rect_to_screen(&n.bounds());
            s.x < x2 && s.x + s.width > x1 && s.y < y2 && s.y + s.height > y1
        })
        .map(|n| n.id)
        .collect()
}
