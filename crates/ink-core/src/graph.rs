//! The graph store: nodes, connections, and groups of one canvas.
//!
//! `Graph` is an owned value (one per editor instance). A node's upstream
//! inputs are never stored on the node; they are derived from the connection
//! list, so deleting a node or a connection cannot leave stale inputs behind.

use crate::geometry::Rect;
use crate::id::{GroupId, NodeId};
use crate::model::{Connection, Group, Node, NodeStatus, PayloadPatch};
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Why a connection was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectError {
    /// An endpoint does not exist.
    UnknownNode(NodeId),
    /// `from == to`.
    SelfLoop(NodeId),
    /// The exact edge already exists.
    Duplicate(Connection),
    /// `to` already reaches `from`, so the edge would close a cycle.
    Cycle(Connection),
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::UnknownNode(id) => write!(f, "unknown node {id}"),
            ConnectError::SelfLoop(id) => write!(f, "node {id} cannot feed itself"),
            ConnectError::Duplicate(c) => write!(f, "connection {c} already exists"),
            ConnectError::Cycle(c) => write!(f, "connection {c} would create a cycle"),
        }
    }
}

impl std::error::Error for ConnectError {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    /// Draw order: later nodes paint on top.
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.connections.is_empty() && self.groups.is_empty()
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Merge `patch` into the node's payload and optionally overwrite its
    /// size and title. Returns `false` if the node does not exist.
    pub fn update_node(
        &mut self,
        id: NodeId,
        patch: PayloadPatch,
        size: Option<(f32, f32)>,
        title: Option<&str>,
    ) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        node.payload.merge(patch);
        if let Some((w, h)) = size {
            node.width = Some(w);
            node.height = Some(h);
        }
        if let Some(title) = title {
            node.title = title.to_string();
        }
        true
    }

    pub fn set_status(&mut self, id: NodeId, status: NodeStatus) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.status = status;
                true
            }
            None => false,
        }
    }

    /// Remove nodes and every connection touching them.
    /// Returns the number of nodes removed.
    pub fn remove_nodes(&mut self, ids: &[NodeId]) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|n| !ids.contains(&n.id));
        self.connections
            .retain(|c| !ids.contains(&c.from) && !ids.contains(&c.to));
        before - self.nodes.len()
    }

    // ─── Connections ─────────────────────────────────────────────────────

    /// Upstream nodes of `id`, in connection order.
    pub fn inputs_of(&self, id: NodeId) -> Vec<NodeId> {
        self.connections
            .iter()
            .filter(|c| c.to == id)
            .map(|c| c.from)
            .collect()
    }

    /// Downstream nodes of `id`, in connection order.
    pub fn outputs_of(&self, id: NodeId) -> Vec<NodeId> {
        self.connections
            .iter()
            .filter(|c| c.from == id)
            .map(|c| c.to)
            .collect()
    }

    pub fn has_connection(&self, conn: Connection) -> bool {
        self.connections.contains(&conn)
    }

    /// Find a connection by its `"{from}-{to}"` key.
    pub fn connection_by_key(&self, key: &str) -> Option<Connection> {
        self.connections.iter().copied().find(|c| c.key() == key)
    }

    /// Check whether `from → to` may be added.
    pub fn can_connect(&self, from: NodeId, to: NodeId) -> Result<(), ConnectError> {
        for id in [from, to] {
            if !self.contains(id) {
                return Err(ConnectError::UnknownNode(id));
            }
        }
        if from == to {
            return Err(ConnectError::SelfLoop(from));
        }
        let conn = Connection::new(from, to);
        if self.has_connection(conn) {
            return Err(ConnectError::Duplicate(conn));
        }
        if self.reaches(to, from) {
            return Err(ConnectError::Cycle(conn));
        }
        Ok(())
    }

    /// Append `from → to` after validating it.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<Connection, ConnectError> {
        self.can_connect(from, to)?;
        let conn = Connection::new(from, to);
        self.connections.push(conn);
        Ok(conn)
    }

    /// Remove the given connections. Returns how many were removed.
    pub fn disconnect(&mut self, conns: &[Connection]) -> usize {
        let before = self.connections.len();
        self.connections.retain(|c| !conns.contains(c));
        before - self.connections.len()
    }

    /// Whether a directed path `start → … → goal` exists.
    pub fn reaches(&self, start: NodeId, goal: NodeId) -> bool {
        let mut dag: DiGraph<NodeId, ()> = DiGraph::with_capacity(self.nodes.len(), self.connections.len());
        let mut index: HashMap<NodeId, NodeIndex> = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            index.insert(node.id, dag.add_node(node.id));
        }
        for c in &self.connections {
            if let (Some(&a), Some(&b)) = (index.get(&c.from), index.get(&c.to)) {
                dag.add_edge(a, b, ());
            }
        }
        match (index.get(&start), index.get(&goal)) {
            (Some(&a), Some(&b)) => has_path_connecting(&dag, a, b, None),
            _ => false,
        }
    }

    // ─── Groups ──────────────────────────────────────────────────────────

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    pub fn add_group(&mut self, group: Group) {
        self.groups.push(group);
    }

    pub fn remove_group(&mut self, id: GroupId) -> bool {
        let before = self.groups.len();
        self.groups.retain(|g| g.id != id);
        before != self.groups.len()
    }

    /// Union of every node's bounds, or `None` on an empty canvas.
    pub fn content_bounds(&self) -> Option<Rect> {
        let mut it = self.nodes.iter().map(Node::bounds);
        let first = it.next()?;
        let (mut x1, mut y1, mut x2, mut y2) = (first.x, first.y, first.right(), first.bottom());
        for b in it {
            x1 = x1.min(b.x);
            y1 = y1.min(b.y);
            x2 = x2.max(b.right());
            y2 = y2.max(b.bottom());
        }
        Some(Rect::from_corners(x1, y1, x2, y2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeKind, NodePayload};
    use pretty_assertions::assert_eq;

    fn node(name: &str, x: f32, y: f32) -> Node {
        Node::new(NodeId::intern(name), NodeKind::PromptInput, x, y)
    }

    fn chain() -> Graph {
        let mut g = Graph::new();
        for (i, name) in ["ga", "gb", "gc"].iter().enumerate() {
            g.add_node(node(name, i as f32 * 500.0, 0.0));
        }
        g.connect(NodeId::intern("ga"), NodeId::intern("gb")).unwrap();
        g.connect(NodeId::intern("gb"), NodeId::intern("gc")).unwrap();
        g
    }

    #[test]
    fn inputs_are_derived_from_connections() {
        let g = chain();
        assert_eq!(g.inputs_of(NodeId::intern("gb")), vec![NodeId::intern("ga")]);
        assert_eq!(g.outputs_of(NodeId::intern("gb")), vec![NodeId::intern("gc")]);
        assert!(g.inputs_of(NodeId::intern("ga")).is_empty());
    }

    #[test]
    fn remove_node_cascades_to_connections() {
        let mut g = chain();
        assert_eq!(g.remove_nodes(&[NodeId::intern("gb")]), 1);
        assert!(g.connections.is_empty());
        assert!(g.inputs_of(NodeId::intern("gc")).is_empty());
    }

    #[test]
    fn rejects_self_loop_duplicate_and_cycle() {
        let mut g = chain();
        let (a, b, c) = (NodeId::intern("ga"), NodeId::intern("gb"), NodeId::intern("gc"));
        assert_eq!(g.connect(a, a), Err(ConnectError::SelfLoop(a)));
        assert_eq!(
            g.connect(a, b),
            Err(ConnectError::Duplicate(Connection::new(a, b)))
        );
        assert_eq!(g.connect(c, a), Err(ConnectError::Cycle(Connection::new(c, a))));
        // Skipping ahead along the chain is fine.
        assert!(g.connect(a, c).is_ok());
        assert_eq!(g.connections.len(), 3);
    }

    #[test]
    fn unknown_endpoint_is_rejected() {
        let mut g = chain();
        let ghost = NodeId::intern("ghost");
        assert_eq!(
            g.connect(NodeId::intern("ga"), ghost),
            Err(ConnectError::UnknownNode(ghost))
        );
    }

    #[test]
    fn update_merges_payload_and_overrides() {
        let mut g = chain();
        let id = NodeId::intern("ga");
        let patch = PayloadPatch {
            prompt: Some(Some("sunrise".into())),
            ..Default::default()
        };
        assert!(g.update_node(id, patch, Some((500.0, 300.0)), Some("Intro")));
        let n = g.node(id).unwrap();
        assert_eq!(n.payload.prompt.as_deref(), Some("sunrise"));
        // Untouched fields keep their defaults.
        assert_eq!(n.payload.aspect_ratio.as_deref(), Some("16:9"));
        assert_eq!((n.width(), n.height()), (500.0, 300.0));
        assert_eq!(n.title, "Intro");

        // A title override always overwrites, even with an empty string.
        assert!(g.update_node(id, PayloadPatch::default(), None, Some("")));
        assert_eq!(g.node(id).unwrap().title, "");
        assert!(g.update_node(id, PayloadPatch::default(), None, None));
        assert_eq!(g.node(id).unwrap().title, "");
        assert!(!g.update_node(NodeId::intern("nope"), PayloadPatch::default(), None, None));
    }

    #[test]
    fn disconnect_by_key() {
        let mut g = chain();
        let conn = g.connection_by_key("ga-gb").unwrap();
        assert_eq!(g.disconnect(&[conn]), 1);
        assert_eq!(g.connections.len(), 1);
        assert!(g.connection_by_key("ga-gb").is_none());
    }

    #[test]
    fn content_bounds_spans_all_nodes() {
        let mut g = Graph::new();
        assert_eq!(g.content_bounds(), None);
        g.add_node(node("cb1", -100.0, 0.0));
        let mut far = node("cb2", 600.0, 400.0);
        far.payload = NodePayload::default();
        g.add_node(far);
        assert_eq!(g.content_bounds(), Some(Rect::new(-100.0, 0.0, 1120.0, 780.0)));
    }
}
