//! Selected nodes, connections and group.
//!
//! The three categories are independent sets. The editor keeps them
//! mostly exclusive (picking a connection clears the others) but nothing
//! here enforces that beyond the helpers below.

use ink_core::id::{GroupId, NodeId};
use ink_core::model::Connection;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Selected nodes in pick order.
    pub nodes: Vec<NodeId>,
    pub connections: Vec<Connection>,
    pub group: Option<GroupId>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.connections.is_empty() && self.group.is_none()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.connections.clear();
        self.group = None;
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    /// Add `id` if absent, remove it if present.
    pub fn toggle_node(&mut self, id: NodeId) {
        if let Some(pos) = self.nodes.iter().position(|n| *n == id) {
            self.nodes.remove(pos);
        } else {
            self.nodes.push(id);
        }
    }

    /// Replace the node selection, dropping duplicates.
    pub fn set_nodes(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.nodes.clear();
        for id in ids {
            if !self.nodes.contains(&id) {
                self.nodes.push(id);
            }
        }
    }

    /// Select exactly one connection.
    pub fn select_connection(&mut self, conn: Connection) {
        self.clear();
        self.connections.push(conn);
    }

    /// Select exactly one group.
    pub fn select_group(&mut self, id: GroupId) {
        self.clear();
        self.group = Some(id);
    }

    /// Forget nodes (and connections touching them) that no longer exist.
    pub fn retain_nodes(&mut self, mut keep: impl FnMut(NodeId) -> bool) {
        self.nodes.retain(|id| keep(*id));
        self.connections.retain(|c| keep(c.from) && keep(c.to));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn toggle_adds_then_removes() {
        let mut sel = Selection::default();
        let a = NodeId::intern("sel-a");
        sel.toggle_node(a);
        assert_eq!(sel.nodes, vec![a]);
        sel.toggle_node(a);
        assert!(sel.is_empty());
    }

    #[test]
    fn connection_pick_clears_everything_else() {
        let (a, b) = (NodeId::intern("sel-a"), NodeId::intern("sel-b"));
        let mut sel = Selection {
            nodes: vec![a, b],
            connections: vec![],
            group: Some(GroupId::intern("sel-g")),
        };
        sel.select_connection(Connection::new(a, b));
        assert!(sel.nodes.is_empty());
        assert_eq!(sel.group, None);
        assert_eq!(sel.connections, vec![Connection::new(a, b)]);
    }

    #[test]
    fn set_nodes_dedups() {
        let a = NodeId::intern("sel-a");
        let mut sel = Selection::default();
        sel.set_nodes([a, a]);
        assert_eq!(sel.nodes, vec![a]);
    }

    #[test]
    fn retain_prunes_connections_too() {
        let (a, b) = (NodeId::intern("sel-a"), NodeId::intern("sel-b"));
        let mut sel = Selection {
            nodes: vec![a, b],
            connections: vec![Connection::new(a, b)],
            group: None,
        };
        sel.retain_nodes(|id| id != a);
        assert_eq!(sel.nodes, vec![b]);
        assert!(sel.connections.is_empty());
    }
}
