//! Snapshot history with linear undo/redo.
//!
//! Every entry is a full copy of the graph (nodes, connections, groups).
//! A structural edit calls `checkpoint` before mutating and `push` after;
//! a drag or resize checkpoints on its first real move and pushes on
//! pointer-up. Payload edits never push.
//!
//! Payload edits still change the live graph, so it can drift from the
//! entry under the cursor. Such unrecorded edits are folded into that
//! entry (at the next checkpoint, undo or redo) instead of becoming an
//! undo step of their own.

use ink_core::Graph;

/// A full copy of the canvas state.
pub type Snapshot = Graph;

/// Bounded linear history.
pub struct History {
    entries: Vec<Snapshot>,
    /// Entry the live state was last recorded as.
    index: usize,
    /// Maximum number of entries kept; the oldest is evicted first.
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(50)
    }
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            entries: Vec::with_capacity(max_depth),
            index: 0,
            max_depth: max_depth.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Drop everything and start over from `graph`.
    pub fn reset(&mut self, graph: &Graph) {
        self.entries.clear();
        self.entries.push(graph.clone());
        self.index = 0;
    }

    /// Record `graph` as the newest entry. Entries after the cursor are
    /// discarded. A snapshot equal to the entry under the cursor is not
    /// stored twice. Returns `true` if an entry was appended.
    pub fn push(&mut self, graph: &Graph) -> bool {
        if self.entries.get(self.index) == Some(graph) {
            return false;
        }
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(graph.clone());
        if self.entries.len() > self.max_depth {
            let excess = self.entries.len() - self.max_depth;
            self.entries.drain(..excess);
        }
        self.index = self.entries.len() - 1;
        log::trace!("history: {} entries, at {}", self.entries.len(), self.index);
        true
    }

    /// Make the entry under the cursor match `live` before a structural
    /// edit. Unrecorded edits overwrite that entry and drop the redo
    /// branch; nothing is appended.
    pub fn checkpoint(&mut self, live: &Graph) {
        if self.entries.is_empty() {
            self.push(live);
            return;
        }
        if self.entries[self.index] != *live {
            self.entries[self.index] = live.clone();
            self.entries.truncate(self.index + 1);
            log::trace!("history: folded unrecorded edits into entry {}", self.index);
        }
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self, live: &Graph) -> bool {
        self.index + 1 < self.entries.len() && self.entries.get(self.index) == Some(live)
    }

    /// Step back one entry, replacing `live` wholesale.
    /// Returns `false` when there is nothing older to go back to.
    pub fn undo(&mut self, live: &mut Graph) -> bool {
        if !self.can_undo() {
            return false;
        }
        // Redo comes back to the live state, unrecorded edits included.
        self.checkpoint(live);
        self.index -= 1;
        *live = self.entries[self.index].clone();
        true
    }

    /// Step forward one entry. Returns `false` at the tip, or when `live`
    /// has diverged from the entry under the cursor (the edit is kept and
    /// the redo branch is discarded).
    pub fn redo(&mut self, live: &mut Graph) -> bool {
        if !self.can_redo(live) {
            if !self.entries.is_empty() {
                self.checkpoint(live);
            }
            return false;
        }
        self.index += 1;
        *live = self.entries[self.index].clone();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ink_core::id::NodeId;
    use ink_core::model::{Node, NodeKind};
    use ink_core::PayloadPatch;
    use pretty_assertions::assert_eq;

    fn with_node(g: &Graph, name: &str) -> Graph {
        let mut g = g.clone();
        g.add_node(Node::new(NodeId::intern(name), NodeKind::PromptInput, 0.0, 0.0));
        g
    }

    /// Structural edit the way the editor records one.
    fn record(h: &mut History, live: &mut Graph, name: &str) {
        h.checkpoint(live);
        *live = with_node(live, name);
        h.push(live);
    }

    fn retitle(live: &mut Graph, name: &str, title: &str) {
        live.update_node(
            NodeId::intern(name),
            PayloadPatch::default(),
            None,
            Some(title),
        );
    }

    #[test]
    fn undo_then_redo_returns_to_live_state() {
        let mut h = History::new(50);
        let mut live = Graph::new();
        h.reset(&live);
        record(&mut h, &mut live, "h-a");
        record(&mut h, &mut live, "h-b");
        let after_b = live.clone();

        assert!(h.undo(&mut live));
        assert_eq!(live.nodes.len(), 1);
        assert!(h.undo(&mut live));
        assert!(live.is_empty());
        assert!(!h.undo(&mut live), "nothing older than the first entry");

        assert!(h.redo(&mut live));
        assert!(h.redo(&mut live));
        assert_eq!(live, after_b);
        assert!(!h.redo(&mut live));
    }

    #[test]
    fn payload_edit_is_not_an_undo_step() {
        let mut h = History::new(50);
        let mut live = Graph::new();
        h.reset(&live);
        record(&mut h, &mut live, "h-p");
        retitle(&mut live, "h-p", "edited");

        assert_eq!(h.len(), 2);
        // One undo reverts the add, not the title edit alone.
        assert!(h.undo(&mut live));
        assert!(live.is_empty());
        assert!(!h.can_undo());
        // Redo brings the add back with the edit folded in.
        assert!(h.redo(&mut live));
        assert_eq!(live.node(NodeId::intern("h-p")).unwrap().title, "edited");
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn push_after_undo_discards_redo_branch() {
        let mut h = History::new(50);
        let mut live = Graph::new();
        h.reset(&live);
        record(&mut h, &mut live, "h-a");
        assert!(h.undo(&mut live));
        assert!(h.can_redo(&live));

        record(&mut h, &mut live, "h-c");
        assert!(!h.can_redo(&live));
        assert!(!h.redo(&mut live));
        assert!(h.undo(&mut live));
        assert!(live.is_empty());
    }

    #[test]
    fn unrecorded_edit_after_undo_beats_redo() {
        let mut h = History::new(50);
        let mut live = Graph::new();
        h.reset(&live);
        record(&mut h, &mut live, "h-k");
        record(&mut h, &mut live, "h-gone");
        assert!(h.undo(&mut live));
        retitle(&mut live, "h-k", "kept");

        assert!(!h.can_redo(&live));
        assert!(!h.redo(&mut live));
        assert_eq!(h.len(), 2);
        assert!(!live.contains(NodeId::intern("h-gone")));
        assert_eq!(live.node(NodeId::intern("h-k")).unwrap().title, "kept");
    }

    #[test]
    fn identical_snapshots_are_stored_once() {
        let mut h = History::new(50);
        let g = Graph::new();
        assert!(h.push(&g));
        assert!(!h.push(&g));
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn depth_is_bounded() {
        let mut h = History::new(5);
        let mut live = Graph::new();
        h.reset(&live);
        for i in 0..12 {
            record(&mut h, &mut live, &format!("h-bound-{i}"));
        }
        assert_eq!(h.len(), 5);
        let mut steps = 0;
        while h.undo(&mut live) {
            steps += 1;
        }
        assert_eq!(steps, 4);
        assert_eq!(live.nodes.len(), 8);
    }

    #[test]
    fn empty_history_cannot_undo() {
        let mut h = History::default();
        let mut live = with_node(&Graph::new(), "h-x");
        assert!(!h.can_undo());
        assert!(!h.undo(&mut live));
        assert!(!h.redo(&mut live));
        assert_eq!(live.nodes.len(), 1);
    }
}
