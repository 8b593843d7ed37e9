//! Load/save boundary for canvases and named workflows.
//!
//! JSON is the browser-storage format. Node records are written with an
//! `inputs` array (derived from the connections) so older readers keep
//! working, and on load any `inputs` entry without a matching connection is
//! turned into one. MessagePack is used for compact binary snapshots.

use crate::graph::Graph;
use crate::id::NodeId;
use crate::model::{Connection, Group, Node};
use serde::{Deserialize, Serialize};

/// Keys under which the host stores data in its key-value store.
pub mod keys {
    pub const WORKFLOWS: &str = "workflows";
    pub const NODES: &str = "nodes";
    pub const ASSETS: &str = "assets";
    pub const CHARACTERS: &str = "characters";
}

/// A node as stored on disk: the node plus its (redundant) input list.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NodeRecord {
    #[serde(flatten)]
    node: Node,
    #[serde(default)]
    inputs: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GraphRecord {
    #[serde(default)]
    nodes: Vec<NodeRecord>,
    #[serde(default)]
    connections: Vec<Connection>,
    #[serde(default)]
    groups: Vec<Group>,
}

impl From<&Graph> for GraphRecord {
    fn from(graph: &Graph) -> Self {
        Self {
            nodes: graph
                .nodes
                .iter()
                .map(|n| NodeRecord {
                    node: n.clone(),
                    inputs: graph.inputs_of(n.id),
                })
                .collect(),
            connections: graph.connections.clone(),
            groups: graph.groups.clone(),
        }
    }
}

impl From<GraphRecord> for Graph {
    fn from(record: GraphRecord) -> Self {
        let mut graph = Graph {
            nodes: Vec::with_capacity(record.nodes.len()),
            connections: Vec::with_capacity(record.connections.len()),
            groups: record.groups,
        };
        let mut legacy_inputs = Vec::new();
        for rec in record.nodes {
            for from in rec.inputs {
                legacy_inputs.push(Connection::new(from, rec.node.id));
            }
            graph.nodes.push(rec.node);
        }
        // Saved wiring is taken as-is (no cycle check); only dangling and
        // repeated edges are dropped.
        for conn in record.connections.into_iter().chain(legacy_inputs) {
            if !graph.contains(conn.from) || !graph.contains(conn.to) {
                log::debug!("dropping dangling connection {conn}");
                continue;
            }
            if !graph.has_connection(conn) {
                graph.connections.push(conn);
            }
        }
        graph
    }
}

impl Graph {
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str::<GraphRecord>(json)
            .map(Graph::from)
            .map_err(|e| format!("invalid canvas JSON: {e}"))
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string(&GraphRecord::from(self)).map_err(|e| e.to_string())
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>, String> {
        rmp_serde::to_vec_named(self).map_err(|e| e.to_string())
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, String> {
        rmp_serde::from_slice(bytes).map_err(|e| format!("invalid canvas snapshot: {e}"))
    }
}

/// A named, saved canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "WorkflowRecord", into = "WorkflowRecord")]
pub struct Workflow {
    pub id: String,
    pub title: String,
    /// First generated image on the canvas, used as a preview.
    pub thumbnail: String,
    pub graph: Graph,
}

#[derive(Serialize, Deserialize)]
struct WorkflowRecord {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    thumbnail: String,
    #[serde(flatten)]
    graph: GraphRecord,
}

impl From<WorkflowRecord> for Workflow {
    fn from(r: WorkflowRecord) -> Self {
        Self {
            id: r.id,
            title: r.title,
            thumbnail: r.thumbnail,
            graph: r.graph.into(),
        }
    }
}

impl From<Workflow> for WorkflowRecord {
    fn from(w: Workflow) -> Self {
        Self {
            graph: GraphRecord::from(&w.graph),
            id: w.id,
            title: w.title,
            thumbnail: w.thumbnail,
        }
    }
}

impl Workflow {
    pub fn new(id: impl Into<String>, title: impl Into<String>, graph: Graph) -> Self {
        let thumbnail = thumbnail_of(&graph);
        Self {
            id: id.into(),
            title: title.into(),
            thumbnail,
            graph,
        }
    }

    /// Replace the stored canvas, refreshing the thumbnail.
    pub fn store(&mut self, graph: &Graph) {
        self.thumbnail = thumbnail_of(graph);
        self.graph = graph.clone();
    }

    pub fn list_from_json(json: &str) -> Result<Vec<Workflow>, String> {
        serde_json::from_str(json).map_err(|e| format!("invalid workflow list: {e}"))
    }

    pub fn list_to_json(list: &[Workflow]) -> Result<String, String> {
        serde_json::to_string(list).map_err(|e| e.to_string())
    }
}

fn thumbnail_of(graph: &Graph) -> String {
    graph
        .nodes
        .iter()
        .find_map(|n| n.payload.image.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeKind, NodeStatus};
    use pretty_assertions::assert_eq;

    const LEGACY: &str = r#"{
        "nodes": [
            {"id": "p-1", "type": "PROMPT_INPUT", "x": 0, "y": 0, "title": "Prompt",
             "status": "SUCCESS", "data": {"prompt": "a lighthouse"}, "inputs": []},
            {"id": "p-2", "type": "IMAGE_GENERATOR", "x": 500, "y": 0, "width": 420,
             "title": "Image", "status": "IDLE", "data": {"image": "data:image/png;base64,AA"},
             "inputs": ["p-1"]},
            {"id": "p-3", "type": "VIDEO_GENERATOR", "x": 1000, "y": 0, "title": "Video",
             "status": "IDLE", "data": {}, "inputs": ["p-2", "p-gone"]}
        ],
        "connections": [{"from": "p-1", "to": "p-2"}]
    }"#;

    #[test]
    fn legacy_inputs_become_connections() {
        let g = Graph::from_json(LEGACY).unwrap();
        assert_eq!(g.nodes.len(), 3);
        assert_eq!(g.connections.len(), 2);
        assert_eq!(g.inputs_of(NodeId::intern("p-3")), vec![NodeId::intern("p-2")]);
        assert_eq!(g.node(NodeId::intern("p-1")).unwrap().status, NodeStatus::Success);
        assert!(g.groups.is_empty());
    }

    #[test]
    fn json_roundtrip_writes_derived_inputs() {
        let g = Graph::from_json(LEGACY).unwrap();
        let json = g.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["nodes"][2]["inputs"], serde_json::json!(["p-2"]));
        assert_eq!(Graph::from_json(&json).unwrap(), g);
    }

    #[test]
    fn msgpack_snapshot_roundtrip() {
        let g = Graph::from_json(LEGACY).unwrap();
        let bytes = g.to_msgpack().unwrap();
        assert_eq!(Graph::from_msgpack(&bytes).unwrap(), g);
        assert!(Graph::from_msgpack(&[0xc1]).is_err());
    }

    #[test]
    fn workflow_thumbnail_is_first_image() {
        let g = Graph::from_json(LEGACY).unwrap();
        let wf = Workflow::new("wf-1", "Lighthouse", g);
        assert_eq!(wf.thumbnail, "data:image/png;base64,AA");

        let json = Workflow::list_to_json(std::slice::from_ref(&wf)).unwrap();
        let back = Workflow::list_from_json(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].graph, wf.graph);
        assert_eq!(back[0].title, "Lighthouse");
    }

    #[test]
    fn workflow_without_groups_loads() {
        let json = r#"[{"id": "wf-2", "title": "t", "thumbnail": "", "nodes": [], "connections": []}]"#;
        let list = Workflow::list_from_json(json).unwrap();
        assert!(list[0].graph.is_empty());
        let mut wf = list.into_iter().next().unwrap();
        let mut g = Graph::new();
        let mut n = Node::new(NodeId::intern("wf-n"), NodeKind::ImageGenerator, 0.0, 0.0);
        n.payload.image = Some("blob:x".into());
        g.add_node(n);
        wf.store(&g);
        assert_eq!(wf.thumbnail, "blob:x");
    }
}
