//! Bookkeeping around external generation calls.
//!
//! The provider itself lives outside the engine. Starting a generation
//! marks the node `Working` and hands the host a `GenerationRequest`
//! describing what to send. The host later reports back with the ticket it
//! was given. Tickets die with their node (or when a newer run on the same
//! node supersedes them), so a late result can never land on a deleted or
//! re-run node.

use ink_core::id::NodeId;
use ink_core::model::{NodeKind, NodePayload, NodeStatus};
use ink_core::{Graph, PayloadPatch};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifies one generation run on one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenerationTicket {
    pub node: NodeId,
    pub epoch: u64,
}

/// Everything the host needs to call the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub ticket: GenerationTicket,
    pub kind: NodeKind,
    /// Prompt override, or the node's own prompt.
    pub prompt: Option<String>,
    /// The node's payload at dispatch time.
    pub payload: NodePayload,
    /// Text outputs of direct upstream nodes, in input order.
    pub upstream_texts: Vec<String>,
    /// Image outputs of direct upstream nodes, in input order.
    pub upstream_images: Vec<String>,
}

/// Provider result: payload fields to merge, or an error message.
pub type GenerationOutcome = Result<PayloadPatch, String>;

/// Live tickets, one per node at most.
#[derive(Debug, Default)]
pub struct Generations {
    next_epoch: u64,
    live: HashMap<NodeId, u64>,
}

impl Generations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for `node`, superseding any run already in flight.
    pub fn issue(&mut self, node: NodeId) -> GenerationTicket {
        self.next_epoch += 1;
        let epoch = self.next_epoch;
        if self.live.insert(node, epoch).is_some() {
            log::debug!("generation on {node} superseded");
        }
        GenerationTicket { node, epoch }
    }

    pub fn is_live(&self, ticket: &GenerationTicket) -> bool {
        self.live.get(&ticket.node) == Some(&ticket.epoch)
    }

    /// Retire a ticket. Returns `false` if it was already dead.
    pub fn retire(&mut self, ticket: &GenerationTicket) -> bool {
        if !self.is_live(ticket) {
            return false;
        }
        self.live.remove(&ticket.node);
        true
    }

    /// Invalidate whatever run is in flight on `node`.
    pub fn cancel(&mut self, node: NodeId) -> bool {
        self.live.remove(&node).is_some()
    }

    /// Keep only tickets whose node passes `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(NodeId) -> bool) {
        self.live.retain(|node, _| keep(*node));
    }

    pub fn cancel_all(&mut self) {
        self.live.clear();
    }

    pub fn in_flight(&self) -> usize {
        self.live.len()
    }
}

/// Upstream nodes of `id` in the order generation should read them:
/// `sorted_input_ids` first (when the user reordered inputs), then any
/// remaining inputs in connection order.
pub fn ordered_inputs(graph: &Graph, id: NodeId) -> Vec<NodeId> {
    let inputs = graph.inputs_of(id);
    let preferred = graph
        .node(id)
        .and_then(|n| n.payload.sorted_input_ids.as_deref())
        .unwrap_or_default();
    let mut ordered: Vec<NodeId> = preferred
        .iter()
        .copied()
        .filter(|p| inputs.contains(p))
        .collect();
    for input in inputs {
        if !ordered.contains(&input) {
            ordered.push(input);
        }
    }
    ordered
}

/// Collect direct upstream text and image outputs. Only one hop is read,
/// so cycles cannot cause runaway traversal.
pub fn collect_upstream(graph: &Graph, id: NodeId) -> (Vec<String>, Vec<String>) {
    let mut texts = Vec::new();
    let mut images = Vec::new();
    for input in ordered_inputs(graph, id) {
        let Some(up) = graph.node(input) else {
            continue;
        };
        if let Some(text) = up.payload.output_text() {
            texts.push(text.to_string());
        }
        if let Some(image) = up.payload.output_image() {
            images.push(image.to_string());
        }
    }
    (texts, images)
}

/// Mark `id` as working and build its request. `None` for unknown nodes.
pub fn begin(
    graph: &mut Graph,
    tickets: &mut Generations,
    id: NodeId,
    prompt_override: Option<&str>,
) -> Option<GenerationRequest> {
    let (upstream_texts, upstream_images) = collect_upstream(graph, id);
    let node = graph.node_mut(id)?;
    node.payload.error = None;
    node.status = NodeStatus::Working;
    let prompt = prompt_override
        .map(str::to_string)
        .or_else(|| node.payload.prompt.clone());
    let request = GenerationRequest {
        ticket: tickets.issue(id),
        kind: node.kind,
        prompt,
        payload: node.payload.clone(),
        upstream_texts,
        upstream_images,
    };
    log::debug!("generation {} started on {id}", request.ticket.epoch);
    Some(request)
}

/// Apply a provider result. Results for dead tickets are dropped.
/// Returns `true` if the node was updated.
pub fn complete(
    graph: &mut Graph,
    tickets: &mut Generations,
    ticket: GenerationTicket,
    outcome: GenerationOutcome,
) -> bool {
    if !tickets.retire(&ticket) {
        log::debug!(
            "dropping stale generation {} for {}",
            ticket.epoch,
            ticket.node
        );
        return false;
    }
    match outcome {
        Ok(patch) => {
            graph.update_node(ticket.node, patch, None, None);
            graph.set_status(ticket.node, NodeStatus::Success)
        }
        Err(message) => {
            log::debug!("generation failed on {}: {message}", ticket.node);
            let patch = PayloadPatch {
                error: Some(Some(message)),
                ..PayloadPatch::default()
            };
            graph.update_node(ticket.node, patch, None, None);
            graph.set_status(ticket.node, NodeStatus::Error)
        }
    }
}

/// Idle nodes flagged `auto_start`. The flag is cleared so each node is
/// reported once.
pub fn take_auto_starts(graph: &mut Graph) -> Vec<NodeId> {
    graph
        .nodes
        .iter_mut()
        .filter(|n| n.status == NodeStatus::Idle && n.payload.auto_start == Some(true))
        .map(|n| {
            n.payload.auto_start = Some(false);
            n.id
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ink_core::model::Node;
    use pretty_assertions::assert_eq;

    fn graph() -> Graph {
        let mut g = Graph::new();
        let mut text = Node::new(NodeId::intern("gen-text"), NodeKind::PromptInput, 0.0, 0.0);
        text.payload.prompt = Some("a red kite".into());
        text.payload.display_result = Some("A red kite over dunes".into());
        let mut pic = Node::new(NodeId::intern("gen-pic"), NodeKind::ImageGenerator, 0.0, 500.0);
        pic.payload.image = Some("data:image/png;base64,KITE".into());
        let video = Node::new(NodeId::intern("gen-video"), NodeKind::VideoGenerator, 600.0, 0.0);
        g.add_node(text);
        g.add_node(pic);
        g.add_node(video);
        g.connect(NodeId::intern("gen-text"), NodeId::intern("gen-video")).unwrap();
        g.connect(NodeId::intern("gen-pic"), NodeId::intern("gen-video")).unwrap();
        g
    }

    #[test]
    fn begin_collects_upstream_and_marks_working() {
        let mut g = graph();
        let mut t = Generations::new();
        let id = NodeId::intern("gen-video");
        g.node_mut(id).unwrap().payload.error = Some("old".into());

        let req = begin(&mut g, &mut t, id, Some("slow pan")).unwrap();
        assert_eq!(req.kind, NodeKind::VideoGenerator);
        assert_eq!(req.prompt.as_deref(), Some("slow pan"));
        assert_eq!(req.upstream_texts, vec!["A red kite over dunes".to_string()]);
        assert_eq!(req.upstream_images, vec!["data:image/png;base64,KITE".to_string()]);
        let node = g.node(id).unwrap();
        assert_eq!(node.status, NodeStatus::Working);
        assert_eq!(node.payload.error, None);
        assert!(begin(&mut g, &mut t, NodeId::intern("gen-ghost"), None).is_none());
    }

    #[test]
    fn sorted_input_ids_take_precedence() {
        let mut g = graph();
        let id = NodeId::intern("gen-video");
        g.node_mut(id).unwrap().payload.sorted_input_ids =
            Some(vec![NodeId::intern("gen-pic"), NodeId::intern("gen-missing")]);
        assert_eq!(
            ordered_inputs(&g, id),
            vec![NodeId::intern("gen-pic"), NodeId::intern("gen-text")]
        );
    }

    #[test]
    fn completion_applies_patch_or_error() {
        let mut g = graph();
        let mut t = Generations::new();
        let id = NodeId::intern("gen-video");
        let req = begin(&mut g, &mut t, id, None).unwrap();
        let patch = PayloadPatch {
            video_uri: Some(Some("blob:clip".into())),
            ..Default::default()
        };
        assert!(complete(&mut g, &mut t, req.ticket, Ok(patch)));
        assert_eq!(g.node(id).unwrap().status, NodeStatus::Success);
        assert_eq!(g.node(id).unwrap().payload.video_uri.as_deref(), Some("blob:clip"));

        let req = begin(&mut g, &mut t, id, None).unwrap();
        assert!(complete(&mut g, &mut t, req.ticket, Err("quota exceeded".into())));
        let node = g.node(id).unwrap();
        assert_eq!(node.status, NodeStatus::Error);
        assert_eq!(node.payload.error.as_deref(), Some("quota exceeded"));
        // Earlier output survives a failed rerun.
        assert_eq!(node.payload.video_uri.as_deref(), Some("blob:clip"));
    }

    #[test]
    fn stale_tickets_are_dropped() {
        let mut g = graph();
        let mut t = Generations::new();
        let id = NodeId::intern("gen-video");
        let first = begin(&mut g, &mut t, id, None).unwrap().ticket;
        let second = begin(&mut g, &mut t, id, None).unwrap().ticket;
        assert!(!complete(&mut g, &mut t, first, Err("late".into())));
        assert_eq!(g.node(id).unwrap().status, NodeStatus::Working);

        assert!(t.cancel(id));
        assert!(!complete(&mut g, &mut t, second, Ok(PayloadPatch::default())));
        assert_eq!(t.in_flight(), 0);
    }

    #[test]
    fn auto_starts_are_reported_once() {
        let mut g = graph();
        g.node_mut(NodeId::intern("gen-pic")).unwrap().payload.auto_start = Some(true);
        let mut busy = Node::new(NodeId::intern("gen-busy"), NodeKind::ImageGenerator, 0.0, 0.0);
        busy.payload.auto_start = Some(true);
        busy.status = NodeStatus::Working;
        g.add_node(busy);

        assert_eq!(take_auto_starts(&mut g), vec![NodeId::intern("gen-pic")]);
        assert!(take_auto_starts(&mut g).is_empty());
    }
}
