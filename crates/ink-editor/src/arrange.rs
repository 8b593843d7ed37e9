//! Group membership, grid auto-arrange and storyboard fan-out.
//!
//! Groups own nothing. A node belongs to a group when its anchor point
//! `(x + width / 2, y + anchor_offset)` lies strictly inside the group
//! rectangle. The anchor sits a fixed distance below the node's top edge
//! rather than at its true center, so a node is classified by where its
//! header and preview are, not by how tall its body has grown. The same
//! test drives both auto-arrange and group drag.

use ink_core::config::{ArrangeConfig, EditorConfig};
use ink_core::geometry::Rect;
use ink_core::id::{GroupId, NodeId};
use ink_core::model::{Group, Node, NodeKind};
use ink_core::{Graph, PayloadPatch};
use std::cmp::Ordering;

// ─── Membership ──────────────────────────────────────────────────────────

/// Representative point used for membership.
pub fn anchor_point(node: &Node, anchor_offset: f32) -> (f32, f32) {
    (node.x + node.width() / 2.0, node.y + anchor_offset)
}

pub fn is_member(node: &Node, group: &Group, anchor_offset: f32) -> bool {
    let (ax, ay) = anchor_point(node, anchor_offset);
    group.bounds().contains_strict(ax, ay)
}

/// Nodes inside `group`, in draw order.
pub fn members(graph: &Graph, group: &Group, anchor_offset: f32) -> Vec<NodeId> {
    graph
        .nodes
        .iter()
        .filter(|n| is_member(n, group, anchor_offset))
        .map(|n| n.id)
        .collect()
}

// ─── Ordering ────────────────────────────────────────────────────────────

/// Shot number in titles like `分镜 3` or `Shot 12`.
pub fn shot_number(title: &str) -> Option<u32> {
    ["分镜", "Shot"].iter().find_map(|marker| {
        let (_, rest) = title.split_once(marker)?;
        let digits: String = rest
            .trim_start()
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        digits.parse().ok()
    })
}

/// Arrange order: shot numbers when both nodes carry one, then creation
/// time embedded in the id, then top-to-bottom, left-to-right.
pub fn arrange_order(a: &Node, b: &Node) -> Ordering {
    if let (Some(na), Some(nb)) = (shot_number(&a.title), shot_number(&b.title)) {
        return na.cmp(&nb);
    }
    let ta = a.id.timestamp().unwrap_or(0);
    let tb = b.id.timestamp().unwrap_or(0);
    ta.cmp(&tb)
        .then_with(|| a.y.total_cmp(&b.y))
        .then_with(|| a.x.total_cmp(&b.x))
}

/// Top-left of grid cell `idx`.
fn cell(origin: (f32, f32), idx: usize, grid: &ArrangeConfig) -> (f32, f32) {
    let cols = grid.columns.max(1);
    let (col, row) = (idx % cols, idx / cols);
    (
        origin.0 + col as f32 * grid.pitch_x,
        origin.1 + row as f32 * grid.pitch_y,
    )
}

fn rows_for(count: usize, grid: &ArrangeConfig) -> usize {
    count.div_ceil(grid.columns.max(1))
}

// ─── Auto-arrange ────────────────────────────────────────────────────────

/// Lay the group's members out on a grid inside it and grow the group to
/// fit. Returns the number of nodes placed; `0` means nothing changed.
pub fn auto_arrange(graph: &mut Graph, group_id: GroupId, config: &EditorConfig) -> usize {
    let Some(group) = graph.group(group_id).cloned() else {
        return 0;
    };
    let mut children: Vec<Node> = graph
        .nodes
        .iter()
        .filter(|n| is_member(n, &group, config.group_anchor_offset))
        .cloned()
        .collect();
    if children.is_empty() {
        return 0;
    }
    children.sort_by(arrange_order);

    let grid = &config.arrange;
    let origin = (group.x + grid.padding_left, group.y + grid.padding_top);
    for (idx, child) in children.iter().enumerate() {
        let (x, y) = cell(origin, idx, grid);
        if let Some(node) = graph.node_mut(child.id) {
            node.x = x;
            node.y = y;
        }
    }

    let rows = rows_for(children.len(), grid);
    let needed = rows as f32 * grid.pitch_y + grid.padding_bottom;
    if let Some(g) = graph.group_mut(group_id) {
        g.height = g.height.max(needed);
    }
    log::debug!("arranged {} nodes in group {group_id}", children.len());
    children.len()
}

// ─── Storyboard fan-out ──────────────────────────────────────────────────

/// Result of `spawn_storyboard`.
#[derive(Debug, Clone, PartialEq)]
pub struct Storyboard {
    pub group: GroupId,
    pub shots: Vec<NodeId>,
}

/// Create one image node per prompt on a grid to the right of `source`,
/// feed each from `source`, and wrap them in a new group. New shots are
/// flagged `auto_start`. Returns `None` for an unknown source or no prompts.
pub fn spawn_storyboard(
    graph: &mut Graph,
    source: NodeId,
    prompts: &[String],
    config: &EditorConfig,
) -> Option<Storyboard> {
    let src = graph.node(source)?;
    if prompts.is_empty() {
        return None;
    }
    let grid = &config.arrange;
    let origin = (src.x + grid.storyboard_offset_x, src.y);
    let aspect_ratio = src
        .payload
        .aspect_ratio
        .clone()
        .unwrap_or_else(|| "16:9".to_string());

    let mut shots = Vec::with_capacity(prompts.len());
    for (idx, prompt) in prompts.iter().enumerate() {
        let (x, y) = cell(origin, idx, grid);
        let mut node = Node::new(
            NodeId::with_prefix("n-story"),
            NodeKind::ImageGenerator,
            x,
            y,
        );
        node.width = Some(config.default_node_width);
        node.title = format!("Shot {}", idx + 1);
        node.payload.merge(PayloadPatch {
            prompt: Some(Some(prompt.clone())),
            aspect_ratio: Some(Some(aspect_ratio.clone())),
            auto_start: Some(Some(true)),
            ..PayloadPatch::default()
        });
        let id = node.id;
        shots.push(id);
        graph.add_node(node);
        if let Err(e) = graph.connect(source, id) {
            log::debug!("storyboard wiring skipped: {e}");
        }
    }

    let margin = grid.storyboard_margin;
    let bounds = Rect::new(
        origin.0 - margin,
        origin.1 - margin,
        grid.columns.max(1) as f32 * grid.pitch_x,
        rows_for(prompts.len(), grid) as f32 * grid.pitch_y,
    );
    let group = Group::new(GroupId::with_prefix("g-story"), bounds, "Storyboard");
    let group_id = group.id;
    graph.add_group(group);
    log::debug!("storyboard: {} shots from {source}", shots.len());
    Some(Storyboard {
        group: group_id,
        shots,
    })
}
