//! Editor tuning knobs.
//!
//! Every field has a default matching the shipped editor; hosts may
//! override any subset by deserializing a partial JSON object.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Lower zoom bound.
    pub min_scale: f32,
    /// Upper zoom bound.
    pub max_scale: f32,
    /// Scale change per wheel delta unit.
    pub zoom_intensity: f32,
    /// Scale change per zoom-in/zoom-out shortcut.
    pub zoom_step: f32,
    /// Maximum number of history snapshots kept.
    pub history_depth: usize,
    /// Width given to freshly created nodes.
    pub default_node_width: f32,
    /// Vertical offset used when centering a new node on the viewport.
    pub placement_offset_y: f32,
    /// Smallest size a resize gesture may produce.
    pub min_node_width: f32,
    pub min_node_height: f32,
    /// Width (screen px) of the invisible stroke used to pick connections.
    pub connection_hit_width: f32,
    /// Radius (screen px) around a port anchor that counts as the port.
    pub port_hit_radius: f32,
    /// Side (screen px) of the bottom-right resize handle.
    pub resize_handle_size: f32,
    /// Distance below a node's top edge used as its group-membership anchor.
    pub group_anchor_offset: f32,
    pub arrange: ArrangeConfig,
}

/// Grid used by group auto-arrange and storyboard fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArrangeConfig {
    pub columns: usize,
    pub pitch_x: f32,
    pub pitch_y: f32,
    pub padding_left: f32,
    /// Header band above the first row.
    pub padding_top: f32,
    /// Extra height added below the last row when growing a group.
    pub padding_bottom: f32,
    /// Horizontal gap between a storyboard source and its shots.
    pub storyboard_offset_x: f32,
    /// Margin between a storyboard group border and its shots.
    pub storyboard_margin: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.2,
            max_scale: 3.0,
            zoom_intensity: 0.001,
            zoom_step: 0.1,
            history_depth: 50,
            default_node_width: 420.0,
            placement_offset_y: 180.0,
            min_node_width: 200.0,
            min_node_height: 150.0,
            connection_hit_width: 20.0,
            port_hit_radius: 12.0,
            resize_handle_size: 16.0,
            group_anchor_offset: 160.0,
            arrange: ArrangeConfig::default(),
        }
    }
}

impl Default for ArrangeConfig {
    fn default() -> Self {
        Self {
            columns: 3,
            pitch_x: 460.0,
            pitch_y: 420.0,
            padding_left: 40.0,
            padding_top: 60.0,
            padding_bottom: 80.0,
            storyboard_offset_x: 500.0,
            storyboard_margin: 40.0,
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON config.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("invalid editor config: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = EditorConfig::from_json(r#"{"historyDepth": 10, "arrange": {"columns": 4}}"#)
            .unwrap();
        assert_eq!(cfg.history_depth, 10);
        assert_eq!(cfg.arrange.columns, 4);
        assert_eq!(cfg.arrange.pitch_x, 460.0);
        assert_eq!(cfg.max_scale, 3.0);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(EditorConfig::from_json("{").is_err());
    }
}
