//! Canvas data model.
//!
//! A canvas holds typed nodes placed in world space, directed connections
//! between them, and decorative groups. Nodes carry a payload bag whose
//! fields are filled in by the user and by generation results. Connections
//! are identified structurally by their `(from, to)` pair.

use crate::geometry::Rect;
use crate::id::{GroupId, NodeId};
use serde::{Deserialize, Deserializer, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Width of a node that never had an explicit size.
pub const DEFAULT_NODE_WIDTH: f32 = 420.0;

// ─── Node kinds & status ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    PromptInput,
    ImageGenerator,
    VideoGenerator,
    VideoAnalyzer,
    ImageEditor,
    AudioGenerator,
    ScriptMaster,
    StoryboardGenerator,
}

impl NodeKind {
    pub const ALL: [NodeKind; 8] = [
        NodeKind::PromptInput,
        NodeKind::ScriptMaster,
        NodeKind::ImageGenerator,
        NodeKind::StoryboardGenerator,
        NodeKind::VideoGenerator,
        NodeKind::VideoAnalyzer,
        NodeKind::ImageEditor,
        NodeKind::AudioGenerator,
    ];

    /// Model id a fresh node of this kind starts with.
    pub fn default_model(self) -> &'static str {
        match self {
            NodeKind::ImageGenerator | NodeKind::StoryboardGenerator => {
                "gemini-3-pro-image-preview"
            }
            NodeKind::VideoGenerator => "veo-3.1-fast-generate-preview",
            _ => "gemini-3-pro-preview",
        }
    }

    /// Display title a fresh node of this kind starts with.
    pub fn title(self) -> &'static str {
        match self {
            NodeKind::PromptInput => "Prompt",
            NodeKind::ImageGenerator => "Image",
            NodeKind::VideoGenerator => "Video",
            NodeKind::VideoAnalyzer => "Video Analysis",
            NodeKind::ImageEditor => "Image Editor",
            NodeKind::AudioGenerator => "Music",
            NodeKind::ScriptMaster => "Script Master",
            NodeKind::StoryboardGenerator => "Storyboard",
        }
    }

    /// Height used for geometry when the node has no explicit height.
    pub fn default_height(self) -> f32 {
        match self {
            NodeKind::AudioGenerator => 200.0,
            _ => 380.0,
        }
    }

    /// Payload defaults applied by "add node".
    pub fn default_payload(self) -> NodePayload {
        NodePayload {
            model: Some(self.default_model().to_string()),
            aspect_ratio: Some("16:9".to_string()),
            script_mode: (self == NodeKind::ScriptMaster).then_some(ScriptMode::Create),
            cinematic_version: (self == NodeKind::StoryboardGenerator)
                .then_some(CinematicVersion::V1),
            ..NodePayload::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    #[default]
    Idle,
    Working,
    Success,
    Error,
}

// ─── Per-kind modes ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScriptMode {
    Create,
    Remix,
    Describe,
    Cinematic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageMode {
    #[serde(rename = "T2I")]
    TextToImage,
    #[serde(rename = "I2I")]
    ImageToImage,
    #[serde(rename = "STORYBOARD")]
    Storyboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoMode {
    #[serde(rename = "T2V")]
    TextToVideo,
    #[serde(rename = "I2V")]
    ImageToVideo,
    #[serde(rename = "DIRECTOR")]
    Director,
}

/// How a video generator combines its references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationMode {
    Default,
    Continue,
    Cut,
    FirstLastFrame,
    CharacterRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CinematicVersion {
    V1,
    V2,
    V3,
}

// ─── Payload ─────────────────────────────────────────────────────────────

/// Up to five reference images inline; more spill to the heap.
pub type ImageList = SmallVec<[String; 5]>;

/// Deserialize a present field (even `null`) as `Some(..)`, so that a patch
/// can tell "clear this field" (`null`) from "leave it alone" (absent).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// Declares `NodePayload` and its patch type from one field list so the two
/// can never drift apart.
macro_rules! payload_fields {
    ($( $(#[$meta:meta])* $field:ident : $ty:ty ),* $(,)?) => {
        /// Free-form per-node data. Every field is optional.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct NodePayload {
            $(
                $(#[$meta])*
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )*
        }

        /// A shallow update to a `NodePayload`.
        ///
        /// `None` leaves a field untouched, `Some(None)` clears it and
        /// `Some(Some(v))` overwrites it.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct PayloadPatch {
            $(
                #[serde(
                    default,
                    skip_serializing_if = "Option::is_none",
                    deserialize_with = "double_option"
                )]
                pub $field: Option<Option<$ty>>,
            )*
        }

        impl NodePayload {
            /// Last-write-wins merge of every field the patch mentions.
            pub fn merge(&mut self, patch: PayloadPatch) {
                $(
                    if let Some(value) = patch.$field {
                        self.$field = value;
                    }
                )*
            }
        }

        impl PayloadPatch {
            pub fn is_empty(&self) -> bool {
                true $( && self.$field.is_none() )*
            }
        }
    };
}

payload_fields! {
    prompt: String,
    model: String,
    /// Text answer of a prompt node.
    display_result: String,
    image: String,
    images: ImageList,
    last_frame_image: String,
    image_count: u32,
    video_count: u32,
    video_uri: String,
    video_uris: Vec<String>,
    video_metadata: serde_json::Value,
    audio_uri: String,
    analysis: String,
    remixed_script: String,
    script_mode: ScriptMode,
    image_mode: ImageMode,
    video_mode: VideoMode,
    cinematic_version: CinematicVersion,
    /// Message shown on a node whose last generation failed.
    error: String,
    progress: String,
    aspect_ratio: String,
    resolution: String,
    /// Clip length in seconds.
    duration: f32,
    generation_mode: GenerationMode,
    selected_frame: String,
    cropped_frame: String,
    sorted_input_ids: Vec<NodeId>,
    /// Run generation as soon as the node appears (storyboard shots).
    auto_start: bool,
}

impl NodePayload {
    /// The text a downstream node should read from this one.
    pub fn output_text(&self) -> Option<&str> {
        [
            &self.remixed_script,
            &self.display_result,
            &self.analysis,
            &self.prompt,
        ]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .find(|t| !t.trim().is_empty())
    }

    /// The image a downstream node should read from this one.
    pub fn output_image(&self) -> Option<&str> {
        self.cropped_frame
            .as_deref()
            .or(self.image.as_deref())
            .filter(|s| !s.is_empty())
    }
}

// ─── Node ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    pub title: String,
    #[serde(default)]
    pub status: NodeStatus,
    #[serde(rename = "data", default)]
    pub payload: NodePayload,
}

impl Node {
    /// A node with the kind's default title and payload.
    pub fn new(id: NodeId, kind: NodeKind, x: f32, y: f32) -> Self {
        Self {
            id,
            kind,
            x,
            y,
            width: Some(DEFAULT_NODE_WIDTH),
            height: None,
            title: kind.title().to_string(),
            status: NodeStatus::Idle,
            payload: kind.default_payload(),
        }
    }

    pub fn width(&self) -> f32 {
        self.width.unwrap_or(DEFAULT_NODE_WIDTH)
    }

    pub fn height(&self) -> f32 {
        self.height.unwrap_or_else(|| self.kind.default_height())
    }

    /// World-space bounding box.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width(), self.height())
    }

    /// Right-edge midpoint, where outgoing connections start.
    pub fn output_anchor(&self) -> (f32, f32) {
        (self.x + self.width(), self.y + self.height() / 2.0)
    }

    /// Left-edge midpoint, where incoming connections end.
    pub fn input_anchor(&self) -> (f32, f32) {
        (self.x, self.y + self.height() / 2.0)
    }
}

// ─── Connection ──────────────────────────────────────────────────────────

/// A directed edge. Identity is the `(from, to)` pair itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub from: NodeId,
    pub to: NodeId,
}

impl Connection {
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self { from, to }
    }

    pub fn touches(&self, id: NodeId) -> bool {
        self.from == id || self.to == id
    }

    /// String key `"{from}-{to}"` used by hosts to address the edge.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

// ─── Group ───────────────────────────────────────────────────────────────

/// A titled rectangle drawn behind nodes. Owns nothing: membership is
/// computed on demand from node positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub title: String,
}

impl Group {
    pub fn new(id: GroupId, bounds: Rect, title: impl Into<String>) -> Self {
        Self {
            id,
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
            title: title.into(),
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}
