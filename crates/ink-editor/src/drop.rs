//! Media assets dropped onto nodes.
//!
//! The host reads `(assetType, assetSrc)` from its drag-data transfer and
//! hands the pair over as an `AssetDrop`. What a drop does depends on the
//! receiving node's kind and mode.

use ink_core::model::{GenerationMode, ImageList, ImageMode, Node, NodeKind, NodePayload, VideoMode};
use ink_core::PayloadPatch;
use serde::{Deserialize, Serialize};

/// Most reference images an image generator keeps in I2I mode.
pub const MAX_IMAGE_REFS: usize = 5;
/// Most reference images a video generator keeps.
pub const MAX_VIDEO_REFS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Video,
    Audio,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDrop {
    #[serde(rename = "assetType")]
    pub kind: AssetKind,
    #[serde(rename = "assetSrc")]
    pub src: String,
}

impl AssetDrop {
    pub fn new(kind: AssetKind, src: impl Into<String>) -> Self {
        Self {
            kind,
            src: src.into(),
        }
    }

    pub fn image(src: impl Into<String>) -> Self {
        Self::new(AssetKind::Image, src)
    }

    pub fn video(src: impl Into<String>) -> Self {
        Self::new(AssetKind::Video, src)
    }

    /// Parse the host's `assetType` string.
    pub fn from_parts(kind: &str, src: &str) -> Option<Self> {
        let kind = match kind {
            "image" => AssetKind::Image,
            "video" => AssetKind::Video,
            "audio" => AssetKind::Audio,
            _ => return None,
        };
        Some(Self::new(kind, src))
    }
}

fn single(src: &str) -> ImageList {
    let mut list = ImageList::new();
    list.push(src.to_string());
    list
}

/// The payload update a drop of `asset` onto `node` performs, or `None`
/// when the node ignores it.
pub fn drop_patch(node: &Node, asset: &AssetDrop) -> Option<PayloadPatch> {
    patch_for(node.kind, &node.payload, asset)
}

fn patch_for(kind: NodeKind, data: &NodePayload, asset: &AssetDrop) -> Option<PayloadPatch> {
    if asset.src.is_empty() {
        return None;
    }
    let src = asset.src.as_str();
    let current = data.images.clone().unwrap_or_default();

    match (kind, asset.kind) {
        (NodeKind::ImageGenerator, AssetKind::Image) => {
            if data.image_mode == Some(ImageMode::ImageToImage) {
                if current.iter().any(|i| i == src) {
                    return None;
                }
                let mut images = current;
                images.push(src.to_string());
                images.truncate(MAX_IMAGE_REFS);
                Some(PayloadPatch {
                    images: Some(Some(images)),
                    image: Some(Some(src.to_string())),
                    ..PayloadPatch::default()
                })
            } else {
                Some(PayloadPatch {
                    image: Some(Some(src.to_string())),
                    images: Some(Some(single(src))),
                    ..PayloadPatch::default()
                })
            }
        }
        (NodeKind::VideoGenerator, AssetKind::Image) => {
            let mode = data.video_mode.unwrap_or(VideoMode::TextToVideo);
            if mode == VideoMode::TextToVideo {
                Some(PayloadPatch {
                    video_mode: Some(Some(VideoMode::ImageToVideo)),
                    image: Some(Some(src.to_string())),
                    images: Some(Some(single(src))),
                    ..PayloadPatch::default()
                })
            } else if data.generation_mode == Some(GenerationMode::FirstLastFrame) {
                Some(PayloadPatch {
                    last_frame_image: Some(Some(src.to_string())),
                    ..PayloadPatch::default()
                })
            } else {
                let mut images = current;
                images.push(src.to_string());
                images.truncate(MAX_VIDEO_REFS);
                Some(PayloadPatch {
                    images: Some(Some(images)),
                    image: Some(Some(src.to_string())),
                    ..PayloadPatch::default()
                })
            }
        }
        (NodeKind::VideoGenerator, AssetKind::Video) => Some(PayloadPatch {
            video_uri: Some(Some(src.to_string())),
            ..PayloadPatch::default()
        }),
        _ => None,
    }
}

/// Node kind and payload for a node created from a dropped asset.
/// Audio assets have no generator that accepts them.
pub fn node_seed(asset: &AssetDrop) -> Option<(NodeKind, PayloadPatch)> {
    let kind = match asset.kind {
        AssetKind::Image => NodeKind::ImageGenerator,
        AssetKind::Video => NodeKind::VideoGenerator,
        AssetKind::Audio => return None,
    };
    let patch = patch_for(kind, &kind.default_payload(), asset)?;
    Some((kind, patch))
}
