pub mod config;
pub mod geometry;
pub mod graph;
pub mod id;
pub mod model;
pub mod persist;
pub mod viewport;

pub use config::EditorConfig;
pub use geometry::Rect;
pub use graph::{ConnectError, Graph};
pub use id::{GroupId, NodeId};
pub use model::*;
pub use persist::Workflow;
pub use viewport::Viewport;
