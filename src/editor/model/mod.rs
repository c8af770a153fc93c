mod decor;
mod draw_mode;
mod edge;
mod error;
mod graph;
mod node;
mod scene;
mod state;
mod sync;
mod viewport;

pub use decor::{BANNER_TEXT, GRID_EXTENT};
pub use draw_mode::{CanvasInput, DrawMode, EditorKey};
pub use edge::{
    DEFAULT_LANES, DEFAULT_SPEED, Edge, EdgeKey, LANE_RANGE, RoadClass, SPEED_RANGE,
    lane_marker_polylines, stroke_width,
};
pub use error::EditorError;
pub use graph::NetworkGraph;
pub use node::{Node, NodeKey};
pub use scene::{ItemHandle, ItemOwner, Scene, SceneItem, SceneShape};
pub use state::{DEFAULT_SNAP_THRESHOLD, NetworkEditorState, Selection, validate_id};
pub use viewport::{ViewTransform, ZOOM_STEP};
