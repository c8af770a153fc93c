use super::model::{
    CanvasInput, EdgeKey, EditorKey, LANE_RANGE, NetworkEditorState, NodeKey, RoadClass,
    SPEED_RANGE, Scene, SceneShape, Selection, ViewTransform,
};
use crate::theme::{Theme, ThemeDecorations, ThemePalette};
use eframe::egui;

mod canvas;
mod layout;
mod paint;
mod palette;
mod properties;

pub use layout::{EditorPanelState, NetworkEditorUi};
pub use paint::paint_scene;
