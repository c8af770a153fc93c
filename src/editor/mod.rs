pub mod convert;
pub mod model;
pub mod view;

pub use model::NetworkEditorState;
pub use view::{EditorPanelState, NetworkEditorUi, paint_scene};
