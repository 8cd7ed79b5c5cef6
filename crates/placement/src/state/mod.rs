pub mod selection;
pub mod settings;

pub use selection::{DragState, SelectionState};
pub use settings::{DropSettings, PlacementSettings, PointerSettings, SnapSettings};
