use glam::Vec2;
use shared::NodeId;

use crate::host::InputSensitivities;

/// An in-progress drag of the selected object
#[derive(Clone, Debug, PartialEq)]
pub struct DragState {
    pub node: NodeId,
    /// XZ offset from the grabbed floor point to the object origin
    pub offset: Vec2,
    /// Resting Y the object is pinned to while dragged
    pub pinned_y: f32,
    /// Camera sensitivities to restore when the drag ends
    pub saved_sensitivities: InputSensitivities,
    /// Pixel where the drag was pressed
    pub press_pixel: Vec2,
    /// Set once the pointer left the click distance; until then the object
    /// stays put
    pub moved: bool,
}

/// Selected placed objects and drag state.
///
/// Holds a list for multi-select; pointer interaction keeps it at zero or
/// one element.
#[derive(Default, Debug)]
pub struct SelectionState {
    selected: Vec<NodeId>,
    drag: Option<DragState>,
    /// Bumped on every selection change
    pub version: u64,
}

impl SelectionState {
    /// Primary (first) selected object
    pub fn primary(&self) -> Option<&NodeId> {
        self.selected.first()
    }

    /// All selected objects
    pub fn all(&self) -> &[NodeId] {
        &self.selected
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    pub fn count(&self) -> usize {
        self.selected.len()
    }

    /// Select a single object (clears previous selection)
    pub fn select(&mut self, id: NodeId) -> bool {
        if self.selected.len() == 1 && self.selected[0] == id {
            return false;
        }
        self.selected.clear();
        self.selected.push(id);
        self.version += 1;
        true
    }

    /// Click toggle: deselect if selected, otherwise make it the selection
    pub fn toggle(&mut self, id: NodeId) -> bool {
        if self.is_selected(&id) {
            self.remove(&id)
        } else {
            self.select(id)
        }
    }

    /// Drop `id` from the selection
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.selected.len();
        self.selected.retain(|s| s != id);
        let changed = before != self.selected.len();
        if changed {
            self.version += 1;
        }
        changed
    }

    /// Clear all selection
    pub fn clear(&mut self) -> bool {
        if self.selected.is_empty() {
            return false;
        }
        self.selected.clear();
        self.version += 1;
        true
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    pub fn drag_mut(&mut self) -> Option<&mut DragState> {
        self.drag.as_mut()
    }

    pub fn drag_offset(&self) -> Option<Vec2> {
        self.drag.as_ref().map(|d| d.offset)
    }

    pub fn begin_drag(&mut self, drag: DragState) {
        self.drag = Some(drag);
    }

    /// Finish the drag, handing back what must be restored
    pub fn end_drag(&mut self) -> Option<DragState> {
        self.drag.take()
    }
}
