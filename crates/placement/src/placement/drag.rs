//! Pointer handling: click selection and dragging along the floor.

use glam::{Vec2, Vec3};
use shared::NodeId;
use tracing::{debug, info};

use super::{PlacementController, PlacementEvent};
use crate::host::{InputChannel, InputSensitivities, Listener};
use crate::scene::{placeable_ancestor, SceneGraph};
use crate::state::DragState;
use crate::viewport::cursor::pointer_on_plane;

const DRAG_CHANNELS: [InputChannel; 3] = [
    InputChannel::PointerMove,
    InputChannel::PointerUp,
    InputChannel::LostCapture,
];

/// Pointer-down record used to tell a click from a drag on release
#[derive(Debug, Clone, PartialEq)]
pub struct Press {
    pub pixel: Vec2,
    pub time_ms: f64,
    /// Placed object under the pointer at press time
    pub hit: Option<NodeId>,
}

impl<S: SceneGraph> PlacementController<S> {
    /// Placed object under an element-relative pixel, nearest first
    pub fn pick(&self, pixel: Vec2) -> Option<NodeId> {
        let ray = self.camera.ray_from_ndc(self.rect.to_ndc(pixel));
        self.scene
            .raycast(&ray)
            .into_iter()
            .find_map(|hit| placeable_ancestor(&self.scene, &hit.node))
    }

    /// Pointer pressed. Pressing on the selected object starts a drag; it
    /// moves the object only once the pointer leaves click distance.
    pub fn pointer_down(&mut self, pixel: Vec2, time_ms: f64) {
        if self.selection.is_dragging() {
            return;
        }
        let hit = self.pick(pixel);
        self.press = Some(Press {
            pixel,
            time_ms,
            hit: hit.clone(),
        });

        if let Some(node) = hit {
            if self.selection.primary() == Some(&node) {
                self.begin_drag(node, pixel);
            }
        }
    }

    /// Pointer moved: cursors follow it and a dragged object tracks it
    pub fn pointer_move(&mut self, pixel: Vec2) {
        let floor_y = self.floor_level();
        let mut moved_cursor = false;
        for cursor in &mut self.cursors {
            if cursor.is_shown() {
                cursor.update(&self.scene, self.camera.as_ref(), self.rect, pixel, floor_y);
                moved_cursor = true;
            }
        }

        let dragged = self.drag_to(pixel, floor_y);
        if moved_cursor || dragged {
            self.render.request_render();
        }
    }

    /// Pointer released. Short and still presses toggle selection; anything
    /// else ends a drag.
    pub fn pointer_up(&mut self, pixel: Vec2, time_ms: f64) {
        let press = self.press.take();
        let is_click = press
            .as_ref()
            .is_some_and(|p| self.is_click(p, pixel, time_ms));

        if let Some(drag) = self.finish_drag() {
            if !is_click {
                info!(node = %drag.node, "drag released");
                if self.settings.snap.auto_snap {
                    self.auto_snap(&drag.node);
                }
                return;
            }
        }

        if !is_click {
            return;
        }
        let changed = match press.and_then(|p| p.hit) {
            Some(node) => self.selection.toggle(node),
            None => self.selection.clear(),
        };
        if changed {
            self.selection_changed();
        }
    }

    /// Pointer capture lost: end any drag without touching the selection
    pub fn pointer_cancel(&mut self) {
        self.press = None;
        if let Some(drag) = self.finish_drag() {
            debug!(node = %drag.node, "drag cancelled");
        }
    }

    fn is_click(&self, press: &Press, pixel: Vec2, time_ms: f64) -> bool {
        let pointer = &self.settings.pointer;
        time_ms - press.time_ms < pointer.click_max_ms && press.pixel.distance(pixel) < pointer.click_max_px
    }

    fn begin_drag(&mut self, node: NodeId, pixel: Vec2) {
        if self.animations.is_animating(&node) {
            debug!(%node, "not dragging a falling object");
            return;
        }
        let floor_y = self.floor_level();
        let Some(grab) = pointer_on_plane(self.camera.as_ref(), self.rect, pixel, floor_y) else {
            return;
        };
        let Some(position) = self.scene.position(&node) else {
            return;
        };
        let origin = self.scene.local_to_world(&node, Vec3::ZERO);

        let saved = self.controls.sensitivities();
        self.controls.set_sensitivities(InputSensitivities::ZERO);
        for channel in DRAG_CHANNELS {
            self.input.listen(Listener::Drag, channel);
        }

        self.selection.begin_drag(DragState {
            node: node.clone(),
            offset: Vec2::new(origin.x - grab.x, origin.z - grab.z),
            pinned_y: position.y,
            saved_sensitivities: saved,
            press_pixel: pixel,
            moved: false,
        });
        debug!(%node, "drag started");
        self.events.push(PlacementEvent::DragStarted { node });
    }

    /// Move the dragged object under the pointer. Returns false when there
    /// is no drag, the pointer is still within click distance of the press
    /// or it misses the floor.
    fn drag_to(&mut self, pixel: Vec2, floor_y: f32) -> bool {
        let click_max_px = self.settings.pointer.click_max_px;
        let Some(drag) = self.selection.drag_mut() else {
            return false;
        };
        if !drag.moved {
            if drag.press_pixel.distance(pixel) < click_max_px {
                return false;
            }
            drag.moved = true;
        }
        let node = drag.node.clone();
        let offset = drag.offset;
        let pinned_y = drag.pinned_y;

        let Some(hit) = pointer_on_plane(self.camera.as_ref(), self.rect, pixel, floor_y) else {
            return false;
        };
        let world = Vec3::new(hit.x + offset.x, floor_y, hit.z + offset.y);

        let local = match self.scene.parent(&node) {
            Some(parent) => self.scene.world_to_local(&parent, world),
            None => world,
        };
        self.scene
            .set_position(&node, Vec3::new(local.x, pinned_y, local.z));
        true
    }

    /// End the drag, restoring camera input and unsubscribing
    pub(super) fn finish_drag(&mut self) -> Option<DragState> {
        let drag = self.selection.end_drag()?;
        self.controls.set_sensitivities(drag.saved_sensitivities);
        for channel in DRAG_CHANNELS {
            self.input.unlisten(Listener::Drag, channel);
        }
        self.events.push(PlacementEvent::DragEnded {
            node: drag.node.clone(),
        });
        Some(drag)
    }
}
