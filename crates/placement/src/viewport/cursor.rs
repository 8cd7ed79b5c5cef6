use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use shared::NodeId;

use super::camera::{CameraRays, ViewRect};
use super::picking::ray_plane_y;
use crate::host::{InputChannel, InputEvents, Listener};
use crate::scene::SceneGraph;

const CURSOR_CHANNELS: [InputChannel; 2] = [InputChannel::PointerMove, InputChannel::DragOver];

/// Which floor cursor variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CursorKind {
    Arrow,
    Disc,
}

/// Project an element-relative pointer position onto the plane `y = plane_y`.
///
/// None is the normal "no hit" outcome: the ray is parallel to the plane or
/// the plane is behind the camera.
pub fn pointer_on_plane<C>(camera: &C, rect: ViewRect, pixel: Vec2, plane_y: f32) -> Option<Vec3>
where
    C: CameraRays + ?Sized,
{
    let ray = camera.ray_from_ndc(rect.to_ndc(pixel));
    ray_plane_y(&ray, plane_y)
}

/// Cursor that follows the pointer across the floor plane.
///
/// `shown` is the feature toggle and owns the pointer subscription;
/// `visible` additionally requires the last projection to have hit.
#[derive(Debug, Clone)]
pub struct FloorCursor {
    kind: CursorKind,
    radius: f32,
    shown: bool,
    visible: bool,
    world_position: Vec3,
    local_position: Vec3,
    parent: Option<NodeId>,
}

impl FloorCursor {
    pub fn new(kind: CursorKind, radius: f32) -> Self {
        Self {
            kind,
            radius,
            shown: false,
            visible: false,
            world_position: Vec3::ZERO,
            local_position: Vec3::ZERO,
            parent: None,
        }
    }

    pub fn kind(&self) -> CursorKind {
        self.kind
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// World placement position, only while visible
    pub fn world_position(&self) -> Option<Vec3> {
        self.visible.then_some(self.world_position)
    }

    /// Position in the parent's space (what the host renders)
    pub fn local_position(&self) -> Option<Vec3> {
        self.visible.then_some(self.local_position)
    }

    /// Node the cursor visual hangs under
    pub fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub fn show(&mut self, input: &mut dyn InputEvents) {
        if self.shown {
            return;
        }
        self.shown = true;
        for channel in CURSOR_CHANNELS {
            input.listen(Listener::Cursor(self.kind), channel);
        }
    }

    pub fn hide(&mut self, input: &mut dyn InputEvents) {
        if !self.shown {
            return;
        }
        self.shown = false;
        self.visible = false;
        for channel in CURSOR_CHANNELS {
            input.unlisten(Listener::Cursor(self.kind), channel);
        }
    }

    /// Track the pointer. A miss hides the cursor and keeps the last position.
    pub fn update<S, C>(
        &mut self,
        scene: &S,
        camera: &C,
        rect: ViewRect,
        pixel: Vec2,
        placement_y: f32,
    ) -> Option<Vec3>
    where
        S: SceneGraph + ?Sized,
        C: CameraRays + ?Sized,
    {
        if !self.shown {
            return None;
        }

        let Some(hit) = pointer_on_plane(camera, rect, pixel, placement_y) else {
            self.visible = false;
            return None;
        };

        self.visible = true;
        self.world_position = hit;
        self.local_position = match &self.parent {
            Some(parent) if scene.contains(parent) => scene.world_to_local(parent, hit),
            _ => hit,
        };
        Some(hit)
    }
}
