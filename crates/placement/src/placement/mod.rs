//! Coordinating controller owned by the host element.
//!
//! One controller wires the animation engine, snap model, selection and
//! cursors to the host collaborators. Placement lives in [`drop`], pointer
//! handling in [`drag`], the debug snapshot in [`inspect`].

pub mod drag;
pub mod drop;
pub mod inspect;

use glam::Vec3;
use shared::{MeshRef, NodeId, ObjectMetadata};
use tracing::debug;

use crate::animation::AnimationEngine;
use crate::error::{PlacementError, Result};
use crate::host::{CameraControls, FrameScheduler, InputEvents, OutlineSink, RenderSink};
use crate::scene::{find_first, SceneGraph, TraversalSignal};
use crate::state::{PlacementSettings, SelectionState};
use crate::viewport::camera::{CameraRays, ViewRect};
use crate::viewport::cursor::{CursorKind, FloorCursor};

pub use drag::Press;
pub use inspect::{CursorSnapshot, ObjectSnapshot, SessionSnapshot};

/// Notifications drained by the host with [`PlacementController::drain_events`]
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementEvent {
    /// A loaded object entered the scene and started falling
    Placed { node: NodeId },
    /// The drop animation finished; fired once per placement
    Settled { node: NodeId },
    Snapped { group: NodeId, a: NodeId, b: NodeId },
    SelectionChanged { selected: Vec<NodeId> },
    DragStarted { node: NodeId },
    DragEnded { node: NodeId },
}

/// Host collaborators handed to the controller
pub struct Collaborators {
    pub camera: Box<dyn CameraRays>,
    pub render: Box<dyn RenderSink>,
    pub frames: Box<dyn FrameScheduler>,
    pub outline: Box<dyn OutlineSink>,
    pub controls: Box<dyn CameraControls>,
    pub input: Box<dyn InputEvents>,
}

pub struct PlacementController<S: SceneGraph> {
    scene: S,
    camera: Box<dyn CameraRays>,
    rect: ViewRect,
    render: Box<dyn RenderSink>,
    frames: Box<dyn FrameScheduler>,
    outline: Box<dyn OutlineSink>,
    controls: Box<dyn CameraControls>,
    input: Box<dyn InputEvents>,
    settings: PlacementSettings,
    animations: AnimationEngine,
    selection: SelectionState,
    cursors: [FloorCursor; 2],
    floor_y: Option<f32>,
    press: Option<Press>,
    last_frame_ms: Option<f64>,
    events: Vec<PlacementEvent>,
}

impl<S: SceneGraph> PlacementController<S> {
    pub fn new(scene: S, collaborators: Collaborators, rect: ViewRect, settings: PlacementSettings) -> Self {
        let radius = settings.pointer.cursor_radius;
        Self {
            scene,
            camera: collaborators.camera,
            rect,
            render: collaborators.render,
            frames: collaborators.frames,
            outline: collaborators.outline,
            controls: collaborators.controls,
            input: collaborators.input,
            settings,
            animations: AnimationEngine::new(),
            selection: SelectionState::default(),
            cursors: [
                FloorCursor::new(CursorKind::Arrow, radius),
                FloorCursor::new(CursorKind::Disc, radius),
            ],
            floor_y: None,
            press: None,
            last_frame_ms: None,
            events: Vec::new(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn settings(&self) -> &PlacementSettings {
        &self.settings
    }

    pub fn animations(&self) -> &AnimationEngine {
        &self.animations
    }

    pub fn set_camera(&mut self, camera: Box<dyn CameraRays>) {
        self.camera = camera;
    }

    /// Element bounding rectangle changed
    pub fn set_view_rect(&mut self, rect: ViewRect) {
        self.rect = rect;
    }

    pub fn drain_events(&mut self) -> Vec<PlacementEvent> {
        std::mem::take(&mut self.events)
    }

    // ── Frame loop ────────────────────────────────────────────

    /// Per-frame callback; `timestamp_ms` comes from the frame scheduler
    pub fn tick(&mut self, timestamp_ms: f64) {
        let dt = match self.last_frame_ms {
            Some(last) => (timestamp_ms - last).max(0.0),
            None => 0.0,
        };
        self.last_frame_ms = Some(timestamp_ms);
        self.advance(dt as f32);
    }

    /// Advance all drops by `dt_ms` and settle the ones that finished
    pub fn advance(&mut self, dt_ms: f32) {
        let settled = self
            .animations
            .tick(&mut self.scene, self.render.as_mut(), dt_ms);
        for node in settled {
            self.on_settled(&node);
        }

        if self.animations.is_idle() {
            self.last_frame_ms = None;
        } else {
            self.frames.request_frame();
        }
    }

    pub fn is_idle(&self) -> bool {
        self.animations.is_idle()
    }

    // ── Cursors ───────────────────────────────────────────────

    pub fn cursor(&self, kind: CursorKind) -> &FloorCursor {
        &self.cursors[Self::cursor_index(kind)]
    }

    pub fn show_cursor(&mut self, kind: CursorKind) {
        self.cursors[Self::cursor_index(kind)].show(self.input.as_mut());
    }

    pub fn hide_cursor(&mut self, kind: CursorKind) {
        self.cursors[Self::cursor_index(kind)].hide(self.input.as_mut());
        self.render.request_render();
    }

    pub fn set_cursor_parent(&mut self, kind: CursorKind, parent: Option<NodeId>) {
        self.cursors[Self::cursor_index(kind)].set_parent(parent);
    }

    /// Current placement position: disc cursor first, then arrow
    pub fn cursor_position(&self) -> Option<Vec3> {
        self.cursor(CursorKind::Disc)
            .world_position()
            .or_else(|| self.cursor(CursorKind::Arrow).world_position())
    }

    fn cursor_index(kind: CursorKind) -> usize {
        match kind {
            CursorKind::Arrow => 0,
            CursorKind::Disc => 1,
        }
    }

    // ── Selection ─────────────────────────────────────────────

    pub fn selected(&self) -> &[NodeId] {
        self.selection.all()
    }

    pub fn primary_selection(&self) -> Option<&NodeId> {
        self.selection.primary()
    }

    pub fn is_dragging(&self) -> bool {
        self.selection.is_dragging()
    }

    /// Select a placeable object on behalf of the host
    pub fn select(&mut self, node: &NodeId) -> bool {
        let placeable = self
            .scene
            .metadata(node)
            .is_some_and(ObjectMetadata::is_placeable);
        if !placeable {
            debug!(%node, "ignoring selection of non-placeable node");
            return false;
        }
        let changed = self.selection.select(node.clone());
        if changed {
            self.selection_changed();
        }
        changed
    }

    /// Deselect everything on behalf of the host
    pub fn clear_selection(&mut self) -> bool {
        if self.selection.is_dragging() {
            self.finish_drag();
        }
        let changed = self.selection.clear();
        if changed {
            self.selection_changed();
        }
        changed
    }

    /// Meshes to outline for the current selection
    pub fn selected_meshes(&self) -> Vec<MeshRef> {
        self.selection
            .all()
            .iter()
            .flat_map(|node| self.meshes_of(node))
            .collect()
    }

    fn meshes_of(&self, node: &NodeId) -> Vec<MeshRef> {
        match self.scene.metadata(node) {
            Some(meta) if !meta.meshes.is_empty() => meta.meshes.clone(),
            _ => self.scene.meshes(node),
        }
    }

    fn selection_changed(&mut self) {
        let meshes = self.selected_meshes();
        self.outline.set_outlined(&meshes);
        self.render.request_render();
        self.events.push(PlacementEvent::SelectionChanged {
            selected: self.selection.all().to_vec(),
        });
    }

    // ── Objects ───────────────────────────────────────────────

    /// Take a placed object out of the scene
    pub fn remove_object(&mut self, node: &NodeId) -> Result<()> {
        if !self.scene.contains(node) {
            return Err(PlacementError::UnknownNode(node.clone()));
        }
        self.animations.cancel(node);
        if self.selection.drag().is_some_and(|d| &d.node == node) {
            self.finish_drag();
        }
        if self.selection.remove(node) {
            self.selection_changed();
        }
        let removed = self.scene.remove(node);
        self.render.request_render();
        if !removed {
            return Err(PlacementError::UnknownNode(node.clone()));
        }
        debug!(%node, "object removed");
        Ok(())
    }

    /// Placed objects whose parsed name has `group_id`
    pub fn objects_in_group(&self, group_id: &str) -> Vec<NodeId> {
        let root = self.scene.root();
        let mut found = Vec::new();
        self.scene.traverse(&root, &mut |node| {
            if let Some(meta) = self.scene.metadata(node) {
                if meta.is_placed_object && !meta.is_snapped_group && meta.group_id == group_id {
                    found.push(node.clone());
                }
            }
            TraversalSignal::Continue
        });
        found
    }

    /// Node placed objects are attached under
    pub fn target_container(&self) -> Option<NodeId> {
        let root = self.scene.root();
        find_first(&self.scene, &root, |m| m.is_placement_target)
    }
}
