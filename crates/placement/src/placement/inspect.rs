//! Read-only session snapshot for dev tooling and tests.

use serde::Serialize;
use shared::NodeId;

use super::PlacementController;
use crate::animation::DropPhase;
use crate::scene::{SceneGraph, TraversalSignal};
use crate::viewport::cursor::CursorKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectSnapshot {
    pub id: NodeId,
    pub name: String,
    pub group_id: String,
    pub parent: Option<NodeId>,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub snapped_group: bool,
    pub snap_points: usize,
    pub snap_points_used: usize,
    /// Drop phase while animating
    pub phase: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CursorSnapshot {
    pub kind: CursorKind,
    pub shown: bool,
    pub visible: bool,
    pub position: Option<[f32; 3]>,
}

/// Everything a debug console needs to show about the session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub floor_y: Option<f32>,
    pub objects: Vec<ObjectSnapshot>,
    pub selected: Vec<NodeId>,
    pub dragging: Option<NodeId>,
    pub animating: usize,
    pub cursors: Vec<CursorSnapshot>,
}

impl SessionSnapshot {
    pub fn object(&self, id: &str) -> Option<&ObjectSnapshot> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

fn phase_name(phase: DropPhase) -> String {
    format!("{phase:?}").to_lowercase()
}

impl<S: SceneGraph> PlacementController<S> {
    /// Snapshot of placed objects, selection, drag and cursors
    pub fn inspect(&self) -> SessionSnapshot {
        let root = self.scene.root();
        let mut objects = Vec::new();
        self.scene.traverse(&root, &mut |node| {
            let Some(meta) = self.scene.metadata(node) else {
                return TraversalSignal::Continue;
            };
            if !meta.is_placeable() {
                return TraversalSignal::Continue;
            }
            objects.push(ObjectSnapshot {
                id: node.clone(),
                name: meta.name.clone(),
                group_id: meta.group_id.clone(),
                parent: self.scene.parent(node),
                position: self.scene.position(node).unwrap_or_default().to_array(),
                rotation: self.scene.rotation(node).unwrap_or_default().to_array(),
                snapped_group: meta.is_snapped_group,
                snap_points: meta.snap_points.len(),
                snap_points_used: meta.snap_points.iter().filter(|p| p.is_used).count(),
                phase: self.animations.phase_of(node).map(phase_name),
            });
            TraversalSignal::Continue
        });

        SessionSnapshot {
            floor_y: self.floor_y,
            objects,
            selected: self.selection.all().to_vec(),
            dragging: self.selection.drag().map(|d| d.node.clone()),
            animating: self.animations.active_count(),
            cursors: self
                .cursors
                .iter()
                .map(|c| CursorSnapshot {
                    kind: c.kind(),
                    shown: c.is_shown(),
                    visible: c.is_visible(),
                    position: c.world_position().map(|p| p.to_array()),
                })
                .collect(),
        }
    }
}
