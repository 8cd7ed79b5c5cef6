//! Drives every in-flight drop once per frame.

use shared::NodeId;
use tracing::debug;

use super::drop::{DropAnimation, DropPhase};
use crate::host::RenderSink;
use crate::scene::SceneGraph;

#[derive(Debug, Clone)]
struct ActiveDrop {
    node: NodeId,
    animation: DropAnimation,
}

/// Independent drop animations keyed by node. At most one per node.
#[derive(Debug, Default)]
pub struct AnimationEngine {
    drops: Vec<ActiveDrop>,
}

impl AnimationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start animating `node`. An animation already running on the same node
    /// is deactivated and replaced. Returns true if one was superseded.
    pub fn start(&mut self, node: NodeId, animation: DropAnimation) -> bool {
        let superseded = self.cancel(&node);
        if superseded {
            debug!(%node, "superseding drop animation");
        }
        self.drops.push(ActiveDrop { node, animation });
        superseded
    }

    /// Stop animating `node` without snapping it to its final state
    pub fn cancel(&mut self, node: &NodeId) -> bool {
        let before = self.drops.len();
        self.drops.retain_mut(|d| {
            if &d.node == node {
                d.animation.cancel();
                false
            } else {
                true
            }
        });
        before != self.drops.len()
    }

    pub fn is_animating(&self, node: &NodeId) -> bool {
        self.drops.iter().any(|d| &d.node == node)
    }

    pub fn phase_of(&self, node: &NodeId) -> Option<DropPhase> {
        self.drops
            .iter()
            .find(|d| &d.node == node)
            .map(|d| d.animation.phase())
    }

    pub fn active_count(&self) -> usize {
        self.drops.len()
    }

    pub fn is_idle(&self) -> bool {
        self.drops.is_empty()
    }

    pub fn animating(&self) -> impl Iterator<Item = &NodeId> {
        self.drops.iter().map(|d| &d.node)
    }

    /// Advance all drops by `dt_ms`, write their frames into the scene and
    /// request one render. Returns the nodes that finished this frame; the
    /// render request for their final frame has already been issued.
    pub fn tick<S>(&mut self, scene: &mut S, render: &mut dyn RenderSink, dt_ms: f32) -> Vec<NodeId>
    where
        S: SceneGraph + ?Sized,
    {
        let mut completed = Vec::new();
        let mut wrote = false;

        self.drops.retain_mut(|d| {
            if !scene.contains(&d.node) {
                debug!(node = %d.node, "animated node left the scene");
                d.animation.cancel();
                return false;
            }
            let Some(frame) = d.animation.advance(dt_ms) else {
                return false;
            };

            if let Some(mut position) = scene.position(&d.node) {
                position.y = frame.y;
                scene.set_position(&d.node, position);
            }
            scene.set_rotation(&d.node, frame.rotation);
            wrote = true;

            if frame.phase == DropPhase::Done {
                completed.push(d.node.clone());
                false
            } else {
                true
            }
        });

        if wrote {
            render.request_render();
        }
        completed
    }
}
