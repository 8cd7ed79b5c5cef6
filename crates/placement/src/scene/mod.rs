//! Scene graph collaborator.
//!
//! The host engine owns the node hierarchy, transforms and hit testing. The
//! placement core only talks to it through [`SceneGraph`]. [`MemoryScene`]
//! is a self-contained implementation used by tests and the runner binary.

pub mod memory;

use glam::{Mat4, Vec3};
use shared::{MeshRef, NodeId, ObjectMetadata};

use crate::viewport::picking::{Aabb, Ray};

pub use memory::{MemoryScene, ModelData};

/// Returned by traversal visitors to continue or halt the walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalSignal {
    Continue,
    Stop,
}

/// One raycast hit reported by the host
#[derive(Debug, Clone, PartialEq)]
pub struct RayHit {
    pub node: NodeId,
    pub distance: f32,
}

/// Result of a finished model load
#[derive(Debug, Clone)]
pub struct LoadedAsset<M> {
    pub root: M,
    pub name: String,
}

pub trait SceneGraph {
    /// Engine-specific loaded model root
    type Model;

    fn root(&self) -> NodeId;
    fn contains(&self, node: &NodeId) -> bool;
    fn parent(&self, node: &NodeId) -> Option<NodeId>;
    fn children(&self, node: &NodeId) -> Vec<NodeId>;

    /// Depth-first, pre-order walk starting at `root`.
    ///
    /// Returns [`TraversalSignal::Stop`] if the visitor halted the walk.
    fn traverse(
        &self,
        root: &NodeId,
        visitor: &mut dyn FnMut(&NodeId) -> TraversalSignal,
    ) -> TraversalSignal {
        let mut stack = vec![root.clone()];
        while let Some(node) = stack.pop() {
            if visitor(&node) == TraversalSignal::Stop {
                return TraversalSignal::Stop;
            }
            let mut children = self.children(&node);
            children.reverse();
            stack.extend(children);
        }
        TraversalSignal::Continue
    }

    fn metadata(&self, node: &NodeId) -> Option<&ObjectMetadata>;
    fn metadata_mut(&mut self, node: &NodeId) -> Option<&mut ObjectMetadata>;

    /// Position relative to the parent
    fn position(&self, node: &NodeId) -> Option<Vec3>;
    fn set_position(&mut self, node: &NodeId, position: Vec3);
    /// Euler XYZ rotation relative to the parent
    fn rotation(&self, node: &NodeId) -> Option<Vec3>;
    fn set_rotation(&mut self, node: &NodeId, rotation: Vec3);

    /// World-space box around the node and its descendants. Empty when the
    /// subtree has no geometry.
    fn world_bounding_box(&self, node: &NodeId) -> Aabb;
    fn world_to_local(&self, node: &NodeId, point: Vec3) -> Vec3;
    fn local_to_world(&self, node: &NodeId, point: Vec3) -> Vec3;
    /// Pre-multiply the node's local transform by `matrix`
    fn apply_matrix(&mut self, node: &NodeId, matrix: &Mat4);

    /// Meshes in the node's subtree
    fn meshes(&self, node: &NodeId) -> Vec<MeshRef>;

    fn insert_model(&mut self, parent: &NodeId, model: Self::Model, metadata: ObjectMetadata)
        -> NodeId;
    fn create_group(&mut self, parent: &NodeId, metadata: ObjectMetadata) -> NodeId;
    /// Move `node` under `new_parent`, keeping its world transform
    fn attach(&mut self, node: &NodeId, new_parent: &NodeId) -> bool;
    fn remove(&mut self, node: &NodeId) -> bool;

    /// Nodes whose geometry the ray hits, nearest first
    fn raycast(&self, ray: &Ray) -> Vec<RayHit>;
}

/// First node under `root` (pre-order) whose metadata matches `pred`
pub fn find_first<S, F>(scene: &S, root: &NodeId, mut pred: F) -> Option<NodeId>
where
    S: SceneGraph + ?Sized,
    F: FnMut(&ObjectMetadata) -> bool,
{
    let mut found = None;
    scene.traverse(root, &mut |node| match scene.metadata(node) {
        Some(meta) if pred(meta) => {
            found = Some(node.clone());
            TraversalSignal::Stop
        }
        _ => TraversalSignal::Continue,
    });
    found
}

/// Outermost placeable node on the path from `node` up to the root
pub fn placeable_ancestor<S>(scene: &S, node: &NodeId) -> Option<NodeId>
where
    S: SceneGraph + ?Sized,
{
    let mut best = None;
    let mut current = Some(node.clone());
    while let Some(id) = current {
        if scene.metadata(&id).is_some_and(ObjectMetadata::is_placeable) {
            best = Some(id.clone());
        }
        current = scene.parent(&id);
    }
    best
}

/// Placeable children of `container`
pub fn top_level_placeables<S>(scene: &S, container: &NodeId) -> Vec<NodeId>
where
    S: SceneGraph + ?Sized,
{
    scene
        .children(container)
        .into_iter()
        .filter(|c| scene.metadata(c).is_some_and(ObjectMetadata::is_placeable))
        .collect()
}
