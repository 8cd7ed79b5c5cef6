//! In-memory scene graph with real transform math.

use std::collections::HashMap;

use glam::{EulerRot, Mat4, Quat, Vec3};
use shared::{MeshRef, NodeId, ObjectMetadata};

use super::{RayHit, SceneGraph};
use crate::viewport::picking::{ray_aabb, Aabb, Ray};

/// Geometry handed over by a loader: local bounds plus mesh references
#[derive(Debug, Clone, PartialEq)]
pub struct ModelData {
    pub extent: Aabb,
    pub meshes: Vec<MeshRef>,
}

impl ModelData {
    /// Box of the given size resting on its local origin (bottom at y = 0)
    pub fn block(size: Vec3, mesh: impl Into<MeshRef>) -> Self {
        Self {
            extent: Aabb::new(
                Vec3::new(-size.x * 0.5, 0.0, -size.z * 0.5),
                Vec3::new(size.x * 0.5, size.y, size.z * 0.5),
            ),
            meshes: vec![mesh.into()],
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    position: Vec3,
    rotation: Vec3,
    scale: Vec3,
    metadata: ObjectMetadata,
    extent: Option<Aabb>,
    meshes: Vec<MeshRef>,
}

impl Node {
    fn new(parent: Option<NodeId>, metadata: ObjectMetadata) -> Self {
        Self {
            parent,
            children: Vec::new(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            metadata,
            extent: None,
            meshes: Vec::new(),
        }
    }

    fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale,
            Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z),
            self.position,
        )
    }

    fn set_local_matrix(&mut self, matrix: &Mat4) {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
        self.scale = scale;
        self.rotation = Vec3::new(x, y, z);
        self.position = translation;
    }
}

/// Scene graph kept entirely in memory
#[derive(Debug, Clone)]
pub struct MemoryScene {
    root: NodeId,
    nodes: HashMap<NodeId, Node>,
}

impl MemoryScene {
    pub fn new() -> Self {
        let root = "root".to_string();
        let mut nodes = HashMap::new();
        nodes.insert(root.clone(), Node::new(None, ObjectMetadata::named("root")));
        Self { root, nodes }
    }

    /// Number of nodes, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Add a static piece of geometry (floor, walls) under `parent`
    pub fn add_static(&mut self, parent: &NodeId, name: &str, extent: Aabb) -> NodeId {
        let id = self.create_group(parent, ObjectMetadata::named(name));
        if let Some(node) = self.nodes.get_mut(&id) {
            node.extent = Some(extent);
        }
        id
    }

    pub fn world_matrix(&self, node: &NodeId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = self.nodes.get(node);
        while let Some(n) = current {
            matrix = n.local_matrix() * matrix;
            current = n.parent.as_ref().and_then(|p| self.nodes.get(p));
        }
        matrix
    }

    /// World-space origin of the node
    pub fn world_position(&self, node: &NodeId) -> Option<Vec3> {
        self.nodes
            .contains_key(node)
            .then(|| self.world_matrix(node).transform_point3(Vec3::ZERO))
    }

    fn next_id(&self) -> NodeId {
        uuid::Uuid::new_v4().to_string()
    }

    fn link(&mut self, parent: &NodeId, node: Node) -> NodeId {
        let id = self.next_id();
        self.nodes.insert(id.clone(), node);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(id.clone());
        }
        id
    }

    fn is_descendant(&self, node: &NodeId, ancestor: &NodeId) -> bool {
        let mut current = Some(node.clone());
        while let Some(id) = current {
            if &id == ancestor {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent.clone());
        }
        false
    }

    fn subtree(&self, node: &NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node.clone()];
        while let Some(id) = stack.pop() {
            if let Some(n) = self.nodes.get(&id) {
                stack.extend(n.children.iter().cloned());
                out.push(id);
            }
        }
        out
    }
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph for MemoryScene {
    type Model = ModelData;

    fn root(&self) -> NodeId {
        self.root.clone()
    }

    fn contains(&self, node: &NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent.clone())
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn metadata(&self, node: &NodeId) -> Option<&ObjectMetadata> {
        self.nodes.get(node).map(|n| &n.metadata)
    }

    fn metadata_mut(&mut self, node: &NodeId) -> Option<&mut ObjectMetadata> {
        self.nodes.get_mut(node).map(|n| &mut n.metadata)
    }

    fn position(&self, node: &NodeId) -> Option<Vec3> {
        self.nodes.get(node).map(|n| n.position)
    }

    fn set_position(&mut self, node: &NodeId, position: Vec3) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.position = position;
        }
    }

    fn rotation(&self, node: &NodeId) -> Option<Vec3> {
        self.nodes.get(node).map(|n| n.rotation)
    }

    fn set_rotation(&mut self, node: &NodeId, rotation: Vec3) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.rotation = rotation;
        }
    }

    fn world_bounding_box(&self, node: &NodeId) -> Aabb {
        self.subtree(node)
            .iter()
            .filter_map(|id| {
                let extent = self.nodes.get(id)?.extent?;
                Some(extent.transformed(&self.world_matrix(id)))
            })
            .fold(Aabb::EMPTY, |acc, b| acc.union(&b))
    }

    fn world_to_local(&self, node: &NodeId, point: Vec3) -> Vec3 {
        self.world_matrix(node).inverse().transform_point3(point)
    }

    fn local_to_world(&self, node: &NodeId, point: Vec3) -> Vec3 {
        self.world_matrix(node).transform_point3(point)
    }

    fn apply_matrix(&mut self, node: &NodeId, matrix: &Mat4) {
        if let Some(n) = self.nodes.get_mut(node) {
            let local = *matrix * n.local_matrix();
            n.set_local_matrix(&local);
        }
    }

    fn meshes(&self, node: &NodeId) -> Vec<MeshRef> {
        let mut ids = self.subtree(node);
        ids.reverse();
        ids.iter()
            .filter_map(|id| self.nodes.get(id))
            .flat_map(|n| n.meshes.iter().cloned())
            .collect()
    }

    fn insert_model(&mut self, parent: &NodeId, model: ModelData, metadata: ObjectMetadata) -> NodeId {
        let mut node = Node::new(Some(parent.clone()), metadata);
        node.extent = Some(model.extent);
        node.meshes = model.meshes;
        self.link(parent, node)
    }

    fn create_group(&mut self, parent: &NodeId, metadata: ObjectMetadata) -> NodeId {
        self.link(parent, Node::new(Some(parent.clone()), metadata))
    }

    fn attach(&mut self, node: &NodeId, new_parent: &NodeId) -> bool {
        if node == &self.root
            || !self.nodes.contains_key(node)
            || !self.nodes.contains_key(new_parent)
            || self.is_descendant(new_parent, node)
        {
            return false;
        }

        let world = self.world_matrix(node);
        let local = self.world_matrix(new_parent).inverse() * world;

        let old_parent = self.parent(node);
        if let Some(p) = old_parent.and_then(|p| self.nodes.get_mut(&p)) {
            p.children.retain(|c| c != node);
        }
        if let Some(p) = self.nodes.get_mut(new_parent) {
            p.children.push(node.clone());
        }
        if let Some(n) = self.nodes.get_mut(node) {
            n.parent = Some(new_parent.clone());
            n.set_local_matrix(&local);
        }
        true
    }

    fn remove(&mut self, node: &NodeId) -> bool {
        if node == &self.root || !self.nodes.contains_key(node) {
            return false;
        }
        if let Some(p) = self.parent(node).and_then(|p| self.nodes.get_mut(&p)) {
            p.children.retain(|c| c != node);
        }
        for id in self.subtree(node) {
            self.nodes.remove(&id);
        }
        true
    }

    fn raycast(&self, ray: &Ray) -> Vec<RayHit> {
        let mut hits: Vec<RayHit> = self
            .nodes
            .iter()
            .filter_map(|(id, n)| {
                let world = n.extent?.transformed(&self.world_matrix(id));
                let distance = ray_aabb(ray, &world)?;
                Some(RayHit {
                    node: id.clone(),
                    distance,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}
