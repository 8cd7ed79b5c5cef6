//! Loading a model into the scene and dropping it onto the floor.

use glam::Vec3;
use shared::{NodeId, ObjectMetadata, PlacementOptions};
use tracing::{debug, info, trace, warn};

use super::{PlacementController, PlacementEvent};
use crate::animation::drop::MIN_MASS;
use crate::animation::DropAnimation;
use crate::error::{PlacementError, Result};
use crate::host::AssetLoader;
use crate::scene::{placeable_ancestor, top_level_placeables, SceneGraph};
use crate::snap::{best_connection, create_snapped_group, ensure_default_snap_points, SnapConnection};

impl<S: SceneGraph> PlacementController<S> {
    /// Load `url` and drop it onto the floor.
    ///
    /// Resolves with the new node once the drop has started; completion is
    /// reported later as [`PlacementEvent::Settled`]. Nothing is inserted
    /// when the scene has no placement target or the load fails.
    pub async fn place_object<L>(&mut self, loader: &L, url: &str, options: PlacementOptions) -> Result<NodeId>
    where
        L: AssetLoader<S::Model>,
    {
        if self.target_container().is_none() {
            return Err(PlacementError::MissingTargetContainer);
        }

        let mut progress = |fraction: f32| trace!(url, fraction, "loading");
        let asset = loader.load_model(url, &mut progress).await.map_err(|e| {
            warn!("{e}");
            e
        })?;

        // the host may have rebuilt the scene while loading
        let container = self
            .target_container()
            .ok_or(PlacementError::MissingTargetContainer)?;
        let floor_y = self.floor_level();

        let mass = self.effective_mass(options.mass);
        let name = options.name.clone().unwrap_or(asset.name);
        let mut metadata = ObjectMetadata::placed(name, mass);
        metadata.snap_points = options.snap_points.clone();

        let node = self.scene.insert_model(&container, asset.root, metadata);
        let meshes = self.scene.meshes(&node);
        if let Some(meta) = self.scene.metadata_mut(&node) {
            meta.meshes = meshes;
        }

        let rotation = options.rotation.map(Vec3::from).unwrap_or(Vec3::ZERO);
        self.scene.set_rotation(&node, rotation);

        let world = match options.position {
            Some([x, z]) => Vec3::new(x, floor_y, z),
            None => self
                .cursor_position()
                .map(|p| Vec3::new(p.x, floor_y, p.z))
                .unwrap_or(Vec3::new(0.0, floor_y, 0.0)),
        };
        let local = self.scene.world_to_local(&container, world);
        self.scene.set_position(&node, local);

        let target_y = self.resting_y(&node, local.y, floor_y);
        let drop_height = options
            .drop_height
            .unwrap_or(self.settings.drop.drop_height)
            .max(0.0);
        let start_y = target_y + drop_height;
        self.scene
            .set_position(&node, Vec3::new(local.x, start_y, local.z));

        let animation = DropAnimation::new(start_y, target_y, mass, rotation);
        self.animations.start(node.clone(), animation);
        self.frames.request_frame();
        self.render.request_render();

        info!(%node, url, mass, x = world.x, z = world.z, "placed object");
        self.events.push(PlacementEvent::Placed { node: node.clone() });
        Ok(node)
    }

    /// Floor height: the lowest point of the scene, measured once.
    ///
    /// An empty scene yields the configured fallback, which is cached like a
    /// measurement so objects still falling never become the floor.
    pub fn floor_level(&mut self) -> f32 {
        if let Some(y) = self.floor_y {
            return y;
        }
        let root = self.scene.root();
        let bounds = self.scene.world_bounding_box(&root);
        let floor_y = if bounds.is_degenerate() {
            warn!(
                fallback = self.settings.fallback_floor_y,
                "scene has no geometry, using fallback floor level"
            );
            self.settings.fallback_floor_y
        } else {
            debug!(floor_y = bounds.min.y, "floor level measured");
            bounds.min.y
        };
        self.floor_y = Some(floor_y);
        floor_y
    }

    /// Forget the measured floor, e.g. after the host swapped the scene
    pub fn reset_floor_level(&mut self) {
        self.floor_y = None;
    }

    /// Nearest snap connections from `node` to the other placed objects,
    /// without committing any of them
    pub fn snap_candidates(&self, node: &NodeId) -> Vec<SnapConnection> {
        let Some(top) = placeable_ancestor(&self.scene, node) else {
            return Vec::new();
        };
        let mut candidates: Vec<SnapConnection> = self
            .snap_partners(&top)
            .iter()
            .flat_map(|other| crate::snap::find_connections(&self.scene, &top, other))
            .collect();
        candidates.sort_by(|x, y| x.distance.total_cmp(&y.distance));
        candidates
    }

    /// Commit `connection` and report it
    pub fn snap(&mut self, connection: &SnapConnection) -> Result<NodeId> {
        let group = create_snapped_group(&mut self.scene, connection)?;
        self.events.push(PlacementEvent::Snapped {
            group: group.clone(),
            a: connection.a.node.clone(),
            b: connection.b.node.clone(),
        });
        self.render.request_render();
        Ok(group)
    }

    pub(super) fn on_settled(&mut self, node: &NodeId) {
        if !self.scene.contains(node) {
            return;
        }
        let added = ensure_default_snap_points(&mut self.scene, node, self.settings.snap.diameter);
        debug!(%node, added, "settled");
        self.events.push(PlacementEvent::Settled { node: node.clone() });
        if self.settings.snap.auto_snap {
            self.auto_snap(node);
        }
    }

    /// Snap `node` to its nearest partner, if any is in range
    pub(super) fn auto_snap(&mut self, node: &NodeId) -> Option<NodeId> {
        let top = placeable_ancestor(&self.scene, node)?;
        let partners = self.snap_partners(&top);
        let connection = best_connection(&self.scene, &top, &partners)?;
        match self.snap(&connection) {
            Ok(group) => Some(group),
            Err(e) => {
                warn!(%node, "auto snap skipped: {e}");
                None
            }
        }
    }

    /// Settled top-level objects next to `top`
    fn snap_partners(&self, top: &NodeId) -> Vec<NodeId> {
        let Some(container) = self.scene.parent(top) else {
            return Vec::new();
        };
        top_level_placeables(&self.scene, &container)
            .into_iter()
            .filter(|other| other != top && !self.animations.is_animating(other))
            .collect()
    }

    fn effective_mass(&self, requested: Option<f32>) -> f32 {
        let fallback = self.settings.drop.default_mass.max(MIN_MASS);
        match requested {
            Some(m) if m.is_finite() && m > 0.0 => m.max(MIN_MASS),
            Some(m) => {
                warn!(mass = m, fallback, "invalid mass, using default");
                fallback
            }
            None => fallback,
        }
    }

    /// Local Y that rests the node's bounding box bottom on the floor
    fn resting_y(&self, node: &NodeId, local_y: f32, floor_y: f32) -> f32 {
        let bounds = self.scene.world_bounding_box(node);
        if bounds.is_degenerate() {
            warn!(%node, "model has no geometry, resting origin on the floor");
            return local_y;
        }
        local_y + (floor_y - bounds.min.y)
    }
}
