//! Factory functions for creating test scenes and models.
//!
//! Provides the scenes and loaders used by unit tests, integration tests and
//! the runner binary.

use glam::Vec3;
use shared::{NodeId, ObjectMetadata, ScriptedModel, SnapPoint};

use crate::harness::StaticLoader;
use crate::scene::{MemoryScene, ModelData, SceneGraph};
use crate::viewport::picking::Aabb;

/// Name of the container placed objects go under
pub const TARGET_NAME: &str = "placement-target";

/// Half size of the fixture floor in meters
pub const FLOOR_HALF: f32 = 10.0;

// ── Scenes ──────────────────────────────────────────────────────

/// Flat floor at y = 0 plus an empty placement target
pub fn floor_scene() -> MemoryScene {
    floor_scene_at(0.0)
}

/// Flat floor at `floor_y` plus an empty placement target
pub fn floor_scene_at(floor_y: f32) -> MemoryScene {
    let mut scene = MemoryScene::new();
    let root = scene.root();
    scene.add_static(
        &root,
        "floor",
        Aabb::new(
            Vec3::new(-FLOOR_HALF, floor_y, -FLOOR_HALF),
            Vec3::new(FLOOR_HALF, floor_y, FLOOR_HALF),
        ),
    );
    scene.create_group(&root, ObjectMetadata::placement_target(TARGET_NAME));
    scene
}

/// Placement target with no geometry anywhere
pub fn empty_scene() -> MemoryScene {
    let mut scene = MemoryScene::new();
    let root = scene.root();
    scene.create_group(&root, ObjectMetadata::placement_target(TARGET_NAME));
    scene
}

/// Floor but no placement target
pub fn scene_without_target() -> MemoryScene {
    let mut scene = MemoryScene::new();
    let root = scene.root();
    scene.add_static(
        &root,
        "floor",
        Aabb::new(Vec3::new(-FLOOR_HALF, 0.0, -FLOOR_HALF), Vec3::new(FLOOR_HALF, 0.0, FLOOR_HALF)),
    );
    scene
}

pub fn target_of(scene: &MemoryScene) -> Option<NodeId> {
    let root = scene.root();
    crate::scene::find_first(scene, &root, |m| m.is_placement_target)
}

// ── Models ──────────────────────────────────────────────────────

/// Unit cube resting on its origin
pub fn unit_block(mesh: &str) -> ModelData {
    ModelData::block(Vec3::ONE, mesh)
}

pub fn block(size: [f32; 3], mesh: &str) -> ModelData {
    ModelData::block(Vec3::from(size), mesh)
}

/// Insert a settled placed block at world `position` without animating it
pub fn placed_block(scene: &mut MemoryScene, name: &str, position: Vec3, points: Vec<SnapPoint>) -> Option<NodeId> {
    let container = target_of(scene)?;
    let mut metadata = ObjectMetadata::placed(name, 1.0);
    metadata.snap_points = points;
    let node = scene.insert_model(&container, unit_block(&format!("{name}-mesh")), metadata);
    scene.set_position(&node, position);
    Some(node)
}

// ── Loaders ─────────────────────────────────────────────────────

/// Loader with a chair, a wide table, a light vase and a failing URL
pub fn standard_loader() -> StaticLoader {
    StaticLoader::default()
        .with_model("chair.glb", "chair_01", unit_block("chair-mesh"))
        .with_model("table.glb", "table#wood_02", block([2.0, 0.8, 1.0], "table-mesh"))
        .with_model("vase.glb", "vase_07", block([0.2, 0.4, 0.2], "vase-mesh"))
        .with_failure("broken.glb", "unexpected end of file")
}

/// Loader serving every model of a placement script
pub fn script_loader(models: &[ScriptedModel]) -> StaticLoader {
    models.iter().fold(StaticLoader::default(), |loader, m| {
        loader.with_model(&m.url, &m.name, block(m.size, &format!("{}-mesh", m.name)))
    })
}
