//! Snap points: default generation, proximity matching and grouping.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec3;
use shared::{NodeId, ObjectMetadata, SnapPoint};
use tracing::{info, warn};

use crate::error::SnapError;
use crate::scene::{placeable_ancestor, SceneGraph, TraversalSignal};
use crate::viewport::picking::Aabb;

/// One snap point addressed by owner and index
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapRef {
    pub node: NodeId,
    pub index: usize,
}

/// A candidate pairing between a point on A's side and one on B's side
#[derive(Debug, Clone, PartialEq)]
pub struct SnapConnection {
    pub a: SnapRef,
    pub b: SnapRef,
    pub a_world: Vec3,
    pub b_world: Vec3,
    pub distance: f32,
}

/// The four side midpoints of a local-space box, facing outwards. Each
/// attracts within twice the snap `diameter`.
pub fn default_snap_points(local: &Aabb, diameter: f32) -> Vec<SnapPoint> {
    let [front, back, right, left] = local.side_midpoints();
    [
        ("front", front, 0.0),
        ("back", back, PI),
        ("right", right, FRAC_PI_2),
        ("left", left, -FRAC_PI_2),
    ]
    .into_iter()
    .map(|(label, position, yaw)| {
        SnapPoint::new(label, position.to_array(), [0.0, yaw, 0.0]).with_attraction(2.0 * diameter)
    })
    .collect()
}

/// Give `node` its default snap points unless it already has some.
///
/// Must run after the node reached its resting transform. Returns the
/// number of points added; a degenerate bounding box adds none.
pub fn ensure_default_snap_points<S>(scene: &mut S, node: &NodeId, diameter: f32) -> usize
where
    S: SceneGraph + ?Sized,
{
    match scene.metadata(node) {
        Some(meta) if meta.snap_points.is_empty() => {}
        _ => return 0,
    }

    let world = scene.world_bounding_box(node);
    if world.is_degenerate() {
        warn!(%node, "bounding box is empty, no snap points generated");
        return 0;
    }

    let mut points = default_snap_points(&world, diameter);
    for point in &mut points {
        let local = scene.world_to_local(node, Vec3::from(point.position));
        point.position = local.to_array();
    }

    let count = points.len();
    if let Some(meta) = scene.metadata_mut(node) {
        meta.snap_points = points;
    }
    count
}

/// Unused snap points in `node`'s subtree, in world space
fn world_points<S>(scene: &S, node: &NodeId) -> Vec<(SnapRef, Vec3, f32)>
where
    S: SceneGraph + ?Sized,
{
    let mut out = Vec::new();
    scene.traverse(node, &mut |id| {
        if let Some(meta) = scene.metadata(id) {
            for (index, point) in meta.snap_points.iter().enumerate() {
                if point.is_used {
                    continue;
                }
                let world = scene.local_to_world(id, Vec3::from(point.position));
                out.push((
                    SnapRef {
                        node: id.clone(),
                        index,
                    },
                    world,
                    point.attraction_radius,
                ));
            }
        }
        TraversalSignal::Continue
    });
    out
}

/// Unused point pairs between `a` and `b` within the larger of the two
/// attraction radii, nearest first. Read-only.
pub fn find_connections<S>(scene: &S, a: &NodeId, b: &NodeId) -> Vec<SnapConnection>
where
    S: SceneGraph + ?Sized,
{
    let points_a = world_points(scene, a);
    let points_b = world_points(scene, b);

    let mut connections = Vec::new();
    for (ref_a, world_a, radius_a) in &points_a {
        for (ref_b, world_b, radius_b) in &points_b {
            let distance = world_a.distance(*world_b);
            if distance <= radius_a.max(*radius_b) {
                connections.push(SnapConnection {
                    a: ref_a.clone(),
                    b: ref_b.clone(),
                    a_world: *world_a,
                    b_world: *world_b,
                    distance,
                });
            }
        }
    }
    connections.sort_by(|x, y| x.distance.total_cmp(&y.distance));
    connections
}

/// Nearest connection from `node` to any of `others`
pub fn best_connection<S>(scene: &S, node: &NodeId, others: &[NodeId]) -> Option<SnapConnection>
where
    S: SceneGraph + ?Sized,
{
    others
        .iter()
        .filter(|other| *other != node)
        .filter_map(|other| find_connections(scene, node, other).into_iter().next())
        .min_by(|x, y| x.distance.total_cmp(&y.distance))
}

fn check_point<S>(scene: &S, point: &SnapRef) -> Result<(), SnapError>
where
    S: SceneGraph + ?Sized,
{
    let meta = scene
        .metadata(&point.node)
        .ok_or_else(|| SnapError::UnknownNode(point.node.clone()))?;
    match meta.snap_points.get(point.index) {
        None => Err(SnapError::PointOutOfRange {
            node: point.node.clone(),
            index: point.index,
        }),
        Some(p) if p.is_used => Err(SnapError::PointUsed {
            node: point.node.clone(),
            index: point.index,
        }),
        Some(_) => Ok(()),
    }
}

fn mark_used<S>(scene: &mut S, point: &SnapRef)
where
    S: SceneGraph + ?Sized,
{
    if let Some(p) = scene
        .metadata_mut(&point.node)
        .and_then(|m| m.snap_points.get_mut(point.index))
    {
        p.is_used = true;
    }
}

fn is_group<S>(scene: &S, node: &NodeId) -> bool
where
    S: SceneGraph + ?Sized,
{
    scene.metadata(node).is_some_and(|m| m.is_snapped_group)
}

/// Commit `connection`: consume both points and put the two objects in one
/// snapped group. Returns the group node.
///
/// Two top-level objects get a fresh group inheriting the first object's
/// metadata. An object joining an existing group is appended to it.
pub fn create_snapped_group<S>(scene: &mut S, connection: &SnapConnection) -> Result<NodeId, SnapError>
where
    S: SceneGraph + ?Sized,
{
    check_point(&*scene, &connection.a)?;
    check_point(&*scene, &connection.b)?;

    let top_a = placeable_ancestor(&*scene, &connection.a.node)
        .ok_or_else(|| SnapError::UnknownNode(connection.a.node.clone()))?;
    let top_b = placeable_ancestor(&*scene, &connection.b.node)
        .ok_or_else(|| SnapError::UnknownNode(connection.b.node.clone()))?;
    if top_a == top_b {
        return Err(SnapError::SameObject);
    }

    let group = match (is_group(&*scene, &top_a), is_group(&*scene, &top_b)) {
        (true, true) => return Err(SnapError::AlreadyGrouped),
        (true, false) => {
            attach(scene, &top_b, &top_a)?;
            top_a
        }
        (false, true) => {
            attach(scene, &top_a, &top_b)?;
            top_b
        }
        (false, false) => {
            let parent = scene
                .parent(&top_a)
                .ok_or_else(|| SnapError::UnknownNode(top_a.clone()))?;
            let metadata = group_metadata(&*scene, &top_a)?;
            let group = scene.create_group(&parent, metadata);
            attach(scene, &top_a, &group)?;
            attach(scene, &top_b, &group)?;
            group
        }
    };

    mark_used(scene, &connection.a);
    mark_used(scene, &connection.b);
    info!(%group, a = %connection.a.node, b = %connection.b.node, "snapped");
    Ok(group)
}

fn group_metadata<S>(scene: &S, first: &NodeId) -> Result<ObjectMetadata, SnapError>
where
    S: SceneGraph + ?Sized,
{
    let inherited = scene
        .metadata(first)
        .ok_or_else(|| SnapError::UnknownNode(first.clone()))?;
    // points and meshes stay with the member
    Ok(ObjectMetadata {
        is_snapped_group: true,
        snap_points: Vec::new(),
        meshes: Vec::new(),
        ..inherited.clone()
    })
}

fn attach<S>(scene: &mut S, node: &NodeId, parent: &NodeId) -> Result<(), SnapError>
where
    S: SceneGraph + ?Sized,
{
    if scene.attach(node, parent) {
        Ok(())
    } else {
        Err(SnapError::UnknownNode(node.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MemoryScene, ModelData};
    use shared::SNAP_DIAMETER;

    fn placed(scene: &mut MemoryScene, name: &str, pos: Vec3, points: Vec<SnapPoint>) -> NodeId {
        let root = scene.root();
        let mut meta = ObjectMetadata::placed(name, 1.0);
        meta.snap_points = points;
        let id = scene.insert_model(&root, ModelData::block(Vec3::ONE, name), meta);
        scene.set_position(&id, pos);
        id
    }

    fn point(x: f32, attraction: f32) -> SnapPoint {
        SnapPoint::new("p", [x, 0.0, 0.0], [0.0; 3]).with_attraction(attraction)
    }

    #[test]
    fn test_defaults_are_side_midpoints() {
        let mut scene = MemoryScene::new();
        let id = placed(&mut scene, "crate_1", Vec3::new(3.0, 0.0, 0.0), Vec::new());
        assert_eq!(ensure_default_snap_points(&mut scene, &id, SNAP_DIAMETER), 4);

        let meta = scene.metadata(&id).unwrap();
        let labels: Vec<&str> = meta.snap_points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["front", "back", "right", "left"]);
        let front = Vec3::from(meta.snap_points[0].position);
        let right = Vec3::from(meta.snap_points[2].position);
        assert!(front.distance(Vec3::new(0.0, 0.5, 0.5)) < 1e-5);
        assert!(right.distance(Vec3::new(0.5, 0.5, 0.0)) < 1e-5);
        assert!(meta.snap_points.iter().all(|p| p.attraction_radius == 0.2));

        // lazily generated once
        assert_eq!(ensure_default_snap_points(&mut scene, &id, SNAP_DIAMETER), 0);
    }

    #[test]
    fn test_default_attraction_follows_diameter() {
        let mut scene = MemoryScene::new();
        let id = placed(&mut scene, "crate_2", Vec3::ZERO, Vec::new());
        assert_eq!(ensure_default_snap_points(&mut scene, &id, 0.5), 4);
        let meta = scene.metadata(&id).unwrap();
        assert!(meta.snap_points.iter().all(|p| p.attraction_radius == 1.0));
    }

    #[test]
    fn test_defaults_skip_degenerate_box() {
        let mut scene = MemoryScene::new();
        let root = scene.root();
        let id = scene.create_group(&root, ObjectMetadata::placed("ghost_1", 1.0));
        assert_eq!(ensure_default_snap_points(&mut scene, &id, SNAP_DIAMETER), 0);
        assert!(scene.metadata(&id).unwrap().snap_points.is_empty());
    }

    #[test]
    fn test_exact_radius_included_epsilon_excluded() {
        let mut scene = MemoryScene::new();
        let a = placed(&mut scene, "a_1", Vec3::ZERO, vec![point(0.0, 0.5)]);
        let b = placed(&mut scene, "b_1", Vec3::ZERO, vec![point(0.5, 0.5)]);
        let c = placed(&mut scene, "c_1", Vec3::ZERO, vec![point(0.501, 0.5)]);

        let hits = find_connections(&scene, &a, &b);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].distance, 0.5);
        assert!(find_connections(&scene, &a, &c).is_empty());
    }

    #[test]
    fn test_larger_radius_wins() {
        let mut scene = MemoryScene::new();
        let a = placed(&mut scene, "a_1", Vec3::ZERO, vec![point(0.0, 0.0)]);
        let b = placed(&mut scene, "b_1", Vec3::ZERO, vec![point(0.75, 1.0)]);
        assert_eq!(find_connections(&scene, &a, &b).len(), 1);
    }

    #[test]
    fn test_used_points_never_match() {
        let mut scene = MemoryScene::new();
        let mut used = point(0.1, 0.5);
        used.is_used = true;
        let a = placed(&mut scene, "a_1", Vec3::ZERO, vec![point(0.0, 0.5)]);
        let b = placed(&mut scene, "b_1", Vec3::ZERO, vec![used]);
        assert!(find_connections(&scene, &a, &b).is_empty());
    }

    #[test]
    fn test_sorted_by_distance_and_read_only() {
        let mut scene = MemoryScene::new();
        let a = placed(&mut scene, "a_1", Vec3::ZERO, vec![point(0.0, 1.0)]);
        let b = placed(
            &mut scene,
            "b_1",
            Vec3::ZERO,
            vec![point(0.75, 1.0), point(0.25, 1.0), point(0.5, 1.0)],
        );
        let hits = find_connections(&scene, &a, &b);
        let order: Vec<usize> = hits.iter().map(|h| h.b.index).collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert_eq!(find_connections(&scene, &a, &b), hits);
    }

    #[test]
    fn test_world_space_distance() {
        let mut scene = MemoryScene::new();
        let a = placed(&mut scene, "a_1", Vec3::new(0.5, 0.0, 0.0), vec![point(0.5, 0.2)]);
        let b = placed(&mut scene, "b_1", Vec3::new(1.5, 0.0, 0.0), vec![point(-0.5, 0.2)]);
        let hits = find_connections(&scene, &a, &b);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].distance < 1e-6);
        assert!(hits[0].a_world.distance(Vec3::new(1.0, 0.0, 0.0)) < 1e-6);
    }

    #[test]
    fn test_group_creation_consumes_points() {
        let mut scene = MemoryScene::new();
        let root = scene.root();
        let a = placed(&mut scene, "chair_1", Vec3::ZERO, vec![point(0.0, 0.5)]);
        let b = placed(&mut scene, "chair_2", Vec3::ZERO, vec![point(0.25, 0.5)]);

        let conn = find_connections(&scene, &a, &b).remove(0);
        let group = create_snapped_group(&mut scene, &conn).unwrap();

        assert_eq!(scene.parent(&a), Some(group.clone()));
        assert_eq!(scene.parent(&b), Some(group.clone()));
        assert_eq!(scene.parent(&group), Some(root));
        let meta = scene.metadata(&group).unwrap();
        assert!(meta.is_snapped_group);
        assert_eq!(meta.name, "chair_1");
        assert!(meta.snap_points.is_empty());
        assert!(scene.metadata(&a).unwrap().snap_points[0].is_used);
        assert!(scene.metadata(&b).unwrap().snap_points[0].is_used);

        assert_eq!(
            create_snapped_group(&mut scene, &conn),
            Err(SnapError::PointUsed {
                node: a.clone(),
                index: 0
            })
        );
        assert!(find_connections(&scene, &a, &b).is_empty());
    }

    #[test]
    fn test_object_joins_existing_group() {
        let mut scene = MemoryScene::new();
        let a = placed(&mut scene, "a_1", Vec3::ZERO, vec![point(0.0, 0.5), point(1.0, 0.5)]);
        let b = placed(&mut scene, "b_1", Vec3::ZERO, vec![point(0.25, 0.5)]);
        let c = placed(&mut scene, "c_1", Vec3::ZERO, vec![point(1.25, 0.5)]);

        let first = find_connections(&scene, &a, &b).remove(0);
        let group = create_snapped_group(&mut scene, &first).unwrap();

        let second = find_connections(&scene, &c, &group).remove(0);
        assert_eq!(second.b.node, a);
        let joined = create_snapped_group(&mut scene, &second).unwrap();
        assert_eq!(joined, group);
        assert_eq!(scene.children(&group).len(), 3);
    }

    #[test]
    fn test_two_groups_do_not_merge() {
        let mut scene = MemoryScene::new();
        let a = placed(&mut scene, "a_1", Vec3::ZERO, vec![point(0.0, 0.5), point(5.0, 0.5)]);
        let b = placed(&mut scene, "b_1", Vec3::ZERO, vec![point(0.25, 0.5)]);
        let c = placed(&mut scene, "c_1", Vec3::ZERO, vec![point(10.0, 0.5), point(5.25, 0.5)]);
        let d = placed(&mut scene, "d_1", Vec3::ZERO, vec![point(10.25, 0.5)]);

        let ab = find_connections(&scene, &a, &b).remove(0);
        let g1 = create_snapped_group(&mut scene, &ab).unwrap();
        let cd = find_connections(&scene, &c, &d).remove(0);
        let g2 = create_snapped_group(&mut scene, &cd).unwrap();
        let bridge = find_connections(&scene, &g1, &g2).remove(0);
        assert_eq!(create_snapped_group(&mut scene, &bridge), Err(SnapError::AlreadyGrouped));
    }

    #[test]
    fn test_same_object_rejected() {
        let mut scene = MemoryScene::new();
        let a = placed(&mut scene, "a_1", Vec3::ZERO, vec![point(0.0, 0.5), point(0.1, 0.5)]);
        let conn = find_connections(&scene, &a, &a).remove(0);
        assert_eq!(create_snapped_group(&mut scene, &conn), Err(SnapError::SameObject));
    }

    #[test]
    fn test_best_connection_across_objects() {
        let mut scene = MemoryScene::new();
        let a = placed(&mut scene, "a_1", Vec3::ZERO, vec![point(0.0, 0.5)]);
        let far = placed(&mut scene, "b_1", Vec3::ZERO, vec![point(0.4, 0.5)]);
        let near = placed(&mut scene, "c_1", Vec3::ZERO, vec![point(0.1, 0.5)]);
        let best = best_connection(&scene, &a, &[a.clone(), far, near.clone()]).unwrap();
        assert_eq!(best.b.node, near);
    }
}
