//! Integration tests for snapping placed objects into groups.

use std::collections::HashSet;

use floor_placement_lib::fixtures;
use floor_placement_lib::harness::TestHarness;
use floor_placement_lib::scene::SceneGraph;
use floor_placement_lib::state::PlacementSettings;
use floor_placement_lib::{PlacementError, PlacementEvent, SnapError};
use glam::Vec3;

fn manual_snap_settings() -> PlacementSettings {
    let mut settings = PlacementSettings::default();
    settings.snap.auto_snap = false;
    settings
}

fn snapped_groups(events: &[PlacementEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            PlacementEvent::Snapped { group, .. } => Some(group.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_adjacent_drop_snaps_into_group() {
    let mut h = TestHarness::new();
    let a = h.place_settled("chair.glb", 0.0, 0.0).await.unwrap();
    let b = h.place_settled("chair.glb", 1.05, 0.0).await.unwrap();

    let groups = snapped_groups(&h.events());
    assert_eq!(groups.len(), 1);
    let group = &groups[0];

    let scene = h.controller.scene();
    assert_eq!(scene.parent(&a).as_ref(), Some(group));
    assert_eq!(scene.parent(&b).as_ref(), Some(group));
    assert_eq!(scene.parent(group), fixtures::target_of(scene));
    assert!(scene.metadata(group).unwrap().is_snapped_group);
    assert_eq!(scene.metadata(group).unwrap().group_id, "chair");

    // reparenting keeps both chairs where they landed
    let pa = h.world_position(&a).unwrap();
    let pb = h.world_position(&b).unwrap();
    assert!(pa.distance(Vec3::ZERO) < 1e-5);
    assert!(pb.distance(Vec3::new(1.05, 0.0, 0.0)) < 1e-5);

    // the facing points are consumed
    let used = |node: &str| -> Vec<String> {
        scene
            .metadata(&node.to_string())
            .unwrap()
            .snap_points
            .iter()
            .filter(|p| p.is_used)
            .map(|p| p.label.clone())
            .collect()
    };
    assert_eq!(used(a.as_str()), vec!["right".to_string()]);
    assert_eq!(used(b.as_str()), vec!["left".to_string()]);
}

#[tokio::test]
async fn test_distant_objects_stay_apart() {
    let mut h = TestHarness::new();
    let a = h.place_settled("chair.glb", -2.0, 0.0).await.unwrap();
    let b = h.place_settled("chair.glb", 2.0, 0.0).await.unwrap();

    assert!(snapped_groups(&h.events()).is_empty());
    let container = fixtures::target_of(h.controller.scene());
    assert_eq!(h.controller.scene().parent(&a), container);
    assert_eq!(h.controller.scene().parent(&b), container);
    assert!(h.controller.snap_candidates(&a).is_empty());
}

#[tokio::test]
async fn test_snap_diameter_sets_attraction_radius() {
    // faces 0.5 apart: out of reach with the default diameter
    let mut h = TestHarness::new();
    h.place_settled("chair.glb", 0.0, 0.0).await.unwrap();
    h.place_settled("chair.glb", 1.5, 0.0).await.unwrap();
    assert!(snapped_groups(&h.events()).is_empty());

    let mut settings = PlacementSettings::default();
    settings.snap.diameter = 0.5;
    let mut h = TestHarness::with_scene(fixtures::floor_scene(), settings);
    let a = h.place_settled("chair.glb", 0.0, 0.0).await.unwrap();
    let points = &h.controller.scene().metadata(&a).unwrap().snap_points;
    assert!(points.iter().all(|p| p.attraction_radius == 1.0));

    let b = h.place_settled("chair.glb", 1.5, 0.0).await.unwrap();
    let groups = snapped_groups(&h.events());
    assert_eq!(groups.len(), 1);
    assert_eq!(h.controller.scene().parent(&b), Some(groups[0].clone()));
}

#[tokio::test]
async fn test_third_object_joins_existing_group() {
    let mut h = TestHarness::new();
    let a = h.place_settled("chair.glb", 0.0, 0.0).await.unwrap();
    let b = h.place_settled("chair.glb", 1.05, 0.0).await.unwrap();
    let c = h.place_settled("chair.glb", 2.1, 0.0).await.unwrap();

    let groups = snapped_groups(&h.events());
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0], groups[1]);

    let scene = h.controller.scene();
    let group = &groups[0];
    let members: HashSet<String> = scene.children(group).into_iter().collect();
    assert_eq!(members, HashSet::from([a, b, c]));
}

#[tokio::test]
async fn test_manual_snap_from_candidates() {
    let mut h = TestHarness::with_scene(fixtures::floor_scene(), manual_snap_settings());
    let a = h.place_settled("chair.glb", 0.0, 0.0).await.unwrap();
    let b = h.place_settled("chair.glb", 0.0, 1.1).await.unwrap();
    assert!(snapped_groups(&h.events()).is_empty());

    let candidates = h.controller.snap_candidates(&b);
    assert!(!candidates.is_empty());
    let best = candidates[0].clone();
    assert!((best.distance - 0.1).abs() < 1e-4);
    assert_eq!(best.a.node, b);
    assert_eq!(best.b.node, a);
    assert!(candidates.windows(2).all(|w| w[0].distance <= w[1].distance));

    let group = h.controller.snap(&best).unwrap();
    assert_eq!(h.controller.scene().parent(&a), Some(group.clone()));

    // the same connection cannot be committed twice
    assert_eq!(
        h.controller.snap(&best),
        Err(PlacementError::Snap(SnapError::PointUsed {
            node: b.clone(),
            index: best.a.index,
        }))
    );
}

#[tokio::test]
async fn test_drag_release_snaps_to_neighbour() {
    let mut h = TestHarness::new();
    let a = h.place_settled("chair.glb", -3.0, 0.0).await.unwrap();
    let b = h.place_settled("chair.glb", 3.0, 0.0).await.unwrap();
    assert!(snapped_groups(&h.events()).is_empty());

    h.click(3.0, 0.0);
    h.wait(500.0);
    // bring b's left side next to a's right side
    h.drag((3.0, 0.0), (-1.9, 0.0));

    let groups = snapped_groups(&h.events());
    assert_eq!(groups.len(), 1);
    assert_eq!(h.controller.scene().parent(&a), Some(groups[0].clone()));
    assert_eq!(h.controller.scene().parent(&b), Some(groups[0].clone()));
}

#[tokio::test]
async fn test_clicking_member_selects_whole_group() {
    let mut h = TestHarness::new();
    h.place_settled("chair.glb", 0.0, 0.0).await.unwrap();
    h.place_settled("chair.glb", 1.05, 0.0).await.unwrap();
    let group = snapped_groups(&h.events()).remove(0);

    h.click(1.05, 0.0);

    assert_eq!(h.controller.selected(), &[group]);
    let outlined: HashSet<String> = h.outline.current().into_iter().collect();
    assert_eq!(outlined, HashSet::from(["chair-mesh".to_string()]));
    assert_eq!(h.outline.current().len(), 2);
}

#[tokio::test]
async fn test_snapshot_reports_used_points() {
    let mut h = TestHarness::new();
    let a = h.place_settled("chair.glb", 0.0, 0.0).await.unwrap();
    h.place_settled("chair.glb", 1.05, 0.0).await.unwrap();

    let snapshot = h.snapshot();
    let object = snapshot.object(&a).unwrap();
    assert_eq!(object.snap_points, 4);
    assert_eq!(object.snap_points_used, 1);
    assert!(snapshot.objects.iter().any(|o| o.snapped_group));
}
