//! Unit tests for the shared-scene coordinator.
//!
//! Covers event emission, selection consistency, viewport lifecycle, and
//! the coalescing render scheduler.

use super::*;
use crate::error::Error;
use crate::scene::MockViewport;
use glam::{Quat, Vec3};
use std::sync::{Arc, Mutex};

fn attrs(id: &str, x: f32) -> InstanceAttributes {
    InstanceAttributes::new(id, Vec3::new(x, 0.0, 0.0), Quat::IDENTITY, Vec3::ONE)
}

/// Subscribe one recording listener to every event kind.
fn record_all(scene: &mut SharedScene) -> Arc<Mutex<Vec<SceneEvent>>> {
    let log: Arc<Mutex<Vec<SceneEvent>>> = Arc::new(Mutex::new(Vec::new()));
    for kind in [
        EventKind::AddObject,
        EventKind::RemoveObject,
        EventKind::Select,
        EventKind::ClearData,
        EventKind::PointsChange,
        EventKind::RenderBefore,
        EventKind::RenderAfter,
    ] {
        let log = Arc::clone(&log);
        scene.on(kind, move |event| log.lock().unwrap().push(event.clone()));
    }
    log
}

fn events(log: &Arc<Mutex<Vec<SceneEvent>>>) -> Vec<SceneEvent> {
    log.lock().unwrap().clone()
}

// ============================================================================
// Object mutation and events
// ============================================================================

#[test]
fn test_add_object_emits_and_schedules() {
    let mut scene = SharedScene::with_capacity(4);
    let log = record_all(&mut scene);

    scene.add_object(&[attrs("a", 0.0), attrs("b", 1.0)]);

    assert_eq!(scene.boxes().instance_count(), 2);
    assert!(scene.is_render_scheduled());
    assert_eq!(
        events(&log),
        vec![SceneEvent::AddObject { ids: vec!["a".to_string(), "b".to_string()] }]
    );
}

#[test]
fn test_remove_object_emits_and_schedules() {
    let mut scene = SharedScene::with_capacity(4);
    scene.add_object(&[attrs("a", 0.0)]);
    let log = record_all(&mut scene);

    scene.remove_object(&["a"]);

    assert_eq!(scene.boxes().instance_count(), 0);
    assert_eq!(
        events(&log),
        vec![SceneEvent::RemoveObject { ids: vec!["a".to_string()] }]
    );
}

#[test]
fn test_remove_selected_object_reemits_select_first() {
    let mut scene = SharedScene::with_capacity(4);
    scene.add_object(&[attrs("a", 0.0), attrs("b", 1.0)]);
    scene.select_object(&["a", "b"]);
    let log = record_all(&mut scene);

    scene.remove_object(&["a"]);

    // Selection recomputes and re-emits before the removal notification
    assert_eq!(
        events(&log),
        vec![
            SceneEvent::Select { ids: vec!["b".to_string()] },
            SceneEvent::RemoveObject { ids: vec!["a".to_string()] },
        ]
    );
    assert_eq!(scene.selection(), ["b".to_string()]);
}

#[test]
fn test_remove_unselected_object_does_not_touch_selection() {
    let mut scene = SharedScene::with_capacity(4);
    scene.add_object(&[attrs("a", 0.0), attrs("b", 1.0)]);
    scene.select_object(&["b"]);
    let log = record_all(&mut scene);

    scene.remove_object(&["a"]);

    assert_eq!(scene.selection(), ["b".to_string()]);
    assert!(!events(&log).iter().any(|e| matches!(e, SceneEvent::Select { .. })));
}

#[test]
fn test_clear_data_clears_selection_then_pool() {
    let mut scene = SharedScene::with_capacity(4);
    scene.add_object(&[attrs("a", 0.0)]);
    scene.select_object(&["a"]);
    let log = record_all(&mut scene);

    scene.clear_data();

    assert_eq!(scene.boxes().instance_count(), 0);
    assert!(scene.selection().is_empty());
    assert_eq!(
        events(&log),
        vec![SceneEvent::Select { ids: vec![] }, SceneEvent::ClearData]
    );
    assert!(scene.is_render_scheduled());
}

// ============================================================================
// Selection
// ============================================================================

#[test]
fn test_select_replaces_wholesale() {
    let mut scene = SharedScene::with_capacity(4);
    scene.add_object(&[attrs("a", 0.0), attrs("b", 1.0), attrs("c", 2.0)]);

    scene.select_object(&["a", "b"]);
    scene.select_object(&["c"]);

    // Not additive: the second call replaced the first
    assert_eq!(scene.selection(), ["c".to_string()]);
}

#[test]
fn test_select_with_empty_list_clears() {
    let mut scene = SharedScene::with_capacity(4);
    scene.add_object(&[attrs("a", 0.0)]);
    scene.select_object(&["a"]);
    let log = record_all(&mut scene);

    scene.clear_selection();

    assert!(scene.selection().is_empty());
    assert_eq!(events(&log), vec![SceneEvent::Select { ids: vec![] }]);
}

#[test]
fn test_select_drops_unknown_ids_and_duplicates() {
    let mut scene = SharedScene::with_capacity(4);
    scene.add_object(&[attrs("a", 0.0)]);

    scene.select_object(&["ghost", "a", "a"]);

    assert_eq!(scene.selection(), ["a".to_string()]);
}

#[test]
fn test_select_by_id_resolves_through_pool() {
    let mut scene = SharedScene::with_capacity(4);
    scene.add_object(&[attrs("a", 0.0), attrs("b", 1.0)]);
    let log = record_all(&mut scene);

    scene.select_object_by_id(&["a", "vanished", "b"]);

    assert_eq!(scene.selection(), ["a".to_string(), "b".to_string()]);
    assert_eq!(
        events(&log),
        vec![SceneEvent::Select { ids: vec!["a".to_string(), "b".to_string()] }]
    );
}

#[test]
fn test_selection_does_not_schedule_render() {
    let mut scene = SharedScene::with_capacity(4);
    scene.add_object(&[attrs("a", 0.0)]);
    scene.run_frame();

    scene.select_object(&["a"]);
    assert!(!scene.is_render_scheduled());
}

// ============================================================================
// Render scheduling
// ============================================================================

#[test]
fn test_render_calls_coalesce_into_one_frame() {
    let mut scene = SharedScene::with_capacity(4);
    let log = record_all(&mut scene);

    for _ in 0..5 {
        scene.render();
    }

    assert!(scene.run_frame());
    assert!(!scene.run_frame());

    let frame_events: Vec<SceneEvent> = events(&log)
        .into_iter()
        .filter(|e| matches!(e, SceneEvent::RenderBefore | SceneEvent::RenderAfter))
        .collect();
    assert_eq!(frame_events, vec![SceneEvent::RenderBefore, SceneEvent::RenderAfter]);
}

#[test]
fn test_run_frame_without_schedule_is_noop() {
    let mut scene = SharedScene::with_capacity(4);
    let log = record_all(&mut scene);
    assert!(!scene.run_frame());
    assert!(events(&log).is_empty());
}

#[test]
fn test_frame_reflects_final_state_of_all_mutations() {
    let mut scene = SharedScene::with_capacity(4);
    let view = Arc::new(Mutex::new(MockViewport::new("main")));
    scene.add_view(view.clone());

    scene.add_object(&[attrs("a", 0.0)]);
    scene.add_object(&[attrs("b", 1.0)]);
    scene.remove_object(&["a"]);
    scene.run_frame();

    let view = view.lock().unwrap();
    // One pass, and it observed the final state (just "b")
    assert_eq!(view.render_count, 1);
    assert_eq!(view.seen_instance_counts, vec![1]);
}

#[test]
fn test_mutation_after_frame_schedules_again() {
    let mut scene = SharedScene::with_capacity(4);
    scene.add_object(&[attrs("a", 0.0)]);
    assert!(scene.run_frame());

    scene.add_object(&[attrs("b", 1.0)]);
    assert!(scene.is_render_scheduled());
    assert!(scene.run_frame());
}

// ============================================================================
// Viewports
// ============================================================================

#[test]
fn test_add_view_is_idempotent() {
    let mut scene = SharedScene::with_capacity(4);
    let view = Arc::new(Mutex::new(MockViewport::new("main")));

    scene.add_view(view.clone());
    scene.add_view(view.clone());

    assert_eq!(scene.view_count(), 1);
}

#[test]
fn test_remove_view_detaches_only_that_view() {
    let mut scene = SharedScene::with_capacity(4);
    let main = Arc::new(Mutex::new(MockViewport::new("main")));
    let top = Arc::new(Mutex::new(MockViewport::new("top")));
    scene.add_view(main.clone());
    scene.add_view(top.clone());

    let main_dyn: Arc<Mutex<dyn Viewport>> = main.clone();
    scene.remove_view(&main_dyn);
    assert_eq!(scene.view_count(), 1);

    // Removing an unattached view is a no-op
    scene.remove_view(&main_dyn);
    assert_eq!(scene.view_count(), 1);

    scene.render();
    scene.run_frame();
    assert_eq!(main.lock().unwrap().render_count, 0);
    assert_eq!(top.lock().unwrap().render_count, 1);
}

#[test]
fn test_fan_out_renders_every_view_once_per_frame() {
    let mut scene = SharedScene::with_capacity(4);
    let views: Vec<Arc<Mutex<MockViewport>>> = ["main", "top", "side", "rear"]
        .iter()
        .map(|name| Arc::new(Mutex::new(MockViewport::new(*name))))
        .collect();
    for view in &views {
        scene.add_view(view.clone());
    }

    scene.add_object(&[attrs("a", 0.0)]);
    scene.run_frame();

    for view in &views {
        assert_eq!(view.lock().unwrap().render_count, 1);
    }
}

// ============================================================================
// Point cloud
// ============================================================================

struct StubLoader;

impl PointCloudLoader for StubLoader {
    fn load(&self, _url: &str) -> crate::error::Result<PointCloudData> {
        Ok(PointCloudData {
            position: vec![1.0, 2.0, 3.0],
            ..Default::default()
        })
    }
}

struct FailingLoader;

impl PointCloudLoader for FailingLoader {
    fn load(&self, url: &str) -> crate::error::Result<PointCloudData> {
        Err(Error::LoadFailed(format!("unreachable: {}", url)))
    }
}

#[test]
fn test_set_point_cloud_funnels_points_change() {
    let mut scene = SharedScene::with_capacity(4);
    let log = record_all(&mut scene);

    scene.set_point_cloud(PointCloudData {
        position: vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
        ..Default::default()
    });

    assert_eq!(scene.point_cloud().point_count(), 2);
    assert_eq!(events(&log), vec![SceneEvent::PointsChange]);
    assert!(scene.is_render_scheduled());
}

#[test]
fn test_load_point_cloud_success_emits_and_schedules() {
    let mut scene = SharedScene::with_capacity(4);
    scene.set_point_cloud_loader(Box::new(StubLoader));
    let log = record_all(&mut scene);

    scene.load_point_cloud("cloud.pcd").unwrap();

    assert_eq!(scene.point_cloud().point_count(), 1);
    assert_eq!(events(&log), vec![SceneEvent::PointsChange]);
    assert!(scene.is_render_scheduled());
}

#[test]
fn test_load_point_cloud_failure_changes_nothing() {
    let mut scene = SharedScene::with_capacity(4);
    scene.set_point_cloud_loader(Box::new(FailingLoader));
    scene.add_object(&[attrs("a", 0.0)]);
    scene.run_frame();
    let log = record_all(&mut scene);

    let result = scene.load_point_cloud("gone.pcd");

    assert!(matches!(result, Err(Error::LoadFailed(_))));
    assert_eq!(scene.point_cloud().point_count(), 0);
    assert!(events(&log).is_empty());
    assert!(!scene.is_render_scheduled());
    assert_eq!(scene.boxes().instance_count(), 1);
}

// ============================================================================
// Disposal
// ============================================================================

#[test]
fn test_dispose_detaches_and_disposes_views() {
    let mut scene = SharedScene::with_capacity(4);
    let view = Arc::new(Mutex::new(MockViewport::new("main")));
    scene.add_view(view.clone());
    scene.select_object::<&str>(&[]);

    scene.dispose();

    assert_eq!(scene.view_count(), 0);
    assert!(scene.selection().is_empty());
    assert_eq!(view.lock().unwrap().dispose_count, 1);
}

#[test]
fn test_pending_frame_is_noop_after_dispose() {
    let mut scene = SharedScene::with_capacity(4);
    let view = Arc::new(Mutex::new(MockViewport::new("main")));
    scene.add_view(view.clone());
    scene.add_object(&[attrs("a", 0.0)]);
    assert!(scene.is_render_scheduled());

    scene.dispose();

    assert!(!scene.run_frame());
    assert_eq!(view.lock().unwrap().render_count, 0);
}

#[test]
fn test_dispose_twice_is_harmless() {
    let mut scene = SharedScene::with_capacity(4);
    let view = Arc::new(Mutex::new(MockViewport::new("main")));
    scene.add_view(view.clone());

    scene.dispose();
    scene.dispose();

    assert_eq!(view.lock().unwrap().dispose_count, 1);
}
