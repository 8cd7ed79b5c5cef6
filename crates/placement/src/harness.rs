//! Headless test harness for driving a placement session.
//!
//! Every host collaborator has a recording double here. Doubles share their
//! state through `Rc` so the harness can still inspect them after handing
//! boxed copies to the controller.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::future::{ready, Future};
use std::rc::Rc;

use glam::{Vec2, Vec3};
use shared::{MeshRef, NodeId, PlacementOptions};

use crate::error::{LoadError, Result};
use crate::fixtures;
use crate::host::{
    AssetLoader, CameraControls, FrameScheduler, InputChannel, InputEvents, InputSensitivities, Listener,
    OutlineSink, RenderSink,
};
use crate::placement::{Collaborators, PlacementController, PlacementEvent, SessionSnapshot};
use crate::scene::{LoadedAsset, MemoryScene, ModelData};
use crate::state::PlacementSettings;
use crate::viewport::camera::{CameraRays, ViewRect};
use crate::viewport::picking::Ray;

/// Frame length the harness advances its clock by
pub const FRAME_MS: f64 = 16.0;

/// Render requests counter
#[derive(Clone, Default)]
pub struct RecordingRender {
    pub count: Rc<Cell<usize>>,
}

impl RenderSink for RecordingRender {
    fn request_render(&mut self) {
        self.count.set(self.count.get() + 1);
    }
}

/// Frame requests counter; the harness decides when frames actually run
#[derive(Clone, Default)]
pub struct ManualFrames {
    pub requested: Rc<Cell<usize>>,
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&mut self) {
        self.requested.set(self.requested.get() + 1);
    }
}

/// Every outline update, in order
#[derive(Clone, Default)]
pub struct RecordingOutline {
    pub calls: Rc<RefCell<Vec<Vec<MeshRef>>>>,
}

impl RecordingOutline {
    pub fn current(&self) -> Vec<MeshRef> {
        self.calls.borrow().last().cloned().unwrap_or_default()
    }
}

impl OutlineSink for RecordingOutline {
    fn set_outlined(&mut self, meshes: &[MeshRef]) {
        self.calls.borrow_mut().push(meshes.to_vec());
    }
}

#[derive(Clone)]
pub struct FakeControls {
    pub current: Rc<Cell<InputSensitivities>>,
}

impl Default for FakeControls {
    fn default() -> Self {
        Self {
            current: Rc::new(Cell::new(InputSensitivities::default())),
        }
    }
}

impl CameraControls for FakeControls {
    fn sensitivities(&self) -> InputSensitivities {
        self.current.get()
    }

    fn set_sensitivities(&mut self, sensitivities: InputSensitivities) {
        self.current.set(sensitivities);
    }
}

/// Active pointer subscriptions
#[derive(Clone, Default)]
pub struct RecordingInput {
    pub active: Rc<RefCell<HashSet<(Listener, InputChannel)>>>,
}

impl RecordingInput {
    pub fn is_listening(&self, listener: Listener, channel: InputChannel) -> bool {
        self.active.borrow().contains(&(listener, channel))
    }

    pub fn count(&self) -> usize {
        self.active.borrow().len()
    }
}

impl InputEvents for RecordingInput {
    fn listen(&mut self, listener: Listener, channel: InputChannel) {
        self.active.borrow_mut().insert((listener, channel));
    }

    fn unlisten(&mut self, listener: Listener, channel: InputChannel) {
        self.active.borrow_mut().remove(&(listener, channel));
    }
}

/// Camera straight above the origin; the element spans `±half_extent`
/// meters in X and Z
#[derive(Debug, Clone, Copy)]
pub struct TopDownCamera {
    pub half_extent: f32,
    pub height: f32,
}

impl Default for TopDownCamera {
    fn default() -> Self {
        Self {
            half_extent: 5.0,
            height: 10.0,
        }
    }
}

impl CameraRays for TopDownCamera {
    fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        Ray::new(
            Vec3::new(ndc.x * self.half_extent, self.height, -ndc.y * self.half_extent),
            Vec3::NEG_Y,
        )
    }

    fn project(&self, point: Vec3) -> Option<Vec3> {
        (point.y < self.height).then(|| {
            Vec3::new(
                point.x / self.half_extent,
                -point.z / self.half_extent,
                (self.height - point.y) / self.height,
            )
        })
    }
}

/// Loader serving in-memory models; unknown URLs fail
#[derive(Clone, Default)]
pub struct StaticLoader {
    models: HashMap<String, (String, ModelData)>,
    failures: HashMap<String, String>,
    pub requests: Rc<RefCell<Vec<String>>>,
}

impl StaticLoader {
    pub fn with_model(mut self, url: &str, name: &str, model: ModelData) -> Self {
        self.models.insert(url.to_string(), (name.to_string(), model));
        self
    }

    pub fn with_failure(mut self, url: &str, reason: &str) -> Self {
        self.failures.insert(url.to_string(), reason.to_string());
        self
    }
}

impl AssetLoader<ModelData> for StaticLoader {
    fn load_model(
        &self,
        url: &str,
        progress: &mut dyn FnMut(f32),
    ) -> impl Future<Output = std::result::Result<LoadedAsset<ModelData>, LoadError>> {
        self.requests.borrow_mut().push(url.to_string());
        let result = if let Some(reason) = self.failures.get(url) {
            Err(LoadError::new(url, reason.clone()))
        } else if let Some((name, model)) = self.models.get(url) {
            progress(0.5);
            progress(1.0);
            Ok(LoadedAsset {
                root: model.clone(),
                name: name.clone(),
            })
        } else {
            Err(LoadError::new(url, "not found"))
        };
        ready(result)
    }
}

/// Headless placement session with a top-down camera over a 100x100 px
/// element
pub struct TestHarness {
    pub controller: PlacementController<MemoryScene>,
    pub loader: StaticLoader,
    pub render: RecordingRender,
    pub frames: ManualFrames,
    pub outline: RecordingOutline,
    pub controls: FakeControls,
    pub input: RecordingInput,
    pub camera: TopDownCamera,
    pub rect: ViewRect,
    clock_ms: f64,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    /// Floor scene with a placement target and the standard models
    pub fn new() -> Self {
        Self::with_scene(fixtures::floor_scene(), PlacementSettings::default())
    }

    pub fn with_scene(scene: MemoryScene, settings: PlacementSettings) -> Self {
        let render = RecordingRender::default();
        let frames = ManualFrames::default();
        let outline = RecordingOutline::default();
        let controls = FakeControls::default();
        let input = RecordingInput::default();
        let camera = TopDownCamera::default();
        let rect = ViewRect {
            width: 100.0,
            height: 100.0,
        };

        let controller = PlacementController::new(
            scene,
            Collaborators {
                camera: Box::new(camera),
                render: Box::new(render.clone()),
                frames: Box::new(frames.clone()),
                outline: Box::new(outline.clone()),
                controls: Box::new(controls.clone()),
                input: Box::new(input.clone()),
            },
            rect,
            settings,
        );

        Self {
            controller,
            loader: fixtures::standard_loader(),
            render,
            frames,
            outline,
            controls,
            input,
            camera,
            rect,
            clock_ms: 0.0,
        }
    }

    // ── Placement ─────────────────────────────────────────────

    pub async fn place(&mut self, url: &str, options: PlacementOptions) -> Result<NodeId> {
        self.controller.place_object(&self.loader, url, options).await
    }

    /// Place `url` at world XZ with default options
    pub async fn place_at(&mut self, url: &str, x: f32, z: f32) -> Result<NodeId> {
        let options = PlacementOptions {
            position: Some([x, z]),
            ..Default::default()
        };
        self.place(url, options).await
    }

    /// Place and run frames until the drop has settled
    pub async fn place_settled(&mut self, url: &str, x: f32, z: f32) -> Result<NodeId> {
        let node = self.place_at(url, x, z).await?;
        self.run_until_idle();
        Ok(node)
    }

    // ── Frames ────────────────────────────────────────────────

    pub fn now(&self) -> f64 {
        self.clock_ms
    }

    /// Move the clock without running a frame
    pub fn wait(&mut self, ms: f64) {
        self.clock_ms += ms;
    }

    pub fn step(&mut self) {
        self.clock_ms += FRAME_MS;
        self.controller.tick(self.clock_ms);
    }

    /// Run frames until no drop is active. Returns the number of frames.
    pub fn run_until_idle(&mut self) -> usize {
        let mut frames = 0;
        while !self.controller.is_idle() && frames < 10_000 {
            self.step();
            frames += 1;
        }
        frames
    }

    // ── Pointer ───────────────────────────────────────────────

    /// Element pixel above world XZ
    pub fn pixel_at(&self, x: f32, z: f32) -> Vec2 {
        let ndc = Vec2::new(x / self.camera.half_extent, -z / self.camera.half_extent);
        self.rect.to_pixel(ndc)
    }

    /// Quick press and release at world XZ
    pub fn click(&mut self, x: f32, z: f32) {
        let pixel = self.pixel_at(x, z);
        self.controller.pointer_down(pixel, self.clock_ms);
        self.wait(50.0);
        self.controller.pointer_up(pixel, self.clock_ms);
    }

    /// Press at `from`, move to `to` over a few events, release slowly
    pub fn drag(&mut self, from: (f32, f32), to: (f32, f32)) {
        let start = self.pixel_at(from.0, from.1);
        let end = self.pixel_at(to.0, to.1);
        self.controller.pointer_down(start, self.clock_ms);
        for i in 1..=4 {
            self.wait(100.0);
            self.controller.pointer_move(start.lerp(end, i as f32 / 4.0));
        }
        self.controller.pointer_up(end, self.clock_ms);
    }

    // ── Inspection ────────────────────────────────────────────

    pub fn events(&mut self) -> Vec<PlacementEvent> {
        self.controller.drain_events()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.controller.inspect()
    }

    pub fn world_position(&self, node: &NodeId) -> Option<Vec3> {
        self.controller.scene().world_position(node)
    }

    pub fn sensitivities(&self) -> InputSensitivities {
        self.controls.current.get()
    }
}
