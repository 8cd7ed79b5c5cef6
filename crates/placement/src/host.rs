//! Collaborators supplied by the host element.
//!
//! Rendering, frame scheduling, asset loading, camera controls, pointer
//! subscriptions and selection highlighting all live outside the placement
//! core. Test doubles for each are in [`crate::harness`].

use std::future::Future;

use shared::MeshRef;

use crate::error::LoadError;
use crate::scene::LoadedAsset;
use crate::viewport::cursor::CursorKind;

/// Fire-and-forget render request; hosts may coalesce calls within a frame
pub trait RenderSink {
    fn request_render(&mut self);
}

/// Asks the host to call `tick` on the next animation frame
pub trait FrameScheduler {
    fn request_frame(&mut self);
}

/// Receives the meshes to highlight; an empty slice clears the outline
pub trait OutlineSink {
    fn set_outlined(&mut self, meshes: &[MeshRef]);
}

/// Camera input sensitivities saved during a drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputSensitivities {
    pub orbit: f32,
    pub zoom: f32,
    pub pan: f32,
}

impl InputSensitivities {
    pub const ZERO: InputSensitivities = InputSensitivities {
        orbit: 0.0,
        zoom: 0.0,
        pan: 0.0,
    };
}

impl Default for InputSensitivities {
    fn default() -> Self {
        Self {
            orbit: 1.0,
            zoom: 1.0,
            pan: 1.0,
        }
    }
}

pub trait CameraControls {
    fn sensitivities(&self) -> InputSensitivities;
    fn set_sensitivities(&mut self, sensitivities: InputSensitivities);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputChannel {
    PointerMove,
    DragOver,
    PointerUp,
    LostCapture,
}

/// Who owns a pointer subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listener {
    Cursor(CursorKind),
    Drag,
}

/// Pointer event source. Subscriptions are explicit: listeners subscribe
/// when they become interested and unsubscribe when they stop.
pub trait InputEvents {
    fn listen(&mut self, listener: Listener, channel: InputChannel);
    fn unlisten(&mut self, listener: Listener, channel: InputChannel);
}

/// Asynchronous model loader. `progress` receives values in [0, 1].
pub trait AssetLoader<M> {
    fn load_model(
        &self,
        url: &str,
        progress: &mut dyn FnMut(f32),
    ) -> impl Future<Output = Result<LoadedAsset<M>, LoadError>>;
}
