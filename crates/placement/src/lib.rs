// Library crate: the placement core plus test doubles for integration tests.
// The binary only adds a scripted runner on top.

pub mod animation;
pub mod error;
pub mod fixtures;
pub mod harness;
pub mod host;
pub mod placement;
pub mod scene;
pub mod snap;
pub mod state;
pub mod viewport;

pub use error::{LoadError, PlacementError, SnapError};
pub use placement::{Collaborators, PlacementController, PlacementEvent};
