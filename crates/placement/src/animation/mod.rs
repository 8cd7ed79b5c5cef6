pub mod drop;
pub mod easing;
pub mod engine;

pub use drop::{DropAnimation, DropCurve, DropFrame, DropPhase};
pub use engine::AnimationEngine;
