//! Camera rays, floor picking and the floor cursor

pub mod camera;
pub mod cursor;
pub mod picking;
