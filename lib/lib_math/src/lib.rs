pub use glam::*;

mod frustum;
mod packing;
pub use frustum::*;
pub use packing::*;

/// Rotates `vec` by `angle` radians around `axis`. `axis` need not be normalized.
pub fn rotate_around_axis(vec: Vec3, axis: Vec3, angle: f32) -> Vec3 {
    Quat::from_axis_angle(axis.normalize(), angle) * vec
}
