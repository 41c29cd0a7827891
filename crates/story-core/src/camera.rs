//! # Camera Adjustment
//!
//! The viewer rebuilds a camera from `{position, target, up, fov}` by scaling
//! the eye distance with a field-of-view factor. Captured cameras do not carry
//! that factor, so exported positions are pre-scaled by its inverse.

use glam::DVec3;
use story_schema::{CameraData, CameraMode};

/// Distance-scaling factor the viewer applies for a given projection.
pub fn fov_factor(mode: CameraMode, fov: f64) -> f64 {
    match mode {
        CameraMode::Orthographic => 1.0 / (2.0 * (fov / 2.0).tan()),
        CameraMode::Perspective => 1.0 / (2.0 * (fov / 2.0).sin()),
    }
}

/// Returns the position to export so the viewer reproduces the captured view.
/// Target and up vectors are used unchanged.
pub fn adjust_camera_for_export(camera: &CameraData) -> [f64; 3] {
    let position = DVec3::from_array(camera.position);
    let target = DVec3::from_array(camera.target);
    let delta = position - target;
    let f = fov_factor(camera.mode, camera.fov);

    (target + delta * (1.0 / f)).to_array()
}
