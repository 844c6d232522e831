//! Orbit camera controller
//!
//! Rotates, pans and zooms the camera around a target point. Mouse input is
//! accumulated into pending deltas and applied in [`OrbitController::update`],
//! which also re-aims the camera at the target. The controller does not own a
//! camera: the active camera is passed in on every call, so re-binding it to a
//! different camera is simply a matter of passing that camera next time.

use std::f32::consts::PI;

use winit::event::MouseButton;

use crate::core::camera::{Camera, Lens};
use crate::core::input::InputState;
use crate::core::types::Vec3;

const EPS: f32 = 1e-6;

/// Spherical coordinates around the target, y-up
#[derive(Clone, Copy, Debug, Default)]
struct Spherical {
    radius: f32,
    /// Polar angle from +Y
    phi: f32,
    /// Azimuth around +Y, measured from +Z
    theta: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vec3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

/// Orbit-style controller with mouse rotate/pan/zoom
pub struct OrbitController {
    /// Point the camera orbits around and looks at
    pub target: Vec3,
    /// Rotation speed multiplier
    pub rotate_speed: f32,
    /// Zoom speed multiplier
    pub zoom_speed: f32,
    /// Pan speed multiplier
    pub pan_speed: f32,
    /// Distance limits (perspective)
    pub min_distance: f32,
    pub max_distance: f32,
    /// Zoom limits (orthographic)
    pub min_zoom: f32,
    pub max_zoom: f32,
    spherical_delta: Spherical,
    scale: f32,
    pan_offset: Vec3,
    zoom_changed: bool,
}

impl OrbitController {
    /// Create new controller orbiting `target`
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_zoom: 0.0,
            max_zoom: f32::INFINITY,
            spherical_delta: Spherical::default(),
            scale: 1.0,
            pan_offset: Vec3::ZERO,
            zoom_changed: false,
        }
    }

    /// Move the orbit target
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Queue a rotation around the vertical axis
    pub fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.theta -= angle;
    }

    /// Queue a rotation towards/away from the pole
    pub fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.phi -= angle;
    }

    /// Queue a screen-space pan of `delta` pixels
    pub fn pan(&mut self, delta: (f32, f32), camera: &Camera, viewport: (u32, u32)) {
        let (width, height) = (viewport.0.max(1) as f32, viewport.1.max(1) as f32);
        let (dx, dy) = (delta.0 * self.pan_speed, delta.1 * self.pan_speed);

        match camera.lens {
            Lens::Perspective { fov_y, .. } => {
                let offset = camera.position - self.target;
                // Half the visible height at the target plane
                let target_distance = offset.length() * (fov_y / 2.0).tan();
                self.pan_offset -= camera.right() * (2.0 * dx * target_distance / height);
                self.pan_offset += camera.up() * (2.0 * dy * target_distance / height);
            }
            Lens::Orthographic { left, right, top, bottom, zoom } => {
                self.pan_offset -= camera.right() * (dx * (right - left) / zoom / width);
                self.pan_offset += camera.up() * (dy * (top - bottom) / zoom / height);
            }
        }
    }

    /// Queue a zoom step; positive `steps` zooms in
    pub fn dolly(&mut self, steps: f32, camera: &mut Camera) {
        if steps == 0.0 {
            return;
        }
        let dolly_scale = 0.95_f32.powf(self.zoom_speed * steps.abs());
        let factor = if steps > 0.0 { dolly_scale } else { 1.0 / dolly_scale };

        if camera.is_orthographic() {
            let zoom = (camera.zoom() / factor).clamp(self.min_zoom.max(EPS), self.max_zoom);
            camera.set_zoom(zoom);
            self.zoom_changed = true;
        } else {
            self.scale *= factor;
        }
    }

    /// Translate accumulated mouse input into pending rotate/pan/zoom deltas
    pub fn apply_input(&mut self, input: &InputState, camera: &mut Camera, viewport: (u32, u32)) {
        let height = viewport.1.max(1) as f32;
        let (dx, dy) = input.mouse_delta();

        if dx != 0.0 || dy != 0.0 {
            if input.is_mouse_button_pressed(MouseButton::Left) {
                self.rotate_left(2.0 * PI * dx / height * self.rotate_speed);
                self.rotate_up(2.0 * PI * dy / height * self.rotate_speed);
            } else if input.is_mouse_button_pressed(MouseButton::Right)
                || input.is_mouse_button_pressed(MouseButton::Middle)
            {
                self.pan((dx, dy), camera, viewport);
            }
        }

        let scroll = input.scroll_delta();
        if scroll != 0.0 {
            self.dolly(scroll, camera);
        }
    }

    /// Apply pending deltas to `camera` and aim it at the target
    ///
    /// Returns true if the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let before = camera.pose();

        let offset = camera.position - self.target;
        let mut spherical = Spherical::from_offset(offset);

        spherical.theta += self.spherical_delta.theta;
        spherical.phi += self.spherical_delta.phi;
        spherical.phi = spherical.phi.clamp(EPS, PI - EPS);

        if !camera.is_orthographic() {
            spherical.radius = (spherical.radius * self.scale)
                .clamp(self.min_distance, self.max_distance);
        }

        self.target += self.pan_offset;

        camera.position = self.target + spherical.to_offset();
        camera.look_at(self.target, Vec3::Y);

        self.spherical_delta = Spherical::default();
        self.scale = 1.0;
        self.pan_offset = Vec3::ZERO;

        let zoom_changed = std::mem::take(&mut self.zoom_changed);
        let after = camera.pose();
        zoom_changed
            || before.position.distance_squared(after.position) > EPS
            || before.rotation.dot(after.rotation).abs() < 1.0 - EPS
    }
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera_at(position: Vec3) -> Camera {
        let mut camera = Camera::perspective(position, 60.0, 1.0, 0.1, 100.0);
        camera.look_at(Vec3::ZERO, Vec3::Y);
        camera
    }

    #[test]
    fn test_update_without_input_keeps_position() {
        let mut camera = camera_at(Vec3::splat(5.0));
        let mut controller = OrbitController::default();
        controller.update(&mut camera);

        assert_relative_eq!(camera.position.x, 5.0, epsilon = 1e-4);
        assert_relative_eq!(camera.position.y, 5.0, epsilon = 1e-4);
        assert_relative_eq!(camera.position.z, 5.0, epsilon = 1e-4);
    }

    #[test]
    fn test_rotate_preserves_distance() {
        let mut camera = camera_at(Vec3::new(0.0, 0.0, 10.0));
        let mut controller = OrbitController::default();
        controller.rotate_left(PI / 2.0);
        assert!(controller.update(&mut camera));

        assert_relative_eq!(camera.position.length(), 10.0, epsilon = 1e-4);
        // Quarter turn moves the camera off the +Z axis
        assert!(camera.position.z.abs() < 1e-3);
    }

    #[test]
    fn test_dolly_in_reduces_distance() {
        let mut camera = camera_at(Vec3::new(0.0, 0.0, 10.0));
        let mut controller = OrbitController::default();
        controller.dolly(1.0, &mut camera);
        controller.update(&mut camera);
        assert!(camera.position.length() < 10.0);
    }

    #[test]
    fn test_dolly_orthographic_changes_zoom() {
        let mut camera = Camera::orthographic(Vec3::new(0.0, 0.0, 10.0), 10.0, 1.0, 0.1, 100.0);
        let mut controller = OrbitController::default();
        controller.dolly(1.0, &mut camera);
        assert!(controller.update(&mut camera));
        assert!(camera.zoom() > 1.0);
        assert_relative_eq!(camera.position.length(), 10.0, epsilon = 1e-4);
    }

    #[test]
    fn test_new_target_reaims_camera() {
        let mut camera = camera_at(Vec3::new(0.0, 0.0, 10.0));
        let mut controller = OrbitController::default();
        controller.set_target(Vec3::new(1.0, 0.0, 0.0));
        controller.update(&mut camera);

        let expected = (Vec3::new(1.0, 0.0, 0.0) - camera.position).normalize();
        assert_relative_eq!(camera.forward().dot(expected), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_pan_moves_target_and_camera() {
        let mut camera = camera_at(Vec3::new(0.0, 0.0, 10.0));
        let mut controller = OrbitController::default();
        controller.pan((100.0, 0.0), &camera, (800, 600));
        controller.update(&mut camera);

        // Dragging right moves the scene right, i.e. target to the left
        assert!(controller.target.x < 0.0);
        assert_relative_eq!(camera.position.x, controller.target.x, epsilon = 1e-4);
    }
}
