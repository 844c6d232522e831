//! Dual-projection camera rig
//!
//! Keeps a perspective and an orthographic camera alive for the whole session.
//! Only one is active at a time; switching copies the outgoing camera's pose
//! onto the incoming one, so the user's viewpoint never jumps.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::camera::{Camera, CameraPose};
use crate::core::error::Error;
use crate::core::orbit_controller::OrbitController;
use crate::core::types::{Result, Vec3};

/// Which camera projection is active
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    #[default]
    Perspective,
    Orthographic,
}

impl Projection {
    /// The other projection
    pub fn toggled(self) -> Self {
        match self {
            Projection::Perspective => Projection::Orthographic,
            Projection::Orthographic => Projection::Perspective,
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Projection::Perspective => write!(f, "perspective"),
            Projection::Orthographic => write!(f, "orthographic"),
        }
    }
}

impl FromStr for Projection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "perspective" | "persp" => Ok(Projection::Perspective),
            "orthographic" | "ortho" => Ok(Projection::Orthographic),
            _ => Err(Error::InvalidProjectionMode(s.to_string())),
        }
    }
}

/// Camera rig parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraRigConfig {
    /// Perspective vertical field of view in degrees
    pub fov_y_degrees: f32,
    /// Orthographic frustum height in world units
    pub frustum_size: f32,
    pub near: f32,
    pub far: f32,
    /// Initial position of both cameras
    pub initial_position: [f32; 3],
}

impl Default for CameraRigConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 60.0,
            frustum_size: 10.0,
            near: 0.1,
            far: 100.0,
            initial_position: [5.0, 5.0, 5.0],
        }
    }
}

/// Two cameras sharing one logical pose
pub struct CameraRig {
    perspective: Camera,
    orthographic: Camera,
    mode: Projection,
    frustum_size: f32,
    surface_size: (u32, u32),
}

impl CameraRig {
    /// Build both cameras for a surface of `width` x `height` pixels
    pub fn new(config: &CameraRigConfig, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let aspect = width as f32 / height as f32;
        let position = Vec3::from_array(config.initial_position);

        let perspective = Camera::perspective(position, config.fov_y_degrees, aspect, config.near, config.far);
        let orthographic = Camera::orthographic(position, config.frustum_size, aspect, config.near, config.far);

        Self {
            perspective,
            orthographic,
            mode: Projection::default(),
            frustum_size: config.frustum_size,
            surface_size: (width, height),
        }
    }

    /// Active projection
    pub fn mode(&self) -> Projection {
        self.mode
    }

    /// The camera used for rendering and picking
    pub fn active(&self) -> &Camera {
        match self.mode {
            Projection::Perspective => &self.perspective,
            Projection::Orthographic => &self.orthographic,
        }
    }

    /// Mutable access to the active camera
    pub fn active_mut(&mut self) -> &mut Camera {
        match self.mode {
            Projection::Perspective => &mut self.perspective,
            Projection::Orthographic => &mut self.orthographic,
        }
    }

    /// The perspective camera, active or not
    pub fn perspective(&self) -> &Camera {
        &self.perspective
    }

    /// The orthographic camera, active or not
    pub fn orthographic(&self) -> &Camera {
        &self.orthographic
    }

    /// The shared logical pose (that of the active camera)
    pub fn pose(&self) -> CameraPose {
        self.active().pose()
    }

    /// Output surface size in pixels
    pub fn surface_size(&self) -> (u32, u32) {
        self.surface_size
    }

    /// Orthographic frustum height
    pub fn frustum_size(&self) -> f32 {
        self.frustum_size
    }

    /// Refresh both projections for a new surface size
    pub fn resize(&mut self, aspect: f32, size: (u32, u32)) {
        self.perspective.set_aspect(aspect);
        self.orthographic.set_frustum(self.frustum_size, aspect);
        self.surface_size = (size.0.max(1), size.1.max(1));
    }

    /// Switch projection, carrying the pose over to the incoming camera
    ///
    /// The controller is re-aimed at the incoming camera. Returns false when
    /// `mode` was already active.
    pub fn set_projection(&mut self, mode: Projection, controller: &mut OrbitController) -> bool {
        if mode == self.mode {
            return false;
        }

        let pose = self.active().pose();
        self.mode = mode;
        self.active_mut().set_pose(pose);
        controller.update(self.active_mut());

        log::debug!("Camera projection switched to {}", mode);
        true
    }

    /// Switch projection from a textual mode name
    ///
    /// Unknown names leave the active camera untouched.
    pub fn set_projection_named(&mut self, mode: &str, controller: &mut OrbitController) -> Result<bool> {
        let mode = mode.parse::<Projection>()?;
        Ok(self.set_projection(mode, controller))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_pose_eq(a: CameraPose, b: CameraPose) {
        assert_relative_eq!(a.position.x, b.position.x, epsilon = 1e-4);
        assert_relative_eq!(a.position.y, b.position.y, epsilon = 1e-4);
        assert_relative_eq!(a.position.z, b.position.z, epsilon = 1e-4);
        // q and -q encode the same rotation
        assert_relative_eq!(a.rotation.dot(b.rotation).abs(), 1.0, epsilon = 1e-5);
    }

    fn rig() -> (CameraRig, OrbitController) {
        let mut rig = CameraRig::new(&CameraRigConfig::default(), 800, 600);
        let mut controller = OrbitController::default();
        controller.update(rig.active_mut());
        (rig, controller)
    }

    #[test]
    fn test_initial_state_is_perspective() {
        let (rig, _) = rig();
        assert_eq!(rig.mode(), Projection::Perspective);
        assert!(!rig.active().is_orthographic());
    }

    #[test]
    fn test_switch_preserves_pose() {
        let (mut rig, mut controller) = rig();
        let before = rig.pose();
        assert_relative_eq!(before.position.x, 5.0, epsilon = 1e-4);

        assert!(rig.set_projection(Projection::Orthographic, &mut controller));
        assert!(rig.active().is_orthographic());
        assert_pose_eq(rig.orthographic().pose(), before);

        assert!(rig.set_projection(Projection::Perspective, &mut controller));
        assert_pose_eq(rig.perspective().pose(), before);
    }

    #[test]
    fn test_switch_after_orbit_keeps_user_view() {
        let (mut rig, mut controller) = rig();
        controller.rotate_left(0.7);
        controller.rotate_up(0.2);
        controller.update(rig.active_mut());
        let moved = rig.pose();

        rig.set_projection(Projection::Orthographic, &mut controller);
        assert_pose_eq(rig.pose(), moved);
    }

    #[test]
    fn test_same_mode_is_noop() {
        let (mut rig, mut controller) = rig();
        assert!(!rig.set_projection(Projection::Perspective, &mut controller));
        assert_eq!(rig.mode(), Projection::Perspective);
    }

    #[test]
    fn test_invalid_mode_leaves_state() {
        let (mut rig, mut controller) = rig();
        let before = rig.pose();
        let err = rig.set_projection_named("fisheye", &mut controller).unwrap_err();
        assert!(matches!(err, Error::InvalidProjectionMode(ref m) if m == "fisheye"));
        assert_eq!(rig.mode(), Projection::Perspective);
        assert_pose_eq(rig.pose(), before);
    }

    #[test]
    fn test_named_modes_parse() {
        assert_eq!("ORTHOGRAPHIC".parse::<Projection>().unwrap(), Projection::Orthographic);
        assert_eq!(" perspective ".parse::<Projection>().unwrap(), Projection::Perspective);
        assert_eq!(Projection::Perspective.toggled(), Projection::Orthographic);
    }

    #[test]
    fn test_resize_updates_both_projections() {
        let (mut rig, _) = rig();
        let persp_before = rig.perspective().projection_matrix();
        let ortho_before = rig.orthographic().projection_matrix();

        rig.resize(2.0, (1200, 600));
        assert_eq!(rig.surface_size(), (1200, 600));
        assert_ne!(rig.perspective().projection_matrix(), persp_before);
        assert_ne!(rig.orthographic().projection_matrix(), ortho_before);

        match rig.orthographic().lens {
            crate::core::camera::Lens::Orthographic { left, right, top, bottom, .. } => {
                assert_eq!((left, right, top, bottom), (-10.0, 10.0, 5.0, -5.0));
            }
            _ => panic!("expected orthographic lens"),
        }
    }
}
