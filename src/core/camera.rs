//! Camera for 3D rendering

use crate::core::types::{Vec3, Mat3, Mat4, Quat};

/// Position and orientation of a camera, independent of its projection
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    /// World position
    pub position: Vec3,
    /// Rotation as quaternion
    pub rotation: Quat,
}

/// Projection parameters of a camera
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Lens {
    Perspective {
        /// Vertical field of view in radians
        fov_y: f32,
        /// Aspect ratio (width / height)
        aspect: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
        /// Zoom factor applied around the frustum center
        zoom: f32,
    },
}

/// Camera with position, rotation, and projection parameters
///
/// The projection matrix is cached; call [`Camera::update_projection_matrix`]
/// after editing the lens or clip planes.
#[derive(Clone, Debug)]
pub struct Camera {
    /// World position
    pub position: Vec3,
    /// Rotation as quaternion
    pub rotation: Quat,
    /// Projection parameters
    pub lens: Lens,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
    projection: Mat4,
}

impl Camera {
    /// Create a perspective camera
    pub fn perspective(position: Vec3, fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position,
            rotation: Quat::IDENTITY,
            lens: Lens::Perspective {
                fov_y: fov_y_degrees.to_radians(),
                aspect,
            },
            near,
            far,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    /// Create an orthographic camera whose frustum is `frustum_size` tall
    pub fn orthographic(position: Vec3, frustum_size: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position,
            rotation: Quat::IDENTITY,
            lens: Lens::Orthographic {
                left: 0.0,
                right: 0.0,
                top: 0.0,
                bottom: 0.0,
                zoom: 1.0,
            },
            near,
            far,
            projection: Mat4::IDENTITY,
        };
        camera.set_frustum(frustum_size, aspect);
        camera
    }

    /// Current pose
    pub fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.position,
            rotation: self.rotation,
        }
    }

    /// Overwrite position and rotation
    pub fn set_pose(&mut self, pose: CameraPose) {
        self.position = pose.position;
        self.rotation = pose.rotation;
    }

    /// Rotate the camera so it faces `target`
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let to_target = target - self.position;
        if to_target.length_squared() < 1e-12 {
            return;
        }
        let forward = to_target.normalize();
        let mut right = forward.cross(up);
        if right.length_squared() < 1e-12 {
            // Looking straight along `up`; nudge the reference axis
            right = forward.cross(Vec3::Z + Vec3::X * 1e-4);
        }
        let right = right.normalize();
        let up = right.cross(forward);

        self.rotation = Quat::from_mat3(&Mat3::from_cols(right, up, -forward)).normalize();
    }

    /// Whether this camera uses an orthographic lens
    pub fn is_orthographic(&self) -> bool {
        matches!(self.lens, Lens::Orthographic { .. })
    }

    /// Get view matrix (world to camera space)
    pub fn view_matrix(&self) -> Mat4 {
        let rotation_matrix = Mat4::from_quat(self.rotation.conjugate());
        let translation_matrix = Mat4::from_translation(-self.position);
        rotation_matrix * translation_matrix
    }

    /// Get the cached projection matrix (camera to clip space)
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// Recompute the cached projection matrix from the lens
    pub fn update_projection_matrix(&mut self) {
        self.projection = match self.lens {
            Lens::Perspective { fov_y, aspect } => {
                Mat4::perspective_rh(fov_y, aspect, self.near, self.far)
            }
            Lens::Orthographic { left, right, top, bottom, zoom } => {
                let dx = (right - left) / (2.0 * zoom);
                let dy = (top - bottom) / (2.0 * zoom);
                let cx = (right + left) / 2.0;
                let cy = (top + bottom) / 2.0;
                Mat4::orthographic_rh(cx - dx, cx + dx, cy - dy, cy + dy, self.near, self.far)
            }
        };
    }

    /// Get combined view-projection matrix
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Get inverse view-projection matrix (for ray generation)
    pub fn view_projection_inverse(&self) -> Mat4 {
        self.view_projection().inverse()
    }

    /// Map a normalized device coordinate (depth 0..1) back to world space
    pub fn unproject(&self, ndc: Vec3) -> Vec3 {
        self.view_projection_inverse().project_point3(ndc)
    }

    /// Get forward direction (negative Z in camera space)
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }

    /// Get right direction (positive X in camera space)
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Get up direction (positive Y in camera space)
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Update aspect ratio of a perspective lens
    pub fn set_aspect(&mut self, aspect: f32) {
        if let Lens::Perspective { aspect: a, .. } = &mut self.lens {
            *a = aspect;
        }
        self.update_projection_matrix();
    }

    /// Recompute the edges of an orthographic lens
    pub fn set_frustum(&mut self, frustum_size: f32, aspect: f32) {
        if let Lens::Orthographic { left, right, top, bottom, .. } = &mut self.lens {
            *left = frustum_size * aspect / -2.0;
            *right = frustum_size * aspect / 2.0;
            *top = frustum_size / 2.0;
            *bottom = frustum_size / -2.0;
        }
        self.update_projection_matrix();
    }

    /// Orthographic zoom, 1.0 for perspective lenses
    pub fn zoom(&self) -> f32 {
        match self.lens {
            Lens::Orthographic { zoom, .. } => zoom,
            Lens::Perspective { .. } => 1.0,
        }
    }

    /// Set orthographic zoom (ignored for perspective lenses)
    pub fn set_zoom(&mut self, value: f32) {
        if let Lens::Orthographic { zoom, .. } = &mut self.lens {
            *zoom = value;
        }
        self.update_projection_matrix();
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(Vec3::new(0.0, 0.0, 5.0), 60.0, 16.0 / 9.0, 0.1, 100.0)
    }
}
