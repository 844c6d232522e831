//! Screen-space picking for orbit focus
//!
//! A click becomes a ray from the active camera; the nearest voxel surface or
//! helper line along it is the new orbit target.

use glam::{Vec2, Vec3};

use crate::core::camera::Camera;
use crate::math::Ray;

use super::graph::SceneGraph;

/// Pixel coordinates to normalised device coordinates
///
/// `y` is flipped so that up is positive.
pub fn screen_to_ndc(screen_x: f32, screen_y: f32, width: f32, height: f32) -> Vec2 {
    Vec2::new(
        (screen_x / width) * 2.0 - 1.0,
        -(screen_y / height) * 2.0 + 1.0,
    )
}

/// World-space picking ray through `ndc`
///
/// Perspective rays start at the eye; orthographic rays start on the near
/// plane and run along the view direction.
pub fn camera_ray(camera: &Camera, ndc: Vec2) -> Ray {
    if camera.is_orthographic() {
        let origin = camera.unproject(ndc.extend(0.0));
        Ray::new(origin, camera.forward())
    } else {
        let through = camera.unproject(ndc.extend(0.5));
        Ray::through(camera.position, through)
    }
}

/// Nearest world-space point under the cursor, if anything rendered is hit
pub fn resolve_focus(
    screen_x: f32,
    screen_y: f32,
    width: u32,
    height: u32,
    camera: &Camera,
    scene: &SceneGraph,
) -> Option<Vec3> {
    if width == 0 || height == 0 {
        return None;
    }

    let ndc = screen_to_ndc(screen_x, screen_y, width as f32, height as f32);
    let ray = camera_ray(camera, ndc);
    let hit = scene.raycast(&ray).into_iter().next()?;

    log::debug!("Focus hit at {:?} ({:.3} from camera)", hit.point, hit.distance);
    Some(hit.point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::orbit_controller::OrbitController;
    use crate::render::batch::{InstanceBatcher, RenderMode};
    use crate::voxel::{Voxel, VoxelMap};

    fn scene_with(voxels: Vec<Voxel>) -> SceneGraph {
        let mut scene = SceneGraph::new();
        let map = VoxelMap::new(voxels, 1.0).unwrap();
        scene.apply_payload(InstanceBatcher::build(&map.deselect(), RenderMode::Raw));
        scene
    }

    fn looking_down_at(camera: &mut Camera, target: Vec3) {
        camera.position = target + Vec3::new(0.0, 10.0, 0.0);
        camera.look_at(target, Vec3::Z);
    }

    #[test]
    fn test_screen_to_ndc() {
        assert_eq!(screen_to_ndc(0.0, 0.0, 800.0, 600.0), Vec2::new(-1.0, 1.0));
        assert_eq!(screen_to_ndc(400.0, 300.0, 800.0, 600.0), Vec2::ZERO);
        assert_eq!(screen_to_ndc(800.0, 600.0, 800.0, 600.0), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_center_ray_follows_view_direction() {
        let mut camera = Camera::perspective(Vec3::ZERO, 60.0, 4.0 / 3.0, 0.1, 100.0);
        looking_down_at(&mut camera, Vec3::ZERO);
        let ray = camera_ray(&camera, Vec2::ZERO);
        assert!((ray.direction - -Vec3::Y).length() < 1e-4);

        let mut ortho = Camera::orthographic(Vec3::ZERO, 10.0, 4.0 / 3.0, 0.1, 100.0);
        looking_down_at(&mut ortho, Vec3::ZERO);
        let ray = camera_ray(&ortho, Vec2::new(0.5, 0.0));
        assert!((ray.direction - -Vec3::Y).length() < 1e-4);
        assert!(ray.origin.x.abs() > 1.0);
    }

    #[test]
    fn test_no_hit_leaves_target_unchanged() {
        let scene = SceneGraph::new();
        let mut camera = Camera::default();
        // Looking straight up, away from the grid and axes
        camera.position = Vec3::new(0.0, 10.0, 0.0);
        camera.look_at(Vec3::new(0.0, 20.0, 0.0), Vec3::Z);
        let mut controller = OrbitController::new(Vec3::new(1.0, 2.0, 3.0));

        if let Some(point) = resolve_focus(400.0, 300.0, 800, 600, &camera, &scene) {
            controller.set_target(point);
        }
        assert_eq!(controller.target, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_single_hit_sets_target_exactly() {
        // Map (0, -3, 2) becomes render (0, 2, 3) after alignment, off the
        // grid plane; top face at y = 2.5
        let scene = scene_with(vec![Voxel::new(0.0, -3.0, 2.0, [255, 255, 255])]);
        let mut camera = Camera::perspective(Vec3::ZERO, 60.0, 4.0 / 3.0, 0.1, 100.0);
        looking_down_at(&mut camera, Vec3::new(0.0, 0.0, 3.0));

        let point = resolve_focus(400.0, 300.0, 800, 600, &camera, &scene).expect("voxel under cursor");
        assert!((point - Vec3::new(0.0, 2.5, 3.0)).length() < 1e-3);

        let mut controller = OrbitController::default();
        controller.set_target(point);
        controller.update(&mut camera);
        assert_eq!(controller.target, point);
    }

    #[test]
    fn test_nearest_of_stacked_voxels() {
        let scene = scene_with(vec![
            Voxel::new(0.0, -3.0, 0.0, [0, 0, 0]),
            Voxel::new(0.0, -3.0, 3.0, [0, 0, 0]),
        ]);
        let mut camera = Camera::orthographic(Vec3::ZERO, 10.0, 1.0, 0.1, 100.0);
        looking_down_at(&mut camera, Vec3::new(0.0, 0.0, 3.0));

        let point = resolve_focus(50.0, 50.0, 100, 100, &camera, &scene).expect("hit");
        assert!((point.y - 3.5).abs() < 1e-3);
    }

    #[test]
    fn test_grid_under_cursor_is_a_focus_target() {
        // No map loaded: the grid lies flat in the y = 0 plane
        let scene = SceneGraph::new();
        let mut camera = Camera::perspective(Vec3::ZERO, 60.0, 4.0 / 3.0, 0.1, 100.0);
        looking_down_at(&mut camera, Vec3::new(1.0, 0.0, 1.0));

        let point = resolve_focus(400.0, 300.0, 800, 600, &camera, &scene).expect("grid under cursor");
        assert!((point - Vec3::new(1.0, 0.0, 1.0)).length() < 1e-3);
    }

    #[test]
    fn test_zero_sized_surface() {
        let scene = scene_with(vec![Voxel::new(0.0, 0.0, 0.0, [0, 0, 0])]);
        assert!(resolve_focus(0.0, 0.0, 0, 0, &Camera::default(), &scene).is_none());
    }
}
