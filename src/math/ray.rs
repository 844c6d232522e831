//! Picking rays
//!
//! Focus picking casts one ray per click against voxel boxes (slab test) and
//! against the grid and axes helper lines (closest approach to a segment).

use crate::core::types::{Vec3, Mat4};
use super::aabb::Aabb;

/// A ray defined by origin and direction
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    /// Precomputed 1/direction for fast AABB intersection
    pub inv_direction: Vec3,
}

impl Ray {
    /// Create a new ray (direction should be normalized)
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            inv_direction: Vec3::new(
                1.0 / direction.x,
                1.0 / direction.y,
                1.0 / direction.z,
            ),
        }
    }

    /// Ray from `origin` through `through`
    pub fn through(origin: Vec3, through: Vec3) -> Self {
        Self::new(origin, (through - origin).normalize_or_zero())
    }

    /// Get point along ray at parameter t
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Ray-AABB intersection using slab method
    /// Returns Some((t_near, t_far)) if intersection, None otherwise
    pub fn intersects_aabb(&self, aabb: &Aabb) -> Option<(f32, f32)> {
        let t1 = (aabb.min - self.origin) * self.inv_direction;
        let t2 = (aabb.max - self.origin) * self.inv_direction;

        let t_min = t1.min(t2);
        let t_max = t1.max(t2);

        let t_near = t_min.x.max(t_min.y).max(t_min.z);
        let t_far = t_max.x.min(t_max.y).min(t_max.z);

        if t_near <= t_far && t_far >= 0.0 {
            Some((t_near.max(0.0), t_far))
        } else {
            None
        }
    }

    /// Closest approach between the ray and the segment `start..end`
    ///
    /// Returns the squared distance between the two closest points, the ray
    /// parameter of the point on the ray (never negative) and the point on
    /// the segment.
    pub fn closest_to_segment(&self, start: Vec3, end: Vec3) -> (f32, f32, Vec3) {
        let edge = end - start;
        let offset = self.origin - start;
        let len_sq = edge.length_squared();
        let along = self.direction.dot(self.direction);
        let c = self.direction.dot(offset);

        let (t, s) = if len_sq <= f32::EPSILON {
            ((-c / along).max(0.0), 0.0)
        } else {
            let b = self.direction.dot(edge);
            let f = edge.dot(offset);
            let denom = along * len_sq - b * b;
            let t = if denom > f32::EPSILON {
                ((b * f - c * len_sq) / denom).max(0.0)
            } else {
                0.0
            };
            let s = (b * t + f) / len_sq;
            if s < 0.0 {
                ((-c / along).max(0.0), 0.0)
            } else if s > 1.0 {
                (((b - c) / along).max(0.0), 1.0)
            } else {
                (t, s)
            }
        };

        let on_segment = start + edge * s;
        (self.at(t).distance_squared(on_segment), t, on_segment)
    }

    /// Transform ray by matrix
    pub fn transform(&self, matrix: &Mat4) -> Ray {
        let new_origin = matrix.transform_point3(self.origin);
        let new_direction = matrix.transform_vector3(self.direction).normalize();
        Ray::new(new_origin, new_direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(ray.at(5.0), Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_intersects_aabb_hit() {
        let ray = Ray::new(Vec3::new(-2.0, 0.5, 0.5), Vec3::X);
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let (t_near, t_far) = ray.intersects_aabb(&aabb).expect("ray should hit");
        assert!((t_near - 2.0).abs() < 0.001);
        assert!((t_far - 3.0).abs() < 0.001);
    }

    #[test]
    fn test_intersects_aabb_miss() {
        let ray = Ray::new(Vec3::new(-2.0, 5.0, 0.5), Vec3::X);
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert!(ray.intersects_aabb(&aabb).is_none());
    }

    #[test]
    fn test_intersects_aabb_behind() {
        let ray = Ray::new(Vec3::new(3.0, 0.5, 0.5), Vec3::X);
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert!(ray.intersects_aabb(&aabb).is_none());
    }

    #[test]
    fn test_closest_to_crossing_segment() {
        let ray = Ray::new(Vec3::new(0.5, 0.0, 10.0), -Vec3::Z);
        let (dist_sq, t, point) = ray.closest_to_segment(Vec3::new(-1.0, 0.3, 0.0), Vec3::new(1.0, 0.3, 0.0));
        assert!((dist_sq - 0.09).abs() < 1e-5);
        assert!((t - 10.0).abs() < 1e-5);
        assert!((point - Vec3::new(0.5, 0.3, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_closest_to_segment_clamps_to_endpoints() {
        // Parallel, ray pointing at the segment's far end
        let ray = Ray::new(Vec3::new(0.0, 10.0, 0.0), -Vec3::Y);
        let (dist_sq, t, point) = ray.closest_to_segment(Vec3::new(0.0, -5.0, 0.0), Vec3::new(0.0, 5.0, 0.0));
        assert!(dist_sq < 1e-6);
        assert_eq!(point, Vec3::new(0.0, 5.0, 0.0));
        assert!((t - 5.0).abs() < 1e-5);

        // Segment behind the origin
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let (dist_sq, t, point) = ray.closest_to_segment(Vec3::new(-3.0, 1.0, 0.0), Vec3::new(-2.0, 1.0, 0.0));
        assert_eq!(t, 0.0);
        assert_eq!(point, Vec3::new(-2.0, 1.0, 0.0));
        assert!((dist_sq - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_through_and_transform() {
        let ray = Ray::through(Vec3::ZERO, Vec3::new(0.0, 0.0, -4.0));
        assert_eq!(ray.direction, -Vec3::Z);

        let moved = ray.transform(&Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(moved.origin, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(moved.direction, -Vec3::Z);
    }
}
