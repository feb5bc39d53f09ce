//! Rays and ray intersection tests
//!
//! Provides the ray type used for picking queries, with intersection tests
//! against boxes and triangles. Each test yields a scalar distance along the
//! ray.

use super::aabb::AABB;
use crate::foundation::math::Vec3;

/// A ray for ray casting and picking
///
/// Fields are public so that space-transform code can rebuild a ray without
/// re-normalizing the direction; [`Ray::new`] normalizes for callers working
/// from raw input.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray
    pub origin: Vec3,
    /// The direction of the ray (should be normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    ///
    /// The direction is normalized.
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    #[must_use]
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Test intersection with an AABB
    ///
    /// Returns the entry distance on hit (zero when the origin is inside the
    /// box), `None` on a miss or when the box lies entirely behind the
    /// origin.
    #[must_use]
    pub fn intersect_aabb(&self, aabb: &AABB) -> Option<f32> {
        aabb.intersect_ray(self.origin, self.direction)
    }

    /// Möller-Trumbore ray-triangle intersection
    ///
    /// Non-culled: triangles of either winding order are hit. Returns the
    /// distance along the ray on hit; intersections behind the origin are
    /// rejected.
    ///
    /// See: "Fast, Minimum Storage Ray/Triangle Intersection" by Möller &
    /// Trumbore.
    #[must_use]
    pub fn intersect_triangle(&self, p0: Vec3, p1: Vec3, p2: Vec3) -> Option<f32> {
        const EPSILON: f32 = 0.000_001;

        let edge1 = p1 - p0;
        let edge2 = p2 - p0;

        let h = self.direction.cross(&edge2);
        let a = edge1.dot(&h);

        // Ray parallel to triangle?
        if a.abs() < EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = self.origin - p0;
        let u = f * s.dot(&h);

        // Hit outside triangle on u axis?
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = f * self.direction.dot(&q);

        // Hit outside triangle on v axis?
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(&q);

        if t >= 0.0 {
            Some(t)
        } else {
            None // Behind ray origin
        }
    }
}
