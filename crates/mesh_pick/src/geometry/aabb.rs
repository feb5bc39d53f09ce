//! Axis-aligned bounding boxes
//!
//! The AABB is the workhorse of the spatial index: octree nodes carry two of
//! them, meshes carry a precomputed one, and world-space culling transforms
//! them between coordinate frames.

use crate::foundation::math::{Mat4, Point3, Vec3};

/// Axis-Aligned Bounding Box for spatial queries
///
/// Consumers assume `min <= max` on every axis; constructors do not enforce
/// it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents
    #[must_use]
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Compute the bound of a point set, `None` for an empty set
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bounds = Self::new(first, first);
        for point in points {
            bounds.min = bounds.min.inf(&point);
            bounds.max = bounds.max.sup(&point);
        }
        Some(bounds)
    }

    /// Get the center of the AABB
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    #[must_use]
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Get the full size of the AABB
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Smallest box containing both boxes
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Grow the box by a fixed amount on every axis
    #[must_use]
    pub fn expanded(&self, amount: f32) -> Self {
        Self {
            min: self.min - Vec3::repeat(amount),
            max: self.max + Vec3::repeat(amount),
        }
    }

    /// Check if this AABB contains a point (inclusive on all axes)
    #[must_use]
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this AABB intersects another AABB
    #[must_use]
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Get the 8 corner points of the AABB
    #[must_use]
    pub fn corners(&self) -> [Vec3; 8] {
        [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ]
    }

    /// Transform the AABB by a matrix, returning the bound of the
    /// transformed corner set
    ///
    /// Transforming only `min` and `max` would be wrong under rotation,
    /// which can change which corner is extremal on each axis.
    #[must_use]
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let mut min = Vec3::repeat(f32::INFINITY);
        let mut max = Vec3::repeat(f32::NEG_INFINITY);

        for corner in self.corners() {
            let transformed = matrix.transform_point(&Point3::from(corner)).coords;
            min = min.inf(&transformed);
            max = max.sup(&transformed);
        }

        Self { min, max }
    }

    /// Test ray intersection with this AABB using the slab method
    ///
    /// Returns the distance to the entry point if the ray intersects, `None`
    /// otherwise. A ray starting inside the box reports an entry distance of
    /// zero.
    #[must_use]
    pub fn intersect_ray(&self, ray_origin: Vec3, ray_dir: Vec3) -> Option<f32> {
        let inv_dir = Vec3::new(
            if ray_dir.x != 0.0 { 1.0 / ray_dir.x } else { f32::INFINITY },
            if ray_dir.y != 0.0 { 1.0 / ray_dir.y } else { f32::INFINITY },
            if ray_dir.z != 0.0 { 1.0 / ray_dir.z } else { f32::INFINITY },
        );

        let t1 = (self.min.x - ray_origin.x) * inv_dir.x;
        let t2 = (self.max.x - ray_origin.x) * inv_dir.x;
        let t3 = (self.min.y - ray_origin.y) * inv_dir.y;
        let t4 = (self.max.y - ray_origin.y) * inv_dir.y;
        let t5 = (self.min.z - ray_origin.z) * inv_dir.z;
        let t6 = (self.max.z - ray_origin.z) * inv_dir.z;

        let tmin = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
        let tmax = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));

        // Ray intersects if tmax >= tmin and the box is not entirely behind
        if tmax >= tmin && tmax >= 0.0 {
            Some(tmin.max(0.0))
        } else {
            None
        }
    }
}
