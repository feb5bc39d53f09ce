//! Ray intersection results
//!
//! A miss is not an error: the result type carries `t = infinity` for "no
//! hit" and orders misses after every real hit, so reducing many results to
//! the nearest one is a plain comparison.

use std::cmp::Ordering;

use crate::foundation::math::Vec3;

/// Result of a ray query, totally ordered by hit distance
///
/// `t` is the distance along the ray, infinite for a miss; `point` is the
/// hit position in the space the ray was expressed in (mesh-local for octree
/// queries) and meaningless for a miss.
#[derive(Debug, Clone, Copy)]
pub struct RayIntersection {
    /// Distance along the ray, `f32::INFINITY` for a miss
    pub t: f32,
    /// Hit position, valid only when [`RayIntersection::is_hit`] is true
    pub point: Vec3,
}

impl RayIntersection {
    /// Create a hit at distance `t` with the given position
    #[must_use]
    pub fn new(t: f32, point: Vec3) -> Self {
        Self { t, point }
    }

    /// The canonical miss value
    #[must_use]
    pub fn miss() -> Self {
        Self {
            t: f32::INFINITY,
            point: Vec3::zeros(),
        }
    }

    /// Whether this result is a real hit (finite distance)
    #[must_use]
    pub fn is_hit(&self) -> bool {
        self.t.is_finite()
    }

    /// Keep the nearer of two results, preferring `self` on ties
    #[must_use]
    pub fn closer(self, other: Self) -> Self {
        if other < self {
            other
        } else {
            self
        }
    }
}

impl Default for RayIntersection {
    fn default() -> Self {
        Self::miss()
    }
}

impl PartialEq for RayIntersection {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RayIntersection {}

impl PartialOrd for RayIntersection {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RayIntersection {
    fn cmp(&self, other: &Self) -> Ordering {
        // total_cmp keeps the order lawful even if a NaN distance sneaks in
        self.t.total_cmp(&other.t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miss_is_not_a_hit() {
        assert!(!RayIntersection::miss().is_hit());
        assert!(RayIntersection::new(0.0, Vec3::zeros()).is_hit());
    }

    #[test]
    fn test_order_by_distance() {
        let near = RayIntersection::new(1.0, Vec3::zeros());
        let far = RayIntersection::new(5.0, Vec3::zeros());

        assert!(near < far);
        assert!(far > near);
    }

    #[test]
    fn test_miss_sorts_last() {
        let hit = RayIntersection::new(1_000_000.0, Vec3::zeros());
        let miss = RayIntersection::miss();

        assert!(hit < miss);
        assert_eq!(hit.closer(miss).t, hit.t);
        assert_eq!(miss.closer(hit).t, hit.t);
    }

    #[test]
    fn test_closer_prefers_first_on_tie() {
        let a = RayIntersection::new(2.0, Vec3::new(1.0, 0.0, 0.0));
        let b = RayIntersection::new(2.0, Vec3::new(0.0, 1.0, 0.0));

        assert_eq!(a.closer(b).point, a.point);
    }
}
