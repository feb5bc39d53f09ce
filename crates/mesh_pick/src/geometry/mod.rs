//! Geometric primitives and intersection algorithms
//!
//! Provides the building blocks of the spatial index: axis-aligned bounding
//! boxes, rays, and the ordered intersection-result type.
//!
//! # Module Organization
//!
//! - [`aabb`] - Axis-aligned bounding boxes with slab-test ray intersection
//! - [`ray`] - Rays with box and triangle intersection tests
//! - [`hit`] - Totally-ordered optional intersection results

pub mod aabb;
pub mod hit;
pub mod ray;

// Re-export commonly used types
pub use aabb::AABB;
pub use hit::RayIntersection;
pub use ray::Ray;
