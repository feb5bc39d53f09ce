//! Spatial partitioning structures
//!
//! Provides the per-mesh triangle octree used to answer "nearest triangle
//! hit for a ray expressed in this mesh's local space". Built once at load
//! time, read-only afterward.

pub mod octree;

// Re-export commonly used types
pub use octree::{MeshOctree, OctreeBuildError, OctreeConfig, QueryStats};
