//! Triangle mesh containers
//!
//! Meshes are created with their final capacities known (from import or
//! procedural generation), populated until full, then treated as immutable.
//! The spatial index is built over a complete mesh and resolves triangle
//! indices back through it at query time.

pub mod static_mesh;

// Re-export commonly used types
pub use static_mesh::{StaticMesh, Triangle, Vertex, VertexAttributes};
