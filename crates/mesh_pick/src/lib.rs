//! # Mesh Pick
//!
//! A static-mesh spatial index for ray intersection queries ("pick under
//! cursor", collision probes) built around a loose octree.
//!
//! ## Features
//!
//! - **Loose Octree**: per-mesh triangle index with near-to-far traversal
//!   and early termination
//! - **Mesh Container**: fixed-capacity, append-only triangle meshes with
//!   per-vertex attribute flags and mesh/model transform pairs
//! - **Multi-Space Picking**: world → model → mesh ray transforms with
//!   world-space hit reduction across many instances
//! - **Read-Only Queries**: a built index is immutable, so concurrent
//!   queries against the same tree are safe
//!
//! ## Quick Start
//!
//! ```
//! use mesh_pick::prelude::*;
//!
//! // A mesh is created with its final capacities, populated, then sealed.
//! let mut mesh = StaticMesh::new(3, 1, VertexAttributes::empty());
//! mesh.add_vertex(Vertex::from_position(Vec3::new(-1.0, -1.0, 0.0)));
//! mesh.add_vertex(Vertex::from_position(Vec3::new(1.0, -1.0, 0.0)));
//! mesh.add_vertex(Vertex::from_position(Vec3::new(0.0, 1.0, 0.0)));
//! mesh.add_triangle(Triangle::new(0, 1, 2));
//! mesh.recompute_bounds();
//!
//! // The index is built once, then queried with mesh-local rays.
//! let octree = MeshOctree::build(&mesh, OctreeConfig::default()).unwrap();
//! let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
//! let hit = octree.intersect(&mesh, &ray);
//! assert!(hit.is_hit());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod geometry;
pub mod mesh;
pub mod picking;
pub mod spatial;

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        foundation::math::{Mat4, Point3, Transform, Vec2, Vec3},
        geometry::{RayIntersection, Ray, AABB},
        mesh::{StaticMesh, Triangle, Vertex, VertexAttributes},
        picking::{pick_scene, InstanceHit, ModelInstance, PickHit, PickableMesh},
        spatial::{MeshOctree, OctreeBuildError, OctreeConfig, QueryStats},
    };
}
