//! Static mesh container
//!
//! A fixed-capacity, append-only store of vertices and indexed triangles,
//! plus the precomputed mesh-space bounds and the mesh/model transform pair
//! used to place a sub-mesh inside its owning model.

use bitflags::bitflags;

use crate::foundation::math::{Mat4, Vec2, Vec3};
use crate::geometry::AABB;

bitflags! {
    /// Which optional per-vertex attributes a mesh actually carries
    ///
    /// An absent attribute's vertex field holds zeros and must not be read.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct VertexAttributes: u32 {
        /// Per-vertex normals are present
        const NORMAL = 1 << 0;
        /// Per-vertex texture coordinates are present
        const TEX_COORD = 1 << 1;
        /// Per-vertex tangent/bitangent pairs are present
        const TANGENT_BITANGENT = 1 << 2;
    }
}

/// A single mesh vertex
///
/// Optional fields are only meaningful when the owning mesh's
/// [`VertexAttributes`] say so.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in mesh-local space
    pub position: Vec3,
    /// Normal vector (optional, see [`VertexAttributes::NORMAL`])
    pub normal: Vec3,
    /// Texture coordinates (optional, see [`VertexAttributes::TEX_COORD`])
    pub tex_coord: Vec2,
    /// Tangent vector (optional, see [`VertexAttributes::TANGENT_BITANGENT`])
    pub tangent: Vec3,
    /// Bitangent vector (optional, see [`VertexAttributes::TANGENT_BITANGENT`])
    pub bitangent: Vec3,
}

impl Vertex {
    /// Create a vertex carrying only a position
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            normal: Vec3::zeros(),
            tex_coord: Vec2::zeros(),
            tangent: Vec3::zeros(),
            bitangent: Vec3::zeros(),
        }
    }

    /// Create a vertex with position and normal
    #[must_use]
    pub fn with_normal(position: Vec3, normal: Vec3) -> Self {
        Self {
            normal,
            ..Self::from_position(position)
        }
    }
}

/// Three vertex indices into the owning mesh's vertex list
///
/// Indices are not bounds-checked on insertion; the only contract is
/// `index < vertex count` by the time the mesh is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    /// Vertex indices in declaration order
    pub indices: [u32; 3],
}

impl Triangle {
    /// Create a triangle from three vertex indices
    #[must_use]
    pub fn new(i0: u32, i1: u32, i2: u32) -> Self {
        Self {
            indices: [i0, i1, i2],
        }
    }
}

/// A fixed-capacity, append-only triangle mesh
///
/// Lifecycle: created with final vertex/triangle counts, populated until
/// full, then immutable for the rest of the program. The spatial index
/// refuses to build over a mesh that is not [complete](StaticMesh::is_complete).
#[derive(Debug, Clone)]
pub struct StaticMesh {
    vertices: Vec<Vertex>,
    triangles: Vec<Triangle>,
    vertex_capacity: usize,
    triangle_capacity: usize,
    attributes: VertexAttributes,
    bounds: AABB,
    mesh_to_model: Mat4,
    model_to_mesh: Mat4,
}

impl StaticMesh {
    /// Create an empty mesh with the given declared capacities
    ///
    /// Transforms default to identity; bounds default to a degenerate box at
    /// the origin until [`StaticMesh::recompute_bounds`] or
    /// [`StaticMesh::set_bounds`] is called.
    #[must_use]
    pub fn new(
        vertex_capacity: usize,
        triangle_capacity: usize,
        attributes: VertexAttributes,
    ) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_capacity),
            triangles: Vec::with_capacity(triangle_capacity),
            vertex_capacity,
            triangle_capacity,
            attributes,
            bounds: AABB::new(Vec3::zeros(), Vec3::zeros()),
            mesh_to_model: Mat4::identity(),
            model_to_mesh: Mat4::identity(),
        }
    }

    /// Append a vertex
    ///
    /// Returns false once the declared vertex capacity is reached; callers
    /// must check.
    pub fn add_vertex(&mut self, vertex: Vertex) -> bool {
        if self.vertices.len() >= self.vertex_capacity {
            return false;
        }
        self.vertices.push(vertex);
        true
    }

    /// Append a triangle
    ///
    /// Returns false once the declared triangle capacity is reached; callers
    /// must check.
    pub fn add_triangle(&mut self, triangle: Triangle) -> bool {
        if self.triangles.len() >= self.triangle_capacity {
            return false;
        }
        self.triangles.push(triangle);
        true
    }

    /// Whether both lists are filled to their declared capacity and non-empty
    pub fn is_complete(&self) -> bool {
        !self.vertices.is_empty()
            && !self.triangles.is_empty()
            && self.vertices.len() == self.vertex_capacity
            && self.triangles.len() == self.triangle_capacity
    }

    /// Number of vertices currently stored
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Vertex capacity declared at construction
    pub fn vertex_capacity(&self) -> usize {
        self.vertex_capacity
    }

    /// Triangle capacity declared at construction
    pub fn triangle_capacity(&self) -> usize {
        self.triangle_capacity
    }

    /// Number of triangles currently stored
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// All vertices
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// All triangles
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Which optional vertex attributes this mesh carries
    pub fn attributes(&self) -> VertexAttributes {
        self.attributes
    }

    /// Precomputed mesh-space bounds
    pub fn bounds(&self) -> &AABB {
        &self.bounds
    }

    /// Resolve a triangle index to its three vertex positions
    ///
    /// # Panics
    ///
    /// Panics if the triangle index or any of its vertex indices is out of
    /// range.
    #[must_use]
    pub fn triangle_positions(&self, triangle: u32) -> (Vec3, Vec3, Vec3) {
        let indices = self.triangles[triangle as usize].indices;
        (
            self.vertices[indices[0] as usize].position,
            self.vertices[indices[1] as usize].position,
            self.vertices[indices[2] as usize].position,
        )
    }

    /// Recompute the mesh-space bounds from the current vertex data
    ///
    /// Deriving the bounds from the same vertex data the index will read
    /// avoids the build-time failure mode where a separately computed AABB
    /// is slightly tighter than the actual vertex extents.
    pub fn recompute_bounds(&mut self) {
        if let Some(bounds) = AABB::from_points(self.vertices.iter().map(|v| v.position)) {
            self.bounds = bounds;
        }
    }

    /// Set precomputed mesh-space bounds supplied by an importer
    ///
    /// The bounds must be computed from the same vertex data with the same
    /// precision, or the spatial index build will reject triangles.
    pub fn set_bounds(&mut self, bounds: AABB) {
        self.bounds = bounds;
    }

    /// Set the mesh/model transform pair
    ///
    /// The two matrices must be exact inverses of each other; they are never
    /// re-derived at query time.
    pub fn set_transforms(&mut self, mesh_to_model: Mat4, model_to_mesh: Mat4) {
        self.mesh_to_model = mesh_to_model;
        self.model_to_mesh = model_to_mesh;
    }

    /// Mesh-space to model-space transform
    pub fn mesh_to_model(&self) -> &Mat4 {
        &self.mesh_to_model
    }

    /// Model-space to mesh-space transform
    pub fn model_to_mesh(&self) -> &Mat4 {
        &self.model_to_mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_mesh() -> StaticMesh {
        let mut mesh = StaticMesh::new(4, 2, VertexAttributes::empty());
        mesh.add_vertex(Vertex::from_position(Vec3::new(-1.0, -1.0, 0.0)));
        mesh.add_vertex(Vertex::from_position(Vec3::new(1.0, -1.0, 0.0)));
        mesh.add_vertex(Vertex::from_position(Vec3::new(1.0, 1.0, 0.0)));
        mesh.add_vertex(Vertex::from_position(Vec3::new(-1.0, 1.0, 0.0)));
        mesh.add_triangle(Triangle::new(0, 1, 2));
        mesh.add_triangle(Triangle::new(0, 2, 3));
        mesh
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut mesh = quad_mesh();

        assert!(!mesh.add_vertex(Vertex::from_position(Vec3::zeros())));
        assert!(!mesh.add_triangle(Triangle::new(0, 1, 3)));
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_is_complete() {
        let mut mesh = StaticMesh::new(4, 2, VertexAttributes::empty());
        assert!(!mesh.is_complete());

        mesh.add_vertex(Vertex::from_position(Vec3::zeros()));
        assert!(!mesh.is_complete());

        assert!(quad_mesh().is_complete());
    }

    #[test]
    fn test_recompute_bounds() {
        let mut mesh = quad_mesh();
        mesh.recompute_bounds();

        assert_eq!(mesh.bounds().min, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(mesh.bounds().max, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_triangle_positions() {
        let mesh = quad_mesh();
        let (p0, p1, p2) = mesh.triangle_positions(1);

        assert_eq!(p0, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(p1, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(p2, Vec3::new(-1.0, 1.0, 0.0));
    }

    #[test]
    fn test_vertex_with_normal() {
        let vertex = Vertex::with_normal(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));

        assert_eq!(vertex.position, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(vertex.normal, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(vertex.tex_coord, Vec2::zeros());
        assert_eq!(vertex.tangent, Vec3::zeros());
    }

    #[test]
    fn test_attribute_flags() {
        let mesh = StaticMesh::new(1, 1, VertexAttributes::NORMAL | VertexAttributes::TEX_COORD);

        assert!(mesh.attributes().contains(VertexAttributes::NORMAL));
        assert!(mesh.attributes().contains(VertexAttributes::TEX_COORD));
        assert!(!mesh.attributes().contains(VertexAttributes::TANGENT_BITANGENT));
    }
}
