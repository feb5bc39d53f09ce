//! Loose octree over a static mesh's triangles
//!
//! Built once per mesh at load time, never mutated afterward. Each node
//! carries two boxes: a strict octant (`initial_box`) that decides triangle
//! ownership by centroid, and a loose box (`bounds`) stretched outward so a
//! triangle straddling a split plane can still live in a single child
//! instead of being dropped or duplicated. Triangles whose full extent fits
//! no child bubble up to the parent's own list.
//!
//! Queries traverse children in near-to-far entry order and skip any child
//! whose box cannot be entered before the best hit found so far.

use std::cmp::Ordering;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::foundation::math::Vec3;
use crate::geometry::{Ray, RayIntersection, AABB};
use crate::mesh::StaticMesh;

/// Maximum triangles per node before subdivision
pub const DEFAULT_NODE_CAPACITY: usize = 32;

/// How far a child's loose box grows past its octant, as a size ratio
pub const DEFAULT_STRETCH_RATIO: f32 = 1.2;

/// Fixed expansion of the root box past the mesh bounds, to tolerate
/// floating-point boundary triangles
pub const DEFAULT_ROOT_EPSILON: f32 = 1e-3;

/// Maximum subdivision depth (caps recursion on degenerate meshes)
pub const DEFAULT_MAX_DEPTH: u32 = 8;

/// Configuration for octree construction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OctreeConfig {
    /// Maximum triangles per node before subdivision
    pub node_capacity: usize,

    /// Loose-box stretch ratio; children grow by `(ratio - 1) x size` on
    /// their outward-facing axes only
    pub stretch_ratio: f32,

    /// Root box expansion past the mesh bounds, on every axis
    pub root_epsilon: f32,

    /// Maximum subdivision depth; a node at this depth keeps appending
    /// instead of subdividing
    pub max_depth: u32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            node_capacity: DEFAULT_NODE_CAPACITY,
            stretch_ratio: DEFAULT_STRETCH_RATIO,
            root_epsilon: DEFAULT_ROOT_EPSILON,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Why an octree build was rejected
///
/// A failed build is fatal for the mesh's pickability and is never retried;
/// the caller logs it and treats the mesh as present but never selectable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OctreeBuildError {
    /// The mesh has no vertices or no triangles
    #[error("mesh has no geometry to index")]
    EmptyMesh,

    /// The mesh is not populated up to its declared capacities
    #[error("mesh is under-populated: {vertices}/{vertex_capacity} vertices, {triangles}/{triangle_capacity} triangles")]
    IncompleteMesh {
        /// Vertices actually stored
        vertices: usize,
        /// Vertices declared at construction
        vertex_capacity: usize,
        /// Triangles actually stored
        triangles: usize,
        /// Triangles declared at construction
        triangle_capacity: usize,
    },

    /// A triangle's geometry lies outside the epsilon-expanded root box,
    /// which means the mesh bounds were not computed from its vertex data
    #[error("triangle {triangle} lies outside the expanded mesh bounds")]
    TriangleOutOfBounds {
        /// Index of the offending triangle
        triangle: u32,
    },
}

/// Counters filled in by [`MeshOctree::intersect_with_stats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryStats {
    /// Nodes entered during traversal, including pruned ones
    pub nodes_visited: usize,
    /// Ray/triangle tests performed
    pub triangles_tested: usize,
}

/// Leaf-or-internal state of a node
///
/// Both states keep an own triangle list: an internal node holds the
/// triangles none of its children would accept.
#[derive(Debug, Clone, PartialEq)]
enum NodeState {
    Leaf {
        triangles: Vec<u32>,
    },
    Internal {
        triangles: Vec<u32>,
        children: [u32; 8],
    },
}

impl NodeState {
    fn triangles(&self) -> &[u32] {
        match self {
            Self::Leaf { triangles } | Self::Internal { triangles, .. } => triangles,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct OctreeNode {
    /// Strict, non-overlapping octant; owns a triangle whose centroid falls
    /// inside it
    initial_box: AABB,
    /// Loose box used for full-extent and ray tests; grows only on the
    /// sides facing away from siblings
    bounds: AABB,
    depth: u32,
    state: NodeState,
}

impl OctreeNode {
    fn new(initial_box: AABB, bounds: AABB, depth: u32) -> Self {
        Self {
            initial_box,
            bounds,
            depth,
            state: NodeState::Leaf {
                triangles: Vec::new(),
            },
        }
    }

    /// A triangle is eligible here if its centroid is in the strict box and
    /// its full extent fits the loose box
    fn accepts(&self, centroid: Vec3, p0: Vec3, p1: Vec3, p2: Vec3) -> bool {
        self.initial_box.contains_point(centroid)
            && self.bounds.contains_point(p0)
            && self.bounds.contains_point(p1)
            && self.bounds.contains_point(p2)
    }
}

/// Spatial index over one mesh's triangles
///
/// Nodes live in an arena (`Vec`) addressed by index; children are index
/// arrays, so the tree is relocatable and strictly owned. The tree holds no
/// reference to its source mesh: the mesh is passed to every query, keeping
/// build/query a pure function over (tree, mesh, ray).
#[derive(Debug, Clone, PartialEq)]
pub struct MeshOctree {
    nodes: Vec<OctreeNode>,
    config: OctreeConfig,
}

impl MeshOctree {
    /// Build the index over a fully populated mesh
    ///
    /// # Errors
    ///
    /// Fails fast on an empty or under-populated mesh, or when any triangle
    /// falls outside the epsilon-expanded mesh bounds (a mesh whose
    /// precomputed bounds are tighter than its vertex extents).
    pub fn build(mesh: &StaticMesh, config: OctreeConfig) -> Result<Self, OctreeBuildError> {
        if mesh.vertex_count() == 0 || mesh.triangle_count() == 0 {
            return Err(OctreeBuildError::EmptyMesh);
        }
        if !mesh.is_complete() {
            return Err(OctreeBuildError::IncompleteMesh {
                vertices: mesh.vertex_count(),
                vertex_capacity: mesh.vertex_capacity(),
                triangles: mesh.triangle_count(),
                triangle_capacity: mesh.triangle_capacity(),
            });
        }

        // The root's strict and loose boxes coincide; only descendants get
        // asymmetric expansion.
        let root_box = mesh.bounds().expanded(config.root_epsilon);
        let mut tree = Self {
            nodes: vec![OctreeNode::new(root_box, root_box, 0)],
            config,
        };

        for triangle in 0..u32::try_from(mesh.triangle_count()).unwrap_or(u32::MAX) {
            let (p0, p1, p2) = mesh.triangle_positions(triangle);
            let centroid = (p0 + p1 + p2) / 3.0;
            if !tree.insert(0, mesh, triangle, p0, p1, p2, centroid) {
                return Err(OctreeBuildError::TriangleOutOfBounds { triangle });
            }
        }

        debug!(
            "octree built: {} nodes over {} triangles",
            tree.nodes.len(),
            mesh.triangle_count()
        );
        Ok(tree)
    }

    /// The configuration the tree was built with
    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Total number of nodes in the arena
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the root has subdivided at least once
    pub fn root_has_children(&self) -> bool {
        matches!(self.nodes[0].state, NodeState::Internal { .. })
    }

    /// Find the nearest triangle hit for a ray in this mesh's local space
    ///
    /// A miss is a first-class result (`t = infinity`), not an error. The
    /// tree is not mutated, so concurrent calls against the same tree are
    /// safe.
    #[must_use]
    pub fn intersect(&self, mesh: &StaticMesh, ray: &Ray) -> RayIntersection {
        let mut stats = QueryStats::default();
        self.intersect_with_stats(mesh, ray, &mut stats)
    }

    /// [`MeshOctree::intersect`] with traversal counters, for tuning and
    /// tests
    pub fn intersect_with_stats(
        &self,
        mesh: &StaticMesh,
        ray: &Ray,
        stats: &mut QueryStats,
    ) -> RayIntersection {
        self.intersect_node(0, mesh, ray, stats)
    }

    fn insert(
        &mut self,
        node: usize,
        mesh: &StaticMesh,
        triangle: u32,
        p0: Vec3,
        p1: Vec3,
        p2: Vec3,
        centroid: Vec3,
    ) -> bool {
        if !self.nodes[node].accepts(centroid, p0, p1, p2) {
            return false;
        }

        // A leaf with room (or one that may not subdivide further) just
        // appends.
        let at_depth_limit = self.nodes[node].depth >= self.config.max_depth;
        if let NodeState::Leaf { triangles } = &mut self.nodes[node].state {
            if triangles.len() < self.config.node_capacity || at_depth_limit {
                triangles.push(triangle);
                return true;
            }
        }

        let children = match self.children_of(node) {
            Some(children) => children,
            None => self.subdivide(node, mesh),
        };

        // First child that accepts it wins, in fixed index order.
        for child in children {
            if self.insert(child as usize, mesh, triangle, p0, p1, p2, centroid) {
                return true;
            }
        }

        // Straddles a split plane: it stays on this node's own list.
        match &mut self.nodes[node].state {
            NodeState::Leaf { triangles } | NodeState::Internal { triangles, .. } => {
                triangles.push(triangle);
            }
        }
        true
    }

    fn children_of(&self, node: usize) -> Option<[u32; 8]> {
        match &self.nodes[node].state {
            NodeState::Internal { children, .. } => Some(*children),
            NodeState::Leaf { .. } => None,
        }
    }

    /// Split a full leaf into 8 octants and hand its triangles down
    ///
    /// Octant bit layout: bit 0 = +X, bit 1 = +Y, bit 2 = +Z. Each child's
    /// loose box is its octant elongated by `(stretch_ratio - 1) x size`
    /// along the 1-3 axes that face away from the parent's center.
    fn subdivide(&mut self, node: usize, mesh: &StaticMesh) -> [u32; 8] {
        let initial = self.nodes[node].initial_box;
        let depth = self.nodes[node].depth;
        let center = initial.center();
        let stretch = self.config.stretch_ratio - 1.0;

        let mut children = [0u32; 8];
        for (octant, slot) in children.iter_mut().enumerate() {
            let positive = [octant & 1 != 0, octant & 2 != 0, octant & 4 != 0];

            let mut lo = initial.min;
            let mut hi = initial.max;
            for axis in 0..3 {
                if positive[axis] {
                    lo[axis] = center[axis];
                } else {
                    hi[axis] = center[axis];
                }
            }
            let octant_box = AABB::new(lo, hi);

            let mut loose = octant_box;
            let size = octant_box.size();
            for axis in 0..3 {
                let pad = stretch * size[axis];
                if positive[axis] {
                    loose.max[axis] += pad;
                } else {
                    loose.min[axis] -= pad;
                }
            }

            *slot = u32::try_from(self.nodes.len()).unwrap_or(u32::MAX);
            self.nodes.push(OctreeNode::new(octant_box, loose, depth + 1));
        }

        let held = match std::mem::replace(
            &mut self.nodes[node].state,
            NodeState::Internal {
                triangles: Vec::new(),
                children,
            },
        ) {
            NodeState::Leaf { triangles } | NodeState::Internal { triangles, .. } => triangles,
        };

        // Re-insert in original order; anything no child takes stays here.
        let mut kept = Vec::new();
        for triangle in held {
            let (p0, p1, p2) = mesh.triangle_positions(triangle);
            let centroid = (p0 + p1 + p2) / 3.0;
            let placed = children
                .iter()
                .any(|&child| self.insert(child as usize, mesh, triangle, p0, p1, p2, centroid));
            if !placed {
                kept.push(triangle);
            }
        }
        if let NodeState::Internal { triangles, .. } = &mut self.nodes[node].state {
            *triangles = kept;
        }

        children
    }

    fn intersect_node(
        &self,
        node: usize,
        mesh: &StaticMesh,
        ray: &Ray,
        stats: &mut QueryStats,
    ) -> RayIntersection {
        stats.nodes_visited += 1;

        let current = &self.nodes[node];
        if ray.intersect_aabb(&current.bounds).is_none() {
            return RayIntersection::miss();
        }

        // Own triangles first; keep strict improvements only, so the first
        // equal-distance hit wins.
        let mut best = RayIntersection::miss();
        for &triangle in current.state.triangles() {
            stats.triangles_tested += 1;
            let (p0, p1, p2) = mesh.triangle_positions(triangle);
            if let Some(t) = ray.intersect_triangle(p0, p1, p2) {
                if t < best.t {
                    best = RayIntersection::new(t, ray.point_at(t));
                }
            }
        }

        let children = match &current.state {
            NodeState::Internal { children, .. } => *children,
            NodeState::Leaf { .. } => return best,
        };

        // Entry distance per child: zero when the origin sits inside its
        // loose box (the plain slab test is ambiguous there), None on miss.
        let mut order = children.map(|child| {
            let bounds = &self.nodes[child as usize].bounds;
            let entry = if bounds.contains_point(ray.origin) {
                Some(0.0)
            } else {
                ray.intersect_aabb(bounds)
            };
            (child, entry)
        });
        order.sort_unstable_by(|a, b| match (a.1, b.1) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        for (child, entry) in order {
            // Sorted near-to-far: the first child that cannot beat the best
            // hit ends the walk.
            match entry {
                Some(entry) if entry < best.t => {
                    best = best.closer(self.intersect_node(child as usize, mesh, ray, stats));
                }
                _ => break,
            }
        }

        best
    }
}
