//! Multi-space picking protocol
//!
//! Bridges world-space rays and mesh-local octree queries. A ray is carried
//! world → instance/model → mesh space, the index is queried there, and the
//! hit is carried back out to world space. The hit distance is recomputed
//! from world-space positions, never reused from mesh space, because the
//! space transforms are not generally distance-preserving.
//!
//! Reduction across the meshes of an instance, and across the instances of
//! a scene, is a linear scan keeping the smallest world-space distance;
//! ties go to the first result found.

use log::warn;

use crate::foundation::math::{Mat4, Point3, Transform, Vec3};
use crate::geometry::{Ray, AABB};
use crate::mesh::StaticMesh;
use crate::spatial::{MeshOctree, OctreeConfig};

/// Transform a ray into another coordinate frame
///
/// The origin is transformed as a point (w = 1), the direction as a vector
/// (w = 0). The direction is deliberately not re-normalized: under scale the
/// returned ray's `t` values are in transformed units, and callers that need
/// world distances recompute them from positions.
#[must_use]
pub fn transform_ray(ray: &Ray, matrix: &Mat4) -> Ray {
    Ray {
        origin: matrix.transform_point(&Point3::from(ray.origin)).coords,
        direction: matrix.transform_vector(&ray.direction),
    }
}

/// A mesh bundled with its spatial index
///
/// When the index build fails the mesh stays present but is never
/// selectable; the failure is logged once and not retried.
#[derive(Debug, Clone)]
pub struct PickableMesh {
    mesh: StaticMesh,
    octree: Option<MeshOctree>,
}

impl PickableMesh {
    /// Build the index for a populated mesh
    #[must_use]
    pub fn new(mesh: StaticMesh, config: OctreeConfig) -> Self {
        let octree = match MeshOctree::build(&mesh, config) {
            Ok(tree) => Some(tree),
            Err(err) => {
                warn!("mesh index build failed, mesh will not be pickable: {err}");
                None
            }
        };
        Self { mesh, octree }
    }

    /// The underlying mesh
    pub fn mesh(&self) -> &StaticMesh {
        &self.mesh
    }

    /// The spatial index, if the build succeeded
    pub fn octree(&self) -> Option<&MeshOctree> {
        self.octree.as_ref()
    }

    /// Whether ray queries can ever hit this mesh
    pub fn is_pickable(&self) -> bool {
        self.octree.is_some()
    }
}

/// Nearest hit among one instance's meshes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceHit {
    /// Index of the hit mesh within the instance
    pub mesh: usize,
    /// World-space distance from the query ray's origin
    pub distance: f32,
    /// World-space hit position
    pub point: Vec3,
}

/// Nearest hit across a whole scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    /// Index of the hit instance in the scanned slice
    pub instance: usize,
    /// Index of the hit mesh within that instance
    pub mesh: usize,
    /// World-space distance from the query ray's origin
    pub distance: f32,
    /// World-space hit position
    pub point: Vec3,
}

/// One placed model: a world transform pair plus its pickable meshes
#[derive(Debug, Clone)]
pub struct ModelInstance {
    model_to_world: Mat4,
    world_to_model: Mat4,
    meshes: Vec<PickableMesh>,
}

impl ModelInstance {
    /// Create an instance from a position/rotation/scale transform
    ///
    /// The world-to-model matrix is the inverse of the composed matrix, not
    /// of the components: under a rotation a non-uniform scale inverts to a
    /// shear, which no position/rotation/scale triple can express.
    #[must_use]
    pub fn from_transform(transform: &Transform) -> Self {
        let model_to_world = transform.to_matrix();
        let world_to_model = model_to_world.try_inverse().unwrap_or_else(|| {
            warn!("instance transform is singular, world-to-model falls back to identity");
            Mat4::identity()
        });
        Self::from_matrices(model_to_world, world_to_model)
    }

    /// Create an instance from an explicit matrix pair
    ///
    /// The matrices must be exact inverses of each other.
    #[must_use]
    pub fn from_matrices(model_to_world: Mat4, world_to_model: Mat4) -> Self {
        Self {
            model_to_world,
            world_to_model,
            meshes: Vec::new(),
        }
    }

    /// Add a mesh, building its index; returns the mesh's index within the
    /// instance
    pub fn add_mesh(&mut self, mesh: StaticMesh, config: OctreeConfig) -> usize {
        self.meshes.push(PickableMesh::new(mesh, config));
        self.meshes.len() - 1
    }

    /// The instance's meshes
    pub fn meshes(&self) -> &[PickableMesh] {
        &self.meshes
    }

    /// Model-space to world-space transform
    pub fn model_to_world(&self) -> &Mat4 {
        &self.model_to_world
    }

    /// World-space bounds of one mesh of this instance
    ///
    /// The mesh-space box is carried through the mesh and instance
    /// transforms corner-by-corner, so rotation is handled correctly.
    #[must_use]
    pub fn world_bounds(&self, mesh_index: usize) -> AABB {
        let mesh = &self.meshes[mesh_index].mesh;
        mesh.bounds()
            .transformed(mesh.mesh_to_model())
            .transformed(&self.model_to_world)
    }

    /// World-space bounds of the whole instance, `None` when it has no
    /// meshes
    #[must_use]
    pub fn combined_world_bounds(&self) -> Option<AABB> {
        (0..self.meshes.len())
            .map(|index| self.world_bounds(index))
            .reduce(|a, b| a.union(&b))
    }

    /// Test a world-space ray against one mesh of this instance
    ///
    /// Returns the world-space distance and hit position, or `None` on a
    /// miss or when the mesh has no index.
    #[must_use]
    pub fn pick_mesh(&self, mesh_index: usize, world_ray: &Ray) -> Option<(f32, Vec3)> {
        let pickable = &self.meshes[mesh_index];
        let octree = pickable.octree.as_ref()?;

        // World → model → mesh space, query, then back out again.
        let model_ray = transform_ray(world_ray, &self.world_to_model);
        let mesh_ray = transform_ray(&model_ray, pickable.mesh.model_to_mesh());

        let local = octree.intersect(&pickable.mesh, &mesh_ray);
        if !local.is_hit() {
            return None;
        }

        let model_point = pickable
            .mesh
            .mesh_to_model()
            .transform_point(&Point3::from(local.point));
        let world_point = self.model_to_world.transform_point(&model_point).coords;

        // Mesh-local t is in transformed units; the reported distance is
        // measured in world space from the original ray origin.
        let distance = (world_point - world_ray.origin).norm();
        Some((distance, world_point))
    }

    /// Find the nearest hit among all of this instance's meshes
    #[must_use]
    pub fn pick(&self, world_ray: &Ray) -> Option<InstanceHit> {
        let mut best: Option<InstanceHit> = None;
        for mesh_index in 0..self.meshes.len() {
            if let Some((distance, point)) = self.pick_mesh(mesh_index, world_ray) {
                if best.map_or(true, |hit| distance < hit.distance) {
                    best = Some(InstanceHit {
                        mesh: mesh_index,
                        distance,
                        point,
                    });
                }
            }
        }
        best
    }
}

/// Find the nearest hit across many instances
///
/// Linear scan keeping the globally smallest world-space distance; on a tie
/// the first instance visited wins.
#[must_use]
pub fn pick_scene(instances: &[ModelInstance], world_ray: &Ray) -> Option<PickHit> {
    let mut best: Option<PickHit> = None;
    for (instance_index, instance) in instances.iter().enumerate() {
        if let Some(hit) = instance.pick(world_ray) {
            if best.map_or(true, |b| hit.distance < b.distance) {
                best = Some(PickHit {
                    instance: instance_index,
                    mesh: hit.mesh,
                    distance: hit.distance,
                    point: hit.point,
                });
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Quat;
    use crate::mesh::{Triangle, Vertex, VertexAttributes};
    use approx::assert_relative_eq;

    /// Unit cube centered at the mesh-space origin
    fn unit_cube() -> StaticMesh {
        let corners: [[f32; 3]; 8] = [
            [-0.5, -0.5, -0.5],
            [0.5, -0.5, -0.5],
            [0.5, 0.5, -0.5],
            [-0.5, 0.5, -0.5],
            [-0.5, -0.5, 0.5],
            [0.5, -0.5, 0.5],
            [0.5, 0.5, 0.5],
            [-0.5, 0.5, 0.5],
        ];
        let faces: [[u32; 3]; 12] = [
            [0, 1, 2], [0, 2, 3],
            [4, 5, 6], [4, 6, 7],
            [0, 1, 5], [0, 5, 4],
            [3, 2, 6], [3, 6, 7],
            [0, 3, 7], [0, 7, 4],
            [1, 2, 6], [1, 6, 5],
        ];

        let mut mesh = StaticMesh::new(8, 12, VertexAttributes::empty());
        for corner in corners {
            mesh.add_vertex(Vertex::from_position(Vec3::new(corner[0], corner[1], corner[2])));
        }
        for face in faces {
            mesh.add_triangle(Triangle::new(face[0], face[1], face[2]));
        }
        mesh.recompute_bounds();
        mesh
    }

    fn cube_instance(transform: &Transform) -> ModelInstance {
        let mut instance = ModelInstance::from_transform(transform);
        instance.add_mesh(unit_cube(), OctreeConfig::default());
        instance
    }

    #[test]
    fn test_pick_translated_instance() {
        let instance = cube_instance(&Transform::from_position(Vec3::new(0.0, 0.0, 10.0)));
        let ray = Ray::new(Vec3::zeros(), Vec3::new(0.0, 0.0, 1.0));

        let hit = instance.pick(&ray).unwrap();

        assert_eq!(hit.mesh, 0);
        assert_relative_eq!(hit.distance, 9.5);
        assert_relative_eq!(hit.point, Vec3::new(0.0, 0.0, 9.5));
    }

    #[test]
    fn test_pick_scaled_instance_recomputes_distance() {
        // Uniform scale 2: the cube's face sits at world z = -1, and the
        // mesh-local t would be in half-length units. The reported distance
        // must be the world-space 4.0.
        let transform = Transform {
            scale: Vec3::new(2.0, 2.0, 2.0),
            ..Transform::identity()
        };
        let instance = cube_instance(&transform);
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));

        let hit = instance.pick(&ray).unwrap();

        assert_relative_eq!(hit.distance, 4.0, epsilon = 1e-5);
        assert_relative_eq!(hit.point, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_pick_nonuniform_scaled_rotated_instance() {
        // Scale 3x along the model's X axis, then rotate 90 degrees around
        // Y: the stretched axis ends up along world Z, so the world-to-model
        // inverse cannot be decomposed axis-by-axis. The cube's world box is
        // x,y in [-0.5, 0.5], z in [-1.5, 1.5].
        let transform = Transform {
            rotation: Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2),
            scale: Vec3::new(3.0, 1.0, 1.0),
            ..Transform::identity()
        };
        let instance = cube_instance(&transform);
        let ray = Ray::new(Vec3::new(-5.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0));

        let hit = instance.pick(&ray).unwrap();

        assert_relative_eq!(hit.distance, 4.5, epsilon = 1e-4);
        assert_relative_eq!(hit.point, Vec3::new(-0.5, 0.0, 1.0), epsilon = 1e-4);
    }

    #[test]
    fn test_pick_through_mesh_transform() {
        // The sub-mesh is placed at model-space x = 5 via its own
        // mesh-to-model pair.
        let mut mesh = unit_cube();
        mesh.set_transforms(
            Mat4::new_translation(&Vec3::new(5.0, 0.0, 0.0)),
            Mat4::new_translation(&Vec3::new(-5.0, 0.0, 0.0)),
        );
        let mut instance = ModelInstance::from_transform(&Transform::identity());
        instance.add_mesh(mesh, OctreeConfig::default());

        let ray = Ray::new(Vec3::new(5.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let hit = instance.pick(&ray).unwrap();

        assert_relative_eq!(hit.distance, 4.5);
        assert_relative_eq!(hit.point, Vec3::new(5.0, 0.0, -0.5));
    }

    #[test]
    fn test_world_bounds_follow_both_transforms() {
        let mut mesh = unit_cube();
        mesh.set_transforms(
            Mat4::new_translation(&Vec3::new(5.0, 0.0, 0.0)),
            Mat4::new_translation(&Vec3::new(-5.0, 0.0, 0.0)),
        );
        let mut instance =
            ModelInstance::from_transform(&Transform::from_position(Vec3::new(0.0, 1.0, 0.0)));
        instance.add_mesh(mesh, OctreeConfig::default());

        let bounds = instance.world_bounds(0);
        assert_relative_eq!(bounds.min, Vec3::new(4.5, 0.5, -0.5));
        assert_relative_eq!(bounds.max, Vec3::new(5.5, 1.5, 0.5));
    }

    #[test]
    fn test_combined_world_bounds_cover_every_mesh() {
        let mut instance =
            ModelInstance::from_transform(&Transform::from_position(Vec3::new(0.0, 1.0, 0.0)));
        instance.add_mesh(unit_cube(), OctreeConfig::default());
        let mut offset = unit_cube();
        offset.set_transforms(
            Mat4::new_translation(&Vec3::new(5.0, 0.0, 0.0)),
            Mat4::new_translation(&Vec3::new(-5.0, 0.0, 0.0)),
        );
        instance.add_mesh(offset, OctreeConfig::default());

        let bounds = instance.combined_world_bounds().unwrap();
        assert_relative_eq!(bounds.min, Vec3::new(-0.5, 0.5, -0.5));
        assert_relative_eq!(bounds.max, Vec3::new(5.5, 1.5, 0.5));

        let empty = ModelInstance::from_transform(&Transform::identity());
        assert!(empty.combined_world_bounds().is_none());
    }

    #[test]
    fn test_unbuildable_mesh_is_never_selectable() {
        let mut instance = ModelInstance::from_transform(&Transform::identity());
        let hollow = StaticMesh::new(8, 12, VertexAttributes::empty());
        instance.add_mesh(hollow, OctreeConfig::default());

        assert!(!instance.meshes()[0].is_pickable());

        let ray = Ray::new(Vec3::zeros(), Vec3::new(0.0, 0.0, 1.0));
        assert!(instance.pick(&ray).is_none());
    }

    #[test]
    fn test_scene_reduction_keeps_nearest() {
        let near = cube_instance(&Transform::from_position(Vec3::new(0.0, 0.0, 10.0)));
        let far = cube_instance(&Transform::from_position(Vec3::new(0.0, 0.0, 20.0)));
        let scene = [far, near];

        let ray = Ray::new(Vec3::zeros(), Vec3::new(0.0, 0.0, 1.0));
        let hit = pick_scene(&scene, &ray).unwrap();

        assert_eq!(hit.instance, 1);
        assert_relative_eq!(hit.distance, 9.5);
    }

    #[test]
    fn test_scene_tie_goes_to_first_instance() {
        let a = cube_instance(&Transform::from_position(Vec3::new(0.0, 0.0, 10.0)));
        let b = cube_instance(&Transform::from_position(Vec3::new(0.0, 0.0, 10.0)));
        let scene = [a, b];

        let ray = Ray::new(Vec3::zeros(), Vec3::new(0.0, 0.0, 1.0));
        let hit = pick_scene(&scene, &ray).unwrap();

        assert_eq!(hit.instance, 0);
    }

    #[test]
    fn test_scene_miss() {
        let scene = [cube_instance(&Transform::identity())];
        let ray = Ray::new(Vec3::new(10.0, 10.0, 10.0), Vec3::new(1.0, 0.0, 0.0));

        assert!(pick_scene(&scene, &ray).is_none());
    }
}
