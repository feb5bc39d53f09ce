//! Math utilities and types
//!
//! Provides fundamental math types for 3D spatial queries.

pub use nalgebra::{Matrix4, Quaternion, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
///
/// Used to place a model instance in world space; picking converts it to a
/// matrix pair (model-to-world plus its inverse) once, up front.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    #[must_use]
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    #[must_use]
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix
    ///
    /// The inverse of the result is taken on the matrix itself (see
    /// [`Mat4::try_inverse`]): with non-uniform scale under a rotation the
    /// inverse is a shear and cannot be decomposed back into a
    /// position/rotation/scale triple.
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_matrix_inverse_roundtrip_uniform_scale() {
        let transform = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_axis_angle(&Vec3::y_axis(), 0.7),
            scale: Vec3::new(2.0, 2.0, 2.0),
        };

        let forward = transform.to_matrix();
        let back = forward.try_inverse().unwrap();

        assert_relative_eq!(back * forward, Mat4::identity(), epsilon = 1e-5);
    }

    #[test]
    fn test_matrix_inverse_roundtrip_nonuniform_scale() {
        // Rotation and non-uniform scale do not commute, so the inverse
        // cannot be rebuilt axis-by-axis from negated components; it has to
        // come from the composed matrix.
        let transform = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_axis_angle(&Vec3::y_axis(), 0.7),
            scale: Vec3::new(3.0, 1.0, 0.5),
        };

        let forward = transform.to_matrix();
        let back = forward.try_inverse().unwrap();

        assert_relative_eq!(back * forward, Mat4::identity(), epsilon = 1e-5);
    }

    #[test]
    fn test_identity_matrix() {
        assert_eq!(Transform::identity().to_matrix(), Mat4::identity());
    }
}
