use nalgebra::Matrix4;

use crate::geometry::{Aabb, FloatType, HitRecord, Ray, WorldPoint};
use crate::scene::{Primitive, SceneBuildError};

/// Wraps one child primitive in an affine transform.
///
/// The incoming ray is pulled into object space with the inverse matrix
/// (points with homogeneous weight 1, directions with weight 0) and the hit
/// is pushed back out with the forward matrix. Normals are also transformed
/// with the forward matrix, which is only correct for rotations and uniform
/// scales; non-uniform scales will skew them.
pub struct Transform {
    child: Box<dyn Primitive>,
    matrix: Matrix4<FloatType>,
    inverse: Matrix4<FloatType>,
}

impl Transform {
    pub fn new(
        matrix: Matrix4<FloatType>,
        child: impl Primitive + 'static,
    ) -> Result<Transform, SceneBuildError> {
        let inverse = matrix
            .try_inverse()
            .ok_or(SceneBuildError::SingularTransform)?;
        Ok(Transform {
            child: Box::new(child),
            matrix,
            inverse,
        })
    }
}

impl Primitive for Transform {
    fn intersect<'a>(
        &'a self,
        ray: &Ray,
        hit: &mut HitRecord<'a>,
        t_min: FloatType,
        t_max: FloatType,
    ) -> bool {
        let object_ray = Ray::new(
            self.inverse.transform_point(&ray.origin),
            self.inverse.transform_vector(&ray.direction),
        );
        if !self.child.intersect(&object_ray, hit, t_min, t_max) {
            return false;
        }

        let position = self.matrix.transform_point(&hit.position);
        let normal = self.matrix.transform_vector(&hit.normal).normalize();
        hit.position = position;
        hit.set_face_normal(&object_ray, normal);
        true
    }

    fn bounding_box(&self) -> Option<Aabb> {
        let bounds = self.child.bounding_box()?;
        let a = self.matrix.transform_point(&bounds.min);
        let b = self.matrix.transform_point(&bounds.max);
        // transformed corners may have swapped on some axis
        Some(Aabb::new(
            WorldPoint::from(a.coords.inf(&b.coords)),
            WorldPoint::from(a.coords.sup(&b.coords)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::geometry::{EPSILON, WorldVector};
    use crate::material::{Lambert, Material};
    use crate::scene::primitives::Sphere;
    use crate::texture::SolidColor;
    use assert2::{assert, let_assert};

    fn test_material() -> Arc<dyn Material> {
        Arc::new(Lambert::new(Arc::new(SolidColor::new(0.5, 0.5, 0.5))))
    }

    fn unit_sphere() -> Sphere {
        Sphere::new(WorldPoint::origin(), 1.0, test_material())
    }

    #[test]
    fn translated_sphere_moves_with_the_matrix() {
        let transform = Transform::new(
            Matrix4::new_translation(&WorldVector::new(3.0, 0.0, 0.0)),
            unit_sphere(),
        )
        .unwrap();

        let ray = Ray::new(WorldPoint::new(3.0, 0.0, 5.0), WorldVector::new(0.0, 0.0, -1.0));
        let mut hit = HitRecord::new();
        assert!(transform.intersect(&ray, &mut hit, EPSILON, FloatType::INFINITY));
        assert!((hit.t - 4.0).abs() < 1e-4);
        assert!((hit.position - WorldPoint::new(3.0, 0.0, 1.0)).norm() < 1e-4);
        assert!((hit.normal - WorldVector::new(0.0, 0.0, 1.0)).norm() < 1e-4);

        // the untranslated location no longer intersects
        let ray = Ray::new(WorldPoint::new(0.0, 0.0, 5.0), WorldVector::new(0.0, 0.0, -1.0));
        let mut hit = HitRecord::new();
        assert!(!transform.intersect(&ray, &mut hit, EPSILON, FloatType::INFINITY));
    }

    #[test]
    fn uniformly_scaled_sphere_keeps_world_space_t() {
        let transform = Transform::new(Matrix4::new_scaling(2.0), unit_sphere()).unwrap();

        let ray = Ray::new(WorldPoint::new(0.0, 0.0, 5.0), WorldVector::new(0.0, 0.0, -1.0));
        let mut hit = HitRecord::new();
        assert!(transform.intersect(&ray, &mut hit, EPSILON, FloatType::INFINITY));
        // the scaled sphere has radius 2
        assert!((hit.t - 3.0).abs() < 1e-4);
        assert!((hit.position - WorldPoint::new(0.0, 0.0, 2.0)).norm() < 1e-4);
    }

    #[test]
    fn bounding_box_follows_the_transform() {
        let transform = Transform::new(
            Matrix4::new_translation(&WorldVector::new(0.0, 10.0, 0.0)),
            unit_sphere(),
        )
        .unwrap();

        let bounds = transform.bounding_box().unwrap();
        assert!((bounds.min - WorldPoint::new(-1.0, 9.0, -1.0)).norm() < 1e-5);
        assert!((bounds.max - WorldPoint::new(1.0, 11.0, 1.0)).norm() < 1e-5);
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let result = Transform::new(Matrix4::zeros(), unit_sphere());
        let_assert!(Err(SceneBuildError::SingularTransform) = result);
    }
}
