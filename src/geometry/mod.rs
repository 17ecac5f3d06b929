mod aabb;

pub use aabb::Aabb;

use crate::material::Material;

pub type FloatType = f32;

/// Shared small tolerance: shadow-ray lower bound, planar box thickening,
/// Newton residual tolerance.
pub const EPSILON: FloatType = 1e-4;

pub type WorldPoint = nalgebra::Point3<FloatType>;
pub type WorldVector = nalgebra::Vector3<FloatType>;

/// Linear RGB radiance/attenuation triple.
pub type Color = nalgebra::Vector3<FloatType>;

pub type TexturePoint = nalgebra::Point2<FloatType>;

pub type ScreenPoint = nalgebra::Point2<u32>;
pub type ScreenSize = nalgebra::Vector2<u32>;

#[derive(Copy, Clone, Debug)]
pub struct Ray {
    pub origin: WorldPoint,
    /// Not normalized by the type itself; call sites normalize as needed.
    pub direction: WorldVector,
}

impl Ray {
    pub fn new(origin: WorldPoint, direction: WorldVector) -> Ray {
        Ray { origin, direction }
    }

    pub fn point_at(&self, distance: FloatType) -> WorldPoint {
        self.origin + self.direction * distance
    }
}

/// Closest intersection found so far along a ray.
///
/// Threaded by `&mut` through nested intersection queries; a primitive may
/// only overwrite it with a strictly closer hit (see [`crate::scene::Primitive`]).
#[derive(Copy, Clone)]
pub struct HitRecord<'a> {
    /// Ray parameter of the recorded hit, `+inf` until the first hit lands.
    pub t: FloatType,
    pub position: WorldPoint,
    /// Always oriented towards the side the ray came from.
    pub normal: WorldVector,
    /// Whether the recorded normal points outward from the surface.
    pub is_outer: bool,
    pub uv: TexturePoint,
    pub material: Option<&'a dyn Material>,
}

impl<'a> HitRecord<'a> {
    pub fn new() -> HitRecord<'a> {
        HitRecord {
            t: FloatType::INFINITY,
            position: WorldPoint::origin(),
            normal: WorldVector::zeros(),
            is_outer: false,
            uv: TexturePoint::origin(),
            material: None,
        }
    }

    pub fn set(&mut self, position: WorldPoint, t: FloatType, material: &'a dyn Material) {
        self.position = position;
        self.t = t;
        self.material = Some(material);
    }

    /// Stores `outward_normal` flipped towards the incoming ray and remembers
    /// which side it originally pointed to.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: WorldVector) {
        self.is_outer = ray.direction.dot(&outward_normal) < 0.0;
        self.normal = if self.is_outer {
            outward_normal
        } else {
            -outward_normal
        };
    }
}

impl Default for HitRecord<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert2::assert;

    #[test]
    fn point_at_walks_along_the_direction() {
        let ray = Ray::new(WorldPoint::new(1.0, 2.0, 3.0), WorldVector::new(0.0, 0.0, -2.0));
        assert!(ray.point_at(0.0) == ray.origin);
        assert!(ray.point_at(1.5) == WorldPoint::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn fresh_hit_record_is_infinitely_far() {
        let hit = HitRecord::new();
        assert!(hit.t == FloatType::INFINITY);
        assert!(hit.material.is_none());
    }

    #[test]
    fn face_normal_flips_against_the_ray() {
        let ray = Ray::new(WorldPoint::origin(), WorldVector::new(0.0, 0.0, -1.0));
        let mut hit = HitRecord::new();

        hit.set_face_normal(&ray, WorldVector::new(0.0, 0.0, 1.0));
        assert!(hit.is_outer);
        assert!(hit.normal == WorldVector::new(0.0, 0.0, 1.0));

        hit.set_face_normal(&ray, WorldVector::new(0.0, 0.0, -1.0));
        assert!(!hit.is_outer);
        assert!(hit.normal == WorldVector::new(0.0, 0.0, 1.0));
    }
}
