use std::sync::Arc;

use rand::{Rng as _, RngCore};

use crate::geometry::{Color, FloatType, HitRecord, Ray, WorldPoint, WorldVector};
use crate::texture::Texture;
use crate::util::{random_in_unit_sphere, random_unit_vector};

/// A successfully scattered ray and the color it gets attenuated by.
pub struct Scatter {
    pub attenuation: Color,
    pub ray: Ray,
}

/// Surface response to an incoming ray.
///
/// `scatter` returning `None` terminates the path: for [`Emissive`] the
/// emitted color replaces further bounces, for [`Metal`] it means the
/// perturbed reflection dipped under the surface and the path is absorbed.
pub trait Material: Send + Sync {
    fn scatter(&self, ray: &Ray, hit: &HitRecord<'_>, rng: &mut dyn RngCore) -> Option<Scatter>;

    /// Only emissive materials glow; everything else is dark.
    fn emitted(&self, _u: FloatType, _v: FloatType, _position: &WorldPoint) -> Color {
        Color::zeros()
    }
}

pub struct Lambert {
    texture: Arc<dyn Texture>,
}

impl Lambert {
    pub fn new(texture: Arc<dyn Texture>) -> Lambert {
        Lambert { texture }
    }
}

impl Material for Lambert {
    fn scatter(&self, _ray: &Ray, hit: &HitRecord<'_>, rng: &mut dyn RngCore) -> Option<Scatter> {
        let direction = hit.normal + random_unit_vector(rng);
        Some(Scatter {
            attenuation: self.texture.color(hit.uv.x, hit.uv.y, &hit.position),
            ray: Ray::new(hit.position, direction.normalize()),
        })
    }
}

pub struct Metal {
    texture: Arc<dyn Texture>,
    fuzziness: FloatType,
}

impl Metal {
    pub fn new(texture: Arc<dyn Texture>, fuzziness: FloatType) -> Metal {
        Metal { texture, fuzziness }
    }
}

impl Material for Metal {
    fn scatter(&self, ray: &Ray, hit: &HitRecord<'_>, rng: &mut dyn RngCore) -> Option<Scatter> {
        let reflected = reflect(&ray.direction, &hit.normal);
        let direction = (reflected + self.fuzziness * random_in_unit_sphere(rng)).normalize();
        if direction.dot(&hit.normal) <= 0.0 {
            // fuzz pushed the reflection into the surface
            return None;
        }
        Some(Scatter {
            attenuation: self.texture.color(hit.uv.x, hit.uv.y, &hit.position),
            ray: Ray::new(hit.position, direction),
        })
    }
}

pub struct Dielectric {
    texture: Arc<dyn Texture>,
    refract_idx: FloatType,
}

impl Dielectric {
    pub fn new(texture: Arc<dyn Texture>, refract_idx: FloatType) -> Dielectric {
        Dielectric {
            texture,
            refract_idx,
        }
    }

    /// Schlick's approximation of Fresnel reflectance.
    pub fn schlick(cos_theta: FloatType, refract_idx: FloatType) -> FloatType {
        let r = (1.0 - refract_idx) / (1.0 + refract_idx);
        let r = r * r;
        r + (1.0 - r) * (1.0 - cos_theta).powi(5)
    }
}

impl Material for Dielectric {
    fn scatter(&self, ray: &Ray, hit: &HitRecord<'_>, rng: &mut dyn RngCore) -> Option<Scatter> {
        let attenuation = self.texture.color(hit.uv.x, hit.uv.y, &hit.position);
        let eta_ratio = if hit.is_outer {
            1.0 / self.refract_idx
        } else {
            self.refract_idx
        };

        let cos_theta = (-ray.direction).dot(&hit.normal).min(1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();

        let total_internal_reflection = eta_ratio * sin_theta > 1.0;
        let direction = if total_internal_reflection
            || rng.random::<FloatType>() < Self::schlick(cos_theta, eta_ratio)
        {
            reflect(&ray.direction, &hit.normal).normalize()
        } else {
            refract(&ray.direction, &hit.normal, eta_ratio).normalize()
        };

        Some(Scatter {
            attenuation,
            ray: Ray::new(hit.position, direction),
        })
    }
}

/// Light source: never scatters, ends the path with its texture's color.
pub struct Emissive {
    texture: Arc<dyn Texture>,
}

impl Emissive {
    pub fn new(texture: Arc<dyn Texture>) -> Emissive {
        Emissive { texture }
    }
}

impl Material for Emissive {
    fn scatter(&self, _ray: &Ray, _hit: &HitRecord<'_>, _rng: &mut dyn RngCore) -> Option<Scatter> {
        None
    }

    fn emitted(&self, u: FloatType, v: FloatType, position: &WorldPoint) -> Color {
        self.texture.color(u, v, position)
    }
}

fn reflect(v: &WorldVector, normal: &WorldVector) -> WorldVector {
    v - 2.0 * v.dot(normal) * normal
}

fn refract(v: &WorldVector, normal: &WorldVector, eta_ratio: FloatType) -> WorldVector {
    let cos_theta = (-v).dot(normal);
    let parallel = eta_ratio * (v + cos_theta * normal);
    let perpendicular = -(1.0 - parallel.norm_squared()).sqrt() * normal;
    parallel + perpendicular
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::SolidColor;
    use assert2::assert;
    use rand::SeedableRng as _;
    use rand::rngs::SmallRng;
    use test_strategy::proptest;

    fn white() -> Arc<dyn Texture> {
        Arc::new(SolidColor::new(1.0, 1.0, 1.0))
    }

    fn head_on_hit<'a>(material: &'a dyn Material) -> (Ray, HitRecord<'a>) {
        let ray = Ray::new(WorldPoint::new(0.0, 1.0, 0.0), WorldVector::new(0.0, -1.0, 0.0));
        let mut hit = HitRecord::new();
        hit.set(WorldPoint::origin(), 1.0, material);
        hit.set_face_normal(&ray, WorldVector::new(0.0, 1.0, 0.0));
        (ray, hit)
    }

    #[proptest]
    fn schlick_stays_in_unit_range(
        #[strategy(0.0f32..=1.0)] cos_theta: f32,
        #[strategy(1e-3f32..=10.0)] refract_idx: f32,
    ) {
        let r = Dielectric::schlick(cos_theta, refract_idx);
        assert!((0.0..=1.0).contains(&r));
    }

    #[test]
    fn lambert_always_scatters_off_the_surface() {
        let material = Lambert::new(white());
        let (ray, hit) = head_on_hit(&material);
        let mut rng = SmallRng::seed_from_u64(7);

        for _ in 0..100 {
            let scatter = material.scatter(&ray, &hit, &mut rng).unwrap();
            assert!(scatter.ray.origin == hit.position);
            assert!((scatter.ray.direction.norm() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn polished_metal_mirrors_the_incoming_ray() {
        let material = Metal::new(white(), 0.0);
        let ray = Ray::new(
            WorldPoint::new(-1.0, 1.0, 0.0),
            WorldVector::new(1.0, -1.0, 0.0).normalize(),
        );
        let mut hit = HitRecord::new();
        hit.set(WorldPoint::origin(), std::f32::consts::SQRT_2, &material);
        hit.set_face_normal(&ray, WorldVector::new(0.0, 1.0, 0.0));
        let mut rng = SmallRng::seed_from_u64(7);

        let scatter = material.scatter(&ray, &hit, &mut rng).unwrap();
        let expected = WorldVector::new(1.0, 1.0, 0.0).normalize();
        assert!((scatter.ray.direction - expected).norm() < 1e-5);
    }

    #[test]
    fn very_fuzzy_metal_sometimes_absorbs_grazing_rays() {
        let material = Metal::new(white(), 10.0);
        // almost parallel to the surface, so fuzz regularly pushes the
        // reflection below it
        let ray = Ray::new(
            WorldPoint::new(-10.0, 0.1, 0.0),
            WorldVector::new(1.0, -0.01, 0.0).normalize(),
        );
        let mut hit = HitRecord::new();
        hit.set(WorldPoint::origin(), 10.0, &material);
        hit.set_face_normal(&ray, WorldVector::new(0.0, 1.0, 0.0));
        let mut rng = SmallRng::seed_from_u64(7);

        let absorbed = (0..200)
            .filter(|_| material.scatter(&ray, &hit, &mut rng).is_none())
            .count();
        assert!(absorbed > 0);
    }

    #[test]
    fn dielectric_reflects_beyond_the_critical_angle() {
        let material = Dielectric::new(white(), 1.5);
        // exiting the dense medium at ~60 degrees, well past the ~41.8 degree
        // critical angle of n=1.5
        let direction = WorldVector::new(0.866, 0.5, 0.0).normalize();
        let ray = Ray::new(WorldPoint::new(0.0, -1.0, 0.0) + direction * -1.0, direction);
        let mut hit = HitRecord::new();
        hit.set(WorldPoint::origin(), 1.0, &material);
        // the surface normal points up and the ray comes from below
        hit.set_face_normal(&ray, WorldVector::new(0.0, 1.0, 0.0));
        assert!(!hit.is_outer);
        let mut rng = SmallRng::seed_from_u64(7);

        for _ in 0..50 {
            let scatter = material.scatter(&ray, &hit, &mut rng).unwrap();
            let expected = reflect(&direction, &hit.normal).normalize();
            assert!((scatter.ray.direction - expected).norm() < 1e-5);
        }
    }

    #[test]
    fn emissive_never_scatters_and_reports_its_color() {
        let material = Emissive::new(Arc::new(SolidColor::new(2.0, 3.0, 4.0)));
        let (ray, hit) = head_on_hit(&material);
        let mut rng = SmallRng::seed_from_u64(7);

        assert!(material.scatter(&ray, &hit, &mut rng).is_none());
        assert!(material.emitted(0.0, 0.0, &WorldPoint::origin()) == Color::new(2.0, 3.0, 4.0));
    }
}
