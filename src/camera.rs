use assert2::assert;
use bon::bon;
use nalgebra::Unit;
use rand::Rng;
use rand_distr::Distribution as _;

use crate::geometry::{EPSILON, FloatType, Ray, ScreenPoint, ScreenSize, WorldPoint, WorldVector};

/// Thin-lens perspective camera.
///
/// The image plane sits at the focus distance, so points there are perfectly
/// sharp and everything else blurs with the sampled lens offset.
#[derive(Copy, Clone, Debug)]
pub struct Camera {
    center: WorldPoint,

    forward: Unit<WorldVector>,
    right: Unit<WorldVector>,
    up: Unit<WorldVector>,

    resolution: ScreenSize,

    /// Half extents of the image plane at the focus distance.
    half_width: FloatType,
    half_height: FloatType,

    focus_distance: FloatType,
    lens_radius: FloatType,
}

#[bon]
impl Camera {
    /// `fov` is the horizontal field of view in radians; the vertical extent
    /// follows from the resolution's aspect ratio.
    #[builder]
    pub fn new(
        center: WorldPoint,
        forward: WorldVector,
        up: WorldVector,
        resolution: ScreenSize,
        fov: FloatType,
        aperture: FloatType,
        focus_distance: FloatType,
    ) -> Self {
        let forward = Unit::try_new(forward, EPSILON).expect("Forward vector must be non-zero");
        let up = Unit::try_new(up, EPSILON).expect("Up vector must be non-zero");
        let right = Unit::try_new(forward.cross(&up), EPSILON)
            .expect("`up` and `forward` must be linearly independent");
        let up = Unit::new_normalize(right.cross(&forward));

        assert!(resolution.x > 0);
        assert!(resolution.y > 0);
        assert!(fov > 0.0 && fov < std::f32::consts::PI);
        assert!(aperture >= 0.0);
        assert!(focus_distance > 0.0);

        let half_width = focus_distance * (fov / 2.0).tan();
        let half_height = half_width * resolution.y as FloatType / resolution.x as FloatType;

        Camera {
            center,
            forward,
            right,
            up,
            resolution,
            half_width,
            half_height,
            focus_distance,
            lens_radius: aperture / 2.0,
        }
    }
}

impl Camera {
    pub fn resolution(&self) -> ScreenSize {
        self.resolution
    }

    /// Samples a ray for the given pixel: jittered within the pixel's unit
    /// cell, with the origin offset across the lens disc for depth of field.
    pub fn sample_ray(&self, point: &ScreenPoint, rng: &mut impl Rng) -> Ray {
        let film_u = point.x as FloatType + rng.random::<FloatType>();
        let film_v = point.y as FloatType + rng.random::<FloatType>();

        let half_w_px = self.resolution.x as FloatType / 2.0;
        let half_h_px = self.resolution.y as FloatType / 2.0;
        let ndc_u = (film_u - half_w_px) / half_w_px;
        // screen y grows downward, world up is up
        let ndc_v = (half_h_px - film_v) / half_h_px;

        let lens_uv: [FloatType; 2] = rand_distr::UnitDisc.sample(rng);
        let offset = self.right.as_ref() * (self.lens_radius * lens_uv[0])
            + self.up.as_ref() * (self.lens_radius * lens_uv[1]);

        let direction = self.forward.as_ref() * self.focus_distance
            + self.right.as_ref() * (self.half_width * ndc_u)
            + self.up.as_ref() * (self.half_height * ndc_v)
            - offset;

        Ray::new(self.center + offset, direction.normalize())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert2::assert;

    fn test_camera() -> Camera {
        // X goes right, Y goes away, Z goes up
        Camera::builder()
            .center(WorldPoint::new(0.0, 0.0, 0.0))
            .forward(WorldVector::new(0.0, 1.0, 0.0))
            .up(WorldVector::new(0.0, 0.0, 1.0))
            .resolution(ScreenSize::new(800, 600))
            .fov(std::f32::consts::FRAC_PI_2)
            .aperture(0.0)
            .focus_distance(2.0)
            .build()
    }

    #[test]
    fn left_right_up_down() {
        let camera = test_camera();
        let mut rng = rand::rng();

        let ray_center = camera.sample_ray(&ScreenPoint::new(400, 300), &mut rng);
        let ray_left = camera.sample_ray(&ScreenPoint::new(0, 300), &mut rng);
        let ray_right = camera.sample_ray(&ScreenPoint::new(799, 300), &mut rng);
        let ray_up = camera.sample_ray(&ScreenPoint::new(400, 0), &mut rng);
        let ray_down = camera.sample_ray(&ScreenPoint::new(400, 599), &mut rng);

        assert!(ray_center.direction.x.abs() < 1e-2);
        assert!(ray_center.direction.z.abs() < 1e-2);
        assert!(ray_left.direction.x < ray_center.direction.x);
        assert!(ray_right.direction.x > ray_center.direction.x);
        assert!(ray_up.direction.z > ray_center.direction.z);
        assert!(ray_down.direction.z < ray_center.direction.z);
    }

    #[test]
    fn zero_aperture_rays_start_at_the_center() {
        let camera = test_camera();
        let mut rng = rand::rng();

        for _ in 0..20 {
            let ray = camera.sample_ray(&ScreenPoint::new(123, 456), &mut rng);
            assert!((ray.origin - WorldPoint::origin()).norm() == 0.0);
            assert!((ray.direction.norm() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn corner_rays_respect_the_field_of_view() {
        let camera = test_camera();
        let mut rng = rand::rng();

        // with a 90 degree horizontal fov the edge rays lean out by ~45
        // degrees in x
        let ray_left = camera.sample_ray(&ScreenPoint::new(0, 300), &mut rng);
        let lean = ray_left.direction.x.abs() / ray_left.direction.y;
        assert!((lean - 1.0).abs() < 0.05);
    }
}
