use image::RgbaImage;
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use crate::{
    camera::Camera,
    geometry::{Color, EPSILON, FloatType, HitRecord, Ray, ScreenPoint},
    renderer::RenderSettings,
    scene::{Primitive, Scene},
    screen_block::ScreenBlock,
    util::Rgba,
};

/// Returned when a path runs out of bounces. Slightly above black so depth
/// clipping is visible while debugging.
pub fn exhausted_color() -> Color {
    Color::new(0.01, 0.01, 0.01)
}

/// Follows a ray through the scene until it is absorbed, escapes, or runs out
/// of bounces.
///
/// Each bounce multiplies the accumulated throughput by the material's
/// attenuation; an emissive hit (or escape to the background) closes the path
/// with that color. The recursion is tail-shaped, so it runs as a loop.
pub fn trace_ray<P: Primitive>(
    ray: Ray,
    root: &P,
    background: &Color,
    depth_budget: u32,
    rng: &mut dyn RngCore,
) -> Color {
    let mut throughput = Color::repeat(1.0);
    let mut ray = ray;
    let mut remaining = depth_budget;

    loop {
        if remaining == 0 {
            return throughput.component_mul(&exhausted_color());
        }

        let mut hit = HitRecord::new();
        // the lower bound stays off zero to avoid self-intersection at the
        // scattering origin ("shadow acne")
        if !root.intersect(&ray, &mut hit, EPSILON, FloatType::INFINITY) {
            return throughput.component_mul(background);
        }
        let Some(material) = hit.material else {
            return throughput.component_mul(background);
        };

        match material.scatter(&ray, &hit, rng) {
            Some(scatter) => {
                throughput.component_mul_assign(&scatter.attenuation);
                ray = scatter.ray;
                remaining -= 1;
            }
            None => {
                let emitted = material.emitted(hit.uv.x, hit.uv.y, &hit.position);
                return throughput.component_mul(&emitted);
            }
        }
    }
}

pub struct Worker {
    rng: SmallRng,
}

impl Worker {
    pub fn new(worker_id: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(worker_id as u64)),
            None => SmallRng::from_os_rng(),
        };
        Self { rng }
    }

    pub fn render_tile<P: Primitive>(
        &mut self,
        scene: &Scene<P>,
        camera: &Camera,
        settings: &RenderSettings,
        tile: &ScreenBlock,
        buffer: &mut RgbaImage,
    ) {
        for point in tile.internal_points() {
            let mut sample_sum = Color::zeros();
            for _i in 0..settings.sample_count.get() {
                sample_sum += self.render_sample(scene, camera, settings, &point);
            }
            let averaged = sample_sum / settings.sample_count.get() as FloatType;
            // gamma 2.0 tone curve
            let pixel = Rgba::new(averaged.x.sqrt(), averaged.y.sqrt(), averaged.z.sqrt(), 1.0);

            buffer.put_pixel(point.x - tile.min.x, point.y - tile.min.y, color_to_image(pixel));
        }
    }

    fn render_sample<P: Primitive>(
        &mut self,
        scene: &Scene<P>,
        camera: &Camera,
        settings: &RenderSettings,
        point: &ScreenPoint,
    ) -> Color {
        let ray = camera.sample_ray(point, &mut self.rng);
        trace_ray(
            ray,
            &scene.root,
            &scene.background,
            settings.max_depth,
            &mut self.rng,
        )
    }
}

/// Maps a 0-1 f32 rgba pixel to pixel type compatible with module image.
pub fn color_to_image(color: Rgba) -> image::Rgba<u8> {
    image::Rgba([
        (color.r * 255.0).round().clamp(0.0, 255.0) as u8,
        (color.g * 255.0).round().clamp(0.0, 255.0) as u8,
        (color.b * 255.0).round().clamp(0.0, 255.0) as u8,
        (color.a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}
