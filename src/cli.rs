use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use indicatif::ProgressBar;
use nalgebra::Matrix4;
use rand::{SeedableRng, rngs::SmallRng};

use pathlet::{
    Camera, RenderSettings, Scene,
    geometry::{Color, ScreenSize, WorldPoint, WorldVector},
    material::{Dielectric, Emissive, Lambert, Material, Metal},
    render,
    scene::{
        Group, Primitive,
        bvh::Bvh,
        primitives::{Axis, AxisRect, Cuboid, Sphere},
        revsurface::{BezierCurve, RevSurface},
        transform::Transform,
    },
    texture::{Checker, SolidColor, Texture},
};

/// Renders the built-in demo scene.
#[derive(Parser, Debug)]
#[command(name = "pathlet")]
struct Args {
    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Samples per pixel.
    #[arg(long, default_value_t = 64)]
    samples: u32,

    /// Bounce budget per path.
    #[arg(long, default_value_t = 50)]
    max_depth: u32,

    /// Fixed RNG seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = 64)]
    tile_size: u32,

    #[arg(short, long, default_value = "render.png")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings = RenderSettings {
        tile_size: NonZeroU32::new(args.tile_size).context("tile size must be non-zero")?,
        sample_count: NonZeroU32::new(args.samples).context("sample count must be non-zero")?,
        max_depth: args.max_depth,
        seed: args.seed,
    };

    let mut rng = SmallRng::seed_from_u64(args.seed.unwrap_or(0));
    let scene = demo_scene(&mut rng)?;

    let camera = Camera::builder()
        .center(WorldPoint::new(0.0, 2.5, 8.0))
        .forward(WorldVector::new(0.0, -0.25, -1.0))
        .up(WorldVector::new(0.0, 1.0, 0.0))
        .resolution(ScreenSize::new(args.width, args.height))
        .fov(65.0f32.to_radians())
        .aperture(0.05)
        .focus_distance(8.0)
        .build();

    let bar = ProgressBar::no_length();
    let mut progress = render(scene, camera, settings, |_| {}, {
        let bar = bar.clone();
        move |_| bar.inc(1)
    })?;
    bar.set_length(progress.progress().1 as u64);

    progress.wait();
    bar.finish();

    let image = progress.image().lock().expect("Poisoned lock!");
    image
        .save(&args.output)
        .with_context(|| format!("saving {}", args.output.display()))?;
    println!("Wrote {}", args.output.display());
    Ok(())
}

/// A small showcase: checkered floor, diffuse/glass/metal spheres, a revolved
/// vase, and one area light under a dark sky.
fn demo_scene(rng: &mut SmallRng) -> anyhow::Result<Scene<Bvh<Box<dyn Primitive>>>> {
    let checker: Arc<dyn Texture> = Arc::new(Checker::new(
        Arc::new(SolidColor::new(0.2, 0.3, 0.1)),
        Arc::new(SolidColor::new(0.9, 0.9, 0.9)),
    ));
    let white: Arc<dyn Texture> = Arc::new(SolidColor::new(1.0, 1.0, 1.0));

    let floor: Arc<dyn Material> = Arc::new(Lambert::new(checker));
    let clay: Arc<dyn Material> = Arc::new(Lambert::new(Arc::new(SolidColor::new(0.7, 0.3, 0.25))));
    let glass: Arc<dyn Material> = Arc::new(Dielectric::new(Arc::clone(&white), 1.5));
    let steel: Arc<dyn Material> =
        Arc::new(Metal::new(Arc::new(SolidColor::new(0.8, 0.8, 0.85)), 0.05));
    let lamp: Arc<dyn Material> = Arc::new(Emissive::new(Arc::new(SolidColor::new(4.0, 4.0, 4.0))));

    let mut group = Group::new();
    group.push(Cuboid::new(
        WorldPoint::new(-30.0, -1.0, -30.0),
        WorldPoint::new(30.0, 0.0, 30.0),
        floor,
    ));
    group.push(Sphere::new(WorldPoint::new(-2.4, 1.0, 0.0), 1.0, clay));
    group.push(Sphere::new(WorldPoint::new(0.0, 1.0, 0.0), 1.0, glass));
    group.push(Sphere::new(WorldPoint::new(2.4, 1.0, 0.0), 1.0, steel));
    group.push(AxisRect::new(
        Axis::Y,
        (-3.0, 3.0),
        (-3.0, 3.0),
        7.0,
        lamp,
    ));

    let vase_profile = BezierCurve::new(vec![
        WorldPoint::new(0.8, 0.0, 0.0),
        WorldPoint::new(1.6, 0.7, 0.0),
        WorldPoint::new(0.2, 1.6, 0.0),
        WorldPoint::new(0.7, 2.4, 0.0),
    ])?;
    let vase = RevSurface::new(
        vase_profile,
        Arc::new(Lambert::new(Arc::new(SolidColor::new(0.3, 0.4, 0.6)))),
    )?;
    group.push(Transform::new(
        Matrix4::new_translation(&WorldVector::new(0.0, 0.0, -3.0)),
        vase,
    )?);

    log::info!("demo scene holds {} top-level objects", group.len());
    let root = Bvh::build(group.into_objects(), rng)?;

    Ok(Scene {
        root,
        background: Color::new(0.02, 0.03, 0.05),
    })
}
