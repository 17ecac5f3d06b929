pub mod camera;
pub mod geometry;
pub mod material;
mod renderer;
pub mod scene;
pub mod screen_block;
pub mod texture;
pub mod util;

pub use crate::renderer::{RenderProgress, RenderSettings, exhausted_color, render, trace_ray};
pub use camera::Camera;
pub use scene::Scene;
