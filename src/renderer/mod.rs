mod machinery;
mod worker;

pub use crate::renderer::machinery::{RenderProgress, render};
pub use crate::renderer::worker::{exhausted_color, trace_ray};

#[derive(Copy, Clone, Debug)]
pub struct RenderSettings {
    pub tile_size: std::num::NonZeroU32,
    pub sample_count: std::num::NonZeroU32,
    /// Bounce budget per path before it is forcibly terminated.
    pub max_depth: u32,
    /// Fixed seed for reproducible renders; `None` seeds from the OS.
    pub seed: Option<u64>,
}
