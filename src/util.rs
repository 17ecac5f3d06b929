use rand::Rng;
use rand_distr::{Distribution as _, UnitBall, UnitSphere};

use crate::geometry::WorldVector;

pub type Rgba = rgb::RGBA<f32>;

/// Uniformly sampled point on the unit sphere's surface.
pub fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> WorldVector {
    let [x, y, z]: [f32; 3] = UnitSphere.sample(rng);
    WorldVector::new(x, y, z)
}

/// Uniformly sampled point inside the unit ball.
pub fn random_in_unit_sphere<R: Rng + ?Sized>(rng: &mut R) -> WorldVector {
    let [x, y, z]: [f32; 3] = UnitBall.sample(rng);
    WorldVector::new(x, y, z)
}
