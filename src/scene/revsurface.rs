use std::sync::Arc;

use nalgebra::Rotation3;

use crate::geometry::{
    Aabb, EPSILON, FloatType, HitRecord, Ray, TexturePoint, WorldPoint, WorldVector,
};
use crate::material::Material;
use crate::scene::{Primitive, SceneBuildError};

/// Bezier profile curve in the xy plane, evaluated through the Bernstein
/// basis.
pub struct BezierCurve {
    controls: Vec<WorldPoint>,
}

impl BezierCurve {
    pub fn new(controls: Vec<WorldPoint>) -> Result<BezierCurve, SceneBuildError> {
        if controls.len() < 4 || controls.len() % 3 != 1 {
            return Err(SceneBuildError::BadControlPointCount(controls.len()));
        }
        Ok(BezierCurve { controls })
    }

    pub fn controls(&self) -> &[WorldPoint] {
        &self.controls
    }

    pub fn point(&self, t: FloatType) -> WorldPoint {
        let n = self.controls.len() as i32 - 1;
        let coords: WorldVector = self
            .controls
            .iter()
            .enumerate()
            .map(|(i, control)| Self::basis(t, i as i32, n) * control.coords)
            .sum();
        WorldPoint::from(coords)
    }

    pub fn derivative(&self, t: FloatType) -> WorldVector {
        let n = self.controls.len() as i32 - 1;
        self.controls
            .iter()
            .enumerate()
            .map(|(i, control)| Self::basis_derivative(t, i as i32, n) * control.coords)
            .sum()
    }

    fn basis(t: FloatType, i: i32, n: i32) -> FloatType {
        if i < 0 || n < i {
            return 0.0;
        }
        Self::binomial(n, i) * t.powi(i) * (1.0 - t).powi(n - i)
    }

    fn basis_derivative(t: FloatType, i: i32, n: i32) -> FloatType {
        n as FloatType * (Self::basis(t, i - 1, n - 1) - Self::basis(t, i, n - 1))
    }

    fn binomial(n: i32, r: i32) -> FloatType {
        let mut row = vec![0u64; n as usize + 1];
        row[0] = 1;
        for i in 1..=n as usize {
            for j in (1..=i).rev() {
                row[j] += row[j - 1];
            }
        }
        row[r as usize] as FloatType
    }
}

const RESTART_STEP: FloatType = 0.099;
const MAX_NEWTON_STEPS: usize = 20;
const PATIENCE: usize = 4;

/// Bezier profile revolved around the y axis.
///
/// There is no closed-form intersection; a 1-D Newton iteration with multiple
/// fixed restart seeds solves for the profile parameter. Non-convergence is
/// an ordinary miss, never an error.
pub struct RevSurface {
    curve: BezierCurve,
    bounds: Aabb,
    material: Arc<dyn Material>,
}

impl RevSurface {
    pub fn new(curve: BezierCurve, material: Arc<dyn Material>) -> Result<RevSurface, SceneBuildError> {
        if curve.controls().iter().any(|control| control.z != 0.0) {
            return Err(SceneBuildError::ProfileNotPlanar);
        }

        // The profile revolves around y, so only |x| matters radially.
        let controls = curve.controls();
        let mut max_x = controls[0].x.abs();
        let mut min_y = controls[0].y;
        let mut max_y = controls[0].y;
        for control in controls {
            min_y = min_y.min(control.y);
            max_y = max_y.max(control.y);
            max_x = max_x.max(control.x.abs());
        }
        let bounds = Aabb::new(
            WorldPoint::new(-max_x, min_y, -max_x),
            WorldPoint::new(max_x, max_y, max_x),
        );

        Ok(RevSurface {
            curve,
            bounds,
            material,
        })
    }

    /// Radial distance between the ray (cut at the profile height for `u`)
    /// and the profile curve.
    fn residual(&self, u: FloatType, ray: &Ray) -> FloatType {
        let p = self.curve.point(u);
        let ts = (p.y - ray.origin.y) / ray.direction.y;
        let rs = ray.point_at(ts);
        distance_from_axis(&rs.coords) - p.x.abs()
    }

    fn residual_derivative(&self, u: FloatType, ray: &Ray) -> FloatType {
        let p = self.curve.point(u);
        let pp = self.curve.derivative(u);
        let ts = (p.y - ray.origin.y) / ray.direction.y;
        let rs = ray.point_at(ts);

        let mut p_flat = p.coords;
        p_flat.y = 0.0;
        let p_flat = p_flat.normalize();
        let mut rs_flat = rs.coords;
        rs_flat.y = 0.0;
        let rs_flat = rs_flat.normalize();
        let d = ray.direction * (pp.y / ray.direction.y);

        d.dot(&rs_flat) - pp.dot(&p_flat)
    }

    /// Multi-restart Newton iteration for the profile parameter. Of all roots
    /// within tolerance, keeps the one whose profile height is closest to the
    /// ray origin's height.
    fn newton_root(&self, ray: &Ray) -> Option<FloatType> {
        let mut best: Option<(FloatType, FloatType)> = None; // (root, height distance)

        let mut start = 1e-4;
        while start < 1.0 {
            let fu = self.residual(start, ray);
            let fu_prime = self.residual_derivative(start, ray);
            let mut u = (start - fu / fu_prime).clamp(1e-4, 0.9999);

            let mut prev = 0.0;
            let mut worse_count = 0;
            for _ in 0..MAX_NEWTON_STEPS {
                let fu = self.residual(u, ray);
                if fu.abs() < EPSILON {
                    let height_distance = (self.curve.point(u).y - ray.origin.y).abs();
                    if best.is_none_or(|(_, d)| height_distance < d) {
                        best = Some((u, height_distance));
                    }
                } else if worse_count > PATIENCE {
                    break;
                }
                let fu_prime = self.residual_derivative(u, ray);
                u = (u - fu / fu_prime).clamp(1e-3, 0.999);
                if fu > prev - EPSILON {
                    worse_count += 1;
                } else {
                    worse_count = 0;
                }
                prev = fu;
            }

            start += RESTART_STEP;
        }

        best.map(|(root, _)| root)
    }

    fn surface_point(&self, u: FloatType, v: FloatType) -> WorldPoint {
        Rotation3::from_axis_angle(&WorldVector::y_axis(), v) * self.curve.point(u)
    }

    fn tangent_u(&self, u: FloatType, v: FloatType) -> WorldVector {
        Rotation3::from_axis_angle(&WorldVector::y_axis(), v) * self.curve.derivative(u)
    }

    fn tangent_v(&self, u: FloatType, v: FloatType) -> WorldVector {
        WorldVector::y().cross(&self.surface_point(u, v).coords)
    }
}

impl Primitive for RevSurface {
    fn intersect<'a>(
        &'a self,
        ray: &Ray,
        hit: &mut HitRecord<'a>,
        t_min: FloatType,
        t_max: FloatType,
    ) -> bool {
        if !self.bounds.intersect(ray, t_min, t_max) {
            return false;
        }

        let Some(u) = self.newton_root(ray) else {
            return false;
        };

        let p = self.curve.point(u);
        let t = (p.y - ray.origin.y) / ray.direction.y;
        if t < t_min || hit.t < t {
            return false;
        }

        let position = ray.point_at(t);
        let v = (position.x / p.x).acos();

        let outward_normal = self.tangent_v(u, v).cross(&self.tangent_u(u, v)).normalize();
        hit.set(position, t, &*self.material);
        hit.set_face_normal(ray, outward_normal);
        hit.uv = TexturePoint::new(u, v);
        true
    }

    fn bounding_box(&self) -> Option<Aabb> {
        Some(self.bounds.clone())
    }
}

fn distance_from_axis(v: &WorldVector) -> FloatType {
    (v.x * v.x + v.z * v.z).sqrt()
}
