use std::f32::consts::PI;
use std::sync::Arc;

use crate::geometry::{
    Aabb, EPSILON, FloatType, HitRecord, Ray, TexturePoint, WorldPoint, WorldVector,
};
use crate::material::Material;
use crate::scene::Primitive;

pub struct Sphere {
    center: WorldPoint,
    radius: FloatType,
    material: Arc<dyn Material>,
}

impl Sphere {
    pub fn new(center: WorldPoint, radius: FloatType, material: Arc<dyn Material>) -> Sphere {
        Sphere {
            center,
            radius,
            material,
        }
    }

    fn uv(outward_normal: &WorldVector) -> TexturePoint {
        let phi = outward_normal.z.atan2(outward_normal.x);
        let theta = outward_normal.y.asin();
        TexturePoint::new(0.5 - phi / (2.0 * PI), theta / PI + 0.5)
    }
}

impl Primitive for Sphere {
    fn intersect<'a>(
        &'a self,
        ray: &Ray,
        hit: &mut HitRecord<'a>,
        t_min: FloatType,
        _t_max: FloatType,
    ) -> bool {
        let oc = self.center - ray.origin;
        let a = ray.direction.norm_squared();
        let oh = oc.dot(&ray.direction);
        let discriminant = oh * oh - a * (oc.norm_squared() - self.radius * self.radius);
        if discriminant < 0.0 {
            return false;
        }

        // From outside, the nearer root; from inside, the farther one, so a
        // ray starting inside doesn't pick the negative-length chord.
        let t = if oc.norm() > self.radius {
            (oh - discriminant.sqrt()) / a
        } else {
            (oh + discriminant.sqrt()) / a
        };

        if t < t_min || hit.t < t {
            return false;
        }

        let position = ray.point_at(t);
        let outward_normal = (position - self.center).normalize();
        hit.set(position, t, &*self.material);
        hit.set_face_normal(ray, outward_normal);
        hit.uv = Self::uv(&outward_normal);
        true
    }

    fn bounding_box(&self) -> Option<Aabb> {
        let r = WorldVector::repeat(self.radius.abs());
        Some(Aabb::new(self.center - r, self.center + r))
    }
}

/// Infinite plane `normal . x = offset`. Has no bounding box and therefore
/// can never sit inside a BVH.
pub struct Plane {
    normal: WorldVector,
    offset: FloatType,
    material: Arc<dyn Material>,
}

impl Plane {
    pub fn new(normal: WorldVector, offset: FloatType, material: Arc<dyn Material>) -> Plane {
        Plane {
            normal,
            offset,
            material,
        }
    }
}

impl Primitive for Plane {
    fn intersect<'a>(
        &'a self,
        ray: &Ray,
        hit: &mut HitRecord<'a>,
        t_min: FloatType,
        _t_max: FloatType,
    ) -> bool {
        let t = (self.offset - self.normal.dot(&ray.origin.coords)) / self.normal.dot(&ray.direction);
        if t_min < t && t < hit.t {
            hit.set(ray.point_at(t), t, &*self.material);
            hit.set_face_normal(ray, self.normal);
            return true;
        }
        false
    }

    fn bounding_box(&self) -> Option<Aabb> {
        None
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Indices of the two free axes, in ascending order.
    fn in_plane(self) -> (usize, usize) {
        match self {
            Axis::X => (1, 2),
            Axis::Y => (0, 2),
            Axis::Z => (0, 1),
        }
    }

    fn normal(self) -> WorldVector {
        match self {
            Axis::X => WorldVector::new(1.0, 0.0, 0.0),
            Axis::Y => WorldVector::new(0.0, 1.0, 0.0),
            Axis::Z => WorldVector::new(0.0, 0.0, 1.0),
        }
    }
}

/// Rectangle perpendicular to one coordinate axis, sitting at `offset` along
/// it. The two in-plane ranges are given in ascending axis order.
pub struct AxisRect {
    axis: Axis,
    a0: FloatType,
    a1: FloatType,
    b0: FloatType,
    b1: FloatType,
    offset: FloatType,
    material: Arc<dyn Material>,
}

impl AxisRect {
    pub fn new(
        axis: Axis,
        (a0, a1): (FloatType, FloatType),
        (b0, b1): (FloatType, FloatType),
        offset: FloatType,
        material: Arc<dyn Material>,
    ) -> AxisRect {
        AxisRect {
            axis,
            a0,
            a1,
            b0,
            b1,
            offset,
            material,
        }
    }
}

impl Primitive for AxisRect {
    fn intersect<'a>(
        &'a self,
        ray: &Ray,
        hit: &mut HitRecord<'a>,
        t_min: FloatType,
        _t_max: FloatType,
    ) -> bool {
        let k = self.axis.index();
        // parallel to the plane counts as a miss, not a tangent
        if ray.direction[k] == 0.0 {
            return false;
        }
        let t = (self.offset - ray.origin[k]) / ray.direction[k];
        if t < t_min || hit.t < t {
            return false;
        }

        let position = ray.point_at(t);
        let (i, j) = self.axis.in_plane();
        let a = position[i];
        let b = position[j];
        if a < self.a0 || self.a1 < a || b < self.b0 || self.b1 < b {
            return false;
        }

        let ua = (a - self.a0) / (self.a1 - self.a0);
        let ub = (b - self.b0) / (self.b1 - self.b0);
        hit.uv = match self.axis {
            Axis::X => TexturePoint::new(ub, ua),
            Axis::Y | Axis::Z => TexturePoint::new(ua, ub),
        };
        hit.set(position, t, &*self.material);
        hit.set_face_normal(ray, self.axis.normal());
        true
    }

    fn bounding_box(&self) -> Option<Aabb> {
        // thin but not degenerate along the fixed axis
        let k = self.axis.index();
        let (i, j) = self.axis.in_plane();
        let mut min = WorldPoint::origin();
        let mut max = WorldPoint::origin();
        min[i] = self.a0;
        min[j] = self.b0;
        min[k] = self.offset - EPSILON;
        max[i] = self.a1;
        max[j] = self.b1;
        max[k] = self.offset + EPSILON;
        Some(Aabb::new(min, max))
    }
}

const TRIANGLE_PADDING: FloatType = 1e-3;

pub struct Triangle {
    a: WorldPoint,
    b: WorldPoint,
    c: WorldPoint,
    /// Face normal from counterclockwise vertex winding.
    normal: WorldVector,
    material: Arc<dyn Material>,
}

impl Triangle {
    pub fn new(a: WorldPoint, b: WorldPoint, c: WorldPoint, material: Arc<dyn Material>) -> Triangle {
        let normal = (b - a).cross(&(c - a)).normalize();
        Triangle {
            a,
            b,
            c,
            normal,
            material,
        }
    }
}

impl Primitive for Triangle {
    fn intersect<'a>(
        &'a self,
        ray: &Ray,
        hit: &mut HitRecord<'a>,
        t_min: FloatType,
        _t_max: FloatType,
    ) -> bool {
        let denom = self.normal.dot(&ray.direction);
        if denom == 0.0 {
            return false;
        }
        let d = self.normal.dot(&self.a.coords);
        let t = (d - self.normal.dot(&ray.origin.coords)) / denom;
        if t < t_min || hit.t < t {
            return false;
        }

        // interior test: the point is inside iff all three edge cross
        // products agree in sign with the face normal
        let p = ray.point_at(t);
        if (self.b - p).cross(&(self.c - p)).dot(&self.normal) < 0.0 {
            return false;
        }
        if (self.c - p).cross(&(self.a - p)).dot(&self.normal) < 0.0 {
            return false;
        }
        if (self.a - p).cross(&(self.b - p)).dot(&self.normal) < 0.0 {
            return false;
        }

        // distance-based UV heuristic, not barycentric; kept for parity with
        // how the rest of the texturing was authored
        let longest_side = 2.0 * (self.c - self.a).norm().max((self.b - self.a).norm()) + 1e-3;
        let u = (p - self.a).norm() / longest_side;
        let v = (p - self.b).norm() / longest_side;

        hit.set(p, t, &*self.material);
        hit.set_face_normal(ray, self.normal);
        hit.uv = TexturePoint::new(u, v);
        true
    }

    fn bounding_box(&self) -> Option<Aabb> {
        let pad = WorldVector::repeat(TRIANGLE_PADDING);
        let min = self.a.coords.inf(&self.b.coords).inf(&self.c.coords);
        let max = self.a.coords.sup(&self.b.coords).sup(&self.c.coords);
        Some(Aabb::new(
            WorldPoint::from(min - pad),
            WorldPoint::from(max + pad),
        ))
    }
}

/// Axis-aligned box assembled from six [`AxisRect`] faces.
pub struct Cuboid {
    min: WorldPoint,
    max: WorldPoint,
    faces: [AxisRect; 6],
}

impl Cuboid {
    pub fn new(min: WorldPoint, max: WorldPoint, material: Arc<dyn Material>) -> Cuboid {
        Cuboid::with_materials(
            min,
            max,
            Arc::clone(&material),
            Arc::clone(&material),
            material,
        )
    }

    /// Separate materials for the top face, the bottom face, and the four
    /// side faces.
    pub fn with_materials(
        min: WorldPoint,
        max: WorldPoint,
        top: Arc<dyn Material>,
        bottom: Arc<dyn Material>,
        sides: Arc<dyn Material>,
    ) -> Cuboid {
        let x = (min.x, max.x);
        let y = (min.y, max.y);
        let z = (min.z, max.z);
        let faces = [
            AxisRect::new(Axis::Y, x, z, max.y, top),
            AxisRect::new(Axis::Y, x, z, min.y, bottom),
            AxisRect::new(Axis::X, y, z, min.x, Arc::clone(&sides)),
            AxisRect::new(Axis::X, y, z, max.x, Arc::clone(&sides)),
            AxisRect::new(Axis::Z, x, y, max.z, Arc::clone(&sides)),
            AxisRect::new(Axis::Z, x, y, min.z, sides),
        ];
        Cuboid { min, max, faces }
    }
}

impl Primitive for Cuboid {
    fn intersect<'a>(
        &'a self,
        ray: &Ray,
        hit: &mut HitRecord<'a>,
        t_min: FloatType,
        t_max: FloatType,
    ) -> bool {
        let mut result = false;
        for face in &self.faces {
            result |= face.intersect(ray, hit, t_min, t_max);
        }
        result
    }

    fn bounding_box(&self) -> Option<Aabb> {
        Some(Aabb::new(self.min, self.max))
    }
}
