use crate::geometry::{FloatType, Ray, WorldPoint};

/// Axis-aligned bounding box. Degenerate (zero-thickness) boxes are allowed;
/// planar primitives thicken theirs slightly so the slab test stays usable.
#[derive(Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: WorldPoint,
    pub max: WorldPoint,
}

impl Aabb {
    pub fn new(min: WorldPoint, max: WorldPoint) -> Aabb {
        Aabb { min, max }
    }

    /// Smallest box containing both `a` and `b`.
    pub fn surrounding(a: &Aabb, b: &Aabb) -> Aabb {
        Aabb {
            min: WorldPoint::from(a.min.coords.inf(&b.min.coords)),
            max: WorldPoint::from(a.max.coords.sup(&b.max.coords)),
        }
    }

    /// Slab test: does the ray pass through this box within `(t_min, t_max)`?
    ///
    /// An interval tightened to `t_max <= t_min` is a miss. The comparison must
    /// stay non-strict so that the infinities produced by a zero direction
    /// component classify correctly.
    pub fn intersect(&self, ray: &Ray, mut t_min: FloatType, mut t_max: FloatType) -> bool {
        for axis in 0..3 {
            let inv = 1.0 / ray.direction[axis];
            let mut t0 = (self.min[axis] - ray.origin[axis]) * inv;
            let mut t1 = (self.max[axis] - ray.origin[axis]) * inv;
            if inv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = if t0 > t_min { t0 } else { t_min };
            t_max = if t1 < t_max { t1 } else { t_max };
            if t_max <= t_min {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::WorldVector;
    use assert2::assert;
    use proptest::prelude::*;
    use test_case::test_case;

    fn small_float() -> BoxedStrategy<FloatType> {
        any::<i32>().prop_map(|n| n as FloatType * 1e-4).boxed()
    }

    fn small_positive_float() -> BoxedStrategy<FloatType> {
        (1u32..10_000_000)
            .prop_map(|n| n as FloatType * 1e-4)
            .boxed()
    }

    prop_compose! {
        fn arb_point()(x in small_float(), y in small_float(), z in small_float()) -> WorldPoint {
            WorldPoint::new(x, y, z)
        }
    }

    prop_compose! {
        fn arb_extent()(x in small_positive_float(), y in small_positive_float(), z in small_positive_float()) -> WorldVector {
            WorldVector::new(x, y, z)
        }
    }

    prop_compose! {
        fn arb_nonzero_vector()(x in small_float(), y in small_float(), z in small_float()) -> WorldVector {
            let v = WorldVector::new(x, y, z);
            if v.norm() < 1e-6 { WorldVector::new(1.0, 0.0, 0.0) } else { v }
        }
    }

    proptest! {
        #[test]
        fn surrounding_is_commutative(pa in arb_point(), pb in arb_point(), ea in arb_extent(), eb in arb_extent()) {
            let a = Aabb::new(pa, pa + ea);
            let b = Aabb::new(pb, pb + eb);
            prop_assert_eq!(Aabb::surrounding(&a, &b), Aabb::surrounding(&b, &a));
        }

        #[test]
        fn surrounding_is_associative(
            pa in arb_point(), pb in arb_point(), pc in arb_point(),
            ea in arb_extent(), eb in arb_extent(), ec in arb_extent(),
        ) {
            let a = Aabb::new(pa, pa + ea);
            let b = Aabb::new(pb, pb + eb);
            let c = Aabb::new(pc, pc + ec);
            prop_assert_eq!(
                Aabb::surrounding(&Aabb::surrounding(&a, &b), &c),
                Aabb::surrounding(&a, &Aabb::surrounding(&b, &c))
            );
        }

        /// A ray through a point inside both boxes must hit their union
        /// when tested over an unbounded interval.
        #[test]
        fn surrounding_contains_common_points(
            p in arb_point(),
            lo_a in arb_extent(), hi_a in arb_extent(),
            lo_b in arb_extent(), hi_b in arb_extent(),
            direction in arb_nonzero_vector(),
        ) {
            let a = Aabb::new(p - lo_a, p + hi_a);
            let b = Aabb::new(p - lo_b, p + hi_b);

            let merged = Aabb::surrounding(&a, &b);
            let ray = Ray::new(p, direction);
            prop_assert!(merged.intersect(&ray, FloatType::NEG_INFINITY, FloatType::INFINITY));
        }
    }

    #[test]
    fn hit_through_the_middle() {
        let b = Aabb::new(WorldPoint::new(5.0, 5.0, 5.0), WorldPoint::new(10.0, 10.0, 10.0));
        let ray = Ray::new(WorldPoint::new(7.0, 7.0, 0.0), WorldVector::new(0.0, 0.0, 1.0));
        assert!(b.intersect(&ray, 0.0, FloatType::INFINITY));
    }

    #[test]
    fn miss_behind_the_origin() {
        let b = Aabb::new(WorldPoint::new(5.0, 5.0, 5.0), WorldPoint::new(10.0, 10.0, 10.0));
        let ray = Ray::new(WorldPoint::new(7.0, 7.0, 0.0), WorldVector::new(0.0, 0.0, -1.0));
        assert!(!b.intersect(&ray, 0.0, FloatType::INFINITY));
    }

    /// Rays parallel to an axis that start outside the corresponding slab must
    /// miss, regardless of how they move on the other axes.
    #[test_case( 0.0,  7.0,  7.0,   0.0, 1.0, 0.0 ; "low_x_parallel_miss")]
    #[test_case(12.0,  7.0,  7.0,   0.0, 1.0, 0.0 ; "high_x_parallel_miss")]
    #[test_case( 7.0,  0.0,  7.0,   1.0, 0.0, 0.0 ; "low_y_parallel_miss")]
    #[test_case( 7.0, 12.0,  7.0,   1.0, 0.0, 0.0 ; "high_y_parallel_miss")]
    #[test_case( 7.0,  7.0,  0.0,   1.0, 0.0, 0.0 ; "low_z_parallel_miss")]
    #[test_case( 7.0,  7.0, 12.0,   1.0, 0.0, 0.0 ; "high_z_parallel_miss")]
    fn parallel_misses(px: f32, py: f32, pz: f32, dx: f32, dy: f32, dz: f32) {
        let b = Aabb::new(WorldPoint::new(5.0, 5.0, 5.0), WorldPoint::new(10.0, 10.0, 10.0));
        let ray = Ray::new(WorldPoint::new(px, py, pz), WorldVector::new(dx, dy, dz));
        assert!(!b.intersect(&ray, FloatType::NEG_INFINITY, FloatType::INFINITY));
    }

    #[test]
    fn degenerate_window_is_a_miss() {
        let b = Aabb::new(WorldPoint::new(5.0, 5.0, 5.0), WorldPoint::new(10.0, 10.0, 10.0));
        let ray = Ray::new(WorldPoint::new(7.0, 7.0, 0.0), WorldVector::new(0.0, 0.0, 1.0));
        assert!(!b.intersect(&ray, 6.0, 6.0));
    }
}
