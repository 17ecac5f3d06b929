pub mod bvh;
pub mod mesh;
pub mod primitives;
pub mod revsurface;
pub mod transform;

use itertools::Itertools as _;
use thiserror::Error;

use crate::geometry::{Aabb, Color, FloatType, HitRecord, Ray};

/// Anything a ray can be traced against.
///
/// Contract: `intersect` returns `true` and overwrites `hit` only when the
/// intersection parameter lies in `(t_min, hit.t)` — at or beyond `t_min` and
/// strictly closer than whatever the record already holds. Composites may
/// therefore query all children unconditionally and OR the results; the
/// closer-than check is the child's job.
pub trait Primitive: Send + Sync {
    fn intersect<'a>(
        &'a self,
        ray: &Ray,
        hit: &mut HitRecord<'a>,
        t_min: FloatType,
        t_max: FloatType,
    ) -> bool;

    /// `None` for primitives without a finite bounding box (the infinite
    /// plane). Such primitives must never end up inside a BVH range.
    fn bounding_box(&self) -> Option<Aabb>;
}

impl<P: Primitive + ?Sized> Primitive for Box<P> {
    fn intersect<'a>(
        &'a self,
        ray: &Ray,
        hit: &mut HitRecord<'a>,
        t_min: FloatType,
        t_max: FloatType,
    ) -> bool {
        (**self).intersect(ray, hit, t_min, t_max)
    }

    fn bounding_box(&self) -> Option<Aabb> {
        (**self).bounding_box()
    }
}

impl<P: Primitive + ?Sized> Primitive for std::sync::Arc<P> {
    fn intersect<'a>(
        &'a self,
        ray: &Ray,
        hit: &mut HitRecord<'a>,
        t_min: FloatType,
        t_max: FloatType,
    ) -> bool {
        (**self).intersect(ray, hit, t_min, t_max)
    }

    fn bounding_box(&self) -> Option<Aabb> {
        (**self).bounding_box()
    }
}

/// Fatal scene-construction problems. Rendering never starts on a partially
/// built scene.
#[derive(Debug, Error)]
pub enum SceneBuildError {
    #[error("cannot build a BVH over an empty primitive set")]
    EmptyBvh,
    #[error("a primitive without a bounding box cannot be placed under a BVH")]
    UnboundedPrimitive,
    #[error("transform matrix is not invertible")]
    SingularTransform,
    #[error("a Bezier profile needs 3n+1 control points, got {0}")]
    BadControlPointCount(usize),
    #[error("control points of a revolution surface must lie in the xy plane")]
    ProfileNotPlanar,
    #[error("face index {index} out of range for {vertex_count} vertices")]
    FaceIndexOutOfRange { index: usize, vertex_count: usize },
}

/// Flat, owning collection of primitives. The usual scene root before it gets
/// wrapped in a BVH.
#[derive(Default)]
pub struct Group {
    objects: Vec<Box<dyn Primitive>>,
}

impl Group {
    pub fn new() -> Group {
        Group::default()
    }

    pub fn push(&mut self, object: impl Primitive + 'static) {
        self.objects.push(Box::new(object));
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Hands the children over, e.g. to [`bvh::Bvh::build`].
    pub fn into_objects(self) -> Vec<Box<dyn Primitive>> {
        self.objects
    }
}

impl Primitive for Group {
    fn intersect<'a>(
        &'a self,
        ray: &Ray,
        hit: &mut HitRecord<'a>,
        t_min: FloatType,
        _t_max: FloatType,
    ) -> bool {
        let mut result = false;
        for object in &self.objects {
            let closest = hit.t;
            result |= object.intersect(ray, hit, t_min, closest);
        }
        result
    }

    fn bounding_box(&self) -> Option<Aabb> {
        let mut boxes = self.objects.iter().map(|object| object.bounding_box());
        let first = boxes.next()??;
        boxes.fold_options(first, |merged, next| Aabb::surrounding(&merged, &next))
    }
}

pub struct Scene<P: Primitive> {
    pub root: P,
    /// Returned for rays that escape the scene.
    pub background: Color,
}

impl<P: Primitive + Clone> Clone for Scene<P> {
    fn clone(&self) -> Self {
        Scene {
            root: self.root.clone(),
            background: self.background,
        }
    }
}
