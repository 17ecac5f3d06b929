use index_vec::IndexVec;
use ordered_float::OrderedFloat;
use rand::Rng;

use crate::geometry::{Aabb, FloatType, HitRecord, Ray};
use crate::scene::{Primitive, SceneBuildError};

index_vec::define_index_type! {
    pub struct NodeIdx = u32;
}

index_vec::define_index_type! {
    pub struct ItemIdx = u32;
}

#[derive(Copy, Clone, Debug)]
enum Child {
    Inner(NodeIdx),
    Item(ItemIdx),
}

struct Node {
    /// Union of both children's boxes.
    bounds: Aabb,
    left: Child,
    right: Child,
}

/// Binary bounding-volume hierarchy over a primitive collection.
///
/// Primitives and nodes live in arenas and children are typed indices, so the
/// tree is a single owner without pointer chasing. A single-item range stores
/// the same index in both child slots ("duplicated leaf"), which keeps the
/// recursion uniformly binary; the duplicate visit is rejected by the hit
/// record's closer-than check.
///
/// Built once, immutable afterwards; queries are safe to run concurrently.
pub struct Bvh<P> {
    items: IndexVec<ItemIdx, P>,
    nodes: IndexVec<NodeIdx, Node>,
    root: NodeIdx,
}

impl<P: Primitive> Bvh<P> {
    /// Sorts and splits the collection into a binary tree. Fails if the
    /// collection is empty or contains a primitive without a bounding box.
    pub fn build(items: Vec<P>, rng: &mut impl Rng) -> Result<Bvh<P>, SceneBuildError> {
        if items.is_empty() {
            return Err(SceneBuildError::EmptyBvh);
        }

        let boxes = items
            .iter()
            .map(|item| item.bounding_box().ok_or(SceneBuildError::UnboundedPrimitive))
            .collect::<Result<IndexVec<ItemIdx, Aabb>, _>>()?;

        let mut order: Vec<ItemIdx> = (0..items.len()).map(ItemIdx::from_usize).collect();
        let mut nodes = IndexVec::new();
        let root = Self::build_range(&mut nodes, &boxes, &mut order, rng);

        log::info!(
            "built BVH over {} primitives ({} nodes)",
            items.len(),
            nodes.len()
        );

        Ok(Bvh {
            items: items.into_iter().collect(),
            nodes,
            root,
        })
    }

    fn build_range(
        nodes: &mut IndexVec<NodeIdx, Node>,
        boxes: &IndexVec<ItemIdx, Aabb>,
        order: &mut [ItemIdx],
        rng: &mut impl Rng,
    ) -> NodeIdx {
        // sort key axis is picked at random per node, not content-adaptive
        let axis = rng.random_range(0..3usize);
        let key = |item: ItemIdx| OrderedFloat(boxes[item].min[axis]);

        let (left, right) = match order.len() {
            1 => (Child::Item(order[0]), Child::Item(order[0])),
            2 => {
                let (a, b) = (order[0], order[1]);
                if key(a) < key(b) {
                    (Child::Item(a), Child::Item(b))
                } else {
                    (Child::Item(b), Child::Item(a))
                }
            }
            _ => {
                order.sort_by_key(|&item| key(item));
                let mid = order.len() / 2;
                let (lo, hi) = order.split_at_mut(mid);
                (
                    Child::Inner(Self::build_range(nodes, boxes, lo, rng)),
                    Child::Inner(Self::build_range(nodes, boxes, hi, rng)),
                )
            }
        };

        let bounds = Aabb::surrounding(
            Self::child_bounds(nodes, boxes, left),
            Self::child_bounds(nodes, boxes, right),
        );
        nodes.push(Node {
            bounds,
            left,
            right,
        })
    }

    fn child_bounds<'b>(
        nodes: &'b IndexVec<NodeIdx, Node>,
        boxes: &'b IndexVec<ItemIdx, Aabb>,
        child: Child,
    ) -> &'b Aabb {
        match child {
            Child::Inner(node) => &nodes[node].bounds,
            Child::Item(item) => &boxes[item],
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn intersect_node<'a>(
        &'a self,
        node: NodeIdx,
        ray: &Ray,
        hit: &mut HitRecord<'a>,
        t_min: FloatType,
        t_max: FloatType,
    ) -> bool {
        let node = &self.nodes[node];
        // the pruning step: a missed box skips the whole subtree
        if !node.bounds.intersect(ray, t_min, t_max) {
            return false;
        }

        let hit_left = self.intersect_child(node.left, ray, hit, t_min, t_max);
        // a left hit tightens the right child's window so it cannot record
        // anything farther
        let right_t_max = if hit_left { hit.t } else { t_max };
        let hit_right = self.intersect_child(node.right, ray, hit, t_min, right_t_max);

        hit_left || hit_right
    }

    fn intersect_child<'a>(
        &'a self,
        child: Child,
        ray: &Ray,
        hit: &mut HitRecord<'a>,
        t_min: FloatType,
        t_max: FloatType,
    ) -> bool {
        match child {
            Child::Inner(node) => self.intersect_node(node, ray, hit, t_min, t_max),
            Child::Item(item) => self.items[item].intersect(ray, hit, t_min, t_max),
        }
    }
}

impl<P: Primitive> Primitive for Bvh<P> {
    fn intersect<'a>(
        &'a self,
        ray: &Ray,
        hit: &mut HitRecord<'a>,
        t_min: FloatType,
        t_max: FloatType,
    ) -> bool {
        self.intersect_node(self.root, ray, hit, t_min, t_max)
    }

    fn bounding_box(&self) -> Option<Aabb> {
        Some(self.nodes[self.root].bounds.clone())
    }
}
