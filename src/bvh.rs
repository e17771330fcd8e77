use crate::{
    error::{Error, Result},
    primitives::{Intersect, AABB},
    ray::{Hit, Ray},
    rng::RandomGenerator,
};
use glam::Vec3;
use itertools::Itertools;
use log::debug;
use std::{cmp::Ordering, sync::Arc};

/// Number of SAH buckets along the split axis
const BUCKETS: usize = 12;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Axis {
    X,
    Y,
    Z,
}

pub trait GetAxis {
    type Output;

    fn axis(&self, axis: Axis) -> Self::Output;
}

impl GetAxis for Vec3 {
    type Output = f32;

    fn axis(&self, axis: Axis) -> Self::Output {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

/// A Bounding Volume Hirarchy over shared scene nodes
#[derive(Clone, Debug)]
pub struct BVH {
    /// The nodes that make up the scene, ordered so every leaf owns a contiguous run
    geometry: Vec<Arc<dyn Intersect>>,
    /// The BVH tree
    tree: Vec<FlatNode>,
}

impl BVH {
    /// Builds the hierarchy. Every node has to report a bounding box over `[t0, t1]`.
    pub fn new(geometry: Vec<Arc<dyn Intersect>>, t0: f32, t1: f32) -> Result<Self> {
        if geometry.is_empty() {
            return Err(Error::EmptyScene);
        }

        // How many primitives can be in the same node
        let split_threshold = 4;
        let mut total_nodes = 0;
        // Convert from node index to geometry index, and use this to sort the geometry later
        // The indices are as seen from the nodes and the elements from the geometry
        let mut index_to_geometry = Vec::with_capacity(geometry.len());
        // Precompute build info about the geometry
        let mut build_geometry = geometry
            .iter()
            .enumerate()
            .map(|(index, geom)| {
                let bounds = geom.bounds(t0, t1).ok_or(Error::Unbounded(index))?;
                Ok(GeometryInfo {
                    index,
                    center: bounds.center(),
                    bounds,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let root = BVH::build(
            &mut build_geometry,
            &mut index_to_geometry,
            &mut total_nodes,
            split_threshold,
        );

        // Make a flat tree of FlatNodes from the root node of a BuildNode tree
        let tree = Self::flatten(root, total_nodes);

        // Sort the geometry by the indices in index_to_geometry
        let geometry = index_to_geometry
            .into_iter()
            .map(|i| geometry[i].clone())
            .collect();

        debug!("Total Nodes Built: {}", total_nodes);

        Ok(Self { geometry, tree })
    }

    fn build(
        geometry: &mut [GeometryInfo],
        index_to_geometry: &mut Vec<usize>,
        total_nodes: &mut usize,
        split_threshold: usize,
    ) -> BuildNode {
        *total_nodes += 1;

        // Create bounding box for all geometry in this BuildNode
        let bounds = geometry
            .iter()
            .skip(1)
            .fold(geometry[0].bounds, |b, g| b.union(g.bounds));

        // Check if we are a leaf
        if geometry.len() == 1 {
            return BVH::build_leaf(geometry, index_to_geometry, bounds);
        }

        // Create centroids for all geometry in this BuildNode
        let centroids = geometry
            .iter()
            .skip(1)
            .fold(AABB::point(geometry[0].center), |b, g| b.point_union(g.center));

        // Decide which axis to spilt the scene along
        let split_axis = centroids.max_extent();
        let extent = centroids.extent(split_axis);

        // Every centroid in the same spot, nothing to split on
        if extent <= 0.0 {
            return BVH::build_leaf(geometry, index_to_geometry, bounds);
        }

        let bucket_of = |g: &GeometryInfo| {
            let b = ((g.center.axis(split_axis) - centroids.min.axis(split_axis)) / extent
                * BUCKETS as f32) as usize;
            b.min(BUCKETS - 1)
        };

        // SAH guided partitioning
        let mut buckets = [SAHBucket::default(); BUCKETS];
        for g in geometry.iter() {
            let bucket = &mut buckets[bucket_of(g)];
            bucket.count += 1;
            bucket.bounds = Some(match bucket.bounds {
                Some(b) => b.union(g.bounds),
                None => g.bounds,
            });
        }

        let mut cost = [0.0; BUCKETS - 1];
        for (i, c) in cost.iter_mut().enumerate() {
            let (left, right) = buckets.split_at(i + 1);
            let left = SAHBucket::merge(left);
            let right = SAHBucket::merge(right);

            *c = 0.125
                + (left.count as f32 * left.area() + right.count as f32 * right.area())
                    / bounds.surface_area();
        }

        let min_bucket = cost
            .iter()
            .position_min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
            .unwrap_or(0);
        let min_cost = cost[min_bucket];

        // Check if we should build an interior node based on cost and the split_threshold
        if geometry.len() <= split_threshold && min_cost >= geometry.len() as f32 {
            return BVH::build_leaf(geometry, index_to_geometry, bounds);
        }

        // Partition the geometry into the buckets left of the split and the ones right of it
        geometry.sort_unstable_by_key(|g| bucket_of(g) > min_bucket);
        let mut mid = geometry
            .iter()
            .position(|g| bucket_of(g) > min_bucket)
            .unwrap_or_else(|| geometry.len());

        // The buckets failed to separate anything, fall back to a median split
        if mid == 0 || mid == geometry.len() {
            geometry.sort_unstable_by(|a, b| {
                a.center
                    .axis(split_axis)
                    .partial_cmp(&b.center.axis(split_axis))
                    .unwrap_or(Ordering::Equal)
            });
            mid = geometry.len() / 2;
        }

        let (left, right) = geometry.split_at_mut(mid);
        let left = Box::new(BVH::build(
            left,
            index_to_geometry,
            total_nodes,
            split_threshold,
        ));
        let right = Box::new(BVH::build(
            right,
            index_to_geometry,
            total_nodes,
            split_threshold,
        ));
        BuildNode::interior(left, right)
    }

    fn build_leaf(
        geometry: &mut [GeometryInfo],
        index_to_geometry: &mut Vec<usize>,
        bounds: AABB,
    ) -> BuildNode {
        let geometry_offset = index_to_geometry.len();
        index_to_geometry.extend(geometry.iter().map(|g| g.index));
        BuildNode::leaf(bounds, geometry_offset, geometry.len())
    }

    fn flatten(root: BuildNode, size: usize) -> Vec<FlatNode> {
        let mut tree = Vec::with_capacity(size);
        Self::flatten_impl(root, &mut tree);

        tree
    }

    fn flatten_impl(node: BuildNode, tree: &mut Vec<FlatNode>) -> usize {
        let offset = tree.len();
        match node.inner {
            BuildNodeInner::Interior { left, right } => {
                tree.push(FlatNode::interior(node.bounds, 0, 0));
                let left_idx = Self::flatten_impl(*left, tree);
                let right_idx = Self::flatten_impl(*right, tree);
                if let FlatNodeInner::Interior {
                    ref mut left,
                    ref mut right,
                } = tree[offset].inner
                {
                    *left = left_idx;
                    *right = right_idx;
                }
            }
            BuildNodeInner::Leaf {
                geometry_offset,
                num_primitives,
            } => {
                tree.push(FlatNode::leaf(node.bounds, geometry_offset, num_primitives));
            }
        }

        offset
    }

    fn intersect_node(
        &self,
        node: &FlatNode,
        rng: &mut dyn RandomGenerator,
        ray: Ray,
        t_min: f32,
        t_max: f32,
    ) -> Option<Hit> {
        if !node.bounds.hit(&ray, t_min, t_max) {
            return None;
        }

        match node.inner {
            FlatNodeInner::Interior { left, right } => {
                let left = match self.tree.get(left) {
                    Some(node) => self.intersect_node(node, rng, ray, t_min, t_max),
                    None => None,
                };
                // Only look for something closer on the right
                let closest = left.as_ref().map_or(t_max, |hit| hit.t);
                let right = match self.tree.get(right) {
                    Some(node) => self.intersect_node(node, rng, ray, t_min, closest),
                    None => None,
                };

                right.or(left)
            }
            FlatNodeInner::Leaf {
                geometry_offset,
                num_primitives,
            } => {
                let mut hit = None;
                let mut closest = t_max;

                // Find the closest intersection
                for primitive in &self.geometry[geometry_offset..geometry_offset + num_primitives] {
                    if let Some(h) = primitive.intersection(rng, ray, t_min, closest) {
                        closest = h.t;
                        hit = Some(h);
                    }
                }

                hit
            }
        }
    }
}

impl Intersect for BVH {
    fn intersection(
        &self,
        rng: &mut dyn RandomGenerator,
        ray: Ray,
        t_min: f32,
        t_max: f32,
    ) -> Option<Hit> {
        let node = self.tree.first()?;
        self.intersect_node(node, rng, ray, t_min, t_max)
    }

    fn bounds(&self, _t0: f32, _t1: f32) -> Option<AABB> {
        self.tree.first().map(|node| node.bounds)
    }

    fn clone_node(&self) -> Arc<dyn Intersect> {
        Arc::new(self.clone())
    }
}

struct GeometryInfo {
    index: usize,
    center: Vec3,
    bounds: AABB,
}

#[derive(Copy, Clone, Debug, Default)]
struct SAHBucket {
    count: usize,
    bounds: Option<AABB>,
}

impl SAHBucket {
    fn merge(buckets: &[SAHBucket]) -> SAHBucket {
        buckets.iter().fold(SAHBucket::default(), |mut a, b| {
            a.bounds = match (a.bounds, b.bounds) {
                (Some(x), Some(y)) => Some(x.union(y)),
                (x, y) => x.or(y),
            };
            a.count += b.count;
            a
        })
    }

    fn area(&self) -> f32 {
        self.bounds.map_or(0.0, |b| b.surface_area())
    }
}

#[derive(Debug)]
enum BuildNodeInner {
    Interior {
        left: Box<BuildNode>,
        right: Box<BuildNode>,
    },
    Leaf {
        geometry_offset: usize,
        num_primitives: usize,
    },
}

#[derive(Debug)]
struct BuildNode {
    bounds: AABB,
    inner: BuildNodeInner,
}

impl BuildNode {
    fn interior(left: Box<BuildNode>, right: Box<BuildNode>) -> Self {
        let bounds = left.bounds.union(right.bounds);

        Self {
            bounds,
            inner: BuildNodeInner::Interior { left, right },
        }
    }

    fn leaf(bounds: AABB, geometry_offset: usize, num_primitives: usize) -> Self {
        Self {
            bounds,
            inner: BuildNodeInner::Leaf {
                geometry_offset,
                num_primitives,
            },
        }
    }
}

#[derive(Clone, Debug)]
enum FlatNodeInner {
    Interior {
        left: usize,
        right: usize,
    },
    Leaf {
        geometry_offset: usize,
        num_primitives: usize,
    },
}

#[derive(Clone, Debug)]
struct FlatNode {
    bounds: AABB,
    inner: FlatNodeInner,
}

impl FlatNode {
    fn interior(bounds: AABB, left: usize, right: usize) -> Self {
        Self {
            bounds,
            inner: FlatNodeInner::Interior { left, right },
        }
    }

    fn leaf(bounds: AABB, geometry_offset: usize, num_primitives: usize) -> Self {
        Self {
            bounds,
            inner: FlatNodeInner::Leaf {
                geometry_offset,
                num_primitives,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        primitives::{ConstantMedium, Sphere},
        rng::seeded,
    };
    use glam::vec3;

    fn row_of_spheres(count: usize) -> Vec<Arc<dyn Intersect>> {
        (0..count)
            .map(|i| {
                let sphere: Arc<dyn Intersect> =
                    Arc::new(Sphere::new(vec3(i as f32 * 3.0, (i % 3) as f32, 0.0), 1.0));
                sphere
            })
            .collect()
    }

    fn brute_force(nodes: &[Arc<dyn Intersect>], ray: Ray) -> Option<f32> {
        let mut rng = seeded(0);
        nodes
            .iter()
            .filter_map(|n| n.intersection(&mut rng, ray, 0.0001, f32::MAX))
            .map(|h| h.t)
            .fold(None, |acc: Option<f32>, t| Some(acc.map_or(t, |a| a.min(t))))
    }

    #[test]
    fn closest_hit_matches_brute_force() {
        let nodes = row_of_spheres(40);
        let bvh = BVH::new(nodes.clone(), 0.0, 1.0).unwrap();
        let mut rng = seeded(0);

        for i in 0..200 {
            let x = i as f32 * 0.6 - 3.0;
            let ray = Ray::new(vec3(x, 10.0, 0.2), vec3(0.05, -1.0, 0.0));
            let expected = brute_force(&nodes, ray);
            let actual = bvh
                .intersection(&mut rng, ray, 0.0001, f32::MAX)
                .map(|h| h.t);

            match (expected, actual) {
                (Some(e), Some(a)) => assert!((e - a).abs() < 1e-4),
                (None, None) => {}
                other => panic!("ray {} disagrees: {:?}", i, other),
            }
        }

        let along = Ray::new(vec3(-5.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0));
        let hit = bvh.intersection(&mut rng, along, 0.0001, f32::MAX).unwrap();
        assert!((hit.t - 4.0).abs() < 1e-4);
    }

    #[test]
    fn bounds_cover_all_nodes() {
        let bvh = BVH::new(row_of_spheres(10), 0.0, 1.0).unwrap();
        let bounds = bvh.bounds(0.0, 1.0).unwrap();

        assert_eq!(bounds.min, vec3(-1.0, -1.0, -1.0));
        assert_eq!(bounds.max, vec3(28.0, 3.0, 1.0));
    }

    #[test]
    fn coincident_nodes_still_build() {
        let sphere: Arc<dyn Intersect> = Arc::new(Sphere::new(Vec3::zero(), 1.0));
        let nodes = vec![sphere; 9];
        let bvh = BVH::new(nodes, 0.0, 1.0).unwrap();
        let ray = Ray::new(vec3(-3.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0));

        assert!(bvh.intersection(&mut seeded(0), ray, 0.0001, f32::MAX).is_some());
    }

    #[test]
    fn media_inside_the_hierarchy_scatter() {
        let fog: Arc<dyn Intersect> = Arc::new(
            ConstantMedium::with_color(
                Arc::new(Sphere::new(vec3(0.0, 0.0, 0.0), 1.0)),
                1000.0,
                Vec3::one(),
            )
            .unwrap(),
        );
        let mut nodes = row_of_spheres(6);
        nodes[0] = fog;
        let bvh = BVH::new(nodes, 0.0, 1.0).unwrap();

        let ray = Ray::new(vec3(-5.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0));
        let hit = bvh.intersection(&mut seeded(1), ray, 0.0001, f32::MAX).unwrap();
        // Dense enough to scatter right after the entry
        assert!(hit.t > 4.0 && hit.t < 4.05);
    }

    #[test]
    fn empty_and_unbounded_input_is_rejected() {
        assert!(matches!(BVH::new(Vec::new(), 0.0, 1.0), Err(Error::EmptyScene)));

        let flat: Arc<dyn Intersect> = Arc::new(BVH {
            geometry: Vec::new(),
            tree: Vec::new(),
        });
        let sphere: Arc<dyn Intersect> = Arc::new(Sphere::new(Vec3::zero(), 1.0));
        assert!(matches!(
            BVH::new(vec![sphere, flat], 0.0, 1.0),
            Err(Error::Unbounded(1))
        ));
    }
}
