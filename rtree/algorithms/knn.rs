//! Nearest neighbor search for the R-tree
//!
//! Implements the branch-and-bound algorithm of Roussopoulos, Kelley and Vincent
//! ("Nearest Neighbor Queries", SIGMOD 1995). The tree is traversed depth-first;
//! at every index node the child entries are visited in ascending MINDIST order
//! and whole branches are pruned when they cannot contain a better candidate.
//!
//! ## Pruning
//!
//! - Single neighbor: a branch is discarded when its MINDIST exceeds the smallest
//!   MINMAXDIST among its siblings (some object is guaranteed to be at least that
//!   close), or when it exceeds the best distance found so far.
//! - K neighbors: MINMAXDIST only guarantees *one* object, so the k-nearest search
//!   prunes a branch only once the result buffer is full and the branch's MINDIST
//!   exceeds the k-th best distance.
//!
//! All distances are compared squared; the square root is only taken for
//! [`KnnResult::distance`].

use super::super::node::{Entry, NodeId};
use super::super::rectangle::Point;
use super::super::rtree::RTree;
use std::cmp::Ordering;

/// Result of a KNN search: an item and its distance to the query point
#[derive(Debug, Clone, PartialEq)]
pub struct KnnResult<'a, T> {
    /// The item found
    pub item: &'a T,
    /// Euclidean distance from the query point to the item's bounding rectangle
    pub distance: f64,
}

/// A child branch of an index node, ready for ordering and pruning
struct Branch {
    min_dist: f64,
    min_max_dist: f64,
    child: NodeId,
}

fn by_distance(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

impl<T, const D: usize> RTree<T, D> {
    /// Find the item whose bounding rectangle is closest to `point`
    ///
    /// Returns `None` on an empty tree.
    pub fn nearest_neighbor(&self, point: &Point<D>) -> Option<&T> {
        let mut best = None;
        self.nearest_recursive(self.root_id(), point, &mut best);
        best.map(|(item, _)| item)
    }

    /// Find the `k` items closest to `point`, nearest first
    ///
    /// Returns fewer than `k` items when the tree holds fewer, and an empty
    /// vector when `k == 0`.
    pub fn nearest_neighbors(&self, k: usize, point: &Point<D>) -> Vec<&T> {
        self.knn_candidates(k, point)
            .into_iter()
            .map(|(item, _)| item)
            .collect()
    }

    /// Same as [`RTree::nearest_neighbors`], also reporting each item's distance
    pub fn nearest_neighbors_with_distance(&self, k: usize, point: &Point<D>) -> Vec<KnnResult<'_, T>> {
        self.knn_candidates(k, point)
            .into_iter()
            .map(|(item, dist2)| KnnResult {
                item,
                distance: dist2.sqrt(),
            })
            .collect()
    }

    fn knn_candidates(&self, k: usize, point: &Point<D>) -> Vec<(&T, f64)> {
        // Early return if k is 0
        if k == 0 {
            return Vec::new();
        }

        let mut results = Vec::with_capacity(k);
        self.knn_recursive(self.root_id(), point, k, &mut results);
        results
    }

    /// Child branches of an index node sorted by ascending MINDIST
    fn sorted_branches(&self, id: NodeId, point: &Point<D>) -> Vec<Branch> {
        let mut branches: Vec<Branch> = self
            .node(id)
            .entries
            .iter()
            .filter_map(|entry| {
                entry.child().map(|child| Branch {
                    min_dist: entry.mbr().min_dist(point),
                    min_max_dist: entry.mbr().min_max_dist(point),
                    child,
                })
            })
            .collect();
        branches.sort_by(|a, b| by_distance(a.min_dist, b.min_dist));
        branches
    }

    fn nearest_recursive<'a>(
        &'a self,
        id: NodeId,
        point: &Point<D>,
        best: &mut Option<(&'a T, f64)>,
    ) {
        let node = self.node(id);

        if node.is_leaf_node() {
            for entry in &node.entries {
                if let Entry::Data { mbr, data } = entry {
                    let dist = mbr.min_dist(point);
                    if best.map_or(true, |(_, best_dist)| dist < best_dist) {
                        *best = Some((data, dist));
                    }
                }
            }
            return;
        }

        let mut branches = self.sorted_branches(id, point);

        // Downward pruning: some object lies within the smallest MINMAXDIST
        let bound = branches
            .iter()
            .map(|branch| branch.min_max_dist)
            .fold(f64::INFINITY, f64::min);
        branches.retain(|branch| branch.min_dist <= bound);

        for branch in branches {
            // Upward pruning against the best object found so far
            if let Some((_, best_dist)) = *best {
                if branch.min_dist > best_dist {
                    break;
                }
            }
            self.nearest_recursive(branch.child, point, best);
        }
    }

    fn knn_recursive<'a>(
        &'a self,
        id: NodeId,
        point: &Point<D>,
        k: usize,
        results: &mut Vec<(&'a T, f64)>,
    ) {
        let node = self.node(id);

        if node.is_leaf_node() {
            for entry in &node.entries {
                if let Entry::Data { mbr, data } = entry {
                    insert_nearest(results, k, data, mbr.min_dist(point));
                }
            }
            return;
        }

        for branch in self.sorted_branches(id, point) {
            if results.len() == k && branch.min_dist > results[k - 1].1 {
                break;
            }
            self.knn_recursive(branch.child, point, k, results);
        }
    }
}

/// Insert a candidate into the sorted result buffer, keeping at most `k` entries
///
/// Candidates at equal distance keep their discovery order.
fn insert_nearest<'a, T>(results: &mut Vec<(&'a T, f64)>, k: usize, item: &'a T, dist: f64) {
    if results.len() == k && results.last().is_some_and(|(_, last)| dist >= *last) {
        return;
    }

    let position = results.partition_point(|(_, d)| *d <= dist);
    results.insert(position, (item, dist));
    results.truncate(k);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtree::rectangle::{Point2, Point3, Rect, Rect2, Rect3};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn point_tree(points: &[(f64, f64)]) -> RTree<usize, 2> {
        let mut rtree = RTree::new(2, 3).unwrap();
        for (i, &(x, y)) in points.iter().enumerate() {
            rtree.insert(Rect::from_point(&Point2::xy(x, y)), i);
        }
        rtree
    }

    #[test]
    fn test_nearest_neighbor_empty_tree() {
        let rtree: RTree<u32, 2> = RTree::new(2, 4).unwrap();
        assert!(rtree.nearest_neighbor(&Point2::xy(0.0, 0.0)).is_none());
        assert!(rtree.nearest_neighbors(3, &Point2::xy(0.0, 0.0)).is_empty());
    }

    #[test]
    fn test_nearest_neighbor_points() {
        let points = [
            (1.0, 1.0),
            (1.0, 3.0),
            (3.0, 2.0),
            (-7.0, -7.0),
            (7.0, 7.0),
            (10.0, 2.0),
        ];
        let rtree = point_tree(&points);
        assert_eq!(rtree.nearest_neighbor(&Point2::xy(0.5, 0.5)), Some(&0));
        assert_eq!(rtree.nearest_neighbor(&Point2::xy(9.0, 3.0)), Some(&5));
        assert_eq!(rtree.nearest_neighbor(&Point2::xy(-100.0, -100.0)), Some(&3));
    }

    #[test]
    fn test_nearest_neighbor_inside_rect() {
        let mut rtree = RTree::new(2, 4).unwrap();
        rtree.insert(Rect2::xyxy(0.0, 0.0, 10.0, 10.0), "big");
        rtree.insert(Rect2::xyxy(11.0, 0.0, 12.0, 1.0), "small");
        // the point lies inside "big", so its distance is 0
        assert_eq!(rtree.nearest_neighbor(&Point2::xy(9.0, 9.0)), Some(&"big"));
    }

    #[test]
    fn test_knn_k_zero_and_k_greater_than_items() {
        let rtree = point_tree(&[(0.0, 0.0), (5.0, 0.0), (2.0, 0.0)]);
        assert!(rtree.nearest_neighbors(0, &Point2::xy(0.0, 0.0)).is_empty());
        assert_eq!(
            rtree.nearest_neighbors(10, &Point2::xy(0.0, 0.0)),
            vec![&0, &2, &1]
        );
    }

    #[test]
    fn test_knn_with_distance() {
        let rtree = point_tree(&[(3.0, 4.0), (0.0, 1.0), (10.0, 10.0)]);
        let results = rtree.nearest_neighbors_with_distance(2, &Point2::xy(0.0, 0.0));
        assert_eq!(results.len(), 2);
        assert_eq!(*results[0].item, 1);
        assert_eq!(results[0].distance, 1.0);
        assert_eq!(*results[1].item, 0);
        assert_eq!(results[1].distance, 5.0);
    }

    #[test]
    fn test_insert_nearest_buffer() {
        let items = [10, 20, 30, 40];
        let mut results = Vec::new();
        insert_nearest(&mut results, 3, &items[0], 4.0);
        insert_nearest(&mut results, 3, &items[1], 1.0);
        insert_nearest(&mut results, 3, &items[2], 9.0);
        insert_nearest(&mut results, 3, &items[3], 2.0);
        let order: Vec<i32> = results.iter().map(|(item, _)| **item).collect();
        assert_eq!(order, vec![20, 40, 10]);

        // not inserted when no closer than the current k-th entry
        insert_nearest(&mut results, 3, &items[2], 4.0);
        assert_eq!(results.len(), 3);
        assert_eq!(*results[2].0, 10);
    }

    #[test]
    fn test_knn_correctness_against_brute_force() {
        let mut rng = StdRng::seed_from_u64(2024);
        let mut rtree = RTree::new(3, 8).unwrap();
        let mut rects = Vec::new();
        for i in 0..400 {
            let rect = Rect2::from_xywh(
                rng.gen_range(-100.0..100.0),
                rng.gen_range(-100.0..100.0),
                rng.gen_range(0.0..2.0),
                rng.gen_range(0.0..2.0),
            );
            rtree.insert(rect, i);
            rects.push(rect);
        }

        for _ in 0..30 {
            let query = Point2::xy(rng.gen_range(-120.0..120.0), rng.gen_range(-120.0..120.0));
            let mut expected: Vec<f64> = rects.iter().map(|r| r.min_dist(&query)).collect();
            expected.sort_by(|a, b| a.partial_cmp(b).unwrap());

            let nearest = rtree.nearest_neighbor(&query).unwrap();
            assert_eq!(rects[*nearest].min_dist(&query), expected[0]);

            let k = rng.gen_range(1..20);
            let found: Vec<f64> = rtree
                .nearest_neighbors(k, &query)
                .into_iter()
                .map(|&i| rects[i].min_dist(&query))
                .collect();
            assert_eq!(found, expected[..k].to_vec());
        }
    }

    #[test]
    fn test_nearest_neighbor_3d() {
        let mut rtree = RTree::new(2, 4).unwrap();
        for i in 0..30 {
            let c = i as f64;
            rtree.insert(Rect3::xyzxyz(c, c, c, c + 0.5, c + 0.5, c + 0.5), i);
        }
        assert_eq!(
            rtree.nearest_neighbor(&Point3::xyz(10.2, 10.2, 10.2)),
            Some(&10)
        );
        assert_eq!(
            rtree.nearest_neighbors(3, &Point3::xyz(-5.0, -5.0, -5.0)),
            vec![&0, &1, &2]
        );
    }
}
