// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Bounding Volume Hierarchy (BVH) over triangle boxes
//! Used for intersection candidate pairs and nearest-surface queries

use super::{BoundingBox, Mesh};
use nalgebra::Point3;

const MAX_DEPTH: usize = 32;
const MAX_LEAF_TRIANGLES: usize = 4;

/// BVH node
#[derive(Debug, Clone)]
pub struct BVHNode {
    /// Bounding box of this node
    pub bbox: BoundingBox,
    /// Left child (None for leaf)
    pub left: Option<Box<BVHNode>>,
    /// Right child (None for leaf)
    pub right: Option<Box<BVHNode>>,
    /// Triangle indices (only for leaf nodes)
    pub triangle_indices: Vec<usize>,
}

impl BVHNode {
    fn leaf(bbox: BoundingBox, triangle_indices: Vec<usize>) -> Self {
        Self {
            bbox,
            left: None,
            right: None,
            triangle_indices,
        }
    }

    fn internal(left: Box<BVHNode>, right: Box<BVHNode>) -> Self {
        Self {
            bbox: left.bbox.union(&right.bbox),
            left: Some(left),
            right: Some(right),
            triangle_indices: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Bounding Volume Hierarchy for triangle meshes
#[derive(Debug, Clone)]
pub struct BVH {
    root: BVHNode,
}

impl BVH {
    /// Build from (triangle_index, bbox) pairs
    pub fn build(triangles: Vec<(usize, BoundingBox)>) -> Self {
        if triangles.is_empty() {
            return Self {
                root: BVHNode::leaf(BoundingBox::empty(), Vec::new()),
            };
        }
        Self {
            root: Self::build_recursive(triangles, 0),
        }
    }

    /// Build over every triangle of `mesh`, each box grown by `margin`
    pub fn from_mesh(mesh: &Mesh, margin: f64) -> Self {
        let boxes = (0..mesh.triangle_count())
            .map(|t| (t, BoundingBox::from_points(&mesh.triangle_points(t)).inflated(margin)))
            .collect();
        Self::build(boxes)
    }

    fn build_recursive(mut triangles: Vec<(usize, BoundingBox)>, depth: usize) -> BVHNode {
        let bbox = triangles
            .iter()
            .fold(BoundingBox::empty(), |acc, (_, b)| acc.union(b));

        if triangles.len() <= MAX_LEAF_TRIANGLES || depth >= MAX_DEPTH {
            let indices = triangles.iter().map(|(idx, _)| *idx).collect();
            return BVHNode::leaf(bbox, indices);
        }

        // Median split along the longest axis of the centroid spread
        let centers = BoundingBox::from_points(&triangles.iter().map(|(_, b)| b.center()).collect::<Vec<_>>());
        let axis = centers.longest_axis();
        triangles.sort_by(|(ia, a), (ib, b)| {
            a.center()[axis]
                .total_cmp(&b.center()[axis])
                .then(ia.cmp(ib))
        });

        let right_triangles = triangles.split_off(triangles.len() / 2);
        let left = Box::new(Self::build_recursive(triangles, depth + 1));
        let right = Box::new(Self::build_recursive(right_triangles, depth + 1));
        BVHNode::internal(left, right)
    }

    /// Triangles whose boxes overlap `bbox`, in ascending index order
    pub fn query_triangles(&self, bbox: &BoundingBox) -> Vec<usize> {
        let mut result = Vec::new();
        Self::query_recursive(&self.root, bbox, &mut result);
        result.sort_unstable();
        result
    }

    fn query_recursive(node: &BVHNode, bbox: &BoundingBox, result: &mut Vec<usize>) {
        if !node.bbox.intersects(bbox) {
            return;
        }

        if node.is_leaf() {
            result.extend_from_slice(&node.triangle_indices);
        } else {
            if let Some(ref left) = node.left {
                Self::query_recursive(left, bbox, result);
            }
            if let Some(ref right) = node.right {
                Self::query_recursive(right, bbox, result);
            }
        }
    }

    /// Nearest triangle to `point` with the squared distance to it.
    ///
    /// `distance_sq` maps a triangle index to its squared distance; subtrees
    /// whose boxes are farther than the best candidate are pruned.
    pub fn nearest<F>(&self, point: &Point3<f64>, mut distance_sq: F) -> Option<(usize, f64)>
    where
        F: FnMut(usize) -> f64,
    {
        let mut best: Option<(usize, f64)> = None;
        Self::nearest_recursive(&self.root, point, &mut distance_sq, &mut best);
        best
    }

    fn nearest_recursive<F>(
        node: &BVHNode,
        point: &Point3<f64>,
        distance_sq: &mut F,
        best: &mut Option<(usize, f64)>,
    ) where
        F: FnMut(usize) -> f64,
    {
        if node.bbox.is_empty() {
            return;
        }
        if let Some((_, best_d)) = *best {
            if box_distance_sq(&node.bbox, point) > best_d {
                return;
            }
        }

        if node.is_leaf() {
            for &t in &node.triangle_indices {
                let d = distance_sq(t);
                let better = match *best {
                    None => true,
                    Some((bt, bd)) => d < bd || (d == bd && t < bt),
                };
                if better {
                    *best = Some((t, d));
                }
            }
            return;
        }

        let mut children: Vec<&BVHNode> = node.left.iter().chain(node.right.iter()).map(|c| c.as_ref()).collect();
        children.sort_by(|a, b| box_distance_sq(&a.bbox, point).total_cmp(&box_distance_sq(&b.bbox, point)));
        for child in children {
            Self::nearest_recursive(child, point, distance_sq, best);
        }
    }

    #[cfg(test)]
    pub fn root(&self) -> &BVHNode {
        &self.root
    }
}

fn box_distance_sq(bbox: &BoundingBox, point: &Point3<f64>) -> f64 {
    (0..3)
        .map(|axis| {
            let d = (bbox.min[axis] - point[axis]).max(point[axis] - bbox.max[axis]).max(0.0);
            d * d
        })
        .sum()
}
