// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Triangle splitting along intersection curves
//!
//! [`FaceSplitter`] re-triangulates one input face so that a set of points
//! become vertices and a set of segments become edges. Work happens in the
//! face's 2D projection; the three original corners bound the domain and
//! the winding of every output triangle matches the input face.

use super::robust_predicates::orient2d;
use super::triangle_intersection::{dominant_axis, project};
use super::EdgeKey;
use crate::error::{MeshError, MeshResult};
use nalgebra::{Point2, Point3};
use std::collections::{BTreeSet, VecDeque};

const OPERATION: &str = "triangle splitting";
const MAX_DELAUNAY_PASSES: usize = 64;

/// Bit set of original face sides a local vertex lies on; side `i` runs
/// from corner `i` to corner `(i + 1) % 3`.
const CORNER_SIDES: [u8; 3] = [0b101, 0b011, 0b110];

/// Constrained re-triangulation of a single face
#[derive(Debug, Clone)]
pub struct FaceSplitter {
    axis: usize,
    mirror: bool,
    tolerance: f64,
    points: Vec<Point2<f64>>,
    /// Global vertex id of each local vertex
    ids: Vec<usize>,
    /// Original sides each local vertex lies on
    sides: Vec<u8>,
    /// Local triangles, counter-clockwise in the (possibly mirrored) projection
    triangles: Vec<[usize; 3]>,
    constraints: BTreeSet<(usize, usize)>,
}

impl FaceSplitter {
    /// Start from a single face with corner positions and global ids.
    pub fn new(corners: [Point3<f64>; 3], ids: [usize; 3], tolerance: f64) -> MeshResult<Self> {
        let normal = (corners[1] - corners[0]).cross(&(corners[2] - corners[0]));
        let axis = dominant_axis(&normal);
        let projected = corners.map(|p| project(&p, axis));
        let orientation = orient2d(&projected[0], &projected[1], &projected[2]);
        if orientation == 0.0 {
            return Err(MeshError::inconsistent(
                OPERATION,
                format!("face {:?} has zero area", ids),
            ));
        }

        let mirror = orientation < 0.0;
        let mut splitter = Self {
            axis,
            mirror,
            tolerance,
            points: Vec::with_capacity(8),
            ids: ids.to_vec(),
            sides: CORNER_SIDES.to_vec(),
            triangles: vec![[0, 1, 2]],
            constraints: BTreeSet::new(),
        };
        splitter.points = corners.iter().map(|p| splitter.to_local(p)).collect();
        Ok(splitter)
    }

    fn to_local(&self, point: &Point3<f64>) -> Point2<f64> {
        let p = project(point, self.axis);
        if self.mirror {
            Point2::new(-p.x, p.y)
        } else {
            p
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// Global id of a local vertex
    pub fn global_id(&self, local: usize) -> usize {
        self.ids[local]
    }

    fn find_id(&self, id: usize) -> Option<usize> {
        self.ids.iter().position(|&existing| existing == id)
    }

    /// Insert a point lying on side `side` of the original face.
    ///
    /// Returns the local index of the vertex now at that position.
    pub fn insert_on_side(&mut self, point: &Point3<f64>, id: usize, side: usize) -> MeshResult<usize> {
        if let Some(local) = self.find_id(id) {
            return Ok(local);
        }
        let p = self.to_local(point);
        let start = self.points[side];
        let end = self.points[(side + 1) % 3];
        let direction = end - start;
        let length_sq = direction.norm_squared();
        let param = |q: &Point2<f64>| (q - start).dot(&direction) / length_sq;
        let t = param(&p);
        let mask = 1u8 << side;

        // Consecutive vertices along the side, ordered by parameter
        let mut on_side: Vec<(f64, usize)> = (0..self.points.len())
            .filter(|&v| self.sides[v] & mask != 0)
            .map(|v| (param(&self.points[v]), v))
            .collect();
        on_side.sort_by(|a, b| a.0.total_cmp(&b.0));

        let snap = self.tolerance / length_sq.sqrt();
        if let Some(&(_, v)) = on_side.iter().find(|(tv, _)| (tv - t).abs() <= snap) {
            return Ok(v);
        }

        let window = on_side
            .windows(2)
            .find(|w| w[0].0 < t && t < w[1].0)
            .map(|w| (w[0].1, w[1].1));
        let Some((u, v)) = window else {
            return Err(MeshError::inconsistent(
                OPERATION,
                format!("point {} lies outside side {} of face {:?}", id, side, &self.ids[..3]),
            ));
        };

        let local = self.push_vertex(p, id, mask);
        self.split_edge(u, v, local)?;
        Ok(local)
    }

    /// Insert a point in the interior of the face.
    ///
    /// Points within tolerance of an existing vertex snap to it; points on
    /// an interior edge split that edge. Returns the local index.
    pub fn insert_point(&mut self, point: &Point3<f64>, id: usize) -> MeshResult<usize> {
        if let Some(local) = self.find_id(id) {
            return Ok(local);
        }
        let p = self.to_local(point);

        if let Some(v) = self.nearest_vertex(&p) {
            if (self.points[v] - p).norm() <= self.tolerance {
                return Ok(v);
            }
        }

        // Containing triangle, allowing tolerance outside its edges
        let mut containing = None;
        for (t, tri) in self.triangles.iter().enumerate() {
            let distances = [0, 1, 2].map(|i| self.edge_distance(tri[i], tri[(i + 1) % 3], &p));
            if distances.iter().all(|&d| d >= -self.tolerance) {
                containing = Some((t, distances));
                break;
            }
        }

        match containing {
            Some((t, distances)) => {
                let tri = self.triangles[t];
                let near_edge = (0..3)
                    .filter(|&i| distances[i] <= self.tolerance)
                    .map(|i| (tri[i], tri[(i + 1) % 3]))
                    .find(|&(a, b)| self.edge_triangles(a, b).1.is_some());
                let local = self.push_vertex(p, id, 0);
                match near_edge {
                    Some((a, b)) => self.split_edge(a, b, local)?,
                    None => self.split_triangle(t, local),
                }
                Ok(local)
            }
            None => Err(MeshError::inconsistent(
                OPERATION,
                format!(
                    "point {} lies outside face {:?} by more than the tolerance",
                    id,
                    &self.ids[..3]
                ),
            )),
        }
    }

    /// Make the segment between two local vertices a chain of constraint
    /// edges.
    pub fn insert_segment(&mut self, a: usize, b: usize) -> MeshResult<()> {
        if a == b {
            return Ok(());
        }
        let pa = self.points[a];
        let pb = self.points[b];
        let direction = pb - pa;
        let length = direction.norm();
        if length == 0.0 {
            return Ok(());
        }

        // Vertices sitting on the segment split it into pieces
        let mut stops: Vec<(f64, usize)> = (0..self.points.len())
            .filter(|&v| v != a && v != b)
            .filter_map(|v| {
                let q = self.points[v];
                let t = (q - pa).dot(&direction) / (length * length);
                let offset = orient2d(&pa, &pb, &q).abs() / length;
                (t > 0.0 && t < 1.0 && offset <= self.tolerance).then_some((t, v))
            })
            .collect();
        stops.sort_by(|x, y| x.0.total_cmp(&y.0));

        let mut chain = Vec::with_capacity(stops.len() + 2);
        chain.push(a);
        chain.extend(stops.into_iter().map(|(_, v)| v));
        chain.push(b);

        for pair in chain.windows(2) {
            self.insert_edge(pair[0], pair[1])?;
        }
        Ok(())
    }

    fn insert_edge(&mut self, u: usize, v: usize) -> MeshResult<()> {
        if self.edge_triangles(u, v).0.is_some() || self.edge_triangles(v, u).0.is_some() {
            self.constraints.insert(sorted(u, v));
            return Ok(());
        }

        let mut crossing: VecDeque<(usize, usize)> = self
            .undirected_edges()
            .into_iter()
            .filter(|&(x, y)| self.crosses(u, v, x, y))
            .collect();
        if let Some(&(x, y)) = crossing.iter().find(|&&(x, y)| self.constraints.contains(&sorted(x, y))) {
            return Err(MeshError::inconsistent(
                OPERATION,
                format!(
                    "segment ({}, {}) crosses constrained edge ({}, {})",
                    self.ids[u], self.ids[v], self.ids[x], self.ids[y]
                ),
            ));
        }

        let limit = 16 * (crossing.len() + 1) * (self.triangles.len() + 1);
        let mut steps = 0;
        while let Some((x, y)) = crossing.pop_front() {
            steps += 1;
            if steps > limit {
                return Err(MeshError::inconsistent(
                    OPERATION,
                    format!("edge flips did not recover segment ({}, {})", self.ids[u], self.ids[v]),
                ));
            }
            let (x, y) = match self.edge_triangles(x, y) {
                (Some(_), Some(_)) => (x, y),
                _ => (y, x),
            };
            let (Some(t1), Some(t2)) = self.edge_triangles(x, y) else {
                return Err(MeshError::inconsistent(
                    OPERATION,
                    format!("crossing edge ({}, {}) lost its neighbours", self.ids[x], self.ids[y]),
                ));
            };
            match self.flip(t1, t2, x, y) {
                Some((w1, w2)) if self.crosses(u, v, w1, w2) => crossing.push_back((w1, w2)),
                Some(_) => {}
                None => crossing.push_back((x, y)),
            }
        }

        if self.edge_triangles(u, v).0.is_none() && self.edge_triangles(v, u).0.is_none() {
            return Err(MeshError::inconsistent(
                OPERATION,
                format!("segment ({}, {}) missing after edge flips", self.ids[u], self.ids[v]),
            ));
        }
        self.constraints.insert(sorted(u, v));
        Ok(())
    }

    /// Finish the triangulation: restore the Delaunay property on
    /// unconstrained interior edges and map back to global ids.
    pub fn finish(mut self) -> (Vec<[usize; 3]>, Vec<EdgeKey>) {
        for _ in 0..MAX_DELAUNAY_PASSES {
            let mut flipped = false;
            for (x, y) in self.undirected_edges() {
                if self.constraints.contains(&sorted(x, y)) {
                    continue;
                }
                let (x, y) = match self.edge_triangles(x, y) {
                    (Some(_), Some(_)) => (x, y),
                    _ => (y, x),
                };
                let (Some(t1), Some(t2)) = self.edge_triangles(x, y) else {
                    continue;
                };
                let w1 = opposite(&self.triangles[t1], x, y);
                let w2 = opposite(&self.triangles[t2], x, y);
                if in_circle(&self.points[x], &self.points[y], &self.points[w1], &self.points[w2])
                    && self.flip(t1, t2, x, y).is_some()
                {
                    flipped = true;
                }
            }
            if !flipped {
                break;
            }
        }

        let triangles = self
            .triangles
            .iter()
            .map(|t| t.map(|v| self.ids[v]))
            .collect();
        let constraints = self
            .constraints
            .iter()
            .map(|&(a, b)| EdgeKey::new(self.ids[a], self.ids[b]))
            .collect();
        (triangles, constraints)
    }

    fn push_vertex(&mut self, point: Point2<f64>, id: usize, sides: u8) -> usize {
        self.points.push(point);
        self.ids.push(id);
        self.sides.push(sides);
        self.points.len() - 1
    }

    fn nearest_vertex(&self, p: &Point2<f64>) -> Option<usize> {
        (0..self.points.len()).min_by(|&a, &b| {
            (self.points[a] - p)
                .norm_squared()
                .total_cmp(&(self.points[b] - p).norm_squared())
        })
    }

    /// Signed distance from `p` to the line a->b, positive on the left
    fn edge_distance(&self, a: usize, b: usize, p: &Point2<f64>) -> f64 {
        let length = (self.points[b] - self.points[a]).norm();
        if length == 0.0 {
            return 0.0;
        }
        orient2d(&self.points[a], &self.points[b], p) / length
    }

    /// Triangles holding directed edge a->b and b->a
    fn edge_triangles(&self, a: usize, b: usize) -> (Option<usize>, Option<usize>) {
        let forward = self.triangles.iter().position(|t| has_directed_edge(t, a, b));
        let backward = self.triangles.iter().position(|t| has_directed_edge(t, b, a));
        (forward, backward)
    }

    fn undirected_edges(&self) -> Vec<(usize, usize)> {
        let edges: BTreeSet<(usize, usize)> = self
            .triangles
            .iter()
            .flat_map(|t| [sorted(t[0], t[1]), sorted(t[1], t[2]), sorted(t[2], t[0])])
            .collect();
        edges.into_iter().collect()
    }

    /// Whether edge (x, y) properly crosses segment (u, v)
    fn crosses(&self, u: usize, v: usize, x: usize, y: usize) -> bool {
        if x == u || x == v || y == u || y == v {
            return false;
        }
        let [pu, pv, px, py] = [u, v, x, y].map(|i| self.points[i]);
        let sx = orient2d(&pu, &pv, &px);
        let sy = orient2d(&pu, &pv, &py);
        let su = orient2d(&px, &py, &pu);
        let sv = orient2d(&px, &py, &pv);
        sx * sy < 0.0 && su * sv < 0.0
    }

    fn split_triangle(&mut self, t: usize, p: usize) {
        let [a, b, c] = self.triangles[t];
        self.triangles[t] = [a, b, p];
        self.triangles.push([b, c, p]);
        self.triangles.push([c, a, p]);
    }

    /// Split edge (a, b) at vertex `p` in both adjacent triangles.
    fn split_edge(&mut self, a: usize, b: usize, p: usize) -> MeshResult<()> {
        let (forward, backward) = self.edge_triangles(a, b);
        if forward.is_none() && backward.is_none() {
            return Err(MeshError::inconsistent(
                OPERATION,
                format!("edge ({}, {}) not found for split", self.ids[a], self.ids[b]),
            ));
        }
        for (t, u, v) in [(forward, a, b), (backward, b, a)] {
            if let Some(t) = t {
                let w = opposite(&self.triangles[t], u, v);
                self.triangles[t] = [u, p, w];
                self.triangles.push([p, v, w]);
            }
        }
        if self.constraints.remove(&sorted(a, b)) {
            self.constraints.insert(sorted(a, p));
            self.constraints.insert(sorted(p, b));
        }
        Ok(())
    }

    /// Flip the diagonal shared by `t1` (holding x->y) and `t2` (holding
    /// y->x). Returns the new diagonal, or `None` when the quad is not
    /// strictly convex.
    fn flip(&mut self, t1: usize, t2: usize, x: usize, y: usize) -> Option<(usize, usize)> {
        let w1 = opposite(&self.triangles[t1], x, y);
        let w2 = opposite(&self.triangles[t2], x, y);
        let [px, py, p1, p2] = [x, y, w1, w2].map(|i| self.points[i]);
        if orient2d(&px, &p2, &p1) <= 0.0 || orient2d(&p2, &py, &p1) <= 0.0 {
            return None;
        }
        self.triangles[t1] = [x, w2, w1];
        self.triangles[t2] = [w2, y, w1];
        Some((w1, w2))
    }
}

fn sorted(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn has_directed_edge(t: &[usize; 3], a: usize, b: usize) -> bool {
    (t[0] == a && t[1] == b) || (t[1] == a && t[2] == b) || (t[2] == a && t[0] == b)
}

fn opposite(t: &[usize; 3], a: usize, b: usize) -> usize {
    t.iter().copied().find(|&v| v != a && v != b).unwrap_or(t[0])
}

/// Whether `d` lies strictly inside the circumcircle of CCW triangle (a, b, c)
fn in_circle(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>, d: &Point2<f64>) -> bool {
    let (adx, ady) = (a.x - d.x, a.y - d.y);
    let (bdx, bdy) = (b.x - d.x, b.y - d.y);
    let (cdx, cdy) = (c.x - d.x, c.y - d.y);
    let alift = adx * adx + ady * ady;
    let blift = bdx * bdx + bdy * bdy;
    let clift = cdx * cdx + cdy * cdy;

    let det = alift * (bdx * cdy - cdx * bdy) + blift * (cdx * ady - adx * cdy) + clift * (adx * bdy - bdx * ady);
    let permanent = alift * ((bdx * cdy).abs() + (cdx * bdy).abs())
        + blift * ((cdx * ady).abs() + (adx * cdy).abs())
        + clift * ((adx * bdy).abs() + (bdx * ady).abs());
    det > 1e-12 * permanent
}
