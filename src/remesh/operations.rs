// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Local edit passes of the isotropic remesher
//!
//! Each pass rebuilds its adjacency from the face list, edits the mesh in
//! place and never touches a face (or, for collapses, a vertex) twice, so
//! the adjacency it started from stays valid for every edit it performs.

use crate::geometry::triangle_intersection::closest_point_on_triangle;
use crate::geometry::{EdgeKey, Mesh, Triangle, BVH};
use crate::verbose_debug;
use ahash::{AHashMap, AHashSet};
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use smallvec::SmallVec;
use std::collections::BTreeSet;

/// Step size of the tangential relocation
const RELAXATION: f64 = 0.5;

/// Feature valence given to vertices on non-manifold edges, which pins them
const PINNED: usize = 1 << 16;

/// Two feature edges meeting at a vertex count as one straight polyline when
/// the angle between their directions is at least this close to 180 degrees
const STRAIGHT_COS: f64 = -0.95;

/// Flips across a fold sharper than this (cosine between face normals)
/// would change the shape
const FLIP_MIN_NORMAL_COS: f64 = 0.8;

/// Extra split passes allowed beyond four per halving of the longest edge
const SPLIT_PASS_SLACK: usize = 8;

type FaceMap = AHashMap<EdgeKey, SmallVec<[usize; 2]>>;

fn face_map(faces: &[Triangle]) -> FaceMap {
    let mut map: FaceMap = AHashMap::with_capacity(faces.len() * 3 / 2);
    for (f, triangle) in faces.iter().enumerate() {
        for (a, b) in triangle.edges() {
            map.entry(EdgeKey::new(a, b)).or_default().push(f);
        }
    }
    map
}

/// Nearest-point queries against the surface being remeshed
pub(crate) struct Projector {
    surface: Mesh,
    bvh: BVH,
}

impl Projector {
    pub(crate) fn new(surface: &Mesh) -> Self {
        Self {
            surface: surface.clone(),
            bvh: BVH::from_mesh(surface, 0.0),
        }
    }

    pub(crate) fn project(&self, point: &Point3<f64>) -> Point3<f64> {
        let closest = |t: usize| {
            let [a, b, c] = self.surface.triangle_points(t);
            closest_point_on_triangle(point, &a, &b, &c)
        };
        match self.bvh.nearest(point, |t| (closest(t) - point).norm_squared()) {
            Some((t, _)) => closest(t),
            None => *point,
        }
    }
}

/// Mutable mesh the remesher works on
#[derive(Debug, Clone)]
pub(crate) struct WorkMesh {
    positions: Vec<Point3<f64>>,
    faces: Vec<Triangle>,
    constraints: BTreeSet<EdgeKey>,
    /// Vertices referenced by at least one face
    alive: usize,
}

impl WorkMesh {
    pub(crate) fn from_mesh(mesh: &Mesh) -> Self {
        let mut referenced = vec![false; mesh.vertex_count()];
        for triangle in mesh.triangles() {
            for &v in &triangle.indices {
                referenced[v] = true;
            }
        }
        Self {
            positions: mesh.vertices().to_vec(),
            faces: mesh.triangles().to_vec(),
            constraints: mesh.constrained_edges().clone(),
            alive: referenced.iter().filter(|&&r| r).count(),
        }
    }

    pub(crate) fn into_mesh(self) -> Mesh {
        Mesh::from_parts(self.positions, self.faces, self.constraints).compacted()
    }

    pub(crate) fn alive_vertices(&self) -> usize {
        self.alive
    }

    /// Reason the current state is unusable, if any
    pub(crate) fn defect(&self) -> Option<String> {
        if self.alive < 4 {
            return Some(format!("only {} vertices left", self.alive));
        }
        let non_manifold = face_map(&self.faces).values().filter(|faces| faces.len() > 2).count();
        if non_manifold > 0 {
            return Some(format!("{non_manifold} non-manifold edges"));
        }
        None
    }

    fn length(&self, edge: &EdgeKey) -> f64 {
        (self.positions[edge.1] - self.positions[edge.0]).norm()
    }

    fn is_constraint(&self, edge: &EdgeKey, face_count: usize) -> bool {
        face_count == 1 || self.constraints.contains(edge)
    }

    /// Number of constraint or boundary edges at each vertex, with
    /// [`PINNED`] added for vertices on non-manifold edges.
    fn feature_valence(&self, map: &FaceMap) -> Vec<usize> {
        let mut valence = vec![0usize; self.positions.len()];
        for (edge, faces) in map {
            let weight = if faces.len() > 2 {
                PINNED
            } else if self.is_constraint(edge, faces.len()) {
                1
            } else {
                0
            };
            valence[edge.0] += weight;
            valence[edge.1] += weight;
        }
        valence
    }

    /// The two feature neighbours of `vertex` when it sits inside a straight
    /// run of a feature polyline.
    fn polyline_neighbours(&self, vertex: usize, map: &FaceMap, incident: &[SmallVec<[usize; 8]>]) -> Option<[usize; 2]> {
        let mut found: SmallVec<[usize; 2]> = SmallVec::new();
        for &f in &incident[vertex] {
            for (a, b) in self.faces[f].edges() {
                let edge = EdgeKey::new(a, b);
                if !edge.contains(vertex) {
                    continue;
                }
                let other = edge.other(vertex);
                let count = map.get(&edge).map_or(0, |faces| faces.len());
                if self.is_constraint(&edge, count) && !found.contains(&other) {
                    found.push(other);
                }
            }
        }
        if found.len() != 2 {
            return None;
        }
        let p = self.positions[vertex];
        let (u, w) = (self.positions[found[0]] - p, self.positions[found[1]] - p);
        let (lu, lw) = (u.norm(), w.norm());
        if lu == 0.0 || lw == 0.0 || u.dot(&w) / (lu * lw) > STRAIGHT_COS {
            return None;
        }
        Some([found[0], found[1]])
    }

    fn vertex_faces(&self) -> Vec<SmallVec<[usize; 8]>> {
        let mut incident = vec![SmallVec::new(); self.positions.len()];
        for (f, triangle) in self.faces.iter().enumerate() {
            for &v in &triangle.indices {
                incident[v].push(f);
            }
        }
        incident
    }

    /// Split edges longer than `max_length` at their midpoints until none is
    /// left. Constraint edges are skipped when `protect` is set; split
    /// constraints stay constrained in both halves.
    ///
    /// Edges that can never be split (protected features and non-manifold
    /// edges) fence their faces: an edge of such a face is only split while
    /// it is longer than the fence, since the face always keeps an edge of
    /// at least half the fence length.
    pub(crate) fn split_long_edges(&mut self, max_length: f64, protect: bool) -> usize {
        let longest = self
            .faces
            .iter()
            .flat_map(|t| t.edges())
            .map(|(a, b)| self.length(&EdgeKey::new(a, b)))
            .fold(0.0, f64::max);
        let levels = if longest > max_length {
            (longest / max_length).log2().ceil() as usize
        } else {
            0
        };
        let max_passes = 4 * levels + SPLIT_PASS_SLACK;

        let mut total = 0;
        for _ in 0..max_passes {
            let splits = self.split_pass(max_length, protect);
            total += splits;
            if splits == 0 {
                return total;
            }
        }
        verbose_debug!(passes = max_passes, splits = total, "remesh: split pass limit reached");
        total
    }

    fn split_pass(&mut self, max_length: f64, protect: bool) -> usize {
        let map = face_map(&self.faces);
        let blocked = |edge: &EdgeKey, count: usize| count > 2 || (protect && self.is_constraint(edge, count));

        let mut fence = vec![0.0f64; self.faces.len()];
        for (edge, faces) in &map {
            if blocked(edge, faces.len()) {
                let length = self.length(edge);
                for &f in faces {
                    fence[f] = fence[f].max(length);
                }
            }
        }

        let mut candidates: Vec<(EdgeKey, f64)> = map
            .iter()
            .filter(|(edge, faces)| !blocked(*edge, faces.len()))
            .map(|(edge, faces)| (*edge, self.length(edge), faces))
            .filter(|&(_, length, faces)| length > max_length && faces.iter().all(|&f| length > fence[f]))
            .map(|(edge, length, _)| (edge, length))
            .collect();
        candidates.sort_by(|x, y| y.1.total_cmp(&x.1).then(x.0.cmp(&y.0)));

        let mut touched = vec![false; self.faces.len()];
        let mut splits = 0;
        for (edge, _) in candidates {
            let faces = &map[&edge];
            if faces.iter().any(|&f| touched[f]) {
                continue;
            }
            let midpoint = nalgebra::center(&self.positions[edge.0], &self.positions[edge.1]);
            let m = self.positions.len();
            self.positions.push(midpoint);

            for &f in faces.iter() {
                let triangle = self.faces[f];
                let Some(c) = triangle.opposite(edge.0, edge.1) else {
                    continue;
                };
                let (x, y) = if triangle.has_directed_edge(edge.0, edge.1) {
                    (edge.0, edge.1)
                } else {
                    (edge.1, edge.0)
                };
                self.faces[f] = Triangle::new([x, m, c]);
                self.faces.push(Triangle::new([m, y, c]));
                touched[f] = true;
                touched.push(true);
            }
            if self.constraints.remove(&edge) {
                self.constraints.insert(EdgeKey::new(edge.0, m));
                self.constraints.insert(EdgeKey::new(m, edge.1));
            }
            self.alive += 1;
            splits += 1;
        }
        splits
    }

    /// Collapse edges shorter than `min_length`, unless the collapse would
    /// break the link condition, fold a face, create an edge longer than
    /// `max_length` or leave fewer than four vertices.
    pub(crate) fn collapse_short_edges(&mut self, min_length: f64, max_length: f64, protect: bool) -> usize {
        let map = face_map(&self.faces);
        let incident = self.vertex_faces();
        let valence = self.feature_valence(&map);

        let mut candidates: Vec<(EdgeKey, f64)> = map
            .iter()
            .filter(|(_, faces)| !faces.is_empty() && faces.len() <= 2)
            .map(|(edge, _)| (*edge, self.length(edge)))
            .filter(|&(_, length)| length < min_length)
            .collect();
        candidates.sort_by(|x, y| x.1.total_cmp(&y.1).then(x.0.cmp(&y.0)));

        let mut locked = vec![false; self.positions.len()];
        let mut dead = vec![false; self.faces.len()];
        let mut collapses = 0;

        for (edge, _) in candidates {
            if self.alive <= 4 {
                break;
            }
            let (a, b) = (edge.0, edge.1);
            if locked[a] || locked[b] {
                continue;
            }
            let edge_faces = &map[&edge];
            let constraint = self.is_constraint(&edge, edge_faces.len());
            if constraint && protect {
                continue;
            }

            // (removed, kept): the kept vertex keeps its position
            let (removed, kept) = if constraint {
                let slides = |v: usize| self.polyline_neighbours(v, &map, &incident).is_some();
                match (slides(a), slides(b)) {
                    (true, _) => (a, b),
                    (false, true) => (b, a),
                    (false, false) => continue,
                }
            } else {
                match (valence[a] == 0, valence[b] == 0) {
                    (true, _) => (a, b),
                    (false, true) => (b, a),
                    (false, false) => continue,
                }
            };
            let target = self.positions[kept];

            let ring = |v: usize| -> AHashSet<usize> {
                incident[v]
                    .iter()
                    .flat_map(|&f| self.faces[f].indices)
                    .filter(|&u| u != v)
                    .collect()
            };
            let (ring_a, ring_b) = (ring(a), ring(b));

            // Link condition
            let opposite: AHashSet<usize> = edge_faces
                .iter()
                .filter_map(|&f| self.faces[f].opposite(a, b))
                .collect();
            let common = ring_a.iter().filter(|v| ring_b.contains(v)).count();
            if common != opposite.len() || !opposite.iter().all(|v| ring_a.contains(v) && ring_b.contains(v)) {
                continue;
            }

            let ring_removed = if removed == a { &ring_a } else { &ring_b };
            if ring_removed
                .iter()
                .any(|&v| v != kept && (self.positions[v] - target).norm() > max_length)
            {
                continue;
            }

            let folds = incident[removed].iter().any(|&f| {
                let triangle = self.faces[f];
                if triangle.contains(kept) {
                    return false;
                }
                let [p, q, r] = triangle.indices.map(|v| self.positions[v]);
                let before = (q - p).cross(&(r - p));
                let [p, q, r] = triangle
                    .indices
                    .map(|v| if v == removed { target } else { self.positions[v] });
                let after = (q - p).cross(&(r - p));
                after.norm_squared() == 0.0 || after.dot(&before) <= 0.0
            });
            if folds {
                continue;
            }

            for &f in edge_faces.iter() {
                dead[f] = true;
            }
            for &f in &incident[removed] {
                if !dead[f] {
                    let triangle = &mut self.faces[f];
                    triangle.indices = triangle.indices.map(|v| if v == removed { kept } else { v });
                }
            }
            let moved: Vec<EdgeKey> = self.constraints.iter().filter(|e| e.contains(removed)).copied().collect();
            for old in moved {
                self.constraints.remove(&old);
                let other = old.other(removed);
                if other != kept {
                    self.constraints.insert(EdgeKey::new(kept, other));
                }
            }

            for v in ring_a.iter().chain(ring_b.iter()).copied().chain([a, b]) {
                locked[v] = true;
            }
            self.alive -= 1;
            collapses += 1;
        }

        if collapses > 0 {
            let mut index = 0;
            self.faces.retain(|_| {
                let keep = !dead[index];
                index += 1;
                keep
            });
        }
        collapses
    }

    /// Flip interior, unconstrained edges when that brings the four
    /// vertices involved closer to valence 6 (4 on the boundary).
    pub(crate) fn equalize_valences(&mut self) -> usize {
        let map = face_map(&self.faces);
        let mut degree = vec![0i64; self.positions.len()];
        let mut on_boundary = vec![false; self.positions.len()];
        for (edge, faces) in &map {
            degree[edge.0] += 1;
            degree[edge.1] += 1;
            if faces.len() == 1 {
                on_boundary[edge.0] = true;
                on_boundary[edge.1] = true;
            }
        }
        let ideal = |v: usize| if on_boundary[v] { 4 } else { 6 };

        let mut edges: AHashSet<EdgeKey> = map.keys().copied().collect();
        let mut candidates: Vec<EdgeKey> = map
            .iter()
            .filter(|(edge, faces)| faces.len() == 2 && !self.constraints.contains(*edge))
            .map(|(edge, _)| *edge)
            .collect();
        candidates.sort_unstable();

        let mut touched = vec![false; self.faces.len()];
        let mut flips = 0;
        for edge in candidates {
            let (f1, f2) = (map[&edge][0], map[&edge][1]);
            if touched[f1] || touched[f2] {
                continue;
            }
            let (a, b) = if self.faces[f1].has_directed_edge(edge.0, edge.1) {
                (edge.0, edge.1)
            } else {
                (edge.1, edge.0)
            };
            if !self.faces[f2].has_directed_edge(b, a) {
                continue;
            }
            let (Some(c), Some(d)) = (self.faces[f1].opposite(a, b), self.faces[f2].opposite(a, b)) else {
                continue;
            };
            if c == d || edges.contains(&EdgeKey::new(c, d)) {
                continue;
            }

            let deviation = |va: i64, vb: i64, vc: i64, vd: i64| {
                (va - ideal(a)).abs() + (vb - ideal(b)).abs() + (vc - ideal(c)).abs() + (vd - ideal(d)).abs()
            };
            let before = deviation(degree[a], degree[b], degree[c], degree[d]);
            let after = deviation(degree[a] - 1, degree[b] - 1, degree[c] + 1, degree[d] + 1);
            if after >= before {
                continue;
            }

            let [pa, pb, pc, pd] = [a, b, c, d].map(|v| self.positions[v]);
            let n1 = (pb - pa).cross(&(pc - pa));
            let n2 = (pa - pb).cross(&(pd - pb));
            let m1 = (pd - pa).cross(&(pc - pa));
            let m2 = (pc - pb).cross(&(pd - pb));
            if !self.flip_keeps_shape(&n1, &n2, &m1, &m2) {
                continue;
            }

            self.faces[f1] = Triangle::new([a, d, c]);
            self.faces[f2] = Triangle::new([b, c, d]);
            touched[f1] = true;
            touched[f2] = true;
            edges.remove(&edge);
            edges.insert(EdgeKey::new(c, d));
            degree[a] -= 1;
            degree[b] -= 1;
            degree[c] += 1;
            degree[d] += 1;
            flips += 1;
        }
        flips
    }

    fn flip_keeps_shape(&self, n1: &Vector3<f64>, n2: &Vector3<f64>, m1: &Vector3<f64>, m2: &Vector3<f64>) -> bool {
        let (l1, l2, k1, k2) = (n1.norm(), n2.norm(), m1.norm(), m2.norm());
        if l1 == 0.0 || l2 == 0.0 || k1 == 0.0 || k2 == 0.0 {
            return false;
        }
        if n1.dot(n2) / (l1 * l2) < FLIP_MIN_NORMAL_COS {
            return false;
        }
        let sum = n1 + n2;
        m1.dot(&sum) > 0.0 && m2.dot(&sum) > 0.0 && m1.dot(m2) > 0.0
    }

    /// Move every free vertex part of the way toward the centroid of its one
    /// ring, within its tangent plane, then back onto the reference surface.
    /// With `relax`, vertices inside straight feature runs slide along them.
    pub(crate) fn relax_vertices(&mut self, reference: &Projector, relax: bool) {
        let map = face_map(&self.faces);
        let incident = self.vertex_faces();
        let valence = self.feature_valence(&map);

        let moved: Vec<Option<Point3<f64>>> = (0..self.positions.len())
            .into_par_iter()
            .map(|v| {
                if incident[v].is_empty() {
                    return None;
                }
                let p = self.positions[v];
                if valence[v] == 0 {
                    let mut neighbours: SmallVec<[usize; 8]> = SmallVec::new();
                    let mut normal = Vector3::zeros();
                    for &f in &incident[v] {
                        let triangle = self.faces[f];
                        let [a, b, c] = triangle.indices.map(|u| self.positions[u]);
                        normal += (b - a).cross(&(c - a));
                        for u in triangle.indices {
                            if u != v && !neighbours.contains(&u) {
                                neighbours.push(u);
                            }
                        }
                    }
                    let centroid = neighbours
                        .iter()
                        .fold(Vector3::zeros(), |acc, &u| acc + self.positions[u].coords)
                        / neighbours.len() as f64;
                    let mut step = Point3::from(centroid) - p;
                    if let Some(n) = normal.try_normalize(0.0) {
                        step -= n * n.dot(&step);
                    }
                    let q = reference.project(&(p + step * RELAXATION));
                    let folds = incident[v].iter().any(|&f| {
                        let corners = self.faces[f].indices;
                        let [a, b, c] = corners.map(|u| self.positions[u]);
                        let before = (b - a).cross(&(c - a));
                        let [a, b, c] = corners.map(|u| if u == v { q } else { self.positions[u] });
                        (b - a).cross(&(c - a)).dot(&before) <= 0.0
                    });
                    (!folds).then_some(q)
                } else if relax && valence[v] == 2 {
                    let [u, w] = self.polyline_neighbours(v, &map, &incident)?;
                    let (pu, pw) = (self.positions[u], self.positions[w]);
                    let goal = p + (nalgebra::center(&pu, &pw) - p) * RELAXATION;
                    let on_first = closest_on_segment(&goal, &pu, &p);
                    let on_second = closest_on_segment(&goal, &p, &pw);
                    if (on_first - goal).norm_squared() <= (on_second - goal).norm_squared() {
                        Some(on_first)
                    } else {
                        Some(on_second)
                    }
                } else {
                    None
                }
            })
            .collect();

        for (position, update) in self.positions.iter_mut().zip(moved) {
            if let Some(update) = update {
                *position = update;
            }
        }
    }
}

fn closest_on_segment(point: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
    let ab = b - a;
    let length_sq = ab.norm_squared();
    if length_sq == 0.0 {
        return *a;
    }
    let t = ((point - a).dot(&ab) / length_sq).clamp(0.0, 1.0);
    a + ab * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{topology, Primitive};

    #[test]
    fn test_split_converges_below_limit() {
        let grid = Primitive::grid(10.0, 10.0, 1, 1).to_mesh();
        let mut work = WorkMesh::from_mesh(&grid);
        assert!(work.split_long_edges(4.0 / 3.0, false) > 0);
        let mesh = work.into_mesh();
        for edge in mesh.edge_set() {
            let length = (mesh.vertices()[edge.1] - mesh.vertices()[edge.0]).norm();
            assert!(length <= 4.0 / 3.0);
        }
        assert!((mesh.surface_area() - 100.0).abs() < 1e-9);
        assert!(topology::is_manifold(&mesh));
    }

    #[test]
    fn test_protected_boundary_is_not_split() {
        let grid = Primitive::grid(10.0, 10.0, 1, 1).to_mesh();
        let mut work = WorkMesh::from_mesh(&grid);
        // Only the diagonal is free to split
        assert_eq!(work.split_long_edges(11.0, true), 1);
        let mesh = work.into_mesh();
        assert_eq!(mesh.vertex_count(), 5);
        assert_eq!(topology::boundary_edges(&mesh).len(), 4);
    }

    #[test]
    fn test_long_protected_boundary_stops_splitting() {
        // Boundary edges far above the limit can never be split away
        let grid = Primitive::grid(10.0, 10.0, 1, 1).to_mesh();
        let mut work = WorkMesh::from_mesh(&grid);
        assert!(work.split_long_edges(4.0 / 3.0, true) > 0);
        let mesh = work.into_mesh();
        assert_eq!(topology::boundary_edges(&mesh).len(), 4);
        assert!((mesh.surface_area() - 100.0).abs() < 1e-9);
        assert!(topology::is_manifold(&mesh));
    }

    #[test]
    fn test_fin_edge_stops_splitting() {
        // Three faces hang off the edge (0, 1)
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(1.0, 6.0, 0.0),
            Point3::new(1.0, -6.0, 0.0),
            Point3::new(1.0, 0.0, 6.0),
        ];
        let faces = vec![
            Triangle::new([0, 1, 2]),
            Triangle::new([1, 0, 3]),
            Triangle::new([0, 1, 4]),
        ];
        let fin = Mesh::new(vertices, faces).unwrap();
        let mut work = WorkMesh::from_mesh(&fin);
        assert!(work.split_long_edges(1.0, false) > 0);
        let mesh = work.into_mesh();
        assert!(mesh.triangle_count() > 3);
        assert_eq!(topology::edge_faces(&mesh)[&EdgeKey::new(0, 1)].len(), 3);
        assert!((mesh.surface_area() - fin.surface_area()).abs() < 1e-9);
    }

    #[test]
    fn test_split_keeps_constraints() {
        let grid = Primitive::grid(4.0, 4.0, 1, 1).to_mesh();
        let diagonal = grid
            .edge_set()
            .into_iter()
            .find(|e| topology::edge_faces(&grid)[e].len() == 2)
            .unwrap();
        let grid = grid.with_constrained_edges([(diagonal.0, diagonal.1)]).unwrap();
        let mut work = WorkMesh::from_mesh(&grid);
        work.split_long_edges(3.0, false);
        let mesh = work.into_mesh();
        // The diagonal halves are short enough to stay whole
        assert_eq!(mesh.constrained_edges().len(), 2);
    }

    #[test]
    fn test_collapse_respects_vertex_floor() {
        let cube = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), true).to_mesh();
        let mut work = WorkMesh::from_mesh(&cube);
        work.collapse_short_edges(10.0, 100.0, false);
        assert!(work.alive_vertices() >= 4);
        assert!(work.defect().is_none());
    }

    #[test]
    fn test_flip_reduces_valence_deviation() {
        let grid = Primitive::grid(2.0, 2.0, 2, 2).to_mesh();
        let before = grid.clone();
        let mut work = WorkMesh::from_mesh(&grid);
        work.equalize_valences();
        let mesh = work.into_mesh();
        assert_eq!(mesh.triangle_count(), before.triangle_count());
        assert!((mesh.surface_area() - before.surface_area()).abs() < 1e-12);
        assert!(topology::is_manifold(&mesh));
    }

    #[test]
    fn test_projector_snaps_to_surface() {
        let grid = Primitive::grid(2.0, 2.0, 1, 1).to_mesh();
        let projector = Projector::new(&grid);
        let projected = projector.project(&Point3::new(0.25, -0.5, 3.0));
        assert!((projected - Point3::new(0.25, -0.5, 0.0)).norm() < 1e-12);
    }
}
