// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Corefinement of two meshes, or of a mesh and a plane
//!
//! Intersection points are pooled once and shared by both operands, so the
//! refined meshes carry the intersection curve with identical vertex
//! positions. Curve edges are recorded as constraint edges.

use crate::error::MeshResult;
use crate::geometry::robust_predicates::PlaneClassification;
use crate::geometry::topology::{edge_faces, EdgeFaces};
use crate::geometry::triangle_intersection::{
    edge_plane_point, lexicographic_less, triangle_triangle_intersection, Segment, TriangleIntersection,
};
use crate::geometry::triangle_splitting::FaceSplitter;
use crate::geometry::{BoundingBox, EdgeKey, Mesh, Plane, SpatialHash, Triangle, BVH};
use crate::{verbose_debug, verbose_info};
use ahash::AHashMap;
use nalgebra::Point3;
use rayon::prelude::*;
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet};

/// Snapping tolerance used when none is configured
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Operand {
    A,
    B,
}

/// Intersection vertex shared by both operands
#[derive(Debug, Clone)]
struct CurvePoint {
    position: Point3<f64>,
    /// Existing vertex of A at this position
    on_a: Option<usize>,
    /// Existing vertex of B at this position
    on_b: Option<usize>,
}

impl CurvePoint {
    fn corner(&self, operand: Operand) -> Option<usize> {
        match operand {
            Operand::A => self.on_a,
            Operand::B => self.on_b,
        }
    }
}

/// Deduplicating store of intersection vertices.
///
/// A raw point first snaps to the nearest corner of the two faces it came
/// from (ties: A before B, then lowest index), then merges with the nearest
/// earlier pooled point (ties: lowest id).
struct CurvePointPool<'m> {
    a: &'m Mesh,
    b: &'m Mesh,
    points: Vec<CurvePoint>,
    hash: SpatialHash,
    by_a_vertex: AHashMap<usize, usize>,
    by_b_vertex: AHashMap<usize, usize>,
    tolerance: f64,
}

impl<'m> CurvePointPool<'m> {
    fn new(a: &'m Mesh, b: &'m Mesh, tolerance: f64) -> Self {
        Self {
            a,
            b,
            points: Vec::new(),
            hash: SpatialHash::new(tolerance),
            by_a_vertex: AHashMap::new(),
            by_b_vertex: AHashMap::new(),
            tolerance,
        }
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    fn nearest_corner(&self, mesh: &Mesh, face: usize, point: &Point3<f64>) -> Option<(f64, usize)> {
        mesh.triangles()[face]
            .indices
            .iter()
            .map(|&v| ((mesh.vertices()[v] - point).norm(), v))
            .filter(|&(d, _)| d <= self.tolerance)
            .min_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)))
    }

    fn add(&mut self, raw: &Point3<f64>, face_a: usize, face_b: usize) -> usize {
        let corner_a = self.nearest_corner(self.a, face_a, raw);
        let corner_b = self.nearest_corner(self.b, face_b, raw);

        let snapped = match (corner_a, corner_b) {
            (Some(ca), Some(cb)) => {
                if (ca.0, Operand::A, ca.1) <= (cb.0, Operand::B, cb.1) {
                    Some((Operand::A, ca.1))
                } else {
                    Some((Operand::B, cb.1))
                }
            }
            (Some(ca), None) => Some((Operand::A, ca.1)),
            (None, Some(cb)) => Some((Operand::B, cb.1)),
            (None, None) => None,
        };

        let (position, mut on_a, mut on_b) = match snapped {
            Some((Operand::A, v)) => (self.a.vertices()[v], Some(v), None),
            Some((Operand::B, v)) => (self.b.vertices()[v], None, Some(v)),
            None => (*raw, None, None),
        };
        // The snapped position may coincide with a corner of the other operand too
        if on_a.is_none() {
            on_a = self.nearest_corner(self.a, face_a, &position).map(|(_, v)| v);
        }
        if on_b.is_none() {
            on_b = self.nearest_corner(self.b, face_b, &position).map(|(_, v)| v);
        }

        let known = on_a
            .and_then(|v| self.by_a_vertex.get(&v))
            .or_else(|| on_b.and_then(|v| self.by_b_vertex.get(&v)))
            .copied();
        let merged = known.or_else(|| {
            self.hash
                .candidates(&position)
                .into_iter()
                .map(|id| ((self.points[id].position - position).norm(), id))
                .filter(|&(d, _)| d <= self.tolerance)
                .min_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)))
                .map(|(_, id)| id)
        });

        let id = match merged {
            Some(id) => {
                let existing = &mut self.points[id];
                existing.on_a = existing.on_a.or(on_a);
                existing.on_b = existing.on_b.or(on_b);
                id
            }
            None => {
                self.points.push(CurvePoint { position, on_a, on_b });
                self.hash.insert(self.points.len() - 1, &position);
                self.points.len() - 1
            }
        };

        let point = &self.points[id];
        if let Some(v) = point.on_a {
            self.by_a_vertex.entry(v).or_insert(id);
        }
        if let Some(v) = point.on_b {
            self.by_b_vertex.entry(v).or_insert(id);
        }
        id
    }
}

/// Curve points and curve segments attached to one face
#[derive(Debug, Default, Clone)]
struct FaceWork {
    points: SmallVec<[usize; 8]>,
    segments: SmallVec<[(usize, usize); 4]>,
}

impl FaceWork {
    fn add_point(&mut self, id: usize) {
        if !self.points.contains(&id) {
            self.points.push(id);
        }
    }

    fn add_segment(&mut self, p: usize, q: usize) {
        self.add_point(p);
        self.add_point(q);
        if p != q && !self.segments.contains(&(p, q)) && !self.segments.contains(&(q, p)) {
            self.segments.push((p, q));
        }
    }
}

/// Corefine `a` and `b`: both results are refined along their mutual
/// intersection curve, share its vertex positions, and carry its edges as
/// constraints. Disjoint inputs are returned unchanged.
pub fn corefine_meshes(a: &Mesh, b: &Mesh, tolerance: f64) -> MeshResult<(Mesh, Mesh)> {
    if !a.bounding_box().inflated(tolerance).intersects(&b.bounding_box()) {
        verbose_debug!("corefine: bounding boxes are disjoint");
        return Ok((a.clone(), b.clone()));
    }

    let bvh = BVH::from_mesh(b, tolerance);
    let hits: Vec<(usize, usize, TriangleIntersection)> = (0..a.triangle_count())
        .into_par_iter()
        .map(|fa| {
            if a.triangle_area(fa) == 0.0 {
                return Vec::new();
            }
            let tri_a = a.triangle_points(fa);
            let query = BoundingBox::from_points(&tri_a).inflated(tolerance);
            bvh.query_triangles(&query)
                .into_iter()
                .filter(|&fb| b.triangle_area(fb) > 0.0)
                .filter_map(|fb| {
                    let hit = triangle_triangle_intersection(&tri_a, &b.triangle_points(fb), tolerance);
                    hit.intersects().then_some((fa, fb, hit))
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect();

    if hits.is_empty() {
        verbose_debug!("corefine: no intersecting triangle pairs");
        return Ok((a.clone(), b.clone()));
    }

    let mut pool = CurvePointPool::new(a, b, tolerance);
    let mut work_a: BTreeMap<usize, FaceWork> = BTreeMap::new();
    let mut work_b: BTreeMap<usize, FaceWork> = BTreeMap::new();

    for (fa, fb, hit) in &hits {
        let segments: SmallVec<[Segment; 4]> = match hit {
            TriangleIntersection::None => SmallVec::new(),
            TriangleIntersection::Point(p) => smallvec::smallvec![[*p, *p]],
            TriangleIntersection::Segment(p, q) => smallvec::smallvec![[*p, *q]],
            TriangleIntersection::Coplanar { on_a, on_b } => on_a.iter().chain(on_b.iter()).copied().collect(),
        };
        for [p, q] in segments {
            let ip = pool.add(&p, *fa, *fb);
            let iq = pool.add(&q, *fa, *fb);
            work_a.entry(*fa).or_default().add_segment(ip, iq);
            work_b.entry(*fb).or_default().add_segment(ip, iq);
        }
    }

    verbose_info!(
        pairs = hits.len(),
        curve_points = pool.len(),
        faces_a = work_a.len(),
        faces_b = work_b.len(),
        "corefine: intersection curve collected"
    );

    let refined_a = refine_operand(a, Operand::A, &pool.points, work_a, tolerance)?;
    let refined_b = refine_operand(b, Operand::B, &pool.points, work_b, tolerance)?;
    Ok((refined_a, refined_b))
}

/// Side of the triangle (a, b, c) that `point` lies on, if any.
///
/// Endpoints are taken in lexicographic order so faces sharing an edge
/// agree on the answer.
fn side_of(point: &Point3<f64>, corners: &[Point3<f64>; 3], tolerance: f64) -> Option<usize> {
    (0..3).find(|&s| on_segment(point, &corners[s], &corners[(s + 1) % 3], tolerance))
}

fn on_segment(point: &Point3<f64>, p: &Point3<f64>, q: &Point3<f64>, tolerance: f64) -> bool {
    let (p, q) = if lexicographic_less(q, p) { (q, p) } else { (p, q) };
    let direction = q - p;
    let length_sq = direction.norm_squared();
    if length_sq == 0.0 {
        return false;
    }
    let t = (point - p).dot(&direction) / length_sq;
    t > 0.0 && t < 1.0 && (p + direction * t - point).norm() <= tolerance
}

/// Parameter of `point` along edge `(from, to)`
fn edge_parameter(vertices: &[Point3<f64>], from: usize, to: usize, point: &Point3<f64>) -> f64 {
    let direction = vertices[to] - vertices[from];
    (point - vertices[from]).dot(&direction) / direction.norm_squared()
}

/// Re-triangulate the faces of one operand that carry curve points.
fn refine_operand(
    mesh: &Mesh,
    operand: Operand,
    curve: &[CurvePoint],
    mut work: BTreeMap<usize, FaceWork>,
    tolerance: f64,
) -> MeshResult<Mesh> {
    // Vertex of this operand for each curve point, new ones in curve order
    let used: BTreeSet<usize> = work.values().flat_map(|w| w.points.iter().copied()).collect();
    let mut vertices = mesh.vertices().to_vec();
    let mut vertex_of: AHashMap<usize, usize> = AHashMap::with_capacity(used.len());
    for &id in &used {
        let point = &curve[id];
        let vertex = match point.corner(operand) {
            Some(v) => {
                vertices[v] = point.position;
                v
            }
            None => {
                vertices.push(point.position);
                vertices.len() - 1
            }
        };
        vertex_of.insert(id, vertex);
    }

    // Points on a face side also belong to the faces across that side
    let faces: EdgeFaces = edge_faces(mesh);
    let mut on_edges: BTreeMap<EdgeKey, Vec<usize>> = BTreeMap::new();
    let snapshot: Vec<(usize, usize)> = work
        .iter()
        .flat_map(|(&f, w)| w.points.iter().map(move |&id| (f, id)))
        .collect();
    for (face, id) in snapshot {
        let triangle = mesh.triangles()[face];
        let vertex = vertex_of[&id];
        if triangle.contains(vertex) {
            continue;
        }
        let corners = triangle.indices.map(|v| vertices[v]);
        let Some(side) = side_of(&vertices[vertex], &corners, tolerance) else {
            continue;
        };
        let key = EdgeKey::new(triangle.indices[side], triangle.indices[(side + 1) % 3]);
        let along = on_edges.entry(key).or_default();
        if !along.contains(&vertex) {
            along.push(vertex);
        }
        if let Some(neighbors) = faces.get(&key) {
            for &n in neighbors.iter().filter(|&&n| n != face) {
                work.entry(n).or_default().add_point(id);
            }
        }
    }

    let affected: Vec<(usize, FaceWork)> = work.into_iter().collect();
    let results: Vec<Option<(Vec<[usize; 3]>, Vec<EdgeKey>)>> = affected
        .par_iter()
        .map(|(face, face_work)| split_face(mesh, *face, face_work, &vertices, &vertex_of, tolerance))
        .collect::<MeshResult<_>>()?;

    let mut replaced: AHashMap<usize, Vec<[usize; 3]>> = AHashMap::with_capacity(affected.len());
    let mut constraints: Vec<EdgeKey> = Vec::new();
    for ((face, _), result) in affected.iter().zip(results) {
        if let Some((triangles, curve_edges)) = result {
            replaced.insert(*face, triangles);
            constraints.extend(curve_edges);
        }
    }

    let mut triangles = Vec::with_capacity(mesh.triangle_count() + 2 * replaced.len());
    for (face, triangle) in mesh.triangles().iter().enumerate() {
        match replaced.get(&face) {
            Some(pieces) => triangles.extend(pieces.iter().map(|&t| Triangle::new(t))),
            None => triangles.push(*triangle),
        }
    }

    // Existing constraint edges split by curve points become chains
    for edge in mesh.constrained_edges() {
        match on_edges.get(edge) {
            Some(inner) => {
                let mut chain: Vec<(f64, usize)> = inner
                    .iter()
                    .map(|&v| (edge_parameter(&vertices, edge.0, edge.1, &vertices[v]), v))
                    .collect();
                chain.sort_by(|x, y| x.0.total_cmp(&y.0));
                let sequence: Vec<usize> = std::iter::once(edge.0)
                    .chain(chain.into_iter().map(|(_, v)| v))
                    .chain(std::iter::once(edge.1))
                    .collect();
                constraints.extend(sequence.windows(2).map(|w| EdgeKey::new(w[0], w[1])));
            }
            None => constraints.push(*edge),
        }
    }

    Ok(Mesh::from_parts(vertices, triangles, constraints))
}

/// Split one face along its curve points and segments. Zero-area faces are
/// left untouched.
fn split_face(
    mesh: &Mesh,
    face: usize,
    work: &FaceWork,
    vertices: &[Point3<f64>],
    vertex_of: &AHashMap<usize, usize>,
    tolerance: f64,
) -> MeshResult<Option<(Vec<[usize; 3]>, Vec<EdgeKey>)>> {
    let triangle = mesh.triangles()[face];
    let corners = triangle.indices.map(|v| vertices[v]);
    if (corners[1] - corners[0]).cross(&(corners[2] - corners[0])).norm() == 0.0 {
        verbose_debug!(face, "corefine: zero-area face left unsplit");
        return Ok(None);
    }
    let mut splitter = FaceSplitter::new(corners, triangle.indices, tolerance)?;

    let mut ordered: Vec<usize> = work.points.to_vec();
    ordered.sort_unstable();

    let mut local_of: AHashMap<usize, usize> = AHashMap::with_capacity(ordered.len());
    let mut interior = Vec::new();
    for &id in &ordered {
        let vertex = vertex_of[&id];
        if let Some(corner) = triangle.indices.iter().position(|&v| v == vertex) {
            local_of.insert(id, corner);
        } else if let Some(side) = side_of(&vertices[vertex], &corners, tolerance) {
            let local = splitter.insert_on_side(&vertices[vertex], vertex, side)?;
            local_of.insert(id, local);
        } else {
            interior.push(id);
        }
    }
    for id in interior {
        let vertex = vertex_of[&id];
        let local = splitter.insert_point(&vertices[vertex], vertex)?;
        local_of.insert(id, local);
    }
    for &(p, q) in &work.segments {
        splitter.insert_segment(local_of[&p], local_of[&q])?;
    }
    Ok(Some(splitter.finish()))
}

/// Split `mesh` along `plane`. Each edge crossing the plane gets one new
/// vertex; edges lying in the plane are marked as constraints.
pub fn corefine_with_plane(mesh: &Mesh, plane: &Plane, tolerance: f64) -> MeshResult<Mesh> {
    let distances: Vec<f64> = mesh.vertices().iter().map(|p| plane.signed_distance(p)).collect();
    let sides: Vec<PlaneClassification> = mesh.vertices().iter().map(|p| plane.classify(p, tolerance)).collect();

    let mut vertices = mesh.vertices().to_vec();
    let mut crossings: BTreeMap<EdgeKey, usize> = BTreeMap::new();
    for edge in mesh.edge_set() {
        let straddles = matches!(
            (sides[edge.0], sides[edge.1]),
            (PlaneClassification::Back, PlaneClassification::Front)
                | (PlaneClassification::Front, PlaneClassification::Back)
        );
        if straddles {
            let point = edge_plane_point(
                &vertices[edge.0],
                distances[edge.0],
                &vertices[edge.1],
                distances[edge.1],
            );
            vertices.push(point);
            crossings.insert(edge, vertices.len() - 1);
        }
    }

    let mut on_plane: Vec<bool> = sides.iter().map(|&s| s == PlaneClassification::OnPlane).collect();
    on_plane.resize(vertices.len(), true);

    let affected: Vec<usize> = (0..mesh.triangle_count())
        .filter(|&f| {
            mesh.triangles()[f]
                .edges()
                .iter()
                .any(|&(u, v)| crossings.contains_key(&EdgeKey::new(u, v)))
        })
        .collect();

    let results: Vec<Option<Vec<[usize; 3]>>> = affected
        .par_iter()
        .map(|&face| {
            let triangle = mesh.triangles()[face];
            let corners = triangle.indices.map(|v| vertices[v]);
            if (corners[1] - corners[0]).cross(&(corners[2] - corners[0])).norm() == 0.0 {
                return Ok(None);
            }
            let mut splitter = FaceSplitter::new(corners, triangle.indices, tolerance)?;
            let mut cut: SmallVec<[usize; 3]> = (0..3).filter(|&c| on_plane[triangle.indices[c]]).collect();
            for (side, (u, v)) in triangle.edges().into_iter().enumerate() {
                if let Some(&vertex) = crossings.get(&EdgeKey::new(u, v)) {
                    cut.push(splitter.insert_on_side(&vertices[vertex], vertex, side)?);
                }
            }
            if cut.len() == 2 {
                splitter.insert_segment(cut[0], cut[1])?;
            }
            Ok(Some(splitter.finish().0))
        })
        .collect::<MeshResult<_>>()?;

    let replaced: AHashMap<usize, Vec<[usize; 3]>> = affected
        .iter()
        .zip(results)
        .filter_map(|(&face, result)| result.map(|pieces| (face, pieces)))
        .collect();

    let mut triangles = Vec::with_capacity(mesh.triangle_count() + 2 * replaced.len());
    for (face, triangle) in mesh.triangles().iter().enumerate() {
        match replaced.get(&face) {
            Some(pieces) => triangles.extend(pieces.iter().map(|&t| Triangle::new(t))),
            None => triangles.push(*triangle),
        }
    }

    let mut constraints: Vec<EdgeKey> = Vec::new();
    for edge in mesh.constrained_edges() {
        match crossings.get(edge) {
            Some(&middle) => {
                constraints.push(EdgeKey::new(edge.0, middle));
                constraints.push(EdgeKey::new(middle, edge.1));
            }
            None => constraints.push(*edge),
        }
    }
    let planar_edges: BTreeSet<EdgeKey> = triangles
        .iter()
        .flat_map(|t| t.edges())
        .filter(|&(u, v)| on_plane[u] && on_plane[v])
        .map(|(u, v)| EdgeKey::new(u, v))
        .collect();
    constraints.extend(planar_edges);

    verbose_info!(
        crossings = crossings.len(),
        split_faces = replaced.len(),
        "corefine: mesh split by plane"
    );
    Ok(Mesh::from_parts(vertices, triangles, constraints))
}
