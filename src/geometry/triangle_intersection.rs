// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Triangle-triangle intersection
//! Plane-interval method for crossing triangles, 2D edge clipping for coplanar ones

use super::robust_predicates::{orient2d, signed_distance_to_triangle_plane};
use nalgebra::{Point2, Point3, Vector3};

/// Parallel planes below this sine of the dihedral angle are treated as coplanar
const PARALLEL_SINE: f64 = 1e-12;

/// Segment in 3D; both ends equal for a single touching point
pub type Segment = [Point3<f64>; 2];

/// Result of a triangle-triangle intersection test
#[derive(Debug, Clone, PartialEq)]
pub enum TriangleIntersection {
    /// No intersection
    None,
    /// Triangles touch at one point
    Point(Point3<f64>),
    /// Triangles intersect along a line segment
    Segment(Point3<f64>, Point3<f64>),
    /// Triangles are coplanar and overlap. `on_a` are pieces of B's edges
    /// inside A, `on_b` pieces of A's edges inside B.
    Coplanar { on_a: Vec<Segment>, on_b: Vec<Segment> },
}

impl TriangleIntersection {
    pub fn intersects(&self) -> bool {
        !matches!(self, TriangleIntersection::None)
    }
}

/// Intersect two triangles. Vertices within `tolerance` of the other
/// triangle's plane count as lying on it.
pub fn triangle_triangle_intersection(
    tri_a: &[Point3<f64>; 3],
    tri_b: &[Point3<f64>; 3],
    tolerance: f64,
) -> TriangleIntersection {
    let dist_a = tri_a.map(|p| signed_distance_to_triangle_plane(tri_b, &p));
    let side_a = dist_a.map(|d| side(d, tolerance));
    if side_a.iter().all(|&s| s > 0) || side_a.iter().all(|&s| s < 0) {
        return TriangleIntersection::None;
    }

    let dist_b = tri_b.map(|p| signed_distance_to_triangle_plane(tri_a, &p));
    let side_b = dist_b.map(|d| side(d, tolerance));
    if side_b.iter().all(|&s| s > 0) || side_b.iter().all(|&s| s < 0) {
        return TriangleIntersection::None;
    }

    let normal_a = (tri_a[1] - tri_a[0]).cross(&(tri_a[2] - tri_a[0]));
    let normal_b = (tri_b[1] - tri_b[0]).cross(&(tri_b[2] - tri_b[0]));
    let direction = normal_a.cross(&normal_b);
    let scale = normal_a.norm() * normal_b.norm();

    if side_a.iter().all(|&s| s == 0) || side_b.iter().all(|&s| s == 0) || direction.norm() <= PARALLEL_SINE * scale {
        return coplanar_intersection(tri_a, tri_b, &normal_a, tolerance);
    }

    let direction = direction.normalize();
    let on_plane_b = plane_crossing(tri_a, &dist_a, &side_a);
    let on_plane_a = plane_crossing(tri_b, &dist_b, &side_b);
    if on_plane_b.is_empty() || on_plane_a.is_empty() {
        return TriangleIntersection::None;
    }

    let (lo_a, hi_a) = interval(&on_plane_b, &direction);
    let (lo_b, hi_b) = interval(&on_plane_a, &direction);

    // Start of the overlap comes from whichever interval starts later, ties to A
    let lo = if lo_a.0 >= lo_b.0 { lo_a } else { lo_b };
    let hi = if hi_a.0 <= hi_b.0 { hi_a } else { hi_b };

    if lo.0 > hi.0 + tolerance {
        return TriangleIntersection::None;
    }
    if hi.0 - lo.0 <= tolerance {
        return TriangleIntersection::Point(lo.1);
    }
    TriangleIntersection::Segment(lo.1, hi.1)
}

fn side(distance: f64, tolerance: f64) -> i8 {
    if distance > tolerance {
        1
    } else if distance < -tolerance {
        -1
    } else {
        0
    }
}

/// Points where a triangle meets the other triangle's plane: vertices on the
/// plane and strict sign changes along edges.
fn plane_crossing(tri: &[Point3<f64>; 3], dist: &[f64; 3], side: &[i8; 3]) -> Vec<Point3<f64>> {
    let mut points = Vec::with_capacity(2);
    for i in 0..3 {
        if side[i] == 0 {
            points.push(tri[i]);
        }
    }
    for i in 0..3 {
        let j = (i + 1) % 3;
        if side[i] * side[j] < 0 {
            points.push(edge_plane_point(&tri[i], dist[i], &tri[j], dist[j]));
        }
    }
    points
}

/// Crossing point of an edge with a plane. Endpoints are taken in
/// lexicographic order so both triangles sharing the edge get the same point.
pub(crate) fn edge_plane_point(p: &Point3<f64>, dp: f64, q: &Point3<f64>, dq: f64) -> Point3<f64> {
    let (p, dp, q, dq) = if lexicographic_less(q, p) {
        (q, dq, p, dp)
    } else {
        (p, dp, q, dq)
    };
    let t = dp / (dp - dq);
    p + (q - p) * t
}

pub(crate) fn lexicographic_less(a: &Point3<f64>, b: &Point3<f64>) -> bool {
    (a.x, a.y, a.z) < (b.x, b.y, b.z)
}

/// Extent of points along `direction` as ((min, point), (max, point))
fn interval(points: &[Point3<f64>], direction: &Vector3<f64>) -> ((f64, Point3<f64>), (f64, Point3<f64>)) {
    let first = (direction.dot(&points[0].coords), points[0]);
    points[1..].iter().fold((first, first), |(lo, hi), p| {
        let t = direction.dot(&p.coords);
        (
            if t < lo.0 { (t, *p) } else { lo },
            if t > hi.0 { (t, *p) } else { hi },
        )
    })
}

fn coplanar_intersection(
    tri_a: &[Point3<f64>; 3],
    tri_b: &[Point3<f64>; 3],
    normal: &Vector3<f64>,
    tolerance: f64,
) -> TriangleIntersection {
    let axis = dominant_axis(normal);
    let on_a = clip_edges_to_triangle(tri_b, tri_a, axis, tolerance);
    let on_b = clip_edges_to_triangle(tri_a, tri_b, axis, tolerance);
    if on_a.is_empty() && on_b.is_empty() {
        TriangleIntersection::None
    } else {
        TriangleIntersection::Coplanar { on_a, on_b }
    }
}

/// Clip the edges of `edges_of` to the interior of `clip` in the projection
/// that drops `axis`.
fn clip_edges_to_triangle(
    edges_of: &[Point3<f64>; 3],
    clip: &[Point3<f64>; 3],
    axis: usize,
    tolerance: f64,
) -> Vec<Segment> {
    let mut corners = clip.map(|p| project(&p, axis));
    if orient2d(&corners[0], &corners[1], &corners[2]) < 0.0 {
        corners.swap(1, 2);
    }

    let mut segments = Vec::new();
    for i in 0..3 {
        let p = edges_of[i];
        let q = edges_of[(i + 1) % 3];
        let (p, q) = if lexicographic_less(&q, &p) { (q, p) } else { (p, q) };
        if let Some((t0, t1)) = clip_segment_2d(&project(&p, axis), &project(&q, axis), &corners, tolerance) {
            let start = p + (q - p) * t0;
            let end = p + (q - p) * t1;
            if (end - start).norm() <= tolerance {
                segments.push([start, start]);
            } else {
                segments.push([start, end]);
            }
        }
    }
    segments
}

/// Cyrus-Beck clip of segment p->q against a CCW triangle; returns the
/// parameter range kept.
fn clip_segment_2d(p: &Point2<f64>, q: &Point2<f64>, corners: &[Point2<f64>; 3], tolerance: f64) -> Option<(f64, f64)> {
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;
    for i in 0..3 {
        let a = corners[i];
        let b = corners[(i + 1) % 3];
        let slack = tolerance * (b - a).norm();
        let fp = orient2d(&a, &b, p);
        let fq = orient2d(&a, &b, q);

        if fp < -slack && fq < -slack {
            return None;
        }
        if fp >= -slack && fq >= -slack {
            continue;
        }
        let t = fp / (fp - fq);
        if fp < -slack {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
    }
    (t0 <= t1).then_some((t0, t1))
}

/// Axis of the largest normal component
pub(crate) fn dominant_axis(normal: &Vector3<f64>) -> usize {
    let n = normal.abs();
    if n.x >= n.y && n.x >= n.z {
        0
    } else if n.y >= n.z {
        1
    } else {
        2
    }
}

/// Drop `axis` from a point
pub(crate) fn project(point: &Point3<f64>, axis: usize) -> Point2<f64> {
    match axis {
        0 => Point2::new(point.y, point.z),
        1 => Point2::new(point.z, point.x),
        _ => Point2::new(point.x, point.y),
    }
}

/// Closest point to `p` on triangle (a, b, c), by Voronoi region tests
pub fn closest_point_on_triangle(
    p: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> Point3<f64> {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return *a;
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return *b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return *c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let total = va + vb + vc;
    if total == 0.0 {
        return *a;
    }
    a + ab * (vb / total) + ac * (vc / total)
}
