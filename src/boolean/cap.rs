// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Planar caps for plane-clipped closed meshes

use crate::error::MeshResult;
use crate::geometry::topology::{boundary_loops, edge_faces};
use crate::geometry::{EdgeKey, Mesh, Plane, Triangle};
use crate::{verbose_debug, verbose_info};
use ahash::AHashSet;
use earcutr::earcut;
use nalgebra::Point2;

/// Boundary loop projected into the plane, wound for the cap
struct CapLoop {
    vertices: Vec<usize>,
    points: Vec<Point2<f64>>,
    area: f64,
}

/// Close every boundary loop of `mesh` that lies in `plane` with a planar
/// triangulation facing along the plane normal. Loops nested inside other
/// loops become holes.
pub fn cap_plane_cut(mesh: &Mesh, plane: &Plane, tolerance: f64) -> MeshResult<Mesh> {
    let directed: AHashSet<(usize, usize)> = edge_faces(mesh)
        .into_iter()
        .filter(|(_, faces)| faces.len() == 1)
        .map(|(edge, faces)| {
            let triangle = &mesh.triangles()[faces[0]];
            if triangle.has_directed_edge(edge.0, edge.1) {
                (edge.0, edge.1)
            } else {
                (edge.1, edge.0)
            }
        })
        .collect();

    let (u, v) = plane.basis();
    let origin = plane.origin();
    let mut loops: Vec<CapLoop> = Vec::new();

    for chain in boundary_loops(mesh) {
        let (Some(&first), Some(&last)) = (chain.first(), chain.last()) else {
            continue;
        };
        let closed = chain.len() >= 3 && directed.contains(&(last, first));
        let planar = chain
            .iter()
            .all(|&vertex| plane.signed_distance(&mesh.vertices()[vertex]).abs() <= tolerance);
        if !closed || !planar {
            verbose_debug!(length = chain.len(), closed, planar, "boundary loop not capped");
            continue;
        }

        // The cap runs each boundary edge backwards
        let vertices: Vec<usize> = chain.into_iter().rev().collect();
        let points: Vec<Point2<f64>> = vertices
            .iter()
            .map(|&vertex| {
                let offset = mesh.vertices()[vertex] - origin;
                Point2::new(offset.dot(&u), offset.dot(&v))
            })
            .collect();
        let area = signed_area(&points);
        if area != 0.0 {
            loops.push(CapLoop { vertices, points, area });
        }
    }

    let (outers, holes): (Vec<usize>, Vec<usize>) = (0..loops.len()).partition(|&i| loops[i].area > 0.0);

    let mut holes_of: Vec<Vec<usize>> = vec![Vec::new(); loops.len()];
    for &hole in &holes {
        let probe = loops[hole].points[0];
        let owner = outers
            .iter()
            .copied()
            .filter(|&outer| point_in_polygon(&probe, &loops[outer].points))
            .min_by(|&x, &y| loops[x].area.total_cmp(&loops[y].area));
        match owner {
            Some(outer) => holes_of[outer].push(hole),
            None => verbose_debug!(hole, "hole loop outside every outer loop"),
        }
    }

    let mut triangles: Vec<Triangle> = mesh.triangles().to_vec();
    let mut added = 0;
    for &outer in &outers {
        let mut lookup: Vec<usize> = Vec::new();
        let mut coords: Vec<Point2<f64>> = Vec::new();
        let mut hole_starts: Vec<usize> = Vec::new();
        for (i, &ring) in std::iter::once(&outer).chain(holes_of[outer].iter()).enumerate() {
            if i > 0 {
                hole_starts.push(lookup.len());
            }
            lookup.extend_from_slice(&loops[ring].vertices);
            coords.extend_from_slice(&loops[ring].points);
        }

        let flat: Vec<f64> = coords.iter().flat_map(|p| [p.x, p.y]).collect();
        let indices = match earcut(&flat, &hole_starts, 2) {
            Ok(indices) => indices,
            Err(err) => {
                verbose_debug!(?err, outer, "cap triangulation failed");
                continue;
            }
        };

        for tri in indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]];
            let (pa, pb, pc) = (coords[a], coords[b], coords[c]);
            let cross = (pb - pa).perp(&(pc - pa));
            if cross == 0.0 || lookup[a] == lookup[b] || lookup[b] == lookup[c] || lookup[a] == lookup[c] {
                continue;
            }
            let oriented = if cross > 0.0 {
                [lookup[a], lookup[b], lookup[c]]
            } else {
                [lookup[a], lookup[c], lookup[b]]
            };
            triangles.push(Triangle::new(oriented));
            added += 1;
        }
    }

    verbose_info!(loops = loops.len(), triangles = added, "cap: closed plane cut");
    let constraints: Vec<EdgeKey> = mesh.constrained_edges().iter().copied().collect();
    Ok(Mesh::from_parts(mesh.vertices().to_vec(), triangles, constraints))
}

/// Shoelace area, positive for counter-clockwise loops
fn signed_area(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let (p, q) = (points[i], points[(i + 1) % n]);
            p.x * q.y - q.x * p.y
        })
        .sum::<f64>()
        * 0.5
}

/// Even-odd point-in-polygon test
fn point_in_polygon(point: &Point2<f64>, polygon: &[Point2<f64>]) -> bool {
    let mut inside = false;
    let n = polygon.len();
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > point.y) != (pj.y > point.y) && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boolean::clip::keep_below_plane;
    use crate::boolean::corefine::corefine_with_plane;
    use crate::geometry::{topology, Primitive};
    use nalgebra::Vector3;

    #[test]
    fn test_half_cube_is_capped() {
        let cube = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), true).to_mesh();
        let plane = Plane::new([0.0; 3], [1.0, 0.0, 0.0]).unwrap();
        let split = corefine_with_plane(&cube, &plane, 1e-9).unwrap();
        let half = keep_below_plane(&split, &plane, 1e-9);
        assert!(!topology::is_closed(&half));

        let capped = cap_plane_cut(&half, &plane, 1e-9).unwrap();
        assert!(topology::is_closed(&capped));
        assert!((capped.surface_area() - 4.0).abs() < 1e-9);
        assert!((crate::geometry::signed_volume(&capped) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_signed_area_and_containment() {
        let square = [
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        assert!((signed_area(&square) - 4.0).abs() < 1e-12);
        assert!(point_in_polygon(&Point2::new(1.0, 1.0), &square));
        assert!(!point_in_polygon(&Point2::new(3.0, 1.0), &square));
    }
}
