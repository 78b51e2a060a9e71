// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Boolean operations on triangulated surfaces
//!
//! Every operation starts with corefinement, so both operands share the
//! intersection curve, and then keeps whole patches bounded by that curve.

pub mod cap;
pub mod clip;
pub mod corefine;

pub use cap::cap_plane_cut;
pub use clip::{keep_below_plane, select_patches, Selection};
pub use corefine::{corefine_meshes, corefine_with_plane, DEFAULT_TOLERANCE};

use crate::config::CutOptions;
use crate::error::MeshResult;
use crate::geometry::{EdgeKey, Mesh, SpatialHash};

/// Mark every edge present in both meshes (endpoints within `tolerance` of
/// each other) as a constraint in both.
pub fn mark_shared_edges(a: &Mesh, b: &Mesh, tolerance: f64) -> (Mesh, Mesh) {
    let mut hash = SpatialHash::new(tolerance);
    for (i, point) in b.vertices().iter().enumerate() {
        hash.insert(i, point);
    }
    let partner: Vec<Option<usize>> = a
        .vertices()
        .iter()
        .map(|point| {
            hash.candidates(point)
                .into_iter()
                .map(|j| (j, (b.vertices()[j] - point).norm()))
                .filter(|&(_, distance)| distance <= tolerance)
                .min_by(|x, y| x.1.total_cmp(&y.1).then(x.0.cmp(&y.0)))
                .map(|(j, _)| j)
        })
        .collect();

    let edges_b = b.edge_set();
    let mut shared_a = Vec::new();
    let mut shared_b = Vec::new();
    for edge in a.edge_set() {
        if let (Some(p), Some(q)) = (partner[edge.0], partner[edge.1]) {
            let mirrored = EdgeKey::new(p, q);
            if p != q && edges_b.contains(&mirrored) {
                shared_a.push(edge);
                shared_b.push(mirrored);
            }
        }
    }

    let rebuild = |mesh: &Mesh, extra: Vec<EdgeKey>| {
        Mesh::from_parts(
            mesh.vertices().to_vec(),
            mesh.triangles().to_vec(),
            mesh.constrained_edges().iter().copied().chain(extra),
        )
    };
    (rebuild(a, shared_a), rebuild(b, shared_b))
}

/// Union of two closed surfaces: the part of `a` outside `b` followed by the
/// part of `b` outside `a`. Regions where the surfaces coincide with the
/// same orientation are kept once, from `a`.
pub fn union_closed(a: &Mesh, b: &Mesh, tolerance: f64) -> MeshResult<Mesh> {
    let (refined_a, refined_b) = corefine_meshes(a, b, tolerance)?;
    let keep_shared = Selection::Cut(CutOptions {
        preserve_intersection: true,
        preserve_intersection_clipper: false,
    });
    let outside_a = select_patches(&refined_a, &refined_b, keep_shared, tolerance)?;
    let outside_b = select_patches(&refined_b, &refined_a, Selection::Cut(CutOptions::default()), tolerance)?;
    Ok(outside_a.append(&outside_b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{signed_volume, Primitive};
    use nalgebra::{Point3, Vector3};

    fn shifted(mesh: &Mesh, offset: Vector3<f64>) -> Mesh {
        let (vertices, triangles) = mesh.to_buffers();
        let vertices: Vec<Point3<f64>> = vertices
            .iter()
            .map(|v| Point3::new(v[0], v[1], v[2]) + offset)
            .collect();
        let triangles = triangles.into_iter().map(crate::geometry::Triangle::new).collect();
        Mesh::new(vertices, triangles).unwrap()
    }

    #[test]
    fn test_union_of_disjoint_cubes_keeps_both() {
        let a = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), true).to_mesh();
        let b = shifted(&a, Vector3::new(5.0, 0.0, 0.0));
        let union = union_closed(&a, &b, DEFAULT_TOLERANCE).unwrap();
        assert_eq!(union.triangle_count(), 24);
        assert!((signed_volume(&union) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_union_of_overlapping_cubes() {
        let a = Primitive::cube(Vector3::new(2.0, 2.0, 2.0), true).to_mesh();
        let b = shifted(&a, Vector3::new(1.0, 0.3, 0.2));
        let union = union_closed(&a, &b, DEFAULT_TOLERANCE).unwrap();
        // 8 + 8 - overlap (1 x 1.7 x 1.8)
        assert!((signed_volume(&union) - (16.0 - 1.7 * 1.8)).abs() < 1e-6);
    }
}
