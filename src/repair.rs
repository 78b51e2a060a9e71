// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Mesh repair: near-duplicate vertex merging and degenerate face removal

use crate::geometry::{EdgeKey, Mesh, SpatialHash, Triangle};
use crate::verbose_info;

/// Map every vertex to the representative it merges into.
///
/// Vertices are visited in index order; a vertex strictly closer than
/// `threshold` to an earlier representative merges into the nearest one
/// (lowest index on ties), otherwise it becomes a representative itself.
/// Representatives therefore end up pairwise at least `threshold` apart.
pub fn weld_map(mesh: &Mesh, threshold: f64) -> Vec<usize> {
    let vertices = mesh.vertices();
    if threshold <= 0.0 {
        return (0..vertices.len()).collect();
    }

    let mut hash = SpatialHash::new(threshold);
    let mut target = Vec::with_capacity(vertices.len());
    for (i, point) in vertices.iter().enumerate() {
        let nearest = hash
            .candidates(point)
            .into_iter()
            .map(|rep| (rep, (vertices[rep] - point).norm()))
            .filter(|&(_, distance)| distance < threshold)
            .min_by(|x, y| x.1.total_cmp(&y.1).then(x.0.cmp(&y.0)));
        match nearest {
            Some((rep, _)) => target.push(rep),
            None => {
                hash.insert(i, point);
                target.push(i);
            }
        }
    }
    target
}

/// Merge near-duplicate vertices, drop triangles that lose a distinct
/// corner or whose area is below `area_threshold`, and drop unreferenced
/// vertices. Constraint edges follow the merge. Triangles repeating the
/// corners of another triangle are kept; only the welding may create them.
///
/// A threshold of zero disables the corresponding step. Running cleanup
/// twice with the same thresholds changes nothing the second time.
pub fn cleanup(mesh: &Mesh, area_threshold: f64, duplicate_vertex_threshold: f64) -> Mesh {
    let target = weld_map(mesh, duplicate_vertex_threshold);
    let merged = target.iter().enumerate().filter(|&(i, &t)| i != t).count();

    let mut collapsed = 0;
    let mut small = 0;
    let mut triangles = Vec::with_capacity(mesh.triangle_count());
    for triangle in mesh.triangles() {
        let [a, b, c] = triangle.indices.map(|v| target[v]);
        if a == b || b == c || a == c {
            collapsed += 1;
            continue;
        }
        let [pa, pb, pc] = [a, b, c].map(|v| mesh.vertices()[v]);
        let area = (pb - pa).cross(&(pc - pa)).norm() * 0.5;
        if area < area_threshold {
            small += 1;
            continue;
        }
        triangles.push(Triangle::new([a, b, c]));
    }

    let constraints = mesh
        .constrained_edges()
        .iter()
        .map(|e| (target[e.0], target[e.1]))
        .filter(|(a, b)| a != b)
        .map(|(a, b)| EdgeKey::new(a, b))
        .collect::<Vec<_>>();

    verbose_info!(merged, collapsed, small, "cleanup: repaired mesh");
    Mesh::from_parts(mesh.vertices().to_vec(), triangles, constraints).compacted()
}
