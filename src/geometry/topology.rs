// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Edge connectivity queries
//! Boundary and manifold checks, boundary loops, and patch flood fill

use super::{EdgeKey, Mesh};
use ahash::AHashMap;
use smallvec::SmallVec;
use std::collections::BTreeSet;

/// Triangles incident to an edge; two for a manifold interior edge
pub type EdgeFaces = AHashMap<EdgeKey, SmallVec<[usize; 2]>>;

/// Build the edge -> incident triangles map
pub fn edge_faces(mesh: &Mesh) -> EdgeFaces {
    let mut map: EdgeFaces = AHashMap::with_capacity(mesh.triangle_count() * 3 / 2);
    for (t, triangle) in mesh.triangles().iter().enumerate() {
        for (a, b) in triangle.edges() {
            map.entry(EdgeKey::new(a, b)).or_default().push(t);
        }
    }
    map
}

/// Edges used by exactly one triangle, sorted
pub fn boundary_edges(mesh: &Mesh) -> BTreeSet<EdgeKey> {
    edge_faces(mesh)
        .into_iter()
        .filter(|(_, faces)| faces.len() == 1)
        .map(|(edge, _)| edge)
        .collect()
}

/// Edges used by more than two triangles, sorted
pub fn non_manifold_edges(mesh: &Mesh) -> Vec<EdgeKey> {
    let mut edges: Vec<EdgeKey> = edge_faces(mesh)
        .into_iter()
        .filter(|(_, faces)| faces.len() > 2)
        .map(|(edge, _)| edge)
        .collect();
    edges.sort_unstable();
    edges
}

/// Check if mesh is manifold (each edge shared by at most 2 triangles)
pub fn is_manifold(mesh: &Mesh) -> bool {
    edge_faces(mesh).values().all(|faces| faces.len() <= 2)
}

/// Check if mesh is closed (each edge shared by exactly 2 triangles)
pub fn is_closed(mesh: &Mesh) -> bool {
    !mesh.is_empty() && edge_faces(mesh).values().all(|faces| faces.len() == 2)
}

/// Boundary loops as vertex sequences following the winding of the
/// triangles that own the boundary edges.
///
/// Open chains (possible at non-manifold vertices) are returned as they are
/// walked; a loop is closed when its last vertex connects back to its first.
pub fn boundary_loops(mesh: &Mesh) -> Vec<Vec<usize>> {
    let faces = edge_faces(mesh);
    let mut outgoing: AHashMap<usize, SmallVec<[usize; 2]>> = AHashMap::new();
    let mut starts: Vec<(usize, usize)> = Vec::new();

    for (edge, incident) in &faces {
        if incident.len() != 1 {
            continue;
        }
        let triangle = &mesh.triangles()[incident[0]];
        let (from, to) = if triangle.has_directed_edge(edge.0, edge.1) {
            (edge.0, edge.1)
        } else {
            (edge.1, edge.0)
        };
        outgoing.entry(from).or_default().push(to);
        starts.push((from, to));
    }
    starts.sort_unstable();
    for targets in outgoing.values_mut() {
        targets.sort_unstable();
    }

    let mut used: AHashMap<(usize, usize), bool> = starts.iter().map(|&e| (e, false)).collect();
    let mut loops = Vec::new();

    for &(start, first) in &starts {
        if used.get(&(start, first)).copied().unwrap_or(true) {
            continue;
        }
        used.insert((start, first), true);
        let mut chain = vec![start];
        let mut current = first;

        while current != start {
            chain.push(current);
            let next = outgoing.get(&current).and_then(|targets| {
                targets
                    .iter()
                    .copied()
                    .find(|&t| !used.get(&(current, t)).copied().unwrap_or(true))
            });
            match next {
                Some(next) => {
                    used.insert((current, next), true);
                    current = next;
                }
                None => break,
            }
        }
        loops.push(chain);
    }
    loops
}

/// Label triangles connected across edges not in `barriers`.
///
/// Returns one patch id per triangle and the number of patches. Ids are
/// assigned in order of each patch's lowest triangle index.
pub fn patches(mesh: &Mesh, barriers: &BTreeSet<EdgeKey>) -> (Vec<usize>, usize) {
    let faces = edge_faces(mesh);
    let mut labels = vec![usize::MAX; mesh.triangle_count()];
    let mut count = 0;

    for seed in 0..mesh.triangle_count() {
        if labels[seed] != usize::MAX {
            continue;
        }
        labels[seed] = count;
        let mut stack = vec![seed];
        while let Some(t) = stack.pop() {
            for (a, b) in mesh.triangles()[t].edges() {
                let key = EdgeKey::new(a, b);
                if barriers.contains(&key) {
                    continue;
                }
                if let Some(neighbors) = faces.get(&key) {
                    // Non-manifold fans are not crossed
                    if neighbors.len() != 2 {
                        continue;
                    }
                    for &n in neighbors {
                        if labels[n] == usize::MAX {
                            labels[n] = count;
                            stack.push(n);
                        }
                    }
                }
            }
        }
        count += 1;
    }
    (labels, count)
}

/// Connectivity summary of a mesh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyReport {
    pub is_manifold: bool,
    pub is_closed: bool,
    pub edge_count: usize,
    pub boundary_edge_count: usize,
    pub non_manifold_edge_count: usize,
    /// V - E + F over referenced vertices
    pub euler_characteristic: i64,
}

pub fn topology_report(mesh: &Mesh) -> TopologyReport {
    let faces = edge_faces(mesh);
    let boundary = faces.values().filter(|f| f.len() == 1).count();
    let non_manifold = faces.values().filter(|f| f.len() > 2).count();

    let mut referenced = vec![false; mesh.vertex_count()];
    for triangle in mesh.triangles() {
        for &v in &triangle.indices {
            referenced[v] = true;
        }
    }
    let vertex_count = referenced.iter().filter(|&&r| r).count();

    TopologyReport {
        is_manifold: non_manifold == 0,
        is_closed: !mesh.is_empty() && boundary == 0 && non_manifold == 0,
        edge_count: faces.len(),
        boundary_edge_count: boundary,
        non_manifold_edge_count: non_manifold,
        euler_characteristic: vertex_count as i64 - faces.len() as i64 + mesh.triangle_count() as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use nalgebra::Vector3;

    #[test]
    fn test_cube_is_closed_manifold() {
        let mesh = Primitive::cube(Vector3::new(10.0, 10.0, 10.0), true).to_mesh();
        let report = topology_report(&mesh);
        assert!(report.is_manifold);
        assert!(report.is_closed);
        assert_eq!(report.edge_count, 18);
        assert_eq!(report.euler_characteristic, 2);
        assert!(boundary_edges(&mesh).is_empty());
    }

    #[test]
    fn test_grid_boundary_loop() {
        let mesh = Primitive::grid(2.0, 2.0, 2, 2).to_mesh();
        assert!(!is_closed(&mesh));
        assert_eq!(boundary_edges(&mesh).len(), 8);

        let loops = boundary_loops(&mesh);
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].len(), 8);
    }

    #[test]
    fn test_patches_split_on_barrier() {
        let mesh = Primitive::grid(2.0, 1.0, 2, 1).to_mesh();
        // Vertical grid line x = 0 separates the two cells
        let barrier: BTreeSet<EdgeKey> = mesh
            .edge_set()
            .into_iter()
            .filter(|e| mesh.vertices()[e.0].x.abs() < 1e-12 && mesh.vertices()[e.1].x.abs() < 1e-12)
            .collect();
        assert_eq!(barrier.len(), 1);

        let (labels, count) = patches(&mesh, &barrier);
        assert_eq!(count, 2);
        assert_eq!(labels.len(), 4);

        let (_, whole) = patches(&mesh, &BTreeSet::new());
        assert_eq!(whole, 1);
    }
}
