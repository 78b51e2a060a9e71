// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Mesh representation and utilities

use super::{validate, BoundingBox};
use crate::error::ValidationError;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Triangle defined by three vertex indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    pub fn new(indices: [usize; 3]) -> Self {
        Self { indices }
    }

    /// Directed edges in winding order
    pub fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.indices;
        [(a, b), (b, c), (c, a)]
    }

    pub fn contains(&self, vertex: usize) -> bool {
        self.indices.contains(&vertex)
    }

    /// Vertex of this triangle that is neither `a` nor `b`
    pub fn opposite(&self, a: usize, b: usize) -> Option<usize> {
        self.indices.iter().copied().find(|&v| v != a && v != b)
    }

    /// Whether the triangle traverses `a -> b` in its winding
    pub fn has_directed_edge(&self, a: usize, b: usize) -> bool {
        self.edges().contains(&(a, b))
    }

    pub fn reversed(&self) -> Self {
        let [a, b, c] = self.indices;
        Self::new([a, c, b])
    }
}

/// Undirected edge, smaller index first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey(pub usize, pub usize);

impl EdgeKey {
    pub fn new(a: usize, b: usize) -> Self {
        if a < b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    pub fn contains(&self, vertex: usize) -> bool {
        self.0 == vertex || self.1 == vertex
    }

    pub fn other(&self, vertex: usize) -> usize {
        if self.0 == vertex {
            self.1
        } else {
            self.0
        }
    }
}

/// Triangulated surface mesh.
///
/// Buffers are owned and immutable once built; every operation returns a new
/// value. [`Mesh::reverse_orientation`] is the only in-place mutation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mesh {
    vertices: Vec<Point3<f64>>,
    triangles: Vec<Triangle>,
    /// Protected edges, e.g. an intersection curve from corefinement
    constraints: BTreeSet<EdgeKey>,
}

impl Mesh {
    /// Build a mesh, rejecting input that violates the mesh invariants.
    pub fn new(vertices: Vec<Point3<f64>>, triangles: Vec<Triangle>) -> Result<Self, ValidationError> {
        let mesh = Self {
            vertices,
            triangles,
            constraints: BTreeSet::new(),
        };
        validate(&mesh)?;
        Ok(mesh)
    }

    /// Build a mesh from raw coordinate and index buffers.
    pub fn from_buffers(vertices: &[[f64; 3]], triangles: &[[i64; 3]]) -> Result<Self, ValidationError> {
        super::validate_buffers(vertices, triangles)?;
        Ok(Self {
            vertices: vertices.iter().map(|v| Point3::new(v[0], v[1], v[2])).collect(),
            // Indices are known to be in range and non-negative here
            triangles: triangles
                .iter()
                .map(|t| Triangle::new([t[0] as usize, t[1] as usize, t[2] as usize]))
                .collect(),
            constraints: BTreeSet::new(),
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Assemble a mesh from parts produced by an algorithm. Constraint edges
    /// that are not edges of the triangles are dropped.
    pub(crate) fn from_parts(
        vertices: Vec<Point3<f64>>,
        triangles: Vec<Triangle>,
        constraints: impl IntoIterator<Item = EdgeKey>,
    ) -> Self {
        let mut mesh = Self {
            vertices,
            triangles,
            constraints: BTreeSet::new(),
        };
        let edges = mesh.edge_set();
        mesh.constraints = constraints.into_iter().filter(|e| edges.contains(e)).collect();
        mesh
    }

    /// Mark additional edges as constraints for later remeshing.
    pub fn with_constrained_edges(
        mut self,
        edges: impl IntoIterator<Item = (usize, usize)>,
    ) -> Result<Self, ValidationError> {
        let existing = self.edge_set();
        for (a, b) in edges {
            let key = EdgeKey::new(a, b);
            if !existing.contains(&key) {
                return Err(ValidationError::UnknownEdge(a, b));
            }
            self.constraints.insert(key);
        }
        Ok(self)
    }

    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn constrained_edges(&self) -> &BTreeSet<EdgeKey> {
        &self.constraints
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Positions of the three corners of a triangle
    pub fn triangle_points(&self, triangle: usize) -> [Point3<f64>; 3] {
        let [a, b, c] = self.triangles[triangle].indices;
        [self.vertices[a], self.vertices[b], self.vertices[c]]
    }

    /// Unnormalized face normal (length is twice the area)
    pub fn face_normal(&self, triangle: usize) -> Vector3<f64> {
        let [a, b, c] = self.triangle_points(triangle);
        (b - a).cross(&(c - a))
    }

    pub fn triangle_area(&self, triangle: usize) -> f64 {
        self.face_normal(triangle).norm() * 0.5
    }

    pub fn surface_area(&self) -> f64 {
        (0..self.triangles.len()).map(|t| self.triangle_area(t)).sum()
    }

    /// Compute bounding box
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.vertices)
    }

    /// All undirected edges of the mesh
    pub fn edge_set(&self) -> BTreeSet<EdgeKey> {
        self.triangles
            .iter()
            .flat_map(|t| t.edges())
            .map(|(a, b)| EdgeKey::new(a, b))
            .collect()
    }

    /// Flip the winding of every triangle in place.
    pub fn reverse_orientation(&mut self) {
        for triangle in &mut self.triangles {
            triangle.indices.swap(1, 2);
        }
    }

    /// Copy of this mesh with every triangle's winding flipped
    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut mesh = self.clone();
        mesh.reverse_orientation();
        mesh
    }

    /// Coordinate and index buffers, the inverse of [`Mesh::from_buffers`]
    pub fn to_buffers(&self) -> (Vec<[f64; 3]>, Vec<[usize; 3]>) {
        (
            self.vertices.iter().map(|p| [p.x, p.y, p.z]).collect(),
            self.triangles.iter().map(|t| t.indices).collect(),
        )
    }

    /// Concatenate two meshes without any welding.
    pub(crate) fn append(&self, other: &Mesh) -> Mesh {
        let offset = self.vertices.len();
        let mut vertices = self.vertices.clone();
        vertices.extend_from_slice(&other.vertices);

        let mut triangles = self.triangles.clone();
        triangles.extend(other.triangles.iter().map(|t| {
            Triangle::new([t.indices[0] + offset, t.indices[1] + offset, t.indices[2] + offset])
        }));

        let constraints = self.constraints.iter().copied().chain(
            other
                .constraints
                .iter()
                .map(|e| EdgeKey::new(e.0 + offset, e.1 + offset)),
        );
        Mesh::from_parts(vertices, triangles, constraints)
    }

    /// Drop vertices no triangle references, remapping indices and
    /// constraints.
    pub(crate) fn compacted(&self) -> Mesh {
        let mut referenced = vec![false; self.vertices.len()];
        for triangle in &self.triangles {
            for &v in &triangle.indices {
                referenced[v] = true;
            }
        }

        let mut remap = vec![usize::MAX; self.vertices.len()];
        let mut vertices = Vec::with_capacity(self.vertices.len());
        for (old, &used) in referenced.iter().enumerate() {
            if used {
                remap[old] = vertices.len();
                vertices.push(self.vertices[old]);
            }
        }

        let triangles = self
            .triangles
            .iter()
            .map(|t| Triangle::new(t.indices.map(|v| remap[v])))
            .collect();
        let constraints = self
            .constraints
            .iter()
            .filter(|e| remap[e.0] != usize::MAX && remap[e.1] != usize::MAX)
            .map(|e| EdgeKey::new(remap[e.0], remap[e.1]))
            .collect::<Vec<_>>();
        Mesh::from_parts(vertices, triangles, constraints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;

    fn quad() -> Mesh {
        Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![Triangle::new([0, 1, 2]), Triangle::new([0, 2, 3])],
        )
        .unwrap()
    }

    #[test]
    fn test_reverse_orientation_is_involution() {
        let original = Primitive::cube(Vector3::new(2.0, 2.0, 2.0), true).to_mesh();
        let mut mesh = original.clone();
        mesh.reverse_orientation();
        assert_ne!(mesh.triangles(), original.triangles());
        assert!(mesh.face_normal(0).dot(&original.face_normal(0)) < 0.0);
        mesh.reverse_orientation();
        assert_eq!(mesh, original);
    }

    #[test]
    fn test_constrained_edges_must_exist() {
        let mesh = quad().with_constrained_edges([(0, 2)]).unwrap();
        assert!(mesh.constrained_edges().contains(&EdgeKey::new(2, 0)));

        let err = quad().with_constrained_edges([(1, 3)]).unwrap_err();
        assert_eq!(err, ValidationError::UnknownEdge(1, 3));
    }

    #[test]
    fn test_buffers_roundtrip_and_area() {
        let mesh = quad();
        let (vertices, triangles) = mesh.to_buffers();
        assert_eq!(vertices.len(), 4);
        assert_eq!(triangles, vec![[0, 1, 2], [0, 2, 3]]);
        assert!((mesh.surface_area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_compacted_drops_unreferenced() {
        let mesh = Mesh::from_parts(
            vec![
                Point3::new(9.0, 9.0, 9.0),
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![Triangle::new([1, 2, 3])],
            [EdgeKey::new(1, 2)],
        );
        let compact = mesh.compacted();
        assert_eq!(compact.vertex_count(), 3);
        assert_eq!(compact.triangles()[0].indices, [0, 1, 2]);
        assert!(compact.constrained_edges().contains(&EdgeKey::new(0, 1)));
    }

    #[test]
    fn test_append_offsets_indices() {
        let merged = quad().append(&quad());
        assert_eq!(merged.vertex_count(), 8);
        assert_eq!(merged.triangles()[2].indices, [4, 5, 6]);
    }
}
