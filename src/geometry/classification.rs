// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Point classification against a surface
//! Generalised winding number for closed surfaces, the angle-weighted
//! pseudo-normal of the nearest feature for open ones

use super::analytics::signed_volume;
use super::topology::EdgeFaces;
use super::triangle_intersection::closest_point_on_triangle;
use super::{topology, EdgeKey, Mesh, BVH};
use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;
use std::f64::consts::PI;

/// Position of a sample relative to the other operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Inside the other solid, or behind an open surface
    Inside,
    /// Outside the other solid, or in front of an open surface
    Outside,
    /// On the other surface (within tolerance); `same_orientation` tells
    /// whether the sample's normal agrees with the surface normal there
    OnBoundary { same_orientation: bool },
}

/// Classifies points against a fixed surface.
///
/// Orientation matters: a reversed closed surface encloses its complement
/// and a reversed open surface swaps front and back.
pub struct SurfaceClassifier<'a> {
    surface: &'a Mesh,
    bvh: BVH,
    closed: bool,
    /// Added to the winding number so that inward-facing closed surfaces
    /// classify their exterior as inside
    winding_offset: f64,
    tolerance: f64,
    edge_faces: EdgeFaces,
    vertex_faces: Vec<SmallVec<[usize; 8]>>,
}

/// Part of a triangle a closest point lies on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Feature {
    Face,
    Edge(usize, usize),
    Vertex(usize),
}

impl<'a> SurfaceClassifier<'a> {
    pub fn new(surface: &'a Mesh, tolerance: f64) -> Self {
        let closed = topology::is_closed(surface);
        let winding_offset = if closed && signed_volume(surface) < 0.0 { 1.0 } else { 0.0 };
        let mut vertex_faces = vec![SmallVec::new(); surface.vertex_count()];
        for (t, triangle) in surface.triangles().iter().enumerate() {
            for &v in &triangle.indices {
                vertex_faces[v].push(t);
            }
        }
        Self {
            surface,
            bvh: BVH::from_mesh(surface, 0.0),
            closed,
            winding_offset,
            tolerance,
            edge_faces: topology::edge_faces(surface),
            vertex_faces,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Nearest surface triangle, closest point on it and distance
    pub fn nearest(&self, point: &Point3<f64>) -> Option<(usize, Point3<f64>, f64)> {
        let (face, distance_sq) = self.bvh.nearest(point, |t| {
            let [a, b, c] = self.surface.triangle_points(t);
            (closest_point_on_triangle(point, &a, &b, &c) - point).norm_squared()
        })?;
        let [a, b, c] = self.surface.triangle_points(face);
        Some((face, closest_point_on_triangle(point, &a, &b, &c), distance_sq.sqrt()))
    }

    /// Generalised winding number of the surface around `point`: 1 inside
    /// an outward-facing closed surface, 0 outside.
    pub fn winding_number(&self, point: &Point3<f64>) -> f64 {
        let total: f64 = (0..self.surface.triangle_count())
            .map(|t| {
                let [a, b, c] = self.surface.triangle_points(t);
                solid_angle(&(a - point), &(b - point), &(c - point))
            })
            .sum();
        total / (4.0 * PI)
    }

    /// Classify a sample point carrying the normal of the face it came from.
    pub fn classify(&self, point: &Point3<f64>, normal: &Vector3<f64>) -> Classification {
        let Some((face, closest, distance)) = self.nearest(point) else {
            return Classification::Outside;
        };
        let face_normal = self.surface.face_normal(face);

        if distance <= self.tolerance {
            return Classification::OnBoundary {
                same_orientation: normal.dot(&face_normal) > 0.0,
            };
        }

        let inside = if self.closed {
            self.winding_number(point) + self.winding_offset > 0.5
        } else {
            (point - closest).dot(&self.pseudo_normal(face, &closest)) < 0.0
        };
        if inside {
            Classification::Inside
        } else {
            Classification::Outside
        }
    }
}

impl SurfaceClassifier<'_> {
    fn feature(&self, face: usize, closest: &Point3<f64>) -> Feature {
        let indices = self.surface.triangles()[face].indices;
        let corners = self.surface.triangle_points(face);
        let scale = (0..3)
            .map(|i| (corners[(i + 1) % 3] - corners[i]).norm())
            .fold(0.0, f64::max);
        let tiny = 1e-9 * scale;

        if let Some(i) = (0..3).find(|&i| (closest - corners[i]).norm() <= tiny) {
            return Feature::Vertex(indices[i]);
        }
        for i in 0..3 {
            let (a, b) = (corners[i], corners[(i + 1) % 3]);
            let direction = b - a;
            let length = direction.norm();
            if length > 0.0 && direction.cross(&(closest - a)).norm() / length <= tiny {
                return Feature::Edge(indices[i], indices[(i + 1) % 3]);
            }
        }
        Feature::Face
    }

    /// Normal of the nearest feature: the face normal inside a face, the
    /// sum of the adjacent face normals on an edge and the sum weighted by
    /// corner angle at a vertex.
    fn pseudo_normal(&self, face: usize, closest: &Point3<f64>) -> Vector3<f64> {
        let face_normal = self.surface.face_normal(face);
        let normal = match self.feature(face, closest) {
            Feature::Face => return face_normal,
            Feature::Edge(a, b) => self
                .edge_faces
                .get(&EdgeKey::new(a, b))
                .map(|faces| faces.iter().map(|&f| self.unit_normal(f)).sum::<Vector3<f64>>())
                .unwrap_or(face_normal),
            Feature::Vertex(v) => self.vertex_faces[v]
                .iter()
                .map(|&f| self.corner_angle(f, v) * self.unit_normal(f))
                .sum::<Vector3<f64>>(),
        };
        normal.try_normalize(0.0).unwrap_or(face_normal)
    }

    fn unit_normal(&self, face: usize) -> Vector3<f64> {
        self.surface
            .face_normal(face)
            .try_normalize(0.0)
            .unwrap_or_else(Vector3::zeros)
    }

    fn corner_angle(&self, face: usize, vertex: usize) -> f64 {
        let indices = self.surface.triangles()[face].indices;
        let Some(i) = indices.iter().position(|&v| v == vertex) else {
            return 0.0;
        };
        let corners = self.surface.triangle_points(face);
        let u = corners[(i + 1) % 3] - corners[i];
        let w = corners[(i + 2) % 3] - corners[i];
        u.angle(&w)
    }
}

/// Signed solid angle subtended by a triangle seen from the origin
/// (Van Oosterom and Strackee)
fn solid_angle(a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>) -> f64 {
    let (la, lb, lc) = (a.norm(), b.norm(), c.norm());
    let numerator = a.dot(&b.cross(c));
    let denominator = la * lb * lc + a.dot(b) * lc + a.dot(c) * lb + b.dot(c) * la;
    2.0 * numerator.atan2(denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Primitive, Triangle};

    fn cube() -> Mesh {
        Primitive::cube(Vector3::new(10.0, 10.0, 10.0), false).to_mesh()
    }

    #[test]
    fn test_winding_number_of_cube() {
        let mesh = cube();
        let classifier = SurfaceClassifier::new(&mesh, 1e-6);
        assert!((classifier.winding_number(&Point3::new(5.0, 5.0, 5.0)) - 1.0).abs() < 1e-9);
        assert!(classifier.winding_number(&Point3::new(20.0, 5.0, 5.0)).abs() < 1e-9);
    }

    #[test]
    fn test_classify_closed_surface() {
        let mesh = cube();
        let classifier = SurfaceClassifier::new(&mesh, 1e-6);
        let up = Vector3::z();

        assert_eq!(classifier.classify(&Point3::new(20.0, 0.0, 0.0), &up), Classification::Outside);
        assert_eq!(classifier.classify(&Point3::new(2.0, 3.0, 4.0), &up), Classification::Inside);
        assert_eq!(
            classifier.classify(&Point3::new(2.0, 3.0, 10.0), &up),
            Classification::OnBoundary { same_orientation: true }
        );
    }

    #[test]
    fn test_reversed_closed_surface_swaps_sides() {
        let mesh = cube().reversed();
        let classifier = SurfaceClassifier::new(&mesh, 1e-6);
        let up = Vector3::z();

        assert_eq!(classifier.classify(&Point3::new(20.0, 0.0, 0.0), &up), Classification::Inside);
        assert_eq!(classifier.classify(&Point3::new(2.0, 3.0, 4.0), &up), Classification::Outside);
        assert_eq!(
            classifier.classify(&Point3::new(2.0, 3.0, 10.0), &up),
            Classification::OnBoundary { same_orientation: false }
        );
    }

    #[test]
    fn test_open_surface_uses_face_orientation() {
        let sheet = Primitive::grid(4.0, 4.0, 2, 2).to_mesh();
        let classifier = SurfaceClassifier::new(&sheet, 1e-6);
        assert!(!classifier.is_closed());
        let up = Vector3::z();

        assert_eq!(classifier.classify(&Point3::new(0.3, 0.2, -1.0), &up), Classification::Inside);
        assert_eq!(classifier.classify(&Point3::new(0.3, 0.2, 1.0), &up), Classification::Outside);
    }

    #[test]
    fn test_open_ridge_uses_edge_pseudo_normal() {
        // Steep roof along the y axis, normals facing up
        let vertices = vec![
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(-1.0, -1.0, -3.0),
            Point3::new(-1.0, 1.0, -3.0),
            Point3::new(1.0, -1.0, -3.0),
            Point3::new(1.0, 1.0, -3.0),
        ];
        let triangles = vec![
            Triangle::new([2, 0, 1]),
            Triangle::new([2, 1, 3]),
            Triangle::new([0, 4, 5]),
            Triangle::new([0, 5, 1]),
        ];
        let roof = Mesh::new(vertices, triangles).unwrap();
        let classifier = SurfaceClassifier::new(&roof, 1e-6);
        let up = Vector3::z();

        // Nearest to the ridge itself, but behind the right face's plane
        assert_eq!(classifier.classify(&Point3::new(-0.29, 0.0, 0.12), &up), Classification::Outside);
        assert_eq!(classifier.classify(&Point3::new(0.29, 0.0, 0.12), &up), Classification::Outside);
        assert_eq!(classifier.classify(&Point3::new(0.0, 0.0, -0.5), &up), Classification::Inside);
    }
}
