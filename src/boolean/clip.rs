// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Side selection after corefinement

use crate::config::CutOptions;
use crate::error::{MeshError, MeshResult};
use crate::geometry::classification::{Classification, SurfaceClassifier};
use crate::geometry::{topology, Mesh, Plane, Triangle};
use crate::verbose_debug;
use nalgebra::Point3;
use rayon::prelude::*;

/// Which patches of the corefined mesh survive a surface operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Inside the other operand, plus patches lying on it with the same
    /// orientation
    Clip,
    /// Outside the other operand; patches lying on it are kept according
    /// to the flags
    Cut(CutOptions),
}

impl Selection {
    pub fn keeps(&self, class: Classification) -> bool {
        match (self, class) {
            (Selection::Clip, Classification::Inside) => true,
            (Selection::Clip, Classification::OnBoundary { same_orientation }) => same_orientation,
            (Selection::Cut(_), Classification::Outside) => true,
            (Selection::Cut(options), Classification::OnBoundary { same_orientation: true }) => {
                options.preserve_intersection
            }
            (Selection::Cut(options), Classification::OnBoundary { same_orientation: false }) => {
                options.preserve_intersection_clipper
            }
            _ => false,
        }
    }
}

/// Keep the patches of `mesh` (already corefined with `other`) that the
/// selection accepts. Patches are bounded by the constraint edges, and each
/// is classified once through its largest triangle.
pub fn select_patches(mesh: &Mesh, other: &Mesh, selection: Selection, tolerance: f64) -> MeshResult<Mesh> {
    if mesh.is_empty() {
        return Ok(mesh.clone());
    }
    let (labels, count) = topology::patches(mesh, mesh.constrained_edges());

    let mut representative: Vec<Option<(usize, f64)>> = vec![None; count];
    for (t, &patch) in labels.iter().enumerate() {
        let area = mesh.triangle_area(t);
        match representative[patch] {
            Some((_, best)) if best >= area => {}
            _ => representative[patch] = Some((t, area)),
        }
    }

    let classifier = SurfaceClassifier::new(other, tolerance);
    let classes: Vec<Classification> = representative
        .par_iter()
        .map(|rep| {
            let (t, _) = rep.unwrap_or((0, 0.0));
            let [a, b, c] = mesh.triangle_points(t);
            let centroid = Point3::from((a.coords + b.coords + c.coords) / 3.0);
            classifier.classify(&centroid, &mesh.face_normal(t))
        })
        .collect();

    verbose_debug!(patches = count, ?selection, "classified patches");

    let kept: Vec<Triangle> = mesh
        .triangles()
        .iter()
        .zip(&labels)
        .filter(|(_, &patch)| selection.keeps(classes[patch]))
        .map(|(t, _)| *t)
        .collect();

    let result = Mesh::from_parts(
        mesh.vertices().to_vec(),
        kept,
        mesh.constrained_edges().iter().copied(),
    )
    .compacted();

    let non_manifold = topology::non_manifold_edges(&result);
    if let Some(edge) = non_manifold.first() {
        return Err(MeshError::inconsistent(
            "clip",
            format!(
                "result has {} non-manifold edges, first ({}, {})",
                non_manifold.len(),
                edge.0,
                edge.1
            ),
        ));
    }
    Ok(result)
}

/// Keep the triangles of a plane-corefined mesh on the negative side of
/// `plane`. Triangles lying in the plane are kept when they face along its
/// normal.
pub fn keep_below_plane(mesh: &Mesh, plane: &Plane, tolerance: f64) -> Mesh {
    let kept: Vec<Triangle> = (0..mesh.triangle_count())
        .filter(|&t| {
            let [a, b, c] = mesh.triangle_points(t);
            let centroid = Point3::from((a.coords + b.coords + c.coords) / 3.0);
            let distance = plane.signed_distance(&centroid);
            if distance < -tolerance {
                true
            } else if distance > tolerance {
                false
            } else {
                mesh.face_normal(t).dot(plane.normal()) > 0.0
            }
        })
        .map(|t| mesh.triangles()[t])
        .collect();

    Mesh::from_parts(
        mesh.vertices().to_vec(),
        kept,
        mesh.constrained_edges().iter().copied(),
    )
    .compacted()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_rules() {
        let on_same = Classification::OnBoundary { same_orientation: true };
        let on_opposite = Classification::OnBoundary { same_orientation: false };

        assert!(Selection::Clip.keeps(Classification::Inside));
        assert!(!Selection::Clip.keeps(Classification::Outside));
        assert!(Selection::Clip.keeps(on_same));
        assert!(!Selection::Clip.keeps(on_opposite));

        let plain = Selection::Cut(CutOptions::default());
        assert!(plain.keeps(Classification::Outside));
        assert!(!plain.keeps(Classification::Inside));
        assert!(!plain.keeps(on_same));
        assert!(!plain.keeps(on_opposite));

        let both = Selection::Cut(CutOptions {
            preserve_intersection: true,
            preserve_intersection_clipper: true,
        });
        assert!(both.keeps(on_same));
        assert!(both.keeps(on_opposite));
    }
}
