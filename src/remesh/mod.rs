// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Isotropic remeshing toward a target edge length
//!
//! Each iteration splits long edges, collapses short ones, flips edges to
//! even out valences and relocates vertices tangentially, projecting them
//! back onto the input surface. Boundary and constraint edges are features:
//! protected features are never edited, unprotected ones may be split and
//! collapsed along themselves but never flipped.

mod operations;

use crate::config::OperationConfig;
use crate::geometry::Mesh;
use crate::{verbose_debug, verbose_info};
use operations::{Projector, WorkMesh};

/// Edges longer than this multiple of the target are split
pub const SPLIT_RATIO: f64 = 4.0 / 3.0;
/// Edges shorter than this multiple of the target are collapsed
pub const COLLAPSE_RATIO: f64 = 4.0 / 5.0;
/// Below this fraction of the bounding-box diagonal a target is too small to
/// be worth refining toward
pub const MIN_RELATIVE_TARGET: f64 = 1e-4;
/// Meshes with fewer triangles only get their long edges split
pub const TINY_PATCH_TRIANGLES: usize = 40;

/// Remeshing parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemeshParams {
    pub target_edge_length: f64,
    pub iterations: u32,
    /// Never split, collapse or flip constraint and boundary edges
    pub protect_constraints: bool,
    /// Let vertices inside straight constraint runs slide along them
    pub relax_constraints: bool,
}

impl RemeshParams {
    pub fn new(target_edge_length: f64) -> Self {
        Self {
            target_edge_length,
            iterations: 3,
            protect_constraints: true,
            relax_constraints: false,
        }
    }

    #[must_use]
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    #[must_use]
    pub fn with_constraints(mut self, protect: bool, relax: bool) -> Self {
        self.protect_constraints = protect;
        self.relax_constraints = relax;
        self
    }
}

impl From<&OperationConfig> for RemeshParams {
    fn from(config: &OperationConfig) -> Self {
        Self {
            target_edge_length: config.target_edge_length,
            iterations: u32::try_from(config.number_of_iterations).unwrap_or(0),
            protect_constraints: config.protect_constraints,
            relax_constraints: config.relax_constraints,
        }
    }
}

/// Run the configured number of remeshing iterations on a validated mesh.
///
/// An iteration that leaves fewer than four vertices or a non-manifold edge
/// is rolled back and the remaining iterations are skipped.
pub fn isotropic_remesh(mesh: &Mesh, params: &RemeshParams) -> Mesh {
    let reference = Projector::new(mesh);
    let mut work = WorkMesh::from_mesh(mesh);
    let high = SPLIT_RATIO * params.target_edge_length;
    let low = COLLAPSE_RATIO * params.target_edge_length;
    let protect = params.protect_constraints;

    for iteration in 0..params.iterations {
        let snapshot = work.clone();
        let splits = work.split_long_edges(high, protect);
        let collapses = work.collapse_short_edges(low, high, protect);
        let flips = work.equalize_valences();
        work.relax_vertices(&reference, params.relax_constraints);

        if let Some(reason) = work.defect() {
            verbose_info!(iteration, %reason, "remesh: iteration discarded");
            work = snapshot;
            break;
        }
        verbose_debug!(
            iteration,
            splits,
            collapses,
            flips,
            vertices = work.alive_vertices(),
            "remesh: iteration done"
        );
    }
    work.into_mesh()
}

/// Split every edge longer than 4/3 of `target_edge_length`, constraints
/// and boundary included, until none is left.
pub fn split_long_edges(mesh: &Mesh, target_edge_length: f64) -> Mesh {
    let mut work = WorkMesh::from_mesh(mesh);
    let splits = work.split_long_edges(SPLIT_RATIO * target_edge_length, false);
    verbose_debug!(splits, "remesh: split long edges");
    work.into_mesh()
}

/// Remeshing stage of the clip pipelines: drop unreferenced vertices, skip
/// targets that are negligible for the mesh size, and only split long edges
/// on tiny meshes.
pub fn refine(mesh: &Mesh, params: &RemeshParams) -> Mesh {
    let mesh = mesh.compacted();
    if mesh.is_empty() {
        return mesh;
    }

    let diagonal = mesh.bounding_box().diagonal();
    if params.target_edge_length < MIN_RELATIVE_TARGET * diagonal {
        verbose_info!(
            target = params.target_edge_length,
            diagonal,
            "remesh: target negligible for mesh size, skipped"
        );
        return mesh;
    }

    if mesh.triangle_count() < TINY_PATCH_TRIANGLES {
        verbose_debug!(triangles = mesh.triangle_count(), "remesh: tiny patch, splitting only");
        return split_long_edges(&mesh, params.target_edge_length);
    }
    isotropic_remesh(&mesh, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{signed_volume, topology, Primitive};
    use nalgebra::Vector3;

    #[test]
    fn test_flat_sheet_stays_flat() {
        let grid = Primitive::grid(10.0, 10.0, 2, 2).to_mesh();
        let remeshed = isotropic_remesh(&grid, &RemeshParams::new(1.0));
        assert!(remeshed.vertex_count() > grid.vertex_count());
        assert!(remeshed.vertices().iter().all(|p| p.z.abs() < 1e-9));
        assert!((remeshed.surface_area() - 100.0).abs() < 1e-6);
        assert!(topology::is_manifold(&remeshed));
    }

    #[test]
    fn test_protected_boundary_is_untouched() {
        let grid = Primitive::grid(10.0, 10.0, 2, 2).to_mesh();
        let remeshed = isotropic_remesh(&grid, &RemeshParams::new(1.0));
        let outline = |mesh: &Mesh| {
            let mut segments: Vec<[[i64; 3]; 2]> = topology::boundary_edges(mesh)
                .iter()
                .map(|e| {
                    let mut ends = [e.0, e.1].map(|v| {
                        let p = mesh.vertices()[v];
                        [p.x, p.y, p.z].map(|c| (c * 1e9).round() as i64)
                    });
                    ends.sort();
                    ends
                })
                .collect();
            segments.sort();
            segments
        };
        assert_eq!(topology::boundary_edges(&remeshed).len(), 8);
        assert_eq!(outline(&remeshed), outline(&grid));
        assert!((remeshed.surface_area() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_unprotected_boundary_is_refined() {
        let grid = Primitive::grid(10.0, 10.0, 2, 2).to_mesh();
        let params = RemeshParams::new(1.0).with_constraints(false, true);
        let remeshed = isotropic_remesh(&grid, &params);
        assert!(topology::boundary_edges(&remeshed).len() > 8);
        // Corners are not straight runs, so the outline survives
        assert!((remeshed.surface_area() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_sphere_stays_closed() {
        let sphere = Primitive::sphere(1.0, 16).to_mesh();
        let volume = signed_volume(&sphere);
        let remeshed = isotropic_remesh(&sphere, &RemeshParams::new(0.2));
        assert!(topology::is_closed(&remeshed));
        assert!(remeshed.vertex_count() > sphere.vertex_count());
        assert!((signed_volume(&remeshed) - volume).abs() / volume < 0.05);
    }

    #[test]
    fn test_refine_guards() {
        let cube = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), true).to_mesh();
        // Negligible target
        let same = refine(&cube, &RemeshParams::new(1e-9));
        assert_eq!(same.triangle_count(), cube.triangle_count());

        // Tiny patch: long edges split, nothing collapsed
        let split = refine(&cube, &RemeshParams::new(0.5));
        assert!(split.triangle_count() > cube.triangle_count());
        assert!(topology::is_closed(&split));
        assert!((signed_volume(&split) - 1.0).abs() < 1e-9);
    }
}
