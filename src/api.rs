// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Public operations
//!
//! Every entry point validates its configuration and meshes before any
//! geometric work, so the algorithms below it can assume valid input.

use crate::boolean::{
    cap_plane_cut, corefine_meshes, corefine_with_plane, keep_below_plane, mark_shared_edges, select_patches,
    union_closed, Selection, DEFAULT_TOLERANCE,
};
use crate::config::{validate_edge_length, validate_iterations, validate_threshold, CutOptions, OperationConfig};
use crate::error::{ConfigurationError, MeshResult, ValidationError};
use crate::geometry::{topology, validate, validate_buffers, Mesh, Plane};
use crate::remesh::{isotropic_remesh, refine, split_long_edges, RemeshParams};
use crate::repair;
use crate::verbose_info;

/// Check raw buffers against the mesh invariants without building a mesh.
pub fn validate_mesh(vertices: &[[f64; 3]], triangles: &[[i64; 3]]) -> Result<(), ValidationError> {
    validate_buffers(vertices, triangles)
}

/// Isotropic remeshing toward `target_edge_length`.
pub fn remesh(mesh: &Mesh, target_edge_length: f64, iterations: i32, protect: bool, relax: bool) -> MeshResult<Mesh> {
    validate_edge_length(target_edge_length)?;
    validate_iterations(i64::from(iterations))?;
    validate(mesh)?;

    let params = RemeshParams::new(target_edge_length)
        .with_iterations(iterations.unsigned_abs())
        .with_constraints(protect, relax);
    Ok(isotropic_remesh(mesh, &params))
}

/// Refine both meshes along their intersection curve.
///
/// The curve ends up as identical vertices and constraint edges in both
/// outputs. Disjoint meshes come back unchanged.
pub fn corefine(a: &Mesh, b: &Mesh) -> MeshResult<(Mesh, Mesh)> {
    validate(a)?;
    validate(b)?;
    corefine_meshes(a, b, DEFAULT_TOLERANCE)
}

/// Corefinement followed by constrained remeshing and cleanup of both
/// outputs. Long edges are split first; afterwards every edge shared by
/// the two results is kept as a constraint.
pub fn corefine_with_config(a: &Mesh, b: &Mesh, config: &OperationConfig) -> MeshResult<(Mesh, Mesh)> {
    config.validate()?;
    validate(a)?;
    validate(b)?;
    let tolerance = config.duplicate_vertex_threshold;

    let a = split_long_edges(a, config.target_edge_length);
    let b = split_long_edges(b, config.target_edge_length);
    let (refined_a, refined_b) = corefine_meshes(&a, &b, tolerance)?;
    let (refined_a, refined_b) = mark_shared_edges(&refined_a, &refined_b, tolerance);

    let params = RemeshParams::from(config);
    let finish = |mesh: &Mesh| {
        let mesh = isotropic_remesh(mesh, &params);
        repair::cleanup(&mesh, config.area_threshold, config.duplicate_vertex_threshold)
    };
    Ok((finish(&refined_a), finish(&refined_b)))
}

/// Keep the part of `a` inside `b`.
///
/// For an open `b`, inside is the side its normals point away from.
pub fn clip_with_surface(a: &Mesh, b: &Mesh, config: &OperationConfig) -> MeshResult<Mesh> {
    config.validate()?;
    validate(a)?;
    validate(b)?;
    let tolerance = config.duplicate_vertex_threshold;

    let (a, b) = prepare_operands(a, b, config);
    let (refined_a, refined_b) = corefine_meshes(&a, &b, tolerance)?;
    let clipped = select_patches(&refined_a, &refined_b, Selection::Clip, tolerance)?;
    Ok(finish(clipped, config))
}

/// Keep the part of `mesh` on the side of the plane its normal points away
/// from. A closed mesh is capped when `config.clip_volume` is set.
pub fn clip_with_plane(mesh: &Mesh, origin: [f64; 3], normal: [f64; 3], config: &OperationConfig) -> MeshResult<Mesh> {
    config.validate()?;
    validate(mesh)?;
    let plane = Plane::new(origin, normal)?;
    let tolerance = config.duplicate_vertex_threshold;

    let source = if config.remesh_before_op {
        refine(mesh, &RemeshParams::from(config))
    } else {
        mesh.clone()
    };

    let (back, front) = plane.side_counts(&source, tolerance);
    if front == 0 {
        verbose_info!("clip_with_plane: mesh entirely on the kept side");
        return Ok(finish(source, config));
    }
    if back == 0 {
        verbose_info!("clip_with_plane: mesh entirely on the removed side");
        return Ok(Mesh::empty());
    }

    let closed = topology::is_closed(&source);
    let split = corefine_with_plane(&source, &plane, tolerance)?;
    let mut kept = keep_below_plane(&split, &plane, tolerance);
    if config.clip_volume && closed {
        kept = cap_plane_cut(&kept, &plane, tolerance)?;
    }
    Ok(finish(kept, config))
}

/// Keep the part of `a` outside the volume bounded by `b`.
///
/// Reversing `b` swaps which side is removed.
pub fn cut_with_surface(a: &Mesh, b: &Mesh, options: CutOptions) -> MeshResult<Mesh> {
    validate(a)?;
    validate(b)?;
    let (refined_a, refined_b) = corefine_meshes(a, b, DEFAULT_TOLERANCE)?;
    select_patches(&refined_a, &refined_b, Selection::Cut(options), DEFAULT_TOLERANCE)
}

/// Flip the winding of every triangle in place.
pub fn reverse_orientation(mesh: &mut Mesh) {
    mesh.reverse_orientation();
}

/// Merge near-duplicate vertices and drop degenerate triangles.
pub fn cleanup(mesh: &Mesh, area_threshold: f64, duplicate_vertex_threshold: f64) -> MeshResult<Mesh> {
    validate_threshold("area threshold", area_threshold)?;
    validate_threshold("duplicate vertex threshold", duplicate_vertex_threshold)?;
    validate(mesh)?;
    Ok(repair::cleanup(mesh, area_threshold, duplicate_vertex_threshold))
}

/// Combine meshes left to right into one surface.
///
/// Two closed operands are merged by their union, anything else is
/// corefined and concatenated; the final cleanup stitches the coincident
/// vertices along the seams.
pub fn weld_meshes(meshes: &[Mesh], config: &OperationConfig) -> MeshResult<Mesh> {
    config.validate()?;
    let (first, rest) = meshes
        .split_first()
        .ok_or(ConfigurationError::NoMeshes { operation: "weld_meshes" })?;
    for mesh in meshes {
        validate(mesh)?;
    }
    let tolerance = config.duplicate_vertex_threshold;

    let mut welded = first.clone();
    for (step, next) in rest.iter().enumerate() {
        let (a, b) = prepare_operands(&welded, next, config);
        welded = if topology::is_closed(&a) && topology::is_closed(&b) {
            union_closed(&a, &b, tolerance)?
        } else {
            let (refined_a, refined_b) = corefine_meshes(&a, &b, tolerance)?;
            refined_a.append(&refined_b)
        };
        verbose_info!(step, triangles = welded.triangle_count(), "weld_meshes: merged operand");
    }
    Ok(repair::cleanup(&welded, config.area_threshold, config.duplicate_vertex_threshold))
}

fn prepare_operands(a: &Mesh, b: &Mesh, config: &OperationConfig) -> (Mesh, Mesh) {
    if config.remesh_before_op {
        let params = RemeshParams::from(config);
        (refine(a, &params), refine(b, &params))
    } else {
        (a.clone(), b.clone())
    }
}

fn finish(mesh: Mesh, config: &OperationConfig) -> Mesh {
    let mesh = if config.remesh_after_op && !mesh.is_empty() {
        refine(&mesh, &RemeshParams::from(config))
    } else {
        mesh
    };
    if config.remove_degenerate_faces {
        repair::cleanup(&mesh, config.area_threshold, config.duplicate_vertex_threshold)
    } else {
        mesh
    }
}
