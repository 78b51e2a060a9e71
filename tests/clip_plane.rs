// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Plane clipping end to end

use anyhow::Result;
use approx::assert_relative_eq;
use nalgebra::Vector3;
use surfclip::geometry::{signed_volume, topology};
use surfclip::{clip_with_plane, Mesh, OperationConfig, Primitive};

fn unit_cube() -> Mesh {
    Primitive::cube(Vector3::new(1.0, 1.0, 1.0), true).to_mesh()
}

#[test]
fn test_unit_cube_half_is_capped() -> Result<()> {
    let half = clip_with_plane(&unit_cube(), [0.0; 3], [1.0, 0.0, 0.0], &OperationConfig::exact())?;

    assert!(half.vertices().iter().all(|p| p.x <= 1e-9));
    // Half of the cube surface plus the cut face
    assert_relative_eq!(half.surface_area(), 3.0 + 1.0, epsilon = 1e-9);
    assert_relative_eq!(signed_volume(&half), 0.5, epsilon = 1e-9);
    assert!(topology::is_closed(&half));
    Ok(())
}

#[test]
fn test_open_cut_without_cap() -> Result<()> {
    let config = OperationConfig::exact().with_clip_volume(false);
    let half = clip_with_plane(&unit_cube(), [0.0; 3], [1.0, 0.0, 0.0], &config)?;

    assert_relative_eq!(half.surface_area(), 3.0, epsilon = 1e-9);
    let boundary = topology::boundary_edges(&half);
    assert!(!boundary.is_empty());
    for edge in boundary {
        assert!(half.vertices()[edge.0].x.abs() < 1e-9);
        assert!(half.vertices()[edge.1].x.abs() < 1e-9);
    }
    let loops = topology::boundary_loops(&half);
    assert_eq!(loops.len(), 1);
    Ok(())
}

#[test]
fn test_kept_side_only_returns_input() -> Result<()> {
    let cube = unit_cube();
    let same = clip_with_plane(&cube, [1.0, 0.0, 0.0], [1.0, 0.0, 0.0], &OperationConfig::exact())?;
    assert_eq!(same, cube);
    Ok(())
}

#[test]
fn test_excluded_side_only_returns_empty() -> Result<()> {
    let cube = unit_cube();
    let none = clip_with_plane(&cube, [-1.0, 0.0, 0.0], [1.0, 0.0, 0.0], &OperationConfig::exact())?;
    assert!(none.is_empty());
    assert_eq!(none.vertex_count(), 0);
    Ok(())
}

#[test]
fn test_normal_length_does_not_matter() -> Result<()> {
    let config = OperationConfig::exact();
    let unit = clip_with_plane(&unit_cube(), [0.1, 0.0, 0.0], [0.0, 0.0, 1.0], &config)?;
    let long = clip_with_plane(&unit_cube(), [0.1, 0.0, 0.0], [0.0, 0.0, 250.0], &config)?;
    assert_eq!(unit, long);
    Ok(())
}

#[test]
fn test_open_sheet_is_not_capped() -> Result<()> {
    let sheet = Primitive::grid(2.0, 2.0, 2, 2).to_mesh();
    let clipped = clip_with_plane(&sheet, [0.25, 0.0, 0.0], [1.0, 0.0, 0.0], &OperationConfig::exact())?;

    assert_relative_eq!(clipped.surface_area(), 2.0 * 1.25, epsilon = 1e-9);
    assert!(clipped.vertices().iter().all(|p| p.x <= 0.25 + 1e-9 && p.z == 0.0));
    assert!(!topology::is_closed(&clipped));
    Ok(())
}

#[test]
fn test_default_pipeline_keeps_volume() -> Result<()> {
    let cube = Primitive::cube(Vector3::new(10.0, 10.0, 10.0), true).to_mesh();
    let config = OperationConfig::default().with_target_edge_length(2.0);
    let half = clip_with_plane(&cube, [0.0; 3], [0.0, -1.0, 0.0], &config)?;

    assert!(half.vertices().iter().all(|p| p.y >= -1e-6));
    assert!(topology::is_closed(&half));
    assert_relative_eq!(signed_volume(&half), 500.0, max_relative = 0.05);
    Ok(())
}
