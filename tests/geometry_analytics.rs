// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Geometry analytics verification tests

use anyhow::Result;
use nalgebra::Vector3;
use surfclip::geometry::{analyze, Primitive};
use surfclip::{clip_with_plane, OperationConfig};

#[test]
fn test_cube_volume_and_surface_area() -> Result<()> {
    let mesh = Primitive::cube(Vector3::new(10.0, 10.0, 10.0), true).to_mesh();
    let stats = analyze(&mesh);

    // Expected: 10×10×10 = 1000
    assert!(
        (stats.volume - 1000.0).abs() < 1e-9,
        "Volume {} not close to 1000",
        stats.volume
    );

    // Expected: 6 × (10×10) = 600
    assert!(
        (stats.surface_area - 600.0).abs() < 1e-9,
        "Surface area {} not close to 600",
        stats.surface_area
    );

    assert_eq!(stats.vertex_count, 8);
    assert_eq!(stats.triangle_count, 12);
    assert!(stats.is_closed);

    Ok(())
}

#[test]
fn test_sphere_volume_and_surface_area() -> Result<()> {
    let radius = 5.0_f64;
    let mesh = Primitive::sphere(radius, 64).to_mesh();
    let stats = analyze(&mesh);

    // Expected: (4/3) × π × r³
    let expected_volume = (4.0 / 3.0) * std::f64::consts::PI * radius.powi(3);

    // Expected: 4 × π × r²
    let expected_area = 4.0 * std::f64::consts::PI * radius.powi(2);

    let volume_error = (stats.volume - expected_volume).abs() / expected_volume;
    let area_error = (stats.surface_area - expected_area).abs() / expected_area;

    // Tessellation keeps the polyhedron inside the sphere
    assert!(stats.volume < expected_volume);
    assert!(volume_error < 0.02, "Volume error {:.2}% too high", volume_error * 100.0);
    assert!(area_error < 0.02, "Surface area error {:.2}% too high", area_error * 100.0);

    Ok(())
}

#[test]
fn test_bounding_box_and_centroid() -> Result<()> {
    let mesh = Primitive::cube(Vector3::new(10.0, 20.0, 30.0), false).to_mesh();
    let stats = analyze(&mesh);

    assert_eq!(stats.bbox, [0.0, 0.0, 0.0, 10.0, 20.0, 30.0]);
    let expected = [5.0, 10.0, 15.0];
    for (axis, &value) in stats.centroid.iter().enumerate() {
        assert!((value - expected[axis]).abs() < 1e-9);
    }

    Ok(())
}

#[test]
fn test_clip_halves_volume() -> Result<()> {
    let mesh = Primitive::cube(Vector3::new(10.0, 10.0, 10.0), true).to_mesh();
    let half = clip_with_plane(&mesh, [0.0; 3], [0.0, 0.0, 1.0], &OperationConfig::exact())?;
    let stats = analyze(&half);

    assert!((stats.volume - 500.0).abs() < 1e-6);
    assert!((stats.surface_area - 400.0).abs() < 1e-6);
    assert!(stats.bbox[5].abs() < 1e-9);
    assert!(stats.is_closed);

    let report = stats.to_string();
    assert!(report.contains("closed: yes"));

    Ok(())
}

#[test]
fn test_open_sheet_reports_boundary() -> Result<()> {
    let sheet = Primitive::grid(3.0, 3.0, 3, 3).to_mesh();
    let stats = analyze(&sheet);
    assert_eq!(stats.boundary_edge_count, 12);
    assert!(stats.is_manifold);
    assert!(!stats.is_closed);
    assert!(stats.volume.abs() < 1e-12);
    Ok(())
}
