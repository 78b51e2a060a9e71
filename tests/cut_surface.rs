// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Surface clip and cut

use anyhow::Result;
use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};
use std::collections::BTreeSet;
use surfclip::geometry::topology;
use surfclip::{clip_with_surface, cut_with_surface, CutOptions, Mesh, OperationConfig, Primitive, Triangle};

fn translated(mesh: &Mesh, offset: [f64; 3]) -> Result<Mesh> {
    let offset = Vector3::new(offset[0], offset[1], offset[2]);
    let vertices: Vec<Point3<f64>> = mesh.vertices().iter().map(|p| p + offset).collect();
    let triangles: Vec<Triangle> = mesh.triangles().to_vec();
    Ok(Mesh::new(vertices, triangles)?)
}

fn sheet() -> Mesh {
    Primitive::grid(4.0, 4.0, 4, 4).to_mesh()
}

/// Unit cube crossing the sheet, placed so its outline misses the grid lines
fn cutter() -> Result<Mesh> {
    translated(&Primitive::cube(Vector3::new(1.0, 1.0, 1.0), true).to_mesh(), [0.1, 0.05, 0.0])
}

fn boundary_points(mesh: &Mesh) -> BTreeSet<[i64; 3]> {
    topology::boundary_edges(mesh)
        .iter()
        .flat_map(|e| [e.0, e.1])
        .map(|v| {
            let p = mesh.vertices()[v];
            [p.x, p.y, p.z].map(|c| (c * 1e6).round() as i64)
        })
        .filter(|p| p[0].abs() < 1_900_000 && p[1].abs() < 1_900_000)
        .collect()
}

#[test]
fn test_cut_removes_the_enclosed_part() -> Result<()> {
    let cut = cut_with_surface(&sheet(), &cutter()?, CutOptions::default())?;
    assert_relative_eq!(cut.surface_area(), 15.0, epsilon = 1e-9);
    assert!(topology::is_manifold(&cut));
    assert_eq!(topology::boundary_loops(&cut).len(), 2);
    Ok(())
}

#[test]
fn test_reversed_cutter_gives_the_complement() -> Result<()> {
    let cutter = cutter()?;
    let outside = cut_with_surface(&sheet(), &cutter, CutOptions::default())?;
    let inside = cut_with_surface(&sheet(), &cutter.reversed(), CutOptions::default())?;

    assert_relative_eq!(inside.surface_area(), 1.0, epsilon = 1e-9);
    assert_relative_eq!(outside.surface_area() + inside.surface_area(), 16.0, epsilon = 1e-9);

    let (refined, _) = surfclip::corefine(&sheet(), &cutter)?;
    assert_eq!(outside.triangle_count() + inside.triangle_count(), refined.triangle_count());
    // Both pieces end on the same curve
    assert_eq!(boundary_points(&outside), boundary_points(&inside));
    Ok(())
}

#[test]
fn test_clip_keeps_the_enclosed_part() -> Result<()> {
    let clipped = clip_with_surface(&sheet(), &cutter()?, &OperationConfig::exact())?;
    assert_relative_eq!(clipped.surface_area(), 1.0, epsilon = 1e-9);
    for p in clipped.vertices() {
        assert!(p.x >= -0.4 - 1e-9 && p.x <= 0.6 + 1e-9);
        assert!(p.y >= -0.45 - 1e-9 && p.y <= 0.55 + 1e-9);
    }
    Ok(())
}

#[test]
fn test_open_clipper_uses_its_orientation() -> Result<()> {
    // A vertical wall at x = 0.3 facing +x; inside is x < 0.3
    let wall = Mesh::new(
        vec![
            Point3::new(0.3, -3.0, -1.0),
            Point3::new(0.3, 3.0, -1.0),
            Point3::new(0.3, 3.0, 1.0),
            Point3::new(0.3, -3.0, 1.0),
        ],
        vec![Triangle::new([0, 1, 2]), Triangle::new([0, 2, 3])],
    )?;
    let clipped = clip_with_surface(&sheet(), &wall, &OperationConfig::exact())?;
    assert_relative_eq!(clipped.surface_area(), 4.0 * 2.3, epsilon = 1e-9);
    assert!(clipped.vertices().iter().all(|p| p.x <= 0.3 + 1e-9));

    let cut = cut_with_surface(&sheet(), &wall, CutOptions::default())?;
    assert_relative_eq!(cut.surface_area(), 4.0 * 1.7, epsilon = 1e-9);
    Ok(())
}

#[test]
fn test_coincident_patch_follows_flags() -> Result<()> {
    // The sheet lies in the cutter's top face and faces the same way
    let top = translated(&sheet(), [0.0, 0.0, 0.5])?;
    let cutter = cutter()?;

    let plain = cut_with_surface(&top, &cutter, CutOptions::default())?;
    assert_relative_eq!(plain.surface_area(), 15.0, epsilon = 1e-9);

    let same = CutOptions {
        preserve_intersection: true,
        preserve_intersection_clipper: false,
    };
    let kept = cut_with_surface(&top, &cutter, same)?;
    assert_relative_eq!(kept.surface_area(), 16.0, epsilon = 1e-9);

    let opposite = CutOptions {
        preserve_intersection: false,
        preserve_intersection_clipper: true,
    };
    let flipped = cut_with_surface(&top.reversed(), &cutter, opposite)?;
    assert_relative_eq!(flipped.surface_area(), 16.0, epsilon = 1e-9);
    let dropped = cut_with_surface(&top, &cutter, opposite)?;
    assert_relative_eq!(dropped.surface_area(), 15.0, epsilon = 1e-9);
    Ok(())
}
