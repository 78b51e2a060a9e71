// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Validation at construction and at operation entry

use anyhow::Result;
use surfclip::{validate_mesh, Mesh, MeshError, OperationConfig, ValidationError};

fn quad_vertices() -> Vec<[f64; 3]> {
    vec![
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ]
}

#[test]
fn test_accepts_valid_buffers() -> Result<()> {
    validate_mesh(&quad_vertices(), &[[0, 1, 2], [0, 2, 3]])?;
    let mesh = Mesh::from_buffers(&quad_vertices(), &[[0, 1, 2], [0, 2, 3]])?;
    assert_eq!(mesh.triangle_count(), 2);
    Ok(())
}

#[test]
fn test_repeated_index_names_triangle() -> Result<()> {
    let err = validate_mesh(&quad_vertices(), &[[0, 1, 2], [3, 3, 1]]).unwrap_err();
    assert_eq!(
        err,
        ValidationError::DegenerateTriangle {
            triangle: 1,
            indices: [3, 3, 1]
        }
    );
    assert!(err.to_string().contains("triangle 1"));
    Ok(())
}

#[test]
fn test_index_range_and_sign() -> Result<()> {
    let err = validate_mesh(&quad_vertices(), &[[0, 1, 4]]).unwrap_err();
    assert!(matches!(err, ValidationError::IndexOutOfRange { triangle: 0, index: 4, .. }));

    let err = validate_mesh(&quad_vertices(), &[[0, -1, 2]]).unwrap_err();
    assert!(matches!(err, ValidationError::IndexOutOfRange { index: -1, .. }));
    Ok(())
}

#[test]
fn test_cheapest_check_first() -> Result<()> {
    assert_eq!(validate_mesh(&[], &[[0, 0, 0]]), Err(ValidationError::EmptyVertices));
    assert_eq!(validate_mesh(&quad_vertices(), &[]), Err(ValidationError::EmptyTriangles));

    // A non-finite coordinate is reported before a bad index
    let mut vertices = quad_vertices();
    vertices[2][1] = f64::NAN;
    let err = validate_mesh(&vertices, &[[0, 1, 9]]).unwrap_err();
    assert!(matches!(err, ValidationError::NonFiniteVertex { vertex: 2, .. }));
    Ok(())
}

#[test]
fn test_operations_reject_invalid_config() -> Result<()> {
    let mesh = Mesh::from_buffers(&quad_vertices(), &[[0, 1, 2], [0, 2, 3]])?;
    let config = OperationConfig::default().with_iterations(0);
    let err = surfclip::clip_with_surface(&mesh, &mesh, &config).unwrap_err();
    assert!(matches!(err, MeshError::Configuration(_)));

    let err = surfclip::cleanup(&mesh, -1.0, 0.0).unwrap_err();
    assert!(matches!(err, MeshError::Configuration(_)));
    Ok(())
}

#[test]
fn test_constraint_edges_must_exist() -> Result<()> {
    let mesh = Mesh::from_buffers(&quad_vertices(), &[[0, 1, 2], [0, 2, 3]])?;
    let constrained = mesh.clone().with_constrained_edges([(0, 2)])?;
    assert_eq!(constrained.constrained_edges().len(), 1);
    assert!(mesh.with_constrained_edges([(1, 3)]).is_err());
    Ok(())
}
