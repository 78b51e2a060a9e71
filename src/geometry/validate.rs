// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Construction-time mesh invariants
//!
//! Checks run cheapest first and stop at the first violation:
//! non-empty buffers, finite coordinates, index range, and three distinct
//! indices per triangle. Manifoldness is not checked here.

use super::Mesh;
use crate::error::ValidationError;

/// Validate raw buffers as they arrive from an external adapter.
pub fn validate_buffers(vertices: &[[f64; 3]], triangles: &[[i64; 3]]) -> Result<(), ValidationError> {
    if vertices.is_empty() {
        return Err(ValidationError::EmptyVertices);
    }
    if triangles.is_empty() {
        return Err(ValidationError::EmptyTriangles);
    }

    if let Some((vertex, position)) = vertices
        .iter()
        .enumerate()
        .find(|(_, p)| !p.iter().all(|c| c.is_finite()))
    {
        return Err(ValidationError::NonFiniteVertex {
            vertex,
            position: *position,
        });
    }

    let vertex_count = vertices.len();
    for (triangle, indices) in triangles.iter().enumerate() {
        if let Some(&index) = indices
            .iter()
            .find(|&&i| i < 0 || i as u64 >= vertex_count as u64)
        {
            return Err(ValidationError::IndexOutOfRange {
                triangle,
                index,
                vertex_count,
            });
        }
    }

    for (triangle, &[a, b, c]) in triangles.iter().enumerate() {
        if a == b || b == c || a == c {
            return Err(ValidationError::DegenerateTriangle {
                triangle,
                indices: [a, b, c],
            });
        }
    }

    Ok(())
}

/// Validate an existing mesh value.
pub fn validate(mesh: &Mesh) -> Result<(), ValidationError> {
    if mesh.vertices().is_empty() {
        return Err(ValidationError::EmptyVertices);
    }
    if mesh.triangles().is_empty() {
        return Err(ValidationError::EmptyTriangles);
    }

    if let Some((vertex, p)) = mesh
        .vertices()
        .iter()
        .enumerate()
        .find(|(_, p)| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
    {
        return Err(ValidationError::NonFiniteVertex {
            vertex,
            position: [p.x, p.y, p.z],
        });
    }

    let vertex_count = mesh.vertex_count();
    for (triangle, t) in mesh.triangles().iter().enumerate() {
        if let Some(&index) = t.indices.iter().find(|&&i| i >= vertex_count) {
            return Err(ValidationError::IndexOutOfRange {
                triangle,
                index: index as i64,
                vertex_count,
            });
        }
    }

    for (triangle, t) in mesh.triangles().iter().enumerate() {
        let [a, b, c] = t.indices;
        if a == b || b == c || a == c {
            return Err(ValidationError::DegenerateTriangle {
                triangle,
                indices: [a as i64, b as i64, c as i64],
            });
        }
    }

    Ok(())
}
