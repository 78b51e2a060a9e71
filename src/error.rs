// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Error types for mesh validation, configuration and geometric failures

use thiserror::Error;

/// Malformed input detected before any geometric work starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("mesh has no vertices")]
    EmptyVertices,

    #[error("mesh has no triangles")]
    EmptyTriangles,

    #[error("vertex {vertex} has a non-finite coordinate: {position:?}")]
    NonFiniteVertex { vertex: usize, position: [f64; 3] },

    #[error("triangle {triangle} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        triangle: usize,
        index: i64,
        vertex_count: usize,
    },

    #[error("triangle {triangle} does not reference three distinct vertices: {indices:?}")]
    DegenerateTriangle { triangle: usize, indices: [i64; 3] },

    #[error("plane {field} has a non-finite component: {value:?}")]
    NonFinitePlane { field: &'static str, value: [f64; 3] },

    #[error("plane normal {normal:?} has magnitude {magnitude:e} (must be >= {minimum:e})")]
    DegeneratePlaneNormal {
        normal: [f64; 3],
        magnitude: f64,
        minimum: f64,
    },

    #[error("({0}, {1}) is not an edge of the mesh")]
    UnknownEdge(usize, usize),
}

/// Invalid operation parameters, rejected at call entry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("invalid target edge length: {0} (must be > 0)")]
    InvalidTargetEdgeLength(f64),

    #[error("invalid iteration count: {0} (must be > 0)")]
    InvalidIterations(i64),

    #[error("invalid {name}: {value} (must be finite and >= 0)")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("{operation} needs at least one mesh")]
    NoMeshes { operation: &'static str },
}

/// Top-level error returned by every public operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("geometric inconsistency during {operation}: {details}")]
    GeometricInconsistency {
        operation: &'static str,
        details: String,
    },
}

impl MeshError {
    pub(crate) fn inconsistent(operation: &'static str, details: impl Into<String>) -> Self {
        Self::GeometricInconsistency {
            operation,
            details: details.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type MeshResult<T> = Result<T, MeshError>;
