// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Surfclip
//!
//! Robust corefinement, clipping and remeshing of triangulated surfaces.
//! Meshes are validated at every entry point; operations return new meshes
//! and never alter their inputs.

pub mod boolean;
pub mod config;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod remesh;
pub mod repair;

mod api;

pub use api::{
    cleanup, clip_with_plane, clip_with_surface, corefine, corefine_with_config, cut_with_surface, remesh,
    reverse_orientation, validate_mesh, weld_meshes,
};
pub use config::{CutOptions, OperationConfig};
pub use error::{ConfigurationError, MeshError, MeshResult, ValidationError};
pub use geometry::{analyze, GeometryStats, Mesh, Plane, Primitive, Triangle};
pub use logging::{set_verbosity, verbosity};
