// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Geometry module - mesh representation and geometric building blocks

mod analytics;
mod bbox;
mod bvh;
mod mesh;
mod plane;
mod primitives;
mod validate;

pub mod classification;
pub mod robust_predicates;
pub mod spatial_hash;
pub mod topology;
pub mod triangle_intersection;
pub mod triangle_splitting;

pub use analytics::{analyze, signed_volume, GeometryStats};
pub use bbox::BoundingBox;
pub use bvh::{BVHNode, BVH};
pub use mesh::{EdgeKey, Mesh, Triangle};
pub use plane::{Plane, MIN_NORMAL_LENGTH};
pub use primitives::Primitive;
pub use spatial_hash::SpatialHash;
pub use validate::{validate, validate_buffers};
