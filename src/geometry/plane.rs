// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Oriented clipping plane
//!
//! The kept ("inside") half-space is the one the normal points away from.

use super::robust_predicates::{classify_distance, PlaneClassification};
use super::Mesh;
use crate::error::ValidationError;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Normals shorter than this are rejected
pub const MIN_NORMAL_LENGTH: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    origin: Point3<f64>,
    /// Unit length
    normal: Vector3<f64>,
}

impl Plane {
    /// Build a plane from an origin and a (not necessarily unit) normal.
    pub fn new(origin: [f64; 3], normal: [f64; 3]) -> Result<Self, ValidationError> {
        if !origin.iter().all(|c| c.is_finite()) {
            return Err(ValidationError::NonFinitePlane {
                field: "origin",
                value: origin,
            });
        }
        if !normal.iter().all(|c| c.is_finite()) {
            return Err(ValidationError::NonFinitePlane {
                field: "normal",
                value: normal,
            });
        }

        let n = Vector3::new(normal[0], normal[1], normal[2]);
        let magnitude = n.norm();
        if magnitude < MIN_NORMAL_LENGTH {
            return Err(ValidationError::DegeneratePlaneNormal {
                normal,
                magnitude,
                minimum: MIN_NORMAL_LENGTH,
            });
        }

        Ok(Self {
            origin: Point3::new(origin[0], origin[1], origin[2]),
            normal: n / magnitude,
        })
    }

    pub fn origin(&self) -> &Point3<f64> {
        &self.origin
    }

    pub fn normal(&self) -> &Vector3<f64> {
        &self.normal
    }

    /// Positive on the normal side, negative on the kept side
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&(point - self.origin))
    }

    pub fn classify(&self, point: &Point3<f64>, tolerance: f64) -> PlaneClassification {
        classify_distance(self.signed_distance(point), tolerance)
    }

    /// Orthonormal in-plane basis (u, v) with u x v = normal
    pub fn basis(&self) -> (Vector3<f64>, Vector3<f64>) {
        let helper = if self.normal.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        let u = helper.cross(&self.normal).normalize();
        let v = self.normal.cross(&u);
        (u, v)
    }

    /// Count of mesh vertices strictly on each side: (back, front)
    pub fn side_counts(&self, mesh: &Mesh, tolerance: f64) -> (usize, usize) {
        mesh.vertices()
            .iter()
            .fold((0, 0), |(back, front), p| match self.classify(p, tolerance) {
                PlaneClassification::Back => (back + 1, front),
                PlaneClassification::Front => (back, front + 1),
                PlaneClassification::OnPlane => (back, front),
            })
    }
}
