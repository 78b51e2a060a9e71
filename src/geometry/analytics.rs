// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Geometry analytics and statistics

use super::topology::topology_report;
use super::Mesh;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Geometry statistics and analytics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryStats {
    /// Signed enclosed volume; negative for inward-facing closed meshes
    pub volume: f64,
    /// Total surface area
    pub surface_area: f64,
    /// Bounding box [min_x, min_y, min_z, max_x, max_y, max_z]
    pub bbox: [f64; 6],
    /// Area-weighted centroid of the surface [x, y, z]
    pub centroid: [f64; 3],
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub boundary_edge_count: usize,
    pub is_manifold: bool,
    /// Every edge shared by exactly two triangles
    pub is_closed: bool,
}

impl GeometryStats {
    /// Create empty stats
    pub fn empty() -> Self {
        Self {
            volume: 0.0,
            surface_area: 0.0,
            bbox: [0.0; 6],
            centroid: [0.0; 3],
            vertex_count: 0,
            triangle_count: 0,
            boundary_edge_count: 0,
            is_manifold: true,
            is_closed: false,
        }
    }
}

impl fmt::Display for GeometryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "volume:        {:.6}", self.volume)?;
        writeln!(f, "surface area:  {:.6}", self.surface_area)?;
        writeln!(
            f,
            "bounds:        ({:.4}, {:.4}, {:.4}) .. ({:.4}, {:.4}, {:.4})",
            self.bbox[0], self.bbox[1], self.bbox[2], self.bbox[3], self.bbox[4], self.bbox[5]
        )?;
        writeln!(
            f,
            "centroid:      ({:.4}, {:.4}, {:.4})",
            self.centroid[0], self.centroid[1], self.centroid[2]
        )?;
        writeln!(f, "vertices:      {}", self.vertex_count)?;
        writeln!(f, "triangles:     {}", self.triangle_count)?;
        writeln!(f, "boundary:      {} edges", self.boundary_edge_count)?;
        write!(
            f,
            "manifold:      {}, closed: {}",
            if self.is_manifold { "yes" } else { "no" },
            if self.is_closed { "yes" } else { "no" }
        )
    }
}

/// Analyze mesh geometry and compute statistics
pub fn analyze(mesh: &Mesh) -> GeometryStats {
    if mesh.vertex_count() == 0 || mesh.triangle_count() == 0 {
        return GeometryStats::empty();
    }

    let bbox = mesh.bounding_box();
    let report = topology_report(mesh);

    GeometryStats {
        volume: signed_volume(mesh),
        surface_area: mesh.surface_area(),
        bbox: [bbox.min.x, bbox.min.y, bbox.min.z, bbox.max.x, bbox.max.y, bbox.max.z],
        centroid: calculate_centroid(mesh),
        vertex_count: mesh.vertex_count(),
        triangle_count: mesh.triangle_count(),
        boundary_edge_count: report.boundary_edge_count,
        is_manifold: report.is_manifold,
        is_closed: report.is_closed,
    }
}

/// Signed volume by the divergence theorem; meaningful for closed meshes
pub fn signed_volume(mesh: &Mesh) -> f64 {
    (0..mesh.triangle_count())
        .map(|t| {
            let [a, b, c] = mesh.triangle_points(t);
            a.coords.dot(&b.coords.cross(&c.coords))
        })
        .sum::<f64>()
        / 6.0
}

fn calculate_centroid(mesh: &Mesh) -> [f64; 3] {
    let mut weighted = nalgebra::Vector3::zeros();
    let mut total = 0.0;
    for t in 0..mesh.triangle_count() {
        let [a, b, c] = mesh.triangle_points(t);
        let area = mesh.triangle_area(t);
        weighted += (a.coords + b.coords + c.coords) * (area / 3.0);
        total += area;
    }
    if total == 0.0 {
        let sum = mesh
            .vertices()
            .iter()
            .fold(nalgebra::Vector3::zeros(), |acc, p| acc + p.coords);
        let mean = sum / mesh.vertex_count() as f64;
        return [mean.x, mean.y, mean.z];
    }
    let c = weighted / total;
    [c.x, c.y, c.z]
}
