// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Geometric primitives generator
//!
//! All primitives share vertices between adjacent triangles and are wound
//! counter-clockwise seen from outside (or from +z for the grid).

use super::{Mesh, Triangle};
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

/// Geometric primitives
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Cube { size: Vector3<f64>, center: bool },
    Sphere { r: f64, segments: u32 },
    Grid { width: f64, depth: f64, nx: u32, ny: u32 },
}

impl Primitive {
    pub fn cube(size: Vector3<f64>, center: bool) -> Self {
        Self::Cube { size, center }
    }

    /// UV sphere; `segments` slices around and half as many stacks
    pub fn sphere(r: f64, segments: u32) -> Self {
        let segments = if segments > 0 { segments.max(3) } else { 32 };
        Self::Sphere { r, segments }
    }

    /// Open planar grid in z = 0 centred on the origin
    pub fn grid(width: f64, depth: f64, nx: u32, ny: u32) -> Self {
        Self::Grid {
            width,
            depth,
            nx: nx.max(1),
            ny: ny.max(1),
        }
    }

    pub fn to_mesh(&self) -> Mesh {
        match self {
            Self::Cube { size, center } => generate_cube_mesh(*size, *center),
            Self::Sphere { r, segments } => generate_sphere_mesh(*r, *segments),
            Self::Grid { width, depth, nx, ny } => generate_grid_mesh(*width, *depth, *nx, *ny),
        }
    }
}

fn generate_cube_mesh(size: Vector3<f64>, center: bool) -> Mesh {
    let offset = if center { size / 2.0 } else { Vector3::zeros() };
    let min = Point3::origin() - offset;
    let max = min + size;

    let vertices = vec![
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(max.x, max.y, max.z),
        Point3::new(min.x, max.y, max.z),
    ];

    let faces = [
        // z+
        [4, 5, 6],
        [4, 6, 7],
        // z-
        [1, 0, 3],
        [1, 3, 2],
        // x+
        [5, 1, 2],
        [5, 2, 6],
        // x-
        [0, 4, 7],
        [0, 7, 3],
        // y+
        [7, 6, 2],
        [7, 2, 3],
        // y-
        [0, 1, 5],
        [0, 5, 4],
    ];

    let triangles = faces.iter().map(|&f| Triangle::new(f)).collect();
    Mesh::from_parts(vertices, triangles, [])
}

fn generate_sphere_mesh(radius: f64, segments: u32) -> Mesh {
    let slices = segments as usize;
    let stacks = (segments as usize / 2).max(2);

    let mut vertices = Vec::with_capacity(2 + (stacks - 1) * slices);
    vertices.push(Point3::new(0.0, radius, 0.0));
    for i in 1..stacks {
        let phi = PI * i as f64 / stacks as f64;
        let y = radius * phi.cos();
        let r = radius * phi.sin();
        for j in 0..slices {
            let theta = 2.0 * PI * j as f64 / slices as f64;
            vertices.push(Point3::new(r * theta.cos(), y, r * theta.sin()));
        }
    }
    vertices.push(Point3::new(0.0, -radius, 0.0));
    let south = vertices.len() - 1;

    let ring = |i: usize, j: usize| 1 + (i - 1) * slices + (j % slices);
    let mut triangles = Vec::with_capacity(2 * slices * (stacks - 1));

    for j in 0..slices {
        triangles.push(Triangle::new([0, ring(1, j + 1), ring(1, j)]));
    }
    for i in 1..stacks - 1 {
        for j in 0..slices {
            triangles.push(Triangle::new([ring(i, j), ring(i + 1, j + 1), ring(i + 1, j)]));
            triangles.push(Triangle::new([ring(i, j), ring(i, j + 1), ring(i + 1, j + 1)]));
        }
    }
    for j in 0..slices {
        triangles.push(Triangle::new([south, ring(stacks - 1, j), ring(stacks - 1, j + 1)]));
    }

    Mesh::from_parts(vertices, triangles, [])
}

fn generate_grid_mesh(width: f64, depth: f64, nx: u32, ny: u32) -> Mesh {
    let (nx, ny) = (nx as usize, ny as usize);
    let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            vertices.push(Point3::new(
                -width / 2.0 + width * i as f64 / nx as f64,
                -depth / 2.0 + depth * j as f64 / ny as f64,
                0.0,
            ));
        }
    }

    let index = |i: usize, j: usize| j * (nx + 1) + i;
    let mut triangles = Vec::with_capacity(2 * nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            triangles.push(Triangle::new([index(i, j), index(i + 1, j), index(i + 1, j + 1)]));
            triangles.push(Triangle::new([index(i, j), index(i + 1, j + 1), index(i, j + 1)]));
        }
    }

    Mesh::from_parts(vertices, triangles, [])
}
