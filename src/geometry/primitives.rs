// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Closed primitive solids with shared vertices and outward normals

use super::{IndexedMesh, Mesh, Triangle, Vertex};
use crate::config::CutConfig;
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

/// Geometric primitives
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Cube { size: Vector3<f64>, center: bool },
    Sphere { r: f64, fn_: u32 },
    Cylinder { h: f64, r: f64, fn_: u32 },
    /// Open square in the xy plane, centred on the origin, facing +z
    Quad { width: f64, height: f64 },
}

impl Primitive {
    pub fn cube(size: Vector3<f64>, center: bool) -> Self {
        Self::Cube { size, center }
    }

    pub fn sphere(r: f64, fn_: u32) -> Self {
        let segments = if fn_ >= 3 { fn_ } else { 32 };
        Self::Sphere { r, fn_: segments }
    }

    pub fn cylinder(h: f64, r: f64, fn_: u32) -> Self {
        let segments = if fn_ >= 3 { fn_ } else { 32 };
        Self::Cylinder {
            h,
            r,
            fn_: segments,
        }
    }

    pub fn quad(width: f64, height: f64) -> Self {
        Self::Quad { width, height }
    }

    pub fn to_mesh(&self) -> Mesh {
        let mut mesh = match self {
            Self::Cube { size, center } => generate_cube_mesh(*size, *center),
            Self::Sphere { r, fn_ } => generate_sphere_mesh(*r, *fn_),
            Self::Cylinder { h, r, fn_ } => generate_cylinder_mesh(*h, *r, *fn_),
            Self::Quad { width, height } => generate_quad_mesh(*width, *height),
        };
        mesh.recompute_normals();
        mesh
    }

    pub fn to_indexed_mesh(&self) -> IndexedMesh {
        IndexedMesh::from_mesh(&self.to_mesh(), CutConfig::default().weld_tolerance)
    }
}

fn add_positions(mesh: &mut Mesh, positions: impl IntoIterator<Item = Point3<f64>>) {
    for position in positions {
        mesh.add_vertex(Vertex::new(position, Vector3::zeros()));
    }
}

fn generate_cube_mesh(size: Vector3<f64>, center: bool) -> Mesh {
    let min = if center { -size / 2.0 } else { Vector3::zeros() };
    let max = min + size;

    let mut mesh = Mesh::with_capacity(8, 12);
    add_positions(
        &mut mesh,
        [
            Point3::new(min.x, min.y, min.z),
            Point3::new(max.x, min.y, min.z),
            Point3::new(max.x, max.y, min.z),
            Point3::new(min.x, max.y, min.z),
            Point3::new(min.x, min.y, max.z),
            Point3::new(max.x, min.y, max.z),
            Point3::new(max.x, max.y, max.z),
            Point3::new(min.x, max.y, max.z),
        ],
    );

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
    for indices in faces {
        mesh.add_triangle(Triangle::new(indices));
    }
    mesh
}

/// Two triangles sharing the diagonal from the min corner to the max corner
fn generate_quad_mesh(width: f64, height: f64) -> Mesh {
    let (x, y) = (width / 2.0, height / 2.0);
    let mut mesh = Mesh::with_capacity(4, 2);
    add_positions(
        &mut mesh,
        [
            Point3::new(-x, -y, 0.0),
            Point3::new(x, -y, 0.0),
            Point3::new(x, y, 0.0),
            Point3::new(-x, y, 0.0),
        ],
    );
    mesh.add_triangle(Triangle::new([0, 1, 2]));
    mesh.add_triangle(Triangle::new([0, 2, 3]));
    mesh
}

/// UV sphere around the z axis with one vertex per pole
fn generate_sphere_mesh(radius: f64, segments: u32) -> Mesh {
    let slices = segments as usize;
    let stacks = (segments as usize / 2).max(2);

    let mut mesh = Mesh::new();
    add_positions(&mut mesh, [Point3::new(0.0, 0.0, radius)]);
    for i in 1..stacks {
        let phi = PI * i as f64 / stacks as f64;
        let (ring, z) = (radius * phi.sin(), radius * phi.cos());
        add_positions(
            &mut mesh,
            (0..slices).map(|j| {
                let theta = 2.0 * PI * j as f64 / slices as f64;
                Point3::new(ring * theta.cos(), ring * theta.sin(), z)
            }),
        );
    }
    let south = mesh.add_vertex(Vertex::new(Point3::new(0.0, 0.0, -radius), Vector3::zeros()));

    let ring_start = |i: usize| 1 + (i - 1) * slices;
    for j in 0..slices {
        let next = (j + 1) % slices;

        let top = ring_start(1);
        mesh.add_triangle(Triangle::new([0, top + j, top + next]));

        for i in 1..stacks - 1 {
            let (upper, lower) = (ring_start(i), ring_start(i + 1));
            mesh.add_triangle(Triangle::new([upper + j, lower + j, lower + next]));
            mesh.add_triangle(Triangle::new([upper + j, lower + next, upper + next]));
        }

        let bottom = ring_start(stacks - 1);
        mesh.add_triangle(Triangle::new([south, bottom + next, bottom + j]));
    }
    mesh
}

/// Cylinder standing on the xy plane, from z = 0 to z = height
fn generate_cylinder_mesh(height: f64, radius: f64, segments: u32) -> Mesh {
    let n = segments as usize;
    let mut mesh = Mesh::new();
    add_positions(
        &mut mesh,
        [Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, height)],
    );
    for i in 0..n {
        let angle = 2.0 * PI * i as f64 / n as f64;
        let (x, y) = (radius * angle.cos(), radius * angle.sin());
        add_positions(
            &mut mesh,
            [Point3::new(x, y, 0.0), Point3::new(x, y, height)],
        );
    }

    let bottom = |i: usize| 2 + 2 * (i % n);
    let top = |i: usize| 3 + 2 * (i % n);
    for i in 0..n {
        mesh.add_triangle(Triangle::new([0, bottom(i + 1), bottom(i)]));
        mesh.add_triangle(Triangle::new([1, top(i), top(i + 1)]));
        mesh.add_triangle(Triangle::new([bottom(i), bottom(i + 1), top(i)]));
        mesh.add_triangle(Triangle::new([top(i), bottom(i + 1), top(i + 1)]));
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cube_is_closed() {
        let mesh = Primitive::cube(Vector3::new(2.0, 2.0, 2.0), true).to_indexed_mesh();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.is_closed());
        assert_relative_eq!(mesh.signed_volume(), 8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sphere_is_closed_and_outward() {
        let mesh = Primitive::sphere(1.0, 24).to_indexed_mesh();
        assert_eq!(mesh.vertex_count(), 2 + 11 * 24);
        assert!(mesh.is_closed());
        let volume = mesh.signed_volume();
        assert!(volume > 0.9 * 4.0 / 3.0 * PI && volume < 4.0 / 3.0 * PI);
    }

    #[test]
    fn test_quad_is_open() {
        let mesh = Primitive::quad(2.0, 2.0).to_indexed_mesh();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.boundary_edges().len(), 4);
        assert!(mesh.has_edge(0, 2));
        assert_relative_eq!(mesh.normal(0).unwrap().z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cylinder_is_closed_and_outward() {
        let mesh = Primitive::cylinder(2.0, 1.0, 32).to_indexed_mesh();
        assert_eq!(mesh.vertex_count(), 2 + 2 * 32);
        assert!(mesh.is_closed());
        let volume = mesh.signed_volume();
        assert!(volume > 0.95 * 2.0 * PI && volume < 2.0 * PI);
    }
}
