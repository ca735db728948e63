// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Plain vertex/triangle mesh used to exchange geometry with callers

use super::{BoundingBox, PointHash};
use crate::boolean::BooleanOp;
use anyhow::Result;
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Vertex with position and normal
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl Vertex {
    pub fn new(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self { position, normal }
    }

    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        self.position = matrix.transform_point(&self.position);
        // Normals transform by the inverse transpose
        let normal_matrix = matrix
            .try_inverse()
            .map(|m| m.transpose())
            .unwrap_or(*matrix);
        self.normal = normal_matrix
            .transform_vector(&self.normal)
            .try_normalize(0.0)
            .unwrap_or(self.normal);
    }
}

/// Triangle defined by three vertex indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    pub fn new(indices: [usize; 3]) -> Self {
        Self { indices }
    }
}

/// Triangular mesh
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Transform all vertices by a matrix
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for vertex in &mut self.vertices {
            vertex.transform(matrix);
        }
    }

    /// Copy of the mesh moved by `offset`
    pub fn translated(&self, offset: Vector3<f64>) -> Mesh {
        let mut mesh = self.clone();
        mesh.transform(&Matrix4::new_translation(&offset));
        mesh
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_vertices(&self.vertices)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Boolean combination with another closed mesh using the default [`CutConfig`](crate::CutConfig)
    pub fn boolean_operation(&self, other: &Mesh, op: BooleanOp) -> Result<Mesh> {
        crate::boolean::perform_boolean_operation(self, other, op)
    }

    /// Weld vertices closer than `epsilon` and drop triangles that collapse
    ///
    /// Returns the number of vertices removed.
    pub fn weld_vertices(&mut self, epsilon: f64) -> usize {
        if self.vertices.is_empty() {
            return 0;
        }

        let original_count = self.vertices.len();
        let mut hash = PointHash::new(epsilon);
        let mut new_vertices: Vec<Vertex> = Vec::with_capacity(original_count);
        let mut remap = Vec::with_capacity(original_count);

        for vertex in &self.vertices {
            let index = match hash.find_nearest_within(&vertex.position, epsilon) {
                Some((index, _)) => index,
                None => {
                    hash.insert(vertex.position, new_vertices.len());
                    new_vertices.push(*vertex);
                    new_vertices.len() - 1
                }
            };
            remap.push(index);
        }

        self.triangles = self
            .triangles
            .iter()
            .map(|t| Triangle::new(t.indices.map(|i| remap[i])))
            .filter(|t| {
                let [a, b, c] = t.indices;
                a != b && b != c && a != c
            })
            .collect();
        self.vertices = new_vertices;

        original_count - self.vertices.len()
    }

    /// Recompute vertex normals as area-weighted averages of face normals
    pub fn recompute_normals(&mut self) {
        let mut normal_sums: Vec<Vector3<f64>> = vec![Vector3::zeros(); self.vertices.len()];

        for triangle in &self.triangles {
            let [i0, i1, i2] = triangle.indices;
            let p0 = self.vertices[i0].position;
            let face_normal =
                (self.vertices[i1].position - p0).cross(&(self.vertices[i2].position - p0));
            // Unnormalized cross product already carries the area weight
            for &idx in &triangle.indices {
                normal_sums[idx] += face_normal;
            }
        }

        for (vertex, sum) in self.vertices.iter_mut().zip(normal_sums) {
            vertex.normal = sum.try_normalize(1e-20).unwrap_or_else(Vector3::z);
        }
    }

    /// Signed enclosed volume
    pub fn volume(&self) -> f64 {
        self.triangles
            .iter()
            .map(|t| {
                let [a, b, c] = t.indices.map(|i| self.vertices[i].position.coords);
                a.dot(&b.cross(&c))
            })
            .sum::<f64>()
            / 6.0
    }
}
