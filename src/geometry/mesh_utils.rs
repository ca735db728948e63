// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh validation utilities

use super::Mesh;
use ahash::AHashMap;

/// Undirected edge with the smaller index first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    pub v0: usize,
    pub v1: usize,
}

impl Edge {
    pub fn new(v0: usize, v1: usize) -> Self {
        if v0 < v1 {
            Self { v0, v1 }
        } else {
            Self { v0: v1, v1: v0 }
        }
    }
}

/// Build edge count map for a mesh
pub fn build_edge_counts(mesh: &Mesh) -> AHashMap<Edge, u32> {
    let mut edge_counts: AHashMap<Edge, u32> = AHashMap::new();
    for triangle in &mesh.triangles {
        let [a, b, c] = triangle.indices;
        for edge in [Edge::new(a, b), Edge::new(b, c), Edge::new(c, a)] {
            *edge_counts.entry(edge).or_insert(0) += 1;
        }
    }
    edge_counts
}

/// Check if mesh is manifold (each edge shared by at most 2 triangles)
pub fn is_manifold(mesh: &Mesh) -> bool {
    build_edge_counts(mesh).values().all(|&count| count <= 2)
}

/// Check if mesh is closed (each edge shared by exactly 2 triangles)
pub fn is_closed(mesh: &Mesh) -> bool {
    build_edge_counts(mesh).values().all(|&count| count == 2)
}

/// Every directed edge appears at most once, so neighbours agree on orientation
pub fn has_consistent_winding(mesh: &Mesh) -> bool {
    let mut directed: AHashMap<(usize, usize), u32> = AHashMap::new();
    for triangle in &mesh.triangles {
        let [a, b, c] = triangle.indices;
        for key in [(a, b), (b, c), (c, a)] {
            let count = directed.entry(key).or_insert(0);
            *count += 1;
            if *count > 1 {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Primitive, Triangle};
    use nalgebra::Vector3;

    #[test]
    fn test_closed_cylinder() {
        let mesh = Primitive::cylinder(10.0, 5.0, 32).to_mesh();

        assert!(is_manifold(&mesh), "Cylinder should be manifold");
        assert!(is_closed(&mesh), "Cylinder should be closed");
        assert!(has_consistent_winding(&mesh));
        assert_eq!(build_edge_counts(&mesh).len(), 3 * 32 * 4 / 2);
    }

    #[test]
    fn test_open_cube_boundary() {
        let mut mesh = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
        mesh.triangles.truncate(10);
        assert!(is_manifold(&mesh));
        assert!(!is_closed(&mesh));
        let boundary = build_edge_counts(&mesh)
            .values()
            .filter(|&&count| count == 1)
            .count();
        assert_eq!(boundary, 4);
    }

    #[test]
    fn test_flipped_triangle_breaks_winding() {
        let mut mesh = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
        assert!(has_consistent_winding(&mesh));
        let [a, b, c] = mesh.triangles[0].indices;
        mesh.triangles[0] = Triangle::new([a, c, b]);
        assert!(!has_consistent_winding(&mesh));
        assert!(is_closed(&mesh));
    }
}
