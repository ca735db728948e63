// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Indexed triangle mesh with local topology edits
//!
//! Triangle ids are stable: removing a triangle leaves a tombstone and new
//! triangles always get fresh ids. Vertex ids are never reused either, so
//! callers can hold on to ids across edits and detect stale ones.

use super::predicates::triangle_normal;
use super::{BoundingBox, Mesh, PointHash, Triangle, Vertex};
use crate::error::TopologyError;
use ahash::AHashMap;
use log::debug;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

pub type VertexId = usize;
pub type TriangleId = usize;

/// Undirected edge, stored with the smaller vertex id first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey(VertexId, VertexId);

impl EdgeKey {
    pub fn new(a: VertexId, b: VertexId) -> Self {
        if a <= b {
            EdgeKey(a, b)
        } else {
            EdgeKey(b, a)
        }
    }

    pub fn a(&self) -> VertexId {
        self.0
    }

    pub fn b(&self) -> VertexId {
        self.1
    }

    pub fn contains(&self, v: VertexId) -> bool {
        self.0 == v || self.1 == v
    }

    /// The endpoint that is not `v`
    pub fn other(&self, v: VertexId) -> Option<VertexId> {
        if self.0 == v {
            Some(self.1)
        } else if self.1 == v {
            Some(self.0)
        } else {
            None
        }
    }
}

/// Outcome of [`IndexedMesh::poke_face`]
#[derive(Debug, Clone, PartialEq)]
pub struct PokeResult {
    pub vertex: VertexId,
    pub old_vertices: [VertexId; 3],
    /// Children `[a, b, v]`, `[b, c, v]`, `[c, a, v]` for old triangle `[a, b, c]`
    pub triangles: [TriangleId; 3],
    /// Spokes from `a`, `b` and `c` to the new vertex
    pub spokes: [EdgeKey; 3],
}

/// One triangle replaced by an edge split
#[derive(Debug, Clone, PartialEq)]
pub struct ReplacedTriangle {
    pub old: TriangleId,
    pub old_vertices: [VertexId; 3],
    pub children: [TriangleId; 2],
}

/// Outcome of [`IndexedMesh::split_edge`]
#[derive(Debug, Clone, PartialEq)]
pub struct SplitResult {
    pub vertex: VertexId,
    pub replaced: Vec<ReplacedTriangle>,
    /// The two halves of the split edge, `(a, v)` then `(v, b)`
    pub halves: [EdgeKey; 2],
}

/// Triangle mesh addressed by vertex and triangle ids
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexedMesh {
    positions: Vec<Point3<f64>>,
    triangles: Vec<Option<[VertexId; 3]>>,
    vertex_triangles: Vec<Vec<TriangleId>>,
    live_triangles: usize,
}

impl IndexedMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw positions and index triples, rejecting bad indices
    pub fn from_raw(
        positions: Vec<Point3<f64>>,
        triangles: &[[VertexId; 3]],
    ) -> Result<Self, TopologyError> {
        let mut mesh = Self {
            vertex_triangles: vec![Vec::new(); positions.len()],
            positions,
            triangles: Vec::with_capacity(triangles.len()),
            live_triangles: 0,
        };
        for tri in triangles {
            mesh.add_triangle(*tri)?;
        }
        Ok(mesh)
    }

    /// Import a [`Mesh`], welding vertices closer than `weld_tolerance`
    ///
    /// Triangles that collapse during welding are dropped.
    pub fn from_mesh(mesh: &Mesh, weld_tolerance: f64) -> Self {
        let mut result = Self::new();
        let mut hash = PointHash::new(weld_tolerance);
        let mut remap = Vec::with_capacity(mesh.vertices.len());

        for vertex in &mesh.vertices {
            let id = match hash.find_nearest_within(&vertex.position, weld_tolerance) {
                Some((id, _)) => id,
                None => {
                    let id = result.add_vertex(vertex.position);
                    hash.insert(vertex.position, id);
                    id
                }
            };
            remap.push(id);
        }

        let mut dropped = 0;
        for triangle in &mesh.triangles {
            let [i0, i1, i2] = triangle.indices;
            let (Some(&a), Some(&b), Some(&c)) = (remap.get(i0), remap.get(i1), remap.get(i2))
            else {
                dropped += 1;
                continue;
            };
            if result.add_triangle([a, b, c]).is_err() {
                dropped += 1;
            }
        }

        if dropped > 0 {
            debug!("Dropped {} degenerate triangles while importing mesh", dropped);
        }
        result
    }

    /// Export live triangles as a [`Mesh`] with area-weighted vertex normals
    ///
    /// Unreferenced vertices are left out.
    pub fn to_mesh(&self) -> Mesh {
        let mut mesh = Mesh::with_capacity(self.positions.len(), self.live_triangles);
        let mut remap: Vec<Option<usize>> = vec![None; self.positions.len()];

        for (_, tri) in self.triangles() {
            let mut indices = [0usize; 3];
            for (slot, &v) in indices.iter_mut().zip(tri.iter()) {
                *slot = match remap[v] {
                    Some(index) => index,
                    None => {
                        let index =
                            mesh.add_vertex(Vertex::new(self.positions[v], Vector3::zeros()));
                        remap[v] = Some(index);
                        index
                    }
                };
            }
            mesh.add_triangle(Triangle::new(indices));
        }

        mesh.recompute_normals();
        mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of live triangles
    pub fn triangle_count(&self) -> usize {
        self.live_triangles
    }

    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId {
        self.positions.push(position);
        self.vertex_triangles.push(Vec::new());
        self.positions.len() - 1
    }

    pub fn add_triangle(&mut self, tri: [VertexId; 3]) -> Result<TriangleId, TopologyError> {
        for &v in &tri {
            if v >= self.positions.len() {
                return Err(TopologyError::MissingVertex(v));
            }
        }
        if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
            return Err(TopologyError::DegenerateTriangle(tri));
        }

        let id = self.triangles.len();
        self.triangles.push(Some(tri));
        for &v in &tri {
            self.vertex_triangles[v].push(id);
        }
        self.live_triangles += 1;
        Ok(id)
    }

    /// Remove a live triangle and return its vertices
    pub fn remove_triangle(&mut self, t: TriangleId) -> Result<[VertexId; 3], TopologyError> {
        let tri = self
            .triangles
            .get_mut(t)
            .and_then(Option::take)
            .ok_or(TopologyError::MissingTriangle(t))?;
        for &v in &tri {
            self.vertex_triangles[v].retain(|&other| other != t);
        }
        self.live_triangles -= 1;
        Ok(tri)
    }

    /// Position of a vertex; panics on an id this mesh never issued
    pub fn position(&self, v: VertexId) -> Point3<f64> {
        self.positions[v]
    }

    pub fn set_position(&mut self, v: VertexId, position: Point3<f64>) {
        self.positions[v] = position;
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// Vertices of a live triangle
    pub fn triangle(&self, t: TriangleId) -> Option<[VertexId; 3]> {
        self.triangles.get(t).copied().flatten()
    }

    pub fn is_live(&self, t: TriangleId) -> bool {
        self.triangle(t).is_some()
    }

    /// Live triangles in id order
    pub fn triangles(&self) -> impl Iterator<Item = (TriangleId, [VertexId; 3])> + '_ {
        self.triangles
            .iter()
            .enumerate()
            .filter_map(|(id, tri)| tri.map(|tri| (id, tri)))
    }

    pub fn triangle_ids(&self) -> impl Iterator<Item = TriangleId> + '_ {
        self.triangles().map(|(id, _)| id)
    }

    pub fn triangle_points(&self, t: TriangleId) -> Option<[Point3<f64>; 3]> {
        self.triangle(t)
            .map(|[a, b, c]| [self.positions[a], self.positions[b], self.positions[c]])
    }

    pub fn centroid(&self, t: TriangleId) -> Option<Point3<f64>> {
        self.triangle_points(t)
            .map(|[a, b, c]| Point3::from((a.coords + b.coords + c.coords) / 3.0))
    }

    /// Unit normal, `None` for a dead or zero-area triangle
    pub fn normal(&self, t: TriangleId) -> Option<Vector3<f64>> {
        self.triangle_points(t)
            .and_then(|[a, b, c]| triangle_normal(&a, &b, &c))
    }

    /// Live triangles using vertex `v`
    pub fn vertex_triangles(&self, v: VertexId) -> &[TriangleId] {
        self.vertex_triangles
            .get(v)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Live triangles using the edge `(a, b)` in either direction
    pub fn edge_triangles(&self, a: VertexId, b: VertexId) -> Vec<TriangleId> {
        self.vertex_triangles(a)
            .iter()
            .copied()
            .filter(|&t| self.triangle(t).is_some_and(|tri| tri.contains(&b)))
            .collect()
    }

    pub fn has_edge(&self, a: VertexId, b: VertexId) -> bool {
        a != b
            && self
                .vertex_triangles(a)
                .iter()
                .any(|&t| self.triangle(t).is_some_and(|tri| tri.contains(&b)))
    }

    pub fn triangle_edges(&self, t: TriangleId) -> Option<[EdgeKey; 3]> {
        self.triangle(t).map(|[a, b, c]| {
            [EdgeKey::new(a, b), EdgeKey::new(b, c), EdgeKey::new(c, a)]
        })
    }

    /// Replace triangle `[a, b, c]` by a fan of three around a new vertex at `position`
    pub fn poke_face(
        &mut self,
        t: TriangleId,
        position: Point3<f64>,
    ) -> Result<PokeResult, TopologyError> {
        let [a, b, c] = self.remove_triangle(t)?;
        let v = self.add_vertex(position);
        let triangles = [
            self.add_triangle([a, b, v])?,
            self.add_triangle([b, c, v])?,
            self.add_triangle([c, a, v])?,
        ];
        Ok(PokeResult {
            vertex: v,
            old_vertices: [a, b, c],
            triangles,
            spokes: [EdgeKey::new(a, v), EdgeKey::new(b, v), EdgeKey::new(c, v)],
        })
    }

    /// Insert a vertex at `position` on edge `(a, b)`, splitting both adjacent triangles
    ///
    /// Orientation of each adjacent triangle is preserved.
    pub fn split_edge(
        &mut self,
        a: VertexId,
        b: VertexId,
        position: Point3<f64>,
    ) -> Result<SplitResult, TopologyError> {
        let adjacent = self.edge_triangles(a, b);
        match adjacent.len() {
            0 => return Err(TopologyError::MissingEdge(a, b)),
            1 | 2 => {}
            count => return Err(TopologyError::NonManifoldEdge { a, b, count }),
        }

        let v = self.add_vertex(position);
        let mut replaced = Vec::with_capacity(adjacent.len());
        for t in adjacent {
            let tri = self.remove_triangle(t)?;
            let start = (0..3)
                .find(|&i| {
                    let (x, y) = (tri[i], tri[(i + 1) % 3]);
                    (x == a && y == b) || (x == b && y == a)
                })
                .ok_or(TopologyError::MissingEdge(a, b))?;
            let x = tri[start];
            let y = tri[(start + 1) % 3];
            let z = tri[(start + 2) % 3];
            let children = [self.add_triangle([x, v, z])?, self.add_triangle([v, y, z])?];
            replaced.push(ReplacedTriangle {
                old: t,
                old_vertices: tri,
                children,
            });
        }

        Ok(SplitResult {
            vertex: v,
            replaced,
            halves: [EdgeKey::new(a, v), EdgeKey::new(v, b)],
        })
    }

    fn edge_use_counts(&self) -> AHashMap<EdgeKey, usize> {
        let mut counts = AHashMap::with_capacity(self.live_triangles * 3 / 2);
        for (_, [a, b, c]) in self.triangles() {
            for edge in [EdgeKey::new(a, b), EdgeKey::new(b, c), EdgeKey::new(c, a)] {
                *counts.entry(edge).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Edges used by exactly one live triangle, sorted
    pub fn boundary_edges(&self) -> Vec<EdgeKey> {
        let mut edges: Vec<EdgeKey> = self
            .edge_use_counts()
            .into_iter()
            .filter_map(|(edge, count)| (count == 1).then_some(edge))
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Vertices on boundary edges, sorted
    pub fn boundary_vertices(&self) -> Vec<VertexId> {
        let mut vertices: Vec<VertexId> = self
            .boundary_edges()
            .into_iter()
            .flat_map(|edge| [edge.a(), edge.b()])
            .collect();
        vertices.sort_unstable();
        vertices.dedup();
        vertices
    }

    /// No edge shared by more than two triangles and consistent orientation
    pub fn is_manifold(&self) -> bool {
        let mut directed: AHashMap<(VertexId, VertexId), usize> = AHashMap::new();
        for (_, [a, b, c]) in self.triangles() {
            for key in [(a, b), (b, c), (c, a)] {
                let count = directed.entry(key).or_insert(0);
                *count += 1;
                if *count > 1 {
                    return false;
                }
            }
        }
        self.edge_use_counts().values().all(|&count| count <= 2)
    }

    /// Manifold with every edge shared by exactly two triangles
    pub fn is_closed(&self) -> bool {
        self.is_manifold() && self.edge_use_counts().values().all(|&count| count == 2)
    }

    pub fn reverse_orientation(&mut self) {
        for tri in self.triangles.iter_mut().flatten() {
            tri.swap(1, 2);
        }
    }

    /// Append all of `other` as a disjoint component; returns the vertex id offset
    pub fn append(&mut self, other: &IndexedMesh) -> VertexId {
        let offset = self.positions.len();
        for &p in &other.positions {
            self.add_vertex(p);
        }
        for (_, [a, b, c]) in other.triangles() {
            let tri = [a + offset, b + offset, c + offset];
            let id = self.triangles.len();
            self.triangles.push(Some(tri));
            for &v in &tri {
                self.vertex_triangles[v].push(id);
            }
            self.live_triangles += 1;
        }
        offset
    }

    /// Signed enclosed volume, positive for outward-facing closed meshes
    pub fn signed_volume(&self) -> f64 {
        self.triangles()
            .map(|(_, [a, b, c])| {
                let (p0, p1, p2) = (self.positions[a], self.positions[b], self.positions[c]);
                p0.coords.dot(&p1.coords.cross(&p2.coords))
            })
            .sum::<f64>()
            / 6.0
    }

    /// Bounds of the vertices referenced by live triangles
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        for (_, tri) in self.triangles() {
            for v in tri {
                bbox.expand_to_include(&self.positions[v]);
            }
        }
        bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tetrahedron() -> IndexedMesh {
        IndexedMesh::from_raw(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
            &[[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn test_tetrahedron_is_closed() {
        let mesh = tetrahedron();
        assert!(mesh.is_closed());
        assert_relative_eq!(mesh.signed_volume(), 1.0 / 6.0, epsilon = 1e-12);
        assert!(mesh.boundary_edges().is_empty());
    }

    #[test]
    fn test_poke_face_keeps_closure() {
        let mut mesh = tetrahedron();
        let centroid = mesh.centroid(3).unwrap();
        let poke = mesh.poke_face(3, centroid).unwrap();

        assert_eq!(poke.old_vertices, [1, 2, 3]);
        assert_eq!(mesh.triangle(poke.triangles[0]), Some([1, 2, poke.vertex]));
        assert_eq!(mesh.triangle(poke.triangles[1]), Some([2, 3, poke.vertex]));
        assert_eq!(mesh.triangle(poke.triangles[2]), Some([3, 1, poke.vertex]));
        assert!(mesh.triangle(3).is_none());
        assert_eq!(mesh.triangle_count(), 6);
        assert!(mesh.is_closed());
        assert_relative_eq!(mesh.signed_volume(), 1.0 / 6.0, epsilon = 1e-12);
        assert!(matches!(
            mesh.poke_face(3, centroid),
            Err(TopologyError::MissingTriangle(3))
        ));
    }

    #[test]
    fn test_split_edge_preserves_orientation() {
        let mut mesh = tetrahedron();
        let split = mesh.split_edge(1, 2, Point3::new(0.5, 0.5, 0.0)).unwrap();

        assert_eq!(split.replaced.len(), 2);
        assert_eq!(split.halves, [EdgeKey::new(1, 4), EdgeKey::new(4, 2)]);
        assert!(!mesh.has_edge(1, 2));
        assert!(mesh.has_edge(1, 4) && mesh.has_edge(4, 2) && mesh.has_edge(0, 4));
        assert_eq!(mesh.triangle_count(), 6);
        assert!(mesh.is_closed());
        assert_relative_eq!(mesh.signed_volume(), 1.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_split_edge_errors() {
        let mut mesh = tetrahedron();
        assert!(matches!(
            mesh.split_edge(0, 7, Point3::origin()),
            Err(TopologyError::MissingEdge(0, 7))
        ));

        let mut fan = IndexedMesh::from_raw(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, -1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
            &[[0, 1, 2], [1, 0, 3], [0, 1, 4]],
        )
        .unwrap();
        let before = fan.vertex_count();
        assert!(matches!(
            fan.split_edge(0, 1, Point3::new(0.5, 0.0, 0.0)),
            Err(TopologyError::NonManifoldEdge { count: 3, .. })
        ));
        assert_eq!(fan.vertex_count(), before);
        assert!(!fan.is_manifold());
    }

    #[test]
    fn test_open_triangle_boundary() {
        let mesh = IndexedMesh::from_raw(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            &[[0, 1, 2]],
        )
        .unwrap();
        assert_eq!(mesh.boundary_edges().len(), 3);
        assert_eq!(mesh.boundary_vertices(), vec![0, 1, 2]);
        assert!(mesh.is_manifold());
        assert!(!mesh.is_closed());
    }

    #[test]
    fn test_reverse_and_append() {
        let mut mesh = tetrahedron();
        let mut other = tetrahedron();
        other.reverse_orientation();
        assert_relative_eq!(other.signed_volume(), -1.0 / 6.0, epsilon = 1e-12);

        let offset = mesh.append(&other);
        assert_eq!(offset, 4);
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 8);
        assert_relative_eq!(mesh.signed_volume(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mesh_roundtrip_welds() {
        let mesh = tetrahedron();
        let exported = mesh.to_mesh();
        assert_eq!(exported.vertex_count(), 4);
        assert_eq!(exported.triangle_count(), 4);

        let reimported = IndexedMesh::from_mesh(&exported, 1e-9);
        assert!(reimported.is_closed());
        assert!(matches!(
            IndexedMesh::from_raw(vec![Point3::origin()], &[[0, 0, 0]]),
            Err(TopologyError::DegenerateTriangle(_))
        ));
    }
}
