// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Straight-edge insertion inside a planar patch of triangles
//!
//! The patch is the set of triangles that tile one original face. A segment
//! between two patch vertices is forced into the mesh by walking from one
//! end toward the other in the face's 2D frame, splitting every edge the
//! segment crosses. Edits are applied to the full mesh, so neighbours across
//! a split edge stay conforming.

use super::predicates::orient2d;
use super::{EdgeKey, IndexedMesh, ReplacedTriangle, TriangleId, VertexId};
use crate::error::{CutError, CutResult};
use ahash::AHashMap;
use nalgebra::{Point2, Point3, Vector3};
use std::collections::BTreeSet;

/// Orthonormal 2D frame on a plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneFrame {
    pub origin: Point3<f64>,
    pub u: Vector3<f64>,
    pub v: Vector3<f64>,
    pub normal: Vector3<f64>,
}

impl PlaneFrame {
    /// Frame in which `p0, p1, p2` appear counter-clockwise
    pub fn from_points(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> Option<Self> {
        let normal = super::predicates::triangle_normal(p0, p1, p2)?;
        let u = (p1 - p0).normalize();
        let v = normal.cross(&u);
        Some(Self {
            origin: *p0,
            u,
            v,
            normal,
        })
    }

    pub fn project(&self, p: &Point3<f64>) -> Point2<f64> {
        let d = p - self.origin;
        Point2::new(d.dot(&self.u), d.dot(&self.v))
    }

    pub fn lift(&self, q: &Point2<f64>) -> Point3<f64> {
        self.origin + self.u * q.x + self.v * q.y
    }
}

/// What one insertion changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurveInsertion {
    /// Vertices the inserted edges run through, in walk order
    pub path: Vec<VertexId>,
    /// Vertices created by edge splits
    pub new_vertices: Vec<VertexId>,
    /// Triangles replaced by edge splits, in edit order
    pub replaced: Vec<ReplacedTriangle>,
}

/// Walks straight segments through a planar patch of a mesh
pub struct PlanarCurveInsertion<'m> {
    mesh: &'m mut IndexedMesh,
    frame: PlaneFrame,
    region: BTreeSet<TriangleId>,
    uv: AHashMap<VertexId, Point2<f64>>,
    eps: f64,
    /// Every split made so far, including those of walks that later failed
    new_vertices: Vec<VertexId>,
    replaced: Vec<ReplacedTriangle>,
}

impl<'m> PlanarCurveInsertion<'m> {
    pub fn new(
        mesh: &'m mut IndexedMesh,
        frame: PlaneFrame,
        region: impl IntoIterator<Item = TriangleId>,
        eps: f64,
    ) -> Self {
        Self {
            mesh,
            frame,
            region: region.into_iter().collect(),
            uv: AHashMap::new(),
            eps,
            new_vertices: Vec::new(),
            replaced: Vec::new(),
        }
    }

    /// Live patch triangles after the insertions so far
    pub fn region(&self) -> &BTreeSet<TriangleId> {
        &self.region
    }

    /// Insert the polyline through `path` edge by edge
    ///
    /// On error the mesh keeps any splits already made; [`Self::into_splits`]
    /// hands them back.
    pub fn apply(&mut self, path: &[VertexId]) -> CutResult<CurveInsertion> {
        let mark = self.mark();
        let mut walked: Vec<VertexId> = Vec::new();
        for pair in path.windows(2) {
            let part = self.insert_segment(pair[0], pair[1])?;
            if walked.last() == part.path.first() {
                walked.extend(part.path.into_iter().skip(1));
            } else {
                walked.extend(part.path);
            }
        }
        Ok(self.since(mark, walked))
    }

    /// Vertices and replaced triangles of every split this walker made
    pub fn into_splits(self) -> (Vec<VertexId>, Vec<ReplacedTriangle>) {
        (self.new_vertices, self.replaced)
    }

    fn mark(&self) -> (usize, usize) {
        (self.new_vertices.len(), self.replaced.len())
    }

    fn since(&self, (vertices, replaced): (usize, usize), path: Vec<VertexId>) -> CurveInsertion {
        CurveInsertion {
            path,
            new_vertices: self.new_vertices[vertices..].to_vec(),
            replaced: self.replaced[replaced..].to_vec(),
        }
    }

    /// True when `(a, b)` is an edge of a patch triangle
    fn region_has_edge(&self, a: VertexId, b: VertexId) -> bool {
        self.mesh
            .edge_triangles(a, b)
            .iter()
            .any(|t| self.region.contains(t))
    }

    fn uv_of(&mut self, v: VertexId) -> Point2<f64> {
        if let Some(q) = self.uv.get(&v) {
            return *q;
        }
        let q = self.frame.project(&self.mesh.position(v));
        self.uv.insert(v, q);
        q
    }

    /// Make `a -> b` a chain of mesh edges
    pub fn insert_segment(&mut self, a: VertexId, b: VertexId) -> CutResult<CurveInsertion> {
        let mark = self.mark();
        let mut path = vec![a];
        if a == b {
            return Ok(self.since(mark, path));
        }

        let target = self.uv_of(b);
        let max_steps = 4 * self.region.len() + 64;
        let mut current = a;

        for _ in 0..max_steps {
            if self.region_has_edge(current, b) {
                path.push(b);
                return Ok(self.since(mark, path));
            }
            let next = self.step(current, b, target)?;
            path.push(next);
            current = next;
            if current == b {
                return Ok(self.since(mark, path));
            }
        }

        Err(CutError::NumericDegenerate(format!(
            "edge insertion {a} -> {b} did not terminate within {max_steps} steps"
        )))
    }

    /// Advance one vertex along the segment from `current` toward `b`
    fn step(
        &mut self,
        current: VertexId,
        b: VertexId,
        target: Point2<f64>,
    ) -> CutResult<VertexId> {
        let origin = self.uv_of(current);
        let dir = target - origin;
        let length = dir.norm();
        if length <= self.eps {
            return Err(CutError::NumericDegenerate(format!(
                "vertices {current} and {b} coincide in the face plane"
            )));
        }

        let fan: Vec<TriangleId> = self
            .mesh
            .vertex_triangles(current)
            .iter()
            .copied()
            .filter(|t| self.region.contains(t))
            .collect();

        for t in fan {
            let Some(tri) = self.mesh.triangle(t) else {
                continue;
            };
            let Some(start) = tri.iter().position(|&v| v == current) else {
                continue;
            };
            let mut x = tri[(start + 1) % 3];
            let mut y = tri[(start + 2) % 3];
            let (mut ux, mut uy) = (self.uv_of(x), self.uv_of(y));
            if orient2d(&origin, &ux, &uy) < 0.0 {
                std::mem::swap(&mut x, &mut y);
                std::mem::swap(&mut ux, &mut uy);
            }

            // Signed distances of x and y from the line through the segment
            let dx = orient2d(&origin, &target, &ux) / length;
            let dy = orient2d(&origin, &target, &uy) / length;

            for (w, uw, dw) in [(x, ux, dx), (y, uy, dy)] {
                let along = (uw - origin).dot(&dir) / length;
                if dw.abs() <= self.eps && along > self.eps && along <= length + self.eps {
                    return Ok(w);
                }
            }

            if !(dx < -self.eps && dy > self.eps) {
                continue;
            }

            // The segment leaves this triangle through edge (x, y)
            let s = dx / (dx - dy);
            let crossing = ux + (uy - ux) * s;
            let along = (crossing - origin).dot(&dir) / (length * length);
            if along >= 1.0 {
                return Err(CutError::NumericDegenerate(format!(
                    "vertex {b} lies inside triangle {t} instead of on a vertex"
                )));
            }

            let edge_length = (uy - ux).norm();
            if s * edge_length <= self.eps {
                return Ok(x);
            }
            if (1.0 - s) * edge_length <= self.eps {
                return Ok(y);
            }

            let (px, py) = (self.mesh.position(x), self.mesh.position(y));
            let split = self.mesh.split_edge(x, y, px + (py - px) * s)?;
            self.uv.insert(split.vertex, crossing);
            for replaced in &split.replaced {
                if self.region.remove(&replaced.old) {
                    self.region.extend(replaced.children);
                }
            }
            self.new_vertices.push(split.vertex);
            self.replaced.extend(split.replaced);
            return Ok(split.vertex);
        }

        Err(CutError::NumericDegenerate(format!(
            "no triangle around vertex {current} points toward vertex {b}"
        )))
    }
}

/// Edges of the inserted path, for checking the result
pub fn path_edges(path: &[VertexId]) -> Vec<EdgeKey> {
    path.windows(2).map(|w| EdgeKey::new(w[0], w[1])).collect()
}
