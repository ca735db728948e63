// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Sorting intersection endpoints onto vertices, edges and faces

use super::endpoint::{EndpointClass, EndpointId, IntersectionSegment, SegmentEndpoint};
use super::CutState;
use crate::geometry::predicates::segment_param;
use crate::geometry::{
    EdgeKey, IndexedMesh, PointHash, TriangleId, TrianglePairIntersection, VertexId,
};
use log::debug;
use nalgebra::Point3;

/// Edge among `edges` whose interior passes within `eps` of `p`, nearest first
pub(crate) fn nearest_edge_within(
    mesh: &IndexedMesh,
    p: &Point3<f64>,
    edges: &[EdgeKey],
    eps: f64,
) -> Option<EdgeKey> {
    let mut best: Option<(EdgeKey, f64)> = None;
    for &edge in edges {
        let (a, b) = (mesh.position(edge.a()), mesh.position(edge.b()));
        let t = segment_param(p, &a, &b);
        if t <= 0.0 || t >= 1.0 {
            continue;
        }
        let distance = (p - (a + (b - a) * t)).norm();
        if distance <= eps && best.map_or(true, |(_, d)| distance < d) {
            best = Some((edge, distance));
        }
    }
    best.map(|(edge, _)| edge)
}

/// Classifies endpoints against the mesh being cut
pub struct SegmentClassifier<'a> {
    mesh: &'a IndexedMesh,
    eps: f64,
}

/// Outcome of classifying one batch of raw segments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyStats {
    pub segments: usize,
    pub discarded: usize,
}

impl<'a> SegmentClassifier<'a> {
    pub fn new(mesh: &'a IndexedMesh, eps: f64) -> Self {
        Self { mesh, eps }
    }

    /// Snap to a vertex, else an edge of `host`, else the inside of `host`
    pub fn classify_point(
        &self,
        snap: &PointHash<VertexId>,
        p: &Point3<f64>,
        host: TriangleId,
    ) -> EndpointClass {
        if let Some((v, _)) = snap.find_nearest_within(p, self.eps) {
            return EndpointClass::OnVertex(v);
        }
        if let Some(edges) = self.mesh.triangle_edges(host) {
            if let Some(edge) = nearest_edge_within(self.mesh, p, &edges, self.eps) {
                return EndpointClass::OnEdge(edge);
            }
        }
        EndpointClass::InFace(host)
    }

    /// Turn raw triangle-pair segments into classified endpoints and queued insertions
    ///
    /// `triangle_a` of every pair must be a triangle of the mesh being cut.
    pub fn classify(
        &self,
        raw: &[TrianglePairIntersection],
        state: &mut CutState,
    ) -> ClassifyStats {
        let mut stats = ClassifyStats::default();

        for pair in raw {
            if (pair.end - pair.start).norm() <= self.eps {
                stats.discarded += 1;
                continue;
            }

            let ids = [
                self.endpoint_for(&pair.start, pair.triangle_a, state),
                self.endpoint_for(&pair.end, pair.triangle_a, state),
            ];
            let [first, second] = ids.map(|id| state.endpoints[id].vertex);
            if ids[0] == ids[1] || (first.is_some() && first == second) {
                stats.discarded += 1;
                continue;
            }

            state.segments.push(IntersectionSegment {
                endpoints: ids,
                host_triangle: pair.triangle_a,
            });
            stats.segments += 1;
        }

        debug!(
            "Classified {} segments ({} degenerate discarded), {} endpoints, {} queued",
            stats.segments,
            stats.discarded,
            state.endpoints.len(),
            state.pending.len()
        );
        stats
    }

    /// Existing endpoint with identical coordinates, or a newly classified one
    fn endpoint_for(&self, p: &Point3<f64>, host: TriangleId, state: &mut CutState) -> EndpointId {
        let key = point_key(p);
        if let Some(&id) = state.endpoint_lookup.get(&key) {
            return id;
        }

        let class = self.classify_point(&state.snap, p, host);
        let id = state.endpoints.len();
        state.endpoints.push(SegmentEndpoint::new(*p, class));
        state.endpoint_lookup.insert(key, id);
        match class {
            EndpointClass::OnVertex(v) => {
                state.curve_vertices.insert(v);
            }
            _ => state.pending.push(class, id),
        }
        id
    }
}

/// Exact coordinate key; `-0.0` and `0.0` collapse together
pub(crate) fn point_key(p: &Point3<f64>) -> [u64; 3] {
    [p.x, p.y, p.z].map(|c| (c + 0.0).to_bits())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cut::CutState;

    fn floor() -> IndexedMesh {
        IndexedMesh::from_raw(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
            ],
            &[[0, 1, 2]],
        )
        .unwrap()
    }

    #[test]
    fn test_each_point_gets_one_class() {
        let mesh = floor();
        let state = CutState::new(&mesh, 1e-6);
        let classifier = SegmentClassifier::new(&mesh, 1e-6);

        assert_eq!(
            classifier.classify_point(&state.snap, &Point3::new(1e-7, 0.0, 0.0), 0),
            EndpointClass::OnVertex(0)
        );
        assert_eq!(
            classifier.classify_point(&state.snap, &Point3::new(1.0, 1.0, 0.0), 0),
            EndpointClass::OnEdge(EdgeKey::new(1, 2))
        );
        assert_eq!(
            classifier.classify_point(&state.snap, &Point3::new(0.5, 0.5, 0.0), 0),
            EndpointClass::InFace(0)
        );
    }

    #[test]
    fn test_shared_endpoints_collapse() {
        let mesh = floor();
        let mut state = CutState::new(&mesh, 1e-6);
        let classifier = SegmentClassifier::new(&mesh, 1e-6);
        let mid = Point3::new(0.5, 0.5, 0.0);
        let raw = [
            TrianglePairIntersection {
                triangle_a: 0,
                triangle_b: 0,
                start: Point3::new(0.5, 0.0, 0.0),
                end: mid,
            },
            TrianglePairIntersection {
                triangle_a: 0,
                triangle_b: 1,
                start: mid,
                end: Point3::new(1.0, 1.0, 0.0),
            },
            TrianglePairIntersection {
                triangle_a: 0,
                triangle_b: 2,
                start: mid,
                end: mid + nalgebra::Vector3::new(1e-8, 0.0, 0.0),
            },
        ];

        let stats = classifier.classify(&raw, &mut state);
        assert_eq!(stats, ClassifyStats { segments: 2, discarded: 1 });
        assert_eq!(state.endpoints.len(), 3);
        assert_eq!(state.segments[0].endpoints[1], state.segments[1].endpoints[0]);
        assert_eq!(state.pending.len(), 3);
    }
}
