// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Forcing missing intersection edges into the mesh

use super::CutState;
use crate::error::{CutError, CutResult};
use crate::geometry::{path_edges, IndexedMesh, PlanarCurveInsertion, PlaneFrame, VertexId};
use log::{debug, warn};

/// Counters for one connection pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectStats {
    /// Segments that were already mesh edges after insertion
    pub connected: usize,
    /// Segments made into edge chains by local re-triangulation
    pub repaired: usize,
    pub skipped: usize,
}

impl ConnectStats {
    pub fn all_segments_connected(&self) -> bool {
        self.skipped == 0
    }
}

/// Walks every intersection segment and repairs the ones with no edge
pub struct SegmentConnector<'a> {
    mesh: &'a mut IndexedMesh,
    state: &'a mut CutState,
    eps: f64,
}

impl<'a> SegmentConnector<'a> {
    pub fn new(mesh: &'a mut IndexedMesh, state: &'a mut CutState, eps: f64) -> Self {
        Self { mesh, state, eps }
    }

    pub fn run(mut self) -> ConnectStats {
        let mut stats = ConnectStats::default();

        for index in 0..self.state.segments.len() {
            let segment = self.state.segments[index];
            let [first, second] = segment.endpoints.map(|id| self.state.endpoints[id].vertex);
            let (Some(a), Some(b)) = (first, second) else {
                debug!("Segment {} has an unembedded endpoint; skipping", index);
                stats.skipped += 1;
                continue;
            };
            if a == b {
                continue;
            }
            if self.mesh.has_edge(a, b) {
                stats.connected += 1;
                continue;
            }

            match self.repair(segment.host_triangle, a, b) {
                Ok(()) => stats.repaired += 1,
                Err(err) => {
                    warn!(
                        "Could not connect curve vertices {} and {} on triangle {}: {}",
                        a, b, segment.host_triangle, err
                    );
                    stats.skipped += 1;
                }
            }
        }

        debug!(
            "Connected segments: {} direct, {} repaired, {} skipped",
            stats.connected, stats.repaired, stats.skipped
        );
        stats
    }

    /// Re-triangulate the patch tiling the host's original face so `a -> b` is an edge chain
    fn repair(
        &mut self,
        host: crate::geometry::TriangleId,
        a: VertexId,
        b: VertexId,
    ) -> CutResult<()> {
        let ancestor = self.state.provenance.ancestor_of(host);
        let region = self.state.provenance.live_descendants(ancestor, self.mesh);
        if region.is_empty() {
            return Err(CutError::NumericDegenerate(format!(
                "original face {ancestor} has no live triangles"
            )));
        }

        let [c0, c1, c2] = self
            .state
            .provenance
            .origin_vertices(ancestor, self.mesh)
            .ok_or_else(|| {
                CutError::NumericDegenerate(format!("no corners recorded for face {ancestor}"))
            })?;
        let frame = PlaneFrame::from_points(
            &self.mesh.position(c0),
            &self.mesh.position(c1),
            &self.mesh.position(c2),
        )
        .ok_or_else(|| {
            CutError::NumericDegenerate(format!("original face {ancestor} has no plane"))
        })?;

        let path = [a, b];
        let (outcome, new_vertices, replaced) = {
            let mut planar = PlanarCurveInsertion::new(self.mesh, frame, region, self.eps);
            let outcome = planar.apply(&path);
            let (new_vertices, replaced) = planar.into_splits();
            (outcome, new_vertices, replaced)
        };

        // Splits stay in the mesh even when the walk fails later on
        for replaced in &replaced {
            self.state
                .provenance
                .record(replaced.old, replaced.old_vertices, &replaced.children);
        }
        for &v in &new_vertices {
            if self.state.curve_vertices.insert(v) {
                self.state.snap.insert(self.mesh.position(v), v);
            }
        }

        let insertion = outcome?;
        let missing = path_edges(&insertion.path)
            .into_iter()
            .find(|edge| !self.mesh.has_edge(edge.a(), edge.b()));
        match missing {
            Some(edge) => Err(CutError::NumericDegenerate(format!(
                "edge ({}, {}) missing after re-triangulation",
                edge.a(),
                edge.b()
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cut::endpoint::{EndpointClass, IntersectionSegment, SegmentEndpoint};
    use nalgebra::Point3;

    /// Square split along its diagonal (0, 2)
    fn square() -> IndexedMesh {
        IndexedMesh::from_raw(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(2.0, 2.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
            ],
            &[[0, 1, 2], [0, 2, 3]],
        )
        .unwrap()
    }

    fn resolved(state: &mut CutState, mesh: &IndexedMesh, v: VertexId) -> usize {
        let id = state.endpoints.len();
        state
            .endpoints
            .push(SegmentEndpoint::new(mesh.position(v), EndpointClass::OnVertex(v)));
        id
    }

    #[test]
    fn test_existing_edge_counts_as_connected() {
        let mut mesh = square();
        let mut state = CutState::new(&mesh, 1e-6);
        let a = resolved(&mut state, &mesh, 0);
        let b = resolved(&mut state, &mesh, 2);
        state.segments.push(IntersectionSegment {
            endpoints: [a, b],
            host_triangle: 0,
        });

        let stats = SegmentConnector::new(&mut mesh, &mut state, 1e-6).run();
        assert_eq!(stats.connected, 1);
        assert!(stats.all_segments_connected());
    }

    #[test]
    fn test_missing_edge_is_repaired() {
        let mut mesh = IndexedMesh::from_raw(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(4.0, 0.0, 0.0),
                Point3::new(0.0, 4.0, 0.0),
            ],
            &[[0, 1, 2]],
        )
        .unwrap();
        let mut state = CutState::new(&mesh, 1e-6);

        // Two fan children of the centroid, each poked once more
        let centre = mesh.poke_face(0, Point3::new(4.0 / 3.0, 4.0 / 3.0, 0.0)).unwrap();
        state.provenance.record(0, centre.old_vertices, &centre.triangles);
        let x = mesh.poke_face(centre.triangles[0], Point3::new(2.0, 0.4, 0.0)).unwrap();
        state.provenance.record(centre.triangles[0], x.old_vertices, &x.triangles);
        let y = mesh.poke_face(centre.triangles[1], Point3::new(2.0, 1.5, 0.0)).unwrap();
        state.provenance.record(centre.triangles[1], y.old_vertices, &y.triangles);
        assert!(!mesh.has_edge(x.vertex, y.vertex));

        let a = resolved(&mut state, &mesh, x.vertex);
        let b = resolved(&mut state, &mesh, y.vertex);
        state.segments.push(IntersectionSegment {
            endpoints: [a, b],
            host_triangle: 0,
        });
        let before = mesh.triangle_count();

        let stats = SegmentConnector::new(&mut mesh, &mut state, 1e-6).run();

        assert_eq!(stats.repaired, 1);
        assert!(stats.all_segments_connected());
        // One interior edge split on the way: two triangles become four
        assert_eq!(mesh.triangle_count(), before + 2);
        assert!(mesh.is_manifold());
        let crossing = state
            .curve_vertices
            .iter()
            .copied()
            .find(|&v| v != x.vertex && v != y.vertex)
            .expect("repair vertex recorded");
        assert!((mesh.position(crossing) - Point3::new(2.0, 1.0, 0.0)).norm() < 1e-9);
        assert!(mesh.has_edge(x.vertex, crossing) && mesh.has_edge(crossing, y.vertex));
    }

    #[test]
    fn test_failed_repair_keeps_its_splits_recorded() {
        // Square (faces 0 and 1) with face 2 standing above edge (2, 3)
        let mut mesh = IndexedMesh::from_raw(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.5, 2.0, 0.0),
            ],
            &[[0, 1, 2], [0, 2, 3], [3, 2, 4]],
        )
        .unwrap();
        let mut state = CutState::new(&mesh, 1e-6);
        let a = resolved(&mut state, &mesh, 1);
        let b = resolved(&mut state, &mesh, 4);
        state.segments.push(IntersectionSegment {
            endpoints: [a, b],
            host_triangle: 0,
        });

        // The path leaves face 0 through the diagonal, splitting it, then has
        // nowhere to go inside face 0
        let stats = SegmentConnector::new(&mut mesh, &mut state, 1e-6).run();
        assert_eq!(stats.skipped, 1);
        assert!(!stats.all_segments_connected());
        assert_eq!(mesh.triangle_count(), 5);

        for t in mesh.triangle_ids().filter(|&t| t > 2) {
            let ancestor = state.provenance.ancestor_of(t);
            assert_ne!(ancestor, t, "triangle {t} missing from provenance");
            assert!(ancestor == 0 || ancestor == 1);
        }
        let mut tiling: Vec<_> = state.provenance.live_descendants(0, &mesh);
        tiling.extend(state.provenance.live_descendants(1, &mesh));
        tiling.extend(state.provenance.live_descendants(2, &mesh));
        assert_eq!(tiling.len(), mesh.triangle_count());

        let split = mesh.vertex_count() - 1;
        assert!((mesh.position(split) - Point3::new(0.8, 0.8, 0.0)).norm() < 1e-9);
        assert!(state.curve_vertices.contains(&split));
        assert_eq!(
            state.snap.find_nearest_within(&mesh.position(split), 1e-6).map(|(v, _)| v),
            Some(split)
        );
    }

    #[test]
    fn test_unembedded_endpoint_is_skipped() {
        let mut mesh = square();
        let mut state = CutState::new(&mesh, 1e-6);
        let a = resolved(&mut state, &mesh, 0);
        state.endpoints.push(SegmentEndpoint::new(
            Point3::new(1.5, 0.5, 0.0),
            EndpointClass::InFace(0),
        ));
        state.segments.push(IntersectionSegment {
            endpoints: [a, 1],
            host_triangle: 0,
        });

        let stats = SegmentConnector::new(&mut mesh, &mut state, 1e-6).run();
        assert_eq!(stats.skipped, 1);
        assert!(!stats.all_segments_connected());
    }
}
