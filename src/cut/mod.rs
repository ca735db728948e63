// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Embedding the intersection curve of two meshes into one of them
//!
//! A [`MeshCut`] runs classify, insert and connect against a target mesh and
//! a spatial index of the cutting mesh. Afterwards the curve is real topology
//! in the target and [`MeshCut::remove_contained`] can trim it.

mod classify;
mod connect;
mod endpoint;
mod insert;
mod provenance;
mod trim;

pub use classify::{ClassifyStats, SegmentClassifier};
pub use connect::{ConnectStats, SegmentConnector};
pub use endpoint::{
    EndpointClass, EndpointId, IntersectionSegment, PendingInsertions, SegmentEndpoint,
};
pub use insert::{InsertStats, TopologyInserter};
pub use provenance::Provenance;
pub use trim::{seam_vertices, ContainmentTrimmer, TrimMode};

use crate::config::CutConfig;
use crate::error::CutResult;
use crate::geometry::{IndexedMesh, MeshSpatialIndex, PointHash, VertexId};
use ahash::AHashMap;
use log::{debug, info};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeSet;

/// Everything one cut accumulates while it edits the target
#[derive(Debug, Clone)]
pub struct CutState {
    pub(crate) endpoints: Vec<SegmentEndpoint>,
    pub(crate) endpoint_lookup: AHashMap<[u64; 3], EndpointId>,
    pub(crate) segments: Vec<IntersectionSegment>,
    pub(crate) pending: PendingInsertions,
    pub(crate) provenance: Provenance,
    pub(crate) curve_vertices: BTreeSet<VertexId>,
    pub(crate) snap: PointHash<VertexId>,
}

impl CutState {
    /// Fresh state whose snap index holds every vertex of `mesh`
    pub fn new(mesh: &IndexedMesh, eps: f64) -> Self {
        let mut snap = PointHash::new(eps);
        for (v, p) in mesh.positions().iter().enumerate() {
            snap.insert(*p, v);
        }
        Self {
            endpoints: Vec::new(),
            endpoint_lookup: AHashMap::new(),
            segments: Vec::new(),
            pending: PendingInsertions::default(),
            provenance: Provenance::new(),
            curve_vertices: BTreeSet::new(),
            snap,
        }
    }

    pub fn endpoints(&self) -> &[SegmentEndpoint] {
        &self.endpoints
    }

    pub fn segments(&self) -> &[IntersectionSegment] {
        &self.segments
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn curve_vertices(&self) -> &BTreeSet<VertexId> {
        &self.curve_vertices
    }
}

/// What happened during one cut
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CutReport {
    pub segments_found: usize,
    pub coplanar_pairs: usize,
    pub point_contacts: usize,
    pub segments_discarded: usize,
    pub endpoints: usize,
    pub degraded_endpoints: usize,
    pub abandoned_insertions: usize,
    pub segments_connected: usize,
    pub segments_repaired: usize,
    pub segments_skipped: usize,
    pub all_segments_connected: bool,
    pub curve_vertices: usize,
    pub triangles_removed: usize,
}

impl CutReport {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Cuts a target mesh along its intersection with another surface
pub struct MeshCut<'a> {
    target: &'a mut IndexedMesh,
    cut_index: Cow<'a, MeshSpatialIndex>,
    config: CutConfig,
    state: CutState,
    report: CutReport,
}

impl<'a> MeshCut<'a> {
    pub fn new(target: &'a mut IndexedMesh, cut_mesh: &IndexedMesh, config: CutConfig) -> Self {
        let index = MeshSpatialIndex::build(cut_mesh);
        Self::from_cow(target, Cow::Owned(index), config)
    }

    /// Cut against an index that is already built, such as a snapshot shared by both directions
    pub fn with_index(
        target: &'a mut IndexedMesh,
        cut_index: &'a MeshSpatialIndex,
        config: CutConfig,
    ) -> Self {
        Self::from_cow(target, Cow::Borrowed(cut_index), config)
    }

    fn from_cow(
        target: &'a mut IndexedMesh,
        cut_index: Cow<'a, MeshSpatialIndex>,
        config: CutConfig,
    ) -> Self {
        let state = CutState::new(target, config.snap_tolerance);
        Self {
            target,
            cut_index,
            config,
            state,
            report: CutReport::default(),
        }
    }

    /// Embed the intersection curve into the target in place
    pub fn compute(&mut self) -> CutResult<CutReport> {
        self.config.validate()?;
        let eps = self.config.snap_tolerance;
        self.state = CutState::new(self.target, eps);
        self.report = CutReport::default();

        let target_index = MeshSpatialIndex::build(self.target);
        let raw = target_index.find_all_intersections(&self.cut_index, eps);
        debug!(
            "Found {} intersection segments ({} coplanar pairs, {} point contacts)",
            raw.segments.len(),
            raw.coplanar_pairs,
            raw.point_contacts
        );

        let classified =
            SegmentClassifier::new(self.target, eps).classify(&raw.segments, &mut self.state);
        let inserted = TopologyInserter::new(self.target, &mut self.state, eps).run();
        let connected = SegmentConnector::new(self.target, &mut self.state, eps).run();

        self.report = CutReport {
            segments_found: raw.segments.len(),
            coplanar_pairs: raw.coplanar_pairs,
            point_contacts: raw.point_contacts,
            segments_discarded: classified.discarded,
            endpoints: self.state.endpoints.len(),
            degraded_endpoints: self.state.endpoints.iter().filter(|e| e.degraded).count(),
            abandoned_insertions: inserted.abandoned,
            segments_connected: connected.connected,
            segments_repaired: connected.repaired,
            segments_skipped: connected.skipped,
            all_segments_connected: connected.all_segments_connected(),
            curve_vertices: self.state.curve_vertices.len(),
            triangles_removed: 0,
        };
        info!(
            "Cut embedded {} segments into {} curve vertices ({} repaired, {} skipped)",
            classified.segments,
            self.report.curve_vertices,
            connected.repaired,
            connected.skipped
        );
        Ok(self.report.clone())
    }

    /// Delete target triangles inside the cutting surface, returning the seam vertices
    pub fn remove_contained(&mut self) -> Vec<VertexId> {
        self.trim(TrimMode::RemoveInside)
    }

    /// Delete target triangles on the `mode` side, returning the seam vertices
    pub fn trim(&mut self, mode: TrimMode) -> Vec<VertexId> {
        let trimmer = ContainmentTrimmer::new(&self.cut_index, self.config.containment_iso_value);
        self.report.triangles_removed += trimmer.trim(self.target, mode);
        seam_vertices(self.target, &self.state.curve_vertices)
    }

    pub fn report(&self) -> &CutReport {
        &self.report
    }

    pub fn state(&self) -> &CutState {
        &self.state
    }

    pub fn curve_vertices(&self) -> &BTreeSet<VertexId> {
        &self.state.curve_vertices
    }

    pub fn target(&self) -> &IndexedMesh {
        &*self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use nalgebra::{Point3, Vector3};

    fn offset_cubes() -> (IndexedMesh, IndexedMesh) {
        let a = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_indexed_mesh();
        let b = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false)
            .to_mesh()
            .translated(Vector3::new(0.5, 0.5, 0.5));
        (a, IndexedMesh::from_mesh(&b, 1e-9))
    }

    #[test]
    fn test_state_seeds_snap_index() {
        let mesh = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_indexed_mesh();
        let state = CutState::new(&mesh, 1e-6);
        for (v, p) in mesh.positions().iter().enumerate() {
            assert_eq!(state.snap.find_nearest_within(p, 1e-6).map(|(id, _)| id), Some(v));
        }
        assert!(state.endpoints().is_empty());
    }

    #[test]
    fn test_compute_embeds_curve() {
        let (mut target, tool) = offset_cubes();
        let mut cut = MeshCut::new(&mut target, &tool, CutConfig::default());
        let report = cut.compute().unwrap();

        assert!(report.segments_found > 0);
        assert!(report.all_segments_connected);
        assert_eq!(report.abandoned_insertions, 0);
        assert!(cut.target().is_manifold());
        assert!(cut.target().is_closed());

        for endpoint in cut.state().endpoints() {
            let v = endpoint.vertex.expect("every endpoint embedded");
            assert!((cut.target().position(v) - endpoint.position).norm() <= 1e-6);
        }
        // Inside the target the tool's surface only reaches the planes at 0.5
        for &v in cut.curve_vertices() {
            let p: Point3<f64> = cut.target().position(v);
            assert!([p.x, p.y, p.z].iter().any(|c| (c - 0.5).abs() < 1e-6));
        }
    }

    #[test]
    fn test_remove_contained_returns_seam() {
        let (mut target, tool) = offset_cubes();
        let volume_before = target.signed_volume();
        let mut cut = MeshCut::new(&mut target, &tool, CutConfig::default());
        cut.compute().unwrap();
        let seam = cut.remove_contained();

        assert!(!seam.is_empty());
        assert!(cut.report().triangles_removed > 0);
        assert!(seam.iter().all(|v| cut.curve_vertices().contains(v)));
        assert!(!cut.target().is_closed());
        assert!(cut.target().signed_volume() < volume_before);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let (mut target, tool) = offset_cubes();
        let config = CutConfig {
            snap_tolerance: -1.0,
            ..CutConfig::default()
        };
        let mut cut = MeshCut::new(&mut target, &tool, config);
        assert!(cut.compute().is_err());
    }

    #[test]
    fn test_report_serializes() {
        let report = CutReport {
            segments_found: 3,
            all_segments_connected: true,
            ..CutReport::default()
        };
        let json = report.to_json();
        assert!(json.contains("\"segments_found\": 3"));
        assert!(json.contains("\"all_segments_connected\": true"));
    }
}
