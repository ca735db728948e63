// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Matching the open boundaries of two trimmed shells before they are merged

use crate::geometry::predicates::segment_param;
use crate::geometry::{EdgeKey, IndexedMesh, PointHash, VertexId};
use log::{debug, warn};
use nalgebra::Point3;
use serde::Serialize;

/// Outcome of aligning two shell boundaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    /// Boundary vertices that found a partner vertex
    pub matched: usize,
    /// Boundary vertices placed by splitting a partner edge
    pub split: usize,
    /// Boundary vertices left without a partner
    pub unresolved: usize,
}

impl ReconcileStats {
    fn absorb(&mut self, other: ReconcileStats) {
        self.matched += other.matched;
        self.split += other.split;
        self.unresolved += other.unresolved;
    }
}

/// Align the boundary vertices of `a` and `b` in both directions
///
/// Greedy: each boundary vertex takes the nearest partner within `tolerance`,
/// with no global matching.
pub fn reconcile_boundaries(a: &mut IndexedMesh, b: &mut IndexedMesh, tolerance: f64) -> ReconcileStats {
    let mut stats = reconcile_into(a, b, tolerance);
    stats.absorb(reconcile_into(b, a, tolerance));
    debug!(
        "Reconciled shell boundaries: {} matched, {} split, {} unresolved",
        stats.matched, stats.split, stats.unresolved
    );
    if stats.unresolved > 0 {
        warn!(
            "{} boundary vertices found no partner; the merged seam has gaps",
            stats.unresolved
        );
    }
    stats
}

/// Give every boundary vertex of `source` an exact counterpart on the boundary of `target`
fn reconcile_into(source: &IndexedMesh, target: &mut IndexedMesh, tolerance: f64) -> ReconcileStats {
    let mut stats = ReconcileStats::default();
    let mut partners: PointHash<VertexId> = PointHash::new(tolerance);
    for v in target.boundary_vertices() {
        partners.insert(target.position(v), v);
    }
    let mut edges = target.boundary_edges();

    for v in source.boundary_vertices() {
        let p = source.position(v);
        if let Some((w, _)) = partners.find_nearest_within(&p, tolerance) {
            target.set_position(w, p);
            stats.matched += 1;
            continue;
        }

        let Some(slot) = nearest_edge(target, &edges, &p, tolerance) else {
            stats.unresolved += 1;
            continue;
        };
        let edge = edges[slot];
        match target.split_edge(edge.a(), edge.b(), p) {
            Ok(split) => {
                edges.swap_remove(slot);
                edges.extend(split.halves);
                partners.insert(p, split.vertex);
                stats.split += 1;
            }
            Err(err) => {
                debug!("Could not split boundary edge for vertex {}: {}", v, err);
                stats.unresolved += 1;
            }
        }
    }
    stats
}

/// Index into `edges` of the nearest edge whose interior is within `tolerance` of `p`
fn nearest_edge(
    mesh: &IndexedMesh,
    edges: &[EdgeKey],
    p: &Point3<f64>,
    tolerance: f64,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (slot, edge) in edges.iter().enumerate() {
        let (a, b) = (mesh.position(edge.a()), mesh.position(edge.b()));
        let t = segment_param(p, &a, &b);
        if t <= 0.0 || t >= 1.0 {
            continue;
        }
        let distance = (p - (a + (b - a) * t)).norm();
        if distance <= tolerance && best.map_or(true, |(_, d)| distance < d) {
            best = Some((slot, distance));
        }
    }
    best.map(|(slot, _)| slot)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Open strip along x with its lower boundary on y = 0
    fn strip(xs: &[f64], below: bool) -> IndexedMesh {
        let y = if below { -1.0 } else { 1.0 };
        let mut positions: Vec<Point3<f64>> = xs.iter().map(|&x| Point3::new(x, 0.0, 0.0)).collect();
        let apex = positions.len();
        positions.push(Point3::new(0.5, y, 0.0));
        let faces: Vec<[usize; 3]> = (0..xs.len() - 1)
            .map(|i| if below { [i + 1, i, apex] } else { [i, i + 1, apex] })
            .collect();
        IndexedMesh::from_raw(positions, &faces).unwrap()
    }

    #[test]
    fn test_near_vertices_are_aligned() {
        let mut a = strip(&[0.0, 0.5, 1.0], false);
        let mut b = strip(&[0.0, 0.5 + 1e-7, 1.0], true);

        let stats = reconcile_boundaries(&mut a, &mut b, 1e-5);
        // Only the two apexes have nothing across the seam
        assert_eq!(stats, ReconcileStats { matched: 6, split: 0, unresolved: 2 });
        assert_eq!(b.position(1), a.position(1));
    }

    #[test]
    fn test_missing_vertex_splits_partner_edge() {
        let mut a = strip(&[0.0, 0.25, 1.0], false);
        let mut b = strip(&[0.0, 0.75, 1.0], true);

        let stats = reconcile_boundaries(&mut a, &mut b, 1e-5);
        assert_eq!(stats.split, 2);
        assert_eq!(stats.unresolved, 2);
        assert_eq!(a.triangle_count(), 3);
        assert_eq!(b.triangle_count(), 3);

        a.append(&b);
        let mut merged = a.to_mesh();
        merged.weld_vertices(1e-9);
        assert!(crate::geometry::mesh_utils::is_manifold(&merged));
    }

    #[test]
    fn test_far_boundary_stays_unresolved() {
        let mut a = strip(&[0.0, 1.0], false);
        let mut b = strip(&[5.0, 6.0], true);
        let stats = reconcile_boundaries(&mut a, &mut b, 1e-5);
        assert_eq!(stats.matched, 0);
        assert!(stats.unresolved > 0);
    }
}
