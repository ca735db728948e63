// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Embedding queued endpoints as mesh vertices
//!
//! Face insertions run to completion before any edge insertion: splitting an
//! edge destroys the faces on both sides, and those faces must no longer have
//! endpoints waiting on them by then.

use super::classify::nearest_edge_within;
use super::endpoint::{EndpointClass, EndpointId};
use super::CutState;
use crate::geometry::predicates::{barycentric, point_segment_distance};
use crate::geometry::{IndexedMesh, PokeResult, SplitResult, VertexId};
use log::{debug, warn};

/// Slack on barycentric weights when deciding which sub-triangle holds a point
const BARYCENTRIC_SLACK: f64 = 1e-9;

/// Counters for one insertion pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertStats {
    pub pokes: usize,
    pub splits: usize,
    /// Endpoints that landed on a vertex created by an earlier insertion
    pub snapped: usize,
    pub degraded: usize,
    pub abandoned: usize,
}

/// Drains the pending insertion queue of a [`CutState`] into the mesh
pub struct TopologyInserter<'a> {
    mesh: &'a mut IndexedMesh,
    state: &'a mut CutState,
    eps: f64,
    stats: InsertStats,
}

impl<'a> TopologyInserter<'a> {
    pub fn new(mesh: &'a mut IndexedMesh, state: &'a mut CutState, eps: f64) -> Self {
        Self {
            mesh,
            state,
            eps,
            stats: InsertStats::default(),
        }
    }

    pub fn run(mut self) -> InsertStats {
        while let Some((t, mut waiting)) = self.state.pending.pop_face() {
            let Some(id) = waiting.pop() else {
                continue;
            };
            if self.snap_existing(id) {
                self.state.pending.restore_face(t, waiting);
                continue;
            }

            let position = self.state.endpoints[id].position;
            match self.mesh.poke_face(t, position) {
                Ok(poke) => {
                    self.stats.pokes += 1;
                    self.state
                        .provenance
                        .record(t, poke.old_vertices, &poke.triangles);
                    self.resolve(id, poke.vertex);
                    for other in waiting {
                        self.place_after_poke(other, &poke);
                    }
                }
                Err(err) => {
                    warn!("Abandoning face insertion of endpoint {}: {}", id, err);
                    self.stats.abandoned += 1;
                    self.state.pending.restore_face(t, waiting);
                }
            }
        }

        while let Some((edge, mut waiting)) = self.state.pending.pop_edge() {
            let Some(id) = waiting.pop() else {
                continue;
            };
            if self.snap_existing(id) {
                self.state.pending.restore_edge(edge, waiting);
                continue;
            }

            let position = self.state.endpoints[id].position;
            match self.mesh.split_edge(edge.a(), edge.b(), position) {
                Ok(split) => {
                    self.stats.splits += 1;
                    for replaced in &split.replaced {
                        self.state.provenance.record(
                            replaced.old,
                            replaced.old_vertices,
                            &replaced.children,
                        );
                    }
                    self.resolve(id, split.vertex);
                    for other in waiting {
                        self.place_after_split(other, &split);
                    }
                }
                Err(err) => {
                    // Every endpoint on this edge would hit the same rejection
                    warn!(
                        "Abandoning {} insertions on edge ({}, {}): {}",
                        waiting.len() + 1,
                        edge.a(),
                        edge.b(),
                        err
                    );
                    self.stats.abandoned += waiting.len() + 1;
                }
            }
        }

        debug!(
            "Inserted endpoints: {} pokes, {} splits, {} snapped, {} degraded, {} abandoned",
            self.stats.pokes,
            self.stats.splits,
            self.stats.snapped,
            self.stats.degraded,
            self.stats.abandoned
        );
        self.stats
    }

    /// Resolve `id` onto a vertex already within tolerance, if there is one
    fn snap_existing(&mut self, id: EndpointId) -> bool {
        let position = self.state.endpoints[id].position;
        match self.state.snap.find_nearest_within(&position, self.eps) {
            Some((v, _)) => {
                self.stats.snapped += 1;
                self.resolve(id, v);
                true
            }
            None => false,
        }
    }

    fn resolve(&mut self, id: EndpointId, v: VertexId) {
        let endpoint = &mut self.state.endpoints[id];
        endpoint.vertex = Some(v);
        endpoint.class = EndpointClass::OnVertex(v);
        if self.state.curve_vertices.insert(v) {
            self.state.snap.insert(self.mesh.position(v), v);
        }
    }

    fn enqueue(&mut self, id: EndpointId, class: EndpointClass) {
        self.state.endpoints[id].class = class;
        self.state.pending.push(class, id);
    }

    /// Re-home an endpoint that was waiting on a face that just got poked
    fn place_after_poke(&mut self, id: EndpointId, poke: &PokeResult) {
        if self.snap_existing(id) {
            return;
        }
        let p = self.state.endpoints[id].position;
        if let Some(edge) = nearest_edge_within(self.mesh, &p, &poke.spokes, self.eps) {
            self.enqueue(id, EndpointClass::OnEdge(edge));
            return;
        }

        let mut best = None;
        for &child in &poke.triangles {
            let Some([a, b, c]) = self.mesh.triangle_points(child) else {
                continue;
            };
            let Some(weights) = barycentric(&p, &a, &b, &c) else {
                continue;
            };
            let min_weight = weights.into_iter().fold(f64::INFINITY, f64::min);
            if best.map_or(true, |(_, w)| min_weight > w) {
                best = Some((child, min_weight));
            }
        }

        match best {
            Some((child, w)) if w >= -BARYCENTRIC_SLACK => {
                self.enqueue(id, EndpointClass::InFace(child));
            }
            _ => {
                let fallback = poke.triangles[0];
                warn!(
                    "Endpoint {} fits no sub-triangle of poked vertex {}; placing on triangle {}",
                    id, poke.vertex, fallback
                );
                self.state.endpoints[id].degraded = true;
                self.stats.degraded += 1;
                self.enqueue(id, EndpointClass::InFace(fallback));
            }
        }
    }

    /// Re-home an endpoint that was waiting on an edge that just got split
    fn place_after_split(&mut self, id: EndpointId, split: &SplitResult) {
        if self.snap_existing(id) {
            return;
        }
        let p = self.state.endpoints[id].position;
        let distance_to = |mesh: &IndexedMesh, half: usize| {
            let edge = split.halves[half];
            point_segment_distance(&p, &mesh.position(edge.a()), &mesh.position(edge.b()))
        };
        let half = if distance_to(&*self.mesh, 0) <= distance_to(&*self.mesh, 1) {
            split.halves[0]
        } else {
            split.halves[1]
        };
        self.enqueue(id, EndpointClass::OnEdge(half));
    }
}
