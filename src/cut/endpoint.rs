// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Intersection segment endpoints and the queue of pending insertions

use crate::geometry::{EdgeKey, TriangleId, VertexId};
use nalgebra::Point3;
use serde::Serialize;
use std::collections::BTreeMap;

pub type EndpointId = usize;

/// Where an endpoint sits on the mesh being cut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EndpointClass {
    OnVertex(VertexId),
    OnEdge(EdgeKey),
    InFace(TriangleId),
}

/// One end of an intersection segment
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentEndpoint {
    /// Intersection point as computed, never moved
    pub position: Point3<f64>,
    pub class: EndpointClass,
    /// Mesh vertex once the endpoint is embedded
    pub vertex: Option<VertexId>,
    /// Placed on a sub-triangle that does not actually contain it
    pub degraded: bool,
}

impl SegmentEndpoint {
    pub fn new(position: Point3<f64>, class: EndpointClass) -> Self {
        let vertex = match class {
            EndpointClass::OnVertex(v) => Some(v),
            _ => None,
        };
        Self {
            position,
            class,
            vertex,
            degraded: false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.vertex.is_some()
    }
}

/// Piece of the intersection curve crossing one triangle of the cut mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntersectionSegment {
    pub endpoints: [EndpointId; 2],
    /// Original triangle of the mesh being cut that hosts the segment
    pub host_triangle: TriangleId,
}

/// Endpoints waiting to become vertices, keyed by the element they wait on
///
/// Each unresolved endpoint is listed under exactly one key.
#[derive(Debug, Clone, Default)]
pub struct PendingInsertions {
    faces: BTreeMap<TriangleId, Vec<EndpointId>>,
    edges: BTreeMap<EdgeKey, Vec<EndpointId>>,
}

impl PendingInsertions {
    /// Queue `id` under its class; vertices need no queueing
    pub fn push(&mut self, class: EndpointClass, id: EndpointId) {
        match class {
            EndpointClass::OnVertex(_) => {}
            EndpointClass::OnEdge(edge) => self.edges.entry(edge).or_default().push(id),
            EndpointClass::InFace(t) => self.faces.entry(t).or_default().push(id),
        }
    }

    pub fn pop_face(&mut self) -> Option<(TriangleId, Vec<EndpointId>)> {
        self.faces.pop_first()
    }

    pub fn pop_edge(&mut self) -> Option<(EdgeKey, Vec<EndpointId>)> {
        self.edges.pop_first()
    }

    /// Put back endpoints that still wait on `t`
    pub fn restore_face(&mut self, t: TriangleId, waiting: Vec<EndpointId>) {
        if !waiting.is_empty() {
            self.faces.entry(t).or_default().extend(waiting);
        }
    }

    pub fn restore_edge(&mut self, edge: EdgeKey, waiting: Vec<EndpointId>) {
        if !waiting.is_empty() {
            self.edges.entry(edge).or_default().extend(waiting);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty() && self.edges.is_empty()
    }

    /// Number of queued endpoints
    pub fn len(&self) -> usize {
        self.faces.values().map(Vec::len).sum::<usize>()
            + self.edges.values().map(Vec::len).sum::<usize>()
    }
}
