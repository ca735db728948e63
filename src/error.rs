// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types shared by the mesh editing and cutting stages
//!
//! Mesh edits report a [`TopologyError`] when an operation would leave the
//! triangle table inconsistent. Pipeline stages wrap those in [`CutError`],
//! which also carries numerical degeneracies and configuration problems.
//! Most per-element failures never surface as errors at all: they are
//! absorbed into the counters of a `CutReport`.

use crate::geometry::{TriangleId, VertexId};
use thiserror::Error;

/// Rejected topology edit on an [`IndexedMesh`](crate::geometry::IndexedMesh).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// Triangle id is out of range or was removed earlier.
    #[error("triangle {0} is not present in the mesh")]
    MissingTriangle(TriangleId),
    /// No live triangle uses the edge.
    #[error("edge ({0}, {1}) is not present in the mesh")]
    MissingEdge(VertexId, VertexId),
    /// Vertex id is out of range.
    #[error("vertex {0} is not present in the mesh")]
    MissingVertex(VertexId),
    /// Splitting the edge would touch more than two triangles.
    #[error("edge ({a}, {b}) is shared by {count} triangles")]
    NonManifoldEdge {
        a: VertexId,
        b: VertexId,
        count: usize,
    },
    /// Triangle repeats a vertex.
    #[error("triangle {0:?} repeats a vertex")]
    DegenerateTriangle([VertexId; 3]),
}

/// Recoverable failure of a cutting or boolean stage.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CutError {
    /// A topology edit was rejected.
    #[error("topology conflict: {0}")]
    TopologyConflict(#[from] TopologyError),
    /// Geometry too degenerate to process within the configured tolerance.
    #[error("numerically degenerate: {0}")]
    NumericDegenerate(String),
    /// Tolerances or iso-values that cannot work.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias used throughout the cutting pipeline.
pub type CutResult<T> = Result<T, CutError>;
