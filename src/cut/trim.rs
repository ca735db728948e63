// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Containment trimming by generalized winding number

use crate::geometry::{IndexedMesh, MeshSpatialIndex, TriangleId, VertexId};
use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which side of the other operand survives trimming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrimMode {
    /// Delete triangles whose centroid lies inside the other operand
    RemoveInside,
    /// Delete triangles whose centroid lies outside the other operand
    RemoveOutside,
}

/// Deletes triangles of a mesh by their containment in another surface
pub struct ContainmentTrimmer<'a> {
    index: &'a MeshSpatialIndex,
    iso_value: f64,
}

impl<'a> ContainmentTrimmer<'a> {
    pub fn new(index: &'a MeshSpatialIndex, iso_value: f64) -> Self {
        Self { index, iso_value }
    }

    /// Check if `winding` counts as inside
    pub fn is_inside(&self, winding: f64) -> bool {
        winding > self.iso_value
    }

    /// Triangles of `mesh` that `mode` would delete
    pub fn doomed(&self, mesh: &IndexedMesh, mode: TrimMode) -> Vec<TriangleId> {
        let centroids: Vec<(TriangleId, nalgebra::Point3<f64>)> = mesh
            .triangle_ids()
            .filter_map(|t| mesh.centroid(t).map(|c| (t, c)))
            .collect();

        centroids
            .par_iter()
            .filter_map(|(t, centroid)| {
                let inside = self.is_inside(self.index.fast_winding_number(centroid));
                let remove = match mode {
                    TrimMode::RemoveInside => inside,
                    TrimMode::RemoveOutside => !inside,
                };
                remove.then_some(*t)
            })
            .collect()
    }

    /// Remove the triangles selected by `mode`, returning how many went
    pub fn trim(&self, mesh: &mut IndexedMesh, mode: TrimMode) -> usize {
        let doomed = self.doomed(mesh, mode);
        let mut removed = 0;
        for t in doomed {
            match mesh.remove_triangle(t) {
                Ok(_) => removed += 1,
                Err(err) => warn!("Trimmer could not remove triangle {}: {}", t, err),
            }
        }
        debug!(
            "Trimmed {} triangles ({:?}), {} remain",
            removed,
            mode,
            mesh.triangle_count()
        );
        removed
    }
}

/// Boundary vertices of `mesh` that lie on the intersection curve
pub fn seam_vertices(mesh: &IndexedMesh, curve: &BTreeSet<VertexId>) -> Vec<VertexId> {
    mesh.boundary_vertices()
        .into_iter()
        .filter(|v| curve.contains(v))
        .collect()
}
