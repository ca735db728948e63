// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Ancestor/descendant bookkeeping for subdivided triangles

use crate::geometry::{IndexedMesh, TriangleId, VertexId};
use ahash::AHashMap;

/// Maps every triangle created by a cut back to the original face it tiles
///
/// Entries are only ever added. Once the trimmer deletes triangles some
/// descendants are dead; [`Provenance::live_descendants`] filters them.
#[derive(Debug, Clone, Default)]
pub struct Provenance {
    ancestor: AHashMap<TriangleId, TriangleId>,
    descendants: AHashMap<TriangleId, Vec<TriangleId>>,
    /// Corners of each subdivided original face, captured before its first edit
    origins: AHashMap<TriangleId, [VertexId; 3]>,
}

impl Provenance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Original face of `t`; an unedited face is its own ancestor
    pub fn ancestor_of(&self, t: TriangleId) -> TriangleId {
        self.ancestor.get(&t).copied().unwrap_or(t)
    }

    /// Record that `old` (with corners `old_vertices`) was replaced by `children`
    pub fn record(&mut self, old: TriangleId, old_vertices: [VertexId; 3], children: &[TriangleId]) {
        let root = self.ancestor_of(old);
        if root == old {
            self.origins.entry(old).or_insert(old_vertices);
        }
        for &child in children {
            self.ancestor.insert(child, root);
        }
        self.descendants
            .entry(root)
            .or_default()
            .extend_from_slice(children);
    }

    /// Corners of an original face, whether or not it is still live
    pub fn origin_vertices(&self, ancestor: TriangleId, mesh: &IndexedMesh) -> Option<[VertexId; 3]> {
        self.origins
            .get(&ancestor)
            .copied()
            .or_else(|| mesh.triangle(ancestor))
    }

    /// Live triangles currently tiling the original face `ancestor`
    pub fn live_descendants(&self, ancestor: TriangleId, mesh: &IndexedMesh) -> Vec<TriangleId> {
        let mut live: Vec<TriangleId> = Vec::new();
        if mesh.is_live(ancestor) {
            live.push(ancestor);
        }
        if let Some(children) = self.descendants.get(&ancestor) {
            live.extend(children.iter().copied().filter(|&t| mesh.is_live(t)));
        }
        live
    }

    /// Number of triangles created by recorded edits
    pub fn len(&self) -> usize {
        self.ancestor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ancestor.is_empty()
    }
}
