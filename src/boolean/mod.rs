// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boolean operations built on mesh cutting
//!
//! Both operands are cut against snapshots of each other, trimmed by
//! containment, reconciled along the seam and appended into the target.

mod reconcile;

pub use reconcile::{reconcile_boundaries, ReconcileStats};

use crate::config::CutConfig;
use crate::cut::{CutReport, MeshCut, TrimMode};
use crate::error::CutResult;
use crate::geometry::{IndexedMesh, Mesh, MeshSpatialIndex};
use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BooleanOp {
    Union,
    Difference,
    Intersection,
}

impl BooleanOp {
    /// Trim modes for the target and the tool shell
    pub fn trim_modes(self) -> (TrimMode, TrimMode) {
        match self {
            BooleanOp::Union => (TrimMode::RemoveInside, TrimMode::RemoveInside),
            BooleanOp::Intersection => (TrimMode::RemoveOutside, TrimMode::RemoveOutside),
            BooleanOp::Difference => (TrimMode::RemoveInside, TrimMode::RemoveOutside),
        }
    }
}

/// Reports from both cutting directions plus the seam reconciliation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BooleanReport {
    pub op: BooleanOp,
    pub target: CutReport,
    pub tool: CutReport,
    pub reconcile: ReconcileStats,
    pub result_triangles: usize,
    pub result_manifold: bool,
}

impl BooleanReport {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Check if every intersection edge made it into both shells
    pub fn all_segments_connected(&self) -> bool {
        self.target.all_segments_connected && self.tool.all_segments_connected
    }
}

/// Combine `tool` into `target` in place
///
/// Both operands are cut and trimmed where they lie. Afterwards `tool` holds
/// the part of the tool shell that went into the result (reversed for a
/// difference) and `target` holds the whole result.
pub fn compute_boolean(
    target: &mut IndexedMesh,
    tool: &mut IndexedMesh,
    op: BooleanOp,
    config: &CutConfig,
) -> CutResult<BooleanReport> {
    config.validate()?;
    let (target_mode, tool_mode) = op.trim_modes();

    // Snapshots taken before either operand is edited
    let target_index = MeshSpatialIndex::build(target);
    let tool_index = MeshSpatialIndex::build(tool);

    let target_report = {
        let mut cut = MeshCut::with_index(target, &tool_index, *config);
        cut.compute()?;
        cut.trim(target_mode);
        cut.report().clone()
    };
    let tool_report = {
        let mut cut = MeshCut::with_index(tool, &target_index, *config);
        cut.compute()?;
        cut.trim(tool_mode);
        cut.report().clone()
    };

    if op == BooleanOp::Difference {
        tool.reverse_orientation();
    }

    let reconcile = reconcile_boundaries(target, tool, config.reconcile_tolerance);
    target.append(tool);

    let report = BooleanReport {
        op,
        target: target_report,
        tool: tool_report,
        reconcile,
        result_triangles: target.triangle_count(),
        result_manifold: target.is_manifold(),
    };
    info!(
        "{:?} finished with {} triangles ({} seam vertices unresolved)",
        op, report.result_triangles, report.reconcile.unresolved
    );
    Ok(report)
}

/// Perform boolean operation between two meshes
pub fn perform_boolean_operation(mesh_a: &Mesh, mesh_b: &Mesh, op: BooleanOp) -> Result<Mesh> {
    let config = CutConfig::default();
    let mut target = IndexedMesh::from_mesh(mesh_a, config.weld_tolerance);
    let mut tool = IndexedMesh::from_mesh(mesh_b, config.weld_tolerance);

    compute_boolean(&mut target, &mut tool, op, &config)
        .with_context(|| format!("{:?} of meshes failed", op))?;
    Ok(target.to_mesh())
}
