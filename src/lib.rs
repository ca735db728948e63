// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe Meshcut
//!
//! Robust Boolean cutting for indexed triangle meshes.
//! Embeds the intersection curve of two meshes as real topology, trims each
//! operand by winding-number containment and merges the shells.

pub mod boolean;
pub mod config;
pub mod cut;
pub mod error;
pub mod geometry;

pub use boolean::{compute_boolean, perform_boolean_operation, BooleanOp, BooleanReport};
pub use config::CutConfig;
pub use cut::{CutReport, MeshCut, TrimMode};
pub use error::{CutError, CutResult, TopologyError};
pub use geometry::{IndexedMesh, Mesh, Primitive};

use anyhow::Result;

/// Main entry point: Boolean combination of two closed meshes with settings from [`CutConfig::load`]
pub fn boolean(mesh_a: &Mesh, mesh_b: &Mesh, op: BooleanOp) -> Result<Mesh> {
    let config = CutConfig::load()?;
    let mut target = IndexedMesh::from_mesh(mesh_a, config.weld_tolerance);
    let mut tool = IndexedMesh::from_mesh(mesh_b, config.weld_tolerance);
    compute_boolean(&mut target, &mut tool, op, &config)?;
    Ok(target.to_mesh())
}
