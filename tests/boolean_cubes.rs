// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boolean operations on overlapping, touching and curved solids

use anyhow::Result;
use approx::assert_relative_eq;
use meshcut::geometry::{mesh_utils, Mesh, Primitive};
use meshcut::{compute_boolean, BooleanOp, CutConfig, IndexedMesh};
use nalgebra::{Matrix4, Vector3};

fn unit_cube() -> Mesh {
    Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh()
}

fn offset_cube(offset: Vector3<f64>) -> Mesh {
    let mut cube = unit_cube();
    cube.transform(&Matrix4::new_translation(&offset));
    cube
}

/// Weld coincident seam vertices so closedness can be checked on one index space
fn welded(mut mesh: Mesh) -> Mesh {
    mesh.weld_vertices(1e-7);
    mesh
}

#[test]
fn test_intersection_of_offset_cubes() -> Result<()> {
    println!("\n=== Intersection of offset unit cubes ===\n");
    let a = unit_cube();
    let b = offset_cube(Vector3::new(0.5, 0.5, 0.5));

    let result = welded(a.boolean_operation(&b, BooleanOp::Intersection)?);
    println!(
        "  Result: {} triangles, {} vertices, volume {:.6}",
        result.triangle_count(),
        result.vertex_count(),
        result.volume()
    );

    assert!(result.triangle_count() > 0, "Intersection should not be empty");
    assert!(mesh_utils::is_manifold(&result), "Result should be manifold");
    assert!(mesh_utils::is_closed(&result), "Result should be closed");
    assert_relative_eq!(result.volume(), 0.125, epsilon = 1e-6);
    let bbox = result.bounding_box();
    assert_relative_eq!(bbox.min.x, 0.5, epsilon = 1e-9);
    assert_relative_eq!(bbox.max.x, 1.0, epsilon = 1e-9);
    Ok(())
}

#[test]
fn test_union_of_offset_cubes() -> Result<()> {
    let a = unit_cube();
    let b = offset_cube(Vector3::new(0.5, 0.5, 0.5));

    let result = welded(a.boolean_operation(&b, BooleanOp::Union)?);
    println!("  Union volume {:.6}", result.volume());

    assert!(mesh_utils::is_closed(&result));
    assert_relative_eq!(result.volume(), 1.875, epsilon = 1e-6);
    Ok(())
}

#[test]
fn test_difference_of_offset_cubes() -> Result<()> {
    let a = unit_cube();
    let b = offset_cube(Vector3::new(0.5, 0.5, 0.5));

    let result = welded(a.boolean_operation(&b, BooleanOp::Difference)?);
    println!("  Difference volume {:.6}", result.volume());

    assert!(mesh_utils::is_closed(&result));
    assert!(mesh_utils::has_consistent_winding(&result));
    assert_relative_eq!(result.volume(), 0.875, epsilon = 1e-6);
    Ok(())
}

#[test]
fn test_report_for_offset_cubes() -> Result<()> {
    let config = CutConfig::default();
    let mut target = IndexedMesh::from_mesh(&unit_cube(), config.weld_tolerance);
    let mut tool = IndexedMesh::from_mesh(
        &offset_cube(Vector3::new(0.5, 0.5, 0.5)),
        config.weld_tolerance,
    );

    let report = compute_boolean(&mut target, &mut tool, BooleanOp::Intersection, &config)?;
    println!("{}", report.to_json());

    assert!(report.target.segments_found > 0);
    assert!(report.tool.segments_found > 0);
    assert!(report.all_segments_connected());
    assert!(report.target.triangles_removed > 0);
    assert!(report.result_manifold);
    assert_eq!(report.result_triangles, target.triangle_count());
    Ok(())
}

#[test]
fn test_cubes_sharing_a_face() -> Result<()> {
    println!("\n=== Cubes sharing a full face ===\n");
    let config = CutConfig::default();
    let mut target = IndexedMesh::from_mesh(&unit_cube(), config.weld_tolerance);
    let mut tool = IndexedMesh::from_mesh(
        &offset_cube(Vector3::new(1.0, 0.0, 0.0)),
        config.weld_tolerance,
    );

    let report = compute_boolean(&mut target, &mut tool, BooleanOp::Union, &config)?;
    println!(
        "  Coplanar pairs: {}, result triangles: {}",
        report.target.coplanar_pairs, report.result_triangles
    );

    assert!(report.target.coplanar_pairs > 0);
    assert!(report.result_triangles > 0);
    assert!(target.is_manifold(), "Result should be 2-manifold");
    Ok(())
}

#[test]
fn test_cube_union_sphere() -> Result<()> {
    let cube = unit_cube();
    let mut sphere = Primitive::sphere(0.6, 20).to_mesh();
    sphere.transform(&Matrix4::new_translation(&Vector3::new(0.93, 0.41, 0.57)));

    let config = CutConfig::default();
    let mut target = IndexedMesh::from_mesh(&cube, config.weld_tolerance);
    let mut tool = IndexedMesh::from_mesh(&sphere, config.weld_tolerance);
    let report = compute_boolean(&mut target, &mut tool, BooleanOp::Union, &config)?;
    println!(
        "  Cube ∪ sphere: {} triangles, {} seam vertices unresolved",
        report.result_triangles, report.reconcile.unresolved
    );

    assert!(report.target.segments_found > 0);
    assert!(target.is_manifold());
    // Cube plus the part of the ball outside it
    let volume = target.signed_volume();
    assert!(volume > 1.0 && volume < 1.0 + 4.0 / 3.0 * std::f64::consts::PI * 0.216);
    Ok(())
}

#[test]
fn test_disjoint_operands() -> Result<()> {
    let a = unit_cube();
    let b = offset_cube(Vector3::new(3.0, 0.0, 0.0));

    let union = a.boolean_operation(&b, BooleanOp::Union)?;
    let intersection = a.boolean_operation(&b, BooleanOp::Intersection)?;
    let difference = a.boolean_operation(&b, BooleanOp::Difference)?;

    assert_eq!(union.triangle_count(), 24);
    assert_eq!(intersection.triangle_count(), 0);
    assert_relative_eq!(difference.volume(), 1.0, epsilon = 1e-9);
    Ok(())
}
