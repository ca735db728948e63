// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - mesh representations, spatial queries and predicates

mod analytics;
mod bbox;
mod bvh;
mod indexed_mesh;
mod mesh;
pub mod mesh_utils;
mod planar_insert;
mod point_hash;
pub mod predicates;
mod primitives;
mod spatial_index;
pub mod triangle_intersection;

pub use analytics::{analyze, GeometryStats};
pub use bbox::BoundingBox;
pub use bvh::{BVHNode, BVH};
pub use indexed_mesh::{
    EdgeKey, IndexedMesh, PokeResult, ReplacedTriangle, SplitResult, TriangleId, VertexId,
};
pub use mesh::{Mesh, Triangle, Vertex};
pub use planar_insert::{path_edges, CurveInsertion, PlanarCurveInsertion, PlaneFrame};
pub use point_hash::PointHash;
pub use primitives::Primitive;
pub use spatial_index::{IntersectionSet, MeshSpatialIndex, TrianglePairIntersection};
pub use triangle_intersection::{intersect_triangles, TriangleContact};
