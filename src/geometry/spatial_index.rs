// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Immutable triangle snapshot of a mesh with a BVH on top
//!
//! A snapshot is taken before a mesh is edited, so pair queries and
//! containment tests keep seeing the original operand while the live
//! mesh is being cut.

use super::predicates::triangle_solid_angle;
use super::triangle_intersection::{intersect_triangles, TriangleContact};
use super::{BVHNode, BoundingBox, IndexedMesh, TriangleId, BVH};
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use std::f64::consts::PI;

/// Segment along which a triangle of one mesh crosses a triangle of another
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrianglePairIntersection {
    pub triangle_a: TriangleId,
    pub triangle_b: TriangleId,
    pub start: Point3<f64>,
    pub end: Point3<f64>,
}

/// All contacts between two indexed meshes
#[derive(Debug, Clone, Default)]
pub struct IntersectionSet {
    pub segments: Vec<TrianglePairIntersection>,
    /// Overlapping pairs lying in one plane; these yield no segments
    pub coplanar_pairs: usize,
    /// Pairs touching in a single point
    pub point_contacts: usize,
}

/// A cluster is summarised by its dipole once the query point is this many
/// cluster radii away from its centre
const FAR_FIELD_RATIO: f64 = 3.0;

/// Far-field summary of the triangles under one BVH node
#[derive(Debug, Clone)]
struct WindingCluster {
    /// Sum of the triangles' area vectors
    area_normal: Vector3<f64>,
    area: f64,
    /// Area-weighted centroid
    center: Point3<f64>,
    /// Every triangle below lies within this distance of `center`
    radius: f64,
    children: Option<Box<[WindingCluster; 2]>>,
    /// Snapshot slots, leaves only
    slots: Vec<usize>,
}

impl WindingCluster {
    fn build(node: &BVHNode, triangles: &[(TriangleId, [Point3<f64>; 3])]) -> Self {
        if let (Some(left), Some(right)) = (node.left.as_deref(), node.right.as_deref()) {
            let children = [Self::build(left, triangles), Self::build(right, triangles)];
            let area = children[0].area + children[1].area;
            let center = if area > 0.0 {
                Point3::from(
                    (children[0].center.coords * children[0].area
                        + children[1].center.coords * children[1].area)
                        / area,
                )
            } else {
                nalgebra::center(&children[0].center, &children[1].center)
            };
            let radius = children
                .iter()
                .map(|c| (c.center - center).norm() + c.radius)
                .fold(0.0, f64::max);
            return Self {
                area_normal: children[0].area_normal + children[1].area_normal,
                area,
                center,
                radius,
                children: Some(Box::new(children)),
                slots: Vec::new(),
            };
        }

        let slots: Vec<usize> = node.items.iter().map(|(slot, _)| *slot).collect();
        let mut area_normal = Vector3::zeros();
        let mut area = 0.0;
        let mut weighted = Vector3::zeros();
        let mut plain = Vector3::zeros();
        for &slot in &slots {
            let [a, b, c] = &triangles[slot].1;
            let n = (b - a).cross(&(c - a)) * 0.5;
            let centroid = (a.coords + b.coords + c.coords) / 3.0;
            area_normal += n;
            area += n.norm();
            weighted += centroid * n.norm();
            plain += centroid;
        }
        let center = if area > 0.0 {
            Point3::from(weighted / area)
        } else if slots.is_empty() {
            Point3::origin()
        } else {
            Point3::from(plain / slots.len() as f64)
        };
        let radius = slots
            .iter()
            .flat_map(|&slot| triangles[slot].1.iter())
            .map(|p| (p - center).norm())
            .fold(0.0, f64::max);

        Self {
            area_normal,
            area,
            center,
            radius,
            children: None,
            slots,
        }
    }
}

/// Spatial index over the live triangles of an [`IndexedMesh`]
#[derive(Debug, Clone)]
pub struct MeshSpatialIndex {
    triangles: Vec<(TriangleId, [Point3<f64>; 3])>,
    bvh: BVH,
    clusters: WindingCluster,
}

impl MeshSpatialIndex {
    pub fn build(mesh: &IndexedMesh) -> Self {
        let triangles: Vec<(TriangleId, [Point3<f64>; 3])> = mesh
            .triangles()
            .filter_map(|(id, _)| mesh.triangle_points(id).map(|pts| (id, pts)))
            .collect();
        let boxes = triangles
            .iter()
            .enumerate()
            .map(|(slot, (_, pts))| (slot, BoundingBox::from_points(pts.iter())))
            .collect();
        let bvh = BVH::build(boxes);
        let clusters = WindingCluster::build(bvh.root(), &triangles);
        Self {
            bvh,
            triangles,
            clusters,
        }
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bvh.bounds()
    }

    pub fn triangles(&self) -> &[(TriangleId, [Point3<f64>; 3])] {
        &self.triangles
    }

    /// Snapshot triangles whose boxes overlap `bbox`
    pub fn query(&self, bbox: &BoundingBox) -> impl Iterator<Item = &(TriangleId, [Point3<f64>; 3])> {
        self.bvh.query(bbox).into_iter().map(|slot| &self.triangles[slot])
    }

    /// Intersect every triangle of `self` with every nearby triangle of `other`
    pub fn find_all_intersections(&self, other: &MeshSpatialIndex, eps: f64) -> IntersectionSet {
        if !self.bounds().expanded(eps).intersects(&other.bounds()) {
            return IntersectionSet::default();
        }

        let per_triangle: Vec<IntersectionSet> = self
            .triangles
            .par_iter()
            .map(|(id_a, tri_a)| {
                let mut local = IntersectionSet::default();
                let bbox = BoundingBox::from_points(tri_a.iter()).expanded(eps);
                for (id_b, tri_b) in other.query(&bbox) {
                    match intersect_triangles(tri_a, tri_b, eps) {
                        TriangleContact::None => {}
                        TriangleContact::Coplanar => local.coplanar_pairs += 1,
                        TriangleContact::Point(_) => local.point_contacts += 1,
                        TriangleContact::Segment(start, end) => {
                            local.segments.push(TrianglePairIntersection {
                                triangle_a: *id_a,
                                triangle_b: *id_b,
                                start,
                                end,
                            })
                        }
                    }
                }
                local.segments.sort_by_key(|s| s.triangle_b);
                local
            })
            .collect();

        let mut result = IntersectionSet::default();
        for local in per_triangle {
            result.segments.extend(local.segments);
            result.coplanar_pairs += local.coplanar_pairs;
            result.point_contacts += local.point_contacts;
        }
        result
    }

    /// Generalized winding number of the indexed surface around `p`
    ///
    /// About 1 inside a closed outward-facing surface, 0 outside and 0.5
    /// on a face.
    pub fn winding_number(&self, p: &Point3<f64>) -> f64 {
        let total: f64 = self
            .triangles
            .iter()
            .map(|(_, [a, b, c])| triangle_solid_angle(p, a, b, c))
            .sum();
        total / (4.0 * PI)
    }

    /// Winding number with distant clusters replaced by their dipole term
    ///
    /// Triangles near `p` are summed exactly, so values on and next to the
    /// surface match [`Self::winding_number`] closely. Runs in roughly
    /// logarithmic time for points away from most of the surface.
    pub fn fast_winding_number(&self, p: &Point3<f64>) -> f64 {
        let mut total = 0.0;
        let mut stack = vec![&self.clusters];
        while let Some(cluster) = stack.pop() {
            let offset = cluster.center - p;
            let distance = offset.norm();
            if distance > FAR_FIELD_RATIO * cluster.radius {
                total += cluster.area_normal.dot(&offset) / (distance * distance * distance);
                continue;
            }
            match cluster.children.as_deref() {
                Some(children) => stack.extend(children.iter()),
                None => {
                    total += cluster
                        .slots
                        .iter()
                        .map(|&slot| {
                            let [a, b, c] = &self.triangles[slot].1;
                            triangle_solid_angle(p, a, b, c)
                        })
                        .sum::<f64>();
                }
            }
        }
        total / (4.0 * PI)
    }
}
