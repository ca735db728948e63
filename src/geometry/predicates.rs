// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Tolerant geometric predicates used by the cutting pipeline
//!
//! Every predicate takes an explicit tolerance instead of a hidden epsilon:
//! the caller decides what "on the plane" means for its scale.

use nalgebra::{Point2, Point3, Vector3};

/// Minimum relative magnitude below which a determinant counts as zero
pub const DEGENERATE_RATIO: f64 = 1e-12;

/// Compute oriented volume of tetrahedron (a, b, c, d)
/// Positive when d lies on the side the normal of (a, b, c) points to.
/// This is 6 times the signed volume.
pub fn oriented_volume(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> f64 {
    let ab = b - a;
    let ac = c - a;
    let ad = d - a;
    ab.dot(&ac.cross(&ad))
}

/// Twice the signed area of the planar triangle (a, b, c), positive when counter-clockwise
pub fn orient2d(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    let ab = b - a;
    let ac = c - a;
    // FMA keeps the cancellation error of nearly collinear inputs small
    ab.x.mul_add(ac.y, -(ab.y * ac.x))
}

/// Side of a plane a point falls on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    Front,
    Back,
    OnPlane,
}

/// Signed distances of a point to the plane through `origin` with unit `normal`,
/// snapped to exactly zero within `eps`
pub fn snapped_plane_distance(
    point: &Point3<f64>,
    origin: &Point3<f64>,
    normal: &Vector3<f64>,
    eps: f64,
) -> f64 {
    let distance = normal.dot(&(point - origin));
    if distance.abs() <= eps {
        0.0
    } else {
        distance
    }
}

/// Classify a point relative to a plane
pub fn classify_point_plane(
    point: &Point3<f64>,
    origin: &Point3<f64>,
    normal: &Vector3<f64>,
    eps: f64,
) -> PlaneSide {
    let distance = snapped_plane_distance(point, origin, normal, eps);
    if distance > 0.0 {
        PlaneSide::Front
    } else if distance < 0.0 {
        PlaneSide::Back
    } else {
        PlaneSide::OnPlane
    }
}

/// Unit normal of a triangle, or `None` when it has no area
pub fn triangle_normal(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> Option<Vector3<f64>> {
    let cross = (b - a).cross(&(c - a));
    let length = cross.norm();
    let scale = (b - a).norm() * (c - a).norm();
    if length <= DEGENERATE_RATIO * scale || length == 0.0 {
        None
    } else {
        Some(cross / length)
    }
}

/// Area of triangle (a, b, c)
pub fn triangle_area(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    (b - a).cross(&(c - a)).norm() / 2.0
}

/// Parameter of the projection of `p` onto the line through `a` and `b`;
/// 0 at `a`, 1 at `b`
pub fn segment_param(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return 0.0;
    }
    (p - a).dot(&ab) / len_sq
}

/// Distance from `p` to the closed segment [a, b]
pub fn point_segment_distance(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    let t = segment_param(p, a, b).clamp(0.0, 1.0);
    let closest = a + (b - a) * t;
    (p - closest).norm()
}

/// Barycentric coordinates of `p` projected onto the plane of (a, b, c)
pub fn barycentric(
    p: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> Option<[f64; 3]> {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;
    let d00 = v0.dot(&v0);
    let d01 = v0.dot(&v1);
    let d11 = v1.dot(&v1);
    let d20 = v2.dot(&v0);
    let d21 = v2.dot(&v1);
    let denom = d00 * d11 - d01 * d01;
    if denom.abs() <= DEGENERATE_RATIO * d00 * d11 || denom == 0.0 {
        return None;
    }
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    Some([1.0 - v - w, v, w])
}

/// Solid angle subtended by triangle (a, b, c) as seen from `p`
///
/// Uses the Van Oosterom and Strackee formula. Triangles touching `p`
/// or with `p` in their plane contribute nothing.
pub fn triangle_solid_angle(
    p: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> f64 {
    let va = a - p;
    let vb = b - p;
    let vc = c - p;
    let la = va.norm();
    let lb = vb.norm();
    let lc = vc.norm();
    if la == 0.0 || lb == 0.0 || lc == 0.0 {
        return 0.0;
    }

    let det = va.dot(&vb.cross(&vc));
    if det.abs() <= DEGENERATE_RATIO * la * lb * lc {
        return 0.0;
    }

    let denom = la * lb * lc + va.dot(&vb) * lc + va.dot(&vc) * lb + vb.dot(&vc) * la;
    2.0 * det.atan2(denom)
}
