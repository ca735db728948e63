// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Triangle-triangle intersection with a distance tolerance
//!
//! Vertex distances to the opposite plane are snapped to zero within the
//! tolerance, so a vertex lying on the other triangle's plane produces an
//! exact contact point instead of a sliver crossing.

use super::predicates::{snapped_plane_distance, triangle_normal};
use nalgebra::{Point3, Vector3};

/// Contact between two triangles
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriangleContact {
    /// Disjoint
    None,
    /// Same plane; never turned into segments
    Coplanar,
    /// Touch at a single point
    Point(Point3<f64>),
    /// Cross along a segment
    Segment(Point3<f64>, Point3<f64>),
}

/// Intersect two triangles; `eps` is an absolute distance
pub fn intersect_triangles(
    tri_a: &[Point3<f64>; 3],
    tri_b: &[Point3<f64>; 3],
    eps: f64,
) -> TriangleContact {
    let (Some(normal_a), Some(normal_b)) = (
        triangle_normal(&tri_a[0], &tri_a[1], &tri_a[2]),
        triangle_normal(&tri_b[0], &tri_b[1], &tri_b[2]),
    ) else {
        return TriangleContact::None;
    };

    let dist_b = tri_b.map(|p| snapped_plane_distance(&p, &tri_a[0], &normal_a, eps));
    if strictly_one_side(&dist_b) {
        return TriangleContact::None;
    }
    let dist_a = tri_a.map(|p| snapped_plane_distance(&p, &tri_b[0], &normal_b, eps));
    if dist_a.iter().all(|&d| d == 0.0) || dist_b.iter().all(|&d| d == 0.0) {
        return TriangleContact::Coplanar;
    }
    if strictly_one_side(&dist_a) {
        return TriangleContact::None;
    }

    let direction = normal_a.cross(&normal_b);
    let length = direction.norm();
    if length == 0.0 {
        return TriangleContact::None;
    }
    let direction = direction / length;

    let (Some(span_a), Some(span_b)) = (
        line_span(tri_a, &dist_a, &direction),
        line_span(tri_b, &dist_b, &direction),
    ) else {
        return TriangleContact::None;
    };

    let start = if span_a.min.0 >= span_b.min.0 {
        span_a.min
    } else {
        span_b.min
    };
    let end = if span_a.max.0 <= span_b.max.0 {
        span_a.max
    } else {
        span_b.max
    };

    if start.0 > end.0 + eps {
        return TriangleContact::None;
    }
    if end.0 - start.0 <= eps || (end.1 - start.1).norm() <= eps {
        return TriangleContact::Point(start.1);
    }
    TriangleContact::Segment(start.1, end.1)
}

fn strictly_one_side(distances: &[f64; 3]) -> bool {
    distances.iter().all(|&d| d > 0.0) || distances.iter().all(|&d| d < 0.0)
}

/// Extent of a triangle's plane crossing along the intersection line
struct Span {
    min: (f64, Point3<f64>),
    max: (f64, Point3<f64>),
}

fn line_span(tri: &[Point3<f64>; 3], dist: &[f64; 3], direction: &Vector3<f64>) -> Option<Span> {
    let mut crossings = Vec::with_capacity(3);
    for i in 0..3 {
        let j = (i + 1) % 3;
        if dist[i] == 0.0 {
            crossings.push(tri[i]);
        }
        if dist[i] * dist[j] < 0.0 {
            let t = dist[i] / (dist[i] - dist[j]);
            crossings.push(tri[i] + (tri[j] - tri[i]) * t);
        }
    }

    let mut points = crossings.into_iter().map(|p| (direction.dot(&p.coords), p));
    let first = points.next()?;
    let mut span = Span {
        min: first,
        max: first,
    };
    for entry in points {
        if entry.0 < span.min.0 {
            span.min = entry;
        }
        if entry.0 > span.max.0 {
            span.max = entry;
        }
    }
    Some(span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn floor_triangle() -> [Point3<f64>; 3] {
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ]
    }

    fn wall_at(x: f64) -> [Point3<f64>; 3] {
        [
            Point3::new(x, -1.0, -1.0),
            Point3::new(x, 3.0, -1.0),
            Point3::new(x, 1.0, 1.0),
        ]
    }

    #[test]
    fn test_crossing_triangles_give_segment() {
        match intersect_triangles(&floor_triangle(), &wall_at(0.5), 1e-9) {
            TriangleContact::Segment(start, end) => {
                assert_relative_eq!(start, Point3::new(0.5, 0.0, 0.0), epsilon = 1e-12);
                assert_relative_eq!(end, Point3::new(0.5, 1.5, 0.0), epsilon = 1e-12);
            }
            other => panic!("expected a segment, got {:?}", other),
        }
    }

    #[test]
    fn test_separated_triangles() {
        assert_eq!(
            intersect_triangles(&floor_triangle(), &wall_at(5.0), 1e-9),
            TriangleContact::None
        );
    }

    #[test]
    fn test_coplanar_triangles() {
        let shifted = floor_triangle().map(|p| p + Vector3::new(0.5, 0.5, 0.0));
        assert_eq!(
            intersect_triangles(&floor_triangle(), &shifted, 1e-9),
            TriangleContact::Coplanar
        );
    }

    #[test]
    fn test_vertex_touching_face() {
        let tip = [
            Point3::new(0.5, 0.5, 0.0),
            Point3::new(0.5, 0.0, 1.0),
            Point3::new(0.0, 0.5, 1.0),
        ];
        match intersect_triangles(&floor_triangle(), &tip, 1e-9) {
            TriangleContact::Point(p) => {
                assert_relative_eq!(p, Point3::new(0.5, 0.5, 0.0), epsilon = 1e-9)
            }
            other => panic!("expected a point, got {:?}", other),
        }
    }

    #[test]
    fn test_near_plane_vertex_is_snapped() {
        // Wall vertex sits 1e-12 below the floor plane and is treated as lying on it
        let wall = [
            Point3::new(0.5, 0.5, -1e-12),
            Point3::new(0.5, 0.2, 1.0),
            Point3::new(0.5, 0.8, 1.0),
        ];
        let contact = intersect_triangles(&floor_triangle(), &wall, 1e-9);
        assert!(matches!(contact, TriangleContact::Point(_)));
    }
}
