// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Uniform grid over points for radius queries

use ahash::AHashMap;
use nalgebra::Point3;

type Cell = (i64, i64, i64);

/// Spatial hash mapping points to ids, tuned for "is there already a vertex here?" lookups
#[derive(Debug, Clone)]
pub struct PointHash<T> {
    cell_size: f64,
    cells: AHashMap<Cell, Vec<(Point3<f64>, T)>>,
    len: usize,
}

impl<T: Copy> PointHash<T> {
    /// Create an empty hash; `cell_size` should be close to the query radius
    pub fn new(cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            1.0
        };
        Self {
            cell_size,
            cells: AHashMap::new(),
            len: 0,
        }
    }

    fn cell_of(&self, p: &Point3<f64>) -> Cell {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
            (p.z / self.cell_size).floor() as i64,
        )
    }

    pub fn insert(&mut self, p: Point3<f64>, value: T) {
        let cell = self.cell_of(&p);
        self.cells.entry(cell).or_default().push((p, value));
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Closest stored point within `radius` of `p` and its distance
    pub fn find_nearest_within(&self, p: &Point3<f64>, radius: f64) -> Option<(T, f64)> {
        let reach = (radius / self.cell_size).ceil().max(1.0) as i64;
        let (cx, cy, cz) = self.cell_of(p);
        let mut best: Option<(T, f64)> = None;

        for dx in -reach..=reach {
            for dy in -reach..=reach {
                for dz in -reach..=reach {
                    let Some(bucket) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for (q, value) in bucket {
                        let d = (q - p).norm();
                        if d <= radius && best.map_or(true, |(_, bd)| d < bd) {
                            best = Some((*value, d));
                        }
                    }
                }
            }
        }
        best
    }
}
