// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Uniform grid for radius queries over points

use ahash::AHashMap;
use nalgebra::Point3;
use smallvec::SmallVec;

/// Points bucketed by cubic cell; a query inspects the 27 cells around
/// the query point, so results are complete for radii up to the cell size.
#[derive(Debug, Clone)]
pub struct SpatialHash {
    cell_size: f64,
    cells: AHashMap<[i64; 3], SmallVec<[usize; 4]>>,
}

impl SpatialHash {
    /// A non-positive or non-finite cell size falls back to 1.0, which
    /// still serves exact-coincidence lookups.
    pub fn new(cell_size: f64) -> Self {
        let cell_size = if cell_size > 0.0 && cell_size.is_finite() {
            cell_size
        } else {
            1.0
        };
        Self {
            cell_size,
            cells: AHashMap::new(),
        }
    }

    fn key(&self, point: &Point3<f64>) -> [i64; 3] {
        [
            (point.x / self.cell_size).floor() as i64,
            (point.y / self.cell_size).floor() as i64,
            (point.z / self.cell_size).floor() as i64,
        ]
    }

    pub fn insert(&mut self, id: usize, point: &Point3<f64>) {
        let key = self.key(point);
        self.cells.entry(key).or_default().push(id);
    }

    /// Ids stored in the cells around `point`, ascending
    pub fn candidates(&self, point: &Point3<f64>) -> Vec<usize> {
        let [x, y, z] = self.key(point);
        let mut found = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(ids) = self.cells.get(&[x + dx, y + dy, z + dz]) {
                        found.extend_from_slice(ids);
                    }
                }
            }
        }
        found.sort_unstable();
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbouring_cells_are_searched() {
        let mut hash = SpatialHash::new(0.1);
        hash.insert(0, &Point3::new(0.099, 0.0, 0.0));
        hash.insert(1, &Point3::new(0.101, 0.0, 0.0));
        hash.insert(2, &Point3::new(5.0, 0.0, 0.0));
        assert_eq!(hash.candidates(&Point3::new(0.1, 0.0, 0.0)), vec![0, 1]);
    }

    #[test]
    fn test_zero_cell_size_falls_back() {
        let mut hash = SpatialHash::new(0.0);
        hash.insert(3, &Point3::new(1.0, 2.0, 3.0));
        assert_eq!(hash.candidates(&Point3::new(1.0, 2.0, 3.0)), vec![3]);
    }
}
