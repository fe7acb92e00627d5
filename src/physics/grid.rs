//! Uniform-cell spatial hash for neighbor pruning.
//!
//! Rebuilt from scratch whenever positions change; nothing carries across
//! ticks. A query returns everything in the 3×3 block of cells around a
//! point, so any pair closer than one cell size is guaranteed to be found.

use std::collections::HashMap;

use crate::items::Point2D;

pub type Cell = (i32, i32);

#[derive(Debug, Clone)]
pub struct SpatialGrid<K> {
    cell_size: f32,
    cells: HashMap<Cell, Vec<K>>,
}

impl<K> SpatialGrid<K> {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: sanitize_cell_size(cell_size),
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Map a position to its cell. Non-finite coordinates land in cell 0.
    pub fn cell_of(&self, position: Point2D) -> Cell {
        let to_cell = |value: f32| -> i32 {
            if value.is_finite() {
                (value / self.cell_size).floor() as i32
            } else {
                0
            }
        };
        (to_cell(position.x), to_cell(position.y))
    }

    pub fn insert(&mut self, key: K, position: Point2D) {
        let cell = self.cell_of(position);
        self.cells.entry(cell).or_default().push(key);
    }

    /// Drop every entry and adopt a new cell size.
    pub fn reset(&mut self, cell_size: f32) {
        self.cells.clear();
        self.cell_size = sanitize_cell_size(cell_size);
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Number of occupied cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Keys stored in one cell.
    pub fn bucket(&self, cell: Cell) -> &[K] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Keys in the 3×3 cell window around `position` (the querying key included).
    pub fn neighbors(&self, position: Point2D) -> impl Iterator<Item = &K> + '_ {
        let (cx, cy) = self.cell_of(position);
        (-1..=1)
            .flat_map(move |dx| (-1..=1).map(move |dy| (cx.saturating_add(dx), cy.saturating_add(dy))))
            .flat_map(move |cell| self.bucket(cell).iter())
    }
}

impl<K> Default for SpatialGrid<K> {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl<K> FromIterator<(K, Point2D)> for SpatialGrid<K> {
    fn from_iter<I: IntoIterator<Item = (K, Point2D)>>(iter: I) -> Self {
        let mut grid = SpatialGrid::default();
        grid.extend(iter);
        grid
    }
}

impl<K> Extend<(K, Point2D)> for SpatialGrid<K> {
    fn extend<I: IntoIterator<Item = (K, Point2D)>>(&mut self, iter: I) {
        for (key, position) in iter {
            self.insert(key, position);
        }
    }
}

fn sanitize_cell_size(cell_size: f32) -> f32 {
    if cell_size.is_finite() && cell_size > f32::EPSILON {
        cell_size
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_of_floors_negative_coordinates() {
        let grid: SpatialGrid<usize> = SpatialGrid::new(10.0);
        assert_eq!(grid.cell_of(Point2D::new(0.0, 0.0)), (0, 0));
        assert_eq!(grid.cell_of(Point2D::new(9.99, 10.0)), (0, 1));
        assert_eq!(grid.cell_of(Point2D::new(-0.1, -10.0)), (-1, -1));
        assert_eq!(grid.cell_of(Point2D::new(f32::NAN, 5.0)), (0, 0));
    }

    #[test]
    fn neighbors_cover_adjacent_cells_only() {
        let mut grid = SpatialGrid::new(10.0);
        grid.insert(0usize, Point2D::new(5.0, 5.0));
        grid.insert(1, Point2D::new(14.0, 5.0));
        grid.insert(2, Point2D::new(-4.0, -4.0));
        grid.insert(3, Point2D::new(35.0, 5.0));

        let mut found: Vec<usize> = grid.neighbors(Point2D::new(5.0, 5.0)).copied().collect();
        found.sort();
        assert_eq!(found, vec![0, 1, 2]);
    }

    #[test]
    fn reset_clears_and_rejects_bad_sizes() {
        let mut grid = SpatialGrid::new(5.0);
        grid.insert("a", Point2D::ORIGIN);
        assert_eq!(grid.occupied_cells(), 1);
        grid.reset(0.0);
        assert_eq!(grid.occupied_cells(), 0);
        assert_eq!(grid.cell_size(), 1.0);
    }

    #[test]
    fn collect_from_pairs() {
        let grid: SpatialGrid<usize> = vec![(0, Point2D::ORIGIN), (1, Point2D::new(0.5, 0.5))]
            .into_iter()
            .collect();
        assert_eq!(grid.bucket((0, 0)), &[0, 1]);
    }
}
