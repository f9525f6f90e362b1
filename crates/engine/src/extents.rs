//! Printable-extents tracking.
//!
//! Maintains the smallest rectangle enclosing all populated cells without
//! rescanning the whole grid on every mutation. State is the overall
//! `Size` plus, for each populated row, the maximum populated column in it,
//! and for each populated column, the maximum populated row.
//!
//! Insertion only ever extends. Removal rescans the affected row and column
//! through a caller-supplied occupancy probe (bounded by the box, not the
//! grid), and shrinks the overall extents from the per-row/per-column
//! maxima when the removed cell sat on a trailing edge.

use rustc_hash::FxHashMap;

use crate::addr::{Addr, Size};

#[derive(Debug, Clone, Default)]
pub struct Extents {
    size: Size,
    /// row -> max populated col in that row
    row_max: FxHashMap<i32, i32>,
    /// col -> max populated row in that col
    col_max: FxHashMap<i32, i32>,
}

impl Extents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current bounding box, as exclusive row/column counts.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Record a populated cell.
    pub fn insert(&mut self, addr: Addr) {
        if addr.row + 1 > self.size.rows {
            self.size.rows = addr.row + 1;
        }
        if addr.col + 1 > self.size.cols {
            self.size.cols = addr.col + 1;
        }

        let row_entry = self.row_max.entry(addr.row).or_insert(addr.col);
        if addr.col > *row_entry {
            *row_entry = addr.col;
        }
        let col_entry = self.col_max.entry(addr.col).or_insert(addr.row);
        if addr.row > *col_entry {
            *col_entry = addr.row;
        }
    }

    /// Record a cell's removal. The caller has already removed it from
    /// storage; `occupied` reports which cells remain populated.
    pub fn remove<F>(&mut self, addr: Addr, occupied: F)
    where
        F: Fn(Addr) -> bool,
    {
        let on_last_row = addr.row + 1 == self.size.rows;
        let on_last_col = addr.col + 1 == self.size.cols;

        // Rescan the removed cell's row and column for the next populated
        // cell, scanning inward from the current box edge.
        match Self::scan_max(self.size.cols, |c| occupied(Addr::new(addr.row, c))) {
            Some(max_col) => {
                self.row_max.insert(addr.row, max_col);
            }
            None => {
                self.row_max.remove(&addr.row);
            }
        }
        match Self::scan_max(self.size.rows, |r| occupied(Addr::new(r, addr.col))) {
            Some(max_row) => {
                self.col_max.insert(addr.col, max_row);
            }
            None => {
                self.col_max.remove(&addr.col);
            }
        }

        // A removal strictly inside the box cannot move its edges.
        if on_last_row {
            self.size.rows = self.col_max.values().copied().max().map_or(0, |r| r + 1);
        }
        if on_last_col {
            self.size.cols = self.row_max.values().copied().max().map_or(0, |c| c + 1);
        }
    }

    /// Highest index below `bound` for which `hit` reports occupancy.
    fn scan_max<F>(bound: i32, hit: F) -> Option<i32>
    where
        F: Fn(i32) -> bool,
    {
        (0..bound).rev().find(|&i| hit(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    fn a(row: i32, col: i32) -> Addr {
        Addr::new(row, col)
    }

    /// Mirror of the sheet's usage: a set of populated addresses driving
    /// both the tracker and the occupancy probe.
    struct Grid {
        cells: FxHashSet<Addr>,
        extents: Extents,
    }

    impl Grid {
        fn new() -> Self {
            Self {
                cells: FxHashSet::default(),
                extents: Extents::new(),
            }
        }

        fn set(&mut self, addr: Addr) {
            self.cells.insert(addr);
            self.extents.insert(addr);
        }

        fn clear(&mut self, addr: Addr) {
            self.cells.remove(&addr);
            let cells = &self.cells;
            self.extents.remove(addr, |a| cells.contains(&a));
        }

        fn size(&self) -> Size {
            self.extents.size()
        }
    }

    #[test]
    fn test_empty_is_zero_by_zero() {
        assert_eq!(Extents::new().size(), Size::new(0, 0));
    }

    #[test]
    fn test_insert_extends() {
        let mut grid = Grid::new();
        grid.set(a(0, 0));
        assert_eq!(grid.size(), Size::new(1, 1));
        grid.set(a(3, 4));
        assert_eq!(grid.size(), Size::new(4, 5));
        // interior insert changes nothing
        grid.set(a(1, 1));
        assert_eq!(grid.size(), Size::new(4, 5));
    }

    #[test]
    fn test_remove_trailing_corner_shrinks() {
        let mut grid = Grid::new();
        grid.set(a(0, 0));
        grid.set(a(3, 4));
        grid.clear(a(3, 4));
        assert_eq!(grid.size(), Size::new(1, 1));
    }

    #[test]
    fn test_remove_interior_keeps_edges() {
        let mut grid = Grid::new();
        grid.set(a(0, 0));
        grid.set(a(1, 1));
        grid.set(a(3, 4));
        grid.clear(a(1, 1));
        assert_eq!(grid.size(), Size::new(4, 5));
    }

    #[test]
    fn test_remove_last_row_only() {
        // Bottom edge moves, right edge stays.
        let mut grid = Grid::new();
        grid.set(a(0, 4));
        grid.set(a(3, 0));
        grid.clear(a(3, 0));
        assert_eq!(grid.size(), Size::new(1, 5));
    }

    #[test]
    fn test_remove_last_col_only() {
        let mut grid = Grid::new();
        grid.set(a(4, 0));
        grid.set(a(0, 3));
        grid.clear(a(0, 3));
        assert_eq!(grid.size(), Size::new(5, 1));
    }

    #[test]
    fn test_remove_to_empty() {
        let mut grid = Grid::new();
        grid.set(a(2, 2));
        grid.clear(a(2, 2));
        assert_eq!(grid.size(), Size::new(0, 0));
    }

    #[test]
    fn test_edge_shared_by_several_cells() {
        // Two cells on the last row; removing one keeps the edge.
        let mut grid = Grid::new();
        grid.set(a(2, 0));
        grid.set(a(2, 3));
        grid.clear(a(2, 3));
        assert_eq!(grid.size(), Size::new(3, 1));
        grid.clear(a(2, 0));
        assert_eq!(grid.size(), Size::new(0, 0));
    }

    #[test]
    fn test_remove_then_reinsert() {
        let mut grid = Grid::new();
        grid.set(a(3, 4));
        grid.clear(a(3, 4));
        grid.set(a(1, 2));
        assert_eq!(grid.size(), Size::new(2, 3));
    }

    #[test]
    fn test_diagonal_staircase_shrink() {
        let mut grid = Grid::new();
        for i in 0..5 {
            grid.set(a(i, i));
        }
        assert_eq!(grid.size(), Size::new(5, 5));
        for i in (1..5).rev() {
            grid.clear(a(i, i));
            assert_eq!(grid.size(), Size::new(i, i));
        }
    }
}
