use std::fmt;

use crate::coordinate::{CellPosition, Range, RangeList};

/// A block of cells: a column range crossed with a row range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRegion {
    pub columns: Range,
    pub rows: Range,
}

impl CellRegion {
    pub fn new(columns: Range, rows: Range) -> Self {
        Self { columns, rows }
    }

    pub fn cell(cell: CellPosition) -> Self {
        Self::new(Range::single(cell.column), Range::single(cell.row))
    }

    /// The smallest region covering two cells.
    pub fn spanning(a: CellPosition, b: CellPosition) -> Self {
        Self::new(
            Range::new(a.column.min(b.column), a.column.max(b.column) + 1),
            Range::new(a.row.min(b.row), a.row.max(b.row) + 1),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }

    pub fn contains(&self, column: usize, row: usize) -> bool {
        self.columns.contains(column) && self.rows.contains(row)
    }

    pub fn intersection(&self, other: &CellRegion) -> Option<CellRegion> {
        let region = CellRegion::new(
            self.columns.intersection(&other.columns)?,
            self.rows.intersection(&other.rows)?,
        );
        (!region.is_empty()).then_some(region)
    }

    /// The parts of `self` outside `other`, as at most four regions.
    fn subtract(&self, other: &CellRegion) -> Vec<CellRegion> {
        let Some(cut) = self.intersection(other) else {
            return vec![*self];
        };
        let mut parts = Vec::with_capacity(4);
        // Full-width bands above and below the cut.
        parts.push(CellRegion::new(self.columns, Range::new(self.rows.start, cut.rows.start)));
        parts.push(CellRegion::new(self.columns, Range::new(cut.rows.end, self.rows.end)));
        // Left and right of the cut, within its rows.
        parts.push(CellRegion::new(Range::new(self.columns.start, cut.columns.start), cut.rows));
        parts.push(CellRegion::new(Range::new(cut.columns.end, self.columns.end), cut.rows));
        parts.retain(|part| !part.is_empty());
        parts
    }
}

/// Stores which cells of a selection layer are selected, by position.
pub trait SelectionModel: Send + Sync + fmt::Debug {
    fn add_selection(&mut self, region: CellRegion);

    fn remove_selection(&mut self, region: CellRegion);

    fn clear(&mut self);

    fn is_empty(&self) -> bool;

    fn is_cell_selected(&self, column: usize, row: usize) -> bool;

    /// Selected regions clipped to `bounds`. Regions may overlap.
    fn selected_regions(&self, bounds: CellRegion) -> Vec<CellRegion>;

    /// Whether every row of `column` within `rows` is selected.
    fn is_column_fully_selected(&self, column: usize, rows: Range) -> bool {
        if rows.is_empty() {
            return false;
        }
        let bounds = CellRegion::new(Range::single(column), rows);
        let covered = RangeList::from_ranges(self.selected_regions(bounds).iter().map(|r| r.rows));
        covered.ranges() == [rows]
    }

    /// Whether every column of `row` within `columns` is selected.
    fn is_row_fully_selected(&self, row: usize, columns: Range) -> bool {
        if columns.is_empty() {
            return false;
        }
        let bounds = CellRegion::new(columns, Range::single(row));
        let covered =
            RangeList::from_ranges(self.selected_regions(bounds).iter().map(|r| r.columns));
        covered.ranges() == [columns]
    }
}

/// Selects arbitrary blocks of cells.
#[derive(Debug, Clone, Default)]
pub struct CellSelectionModel {
    regions: Vec<CellRegion>,
}

impl CellSelectionModel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionModel for CellSelectionModel {
    fn add_selection(&mut self, region: CellRegion) {
        if region.is_empty() {
            return;
        }
        // Drop regions the new one covers entirely.
        self.regions.retain(|r| r.intersection(&region) != Some(*r));
        self.regions.push(region);
    }

    fn remove_selection(&mut self, region: CellRegion) {
        self.regions = self
            .regions
            .iter()
            .flat_map(|r| r.subtract(&region))
            .collect();
    }

    fn clear(&mut self) {
        self.regions.clear();
    }

    fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    fn is_cell_selected(&self, column: usize, row: usize) -> bool {
        self.regions.iter().any(|r| r.contains(column, row))
    }

    fn selected_regions(&self, bounds: CellRegion) -> Vec<CellRegion> {
        self.regions
            .iter()
            .filter_map(|r| r.intersection(&bounds))
            .collect()
    }
}

/// Selects whole rows: any cell selection selects its rows.
#[derive(Debug, Clone, Default)]
pub struct RowSelectionModel {
    rows: RangeList,
}

impl RowSelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_rows(&self) -> &[Range] {
        self.rows.ranges()
    }
}

impl SelectionModel for RowSelectionModel {
    fn add_selection(&mut self, region: CellRegion) {
        if !region.is_empty() {
            self.rows.add(region.rows);
        }
    }

    fn remove_selection(&mut self, region: CellRegion) {
        self.rows.remove(region.rows);
    }

    fn clear(&mut self) {
        self.rows.clear();
    }

    fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn is_cell_selected(&self, _column: usize, row: usize) -> bool {
        self.rows.contains(row)
    }

    fn selected_regions(&self, bounds: CellRegion) -> Vec<CellRegion> {
        self.rows
            .ranges()
            .iter()
            .filter_map(|rows| rows.intersection(&bounds.rows))
            .map(|rows| CellRegion::new(bounds.columns, rows))
            .filter(|region| !region.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(c0: usize, c1: usize, r0: usize, r1: usize) -> CellRegion {
        CellRegion::new(Range::new(c0, c1), Range::new(r0, r1))
    }

    #[test]
    fn test_spanning_region() {
        let r = CellRegion::spanning(CellPosition::new(4, 1), CellPosition::new(2, 3));
        assert_eq!(r, region(2, 5, 1, 4));
    }

    #[test]
    fn test_cell_model_remove_splits_regions() {
        let mut model = CellSelectionModel::new();
        model.add_selection(region(0, 3, 0, 3));
        model.remove_selection(CellRegion::cell(CellPosition::new(1, 1)));
        assert!(!model.is_cell_selected(1, 1));
        for (c, r) in [(0, 0), (1, 0), (2, 2), (0, 1), (2, 1)] {
            assert!(model.is_cell_selected(c, r), "({c},{r})");
        }
        assert!(!model.is_column_fully_selected(1, Range::new(0, 3)));
        assert!(model.is_column_fully_selected(0, Range::new(0, 3)));
    }

    #[test]
    fn test_cell_model_full_row_from_overlapping_regions() {
        let mut model = CellSelectionModel::new();
        model.add_selection(region(0, 2, 0, 1));
        model.add_selection(region(1, 4, 0, 2));
        assert!(model.is_row_fully_selected(0, Range::new(0, 4)));
        assert!(!model.is_row_fully_selected(1, Range::new(0, 4)));
    }

    #[test]
    fn test_row_model_selects_whole_rows() {
        let mut model = RowSelectionModel::new();
        model.add_selection(CellRegion::cell(CellPosition::new(3, 2)));
        assert!(model.is_cell_selected(0, 2));
        assert!(model.is_row_fully_selected(2, Range::new(0, 10)));
        assert_eq!(model.selected_regions(region(0, 5, 0, 10)), vec![region(0, 5, 2, 3)]);
        model.clear();
        assert!(model.is_empty());
    }
}
