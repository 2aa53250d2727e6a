//! Data providers feeding the bottom of a layer stack.
//!
//! A [`DataProvider`] answers cell values by *index*. The grid never writes
//! to it except through [`UpdateDataCommand`](crate::data_layer::UpdateDataCommand),
//! which calls [`DataProvider::set_data_value`].

mod value;

pub use value::CellValue;

use parking_lot::RwLock;

use horizon_grid_core::{GridError, Result};

/// Source of cell values, addressed by column and row index.
pub trait DataProvider: Send + Sync {
    fn column_count(&self) -> usize;

    fn row_count(&self) -> usize;

    /// The value at the given indexes, `CellValue::None` when out of range.
    fn data_value(&self, column_index: usize, row_index: usize) -> CellValue;

    /// Write a value. Providers are read-only unless they override this.
    fn set_data_value(&self, column_index: usize, row_index: usize, value: CellValue) -> Result<()> {
        let _ = value;
        Err(GridError::unsupported(format!(
            "data provider is read-only (cell {column_index},{row_index})"
        )))
    }
}

/// A provider backed by an in-memory row-major table.
#[derive(Debug, Default)]
pub struct ListDataProvider {
    column_count: usize,
    rows: RwLock<Vec<Vec<CellValue>>>,
}

impl ListDataProvider {
    /// Create a provider from rows; short rows read as `CellValue::None`.
    pub fn new(column_count: usize, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            column_count,
            rows: RwLock::new(rows),
        }
    }

    /// Create a provider by evaluating `value` for every cell.
    pub fn from_fn(
        column_count: usize,
        row_count: usize,
        value: impl Fn(usize, usize) -> CellValue,
    ) -> Self {
        let rows = (0..row_count)
            .map(|row| (0..column_count).map(|column| value(column, row)).collect())
            .collect();
        Self::new(column_count, rows)
    }

    /// Insert a row before `row_index` (appends when past the end).
    pub fn insert_row(&self, row_index: usize, row: Vec<CellValue>) {
        let mut rows = self.rows.write();
        let at = row_index.min(rows.len());
        rows.insert(at, row);
    }

    /// Remove and return a row.
    pub fn remove_row(&self, row_index: usize) -> Option<Vec<CellValue>> {
        let mut rows = self.rows.write();
        (row_index < rows.len()).then(|| rows.remove(row_index))
    }
}

impl DataProvider for ListDataProvider {
    fn column_count(&self) -> usize {
        self.column_count
    }

    fn row_count(&self) -> usize {
        self.rows.read().len()
    }

    fn data_value(&self, column_index: usize, row_index: usize) -> CellValue {
        if column_index >= self.column_count {
            return CellValue::None;
        }
        self.rows
            .read()
            .get(row_index)
            .and_then(|row| row.get(column_index))
            .cloned()
            .unwrap_or_default()
    }

    fn set_data_value(&self, column_index: usize, row_index: usize, value: CellValue) -> Result<()> {
        if column_index >= self.column_count {
            return Err(GridError::unsupported(format!(
                "column index {column_index} is out of range"
            )));
        }
        let mut rows = self.rows.write();
        let row = rows.get_mut(row_index).ok_or_else(|| {
            GridError::unsupported(format!("row index {row_index} is out of range"))
        })?;
        if row.len() <= column_index {
            row.resize(column_index + 1, CellValue::None);
        }
        row[column_index] = value;
        Ok(())
    }
}

/// A fixed-size provider whose values are `"column,row"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DummyDataProvider {
    column_count: usize,
    row_count: usize,
}

impl DummyDataProvider {
    pub fn new(column_count: usize, row_count: usize) -> Self {
        Self {
            column_count,
            row_count,
        }
    }
}

impl DataProvider for DummyDataProvider {
    fn column_count(&self) -> usize {
        self.column_count
    }

    fn row_count(&self) -> usize {
        self.row_count
    }

    fn data_value(&self, column_index: usize, row_index: usize) -> CellValue {
        if column_index < self.column_count && row_index < self.row_count {
            CellValue::String(format!("{column_index},{row_index}"))
        } else {
            CellValue::None
        }
    }
}
