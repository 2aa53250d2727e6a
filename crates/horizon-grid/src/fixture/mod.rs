//! Compact layer fixtures for tests and demos.
//!
//! A fixture describes a data layer by its sizes:
//!
//! ```text
//! 100:100:150 ; 20:20 | hidden=1 | hiddenRows=0
//! ```
//!
//! The part before `;` lists the column widths, the part after it the row
//! heights; the cell count follows from the number of sizes. Optional
//! `|`-separated clauses put a hide/show layer on top with the listed column
//! (`hidden`) or row (`hiddenRows`) indexes hidden.
//!
//! ```
//! use horizon_grid::fixture::LayerFixture;
//! use horizon_grid::layer::Layer;
//!
//! let fixture = LayerFixture::parse("100:100:150 ; 20:20 | hidden=1").unwrap();
//! assert_eq!(fixture.top().column_count(), 2);
//! assert_eq!(fixture.top().width(), 250);
//! ```

use std::sync::Arc;

use horizon_grid_core::{GridError, Result};

use crate::coordinate::Orientation;
use crate::data::DummyDataProvider;
use crate::data_layer::DataLayer;
use crate::hide_show::HideShowLayer;
use crate::layer::Layer;

/// Layers built from a fixture string.
#[derive(Clone)]
pub struct LayerFixture {
    pub data: Arc<DataLayer>,
    pub hide: Option<Arc<HideShowLayer>>,
}

impl LayerFixture {
    pub fn parse(fixture: &str) -> Result<Self> {
        let invalid = |message: String| GridError::invalid_fixture(fixture, message);

        let mut clauses = fixture.split('|');
        let sizes = clauses.next().unwrap_or_default();
        let (columns, rows) = sizes
            .split_once(';')
            .ok_or_else(|| invalid("expected '<column widths> ; <row heights>'".into()))?;
        let widths = parse_sizes(columns).map_err(&invalid)?;
        let heights = parse_sizes(rows).map_err(&invalid)?;

        let mut hidden: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
        let mut has_clauses = false;
        for clause in clauses {
            let (key, values) = clause
                .split_once('=')
                .ok_or_else(|| invalid(format!("clause '{}' is not key=values", clause.trim())))?;
            let axis = match key.trim() {
                "hidden" => Orientation::Horizontal,
                "hiddenRows" => Orientation::Vertical,
                other => return Err(invalid(format!("unknown clause '{other}'"))),
            };
            let count = match axis {
                Orientation::Horizontal => widths.len(),
                Orientation::Vertical => heights.len(),
            };
            for value in values.split(',').map(str::trim).filter(|v| !v.is_empty()) {
                let index: usize = value
                    .parse()
                    .map_err(|_| invalid(format!("'{value}' is not an index")))?;
                if index >= count {
                    return Err(invalid(format!("{} {index} out of range", axis.noun())));
                }
                hidden[axis.slot()].push(index);
            }
            has_clauses = true;
        }

        let provider = DummyDataProvider::new(widths.len(), heights.len());
        let data = DataLayer::new(Arc::new(provider));
        for (axis, sizes) in [(Orientation::Horizontal, &widths), (Orientation::Vertical, &heights)] {
            for (position, &size) in sizes.iter().enumerate() {
                data.set_size(axis, position, size, false);
            }
        }

        let hide = has_clauses.then(|| {
            let hide = HideShowLayer::new(data.clone());
            for axis in Orientation::ALL {
                hide.hide_indexes(axis, &hidden[axis.slot()]);
            }
            hide
        });
        Ok(Self { data, hide })
    }

    /// The topmost layer of the fixture.
    pub fn top(&self) -> Arc<dyn Layer> {
        match &self.hide {
            Some(hide) => hide.clone(),
            None => self.data.clone(),
        }
    }
}

impl std::fmt::Debug for LayerFixture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerFixture").field("top", &self.top()).finish()
    }
}

fn parse_sizes(part: &str) -> std::result::Result<Vec<i32>, String> {
    let part = part.trim();
    if part.is_empty() {
        return Ok(Vec::new());
    }
    part.split(':')
        .map(|size| {
            let size = size.trim();
            match size.parse::<i32>() {
                Ok(value) if value >= 0 => Ok(value),
                _ => Err(format!("'{size}' is not a size")),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        let fixture = LayerFixture::parse("100:100:150 ; 20:40").unwrap();
        assert!(fixture.hide.is_none());
        let top = fixture.top();
        assert_eq!(top.column_count(), 3);
        assert_eq!(top.row_count(), 2);
        assert_eq!(top.column_width_by_position(2), 150);
        assert_eq!(top.start_y_of_row_position(1), Some(20));
        assert_eq!(top.height(), 60);
    }

    #[test]
    fn test_hidden_clauses() {
        let fixture = LayerFixture::parse("10:20:30:40 ; 5:5:5 | hidden=1,3 | hiddenRows=0").unwrap();
        let top = fixture.top();
        assert_eq!(top.column_count(), 2);
        assert_eq!(top.width(), 40);
        assert_eq!(top.row_count(), 2);
        assert_eq!(top.column_index_by_position(1), Some(2));
    }

    #[test]
    fn test_empty_axis() {
        let fixture = LayerFixture::parse(" ; 20").unwrap();
        assert_eq!(fixture.top().column_count(), 0);
        assert_eq!(fixture.top().row_count(), 1);
    }

    #[test]
    fn test_malformed_fixtures() {
        for fixture in [
            "100:100",
            "100:x ; 20",
            "100 ; 20 | hidden",
            "100 ; 20 | frozen=1",
            "100 ; 20 | hidden=4",
            "100 ; -5",
        ] {
            let err = LayerFixture::parse(fixture).unwrap_err();
            assert!(
                matches!(err, GridError::InvalidFixture { .. }),
                "{fixture}: {err}"
            );
        }
    }

    #[test]
    fn test_error_names_the_bad_token() {
        let err = LayerFixture::parse("100:x ; 20").unwrap_err();
        assert_eq!(err.to_string(), "Invalid layer fixture '100:x ; 20': 'x' is not a size");
    }
}
