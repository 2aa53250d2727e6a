//! Coordinates, ranges and bulk position utilities.
//!
//! Every layer speaks in *positions*: 0-based, contiguous visual order along
//! an axis. Positions are grouped into half-open [`Range`]s for events and
//! commands; [`RangeList`] keeps a sorted, auto-merging set of them and
//! [`position_util`] converts between position sets and ranges.

pub mod position_util;
mod range;
mod range_list;

pub use range::Range;
pub use range_list::RangeList;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The axis a position, size or structural change refers to.
///
/// `Horizontal` is the column axis (x, widths), `Vertical` is the row axis
/// (y, heights).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Orientation {
    /// Columns.
    Horizontal,
    /// Rows.
    Vertical,
}

impl Orientation {
    /// Both axes, columns first.
    pub const ALL: [Orientation; 2] = [Orientation::Horizontal, Orientation::Vertical];

    /// Get the cross (perpendicular) orientation.
    #[inline]
    pub fn cross(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }

    /// `"column"` or `"row"`, used in persisted keys and log fields.
    pub fn noun(self) -> &'static str {
        match self {
            Orientation::Horizontal => "column",
            Orientation::Vertical => "row",
        }
    }

    /// Index of this axis in `[columns, rows]` pairs.
    #[inline]
    pub(crate) fn slot(self) -> usize {
        match self {
            Orientation::Horizontal => 0,
            Orientation::Vertical => 1,
        }
    }
}

/// A cell addressed by column and row position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellPosition {
    pub column: usize,
    pub row: usize,
}

impl CellPosition {
    /// Create a new cell position.
    pub const fn new(column: usize, row: usize) -> Self {
        Self { column, row }
    }

    /// The component along `axis`.
    pub fn along(&self, axis: Orientation) -> usize {
        match axis {
            Orientation::Horizontal => self.column,
            Orientation::Vertical => self.row,
        }
    }

    /// A copy with the component along `axis` replaced.
    pub fn with(self, axis: Orientation, value: usize) -> Self {
        match axis {
            Orientation::Horizontal => Self { column: value, ..self },
            Orientation::Vertical => Self { row: value, ..self },
        }
    }
}

/// A pixel rectangle in a layer's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rectangle {
    /// Create a new rectangle.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the point lies inside the rectangle (right and bottom edges excluded).
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }

    /// The overlapping area of two rectangles, if any.
    pub fn intersection(&self, other: &Rectangle) -> Option<Rectangle> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);
        (right > x && bottom > y).then(|| Rectangle::new(x, y, right - x, bottom - y))
    }
}
