use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A half-open interval `[start, end)` of positions or indexes.
///
/// `start <= end` always holds; a range is empty iff `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    /// Create a new range.
    ///
    /// # Panics
    ///
    /// Panics if `start > end`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(start <= end, "range start {start} is after end {end}");
        Self { start, end }
    }

    /// A range holding exactly one value.
    pub fn single(value: usize) -> Self {
        Self {
            start: value,
            end: value + 1,
        }
    }

    /// An empty range located at `at`.
    pub fn empty_at(at: usize) -> Self {
        Self { start: at, end: at }
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `value` is a member.
    pub fn contains(&self, value: usize) -> bool {
        self.start <= value && value < self.end
    }

    /// Whether every member of `other` is a member of `self`.
    pub fn contains_range(&self, other: &Range) -> bool {
        other.is_empty() || (self.start <= other.start && other.end <= self.end)
    }

    /// Whether the two ranges share at least one member.
    pub fn overlaps(&self, other: &Range) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether the two ranges overlap or are directly adjacent.
    pub fn touches(&self, other: &Range) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// The smallest range spanning both, including any gap between them.
    pub fn union(&self, other: &Range) -> Range {
        Range {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// The common members, if any.
    pub fn intersection(&self, other: &Range) -> Option<Range> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(Range { start, end })
    }

    /// Members in ascending order.
    pub fn members(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }

    /// This range moved by `delta` (saturating at zero).
    pub fn shifted(&self, delta: isize) -> Range {
        let shift = |v: usize| v.saturating_add_signed(delta);
        Range {
            start: shift(self.start),
            end: shift(self.end),
        }
    }
}

impl From<std::ops::Range<usize>> for Range {
    fn from(range: std::ops::Range<usize>) -> Self {
        Range::new(range.start, range.end)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{})", self.start, self.end)
    }
}
