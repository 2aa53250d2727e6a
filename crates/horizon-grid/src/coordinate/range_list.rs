use super::Range;

/// A sorted, auto-merging set of ranges.
///
/// Ranges are kept ordered by start and never touch or overlap: adding a
/// range adjacent to an existing one extends it. Every mutation locates the
/// affected neighbours by binary search and rebuilds only that slice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RangeList {
    ranges: Vec<Range>,
}

impl RangeList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from arbitrary (possibly overlapping) ranges.
    pub fn from_ranges(ranges: impl IntoIterator<Item = Range>) -> Self {
        let mut list = Self::new();
        for range in ranges {
            list.add(range);
        }
        list
    }

    /// Build a list from individual values.
    pub fn from_values(values: impl IntoIterator<Item = usize>) -> Self {
        let mut list = Self::new();
        for value in values {
            list.add_value(value);
        }
        list
    }

    /// The disjoint ranges in ascending order.
    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Total number of values covered.
    pub fn value_count(&self) -> usize {
        self.ranges.iter().map(Range::len).sum()
    }

    /// Whether `value` is covered by one of the ranges.
    pub fn contains(&self, value: usize) -> bool {
        self.range_containing(value).is_some()
    }

    /// The range covering `value`.
    pub fn range_containing(&self, value: usize) -> Option<Range> {
        let i = self.ranges.partition_point(|r| r.end <= value);
        self.ranges.get(i).filter(|r| r.start <= value).copied()
    }

    /// Add a range, merging with every range it touches.
    pub fn add(&mut self, range: Range) {
        if range.is_empty() {
            return;
        }
        let first = self.ranges.partition_point(|r| r.end < range.start);
        let last = self.ranges.partition_point(|r| r.start <= range.end);
        let merged = self.ranges[first..last]
            .iter()
            .fold(range, |acc, r| acc.union(r));
        self.ranges.splice(first..last, [merged]);
    }

    pub fn add_value(&mut self, value: usize) {
        self.add(Range::single(value));
    }

    /// Remove every value of `range`, splitting ranges that straddle it.
    pub fn remove(&mut self, range: Range) {
        if range.is_empty() {
            return;
        }
        let first = self.ranges.partition_point(|r| r.end <= range.start);
        let last = self.ranges.partition_point(|r| r.start < range.end);
        if first >= last {
            return;
        }
        let mut remainder = Vec::with_capacity(2);
        let head = self.ranges[first];
        let tail = self.ranges[last - 1];
        if head.start < range.start {
            remainder.push(Range::new(head.start, range.start));
        }
        if tail.end > range.end {
            remainder.push(Range::new(range.end, tail.end));
        }
        self.ranges.splice(first..last, remainder);
    }

    pub fn remove_value(&mut self, value: usize) {
        self.remove(Range::single(value));
    }

    /// A copy with `range` added.
    pub fn with(&self, range: Range) -> Self {
        let mut next = self.clone();
        next.add(range);
        next
    }

    /// A copy with `range` removed.
    pub fn without(&self, range: Range) -> Self {
        let mut next = self.clone();
        next.remove(range);
        next
    }

    /// All covered values in ascending order.
    pub fn values(&self) -> impl Iterator<Item = usize> + '_ {
        self.ranges.iter().flat_map(Range::members)
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }
}

impl FromIterator<Range> for RangeList {
    fn from_iter<T: IntoIterator<Item = Range>>(iter: T) -> Self {
        Self::from_ranges(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_canonical(list: &RangeList) {
        for range in list.ranges() {
            assert!(!range.is_empty());
        }
        for pair in list.ranges().windows(2) {
            assert!(pair[0].end < pair[1].start, "ranges touch: {:?}", pair);
        }
    }

    #[test]
    fn test_add_merges_adjacent() {
        let mut list = RangeList::new();
        list.add(Range::new(0, 2));
        list.add(Range::new(5, 7));
        list.add(Range::new(2, 3));
        assert_eq!(list.ranges(), &[Range::new(0, 3), Range::new(5, 7)]);

        list.add(Range::new(3, 5));
        assert_eq!(list.ranges(), &[Range::new(0, 7)]);
    }

    #[test]
    fn test_add_spanning_several() {
        let mut list = RangeList::from_values([1, 3, 5, 7]);
        assert_eq!(list.ranges().len(), 4);
        list.add(Range::new(2, 7));
        assert_eq!(list.ranges(), &[Range::new(1, 8)]);
    }

    #[test]
    fn test_remove_splits() {
        let mut list = RangeList::from_ranges([Range::new(0, 10)]);
        list.remove(Range::new(3, 5));
        assert_eq!(list.ranges(), &[Range::new(0, 3), Range::new(5, 10)]);

        list.remove_value(0);
        list.remove_value(9);
        assert_eq!(list.ranges(), &[Range::new(1, 3), Range::new(5, 9)]);
        assert_eq!(list.value_count(), 6);
    }

    #[test]
    fn test_remove_across_ranges() {
        let mut list = RangeList::from_ranges([Range::new(0, 3), Range::new(5, 8), Range::new(10, 12)]);
        list.remove(Range::new(2, 11));
        assert_eq!(list.ranges(), &[Range::new(0, 2), Range::new(11, 12)]);
    }

    #[test]
    fn test_contains() {
        let list = RangeList::from_ranges([Range::new(2, 4), Range::new(8, 9)]);
        assert!(!list.contains(1));
        assert!(list.contains(3));
        assert!(!list.contains(4));
        assert!(list.contains(8));
        assert_eq!(list.range_containing(3), Some(Range::new(2, 4)));
        assert_eq!(list.values().collect::<Vec<_>>(), vec![2, 3, 8]);
    }

    #[test]
    fn test_with_and_without_leave_original() {
        let list = RangeList::from_values([1, 2]);
        let added = list.with(Range::new(3, 5));
        let removed = list.without(Range::single(1));
        assert_eq!(list.ranges(), &[Range::new(1, 3)]);
        assert_eq!(added.ranges(), &[Range::new(1, 5)]);
        assert_eq!(removed.ranges(), &[Range::new(2, 3)]);
    }

    proptest! {
        #[test]
        fn ranges_stay_sorted_and_disjoint(
            ops in prop::collection::vec((any::<bool>(), 0usize..60, 0usize..8), 0..40)
        ) {
            let mut list = RangeList::new();
            let mut model = std::collections::BTreeSet::new();
            for (add, start, len) in ops {
                let range = Range::new(start, start + len);
                if add {
                    list.add(range);
                    model.extend(range.members());
                } else {
                    list.remove(range);
                    for v in range.members() {
                        model.remove(&v);
                    }
                }
                assert_canonical(&list);
            }
            prop_assert_eq!(list.values().collect::<Vec<_>>(), model.into_iter().collect::<Vec<_>>());
        }
    }
}
