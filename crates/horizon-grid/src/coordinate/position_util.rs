//! Bulk conversions between position sets and ranges.

use super::Range;

/// Group numbers into ranges of strictly contiguous runs.
///
/// Input order and duplicates do not matter; the result is sorted.
pub fn get_ranges(numbers: impl IntoIterator<Item = usize>) -> Vec<Range> {
    let mut numbers: Vec<usize> = numbers.into_iter().collect();
    numbers.sort_unstable();
    numbers.dedup();

    let mut ranges = Vec::new();
    let mut iter = numbers.into_iter();
    let Some(first) = iter.next() else {
        return ranges;
    };
    let mut current = Range::single(first);
    for number in iter {
        if number == current.end {
            current.end += 1;
        } else {
            ranges.push(current);
            current = Range::single(number);
        }
    }
    ranges.push(current);
    ranges
}

/// All distinct members of `ranges` in ascending order.
pub fn get_positions(ranges: &[Range]) -> Vec<usize> {
    let mut positions: Vec<usize> = ranges.iter().flat_map(Range::members).collect();
    positions.sort_unstable();
    positions.dedup();
    positions
}

/// Expand to the member set and re-derive the minimal ranges.
pub fn merge_ranges(ranges: &[Range]) -> Vec<Range> {
    get_ranges(get_positions(ranges))
}

/// Join ranges into one if, sorted by start, each begins no later than the
/// running end of the previous ones.
///
/// Returns `None` for an empty input or when there is a gap.
pub fn join_consecutive_ranges(ranges: &[Range]) -> Option<Range> {
    let mut sorted: Vec<Range> = ranges.to_vec();
    sorted.sort_unstable();

    let mut iter = sorted.into_iter();
    let mut joined = iter.next()?;
    for range in iter {
        if range.start > joined.end {
            return None;
        }
        joined.end = joined.end.max(range.end);
    }
    Some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_get_ranges_groups_runs() {
        assert_eq!(
            get_ranges([7, 1, 2, 3, 9, 8, 12]),
            vec![Range::new(1, 4), Range::new(7, 10), Range::new(12, 13)]
        );
        assert!(get_ranges(Vec::<usize>::new()).is_empty());
        assert_eq!(get_ranges([4, 4, 5]), vec![Range::new(4, 6)]);
    }

    #[test]
    fn test_get_positions() {
        assert_eq!(
            get_positions(&[Range::new(5, 7), Range::new(0, 2), Range::new(6, 8)]),
            vec![0, 1, 5, 6, 7]
        );
    }

    #[test]
    fn test_merge_ranges() {
        assert_eq!(
            merge_ranges(&[Range::new(0, 3), Range::new(2, 5), Range::new(5, 6), Range::new(9, 10)]),
            vec![Range::new(0, 6), Range::new(9, 10)]
        );
    }

    #[test]
    fn test_join_consecutive_ranges() {
        assert_eq!(
            join_consecutive_ranges(&[Range::new(4, 6), Range::new(0, 2), Range::new(2, 4)]),
            Some(Range::new(0, 6))
        );
        assert_eq!(
            join_consecutive_ranges(&[Range::new(0, 5), Range::new(1, 3)]),
            Some(Range::new(0, 5))
        );
        assert_eq!(join_consecutive_ranges(&[Range::new(0, 2), Range::new(3, 4)]), None);
        assert_eq!(join_consecutive_ranges(&[]), None);
    }

    proptest! {
        #[test]
        fn ranges_round_trip_through_positions(numbers in prop::collection::vec(0usize..200, 0..64)) {
            let ranges = get_ranges(numbers.iter().copied());
            let again = get_ranges(get_positions(&ranges));
            prop_assert_eq!(again, ranges);
        }
    }
}
