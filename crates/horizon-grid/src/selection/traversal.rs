use crate::coordinate::{CellPosition, Orientation};

/// Direction of a selection move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    Up,
    Down,
    Left,
    Right,
}

impl MoveDirection {
    pub fn axis(self) -> Orientation {
        match self {
            MoveDirection::Left | MoveDirection::Right => Orientation::Horizontal,
            MoveDirection::Up | MoveDirection::Down => Orientation::Vertical,
        }
    }

    fn is_forward(self) -> bool {
        matches!(self, MoveDirection::Right | MoveDirection::Down)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraversalScope {
    /// Stay in the current row (or column).
    Axis,
    /// Continue on the next row (or column) at an edge.
    Table,
}

/// How a selection move behaves at the edge of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraversalStrategy {
    pub scope: TraversalScope,
    /// Wrap around at the end instead of stopping.
    pub cycle: bool,
}

impl TraversalStrategy {
    pub const AXIS: Self = Self::new(TraversalScope::Axis, false);
    pub const AXIS_CYCLE: Self = Self::new(TraversalScope::Axis, true);
    pub const TABLE: Self = Self::new(TraversalScope::Table, false);
    pub const TABLE_CYCLE: Self = Self::new(TraversalScope::Table, true);

    pub const fn new(scope: TraversalScope, cycle: bool) -> Self {
        Self { scope, cycle }
    }

    /// The cell `step` moves from `from` in a grid of `columns` x `rows`.
    ///
    /// Returns `None` for an empty grid.
    pub fn next(
        &self,
        from: CellPosition,
        direction: MoveDirection,
        step: usize,
        columns: usize,
        rows: usize,
    ) -> Option<CellPosition> {
        if columns == 0 || rows == 0 {
            return None;
        }
        let axis = direction.axis();
        let (along_count, across_count) = match axis {
            Orientation::Horizontal => (columns, rows),
            Orientation::Vertical => (rows, columns),
        };
        let along = from.along(axis).min(along_count - 1);
        let across = from.along(axis.cross()).min(across_count - 1);

        let (length, current) = match self.scope {
            TraversalScope::Axis => (along_count, along),
            TraversalScope::Table => (along_count * across_count, across * along_count + along),
        };
        let target = self.advance(current, step, length, direction.is_forward());

        let (along, across) = match self.scope {
            TraversalScope::Axis => (target, across),
            TraversalScope::Table => (target % along_count, target / along_count),
        };
        Some(from.with(axis, along).with(axis.cross(), across))
    }

    fn advance(&self, current: usize, step: usize, length: usize, forward: bool) -> usize {
        if self.cycle {
            let step = step % length;
            if forward {
                (current + step) % length
            } else {
                (current + length - step) % length
            }
        } else if forward {
            current.saturating_add(step).min(length - 1)
        } else {
            current.saturating_sub(step)
        }
    }
}

impl Default for TraversalStrategy {
    fn default() -> Self {
        Self::AXIS
    }
}
