//! Events: notifications of changes that already happened, travelling up.
//!
//! An event carries positions in the space of the layer that fired it. A
//! listening layer converts its own copy with
//! [`LayerEvent::convert_to_local`] *before* updating its caches, so that
//! positions describing the state prior to the change resolve against the
//! matching prior mapping. It then updates its state and fires the converted
//! event to its own listeners.

mod conflation;

pub use conflation::{ConflationScheduler, EventConflater, VisualChangeConflater};

use crate::coordinate::{CellPosition, Orientation, Range, position_util};
use crate::layer::{Layer, LayerId, underlying_to_local_ranges};

/// A change notification together with the layer whose positions it uses.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerEvent {
    /// The layer whose coordinate space the event is expressed in.
    pub layer: LayerId,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Cells changed appearance or value; structure is unchanged.
    CellVisualChange { columns: Vec<Range>, rows: Vec<Range> },
    /// Repaint everything.
    VisualRefresh,
    /// A viewport scrolled along `axis`.
    Scroll { axis: Orientation },
    /// Positions along one axis were hidden, shown, moved, resized, inserted
    /// or deleted.
    Structural(StructuralChange),
    /// All structure may have changed on both axes.
    StructuralRefresh,
    Selection(SelectionChange),
}

// =============================================================================
// Structural changes
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructuralKind {
    Hide,
    Show,
    Reorder,
    Resize,
    Insert,
    Delete,
    Refresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffKind {
    Add,
    Delete,
    Change,
}

/// How one span of positions changed.
///
/// `before` is in the positions prior to the change, `after` in the positions
/// following it. A deleted span has an empty `after` at its old start; an
/// added span has an empty `before` at the insertion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StructuralDiff {
    pub kind: DiffKind,
    pub before: Range,
    pub after: Range,
}

impl StructuralDiff {
    pub fn deleted(range: Range) -> Self {
        Self {
            kind: DiffKind::Delete,
            before: range,
            after: Range::empty_at(range.start),
        }
    }

    pub fn added(range: Range) -> Self {
        Self {
            kind: DiffKind::Add,
            before: Range::empty_at(range.start),
            after: range,
        }
    }

    pub fn changed(range: Range) -> Self {
        Self {
            kind: DiffKind::Change,
            before: range,
            after: range,
        }
    }
}

/// A structural change along one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralChange {
    pub axis: Orientation,
    pub kind: StructuralKind,
    /// The affected positions.
    pub ranges: Vec<Range>,
    /// Position diffs; `None` means listeners must rebuild the whole axis.
    pub diffs: Option<Vec<StructuralDiff>>,
    /// Index diffs for data inserts and deletes. Indexes are the same in
    /// every layer, so these are never converted.
    pub index_diffs: Vec<StructuralDiff>,
}

impl StructuralChange {
    /// Whether positions were added, removed or moved, as opposed to resized.
    pub fn changes_positions(&self) -> bool {
        self.kind != StructuralKind::Resize
    }

    /// Where `index` lives after the index diffs, `None` if it was deleted.
    pub fn remap_index(&self, index: usize) -> Option<usize> {
        self.index_diffs
            .iter()
            .try_fold(index, |index, diff| match diff.kind {
                DiffKind::Delete if diff.before.contains(index) => None,
                DiffKind::Delete if index >= diff.before.end => Some(index - diff.before.len()),
                DiffKind::Add if index >= diff.after.start => Some(index + diff.after.len()),
                _ => Some(index),
            })
    }
}

// =============================================================================
// Selection changes
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionKind {
    Cells,
    Columns,
    Rows,
    All,
    Cleared,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChange {
    pub kind: SelectionKind,
    pub columns: Vec<Range>,
    pub rows: Vec<Range>,
    /// A cell the host should scroll into view.
    pub reveal: Option<CellPosition>,
}

// =============================================================================
// Construction
// =============================================================================

impl LayerEvent {
    pub fn new(layer: LayerId, kind: EventKind) -> Self {
        Self { layer, kind }
    }

    pub fn cell_visual_change(layer: LayerId, columns: Vec<Range>, rows: Vec<Range>) -> Self {
        Self::new(layer, EventKind::CellVisualChange { columns, rows })
    }

    pub fn cell_changed(layer: LayerId, column: usize, row: usize) -> Self {
        Self::cell_visual_change(layer, vec![Range::single(column)], vec![Range::single(row)])
    }

    pub fn visual_refresh(layer: LayerId) -> Self {
        Self::new(layer, EventKind::VisualRefresh)
    }

    pub fn scroll(layer: LayerId, axis: Orientation) -> Self {
        Self::new(layer, EventKind::Scroll { axis })
    }

    pub fn structural_refresh(layer: LayerId) -> Self {
        Self::new(layer, EventKind::StructuralRefresh)
    }

    pub fn selection(layer: LayerId, change: SelectionChange) -> Self {
        Self::new(layer, EventKind::Selection(change))
    }

    /// `positions` were hidden. Positions are those before hiding.
    pub fn hide(layer: LayerId, axis: Orientation, positions: &[usize]) -> Self {
        let ranges = position_util::get_ranges(positions.iter().copied());
        let diffs = ranges.iter().copied().map(StructuralDiff::deleted).collect();
        Self::structural(layer, axis, StructuralKind::Hide, ranges, Some(diffs), Vec::new())
    }

    /// `positions` became visible. Positions are those after showing.
    pub fn show(layer: LayerId, axis: Orientation, positions: &[usize]) -> Self {
        let ranges = position_util::get_ranges(positions.iter().copied());
        let diffs = ranges.iter().copied().map(StructuralDiff::added).collect();
        Self::structural(layer, axis, StructuralKind::Show, ranges, Some(diffs), Vec::new())
    }

    pub fn resize(layer: LayerId, axis: Orientation, positions: &[usize]) -> Self {
        let ranges = position_util::get_ranges(positions.iter().copied());
        let diffs = ranges.iter().copied().map(StructuralDiff::changed).collect();
        Self::structural(layer, axis, StructuralKind::Resize, ranges, Some(diffs), Vec::new())
    }

    /// Positions moved. Listeners rebuild the axis.
    pub fn reorder(layer: LayerId, axis: Orientation, positions: &[usize]) -> Self {
        let ranges = position_util::get_ranges(positions.iter().copied());
        Self::structural(layer, axis, StructuralKind::Reorder, ranges, None, Vec::new())
    }

    /// New data entries at `range`, which are both positions and indexes of
    /// the firing layer.
    pub fn insert(layer: LayerId, axis: Orientation, range: Range) -> Self {
        let diff = StructuralDiff::added(range);
        Self::structural(layer, axis, StructuralKind::Insert, vec![range], Some(vec![diff]), vec![diff])
    }

    /// Data entries at `range` were deleted.
    pub fn delete(layer: LayerId, axis: Orientation, range: Range) -> Self {
        let diff = StructuralDiff::deleted(range);
        Self::structural(layer, axis, StructuralKind::Delete, vec![range], Some(vec![diff]), vec![diff])
    }

    /// Rebuild the whole axis.
    pub fn axis_refresh(layer: LayerId, axis: Orientation, count: usize) -> Self {
        let ranges = if count == 0 { Vec::new() } else { vec![Range::new(0, count)] };
        Self::structural(layer, axis, StructuralKind::Refresh, ranges, None, Vec::new())
    }

    fn structural(
        layer: LayerId,
        axis: Orientation,
        kind: StructuralKind,
        ranges: Vec<Range>,
        diffs: Option<Vec<StructuralDiff>>,
        index_diffs: Vec<StructuralDiff>,
    ) -> Self {
        let change = StructuralChange {
            axis,
            kind,
            ranges,
            diffs,
            index_diffs,
        };
        Self::new(layer, EventKind::Structural(change))
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Short name for logs.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            EventKind::CellVisualChange { .. } => "cell_visual_change",
            EventKind::VisualRefresh => "visual_refresh",
            EventKind::Scroll { .. } => "scroll",
            EventKind::Structural(change) => match change.kind {
                StructuralKind::Hide => "hide",
                StructuralKind::Show => "show",
                StructuralKind::Reorder => "reorder",
                StructuralKind::Resize => "resize",
                StructuralKind::Insert => "insert",
                StructuralKind::Delete => "delete",
                StructuralKind::Refresh => "axis_refresh",
            },
            EventKind::StructuralRefresh => "structural_refresh",
            EventKind::Selection(_) => "selection",
        }
    }

    pub fn structural_change(&self) -> Option<&StructuralChange> {
        match &self.kind {
            EventKind::Structural(change) => Some(change),
            _ => None,
        }
    }

    pub fn selection_change(&self) -> Option<&SelectionChange> {
        match &self.kind {
            EventKind::Selection(change) => Some(change),
            _ => None,
        }
    }

    /// Whether layer structure (counts or pixel sizes) may have changed.
    pub fn is_structural(&self) -> bool {
        matches!(self.kind, EventKind::Structural(_) | EventKind::StructuralRefresh)
    }

    /// Whether the structure along `axis` may have changed.
    pub fn affects_axis(&self, axis: Orientation) -> bool {
        match &self.kind {
            EventKind::Structural(change) => change.axis == axis,
            EventKind::StructuralRefresh => true,
            _ => false,
        }
    }

    /// Whether `axis` positions were added, removed or moved.
    pub fn changes_positions(&self, axis: Orientation) -> bool {
        match &self.kind {
            EventKind::Structural(change) => change.axis == axis && change.changes_positions(),
            EventKind::StructuralRefresh => true,
            _ => false,
        }
    }

    /// Whether the event only asks for repainting.
    pub fn is_visual(&self) -> bool {
        matches!(
            self.kind,
            EventKind::CellVisualChange { .. } | EventKind::VisualRefresh | EventKind::Scroll { .. }
        )
    }

    pub fn is_selection(&self) -> bool {
        matches!(self.kind, EventKind::Selection(_))
    }

    // =========================================================================
    // Conversion
    // =========================================================================

    /// Re-express the event in the positions of `local`, a layer directly
    /// above the one the event is currently expressed in.
    ///
    /// Returns `false` when the event is not meaningful for `local`: it comes
    /// from a layer `local` does not sit on, or it only concerns cells not
    /// visible there.
    pub fn convert_to_local(&mut self, local: &dyn Layer) -> bool {
        let source = self.layer;
        if !local.is_underlying(source) {
            return false;
        }
        let accepted = match &mut self.kind {
            EventKind::CellVisualChange { columns, rows } => {
                *columns = underlying_to_local_ranges(local, Orientation::Horizontal, source, columns);
                *rows = underlying_to_local_ranges(local, Orientation::Vertical, source, rows);
                !columns.is_empty() && !rows.is_empty()
            }
            EventKind::VisualRefresh | EventKind::Scroll { .. } | EventKind::StructuralRefresh => true,
            EventKind::Structural(change) => {
                convert_structural(change, local, source);
                true
            }
            EventKind::Selection(change) => {
                change.columns =
                    underlying_to_local_ranges(local, Orientation::Horizontal, source, &change.columns);
                change.rows = underlying_to_local_ranges(local, Orientation::Vertical, source, &change.rows);
                change.reveal = change.reveal.and_then(|cell| {
                    Some(CellPosition::new(
                        local.underlying_to_local(Orientation::Horizontal, source, cell.column)?,
                        local.underlying_to_local(Orientation::Vertical, source, cell.row)?,
                    ))
                });
                true
            }
        };
        if accepted {
            self.layer = local.id();
        }
        accepted
    }
}

/// The smallest local range covering the members of `range` visible locally.
fn convert_span(local: &dyn Layer, axis: Orientation, source: LayerId, range: Range) -> Option<Range> {
    let converted = range
        .members()
        .filter_map(|position| local.underlying_to_local(axis, source, position));
    let (min, max) = converted.fold(None, |acc: Option<(usize, usize)>, p| match acc {
        None => Some((p, p)),
        Some((min, max)) => Some((min.min(p), max.max(p))),
    })?;
    Some(Range::new(min, max + 1))
}

/// The local position of an insertion point between underlying positions.
fn convert_boundary(local: &dyn Layer, axis: Orientation, source: LayerId, at: usize) -> Option<usize> {
    local
        .underlying_to_local(axis, source, at)
        .or_else(|| {
            at.checked_sub(1)
                .and_then(|previous| local.underlying_to_local(axis, source, previous))
                .map(|p| p + 1)
        })
}

fn convert_structural(change: &mut StructuralChange, local: &dyn Layer, source: LayerId) {
    let axis = change.axis;
    let diffs = change.diffs.take().map(|diffs| {
        diffs
            .into_iter()
            .filter_map(|diff| {
                let before = if diff.before.is_empty() {
                    Range::empty_at(convert_boundary(local, axis, source, diff.before.start)?)
                } else {
                    convert_span(local, axis, source, diff.before)?
                };
                let after = match diff.kind {
                    DiffKind::Delete => Range::empty_at(before.start),
                    DiffKind::Add => Range::new(before.start, before.start + diff.after.len()),
                    DiffKind::Change => before,
                };
                Some(StructuralDiff {
                    kind: diff.kind,
                    before,
                    after,
                })
            })
            .collect::<Vec<_>>()
    });

    let ranges = match &diffs {
        Some(diffs) if matches!(change.kind, StructuralKind::Show | StructuralKind::Insert) => {
            position_util::merge_ranges(&diffs.iter().map(|d| d.after).collect::<Vec<_>>())
        }
        _ => change
            .ranges
            .iter()
            .filter_map(|range| convert_span(local, axis, source, *range))
            .collect(),
    };
    let ranges = position_util::merge_ranges(&ranges);

    match diffs {
        Some(diffs) if !diffs.is_empty() => {
            change.ranges = ranges;
            change.diffs = Some(diffs);
        }
        None if !ranges.is_empty() => change.ranges = ranges,
        _ => {
            let count = local.count(axis);
            change.ranges = if count == 0 {
                Vec::new()
            } else {
                vec![Range::new(0, count)]
            };
            change.diffs = None;
        }
    }
}
