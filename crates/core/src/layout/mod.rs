pub mod left_heavy;
pub mod time_order;

pub use left_heavy::left_heavy;
pub use time_order::time_order;

use cinder_protocol::{Category, Cell, Column, FlameBox, FlameGraph, LocationId, box_at};

/// One stack entry of a column under construction, before merging.
#[derive(Debug, Clone)]
pub(crate) struct RowFrame {
    pub location: LocationId,
    pub category: Category,
    pub text: String,
    /// Contribution to the box's exclusive value from this column.
    pub self_value: f64,
    /// Contribution to the box's inclusive value from this column.
    pub aggregate_value: f64,
}

/// Builds the column grid left to right, coalescing runs of identical
/// frames in a single pass.
///
/// When a column's frame at depth `y` matches the previous column's frame
/// at `y`, the cell becomes a back-reference to the column owning the
/// canonical box of that run and the box absorbs the new contribution; the
/// first divergence ends merging for all deeper rows, since the call path
/// has changed.
#[derive(Debug, Default)]
pub(crate) struct ColumnBuilder {
    columns: Vec<Column>,
    next_box_id: u32,
}

impl ColumnBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn make_box(&mut self, frame: RowFrame, depth: usize, x1: f64, x2: f64) -> FlameBox {
        let id = self.next_box_id;
        self.next_box_id += 1;
        FlameBox {
            id,
            location: frame.location,
            category: frame.category,
            depth: depth as u32,
            x1,
            x2,
            self_value: frame.self_value,
            aggregate_value: frame.aggregate_value,
            text: frame.text,
        }
    }

    /// Column index and location of the canonical box at `(column, depth)`.
    fn canonical_at(&self, column: usize, depth: usize) -> Option<(usize, LocationId)> {
        let owner = match self.columns.get(column)?.rows.get(depth)? {
            Cell::Frame(_) => column,
            Cell::MergedInto(k) => *k,
        };
        match self.columns.get(owner)?.rows.get(depth)? {
            Cell::Frame(b) => Some((owner, b.location)),
            Cell::MergedInto(_) => None,
        }
    }

    fn absorb(&mut self, owner: usize, depth: usize, x2: f64, self_value: f64, aggregate: f64) {
        if let Some(Cell::Frame(b)) = self.columns[owner].rows.get_mut(depth) {
            b.x2 = x2;
            b.self_value += self_value;
            b.aggregate_value += aggregate;
        }
    }

    /// Append an ordinary column of `width` holding `frames` root-first.
    pub fn push_column(&mut self, width: f64, frames: Vec<RowFrame>) {
        let x1 = self.columns.last().map_or(0.0, |c| c.x2);
        let x2 = x1 + width;
        let mut merge_prev = self.columns.len().checked_sub(1);

        let mut rows = Vec::with_capacity(frames.len());
        for (depth, frame) in frames.into_iter().enumerate() {
            if let Some(prev) = merge_prev {
                match self.canonical_at(prev, depth) {
                    Some((owner, location)) if location == frame.location => {
                        self.absorb(owner, depth, x2, frame.self_value, frame.aggregate_value);
                        rows.push(Cell::MergedInto(owner));
                        continue;
                    }
                    _ => merge_prev = None,
                }
            }
            let flame_box = self.make_box(frame, depth, x1, x2);
            rows.push(Cell::Frame(flame_box));
        }

        self.columns.push(Column { x1, x2, rows });
    }

    /// Append a column for a stackless garbage-collection sample.
    ///
    /// GC interrupts carry no call stack of their own; fragmenting the
    /// graph on every GC sample would shred otherwise-contiguous frames.
    /// The column instead borrows the previous column's full stack as
    /// back-references (extending those boxes without contributing time)
    /// and appends one GC marker box per maximal run of consecutive GC
    /// samples.
    pub fn push_gc_column(&mut self, width: f64, frame: RowFrame) {
        let x1 = self.columns.last().map_or(0.0, |c| c.x2);
        let x2 = x1 + width;

        let mut rows = Vec::new();
        let mut merged_marker = false;
        if let Some(prev) = self.columns.len().checked_sub(1) {
            for depth in 0..self.columns[prev].rows.len() {
                let Some((owner, location)) = self.canonical_at(prev, depth) else {
                    break;
                };
                if location == frame.location {
                    // Continuing a GC run: fold into the existing marker.
                    self.absorb(owner, depth, x2, frame.self_value, frame.aggregate_value);
                    merged_marker = true;
                } else {
                    self.absorb(owner, depth, x2, 0.0, 0.0);
                }
                rows.push(Cell::MergedInto(owner));
            }
        }

        if !merged_marker {
            let depth = rows.len();
            let marker = self.make_box(frame, depth, x1, x2);
            rows.push(Cell::Frame(marker));
        }

        self.columns.push(Column { x1, x2, rows });
    }

    pub fn finish(self) -> FlameGraph {
        FlameGraph {
            columns: self.columns,
        }
    }
}

/// Re-categorize boxes below the filter-match depth as
/// [`Category::Deemphasized`].
///
/// For each column, rows deeper than the deepest row whose location
/// satisfies `matches` are demoted; a column with no match at all is
/// demoted entirely. Applied to canonical boxes, so a merged run is
/// demoted where it is owned.
pub fn deemphasize<F>(graph: &mut FlameGraph, matches: F)
where
    F: Fn(LocationId) -> bool,
{
    for column in 0..graph.columns.len() {
        let mut deepest: Option<usize> = None;
        for depth in 0..graph.columns[column].rows.len() {
            if let Some(b) = box_at(graph, column, depth)
                && matches(b.location)
            {
                deepest = Some(depth);
            }
        }
        for depth in 0..graph.columns[column].rows.len() {
            if deepest.is_some_and(|d| depth <= d) {
                continue;
            }
            if let Some(Cell::Frame(b)) = graph.columns[column].rows.get_mut(depth) {
                b.category = Category::Deemphasized;
            }
        }
    }
}
