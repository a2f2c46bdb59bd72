use serde::{Deserialize, Serialize};

/// Dense identity of an interned call site within one profile model.
///
/// Assigned in first-seen order by the model builder; stable for the
/// lifetime of the model, so consumers can use it as an array index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocationId(pub u32);

impl LocationId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Classification of a call site.
///
/// `System`, `User`, and `Module` come from the classifier at model build
/// time. `Deemphasized` is applied only by the layout step, to boxes below
/// a filter-match depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    /// Engine-internal frames (negative line numbers).
    System,
    /// Code with a resolved source inside the workspace.
    User,
    /// Dependency code, or code with no resolved source.
    Module,
    /// Below the deepest filter match in its column.
    Deemphasized,
}

/// One rendered frame of the flame graph.
///
/// A box is the canonical cell for a run of one or more consecutive
/// columns sharing the same frame at the same depth; merged columns refer
/// back to it via [`Cell::MergedInto`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlameBox {
    /// Dense per-graph id; also the input to [`color_fraction`].
    pub id: u32,
    pub location: LocationId,
    pub category: Category,
    /// Row depth, 0 = root.
    pub depth: u32,
    /// Left edge, as a fraction of the total duration or size.
    pub x1: f64,
    /// Right edge (exclusive), extended as merged runs grow.
    pub x2: f64,
    /// Self time/size accumulated across the merged run.
    pub self_value: f64,
    /// Aggregate (inclusive) time/size accumulated across the merged run.
    pub aggregate_value: f64,
    /// Display label.
    pub text: String,
}

/// One row of a column: either the canonical box for a frame run, or a
/// back-reference to the earlier column that owns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Cell {
    Frame(FlameBox),
    /// Index of the column holding the canonical [`FlameBox`] at this depth.
    MergedInto(usize),
}

impl Cell {
    /// The box stored directly in this cell, if it is not a back-reference.
    pub fn as_box(&self) -> Option<&FlameBox> {
        match self {
            Self::Frame(b) => Some(b),
            Self::MergedInto(_) => None,
        }
    }
}

/// A contiguous horizontal span of the flame graph holding one cell per
/// stack depth, ordered root-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Left edge as a fraction of the total.
    pub x1: f64,
    /// Right edge as a fraction of the total. Columns are emitted left to
    /// right with non-decreasing `x2`, so boundaries are binary-searchable.
    pub x2: f64,
    pub rows: Vec<Cell>,
}

impl Column {
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }
}

/// The full column/row grid produced by the layout engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlameGraph {
    pub columns: Vec<Column>,
}

impl FlameGraph {
    /// Maximum stack depth across all columns.
    pub fn max_depth(&self) -> usize {
        self.columns.iter().map(|c| c.rows.len()).max().unwrap_or(0)
    }
}

/// Fold a box id to a stable color fraction in `[0, 1)`.
///
/// Multiplicative hashing by the 32-bit Fibonacci constant; content-derived,
/// so re-renders of the same graph color identically without stored state.
pub fn color_fraction(id: u32) -> f64 {
    f64::from(id.wrapping_mul(0x9E37_79B1)) / (f64::from(u32::MAX) + 1.0)
}
