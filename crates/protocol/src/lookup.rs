use crate::graph::{Cell, Column, FlameBox, FlameGraph};

/// Scan direction for focus navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

/// Binary search for the column containing `x`.
///
/// Columns cover half-open spans `[x1, x2)` with sorted boundaries.
/// `Ok(i)` is the covering column; `Err(i)` is the insertion point when no
/// column covers `x`, distinguishing before-all (`Err(0)`) from after-all
/// (`Err(len)`).
pub fn column_for_x(columns: &[Column], x: f64) -> Result<usize, usize> {
    let idx = columns.partition_point(|c| c.x2 <= x);
    if idx < columns.len() && columns[idx].x1 <= x {
        Ok(idx)
    } else {
        Err(idx)
    }
}

/// Resolve the box at `(column, depth)`, following at most one
/// back-reference to the canonical box of a merged run.
pub fn box_at(graph: &FlameGraph, column: usize, depth: usize) -> Option<&FlameBox> {
    let cell = graph.columns.get(column)?.rows.get(depth)?;
    match cell {
        Cell::Frame(b) => Some(b),
        // Canonical cells are never themselves back-references.
        Cell::MergedInto(owner) => graph.columns.get(*owner)?.rows.get(depth)?.as_box(),
    }
}

/// Index of the nearest column owning a canonical box at `depth` whose span
/// crosses `edge` in the given direction.
///
/// Drives keyboard focus: "move to the next frame at this depth past the
/// viewport edge". Starts from a binary search on the edge, then scans
/// outward over canonical cells only, so merged runs are visited once.
pub fn nearest_at_depth(
    graph: &FlameGraph,
    depth: usize,
    edge: f64,
    direction: Direction,
) -> Option<usize> {
    let columns = &graph.columns;
    if columns.is_empty() {
        return None;
    }
    let start = match column_for_x(columns, edge) {
        Ok(i) | Err(i) => i,
    };

    // Resolve a cell to its canonical box and owning column, so merged
    // runs are judged by their full span.
    let resolve = |i: usize| -> Option<(usize, &FlameBox)> {
        match columns.get(i)?.rows.get(depth)? {
            Cell::Frame(b) => Some((i, b)),
            Cell::MergedInto(owner) => columns
                .get(*owner)?
                .rows
                .get(depth)?
                .as_box()
                .map(|b| (*owner, b)),
        }
    };

    match direction {
        Direction::Right => (start..columns.len()).find_map(|i| {
            let (owner, b) = resolve(i)?;
            (b.x2 > edge).then_some(owner)
        }),
        Direction::Left => (0..=start.min(columns.len() - 1)).rev().find_map(|i| {
            let (owner, b) = resolve(i)?;
            (b.x1 < edge).then_some(owner)
        }),
    }
}
