use cinder_protocol::{Category, FlameGraph};

use crate::layout::{ColumnBuilder, RowFrame};
use crate::model::cpu::CpuModel;
use crate::model::{NodeId, ProfileShape};

/// Lay out a temporal model chronologically: one column per sample
/// interval, rows root-first down to the sampled leaf.
///
/// The first and last samples only bound the trace (warm-up before the
/// first delta, and the implied final interval) and are skipped. Column
/// widths are the interval's self time as a fraction of the total
/// duration, so boundaries stay binary-searchable.
pub fn time_order(model: &CpuModel) -> FlameGraph {
    let mut builder = ColumnBuilder::new();
    if model.duration <= 0.0 {
        return builder.finish();
    }

    for i in 1..model.samples.len().saturating_sub(1) {
        let leaf = model.samples[i];
        let interval = model.time_deltas.get(i + 1).copied().unwrap_or(0.0);
        let width = interval / model.duration;

        let stack = stack_of(model, leaf);
        let is_gc = stack.len() == 1
            && model
                .location(model.location_of(leaf))
                .is_some_and(|loc| loc.is_gc());

        if is_gc {
            builder.push_gc_column(width, row_frame(model, leaf, interval, interval));
            continue;
        }

        let deepest = stack.len() - 1;
        let frames = stack
            .into_iter()
            .enumerate()
            .map(|(depth, node)| {
                let self_value = if depth == deepest { interval } else { 0.0 };
                row_frame(model, node, self_value, interval)
            })
            .collect();
        builder.push_column(width, frames);
    }

    builder.finish()
}

/// Ancestor chain of `leaf`, root first.
fn stack_of(model: &CpuModel, leaf: NodeId) -> Vec<NodeId> {
    let mut stack = vec![leaf];
    let mut current = leaf;
    while let Some(parent) = model.parent(current) {
        stack.push(parent);
        current = parent;
    }
    stack.reverse();
    stack
}

fn row_frame(model: &CpuModel, node: NodeId, self_value: f64, aggregate: f64) -> RowFrame {
    let location = model.location_of(node);
    let (category, text) = model
        .location(location)
        .map_or((Category::System, String::new()), |loc| {
            (loc.category, loc.label())
        });
    RowFrame {
        location,
        category,
        text,
        self_value,
        aggregate_value: aggregate,
    }
}
