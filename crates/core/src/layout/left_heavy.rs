use cinder_protocol::{Category, FlameGraph};

use crate::layout::{ColumnBuilder, RowFrame};
use crate::model::{NodeId, ProfileShape};

/// Lay out a model with the heaviest subtree leftmost instead of
/// chronologically — the ordering for volumetric models, which have no
/// time axis, and an alternative reading of temporal ones.
///
/// Nodes are visited depth-first with siblings sorted by descending
/// inclusive weight (ties keep traversal order). Every node with non-zero
/// self weight emits one column whose width is its share of the total;
/// shared ancestor prefixes then merge into single wide boxes.
pub fn left_heavy(model: &impl ProfileShape) -> FlameGraph {
    let mut builder = ColumnBuilder::new();
    let total = model.total_value();
    if total <= 0.0 {
        return builder.finish();
    }

    let mut work = heaviest_first(model, model.roots());
    work.reverse();
    while let Some(node) = work.pop() {
        let self_value = model.self_value(node);
        if self_value > 0.0 {
            let stack = stack_of(model, node);
            let deepest = stack.len() - 1;
            let frames = stack
                .into_iter()
                .enumerate()
                .map(|(depth, n)| {
                    row_frame(
                        model,
                        n,
                        if depth == deepest { self_value } else { 0.0 },
                        self_value,
                    )
                })
                .collect();
            builder.push_column(self_value / total, frames);
        }

        let mut children = heaviest_first(model, model.children(node).to_vec());
        children.reverse();
        work.append(&mut children);
    }

    builder.finish()
}

fn heaviest_first(model: &impl ProfileShape, mut nodes: Vec<NodeId>) -> Vec<NodeId> {
    nodes.sort_by(|a, b| {
        model
            .aggregate_value(*b)
            .total_cmp(&model.aggregate_value(*a))
    });
    nodes
}

fn stack_of(model: &impl ProfileShape, leaf: NodeId) -> Vec<NodeId> {
    let mut stack = vec![leaf];
    let mut current = leaf;
    while let Some(parent) = model.parent(current) {
        stack.push(parent);
        current = parent;
    }
    stack.reverse();
    stack
}

fn row_frame(
    model: &impl ProfileShape,
    node: NodeId,
    self_value: f64,
    aggregate: f64,
) -> RowFrame {
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
