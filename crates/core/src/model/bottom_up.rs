use std::collections::HashMap;

use cinder_protocol::LocationId;

use crate::model::{NodeId, ProfileShape};

/// One node of the inverted call graph: a location at a given depth from
/// the synthetic root, accumulating contributions from every original node
/// whose call path passes through it.
#[derive(Debug, Clone)]
pub struct BottomUpNode {
    /// `None` only for the synthetic root ("any call path").
    pub location: Option<LocationId>,
    pub self_value: f64,
    pub aggregate_value: f64,
    children: Vec<BottomUpNode>,
    index: HashMap<LocationId, usize>,
}

impl BottomUpNode {
    fn new(location: Option<LocationId>) -> Self {
        Self {
            location,
            self_value: 0.0,
            aggregate_value: 0.0,
            children: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn children(&self) -> &[BottomUpNode] {
        &self.children
    }

    pub fn child_for(&self, location: LocationId) -> Option<&BottomUpNode> {
        self.index.get(&location).map(|&i| &self.children[i])
    }

    fn ensure_child(&mut self, location: LocationId) -> usize {
        if let Some(&i) = self.index.get(&location) {
            return i;
        }
        let i = self.children.len();
        self.children.push(BottomUpNode::new(Some(location)));
        self.index.insert(location, i);
        i
    }
}

/// Invert a profile model: group by destination location rather than call
/// path.
///
/// For every original node, its whole ancestor chain is folded into the
/// inverted tree, and each inverted node on that path receives the
/// *originating* node's own self/aggregate contribution. The result
/// answers "how much weight, across all call paths, landed at this
/// location, grouped by caller".
///
/// The ancestor walk is a plain loop; recursion depth is bounded only by
/// the caller's stack otherwise, and recursive code produces deep chains.
pub fn bottom_up(model: &impl ProfileShape) -> BottomUpNode {
    let mut root = BottomUpNode::new(None);

    for index in 0..model.node_count() {
        let node = NodeId(index as u32);
        let self_value = model.self_value(node);
        let aggregate_value = model.aggregate_value(node);

        // The synthetic root aggregates every node unconditionally; summing
        // self values keeps it equal to the total attributed weight.
        root.aggregate_value += self_value;

        let mut inverted = &mut root;
        let mut current = Some(node);
        while let Some(frame) = current {
            let child = inverted.ensure_child(model.location_of(frame));
            inverted = &mut inverted.children[child];
            inverted.self_value += self_value;
            inverted.aggregate_value += aggregate_value;
            current = model.parent(frame);
        }
    }

    root
}
