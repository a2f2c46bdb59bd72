use std::collections::HashMap;
use std::path::Path;

use cinder_protocol::LocationId;

use crate::model::location::{Location, LocationInterner};
use crate::model::{NodeId, ProfileShape};
use crate::trace::CpuProfile;

/// One node per unique call-stack path observed in the raw trace. The same
/// location can back many nodes (one per distinct path through it).
#[derive(Debug, Clone)]
pub struct ComputedNode {
    pub id: NodeId,
    pub location: LocationId,
    /// Time directly attributed to this node by sample intervals.
    pub self_time: f64,
    /// `self_time` plus the aggregate of every child.
    pub aggregate_time: f64,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

/// The normalized temporal profile model.
///
/// Built once per opened trace and read-only afterwards; rebuilt fully on
/// reload.
#[derive(Debug, Clone, Default)]
pub struct CpuModel {
    pub nodes: Vec<ComputedNode>,
    pub locations: Vec<Location>,
    /// Samples re-indexed to dense node ids; dangling raw ids are dropped
    /// together with their interval deltas.
    pub samples: Vec<NodeId>,
    /// Interval deltas aligned so `time_deltas[i + 1]` measures the
    /// interval of `samples[i]`; the final sample's implied delta is
    /// appended during the build.
    pub time_deltas: Vec<f64>,
    pub duration: f64,
}

impl CpuModel {
    /// Build the model from a raw trace.
    ///
    /// A trace with no nodes or no sample/delta sequences produces an
    /// empty, valid model rather than an error: a recording of a program
    /// that did nothing measurable is still a recording.
    pub fn from_trace(trace: &CpuProfile, workspace_root: Option<&Path>) -> Self {
        let duration = trace.duration();
        let mut interner = LocationInterner::new(workspace_root);

        // Dense re-index; raw ids may be sparse and unsorted.
        let index_of: HashMap<u64, usize> = trace
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id, index))
            .collect();

        let mut nodes: Vec<ComputedNode> = Vec::with_capacity(trace.nodes.len());
        for (index, raw) in trace.nodes.iter().enumerate() {
            let location = interner.intern(&raw.call_frame);

            for tick in &raw.position_ticks {
                // 1-based tick lines, 0-based frame lines. Both range
                // endpoints become their own per-line call sites; the count
                // lands on the start of the range.
                let start = interner.intern_line(&raw.call_frame, tick.line - 1);
                interner.add_ticks(start, tick.ticks);
                if let Some(end_line) = tick.end_line {
                    interner.intern_line(&raw.call_frame, end_line - 1);
                }
            }

            let children: Vec<NodeId> = raw
                .children
                .iter()
                .filter_map(|raw_id| index_of.get(raw_id))
                .map(|&child| NodeId(child as u32))
                .collect();

            nodes.push(ComputedNode {
                id: NodeId(index as u32),
                location,
                self_time: 0.0,
                aggregate_time: 0.0,
                children,
                parent: None,
            });
        }

        // Parent pointers by inverting the child lists.
        for index in 0..nodes.len() {
            let parent = nodes[index].id;
            let children = nodes[index].children.clone();
            for child in children {
                nodes[child.index()].parent = Some(parent);
            }
        }

        let (samples, time_deltas) =
            attribute_self_time(&mut nodes, trace, &index_of, duration);

        compute_aggregates(&mut nodes);

        // Per-node contribution: every path through a location adds both
        // its self and its aggregate time, undeduplicated.
        for node in &nodes {
            interner.add_time(node.location, node.self_time, node.aggregate_time);
        }

        Self {
            nodes,
            locations: interner.finish(),
            samples,
            time_deltas,
            duration,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Attribute sample interval deltas to node self time.
///
/// `time_deltas[i + 1]` belongs to `samples[i]`: the profiler's first delta
/// is warm-up before the first sample, so each sample's duration is
/// measured by the delta that follows it. The final sample's interval is
/// not directly observable; it is derived as `duration - Σ deltas` and
/// appended so the stored sequence stays consistent.
fn attribute_self_time(
    nodes: &mut [ComputedNode],
    trace: &CpuProfile,
    index_of: &HashMap<u64, usize>,
    duration: f64,
) -> (Vec<NodeId>, Vec<f64>) {
    if trace.samples.is_empty() || trace.time_deltas.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let mut samples = Vec::with_capacity(trace.samples.len());
    let mut deltas = Vec::with_capacity(trace.samples.len() + 1);
    deltas.push(trace.time_deltas[0]);

    let last = trace.samples.len() - 1;
    for (i, raw_id) in trace.samples.iter().enumerate() {
        // Transient/truncated traces may reference unknown nodes; drop the
        // sample and its interval rather than fail.
        let Some(&dense) = index_of.get(raw_id) else {
            continue;
        };

        let interval = if i < last {
            match trace.time_deltas.get(i + 1) {
                Some(&delta) => delta,
                None => continue,
            }
        } else {
            let consumed: f64 = trace.time_deltas.iter().sum();
            (duration - consumed).max(0.0)
        };

        nodes[dense].self_time += interval;
        samples.push(NodeId(dense as u32));
        deltas.push(interval);
    }

    (samples, deltas)
}

/// Memoized post-order aggregate computation over the node forest, with an
/// explicit work stack so deep recursive call trees cannot overflow the
/// native stack.
fn compute_aggregates(nodes: &mut [ComputedNode]) {
    let mut done = vec![false; nodes.len()];
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..nodes.len() {
        if nodes[root].parent.is_some() || done[root] {
            continue;
        }
        stack.push((root, 0));
        while let Some(&(node, next_child)) = stack.last() {
            if let Some(&child) = nodes[node].children.get(next_child) {
                let top = stack.len() - 1;
                stack[top].1 += 1;
                if !done[child.index()] {
                    stack.push((child.index(), 0));
                }
            } else {
                let children_total: f64 = nodes[node]
                    .children
                    .iter()
                    .map(|c| nodes[c.index()].aggregate_time)
                    .sum();
                nodes[node].aggregate_time = nodes[node].self_time + children_total;
                done[node] = true;
                stack.pop();
            }
        }
    }
}

impl ProfileShape for CpuModel {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.index())?.parent
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.index())
            .map_or(&[], |n| n.children.as_slice())
    }

    fn roots(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.parent.is_none())
            .map(|n| n.id)
            .collect()
    }

    fn location_of(&self, node: NodeId) -> LocationId {
        self.nodes[node.index()].location
    }

    fn self_value(&self, node: NodeId) -> f64 {
        self.nodes[node.index()].self_time
    }

    fn aggregate_value(&self, node: NodeId) -> f64 {
        self.nodes[node.index()].aggregate_time
    }

    fn locations(&self) -> &[Location] {
        &self.locations
    }
}
