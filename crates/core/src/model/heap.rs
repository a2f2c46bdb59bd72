use cinder_protocol::LocationId;
use std::path::Path;

use crate::model::location::{Location, LocationInterner};
use crate::model::{NodeId, ProfileShape};
use crate::trace::HeapProfile;
use crate::trace::heapprofile::HeapProfileNode;

/// One node of the volumetric (heap allocation) model. The arena owns the
/// tree; `parent` is the non-owning back-reference for upward traversal.
#[derive(Debug, Clone)]
pub struct HeapNode {
    pub id: NodeId,
    pub location: LocationId,
    /// Bytes allocated directly at this call site.
    pub self_size: f64,
    /// `self_size` plus the total of every child.
    pub total_size: f64,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

/// The normalized volumetric profile model. Node 0 is the tree root.
#[derive(Debug, Clone, Default)]
pub struct HeapModel {
    pub nodes: Vec<HeapNode>,
    pub locations: Vec<Location>,
    /// Total size of the root, i.e. all recorded allocations.
    pub total_size: f64,
}

impl HeapModel {
    /// Build the model by depth-first traversal of the raw allocation tree,
    /// interning a resolved location for every node and computing inclusive
    /// sizes bottom-up.
    pub fn from_trace(trace: &HeapProfile, workspace_root: Option<&Path>) -> Self {
        let mut interner = LocationInterner::new(workspace_root);
        let mut nodes: Vec<HeapNode> = Vec::new();

        // Explicit stack; allocation trees from recursive code can be deep.
        let mut work: Vec<(&HeapProfileNode, Option<NodeId>)> = vec![(&trace.head, None)];
        while let Some((raw, parent)) = work.pop() {
            let id = NodeId(nodes.len() as u32);
            nodes.push(HeapNode {
                id,
                location: interner.intern(&raw.call_frame),
                self_size: raw.self_size,
                total_size: raw.self_size,
                children: Vec::with_capacity(raw.children.len()),
                parent,
            });
            if let Some(p) = parent {
                nodes[p.index()].children.push(id);
            }
            // Reversed so children pop in declaration order, keeping ids in
            // preorder: every child index is greater than its parent's.
            for child in raw.children.iter().rev() {
                work.push((child, Some(id)));
            }
        }

        // Preorder indexing makes a reverse scan a valid post-order fold.
        for index in (0..nodes.len()).rev() {
            if let Some(parent) = nodes[index].parent {
                let total = nodes[index].total_size;
                nodes[parent.index()].total_size += total;
            }
        }

        for node in &nodes {
            interner.add_size(node.location, node.self_size, node.total_size);
        }

        let total_size = nodes.first().map_or(0.0, |root| root.total_size);
        Self {
            nodes,
            locations: interner.finish(),
            total_size,
        }
    }

    pub fn root(&self) -> Option<&HeapNode> {
        self.nodes.first()
    }
}

impl ProfileShape for HeapModel {
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
        self.root().map(|r| r.id).into_iter().collect()
    }

    fn location_of(&self, node: NodeId) -> LocationId {
        self.nodes[node.index()].location
    }

    fn self_value(&self, node: NodeId) -> f64 {
        self.nodes[node.index()].self_size
    }

    fn aggregate_value(&self, node: NodeId) -> f64 {
        self.nodes[node.index()].total_size
    }

    fn locations(&self) -> &[Location] {
        &self.locations
    }
}
