pub mod bottom_up;
pub mod cpu;
pub mod heap;
pub mod location;

use cinder_protocol::LocationId;

use location::Location;

/// Dense node index within one profile model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The common node/location shape shared by the temporal and volumetric
/// models, consumed by the bottom-up aggregator and the left-heavy layout.
///
/// Implementations are read-only views: construction has completed before
/// any consumer observes the model.
pub trait ProfileShape {
    fn node_count(&self) -> usize;
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn children(&self, node: NodeId) -> &[NodeId];
    /// Nodes with no parent, in model order.
    fn roots(&self) -> Vec<NodeId>;
    fn location_of(&self, node: NodeId) -> LocationId;
    /// Time or size directly attributed to the node.
    fn self_value(&self, node: NodeId) -> f64;
    /// Inclusive time or size of the node's subtree.
    fn aggregate_value(&self, node: NodeId) -> f64;
    fn locations(&self) -> &[Location];

    fn location(&self, id: LocationId) -> Option<&Location> {
        self.locations().get(id.index())
    }

    /// Sum of the roots' inclusive values, i.e. the total attributed weight.
    fn total_value(&self) -> f64 {
        self.roots()
            .into_iter()
            .map(|n| self.aggregate_value(n))
            .sum()
    }
}
