use std::collections::BTreeMap;

use petgraph::graphmap::NodeTrait;

use crate::cell::{IslandSize, Label};

/// A complete labeling of a board, copied out of it when it was found.
///
/// Anchors are labeled [`Land`](Label::Land); their sizes are kept alongside for display.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub struct Solution<N>
where
    N: NodeTrait,
{
    labels: BTreeMap<N, Label>,
    anchors: BTreeMap<N, IslandSize>,
}

impl<N> Solution<N>
where
    N: NodeTrait,
{
    pub(crate) fn new(labels: BTreeMap<N, Label>, anchors: BTreeMap<N, IslandSize>) -> Self {
        Self { labels, anchors }
    }

    /// The label of `node`, or [`None`] if it is not part of this solution.
    pub fn label(&self, node: N) -> Option<Label> {
        self.labels.get(&node).copied()
    }

    /// The size of the anchor at `node`, if there is one.
    pub fn anchor(&self, node: N) -> Option<IslandSize> {
        self.anchors.get(&node).copied()
    }

    /// Every node with its label, in node order.
    pub fn iter(&self) -> impl Iterator<Item = (N, Label)> + '_ {
        self.labels.iter().map(|(node, label)| (*node, *label))
    }

    /// The number of labeled nodes.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether this solution labels no nodes at all, as for a board on an empty graph.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The number of nodes labeled with `label`.
    pub fn count(&self, label: Label) -> usize {
        self.labels.values().filter(|l| **l == label).count()
    }
}
