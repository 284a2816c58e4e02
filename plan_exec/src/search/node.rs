//! Search tree nodes and frontier ordering

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::cmp::Ordering;

use ordered_float::OrderedFloat;

use crate::motion::{Control, Pose};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A node in the search tree. Nodes live in an arena and refer to their parent by index.
#[derive(Debug, Clone)]
pub(super) struct SearchNode {
    pub pose: Pose,

    /// Cost from the start to this node
    pub g: f64,

    /// The action which led to this node, `None` for the start
    pub control: Option<Control>,

    /// Arena index of the parent node, `None` for the start
    pub parent: Option<usize>,
}

/// An entry in the search frontier.
///
/// Entries are ordered by lowest `f`, then lowest `g`, then lowest node index, which is the
/// order the nodes were created in. The ordering is reversed so that `BinaryHeap`, a max-heap,
/// pops the best entry first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct QueueEntry {
    pub f: OrderedFloat<f64>,
    pub g: OrderedFloat<f64>,
    pub node: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl QueueEntry {
    pub fn new(f: f64, g: f64, node: usize) -> Self {
        Self {
            f: OrderedFloat(f),
            g: OrderedFloat(g),
            node,
        }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.g.cmp(&self.g))
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::BinaryHeap;

    #[test]
    fn test_frontier_order() {
        let mut heap = BinaryHeap::new();
        heap.push(QueueEntry::new(5.0, 1.0, 0));
        heap.push(QueueEntry::new(4.0, 3.0, 1));
        heap.push(QueueEntry::new(4.0, 2.0, 2));
        heap.push(QueueEntry::new(4.0, 2.0, 3));
        heap.push(QueueEntry::new(3.5, 3.5, 4));

        let order: Vec<usize> = std::iter::from_fn(|| heap.pop().map(|e| e.node)).collect();
        assert_eq!(order, vec![4, 2, 3, 1, 0]);
    }
}
