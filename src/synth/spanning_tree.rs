//! Breadth-first spanning trees of a transition system.
//!
//! Every reachable non-root state gets exactly one predecessor edge; every
//! other edge seen during the traversal is a chord. Edges incident only to
//! unreachable states are neither.

use std::collections::{HashMap, VecDeque};

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::ts::system::TransitionSystem;

#[derive(Debug, Clone)]
pub struct SpanningTree {
    root: Option<NodeIndex>,
    reversed: bool,
    predecessor: HashMap<NodeIndex, EdgeIndex>,
    chords: Vec<EdgeIndex>,
    unreachable: Vec<NodeIndex>,
}

impl SpanningTree {
    /// Forward tree rooted at the initial state.
    pub fn new(ts: &TransitionSystem) -> Self {
        Self::build(ts, ts.initial(), false)
    }

    pub fn with_root(ts: &TransitionSystem, root: NodeIndex) -> Self {
        Self::build(ts, Some(root), false)
    }

    /// Tree following arcs backwards, rooted at the initial state.
    pub fn new_reversed(ts: &TransitionSystem) -> Self {
        Self::build(ts, ts.initial(), true)
    }

    pub fn with_root_reversed(ts: &TransitionSystem, root: NodeIndex) -> Self {
        Self::build(ts, Some(root), true)
    }

    fn build(ts: &TransitionSystem, root: Option<NodeIndex>, reversed: bool) -> Self {
        let mut predecessor = HashMap::new();
        let mut chords = Vec::new();

        if let Some(root) = root {
            let mut queue = VecDeque::new();
            queue.push_back(root);
            while let Some(node) = queue.pop_front() {
                let arcs: Vec<(EdgeIndex, NodeIndex)> = if reversed {
                    ts.preset(node).map(|(arc, _, other)| (arc, other)).collect()
                } else {
                    ts.postset(node).map(|(arc, _, other)| (arc, other)).collect()
                };
                for (arc, other) in arcs {
                    if other == root || predecessor.contains_key(&other) {
                        chords.push(arc);
                    } else {
                        predecessor.insert(other, arc);
                        queue.push_back(other);
                    }
                }
            }
        }

        let unreachable = ts
            .states()
            .filter(|node| Some(*node) != root && !predecessor.contains_key(node))
            .collect();

        Self {
            root,
            reversed,
            predecessor,
            chords,
            unreachable,
        }
    }

    pub fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn is_reachable(&self, node: NodeIndex) -> bool {
        Some(node) == self.root || self.predecessor.contains_key(&node)
    }

    pub fn predecessor_edge(&self, node: NodeIndex) -> Option<EdgeIndex> {
        self.predecessor.get(&node).copied()
    }

    /// The node on the root side of the predecessor edge.
    pub fn predecessor_of(&self, ts: &TransitionSystem, node: NodeIndex) -> Option<NodeIndex> {
        self.predecessor_edge(node).map(|arc| {
            if self.reversed {
                ts.arc_target(arc)
            } else {
                ts.arc_source(arc)
            }
        })
    }

    /// Non-tree edges, in traversal discovery order.
    pub fn chords(&self) -> &[EdgeIndex] {
        &self.chords
    }

    pub fn unreachable_nodes(&self) -> &[NodeIndex] {
        &self.unreachable
    }

    /// The unique tree path from the root to the node; empty if unreachable.
    pub fn path_from_root(&self, ts: &TransitionSystem, node: NodeIndex) -> Vec<NodeIndex> {
        if !self.is_reachable(node) {
            return Vec::new();
        }
        let mut path = vec![node];
        let mut current = node;
        while let Some(previous) = self.predecessor_of(ts, current) {
            path.push(previous);
            current = previous;
        }
        path.reverse();
        path
    }
}
