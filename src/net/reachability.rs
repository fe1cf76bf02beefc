//! 可达图构造: 以标识为节点、迁移发生为边.
use std::collections::VecDeque;

use indexmap::map::Entry;
use indexmap::IndexMap;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;

use crate::net::core::Net;
use crate::net::index::TransitionId;
use crate::net::structure::Marking;

#[derive(Debug, Clone)]
pub struct RgState {
    pub index: usize,
    pub marking: Marking,
}

#[derive(Debug, Clone, Copy)]
pub struct ReachabilityConfig {
    /// Upper bound on explored markings. `None` means no limit.
    pub state_limit: Option<usize>,
}

impl Default for ReachabilityConfig {
    fn default() -> Self {
        Self { state_limit: None }
    }
}

#[derive(Debug, Clone)]
pub struct ReachabilityStats {
    pub state_count: usize,
    pub edge_count: usize,
    pub truncated: bool,
}

/// The marking graph of a net, built breadth first from the initial marking.
#[derive(Debug)]
pub struct ReachabilityGraph {
    pub graph: StableGraph<RgState, TransitionId>,
    pub initial: NodeIndex,
    pub markings: IndexMap<Marking, NodeIndex>,
    pub truncated: bool,
}

impl ReachabilityGraph {
    pub fn from_net(net: &Net) -> Self {
        Self::with_config(net, ReachabilityConfig::default())
    }

    pub fn with_config(net: &Net, config: ReachabilityConfig) -> Self {
        let mut graph = StableGraph::new();
        let mut markings: IndexMap<Marking, NodeIndex> = IndexMap::new();
        let mut queue = VecDeque::new();
        let mut truncated = false;

        let initial_marking = net.initial_marking();
        let initial = graph.add_node(RgState {
            index: 0,
            marking: initial_marking.clone(),
        });
        markings.insert(initial_marking, initial);
        queue.push_back(initial);

        while let Some(state_index) = queue.pop_front() {
            let current_marking = graph[state_index].marking.clone();
            for transition in net.enabled_transitions(&current_marking) {
                let next_marking = net
                    .fire_transition(&current_marking, transition)
                    .expect("enabled transition must fire");
                let target = match markings.entry(next_marking.clone()) {
                    Entry::Occupied(entry) => *entry.get(),
                    Entry::Vacant(entry) => {
                        if let Some(limit) = config.state_limit {
                            if graph.node_count() >= limit {
                                truncated = true;
                                continue;
                            }
                        }
                        let index = graph.add_node(RgState {
                            index: graph.node_count(),
                            marking: next_marking,
                        });
                        entry.insert(index);
                        queue.push_back(index);
                        index
                    }
                };
                graph.add_edge(state_index, target, transition);
            }
        }

        Self {
            graph,
            initial,
            markings,
            truncated,
        }
    }

    pub fn stats(&self) -> ReachabilityStats {
        ReachabilityStats {
            state_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            truncated: self.truncated,
        }
    }

    pub fn node(&self, index: NodeIndex) -> &RgState {
        &self.graph[index]
    }

    pub fn contains_marking(&self, marking: &Marking) -> bool {
        self.markings.contains_key(marking)
    }
}
