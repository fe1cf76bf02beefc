//! Labeled transition systems over a petgraph digraph.
//!
//! States are graph nodes, arcs carry an interned event id. The alphabet is
//! interned in first-seen order; that order is the vector dimension order
//! used by the synthesis engine.

use indexmap::IndexMap;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use thiserror::Error;

use crate::net::index::{EventId, Idx, IndexVec};

#[derive(Debug, Error)]
pub enum TsError {
    #[error("state '{0}' already exists")]
    DuplicateState(String),
    #[error("unknown label '{0}'")]
    UnknownLabel(String),
}

/// Raised when an operation needs a deterministic transition system.
#[derive(Debug, Error)]
#[error("state '{state}' has two outgoing arcs labeled '{label}'")]
pub struct NonDeterministicError {
    pub state: String,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct State {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Event {
    pub label: String,
    pub location: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TransitionSystem {
    name: String,
    graph: DiGraph<State, EventId>,
    initial: Option<NodeIndex>,
    state_index: IndexMap<String, NodeIndex>,
    events: IndexVec<EventId, Event>,
    event_index: IndexMap<String, EventId>,
}

impl TransitionSystem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            graph: DiGraph::new(),
            initial: None,
            state_index: IndexMap::new(),
            events: IndexVec::new(),
            event_index: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn create_state(&mut self, name: impl Into<String>) -> Result<NodeIndex, TsError> {
        let name = name.into();
        if self.state_index.contains_key(&name) {
            return Err(TsError::DuplicateState(name));
        }
        let node = self.graph.add_node(State { name: name.clone() });
        self.state_index.insert(name, node);
        Ok(node)
    }

    pub fn state_named(&self, name: &str) -> Option<NodeIndex> {
        self.state_index.get(name).copied()
    }

    pub fn state(&self, node: NodeIndex) -> &State {
        &self.graph[node]
    }

    pub fn state_name(&self, node: NodeIndex) -> &str {
        &self.graph[node].name
    }

    pub fn set_initial(&mut self, node: NodeIndex) {
        self.initial = Some(node);
    }

    pub fn initial(&self) -> Option<NodeIndex> {
        self.initial
    }

    /// Intern a label, assigning the next free event index on first use.
    pub fn ensure_event(&mut self, label: &str) -> EventId {
        if let Some(&id) = self.event_index.get(label) {
            return id;
        }
        let id = self.events.push(Event {
            label: label.to_owned(),
            location: None,
        });
        self.event_index.insert(label.to_owned(), id);
        id
    }

    pub fn set_event_location(
        &mut self,
        label: &str,
        location: Option<String>,
    ) -> Result<(), TsError> {
        match self.event_index.get(label) {
            Some(&id) => {
                self.events[id].location = location;
                Ok(())
            }
            None => Err(TsError::UnknownLabel(label.to_owned())),
        }
    }

    pub fn create_arc(
        &mut self,
        source: NodeIndex,
        target: NodeIndex,
        label: &str,
    ) -> EdgeIndex {
        let event = self.ensure_event(label);
        self.graph.add_edge(source, target, event)
    }

    pub fn event_id(&self, label: &str) -> Option<EventId> {
        self.event_index.get(label).copied()
    }

    pub fn event(&self, id: EventId) -> &Event {
        &self.events[id]
    }

    pub fn event_label(&self, id: EventId) -> &str {
        &self.events[id].label
    }

    pub fn events(&self) -> impl Iterator<Item = (EventId, &Event)> {
        self.events.iter_enumerated()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn states(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn state_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn arcs(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edge_indices()
    }

    pub fn arc_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn arc_source(&self, arc: EdgeIndex) -> NodeIndex {
        self.graph
            .edge_endpoints(arc)
            .expect("arc belongs to this graph")
            .0
    }

    pub fn arc_target(&self, arc: EdgeIndex) -> NodeIndex {
        self.graph
            .edge_endpoints(arc)
            .expect("arc belongs to this graph")
            .1
    }

    pub fn arc_event(&self, arc: EdgeIndex) -> EventId {
        self.graph[arc]
    }

    /// Outgoing arcs of a state as `(arc, event, target)` triples.
    pub fn postset(
        &self,
        node: NodeIndex,
    ) -> impl Iterator<Item = (EdgeIndex, EventId, NodeIndex)> + '_ {
        self.graph
            .edges(node)
            .map(|edge| (edge.id(), *edge.weight(), edge.target()))
    }

    /// Incoming arcs of a state as `(arc, event, source)` triples.
    pub fn preset(
        &self,
        node: NodeIndex,
    ) -> impl Iterator<Item = (EdgeIndex, EventId, NodeIndex)> + '_ {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .map(|edge| (edge.id(), *edge.weight(), edge.source()))
    }

    pub fn following_state(&self, node: NodeIndex, event: EventId) -> Option<NodeIndex> {
        self.postset(node)
            .find(|&(_, e, _)| e == event)
            .map(|(_, _, target)| target)
    }

    pub fn is_event_enabled(&self, node: NodeIndex, event: EventId) -> bool {
        self.following_state(node, event).is_some()
    }

    /// At most one outgoing arc per label in every state.
    pub fn is_deterministic(&self) -> bool {
        self.check_deterministic().is_ok()
    }

    pub fn check_deterministic(&self) -> Result<(), NonDeterministicError> {
        for node in self.states() {
            let mut seen = vec![false; self.event_count()];
            for (_, event, _) in self.postset(node) {
                if seen[event.index()] {
                    return Err(NonDeterministicError {
                        state: self.state_name(node).to_owned(),
                        label: self.event_label(event).to_owned(),
                    });
                }
                seen[event.index()] = true;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_interned_in_first_seen_order() {
        let mut ts = TransitionSystem::new("t");
        let s0 = ts.create_state("s0").unwrap();
        let s1 = ts.create_state("s1").unwrap();
        ts.create_arc(s0, s1, "b");
        ts.create_arc(s1, s0, "a");
        ts.create_arc(s0, s0, "b");

        assert_eq!(ts.event_count(), 2);
        assert_eq!(ts.event_label(EventId::new(0)), "b");
        assert_eq!(ts.event_label(EventId::new(1)), "a");
    }

    #[test]
    fn duplicate_state_rejected() {
        let mut ts = TransitionSystem::new("t");
        ts.create_state("s0").unwrap();
        assert!(matches!(
            ts.create_state("s0"),
            Err(TsError::DuplicateState(_))
        ));
    }

    #[test]
    fn determinism_check() {
        let mut ts = TransitionSystem::new("t");
        let s0 = ts.create_state("s0").unwrap();
        let s1 = ts.create_state("s1").unwrap();
        let s2 = ts.create_state("s2").unwrap();
        ts.create_arc(s0, s1, "a");
        assert!(ts.is_deterministic());
        ts.create_arc(s0, s2, "a");
        let err = ts.check_deterministic().unwrap_err();
        assert_eq!(err.state, "s0");
        assert_eq!(err.label, "a");
    }

    #[test]
    fn following_state_matches_label() {
        let mut ts = TransitionSystem::new("t");
        let s0 = ts.create_state("s0").unwrap();
        let s1 = ts.create_state("s1").unwrap();
        ts.create_arc(s0, s1, "a");
        let a = ts.event_id("a").unwrap();
        assert_eq!(ts.following_state(s0, a), Some(s1));
        assert_eq!(ts.following_state(s1, a), None);
        assert!(ts.is_event_enabled(s0, a));
    }
}
