//! Event indexing and Parikh vectors for one transition system.
//!
//! The spanning tree fixes a unique path from the initial state to every
//! reachable state; the Parikh vector of that path is the state's
//! reaching vector. Chords of the tree yield the equations every region
//! must satisfy, and the nullspace of those equations is the region basis.

use std::collections::HashMap;

use once_cell::sync::OnceCell;
use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::net::index::{EventId, Idx};
use crate::synth::equations::EquationSystem;
use crate::synth::region::Region;
use crate::synth::spanning_tree::SpanningTree;
use crate::synth::UnreachableError;
use crate::ts::system::TransitionSystem;

pub struct RegionUtility<'a> {
    ts: &'a TransitionSystem,
    tree: SpanningTree,
    parikh: HashMap<NodeIndex, Vec<i64>>,
    basis: OnceCell<Vec<Region>>,
}

impl<'a> RegionUtility<'a> {
    pub fn new(ts: &'a TransitionSystem) -> Self {
        let tree = SpanningTree::new(ts);
        let parikh = reaching_vectors(ts, &tree);
        Self {
            ts,
            tree,
            parikh,
            basis: OnceCell::new(),
        }
    }

    pub fn ts(&self) -> &'a TransitionSystem {
        self.ts
    }

    pub fn tree(&self) -> &SpanningTree {
        &self.tree
    }

    pub fn event_count(&self) -> usize {
        self.ts.event_count()
    }

    pub fn event_index(&self, label: &str) -> Option<EventId> {
        self.ts.event_id(label)
    }

    pub fn is_reachable(&self, state: NodeIndex) -> bool {
        self.tree.is_reachable(state)
    }

    /// The Parikh vector of the tree path from the initial state.
    pub fn reaching_parikh_vector(
        &self,
        state: NodeIndex,
    ) -> Result<&[i64], UnreachableError> {
        self.parikh
            .get(&state)
            .map(Vec::as_slice)
            .ok_or_else(|| UnreachableError {
                state: self.ts.state_name(state).to_owned(),
            })
    }

    /// `Ψ(source) + e_label - Ψ(target)` for an arc. Zero exactly when the
    /// arc is consistent with every region.
    pub fn parikh_vector_for_edge(&self, arc: EdgeIndex) -> Result<Vec<i64>, UnreachableError> {
        let source = self.reaching_parikh_vector(self.ts.arc_source(arc))?;
        let target = self.reaching_parikh_vector(self.ts.arc_target(arc))?;
        let event = self.ts.arc_event(arc).index();
        Ok((0..self.event_count())
            .map(|idx| source[idx] - target[idx] + i64::from(idx == event))
            .collect())
    }

    /// Basis of abstract regions. Every region of the transition system is
    /// a linear combination of these. Computed once, then cached.
    pub fn region_basis(&self) -> &[Region] {
        self.basis.get_or_init(|| {
            let mut system = EquationSystem::new(self.event_count());
            // The events on a fundamental cycle must have no net effect on
            // any region, one equation per chord.
            for &chord in self.tree.chords() {
                let vector = self
                    .parikh_vector_for_edge(chord)
                    .expect("chord endpoints are reachable by construction");
                system.add_equation(&vector);
            }
            system
                .find_basis()
                .into_iter()
                .map(|vector| Region::pure_from_effective(&vector))
                .collect()
        })
    }
}

fn reaching_vectors(
    ts: &TransitionSystem,
    tree: &SpanningTree,
) -> HashMap<NodeIndex, Vec<i64>> {
    let mut parikh: HashMap<NodeIndex, Vec<i64>> = HashMap::new();
    let Some(root) = tree.root() else {
        return parikh;
    };
    parikh.insert(root, vec![0; ts.event_count()]);

    for node in ts.states() {
        if !tree.is_reachable(node) || parikh.contains_key(&node) {
            continue;
        }
        // Walk up to the nearest state with a known vector, then unwind.
        let mut chain = Vec::new();
        let mut current = node;
        while !parikh.contains_key(&current) {
            let edge = tree
                .predecessor_edge(current)
                .expect("reachable non-root state has a predecessor edge");
            chain.push((current, edge));
            current = ts.arc_source(edge);
        }
        for (state, edge) in chain.into_iter().rev() {
            let mut vector = parikh[&ts.arc_source(edge)].clone();
            vector[ts.arc_event(edge).index()] += 1;
            parikh.insert(state, vector);
        }
    }

    parikh
}
