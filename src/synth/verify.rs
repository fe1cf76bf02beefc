//! Post-synthesis checks.
//!
//! Everything here is read-only over the net and the source transition
//! system: structural property checks, marking simulation for bounds, and
//! the reachability-graph isomorphism that synthesis promises.

use std::collections::{HashMap, VecDeque};

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use rayon::prelude::*;

use crate::net::core::Net;
use crate::net::index::{Idx, PlaceId, TransitionId};
use crate::net::reachability::{ReachabilityConfig, ReachabilityGraph};
use crate::synth::region::Region;
use crate::synth::separation::location_map;
use crate::synth::utility::RegionUtility;
use crate::ts::system::TransitionSystem;

/// State budget for marking simulations.
const SIMULATION_LIMIT: usize = 10_000;

/// A region is valid when no reachable state gets a negative marking and
/// every occurring event finds its backward weight.
pub fn region_is_valid(utility: &RegionUtility<'_>, region: &Region) -> bool {
    let ts = utility.ts();
    let states: Vec<NodeIndex> = ts
        .states()
        .filter(|&state| utility.is_reachable(state))
        .collect();
    states.par_iter().all(|&state| {
        let Ok(marking) = region.marking_for_state(utility, state) else {
            return false;
        };
        marking >= 0
            && ts
                .postset(state)
                .all(|(_, event, _)| marking >= region.backward_weight(event))
    })
}

/// Is the net's reachability graph isomorphic to the transition system,
/// preserving arc labels and the initial state?
pub fn reachability_isomorphic(net: &Net, ts: &TransitionSystem) -> bool {
    let Some(ts_initial) = ts.initial() else {
        return false;
    };

    // Transition of the net carrying each event label.
    let mut transition_of_event: Vec<TransitionId> = Vec::with_capacity(ts.event_count());
    for (_, event) in ts.events() {
        match net.transition_named(&event.label) {
            Some(transition) => transition_of_event.push(transition),
            None => return false,
        }
    }

    let rg = ReachabilityGraph::with_config(
        net,
        ReachabilityConfig {
            state_limit: Some(ts.state_count() + 1),
        },
    );
    if rg.truncated || rg.graph.node_count() != ts.state_count() {
        return false;
    }

    // Both sides are deterministic, so one synchronized traversal decides.
    let mut forward: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut backward: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut queue = VecDeque::new();
    forward.insert(ts_initial, rg.initial);
    backward.insert(rg.initial, ts_initial);
    queue.push_back(ts_initial);

    while let Some(state) = queue.pop_front() {
        let rg_node = forward[&state];
        let mut rg_out: HashMap<usize, NodeIndex> = HashMap::new();
        for edge in rg.graph.edges(rg_node) {
            if rg_out.insert(edge.weight().index(), edge.target()).is_some() {
                return false;
            }
        }

        let mut degree = 0;
        for (_, event, ts_target) in ts.postset(state) {
            degree += 1;
            let transition = transition_of_event[event.index()];
            let Some(&rg_target) = rg_out.get(&transition.index()) else {
                return false;
            };
            match forward.get(&ts_target) {
                Some(&mapped) => {
                    if mapped != rg_target {
                        return false;
                    }
                }
                None => {
                    if backward.contains_key(&rg_target) {
                        return false;
                    }
                    forward.insert(ts_target, rg_target);
                    backward.insert(rg_target, ts_target);
                    queue.push_back(ts_target);
                }
            }
        }
        if degree != rg_out.len() {
            return false;
        }
    }

    forward.len() == ts.state_count()
}

/// No transition both consumes from and produces into the same place.
pub fn is_pure(net: &Net) -> bool {
    net.places.indices().all(|place| {
        net.transitions.indices().all(|transition| {
            *net.pre.get(place, transition) == 0 || *net.post.get(place, transition) == 0
        })
    })
}

/// All arc weights are at most one.
pub fn is_plain(net: &Net) -> bool {
    net.places.indices().all(|place| {
        net.transitions.indices().all(|transition| {
            *net.pre.get(place, transition) <= 1 && *net.post.get(place, transition) <= 1
        })
    })
}

/// The largest token count any place reaches, or `None` when the
/// simulation budget ran out.
pub fn k_bound(net: &Net) -> Option<u64> {
    let rg = ReachabilityGraph::with_config(
        net,
        ReachabilityConfig {
            state_limit: Some(SIMULATION_LIMIT),
        },
    );
    if rg.truncated {
        return None;
    }
    Some(
        rg.markings
            .keys()
            .flat_map(|marking| marking.iter().map(|(_, &tokens)| tokens))
            .max()
            .unwrap_or(0),
    )
}

pub fn is_k_bounded(net: &Net, k: u64) -> bool {
    k_bound(net).is_some_and(|bound| bound <= k)
}

fn consumers(net: &Net, place: PlaceId) -> Vec<TransitionId> {
    net.transitions
        .indices()
        .filter(|&transition| *net.pre.get(place, transition) > 0)
        .collect()
}

fn producers(net: &Net, place: PlaceId) -> Vec<TransitionId> {
    net.transitions
        .indices()
        .filter(|&transition| *net.post.get(place, transition) > 0)
        .collect()
}

/// Every place has at most one consumer and at most one producer.
pub fn is_t_net(net: &Net) -> bool {
    net.places
        .indices()
        .all(|place| consumers(net, place).len() <= 1 && producers(net, place).len() <= 1)
}

/// Every place has at most one consumer.
pub fn is_output_nonbranching(net: &Net) -> bool {
    net.places
        .indices()
        .all(|place| consumers(net, place).len() <= 1)
}

/// Every place has at most one consumer, or all its consumers are also
/// producers.
pub fn is_conflict_free(net: &Net) -> bool {
    net.places.indices().all(|place| {
        let consuming = consumers(net, place);
        consuming.len() <= 1 || {
            let producing = producers(net, place);
            consuming
                .iter()
                .all(|transition| producing.contains(transition))
        }
    })
}

/// All transitions consuming from one place must agree on their event's
/// location.
pub fn is_distributed_implementation(ts: &TransitionSystem, net: &Net) -> bool {
    let Ok(locations) = location_map(ts) else {
        return false;
    };
    for place in net.places.indices() {
        let mut location: Option<&str> = None;
        for transition in consumers(net, place) {
            let label = &net.transitions[transition].name;
            let Some(event) = ts.event_id(label) else {
                continue;
            };
            let Some(event_location) = locations[event].as_deref() else {
                continue;
            };
            match location {
                None => location = Some(event_location),
                Some(existing) => {
                    if existing != event_location {
                        return false;
                    }
                }
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::structure::{Place, Transition};

    fn cycle_net() -> Net {
        let mut net = Net::empty("cycle");
        let p0 = net.add_place(Place::new("p0", 1));
        let p1 = net.add_place(Place::new("p1", 0));
        let t0 = net.add_transition(Transition::new("a"));
        let t1 = net.add_transition(Transition::new("b"));
        net.set_input_weight(p0, t0, 1);
        net.set_output_weight(p1, t0, 1);
        net.set_input_weight(p1, t1, 1);
        net.set_output_weight(p0, t1, 1);
        net
    }

    fn cycle_ts() -> TransitionSystem {
        let mut ts = TransitionSystem::new("cycle");
        let s0 = ts.create_state("s0").unwrap();
        let s1 = ts.create_state("s1").unwrap();
        ts.set_initial(s0);
        ts.create_arc(s0, s1, "a");
        ts.create_arc(s1, s0, "b");
        ts
    }

    #[test]
    fn cycle_net_matches_cycle_ts() {
        assert!(reachability_isomorphic(&cycle_net(), &cycle_ts()));
    }

    #[test]
    fn extra_marking_breaks_isomorphism() {
        let mut net = cycle_net();
        *net.places.get_mut(PlaceId::new(0)).unwrap() = Place::new("p0", 2);
        assert!(!reachability_isomorphic(&net, &cycle_ts()));
    }

    #[test]
    fn structural_checks_on_the_cycle_net() {
        let net = cycle_net();
        assert!(is_pure(&net));
        assert!(is_plain(&net));
        assert!(is_t_net(&net));
        assert!(is_output_nonbranching(&net));
        assert!(is_conflict_free(&net));
        assert_eq!(k_bound(&net), Some(1));
        assert!(is_k_bounded(&net, 1));
        assert!(!is_k_bounded(&net, 0));
    }

    #[test]
    fn self_loop_is_impure_but_conflict_free() {
        let mut net = Net::empty("loop");
        let p0 = net.add_place(Place::new("p0", 1));
        let t0 = net.add_transition(Transition::new("a"));
        let t1 = net.add_transition(Transition::new("b"));
        net.set_input_weight(p0, t0, 1);
        net.set_output_weight(p0, t0, 1);
        net.set_input_weight(p0, t1, 1);
        net.set_output_weight(p0, t1, 1);
        assert!(!is_pure(&net));
        assert!(!is_output_nonbranching(&net));
        assert!(is_conflict_free(&net));
    }

    #[test]
    fn region_validity_over_a_chain() {
        let mut ts = TransitionSystem::new("ab");
        let s0 = ts.create_state("s0").unwrap();
        let s1 = ts.create_state("s1").unwrap();
        let s2 = ts.create_state("s2").unwrap();
        ts.set_initial(s0);
        ts.create_arc(s0, s1, "a");
        ts.create_arc(s1, s2, "b");
        let utility = RegionUtility::new(&ts);

        let valid = Region::pure_from_effective(&[-1, 0]).with_normal_initial_marking(&utility);
        assert!(region_is_valid(&utility, &valid));

        // Consuming on 'a' without any tokens is invalid.
        let invalid = Region::pure_from_effective(&[-1, 0]);
        assert!(!region_is_valid(&utility, &invalid));
    }
}
