//! Limited unfolding of a deterministic transition system.
//!
//! Depth-first copy of the input: a state reached again on the current path
//! from the root closes a loop to its existing copy, any other repeat gets a
//! fresh copy. The mapping back to the original states is returned as a side
//! table.

use std::collections::HashMap;

use petgraph::graph::NodeIndex;

use crate::net::index::EventId;
use crate::ts::system::{NonDeterministicError, TransitionSystem};

#[derive(Debug)]
pub struct Unfolding {
    pub ts: TransitionSystem,
    /// Unfolded state to the original state it was copied from.
    pub origin: HashMap<NodeIndex, NodeIndex>,
}

struct Frame {
    original: NodeIndex,
    copy: NodeIndex,
    arcs: Vec<(EventId, NodeIndex)>,
    next: usize,
}

pub fn limited_unfolding(ts: &TransitionSystem) -> Result<Unfolding, NonDeterministicError> {
    ts.check_deterministic()?;

    let mut unfolding = TransitionSystem::new(format!("Limited unfolding of {}", ts.name()));
    let mut origin = HashMap::new();
    let Some(initial) = ts.initial() else {
        return Ok(Unfolding {
            ts: unfolding,
            origin,
        });
    };

    // Copies of the states on the current path from the root.
    let mut on_path: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut counter = 0usize;

    let root_copy = unfolding
        .create_state(format!("u{counter}"))
        .expect("generated state names are unique");
    unfolding.set_initial(root_copy);
    origin.insert(root_copy, initial);
    on_path.insert(initial, root_copy);

    let mut stack = vec![Frame {
        original: initial,
        copy: root_copy,
        arcs: ts.postset(initial).map(|(_, e, t)| (e, t)).collect(),
        next: 0,
    }];

    while !stack.is_empty() {
        let top = stack.len() - 1;
        if stack[top].next < stack[top].arcs.len() {
            let (event, target) = stack[top].arcs[stack[top].next];
            stack[top].next += 1;
            let source_copy = stack[top].copy;
            let label = ts.event_label(event).to_owned();

            if let Some(&target_copy) = on_path.get(&target) {
                unfolding.create_arc(source_copy, target_copy, &label);
            } else {
                counter += 1;
                let target_copy = unfolding
                    .create_state(format!("u{counter}"))
                    .expect("generated state names are unique");
                origin.insert(target_copy, target);
                on_path.insert(target, target_copy);
                unfolding.create_arc(source_copy, target_copy, &label);
                stack.push(Frame {
                    original: target,
                    copy: target_copy,
                    arcs: ts.postset(target).map(|(_, e, t)| (e, t)).collect(),
                    next: 0,
                });
            }
        } else {
            let original = stack[top].original;
            on_path.remove(&original);
            stack.pop();
        }
    }

    Ok(Unfolding {
        ts: unfolding,
        origin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfolds_diamond_into_tree() {
        // s0 goes to s1 via a and via b to s2, both reach s3.
        let mut ts = TransitionSystem::new("diamond");
        let s0 = ts.create_state("s0").unwrap();
        let s1 = ts.create_state("s1").unwrap();
        let s2 = ts.create_state("s2").unwrap();
        let s3 = ts.create_state("s3").unwrap();
        ts.set_initial(s0);
        ts.create_arc(s0, s1, "a");
        ts.create_arc(s0, s2, "b");
        ts.create_arc(s1, s3, "b");
        ts.create_arc(s2, s3, "a");

        let unfolding = limited_unfolding(&ts).unwrap();
        // s3 is not on a loop, so the two paths lead to two separate copies.
        assert_eq!(unfolding.ts.state_count(), 5);
        assert_eq!(unfolding.ts.arc_count(), 4);
        let copies_of_s3 = unfolding
            .origin
            .values()
            .filter(|&&original| original == s3)
            .count();
        assert_eq!(copies_of_s3, 2);
    }

    #[test]
    fn loop_on_current_path_is_kept() {
        let mut ts = TransitionSystem::new("loop");
        let s0 = ts.create_state("s0").unwrap();
        let s1 = ts.create_state("s1").unwrap();
        ts.set_initial(s0);
        ts.create_arc(s0, s1, "a");
        ts.create_arc(s1, s0, "b");

        let unfolding = limited_unfolding(&ts).unwrap();
        assert_eq!(unfolding.ts.state_count(), 2);
        assert_eq!(unfolding.ts.arc_count(), 2);
        let initial = unfolding.ts.initial().unwrap();
        let b = unfolding.ts.event_id("b").unwrap();
        let a = unfolding.ts.event_id("a").unwrap();
        let next = unfolding.ts.following_state(initial, a).unwrap();
        assert_eq!(unfolding.ts.following_state(next, b), Some(initial));
    }

    #[test]
    fn nondeterministic_input_is_rejected() {
        let mut ts = TransitionSystem::new("bad");
        let s0 = ts.create_state("s0").unwrap();
        let s1 = ts.create_state("s1").unwrap();
        let s2 = ts.create_state("s2").unwrap();
        ts.set_initial(s0);
        ts.create_arc(s0, s1, "a");
        ts.create_arc(s0, s2, "a");
        assert!(limited_unfolding(&ts).is_err());
    }
}
