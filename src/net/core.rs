//! 运行时: 可发生集与发生语义定义.
use std::fmt::{self, Write as FmtWrite};
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::net::incidence::Incidence;
use crate::net::index::{Idx, IndexVec, PlaceId, TransitionId};
use crate::net::structure::{Marking, Place, Transition, Weight};

#[derive(Debug, Error)]
pub enum FireError {
    #[error("transition {0:?} is out of bounds")]
    OutOfBounds(TransitionId),
    #[error("transition {0:?} is not enabled under the supplied marking")]
    NotEnabled(TransitionId),
}

#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub struct Net {
    pub name: String,
    pub places: IndexVec<PlaceId, Place>,
    pub transitions: IndexVec<TransitionId, Transition>,
    pub pre: Incidence<Weight>,
    pub post: Incidence<Weight>,
}

impl fmt::Debug for Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Net")
            .field("name", &self.name)
            .field("places", &self.places)
            .field("transitions", &self.transitions)
            .field("pre", &self.pre)
            .field("post", &self.post)
            .finish()
    }
}

impl Net {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            places: IndexVec::new(),
            transitions: IndexVec::new(),
            pre: Incidence::new(0, 0, 0),
            post: Incidence::new(0, 0, 0),
        }
    }

    pub fn add_place(&mut self, place: Place) -> PlaceId {
        let place_id = self.places.push(place);
        self.pre.push_place_with_default(0);
        self.post.push_place_with_default(0);
        place_id
    }

    pub fn add_transition(&mut self, transition: Transition) -> TransitionId {
        let transition_id = self.transitions.push(transition);
        self.pre.push_transition_with_default(0);
        self.post.push_transition_with_default(0);
        transition_id
    }

    /// 输入弧: place -> transition.
    pub fn set_input_weight(&mut self, place: PlaceId, transition: TransitionId, weight: Weight) {
        self.pre.set(place, transition, weight);
    }

    /// 输出弧: transition -> place.
    pub fn set_output_weight(&mut self, place: PlaceId, transition: TransitionId, weight: Weight) {
        self.post.set(place, transition, weight);
    }

    pub fn places_len(&self) -> usize {
        self.places.len()
    }

    pub fn transitions_len(&self) -> usize {
        self.transitions.len()
    }

    pub fn transition_named(&self, name: &str) -> Option<TransitionId> {
        self.transitions
            .iter_enumerated()
            .find(|(_, t)| t.name == name)
            .map(|(id, _)| id)
    }

    pub fn initial_marking(&self) -> Marking {
        Marking(self.places.iter().map(|p| p.tokens).collect())
    }

    pub fn enabled_transitions(&self, marking: &Marking) -> Vec<TransitionId> {
        (0..self.transitions_len())
            .map(TransitionId::from_usize)
            .filter(|&transition| self.is_transition_enabled(transition, marking))
            .collect()
    }

    pub fn is_transition_enabled(&self, transition: TransitionId, marking: &Marking) -> bool {
        if transition.index() >= self.transitions_len() {
            return false;
        }
        for place in self.places.indices() {
            if marking.tokens(place) < *self.pre.get(place, transition) {
                return false;
            }
        }
        true
    }

    pub fn fire_transition(
        &self,
        marking: &Marking,
        transition: TransitionId,
    ) -> Result<Marking, FireError> {
        if transition.index() >= self.transitions_len() {
            return Err(FireError::OutOfBounds(transition));
        }
        if !self.is_transition_enabled(transition, marking) {
            return Err(FireError::NotEnabled(transition));
        }

        let mut next = marking.clone();
        for place in self.places.indices() {
            let consumed = *self.pre.get(place, transition);
            let produced = *self.post.get(place, transition);
            let tokens = next.tokens_mut(place);
            *tokens = tokens
                .checked_sub(consumed)
                .expect("enabled transition must have sufficient tokens")
                + produced;
        }
        Ok(next)
    }

    pub fn to_dot(&self) -> String {
        let mut dot = String::new();
        let _ = writeln!(&mut dot, "digraph PetriNet {{");
        let _ = writeln!(&mut dot, "    rankdir=LR;");
        let _ = writeln!(&mut dot, "    node [fontname=\"Helvetica\"];");

        for (place_id, place) in self.places.iter_enumerated() {
            let node_id = format!("place_{}", place_id.index());
            let label = format!("{}\\n{}", escape_label(&place.name), place.tokens);
            let _ = writeln!(
                &mut dot,
                "    {} [label=\"{}\", shape=circle, style=filled, fillcolor=\"#e3f2fd\"];",
                node_id, label
            );
        }

        for (transition_id, transition) in self.transitions.iter_enumerated() {
            let node_id = format!("trans_{}", transition_id.index());
            let _ = writeln!(
                &mut dot,
                "    {} [label=\"{}\", shape=box, style=filled, fillcolor=\"#ffe0b2\"];",
                node_id,
                escape_label(&transition.name)
            );
        }

        for place_id in self.places.indices() {
            let place_node = format!("place_{}", place_id.index());
            for (idx, weight) in self.pre.row(place_id).iter().enumerate() {
                if *weight == 0 {
                    continue;
                }
                let transition_node = format!("trans_{}", idx);
                if *weight == 1 {
                    let _ = writeln!(&mut dot, "    {} -> {};", place_node, transition_node);
                } else {
                    let _ = writeln!(
                        &mut dot,
                        "    {} -> {} [label=\"{}\"];",
                        place_node, transition_node, weight
                    );
                }
            }
            for (idx, weight) in self.post.row(place_id).iter().enumerate() {
                if *weight == 0 {
                    continue;
                }
                let transition_node = format!("trans_{}", idx);
                if *weight == 1 {
                    let _ = writeln!(&mut dot, "    {} -> {};", transition_node, place_node);
                } else {
                    let _ = writeln!(
                        &mut dot,
                        "    {} -> {} [label=\"{}\"];",
                        transition_node, place_node, weight
                    );
                }
            }
        }

        let _ = writeln!(&mut dot, "}}");
        dot
    }

    pub fn write_dot<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_dot())
    }
}

fn escape_label(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_place_and_transition_updates_incidence() {
        let mut net = Net::empty("t");
        let p = net.add_place(Place::new("p", 1));
        let t = net.add_transition(Transition::new("t"));

        net.set_input_weight(p, t, 1);
        net.set_output_weight(p, t, 1);

        assert_eq!(net.places_len(), 1);
        assert_eq!(net.transitions_len(), 1);
        assert_eq!(*net.pre.get(p, t), 1);
        assert_eq!(*net.post.get(p, t), 1);
    }

    #[test]
    fn fire_moves_tokens() {
        let mut net = Net::empty("t");
        let p0 = net.add_place(Place::new("p0", 1));
        let p1 = net.add_place(Place::new("p1", 0));
        let t0 = net.add_transition(Transition::new("t0"));
        net.set_input_weight(p0, t0, 1);
        net.set_output_weight(p1, t0, 1);

        let marking = net.initial_marking();
        assert_eq!(net.enabled_transitions(&marking), vec![t0]);
        let next = net.fire_transition(&marking, t0).unwrap();
        assert_eq!(next.tokens(p0), 0);
        assert_eq!(next.tokens(p1), 1);
        assert!(matches!(
            net.fire_transition(&next, t0),
            Err(FireError::NotEnabled(_))
        ));
    }
}
