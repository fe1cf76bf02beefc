//! Regions: candidate places of the synthesized net.
//!
//! A region assigns each event a forward and a backward weight plus an
//! initial marking. The marking after a path only depends on the path's
//! Parikh vector, so consistency over the whole transition system reduces
//! to linear conditions on the weights.

use serde::{Deserialize, Serialize};

use crate::net::index::{EventId, Idx, IndexVec};
use crate::synth::utility::RegionUtility;
use crate::synth::UnreachableError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    forward: IndexVec<EventId, i64>,
    backward: IndexVec<EventId, i64>,
    initial_marking: i64,
}

impl Region {
    pub fn new(
        forward: IndexVec<EventId, i64>,
        backward: IndexVec<EventId, i64>,
        initial_marking: i64,
    ) -> Self {
        assert_eq!(forward.len(), backward.len());
        debug_assert!(forward.iter().all(|&w| w >= 0));
        debug_assert!(backward.iter().all(|&w| w >= 0));
        debug_assert!(initial_marking >= 0);
        Self {
            forward,
            backward,
            initial_marking,
        }
    }

    pub fn zero(events: usize) -> Self {
        Self {
            forward: IndexVec::from_elem(0, events),
            backward: IndexVec::from_elem(0, events),
            initial_marking: 0,
        }
    }

    /// Split an effective weight vector by sign into a pure region with
    /// initial marking zero.
    pub fn pure_from_effective(effective: &[i64]) -> Self {
        Self {
            forward: effective.iter().map(|&w| w.max(0)).collect(),
            backward: effective.iter().map(|&w| (-w).max(0)).collect(),
            initial_marking: 0,
        }
    }

    pub fn event_count(&self) -> usize {
        self.forward.len()
    }

    pub fn initial_marking(&self) -> i64 {
        self.initial_marking
    }

    pub fn forward_weight(&self, event: EventId) -> i64 {
        self.forward[event]
    }

    pub fn backward_weight(&self, event: EventId) -> i64 {
        self.backward[event]
    }

    pub fn effective_weight(&self, event: EventId) -> i64 {
        self.forward[event] - self.backward[event]
    }

    /// No event both produces and consumes.
    pub fn is_pure(&self) -> bool {
        self.forward
            .iter()
            .zip(self.backward.iter())
            .all(|(&f, &b)| f == 0 || b == 0)
    }

    /// All weights are at most one.
    pub fn is_plain(&self) -> bool {
        self.forward.iter().all(|&f| f <= 1) && self.backward.iter().all(|&b| b <= 1)
    }

    /// `initial_marking + Σ (forward - backward)·vector`.
    pub fn evaluate_parikh_vector(&self, vector: &[i64]) -> i64 {
        debug_assert_eq!(vector.len(), self.event_count());
        self.initial_marking
            + self
                .forward
                .indices()
                .map(|event| self.effective_weight(event) * vector[event.index()])
                .sum::<i64>()
    }

    /// The marking this region assigns to a state of the underlying
    /// transition system.
    pub fn marking_for_state(
        &self,
        utility: &RegionUtility<'_>,
        state: petgraph::graph::NodeIndex,
    ) -> Result<i64, UnreachableError> {
        Ok(self.evaluate_parikh_vector(utility.reaching_parikh_vector(state)?))
    }

    /// Integer linear combination of regions, as a pure region over the
    /// combined effective weights.
    pub fn linear_combination(events: usize, terms: &[(i64, &Region)]) -> Self {
        let mut effective = vec![0i64; events];
        for &(factor, region) in terms {
            debug_assert_eq!(region.event_count(), events);
            for event in region.forward.indices() {
                effective[event.index()] += factor * region.effective_weight(event);
            }
        }
        Self::pure_from_effective(&effective)
    }

    /// The smallest initial marking that keeps every reachable state
    /// non-negative and every occurring event enabled where it occurs.
    pub fn with_normal_initial_marking(&self, utility: &RegionUtility<'_>) -> Self {
        let ts = utility.ts();
        let mut required = 0i64;

        for state in ts.states() {
            let Ok(vector) = utility.reaching_parikh_vector(state) else {
                continue;
            };
            let effect: i64 = self
                .forward
                .indices()
                .map(|event| self.effective_weight(event) * vector[event.index()])
                .sum();
            required = required.max(-effect);
            for (_, event, _) in ts.postset(state) {
                required = required.max(self.backward[event] - effect);
            }
        }

        Self {
            forward: self.forward.clone(),
            backward: self.backward.clone(),
            initial_marking: required,
        }
    }

    /// Raise the event's forward and backward weight equally until the
    /// backward weight exceeds the marking of the given state. This keeps
    /// the effective weights, so consistency is unaffected.
    pub fn make_event_disabled(
        &self,
        utility: &RegionUtility<'_>,
        state: petgraph::graph::NodeIndex,
        event: EventId,
    ) -> Result<Self, UnreachableError> {
        let marking = self.marking_for_state(utility, state)?;
        let needed = marking + 1;
        if self.backward[event] >= needed {
            return Ok(self.clone());
        }
        let delta = needed - self.backward[event];
        let mut forward = self.forward.clone();
        let mut backward = self.backward.clone();
        forward[event] += delta;
        backward[event] += delta;
        Ok(Self {
            forward,
            backward,
            initial_marking: self.initial_marking,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_split_by_sign() {
        let region = Region::pure_from_effective(&[2, -1, 0]);
        let a = EventId::new(0);
        let b = EventId::new(1);
        let c = EventId::new(2);
        assert_eq!(region.forward_weight(a), 2);
        assert_eq!(region.backward_weight(a), 0);
        assert_eq!(region.forward_weight(b), 0);
        assert_eq!(region.backward_weight(b), 1);
        assert_eq!(region.effective_weight(c), 0);
        assert!(region.is_pure());
        assert!(!region.is_plain());
    }

    #[test]
    fn evaluation_is_linear() {
        let region = Region::new(
            IndexVec::from(vec![1, 0]),
            IndexVec::from(vec![0, 2]),
            3,
        );
        assert_eq!(region.evaluate_parikh_vector(&[0, 0]), 3);
        assert_eq!(region.evaluate_parikh_vector(&[2, 1]), 3 + 2 - 2);
    }

    #[test]
    fn linear_combination_sums_effective_weights() {
        let r1 = Region::pure_from_effective(&[1, -1]);
        let r2 = Region::pure_from_effective(&[0, 1]);
        let combined = Region::linear_combination(2, &[(2, &r1), (3, &r2)]);
        let a = EventId::new(0);
        let b = EventId::new(1);
        assert_eq!(combined.effective_weight(a), 2);
        assert_eq!(combined.effective_weight(b), 1);
        assert!(combined.is_pure());
    }
}
