//! Pure regions as integer combinations of the basis.

use petgraph::graph::NodeIndex;

use crate::net::index::EventId;
use crate::synth::inequalities::{InequalitySystem, Relation};
use crate::synth::properties::PNProperties;
use crate::synth::region::Region;
use crate::synth::separation::{
    is_trivial_location_map, separate_states_via_basis, LocationMap, Separation,
    UnsupportedProperties,
};
use crate::synth::utility::RegionUtility;

/// Event/state separation is solved over the basis coefficients: the
/// region must climb strictly from the state to every reachable state, so
/// that after normalizing the initial marking the event's backward weight
/// is out of reach exactly there.
pub struct BasicPureSeparation<'a> {
    utility: &'a RegionUtility<'a>,
    basis: &'a [Region],
}

impl<'a> BasicPureSeparation<'a> {
    pub fn new(
        utility: &'a RegionUtility<'a>,
        basis: &'a [Region],
        properties: &PNProperties,
        locations: &LocationMap,
    ) -> Result<Self, UnsupportedProperties> {
        if *properties != PNProperties::new().pure() || !is_trivial_location_map(locations) {
            return Err(UnsupportedProperties);
        }
        Ok(Self { utility, basis })
    }
}

impl Separation for BasicPureSeparation<'_> {
    fn name(&self) -> &'static str {
        "basic-pure"
    }

    fn separate_states(&self, state: NodeIndex, other_state: NodeIndex) -> Option<Region> {
        separate_states_via_basis(self.utility, self.basis, state, other_state)
    }

    fn separate_event(&self, state: NodeIndex, event: EventId) -> Option<Region> {
        let ts = self.utility.ts();
        if !self.utility.is_reachable(state) {
            return None;
        }
        let state_vector = self.utility.reaching_parikh_vector(state).ok()?;

        // One row per reachable state t:
        //   sum_i x_i (b_i(t) - b_i(state) - b_i[event]) > 0
        // which is "r(t) > r(state) + w(event)" for the combined region.
        let mut system = InequalitySystem::new(self.basis.len());
        for target in ts.states() {
            let Ok(target_vector) = self.utility.reaching_parikh_vector(target) else {
                continue;
            };
            let coefficients: Vec<i64> = self
                .basis
                .iter()
                .map(|region| {
                    region.evaluate_parikh_vector(target_vector)
                        - region.evaluate_parikh_vector(state_vector)
                        - region.effective_weight(event)
                })
                .collect();
            system.add(
                &coefficients,
                Relation::Greater,
                0,
                format!(
                    "r({}) > r({}) + w({})",
                    ts.state_name(target),
                    ts.state_name(state),
                    ts.event_label(event)
                ),
            );
        }

        let solution = system.find_solution()?;
        let terms: Vec<(i64, &Region)> = solution.into_iter().zip(self.basis).collect();
        Some(
            Region::linear_combination(self.utility.event_count(), &terms)
                .with_normal_initial_marking(self.utility),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::separation::is_separating_region_event;
    use crate::ts::system::TransitionSystem;

    fn word_ab() -> TransitionSystem {
        let mut ts = TransitionSystem::new("ab");
        let s0 = ts.create_state("s0").unwrap();
        let s1 = ts.create_state("s1").unwrap();
        let s2 = ts.create_state("s2").unwrap();
        ts.set_initial(s0);
        ts.create_arc(s0, s1, "a");
        ts.create_arc(s1, s2, "b");
        ts
    }

    #[test]
    fn requires_exactly_pure() {
        let ts = word_ab();
        let utility = RegionUtility::new(&ts);
        let basis = utility.region_basis();
        let locations = crate::synth::separation::location_map(&ts).unwrap();
        assert!(BasicPureSeparation::new(
            &utility,
            basis,
            &PNProperties::new(),
            &locations
        )
        .is_err());
        assert!(BasicPureSeparation::new(
            &utility,
            basis,
            &PNProperties::new().pure().safe(),
            &locations
        )
        .is_err());
        assert!(BasicPureSeparation::new(
            &utility,
            basis,
            &PNProperties::new().pure(),
            &locations
        )
        .is_ok());
    }

    #[test]
    fn disables_b_in_the_initial_state() {
        let ts = word_ab();
        let utility = RegionUtility::new(&ts);
        let basis = utility.region_basis();
        let locations = crate::synth::separation::location_map(&ts).unwrap();
        let separation =
            BasicPureSeparation::new(&utility, basis, &PNProperties::new().pure(), &locations)
                .unwrap();

        let s0 = ts.state_named("s0").unwrap();
        let b = ts.event_id("b").unwrap();
        let region = separation.separate_event(s0, b).expect("b is separable");
        assert!(region.is_pure());
        assert!(is_separating_region_event(&utility, &region, s0, b));
    }

    #[test]
    fn separates_the_chain_states() {
        let ts = word_ab();
        let utility = RegionUtility::new(&ts);
        let basis = utility.region_basis();
        let locations = crate::synth::separation::location_map(&ts).unwrap();
        let separation =
            BasicPureSeparation::new(&utility, basis, &PNProperties::new().pure(), &locations)
                .unwrap();

        let s0 = ts.state_named("s0").unwrap();
        let s2 = ts.state_named("s2").unwrap();
        let region = separation.separate_states(s0, s2).expect("separable");
        let m0 = region.marking_for_state(&utility, s0).unwrap();
        let m2 = region.marking_for_state(&utility, s2).unwrap();
        assert_ne!(m0, m2);
    }
}
