//! Impure regions as integer combinations of the basis.

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

/// Like the pure variant, but the combined region only has to climb above
/// the state at the sources of the event's arcs. Raising the event's
/// forward and backward weight together afterwards disables it in the
/// state without touching the effective weights.
pub struct BasicImpureSeparation<'a> {
    utility: &'a RegionUtility<'a>,
    basis: &'a [Region],
}

impl<'a> BasicImpureSeparation<'a> {
    pub fn new(
        utility: &'a RegionUtility<'a>,
        basis: &'a [Region],
        properties: &PNProperties,
        locations: &LocationMap,
    ) -> Result<Self, UnsupportedProperties> {
        if !properties.is_trivial() || !is_trivial_location_map(locations) {
            return Err(UnsupportedProperties);
        }
        Ok(Self { utility, basis })
    }
}

impl Separation for BasicImpureSeparation<'_> {
    fn name(&self) -> &'static str {
        "basic-impure"
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

        // One row per reachable source of an arc labeled with the event:
        // the region must assign it a strictly larger marking than the
        // state to disable.
        let mut system = InequalitySystem::new(self.basis.len());
        for arc in ts.arcs() {
            if ts.arc_event(arc) != event {
                continue;
            }
            let source = ts.arc_source(arc);
            let Ok(source_vector) = self.utility.reaching_parikh_vector(source) else {
                continue;
            };
            let coefficients: Vec<i64> = self
                .basis
                .iter()
                .map(|region| {
                    region.evaluate_parikh_vector(source_vector)
                        - region.evaluate_parikh_vector(state_vector)
                })
                .collect();
            system.add(
                &coefficients,
                Relation::Greater,
                0,
                format!(
                    "r({}) > r({})",
                    ts.state_name(source),
                    ts.state_name(state)
                ),
            );
        }

        let solution = system.find_solution()?;
        let terms: Vec<(i64, &Region)> = solution.into_iter().zip(self.basis).collect();
        Region::linear_combination(self.utility.event_count(), &terms)
            .with_normal_initial_marking(self.utility)
            .make_event_disabled(self.utility, state, event)
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::separation::is_separating_region_event;
    use crate::ts::system::TransitionSystem;

    // The word "ab": after 'a' fired once it must stay disabled.
    fn chain_ab() -> TransitionSystem {
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
    fn requires_trivial_properties() {
        let ts = chain_ab();
        let utility = RegionUtility::new(&ts);
        let basis = utility.region_basis();
        let locations = crate::synth::separation::location_map(&ts).unwrap();
        assert!(BasicImpureSeparation::new(
            &utility,
            basis,
            &PNProperties::new().pure(),
            &locations
        )
        .is_err());
        assert!(
            BasicImpureSeparation::new(&utility, basis, &PNProperties::new(), &locations).is_ok()
        );
    }

    #[test]
    fn disables_a_after_it_fired() {
        let ts = chain_ab();
        let utility = RegionUtility::new(&ts);
        let basis = utility.region_basis();
        let locations = crate::synth::separation::location_map(&ts).unwrap();
        let separation =
            BasicImpureSeparation::new(&utility, basis, &PNProperties::new(), &locations).unwrap();

        let s1 = ts.state_named("s1").unwrap();
        let a = ts.event_id("a").unwrap();
        let region = separation.separate_event(s1, a).expect("a is separable");
        assert!(is_separating_region_event(&utility, &region, s1, a));
    }

    #[test]
    fn event_without_arcs_is_disabled_by_a_self_loop_region() {
        // 'b' never occurs in any state except s1, so disabling it in s0
        // needs no climb at all.
        let ts = chain_ab();
        let utility = RegionUtility::new(&ts);
        let basis = utility.region_basis();
        let locations = crate::synth::separation::location_map(&ts).unwrap();
        let separation =
            BasicImpureSeparation::new(&utility, basis, &PNProperties::new(), &locations).unwrap();

        let s0 = ts.state_named("s0").unwrap();
        let b = ts.event_id("b").unwrap();
        let region = separation.separate_event(s0, b).expect("b is separable");
        assert!(is_separating_region_event(&utility, &region, s0, b));
    }
}
