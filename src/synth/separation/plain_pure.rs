//! Pure regions with weights restricted to {0, 1}.

use petgraph::graph::NodeIndex;

use crate::net::index::{EventId, Idx};
use crate::synth::inequalities::{InequalitySystem, Relation};
use crate::synth::properties::PNProperties;
use crate::synth::region::Region;
use crate::synth::separation::{
    is_trivial_location_map, LocationMap, Separation, UnsupportedProperties,
};
use crate::synth::utility::RegionUtility;

/// Same formulation as the basic pure variant plus bounds keeping every
/// effective weight of the combined region in `[-1, 1]`.
pub struct PlainPureSeparation<'a> {
    utility: &'a RegionUtility<'a>,
    basis: &'a [Region],
}

impl<'a> PlainPureSeparation<'a> {
    pub fn new(
        utility: &'a RegionUtility<'a>,
        basis: &'a [Region],
        properties: &PNProperties,
        locations: &LocationMap,
    ) -> Result<Self, UnsupportedProperties> {
        if *properties != PNProperties::new().pure().plain() || !is_trivial_location_map(locations)
        {
            return Err(UnsupportedProperties);
        }
        Ok(Self { utility, basis })
    }

    fn add_plainness_bounds(&self, system: &mut InequalitySystem) {
        for event in 0..self.utility.event_count() {
            let coefficients: Vec<i64> = self
                .basis
                .iter()
                .map(|region| region.effective_weight(EventId::from_usize(event)))
                .collect();
            system.add(&coefficients, Relation::LessEqual, 1, format!("w(e{}) <= 1", event));
            system.add(
                &coefficients,
                Relation::GreaterEqual,
                -1,
                format!("w(e{}) >= -1", event),
            );
        }
    }

    fn combine(&self, solution: Vec<i64>) -> Region {
        let terms: Vec<(i64, &Region)> = solution.into_iter().zip(self.basis).collect();
        Region::linear_combination(self.utility.event_count(), &terms)
            .with_normal_initial_marking(self.utility)
    }
}

impl Separation for PlainPureSeparation<'_> {
    fn name(&self) -> &'static str {
        "plain-pure"
    }

    fn separate_states(&self, state: NodeIndex, other_state: NodeIndex) -> Option<Region> {
        if !self.utility.is_reachable(state) || !self.utility.is_reachable(other_state) {
            return None;
        }
        let state_vector = self.utility.reaching_parikh_vector(state).ok()?;
        let other_vector = self.utility.reaching_parikh_vector(other_state).ok()?;

        // A separating basis region does the job if it happens to be plain.
        if let Some(region) = self.basis.iter().find(|region| {
            region.is_plain()
                && region.evaluate_parikh_vector(state_vector)
                    != region.evaluate_parikh_vector(other_vector)
        }) {
            return Some(region.with_normal_initial_marking(self.utility));
        }

        // Otherwise ask for a plain combination with a marking difference,
        // in either direction.
        let goal: Vec<i64> = self
            .basis
            .iter()
            .map(|region| {
                region.evaluate_parikh_vector(state_vector)
                    - region.evaluate_parikh_vector(other_vector)
            })
            .collect();
        for relation in [Relation::Greater, Relation::Less] {
            let mut system = InequalitySystem::new(self.basis.len());
            system.add(&goal, relation, 0, "markings must differ");
            self.add_plainness_bounds(&mut system);
            if let Some(solution) = system.find_solution() {
                return Some(self.combine(solution));
            }
        }
        None
    }

    fn separate_event(&self, state: NodeIndex, event: EventId) -> Option<Region> {
        let ts = self.utility.ts();
        if !self.utility.is_reachable(state) {
            return None;
        }
        let state_vector = self.utility.reaching_parikh_vector(state).ok()?;

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
        self.add_plainness_bounds(&mut system);

        let solution = system.find_solution()?;
        Some(self.combine(solution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::separation::{is_separating_region_event, is_separating_region_states};
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
    fn requires_pure_and_plain() {
        let ts = word_ab();
        let utility = RegionUtility::new(&ts);
        let basis = utility.region_basis();
        let locations = crate::synth::separation::location_map(&ts).unwrap();
        assert!(PlainPureSeparation::new(
            &utility,
            basis,
            &PNProperties::new().pure(),
            &locations
        )
        .is_err());
        assert!(PlainPureSeparation::new(
            &utility,
            basis,
            &PNProperties::new().pure().plain(),
            &locations
        )
        .is_ok());
    }

    #[test]
    fn produced_regions_are_plain() {
        let ts = word_ab();
        let utility = RegionUtility::new(&ts);
        let basis = utility.region_basis();
        let locations = crate::synth::separation::location_map(&ts).unwrap();
        let separation = PlainPureSeparation::new(
            &utility,
            basis,
            &PNProperties::new().pure().plain(),
            &locations,
        )
        .unwrap();

        let s0 = ts.state_named("s0").unwrap();
        let s1 = ts.state_named("s1").unwrap();
        let b = ts.event_id("b").unwrap();

        let region = separation.separate_event(s0, b).expect("b is separable");
        assert!(region.is_plain());
        assert!(region.is_pure());
        assert!(is_separating_region_event(&utility, &region, s0, b));

        let region = separation.separate_states(s0, s1).expect("separable");
        assert!(region.is_plain());
        assert!(is_separating_region_states(&utility, &region, s0, s1));
    }
}
