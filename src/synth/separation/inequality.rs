//! General-purpose separation by solving a full inequality system.
//!
//! Unlike the basis-combination strategies this one works directly on the
//! region's weights, so it can encode every supported property: plainness
//! and k-boundedness as bounds, locations / T-nets / output-nonbranching /
//! conflict-freeness as bounded case splits over the events allowed to
//! consume or produce.
//!
//! Variable layout: in pure mode one effective weight per event plus the
//! initial marking; otherwise a forward and a backward weight per event
//! plus the initial marking.

use petgraph::graph::NodeIndex;

use crate::net::index::{EventId, Idx, IndexVec};
use crate::synth::inequalities::{InequalitySystem, Relation};
use crate::synth::properties::PNProperties;
use crate::synth::region::Region;
use crate::synth::separation::{LocationMap, Separation};
use crate::synth::utility::RegionUtility;

pub struct InequalitySystemSeparation<'a> {
    utility: &'a RegionUtility<'a>,
    properties: PNProperties,
    locations: LocationMap,
}

#[derive(Debug, Clone)]
struct Row {
    coefficients: Vec<i64>,
    relation: Relation,
    rhs: i64,
    comment: String,
}

impl<'a> InequalitySystemSeparation<'a> {
    pub fn new(
        utility: &'a RegionUtility<'a>,
        properties: &PNProperties,
        locations: LocationMap,
    ) -> Self {
        Self {
            utility,
            properties: properties.clone(),
            locations,
        }
    }

    fn event_count(&self) -> usize {
        self.utility.event_count()
    }

    fn pure_mode(&self) -> bool {
        self.properties.pure
    }

    fn variables(&self) -> usize {
        if self.pure_mode() {
            self.event_count() + 1
        } else {
            2 * self.event_count() + 1
        }
    }

    fn marking_index(&self) -> usize {
        self.variables() - 1
    }

    /// Coefficient row of the marking reached by a Parikh vector.
    fn marking_coefficients(&self, vector: &[i64]) -> Vec<i64> {
        let n = self.event_count();
        let mut coefficients = vec![0i64; self.variables()];
        for event in 0..n {
            if self.pure_mode() {
                coefficients[event] = vector[event];
            } else {
                coefficients[event] = vector[event];
                coefficients[n + event] = -vector[event];
            }
        }
        coefficients[self.marking_index()] = 1;
        coefficients
    }

    /// Coefficient row of an effective weight vector (no marking term).
    fn effective_coefficients(&self, vector: &[i64]) -> Vec<i64> {
        let n = self.event_count();
        let mut coefficients = vec![0i64; self.variables()];
        for event in 0..n {
            if self.pure_mode() {
                coefficients[event] = vector[event];
            } else {
                coefficients[event] = vector[event];
                coefficients[n + event] = -vector[event];
            }
        }
        coefficients
    }

    fn unit(&self, index: usize) -> Vec<i64> {
        let mut coefficients = vec![0i64; self.variables()];
        coefficients[index] = 1;
        coefficients
    }

    /// Rows every region must satisfy, independent of the separation goal.
    fn base_system(&self) -> InequalitySystem {
        let ts = self.utility.ts();
        let n = self.event_count();
        let mut system = InequalitySystem::new(self.variables());

        system.add(
            &self.unit(self.marking_index()),
            Relation::GreaterEqual,
            0,
            "initial marking is non-negative",
        );
        if !self.pure_mode() {
            for event in 0..n {
                system.add(
                    &self.unit(event),
                    Relation::GreaterEqual,
                    0,
                    format!("forward weight of e{} is non-negative", event),
                );
                system.add(
                    &self.unit(n + event),
                    Relation::GreaterEqual,
                    0,
                    format!("backward weight of e{} is non-negative", event),
                );
            }
        }

        // Chords: no net effect around any fundamental cycle.
        for &chord in self.utility.tree().chords() {
            let vector = self
                .utility
                .parikh_vector_for_edge(chord)
                .expect("chord endpoints are reachable by construction");
            system.add(
                &self.effective_coefficients(&vector),
                Relation::Equal,
                0,
                "chord consistency",
            );
        }

        for state in ts.states() {
            let Ok(vector) = self.utility.reaching_parikh_vector(state) else {
                continue;
            };
            // Validity: the marking of every reachable state is
            // non-negative.
            system.add(
                &self.marking_coefficients(vector),
                Relation::GreaterEqual,
                0,
                format!("marking of {} is non-negative", ts.state_name(state)),
            );
            if let Some(k) = self.properties.k_bounded {
                system.add(
                    &self.marking_coefficients(vector),
                    Relation::LessEqual,
                    k as i64,
                    format!("marking of {} is at most {}", ts.state_name(state), k),
                );
            }
            if !self.pure_mode() {
                // Enabledness: each occurring event finds its backward
                // weight. In pure mode the target-state validity row
                // already says the same.
                for (_, event, _) in ts.postset(state) {
                    let mut coefficients = self.marking_coefficients(vector);
                    coefficients[n + event.index()] -= 1;
                    system.add(
                        &coefficients,
                        Relation::GreaterEqual,
                        0,
                        format!(
                            "{} stays enabled in {}",
                            ts.event_label(event),
                            ts.state_name(state)
                        ),
                    );
                }
            }
        }

        if self.properties.plain {
            for event in 0..n {
                if self.pure_mode() {
                    system.add(&self.unit(event), Relation::LessEqual, 1, "plain");
                    system.add(&self.unit(event), Relation::GreaterEqual, -1, "plain");
                } else {
                    system.add(&self.unit(event), Relation::LessEqual, 1, "plain forward");
                    system.add(&self.unit(n + event), Relation::LessEqual, 1, "plain backward");
                }
            }
        }

        system
    }

    /// Extra row sets encoding the per-place shape constraints. Every
    /// returned alternative is tried in order until one is feasible.
    fn shape_variants(&self) -> Vec<Vec<Row>> {
        let n = self.event_count();
        let mut variants: Vec<Vec<Row>> = vec![Vec::new()];

        let no_consumption = |event: usize| -> Row {
            if self.pure_mode() {
                Row {
                    coefficients: self.unit(event),
                    relation: Relation::GreaterEqual,
                    rhs: 0,
                    comment: format!("e{} must not consume", event),
                }
            } else {
                Row {
                    coefficients: self.unit(n + event),
                    relation: Relation::LessEqual,
                    rhs: 0,
                    comment: format!("e{} must not consume", event),
                }
            }
        };
        // In pure mode variable `event` is the effective weight, otherwise
        // the forward weight; either way capping it at zero forbids
        // production.
        let no_production = |event: usize| -> Row {
            Row {
                coefficients: self.unit(event),
                relation: Relation::LessEqual,
                rhs: 0,
                comment: format!("e{} must not produce", event),
            }
        };

        // Locations: all events consuming from a place share one location.
        if self.locations.iter().any(Option::is_some) {
            let mut distinct: Vec<&str> = Vec::new();
            for location in self.locations.iter().flatten() {
                if !distinct.contains(&location.as_str()) {
                    distinct.push(location);
                }
            }
            let mut family = Vec::new();
            for chosen in distinct {
                let rows: Vec<Row> = (0..n)
                    .filter(|&event| {
                        self.locations[EventId::from_usize(event)].as_deref() != Some(chosen)
                    })
                    .map(no_consumption)
                    .collect();
                family.push(rows);
            }
            variants = product(variants, family);
        }

        if self.properties.t_net {
            // One producing and one consuming event per place; both may
            // also be absent.
            let mut family = Vec::new();
            for producer in (0..n).map(Some).chain([None]) {
                for consumer in (0..n).map(Some).chain([None]) {
                    let mut rows = Vec::new();
                    for event in 0..n {
                        if producer != Some(event) {
                            rows.push(no_production(event));
                        }
                        if consumer != Some(event) {
                            rows.push(no_consumption(event));
                        }
                    }
                    family.push(rows);
                }
            }
            variants = product(variants, family);
        } else if self.properties.output_nonbranching || self.properties.conflict_free {
            // Output-nonbranching: at most one consuming event.
            let mut family = Vec::new();
            for consumer in (0..n).map(Some).chain([None]) {
                let rows: Vec<Row> = (0..n)
                    .filter(|&event| consumer != Some(event))
                    .map(no_consumption)
                    .collect();
                family.push(rows);
            }
            if self.properties.conflict_free && !self.properties.output_nonbranching {
                // Conflict-free also allows several consumers when each of
                // them is a producer as well, which forces self-loops and
                // is only expressible in impure mode.
                if !self.pure_mode() {
                    let rows: Vec<Row> = (0..n)
                        .map(|event| {
                            let mut coefficients = vec![0i64; self.variables()];
                            coefficients[n + event] = 1;
                            coefficients[event] = -1;
                            Row {
                                coefficients,
                                relation: Relation::LessEqual,
                                rhs: 0,
                                comment: format!("e{} consumes only via a self-loop", event),
                            }
                        })
                        .collect();
                    family.push(rows);
                }
            }
            variants = product(variants, family);
        }

        variants
    }

    fn solve(&self, goal: &[Row]) -> Option<Region> {
        for shape in self.shape_variants() {
            let mut system = self.base_system();
            for row in goal.iter().chain(&shape) {
                system.add(&row.coefficients, row.relation, row.rhs, row.comment.clone());
            }
            if let Some(solution) = system.find_solution() {
                return Some(self.region_from_solution(&solution));
            }
        }
        None
    }

    fn region_from_solution(&self, solution: &[i64]) -> Region {
        let n = self.event_count();
        let initial_marking = solution[self.marking_index()];
        if self.pure_mode() {
            let forward: IndexVec<EventId, i64> =
                solution[..n].iter().map(|&w| w.max(0)).collect();
            let backward: IndexVec<EventId, i64> =
                solution[..n].iter().map(|&w| (-w).max(0)).collect();
            Region::new(forward, backward, initial_marking)
        } else {
            let forward: IndexVec<EventId, i64> = solution[..n].iter().copied().collect();
            let backward: IndexVec<EventId, i64> =
                solution[n..2 * n].iter().copied().collect();
            Region::new(forward, backward, initial_marking)
        }
    }
}

impl Separation for InequalitySystemSeparation<'_> {
    fn name(&self) -> &'static str {
        "inequality-system"
    }

    fn separate_states(&self, state: NodeIndex, other_state: NodeIndex) -> Option<Region> {
        if !self.utility.is_reachable(state) || !self.utility.is_reachable(other_state) {
            return None;
        }
        let state_vector = self.utility.reaching_parikh_vector(state).ok()?;
        let other_vector = self.utility.reaching_parikh_vector(other_state).ok()?;
        let difference: Vec<i64> = state_vector
            .iter()
            .zip(other_vector)
            .map(|(s, o)| s - o)
            .collect();
        let coefficients = self.effective_coefficients(&difference);

        for relation in [Relation::Greater, Relation::Less] {
            let goal = Row {
                coefficients: coefficients.clone(),
                relation,
                rhs: 0,
                comment: "markings must differ".to_owned(),
            };
            if let Some(region) = self.solve(std::slice::from_ref(&goal)) {
                return Some(region);
            }
        }
        None
    }

    fn separate_event(&self, state: NodeIndex, event: EventId) -> Option<Region> {
        if !self.utility.is_reachable(state) {
            return None;
        }
        let vector = self.utility.reaching_parikh_vector(state).ok()?;
        let n = self.event_count();

        let mut coefficients = self.marking_coefficients(vector);
        if self.pure_mode() {
            // marking(state) + w(event) < 0
            coefficients[event.index()] += 1;
        } else {
            // marking(state) - backward(event) < 0
            coefficients[n + event.index()] -= 1;
        }
        let goal = Row {
            coefficients,
            relation: Relation::Less,
            rhs: 0,
            comment: format!(
                "{} is disabled in {}",
                self.utility.ts().event_label(event),
                self.utility.ts().state_name(state)
            ),
        };
        self.solve(std::slice::from_ref(&goal))
    }
}

fn product(variants: Vec<Vec<Row>>, family: Vec<Vec<Row>>) -> Vec<Vec<Row>> {
    let mut result = Vec::new();
    for variant in &variants {
        for rows in &family {
            let mut combined = variant.clone();
            combined.extend(rows.iter().cloned());
            result.push(combined);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::separation::{
        is_separating_region_event, is_separating_region_states, location_map,
    };
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

    fn separation<'a>(
        utility: &'a RegionUtility<'a>,
        properties: PNProperties,
    ) -> InequalitySystemSeparation<'a> {
        let locations = location_map(utility.ts()).unwrap();
        InequalitySystemSeparation::new(utility, &properties, locations)
    }

    #[test]
    fn safe_pure_event_separation() {
        let ts = word_ab();
        let utility = RegionUtility::new(&ts);
        let sep = separation(&utility, PNProperties::new().pure().safe());

        let s0 = ts.state_named("s0").unwrap();
        let b = ts.event_id("b").unwrap();
        let region = sep.separate_event(s0, b).expect("b is separable safely");
        assert!(region.is_pure());
        assert!(is_separating_region_event(&utility, &region, s0, b));
        // Safe: no state marking may exceed one.
        for state in ts.states() {
            let marking = region.marking_for_state(&utility, state).unwrap();
            assert!((0..=1).contains(&marking));
        }
    }

    #[test]
    fn impure_state_separation() {
        let ts = word_ab();
        let utility = RegionUtility::new(&ts);
        let sep = separation(&utility, PNProperties::new());

        let s0 = ts.state_named("s0").unwrap();
        let s2 = ts.state_named("s2").unwrap();
        let region = sep.separate_states(s0, s2).expect("separable");
        assert!(is_separating_region_states(&utility, &region, s0, s2));
    }

    #[test]
    fn t_net_shape_limits_consumers_and_producers() {
        let ts = word_ab();
        let utility = RegionUtility::new(&ts);
        let sep = separation(&utility, PNProperties::new().t_net());

        let s0 = ts.state_named("s0").unwrap();
        let b = ts.event_id("b").unwrap();
        let region = sep.separate_event(s0, b).expect("b is separable");
        assert!(is_separating_region_event(&utility, &region, s0, b));
        let producers = (0..ts.event_count())
            .filter(|&e| region.forward_weight(EventId::from_usize(e)) > 0)
            .count();
        let consumers = (0..ts.event_count())
            .filter(|&e| region.backward_weight(EventId::from_usize(e)) > 0)
            .count();
        assert!(producers <= 1);
        assert!(consumers <= 1);
    }

    #[test]
    fn unreachable_state_is_not_separable() {
        let mut ts = word_ab();
        let lost = ts.create_state("lost").unwrap();
        let utility = RegionUtility::new(&ts);
        let sep = separation(&utility, PNProperties::new());
        let s0 = ts.state_named("s0").unwrap();
        assert!(sep.separate_states(s0, lost).is_none());
    }
}
