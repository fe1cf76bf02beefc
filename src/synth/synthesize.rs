//! Synthesis orchestrator: event/state separation, state separation,
//! region minimization and net assembly.

use indexmap::IndexMap;
use itertools::Itertools;
use petgraph::graph::NodeIndex;

use crate::net::core::Net;
use crate::net::index::{EventId, Idx, IndexVec, PlaceId, TransitionId};
use crate::net::structure::{Place, Transition};
use crate::synth::properties::PNProperties;
use crate::synth::region::Region;
use crate::synth::separation::{self, Separation};
use crate::synth::trace::{EventSink, NullSink, TraceEvent};
use crate::synth::utility::RegionUtility;
use crate::synth::SynthesisError;
use crate::ts::system::TransitionSystem;
use crate::util::equivalence::EquivalenceRelation;

pub struct SynthesisBuilder<'a> {
    ts: &'a TransitionSystem,
    properties: PNProperties,
    quick_fail: bool,
    sink: Box<dyn EventSink + 'a>,
}

impl<'a> SynthesisBuilder<'a> {
    pub fn new(ts: &'a TransitionSystem) -> Self {
        Self {
            ts,
            properties: PNProperties::default(),
            quick_fail: false,
            sink: Box::new(NullSink),
        }
    }

    pub fn properties(mut self, properties: PNProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Stop at the first unsolvable separation instance. Useful when only
    /// the yes/no answer matters, as in word enumeration.
    pub fn quick_fail(mut self) -> Self {
        self.quick_fail = true;
        self
    }

    pub fn event_sink(mut self, sink: Box<dyn EventSink + 'a>) -> Self {
        self.sink = sink;
        self
    }

    pub fn build(mut self) -> Result<Synthesis<'a>, SynthesisError> {
        if self.ts.initial().is_none() {
            return Err(SynthesisError::NoInitialState);
        }
        self.ts.check_deterministic()?;

        let utility = RegionUtility::new(self.ts);
        let outcome = solve(
            &utility,
            &self.properties,
            self.quick_fail,
            self.sink.as_mut(),
        )?;

        // Failed pairs grow transitively into maximal groups: if {a,b} and
        // {a,c} are inseparable, so is {b,c}.
        let mut relation = EquivalenceRelation::new();
        for (state, other) in &outcome.failed_pairs {
            relation.join(state, other);
        }
        let mut failed_state_groups: Vec<Vec<NodeIndex>> = relation
            .classes()
            .map(|class| {
                let mut group = class.to_vec();
                group.sort();
                group
            })
            .collect();
        failed_state_groups.sort_by_key(|group| group[0]);

        let mut regions = outcome.regions;
        let successful =
            failed_state_groups.is_empty() && outcome.failed_event_states.is_empty();
        if successful {
            minimize_regions(&utility, &mut regions, self.sink.as_mut());
        }

        Ok(Synthesis {
            utility,
            properties: self.properties,
            regions,
            failed_state_groups,
            failed_event_states: outcome.failed_event_states,
        })
    }
}

struct SolveOutcome {
    regions: Vec<Region>,
    failed_event_states: IndexMap<EventId, Vec<NodeIndex>>,
    failed_pairs: Vec<(NodeIndex, NodeIndex)>,
}

fn solve(
    utility: &RegionUtility<'_>,
    properties: &PNProperties,
    quick_fail: bool,
    sink: &mut dyn EventSink,
) -> Result<SolveOutcome, SynthesisError> {
    let ts = utility.ts();
    let basis = utility.region_basis();
    sink.emit(&TraceEvent::BasisComputed { size: basis.len() });

    let separation = separation::create_separation(utility, basis, properties)?;
    sink.emit(&TraceEvent::StrategySelected {
        name: separation.name(),
    });

    let mut regions: Vec<Region> = Vec::new();
    let mut failed_event_states: IndexMap<EventId, Vec<NodeIndex>> = IndexMap::new();
    let mut failed_pairs: Vec<(NodeIndex, NodeIndex)> = Vec::new();

    // ESSP first: the regions it produces often settle SSP instances for
    // free, giving a smaller net.
    'essp: for state in ts.states() {
        for (event, _) in ts.events() {
            if ts.is_event_enabled(state, event) {
                continue;
            }
            if regions
                .iter()
                .any(|region| separation::is_separating_region_event(utility, region, state, event))
            {
                continue;
            }
            match separation.separate_event(state, event) {
                Some(region) => {
                    sink.emit(&TraceEvent::RegionAccepted {
                        index: regions.len(),
                        region: &region,
                    });
                    regions.push(region);
                }
                None => {
                    sink.emit(&TraceEvent::EsspFailed {
                        state: ts.state_name(state),
                        event: ts.event_label(event),
                    });
                    failed_event_states.entry(event).or_default().push(state);
                    if quick_fail {
                        break 'essp;
                    }
                }
            }
        }
    }

    if !(quick_fail && !failed_event_states.is_empty()) {
        let remaining = calculate_unseparated_states(utility, &regions);
        'ssp: for (&state, &other) in remaining.iter().tuple_combinations() {
            if regions.iter().any(|region| {
                separation::is_separating_region_states(utility, region, state, other)
            }) {
                continue;
            }
            match separation.separate_states(state, other) {
                Some(region) => {
                    sink.emit(&TraceEvent::RegionAccepted {
                        index: regions.len(),
                        region: &region,
                    });
                    regions.push(region);
                }
                None => {
                    sink.emit(&TraceEvent::SspFailed {
                        state: ts.state_name(state),
                        other_state: ts.state_name(other),
                    });
                    failed_pairs.push((state, other));
                    if quick_fail {
                        break 'ssp;
                    }
                }
            }
        }
    }

    Ok(SolveOutcome {
        regions,
        failed_event_states,
        failed_pairs,
    })
}

/// States the given regions do not yet distinguish pairwise, via partition
/// refinement: start with one block of all states and split by each
/// region's markings. Unreachable states can never be separated and are
/// always included.
pub fn calculate_unseparated_states(
    utility: &RegionUtility<'_>,
    regions: &[Region],
) -> Vec<NodeIndex> {
    let ts = utility.ts();
    let mut result: Vec<NodeIndex> = Vec::new();
    let mut reachable: Vec<NodeIndex> = Vec::new();
    for state in ts.states() {
        if utility.is_reachable(state) {
            reachable.push(state);
        } else {
            result.push(state);
        }
    }

    let mut partition: Vec<Vec<NodeIndex>> = Vec::new();
    if !reachable.is_empty() {
        partition.push(reachable);
    }
    for region in regions {
        let mut refined = Vec::new();
        for family in partition {
            let mut by_marking: IndexMap<i64, Vec<NodeIndex>> = IndexMap::new();
            for state in family {
                let marking = region
                    .marking_for_state(utility, state)
                    .expect("only reachable states are partitioned");
                by_marking.entry(marking).or_default().push(state);
            }
            for (_, group) in by_marking {
                if group.len() > 1 {
                    refined.push(group);
                }
            }
        }
        partition = refined;
    }
    for family in partition {
        result.extend(family);
    }
    result.sort_by_key(|state| state.index());
    result
}

/// Shrink the region set to one that still solves every separation
/// instance: regions solving some instance alone are mandatory, every
/// instance not covered afterwards takes its lowest-index solver.
pub fn minimize_regions(
    utility: &RegionUtility<'_>,
    regions: &mut Vec<Region>,
    sink: &mut dyn EventSink,
) {
    let ts = utility.ts();
    let before = regions.len();

    let mut problems: Vec<Vec<usize>> = Vec::new();
    for state in ts.states() {
        for (event, _) in ts.events() {
            if ts.is_event_enabled(state, event) {
                continue;
            }
            let solvers: Vec<usize> = regions
                .iter()
                .enumerate()
                .filter(|(_, region)| {
                    separation::is_separating_region_event(utility, region, state, event)
                })
                .map(|(idx, _)| idx)
                .collect();
            if !solvers.is_empty() {
                problems.push(solvers);
            }
        }
    }
    let states: Vec<NodeIndex> = ts.states().collect();
    for (&state, &other) in states.iter().tuple_combinations() {
        let solvers: Vec<usize> = regions
            .iter()
            .enumerate()
            .filter(|(_, region)| {
                separation::is_separating_region_states(utility, region, state, other)
            })
            .map(|(idx, _)| idx)
            .collect();
        if !solvers.is_empty() {
            problems.push(solvers);
        }
    }

    let mut required = vec![false; regions.len()];
    for problem in &problems {
        if problem.len() == 1 {
            required[problem[0]] = true;
        }
    }
    for problem in &problems {
        if problem.iter().any(|&idx| required[idx]) {
            continue;
        }
        required[problem[0]] = true;
    }

    let mut index = 0;
    regions.retain(|_| {
        let keep = required[index];
        index += 1;
        keep
    });
    sink.emit(&TraceEvent::RegionsMinimized {
        before,
        after: regions.len(),
    });
}

/// The result of the separation phases. Either every instance was solved
/// and a net can be assembled, or the failure collections say precisely
/// which instances defeated every strategy.
pub struct Synthesis<'a> {
    utility: RegionUtility<'a>,
    properties: PNProperties,
    regions: Vec<Region>,
    failed_state_groups: Vec<Vec<NodeIndex>>,
    failed_event_states: IndexMap<EventId, Vec<NodeIndex>>,
}

/// A synthesized net plus the region behind each place.
pub struct SynthesizedNet {
    pub net: Net,
    pub place_regions: IndexVec<PlaceId, Region>,
}

impl<'a> Synthesis<'a> {
    pub fn builder(ts: &'a TransitionSystem) -> SynthesisBuilder<'a> {
        SynthesisBuilder::new(ts)
    }

    pub fn utility(&self) -> &RegionUtility<'a> {
        &self.utility
    }

    pub fn properties(&self) -> &PNProperties {
        &self.properties
    }

    pub fn separating_regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn was_successfully_separated(&self) -> bool {
        self.failed_state_groups.is_empty() && self.failed_event_states.is_empty()
    }

    /// Maximal groups of states that no region can tell apart.
    pub fn failed_state_separation_groups(&self) -> &[Vec<NodeIndex>] {
        &self.failed_state_groups
    }

    /// For each event, the states where no region can disable it.
    pub fn failed_event_state_separation(&self) -> &IndexMap<EventId, Vec<NodeIndex>> {
        &self.failed_event_states
    }

    /// Assemble the net, or `None` when separation failed. Places are the
    /// accepted regions, transitions the events.
    pub fn synthesize_petri_net(&self) -> Option<SynthesizedNet> {
        if !self.was_successfully_separated() {
            return None;
        }
        let result = assemble_net(self.utility.ts(), &self.regions);

        #[cfg(debug_assertions)]
        {
            use crate::synth::verify;
            for region in &self.regions {
                debug_assert!(verify::region_is_valid(&self.utility, region));
            }
            debug_assert!(verify::reachability_isomorphic(
                &result.net,
                self.utility.ts()
            ));
            if self.properties.pure {
                debug_assert!(verify::is_pure(&result.net));
            }
            if self.properties.plain {
                debug_assert!(verify::is_plain(&result.net));
            }
            if let Some(k) = self.properties.k_bounded {
                debug_assert!(verify::is_k_bounded(&result.net, k));
            }
        }

        Some(result)
    }
}

/// One transition per event, one place per region. Transitions come
/// first so events without any flow still show up in the net.
pub fn assemble_net(ts: &TransitionSystem, regions: &[Region]) -> SynthesizedNet {
    let mut net = Net::empty(ts.name());
    for (_, event) in ts.events() {
        net.add_transition(Transition::new(&event.label));
    }

    let mut place_regions: IndexVec<PlaceId, Region> = IndexVec::new();
    for (idx, region) in regions.iter().enumerate() {
        let tokens =
            u64::try_from(region.initial_marking()).expect("region markings are non-negative");
        let place = net.add_place(Place::new(format!("p{idx}"), tokens));
        for (event, _) in ts.events() {
            let transition = TransitionId::from_usize(event.index());
            let backward = region.backward_weight(event);
            if backward > 0 {
                net.set_input_weight(place, transition, backward as u64);
            }
            let forward = region.forward_weight(event);
            if forward > 0 {
                net.set_output_weight(place, transition, forward as u64);
            }
        }
        place_regions.push(region.clone());
    }

    SynthesizedNet { net, place_regions }
}
