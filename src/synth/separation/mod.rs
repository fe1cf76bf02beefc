//! Pluggable separation strategies.
//!
//! A strategy answers two kinds of questions: find a region whose marking
//! differs on two given states, and find a region that disables a given
//! event in a given state. Cheaper strategies only support certain
//! property sets and signal [`UnsupportedProperties`] from their
//! constructor; the factory then falls through to the next one. The
//! inequality-system strategy is always applicable.

pub mod basic_impure;
pub mod basic_pure;
pub mod inequality;
pub mod plain_pure;

use petgraph::graph::NodeIndex;

use crate::net::index::{EventId, IndexVec};
use crate::synth::properties::PNProperties;
use crate::synth::region::Region;
use crate::synth::utility::RegionUtility;
use crate::synth::MissingLocationError;
use crate::ts::system::TransitionSystem;

pub use basic_impure::BasicImpureSeparation;
pub use basic_pure::BasicPureSeparation;
pub use inequality::InequalitySystemSeparation;
pub use plain_pure::PlainPureSeparation;

/// Control-flow signal: this strategy cannot honor the property set.
/// Never surfaces to callers of the factory.
#[derive(Debug, Clone, Copy)]
pub struct UnsupportedProperties;

pub trait Separation {
    fn name(&self) -> &'static str;

    /// A region whose marking differs on the two states, or `None`.
    fn separate_states(&self, state: NodeIndex, other_state: NodeIndex) -> Option<Region>;

    /// A region that disables the event in the state, or `None`.
    fn separate_event(&self, state: NodeIndex, event: EventId) -> Option<Region>;
}

/// Does this region distinguish the two states?
pub fn is_separating_region_states(
    utility: &RegionUtility<'_>,
    region: &Region,
    state: NodeIndex,
    other_state: NodeIndex,
) -> bool {
    // Unreachable states cannot be separated.
    if !utility.is_reachable(state) || !utility.is_reachable(other_state) {
        return false;
    }
    let Ok(state_vector) = utility.reaching_parikh_vector(state) else {
        return false;
    };
    let Ok(other_vector) = utility.reaching_parikh_vector(other_state) else {
        return false;
    };
    region.evaluate_parikh_vector(state_vector) != region.evaluate_parikh_vector(other_vector)
}

/// Does this region disable the event in the state? True when the state's
/// marking is below the event's backward weight.
pub fn is_separating_region_event(
    utility: &RegionUtility<'_>,
    region: &Region,
    state: NodeIndex,
    event: EventId,
) -> bool {
    if !utility.is_reachable(state) {
        return false;
    }
    match region.marking_for_state(utility, state) {
        Ok(marking) => marking < region.backward_weight(event),
        Err(_) => false,
    }
}

pub type LocationMap = IndexVec<EventId, Option<String>>;

/// Per-event locations for distributed synthesis. Either no event carries
/// a location, or all of them do; a mix is an error. A map where all
/// locations agree is collapsed to the trivial map.
pub fn location_map(ts: &TransitionSystem) -> Result<LocationMap, MissingLocationError> {
    let mut map: LocationMap = ts.events().map(|(_, event)| event.location.clone()).collect();
    let with_location = map.iter().filter(|l| l.is_some()).count();
    if with_location == 0 {
        return Ok(map);
    }
    if with_location != map.len() {
        return Err(MissingLocationError);
    }
    let first = map.iter().next().cloned().flatten();
    if map.iter().all(|l| l.as_deref() == first.as_deref()) {
        map = ts.events().map(|_| None).collect();
    }
    Ok(map)
}

pub fn is_trivial_location_map(map: &LocationMap) -> bool {
    map.iter().all(Option::is_none)
}

/// Shared state-separation search over the region basis: the marking
/// difference of two states is linear in the basis, so if no basis region
/// separates them, none does.
pub(crate) fn separate_states_via_basis(
    utility: &RegionUtility<'_>,
    basis: &[Region],
    state: NodeIndex,
    other_state: NodeIndex,
) -> Option<Region> {
    if !utility.is_reachable(state) || !utility.is_reachable(other_state) {
        return None;
    }
    let state_vector = utility.reaching_parikh_vector(state).ok()?;
    let other_vector = utility.reaching_parikh_vector(other_state).ok()?;
    basis
        .iter()
        .find(|region| {
            region.evaluate_parikh_vector(state_vector)
                != region.evaluate_parikh_vector(other_vector)
        })
        .map(|region| region.with_normal_initial_marking(utility))
}

/// Build the best applicable strategy for the property set.
pub fn create_separation<'a>(
    utility: &'a RegionUtility<'a>,
    basis: &'a [Region],
    properties: &PNProperties,
) -> Result<Box<dyn Separation + 'a>, MissingLocationError> {
    let locations = location_map(utility.ts())?;

    if let Ok(separation) = BasicPureSeparation::new(utility, basis, properties, &locations) {
        log::debug!("separation strategy: {}", separation.name());
        return Ok(Box::new(separation));
    }
    if let Ok(separation) = BasicImpureSeparation::new(utility, basis, properties, &locations) {
        log::debug!("separation strategy: {}", separation.name());
        return Ok(Box::new(separation));
    }
    if let Ok(separation) = PlainPureSeparation::new(utility, basis, properties, &locations) {
        log::debug!("separation strategy: {}", separation.name());
        return Ok(Box::new(separation));
    }
    let separation = InequalitySystemSeparation::new(utility, properties, locations);
    log::debug!("separation strategy: {}", separation.name());
    Ok(Box::new(separation))
}
