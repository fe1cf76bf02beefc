//! End-to-end synthesis checks on small transition systems.

use RustPNS::synth::separation::{is_separating_region_event, is_separating_region_states};
use RustPNS::synth::{verify, PNProperties, RegionUtility, Synthesis};
use RustPNS::ts::{parse_ts, TransitionSystem};

fn cycle_ts() -> TransitionSystem {
    let mut ts = TransitionSystem::new("cycle");
    let s0 = ts.create_state("s0").unwrap();
    let s1 = ts.create_state("s1").unwrap();
    ts.set_initial(s0);
    ts.create_arc(s0, s1, "a");
    ts.create_arc(s1, s0, "b");
    ts
}

fn diamond_ts() -> TransitionSystem {
    // Two concurrent events: a and b in either order reach the same state.
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
    ts
}

/// The same diamond but with two distinct final states: their reaching
/// Parikh vectors coincide, so no region can ever tell them apart.
fn broken_diamond_ts() -> TransitionSystem {
    let mut ts = TransitionSystem::new("broken-diamond");
    let s0 = ts.create_state("s0").unwrap();
    let s1 = ts.create_state("s1").unwrap();
    let s2 = ts.create_state("s2").unwrap();
    let s3 = ts.create_state("s3").unwrap();
    let s4 = ts.create_state("s4").unwrap();
    ts.set_initial(s0);
    ts.create_arc(s0, s1, "a");
    ts.create_arc(s1, s2, "b");
    ts.create_arc(s0, s3, "b");
    ts.create_arc(s3, s4, "a");
    ts
}

fn assert_separation_complete(ts: &TransitionSystem, synthesis: &Synthesis<'_>) {
    let utility = synthesis.utility();
    let regions = synthesis.separating_regions();
    let states: Vec<_> = ts.states().collect();

    for (idx, &state) in states.iter().enumerate() {
        for &other in &states[idx + 1..] {
            assert!(
                regions
                    .iter()
                    .any(|r| is_separating_region_states(utility, r, state, other)),
                "states {} and {} are not separated",
                ts.state_name(state),
                ts.state_name(other)
            );
        }
        for (event, _) in ts.events() {
            if ts.is_event_enabled(state, event) {
                continue;
            }
            assert!(
                regions
                    .iter()
                    .any(|r| is_separating_region_event(utility, r, state, event)),
                "event {} is not disabled in {}",
                ts.event_label(event),
                ts.state_name(state)
            );
        }
    }
}

#[test]
fn cycle_synthesizes_to_an_isomorphic_net() {
    let ts = cycle_ts();
    let synthesis = Synthesis::builder(&ts).build().unwrap();
    assert!(synthesis.was_successfully_separated());
    assert_separation_complete(&ts, &synthesis);

    let result = synthesis.synthesize_petri_net().unwrap();
    assert_eq!(result.net.transitions_len(), 2);
    assert!(verify::reachability_isomorphic(&result.net, &ts));
    for region in synthesis.separating_regions() {
        assert!(verify::region_is_valid(synthesis.utility(), region));
    }
}

#[test]
fn diamond_synthesizes_under_pure() {
    let ts = diamond_ts();
    let synthesis = Synthesis::builder(&ts)
        .properties(PNProperties::new().pure())
        .build()
        .unwrap();
    assert!(synthesis.was_successfully_separated());
    assert_separation_complete(&ts, &synthesis);

    let result = synthesis.synthesize_petri_net().unwrap();
    assert!(verify::is_pure(&result.net));
    assert!(verify::reachability_isomorphic(&result.net, &ts));
}

#[test]
fn parikh_equal_states_defeat_every_strategy() {
    let ts = broken_diamond_ts();
    let synthesis = Synthesis::builder(&ts).build().unwrap();
    assert!(!synthesis.was_successfully_separated());
    assert!(synthesis.synthesize_petri_net().is_none());

    let groups = synthesis.failed_state_separation_groups();
    assert_eq!(groups.len(), 1);
    let names: Vec<&str> = groups[0].iter().map(|&s| ts.state_name(s)).collect();
    assert_eq!(names, vec!["s2", "s4"]);
    // Disabling events is still possible, only state separation fails.
    assert!(synthesis.failed_event_state_separation().is_empty());
}

#[test]
fn safe_synthesis_falls_through_to_the_inequality_strategy() {
    // pure + safe is outside every basis-combination strategy.
    let ts = cycle_ts();
    let synthesis = Synthesis::builder(&ts)
        .properties(PNProperties::new().pure().safe())
        .build()
        .unwrap();
    assert!(synthesis.was_successfully_separated());

    let result = synthesis.synthesize_petri_net().unwrap();
    assert!(verify::is_pure(&result.net));
    assert!(verify::is_k_bounded(&result.net, 1));
    assert!(verify::reachability_isomorphic(&result.net, &ts));
}

#[test]
fn the_word_aa_needs_two_tokens() {
    let letters: Vec<String> = vec!["a".into(), "a".into()];
    assert!(RustPNS::synth::word::is_solvable_word(&letters, &PNProperties::new()).unwrap());
    // A safe net cannot count to two on a single place.
    assert!(
        !RustPNS::synth::word::is_solvable_word(&letters, &PNProperties::new().safe()).unwrap()
    );
}

#[test]
fn basis_is_idempotent() {
    let ts = diamond_ts();
    let utility = RegionUtility::new(&ts);
    let first: Vec<_> = utility.region_basis().to_vec();
    let second: Vec<_> = utility.region_basis().to_vec();
    assert_eq!(first, second);
}

#[test]
fn minimized_net_still_covers_every_instance() {
    let ts = diamond_ts();
    let synthesis = Synthesis::builder(&ts).build().unwrap();
    assert!(synthesis.was_successfully_separated());
    // The accepted set is already minimized; completeness must survive.
    assert_separation_complete(&ts, &synthesis);
}

#[test]
fn synthesis_from_parsed_text() {
    let input = r#"
.name "cycle"
.type LTS
.states
s0[initial]
s1
.labels
a
b
.arcs
s0 a s1
s1 b s0
"#;
    let ts = parse_ts(input).unwrap();
    let synthesis = Synthesis::builder(&ts).build().unwrap();
    let result = synthesis.synthesize_petri_net().unwrap();
    assert!(verify::reachability_isomorphic(&result.net, &ts));

    // Every transition carries an event label.
    for transition in result.net.transitions.iter() {
        assert!(ts.event_id(&transition.name).is_some());
    }
    // Place count matches the region side table.
    assert_eq!(result.net.places_len(), result.place_regions.len());
}

#[test]
fn distributed_check_accepts_unlabeled_systems() {
    let ts = cycle_ts();
    let synthesis = Synthesis::builder(&ts).build().unwrap();
    let result = synthesis.synthesize_petri_net().unwrap();
    assert!(verify::is_distributed_implementation(&ts, &result.net));
}
