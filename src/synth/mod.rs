//! 基于区域理论的 Petri 网综合.
//!
//! Given a finite deterministic transition system, compute regions that
//! separate every pair of states and disable every event where the input
//! disables it, then turn the regions into the places of a net whose
//! reachability graph is isomorphic to the input.

pub mod equations;
pub mod inequalities;
pub mod properties;
pub mod region;
pub mod separation;
pub mod spanning_tree;
pub mod synthesize;
pub mod trace;
pub mod utility;
pub mod verify;
pub mod word;

use thiserror::Error;

use crate::ts::system::NonDeterministicError;

/// A Parikh vector or marking was requested for a state with no path from
/// the initial state.
#[derive(Debug, Error)]
#[error("state '{state}' is unreachable from the initial state")]
pub struct UnreachableError {
    pub state: String,
}

/// Some events carry a location and others do not.
#[derive(Debug, Error)]
#[error("either all events must carry a location or none of them")]
pub struct MissingLocationError;

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error(transparent)]
    MissingLocation(#[from] MissingLocationError),
    #[error(transparent)]
    NonDeterministic(#[from] NonDeterministicError),
    #[error("the transition system has no initial state")]
    NoInitialState,
}

pub use properties::PNProperties;
pub use region::Region;
pub use spanning_tree::SpanningTree;
pub use synthesize::{Synthesis, SynthesisBuilder, SynthesizedNet};
pub use trace::{EventSink, LogSink, NullSink, TraceEvent};
pub use utility::RegionUtility;
