//! Observer hook for synthesis progress.
//!
//! The engine reports what it is doing through an [`EventSink`] handed in
//! by the caller. The default sink discards everything, keeping the core
//! free of side effects; [`LogSink`] forwards to the `log` crate.

use crate::synth::region::Region;

#[derive(Debug)]
pub enum TraceEvent<'a> {
    StrategySelected {
        name: &'static str,
    },
    BasisComputed {
        size: usize,
    },
    RegionAccepted {
        index: usize,
        region: &'a Region,
    },
    EsspFailed {
        state: &'a str,
        event: &'a str,
    },
    SspFailed {
        state: &'a str,
        other_state: &'a str,
    },
    RegionsMinimized {
        before: usize,
        after: usize,
    },
}

pub trait EventSink {
    fn emit(&mut self, event: &TraceEvent<'_>);
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &TraceEvent<'_>) {}
}

/// Forwards every event to `log::debug!`.
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&mut self, event: &TraceEvent<'_>) {
        log::debug!("synthesis: {:?}", event);
    }
}
