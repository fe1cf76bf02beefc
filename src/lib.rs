//! Petri net synthesis from labeled transition systems, via regions.
//!
//! ```rust
//! use RustPNS::synth::{PNProperties, Synthesis};
//! use RustPNS::ts::TransitionSystem;
//!
//! let mut ts = TransitionSystem::new("step");
//! let s0 = ts.create_state("s0").unwrap();
//! let s1 = ts.create_state("s1").unwrap();
//! ts.set_initial(s0);
//! ts.create_arc(s0, s1, "a");
//!
//! let synthesis = Synthesis::builder(&ts)
//!     .properties(PNProperties::new().pure())
//!     .build()
//!     .unwrap();
//! assert!(synthesis.was_successfully_separated());
//! let result = synthesis.synthesize_petri_net().unwrap();
//! assert_eq!(result.net.places_len(), 1);
//! ```

pub mod net;
pub mod synth;
pub mod ts;
pub mod util;
