pub mod equivalence;

pub use equivalence::EquivalenceRelation;
