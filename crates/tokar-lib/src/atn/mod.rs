//! The automaton pipeline.
//!
//! An augmented transition network is built from the rule table, then
//! normalized by three passes run in order:
//!
//! 1. [`epsilon::remove`] replaces every epsilon edge by cloned real edges,
//!    so each surviving edge consumes input or ends a rule.
//! 2. [`negation::remove`] rewrites `~`-tagged interval edges into their
//!    complement sets, innermost negation first.
//! 3. [`disambiguate::run`] splits and merges outgoing edges until every
//!    state's edges are pairwise disjoint.
//!
//! [`verify::verify`] checks the invariants the passes rely on; a failure
//! there is a bug in a pass, not in the grammar. [`dump::AtnPrinter`]
//! renders the graph for tests and debugging.

pub mod build;
pub mod disambiguate;
pub mod dump;
pub mod epsilon;
pub mod graph;
pub mod negation;
pub mod verify;

pub use build::AtnBuilder;
pub use dump::AtnPrinter;
pub use graph::{Atn, State, StateId, StateKind, Transition, TransitionData};
pub use verify::verify;

#[cfg(test)]
mod build_tests;
#[cfg(test)]
mod epsilon_tests;
#[cfg(test)]
mod verify_tests;
