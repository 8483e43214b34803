//! Structural checks on the automaton.
//!
//! Run after the rewrite passes to catch bugs in them, not in user
//! grammars: a well-formed grammar can never fail these checks. Each check
//! walks only states reachable from the entry points, since pruned states
//! keep their arena slot but carry no edges.

use std::collections::HashSet;
use std::rc::Rc;

use crate::{Error, Result};

use super::graph::{Atn, StateId, Transition};

/// Checks edge-list symmetry, per-edge source consistency, and provenance
/// on real edges. With `check_no_epsilons`, any surviving epsilon edge is
/// an error too.
pub fn verify(atn: &Atn, check_no_epsilons: bool) -> Result<()> {
    let reachable = atn.reachable();

    for &id in &reachable {
        for edge in atn.state(id).out_edges() {
            if edge.source != id {
                return Err(Error::SourceMismatch { state: id });
            }
            if edge.data.is_real() && edge.data.grammar_nodes().is_empty() {
                return Err(Error::MissingProvenance { state: id });
            }
            if check_no_epsilons && edge.data.is_epsilon() {
                return Err(Error::StrayEpsilon { state: id });
            }
        }
    }

    check_symmetry(atn, &reachable)
}

/// Every stored in-edge must be the same `Rc` as some reachable out-edge,
/// and vice versa. A mismatch means a pass unbound only one side.
fn check_symmetry(atn: &Atn, reachable: &[StateId]) -> Result<()> {
    let mut from_outs: HashSet<*const Transition> = HashSet::new();
    for &id in reachable {
        for edge in atn.state(id).out_edges() {
            from_outs.insert(Rc::as_ptr(edge));
        }
    }

    let mut from_ins: HashSet<*const Transition> = HashSet::new();
    for &id in reachable {
        for edge in atn.state(id).in_edges() {
            let ptr = Rc::as_ptr(edge);
            if !from_outs.contains(&ptr) {
                return Err(Error::AsymmetricEdges { state: id });
            }
            from_ins.insert(ptr);
        }
    }

    for &id in reachable {
        for edge in atn.state(id).out_edges() {
            if !from_ins.contains(&Rc::as_ptr(edge)) {
                return Err(Error::AsymmetricEdges { state: edge.target });
            }
        }
    }

    Ok(())
}
