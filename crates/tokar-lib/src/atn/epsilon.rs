//! Epsilon edge elimination.
//!
//! For every state with incoming epsilon edges, each remaining outgoing edge
//! is cloned back onto the epsilon's source, then the epsilon is deleted.
//! States entered only through epsilons become dead and are dropped (roots
//! excepted). Re-sourced edges only ever move forward along the traversal,
//! so one top-down walk per root suffices; no fixed point is needed.

use std::collections::VecDeque;
use std::rc::Rc;

use crate::syntax::syntax_kind::SyntaxNode;

use super::graph::{Atn, StateId, Transition, TransitionData};

pub fn remove(atn: &mut Atn) {
    for root in atn.roots() {
        remove_from(atn, root);
    }
}

fn remove_from(atn: &mut Atn, root: StateId) {
    let mut seen = vec![false; atn.state_count()];
    let mut queue = VecDeque::new();
    seen[root as usize] = true;
    queue.push_back(root);

    while let Some(id) = queue.pop_front() {
        // Discover successors before rewiring; targets stay valid because
        // this pass never reroutes an edge away from its target.
        for edge in atn.state(id).out_edges() {
            if !seen[edge.target as usize] {
                seen[edge.target as usize] = true;
                queue.push_back(edge.target);
            }
        }

        let epsilon_in: Vec<Rc<Transition>> = atn
            .state(id)
            .in_edges()
            .iter()
            .filter(|e| e.data.is_epsilon())
            .cloned()
            .collect();
        if epsilon_in.is_empty() {
            continue;
        }
        let drop_state =
            !atn.is_root(id) && epsilon_in.len() == atn.state(id).in_edges().len();
        let outs: Vec<Rc<Transition>> = atn.state(id).out_edges().to_vec();

        for eps in &epsilon_in {
            let source = eps.source;
            if source == id {
                continue;
            }
            for out in &outs {
                // A cloned epsilon pointing straight back at its new source
                // would be a self-epsilon; skip it.
                if out.data.is_epsilon() && out.target == source {
                    continue;
                }
                let data = match &out.data {
                    TransitionData::End { rule, .. } => TransitionData::End {
                        rule: *rule,
                        nodes: end_provenance(atn, source, eps),
                    },
                    other => other.clone(),
                };
                let duplicate = atn
                    .state(source)
                    .out_edges()
                    .iter()
                    .any(|e| e.target == out.target && e.data == data);
                if duplicate {
                    continue;
                }
                atn.connect(source, out.target, data);
            }
        }

        if drop_state {
            for edge in atn.state(id).in_edges().to_vec() {
                atn.unbind(&edge);
            }
            for edge in atn.state(id).out_edges().to_vec() {
                atn.unbind(&edge);
            }
        } else {
            for eps in &epsilon_in {
                atn.unbind(eps);
            }
        }
    }
}

/// Provenance for a re-sourced `End` edge. End edges carry no grammar nodes
/// of their own beyond the rule declaration, so moving one borrows evidence:
/// the epsilon's node when the new source is a root, otherwise whatever real
/// edges enter the new source.
fn end_provenance(atn: &Atn, source: StateId, eps: &Transition) -> Vec<SyntaxNode> {
    if atn.is_root(source) {
        return eps.data.grammar_nodes().to_vec();
    }
    let mut nodes: Vec<SyntaxNode> = Vec::new();
    for edge in atn.state(source).in_edges() {
        if edge.data.is_epsilon() {
            continue;
        }
        for node in edge.data.grammar_nodes() {
            if !nodes.contains(node) {
                nodes.push(node.clone());
            }
        }
    }
    nodes.sort_by_key(|n| (n.text_range().start(), n.text_range().end()));
    nodes
}
