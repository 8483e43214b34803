//! Negation elimination.
//!
//! A `~`-tagged edge matches its interval during construction; this pass
//! flips the meaning. Two phases per root:
//!
//! 1. **Scope discovery.** A negated element's scope ends at the first state
//!    where an outgoing edge's grammar span reaches past the element's own
//!    span (rule `End` edges carry the declaration node, which closes scopes
//!    trailing at the end of a rule). That state is the scope's resume state.
//! 2. **Rewrite.** At each state, tagged interval edges aiming at their
//!    scope's resume state form a complement group: their intervals are
//!    unioned and complemented, and one edge per complement interval runs to
//!    the resume state. Tagged edges that aren't last in their scope are
//!    re-emitted with the tag stripped. Rule references under negation pass
//!    through untagged; they were rejected during declaration collection.
//!
//! Nested negations peel one layer per iteration, innermost first; a
//! complement-of-complement collapses back naturally on the next round.

use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::interval::IntervalSet;
use crate::syntax::syntax_kind::SyntaxNode;

use super::graph::{Atn, StateId, Transition, TransitionData};

pub fn remove(atn: &mut Atn) {
    loop {
        let mut changed = false;
        for root in atn.roots() {
            let resume = discover_scopes(atn, root);
            changed |= rewrite(atn, root, &resume);
        }
        if !changed {
            break;
        }
    }
}

/// Map each negated element node to the state where its scope ends.
fn discover_scopes(atn: &Atn, root: StateId) -> HashMap<SyntaxNode, StateId> {
    let mut resume: HashMap<SyntaxNode, StateId> = HashMap::new();
    for id in atn.reachable_from(root) {
        let state = atn.state(id);
        let mut open: Vec<SyntaxNode> = Vec::new();
        for edge in state.in_edges() {
            for node in edge.data.negation_nodes() {
                if !open.contains(node) {
                    open.push(node.clone());
                }
            }
        }
        if open.is_empty() {
            continue;
        }
        for negation in open {
            let scope_end = negation.text_range().end();
            let closes = state.out_edges().iter().any(|edge| {
                edge.data
                    .grammar_nodes()
                    .iter()
                    .any(|node| node.text_range().end() > scope_end)
            });
            if closes {
                resume.entry(negation).or_insert(id);
            }
        }
    }
    resume
}

fn rewrite(atn: &mut Atn, root: StateId, resume: &HashMap<SyntaxNode, StateId>) -> bool {
    let mut changed = false;
    for id in atn.reachable_from(root) {
        let tagged: Vec<Rc<Transition>> = atn
            .state(id)
            .out_edges()
            .iter()
            .filter(|e| !e.data.negation_nodes().is_empty())
            .cloned()
            .collect();
        if tagged.is_empty() {
            continue;
        }
        changed = true;

        // Complement groups keyed by innermost negation; everything else
        // passes through with that tag stripped.
        let mut groups: IndexMap<SyntaxNode, Vec<Rc<Transition>>> = IndexMap::new();
        let mut pass_through: Vec<Rc<Transition>> = Vec::new();
        for edge in tagged {
            let Some(innermost) = edge.data.negation_nodes().last().cloned() else {
                continue;
            };
            let is_interval = matches!(edge.data, TransitionData::Interval { .. });
            let is_last = resume.get(&innermost) == Some(&edge.target);
            if is_interval && is_last {
                groups.entry(innermost).or_default().push(edge);
            } else {
                pass_through.push(edge);
            }
        }

        let mut orphan_seeds: Vec<StateId> = Vec::new();

        for edge in pass_through {
            let data = strip_innermost(&edge.data);
            atn.unbind(&edge);
            orphan_seeds.push(edge.target);
            atn.connect(id, edge.target, data);
        }

        for (negation, members) in groups {
            let Some(&target) = resume.get(&negation) else {
                continue;
            };
            let matched: IntervalSet = members
                .iter()
                .filter_map(|edge| match &edge.data {
                    TransitionData::Interval { interval, .. } => Some(*interval),
                    _ => None,
                })
                .collect();
            let nodes = merged_provenance(&members);
            let negations = remaining_negations(&members);
            for edge in &members {
                atn.unbind(edge);
                orphan_seeds.push(edge.target);
            }
            for interval in matched.complement().intervals() {
                atn.connect(
                    id,
                    target,
                    TransitionData::Interval {
                        interval: *interval,
                        nodes: nodes.clone(),
                        negations: negations.clone(),
                    },
                );
            }
        }

        atn.prune_orphans(orphan_seeds);
    }
    changed
}

fn strip_innermost(data: &TransitionData) -> TransitionData {
    let mut stripped = data.clone();
    match &mut stripped {
        TransitionData::Interval { negations, .. } | TransitionData::RuleRef { negations, .. } => {
            negations.pop();
        }
        _ => {}
    }
    stripped
}

fn merged_provenance(members: &[Rc<Transition>]) -> Vec<SyntaxNode> {
    let mut nodes: Vec<SyntaxNode> = Vec::new();
    for edge in members {
        for node in edge.data.grammar_nodes() {
            if !nodes.contains(node) {
                nodes.push(node.clone());
            }
        }
    }
    nodes.sort_by_key(|n| (n.text_range().start(), n.text_range().end()));
    nodes
}

/// Outer tags shared by the group, minus the layer being resolved.
fn remaining_negations(members: &[Rc<Transition>]) -> Vec<SyntaxNode> {
    let mut negations: Vec<SyntaxNode> = Vec::new();
    for edge in members {
        let tags = edge.data.negation_nodes();
        for node in &tags[..tags.len().saturating_sub(1)] {
            if !negations.contains(node) {
                negations.push(node.clone());
            }
        }
    }
    negations
}
