//! Outgoing-edge disambiguation.
//!
//! Makes every state's outgoing edges pairwise disjoint: interval edges are
//! split at all interval boundaries of the group, rule references and rule
//! ends are grouped by rule identity. A partition cell matched by edges with
//! different targets gets a fresh merge state whose outgoing edges are
//! pulled forward from the old targets; the merge state can itself end up
//! ambiguous, so whole passes repeat until one creates no new state.
//!
//! This is a local, on-demand determinization, not a subset construction:
//! only states that actually overlap pay for it, and provenance is carried
//! through every split and merge.

use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::decl::RuleId;
use crate::interval::Interval;
use crate::syntax::syntax_kind::SyntaxNode;

use super::graph::{Atn, StateId, StateKind, Transition, TransitionData};

pub fn run(atn: &mut Atn) {
    loop {
        let mut created = false;
        for root in atn.roots() {
            created |= pass(atn, root);
        }
        if !created {
            break;
        }
    }
}

fn pass(atn: &mut Atn, root: StateId) -> bool {
    let mut created = false;
    // Merge states memoized by the exact set of old targets, so two groups
    // needing the same merge share one state.
    let mut memo: HashMap<BTreeSet<StateId>, StateId> = HashMap::new();
    // First replacement wins: once an old target has a merge state, later
    // pulled edges follow it there.
    let mut replacement: HashMap<StateId, StateId> = HashMap::new();
    for id in atn.reachable_from(root) {
        created |= disambiguate_state(atn, id, &mut memo, &mut replacement);
    }
    created
}

/// One planned outgoing edge of the state being rewritten.
struct Plan {
    /// (minimum original edge index, interval cell start) keeps emission
    /// close to the original edge order.
    order: (usize, i64),
    action: Action,
}

enum Action {
    /// Original edge survives untouched.
    Keep(Rc<Transition>),
    /// One edge replaces a group aiming at a single target.
    Emit {
        target: StateId,
        data: TransitionData,
    },
    /// Group aims at several targets; route through a merge state.
    Fresh {
        targets: BTreeSet<StateId>,
        data: TransitionData,
    },
}

fn disambiguate_state(
    atn: &mut Atn,
    id: StateId,
    memo: &mut HashMap<BTreeSet<StateId>, StateId>,
    replacement: &mut HashMap<StateId, StateId>,
) -> bool {
    let outs: Vec<Rc<Transition>> = atn.state(id).out_edges().to_vec();
    if outs.is_empty() {
        return false;
    }

    let mut plans: Vec<Plan> = Vec::new();
    plan_intervals(&outs, &mut plans);
    plan_by_rule(
        &outs,
        |data| match data {
            TransitionData::RuleRef { rule, .. } => Some(*rule),
            _ => None,
        },
        ruleref_data,
        &mut plans,
    );
    plan_by_rule(
        &outs,
        |data| match data {
            TransitionData::End { rule, .. } => Some(*rule),
            _ => None,
        },
        end_data,
        &mut plans,
    );
    // Anything else (stray epsilons before normalization) is left alone.
    for (index, edge) in outs.iter().enumerate() {
        if edge.data.is_epsilon() {
            plans.push(Plan {
                order: (index, 0),
                action: Action::Keep(edge.clone()),
            });
        }
    }

    let untouched = plans.len() == outs.len()
        && plans.iter().all(|p| matches!(p.action, Action::Keep(_)));
    if untouched {
        return false;
    }

    plans.sort_by_key(|p| p.order);

    // Snapshot before rebinding: pulling forward from this state must see
    // its original continuation edges, not the rewritten set.
    let old_outs = outs.clone();
    for edge in &outs {
        atn.unbind(edge);
    }
    let orphan_seeds: Vec<StateId> = outs.iter().map(|e| e.target).collect();

    let mut created = false;
    for plan in plans {
        match plan.action {
            Action::Keep(edge) => atn.bind(edge),
            Action::Emit { target, data } => {
                atn.connect(id, target, data);
            }
            Action::Fresh { targets, data } => {
                if let Some(&merge) = memo.get(&targets) {
                    atn.connect(id, merge, data);
                } else {
                    let merge = atn.add_state(StateKind::Basic);
                    created = true;
                    memo.insert(targets.clone(), merge);
                    for &target in &targets {
                        replacement.entry(target).or_insert(merge);
                    }
                    atn.connect(id, merge, data);
                    pull_forward(atn, merge, &targets, id, &old_outs, replacement);
                }
            }
        }
    }

    atn.prune_orphans(orphan_seeds);
    created
}

/// Split interval edges at every boundary of the group, then plan one edge
/// per occupied partition cell.
fn plan_intervals(outs: &[Rc<Transition>], plans: &mut Vec<Plan>) {
    let mut live: Vec<(usize, &Rc<Transition>, Interval)> = Vec::new();
    for (index, edge) in outs.iter().enumerate() {
        if let TransitionData::Interval { interval, .. } = &edge.data {
            if interval.is_empty() {
                // Placeholder edges from malformed grammar constructs.
                plans.push(Plan {
                    order: (index, 0),
                    action: Action::Keep(edge.clone()),
                });
            } else {
                live.push((index, edge, *interval));
            }
        }
    }
    if live.is_empty() {
        return;
    }

    let mut points: BTreeSet<i64> = BTreeSet::new();
    for (_, _, interval) in &live {
        points.insert(interval.start as i64);
        points.insert(interval.end as i64 + 1);
    }
    let points: Vec<i64> = points.into_iter().collect();

    for window in points.windows(2) {
        let cell = Interval::new(window[0] as i32, (window[1] - 1) as i32);
        let members: Vec<&(usize, &Rc<Transition>, Interval)> = live
            .iter()
            .filter(|(_, _, interval)| interval.contains(cell.start))
            .collect();
        let Some(&&(first_index, first_edge, first_interval)) = members.first() else {
            continue;
        };

        if members.len() == 1 && first_interval == cell {
            plans.push(Plan {
                order: (first_index, cell.start as i64),
                action: Action::Keep(first_edge.clone()),
            });
            continue;
        }

        let min_index = members.iter().map(|(i, _, _)| *i).min().unwrap_or(first_index);
        let edges: Vec<&Rc<Transition>> = members.iter().map(|(_, e, _)| *e).collect();
        let targets: BTreeSet<StateId> = edges.iter().map(|e| e.target).collect();
        let data = TransitionData::Interval {
            interval: cell,
            nodes: merged_provenance(&edges),
            negations: merged_negations(&edges),
        };
        let order = (min_index, cell.start as i64);
        plans.push(if targets.len() == 1 {
            Plan {
                order,
                action: Action::Emit {
                    target: first_edge.target,
                    data,
                },
            }
        } else {
            Plan {
                order,
                action: Action::Fresh { targets, data },
            }
        });
    }
}

/// Group rule-reference or end edges by rule identity.
fn plan_by_rule(
    outs: &[Rc<Transition>],
    rule_of: impl Fn(&TransitionData) -> Option<RuleId>,
    make_data: impl Fn(RuleId, &[&Rc<Transition>]) -> TransitionData,
    plans: &mut Vec<Plan>,
) {
    let mut groups: IndexMap<RuleId, Vec<(usize, &Rc<Transition>)>> = IndexMap::new();
    for (index, edge) in outs.iter().enumerate() {
        if let Some(rule) = rule_of(&edge.data) {
            groups.entry(rule).or_default().push((index, edge));
        }
    }

    for (rule, members) in groups {
        let min_index = members.iter().map(|(i, _)| *i).min().unwrap_or(0);
        let order = (min_index, 0);
        if members.len() == 1 {
            plans.push(Plan {
                order,
                action: Action::Keep(members[0].1.clone()),
            });
            continue;
        }
        let edges: Vec<&Rc<Transition>> = members.iter().map(|(_, e)| *e).collect();
        let targets: BTreeSet<StateId> = edges.iter().map(|e| e.target).collect();
        let data = make_data(rule, &edges);
        plans.push(if targets.len() == 1 {
            Plan {
                order,
                action: Action::Emit {
                    target: edges[0].target,
                    data,
                },
            }
        } else {
            Plan {
                order,
                action: Action::Fresh { targets, data },
            }
        });
    }
}

fn ruleref_data(rule: RuleId, edges: &[&Rc<Transition>]) -> TransitionData {
    TransitionData::RuleRef {
        rule,
        nodes: merged_provenance(edges),
        negations: merged_negations(edges),
    }
}

fn end_data(rule: RuleId, edges: &[&Rc<Transition>]) -> TransitionData {
    TransitionData::End {
        rule,
        nodes: merged_provenance(edges),
    }
}

/// Copy the old targets' continuation edges onto a fresh merge state.
///
/// Self-loops on an old target become self-loops on the merge state. Edges
/// whose target was itself replaced follow the replacement; when that would
/// bend a non-loop edge back onto the merge state the clone is dropped,
/// because the merged edge emitted for its cell already covers it.
fn pull_forward(
    atn: &mut Atn,
    merge: StateId,
    targets: &BTreeSet<StateId>,
    current: StateId,
    current_old_outs: &[Rc<Transition>],
    replacement: &HashMap<StateId, StateId>,
) {
    for &target in targets {
        let outs: Vec<Rc<Transition>> = if target == current {
            current_old_outs.to_vec()
        } else {
            atn.state(target).out_edges().to_vec()
        };
        for edge in outs {
            let resolved = if edge.target == target {
                merge
            } else {
                *replacement.get(&edge.target).unwrap_or(&edge.target)
            };
            if resolved == merge && edge.target != target {
                continue;
            }
            let duplicate = atn
                .state(merge)
                .out_edges()
                .iter()
                .any(|e| e.target == resolved && e.data == edge.data);
            if duplicate {
                continue;
            }
            atn.connect(merge, resolved, edge.data.clone());
        }
    }
}

fn merged_provenance(edges: &[&Rc<Transition>]) -> Vec<SyntaxNode> {
    let mut nodes: Vec<SyntaxNode> = Vec::new();
    for edge in edges {
        for node in edge.data.grammar_nodes() {
            if !nodes.contains(node) {
                nodes.push(node.clone());
            }
        }
    }
    nodes.sort_by_key(|n| (n.text_range().start(), n.text_range().end()));
    nodes
}

fn merged_negations(edges: &[&Rc<Transition>]) -> Vec<SyntaxNode> {
    let mut negations: Vec<SyntaxNode> = Vec::new();
    for edge in edges {
        for node in edge.data.negation_nodes() {
            if !negations.contains(node) {
                negations.push(node.clone());
            }
        }
    }
    negations
}
