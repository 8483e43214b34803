//! Human-readable automaton dumps.
//!
//! The text format exists for snapshot tests and debugging; Graphviz output
//! for staring at a graph when a snapshot is not enough. Both walk only
//! reachable states, in `StateId` order, so dumps are stable across runs.

use std::fmt;

use crate::decl::{RuleId, RuleTable};

use super::graph::{Atn, StateId, Transition, TransitionData};

/// Renders an [`Atn`] as text via [`fmt::Display`], or as Graphviz via
/// [`AtnPrinter::to_dot`]. Without a rule table, rules print by id.
pub struct AtnPrinter<'a> {
    atn: &'a Atn,
    table: Option<&'a RuleTable>,
}

impl<'a> AtnPrinter<'a> {
    pub fn new(atn: &'a Atn) -> Self {
        Self { atn, table: None }
    }

    pub fn with_table(atn: &'a Atn, table: &'a RuleTable) -> Self {
        Self {
            atn,
            table: Some(table),
        }
    }

    fn rule_name(&self, rule: RuleId) -> String {
        match self.table {
            Some(table) => table.name(rule).to_string(),
            None => format!("rule{rule}"),
        }
    }

    fn edge_label(&self, edge: &Transition) -> String {
        let label = match &edge.data {
            TransitionData::Epsilon { .. } => "ε".to_string(),
            TransitionData::Interval { interval, .. } => interval.to_string(),
            TransitionData::RuleRef { rule, .. } => format!("ref({})", self.rule_name(*rule)),
            TransitionData::End { rule, .. } => format!("end({})", self.rule_name(*rule)),
        };
        if edge.data.negation_nodes().is_empty() {
            label
        } else {
            format!("~{label}")
        }
    }

    fn reachable_sorted(&self) -> Vec<StateId> {
        let mut states = self.atn.reachable();
        states.sort_unstable();
        states
    }

    /// Graphviz rendering: entry points doubled, rule ends dotted, edges
    /// still under negation red.
    pub fn to_dot(&self) -> String {
        use std::fmt::Write;

        let mut out = String::from("digraph atn {\n  rankdir=LR;\n  node [shape=circle];\n");
        let roots = self.atn.roots();
        for &root in &roots {
            let _ = writeln!(out, "  S{root} [shape=doublecircle];");
        }
        for id in self.reachable_sorted() {
            for edge in self.atn.state(id).out_edges() {
                let mut attrs = format!("label=\"{}\"", self.edge_label(edge));
                if matches!(edge.data, TransitionData::End { .. }) {
                    attrs.push_str(", style=dotted");
                }
                if !edge.data.negation_nodes().is_empty() {
                    attrs.push_str(", color=red");
                }
                let _ = writeln!(out, "  S{} -> S{} [{attrs}];", id, edge.target);
            }
        }
        out.push_str("}\n");
        out
    }
}

impl fmt::Display for AtnPrinter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (mode, &id) in &self.atn.mode_starts {
            writeln!(f, "mode {mode} = S{id}")?;
        }
        for (&rule, &id) in &self.atn.lexer_starts {
            writeln!(f, "{} = S{id}", self.rule_name(rule))?;
        }
        for (&rule, &id) in &self.atn.parser_starts {
            writeln!(f, "{} = S{id}", self.rule_name(rule))?;
        }
        for id in self.reachable_sorted() {
            let outs = self.atn.state(id).out_edges();
            if outs.is_empty() {
                writeln!(f, "S{id}: ∅")?;
                continue;
            }
            write!(f, "S{id}: ")?;
            for (i, edge) in outs.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} → S{}", self.edge_label(edge), edge.target)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
