//! Automaton construction from the rule table.
//!
//! Bottom-up structural recursion over rule bodies: every construct yields a
//! [`Fragment`] with one entry and one exit state, and composite constructs
//! wire fragments together with epsilon edges. The result is deliberately
//! epsilon-heavy; normalization cleans it up afterwards.
//!
//! Malformed constructs (empty literal, reversed range) are reported and
//! patched with an empty-interval edge so the rest of the grammar still
//! produces a graph.

use crate::decl::RuleTable;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::interval::Interval;
use crate::syntax::ast;
use crate::syntax::syntax_kind::{SyntaxKind, SyntaxNode};

use super::graph::{Atn, StateId, StateKind, TransitionData};

/// Entry and exit of a sub-automaton under construction.
#[derive(Debug, Clone, Copy)]
struct Fragment {
    start: StateId,
    end: StateId,
}

pub struct AtnBuilder<'a> {
    table: &'a RuleTable,
    diagnostics: &'a mut Diagnostics,
    atn: Atn,
    rule_states: Vec<StateId>,
    /// Negated elements enclosing the construct currently being built,
    /// outermost first. Copied onto every real edge.
    negation_stack: Vec<SyntaxNode>,
}

impl<'a> AtnBuilder<'a> {
    pub fn new(table: &'a RuleTable, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            table,
            diagnostics,
            atn: Atn::new(),
            rule_states: Vec::new(),
            negation_stack: Vec::new(),
        }
    }

    pub fn build(mut self) -> Atn {
        // Mode states first so they get the lowest ids in dumps.
        for (mode, _) in self.table.modes() {
            let id = self.atn.add_state(StateKind::Mode(mode.to_string()));
            self.atn.mode_starts.insert(mode.to_string(), id);
        }

        for (id, rule) in self.table.iter() {
            let rule_state = self.atn.add_state(StateKind::Rule(id));
            self.rule_states.push(rule_state);

            let body = match &rule.body {
                Some(union) => self.build_union(union),
                None => self.empty_fragment(rule.node.clone()),
            };
            self.atn.connect(
                rule_state,
                body.start,
                TransitionData::Epsilon {
                    node: rule.node.clone(),
                },
            );
            let terminal = self.atn.add_state(StateKind::Basic);
            self.atn.connect(
                body.end,
                terminal,
                TransitionData::End {
                    rule: id,
                    nodes: vec![rule.node.clone()],
                },
            );
        }

        for (mode, ids) in self.table.modes() {
            let Some(&mode_state) = self.atn.mode_starts.get(mode) else {
                continue;
            };
            for &rule_id in ids {
                let rule_state = self.rule_states[rule_id as usize];
                let node = self.table.rule(rule_id).node.clone();
                self.atn
                    .connect(mode_state, rule_state, TransitionData::Epsilon { node });
            }
        }

        for (id, rule) in self.table.iter() {
            let rule_state = self.rule_states[id as usize];
            if rule.is_lexer {
                // Fragment and recursive lexer rules get a standalone copy so
                // they can be entered directly without going through a mode.
                let entry = if rule.is_fragment || rule.is_recursive {
                    self.atn.clone_subgraph(rule_state)
                } else {
                    rule_state
                };
                self.atn.lexer_starts.insert(id, entry);
            } else {
                self.atn.parser_starts.insert(id, rule_state);
            }
        }

        self.atn
    }

    fn build_union(&mut self, union: &ast::Union) -> Fragment {
        let mut alternatives = Vec::new();
        for alt in union.alts() {
            let fragment = self.build_alt(&alt);
            alternatives.push((alt, fragment));
        }
        match alternatives.len() {
            0 => self.empty_fragment(union.syntax().clone()),
            1 => alternatives[0].1,
            _ => {
                let start = self.atn.add_state(StateKind::Basic);
                let end = self.atn.add_state(StateKind::Basic);
                for (alt, fragment) in alternatives {
                    let node = alt.syntax().clone();
                    self.atn.connect(
                        start,
                        fragment.start,
                        TransitionData::Epsilon { node: node.clone() },
                    );
                    self.atn
                        .connect(fragment.end, end, TransitionData::Epsilon { node });
                }
                Fragment { start, end }
            }
        }
    }

    fn build_alt(&mut self, alt: &ast::Alt) -> Fragment {
        let elements: Vec<ast::Element> = alt.elements().collect();
        let Some(first) = elements.first() else {
            // Empty alternative still needs a traceable location.
            return self.empty_fragment(alt.syntax().clone());
        };

        let mut fragment = self.build_element(first);
        for element in &elements[1..] {
            let next = self.build_element(element);
            self.atn.connect(
                fragment.end,
                next.start,
                TransitionData::Epsilon {
                    node: element.syntax().clone(),
                },
            );
            fragment.end = next.end;
        }
        fragment
    }

    fn build_element(&mut self, element: &ast::Element) -> Fragment {
        let negated = element.is_negated();
        if negated {
            self.negation_stack.push(element.syntax().clone());
        }
        let fragment = match element.atom() {
            Some(atom) => self.build_atom(&atom),
            // Parse error already reported; keep the sequence connected.
            None => self.empty_fragment(element.syntax().clone()),
        };
        if negated {
            self.negation_stack.pop();
        }

        if let Some(quantifier) = element.quantifier() {
            let node = element.syntax().clone();
            match quantifier.kind() {
                SyntaxKind::Question => {
                    self.atn.connect(
                        fragment.start,
                        fragment.end,
                        TransitionData::Epsilon { node },
                    );
                }
                SyntaxKind::Star => {
                    self.atn.connect(
                        fragment.end,
                        fragment.start,
                        TransitionData::Epsilon { node: node.clone() },
                    );
                    self.atn.connect(
                        fragment.start,
                        fragment.end,
                        TransitionData::Epsilon { node },
                    );
                }
                SyntaxKind::Plus => {
                    self.atn.connect(
                        fragment.end,
                        fragment.start,
                        TransitionData::Epsilon { node },
                    );
                }
                _ => {}
            }
        }
        fragment
    }

    fn build_atom(&mut self, atom: &ast::Atom) -> Fragment {
        match atom {
            ast::Atom::Literal(literal) => self.build_literal(literal),
            ast::Atom::Range(range) => self.build_range(range),
            ast::Atom::Set(set) => self.build_set(set),
            ast::Atom::RuleRef(reference) => self.build_rule_ref(reference),
            ast::Atom::Wildcard(wildcard) => {
                self.interval_fragment(Interval::FULL, wildcard.syntax().clone())
            }
            ast::Atom::Group(group) => match group.body() {
                Some(union) => self.build_union(&union),
                None => self.empty_fragment(group.syntax().clone()),
            },
        }
    }

    /// A literal becomes a chain of single-character interval edges, all
    /// tagged with the literal node.
    fn build_literal(&mut self, literal: &ast::Literal) -> Fragment {
        let node = literal.syntax().clone();
        let chars = literal.cooked();
        if chars.is_empty() {
            self.diagnostics
                .report(DiagnosticKind::EmptyStringOrSet, node.text_range())
                .emit();
            return self.interval_fragment(Interval::EMPTY, node);
        }

        let start = self.atn.add_state(StateKind::Basic);
        let mut prev = start;
        for c in chars {
            let next = self.atn.add_state(StateKind::Basic);
            self.connect_interval(prev, next, Interval::of(c), node.clone());
            prev = next;
        }
        Fragment { start, end: prev }
    }

    fn build_range(&mut self, range: &ast::Range) -> Fragment {
        let node = range.syntax().clone();
        let lo = self.range_bound(range.start_literal());
        let hi = self.range_bound(range.end_literal());
        let (Some(lo), Some(hi)) = (lo, hi) else {
            return self.interval_fragment(Interval::EMPTY, node);
        };
        if lo > hi {
            self.diagnostics
                .report(DiagnosticKind::ReversedInterval, node.text_range())
                .emit();
            return self.interval_fragment(Interval::EMPTY, node);
        }
        self.interval_fragment(Interval::new(lo as i32, hi as i32), node)
    }

    /// Cook a range bound down to its single character. Reports when the
    /// literal holds zero or several; a missing token was already reported
    /// by the parser.
    fn range_bound(&mut self, token: Option<crate::syntax::syntax_kind::SyntaxToken>) -> Option<char> {
        let token = token?;
        let chars = ast::cook_literal(token.text());
        if chars.len() == 1 {
            chars.first().copied()
        } else {
            self.diagnostics
                .report(
                    DiagnosticKind::MultiCharacterLiteralInRange,
                    token.text_range(),
                )
                .emit();
            None
        }
    }

    /// A set fans out one interval edge per member between a shared start
    /// and end state. Overlapping members are fine; the disambiguator makes
    /// them disjoint later.
    fn build_set(&mut self, set: &ast::Set) -> Fragment {
        let node = set.syntax().clone();
        let ranges = set.ranges();
        if ranges.is_empty() {
            self.diagnostics
                .report(DiagnosticKind::EmptyStringOrSet, node.text_range())
                .emit();
            return self.interval_fragment(Interval::EMPTY, node);
        }

        let start = self.atn.add_state(StateKind::Basic);
        let end = self.atn.add_state(StateKind::Basic);
        for (lo, hi) in ranges {
            let interval = if lo > hi {
                self.diagnostics
                    .report(DiagnosticKind::ReversedInterval, node.text_range())
                    .emit();
                Interval::EMPTY
            } else {
                Interval::new(lo as i32, hi as i32)
            };
            self.connect_interval(start, end, interval, node.clone());
        }
        Fragment { start, end }
    }

    fn build_rule_ref(&mut self, reference: &ast::RuleRef) -> Fragment {
        let node = reference.syntax().clone();
        let rule = reference
            .name()
            .and_then(|token| self.table.id_of(token.text()));
        let start = self.atn.add_state(StateKind::Basic);
        let end = self.atn.add_state(StateKind::Basic);
        match rule {
            Some(rule) => {
                self.atn.connect(
                    start,
                    end,
                    TransitionData::RuleRef {
                        rule,
                        nodes: vec![node],
                        negations: self.negation_stack.clone(),
                    },
                );
            }
            // Unresolved names were reported during collection; an empty
            // edge keeps the graph connected.
            None => self.connect_interval(start, end, Interval::EMPTY, node),
        }
        Fragment { start, end }
    }

    fn interval_fragment(&mut self, interval: Interval, node: SyntaxNode) -> Fragment {
        let start = self.atn.add_state(StateKind::Basic);
        let end = self.atn.add_state(StateKind::Basic);
        self.connect_interval(start, end, interval, node);
        Fragment { start, end }
    }

    fn connect_interval(
        &mut self,
        source: StateId,
        target: StateId,
        interval: Interval,
        node: SyntaxNode,
    ) {
        self.atn.connect(
            source,
            target,
            TransitionData::Interval {
                interval,
                nodes: vec![node],
                negations: self.negation_stack.clone(),
            },
        );
    }

    fn empty_fragment(&mut self, node: SyntaxNode) -> Fragment {
        let start = self.atn.add_state(StateKind::Basic);
        let end = self.atn.add_state(StateKind::Basic);
        self.atn
            .connect(start, end, TransitionData::Epsilon { node });
        Fragment { start, end }
    }
}
