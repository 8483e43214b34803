//! Rule declaration collection.
//!
//! Walks the syntax tree once and produces a [`RuleTable`]: every rule keyed
//! by name in declaration order, plus the mode each lexer rule belongs to.
//! Reference resolution, duplicate detection, and recursion marking happen
//! here so later stages can assume a structurally sound table.

use indexmap::IndexMap;
use rowan::TextRange;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::syntax::ast;
use crate::syntax::syntax_kind::{SyntaxKind, SyntaxNode};


/// Index into the rule table, in declaration order.
pub type RuleId = u32;

/// Mode that lexer rules land in when no `mode` declaration precedes them.
pub const DEFAULT_MODE: &str = "default";

/// A collected rule declaration.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    /// Uppercase initial marks a lexer rule, lowercase a parser rule.
    pub is_lexer: bool,
    pub is_fragment: bool,
    /// Whether the rule can reach itself through references.
    pub is_recursive: bool,
    /// `None` when the declaration had no parseable body.
    pub body: Option<ast::Union>,
    /// The `RuleDecl` syntax node, used as provenance for accept edges.
    pub node: SyntaxNode,
}

/// All rules of a grammar, with mode membership for lexer rules.
///
/// On duplicate names the first declaration wins; later ones are reported
/// and dropped, so `RuleId`s are stable indices into insertion order.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: IndexMap<String, Rule>,
    modes: IndexMap<String, Vec<RuleId>>,
}

impl RuleTable {
    pub fn id_of(&self, name: &str) -> Option<RuleId> {
        self.rules.get_index_of(name).map(|i| i as RuleId)
    }

    /// Panics if `id` is out of bounds; ids handed out by this table are
    /// always valid.
    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id as usize]
    }

    pub fn name(&self, id: RuleId) -> &str {
        self.rules
            .get_index(id as usize)
            .map(|(name, _)| name.as_str())
            .unwrap_or("<unknown>")
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.rules
            .values()
            .enumerate()
            .map(|(id, rule)| (id as RuleId, rule))
    }

    /// Modes in declaration order; the implicit default mode comes first.
    pub fn modes(&self) -> impl Iterator<Item = (&str, &[RuleId])> {
        self.modes
            .iter()
            .map(|(name, ids)| (name.as_str(), ids.as_slice()))
    }
}

/// Collect rule declarations from a parsed grammar.
///
/// Always returns a table; authoring mistakes are reported and patched
/// (duplicates dropped, unresolved references left dangling for the
/// builder to stub out).
pub fn collect(root: &ast::Root, diagnostics: &mut Diagnostics) -> RuleTable {
    let mut rules: IndexMap<String, Rule> = IndexMap::new();
    let mut modes: IndexMap<String, Vec<RuleId>> = IndexMap::new();
    modes.insert(DEFAULT_MODE.to_string(), Vec::new());
    let mut current_mode = DEFAULT_MODE.to_string();

    for item in root.items() {
        match item {
            ast::Item::Mode(mode) => {
                let Some(name) = mode.name() else { continue };
                current_mode = name.text().to_string();
                modes.entry(current_mode.clone()).or_default();
            }
            ast::Item::Rule(decl) => {
                let Some(name_token) = decl.name() else { continue };
                let name = name_token.text().to_string();

                if let Some(existing) = rules.get(&name) {
                    diagnostics
                        .report(DiagnosticKind::DuplicateRule, name_token.text_range())
                        .message(&name)
                        .related_to("first defined here", decl_name_range(&existing.node))
                        .emit();
                    continue;
                }

                let is_lexer = name.chars().next().is_some_and(char::is_uppercase);
                let mut is_fragment = decl.is_fragment();
                if is_fragment && !is_lexer {
                    diagnostics
                        .report(
                            DiagnosticKind::FragmentOnParserRule,
                            fragment_keyword_range(&decl),
                        )
                        .emit();
                    // The keyword has no effect on parser rules.
                    is_fragment = false;
                }

                let id = rules.len() as RuleId;
                rules.insert(
                    name.clone(),
                    Rule {
                        name,
                        is_lexer,
                        is_fragment,
                        is_recursive: false,
                        body: decl.body(),
                        node: decl.syntax().clone(),
                    },
                );
                if is_lexer && !is_fragment {
                    modes.entry(current_mode.clone()).or_default().push(id);
                }
            }
        }
    }

    resolve_references(&rules, diagnostics);
    check_negations(&rules, diagnostics);
    mark_recursion(&mut rules);

    RuleTable { rules, modes }
}

fn decl_name_range(node: &SyntaxNode) -> TextRange {
    ast::RuleDecl::cast(node.clone())
        .and_then(|decl| decl.name())
        .map(|token| token.text_range())
        .unwrap_or_else(|| node.text_range())
}

fn fragment_keyword_range(decl: &ast::RuleDecl) -> TextRange {
    decl.syntax()
        .children_with_tokens()
        .filter_map(|it| it.into_token())
        .find(|t| t.kind() == SyntaxKind::KwFragment)
        .map(|t| t.text_range())
        .unwrap_or_else(|| decl.syntax().text_range())
}

/// Report every reference to a name the table doesn't contain.
fn resolve_references(rules: &IndexMap<String, Rule>, diagnostics: &mut Diagnostics) {
    for rule in rules.values() {
        let Some(body) = &rule.body else { continue };
        for reference in references_in(body) {
            let Some(token) = reference.name() else {
                continue;
            };
            if !rules.contains_key(token.text()) {
                diagnostics
                    .report(DiagnosticKind::UndefinedReference, token.text_range())
                    .message(token.text())
                    .emit();
            }
        }
    }
}

/// Negation is defined over character intervals only. A negated element
/// whose atom contains a rule reference (directly or inside a group) has
/// no interval semantics, so it is rejected here.
fn check_negations(rules: &IndexMap<String, Rule>, diagnostics: &mut Diagnostics) {
    for rule in rules.values() {
        let Some(body) = &rule.body else { continue };
        for node in body.syntax().descendants() {
            let Some(element) = ast::Element::cast(node) else {
                continue;
            };
            if !element.is_negated() {
                continue;
            }
            let Some(atom) = element.atom() else { continue };
            for inner in atom.syntax().descendants() {
                if let Some(reference) = ast::RuleRef::cast(inner)
                    && let Some(token) = reference.name()
                {
                    diagnostics
                        .report(DiagnosticKind::UnsupportedNegation, token.text_range())
                        .message(token.text())
                        .emit();
                }
            }
        }
    }
}

/// Mark rules that can reach themselves through references.
///
/// Recursive lexer rules can't be inlined into their mode graph, so the
/// builder gives them standalone entry points instead.
fn mark_recursion(rules: &mut IndexMap<String, Rule>) {
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); rules.len()];
    for (id, rule) in rules.values().enumerate() {
        let Some(body) = &rule.body else { continue };
        for reference in references_in(body) {
            if let Some(token) = reference.name()
                && let Some(target) = rules.get_index_of(token.text())
            {
                adjacency[id].push(target);
            }
        }
    }

    for id in 0..adjacency.len() {
        let mut seen = vec![false; adjacency.len()];
        let mut stack = adjacency[id].clone();
        let mut recursive = false;
        while let Some(next) = stack.pop() {
            if next == id {
                recursive = true;
                break;
            }
            if seen[next] {
                continue;
            }
            seen[next] = true;
            stack.extend(adjacency[next].iter().copied());
        }
        if recursive
            && let Some((_, rule)) = rules.get_index_mut(id)
        {
            rule.is_recursive = true;
        }
    }
}

fn references_in(body: &ast::Union) -> impl Iterator<Item = ast::RuleRef> {
    body.syntax().descendants().filter_map(ast::RuleRef::cast)
}
