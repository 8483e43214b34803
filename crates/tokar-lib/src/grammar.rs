//! End-to-end grammar compilation.
//!
//! Ties the stages together: parse the source, collect the rule table,
//! build the automaton, normalize it, verify the result. Authoring
//! mistakes accumulate in [`Grammar::diagnostics`]; a returned [`Error`]
//! means an internal invariant broke, not that the grammar was wrong.

use crate::atn::{self, Atn, AtnBuilder, AtnPrinter};
use crate::decl::{self, RuleTable};
use crate::diagnostics::Diagnostics;
use crate::syntax::ast;
use crate::syntax::parser::{self, Parse};
use crate::Result;

/// Compilation knobs.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    keep_unnormalized: bool,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep a copy of the automaton as built, before any normalization
    /// pass runs. Useful for dumps and tests; off by default.
    pub fn keep_unnormalized(mut self, keep: bool) -> Self {
        self.keep_unnormalized = keep;
        self
    }
}

/// A compiled grammar: the lossless parse, the rule table, and the
/// normalized automaton, plus everything reported along the way.
#[derive(Debug)]
pub struct Grammar {
    source: String,
    parse: Parse,
    table: RuleTable,
    atn: Atn,
    unnormalized: Option<Atn>,
    diagnostics: Diagnostics,
}

impl Grammar {
    pub fn compile(source: &str) -> Result<Grammar> {
        Self::compile_with(source, CompileOptions::default())
    }

    pub fn compile_with(source: &str, options: CompileOptions) -> Result<Grammar> {
        let parse = parser::parse(source);
        let mut diagnostics = parse.diagnostics().clone();

        let root = ast::Root::cast(parse.syntax()).expect("parser always produces Root");
        let table = decl::collect(&root, &mut diagnostics);

        let mut graph = AtnBuilder::new(&table, &mut diagnostics).build();
        let unnormalized = options.keep_unnormalized.then(|| graph.deep_clone());

        atn::epsilon::remove(&mut graph);
        atn::negation::remove(&mut graph);
        atn::disambiguate::run(&mut graph);
        atn::verify(&graph, true)?;

        Ok(Grammar {
            source: source.to_string(),
            parse,
            table,
            atn: graph,
            unnormalized,
            diagnostics,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn parse(&self) -> &Parse {
        &self.parse
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    pub fn atn(&self) -> &Atn {
        &self.atn
    }

    /// The automaton as built, if requested via
    /// [`CompileOptions::keep_unnormalized`].
    pub fn unnormalized(&self) -> Option<&Atn> {
        self.unnormalized.as_ref()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// No errors anywhere in the pipeline. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        !self.diagnostics.has_errors()
    }

    pub fn dump_atn(&self) -> String {
        AtnPrinter::with_table(&self.atn, &self.table).to_string()
    }

    pub fn dump_unnormalized(&self) -> Option<String> {
        self.unnormalized
            .as_ref()
            .map(|atn| AtnPrinter::with_table(atn, &self.table).to_string())
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use insta::assert_snapshot;

    use super::*;

    fn dump(source: &str) -> String {
        let grammar = Grammar::compile(source).unwrap();
        assert!(grammar.is_valid(), "{}", grammar.diagnostics().render(source));
        grammar.dump_atn()
    }

    #[test]
    fn single_literal_rule() {
        let grammar = Grammar::compile_with(
            "A : 'a' ;",
            CompileOptions::new().keep_unnormalized(true),
        )
        .unwrap();
        assert!(grammar.is_valid());
        assert_snapshot!(grammar.dump_unnormalized().unwrap(), @r#"
        mode default = S0
        A = S1
        S0: ε → S1
        S1: ε → S2
        S2: 'a' → S3
        S3: end(A) → S4
        S4: ∅
        "#);
        assert_snapshot!(grammar.dump_atn(), @r#"
        mode default = S0
        A = S1
        S0: 'a' → S3
        S1: 'a' → S3
        S3: end(A) → S4
        S4: ∅
        "#);
    }

    #[test]
    fn modes_fragments_and_sets_compile_clean() {
        let grammar = Grammar::compile(indoc! {r#"
            fragment Digit : [0-9] ;
            Number : Digit Digit* ;
            mode strings ;
            Text : ~["]* ;
        "#})
        .unwrap();
        assert!(grammar.is_valid());
        // Normalized graph has no epsilons and no surviving negations.
        for id in grammar.atn().reachable() {
            for edge in grammar.atn().state(id).out_edges() {
                assert!(!edge.data.is_epsilon());
                assert!(edge.data.negation_nodes().is_empty());
            }
        }
    }

    #[test]
    fn parser_rules_reference_lexer_rules() {
        assert_snapshot!(dump("A : 'a' ;\nitem : A A ;"), @r#"
        mode default = S0
        A = S1
        item = S5
        S0: 'a' → S3
        S1: 'a' → S3
        S3: end(A) → S4
        S4: ∅
        S5: ref(A) → S7
        S7: ref(A) → S9
        S9: end(item) → S10
        S10: ∅
        "#);
    }

    #[test]
    fn invalid_grammar_still_compiles() {
        let grammar = Grammar::compile("A : missing ;").unwrap();
        assert!(!grammar.is_valid());
        assert!(grammar.diagnostics().has_errors());
    }
}
