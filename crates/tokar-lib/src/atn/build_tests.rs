use insta::assert_snapshot;

use crate::decl::{self, RuleTable};
use crate::diagnostics::Diagnostics;
use crate::syntax::{ast, parser};

use super::build::AtnBuilder;
use super::dump::AtnPrinter;
use super::graph::Atn;

fn build(source: &str) -> (Atn, RuleTable, Diagnostics) {
    let parse = parser::parse(source);
    let mut diagnostics = parse.diagnostics().clone();
    let root = ast::Root::cast(parse.syntax()).unwrap();
    let table = decl::collect(&root, &mut diagnostics);
    let atn = AtnBuilder::new(&table, &mut diagnostics).build();
    (atn, table, diagnostics)
}

fn snapshot(source: &str) -> String {
    let (atn, table, diagnostics) = build(source);
    assert!(
        !diagnostics.has_errors(),
        "{}",
        diagnostics.render(source)
    );
    AtnPrinter::with_table(&atn, &table).to_string()
}

macro_rules! assert_built {
    ($source:expr, @$snapshot:literal) => {
        assert_snapshot!(snapshot($source), @$snapshot);
    };
}

#[test]
fn literal_rule() {
    assert_built!("A : 'a' ;", @r#"
    mode default = S0
    A = S1
    S0: ε → S1
    S1: ε → S2
    S2: 'a' → S3
    S3: end(A) → S4
    S4: ∅
    "#);
}

#[test]
fn union_fans_out_over_epsilons() {
    assert_built!("A : 'a' | 'b' ;", @r#"
    mode default = S0
    A = S1
    S0: ε → S1
    S1: ε → S6
    S2: 'a' → S3
    S3: ε → S7
    S4: 'b' → S5
    S5: ε → S7
    S6: ε → S2, ε → S4
    S7: end(A) → S8
    S8: ∅
    "#);
}

#[test]
fn optional_adds_a_skip_edge() {
    assert_built!("A : 'a'? ;", @r#"
    mode default = S0
    A = S1
    S0: ε → S1
    S1: ε → S2
    S2: 'a' → S3, ε → S3
    S3: end(A) → S4
    S4: ∅
    "#);
}

#[test]
fn star_adds_loop_and_skip_edges() {
    assert_built!("A : 'a'* ;", @r#"
    mode default = S0
    A = S1
    S0: ε → S1
    S1: ε → S2
    S2: 'a' → S3, ε → S3
    S3: ε → S2, end(A) → S4
    S4: ∅
    "#);
}

#[test]
fn plus_adds_only_the_loop_edge() {
    assert_built!("A : 'a'+ ;", @r#"
    mode default = S0
    A = S1
    S0: ε → S1
    S1: ε → S2
    S2: 'a' → S3
    S3: ε → S2, end(A) → S4
    S4: ∅
    "#);
}

#[test]
fn set_fans_out_one_edge_per_member() {
    assert_built!("A : [ab0-9] ;", @r#"
    mode default = S0
    A = S1
    S0: ε → S1
    S1: ε → S2
    S2: 'a' → S3, 'b' → S3, '0'..'9' → S3
    S3: end(A) → S4
    S4: ∅
    "#);
}

#[test]
fn negated_set_keeps_its_tag() {
    assert_built!("A : ~[ab] ;", @r#"
    mode default = S0
    A = S1
    S0: ε → S1
    S1: ε → S2
    S2: ~'a' → S3, ~'b' → S3
    S3: end(A) → S4
    S4: ∅
    "#);
}

#[test]
fn modes_partition_lexer_entry_edges() {
    assert_built!("A : 'a' ;\nmode other ;\nB : 'b' ;", @r#"
    mode default = S0
    mode other = S1
    A = S2
    B = S6
    S0: ε → S2
    S1: ε → S6
    S2: ε → S3
    S3: 'a' → S4
    S4: end(A) → S5
    S5: ∅
    S6: ε → S7
    S7: 'b' → S8
    S8: end(B) → S9
    S9: ∅
    "#);
}

#[test]
fn fragments_get_a_standalone_entry_copy() {
    // F never appears in a mode; its entry is a disconnected copy, and A
    // reaches it only through the rule reference.
    assert_built!("fragment F : 'f' ;\nA : F ;", @r#"
    mode default = S0
    F = S9
    A = S5
    S0: ε → S5
    S5: ε → S6
    S6: ref(F) → S7
    S7: end(A) → S8
    S8: ∅
    S9: ε → S10
    S10: 'f' → S11
    S11: end(F) → S12
    S12: ∅
    "#);
}

#[test]
fn recursive_lexer_rule_gets_a_copied_entry() {
    // The mode still enters at S1; direct entry goes through the copy so
    // recursion does not re-enter the mode-shared states.
    assert_built!("A : 'a' A? ;", @r#"
    mode default = S0
    A = S7
    S0: ε → S1
    S1: ε → S2
    S2: 'a' → S3
    S3: ε → S4
    S4: ref(A) → S5, ε → S5
    S5: end(A) → S6
    S6: ∅
    S7: ε → S8
    S8: 'a' → S9
    S9: ε → S10
    S10: ref(A) → S11, ε → S11
    S11: end(A) → S12
    S12: ∅
    "#);
}

#[test]
fn reversed_range_reports_and_patches() {
    let source = "A : 'z'..'a' ;";
    let (atn, table, diagnostics) = build(source);
    assert!(diagnostics.has_errors());
    assert_snapshot!(AtnPrinter::with_table(&atn, &table).to_string(), @r#"
    mode default = S0
    A = S1
    S0: ε → S1
    S1: ε → S2
    S2: ∅ → S3
    S3: end(A) → S4
    S4: ∅
    "#);
}
