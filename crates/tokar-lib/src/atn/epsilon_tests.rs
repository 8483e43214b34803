use insta::assert_snapshot;

use crate::decl::{self, RuleTable};
use crate::syntax::{ast, parser};

use super::build::AtnBuilder;
use super::dump::AtnPrinter;
use super::epsilon;
use super::graph::Atn;

fn normalize(source: &str) -> (Atn, RuleTable) {
    let parse = parser::parse(source);
    let mut diagnostics = parse.diagnostics().clone();
    let root = ast::Root::cast(parse.syntax()).unwrap();
    let table = decl::collect(&root, &mut diagnostics);
    assert!(!diagnostics.has_errors(), "{}", diagnostics.render(source));
    let mut atn = AtnBuilder::new(&table, &mut diagnostics).build();
    epsilon::remove(&mut atn);
    (atn, table)
}

fn snapshot(source: &str) -> String {
    let (atn, table) = normalize(source);
    AtnPrinter::with_table(&atn, &table).to_string()
}

macro_rules! assert_normalized {
    ($source:expr, @$snapshot:literal) => {
        assert_snapshot!(snapshot($source), @$snapshot);
    };
}

#[test]
fn literal_rule_collapses_to_direct_edges() {
    assert_normalized!("A : 'a' ;", @r#"
    mode default = S0
    A = S1
    S0: 'a' → S3
    S1: 'a' → S3
    S3: end(A) → S4
    S4: ∅
    "#);
}

#[test]
fn sequence_keeps_one_state_per_step() {
    assert_normalized!("A : 'a' 'b' ;", @r#"
    mode default = S0
    A = S1
    S0: 'a' → S3
    S1: 'a' → S3
    S3: 'b' → S5
    S5: end(A) → S6
    S6: ∅
    "#);
}

#[test]
fn union_alternatives_share_the_entry_states() {
    assert_normalized!("A : 'a' | 'b' ;", @r#"
    mode default = S0
    A = S1
    S0: 'a' → S3, 'b' → S5
    S1: 'a' → S3, 'b' → S5
    S3: end(A) → S8
    S5: end(A) → S8
    S8: ∅
    "#);
}

#[test]
fn optional_exposes_the_end_at_the_entry() {
    assert_normalized!("A : 'a'? ;", @r#"
    mode default = S0
    A = S1
    S0: 'a' → S3, end(A) → S4
    S1: 'a' → S3, end(A) → S4
    S3: end(A) → S4
    S4: ∅
    "#);
}

#[test]
fn star_becomes_a_real_self_loop() {
    assert_normalized!("A : 'a'* ;", @r#"
    mode default = S0
    A = S1
    S0: 'a' → S3, end(A) → S4
    S1: 'a' → S3, end(A) → S4
    S3: end(A) → S4, 'a' → S3
    S4: ∅
    "#);
}

#[test]
fn empty_rule_ends_immediately() {
    assert_normalized!("A : ;", @r#"
    mode default = S0
    A = S1
    S0: end(A) → S4
    S1: end(A) → S4
    S4: ∅
    "#);
}

#[test]
fn no_epsilon_survives() {
    let sources = [
        "A : 'a' ;",
        "A : 'ab'* | [0-9]+ ;",
        "fragment F : 'f' ;\nA : F? F ;",
        "A : ('a' | ) 'b' ;",
        "A : 'a' ;\nmode other ;\nB : ('x' 'y')* ;",
        "A : 'a' A? ;",
        "x : A | A x ;\nA : 'a' ;",
    ];
    for source in sources {
        let (atn, _) = normalize(source);
        for id in atn.reachable() {
            for edge in atn.state(id).out_edges() {
                assert!(
                    !edge.data.is_epsilon(),
                    "epsilon left at S{id} for {source:?}"
                );
            }
        }
    }
}
