use crate::interval::Interval;
use crate::syntax::parser;
use crate::{Error, Grammar};

use super::graph::{Atn, StateKind, TransitionData};
use super::verify::verify;

#[test]
fn normalized_pipeline_passes() {
    let sources = [
        "A : 'a' ;",
        "A : ~[a-z]* ;",
        "fragment F : [0-9] ;\nNumber : F+ ;\nvalue : Number ;",
        "A : [a-c] ;\nB : 'b' ;",
    ];
    for source in sources {
        let grammar = Grammar::compile(source).unwrap();
        assert!(verify(grammar.atn(), true).is_ok(), "{source:?}");
    }
}

#[test]
fn raw_graph_passes_when_epsilons_are_allowed() {
    let grammar = Grammar::compile_with(
        "A : 'a' | 'b'* ;",
        crate::CompileOptions::new().keep_unnormalized(true),
    )
    .unwrap();
    let raw = grammar.unnormalized().unwrap();
    assert!(verify(raw, false).is_ok());
    assert!(matches!(verify(raw, true), Err(Error::StrayEpsilon { .. })));
}

#[test]
fn consuming_edge_without_provenance_is_reported() {
    let mut atn = Atn::new();
    let a = atn.add_state(StateKind::Rule(0));
    let b = atn.add_state(StateKind::Basic);
    atn.lexer_starts.insert(0, a);
    atn.connect(
        a,
        b,
        TransitionData::Interval {
            interval: Interval::of('x'),
            nodes: Vec::new(),
            negations: Vec::new(),
        },
    );

    assert_eq!(
        verify(&atn, true),
        Err(Error::MissingProvenance { state: a })
    );
}

#[test]
fn in_edge_from_an_unreachable_state_is_asymmetric() {
    let node = parser::parse("A : 'a' ;").syntax();
    let mut atn = Atn::new();
    let a = atn.add_state(StateKind::Rule(0));
    let stray = atn.add_state(StateKind::Basic);
    atn.lexer_starts.insert(0, a);
    atn.connect(
        stray,
        a,
        TransitionData::Interval {
            interval: Interval::of('x'),
            nodes: vec![node],
            negations: Vec::new(),
        },
    );

    assert_eq!(verify(&atn, true), Err(Error::AsymmetricEdges { state: a }));
}
