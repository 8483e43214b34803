use crate::syntax::parser::parse;
use crate::syntax::syntax_kind::SyntaxNode;

/// Format tree without trivia tokens (default for most tests)
fn snapshot(input: &str) -> String {
    format_result(input, false)
}

/// Format tree with trivia tokens included
fn snapshot_raw(input: &str) -> String {
    format_result(input, true)
}

fn format_result(input: &str, include_trivia: bool) -> String {
    let result = parse(input);
    let mut out = String::new();
    format_tree_impl(&result.syntax(), 0, &mut out, include_trivia);
    let messages = result.diagnostics().filtered();
    if !messages.is_empty() {
        out.push_str("errors:\n");
        for message in messages {
            out.push_str(&format!("  - {}\n", message));
        }
    }
    out
}

fn format_tree_impl(node: &SyntaxNode, indent: usize, out: &mut String, include_trivia: bool) {
    use std::fmt::Write;
    let prefix = "  ".repeat(indent);
    let _ = writeln!(out, "{}{:?}", prefix, node.kind());
    for child in node.children_with_tokens() {
        match child {
            rowan::NodeOrToken::Node(n) => format_tree_impl(&n, indent + 1, out, include_trivia),
            rowan::NodeOrToken::Token(t) => {
                if include_trivia || !t.kind().is_trivia() {
                    let _ = writeln!(out, "{}  {:?} {:?}", prefix, t.kind(), t.text());
                }
            }
        }
    }
}

macro_rules! assert_parse {
    ($input:expr, @$snapshot:literal) => {
        insta::assert_snapshot!(snapshot($input), @$snapshot)
    };
}

macro_rules! assert_parse_raw {
    ($input:expr, @$snapshot:literal) => {
        insta::assert_snapshot!(snapshot_raw($input), @$snapshot)
    };
}

// =============================================================================
// Basic rules
// =============================================================================

#[test]
fn empty_input() {
    assert_parse!("", @r#"
    Root
    "#);
}

#[test]
fn single_literal_rule() {
    assert_parse!("A : 'a' ;", @r#"
    Root
      RuleDecl
        Ident "A"
        Colon ":"
        Union
          Alt
            Element
              Literal
                StringLit "'a'"
        Semicolon ";"
    "#);
}

#[test]
fn union_of_literals() {
    assert_parse!("x : 'a' | 'b' ;", @r#"
    Root
      RuleDecl
        Ident "x"
        Colon ":"
        Union
          Alt
            Element
              Literal
                StringLit "'a'"
          Pipe "|"
          Alt
            Element
              Literal
                StringLit "'b'"
        Semicolon ";"
    "#);
}

#[test]
fn empty_alternative() {
    assert_parse!("opt : 'a' | ;", @r#"
    Root
      RuleDecl
        Ident "opt"
        Colon ":"
        Union
          Alt
            Element
              Literal
                StringLit "'a'"
          Pipe "|"
          Alt
        Semicolon ";"
    "#);
}

#[test]
fn quantifiers_and_negation() {
    assert_parse!("W : ~[a-z]* 'x'+ .? ;", @r#"
    Root
      RuleDecl
        Ident "W"
        Colon ":"
        Union
          Alt
            Element
              Tilde "~"
              Set
                CharSet "[a-z]"
              Star "*"
            Element
              Literal
                StringLit "'x'"
              Plus "+"
            Element
              Wildcard
                Dot "."
              Question "?"
        Semicolon ";"
    "#);
}

#[test]
fn character_range() {
    assert_parse!("D : '0'..'9' ;", @r#"
    Root
      RuleDecl
        Ident "D"
        Colon ":"
        Union
          Alt
            Element
              Range
                StringLit "'0'"
                DotDot ".."
                StringLit "'9'"
        Semicolon ";"
    "#);
}

#[test]
fn group_and_references() {
    assert_parse!("seq : ('a' | B) C* ;", @r#"
    Root
      RuleDecl
        Ident "seq"
        Colon ":"
        Union
          Alt
            Element
              Group
                ParenOpen "("
                Union
                  Alt
                    Element
                      Literal
                        StringLit "'a'"
                  Pipe "|"
                  Alt
                    Element
                      RuleRef
                        Ident "B"
                ParenClose ")"
            Element
              RuleRef
                Ident "C"
              Star "*"
        Semicolon ";"
    "#);
}

#[test]
fn mode_and_fragment() {
    assert_parse!("mode strings;\nfragment HexDigit : [0-9a-fA-F] ;", @r#"
    Root
      ModeDecl
        KwMode "mode"
        Ident "strings"
        Semicolon ";"
      RuleDecl
        KwFragment "fragment"
        Ident "HexDigit"
        Colon ":"
        Union
          Alt
            Element
              Set
                CharSet "[0-9a-fA-F]"
        Semicolon ";"
    "#);
}

#[test]
fn trivia_attachment() {
    assert_parse_raw!("A : 'a' ; // trailing", @r#"
    Root
      RuleDecl
        Ident "A"
        Whitespace " "
        Colon ":"
        Union
          Alt
            Whitespace " "
            Element
              Literal
                StringLit "'a'"
        Whitespace " "
        Semicolon ";"
      Whitespace " "
      LineComment "// trailing"
    "#);
}

// =============================================================================
// Error recovery
// =============================================================================

#[test]
fn missing_semicolon_recovers_at_next_keyword() {
    assert_parse!("A : 'a'\nfragment B : 'b' ;", @r#"
    Root
      RuleDecl
        Ident "A"
        Colon ":"
        Union
          Alt
            Element
              Literal
                StringLit "'a'"
      RuleDecl
        KwFragment "fragment"
        Ident "B"
        Colon ":"
        Union
          Alt
            Element
              Literal
                StringLit "'b'"
        Semicolon ";"
    errors:
      - error at 8..16: expected `;`
    "#);
}

#[test]
fn missing_rule_body() {
    assert_parse!("A ;", @r#"
    Root
      RuleDecl
        Ident "A"
        Semicolon ";"
    errors:
      - error at 2..3: expected rule body
    "#);
}

#[test]
fn unclosed_group() {
    assert_parse!("A : ('a' ;", @r#"
    Root
      RuleDecl
        Ident "A"
        Colon ":"
        Union
          Alt
            Element
              Group
                ParenOpen "("
                Union
                  Alt
                    Element
                      Literal
                        StringLit "'a'"
        Semicolon ";"
    errors:
      - error at 9..10: missing closing `)`
    "#);
}

#[test]
fn dangling_negation() {
    assert_parse!("A : ~ ;", @r#"
    Root
      RuleDecl
        Ident "A"
        Colon ":"
        Union
          Alt
            Element
              Tilde "~"
        Semicolon ";"
    errors:
      - error at 6..7: expected a literal, set, reference, `.` or group
    "#);
}

#[test]
fn range_missing_end() {
    assert_parse!("A : 'a'.. ;", @r#"
    Root
      RuleDecl
        Ident "A"
        Colon ":"
        Union
          Alt
            Element
              Range
                StringLit "'a'"
                DotDot ".."
        Semicolon ";"
    errors:
      - error at 10..11: expected range end literal
    "#);
}

#[test]
fn stray_token_at_top_level() {
    assert_parse!("; A : 'a' ;", @r#"
    Root
      Error
        Semicolon ";"
      RuleDecl
        Ident "A"
        Colon ":"
        Union
          Alt
            Element
              Literal
                StringLit "'a'"
        Semicolon ";"
    errors:
      - error at 0..1: unexpected token
    "#);
}

#[test]
fn garbage_inside_body_skipped_to_semicolon() {
    assert_parse!("A : 'a' @@ 'b' ;", @r#"
    Root
      RuleDecl
        Ident "A"
        Colon ":"
        Union
          Alt
            Element
              Literal
                StringLit "'a'"
        Error
          Garbage "@@"
          StringLit "'b'"
        Semicolon ";"
    errors:
      - error at 8..10: expected `;`
    "#);
}

#[test]
fn tree_is_lossless() {
    let input = "mode m;\nA : ('a' | [0-9])+ // c\n;";
    let result = parse(input);
    assert_eq!(result.syntax().text(), input);
}
