use crate::syntax::lexer::{lex, token_text};

/// Format tokens without trivia (default for most tests)
fn snapshot(input: &str) -> String {
    format_tokens(input, false)
}

/// Format tokens with trivia included
fn snapshot_raw(input: &str) -> String {
    format_tokens(input, true)
}

fn format_tokens(input: &str, include_trivia: bool) -> String {
    let tokens = lex(input);
    let mut out = String::new();
    for token in tokens {
        if include_trivia || !token.kind.is_trivia() {
            out.push_str(&format!(
                "{:?} {:?}\n",
                token.kind,
                token_text(input, &token)
            ));
        }
    }
    out
}

#[test]
fn punctuation() {
    insta::assert_snapshot!(snapshot("( ) : ; | * + ? ~ .. ."), @r#"
    ParenOpen "("
    ParenClose ")"
    Colon ":"
    Semicolon ";"
    Pipe "|"
    Star "*"
    Plus "+"
    Question "?"
    Tilde "~"
    DotDot ".."
    Dot "."
    "#);
}

#[test]
fn keywords_and_idents() {
    insta::assert_snapshot!(snapshot("mode fragment modes Fragment_2 _x"), @r#"
    KwMode "mode"
    KwFragment "fragment"
    Ident "modes"
    Ident "Fragment_2"
    Ident "_x"
    "#);
}

#[test]
fn string_literals() {
    insta::assert_snapshot!(snapshot(r"'ab' '' '\'' '\\' '\u{1F600}'"), @r#"
    StringLit "'ab'"
    StringLit "''"
    StringLit "'\\''"
    StringLit "'\\\\'"
    StringLit "'\\u{1F600}'"
    "#);
}

#[test]
fn char_sets() {
    insta::assert_snapshot!(snapshot(r"[a-z0-9_] [] [\]\-]"), @r#"
    CharSet "[a-z0-9_]"
    CharSet "[]"
    CharSet "[\\]\\-]"
    "#);
}

#[test]
fn rule_shape() {
    insta::assert_snapshot!(snapshot("Word : [a-z]+ ;"), @r#"
    Ident "Word"
    Colon ":"
    CharSet "[a-z]"
    Plus "+"
    Semicolon ";"
    "#);
}

#[test]
fn trivia_buffering() {
    insta::assert_snapshot!(snapshot_raw("a // note\nb /* c */ d"), @r#"
    Ident "a"
    Whitespace " "
    LineComment "// note"
    Newline "\n"
    Ident "b"
    Whitespace " "
    BlockComment "/* c */"
    Whitespace " "
    Ident "d"
    "#);
}

#[test]
fn garbage_coalescing() {
    insta::assert_snapshot!(snapshot("a @@@ b"), @r#"
    Ident "a"
    Garbage "@@@"
    Ident "b"
    "#);
}

#[test]
fn unterminated_string_yields_garbage() {
    use crate::syntax::syntax_kind::SyntaxKind;
    let tokens = lex("'abc");
    assert!(tokens.iter().any(|t| t.kind == SyntaxKind::Garbage));
}

#[test]
fn trailing_garbage() {
    insta::assert_snapshot!(snapshot("x §§"), @r#"
    Ident "x"
    Garbage "§§"
    "#);
}
