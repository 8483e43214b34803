//! Typed AST wrappers over CST nodes.
//!
//! Each struct wraps a `SyntaxNode` and provides typed accessors.
//! Cast is infallible for the matching `SyntaxKind`; validation happens in
//! declaration collection.

use super::syntax_kind::{SyntaxKind, SyntaxNode, SyntaxToken};

macro_rules! ast_node {
    ($name:ident, $kind:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(SyntaxNode);

        impl $name {
            pub fn cast(node: SyntaxNode) -> Option<Self> {
                (node.kind() == SyntaxKind::$kind).then(|| Self(node))
            }

            pub fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }
    };
}

ast_node!(Root, Root);
ast_node!(ModeDecl, ModeDecl);
ast_node!(RuleDecl, RuleDecl);
ast_node!(Union, Union);
ast_node!(Alt, Alt);
ast_node!(Element, Element);
ast_node!(Literal, Literal);
ast_node!(Range, Range);
ast_node!(Set, Set);
ast_node!(RuleRef, RuleRef);
ast_node!(Wildcard, Wildcard);
ast_node!(Group, Group);

/// A top-level grammar item, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Item {
    Mode(ModeDecl),
    Rule(RuleDecl),
}

impl Item {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::ModeDecl => ModeDecl::cast(node).map(Item::Mode),
            SyntaxKind::RuleDecl => RuleDecl::cast(node).map(Item::Rule),
            _ => None,
        }
    }
}

/// An atom: the matchable core of an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Atom {
    Literal(Literal),
    Range(Range),
    Set(Set),
    RuleRef(RuleRef),
    Wildcard(Wildcard),
    Group(Group),
}

impl Atom {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::Literal => Literal::cast(node).map(Atom::Literal),
            SyntaxKind::Range => Range::cast(node).map(Atom::Range),
            SyntaxKind::Set => Set::cast(node).map(Atom::Set),
            SyntaxKind::RuleRef => RuleRef::cast(node).map(Atom::RuleRef),
            SyntaxKind::Wildcard => Wildcard::cast(node).map(Atom::Wildcard),
            SyntaxKind::Group => Group::cast(node).map(Atom::Group),
            _ => None,
        }
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Atom::Literal(n) => n.syntax(),
            Atom::Range(n) => n.syntax(),
            Atom::Set(n) => n.syntax(),
            Atom::RuleRef(n) => n.syntax(),
            Atom::Wildcard(n) => n.syntax(),
            Atom::Group(n) => n.syntax(),
        }
    }
}

// --- Accessors ---

impl Root {
    pub fn items(&self) -> impl Iterator<Item = Item> + '_ {
        self.0.children().filter_map(Item::cast)
    }

    pub fn rules(&self) -> impl Iterator<Item = RuleDecl> + '_ {
        self.0.children().filter_map(RuleDecl::cast)
    }
}

impl ModeDecl {
    pub fn name(&self) -> Option<SyntaxToken> {
        find_token(&self.0, SyntaxKind::Ident)
    }
}

impl RuleDecl {
    pub fn name(&self) -> Option<SyntaxToken> {
        find_token(&self.0, SyntaxKind::Ident)
    }

    pub fn is_fragment(&self) -> bool {
        find_token(&self.0, SyntaxKind::KwFragment).is_some()
    }

    pub fn body(&self) -> Option<Union> {
        self.0.children().find_map(Union::cast)
    }
}

impl Union {
    pub fn alts(&self) -> impl Iterator<Item = Alt> + '_ {
        self.0.children().filter_map(Alt::cast)
    }
}

impl Alt {
    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.0.children().filter_map(Element::cast)
    }
}

impl Element {
    pub fn is_negated(&self) -> bool {
        find_token(&self.0, SyntaxKind::Tilde).is_some()
    }

    pub fn atom(&self) -> Option<Atom> {
        self.0.children().find_map(Atom::cast)
    }

    pub fn quantifier(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|t| {
                matches!(
                    t.kind(),
                    SyntaxKind::Star | SyntaxKind::Plus | SyntaxKind::Question
                )
            })
    }
}

impl Literal {
    pub fn token(&self) -> Option<SyntaxToken> {
        find_token(&self.0, SyntaxKind::StringLit)
    }

    /// Decoded character sequence, escapes resolved.
    pub fn cooked(&self) -> Vec<char> {
        self.token()
            .map(|t| cook_literal(t.text()))
            .unwrap_or_default()
    }
}

impl Range {
    pub fn start_literal(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|t| t.kind() == SyntaxKind::StringLit)
    }

    pub fn end_literal(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter(|t| t.kind() == SyntaxKind::StringLit)
            .nth(1)
    }
}

impl Set {
    pub fn token(&self) -> Option<SyntaxToken> {
        find_token(&self.0, SyntaxKind::CharSet)
    }

    /// Character ranges as written, single members widened to `(c, c)`.
    /// Reversed ranges are returned as-is; the builder reports them.
    pub fn ranges(&self) -> Vec<(char, char)> {
        self.token()
            .map(|t| set_ranges(t.text()))
            .unwrap_or_default()
    }
}

impl RuleRef {
    pub fn name(&self) -> Option<SyntaxToken> {
        find_token(&self.0, SyntaxKind::Ident)
    }
}

impl Group {
    pub fn body(&self) -> Option<Union> {
        self.0.children().find_map(Union::cast)
    }
}

fn find_token(node: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    node.children_with_tokens()
        .filter_map(|it| it.into_token())
        .find(|t| t.kind() == kind)
}

// --- Unescaping ---

/// Decode a quoted literal's body, stripping the surrounding quotes.
pub fn cook_literal(text: &str) -> Vec<char> {
    let body = text
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .unwrap_or(text);
    decode_escapes(body).into_iter().map(|(c, _)| c).collect()
}

/// Parse a `[...]` set into character ranges.
///
/// An unescaped `-` between two members forms a range; anywhere else it is a
/// literal dash.
pub fn set_ranges(text: &str) -> Vec<(char, char)> {
    let body = text
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .unwrap_or(text);
    let items = decode_escapes(body);

    let mut out = Vec::new();
    let mut i = 0;
    while i < items.len() {
        let (start, _) = items[i];
        if i + 2 < items.len() && items[i + 1] == ('-', false) {
            out.push((start, items[i + 2].0));
            i += 3;
        } else if i + 2 == items.len() && items[i + 1] == ('-', false) {
            // Trailing dash is a literal member
            out.push((start, start));
            out.push(('-', '-'));
            i += 2;
        } else {
            out.push((start, start));
            i += 1;
        }
    }
    out
}

/// Decode backslash escapes. Each output entry records whether the character
/// came from an escape, which `set_ranges` needs to tell `\-` from `-`.
fn decode_escapes(body: &str) -> Vec<(char, bool)> {
    let mut out = Vec::new();
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push((c, false));
            continue;
        }
        match chars.next() {
            Some('n') => out.push(('\n', true)),
            Some('r') => out.push(('\r', true)),
            Some('t') => out.push(('\t', true)),
            Some('0') => out.push(('\0', true)),
            Some('u') => {
                // \u{hex}
                let mut rest = chars.clone();
                let mut decoded = None;
                if rest.next() == Some('{') {
                    let mut hex = String::new();
                    for c in rest.by_ref() {
                        if c == '}' {
                            decoded = u32::from_str_radix(&hex, 16)
                                .ok()
                                .and_then(char::from_u32);
                            break;
                        }
                        hex.push(c);
                    }
                }
                match decoded {
                    Some(v) => {
                        out.push((v, true));
                        chars = rest;
                    }
                    None => out.push(('u', true)),
                }
            }
            Some(other) => out.push((other, true)),
            None => {}
        }
    }
    out
}
