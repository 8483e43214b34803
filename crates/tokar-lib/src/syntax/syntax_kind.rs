//! Syntax kinds for the grammar notation.
//!
//! One enum covers both halves of the syntax tree:
//! - Token kinds (terminals): produced by the lexer, atomic text spans
//! - Node kinds (non-terminals): created by the parser, composite structures
//!
//! Rowan requires a `Language` trait implementation to convert between our
//! `SyntaxKind` and its internal `rowan::SyntaxKind` (a newtype over `u16`);
//! that's what `TkLang` provides. Logos is derived directly on this enum;
//! node kinds simply lack token/regex attributes.

#![allow(dead_code)]

use logos::Logos;
use rowan::Language;

/// All kinds of tokens and nodes in the syntax tree.
///
/// Variants are ordered: tokens first, then nodes, then a `__LAST` sentinel
/// used for bounds checking in `kind_from_raw`. `#[repr(u16)]` lets us
/// transmute from the raw discriminant.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum SyntaxKind {
    #[token("(")]
    ParenOpen = 0,

    #[token(")")]
    ParenClose,

    #[token(":")]
    Colon,

    #[token(";")]
    Semicolon,

    #[token("|")]
    Pipe,

    #[token("*")]
    Star,

    #[token("+")]
    Plus,

    #[token("?")]
    Question,

    #[token("~")]
    Tilde,

    /// Range operator in `'a'..'z'`. Must out-length single Dot.
    #[token("..")]
    DotDot,

    /// Wildcard atom matching any code point.
    #[token(".")]
    Dot,

    #[token("mode")]
    KwMode,

    #[token("fragment")]
    KwFragment,

    /// Rule name or rule reference. Uppercase initial = lexer rule.
    /// Defined after the keywords so they take precedence.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    /// Single-quoted string literal, escapes included.
    #[regex(r"'(?:[^'\\]|\\.)*'")]
    StringLit,

    /// Bracketed character set: `[a-z0-9_]`.
    #[regex(r"\[(?:[^\]\\]|\\.)*\]")]
    CharSet,

    #[regex(r"[ \t]+")]
    Whitespace,

    #[token("\n")]
    #[token("\r\n")]
    Newline,

    #[regex(r"//[^\n]*", allow_greedy = true)]
    LineComment,

    #[regex(r"/\*(?:[^*]|\*[^/])*\*/")]
    BlockComment,

    /// Consecutive unrecognized characters coalesced into one token.
    Garbage,
    /// Generic error token; also the error node kind.
    Error,

    /// Root node containing the entire grammar.
    Root,
    /// Mode declaration: `mode Name;`
    ModeDecl,
    /// Rule declaration: `fragment? Name : union ;`
    RuleDecl,
    /// Alternation: `alt (| alt)*`
    Union,
    /// One alternative: a possibly empty element sequence.
    Alt,
    /// Element: `~? atom quantifier?`
    Element,
    /// String literal atom: `'abc'`
    Literal,
    /// Character range atom: `'a'..'z'`
    Range,
    /// Character set atom: `[a-z]`
    Set,
    /// Rule reference atom.
    RuleRef,
    /// Wildcard atom: `.`
    Wildcard,
    /// Parenthesized group atom.
    Group,

    #[doc(hidden)]
    __LAST,
}

use SyntaxKind::*;

impl SyntaxKind {
    /// Returns `true` if this is a trivia token (whitespace or comment).
    ///
    /// Trivia tokens are buffered during parsing and attached to the next
    /// node as leading trivia, preserving formatting in the CST.
    #[inline]
    pub fn is_trivia(self) -> bool {
        matches!(self, Whitespace | Newline | LineComment | BlockComment)
    }

    #[inline]
    pub fn is_error(self) -> bool {
        matches!(self, Error | Garbage)
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    #[inline]
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Language tag parameterizing Rowan's tree types.
///
/// Zero-sized uninhabited enum, purely a type-level marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TkLang {}

impl Language for TkLang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 < __LAST as u16);
        // SAFETY: value is in bounds and SyntaxKind is repr(u16)
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

pub type SyntaxNode = rowan::SyntaxNode<TkLang>;
pub type SyntaxToken = rowan::SyntaxToken<TkLang>;
pub type SyntaxElement = rowan::NodeOrToken<SyntaxNode, SyntaxToken>;

/// A set of `SyntaxKind`s implemented as a 64-bit bitset.
///
/// Used by the parser for O(1) membership testing of FIRST/recovery sets.
/// Capacity limits member kinds to discriminants below 64, which all token
/// kinds satisfy.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TokenSet(u64);

impl TokenSet {
    pub const EMPTY: TokenSet = TokenSet(0);

    #[inline]
    pub const fn new(kinds: &[SyntaxKind]) -> Self {
        let mut bits = 0u64;
        let mut i = 0;
        while i < kinds.len() {
            let kind = kinds[i] as u16;
            assert!(kind < 64, "SyntaxKind value exceeds TokenSet capacity");
            bits |= 1 << kind;
            i += 1;
        }
        TokenSet(bits)
    }

    #[inline]
    pub const fn single(kind: SyntaxKind) -> Self {
        let kind = kind as u16;
        assert!(kind < 64, "SyntaxKind value exceeds TokenSet capacity");
        TokenSet(1 << kind)
    }

    #[inline]
    pub const fn contains(&self, kind: SyntaxKind) -> bool {
        let kind = kind as u16;
        if kind >= 64 {
            return false;
        }
        self.0 & (1 << kind) != 0
    }

    #[inline]
    pub const fn union(self, other: TokenSet) -> TokenSet {
        TokenSet(self.0 | other.0)
    }
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_set();
        for i in 0..64u16 {
            if self.0 & (1 << i) != 0 && i < __LAST as u16 {
                let kind: SyntaxKind = unsafe { std::mem::transmute(i) };
                list.entry(&kind);
            }
        }
        list.finish()
    }
}

/// Pre-defined token sets used throughout the parser.
///
/// Recovery sets follow the resilient-parsing approach: on an unexpected
/// token, the parser consumes until it reaches a token in the recovery set
/// (typically the FOLLOW set of ancestor productions), which prevents
/// cascading errors.
pub mod token_sets {
    use super::*;

    /// Tokens that can start a top-level item.
    pub const ITEM_FIRST: TokenSet = TokenSet::new(&[KwMode, KwFragment, Ident]);

    /// Tokens that can start an atom (FIRST set of the atom production).
    pub const ATOM_FIRST: TokenSet = TokenSet::new(&[StringLit, CharSet, Ident, Dot, ParenOpen]);

    /// Tokens that can start an element: an atom, possibly negated.
    pub const ELEMENT_FIRST: TokenSet = ATOM_FIRST.union(TokenSet::single(Tilde));

    pub const QUANTIFIERS: TokenSet = TokenSet::new(&[Star, Plus, Question]);

    pub const TRIVIA: TokenSet = TokenSet::new(&[Whitespace, Newline, LineComment, BlockComment]);

    /// Synchronization points for a botched rule body.
    pub const RULE_RECOVERY: TokenSet = TokenSet::new(&[Semicolon, KwMode, KwFragment]);

    /// Synchronization points inside a parenthesized group.
    pub const GROUP_RECOVERY: TokenSet = TokenSet::new(&[ParenClose, Semicolon]);
}
