//! Resilient LL parser for the grammar notation.
//!
//! Produces a lossless concrete syntax tree via Rowan's green tree builder.
//! Design borrowed from rust-analyzer-style parsers:
//!
//! - Zero-copy parsing: tokens carry spans, text sliced only when building
//! - Trivia buffering: whitespace/comments attached as leading trivia
//! - Checkpoint-based wrapping: retroactively wrap atoms for ranges
//! - Explicit recovery sets: per-production sets decide bail vs consume
//!
//! The parser never fails; it always produces a tree. Unknown tokens get
//! wrapped in `Error` nodes, missing tokens emit a diagnostic without
//! consuming, and recovery sets act as synchronization points.
//!
//! # Grammar (EBNF-ish)
//!
//! ```text
//! root     = (modeDecl | rule)*
//! modeDecl = "mode" IDENT ";"
//! rule     = "fragment"? IDENT ":" union ";"
//! union    = alt ("|" alt)*
//! alt      = element*
//! element  = "~"? atom ("*" | "+" | "?")?
//! atom     = STRING | STRING ".." STRING | CHARSET | IDENT | "." | "(" union ")"
//! ```

use rowan::{Checkpoint, GreenNode, GreenNodeBuilder, TextRange, TextSize};

use crate::diagnostics::{DiagnosticKind, Diagnostics};

use super::lexer::{Token, lex, token_text};
use super::syntax_kind::{SyntaxKind, SyntaxNode, TokenSet, token_sets};

/// Parse result containing the green tree and collected diagnostics.
///
/// The tree is always complete; errors are recorded in `diagnostics` and
/// also represented as `SyntaxKind::Error` nodes in the tree itself.
#[derive(Debug, Clone)]
pub struct Parse {
    green: GreenNode,
    diagnostics: Diagnostics,
}

impl Parse {
    pub fn green(&self) -> &GreenNode {
        &self.green
    }

    /// Typed view over the immutable green tree. Cheap; `SyntaxNode` is a
    /// thin wrapper with parent pointers.
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    pub fn is_valid(&self) -> bool {
        !self.diagnostics.has_errors()
    }
}

/// Stack depth limit for nested groups. Prevents stack overflow on
/// adversarial input while handling any reasonable grammar.
const MAX_DEPTH: u32 = 512;

/// Main entry point. Always succeeds; errors are embedded in the result.
pub fn parse(source: &str) -> Parse {
    let tokens = lex(source);
    let mut parser = Parser::new(source, tokens);
    parser.parse_root();
    parser.finish()
}

/// Fuel: debug-mode progress detector. Decremented on lookahead, reset on
/// `bump()`. Catches loops that never consume input.
#[cfg(debug_assertions)]
const DEFAULT_FUEL: u32 = 256;

/// Parser state machine.
///
/// Tokens are processed left to right. Trivia tokens are buffered separately
/// and flushed as leading trivia when a new node starts, which gives
/// predictable trivia attachment without backtracking.
pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    /// Current position in `tokens`. Monotonically increases.
    pos: usize,
    /// Trivia accumulated since the last non-trivia token.
    trivia_buffer: Vec<Token>,
    builder: GreenNodeBuilder<'static>,
    diagnostics: Diagnostics,
    depth: u32,
    #[cfg(debug_assertions)]
    fuel: std::cell::Cell<u32>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            trivia_buffer: Vec::with_capacity(4),
            builder: GreenNodeBuilder::new(),
            diagnostics: Diagnostics::new(),
            depth: 0,
            #[cfg(debug_assertions)]
            fuel: std::cell::Cell::new(DEFAULT_FUEL),
        }
    }

    pub fn finish(mut self) -> Parse {
        self.drain_trivia();
        Parse {
            green: self.builder.finish(),
            diagnostics: self.diagnostics,
        }
    }

    // =========================================================================
    // Token access - raw position based, includes trivia
    // =========================================================================

    /// Current token kind. Returns `Error` at EOF (acts as sentinel).
    fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    fn nth(&self, lookahead: usize) -> SyntaxKind {
        #[cfg(debug_assertions)]
        {
            if self.fuel.get() == 0 {
                panic!(
                    "parser is stuck: no progress made in {} iterations",
                    DEFAULT_FUEL
                );
            }
            self.fuel.set(self.fuel.get() - 1);
        }
        self.tokens
            .get(self.pos + lookahead)
            .map_or(SyntaxKind::Error, |t| t.kind)
    }

    fn current_span(&self) -> TextRange {
        self.tokens
            .get(self.pos)
            .map_or_else(|| TextRange::empty(self.eof_offset()), |t| t.span)
    }

    fn eof_offset(&self) -> TextSize {
        TextSize::from(self.source.len() as u32)
    }

    fn eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn at_set(&self, set: TokenSet) -> bool {
        set.contains(self.current())
    }

    /// Peek past trivia. Buffers trivia tokens for later attachment.
    fn peek(&mut self) -> SyntaxKind {
        self.skip_trivia_to_buffer();
        self.current()
    }

    // =========================================================================
    // Trivia handling
    //
    // Strategy: buffer trivia, drain as leading trivia when starting nodes.
    // `rule  : body` attaches the spaces to `:`, not to `rule`.
    // =========================================================================

    fn skip_trivia_to_buffer(&mut self) {
        while self.pos < self.tokens.len() && self.tokens[self.pos].kind.is_trivia() {
            self.trivia_buffer.push(self.tokens[self.pos]);
            self.pos += 1;
        }
    }

    fn drain_trivia(&mut self) {
        for token in self.trivia_buffer.drain(..) {
            let text = token_text(self.source, &token);
            self.builder.token(token.kind.into(), text);
        }
    }

    // =========================================================================
    // Tree construction
    // =========================================================================

    /// Start node, attaching any buffered trivia first.
    fn start_node(&mut self, kind: SyntaxKind) {
        self.drain_trivia();
        self.builder.start_node(kind.into());
    }

    /// Wrap previously-parsed content. Used for ranges: parse `'a'`, then
    /// see `..`, wrap retroactively into `Range('a' .. 'z')`.
    fn start_node_at(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) {
        self.builder.start_node_at(checkpoint, kind.into());
    }

    fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.drain_trivia();
        self.builder.checkpoint()
    }

    /// Consume current token into the tree. Flushes buffered trivia first so
    /// token order matches the source. Resets fuel.
    fn bump(&mut self) {
        assert!(!self.eof(), "bump called at EOF");
        #[cfg(debug_assertions)]
        self.fuel.set(DEFAULT_FUEL);
        self.drain_trivia();
        let token = self.tokens[self.pos];
        let text = token_text(self.source, &token);
        self.builder.token(token.kind.into(), text);
        self.pos += 1;
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.peek() == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Expect a token. On mismatch: report but don't consume, so the parent
    /// production gets a chance to resynchronize.
    fn expect(&mut self, kind: SyntaxKind, diagnostic: DiagnosticKind) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.error(diagnostic);
        false
    }

    // =========================================================================
    // Error handling & recovery
    // =========================================================================

    fn error(&mut self, kind: DiagnosticKind) {
        let range = self.current_span();
        self.diagnostics.report(kind, range).emit();
    }

    /// Wrap the unexpected token in an Error node and consume it.
    /// Guarantees progress even on garbage input.
    fn error_and_bump(&mut self, kind: DiagnosticKind) {
        self.error(kind);
        if !self.eof() {
            self.start_node(SyntaxKind::Error);
            self.bump();
            self.finish_node();
        }
    }

    /// Skip tokens until a recovery point, wrapping the skipped run in an
    /// Error node. If already at a recovery token, just reports.
    fn error_recover(&mut self, kind: DiagnosticKind, recovery: TokenSet) {
        self.peek();
        if self.at_set(recovery) || self.eof() {
            self.error(kind);
            return;
        }

        self.start_node(SyntaxKind::Error);
        self.error(kind);
        while !self.at_set(recovery) && !self.eof() {
            self.bump();
            self.peek();
        }
        self.finish_node();
    }

    fn enter_recursion(&mut self) -> bool {
        if self.depth >= MAX_DEPTH {
            self.error(DiagnosticKind::UnexpectedToken);
            return false;
        }
        self.depth += 1;
        true
    }

    fn exit_recursion(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // =========================================================================
    // Grammar productions
    // =========================================================================

    fn parse_root(&mut self) {
        self.start_node(SyntaxKind::Root);

        loop {
            match self.peek() {
                _ if self.eof() => break,
                SyntaxKind::KwMode => self.parse_mode_decl(),
                SyntaxKind::KwFragment | SyntaxKind::Ident => self.parse_rule(),
                _ => self.error_and_bump(DiagnosticKind::UnexpectedToken),
            }
        }

        self.skip_trivia_to_buffer();
        self.drain_trivia();
        self.finish_node();
    }

    /// Mode declaration: `mode Name;`
    fn parse_mode_decl(&mut self) {
        self.start_node(SyntaxKind::ModeDecl);
        self.bump(); // mode
        self.expect(SyntaxKind::Ident, DiagnosticKind::ExpectedRuleName);
        self.expect(SyntaxKind::Semicolon, DiagnosticKind::ExpectedSemicolon);
        self.finish_node();
    }

    /// Rule declaration: `fragment? Name : union ;`
    fn parse_rule(&mut self) {
        self.start_node(SyntaxKind::RuleDecl);

        self.eat(SyntaxKind::KwFragment);
        self.expect(SyntaxKind::Ident, DiagnosticKind::ExpectedRuleName);

        if self.eat(SyntaxKind::Colon) {
            self.parse_union();
        } else {
            self.error_recover(DiagnosticKind::ExpectedRuleBody, token_sets::RULE_RECOVERY);
        }

        if !self.eat(SyntaxKind::Semicolon) {
            self.error_recover(DiagnosticKind::ExpectedSemicolon, token_sets::RULE_RECOVERY);
            self.eat(SyntaxKind::Semicolon);
        }
        self.finish_node();
    }

    /// Alternation: `alt (| alt)*`. Alternatives may be empty.
    fn parse_union(&mut self) {
        self.start_node(SyntaxKind::Union);
        self.parse_alt();
        while self.eat(SyntaxKind::Pipe) {
            self.parse_alt();
        }
        self.finish_node();
    }

    fn parse_alt(&mut self) {
        self.start_node(SyntaxKind::Alt);
        while token_sets::ELEMENT_FIRST.contains(self.peek()) {
            self.parse_element();
        }
        self.finish_node();
    }

    /// Element: `~? atom quantifier?`
    fn parse_element(&mut self) {
        self.start_node(SyntaxKind::Element);
        self.eat(SyntaxKind::Tilde);

        if token_sets::ATOM_FIRST.contains(self.peek()) {
            self.parse_atom();
        } else {
            self.error_recover(DiagnosticKind::ExpectedAtom, token_sets::RULE_RECOVERY);
        }

        if self.at_set(token_sets::QUANTIFIERS) {
            self.bump();
        }
        self.finish_node();
    }

    fn parse_atom(&mut self) {
        match self.peek() {
            SyntaxKind::StringLit => self.parse_literal_or_range(),
            SyntaxKind::CharSet => {
                self.start_node(SyntaxKind::Set);
                self.bump();
                self.finish_node();
            }
            SyntaxKind::Ident => {
                self.start_node(SyntaxKind::RuleRef);
                self.bump();
                self.finish_node();
            }
            SyntaxKind::Dot => {
                self.start_node(SyntaxKind::Wildcard);
                self.bump();
                self.finish_node();
            }
            SyntaxKind::ParenOpen => self.parse_group(),
            _ => self.error_and_bump(DiagnosticKind::ExpectedAtom),
        }
    }

    /// Disambiguate `'a'` from `'a'..'z'` with one token of lookahead past
    /// the literal; the checkpoint decides which node wraps it.
    fn parse_literal_or_range(&mut self) {
        let checkpoint = self.checkpoint();
        self.bump(); // StringLit

        if self.peek() == SyntaxKind::DotDot {
            self.start_node_at(checkpoint, SyntaxKind::Range);
            self.bump(); // ..
            self.expect(SyntaxKind::StringLit, DiagnosticKind::ExpectedRangeBound);
            self.finish_node();
        } else {
            self.start_node_at(checkpoint, SyntaxKind::Literal);
            self.finish_node();
        }
    }

    fn parse_group(&mut self) {
        if !self.enter_recursion() {
            // On limit: consume everything as error, prevent deep recursion
            self.start_node(SyntaxKind::Error);
            while !self.eof() {
                self.bump();
            }
            self.finish_node();
            return;
        }

        self.start_node(SyntaxKind::Group);
        self.bump(); // (
        self.parse_union();
        if !self.eat(SyntaxKind::ParenClose) {
            self.error_recover(DiagnosticKind::UnclosedGroup, token_sets::GROUP_RECOVERY);
            self.eat(SyntaxKind::ParenClose);
        }
        self.finish_node();

        self.exit_recursion();
    }
}
