//! Grammar notation lexer, parser, and syntax types.
//!
//! Produces a lossless concrete syntax tree using [Rowan](https://docs.rs/rowan).
//!
//! # Architecture
//!
//! ```text
//! Source text → Lexer → Tokens → Parser → GreenNode → SyntaxNode
//!                                              ↓
//!                                         Diagnostics
//! ```
//!
//! - [`lexer`]: Logos-based tokenizer producing `Token { kind, span }` pairs.
//!   Tokens are zero-copy—text is sliced from source only when building the tree.
//!
//! - [`parser`]: Resilient LL parser using Rowan's `GreenNodeBuilder`. Key features:
//!   - Trivia buffering: whitespace/comments attach as leading trivia to nodes
//!   - Checkpoint API: enables retroactive node wrapping (e.g., ranges)
//!   - Recovery sets: per-production FOLLOW sets guide error recovery
//!   - Fuel mechanism (debug): detects infinite loops in lookahead
//!
//! - [`syntax_kind`]: `SyntaxKind` enum covering all tokens and nodes,
//!   plus `TokenSet` bitset for O(1) membership testing.
//!
//! - [`ast`]: typed wrappers over `SyntaxNode` with domain accessors and
//!   escape decoding for literals and character sets.
//!
//! # Error Handling
//!
//! The parser is designed to never fail outright. On invalid input:
//! 1. A diagnostic is recorded with span and message
//! 2. Unexpected tokens are wrapped in `Error` nodes
//! 3. Parsing continues at the nearest recovery point
//!
//! Downstream passes always have a tree to work with.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod syntax_kind;

#[cfg(test)]
mod lexer_tests;
#[cfg(test)]
mod parser_tests;
