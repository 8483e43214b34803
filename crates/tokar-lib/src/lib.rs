//! Grammar compiler: parses a lexer/parser grammar into a lossless syntax
//! tree, collects its rules, and lowers them to a normalized augmented
//! transition network.
//!
//! The pipeline is tolerant end to end: malformed input still produces a
//! [`Grammar`] with diagnostics attached. The [`Error`] type covers only
//! internal automaton invariants, checked after normalization.
//!
//! ```
//! use tokar_lib::Grammar;
//!
//! let grammar = Grammar::compile("Word : [a-z]+ ;").unwrap();
//! assert!(grammar.is_valid());
//! println!("{}", grammar.dump_atn());
//! ```

pub mod atn;
pub mod decl;
pub mod diagnostics;
pub mod interval;
pub mod syntax;

mod grammar;


pub use grammar::{CompileOptions, Grammar};

use atn::StateId;

/// Broken automaton invariants. Any of these is a bug in a construction or
/// normalization pass; user-facing problems go through
/// [`diagnostics::Diagnostics`] instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("state S{state} has an outgoing edge recorded with a different source")]
    SourceMismatch { state: StateId },
    #[error("state S{state} has a consuming edge without grammar provenance")]
    MissingProvenance { state: StateId },
    #[error("state S{state} has an epsilon edge after normalization")]
    StrayEpsilon { state: StateId },
    #[error("state S{state} has mismatched in/out edge records")]
    AsymmetricEdges { state: StateId },
}

pub type Result<T> = std::result::Result<T, Error>;
