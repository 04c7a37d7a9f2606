//! Grammars as data and a backtracking parser that runs them.
//!
//! A grammar is a set of [`RuleDef`] statics whose bodies describe
//! alternatives with [`SeqBuilder`]. [`Grammar::builder`] compiles them
//! together with the token classes into an immutable [`Grammar`] which can be
//! shared between threads, each parse owns its own token stream.

pub mod engine;
pub mod error;
pub mod grammar;
pub mod symbol;

pub use engine::ParseOptions;
pub use error::{GrammarError, ParseError};
pub use grammar::{
    ChoiceBuilder, Grammar, GrammarBuilder, Rule, RuleDef, RuleHandle, RuleLoader, SeqBuilder,
};
pub use symbol::{Sequence, Symbol};

pub use talker_runtime::{
    Child, LogTrace, NoTrace, ParseTree, Position, RecordingTrace, Token, TokenClass, TokenKind,
    TokenStream, TokenTable, TokenizeError, Trace, TraceEvent,
};
