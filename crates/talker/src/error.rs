use std::{borrow::Cow, cell::RefCell};

use talker_runtime::{Position, TokenizeError};
use thiserror::Error;

pub type Error = Cow<'static, str>;

#[derive(Default)]
pub struct ErrorAccumulator {
    errors: RefCell<Vec<Error>>,
}

impl ErrorAccumulator {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn error(&self, err: impl ToString) {
        self.errors.borrow_mut().push(err.to_string().into());
    }
    pub fn finish(self) -> Vec<Error> {
        RefCell::into_inner(self.errors)
    }
}

/// Problems found while compiling a grammar definition.
#[derive(Error, Debug)]
#[error("invalid grammar:\n{}", .errors.iter().map(|e| format!("  - {e}")).collect::<Vec<_>>().join("\n"))]
pub struct GrammarError {
    pub errors: Vec<Error>,
}

#[derive(Error, Debug)]
pub enum ParseError {
    /// The start rule did not match.
    #[error("failed to parse")]
    NoMatch,
    /// The start rule matched but tokens were left over.
    #[error("not everything was parsed: '{remaining}' left")]
    Unconsumed {
        remaining: String,
        position: Option<Position>,
    },
    #[error("invalid rule: {0}")]
    InvalidRule(u32),
    #[error("recursion limit of {limit} exceeded while parsing rule `{rule}`")]
    RecursionLimit { rule: String, limit: usize },
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
}
