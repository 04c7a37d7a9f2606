use std::sync::Arc;

use talker_runtime::TokenKind;

use crate::grammar::{Grammar, RuleHandle};

pub type Sequence = Vec<Symbol>;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Symbol {
    /// Matches a token of this class.
    Token(TokenKind),
    Rule(RuleHandle),
    /// Matches any token whose value is exactly this text.
    Literal(Arc<str>),
    /// Zero or more repetitions.
    Repeat0(Sequence),
    /// One or more repetitions.
    Repeat1(Sequence),
    /// Ordered choice, the first matching sequence wins.
    Choice(Vec<Sequence>),
}

impl Symbol {
    pub fn display_into(&self, buf: &mut dyn std::fmt::Write, cx: &Grammar) -> std::fmt::Result {
        match self {
            Symbol::Token(kind) => write!(buf, "{}", cx.tokens().name(*kind)),
            Symbol::Rule(handle) => write!(buf, "{}", cx.rule_name(*handle)),
            Symbol::Literal(text) => write!(buf, "{:?}", &**text),
            Symbol::Repeat0(seq) => {
                write!(buf, "(")?;
                display_sequence(seq, buf, cx)?;
                write!(buf, ")*")
            }
            Symbol::Repeat1(seq) => {
                write!(buf, "(")?;
                display_sequence(seq, buf, cx)?;
                write!(buf, ")+")
            }
            Symbol::Choice(alternatives) => {
                write!(buf, "(")?;
                for (i, seq) in alternatives.iter().enumerate() {
                    if i > 0 {
                        write!(buf, " | ")?;
                    }
                    display_sequence(seq, buf, cx)?;
                }
                write!(buf, ")")
            }
        }
    }
}

pub fn display_sequence(
    seq: &[Symbol],
    buf: &mut dyn std::fmt::Write,
    cx: &Grammar,
) -> std::fmt::Result {
    if seq.is_empty() {
        return write!(buf, "<empty>");
    }
    for (i, symbol) in seq.iter().enumerate() {
        if i > 0 {
            write!(buf, " ")?;
        }
        symbol.display_into(buf, cx)?;
    }
    Ok(())
}
