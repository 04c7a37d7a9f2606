use std::fmt::Display;

use crate::token::Token;

/// Something the parse engine did, reported to a [`Trace`] sink.
#[derive(Clone, Copy, Debug)]
pub enum TraceEvent<'a> {
    EnterRule(&'a str),
    RuleMatched(&'a str),
    RuleFailed(&'a str),
    TokenMismatch { expected: &'a str, found: &'a Token },
    LiteralMismatch { expected: &'a str, found: &'a Token },
    RepeatStopped { iterations: usize },
}

impl Display for TraceEvent<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            TraceEvent::EnterRule(name) => write!(f, "parsing for rule {name}"),
            TraceEvent::RuleMatched(name) => write!(f, "yes! {name}"),
            TraceEvent::RuleFailed(name) => write!(f, "failed {name}"),
            TraceEvent::TokenMismatch { expected, found } => {
                write!(f, "token mismatch: expected {expected}, found {:?}", found.value())
            }
            TraceEvent::LiteralMismatch { expected, found } => {
                write!(f, "literal mismatch: expected {expected:?}, found {:?}", found.value())
            }
            TraceEvent::RepeatStopped { iterations } => {
                write!(f, "repeat stopped after {iterations}")
            }
        }
    }
}

/// Observes a parse, must not influence it.
pub trait Trace {
    fn event(&mut self, event: TraceEvent<'_>) {
        _ = event;
    }
}

pub struct NoTrace;

impl Trace for NoTrace {}

/// Nesting depth for indented output, rule entry opens a level and its result closes it.
#[derive(Default)]
struct Indent(usize);

impl Indent {
    fn before(&mut self, event: &TraceEvent<'_>) -> usize {
        if let TraceEvent::RuleMatched(_) | TraceEvent::RuleFailed(_) = event {
            self.0 = self.0.saturating_sub(1);
        }
        self.0
    }
    fn after(&mut self, event: &TraceEvent<'_>) {
        if let TraceEvent::EnterRule(_) = event {
            self.0 += 1;
        }
    }
}

/// Forwards events to the `log` facade at trace level.
#[derive(Default)]
pub struct LogTrace {
    indent: Indent,
}

impl LogTrace {
    pub fn new() -> LogTrace {
        Self::default()
    }
}

impl Trace for LogTrace {
    fn event(&mut self, event: TraceEvent<'_>) {
        let level = self.indent.before(&event);
        log::trace!("{:width$}{event}", "", width = level * 2);
        self.indent.after(&event);
    }
}

/// Collects events as indented text.
#[derive(Default)]
pub struct RecordingTrace {
    indent: Indent,
    text: String,
}

impl RecordingTrace {
    pub fn new() -> RecordingTrace {
        Self::default()
    }
    pub fn text(&self) -> &str {
        &self.text
    }
    pub fn into_text(self) -> String {
        self.text
    }
}

impl Trace for RecordingTrace {
    fn event(&mut self, event: TraceEvent<'_>) {
        use std::fmt::Write;

        let level = self.indent.before(&event);
        for _ in 0..level {
            self.text.push_str("  ");
        }
        _ = writeln!(self.text, "{event}");
        self.indent.after(&event);
    }
}

#[test]
fn test_recording_indents_rules() {
    use crate::token::{Position, TokenKind};

    let found = Token::new(TokenKind::from_u32(3), "x", Position::new(1, 1));
    let mut trace = RecordingTrace::new();

    trace.event(TraceEvent::EnterRule("outer"));
    trace.event(TraceEvent::EnterRule("inner"));
    trace.event(TraceEvent::LiteralMismatch {
        expected: "(",
        found: &found,
    });
    trace.event(TraceEvent::RuleFailed("inner"));
    trace.event(TraceEvent::RepeatStopped { iterations: 0 });
    trace.event(TraceEvent::RuleMatched("outer"));

    assert_eq!(
        trace.text(),
        "parsing for rule outer\n  parsing for rule inner\n    literal mismatch: expected \"(\", found \"x\"\n  failed inner\n  repeat stopped after 0\nyes! outer\n"
    );
}
