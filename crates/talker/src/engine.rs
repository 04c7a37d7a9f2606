//! Backtracking recursive descent over a compiled [`Grammar`].
//!
//! Every speculative attempt (a rule alternative, a repetition, a choice
//! alternative) saves the stream cursor first and restores it on failure, so a
//! failed attempt never consumes input. A rule that matches nothing is a plain
//! `None` which bubbles up; only the top level turns it into a [`ParseError`].

use talker_runtime::{Child, ParseTree, Token, TokenKind, TokenStream, Trace, TraceEvent};

use crate::{
    error::ParseError,
    grammar::{Grammar, RuleHandle},
    symbol::Symbol,
};

#[derive(Clone, Debug)]
pub struct ParseOptions {
    /// Maximum nesting of rule invocations before the parse is aborted.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions { max_depth: 256 }
    }
}

/// Stops the whole parse, unlike a mismatch which only fails the current attempt.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Abort {
    InvalidRule(RuleHandle),
    RecursionLimit(RuleHandle),
}

type Attempt<T> = Result<Option<T>, Abort>;

struct Parser<'a> {
    grammar: &'a Grammar,
    stream: &'a mut TokenStream,
    trace: &'a mut dyn Trace,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    fn new(
        grammar: &'a Grammar,
        stream: &'a mut TokenStream,
        trace: &'a mut dyn Trace,
        options: &ParseOptions,
    ) -> Parser<'a> {
        Parser {
            grammar,
            stream,
            trace,
            depth: 0,
            max_depth: options.max_depth,
        }
    }

    fn parse_rule(&mut self, handle: RuleHandle) -> Attempt<ParseTree> {
        let grammar = self.grammar;
        let Some(rule) = grammar.get_rule(handle) else {
            return Err(Abort::InvalidRule(handle));
        };
        if self.depth >= self.max_depth {
            return Err(Abort::RecursionLimit(handle));
        }

        self.trace.event(TraceEvent::EnterRule(&rule.name));
        self.depth += 1;

        let start = self.stream.save();
        let mut result = None;
        for alternative in &rule.alternatives {
            if let Some(children) = self.parse_sequence(alternative)? {
                result = Some(ParseTree::new(rule.name.clone(), children));
                break;
            }
            self.stream.restore(start);
        }

        self.depth -= 1;
        match result {
            Some(_) => self.trace.event(TraceEvent::RuleMatched(&rule.name)),
            None => self.trace.event(TraceEvent::RuleFailed(&rule.name)),
        }

        Ok(result)
    }

    fn parse_sequence(&mut self, symbols: &[Symbol]) -> Attempt<Vec<Child>> {
        let mut out = Vec::new();

        for symbol in symbols {
            self.skip_ignored(&mut out);

            let matched = match symbol {
                Symbol::Token(kind) => self.expect_token(*kind, &mut out),
                Symbol::Literal(text) => self.expect_literal(text, &mut out),
                Symbol::Rule(handle) => match self.parse_rule(*handle)? {
                    Some(tree) => {
                        out.push(Child::Tree(tree));
                        true
                    }
                    None => false,
                },
                Symbol::Repeat0(body) => {
                    self.repeat(body, &mut out)?;
                    true
                }
                Symbol::Repeat1(body) => match self.parse_sequence(body)? {
                    Some(first) => {
                        out.extend(first);
                        self.repeat(body, &mut out)?;
                        true
                    }
                    None => false,
                },
                Symbol::Choice(alternatives) => self.choice(alternatives, &mut out)?,
            };

            if !matched {
                return Ok(None);
            }
        }

        Ok(Some(out))
    }

    fn skip_ignored(&mut self, out: &mut Vec<Child>) {
        while self.stream.has_remaining() && self.grammar.is_ignored(self.stream.current().kind()) {
            out.push(Child::Token(self.stream.current().clone()));
            self.stream.advance();
        }
    }

    fn expect_token(&mut self, kind: TokenKind, out: &mut Vec<Child>) -> bool {
        let current = self.stream.current();
        if current.kind() == kind {
            out.push(Child::Token(current.clone()));
            self.stream.advance();
            return true;
        }

        self.trace.event(TraceEvent::TokenMismatch {
            expected: self.grammar.tokens().name(kind),
            found: current,
        });
        false
    }

    fn expect_literal(&mut self, text: &str, out: &mut Vec<Child>) -> bool {
        let current = self.stream.current();
        if current.value() == text && !current.is_eof() {
            out.push(Child::Token(current.clone()));
            self.stream.advance();
            return true;
        }

        self.trace.event(TraceEvent::LiteralMismatch {
            expected: text,
            found: current,
        });
        false
    }

    /// Matches `body` as many times as possible, never fails.
    fn repeat(&mut self, body: &[Symbol], out: &mut Vec<Child>) -> Result<(), Abort> {
        let mut iterations = 0;
        loop {
            let checkpoint = self.stream.save();
            match self.parse_sequence(body)? {
                Some(children) => {
                    out.extend(children);
                    iterations += 1;
                    // a body that matched without consuming anything would match forever
                    if self.stream.save() == checkpoint {
                        break;
                    }
                }
                None => {
                    self.stream.restore(checkpoint);
                    break;
                }
            }
        }
        self.trace.event(TraceEvent::RepeatStopped { iterations });
        Ok(())
    }

    fn choice(&mut self, alternatives: &[Vec<Symbol>], out: &mut Vec<Child>) -> Result<bool, Abort> {
        let checkpoint = self.stream.save();
        for alternative in alternatives {
            if let Some(children) = self.parse_sequence(alternative)? {
                out.extend(children);
                return Ok(true);
            }
            self.stream.restore(checkpoint);
        }
        Ok(false)
    }
}

impl Abort {
    fn into_error(self, grammar: &Grammar, options: &ParseOptions) -> ParseError {
        match self {
            Abort::InvalidRule(handle) => ParseError::InvalidRule(handle.as_u32()),
            Abort::RecursionLimit(handle) => ParseError::RecursionLimit {
                rule: grammar.rule_name(handle).to_owned(),
                limit: options.max_depth,
            },
        }
    }
}

impl Grammar {
    /// Parses `text` from the start rule with default options and no tracing.
    pub fn parse(&self, text: &str) -> Result<ParseTree, ParseError> {
        self.parse_with(text, &ParseOptions::default(), &mut talker_runtime::NoTrace)
    }

    pub fn parse_with(
        &self,
        text: &str,
        options: &ParseOptions,
        trace: &mut dyn Trace,
    ) -> Result<ParseTree, ParseError> {
        let mut stream = self.tokenize(text)?;
        self.parse_tokens(self.start(), &mut stream, options, trace)
    }

    /// Runs `start` against `stream`, which must be consumed entirely.
    ///
    /// Ignorable tokens following the match are appended to the root so that the
    /// tree covers the whole input.
    pub fn parse_tokens(
        &self,
        start: RuleHandle,
        stream: &mut TokenStream,
        options: &ParseOptions,
        trace: &mut dyn Trace,
    ) -> Result<ParseTree, ParseError> {
        let mut trailing = Vec::new();
        let tree = {
            let mut p = Parser::new(self, stream, trace, options);
            let result = p.parse_rule(start);
            p.skip_ignored(&mut trailing);
            result
        };

        let tree = match tree {
            Ok(Some(tree)) => tree,
            Ok(None) => return Err(ParseError::NoMatch),
            Err(abort) => return Err(abort.into_error(self, options)),
        };

        if stream.has_remaining() {
            let remaining: String = stream.remaining().iter().map(Token::value).collect();
            return Err(ParseError::Unconsumed {
                remaining,
                position: stream.current().position(),
            });
        }

        if trailing.is_empty() {
            return Ok(tree);
        }
        let (name, mut children) = tree.into_parts();
        children.extend(trailing);
        Ok(ParseTree::new(name, children))
    }
}
