//! Injects INDENT/DEDENT tokens into a token sequence so that grammars for
//! indentation sensitive languages can match blocks like brackets.
//!
//! The markers are placed after the leading whitespace of a line, right before
//! its first significant token. Lines containing only whitespace keep the current
//! indentation.

use crate::{
    lexer::TokenizeError,
    token::{Position, Token, TokenKind},
};

/// Which token classes carry line structure.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Indentation {
    pub white: TokenKind,
    pub newline: TokenKind,
}

struct Levels {
    stack: Vec<usize>,
}

impl Levels {
    fn adjust(
        &mut self,
        width: usize,
        position: Option<Position>,
        out: &mut Vec<Token>,
    ) -> Result<(), TokenizeError> {
        let top = self.top();
        if width > top {
            self.stack.push(width);
            out.push(Token::synthetic(TokenKind::INDENT));
            return Ok(());
        }

        while width < self.top() {
            self.stack.pop();
            out.push(Token::synthetic(TokenKind::DEDENT));
        }

        if width != self.top() {
            return Err(TokenizeError::Dedent {
                position: position.unwrap_or(Position::new(0, 0)),
            });
        }

        Ok(())
    }

    fn top(&self) -> usize {
        // the bottom level 0 is never popped
        self.stack.last().copied().unwrap_or(0)
    }
}

pub fn mark_blocks(tokens: Vec<Token>, config: Indentation) -> Result<Vec<Token>, TokenizeError> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut levels = Levels { stack: vec![0] };

    let mut at_line_start = true;
    let mut leading: Option<Token> = None;

    for token in tokens {
        if !at_line_start {
            at_line_start = token.kind() == config.newline;
            out.push(token);
            continue;
        }

        if token.kind() == config.white && leading.is_none() {
            leading = Some(token);
            continue;
        }

        let width = leading
            .as_ref()
            .map_or(0, |white| white.value().chars().count());
        out.extend(leading.take());

        if token.kind() != config.newline {
            levels.adjust(width, token.position(), &mut out)?;
            at_line_start = false;
        }

        out.push(token);
    }

    out.extend(leading.take());

    while levels.stack.len() > 1 {
        levels.stack.pop();
        out.push(Token::synthetic(TokenKind::DEDENT));
    }

    Ok(out)
}
