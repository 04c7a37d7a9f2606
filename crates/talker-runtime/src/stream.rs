use crate::token::{Token, TokenKind};

/// Saved cursor of a [`TokenStream`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Checkpoint(usize);

/// Already produced tokens with a single cursor.
///
/// The cursor is the only mutable state, so saving and restoring it is
/// enough to backtrack.
#[derive(Clone, Debug)]
pub struct TokenStream {
    tokens: Vec<Token>,
    position: usize,
    eof: Token,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> TokenStream {
        TokenStream {
            tokens,
            position: 0,
            eof: Token::synthetic(TokenKind::EOF),
        }
    }

    /// The token under the cursor, or the end of input sentinel.
    pub fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&self.eof)
    }

    pub fn advance(&mut self) {
        self.position = usize::min(self.position + 1, self.tokens.len());
    }

    pub fn has_remaining(&self) -> bool {
        self.position < self.tokens.len()
    }

    pub fn save(&self) -> Checkpoint {
        Checkpoint(self.position)
    }

    /// A checkpoint past the end, taken from a longer stream, is clamped to the end.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.position = usize::min(checkpoint.0, self.tokens.len());
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> &[Token] {
        &self.tokens[self.position..]
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Position;

    fn stream(values: &[&str]) -> TokenStream {
        let kind = TokenKind::from_u32(3);
        let tokens = values
            .iter()
            .enumerate()
            .map(|(i, v)| Token::new(kind, *v, Position::new(1, i as u32 + 1)))
            .collect();
        TokenStream::new(tokens)
    }

    #[test]
    fn reading_past_the_end_yields_eof() {
        let mut s = stream(&["a", "b"]);
        assert_eq!(s.current().value(), "a");
        assert!(s.has_remaining());

        s.advance();
        assert_eq!(s.current().value(), "b");
        assert!(s.has_remaining());

        s.advance();
        assert!(s.current().is_eof());
        assert!(!s.has_remaining());

        // advancing is saturating
        s.advance();
        s.advance();
        assert_eq!(s.position(), 2);
        assert!(s.current().is_eof());
        assert!(s.remaining().is_empty());
    }

    #[test]
    fn checkpoints_roll_back() {
        let mut s = stream(&["a", "b", "c"]);
        s.advance();
        let checkpoint = s.save();

        s.advance();
        s.advance();
        assert_eq!(s.remaining().len(), 0);

        s.restore(checkpoint);
        assert_eq!(s.current().value(), "b");
        assert_eq!(s.save(), checkpoint);
        let rest: Vec<_> = s.remaining().iter().map(Token::value).collect();
        assert_eq!(rest, ["b", "c"]);
    }

    #[test]
    fn foreign_checkpoint_stays_in_bounds() {
        let mut long = stream(&["a", "b", "c"]);
        long.advance();
        long.advance();
        long.advance();
        let checkpoint = long.save();

        let mut short = stream(&["a"]);
        short.restore(checkpoint);
        assert_eq!(short.position(), 1);
        assert!(short.remaining().is_empty());
        assert!(short.current().is_eof());
    }

    #[test]
    fn empty_stream() {
        let s = TokenStream::new(Vec::new());
        assert!(s.is_empty());
        assert!(!s.has_remaining());
        assert!(s.current().is_eof());
    }
}
