use thiserror::Error;

use crate::{
    text::Text,
    token::{Position, Token, TokenTable},
};

#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub enum TokenizeError {
    #[error("unrecognized character {found:?} at {position}")]
    Unrecognized { found: char, position: Position },
    #[error("dedent does not match any outer indentation level at {position}")]
    Dedent { position: Position },
}

pub struct Lexer<'a, 'b> {
    table: &'a TokenTable,
    text: Text<'b>,
}

impl<'a, 'b> Lexer<'a, 'b> {
    pub fn new(table: &'a TokenTable, src: &'b str) -> Lexer<'a, 'b> {
        Lexer {
            table,
            text: Text::new(src),
        }
    }

    /// Produces the next token, the first class in table order that matches wins.
    pub fn lex_next(&mut self) -> Option<Result<Token, TokenizeError>> {
        if self.text.is_at_end() {
            return None;
        }

        for (kind, class) in self.table.scanned() {
            if let Some(token) = class.check(kind, &self.text) {
                self.text.advance(token.value().len());
                return Some(Ok(token));
            }
        }

        let found = self.text.rest().chars().next()?;
        Some(Err(TokenizeError::Unrecognized {
            found,
            position: self.text.position(),
        }))
    }
}

/// Splits `src` into tokens covering every byte of it.
pub fn tokenize(table: &TokenTable, src: &str) -> Result<Vec<Token>, TokenizeError> {
    let mut l = Lexer::new(table, src);
    let mut tokens = Vec::new();
    while let Some(next) = l.lex_next() {
        tokens.push(next?);
    }
    log::debug!("tokenized {} bytes into {} tokens", src.len(), tokens.len());
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenClass;

    fn table() -> TokenTable {
        let mut table = TokenTable::new();
        table.push(TokenClass::number());
        table.push(TokenClass::id());
        table.push(TokenClass::white());
        table.push(TokenClass::newline());
        table.push(TokenClass::literals("OP", ["+", "-", ","]));
        table
    }

    #[test]
    fn covers_the_whole_input() {
        let table = table();
        let src = "a + 12\nb,-3";
        let tokens = tokenize(&table, src).unwrap();

        let joined: String = tokens.iter().map(Token::value).collect();
        assert_eq!(joined, src);

        let names: Vec<_> = tokens.iter().map(|t| table.name(t.kind())).collect();
        assert_eq!(
            names,
            ["ID", "WHITE", "OP", "WHITE", "NUMBER", "NEWLINE", "ID", "OP", "NUMBER"]
        );

        // NUMBER is configured before OP so "-3" is a single token
        assert_eq!(tokens.last().unwrap().value(), "-3");
        assert_eq!(tokens[6].position(), Some(Position::new(2, 1)));
        assert_eq!(tokens[8].position(), Some(Position::new(2, 3)));
    }

    #[test]
    fn reports_unrecognized_characters() {
        let err = tokenize(&table(), "a\n  $").unwrap_err();
        assert_eq!(
            err,
            TokenizeError::Unrecognized {
                found: '$',
                position: Position::new(2, 3)
            }
        );
    }

    #[test]
    fn empty_input() {
        assert!(tokenize(&table(), "").unwrap().is_empty());
    }
}
