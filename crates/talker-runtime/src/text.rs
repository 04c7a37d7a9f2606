use crate::token::Position;

/// Source text with a cursor that tracks line and column.
#[derive(Clone)]
pub struct Text<'a> {
    src: &'a str,
    offset: usize,
    line: u32,
    column: u32,
}

impl<'a> Text<'a> {
    pub fn new(src: &'a str) -> Text<'a> {
        Text {
            src,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn rest(&self) -> &'a str {
        &self.src[self.offset..]
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    pub fn is_at_end(&self) -> bool {
        self.offset >= self.src.len()
    }

    /// Moves the cursor `len` bytes forward, `len` must end on a char boundary.
    pub fn advance(&mut self, len: usize) {
        let end = usize::min(self.offset + len, self.src.len());
        for c in self.src[self.offset..end].chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.offset = end;
    }
}

#[test]
fn test_text_positions() {
    let mut text = Text::new("ab\nçd\n");
    assert_eq!(text.position(), Position::new(1, 1));

    text.advance(2);
    assert_eq!(text.position(), Position::new(1, 3));
    assert_eq!(text.rest(), "\nçd\n");

    text.advance(1);
    assert_eq!(text.position(), Position::new(2, 1));

    // columns count characters, 'ç' is two bytes
    text.advance("ç".len());
    assert_eq!(text.position(), Position::new(2, 2));

    text.advance(100);
    assert!(text.is_at_end());
    assert_eq!(text.position(), Position::new(3, 1));
}
