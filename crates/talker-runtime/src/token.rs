use std::fmt::Display;

use cranelift_entity::{entity_impl, PrimaryMap};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::text::Text;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TokenKind(u32);

entity_impl! { TokenKind }

impl TokenKind {
    /// End of input, returned by the stream once the cursor runs past the last token.
    pub const EOF: TokenKind = TokenKind(0);
    /// Start of a more deeply indented block, see [`crate::indent`].
    pub const INDENT: TokenKind = TokenKind(1);
    /// End of an indented block.
    pub const DEDENT: TokenKind = TokenKind(2);
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Position {
        Position { line, column }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A single lexical unit.
///
/// Synthetic tokens (end of input, indentation markers) have no position.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
    kind: TokenKind,
    value: String,
    position: Option<Position>,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, position: Position) -> Token {
        Token {
            kind,
            value: value.into(),
            position: Some(position),
        }
    }
    pub fn synthetic(kind: TokenKind) -> Token {
        Token {
            kind,
            value: String::new(),
            position: None,
        }
    }
    pub fn kind(&self) -> TokenKind {
        self.kind
    }
    pub fn value(&self) -> &str {
        &self.value
    }
    pub fn position(&self) -> Option<Position> {
        self.position
    }
    pub fn line(&self) -> Option<u32> {
        self.position.map(|p| p.line)
    }
    pub fn column(&self) -> Option<u32> {
        self.position.map(|p| p.column)
    }
    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::EOF
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

/// How a token class recognizes text.
#[derive(Clone, Debug)]
pub enum Matcher {
    /// The first listed literal which prefixes the remaining text wins, order is priority.
    Literals(Vec<String>),
    /// A regular expression which must match exactly at the current position.
    Pattern(Regex),
    /// Never produced by scanning.
    Synthetic,
}

impl Matcher {
    /// Compiles `pattern` anchored at the start of the haystack.
    pub fn pattern(pattern: &str) -> Result<Matcher, regex::Error> {
        let anchored = Regex::new(&format!("^(?:{pattern})"))?;
        Ok(Matcher::Pattern(anchored))
    }

    /// Length in bytes of the match at the start of `rest`.
    ///
    /// Empty matches are rejected, a token must consume input.
    pub fn match_len(&self, rest: &str) -> Option<usize> {
        match self {
            Matcher::Literals(items) => items
                .iter()
                .find(|item| !item.is_empty() && rest.starts_with(item.as_str()))
                .map(String::len),
            Matcher::Pattern(rx) => rx
                .find(rest)
                .filter(|m| m.start() == 0 && !m.is_empty())
                .map(|m| m.end()),
            Matcher::Synthetic => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TokenClass {
    name: String,
    matcher: Matcher,
}

static STRING_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^(?:"(?:\\"|[^"])*"|'(?:\\'|[^'])*')"#).unwrap());
static ID_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*").unwrap());
static NUMBER_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(?:\d+(?:\.\d+)?|\.\d+)").unwrap());
static WHITE_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[ \t]+").unwrap());
static COMMENT_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?s:/\*.*?\*/|//[^\n]*)").unwrap());

impl TokenClass {
    pub fn new(name: impl Into<String>, matcher: Matcher) -> TokenClass {
        TokenClass {
            name: name.into(),
            matcher,
        }
    }
    pub fn literals<I, S>(name: impl Into<String>, items: I) -> TokenClass
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = items.into_iter().map(Into::into).collect();
        Self::new(name, Matcher::Literals(items))
    }
    pub fn pattern(name: impl Into<String>, pattern: &str) -> Result<TokenClass, regex::Error> {
        Ok(Self::new(name, Matcher::pattern(pattern)?))
    }
    pub fn synthetic(name: impl Into<String>) -> TokenClass {
        Self::new(name, Matcher::Synthetic)
    }

    /// Single or double quoted string, backslash escapes the quote.
    pub fn string() -> TokenClass {
        Self::new("STRING", Matcher::Pattern(STRING_RX.clone()))
    }
    pub fn id() -> TokenClass {
        Self::new("ID", Matcher::Pattern(ID_RX.clone()))
    }
    pub fn number() -> TokenClass {
        Self::new("NUMBER", Matcher::Pattern(NUMBER_RX.clone()))
    }
    /// Spaces and tabs, newlines are separate.
    pub fn white() -> TokenClass {
        Self::new("WHITE", Matcher::Pattern(WHITE_RX.clone()))
    }
    pub fn newline() -> TokenClass {
        Self::literals("NEWLINE", ["\n"])
    }
    /// `// line` and `/* block */` comments.
    pub fn comment() -> TokenClass {
        Self::new("CCOMMENT", Matcher::Pattern(COMMENT_RX.clone()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }
    pub fn is_synthetic(&self) -> bool {
        matches!(self.matcher, Matcher::Synthetic)
    }

    /// Tries to recognize a token of this class at the current position of `text`.
    pub fn check(&self, kind: TokenKind, text: &Text) -> Option<Token> {
        let rest = text.rest();
        let len = self.matcher.match_len(rest)?;
        Some(Token::new(kind, &rest[..len], text.position()))
    }
}

/// Ordered token classes of a grammar.
///
/// The synthetic classes always occupy the first three slots so that
/// [`TokenKind::EOF`], [`TokenKind::INDENT`] and [`TokenKind::DEDENT`] are valid in every table.
#[derive(Clone, Debug)]
pub struct TokenTable {
    classes: PrimaryMap<TokenKind, TokenClass>,
}

impl TokenTable {
    pub fn new() -> TokenTable {
        let mut classes = PrimaryMap::new();
        classes.push(TokenClass::synthetic("EOF"));
        classes.push(TokenClass::synthetic("INDENT"));
        classes.push(TokenClass::synthetic("DEDENT"));
        TokenTable { classes }
    }
    pub fn push(&mut self, class: TokenClass) -> TokenKind {
        self.classes.push(class)
    }
    pub fn get(&self, kind: TokenKind) -> Option<&TokenClass> {
        self.classes.get(kind)
    }
    pub fn name(&self, kind: TokenKind) -> &str {
        match self.classes.get(kind) {
            Some(class) => class.name(),
            None => "?",
        }
    }
    pub fn find(&self, name: &str) -> Option<TokenKind> {
        self.classes
            .iter()
            .find(|(_, class)| class.name() == name)
            .map(|(kind, _)| kind)
    }
    pub fn len(&self) -> usize {
        self.classes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
    pub fn iter(&self) -> cranelift_entity::Iter<'_, TokenKind, TokenClass> {
        self.classes.iter()
    }
    /// Classes which take part in scanning, in configured order.
    pub fn scanned(&self) -> impl Iterator<Item = (TokenKind, &TokenClass)> {
        self.classes.iter().filter(|(_, class)| !class.is_synthetic())
    }
}

impl Default for TokenTable {
    fn default() -> Self {
        Self::new()
    }
}
