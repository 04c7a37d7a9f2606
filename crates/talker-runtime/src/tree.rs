use std::{fmt::Display, sync::Arc};

use cranelift_entity::EntitySet;
use serde_json::{json, Value};

use crate::token::{Token, TokenKind, TokenTable};

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Child {
    Token(Token),
    Tree(ParseTree),
}

impl Child {
    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Child::Token(token) => Some(token),
            Child::Tree(_) => None,
        }
    }
    pub fn as_tree(&self) -> Option<&ParseTree> {
        match self {
            Child::Token(_) => None,
            Child::Tree(tree) => Some(tree),
        }
    }
}

/// A node produced by a successful rule, labeled with the rule's name.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ParseTree {
    name: Arc<str>,
    children: Vec<Child>,
}

impl ParseTree {
    pub fn new(name: Arc<str>, children: Vec<Child>) -> ParseTree {
        ParseTree { name, children }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn children(&self) -> &[Child] {
        &self.children
    }
    pub fn into_parts(self) -> (Arc<str>, Vec<Child>) {
        (self.name, self.children)
    }

    /// Direct children which are nodes.
    pub fn subtrees(&self) -> impl Iterator<Item = &ParseTree> {
        self.children.iter().filter_map(Child::as_tree)
    }

    /// All tokens in the tree, depth first in source order.
    pub fn tokens(&self) -> TreeTokens<'_> {
        TreeTokens {
            stack: vec![self.children.iter()],
        }
    }

    /// Concatenated values of all contained tokens.
    pub fn text(&self) -> String {
        self.tokens().map(Token::value).collect()
    }

    /// The first node named `name` in preorder, including `self`.
    pub fn find(&self, name: &str) -> Option<&ParseTree> {
        if &*self.name == name {
            return Some(self);
        }
        self.subtrees().find_map(|tree| tree.find(name))
    }

    pub fn display_into(
        &self,
        buf: &mut dyn std::fmt::Write,
        table: &TokenTable,
        hidden: Option<&EntitySet<TokenKind>>,
        level: usize,
    ) -> std::fmt::Result {
        for _ in 0..level {
            write!(buf, "  ")?;
        }
        writeln!(buf, "{}", self.name)?;

        for child in &self.children {
            match child {
                Child::Tree(tree) => tree.display_into(buf, table, hidden, level + 1)?,
                Child::Token(token) => {
                    if hidden.is_some_and(|set| set.contains(token.kind())) {
                        continue;
                    }
                    for _ in 0..=level {
                        write!(buf, "  ")?;
                    }
                    writeln!(buf, "{} {:?}", table.name(token.kind()), token.value())?;
                }
            }
        }

        Ok(())
    }

    pub fn display<'a, 'b>(
        &'a self,
        table: &'b TokenTable,
        hidden: Option<&'b EntitySet<TokenKind>>,
    ) -> TreeDisplay<'a, 'b> {
        TreeDisplay(self, table, hidden)
    }

    pub fn to_json(&self, table: &TokenTable) -> Value {
        let children: Vec<Value> = self
            .children
            .iter()
            .map(|child| match child {
                Child::Tree(tree) => tree.to_json(table),
                Child::Token(token) => json!({
                    "token": table.name(token.kind()),
                    "value": token.value(),
                    "line": token.line(),
                    "column": token.column(),
                }),
            })
            .collect();

        json!({
            "rule": &*self.name,
            "children": children,
        })
    }
}

pub struct TreeTokens<'a> {
    stack: Vec<std::slice::Iter<'a, Child>>,
}

impl<'a> Iterator for TreeTokens<'a> {
    type Item = &'a Token;
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(Child::Token(token)) => return Some(token),
                Some(Child::Tree(tree)) => self.stack.push(tree.children.iter()),
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

#[derive(Clone, Copy)]
pub struct TreeDisplay<'a, 'b>(
    &'a ParseTree,
    &'b TokenTable,
    Option<&'b EntitySet<TokenKind>>,
);
impl Display for TreeDisplay<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.display_into(f, self.1, self.2, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Position, TokenClass};

    fn sample() -> (TokenTable, TokenKind, TokenKind, ParseTree) {
        let mut table = TokenTable::new();
        let id = table.push(TokenClass::id());
        let white = table.push(TokenClass::white());

        let at = |column| Position::new(1, column);
        let inner = ParseTree::new(
            "inner".into(),
            vec![
                Child::Token(Token::new(id, "b", at(3))),
                Child::Token(Token::new(white, " ", at(4))),
            ],
        );
        let root = ParseTree::new(
            "root".into(),
            vec![
                Child::Token(Token::new(id, "a", at(1))),
                Child::Token(Token::new(white, " ", at(2))),
                Child::Tree(inner),
                Child::Tree(ParseTree::new("empty".into(), Vec::new())),
                Child::Token(Token::new(id, "c", at(5))),
            ],
        );
        (table, id, white, root)
    }

    #[test]
    fn tokens_in_source_order() {
        let (_, _, _, root) = sample();
        let values: Vec<_> = root.tokens().map(Token::value).collect();
        assert_eq!(values, ["a", " ", "b", " ", "c"]);
        assert_eq!(root.text(), "a b c");
    }

    #[test]
    fn find_nodes() {
        let (_, _, _, root) = sample();
        assert_eq!(root.find("root").map(ParseTree::name), Some("root"));
        assert_eq!(root.find("inner").map(|t| t.text()), Some("b ".to_owned()));
        assert!(root.find("empty").unwrap().children().is_empty());
        assert!(root.find("missing").is_none());
        assert_eq!(root.subtrees().count(), 2);
    }

    #[test]
    fn display_hides_ignored() {
        let (table, _, white, root) = sample();
        let mut hidden = EntitySet::new();
        hidden.insert(white);

        let shown = root.display(&table, Some(&hidden)).to_string();
        assert_eq!(
            shown,
            "root\n  ID \"a\"\n  inner\n    ID \"b\"\n  empty\n  ID \"c\"\n"
        );

        let all = root.display(&table, None).to_string();
        assert_eq!(all.matches("WHITE").count(), 2);
    }

    #[test]
    fn json_export() {
        let (table, _, _, root) = sample();
        let value = root.to_json(&table);
        assert_eq!(value["rule"], "root");
        assert_eq!(value["children"][0]["token"], "ID");
        assert_eq!(value["children"][0]["value"], "a");
        assert_eq!(value["children"][0]["column"], 1);
        assert_eq!(value["children"][2]["rule"], "inner");
        assert_eq!(value["children"][3]["children"], json!([]));
    }
}
