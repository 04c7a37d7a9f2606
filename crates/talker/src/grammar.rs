use std::{collections::HashMap, sync::Arc};

use cranelift_entity::{entity_impl, EntitySet, PrimaryMap};
use talker_runtime::{
    indent::{self, Indentation},
    TokenClass, TokenKind, TokenStream, TokenTable, TokenizeError,
};

use crate::{
    error::{ErrorAccumulator, GrammarError},
    symbol::{display_sequence, Sequence, Symbol},
};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct RuleHandle(u32);

entity_impl! { RuleHandle }

impl RuleHandle {
    pub fn name(self, cx: &Grammar) -> &str {
        cx.rule_name(self)
    }
}

/// A named rule whose body adds alternatives through a [`RuleLoader`].
///
/// The static itself identifies the rule: the first reference registers it and
/// later references, including recursive ones, reuse the same handle. The name
/// is only a label, two statics with the same name stay two rules.
pub struct RuleDef {
    name: &'static str,
    body: fn(&mut RuleLoader<'_>),
}

impl RuleDef {
    pub const fn new(name: &'static str, body: fn(&mut RuleLoader<'_>)) -> RuleDef {
        RuleDef { name, body }
    }
    pub fn name(&self) -> &'static str {
        self.name
    }
}

pub struct Rule {
    pub name: Arc<str>,
    pub alternatives: Vec<Sequence>,
}

struct LoadCx {
    tokens: TokenTable,
    rules: PrimaryMap<RuleHandle, Rule>,
    loaded: HashMap<*const RuleDef, RuleHandle>,
    current: &'static str,
    err: ErrorAccumulator,
}

impl LoadCx {
    fn load(&mut self, def: &RuleDef) -> RuleHandle {
        let key = def as *const RuleDef;
        if let Some(&handle) = self.loaded.get(&key) {
            return handle;
        }

        // register before expanding the body so that cycles terminate
        let handle = self.rules.push(Rule {
            name: def.name.into(),
            alternatives: Vec::new(),
        });
        self.loaded.insert(key, handle);

        let outer = std::mem::replace(&mut self.current, def.name);
        let mut loader = RuleLoader {
            cx: self,
            alternatives: Vec::new(),
        };
        (def.body)(&mut loader);
        let alternatives = loader.alternatives;
        self.current = outer;

        if alternatives.is_empty() {
            self.err
                .error(format!("rule `{}` has no alternatives", def.name));
        }
        self.rules[handle].alternatives = alternatives;

        handle
    }

    fn token(&mut self, name: &str) -> TokenKind {
        match self.tokens.find(name) {
            Some(kind) => kind,
            None => {
                self.err.error(format!(
                    "rule `{}`: unknown token class `{name}`",
                    self.current
                ));
                TokenKind::EOF
            }
        }
    }
}

/// Collects the alternatives of one rule, in declaration order.
pub struct RuleLoader<'a> {
    cx: &'a mut LoadCx,
    alternatives: Vec<Sequence>,
}

impl RuleLoader<'_> {
    pub fn alt(&mut self, f: impl FnOnce(&mut SeqBuilder<'_>)) -> &mut Self {
        let mut seq = SeqBuilder {
            cx: &mut *self.cx,
            symbols: Vec::new(),
        };
        f(&mut seq);
        self.alternatives.push(seq.symbols);
        self
    }
}

pub struct SeqBuilder<'a> {
    cx: &'a mut LoadCx,
    symbols: Sequence,
}

impl SeqBuilder<'_> {
    /// A token of the named class.
    pub fn token(&mut self, name: &str) -> &mut Self {
        let kind = self.cx.token(name);
        self.symbols.push(Symbol::Token(kind));
        self
    }
    /// Any token with exactly this value.
    pub fn lit(&mut self, text: &str) -> &mut Self {
        self.symbols.push(Symbol::Literal(text.into()));
        self
    }
    pub fn rule(&mut self, def: &RuleDef) -> &mut Self {
        let handle = self.cx.load(def);
        self.symbols.push(Symbol::Rule(handle));
        self
    }
    pub fn star(&mut self, f: impl FnOnce(&mut SeqBuilder<'_>)) -> &mut Self {
        let seq = self.nested(f);
        self.symbols.push(Symbol::Repeat0(seq));
        self
    }
    pub fn plus(&mut self, f: impl FnOnce(&mut SeqBuilder<'_>)) -> &mut Self {
        let seq = self.nested(f);
        self.symbols.push(Symbol::Repeat1(seq));
        self
    }
    pub fn choice(&mut self, f: impl FnOnce(&mut ChoiceBuilder<'_>)) -> &mut Self {
        let mut choice = ChoiceBuilder {
            cx: &mut *self.cx,
            alternatives: Vec::new(),
        };
        f(&mut choice);
        let alternatives = choice.alternatives;

        if alternatives.is_empty() {
            self.cx
                .err
                .error(format!("rule `{}`: empty choice", self.cx.current));
        }
        self.symbols.push(Symbol::Choice(alternatives));
        self
    }
    /// Sugar for a choice between the sequence and nothing.
    pub fn optional(&mut self, f: impl FnOnce(&mut SeqBuilder<'_>)) -> &mut Self {
        let seq = self.nested(f);
        self.symbols.push(Symbol::Choice(vec![seq, Vec::new()]));
        self
    }
    fn nested(&mut self, f: impl FnOnce(&mut SeqBuilder<'_>)) -> Sequence {
        let mut inner = SeqBuilder {
            cx: &mut *self.cx,
            symbols: Vec::new(),
        };
        f(&mut inner);
        inner.symbols
    }
}

pub struct ChoiceBuilder<'a> {
    cx: &'a mut LoadCx,
    alternatives: Vec<Sequence>,
}

impl ChoiceBuilder<'_> {
    pub fn alt(&mut self, f: impl FnOnce(&mut SeqBuilder<'_>)) -> &mut Self {
        let mut seq = SeqBuilder {
            cx: &mut *self.cx,
            symbols: Vec::new(),
        };
        f(&mut seq);
        self.alternatives.push(seq.symbols);
        self
    }
}

pub struct GrammarBuilder {
    start: &'static RuleDef,
    tokens: Vec<TokenClass>,
    ignore: Vec<String>,
    indentation: Option<(String, String)>,
}

impl GrammarBuilder {
    /// Adds a token class, classes are tried in the order they are added.
    pub fn token(mut self, class: TokenClass) -> Self {
        self.tokens.push(class);
        self
    }
    pub fn tokens(mut self, classes: impl IntoIterator<Item = TokenClass>) -> Self {
        self.tokens.extend(classes);
        self
    }
    /// CCOMMENT, STRING, NUMBER, ID, WHITE and NEWLINE.
    pub fn default_tokens(self) -> Self {
        self.tokens([
            TokenClass::comment(),
            TokenClass::string(),
            TokenClass::number(),
            TokenClass::id(),
            TokenClass::white(),
            TokenClass::newline(),
        ])
    }
    /// Token classes skipped between symbols.
    pub fn ignore<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.ignore.extend(names.into_iter().map(Into::into));
        self
    }
    /// Enables INDENT/DEDENT injection based on the named whitespace and newline classes.
    pub fn indentation(mut self, white: &str, newline: &str) -> Self {
        self.indentation = Some((white.to_owned(), newline.to_owned()));
        self
    }

    pub fn build(self) -> Result<Grammar, GrammarError> {
        let err = ErrorAccumulator::new();

        let mut tokens = TokenTable::new();
        for class in self.tokens {
            if tokens.find(class.name()).is_some() {
                err.error(format!("duplicate token class `{}`", class.name()));
                continue;
            }
            tokens.push(class);
        }

        let mut ignore = EntitySet::new();
        for name in &self.ignore {
            match tokens.find(name) {
                Some(kind) if tokens.get(kind).is_some_and(TokenClass::is_synthetic) => {
                    err.error(format!("synthetic token class `{name}` cannot be ignored"))
                }
                Some(kind) => {
                    ignore.insert(kind);
                }
                None => err.error(format!("unknown ignored token class `{name}`")),
            }
        }

        let indentation = match &self.indentation {
            Some((white, newline)) => match (tokens.find(white), tokens.find(newline)) {
                (Some(white), Some(newline)) => Some(Indentation { white, newline }),
                _ => {
                    err.error(format!(
                        "unknown indentation token classes `{white}`, `{newline}`"
                    ));
                    None
                }
            },
            None => None,
        };

        let mut cx = LoadCx {
            tokens,
            rules: PrimaryMap::new(),
            loaded: HashMap::new(),
            current: self.start.name,
            err,
        };
        let start = cx.load(self.start);

        let LoadCx {
            tokens, rules, err, ..
        } = cx;

        let errors = err.finish();
        if !errors.is_empty() {
            return Err(GrammarError { errors });
        }

        log::debug!(
            "compiled grammar `{}`: {} rules, {} token classes",
            rules[start].name,
            rules.len(),
            tokens.len()
        );

        Ok(Grammar {
            tokens,
            ignore,
            indentation,
            rules,
            start,
        })
    }
}

/// A compiled grammar, read-only and shareable between parses.
pub struct Grammar {
    tokens: TokenTable,
    ignore: EntitySet<TokenKind>,
    indentation: Option<Indentation>,
    rules: PrimaryMap<RuleHandle, Rule>,
    start: RuleHandle,
}

impl Grammar {
    pub fn builder(start: &'static RuleDef) -> GrammarBuilder {
        GrammarBuilder {
            start,
            tokens: Vec::new(),
            ignore: Vec::new(),
            indentation: None,
        }
    }

    pub fn start(&self) -> RuleHandle {
        self.start
    }

    pub fn tokens(&self) -> &TokenTable {
        &self.tokens
    }

    pub fn get_rule(&self, handle: RuleHandle) -> Option<&Rule> {
        self.rules.get(handle)
    }

    pub fn rule_name(&self, handle: RuleHandle) -> &str {
        match self.rules.get(handle) {
            Some(rule) => &rule.name,
            None => "?",
        }
    }

    pub fn find_rule(&self, name: &str) -> Option<RuleHandle> {
        self.rules
            .iter()
            .find(|(_, rule)| &*rule.name == name)
            .map(|(handle, _)| handle)
    }

    pub fn iter(&self) -> cranelift_entity::Iter<'_, RuleHandle, Rule> {
        self.rules.iter()
    }

    pub fn is_ignored(&self, kind: TokenKind) -> bool {
        self.ignore.contains(kind)
    }

    pub fn ignored(&self) -> &EntitySet<TokenKind> {
        &self.ignore
    }

    pub fn indentation(&self) -> Option<Indentation> {
        self.indentation
    }

    pub fn tokenize(&self, text: &str) -> Result<TokenStream, TokenizeError> {
        let mut tokens = talker_runtime::tokenize(&self.tokens, text)?;
        if let Some(config) = self.indentation {
            tokens = indent::mark_blocks(tokens, config)?;
        }
        Ok(TokenStream::new(tokens))
    }

    pub fn display_rules(&self, buf: &mut dyn std::fmt::Write) -> std::fmt::Result {
        for (_, rule) in self.rules.iter() {
            writeln!(buf, "{} =", rule.name)?;
            for alternative in &rule.alternatives {
                write!(buf, "  | ")?;
                display_sequence(alternative, buf, self)?;
                writeln!(buf)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static EXPR: RuleDef = RuleDef::new("expr", |r| {
        r.alt(|s| {
            s.rule(&TERM).plus(|s| {
                s.lit("+").rule(&TERM);
            });
        })
        .alt(|s| {
            s.rule(&TERM);
        });
    });

    static TERM: RuleDef = RuleDef::new("term", |r| {
        r.alt(|s| {
            s.token("NUMBER");
        })
        .alt(|s| {
            s.lit("(").rule(&EXPR).lit(")");
        });
    });

    static LIST: RuleDef = RuleDef::new("list", |r| {
        r.alt(|s| {
            s.lit("[").optional(|s| {
                s.rule(&LIST).star(|s| {
                    s.lit(",").rule(&LIST);
                });
            });
            s.lit("]");
        });
    });

    fn arithmetic() -> Grammar {
        Grammar::builder(&EXPR)
            .default_tokens()
            .token(TokenClass::literals("OP", ["+", "(", ")"]))
            .ignore(["WHITE"])
            .build()
            .unwrap()
    }

    #[test]
    fn rules_are_registered_before_their_bodies() {
        let grammar = arithmetic();

        assert_eq!(grammar.iter().count(), 2);
        assert_eq!(grammar.start(), RuleHandle::from_u32(0));
        assert_eq!(grammar.start().name(&grammar), "expr");

        let term = grammar.find_rule("term").unwrap();
        assert_eq!(term, RuleHandle::from_u32(1));

        // the recursive reference from term back to expr reuses the start handle
        let rule = grammar.get_rule(term).unwrap();
        assert_eq!(rule.alternatives.len(), 2);
        assert!(rule.alternatives[1].contains(&Symbol::Rule(grammar.start())));
    }

    #[test]
    fn self_recursion() {
        let grammar = Grammar::builder(&LIST)
            .token(TokenClass::literals("PUNCT", ["[", "]", ","]))
            .build()
            .unwrap();

        assert_eq!(grammar.iter().count(), 1);
        let mut out = String::new();
        grammar.display_rules(&mut out).unwrap();
        assert_eq!(out, "list =\n  | \"[\" (list (\",\" list)* | <empty>) \"]\"\n");
    }

    #[test]
    fn display_rules() {
        let grammar = arithmetic();
        let mut out = String::new();
        grammar.display_rules(&mut out).unwrap();
        assert_eq!(
            out,
            "expr =\n  | term (\"+\" term)+\n  | term\nterm =\n  | NUMBER\n  | \"(\" expr \")\"\n"
        );
    }

    #[test]
    fn ignore_set() {
        let grammar = arithmetic();
        let white = grammar.tokens().find("WHITE").unwrap();
        let number = grammar.tokens().find("NUMBER").unwrap();
        assert!(grammar.is_ignored(white));
        assert!(!grammar.is_ignored(number));
        assert!(!grammar.is_ignored(TokenKind::EOF));
    }

    static BROKEN: RuleDef = RuleDef::new("broken", |r| {
        r.alt(|s| {
            s.token("NUMBER").token("MISSING").rule(&EMPTY);
            s.choice(|_| {});
        });
    });

    static EMPTY: RuleDef = RuleDef::new("empty", |_| {});

    #[test]
    fn reports_every_problem() {
        let result = Grammar::builder(&BROKEN)
            .token(TokenClass::number())
            .token(TokenClass::number())
            .ignore(["EOF", "NOPE"])
            .indentation("WHITE", "NEWLINE")
            .build();

        let Err(err) = result else {
            panic!("grammar should not compile");
        };
        let messages: Vec<&str> = err.errors.iter().map(|e| &**e).collect();
        assert_eq!(
            messages,
            [
                "duplicate token class `NUMBER`",
                "synthetic token class `EOF` cannot be ignored",
                "unknown ignored token class `NOPE`",
                "unknown indentation token classes `WHITE`, `NEWLINE`",
                "rule `broken`: unknown token class `MISSING`",
                "rule `empty` has no alternatives",
                "rule `broken`: empty choice",
            ]
        );
        assert!(err.to_string().starts_with("invalid grammar:\n  - duplicate"));
    }

    static NUMBER_ITEM: RuleDef = RuleDef::new("item", |r| {
        r.alt(|s| {
            s.token("NUMBER");
        });
    });

    static ID_ITEM: RuleDef = RuleDef::new("item", |r| {
        r.alt(|s| {
            s.token("ID");
        });
    });

    static PAIR: RuleDef = RuleDef::new("pair", |r| {
        r.alt(|s| {
            s.rule(&NUMBER_ITEM).rule(&ID_ITEM);
        });
    });

    #[test]
    fn rules_sharing_a_name_stay_distinct() {
        let grammar = Grammar::builder(&PAIR)
            .tokens([TokenClass::number(), TokenClass::id(), TokenClass::white()])
            .ignore(["WHITE"])
            .build()
            .unwrap();

        assert_eq!(grammar.iter().count(), 3);
        let pair = grammar.get_rule(grammar.start()).unwrap();
        assert_eq!(
            pair.alternatives[0],
            [
                Symbol::Rule(RuleHandle::from_u32(1)),
                Symbol::Rule(RuleHandle::from_u32(2))
            ]
        );
        assert_eq!(RuleHandle::from_u32(2).name(&grammar), "item");

        assert_eq!(grammar.parse("1 x").unwrap().text(), "1 x");
        assert!(grammar.parse("1 2").is_err());
    }

    #[test]
    fn synthetic_classes_are_addressable() {
        static BLOCK: RuleDef = RuleDef::new("block", |r| {
            r.alt(|s| {
                s.token("INDENT").token("ID").token("DEDENT").token("EOF");
            });
        });

        let grammar = Grammar::builder(&BLOCK)
            .token(TokenClass::id())
            .build()
            .unwrap();
        let rule = grammar.get_rule(grammar.start()).unwrap();
        assert_eq!(rule.alternatives[0][0], Symbol::Token(TokenKind::INDENT));
        assert_eq!(rule.alternatives[0][3], Symbol::Token(TokenKind::EOF));
    }
}
