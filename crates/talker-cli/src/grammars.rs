//! Grammars bundled with the binary.

use talker::{Grammar, GrammarError, RuleDef, TokenClass};

pub const NAMES: &[&str] = &["numbers", "json"];

pub fn load(name: &str) -> Option<Result<Grammar, GrammarError>> {
    match name {
        "numbers" => Some(numbers()),
        "json" => Some(json()),
        _ => None,
    }
}

static NUMBER_LIST: RuleDef = RuleDef::new("number_list", |r| {
    r.alt(|s| {
        s.token("NUMBER").star(|s| {
            s.lit(",").token("NUMBER");
        });
    });
});

/// Comma separated numbers, whitespace and newlines in between.
pub fn numbers() -> Result<Grammar, GrammarError> {
    Grammar::builder(&NUMBER_LIST)
        .tokens([
            TokenClass::number(),
            TokenClass::white(),
            TokenClass::newline(),
            TokenClass::literals("PUNCT", [","]),
        ])
        .ignore(["WHITE", "NEWLINE"])
        .build()
}

static VALUE: RuleDef = RuleDef::new("value", |r| {
    r.alt(|s| {
        s.token("STRING");
    })
    .alt(|s| {
        s.token("NUMBER");
    })
    .alt(|s| {
        s.rule(&OBJECT);
    })
    .alt(|s| {
        s.rule(&ARRAY);
    })
    .alt(|s| {
        s.choice(|c| {
            c.alt(|s| {
                s.lit("true");
            })
            .alt(|s| {
                s.lit("false");
            })
            .alt(|s| {
                s.lit("null");
            });
        });
    });
});

static OBJECT: RuleDef = RuleDef::new("object", |r| {
    r.alt(|s| {
        s.lit("{");
        s.optional(|s| {
            s.rule(&MEMBER).star(|s| {
                s.lit(",").rule(&MEMBER);
            });
        });
        s.lit("}");
    });
});

static MEMBER: RuleDef = RuleDef::new("member", |r| {
    r.alt(|s| {
        s.token("STRING").lit(":").rule(&VALUE);
    });
});

static ARRAY: RuleDef = RuleDef::new("array", |r| {
    r.alt(|s| {
        s.lit("[");
        s.optional(|s| {
            s.rule(&VALUE).star(|s| {
                s.lit(",").rule(&VALUE);
            });
        });
        s.lit("]");
    });
});

/// JSON documents, keywords are lexed as identifiers.
pub fn json() -> Result<Grammar, GrammarError> {
    Grammar::builder(&VALUE)
        .tokens([
            TokenClass::string(),
            TokenClass::number(),
            TokenClass::id(),
            TokenClass::literals("PUNCT", ["{", "}", "[", "]", ",", ":"]),
            TokenClass::white(),
            TokenClass::newline(),
        ])
        .ignore(["WHITE", "NEWLINE"])
        .build()
}
