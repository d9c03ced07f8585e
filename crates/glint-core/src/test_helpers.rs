// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for unit tests: an illustrative C-like language and
//! token-stream collection utilities.

use std::sync::Arc;

use crate::desc::{ConfigDesc, GroupActionDesc, LexerDesc, RuleDesc, StateDesc};
use crate::engine::EngineChain;
use crate::iterator::TokenIterator;
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// A small C-like language exercising every rule form: by-groups dispatch,
/// whole-match `using_self`, includes, push/pop string states.
pub(crate) fn c_like() -> LexerDesc {
    LexerDesc {
        config: ConfigDesc {
            name: "C-ish".into(),
            aliases: vec!["cish".into()],
            filenames: vec!["*.c".into(), "*.h".into()],
            mime_types: vec!["text/x-csrc".into()],
            ensure_nl: false,
            priority: 1.0,
        },
        states: vec![
            StateDesc {
                name: "root".into(),
                rules: vec![
                    RuleDesc::by_groups(
                        r#"(#include)([ \t]+)(<[^\n>]+>|"[^\n"]+")"#,
                        vec![
                            GroupActionDesc::Token("CommentPreproc".into()),
                            GroupActionDesc::Token("Text".into()),
                            GroupActionDesc::Token("CommentPreprocFile".into()),
                        ],
                    ),
                    RuleDesc::using_self(r"%[a-z]*%", "percent"),
                    RuleDesc::include("common"),
                    RuleDesc::emit_push("\"", "LiteralString", "string"),
                    RuleDesc::emit(r"[;{}()=+\-*/,]", "Punctuation"),
                ],
            },
            StateDesc {
                name: "common".into(),
                rules: vec![
                    RuleDesc::emit(r"\s+", "TextWhitespace"),
                    RuleDesc::emit(r"(?:int|char|void|return)\b", "KeywordType"),
                    RuleDesc::emit(r"[A-Za-z_][A-Za-z0-9_]*", "Name"),
                    RuleDesc::emit(r"\d+", "LiteralNumberInteger"),
                ],
            },
            StateDesc {
                name: "string".into(),
                rules: vec![
                    RuleDesc::emit(r#"[^"\\\n]+"#, "LiteralString"),
                    RuleDesc::emit(r"\\.", "LiteralStringEscape"),
                    RuleDesc::emit_pop("\"", "LiteralString", 1),
                ],
            },
            StateDesc {
                name: "percent".into(),
                rules: vec![
                    RuleDesc::emit("%", "Punctuation"),
                    RuleDesc::emit(r"[a-z]+", "NameVariable"),
                ],
            },
        ],
    }
}

pub(crate) fn c_like_lexer() -> Lexer {
    Lexer::build(c_like()).unwrap()
}

/// An engine-layer iterator over `text` (no LF adjustment, no coalescing).
pub(crate) fn engine_over(lexer: &Lexer, text: &str) -> EngineChain {
    EngineChain::new(Arc::clone(&lexer.rules), Arc::from(text))
}

/// Collects tokens up to and including EOF, continuing through any
/// error-recovery tokens along the way.
pub(crate) fn drain(it: &mut impl TokenIterator) -> Vec<Token> {
    let mut out = Vec::new();
    loop {
        let token = it.next_token();
        let eof = token.kind.is_eof();
        out.push(token);
        if eof {
            return out;
        }
    }
}

pub(crate) fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
    tokens.iter().map(|t| t.kind).collect()
}

pub(crate) fn values(tokens: &[Token]) -> Vec<String> {
    tokens.iter().map(|t| t.value.to_string()).collect()
}
