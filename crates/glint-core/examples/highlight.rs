// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Minimal embedding example: build a toy language, lex a snippet, print
//! the classified tokens.
//!
//! Run with: `cargo run --example highlight`

use glint_core::{
    ConfigDesc, GroupActionDesc, Lexer, LexerDesc, RuleDesc, StateDesc, TokenIterator,
};

fn main() -> Result<(), glint_core::BuildError> {
    let desc = LexerDesc {
        config: ConfigDesc {
            name: "Mini-C".into(),
            aliases: vec!["mc".into()],
            filenames: vec!["*.mc".into()],
            mime_types: vec![],
            ensure_nl: false,
            priority: 1.0,
        },
        states: vec![
            StateDesc {
                name: "root".into(),
                rules: vec![
                    RuleDesc::by_groups(
                        r#"(#include)([ \t]+)(<[^\n>]+>)"#,
                        vec![
                            GroupActionDesc::Token("CommentPreproc".into()),
                            GroupActionDesc::Token("Text".into()),
                            GroupActionDesc::Token("CommentPreprocFile".into()),
                        ],
                    ),
                    RuleDesc::emit(r"\s+", "TextWhitespace"),
                    RuleDesc::emit(r"(?:int|char|return)\b", "KeywordType"),
                    RuleDesc::emit(r"[A-Za-z_][A-Za-z0-9_]*", "Name"),
                    RuleDesc::emit(r"\d+", "LiteralNumberInteger"),
                    RuleDesc::emit_push("\"", "LiteralString", "string"),
                    RuleDesc::emit(r"[;{}()=+\-*/,]", "Punctuation"),
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
        ],
    };

    let lexer = Lexer::build(desc)?;
    let source = "#include <stdio.h>\r\nint main() {\r\n  return 42;\r\n}\r\n";

    let mut tokens = lexer.tokenise(source);
    loop {
        let token = tokens.next_token();
        if token.is_terminal() {
            println!("{}", token.kind);
            break;
        }
        println!(
            "{:>4}..{:<4} {:20} {:?}",
            token.span.start(),
            token.span.end(),
            token.kind.name(),
            token.value.as_str()
        );
    }
    Ok(())
}
