// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The state-stack lexing engine.
//!
//! [`EngineChain`] drives a stack of engines over a single shared text.
//! Element 0 lexes the whole input; deeper elements are sub-engines lexing
//! a captured slice under a `using_self` rule. Only the innermost engine is
//! ever producing, so the chain is a stack, not a tree.
//!
//! Each engine is a three-stage machine:
//!
//! - **Ready**: match the top state's rules at the cursor and act on the
//!   first non-empty match.
//! - **InGroups**: hand out one token (or sub-engine) per capture group of
//!   a by-groups rule.
//! - **InSub**: a sub-engine one level deeper owns the cursor; forward its
//!   tokens until it reports EOF.
//!
//! Unmatched input produces a zero-length
//! [`TokenKind::Error`](crate::TokenKind::Error) token and
//! skips one character; if the skip lands the cursor on a newline the state
//! stack is cleared and lexing restarts from `root`. The idea is borrowed
//! from Pygments: it stops an unterminated construct from corrupting the
//! highlighting of every following line.

use std::ops::Range;
use std::sync::Arc;

use tracing::{error, trace};

use crate::error::{LexError, StateError};
use crate::iterator::{IterState, TokenIterator};
use crate::rules::{Capture, GroupAction, Rule, RuleId, RuleSet, StateId};
use crate::span::Span;
use crate::token::Token;

/// Which part of the match cycle an engine is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    /// Ready to match a rule at the cursor.
    Ready,
    /// Iterating the capture groups of `active_rule`.
    InGroups,
    /// A sub-engine one level deeper is producing.
    InSub,
}

/// The complete resumable state of one engine.
///
/// Everything an engine mutates lives here, so a deep clone of the chain's
/// `Vec<EngineState>` is a full snapshot. References into the immutable
/// rule graph are carried as ids.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
    /// The byte range of the shared text this engine lexes. `input.start`
    /// is also the absolute offset its tokens are reported against; the
    /// root engine's range spans the whole text.
    pub(crate) input: Range<usize>,
    /// Active states; the top is matched first.
    pub(crate) stack: Vec<StateId>,
    /// Cursor, relative to `input.start`.
    pub(crate) index: usize,
    pub(crate) stage: Stage,
    /// Captures of the match being dispatched (group 0 included). Empty in
    /// the Ready stage.
    pub(crate) captures: Vec<Capture>,
    /// Next by-groups entry to visit.
    pub(crate) group_index: usize,
    /// The rule whose groups are being iterated or whose sub-engine runs.
    pub(crate) active_rule: Option<RuleId>,
}

impl EngineState {
    fn root(len: usize) -> Self {
        Self {
            input: 0..len,
            stack: Vec::new(),
            index: 0,
            stage: Stage::Ready,
            captures: Vec::new(),
            group_index: 0,
            active_rule: None,
        }
    }

    fn sub(input: Range<usize>, state: StateId) -> Self {
        Self {
            input,
            stack: vec![state],
            index: 0,
            stage: Stage::Ready,
            captures: Vec::new(),
            group_index: 0,
            active_rule: None,
        }
    }

    fn len(&self) -> usize {
        self.input.end - self.input.start
    }
}

/// The engine layer of the iterator chain.
///
/// Reports token bounds in (normalized-)text byte offsets; the LF adjuster
/// upstream translates them to original-text offsets.
#[derive(Debug)]
pub struct EngineChain {
    rules: Arc<RuleSet>,
    text: Arc<str>,
    /// Innermost engine last. Never empty.
    engines: Vec<EngineState>,
    /// Set once a [`LexError`] surfaced; the chain then repeats this token.
    failed: Option<Token>,
}

impl EngineChain {
    pub(crate) fn new(rules: Arc<RuleSet>, text: Arc<str>) -> Self {
        let root = EngineState::root(text.len());
        Self {
            rules,
            text,
            engines: vec![root],
            failed: None,
        }
    }

    /// Absolute cursor position of the innermost engine.
    fn position(&self) -> usize {
        self.engines
            .last()
            .map_or(0, |e| e.input.start + e.index.min(e.len()))
    }

    /// Runs one step of the innermost engine. `Ok(None)` means the step
    /// made progress without producing a token.
    fn advance(&mut self) -> Result<Option<Token>, LexError> {
        let produced = self.step()?;
        match produced {
            Some(tok) if tok.kind.is_eof() && self.engines.len() > 1 => {
                // A sub-engine consumed its whole slice.
                trace!(depth = self.engines.len() - 1, "sub-engine completed");
                self.engines.pop();
                self.complete_sub()?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    fn step(&mut self) -> Result<Option<Token>, LexError> {
        let rules = Arc::clone(&self.rules);
        let text = Arc::clone(&self.text);

        let engine = self.innermost()?;
        if engine.stack.is_empty() {
            engine.stack.push(rules.root());
        }
        let stage = engine.stage;
        match stage {
            Stage::Ready => self.step_ready(&rules, &text),
            Stage::InGroups => self.step_groups(&rules, &text),
            Stage::InSub => Err(LexError::CorruptState {
                detail: "innermost engine is waiting on a sub-engine",
            }),
        }
    }

    fn step_ready(&mut self, rules: &RuleSet, text: &str) -> Result<Option<Token>, LexError> {
        let engine = self.innermost()?;
        if engine.index >= engine.len() {
            return Ok(Some(Token::eof(engine.input.end)));
        }

        let state_id = *engine.stack.last().ok_or(LexError::CorruptState {
            detail: "state stack is empty after root push",
        })?;
        let cursor = engine.input.start + engine.index;
        let haystack = &text[cursor..engine.input.end];
        let state = rules.state(state_id);

        let Some((rule_index, captures)) = state.first_match(haystack) else {
            // Nothing matched: emit a zero-length error and skip a character.
            let skipped = haystack.chars().next().map_or(1, char::len_utf8);
            engine.index += skipped;
            if engine.index < engine.len()
                && text.as_bytes()[engine.input.start + engine.index] == b'\n'
            {
                trace!(state = %state.name, "unmatched input before newline; resetting to root");
                engine.stack.clear();
                engine.stack.push(rules.root());
            }
            return Ok(Some(Token::error(cursor)));
        };

        let rule_id = RuleId {
            state: state_id,
            rule: rule_index,
        };
        let rule = &state.rules[rule_index as usize];
        let match_len = captures[0].len;

        if !rule.by_groups.is_empty() {
            engine.captures = captures;
            engine.group_index = 0;
            engine.active_rule = Some(rule_id);
            engine.stage = Stage::InGroups;
            return Ok(None);
        }

        if let Some(target) = rule.use_self {
            trace!(state = %state.name, rule = rule_index, "spawning whole-match sub-engine");
            engine.captures = captures;
            engine.active_rule = Some(rule_id);
            engine.stage = Stage::InSub;
            self.engines
                .push(EngineState::sub(cursor..cursor + match_len, target));
            return Ok(None);
        }

        let produced = rule.token.map(|kind| {
            Token::new(
                kind,
                &text[cursor..cursor + match_len],
                Span::new(cursor, cursor + match_len),
            )
        });
        engine.index += match_len;
        apply_transition(engine, rule);
        Ok(produced)
    }

    fn step_groups(&mut self, rules: &RuleSet, text: &str) -> Result<Option<Token>, LexError> {
        let engine = self.innermost()?;
        let rule_id = engine.active_rule.ok_or(LexError::CorruptState {
            detail: "group iteration without an active rule",
        })?;
        let rule = rules.rule(rule_id);
        let Some(action) = rule.by_groups.get(engine.group_index) else {
            return Err(LexError::CorruptState {
                detail: "group index past the by-groups list",
            });
        };

        // Group 0 is the whole match; by-groups entry i covers group i+1.
        // Unmatched and undeclared groups degrade to empty captures.
        let capture = engine
            .captures
            .get(engine.group_index + 1)
            .copied()
            .unwrap_or_default();
        let start = engine.input.start + engine.index + capture.start;

        match *action {
            GroupAction::UseSelf(target) => {
                trace!(group = engine.group_index, "spawning group sub-engine");
                engine.stage = Stage::InSub;
                self.engines
                    .push(EngineState::sub(start..start + capture.len, target));
                Ok(None)
            }
            GroupAction::Emit(kind) => {
                let end = start + capture.len;
                let token = Token::new(kind, &text[start..end], Span::new(start, end));
                engine.group_index += 1;
                if engine.group_index >= rule.by_groups.len() {
                    self.complete_groups(rules)?;
                }
                Ok(Some(token))
            }
        }
    }

    /// Handles the parent engine after its sub-engine reported EOF.
    fn complete_sub(&mut self) -> Result<(), LexError> {
        let rules = Arc::clone(&self.rules);
        let engine = self.innermost()?;
        if engine.stage != Stage::InSub {
            return Err(LexError::CorruptState {
                detail: "sub-engine completed while parent was not waiting",
            });
        }
        engine.stage = Stage::InGroups;
        engine.group_index += 1;

        let rule_id = engine.active_rule.ok_or(LexError::CorruptState {
            detail: "sub-engine completed without an active rule",
        })?;
        // A whole-match using_self has an empty by-groups list, so the
        // completion check below also finishes that case immediately.
        if engine.group_index >= rules.rule(rule_id).by_groups.len() {
            self.complete_groups(&rules)?;
        }
        Ok(())
    }

    /// Finishes a by-groups (or whole-match using_self) dispatch: stack
    /// transition first, then move past the full match.
    fn complete_groups(&mut self, rules: &RuleSet) -> Result<(), LexError> {
        let engine = self.innermost()?;
        let rule_id = engine.active_rule.ok_or(LexError::CorruptState {
            detail: "group completion without an active rule",
        })?;
        apply_transition(engine, rules.rule(rule_id));
        engine.stage = Stage::Ready;
        engine.index += engine.captures.first().map_or(0, |c| c.len);
        engine.captures.clear();
        engine.group_index = 0;
        engine.active_rule = None;
        Ok(())
    }

    fn innermost(&mut self) -> Result<&mut EngineState, LexError> {
        self.engines.last_mut().ok_or(LexError::CorruptState {
            detail: "engine chain is empty",
        })
    }
}

/// Applies a rule's stack transition. Pop underflow truncates to empty;
/// the next step re-pushes root.
fn apply_transition(engine: &mut EngineState, rule: &Rule) {
    if rule.pop > 0 {
        let keep = engine.stack.len().saturating_sub(rule.pop);
        engine.stack.truncate(keep);
    } else if let Some(state) = rule.push {
        engine.stack.push(state);
    }
}

impl TokenIterator for EngineChain {
    fn next_token(&mut self) -> Token {
        if let Some(token) = &self.failed {
            return token.clone();
        }
        loop {
            match self.advance() {
                Ok(Some(token)) => return token,
                Ok(None) => {}
                Err(err) => {
                    error!(%err, "lexing failed; discarding sub-engines");
                    let at = self.position();
                    self.engines.truncate(1);
                    let token = Token::error(at);
                    self.failed = Some(token.clone());
                    return token;
                }
            }
        }
    }

    fn state(&self) -> IterState {
        IterState::Engine(self.engines.clone())
    }

    fn set_state(&mut self, state: IterState) -> Result<(), StateError> {
        let IterState::Engine(engines) = state else {
            return Err(StateError::ShapeMismatch {
                expected: "engine state",
            });
        };
        if engines.is_empty() {
            return Err(StateError::EmptyEngineChain);
        }
        self.engines = engines;
        // The root engine always spans the current text; a saved state may
        // come from a differently sized revision of it.
        self.engines[0].input = 0..self.text.len();
        self.failed = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::{ConfigDesc, GroupActionDesc, LexerDesc, RuleDesc, StateDesc};
    use crate::lexer::Lexer;
    use crate::test_helpers::{c_like_lexer, drain, engine_over, kinds};
    use crate::token::TokenKind;

    fn lexer_with_root(states: Vec<StateDesc>) -> Lexer {
        Lexer::build(LexerDesc {
            config: ConfigDesc {
                name: "Test".into(),
                aliases: Vec::new(),
                filenames: Vec::new(),
                mime_types: Vec::new(),
                ensure_nl: false,
                priority: 1.0,
            },
            states,
        })
        .unwrap()
    }

    fn state(name: &str, rules: Vec<RuleDesc>) -> StateDesc {
        StateDesc {
            name: name.into(),
            rules,
        }
    }

    #[test]
    fn empty_input_yields_eof_immediately() {
        let lexer = c_like_lexer();
        let mut engine = engine_over(&lexer, "");
        assert!(engine.next_token().kind.is_eof());
        assert!(engine.next_token().kind.is_eof());
    }

    #[test]
    fn unmatched_input_emits_zero_length_error_and_skips() {
        // '@' is matched by no c-like rule.
        let lexer = c_like_lexer();
        let mut engine = engine_over(&lexer, "a@b");
        let toks = drain(&mut engine);
        assert_eq!(
            kinds(&toks),
            vec![
                TokenKind::Name,
                TokenKind::Error,
                TokenKind::Name,
                TokenKind::Eof,
            ]
        );
        assert_eq!(toks[1].span, Span::at(1));
        assert!(toks[1].is_empty());
        // Recovery continues: 'b' still lexes.
        assert_eq!(toks[2].value, "b");
    }

    #[test]
    fn error_before_newline_resets_stack_to_root() {
        // The string state cannot match the first newline; skipping it
        // lands on the second newline, which resets the stack, so the
        // remainder lexes as if fresh from root.
        let lexer = c_like_lexer();
        let text = "\"abc\n\nint y;";
        let toks = drain(&mut engine_over(&lexer, text));

        assert_eq!(
            kinds(&toks),
            vec![
                TokenKind::LiteralString,    // "
                TokenKind::LiteralString,    // abc
                TokenKind::Error,            // the unmatched newline
                TokenKind::TextWhitespace,   // the second newline, from root
                TokenKind::KeywordType,
                TokenKind::TextWhitespace,
                TokenKind::Name,
                TokenKind::Punctuation,
                TokenKind::Eof,
            ]
        );

        // The continuation matches a fresh root lex of the remainder.
        let fresh = drain(&mut engine_over(&lexer, &text[5..]));
        let continued: Vec<_> = toks[3..].iter().map(|t| (t.kind, t.value.clone())).collect();
        let fresh: Vec<_> = fresh.iter().map(|t| (t.kind, t.value.clone())).collect();
        assert_eq!(continued, fresh);
    }

    #[test]
    fn error_not_followed_by_newline_keeps_state() {
        // Skipping the unmatched newline lands on 'x', so the stack is not
        // reset and the next line still lexes as string content.
        let lexer = c_like_lexer();
        let toks = drain(&mut engine_over(&lexer, "\"abc\nx"));
        assert_eq!(
            kinds(&toks),
            vec![
                TokenKind::LiteralString,
                TokenKind::LiteralString,
                TokenKind::Error,
                TokenKind::LiteralString, // 'x', still inside the string state
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn pop_underflow_truncates_and_root_is_repushed() {
        let lexer = lexer_with_root(vec![state(
            "root",
            vec![
                RuleDesc::emit_pop("x", "Name", 5),
                RuleDesc::emit("y", "Text"),
            ],
        )]);
        let toks = drain(&mut engine_over(&lexer, "xy"));
        assert_eq!(
            kinds(&toks),
            vec![TokenKind::Name, TokenKind::Text, TokenKind::Eof]
        );
    }

    #[test]
    fn by_groups_with_use_self_group_reports_absolute_bounds() {
        let lexer = lexer_with_root(vec![
            state(
                "root",
                vec![
                    RuleDesc::by_groups(
                        r"(\d+)(=)([a-z]+)",
                        vec![
                            GroupActionDesc::Token("LiteralNumberInteger".into()),
                            GroupActionDesc::Token("Operator".into()),
                            GroupActionDesc::UsingSelf("letters".into()),
                        ],
                    ),
                    RuleDesc::emit(";", "Punctuation"),
                ],
            ),
            state("letters", vec![RuleDesc::emit("[a-z]+", "Name")]),
        ]);

        let toks = drain(&mut engine_over(&lexer, "12=abc;"));
        assert_eq!(
            toks[..4],
            [
                Token::new(TokenKind::LiteralNumberInteger, "12", Span::new(0, 2)),
                Token::new(TokenKind::Operator, "=", Span::new(2, 3)),
                Token::new(TokenKind::Name, "abc", Span::new(3, 6)),
                Token::new(TokenKind::Punctuation, ";", Span::new(6, 7)),
            ]
        );
    }

    #[test]
    fn unmatched_group_emits_empty_token() {
        let lexer = lexer_with_root(vec![state(
            "root",
            vec![RuleDesc::by_groups(
                "(a)(b)?(c)",
                vec![
                    GroupActionDesc::Token("Name".into()),
                    GroupActionDesc::Token("Operator".into()),
                    GroupActionDesc::Token("Keyword".into()),
                ],
            )],
        )]);

        let toks = drain(&mut engine_over(&lexer, "ac"));
        assert_eq!(
            toks[..3],
            [
                Token::new(TokenKind::Name, "a", Span::new(0, 1)),
                Token::new(TokenKind::Operator, "", Span::at(0)),
                Token::new(TokenKind::Keyword, "c", Span::new(1, 2)),
            ]
        );
    }

    #[test]
    fn use_self_over_empty_capture_completes_silently() {
        let lexer = lexer_with_root(vec![state(
            "root",
            vec![
                RuleDesc::by_groups(
                    "(x)(q?)",
                    vec![
                        GroupActionDesc::Token("Name".into()),
                        GroupActionDesc::UsingSelf("root".into()),
                    ],
                ),
                RuleDesc::emit(";", "Punctuation"),
            ],
        )]);

        let toks = drain(&mut engine_over(&lexer, "x;"));
        assert_eq!(
            kinds(&toks),
            vec![TokenKind::Name, TokenKind::Punctuation, TokenKind::Eof]
        );
    }

    #[test]
    fn token_less_rule_consumes_silently() {
        let lexer = lexer_with_root(vec![state(
            "root",
            vec![
                RuleDesc {
                    pattern: Some(r"//[^\n]*".into()),
                    ..RuleDesc::default()
                },
                RuleDesc::emit(r"\s+", "TextWhitespace"),
                RuleDesc::emit(r"[a-z]+", "Name"),
            ],
        )]);

        let toks = drain(&mut engine_over(&lexer, "//hi\nx"));
        assert_eq!(
            kinds(&toks),
            vec![TokenKind::TextWhitespace, TokenKind::Name, TokenKind::Eof]
        );
        assert_eq!(toks[1].span, Span::new(5, 6));
    }

    #[test]
    fn pattern_less_rule_is_a_pure_transition() {
        let lexer = lexer_with_root(vec![
            state(
                "root",
                vec![
                    RuleDesc::emit("a", "Name"),
                    RuleDesc {
                        push: Some("other".into()),
                        ..RuleDesc::default()
                    },
                ],
            ),
            state("other", vec![RuleDesc::emit("b", "Text")]),
        ]);

        let toks = drain(&mut engine_over(&lexer, "ab"));
        assert_eq!(
            kinds(&toks),
            vec![TokenKind::Name, TokenKind::Text, TokenKind::Eof]
        );
    }

    #[test]
    fn save_restore_mid_group_iteration() {
        let lexer = c_like_lexer();
        let mut engine = engine_over(&lexer, "#include <a.h>\n");
        let first = engine.next_token();
        assert_eq!(first.kind, TokenKind::CommentPreproc);

        let saved = engine.state();
        let rest_one = drain(&mut engine);
        engine.set_state(saved).unwrap();
        let rest_two = drain(&mut engine);
        assert_eq!(rest_one, rest_two);
        assert_eq!(rest_one[0].kind, TokenKind::Text);
    }

    #[test]
    fn save_restore_mid_sub_engine() {
        let lexer = c_like_lexer();
        let mut engine = engine_over(&lexer, "%abc% x");
        // First token comes from inside the sub-engine.
        let first = engine.next_token();
        assert_eq!(first, Token::new(TokenKind::Punctuation, "%", Span::new(0, 1)));

        let saved = engine.state();
        let IterState::Engine(states) = &saved else {
            panic!("engine snapshot expected");
        };
        assert_eq!(states.len(), 2, "sub-engine must be part of the snapshot");

        let rest_one = drain(&mut engine);
        engine.set_state(saved).unwrap();
        let rest_two = drain(&mut engine);
        assert_eq!(rest_one, rest_two);
    }

    #[test]
    fn snapshot_is_independent_of_later_iteration() {
        let lexer = c_like_lexer();
        let mut engine = engine_over(&lexer, "int x;");
        engine.next_token();
        let saved = engine.state();
        let again = engine.state();
        drain(&mut engine);
        // Advancing must not have mutated the snapshots.
        assert!(saved.state_equal(&again));
    }

    #[test]
    fn set_state_rejects_foreign_shapes() {
        let lexer = c_like_lexer();
        let mut engine = engine_over(&lexer, "int");
        let err = engine
            .set_state(IterState::Engine(Vec::new()))
            .unwrap_err();
        assert_eq!(err, StateError::EmptyEngineChain);
    }
}
