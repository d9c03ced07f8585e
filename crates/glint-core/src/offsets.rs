// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Line-ending normalization and original-offset recovery.
//!
//! Patterns are written against `\n` line endings, so the engine lexes a
//! normalized view of the text: every `\r\n` becomes `\n` (the position of
//! each dropped `\r` is recorded) and every lone `\r` becomes `\n` (same
//! length, nothing recorded). The [`LfAdjusted`] decorator sits between the
//! engine and the consumer and translates token bounds back to offsets in
//! the original text, re-slicing each token's value from it — so a token
//! covering a Windows line break really contains `"\r\n"` and the
//! concatenation of all token values reproduces the original text exactly.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::error;

use crate::error::{LexError, StateError};
use crate::iterator::{IterState, LfAdjustedState, TokenIterator};
use crate::span::{shift, Span};
use crate::token::Token;

/// Normalizes line endings, recording where `\r`s were dropped.
///
/// Returns the text to lex and the offset map. When the input contains no
/// `\r` the original is returned as-is (no copy).
pub(crate) fn ensure_lf(text: &Arc<str>) -> (Arc<str>, OffsetMap) {
    if !text.as_bytes().contains(&b'\r') {
        return (Arc::clone(text), OffsetMap::default());
    }

    let mut normalized = String::with_capacity(text.len());
    let mut drops = Vec::new();
    let bytes = text.as_bytes();
    for (i, c) in text.char_indices() {
        if c == '\r' {
            if bytes.get(i + 1) == Some(&b'\n') {
                drops.push(i);
            } else {
                normalized.push('\n');
            }
        } else {
            normalized.push(c);
        }
    }

    (Arc::from(normalized), OffsetMap { drops })
}

/// Positions in the original text at which a `\r` was dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct OffsetMap {
    drops: Vec<usize>,
}

impl OffsetMap {
    pub(crate) fn cursor(&self) -> OffsetCursor {
        OffsetCursor {
            offset: 0,
            drops: self.drops.iter().copied().collect(),
        }
    }
}

/// A consuming walk over the drop list.
///
/// Must be advanced once per token, in stream order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetCursor {
    offset: usize,
    drops: VecDeque<usize>,
}

impl OffsetCursor {
    /// Current position in the original text.
    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    /// Moves the cursor past a token of `len` normalized bytes, stepping
    /// over every dropped `\r` the widening span crosses.
    pub(crate) fn advance(&mut self, len: usize) {
        let mut new_offset = self.offset + len;
        while self.drops.front().is_some_and(|&d| d < new_offset) {
            self.drops.pop_front();
            new_offset += 1;
        }
        self.offset = new_offset;
    }

    /// Shifts the cursor and every remaining drop position by a prefix-edit
    /// delta.
    pub(crate) fn shift_by(&mut self, delta: isize) {
        self.offset = shift(self.offset, delta);
        for drop in &mut self.drops {
            *drop = shift(*drop, delta);
        }
    }
}

/// Decorator that reports token offsets against the original text.
#[derive(Debug)]
pub struct LfAdjusted<I> {
    inner: I,
    original: Arc<str>,
    cursor: OffsetCursor,
    failed: Option<Token>,
}

impl<I> LfAdjusted<I> {
    pub(crate) fn new(inner: I, original: Arc<str>, cursor: OffsetCursor) -> Self {
        Self {
            inner,
            original,
            cursor,
            failed: None,
        }
    }
}

impl<I: TokenIterator> TokenIterator for LfAdjusted<I> {
    fn next_token(&mut self) -> Token {
        if let Some(token) = &self.failed {
            return token.clone();
        }

        let mut token = self.inner.next_token();
        if token.is_terminal() {
            return token;
        }

        let start = self.cursor.offset();
        self.cursor.advance(token.len());
        let end = self.cursor.offset();

        match self.original.get(start..end) {
            Some(slice) => {
                token.span = Span::new(start, end);
                token.value = slice.into();
                token
            }
            None => {
                let err = LexError::OffsetOutOfRange {
                    start,
                    end,
                    len: self.original.len(),
                };
                error!(%err, "line-ending adjustment lost sync with the original text");
                let token = Token::error(start.min(self.original.len()));
                self.failed = Some(token.clone());
                token
            }
        }
    }

    fn state(&self) -> IterState {
        IterState::LfAdjusted(Box::new(LfAdjustedState {
            inner: self.inner.state(),
            cursor: self.cursor.clone(),
        }))
    }

    fn set_state(&mut self, state: IterState) -> Result<(), StateError> {
        let IterState::LfAdjusted(state) = state else {
            return Err(StateError::ShapeMismatch {
                expected: "line-ending adjuster state",
            });
        };
        self.inner.set_state(state.inner)?;
        self.cursor = state.cursor;
        self.failed = None;
        Ok(())
    }
}
