// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Merging of adjacent same-class tokens.
//!
//! Rule sets often emit several consecutive tokens of one class — a string
//! state produces separate content and escape-adjacent fragments, recovery
//! splits runs, and so on. [`Coalesced`] is the outermost decorator: it
//! buffers one token and folds every directly following token of the same
//! kind into it, so consumers see one token per maximal same-class run.
//!
//! Terminals are sticky: once an EOF or Error token has been buffered the
//! iterator returns it forever.

use std::sync::Arc;

use crate::error::StateError;
use crate::iterator::{CoalescedState, IterState, TokenIterator};
use crate::span::Span;
use crate::token::Token;

/// Decorator that merges consecutive tokens of identical kind.
#[derive(Debug)]
pub struct Coalesced<I> {
    inner: I,
    /// The text token spans index into; merged values are re-sliced from it.
    text: Arc<str>,
    pending: Option<Token>,
}

impl<I> Coalesced<I> {
    pub(crate) fn new(inner: I, text: Arc<str>) -> Self {
        Self {
            inner,
            text,
            pending: None,
        }
    }
}

impl<I: TokenIterator> TokenIterator for Coalesced<I> {
    fn next_token(&mut self) -> Token {
        if let Some(buffered) = &self.pending {
            if buffered.is_terminal() {
                return buffered.clone();
            }
        }

        loop {
            let token = self.inner.next_token();
            match &mut self.pending {
                None => {
                    let terminal = token.is_terminal();
                    self.pending = Some(token.clone());
                    if terminal {
                        return token;
                    }
                }
                Some(buffered) if buffered.kind == token.kind => {
                    buffered.span = Span::new(buffered.span.start(), token.span.end());
                    buffered.value = self.text[buffered.span.as_range()].into();
                }
                Some(buffered) => {
                    // Kind changed: hand out the finished run and start
                    // accumulating on top of the new token.
                    return std::mem::replace(buffered, token);
                }
            }
        }
    }

    fn state(&self) -> IterState {
        IterState::Coalesced(Box::new(CoalescedState {
            inner: self.inner.state(),
            pending: self.pending.clone(),
        }))
    }

    fn set_state(&mut self, state: IterState) -> Result<(), StateError> {
        let IterState::Coalesced(state) = state else {
            return Err(StateError::ShapeMismatch {
                expected: "coalescer state",
            });
        };
        self.inner.set_state(state.inner)?;
        self.pending = state.pending;
        Ok(())
    }
}
