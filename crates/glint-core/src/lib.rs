// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! A resumable, regex-based syntax highlighting lexer for text editors.
//!
//! Given a language description — named states, each an ordered list of
//! pattern→action rules — `glint-core` produces a lazy stream of classified
//! tokens covering every position of the input, and can snapshot and
//! restore its position so an editor only re-lexes from the point of an
//! edit.
//!
//! # Lexing
//!
//! ```
//! use glint_core::{Lexer, LexerDesc, ConfigDesc, StateDesc, RuleDesc, TokenKind};
//!
//! let desc = LexerDesc {
//!     config: ConfigDesc {
//!         name: "Words".into(),
//!         aliases: vec![],
//!         filenames: vec![],
//!         mime_types: vec![],
//!         ensure_nl: false,
//!         priority: 1.0,
//!     },
//!     states: vec![StateDesc {
//!         name: "root".into(),
//!         rules: vec![
//!             RuleDesc::emit(r"[a-z]+", "Name"),
//!             RuleDesc::emit(r"\s+", "TextWhitespace"),
//!         ],
//!     }],
//! };
//!
//! let lexer = Lexer::build(desc)?;
//! let mut tokens = lexer.tokenise("hello world");
//! use glint_core::TokenIterator;
//! let first = tokens.next_token();
//! assert_eq!(first.kind, TokenKind::Name);
//! assert_eq!(first.value, "hello");
//! # Ok::<(), glint_core::BuildError>(())
//! ```
//!
//! # The iterator chain
//!
//! [`Lexer::tokenise`] returns three stacked producers, pulled lazily:
//! the engine matches rules over a `\n`-normalized view of the text and
//! maintains the state stack (including recursive sub-lexers spawned by
//! `using_self` rules); the LF adjuster maps token offsets back onto the
//! original text so `\r\n` line endings survive round-tripping; the
//! coalescer merges adjacent tokens of the same class.
//!
//! # Resumability
//!
//! [`TokenIterator::state`] captures a deep snapshot of the whole chain —
//! engine stacks, in-flight group dispatch, live sub-lexers, offset cursor
//! and the coalescer's buffered token. [`TokenIterator::set_state`]
//! restores it, and [`IterState::add_to_index`] shifts a snapshot across a
//! prefix edit of the text.
//!
//! # Error handling
//!
//! Building a lexer validates the description and reports a [`BuildError`].
//! Lexing itself never fails: input no rule matches becomes a zero-length
//! [`TokenKind::Error`] token followed by automatic recovery, and internal
//! failures surface as a sticky Error token with the cause logged via
//! [`tracing`].

mod coalesce;
mod desc;
mod engine;
mod error;
mod iterator;
mod lexer;
mod offsets;
mod registry;
mod rules;
mod span;
mod token;

#[cfg(test)]
mod test_helpers;

pub use coalesce::Coalesced;
pub use desc::{ConfigDesc, GroupActionDesc, LexerDesc, RuleDesc, StateDesc};
pub use engine::{EngineChain, EngineState};
pub use error::{BuildError, LexError, RuleError, StateError};
pub use iterator::{CoalescedState, IterState, LfAdjustedState, TokenIterator};
pub use lexer::{Lexer, LexerConfig, Tokens};
pub use offsets::LfAdjusted;
pub use registry::LexerRegistry;
pub use span::Span;
pub use token::{Token, TokenKind};
