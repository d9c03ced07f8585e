// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Error types.
//!
//! Errors fall into three families with very different lifetimes:
//!
//! - [`BuildError`] is raised once, while compiling a language description,
//!   and aborts lexer construction.
//! - [`LexError`] is an internal mid-stream failure. It never crosses the
//!   public API as a `Result`; the iterator surfaces it as a sticky
//!   [`TokenKind::Error`](crate::TokenKind::Error) token and logs the cause.
//! - [`StateError`] rejects configuration misuse: restoring an iterator
//!   from a snapshot whose shape belongs to a different decorator chain.
//!
//! All of them integrate with [`miette`] for diagnostic reporting.

// Spurious warnings from miette derive macro expansion
#![allow(unused_assignments)]

use ecow::EcoString;
use miette::Diagnostic;
use thiserror::Error;

use crate::span::Span;

/// An error raised while building a lexer from a language description.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum BuildError {
    /// No state named `root` was defined.
    #[error("no 'root' state is defined")]
    #[diagnostic(help("every language description needs a state named 'root'"))]
    MissingRoot,

    /// Rules refer to states that do not exist.
    #[error("rules refer to undefined states: {}", join_names(.names))]
    UndefinedStates {
        /// The missing state names, in first-reference order.
        names: Vec<EcoString>,
    },

    /// A rule's regular expression failed to compile.
    #[error("state '{state}' rule {index}: invalid pattern: {message}")]
    InvalidPattern {
        /// The state containing the rule.
        state: EcoString,
        /// The rule's position within the state.
        index: usize,
        /// The regex engine's explanation.
        message: String,
    },

    /// A rule violates the structural constraints.
    #[error("state '{state}' rule {index}: {kind}")]
    InvalidRule {
        /// The state containing the rule.
        state: EcoString,
        /// The rule's position within the state.
        index: usize,
        /// Which constraint was violated.
        #[source]
        kind: RuleError,
    },

    /// Include expansion revisited a state it was already expanding.
    #[error("include cycle through state '{state}'")]
    IncludeCycle {
        /// A state on the cycle.
        state: EcoString,
    },
}

/// A structural problem with a single rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// The rule has no pattern, include, push or pop.
    #[error("rule has no pattern, include, push or pop")]
    Empty,

    /// The rule has both a push and a pop.
    #[error("rule contains both a push and a pop")]
    PushAndPop,

    /// The rule has both a token and an include.
    #[error("rule has both a token and an include")]
    TokenWithInclude,

    /// The rule has both a token and a by-groups list.
    #[error("rule has both a token and a by-groups list")]
    TokenWithByGroups,

    /// The rule has both an include and a by-groups list.
    #[error("rule has both an include and a by-groups list")]
    IncludeWithByGroups,

    /// A token class name is not part of the enumeration.
    #[error("unknown token class '{name}'")]
    UnknownTokenClass {
        /// The unrecognised name.
        name: EcoString,
    },
}

/// A mid-stream lexing failure.
///
/// These indicate internal inconsistency rather than bad input: bad input
/// is handled by error recovery and never produces a `LexError`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum LexError {
    /// The offset adjuster computed a position outside the original text.
    #[error("token span {start}..{end} lies outside the original text (length {len})")]
    OffsetOutOfRange {
        /// Computed token start.
        start: usize,
        /// Computed token end.
        end: usize,
        /// Length of the original text.
        len: usize,
    },

    /// The engine reached a stage/stack combination that cannot occur
    /// through the public API.
    #[error("corrupt engine state: {detail}")]
    CorruptState {
        /// What was inconsistent.
        detail: &'static str,
    },
}

impl LexError {
    /// Where the failure was detected, when that is meaningful.
    #[must_use]
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::OffsetOutOfRange { start, end, .. } => Some(Span::new(*start, *end)),
            Self::CorruptState { .. } => None,
        }
    }
}

/// Rejection of an iterator state snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum StateError {
    /// The snapshot was produced by a different decorator layer.
    #[error("state snapshot has the wrong shape: expected {expected}")]
    ShapeMismatch {
        /// The layer that rejected the snapshot.
        expected: &'static str,
    },

    /// The snapshot's engine chain was empty.
    #[error("state snapshot contains no engine states")]
    EmptyEngineChain,
}

fn join_names(names: &[EcoString]) -> String {
    names
        .iter()
        .map(EcoString::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_error_display() {
        assert_eq!(BuildError::MissingRoot.to_string(), "no 'root' state is defined");

        let err = BuildError::UndefinedStates {
            names: vec!["string".into(), "macro".into()],
        };
        assert_eq!(
            err.to_string(),
            "rules refer to undefined states: string, macro"
        );

        let err = BuildError::InvalidRule {
            state: "root".into(),
            index: 3,
            kind: RuleError::PushAndPop,
        };
        assert_eq!(
            err.to_string(),
            "state 'root' rule 3: rule contains both a push and a pop"
        );
    }

    #[test]
    fn lex_error_span() {
        let err = LexError::OffsetOutOfRange {
            start: 10,
            end: 14,
            len: 12,
        };
        assert_eq!(err.span(), Some(Span::new(10, 14)));
        assert_eq!(
            LexError::CorruptState { detail: "x" }.span(),
            None
        );
    }

    #[test]
    fn state_error_display() {
        let err = StateError::ShapeMismatch {
            expected: "coalescer state",
        };
        assert_eq!(
            err.to_string(),
            "state snapshot has the wrong shape: expected coalescer state"
        );
    }
}
