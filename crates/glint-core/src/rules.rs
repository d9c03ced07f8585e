// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The compiled, immutable rule graph.
//!
//! A [`RuleSet`] is built once from a language description and then shared
//! read-only (behind an `Arc`) by every engine — including sub-engines and
//! every iterator created from the same lexer. States are stored densely
//! and addressed by [`StateId`]; rules by [`RuleId`]. Ids are what engine
//! snapshots carry, which keeps snapshots cheap to clone and trivially
//! comparable.
//!
//! Include rules do not survive into a `RuleSet`: they are spliced out
//! during the build (see the builder in the `lexer` module), so a compiled
//! state is a flat ordered rule list.

use std::collections::HashMap;

use ecow::EcoString;
use regex::Regex;

use crate::token::TokenKind;

/// Index of a state within a [`RuleSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(pub(crate) u32);

/// Identity of a rule: its state and its position within that state.
///
/// Rule identity matters to engine snapshots (the rule whose groups are
/// being iterated) and is stable because the rule graph is immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleId {
    pub(crate) state: StateId,
    pub(crate) rule: u32,
}

/// One capture group of a match: offsets relative to the matched slice's
/// position in the engine's input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capture {
    pub(crate) start: usize,
    pub(crate) len: usize,
}

/// What to do with one capture group of a by-groups rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GroupAction {
    /// Emit a token of this class covering the group.
    Emit(TokenKind),
    /// Re-lex the group's text in this state with a sub-engine.
    UseSelf(StateId),
}

/// A compiled pattern→action rule.
///
/// `pattern: None` is the pure transition rule: it always fires with a
/// zero-length match. A present pattern must match non-empty text to fire.
#[derive(Debug, Clone)]
pub(crate) struct Rule {
    pub(crate) pattern: Option<Regex>,
    pub(crate) token: Option<TokenKind>,
    pub(crate) push: Option<StateId>,
    pub(crate) pop: usize,
    pub(crate) use_self: Option<StateId>,
    pub(crate) by_groups: Vec<GroupAction>,
}

impl Rule {
    /// Attempts an anchored match of this rule at the start of `haystack`.
    ///
    /// Returns the captures (group 0 first; unmatched groups as zero-length
    /// captures at offset 0) on success. A zero-length match from a present
    /// pattern does not count as success: the first *non-empty* match wins,
    /// which keeps always-empty patterns from stalling the engine.
    pub(crate) fn try_match(&self, haystack: &str) -> Option<Vec<Capture>> {
        let Some(pattern) = &self.pattern else {
            // Pure transition rule: fires unconditionally, consuming nothing.
            return Some(vec![Capture::default()]);
        };

        let caps = pattern.captures(haystack)?;
        let whole = caps.get(0)?;
        if whole.start() != 0 || whole.is_empty() {
            return None;
        }

        Some(
            (0..caps.len())
                .map(|i| {
                    caps.get(i).map_or_else(Capture::default, |m| Capture {
                        start: m.start(),
                        len: m.end() - m.start(),
                    })
                })
                .collect(),
        )
    }
}

/// A named, compiled state: an ordered rule sequence.
#[derive(Debug)]
pub(crate) struct State {
    pub(crate) name: EcoString,
    pub(crate) rules: Vec<Rule>,
}

impl State {
    /// Scans the rule sequence in order and returns the first rule that
    /// matches at the start of `haystack`, with its captures.
    pub(crate) fn first_match(&self, haystack: &str) -> Option<(u32, Vec<Capture>)> {
        self.rules.iter().enumerate().find_map(|(i, rule)| {
            rule.try_match(haystack)
                .map(|caps| (u32::try_from(i).unwrap_or(u32::MAX), caps))
        })
    }
}

/// The full compiled rule graph of one language.
#[derive(Debug)]
pub struct RuleSet {
    states: Vec<State>,
    by_name: HashMap<EcoString, StateId>,
    root: StateId,
}

impl RuleSet {
    pub(crate) fn new(states: Vec<State>, by_name: HashMap<EcoString, StateId>, root: StateId) -> Self {
        Self {
            states,
            by_name,
            root,
        }
    }

    /// The id of the `root` state.
    pub(crate) fn root(&self) -> StateId {
        self.root
    }

    /// Looks up a state id by name.
    pub(crate) fn id(&self, name: &str) -> Option<StateId> {
        self.by_name.get(name).copied()
    }

    /// Returns the state for an id.
    pub(crate) fn state(&self, id: StateId) -> &State {
        &self.states[id.0 as usize]
    }

    /// Returns the rule for an id.
    pub(crate) fn rule(&self, id: RuleId) -> &Rule {
        &self.state(id.state).rules[id.rule as usize]
    }
}
