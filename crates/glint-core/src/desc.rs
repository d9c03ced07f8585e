// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The language description consumed at build time.
//!
//! A [`LexerDesc`] is the logical record a host hands to
//! [`Lexer::build`](crate::Lexer::build): a flat configuration block plus
//! named states, each holding
//! an ordered list of rules. Descriptions are plain serde data — hosts keep
//! them in whatever format they like (the tests use JSON); the only contract
//! that matters is that element order inside [`RuleDesc::by_groups`] is
//! declaration order, because group numbering corresponds to it.
//!
//! Token classes are referenced by their exact canonical name (see
//! [`TokenKind::from_name`](crate::TokenKind::from_name)); unknown names are
//! a build error, not a silent fallback.

use serde::{Deserialize, Serialize};

/// A complete language description: configuration plus rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexerDesc {
    /// Metadata about the language.
    pub config: ConfigDesc,
    /// The named states, in declaration order. A state named `root` must
    /// be present.
    pub states: Vec<StateDesc>,
}

/// Language metadata: naming, file matching, and lexing options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDesc {
    /// Canonical language name, e.g. `"C"`.
    pub name: String,
    /// Alternate names accepted by registry lookup, e.g. `["c"]`.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Filename globs this language claims, e.g. `["*.c", "*.h"]`.
    #[serde(default)]
    pub filenames: Vec<String>,
    /// MIME types this language claims.
    #[serde(default)]
    pub mime_types: Vec<String>,
    /// Advisory: hosts should ensure the text ends with a newline before
    /// lexing. The engine itself never modifies the input.
    #[serde(default)]
    pub ensure_nl: bool,
    /// Registry tie-breaking priority; higher wins. Values of zero or less
    /// are treated as the default.
    #[serde(default = "default_priority")]
    pub priority: f32,
}

fn default_priority() -> f32 {
    1.0
}

/// A named state: an ordered sequence of rules tried first-match-wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDesc {
    /// The state name, referenced by `push`, `include` and `using_self`.
    pub name: String,
    /// The rules, in match-priority order.
    pub rules: Vec<RuleDesc>,
}

/// One pattern→action rule.
///
/// Structural constraints (enforced at build time): at least one of
/// `pattern`, `push`, `pop`, `include` must be present; `push` and `pop`
/// are mutually exclusive; `token` is mutually exclusive with `include`
/// and `by_groups`; `include` is mutually exclusive with `by_groups`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleDesc {
    /// The regular expression, matched anchored at the current position.
    /// A rule without a pattern always fires with a zero-length match
    /// (a pure transition rule).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Token class name to emit for the whole match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// State to push after the match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push: Option<String>,
    /// Number of states to pop after the match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pop: Option<usize>,
    /// State whose rules are spliced in place of this rule at build time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
    /// State in which to re-lex the entire match text with a sub-lexer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub using_self: Option<String>,
    /// Per-capture-group actions, one per numbered group in declaration
    /// order (group 1 first; group 0 is never listed).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_groups: Vec<GroupActionDesc>,
}

impl RuleDesc {
    /// A rule that emits `token` for every match of `pattern`.
    #[must_use]
    pub fn emit(pattern: &str, token: &str) -> Self {
        Self {
            pattern: Some(pattern.into()),
            token: Some(token.into()),
            ..Self::default()
        }
    }

    /// A rule that emits `token` and pushes `state`.
    #[must_use]
    pub fn emit_push(pattern: &str, token: &str, state: &str) -> Self {
        Self {
            push: Some(state.into()),
            ..Self::emit(pattern, token)
        }
    }

    /// A rule that emits `token` and pops `depth` states.
    #[must_use]
    pub fn emit_pop(pattern: &str, token: &str, depth: usize) -> Self {
        Self {
            pop: Some(depth),
            ..Self::emit(pattern, token)
        }
    }

    /// A rule that splices in another state's rules.
    #[must_use]
    pub fn include(state: &str) -> Self {
        Self {
            include: Some(state.into()),
            ..Self::default()
        }
    }

    /// A rule that re-lexes its whole match in `state`.
    #[must_use]
    pub fn using_self(pattern: &str, state: &str) -> Self {
        Self {
            pattern: Some(pattern.into()),
            using_self: Some(state.into()),
            ..Self::default()
        }
    }

    /// A rule that dispatches each capture group to its own action.
    #[must_use]
    pub fn by_groups(pattern: &str, actions: impl Into<Vec<GroupActionDesc>>) -> Self {
        Self {
            pattern: Some(pattern.into()),
            by_groups: actions.into(),
            ..Self::default()
        }
    }
}

/// What to do with one capture group of a by-groups rule.
///
/// Declaration order is group order, so this is serialized as an ordered
/// list of externally tagged variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupActionDesc {
    /// Emit a token of the named class covering the group.
    Token(String),
    /// Re-lex the group's text in the named state with a sub-lexer.
    UsingSelf(String),
}
