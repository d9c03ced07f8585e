// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Building lexers and handing out token iterators.
//!
//! A [`Lexer`] is the compiled, immutable form of a [`LexerDesc`]: its
//! configuration plus a shared [`RuleSet`]. Building validates the
//! description, compiles every pattern anchored and multi-line, and splices
//! include rules away; after that the lexer is cheap to share and
//! [`Lexer::tokenise`] can be called any number of times concurrently-ish
//! (each call owns its iterator, the rule graph is read-only).
//!
//! The iterator a host receives is the full decorator chain:
//!
//! ```text
//! Coalesced ── merges same-class runs
//!   └─ LfAdjusted ── maps offsets back onto the original text
//!        └─ EngineChain ── the state-stack engine over normalized text
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ecow::EcoString;
use regex::RegexBuilder;
use tracing::debug;

use crate::coalesce::Coalesced;
use crate::desc::{ConfigDesc, GroupActionDesc, LexerDesc, RuleDesc, StateDesc};
use crate::engine::EngineChain;
use crate::error::{BuildError, RuleError, StateError};
use crate::iterator::{IterState, TokenIterator};
use crate::offsets::{ensure_lf, LfAdjusted};
use crate::rules::{GroupAction, Rule, RuleSet, State, StateId};
use crate::token::TokenKind;

/// The full iterator chain returned by [`Lexer::tokenise`].
pub type Tokens = Coalesced<LfAdjusted<EngineChain>>;

/// Compiled language metadata.
#[derive(Debug, Clone)]
pub struct LexerConfig {
    name: EcoString,
    aliases: Vec<EcoString>,
    filenames: Vec<EcoString>,
    mime_types: Vec<EcoString>,
    ensure_nl: bool,
    priority: f32,
}

impl LexerConfig {
    fn from_desc(desc: &ConfigDesc) -> Self {
        Self {
            name: desc.name.as_str().into(),
            aliases: desc.aliases.iter().map(|a| a.as_str().into()).collect(),
            filenames: desc.filenames.iter().map(|f| f.as_str().into()).collect(),
            mime_types: desc.mime_types.iter().map(|m| m.as_str().into()).collect(),
            ensure_nl: desc.ensure_nl,
            priority: desc.priority,
        }
    }

    /// Canonical language name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alternate names accepted by registry lookup.
    #[must_use]
    pub fn aliases(&self) -> &[EcoString] {
        &self.aliases
    }

    /// Filename globs this language claims.
    #[must_use]
    pub fn filenames(&self) -> &[EcoString] {
        &self.filenames
    }

    /// MIME types this language claims.
    #[must_use]
    pub fn mime_types(&self) -> &[EcoString] {
        &self.mime_types
    }

    /// Whether hosts should ensure a trailing newline before lexing.
    #[must_use]
    pub fn ensure_nl(&self) -> bool {
        self.ensure_nl
    }

    /// Registry tie-breaking priority as declared.
    #[must_use]
    pub fn priority(&self) -> f32 {
        self.priority
    }

    /// Priority with the "zero or less means default" rule applied.
    pub(crate) fn effective_priority(&self) -> f32 {
        if self.priority <= 0.0 {
            1.0
        } else {
            self.priority
        }
    }
}

/// A compiled lexer for one language.
#[derive(Debug)]
pub struct Lexer {
    config: LexerConfig,
    pub(crate) rules: Arc<RuleSet>,
}

impl Lexer {
    /// Builds a lexer from a language description.
    pub fn build(desc: LexerDesc) -> Result<Self, BuildError> {
        let config = LexerConfig::from_desc(&desc.config);
        let rules = build_rule_set(&desc.states)?;
        debug!(lexer = %config.name(), "built lexer");
        Ok(Self {
            config,
            rules: Arc::new(rules),
        })
    }

    /// Returns the language metadata.
    #[must_use]
    pub fn config(&self) -> &LexerConfig {
        &self.config
    }

    /// Creates a token iterator over `text`, starting at the beginning.
    #[must_use]
    pub fn tokenise(&self, text: &str) -> Tokens {
        let original: Arc<str> = Arc::from(text);
        let (normalized, map) = ensure_lf(&original);
        let engine = EngineChain::new(Arc::clone(&self.rules), normalized);
        let adjusted = LfAdjusted::new(engine, Arc::clone(&original), map.cursor());
        Coalesced::new(adjusted, original)
    }

    /// Creates a token iterator over `text` resumed from a saved state.
    ///
    /// The state must come from an iterator of this lexer (or one built
    /// from the same description), over the same text — or over a revision
    /// of it whose differences lie entirely after the saved position, with
    /// prefix edits accounted for via [`IterState::add_to_index`].
    pub fn tokenise_at(&self, text: &str, state: IterState) -> Result<Tokens, StateError> {
        let mut tokens = self.tokenise(text);
        tokens.set_state(state)?;
        Ok(tokens)
    }
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

/// A compiled rule, or a reference to a state to splice in its place.
enum ProtoRule {
    Include(StateId),
    Rule(Rule),
}

fn build_rule_set(states: &[StateDesc]) -> Result<RuleSet, BuildError> {
    validate(states)?;

    // Dense ids in declaration order. On a duplicate name the later state
    // wins lookups, like a map rebuild would.
    let mut by_name: HashMap<EcoString, StateId> = HashMap::new();
    for (i, state) in states.iter().enumerate() {
        by_name.insert(state.name.as_str().into(), StateId(i as u32));
    }
    let root = resolve(&by_name, "root")?;

    let mut protos: Vec<(EcoString, Vec<ProtoRule>)> = Vec::with_capacity(states.len());
    for state in states {
        let mut rules = Vec::with_capacity(state.rules.len());
        for (index, rule) in state.rules.iter().enumerate() {
            rules.push(compile_rule(&state.name, index, rule, &by_name)?);
        }
        protos.push((state.name.as_str().into(), rules));
    }

    let compiled = splice_includes(protos)?;
    Ok(RuleSet::new(compiled, by_name, root))
}

fn validate(states: &[StateDesc]) -> Result<(), BuildError> {
    if !states.iter().any(|s| s.name == "root") {
        return Err(BuildError::MissingRoot);
    }

    let defined: HashSet<&str> = states.iter().map(|s| s.name.as_str()).collect();
    let mut missing: Vec<EcoString> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for state in states {
        for rule in &state.rules {
            let by_group_targets = rule.by_groups.iter().filter_map(|a| match a {
                GroupActionDesc::UsingSelf(s) => Some(s.as_str()),
                GroupActionDesc::Token(_) => None,
            });
            let targets = rule
                .push
                .as_deref()
                .into_iter()
                .chain(rule.include.as_deref())
                .chain(rule.using_self.as_deref())
                .chain(by_group_targets);
            for target in targets {
                if !defined.contains(target) && seen.insert(target) {
                    missing.push(target.into());
                }
            }
        }
    }
    if !missing.is_empty() {
        return Err(BuildError::UndefinedStates { names: missing });
    }

    for state in states {
        for (index, rule) in state.rules.iter().enumerate() {
            check_rule(rule).map_err(|kind| BuildError::InvalidRule {
                state: state.name.as_str().into(),
                index,
                kind,
            })?;
        }
    }
    Ok(())
}

fn check_rule(rule: &RuleDesc) -> Result<(), RuleError> {
    if rule.pattern.is_none()
        && rule.push.is_none()
        && rule.pop.is_none()
        && rule.include.is_none()
    {
        return Err(RuleError::Empty);
    }
    if rule.push.is_some() && rule.pop.is_some() {
        return Err(RuleError::PushAndPop);
    }
    if rule.token.is_some() {
        if rule.include.is_some() {
            return Err(RuleError::TokenWithInclude);
        }
        if !rule.by_groups.is_empty() {
            return Err(RuleError::TokenWithByGroups);
        }
    }
    if rule.include.is_some() && !rule.by_groups.is_empty() {
        return Err(RuleError::IncludeWithByGroups);
    }
    Ok(())
}

fn compile_rule(
    state_name: &str,
    index: usize,
    rule: &RuleDesc,
    by_name: &HashMap<EcoString, StateId>,
) -> Result<ProtoRule, BuildError> {
    if let Some(include) = &rule.include {
        return Ok(ProtoRule::Include(resolve(by_name, include)?));
    }

    let pattern = rule
        .pattern
        .as_deref()
        .map(|p| {
            // Anchor in a non-capturing group so alternations stay anchored
            // and numbered groups keep their positions.
            RegexBuilder::new(&format!(r"\A(?:{p})"))
                .multi_line(true)
                .build()
                .map_err(|err| BuildError::InvalidPattern {
                    state: state_name.into(),
                    index,
                    message: err.to_string(),
                })
        })
        .transpose()?;

    let token = rule
        .token
        .as_deref()
        .map(|name| {
            TokenKind::from_name(name).ok_or_else(|| BuildError::InvalidRule {
                state: state_name.into(),
                index,
                kind: RuleError::UnknownTokenClass { name: name.into() },
            })
        })
        .transpose()?;

    let mut by_groups = Vec::with_capacity(rule.by_groups.len());
    for action in &rule.by_groups {
        by_groups.push(match action {
            GroupActionDesc::Token(name) => GroupAction::Emit(
                TokenKind::from_name(name).ok_or_else(|| BuildError::InvalidRule {
                    state: state_name.into(),
                    index,
                    kind: RuleError::UnknownTokenClass { name: name.into() },
                })?,
            ),
            GroupActionDesc::UsingSelf(target) => {
                GroupAction::UseSelf(resolve(by_name, target)?)
            }
        });
    }

    Ok(ProtoRule::Rule(Rule {
        pattern,
        token,
        push: rule
            .push
            .as_deref()
            .map(|name| resolve(by_name, name))
            .transpose()?,
        pop: rule.pop.unwrap_or(0),
        use_self: rule
            .using_self
            .as_deref()
            .map(|name| resolve(by_name, name))
            .transpose()?,
        by_groups,
    }))
}

/// Name→id lookup. Validation has already run, so a miss here means the
/// validation pass and this pass disagree — report, don't panic.
fn resolve(by_name: &HashMap<EcoString, StateId>, name: &str) -> Result<StateId, BuildError> {
    by_name
        .get(name)
        .copied()
        .ok_or_else(|| BuildError::UndefinedStates {
            names: vec![name.into()],
        })
}

/// Expands every include rule into the referenced state's (expanded) rule
/// list, in place, depth-first. Revisiting a state mid-expansion is a cycle.
fn splice_includes(protos: Vec<(EcoString, Vec<ProtoRule>)>) -> Result<Vec<State>, BuildError> {
    let mut expanded: Vec<Option<Vec<Rule>>> = vec![None; protos.len()];
    let mut visiting = vec![false; protos.len()];
    for index in 0..protos.len() {
        expand_state(index, &protos, &mut expanded, &mut visiting)?;
    }

    Ok(protos
        .into_iter()
        .zip(expanded)
        .map(|((name, _), rules)| State {
            name,
            rules: rules.unwrap_or_default(),
        })
        .collect())
}

fn expand_state(
    index: usize,
    protos: &[(EcoString, Vec<ProtoRule>)],
    expanded: &mut Vec<Option<Vec<Rule>>>,
    visiting: &mut Vec<bool>,
) -> Result<Vec<Rule>, BuildError> {
    if visiting[index] {
        return Err(BuildError::IncludeCycle {
            state: protos[index].0.clone(),
        });
    }
    if let Some(done) = &expanded[index] {
        return Ok(done.clone());
    }

    visiting[index] = true;
    let mut rules = Vec::new();
    for proto in &protos[index].1 {
        match proto {
            ProtoRule::Include(state) => {
                rules.extend(expand_state(state.0 as usize, protos, expanded, visiting)?);
            }
            ProtoRule::Rule(rule) => rules.push(rule.clone()),
        }
    }
    visiting[index] = false;
    expanded[index] = Some(rules.clone());
    Ok(rules)
}
