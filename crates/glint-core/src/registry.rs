// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! A collection of built lexers with name, filename and MIME lookup.
//!
//! Hosts typically build every language they ship once at startup and ask
//! the registry for the right lexer per buffer. When more than one language
//! claims a name or file, the highest configured priority wins; the default
//! priority is 1 and non-positive values are treated as the default, so a
//! language only loses ties it explicitly opted out of.

use std::path::Path;
use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::warn;

use crate::lexer::Lexer;

/// A registry of lexers.
#[derive(Debug, Default)]
pub struct LexerRegistry {
    entries: Vec<Entry>,
}

#[derive(Debug)]
struct Entry {
    lexer: Arc<Lexer>,
    globs: GlobSet,
}

impl LexerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a lexer and returns the shared handle it is stored under.
    ///
    /// Invalid filename globs in the lexer's configuration are skipped with
    /// a warning; they only affect [`LexerRegistry::match_filename`].
    pub fn register(&mut self, lexer: Lexer) -> Arc<Lexer> {
        let mut builder = GlobSetBuilder::new();
        for pattern in lexer.config().filenames() {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(err) => {
                    warn!(lexer = %lexer.config().name(), %pattern, %err,
                        "skipping invalid filename glob");
                }
            }
        }
        let globs = builder.build().unwrap_or_else(|err| {
            warn!(lexer = %lexer.config().name(), %err, "filename matching disabled");
            GlobSet::empty()
        });

        let lexer = Arc::new(lexer);
        self.entries.push(Entry {
            lexer: Arc::clone(&lexer),
            globs,
        });
        lexer
    }

    /// Returns the names of all registered lexers, sorted; with
    /// `with_aliases` the aliases are interleaved into the listing.
    #[must_use]
    pub fn names(&self, with_aliases: bool) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for entry in &self.entries {
            names.push(entry.lexer.config().name().to_owned());
            if with_aliases {
                names.extend(entry.lexer.config().aliases().iter().map(ToString::to_string));
            }
        }
        names.sort();
        names.dedup();
        names
    }

    /// Finds a lexer by name or alias.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Lexer>> {
        self.best(|lexer| {
            lexer.config().name() == name
                || lexer.config().aliases().iter().any(|a| a == name)
        })
    }

    /// Finds a lexer whose filename globs match the file's base name.
    #[must_use]
    pub fn match_filename(&self, filename: &str) -> Option<Arc<Lexer>> {
        let basename = Path::new(filename)
            .file_name()
            .map_or(filename, |n| n.to_str().unwrap_or(filename));
        let mut best: Option<&Entry> = None;
        for entry in &self.entries {
            if entry.globs.is_match(basename) && better(best, entry) {
                best = Some(entry);
            }
        }
        best.map(|e| Arc::clone(&e.lexer))
    }

    /// Finds a lexer claiming the given MIME type.
    #[must_use]
    pub fn match_mime_type(&self, mime_type: &str) -> Option<Arc<Lexer>> {
        self.best(|lexer| lexer.config().mime_types().iter().any(|m| m == mime_type))
    }

    fn best(&self, matches: impl Fn(&Lexer) -> bool) -> Option<Arc<Lexer>> {
        let mut best: Option<&Entry> = None;
        for entry in &self.entries {
            if matches(&entry.lexer) && better(best, entry) {
                best = Some(entry);
            }
        }
        best.map(|e| Arc::clone(&e.lexer))
    }
}

/// Strictly-higher priority wins; earlier registration wins ties.
fn better(current: Option<&Entry>, candidate: &Entry) -> bool {
    current.is_none_or(|c| {
        candidate.lexer.config().effective_priority() > c.lexer.config().effective_priority()
    })
}
