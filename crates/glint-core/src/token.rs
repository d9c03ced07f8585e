// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Tokens produced during lexing.
//!
//! A [`Token`] pairs a [`TokenKind`] — the highlight class — with the
//! matched text and its [`Span`] in the input. Token kinds form a closed,
//! Pygments-compatible enumeration grouped into numeric ranges: categories
//! occupy blocks of 1000 and sub-categories blocks of 100, so that a theme
//! lacking a style for `LiteralStringEscape` can fall back to
//! `LiteralString`, then `Literal`.
//!
//! Two kinds are terminal signals rather than highlight classes:
//! [`TokenKind::Eof`] marks the end of iteration and [`TokenKind::Error`]
//! marks input that could not be tokenised (or an unrecoverable internal
//! failure). Neither carries meaningful content.

use ecow::EcoString;

use crate::span::Span;

macro_rules! token_kinds {
    ($($(#[$meta:meta])* $name:ident = $value:expr,)+) => {
        /// The highlight class of a token.
        ///
        /// Discriminants follow the Pygments numbering scheme so that
        /// [`TokenKind::category`] and [`TokenKind::sub_category`] are pure
        /// arithmetic.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(i32)]
        pub enum TokenKind {
            $($(#[$meta])* $name = $value,)+
        }

        impl TokenKind {
            /// Every token kind, in declaration order.
            pub const ALL: &'static [TokenKind] = &[$(TokenKind::$name,)+];

            /// Returns the canonical name of this kind, as used in language
            /// descriptions.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$name => stringify!($name),)+
                }
            }

            /// Looks a kind up by its exact canonical name.
            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $(stringify!($name) => Some(Self::$name),)+
                    _ => None,
                }
            }

            /// Looks a kind up by its numeric value.
            #[must_use]
            pub fn from_value(value: i32) -> Option<Self> {
                Self::ALL.iter().copied().find(|k| *k as i32 == value)
            }
        }
    };
}

token_kinds! {
    /// No highlighting.
    None = -3,
    /// Tokens a delegating host lexer handles itself.
    Other = -2,
    /// Input that could not be tokenised.
    Error = -1,
    /// End-of-iteration marker.
    Eof = 0,

    Keyword = 1000,
    KeywordConstant = 1001,
    KeywordDeclaration = 1002,
    KeywordNamespace = 1003,
    KeywordPseudo = 1004,
    KeywordReserved = 1005,
    KeywordType = 1006,

    Name = 2000,
    NameAttribute = 2001,
    NameBuiltin = 2002,
    NameBuiltinPseudo = 2003,
    NameClass = 2004,
    NameConstant = 2005,
    NameDecorator = 2006,
    NameEntity = 2007,
    NameException = 2008,
    NameFunction = 2009,
    NameFunctionMagic = 2010,
    NameKeyword = 2011,
    NameLabel = 2012,
    NameNamespace = 2013,
    NameOperator = 2014,
    NameOther = 2015,
    NamePseudo = 2016,
    NameProperty = 2017,
    NameTag = 2018,
    NameVariable = 2019,
    NameVariableAnonymous = 2020,
    NameVariableClass = 2021,
    NameVariableGlobal = 2022,
    NameVariableInstance = 2023,
    NameVariableMagic = 2024,

    Literal = 3000,
    LiteralDate = 3001,
    LiteralOther = 3002,

    LiteralString = 3100,
    LiteralStringAffix = 3101,
    LiteralStringAtom = 3102,
    LiteralStringBacktick = 3103,
    LiteralStringBoolean = 3104,
    LiteralStringChar = 3105,
    LiteralStringDelimiter = 3106,
    LiteralStringDoc = 3107,
    LiteralStringDouble = 3108,
    LiteralStringEscape = 3109,
    LiteralStringHeredoc = 3110,
    LiteralStringInterpol = 3111,
    LiteralStringName = 3112,
    LiteralStringOther = 3113,
    LiteralStringRegex = 3114,
    LiteralStringSingle = 3115,
    LiteralStringSymbol = 3116,

    LiteralNumber = 3200,
    LiteralNumberBin = 3201,
    LiteralNumberFloat = 3202,
    LiteralNumberHex = 3203,
    LiteralNumberInteger = 3204,
    LiteralNumberIntegerLong = 3205,
    LiteralNumberOct = 3206,

    Operator = 4000,
    OperatorWord = 4001,

    Punctuation = 5000,

    Comment = 6000,
    CommentHashbang = 6001,
    CommentMultiline = 6002,
    CommentSingle = 6003,
    CommentSpecial = 6004,

    CommentPreproc = 6100,
    CommentPreprocFile = 6101,

    Generic = 7000,
    GenericDeleted = 7001,
    GenericEmph = 7002,
    GenericError = 7003,
    GenericHeading = 7004,
    GenericInserted = 7005,
    GenericOutput = 7006,
    GenericPrompt = 7007,
    GenericStrong = 7008,
    GenericSubheading = 7009,
    GenericTraceback = 7010,
    GenericUnderline = 7011,

    Text = 8000,
    TextWhitespace = 8001,
    TextSymbol = 8002,
    TextPunctuation = 8003,
}

impl TokenKind {
    /// Returns the numeric value of this kind.
    #[must_use]
    pub const fn value(self) -> i32 {
        self as i32
    }

    /// Returns the nearest enclosing kind: the sub-category for a leaf, the
    /// category for a sub-category, and [`TokenKind::Eof`] at the top.
    #[must_use]
    pub fn parent(self) -> Self {
        let v = self.value();
        let parent = if v % 100 != 0 {
            v / 100 * 100
        } else if v % 1000 != 0 {
            v / 1000 * 1000
        } else {
            0
        };
        Self::from_value(parent).unwrap_or(Self::Eof)
    }

    /// Returns the category this kind belongs to (blocks of 1000).
    #[must_use]
    pub fn category(self) -> Self {
        Self::from_value(self.value() / 1000 * 1000).unwrap_or(Self::Eof)
    }

    /// Returns the sub-category this kind belongs to (blocks of 100).
    #[must_use]
    pub fn sub_category(self) -> Self {
        Self::from_value(self.value() / 100 * 100).unwrap_or(Self::Eof)
    }

    /// Returns true if both kinds share a category.
    #[must_use]
    pub const fn in_category(self, other: Self) -> bool {
        self.value() / 1000 == other.value() / 1000
    }

    /// Returns true if both kinds share a sub-category.
    #[must_use]
    pub const fn in_sub_category(self, other: Self) -> bool {
        self.value() / 100 == other.value() / 100
    }

    /// Returns true if this is the end-of-iteration marker.
    #[must_use]
    pub const fn is_eof(self) -> bool {
        matches!(self, Self::Eof)
    }

    /// Returns true if this is the error marker.
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Error)
    }

    /// Returns true if this kind ends iteration (EOF or Error).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Eof | Self::Error)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single classified token.
///
/// `value` always equals the text covered by `span` — for tokens that have
/// passed through the LF adjuster this is a slice of the *original* text,
/// carriage returns included.
///
/// Tokens are cheap to clone: [`EcoString`] stores short values inline and
/// shares longer ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The highlight class.
    pub kind: TokenKind,
    /// The matched text.
    pub value: EcoString,
    /// Where the token lies in the input.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub fn new(kind: TokenKind, value: impl Into<EcoString>, span: Span) -> Self {
        Self {
            kind,
            value: value.into(),
            span,
        }
    }

    /// Creates an EOF marker at the given offset.
    #[must_use]
    pub fn eof(offset: usize) -> Self {
        Self::new(TokenKind::Eof, "", Span::at(offset))
    }

    /// Creates a zero-length error marker at the given offset.
    #[must_use]
    pub fn error(offset: usize) -> Self {
        Self::new(TokenKind::Error, "", Span::at(offset))
    }

    /// Returns the length of the token in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.span.len()
    }

    /// Returns true if the token covers no text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }

    /// Returns true if this token ends iteration.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {:?} at {}..{}",
            self.kind,
            self.value.as_str(),
            self.span.start(),
            self.span.end()
        )
    }
}
