//! # Error Types
//!
//! Errors raised while building a parser and while parsing input.
//!
//! Building can fail with a [`BuildError`]: the grammar has an LR(1) conflict, a capture
//! is used inconsistently, or a precomputed table does not fit the language. Parsing
//! fails with a [`ParseFailure`], which is either a [`ParseError`] (no action for the
//! lookahead token) or a [`TokenizationError`] reported by the tokenizer.

use compact_str::CompactString;
use thiserror::Error;

use crate::grammar::Lookahead;
use crate::lexer::{SrcPosition, Token};

/// Errors that occur while turning a language into a parser
#[derive(Debug, Error)]
pub enum BuildError {
    /// Two different actions were required in the same state under the same symbol
    #[error(
        "Grammar conflict in state {state} under {symbol}: {existing} conflicts with {incoming}"
    )]
    Conflict {
        /// Index of the state in which the conflict was found
        state: usize,
        /// The symbol both actions are keyed on
        symbol: String,
        /// The action that was already present
        existing: String,
        /// The action that could not be added
        incoming: String,
    },

    /// An unnamed alternation, repetition or capture was reached twice
    #[error(
        "{combinator} is used in multiple places, but does not have a provided name (at {context})"
    )]
    UnnamedReuse {
        /// Which combinator was reused
        combinator: &'static str,
        /// Path of the second use
        context: String,
    },

    /// A field is captured both as an array and as a single value within one class
    #[error("Field \"{prop}\" of class \"{class}\" is captured both as an array and as a single value")]
    FieldMismatch {
        /// Class that owns the field
        class: CompactString,
        /// The conflicting field
        prop: CompactString,
    },

    /// Two reachable classes share a name
    #[error("Duplicate class name \"{name}\"; every class reachable from the root needs a unique name")]
    DuplicateClassName {
        /// The repeated name
        name: CompactString,
    },

    /// A hidden class whose `value` is an array was captured with a single-value capture
    #[error("A hidden array-capturing class must be captured using an array-capturing match. (class \"{class}\")")]
    HiddenArrayScalarCapture {
        /// The hidden class
        class: CompactString,
    },

    /// A deferred match was never patched with a target
    #[error("Match at {context} has no target; patch the deferred match before building")]
    UninitializedMatch {
        /// Where the match was found
        context: String,
    },

    /// A class was declared but never defined
    #[error("Class \"{name}\" was declared but never given a pattern")]
    UndefinedClass {
        /// The declared name
        name: CompactString,
    },

    /// The precomputed table could not be used
    #[error("Invalid precomputed table: {0}")]
    Table(#[from] TableError),
}

/// Errors concerning serialized parser tables
#[derive(Debug, Error)]
pub enum TableError {
    /// Saving is only possible for tables generated on the fly
    #[error("Cannot save the parser table because it was loaded from a precomputed table")]
    NotGenerated,

    /// A reduce descriptor names a class the language does not contain
    #[error("Unknown class \"{0}\" in serialized table")]
    UnknownClass(CompactString),

    /// The table has no states
    #[error("Serialized table has no states")]
    Empty,

    /// A shift transition targets a state that does not exist
    #[error("State {state} shifts to missing state {target}")]
    MissingState {
        /// Source state
        state: usize,
        /// Missing target
        target: usize,
    },

    /// A reduce transition names a rule without a reduce descriptor
    #[error("State {state} reduces by rule {rule}, which has no reduce descriptor")]
    MissingReduceInfo {
        /// Source state
        state: usize,
        /// Missing rule index
        rule: usize,
    },

    /// The `type` tag of a reduce descriptor is malformed
    #[error("Malformed capture type tag {0:?}")]
    MalformedType(Vec<CompactString>),

    /// JSON encoding or decoding failed
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Reading or writing a table file failed
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The parse table has no action for the current lookahead
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Parse error at {token}, expected one of: {}", format_expected(.expected))]
pub struct ParseError {
    /// The lookahead token that could not be handled
    pub token: Token,
    /// Every terminal the state would have accepted
    pub expected: Vec<Lookahead>,
}

impl ParseError {
    /// Create a new parse error
    #[must_use]
    pub const fn new(token: Token, expected: Vec<Lookahead>) -> Self {
        Self { token, expected }
    }
}

fn format_expected(expected: &[Lookahead]) -> String {
    if expected.is_empty() {
        return "nothing".to_string();
    }
    expected
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// The tokenizer could not produce a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Tokenization error at {at}")]
pub struct TokenizationError {
    /// Position of the offending input
    pub at: SrcPosition,
}

impl TokenizationError {
    /// Create a tokenization error at a position
    #[must_use]
    pub const fn new(at: SrcPosition) -> Self {
        Self { at }
    }
}

/// Why a call to [`Parser::parse`](crate::parser::Parser::parse) failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    /// No action for a lookahead token
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The tokenizer rejected the input
    #[error(transparent)]
    Tokenize(#[from] TokenizationError),

    /// The table is missing a goto entry that a valid table always has
    #[error("Parser table has no entry for {symbol} in state {state}")]
    InvalidTable {
        /// State that lacked the entry
        state: usize,
        /// Symbol that was looked up
        symbol: String,
    },
}

impl ParseFailure {
    /// The parse error, if this failure is one
    #[must_use]
    pub const fn as_parse_error(&self) -> Option<&ParseError> {
        match self {
            Self::Parse(error) => Some(error),
            _ => None,
        }
    }

    /// The tokenization error, if this failure is one
    #[must_use]
    pub const fn as_tokenization_error(&self) -> Option<&TokenizationError> {
        match self {
            Self::Tokenize(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_lists_expected_lookaheads() {
        let token = Token::new("b", SrcPosition::new(0, 1, 1), SrcPosition::new(0, 2, 2));
        let error = ParseError::new(token, vec![Lookahead::terminal("a"), Lookahead::End]);
        assert_eq!(
            error.to_string(),
            "Parse error at \"b\" at 0:1, expected one of: \"a\", (end of input)"
        );
    }

    #[test]
    fn test_hidden_array_message_prefix() {
        let error = BuildError::HiddenArrayScalarCapture {
            class: "Values".into(),
        };
        assert!(error
            .to_string()
            .starts_with("A hidden array-capturing class must be captured using an array-capturing match."));
    }

    #[test]
    fn test_failure_accessors() {
        let failure = ParseFailure::from(TokenizationError::new(SrcPosition::new(1, 2, 5)));
        assert!(failure.as_parse_error().is_none());
        assert_eq!(
            failure.as_tokenization_error().map(|error| error.at.offset),
            Some(5)
        );
    }
}
