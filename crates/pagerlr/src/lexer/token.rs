use std::fmt;
use std::hash::{Hash, Hasher};

use compact_str::CompactString;

use crate::grammar::{Lookahead, Terminal};

/// A position in the source text.
///
/// Lines and columns are zero-based; columns count characters, the offset counts
/// bytes so it can slice the source directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SrcPosition {
    /// Zero-based line
    pub line: u32,
    /// Zero-based column, in characters
    pub column: u32,
    /// Byte offset from the start of the input
    pub offset: usize,
}

impl SrcPosition {
    /// Create a position
    #[must_use]
    pub const fn new(line: u32, column: u32, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// The position after `c`, assuming `c` does not end the line
    #[must_use]
    pub const fn after(self, c: char) -> Self {
        Self::new(self.line, self.column + 1, self.offset + c.len_utf8())
    }
}

impl fmt::Display for SrcPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The decoded value of a literal or identifier token.
///
/// Keywords, operators and single characters carry [`TokenValue::None`].
#[derive(Debug, Clone, Default)]
pub enum TokenValue {
    /// No decoded value
    #[default]
    None,
    /// The name of an identifier
    Identifier(CompactString),
    /// A numeric literal
    Number(f64),
    /// A string literal with its escapes resolved
    Text(CompactString),
}

impl TokenValue {
    /// The identifier name or decoded string, if any
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Identifier(text) | Self::Text(text) => Some(text),
            Self::None | Self::Number(_) => None,
        }
    }

    /// The number, if this is one
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            _ => None,
        }
    }
}

// Numbers compare bitwise so tokens stay `Eq` and `Hash`.
impl PartialEq for TokenValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Identifier(a), Self::Identifier(b)) | (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for TokenValue {}

impl Hash for TokenValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::None => {}
            Self::Identifier(text) | Self::Text(text) => text.hash(state),
            Self::Number(number) => number.to_bits().hash(state),
        }
    }
}

/// A token produced by a [`Tokenizer`](crate::lexer::Tokenizer).
///
/// A token without a kind marks the end of input.
///
/// # Example
///
/// ```rust,no_run
/// use pagerlr::lexer::{SrcPosition, Token};
///
/// let source = "let x";
/// let token = Token::new("let", SrcPosition::new(0, 0, 0), SrcPosition::new(0, 3, 3));
/// assert_eq!(token.text(source), "let");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    /// The terminal this token is matched against, `None` for the end of input
    pub kind: Option<Terminal>,
    /// Position of the first character
    pub start: SrcPosition,
    /// Position just past the last character
    pub end: SrcPosition,
    /// Decoded value, for tokenizers that produce one
    pub value: TokenValue,
}

impl Token {
    /// Create a token of the given kind
    #[must_use]
    pub fn new(kind: impl Into<CompactString>, start: SrcPosition, end: SrcPosition) -> Self {
        Self {
            kind: Some(kind.into()),
            start,
            end,
            value: TokenValue::None,
        }
    }

    /// Attach a decoded value
    #[must_use]
    pub fn with_value(mut self, value: TokenValue) -> Self {
        self.value = value;
        self
    }

    /// Create the end-of-input token
    #[must_use]
    pub const fn end_of_input(at: SrcPosition) -> Self {
        Self {
            kind: None,
            start: at,
            end: at,
            value: TokenValue::None,
        }
    }

    /// Whether this token marks the end of input
    #[must_use]
    pub const fn is_end(&self) -> bool {
        self.kind.is_none()
    }

    /// The token kind as a string slice
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// The lookahead symbol this token is matched as
    #[must_use]
    pub fn lookahead(&self) -> Lookahead {
        self.kind
            .as_ref()
            .map_or(Lookahead::End, |kind| Lookahead::Terminal(kind.clone()))
    }

    /// The slice of `source` this token covers
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start.offset..self.end.offset).unwrap_or("")
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.lookahead(), self.start)
    }
}
