//! # Lexer Module
//!
//! Tokenizers turning source text into the token stream the parser consumes.
//!
//! ## Overview
//!
//! A [`Tokenizer`] yields [`Token`]s whose kind is the terminal string the grammar
//! matches against. The stream may end with an explicit end-of-input token; if it
//! does not, the parser synthesizes one at the end of the last token.
//!
//! Three tokenizers are provided:
//!
//! - [`CharTokenizer`]: every character is its own token (the default)
//! - [`WordTokenizer`]: runs of letters become one token, whitespace is skipped,
//!   configurable operators are matched longest-first
//! - [`KeywordTokenizer`]: keywords, identifiers, numbers, string literals and comments
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pagerlr::lexer::{Tokenizer, WordTokenizer};
//!
//! let tokenizer = WordTokenizer::new().with_operator(":=");
//! let kinds: Vec<_> = tokenizer
//!     .tokenize("let x := y")
//!     .filter_map(Result::ok)
//!     .map(|token| token.kind)
//!     .collect();
//! assert_eq!(kinds.len(), 5);
//! ```

mod cursor;
pub mod keyword;
pub mod token;

pub use keyword::KeywordTokenizer;
pub use token::*;

use compact_str::CompactString;

use crate::error::TokenizationError;
use cursor::Cursor;

/// A lazily produced sequence of tokens
pub type TokenStream<'a> = Box<dyn Iterator<Item = Result<Token, TokenizationError>> + 'a>;

/// Splits input text into tokens.
///
/// Implementations are shared between threads by [`Parser`](crate::parser::Parser),
/// so they must be `Send + Sync`.
pub trait Tokenizer: Send + Sync {
    /// Tokenize `input`
    fn tokenize<'a>(&self, input: &'a str) -> TokenStream<'a>;
}

/// Emits every character of the input as its own token.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharTokenizer;

impl Tokenizer for CharTokenizer {
    fn tokenize<'a>(&self, input: &'a str) -> TokenStream<'a> {
        Box::new(CharTokens {
            cursor: Cursor::new(input),
            finished: false,
        })
    }
}

struct CharTokens<'a> {
    cursor: Cursor<'a>,
    finished: bool,
}

impl Iterator for CharTokens<'_> {
    type Item = Result<Token, TokenizationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let start = self.cursor.position();
        if let Some(c) = self.cursor.bump() {
            let mut buf = [0; 4];
            return Some(Ok(Token::new(
                CompactString::new(c.encode_utf8(&mut buf)),
                start,
                start.after(c),
            )));
        }
        self.finished = true;
        Some(Ok(Token::end_of_input(start)))
    }
}

/// Groups runs of ASCII letters into word tokens.
///
/// Whitespace is skipped. Registered operators are matched longest-first; every
/// other character becomes a single-character token.
#[derive(Debug, Clone, Default)]
pub struct WordTokenizer {
    operators: Vec<CompactString>,
}

impl WordTokenizer {
    /// Create a tokenizer with no operators
    #[must_use]
    pub const fn new() -> Self {
        Self {
            operators: Vec::new(),
        }
    }

    /// Register a multi-character operator
    #[must_use]
    pub fn with_operator(mut self, operator: impl Into<CompactString>) -> Self {
        self.operators.push(operator.into());
        self.operators
            .sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
        self
    }
}

impl Tokenizer for WordTokenizer {
    fn tokenize<'a>(&self, input: &'a str) -> TokenStream<'a> {
        let operators = self.operators.clone();
        let mut cursor = Cursor::new(input);
        let mut finished = false;
        Box::new(std::iter::from_fn(move || {
            if finished {
                return None;
            }
            cursor.skip_whitespace();
            let start = cursor.position();
            let Some(c) = cursor.peek() else {
                finished = true;
                return Some(Ok(Token::end_of_input(start)));
            };
            if c.is_ascii_alphabetic() {
                let word = cursor.eat_while(|c| c.is_ascii_alphabetic());
                return Some(Ok(Token::new(word, start, cursor.position())));
            }
            if let Some(operator) = operators.iter().find(|op| cursor.starts_with(op)) {
                cursor.eat_str(operator);
                return Some(Ok(Token::new(operator.clone(), start, cursor.position())));
            }
            cursor.bump();
            let mut buf = [0; 4];
            Some(Ok(Token::new(
                CompactString::new(c.encode_utf8(&mut buf)),
                start,
                cursor.position(),
            )))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokenizer: &dyn Tokenizer, input: &str) -> Vec<Option<String>> {
        tokenizer
            .tokenize(input)
            .map(|token| token.unwrap().kind.map(|kind| kind.to_string()))
            .collect()
    }

    #[test]
    fn test_char_tokenizer_positions() {
        let tokens: Vec<_> = CharTokenizer.tokenize("ab\nc").map(Result::unwrap).collect();
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[1].start, SrcPosition::new(0, 1, 1));
        assert_eq!(tokens[2].end, SrcPosition::new(0, 3, 3));
        assert_eq!(tokens[3].start, SrcPosition::new(1, 0, 3));
        assert!(tokens[4].is_end());
        assert_eq!(tokens[4].start, SrcPosition::new(1, 1, 4));
    }

    #[test]
    fn test_char_tokenizer_empty_input() {
        assert_eq!(kinds(&CharTokenizer, ""), vec![None]);
    }

    #[test]
    fn test_word_tokenizer_operators() {
        let tokenizer = WordTokenizer::new().with_operator(":").with_operator(":=");
        assert_eq!(
            kinds(&tokenizer, "let x := y;"),
            vec![
                Some("let".to_string()),
                Some("x".to_string()),
                Some(":=".to_string()),
                Some("y".to_string()),
                Some(";".to_string()),
                None
            ]
        );
    }

    #[test]
    fn test_word_tokenizer_positions() {
        let tokens: Vec<_> = WordTokenizer::new()
            .tokenize("let import")
            .map(Result::unwrap)
            .collect();
        assert_eq!(tokens[1].start, SrcPosition::new(0, 4, 4));
        assert_eq!(tokens[1].end, SrcPosition::new(0, 10, 10));
        assert_eq!(tokens[1].text("let import"), "import");
    }
}
