//! A tokenizer for small programming languages.

use compact_str::CompactString;

use super::cursor::Cursor;
use super::{Token, TokenStream, TokenValue, Tokenizer};
use crate::error::TokenizationError;

/// Kind of identifier tokens
pub const IDENTIFIER: &str = "identifier";
/// Kind of numeric literal tokens
pub const NUMBER: &str = "number";
/// Kind of string literal tokens
pub const TEXT: &str = "text";

/// Recognizes keywords, identifiers, numbers and string literals.
///
/// - Keywords are tried longest-first. A keyword made of word characters only is
///   extended into an identifier when more letters or digits follow it, or when it
///   directly follows a `.` (so `a.let` is an identifier access).
/// - Identifiers start with an ASCII letter and continue with letters and digits.
/// - Numbers are digit runs with at most one decimal point, which may not be last.
/// - String literals are enclosed in `"` and accept the escapes `\\`, `\"` and `\n`.
/// - Identifier, number and string tokens carry their decoded [`TokenValue`].
/// - `// ...` comments run to the end of the line, `/// ... ///` comments may span
///   lines. Whitespace is skipped.
///
/// # Example
///
/// ```rust,no_run
/// use pagerlr::lexer::{KeywordTokenizer, Tokenizer};
///
/// let tokenizer = KeywordTokenizer::new(["let", "=", ";"]);
/// let kinds: Vec<_> = tokenizer
///     .tokenize("let answer = 42;")
///     .filter_map(Result::ok)
///     .filter_map(|token| token.kind)
///     .collect();
/// assert_eq!(kinds, ["let", "identifier", "=", "number", ";"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct KeywordTokenizer {
    keywords: Vec<CompactString>,
}

impl KeywordTokenizer {
    /// Create a tokenizer for the given keywords
    #[must_use]
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        let mut keywords: Vec<CompactString> = keywords.into_iter().map(Into::into).collect();
        keywords.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
        Self { keywords }
    }

    /// The keywords, longest first
    #[must_use]
    pub fn keywords(&self) -> &[CompactString] {
        &self.keywords
    }
}

impl Tokenizer for KeywordTokenizer {
    fn tokenize<'a>(&self, input: &'a str) -> TokenStream<'a> {
        let keywords = self.keywords.clone();
        let mut cursor = Cursor::new(input);
        let mut finished = false;
        Box::new(std::iter::from_fn(move || {
            if finished {
                return None;
            }
            let next = next_token(&keywords, &mut cursor);
            if !matches!(next, Ok(Some(_))) {
                finished = true;
            }
            match next {
                Ok(Some(token)) => Some(Ok(token)),
                Ok(None) => Some(Ok(Token::end_of_input(cursor.position()))),
                Err(error) => Some(Err(error)),
            }
        }))
    }
}

fn is_word(text: &str) -> bool {
    text.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Skip trivia and read one token; `None` at the end of input
fn next_token(
    keywords: &[CompactString],
    cursor: &mut Cursor<'_>,
) -> Result<Option<Token>, TokenizationError> {
    loop {
        cursor.skip_whitespace();
        if cursor.starts_with("///") {
            cursor.eat_str("///");
            while !cursor.is_eof() && !cursor.starts_with("///") {
                cursor.bump();
            }
            if cursor.is_eof() {
                return Err(TokenizationError::new(cursor.position()));
            }
            cursor.eat_str("///");
        } else if cursor.starts_with("//") {
            cursor.eat_while(|c| c != '\n');
        } else {
            break;
        }
    }

    let start = cursor.position();
    let Some(first) = cursor.peek() else {
        return Ok(None);
    };

    if let Some(keyword) = keywords.iter().find(|keyword| cursor.starts_with(keyword)) {
        cursor.eat_str(keyword);
        let keyword_end = cursor.position();
        let word = is_word(keyword);
        if word {
            cursor.eat_while(|c| c.is_ascii_alphanumeric());
        }
        let extended = cursor.position() != keyword_end;
        let after_dot = word && cursor.before(start).ends_with('.');
        if extended || after_dot {
            let name = CompactString::new(cursor.since(start));
            return Ok(Some(
                Token::new(IDENTIFIER, start, cursor.position()).with_value(TokenValue::Identifier(name)),
            ));
        }
        return Ok(Some(Token::new(keyword.clone(), start, cursor.position())));
    }

    if first == '"' {
        cursor.bump();
        let mut text = CompactString::default();
        loop {
            match cursor.bump() {
                None => return Err(TokenizationError::new(cursor.position())),
                Some('"') => break,
                Some('\\') => {
                    let escape_at = cursor.position();
                    match cursor.bump() {
                        Some('n') => text.push('\n'),
                        Some(c @ ('\\' | '"')) => text.push(c),
                        _ => return Err(TokenizationError::new(escape_at)),
                    }
                }
                Some(c) => text.push(c),
            }
        }
        return Ok(Some(
            Token::new(TEXT, start, cursor.position()).with_value(TokenValue::Text(text)),
        ));
    }

    if first.is_ascii_digit() {
        let mut seen_dot = false;
        let mut last = first;
        while let Some(c) = cursor.peek() {
            if c.is_ascii_digit() || (c == '.' && !seen_dot) {
                seen_dot |= c == '.';
                last = c;
                cursor.bump();
            } else {
                break;
            }
        }
        if last == '.' {
            return Err(TokenizationError::new(cursor.position()));
        }
        let number = cursor
            .since(start)
            .parse::<f64>()
            .map_err(|_| TokenizationError::new(start))?;
        return Ok(Some(
            Token::new(NUMBER, start, cursor.position()).with_value(TokenValue::Number(number)),
        ));
    }

    if first.is_ascii_alphabetic() {
        let name = CompactString::new(cursor.eat_while(|c| c.is_ascii_alphanumeric()));
        return Ok(Some(
            Token::new(IDENTIFIER, start, cursor.position()).with_value(TokenValue::Identifier(name)),
        ));
    }

    Err(TokenizationError::new(start))
}
