use super::SrcPosition;

/// Walks the input one character at a time while tracking lines and columns.
#[derive(Debug, Clone)]
pub(super) struct Cursor<'a> {
    input: &'a str,
    position: SrcPosition,
}

impl<'a> Cursor<'a> {
    pub(super) const fn new(input: &'a str) -> Self {
        Self {
            input,
            position: SrcPosition::new(0, 0, 0),
        }
    }

    pub(super) const fn position(&self) -> SrcPosition {
        self.position
    }

    pub(super) fn rest(&self) -> &'a str {
        self.input.get(self.position.offset..).unwrap_or("")
    }

    pub(super) fn is_eof(&self) -> bool {
        self.rest().is_empty()
    }

    pub(super) fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub(super) fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    /// The text between `start` and the current position
    pub(super) fn since(&self, start: SrcPosition) -> &'a str {
        self.input
            .get(start.offset..self.position.offset)
            .unwrap_or("")
    }

    /// The text before `start`
    pub(super) fn before(&self, start: SrcPosition) -> &'a str {
        self.input.get(..start.offset).unwrap_or("")
    }

    pub(super) fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position = if c == '\n' {
            SrcPosition::new(self.position.line + 1, 0, self.position.offset + 1)
        } else {
            self.position.after(c)
        };
        Some(c)
    }

    /// Consume `prefix`, which the caller has checked is next
    pub(super) fn eat_str(&mut self, prefix: &str) {
        for _ in prefix.chars() {
            self.bump();
        }
    }

    pub(super) fn eat_while(&mut self, mut predicate: impl FnMut(char) -> bool) -> &'a str {
        let start = self.position;
        while self.peek().is_some_and(&mut predicate) {
            self.bump();
        }
        self.since(start)
    }

    pub(super) fn skip_whitespace(&mut self) {
        self.eat_while(char::is_whitespace);
    }
}
