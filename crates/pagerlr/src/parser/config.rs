use std::fmt;
use std::sync::Arc;

use crate::lexer::Tokenizer;
use crate::lr::{LogVerbosity, SerializedTable};

/// Configuration for [`Parser`](super::Parser)
#[derive(Clone, Default)]
pub struct ParserConfig {
    /// Tokenizer for [`Parser::parse`](super::Parser::parse); each character is its
    /// own token when unset
    pub tokenizer: Option<Arc<dyn Tokenizer>>,

    /// What the table builder logs
    pub log_verbosity: LogVerbosity,

    /// A previously saved table to use instead of generating one
    pub precomputed_table: Option<SerializedTable>,
}

impl ParserConfig {
    /// The default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `tokenizer` instead of one token per character
    #[must_use]
    pub fn with_tokenizer(mut self, tokenizer: impl Tokenizer + 'static) -> Self {
        self.tokenizer = Some(Arc::new(tokenizer));
        self
    }

    /// Set the log verbosity
    #[must_use]
    pub const fn with_log_verbosity(mut self, log_verbosity: LogVerbosity) -> Self {
        self.log_verbosity = log_verbosity;
        self
    }

    /// Load a saved table instead of generating one
    #[must_use]
    pub fn with_precomputed_table(mut self, table: SerializedTable) -> Self {
        self.precomputed_table = Some(table);
        self
    }
}

impl fmt::Debug for ParserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserConfig")
            .field("tokenizer", &self.tokenizer.as_ref().map(|_| "custom"))
            .field("log_verbosity", &self.log_verbosity)
            .field("precomputed_table", &self.precomputed_table.is_some())
            .finish()
    }
}
