//! # Parser Module
//!
//! The entry point of the library: [`Parser`] turns a [`Language`] into a parse
//! table and parses text with it.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pagerlr::lexer::WordTokenizer;
//! use pagerlr::parser::{LogVerbosity, Parser, ParserConfig};
//! use pagerlr::pattern::{Language, Pattern};
//!
//! let mut language = Language::new();
//! let decl = language.class(
//!     "Let",
//!     Pattern::caten(["let".into(), Pattern::capture("name", "x"), ":=".into(), "y".into()]),
//! );
//! let config = ParserConfig::new()
//!     .with_tokenizer(WordTokenizer::new().with_operator(":="))
//!     .with_log_verbosity(LogVerbosity::Silent);
//! let parser = Parser::new(&language, decl, config)?;
//! let tree = parser.parse("let x := y")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Table persistence
//!
//! Generating a table for a large language takes time. A generated table can be
//! saved with [`Parser::save_table`] and passed back through
//! [`ParserConfig::precomputed_table`], which skips generation entirely.

mod config;
mod engine;

pub use config::ParserConfig;
pub use crate::lr::LogVerbosity;

use std::path::Path;
use std::sync::Arc;

use crate::error::{BuildError, ParseFailure, TableError};
use crate::lexer::{CharTokenizer, Tokenizer};
use crate::lr::{generate_automaton, ReducedTable, SerializedTable};
use crate::pattern::{ClassId, ClassTable, Language};
use crate::syntax::Value;

/// A parser for one root class of a language.
///
/// Parsers are immutable once built and can be shared between threads.
pub struct Parser {
    root: ClassId,
    classes: ClassTable,
    table: ReducedTable,
    tokenizer: Arc<dyn Tokenizer>,
    generated: bool,
}

impl Parser {
    /// Build a parser for `root`.
    ///
    /// Uses `config.precomputed_table` when given; otherwise generates the table.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] when the patterns are malformed, the grammar has a
    /// conflict, or the precomputed table does not fit the language.
    pub fn new(language: &Language, root: ClassId, config: ParserConfig) -> Result<Self, BuildError> {
        let ParserConfig {
            tokenizer,
            log_verbosity,
            precomputed_table,
        } = config;

        if tokenizer.is_none() && log_verbosity.reports_problems() {
            log::info!("No tokenizer given, so every character becomes its own token");
        }

        let classes = ClassTable::collect(language, root)?;
        let (table, generated) = match precomputed_table {
            Some(serialized) => (ReducedTable::from_serialized(&serialized, &classes)?, false),
            None => {
                if log_verbosity.reports_problems() {
                    log::info!(
                        "Generating the parser table for \"{}\"; save it with `Parser::save_table` \
                         and load it through `ParserConfig::precomputed_table` to skip this step",
                        language.name(root).unwrap_or_default()
                    );
                }
                let automaton = generate_automaton(language, &classes, root, log_verbosity)?;
                (ReducedTable::from_automaton(&automaton), true)
            }
        };

        Ok(Self {
            root,
            classes,
            table,
            tokenizer: tokenizer.unwrap_or_else(|| Arc::new(CharTokenizer)),
            generated,
        })
    }

    /// Parse `input` and return the value captured for the root class.
    ///
    /// For a visible root class this is a [`Value::Node`]; a hidden root class
    /// yields its `value` capture.
    ///
    /// # Errors
    ///
    /// Returns [`ParseFailure::Parse`] at the first token without an action and
    /// [`ParseFailure::Tokenize`] when the tokenizer fails.
    pub fn parse(&self, input: &str) -> Result<Value, ParseFailure> {
        engine::parse(&self.table, &self.classes, self.tokenizer.tokenize(input))
    }

    /// The root class
    #[must_use]
    pub const fn root(&self) -> ClassId {
        self.root
    }

    /// The classes reachable from the root
    #[must_use]
    pub const fn classes(&self) -> &ClassTable {
        &self.classes
    }

    /// The parse table
    #[must_use]
    pub const fn table(&self) -> &ReducedTable {
        &self.table
    }

    /// Whether the table was generated rather than loaded
    #[must_use]
    pub const fn is_generated(&self) -> bool {
        self.generated
    }

    /// The table in its serialized form.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::NotGenerated`] if the table was loaded from a
    /// precomputed table.
    pub fn serialized_table(&self) -> Result<SerializedTable, TableError> {
        if !self.generated {
            return Err(TableError::NotGenerated);
        }
        self.table.to_serialized(&self.classes)
    }

    /// Write the table to `path` as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::NotGenerated`] for loaded tables, or an I/O or JSON
    /// error.
    pub fn save_table(&self, path: impl AsRef<Path>) -> Result<(), TableError> {
        let json = self.serialized_table()?.to_json()?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read a table saved with [`Parser::save_table`]
    ///
    /// # Errors
    ///
    /// Returns an I/O or JSON error.
    pub fn load_table(path: impl AsRef<Path>) -> Result<SerializedTable, TableError> {
        let json = std::fs::read_to_string(path)?;
        SerializedTable::from_json(&json)
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("root", &self.root)
            .field("classes", &self.classes.len())
            .field("states", &self.table.len())
            .field("generated", &self.generated)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Pattern;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_parser_is_send_and_sync() {
        assert_send_sync::<Parser>();
    }

    #[test]
    fn test_loaded_table_cannot_be_saved() {
        let mut language = Language::new();
        let root = language.class("A", Pattern::capture("a", "a"));
        let config = ParserConfig::new().with_log_verbosity(LogVerbosity::Silent);
        let parser = Parser::new(&language, root, config.clone()).unwrap();
        let serialized = parser.serialized_table().unwrap();

        let loaded = Parser::new(&language, root, config.with_precomputed_table(serialized)).unwrap();
        assert!(!loaded.is_generated());
        assert!(matches!(loaded.serialized_table(), Err(TableError::NotGenerated)));
        assert!(loaded.parse("a").is_ok());
    }
}
