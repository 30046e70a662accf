//! # pagerlr
//!
//! An LR(1) parser generator driven by pattern combinators.
//!
//! ## Overview
//!
//! Grammars are written as a [`Language`](pattern::Language): a set of named node
//! classes, each defined by a [`Pattern`](pattern::Pattern) built from literals,
//! concatenation, alternation, bounded or unbounded repetition and captures.
//! The library then:
//!
//! - **Compiles** the patterns to a context-free [`Grammar`](grammar::Grammar) whose
//!   rules carry capture descriptors
//! - **Builds** an LR(1) automaton, merging states with Pager's weak compatibility test
//!   so that table size stays close to LALR(1) without its spurious conflicts
//! - **Reduces** the automaton to a compact [`ReducedTable`](lr::ReducedTable) that can
//!   be saved as JSON and loaded again later
//! - **Parses** token streams with a shift-reduce engine that builds a typed tree of
//!   [`SyntaxNode`](syntax::SyntaxNode)s directly from the captures
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pagerlr::parser::{Parser, ParserConfig};
//! use pagerlr::pattern::{Language, Pattern, Repeat};
//!
//! let mut language = Language::new();
//! let item = language.class("Item", Pattern::capture("name", "x"));
//! let list = language.class(
//!     "List",
//!     Pattern::caten([
//!         "[".into(),
//!         Repeat::new(Pattern::capture_arr("items", item))
//!             .delimiter(",")
//!             .into(),
//!         "]".into(),
//!     ]),
//! );
//!
//! let parser = Parser::new(&language, list, ParserConfig::default())?;
//! let tree = parser.parse("[x,x,x]")?;
//! assert_eq!(tree.as_node().map(|node| node.array("items").len()), Some(3));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! Building a parser reports [`BuildError`](error::BuildError) (grammar conflicts,
//! malformed captures, invalid precomputed tables). Parsing reports
//! [`ParseFailure`](error::ParseFailure), which wraps either a
//! [`ParseError`](error::ParseError) carrying the offending token and the expected
//! lookaheads, or a [`TokenizationError`](error::TokenizationError).

pub mod error;
pub mod grammar;
pub mod lexer;
pub mod lr;
pub mod parser;
pub mod pattern;
pub mod syntax;

pub use error::{BuildError, ParseError, ParseFailure, TableError, TokenizationError};
pub use lexer::{SrcPosition, Token, Tokenizer};
pub use parser::{LogVerbosity, Parser, ParserConfig};
pub use pattern::{ClassId, Language, Match, Pattern, Repeat};
pub use syntax::{SyntaxNode, Value};
