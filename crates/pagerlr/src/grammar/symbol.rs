use std::fmt;

use compact_str::CompactString;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// A terminal symbol, matched against token kinds
pub type Terminal = CompactString;

/// A nonterminal symbol.
///
/// Nonterminal `0` is reserved for the start symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nonterminal(u32);

impl Nonterminal {
    /// The start symbol
    pub const START: Self = Self(0);

    /// Create a nonterminal from its index
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// The index of this nonterminal
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A symbol that may appear in a rule expansion
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GrammarSymbol {
    /// A terminal
    Terminal(Terminal),
    /// A nonterminal
    Nonterminal(Nonterminal),
}

impl From<Nonterminal> for GrammarSymbol {
    fn from(nt: Nonterminal) -> Self {
        Self::Nonterminal(nt)
    }
}

impl From<&str> for GrammarSymbol {
    fn from(terminal: &str) -> Self {
        Self::Terminal(terminal.into())
    }
}

/// A symbol that may follow an item: a terminal or the end of input
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Lookahead {
    /// A terminal
    Terminal(Terminal),
    /// The end of input
    End,
}

impl Lookahead {
    /// Create a terminal lookahead
    #[must_use]
    pub fn terminal(terminal: impl Into<Terminal>) -> Self {
        Self::Terminal(terminal.into())
    }

    /// The terminal, unless this is the end of input
    #[must_use]
    pub fn as_terminal(&self) -> Option<&str> {
        match self {
            Self::Terminal(terminal) => Some(terminal),
            Self::End => None,
        }
    }
}

pub(crate) fn quote(terminal: &str) -> String {
    format!("\"{}\"", terminal.replace('"', "\\\""))
}

impl fmt::Display for Lookahead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminal(terminal) => f.write_str(&quote(terminal)),
            Self::End => f.write_str("(end of input)"),
        }
    }
}

/// Any symbol an action can be keyed on.
///
/// Serializes as a JSON string for terminals, a number for nonterminals and `null`
/// for the end of input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AugmentedSymbol {
    /// A terminal
    Terminal(Terminal),
    /// A nonterminal
    Nonterminal(Nonterminal),
    /// The end of input
    End,
}

impl AugmentedSymbol {
    /// The lookahead this symbol stands for, if it is not a nonterminal
    #[must_use]
    pub fn as_lookahead(&self) -> Option<Lookahead> {
        match self {
            Self::Terminal(terminal) => Some(Lookahead::Terminal(terminal.clone())),
            Self::End => Some(Lookahead::End),
            Self::Nonterminal(_) => None,
        }
    }
}

impl From<Lookahead> for AugmentedSymbol {
    fn from(lookahead: Lookahead) -> Self {
        match lookahead {
            Lookahead::Terminal(terminal) => Self::Terminal(terminal),
            Lookahead::End => Self::End,
        }
    }
}

impl From<GrammarSymbol> for AugmentedSymbol {
    fn from(symbol: GrammarSymbol) -> Self {
        match symbol {
            GrammarSymbol::Terminal(terminal) => Self::Terminal(terminal),
            GrammarSymbol::Nonterminal(nt) => Self::Nonterminal(nt),
        }
    }
}

impl From<&str> for AugmentedSymbol {
    fn from(terminal: &str) -> Self {
        Self::Terminal(terminal.into())
    }
}

impl From<Nonterminal> for AugmentedSymbol {
    fn from(nt: Nonterminal) -> Self {
        Self::Nonterminal(nt)
    }
}

/// An insertion-ordered set of lookaheads
pub type Context = IndexSet<Lookahead, ahash::RandomState>;

/// A context holding only the end of input
#[must_use]
pub fn end_context() -> Context {
    std::iter::once(Lookahead::End).collect()
}
