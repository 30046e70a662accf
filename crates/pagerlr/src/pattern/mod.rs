//! # Pattern Module
//!
//! Pattern combinators and the node classes they describe.
//!
//! ## Overview
//!
//! A grammar is written as a [`Language`]: a registry of named node classes, each
//! defined by a [`Pattern`]. Patterns combine:
//!
//! - **Literals**: a terminal, written as a string
//! - **Caten**: a sequence of patterns
//! - **Or**: alternatives, optionally named so they can be shared
//! - **Maybe**: an alternative between nothing and a pattern
//! - **Repeat**: bounded or unbounded repetition with optional delimiters
//! - **Match**: a capture storing a node, a token or a token span into a field
//!
//! Alternations, repetitions and captures compile to a nonterminal of their own.
//! Reaching the same one twice is only allowed when it has a name, in which case the
//! nonterminal is shared.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pagerlr::pattern::{Language, Match, Pattern, Repeat};
//! use std::sync::Arc;
//!
//! let mut language = Language::new();
//! let call = language.declare("Call");
//! let arg = Arc::new(Match::deferred(Some("arg"), false));
//! language.define(
//!     call,
//!     Pattern::caten([
//!         Pattern::capture("name", "i"),
//!         Pattern::maybe(Pattern::caten(["(".into(), arg.clone().into(), ")".into()])),
//!     ]),
//! );
//! arg.patch(call).ok();
//! ```

mod class;
mod compile;

pub use class::{ClassTable, Fields, Language, NodeClass};
pub(crate) use compile::compile_grammar;

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

use compact_str::CompactString;

use crate::grammar::Terminal;

/// Identifies a node class within its [`Language`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

impl ClassId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class #{}", self.0)
    }
}

static NEXT_PATTERN_ID: AtomicU32 = AtomicU32::new(0);

/// Identity of a combinator instance, used to detect reuse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatternId(u32);

impl PatternId {
    fn fresh() -> Self {
        Self(NEXT_PATTERN_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A grammar fragment.
///
/// Cloning a pattern is cheap and keeps the identity of the alternations,
/// repetitions and captures inside it.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// A terminal
    Literal(Terminal),
    /// A sequence; the empty sequence matches nothing
    Caten(Vec<Pattern>),
    /// Alternatives
    Or(Arc<Or>),
    /// Repetition
    Repeat(Arc<Repeat>),
    /// A capture
    Match(Arc<Match>),
}

impl Pattern {
    /// A terminal
    #[must_use]
    pub fn literal(terminal: impl Into<Terminal>) -> Self {
        Self::Literal(terminal.into())
    }

    /// The empty sequence
    #[must_use]
    pub const fn empty() -> Self {
        Self::Caten(Vec::new())
    }

    /// A sequence of patterns
    #[must_use]
    pub fn caten(items: impl IntoIterator<Item = Pattern>) -> Self {
        Self::Caten(items.into_iter().collect())
    }

    /// Unnamed alternatives
    #[must_use]
    pub fn or(branches: impl IntoIterator<Item = Pattern>) -> Self {
        Self::Or(Arc::new(Or::new(None, branches)))
    }

    /// Named alternatives, which may be reached from several places
    #[must_use]
    pub fn or_named(
        name: impl Into<CompactString>,
        branches: impl IntoIterator<Item = Pattern>,
    ) -> Self {
        Self::Or(Arc::new(Or::new(Some(name.into()), branches)))
    }

    /// Either nothing or `pattern`
    #[must_use]
    pub fn maybe(pattern: impl Into<Pattern>) -> Self {
        Self::or([Self::empty(), pattern.into()])
    }

    /// Named form of [`Pattern::maybe`]
    #[must_use]
    pub fn maybe_named(name: impl Into<CompactString>, pattern: impl Into<Pattern>) -> Self {
        Self::or_named(name, [Self::empty(), pattern.into()])
    }

    /// Zero or more repetitions of `pattern`, without delimiters
    #[must_use]
    pub fn repeat(pattern: impl Into<Pattern>) -> Self {
        Repeat::new(pattern).into()
    }

    /// Capture `target` into the single-value field `prop`
    #[must_use]
    pub fn capture(prop: impl Into<CompactString>, target: impl Into<MatchTarget>) -> Self {
        Match::new(prop, target).into()
    }

    /// Capture `target` into the array field `prop`
    #[must_use]
    pub fn capture_arr(prop: impl Into<CompactString>, target: impl Into<MatchTarget>) -> Self {
        Match::array(prop, target).into()
    }

    /// Include `target` without storing it; the captures inside it still apply
    #[must_use]
    pub fn include(target: impl Into<MatchTarget>) -> Self {
        Match::anonymous(target).into()
    }

    /// Identity of the combinator, for alternations, repetitions and captures
    #[must_use]
    pub fn id(&self) -> Option<PatternId> {
        match self {
            Self::Literal(_) | Self::Caten(_) => None,
            Self::Or(or) => Some(or.id),
            Self::Repeat(repeat) => Some(repeat.id),
            Self::Match(m) => Some(m.id),
        }
    }
}

impl From<&str> for Pattern {
    fn from(terminal: &str) -> Self {
        Self::literal(terminal)
    }
}

impl From<String> for Pattern {
    fn from(terminal: String) -> Self {
        Self::literal(terminal)
    }
}

impl From<CompactString> for Pattern {
    fn from(terminal: CompactString) -> Self {
        Self::Literal(terminal)
    }
}

impl From<Vec<Pattern>> for Pattern {
    fn from(items: Vec<Pattern>) -> Self {
        Self::Caten(items)
    }
}

impl From<Repeat> for Pattern {
    fn from(repeat: Repeat) -> Self {
        Self::Repeat(Arc::new(repeat))
    }
}

impl From<Match> for Pattern {
    fn from(m: Match) -> Self {
        Self::Match(Arc::new(m))
    }
}

impl From<Arc<Match>> for Pattern {
    fn from(m: Arc<Match>) -> Self {
        Self::Match(m)
    }
}

/// Alternatives between patterns
#[derive(Debug)]
pub struct Or {
    pub(crate) id: PatternId,
    pub(crate) name: Option<CompactString>,
    pub(crate) branches: Vec<Pattern>,
}

impl Or {
    fn new(name: Option<CompactString>, branches: impl IntoIterator<Item = Pattern>) -> Self {
        Self {
            id: PatternId::fresh(),
            name,
            branches: branches.into_iter().collect(),
        }
    }

    /// The alternatives
    #[must_use]
    pub fn branches(&self) -> &[Pattern] {
        &self.branches
    }
}

/// What may follow the last repetition
#[derive(Debug, Clone, Default)]
pub enum TrailingDelimiter {
    /// Nothing
    #[default]
    Forbidden,
    /// Optionally the regular delimiter
    SameAsDelimiter,
    /// Optionally the given pattern
    Pattern(Pattern),
}

/// Repetition of a pattern, built with chained setters.
///
/// The upper bound is exclusive: `lower_bound(1).upper_bound(3)` accepts one or two
/// repetitions. Without an upper bound the repetition is unbounded.
///
/// ```rust,no_run
/// use pagerlr::pattern::{Pattern, Repeat, TrailingDelimiter};
///
/// let args: Pattern = Repeat::new("x")
///     .delimiter(",")
///     .trailing_delimiter(TrailingDelimiter::SameAsDelimiter)
///     .lower_bound(1)
///     .into();
/// ```
#[derive(Debug)]
pub struct Repeat {
    pub(crate) id: PatternId,
    pub(crate) name: Option<CompactString>,
    pub(crate) pattern: Pattern,
    pub(crate) delimiter: Pattern,
    pub(crate) trailing: TrailingDelimiter,
    pub(crate) lower_bound: usize,
    pub(crate) upper_bound: Option<usize>,
}

impl Repeat {
    /// Zero or more repetitions of `pattern`
    #[must_use]
    pub fn new(pattern: impl Into<Pattern>) -> Self {
        Self {
            id: PatternId::fresh(),
            name: None,
            pattern: pattern.into(),
            delimiter: Pattern::empty(),
            trailing: TrailingDelimiter::Forbidden,
            lower_bound: 0,
            upper_bound: None,
        }
    }

    /// Pattern between consecutive repetitions
    #[must_use]
    pub fn delimiter(mut self, delimiter: impl Into<Pattern>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// What may follow the last repetition
    #[must_use]
    pub fn trailing_delimiter(mut self, trailing: TrailingDelimiter) -> Self {
        self.trailing = trailing;
        self
    }

    /// Minimum number of repetitions
    #[must_use]
    pub const fn lower_bound(mut self, lower_bound: usize) -> Self {
        self.lower_bound = lower_bound;
        self
    }

    /// Exclusive maximum number of repetitions
    #[must_use]
    pub const fn upper_bound(mut self, upper_bound: usize) -> Self {
        self.upper_bound = Some(upper_bound);
        self
    }

    /// Name, allowing the repetition to be reached from several places
    #[must_use]
    pub fn named(mut self, name: impl Into<CompactString>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// What a capture stores
#[derive(Debug, Clone)]
pub enum MatchTarget {
    /// A node of a class
    Class(ClassId),
    /// A pattern; literals store their token, other patterns the tokens they span
    Pattern(Pattern),
}

impl From<ClassId> for MatchTarget {
    fn from(class: ClassId) -> Self {
        Self::Class(class)
    }
}

impl From<Pattern> for MatchTarget {
    fn from(pattern: Pattern) -> Self {
        Self::Pattern(pattern)
    }
}

impl From<&str> for MatchTarget {
    fn from(terminal: &str) -> Self {
        Self::Pattern(Pattern::literal(terminal))
    }
}

impl From<Repeat> for MatchTarget {
    fn from(repeat: Repeat) -> Self {
        Self::Pattern(repeat.into())
    }
}

/// A capture of a class, token or span into a field of the enclosing node.
///
/// A capture without a field name includes its target without storing it.
/// A deferred capture gets its target later through [`Match::patch`], which allows
/// classes to refer to each other before all of them are defined.
#[derive(Debug)]
pub struct Match {
    pub(crate) id: PatternId,
    pub(crate) prop: Option<CompactString>,
    pub(crate) is_array: bool,
    pub(crate) name: Option<CompactString>,
    target: OnceLock<MatchTarget>,
}

impl Match {
    fn with_target(prop: Option<CompactString>, is_array: bool, target: OnceLock<MatchTarget>) -> Self {
        Self {
            id: PatternId::fresh(),
            prop,
            is_array,
            name: None,
            target,
        }
    }

    /// Single-value capture
    #[must_use]
    pub fn new(prop: impl Into<CompactString>, target: impl Into<MatchTarget>) -> Self {
        Self::with_target(Some(prop.into()), false, OnceLock::from(target.into()))
    }

    /// Array capture
    #[must_use]
    pub fn array(prop: impl Into<CompactString>, target: impl Into<MatchTarget>) -> Self {
        Self::with_target(Some(prop.into()), true, OnceLock::from(target.into()))
    }

    /// Capture that stores nothing
    #[must_use]
    pub fn anonymous(target: impl Into<MatchTarget>) -> Self {
        Self::with_target(None, false, OnceLock::from(target.into()))
    }

    /// Capture whose target is supplied later with [`Match::patch`]
    #[must_use]
    pub fn deferred(prop: Option<&str>, is_array: bool) -> Self {
        Self::with_target(prop.map(CompactString::new), is_array, OnceLock::new())
    }

    /// Name, allowing the capture to be reached from several places
    #[must_use]
    pub fn named(mut self, name: impl Into<CompactString>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the target of a deferred capture.
    ///
    /// # Errors
    ///
    /// Returns the target back if one was already set.
    pub fn patch(&self, target: impl Into<MatchTarget>) -> Result<(), MatchTarget> {
        self.target.set(target.into())
    }

    /// The target, unless this is an unpatched deferred capture
    #[must_use]
    pub fn target(&self) -> Option<&MatchTarget> {
        self.target.get()
    }

    /// The field receiving the value
    #[must_use]
    pub fn prop(&self) -> Option<&str> {
        self.prop.as_deref()
    }

    /// Whether values accumulate into an array
    #[must_use]
    pub const fn is_array(&self) -> bool {
        self.is_array
    }
}
