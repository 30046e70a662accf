//! # Grammar Module
//!
//! The context-free grammar patterns compile to.
//!
//! ## Overview
//!
//! A [`Grammar`] holds numbered rules, the names of its nonterminals, the capture
//! descriptor attached to each nonterminal created for a capture, and the zeroth
//! (FIRST) set of every nonterminal. Nonterminal `0` is the start symbol; its single
//! rule is created by the pattern compiler for the root capture.
//!
//! Grammars are normally produced by [`generate_automaton`](crate::lr::generate_automaton)
//! or [`Parser::new`](crate::parser::Parser::new), but can also be assembled by hand:
//!
//! ```rust,no_run
//! use pagerlr::grammar::{Grammar, GrammarSymbol, Nonterminal};
//!
//! let mut grammar = Grammar::new();
//! let list = grammar.create_nonterminal("List", None);
//! grammar.insert_rule(Nonterminal::START, vec![list.into()]);
//! grammar.insert_rule(list, vec![]);
//! grammar.insert_rule(list, vec![list.into(), GrammarSymbol::from("x")]);
//! grammar.compute_zeroth();
//! ```

mod symbol;
pub mod zeroth;

pub use symbol::*;
pub use zeroth::zeroth_of_sequence;

use std::fmt;

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::pattern::ClassId;

/// What a capture stores when its nonterminal is reduced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    /// A node of the given class
    TypedNode(ClassId),
    /// The first token of the reduction
    Token,
    /// Every token of the reduction
    RawSpan,
}

/// The capture attached to a nonterminal
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchDescriptor {
    /// Whether captured values accumulate into an array
    pub is_array: bool,
    /// Field receiving the value
    pub prop: CompactString,
    /// What the value is built from
    pub kind: MatchKind,
}

/// A production `head -> expansion`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarRule {
    /// Left-hand side
    pub head: Nonterminal,
    /// Right-hand side, possibly empty
    pub expansion: Vec<GrammarSymbol>,
    /// Position of the rule in [`Grammar::rules`]
    pub index: usize,
}

/// A context-free grammar with capture descriptors
#[derive(Debug, Clone)]
pub struct Grammar {
    rules: Vec<GrammarRule>,
    names: Vec<CompactString>,
    descriptors: Vec<Option<MatchDescriptor>>,
    rules_by_head: Vec<SmallVec<[usize; 4]>>,
    zeroth: Vec<Context>,
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

impl Grammar {
    /// Create a grammar containing only the start symbol
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            names: vec![CompactString::new("(starting symbol)")],
            descriptors: vec![None],
            rules_by_head: vec![SmallVec::new()],
            zeroth: vec![Context::default()],
        }
    }

    /// Allocate a new nonterminal
    pub fn create_nonterminal(
        &mut self,
        name: impl Into<CompactString>,
        descriptor: Option<MatchDescriptor>,
    ) -> Nonterminal {
        let nt = Nonterminal::new(self.names.len() as u32);
        self.names.push(name.into());
        self.descriptors.push(descriptor);
        self.rules_by_head.push(SmallVec::new());
        self.zeroth.push(Context::default());
        nt
    }

    /// Add a rule and return its index
    pub fn insert_rule(&mut self, head: Nonterminal, expansion: Vec<GrammarSymbol>) -> usize {
        let index = self.rules.len();
        if let Some(rules) = self.rules_by_head.get_mut(head.index()) {
            rules.push(index);
        }
        self.rules.push(GrammarRule {
            head,
            expansion,
            index,
        });
        index
    }

    /// Recompute the zeroth set of every nonterminal
    pub fn compute_zeroth(&mut self) {
        zeroth::compute_zeroth(&self.rules, &mut self.zeroth);
    }

    /// All rules, in insertion order
    #[must_use]
    pub fn rules(&self) -> &[GrammarRule] {
        &self.rules
    }

    /// The rule at `index`
    ///
    /// # Panics
    ///
    /// Panics if no rule has that index.
    #[must_use]
    pub fn rule(&self, index: usize) -> &GrammarRule {
        &self.rules[index]
    }

    /// Indices of the rules whose head is `nt`
    #[must_use]
    pub fn rules_for(&self, nt: Nonterminal) -> &[usize] {
        self.rules_by_head
            .get(nt.index())
            .map_or(&[], |rules| rules.as_slice())
    }

    /// Number of nonterminals, including the start symbol
    #[must_use]
    pub fn nonterminal_count(&self) -> usize {
        self.names.len()
    }

    /// Name of a nonterminal
    #[must_use]
    pub fn name(&self, nt: Nonterminal) -> &str {
        self.names.get(nt.index()).map_or("?", CompactString::as_str)
    }

    /// Capture descriptor of a nonterminal
    #[must_use]
    pub fn descriptor(&self, nt: Nonterminal) -> Option<&MatchDescriptor> {
        self.descriptors.get(nt.index()).and_then(Option::as_ref)
    }

    /// Zeroth set of every nonterminal, indexed by nonterminal
    #[must_use]
    pub fn zeroth_sets(&self) -> &[Context] {
        &self.zeroth
    }

    /// Zeroth set of one nonterminal; contains [`Lookahead::End`] when it is nullable
    #[must_use]
    pub fn zeroth(&self, nt: Nonterminal) -> Option<&Context> {
        self.zeroth.get(nt.index())
    }

    /// Human-readable form of a symbol
    #[must_use]
    pub fn describe(&self, symbol: &AugmentedSymbol) -> String {
        match symbol {
            AugmentedSymbol::Terminal(terminal) => quote(terminal),
            AugmentedSymbol::Nonterminal(nt) => self.name(*nt).to_string(),
            AugmentedSymbol::End => Lookahead::End.to_string(),
        }
    }

    /// Human-readable form of an expansion, with an optional dot position
    #[must_use]
    pub fn describe_expansion(&self, expansion: &[GrammarSymbol], dot: Option<usize>) -> String {
        let mut parts = Vec::with_capacity(expansion.len() + 1);
        for (i, symbol) in expansion.iter().enumerate() {
            if dot == Some(i) {
                parts.push("•".to_string());
            }
            parts.push(self.describe(&symbol.clone().into()));
        }
        if dot == Some(expansion.len()) {
            parts.push("•".to_string());
        }
        if parts.is_empty() {
            return "ε".to_string();
        }
        parts.join(" ")
    }

    /// Human-readable form of a rule
    #[must_use]
    pub fn describe_rule(&self, index: usize) -> String {
        let rule = self.rule(index);
        format!(
            "{} -> {}",
            self.name(rule.head),
            self.describe_expansion(&rule.expansion, None)
        )
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{:>4}: {}", rule.index, self.describe_rule(rule.index))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_symbol_is_preallocated() {
        let grammar = Grammar::new();
        assert_eq!(grammar.nonterminal_count(), 1);
        assert_eq!(grammar.name(Nonterminal::START), "(starting symbol)");
    }

    #[test]
    fn test_rules_are_indexed_by_head() {
        let mut grammar = Grammar::new();
        let a = grammar.create_nonterminal("A", None);
        let first = grammar.insert_rule(Nonterminal::START, vec![a.into()]);
        let second = grammar.insert_rule(a, vec!["x".into()]);
        let third = grammar.insert_rule(a, vec![]);
        assert_eq!((first, second, third), (0, 1, 2));
        assert_eq!(grammar.rules_for(a), &[1, 2]);
        assert_eq!(grammar.describe_rule(1), "A -> \"x\"");
        assert_eq!(grammar.describe_rule(2), "A -> ε");
    }

    #[test]
    fn test_describe_expansion_with_dot() {
        let mut grammar = Grammar::new();
        let a = grammar.create_nonterminal("A", None);
        let expansion = vec![GrammarSymbol::from("x"), a.into()];
        assert_eq!(grammar.describe_expansion(&expansion, Some(1)), "\"x\" • A");
        assert_eq!(grammar.describe_expansion(&expansion, Some(2)), "\"x\" A •");
    }
}
