use std::cmp::Ordering;

use crate::grammar::{zeroth_of_sequence, Context, Grammar, GrammarSymbol};

/// An LR(1) item: a rule, a dot position and the lookaheads that may follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleAt {
    /// Index of the rule
    pub rule: usize,
    /// Number of expansion symbols before the dot
    pub dot: usize,
    /// Lookaheads that may follow the rule
    pub follow: Context,
}

impl RuleAt {
    /// Create an item
    #[must_use]
    pub const fn new(rule: usize, dot: usize, follow: Context) -> Self {
        Self { rule, dot, follow }
    }

    /// The symbol after the dot, `None` when the item is complete
    #[must_use]
    pub fn at<'g>(&self, grammar: &'g Grammar) -> Option<&'g GrammarSymbol> {
        grammar.rule(self.rule).expansion.get(self.dot)
    }

    /// Lookaheads for items derived from the symbol after the dot
    #[must_use]
    pub fn follow_at(&self, grammar: &Grammar) -> Context {
        zeroth_of_sequence(
            grammar.zeroth_sets(),
            &grammar.rule(self.rule).expansion,
            &self.follow,
            self.dot + 1,
        )
    }

    /// The item with the dot advanced by one
    #[must_use]
    pub fn shift(&self) -> Self {
        Self::new(self.rule, self.dot + 1, self.follow.clone())
    }

    /// Rule and dot, which identify the item regardless of its follow set
    #[must_use]
    pub const fn core(&self) -> (usize, usize) {
        (self.rule, self.dot)
    }

    /// Whether both items have the same rule and dot
    #[must_use]
    pub const fn is_isocore(&self, other: &Self) -> bool {
        self.rule == other.rule && self.dot == other.dot
    }

    /// Canonical kernel order: rule ascending, then dot descending
    #[must_use]
    pub fn compare(a: &Self, b: &Self) -> Ordering {
        a.rule.cmp(&b.rule).then_with(|| b.dot.cmp(&a.dot))
    }

    /// Human-readable form, e.g. `A -> "a" • B   { "b", (end of input) }`
    #[must_use]
    pub fn describe(&self, grammar: &Grammar) -> String {
        let rule = grammar.rule(self.rule);
        let follow = if self.follow.is_empty() {
            "∅".to_string()
        } else {
            self.follow
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!(
            "{} -> {}   {{ {follow} }}",
            grammar.name(rule.head),
            grammar.describe_expansion(&rule.expansion, Some(self.dot))
        )
    }
}

/// Insert `item` into `items`, merging follow sets with an isocore item if present.
///
/// Returns whether `items` changed.
pub(crate) fn insert_item(items: &mut Vec<RuleAt>, item: RuleAt) -> bool {
    if let Some(existing) = items.iter_mut().find(|existing| existing.is_isocore(&item)) {
        let before = existing.follow.len();
        existing.follow.extend(item.follow);
        return existing.follow.len() != before;
    }
    items.push(item);
    true
}
