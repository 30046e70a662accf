use hashbrown::HashMap;
use indexmap::IndexMap;

use super::item::{insert_item, RuleAt};
use crate::grammar::{AugmentedSymbol, Context, Grammar, GrammarSymbol};

/// An action of the automaton
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateAction {
    /// Move to the state with this index
    Shift(usize),
    /// Reduce by the rule with this index
    Reduce(usize),
}

/// Actions of a state, keyed in insertion order
pub type ActionMap = IndexMap<AugmentedSymbol, StateAction, ahash::RandomState>;

/// A state of the LR(1) automaton
#[derive(Debug, Clone)]
pub struct ParserState {
    pub(crate) index: usize,
    pub(crate) kernel: Vec<RuleAt>,
    pub(crate) actions: ActionMap,
    pub(crate) is_accepting: bool,
    pub(crate) example_lane: Vec<AugmentedSymbol>,
}

impl ParserState {
    /// Create a state from kernel items, merging isocore items
    #[must_use]
    pub fn new(kernel: impl IntoIterator<Item = RuleAt>, example_lane: Vec<AugmentedSymbol>) -> Self {
        let mut state = Self {
            index: 0,
            kernel: Vec::new(),
            actions: ActionMap::default(),
            is_accepting: false,
            example_lane,
        };
        for item in kernel {
            state.insert(item);
        }
        state
    }

    /// Add a kernel item, keeping the kernel in canonical order
    pub fn insert(&mut self, item: RuleAt) -> bool {
        let changed = insert_item(&mut self.kernel, item);
        self.kernel.sort_by(RuleAt::compare);
        changed
    }

    /// Index of the state in its automaton
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Kernel items in canonical order
    #[must_use]
    pub fn kernel(&self) -> &[RuleAt] {
        &self.kernel
    }

    /// Actions keyed by symbol
    #[must_use]
    pub const fn actions(&self) -> &ActionMap {
        &self.actions
    }

    /// Whether reaching this state accepts the input
    #[must_use]
    pub const fn is_accepting(&self) -> bool {
        self.is_accepting
    }

    /// The symbols shifted on the first path that created this state
    #[must_use]
    pub fn example_lane(&self) -> &[AugmentedSymbol] {
        &self.example_lane
    }

    /// Whether actions have been computed for this state
    #[must_use]
    pub fn is_populated(&self) -> bool {
        !self.actions.is_empty()
    }

    /// The kernel plus every item derived from a nonterminal after a dot, with
    /// follow sets propagated to a fixed point. Sorted canonically.
    #[must_use]
    pub fn closure(&self, grammar: &Grammar) -> Vec<RuleAt> {
        let mut items = self.kernel.clone();
        let mut positions: HashMap<(usize, usize), usize, ahash::RandomState> = items
            .iter()
            .enumerate()
            .map(|(position, item)| (item.core(), position))
            .collect();

        let mut changed = true;
        while changed {
            changed = false;
            let mut i = 0;
            while i < items.len() {
                if let Some(GrammarSymbol::Nonterminal(nt)) = items[i].at(grammar) {
                    let follow = items[i].follow_at(grammar);
                    for &rule in grammar.rules_for(*nt) {
                        if let Some(&position) = positions.get(&(rule, 0)) {
                            let target = &mut items[position].follow;
                            let before = target.len();
                            target.extend(follow.iter().cloned());
                            changed |= target.len() != before;
                        } else {
                            positions.insert((rule, 0), items.len());
                            items.push(RuleAt::new(rule, 0, follow.clone()));
                        }
                    }
                }
                i += 1;
            }
        }

        items.sort_by(RuleAt::compare);
        items
    }

    /// Whether both kernels hold the same cores in the same order
    #[must_use]
    pub fn is_isocore(&self, other: &Self) -> bool {
        self.kernel.len() == other.kernel.len()
            && self
                .kernel
                .iter()
                .zip(&other.kernel)
                .all(|(a, b)| a.is_isocore(b))
    }

    /// Pager's weak compatibility test.
    ///
    /// Two isocore states with follow sets `a` and `b` are compatible when for every
    /// pair of kernel positions `i < j` either no cross conflict can arise
    /// (`a[i] ∩ b[j]` and `a[j] ∩ b[i]` are empty) or one of the states already has
    /// overlapping follows at those positions (`a[i] ∩ a[j]` or `b[i] ∩ b[j]` is not
    /// empty).
    #[must_use]
    pub fn is_weakly_compatible(&self, other: &Self) -> bool {
        if !self.is_isocore(other) {
            return false;
        }
        let n = self.kernel.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let (ai, aj) = (&self.kernel[i].follow, &self.kernel[j].follow);
                let (bi, bj) = (&other.kernel[i].follow, &other.kernel[j].follow);
                let cross_clean = !meets(ai, bj) && !meets(aj, bi);
                if !(cross_clean || meets(ai, aj) || meets(bi, bj)) {
                    return false;
                }
            }
        }
        true
    }

    /// Union the follow sets of an isocore state into this one, position-wise.
    ///
    /// Returns whether any follow set grew.
    pub fn merge_follows(&mut self, other: &Self) -> bool {
        let mut changed = false;
        for (mine, theirs) in self.kernel.iter_mut().zip(&other.kernel) {
            let before = mine.follow.len();
            mine.follow.extend(theirs.follow.iter().cloned());
            changed |= mine.follow.len() != before;
        }
        changed
    }
}

fn meets(a: &Context, b: &Context) -> bool {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().any(|symbol| large.contains(symbol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Lookahead, Nonterminal};

    fn context(terminals: &[&str]) -> Context {
        terminals.iter().map(|t| Lookahead::terminal(*t)).collect()
    }

    fn two_item_state(first: &[&str], second: &[&str]) -> ParserState {
        ParserState::new(
            [RuleAt::new(1, 1, context(first)), RuleAt::new(2, 1, context(second))],
            Vec::new(),
        )
    }

    #[test]
    fn test_disjoint_cross_follows_are_compatible() {
        let a = two_item_state(&["a"], &["b"]);
        let b = two_item_state(&["a"], &["b"]);
        assert!(a.is_weakly_compatible(&b));
    }

    #[test]
    fn test_cross_conflict_is_incompatible() {
        // merging would put "a" into both follow sets
        let a = two_item_state(&["a"], &["b"]);
        let b = two_item_state(&["b"], &["a"]);
        assert!(!a.is_weakly_compatible(&b));
        assert!(!b.is_weakly_compatible(&a));
    }

    #[test]
    fn test_existing_overlap_is_compatible() {
        let a = two_item_state(&["a", "c"], &["c"]);
        let b = two_item_state(&["b"], &["a"]);
        assert!(a.is_weakly_compatible(&b));
    }

    #[test]
    fn test_different_cores_are_incompatible() {
        let a = two_item_state(&["a"], &["b"]);
        let b = ParserState::new([RuleAt::new(1, 1, context(&["a"]))], Vec::new());
        assert!(!a.is_weakly_compatible(&b));
    }

    #[test]
    fn test_merge_follows_reports_growth() {
        let mut a = two_item_state(&["a"], &["b"]);
        let b = two_item_state(&["a"], &["c"]);
        assert!(a.merge_follows(&b));
        assert!(!a.merge_follows(&b));
        assert_eq!(a.kernel()[1].follow, context(&["b", "c"]));
    }

    #[test]
    fn test_closure_propagates_follows() {
        // S -> A ; A -> B "x" | "y" ; B -> "b"
        let mut grammar = Grammar::new();
        let a = grammar.create_nonterminal("A", None);
        let b = grammar.create_nonterminal("B", None);
        grammar.insert_rule(Nonterminal::START, vec![a.into()]);
        grammar.insert_rule(a, vec![b.into(), "x".into()]);
        grammar.insert_rule(a, vec!["y".into()]);
        grammar.insert_rule(b, vec!["b".into()]);
        grammar.compute_zeroth();

        let state = ParserState::new(
            [RuleAt::new(0, 0, std::iter::once(Lookahead::End).collect())],
            Vec::new(),
        );
        let closure = state.closure(&grammar);
        let cores: Vec<_> = closure.iter().map(RuleAt::core).collect();
        assert_eq!(cores, [(0, 0), (1, 0), (2, 0), (3, 0)]);
        assert_eq!(closure[3].follow, context(&["x"]));
        assert_eq!(closure[1].follow, std::iter::once(Lookahead::End).collect::<Context>());
    }
}
