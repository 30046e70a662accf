use indexmap::IndexMap;

use super::automaton::Automaton;
use super::state::StateAction;
use crate::grammar::{AugmentedSymbol, Lookahead, MatchDescriptor, Nonterminal};

/// An action of the reduced table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableAction {
    /// Push a head in this state
    Shift(usize),
    /// Reduce using the descriptor of this rule
    Reduce(usize),
}

impl From<StateAction> for TableAction {
    fn from(action: StateAction) -> Self {
        match action {
            StateAction::Shift(target) => Self::Shift(target),
            StateAction::Reduce(rule) => Self::Reduce(rule),
        }
    }
}

/// Everything the runtime needs to perform a reduction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReduceAction {
    /// Number of heads to pop
    pub pop_count: usize,
    /// Nonterminal whose goto follows the reduction
    pub reduce_into: Nonterminal,
    /// Capture applied to the merged values
    pub capture: Option<MatchDescriptor>,
}

/// Actions of one table state
pub type TableActions = IndexMap<AugmentedSymbol, TableAction, ahash::RandomState>;

/// A state of the reduced table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReducedState {
    pub(crate) is_accepting: bool,
    pub(crate) actions: TableActions,
}

impl ReducedState {
    /// Create a state
    #[must_use]
    pub const fn new(is_accepting: bool, actions: TableActions) -> Self {
        Self {
            is_accepting,
            actions,
        }
    }

    /// Whether reaching this state accepts the input
    #[must_use]
    pub const fn is_accepting(&self) -> bool {
        self.is_accepting
    }

    /// Actions keyed by symbol
    #[must_use]
    pub const fn actions(&self) -> &TableActions {
        &self.actions
    }
}

/// The parse table: states with their actions, plus a reduce descriptor per rule.
///
/// This is all the runtime needs; the grammar and item sets are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReducedTable {
    pub(crate) states: Vec<ReducedState>,
    pub(crate) reductions: IndexMap<usize, ReduceAction, ahash::RandomState>,
}

impl ReducedTable {
    /// Create a table from parts
    #[must_use]
    pub const fn new(
        states: Vec<ReducedState>,
        reductions: IndexMap<usize, ReduceAction, ahash::RandomState>,
    ) -> Self {
        Self { states, reductions }
    }

    /// Reduce an automaton; every grammar rule gets a reduce descriptor
    #[must_use]
    pub fn from_automaton(automaton: &Automaton) -> Self {
        let grammar = automaton.grammar();
        let states = automaton
            .states()
            .iter()
            .map(|state| {
                ReducedState::new(
                    state.is_accepting(),
                    state
                        .actions()
                        .iter()
                        .map(|(under, action)| (under.clone(), TableAction::from(*action)))
                        .collect(),
                )
            })
            .collect();
        let reductions = grammar
            .rules()
            .iter()
            .map(|rule| {
                (
                    rule.index,
                    ReduceAction {
                        pop_count: rule.expansion.len(),
                        reduce_into: rule.head,
                        capture: grammar.descriptor(rule.head).cloned(),
                    },
                )
            })
            .collect();
        Self { states, reductions }
    }

    /// All states; state `0` is the initial state
    #[must_use]
    pub fn states(&self) -> &[ReducedState] {
        &self.states
    }

    /// A state by index
    #[must_use]
    pub fn state(&self, index: usize) -> Option<&ReducedState> {
        self.states.get(index)
    }

    /// Reduce descriptors keyed by rule index
    #[must_use]
    pub const fn reductions(&self) -> &IndexMap<usize, ReduceAction, ahash::RandomState> {
        &self.reductions
    }

    /// The reduce descriptor of a rule
    #[must_use]
    pub fn reduction(&self, rule: usize) -> Option<&ReduceAction> {
        self.reductions.get(&rule)
    }

    /// The action of `state` under `symbol`
    #[must_use]
    pub fn action(&self, state: usize, symbol: &AugmentedSymbol) -> Option<TableAction> {
        self.states.get(state)?.actions.get(symbol).copied()
    }

    /// The state reached from `state` after reducing into `nt`
    #[must_use]
    pub fn goto(&self, state: usize, nt: Nonterminal) -> Option<usize> {
        match self.action(state, &AugmentedSymbol::Nonterminal(nt))? {
            TableAction::Shift(target) => Some(target),
            TableAction::Reduce(_) => None,
        }
    }

    /// Every terminal `state` has an action for; end of input is never listed
    #[must_use]
    pub fn expected(&self, state: usize) -> Vec<Lookahead> {
        self.states.get(state).map_or_else(Vec::new, |state| {
            state
                .actions
                .keys()
                .filter_map(AugmentedSymbol::as_lookahead)
                .filter(|lookahead| matches!(lookahead, Lookahead::Terminal(_)))
                .collect()
        })
    }

    /// Number of states
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether the table has no states
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;
    use crate::lr::LogVerbosity;

    fn table() -> ReducedTable {
        // S -> "a" X ; X -> "b" | ε
        let mut grammar = Grammar::new();
        let x = grammar.create_nonterminal("X", None);
        grammar.insert_rule(Nonterminal::START, vec!["a".into(), x.into()]);
        grammar.insert_rule(x, vec!["b".into()]);
        grammar.insert_rule(x, vec![]);
        grammar.compute_zeroth();
        let automaton = Automaton::build(grammar, 0, LogVerbosity::Silent).unwrap();
        ReducedTable::from_automaton(&automaton)
    }

    #[test]
    fn test_every_rule_has_a_reduction() {
        let table = table();
        assert_eq!(table.reductions().len(), 3);
        let empty = table.reduction(2).unwrap();
        assert_eq!(empty.pop_count, 0);
        assert_eq!(empty.reduce_into, Nonterminal::new(1));
        assert!(empty.capture.is_none());
    }

    #[test]
    fn test_expected_lists_terminals_only() {
        let table = table();
        assert_eq!(table.expected(0), vec![Lookahead::terminal("a")]);
        let Some(TableAction::Shift(after_a)) = table.action(0, &"a".into()) else {
            panic!("no shift on \"a\"");
        };
        assert!(table.action(after_a, &Lookahead::End.into()).is_some());
        assert_eq!(table.expected(after_a), vec![Lookahead::terminal("b")]);
        assert!(table.goto(after_a, Nonterminal::new(1)).is_some());
    }
}
