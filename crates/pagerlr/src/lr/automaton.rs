use std::fmt::{self, Write};

use hashbrown::HashMap;
use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;

use super::config::LogVerbosity;
use super::item::RuleAt;
use super::state::{ParserState, StateAction};
use crate::error::BuildError;
use crate::grammar::{end_context, AugmentedSymbol, Grammar};

/// Progress is logged each time this many states have been created
const PROGRESS_INTERVAL: usize = 128;

/// One side of a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictAction {
    /// A shift, to a known state or to one not created yet
    Shift(Option<usize>),
    /// A reduction by a rule
    Reduce(usize),
}

impl From<StateAction> for ConflictAction {
    fn from(action: StateAction) -> Self {
        match action {
            StateAction::Shift(target) => Self::Shift(Some(target)),
            StateAction::Reduce(rule) => Self::Reduce(rule),
        }
    }
}

impl ConflictAction {
    fn describe(self, grammar: &Grammar) -> String {
        match self {
            Self::Shift(Some(target)) => format!("a transition to state {target}"),
            Self::Shift(None) => "a transition to a new state".to_string(),
            Self::Reduce(rule) => format!(
                "a reduction by rule {rule} ({})",
                grammar.describe_rule(rule)
            ),
        }
    }
}

/// Two actions required in one state under one symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarConflict {
    /// State in which the conflict was found
    pub state: usize,
    /// The symbol both actions are keyed on
    pub under: AugmentedSymbol,
    /// The action already present
    pub existing: ConflictAction,
    /// The action that could not be added
    pub incoming: ConflictAction,
}

impl GrammarConflict {
    fn into_build_error(self, grammar: &Grammar) -> BuildError {
        BuildError::Conflict {
            state: self.state,
            symbol: grammar.describe(&self.under),
            existing: self.existing.describe(grammar),
            incoming: self.incoming.describe(grammar),
        }
    }
}

/// The LR(1) automaton of a grammar, with weakly compatible states merged.
#[derive(Debug, Clone)]
pub struct Automaton {
    grammar: Grammar,
    states: Vec<ParserState>,
    start_rule: usize,
}

impl Automaton {
    /// Build the automaton of `grammar`, whose start rule has index `start_rule`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Conflict`] when the grammar is not LR(1) after merging.
    pub fn build(
        grammar: Grammar,
        start_rule: usize,
        verbosity: LogVerbosity,
    ) -> Result<Self, BuildError> {
        let mut builder = AutomatonBuilder {
            grammar: &grammar,
            start_rule,
            states: Vec::new(),
            by_core: HashMap::default(),
            to_regenerate: IndexSet::default(),
            verbosity,
        };
        builder.insert(ParserState::new(
            [RuleAt::new(start_rule, 0, end_context())],
            Vec::new(),
        ));
        let result = builder.generate_states();
        let states = builder.states;

        let automaton = Self {
            grammar,
            states,
            start_rule,
        };
        match result {
            Ok(()) => {
                if verbosity.is_verbose() {
                    log::info!("{}", automaton.dump(None));
                }
                Ok(automaton)
            }
            Err(conflict) => {
                if verbosity.reports_problems() {
                    log::error!("{}", automaton.dump(Some(&conflict)));
                }
                Err(conflict.into_build_error(&automaton.grammar))
            }
        }
    }

    /// The grammar the automaton was built from
    #[must_use]
    pub const fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// States, densely numbered; state `0` is the initial state
    #[must_use]
    pub fn states(&self) -> &[ParserState] {
        &self.states
    }

    /// Index of the start rule
    #[must_use]
    pub const fn start_rule(&self) -> usize {
        self.start_rule
    }

    /// Render the grammar, every state and the table size.
    ///
    /// When a conflict is given, its state is rendered again at the end with the
    /// conflicting actions.
    #[must_use]
    pub fn dump(&self, conflict: Option<&GrammarConflict>) -> String {
        let mut out = String::new();
        // writing to a String cannot fail
        let _ = self.write_dump(&mut out, conflict);
        out
    }

    fn write_dump(&self, out: &mut String, conflict: Option<&GrammarConflict>) -> fmt::Result {
        writeln!(out, "Grammar:")?;
        write!(out, "{}", self.grammar)?;
        writeln!(out)?;
        for state in &self.states {
            self.write_state(out, state)?;
        }
        let actions: usize = self.states.iter().map(|state| state.actions.len()).sum();
        writeln!(
            out,
            "{} rules, {} states, {} actions",
            self.grammar.rules().len(),
            self.states.len(),
            actions
        )?;
        if let Some(conflict) = conflict {
            writeln!(
                out,
                "Conflict in state {} under {}: {} conflicts with {}",
                conflict.state,
                self.grammar.describe(&conflict.under),
                conflict.existing.describe(&self.grammar),
                conflict.incoming.describe(&self.grammar),
            )?;
            if let Some(state) = self.states.get(conflict.state) {
                self.write_state(out, state)?;
            }
        }
        Ok(())
    }

    fn write_state(&self, out: &mut String, state: &ParserState) -> fmt::Result {
        let lane: Vec<_> = state
            .example_lane
            .iter()
            .map(|symbol| self.grammar.describe(symbol))
            .collect();
        writeln!(
            out,
            "State {}{} (lane: {})",
            state.index,
            if state.is_accepting { ", accepting" } else { "" },
            if lane.is_empty() { "ε".to_string() } else { lane.join(" ") }
        )?;
        for item in state.closure(&self.grammar) {
            writeln!(out, "    {}", item.describe(&self.grammar))?;
        }
        for (under, action) in &state.actions {
            let action = match action {
                StateAction::Shift(target) => format!("go to {target}"),
                StateAction::Reduce(rule) => format!("reduce by rule {rule}"),
            };
            writeln!(out, "  {} => {action}", self.grammar.describe(under))?;
        }
        Ok(())
    }
}

type Core = SmallVec<[(usize, usize); 4]>;

/// Where the items shifted under one symbol are collected
type PendingStates = IndexMap<AugmentedSymbol, ParserState, ahash::RandomState>;

struct AutomatonBuilder<'g> {
    grammar: &'g Grammar,
    start_rule: usize,
    states: Vec<ParserState>,
    // states sharing a core, in creation order
    by_core: HashMap<Core, SmallVec<[usize; 2]>, ahash::RandomState>,
    // populated states whose follows grew after their actions were computed
    to_regenerate: IndexSet<usize, ahash::RandomState>,
    verbosity: LogVerbosity,
}

impl AutomatonBuilder<'_> {
    fn generate_states(&mut self) -> Result<(), GrammarConflict> {
        let mut i = 0;
        while i < self.states.len() {
            self.add_states(i)?;
            while let Some(state) = self.to_regenerate.pop() {
                self.add_states(state)?;
            }
            i += 1;
        }
        self.remove_unreachable();
        Ok(())
    }

    /// Add `state`, or merge it into the first weakly compatible state.
    ///
    /// Returns the index of the state that now holds the items.
    fn insert(&mut self, mut state: ParserState) -> usize {
        let core: Core = state.kernel.iter().map(RuleAt::core).collect();
        if let Some(candidates) = self.by_core.get(&core) {
            let found = candidates
                .iter()
                .copied()
                .find(|&index| self.states[index].is_weakly_compatible(&state));
            if let Some(index) = found {
                let existing = &mut self.states[index];
                if existing.merge_follows(&state) && existing.is_populated() {
                    self.to_regenerate.insert(index);
                }
                return index;
            }
        }

        let index = self.states.len();
        state.index = index;
        state.is_accepting = state
            .kernel
            .iter()
            .any(|item| item.rule == self.start_rule && item.dot == 1);
        self.by_core.entry(core).or_default().push(index);
        self.states.push(state);

        if self.verbosity.is_verbose() && self.states.len() % PROGRESS_INTERVAL == 0 {
            log::debug!("{} states created", self.states.len());
        }
        index
    }

    /// Compute the actions of a state, creating or merging its successors.
    ///
    /// Follow sets only grow, so recomputing the actions of a populated state keeps
    /// its old reductions valid and replaces its shift targets.
    fn add_states(&mut self, id: usize) -> Result<(), GrammarConflict> {
        let grammar = self.grammar;
        let items = self.states[id].closure(grammar);
        let mut pending = PendingStates::default();

        for item in items {
            match item.at(grammar) {
                None => {
                    for lookahead in &item.follow {
                        let under = AugmentedSymbol::from(lookahead.clone());
                        self.set_reduce(id, under, item.rule, &pending)?;
                    }
                }
                Some(symbol) => {
                    let under = AugmentedSymbol::from(symbol.clone());
                    if let Some(&StateAction::Reduce(rule)) = self.states[id].actions.get(&under) {
                        return Err(GrammarConflict {
                            state: id,
                            under,
                            existing: ConflictAction::Reduce(rule),
                            incoming: ConflictAction::Shift(None),
                        });
                    }
                    let lane = &self.states[id].example_lane;
                    pending
                        .entry(under.clone())
                        .or_insert_with(|| {
                            let mut lane = lane.clone();
                            lane.push(under);
                            ParserState::new([], lane)
                        })
                        .insert(item.shift());
                }
            }
        }

        for (under, state) in pending {
            let target = self.insert(state);
            self.states[id]
                .actions
                .insert(under, StateAction::Shift(target));
        }
        Ok(())
    }

    fn set_reduce(
        &mut self,
        id: usize,
        under: AugmentedSymbol,
        rule: usize,
        pending: &PendingStates,
    ) -> Result<(), GrammarConflict> {
        if pending.contains_key(&under) {
            return Err(GrammarConflict {
                state: id,
                under,
                existing: ConflictAction::Shift(None),
                incoming: ConflictAction::Reduce(rule),
            });
        }
        let actions = &mut self.states[id].actions;
        match actions.get(&under) {
            None => {
                actions.insert(under, StateAction::Reduce(rule));
                Ok(())
            }
            Some(StateAction::Reduce(existing)) if *existing == rule => Ok(()),
            Some(&existing) => Err(GrammarConflict {
                state: id,
                under,
                existing: existing.into(),
                incoming: ConflictAction::Reduce(rule),
            }),
        }
    }

    /// Drop states no shift reaches from state 0 and renumber the rest densely
    fn remove_unreachable(&mut self) {
        let mut reachable = vec![false; self.states.len()];
        let mut stack = vec![0];
        if let Some(initial) = reachable.first_mut() {
            *initial = true;
        }
        while let Some(index) = stack.pop() {
            for action in self.states[index].actions.values() {
                if let StateAction::Shift(target) = *action {
                    if !reachable[target] {
                        reachable[target] = true;
                        stack.push(target);
                    }
                }
            }
        }

        let removed = reachable.iter().filter(|r| !**r).count();
        if removed == 0 {
            return;
        }
        if self.verbosity.is_verbose() {
            log::debug!("removing {removed} unreachable states");
        }

        let mut remap = vec![None; self.states.len()];
        let states = std::mem::take(&mut self.states);
        for (old, state) in states.into_iter().enumerate() {
            if reachable[old] {
                remap[old] = Some(self.states.len());
                self.states.push(state);
            }
        }
        for (index, state) in self.states.iter_mut().enumerate() {
            state.index = index;
            for action in state.actions.values_mut() {
                if let StateAction::Shift(target) = action {
                    if let Some(new_target) = remap[*target] {
                        *target = new_target;
                    }
                }
            }
        }
        self.by_core.clear();
    }
}
