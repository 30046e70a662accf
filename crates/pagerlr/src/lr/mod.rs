//! # LR(1) Table Construction
//!
//! Builds the canonical LR(1) automaton of a compiled grammar, merging states with
//! Pager's weak compatibility test as they are created, and reduces it to the table
//! the runtime parses with.
//!
//! States are created from a work list. Each state's closure yields reductions
//! (for complete items, under every follow lookahead) and shifts (items with the dot
//! advanced, grouped by the symbol after the dot). A successor is merged into the
//! first existing state that is weakly compatible with it; if that grows the follow
//! sets of an already processed state, the state is queued and its actions are
//! recomputed. Conflicting actions abort the build with a dump of the automaton.
//! Finally, states no longer reachable through shifts are dropped and the rest are
//! renumbered densely.

mod automaton;
mod config;
mod item;
mod serialize;
mod state;
mod table;

pub use automaton::{Automaton, ConflictAction, GrammarConflict};
pub use config::LogVerbosity;
pub use item::RuleAt;
pub use serialize::{
    MatchTypeTag, MinifiedReduceInfo, MinifiedState, MinifiedTable, MinifiedTransition, ReduceInfo,
    SerializedAction, SerializedState, SerializedTable, Transition,
};
pub use state::{ActionMap, ParserState, StateAction};
pub use table::{ReduceAction, ReducedState, ReducedTable, TableAction, TableActions};

use crate::error::BuildError;
use crate::pattern::{compile_grammar, ClassId, ClassTable, Language};

/// Compile the classes reachable from `root` and build their automaton.
///
/// `classes` must have been collected from the same language and root.
///
/// # Errors
///
/// Returns a [`BuildError`] for malformed patterns and for grammar conflicts.
pub fn generate_automaton(
    language: &Language,
    classes: &ClassTable,
    root: ClassId,
    verbosity: LogVerbosity,
) -> Result<Automaton, BuildError> {
    let compiled = compile_grammar(language, classes, root)?;
    if verbosity.is_verbose() {
        log::debug!(
            "compiled {} rules over {} nonterminals",
            compiled.grammar.rules().len(),
            compiled.grammar.nonterminal_count()
        );
    }
    Automaton::build(compiled.grammar, compiled.start_rule, verbosity)
}
