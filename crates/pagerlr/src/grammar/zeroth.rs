//! Zeroth (FIRST) sets.
//!
//! The zeroth set of a nonterminal holds every terminal that can begin one of its
//! derivations, plus [`Lookahead::End`] when it derives the empty string.

use super::{end_context, Context, GrammarRule, GrammarSymbol, Lookahead};

/// Zeroth set of `sequence[start..]` followed by `follow`.
///
/// Walks the sequence left to right: a terminal ends the walk, a nonterminal
/// contributes its zeroth set without the end marker and ends the walk unless it is
/// nullable. When the whole suffix is nullable, `follow` is added.
#[must_use]
pub fn zeroth_of_sequence(
    zeroth: &[Context],
    sequence: &[GrammarSymbol],
    follow: &Context,
    start: usize,
) -> Context {
    let mut context = Context::default();
    for symbol in sequence.iter().skip(start) {
        match symbol {
            GrammarSymbol::Terminal(terminal) => {
                context.insert(Lookahead::Terminal(terminal.clone()));
                return context;
            }
            GrammarSymbol::Nonterminal(nt) => {
                let Some(first) = zeroth.get(nt.index()) else {
                    return context;
                };
                context.extend(first.iter().filter(|s| **s != Lookahead::End).cloned());
                if !first.contains(&Lookahead::End) {
                    return context;
                }
            }
        }
    }
    context.extend(follow.iter().cloned());
    context
}

/// Grow `zeroth` until no rule adds a symbol
pub(crate) fn compute_zeroth(rules: &[GrammarRule], zeroth: &mut [Context]) {
    let nullable = end_context();
    let mut changed = true;
    while changed {
        changed = false;
        for rule in rules {
            let computed = zeroth_of_sequence(zeroth, &rule.expansion, &nullable, 0);
            if let Some(current) = zeroth.get_mut(rule.head.index()) {
                for symbol in computed {
                    changed |= current.insert(symbol);
                }
            }
        }
    }
}
