//! Tests for grammar compilation and automaton construction

use pagerlr::error::BuildError;
use pagerlr::grammar::{Grammar, GrammarSymbol, Lookahead, Nonterminal};
use pagerlr::lr::{generate_automaton, Automaton, LogVerbosity, ReducedTable, TableAction};
use pagerlr::pattern::{ClassTable, Language, Pattern};

fn build(grammar: Grammar) -> Result<Automaton, BuildError> {
    Automaton::build(grammar, 0, LogVerbosity::Silent)
}

fn t(terminal: &str) -> GrammarSymbol {
    GrammarSymbol::from(terminal)
}

/// S -> "a" A "x" | "b" A "y" ; A -> "c"
fn mergeable() -> (Grammar, Nonterminal) {
    let mut grammar = Grammar::new();
    let s = grammar.create_nonterminal("S", None);
    let a = grammar.create_nonterminal("A", None);
    grammar.insert_rule(Nonterminal::START, vec![s.into()]);
    grammar.insert_rule(s, vec![t("a"), a.into(), t("x")]);
    grammar.insert_rule(s, vec![t("b"), a.into(), t("y")]);
    grammar.insert_rule(a, vec![t("c")]);
    grammar.compute_zeroth();
    (grammar, a)
}

#[test]
fn test_compatible_states_are_merged() {
    let (grammar, _) = mergeable();
    let automaton = build(grammar).unwrap();
    assert_eq!(automaton.states().len(), 9);

    let after_c: Vec<_> = automaton
        .states()
        .iter()
        .filter(|state| state.kernel().iter().any(|item| item.rule == 3 && item.dot == 1))
        .collect();
    assert_eq!(after_c.len(), 1);
    let follow: Vec<_> = after_c[0].kernel()[0].follow.iter().cloned().collect();
    assert_eq!(follow, [Lookahead::terminal("x"), Lookahead::terminal("y")]);
}

#[test]
fn test_conflicting_states_stay_apart() {
    // S -> "a" E "c" | "a" F "d" | "b" F "c" | "b" E "d" ; E -> "e" ; F -> "e"
    let mut grammar = Grammar::new();
    let s = grammar.create_nonterminal("S", None);
    let e = grammar.create_nonterminal("E", None);
    let f = grammar.create_nonterminal("F", None);
    grammar.insert_rule(Nonterminal::START, vec![s.into()]);
    grammar.insert_rule(s, vec![t("a"), e.into(), t("c")]);
    grammar.insert_rule(s, vec![t("a"), f.into(), t("d")]);
    grammar.insert_rule(s, vec![t("b"), f.into(), t("c")]);
    grammar.insert_rule(s, vec![t("b"), e.into(), t("d")]);
    let reduce_e = grammar.insert_rule(e, vec![t("e")]);
    grammar.insert_rule(f, vec![t("e")]);
    grammar.compute_zeroth();

    let automaton = build(grammar).unwrap();
    let after_e = automaton
        .states()
        .iter()
        .filter(|state| state.kernel().iter().any(|item| item.rule == reduce_e && item.dot == 1))
        .count();
    assert_eq!(after_e, 2);
}

#[test]
fn test_exactly_one_accepting_state() {
    let (grammar, _) = mergeable();
    let automaton = build(grammar).unwrap();
    let accepting: Vec<_> = automaton
        .states()
        .iter()
        .filter(|state| state.is_accepting())
        .collect();
    assert_eq!(accepting.len(), 1);
    assert_eq!(accepting[0].kernel()[0].rule, automaton.start_rule());
}

#[test]
fn test_states_are_numbered_densely() {
    let (grammar, _) = mergeable();
    let automaton = build(grammar).unwrap();
    for (index, state) in automaton.states().iter().enumerate() {
        assert_eq!(state.index(), index);
    }
}

#[test]
fn test_reduced_table_follows_automaton() {
    let (grammar, a) = mergeable();
    let automaton = build(grammar).unwrap();
    let table = ReducedTable::from_automaton(&automaton);
    assert_eq!(table.len(), automaton.states().len());

    let Some(TableAction::Shift(after_a)) = table.action(0, &"a".into()) else {
        panic!("state 0 must shift \"a\"");
    };
    assert!(table.goto(after_a, a).is_some());
    assert_eq!(table.expected(after_a), [Lookahead::terminal("c")]);

    let reduce = table.reduction(3).unwrap();
    assert_eq!(reduce.pop_count, 1);
    assert_eq!(reduce.reduce_into, a);
    assert!(reduce.capture.is_none());
}

#[test]
fn test_ambiguous_grammar_reports_conflict() {
    // S -> E ; E -> E "+" E | "n"
    let mut grammar = Grammar::new();
    let e = grammar.create_nonterminal("E", None);
    grammar.insert_rule(Nonterminal::START, vec![e.into()]);
    grammar.insert_rule(e, vec![e.into(), t("+"), e.into()]);
    grammar.insert_rule(e, vec![t("n")]);
    grammar.compute_zeroth();

    let error = build(grammar).unwrap_err();
    let BuildError::Conflict {
        symbol,
        existing,
        incoming,
        ..
    } = error
    else {
        panic!("expected a conflict, got {error:?}");
    };
    assert_eq!(symbol, "\"+\"");
    let actions = [existing, incoming];
    assert!(actions.iter().any(|action| action.contains("transition")));
    assert!(actions.iter().any(|action| action.contains("E -> E \"+\" E")));
}

#[test]
fn test_nullable_symbols() {
    // S -> L "end" ; L -> ε | L "x"
    let mut grammar = Grammar::new();
    let l = grammar.create_nonterminal("L", None);
    grammar.insert_rule(Nonterminal::START, vec![l.into(), t("end")]);
    grammar.insert_rule(l, vec![]);
    grammar.insert_rule(l, vec![l.into(), t("x")]);
    grammar.compute_zeroth();

    let zeroth: Vec<_> = grammar.zeroth(l).unwrap().iter().cloned().collect();
    assert!(zeroth.contains(&Lookahead::End));
    assert!(zeroth.contains(&Lookahead::terminal("x")));
    let start: Vec<_> = grammar.zeroth(Nonterminal::START).unwrap().iter().cloned().collect();
    assert_eq!(start.len(), 2);
    assert!(!start.contains(&Lookahead::End));

    assert!(build(grammar).is_ok());
}

#[test]
fn test_describe_grammar() {
    let (grammar, a) = mergeable();
    assert_eq!(grammar.name(a), "A");
    assert_eq!(grammar.describe_rule(1), "S -> \"a\" A \"x\"");
    assert_eq!(grammar.describe_expansion(&grammar.rule(1).expansion, Some(1)), "\"a\" • A \"x\"");
    assert_eq!(grammar.describe_expansion(&[], None), "ε");
    assert!(grammar.to_string().contains("A -> \"c\""));
}

#[test]
fn test_dump_lists_states() {
    let (grammar, _) = mergeable();
    let automaton = build(grammar).unwrap();
    let dump = automaton.dump(None);
    assert!(dump.starts_with("Grammar:"));
    assert!(dump.contains("9 states"));
}

#[test]
fn test_automaton_from_language() {
    let mut language = Language::new();
    let item = language.class("Item", Pattern::capture("name", "x"));
    let root = language.class(
        "List",
        Pattern::caten(["[".into(), Pattern::repeat(Pattern::capture_arr("items", item)), "]".into()]),
    );
    let classes = ClassTable::collect(&language, root).unwrap();
    let automaton = generate_automaton(&language, &classes, root, LogVerbosity::Silent).unwrap();
    let grammar = automaton.grammar();
    assert_eq!(grammar.rule(automaton.start_rule()).head, Nonterminal::START);
    let captured: Vec<_> = (0..grammar.nonterminal_count())
        .filter_map(|index| grammar.descriptor(Nonterminal::new(index as u32)))
        .map(|descriptor| descriptor.prop.as_str())
        .collect();
    assert_eq!(captured, ["root", "items", "name"]);
}
