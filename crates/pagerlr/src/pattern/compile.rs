//! Lowering of patterns to grammar rules.

use std::collections::VecDeque;

use compact_str::{format_compact, CompactString};
use hashbrown::HashMap;

use super::{
    ClassId, ClassTable, Language, Match, MatchTarget, NodeClass, Or, Pattern, PatternId, Repeat,
    TrailingDelimiter,
};
use crate::error::BuildError;
use crate::grammar::{Grammar, GrammarSymbol, MatchDescriptor, MatchKind, Nonterminal};

/// A grammar together with the index of its start rule
#[derive(Debug, Clone)]
pub(crate) struct CompiledGrammar {
    pub(crate) grammar: Grammar,
    pub(crate) start_rule: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CacheKey {
    Pattern(PatternId),
    Class(ClassId),
}

/// Compile the classes reachable from `root` into a grammar.
///
/// The start rule is `(starting symbol) -> root`, where `root` captures the root
/// class into the `root` field.
pub(crate) fn compile_grammar(
    language: &Language,
    classes: &ClassTable,
    root: ClassId,
) -> Result<CompiledGrammar, BuildError> {
    let root_match = Match::new("root", root);
    let mut compiler = PatternCompiler {
        language,
        classes,
        root_match: root_match.id,
        grammar: Grammar::new(),
        cache: HashMap::default(),
        pending: VecDeque::new(),
    };
    let root_nt = compiler.lower_match(&root_match, "root")?;
    let start_rule = compiler
        .grammar
        .insert_rule(Nonterminal::START, vec![root_nt.into()]);
    compiler.drain_classes()?;

    let mut grammar = compiler.grammar;
    grammar.compute_zeroth();
    Ok(CompiledGrammar {
        grammar,
        start_rule,
    })
}

struct PatternCompiler<'a> {
    language: &'a Language,
    classes: &'a ClassTable,
    root_match: PatternId,
    grammar: Grammar,
    cache: HashMap<CacheKey, Nonterminal, ahash::RandomState>,
    // class bodies are compiled after the pattern that first reached them
    pending: VecDeque<(ClassId, Nonterminal)>,
}

impl PatternCompiler<'_> {
    fn lower(&mut self, pattern: &Pattern, ctx: &str) -> Result<Vec<GrammarSymbol>, BuildError> {
        match pattern {
            Pattern::Literal(terminal) => Ok(vec![GrammarSymbol::Terminal(terminal.clone())]),
            Pattern::Caten(items) => {
                let mut sequence = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    sequence.extend(self.lower(item, &format!("{ctx}.Caten[{i}]"))?);
                }
                Ok(sequence)
            }
            Pattern::Or(or) => Ok(vec![self.lower_or(or, ctx)?.into()]),
            Pattern::Repeat(repeat) => Ok(vec![self.lower_repeat(repeat, ctx)?.into()]),
            Pattern::Match(m) => Ok(vec![self.lower_match(m, ctx)?.into()]),
        }
    }

    fn lower_into(&mut self, pattern: &Pattern, ctx: &str, nt: Nonterminal) -> Result<(), BuildError> {
        let expansion = self.lower(pattern, ctx)?;
        self.grammar.insert_rule(nt, expansion);
        Ok(())
    }

    /// The nonterminal already created for a combinator, if reuse is allowed
    fn cached(
        &self,
        id: PatternId,
        named: bool,
        combinator: &'static str,
        ctx: &str,
    ) -> Result<Option<Nonterminal>, BuildError> {
        match self.cache.get(&CacheKey::Pattern(id)) {
            Some(&nt) if named => Ok(Some(nt)),
            Some(_) => Err(BuildError::UnnamedReuse {
                combinator,
                context: ctx.to_string(),
            }),
            None => Ok(None),
        }
    }

    fn lower_or(&mut self, or: &Or, ctx: &str) -> Result<Nonterminal, BuildError> {
        if let Some(nt) = self.cached(or.id, or.name.is_some(), "Or", ctx)? {
            return Ok(nt);
        }
        let name = or.name.clone().unwrap_or_else(|| format_compact!("{ctx}.Or"));
        let nt = self.grammar.create_nonterminal(name.clone(), None);
        self.cache.insert(CacheKey::Pattern(or.id), nt);
        for (i, branch) in or.branches.iter().enumerate() {
            self.lower_into(branch, &format!("{name}[{i}]"), nt)?;
        }
        Ok(nt)
    }

    fn lower_repeat(&mut self, repeat: &Repeat, ctx: &str) -> Result<Nonterminal, BuildError> {
        if let Some(nt) = self.cached(repeat.id, repeat.name.is_some(), "Repeat", ctx)? {
            return Ok(nt);
        }
        let name = repeat
            .name
            .clone()
            .unwrap_or_else(|| format_compact!("{ctx}.Repeat"));
        let nt = self.grammar.create_nonterminal(name.clone(), None);
        self.cache.insert(CacheKey::Pattern(repeat.id), nt);

        let lower = repeat.lower_bound;
        if repeat.upper_bound.is_some_and(|upper| upper == 0 || upper <= lower) {
            return Ok(nt);
        }

        let item = self.lower(&repeat.pattern, &format!("{name}['pattern']"))?;
        let delimiter = self.lower(&repeat.delimiter, &format!("{name}['delimiter']"))?;
        let trailing = match &repeat.trailing {
            TrailingDelimiter::Forbidden => None,
            TrailingDelimiter::SameAsDelimiter => Some(delimiter.clone()),
            TrailingDelimiter::Pattern(pattern) => {
                Some(self.lower(pattern, &format!("{name}['trailingDelimiter']"))?)
            }
        };

        if lower == 0 {
            self.grammar.insert_rule(nt, Vec::new());
        }

        match repeat.upper_bound {
            Some(upper) => {
                let mut expansion = item.clone();
                for count in 1..upper {
                    if lower <= count {
                        self.grammar.insert_rule(nt, expansion.clone());
                        if let Some(trailing) = &trailing {
                            let mut with_trailing = expansion.clone();
                            with_trailing.extend(trailing.iter().cloned());
                            self.grammar.insert_rule(nt, with_trailing);
                        }
                    }
                    expansion.extend(delimiter.iter().cloned());
                    expansion.extend(item.iter().cloned());
                }
            }
            None => {
                let inner = self
                    .grammar
                    .create_nonterminal(format_compact!("{name}['innerLoop']"), None);
                let mut prefix = item.clone();
                for _ in 1..lower {
                    prefix.extend(delimiter.iter().cloned());
                    prefix.extend(item.iter().cloned());
                }
                prefix.push(inner.into());
                self.grammar.insert_rule(nt, prefix);

                self.grammar.insert_rule(inner, Vec::new());
                let mut step = delimiter;
                step.extend(item);
                step.push(inner.into());
                self.grammar.insert_rule(inner, step);
                if let Some(trailing) = trailing {
                    self.grammar.insert_rule(inner, trailing);
                }
            }
        }
        Ok(nt)
    }

    fn lower_match(&mut self, m: &Match, ctx: &str) -> Result<Nonterminal, BuildError> {
        let combinator = if m.is_array { "MatchArr" } else { "Match" };
        let target = m.target().ok_or_else(|| BuildError::UninitializedMatch {
            context: ctx.to_string(),
        })?;
        if let Some(nt) = self.cached(m.id, m.name.is_some(), combinator, ctx)? {
            return Ok(nt);
        }

        if let MatchTarget::Class(class) = target {
            let class = self.class(*class)?;
            if !m.is_array && m.id != self.root_match && class.captures_array_value() {
                return Err(BuildError::HiddenArrayScalarCapture {
                    class: class.name.clone(),
                });
            }
        }

        let name = m
            .name
            .clone()
            .unwrap_or_else(|| format_compact!("{ctx}.{combinator}"));
        let descriptor = m.prop.as_ref().map(|prop| MatchDescriptor {
            is_array: m.is_array,
            prop: prop.clone(),
            kind: match target {
                MatchTarget::Class(class) => MatchKind::TypedNode(*class),
                MatchTarget::Pattern(Pattern::Literal(_)) => MatchKind::Token,
                MatchTarget::Pattern(_) => MatchKind::RawSpan,
            },
        });
        let nt = self.grammar.create_nonterminal(name.clone(), descriptor);
        self.cache.insert(CacheKey::Pattern(m.id), nt);

        match target {
            MatchTarget::Pattern(pattern) => self.lower_into(pattern, &name, nt)?,
            MatchTarget::Class(class) => {
                let class_nt = self.class_nonterminal(*class)?;
                self.grammar.insert_rule(nt, vec![class_nt.into()]);
            }
        }
        Ok(nt)
    }

    fn class(&self, id: ClassId) -> Result<&NodeClass, BuildError> {
        self.classes.get(id).ok_or_else(|| BuildError::UndefinedClass {
            name: self
                .language
                .name(id)
                .map_or_else(|| format_compact!("{id}"), CompactString::new),
        })
    }

    /// The nonterminal of a class, queueing its body on first use
    fn class_nonterminal(&mut self, id: ClassId) -> Result<Nonterminal, BuildError> {
        if let Some(&nt) = self.cache.get(&CacheKey::Class(id)) {
            return Ok(nt);
        }
        let name = self.class(id)?.name.clone();
        let nt = self.grammar.create_nonterminal(name, None);
        self.cache.insert(CacheKey::Class(id), nt);
        self.pending.push_back((id, nt));
        Ok(nt)
    }

    fn drain_classes(&mut self) -> Result<(), BuildError> {
        let language = self.language;
        while let Some((id, nt)) = self.pending.pop_front() {
            let name = self.class(id)?.name.clone();
            let pattern = language
                .pattern(id)
                .ok_or_else(|| BuildError::UndefinedClass { name: name.clone() })?;
            self.lower_into(pattern, &name, nt)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarRule;

    fn compile(language: &Language, root: ClassId) -> Result<CompiledGrammar, BuildError> {
        let classes = ClassTable::collect(language, root)?;
        compile_grammar(language, &classes, root)
    }

    fn expansions_of(grammar: &Grammar, name: &str) -> Vec<String> {
        grammar
            .rules()
            .iter()
            .filter(|rule: &&GrammarRule| grammar.name(rule.head) == name)
            .map(|rule| grammar.describe_expansion(&rule.expansion, None))
            .collect()
    }

    #[test]
    fn test_start_rule_wraps_root_capture() {
        let mut language = Language::new();
        let root = language.class("A", "a");
        let compiled = compile(&language, root).unwrap();
        let grammar = &compiled.grammar;
        assert_eq!(grammar.rule(compiled.start_rule).head, Nonterminal::START);
        assert_eq!(expansions_of(grammar, "root.Match"), ["A"]);
        assert_eq!(expansions_of(grammar, "A"), ["\"a\""]);
        let root_nt = Nonterminal::new(1);
        let descriptor = grammar.descriptor(root_nt).unwrap();
        assert_eq!(descriptor.prop, "root");
        assert_eq!(descriptor.kind, MatchKind::TypedNode(root));
    }

    #[test]
    fn test_bounded_repeat_rules() {
        let mut language = Language::new();
        let root = language.class(
            "R",
            Repeat::new("a").delimiter(",").lower_bound(1).upper_bound(3).named("As"),
        );
        let grammar = compile(&language, root).unwrap().grammar;
        assert_eq!(expansions_of(&grammar, "As"), ["\"a\"", "\"a\" \",\" \"a\""]);
    }

    #[test]
    fn test_bounded_repeat_with_trailing_delimiter() {
        let mut language = Language::new();
        let root = language.class(
            "R",
            Repeat::new("a")
                .delimiter(",")
                .trailing_delimiter(TrailingDelimiter::SameAsDelimiter)
                .upper_bound(2)
                .named("As"),
        );
        let grammar = compile(&language, root).unwrap().grammar;
        assert_eq!(expansions_of(&grammar, "As"), ["ε", "\"a\"", "\"a\" \",\""]);
    }

    #[test]
    fn test_unbounded_repeat_rules() {
        let mut language = Language::new();
        let root = language.class(
            "R",
            Repeat::new("a").delimiter(",").lower_bound(2).named("As"),
        );
        let grammar = compile(&language, root).unwrap().grammar;
        assert_eq!(
            expansions_of(&grammar, "As"),
            ["\"a\" \",\" \"a\" As['innerLoop']"]
        );
        assert_eq!(
            expansions_of(&grammar, "As['innerLoop']"),
            ["ε", "\",\" \"a\" As['innerLoop']"]
        );
    }

    #[test]
    fn test_empty_repeat_range_has_no_rules() {
        let mut language = Language::new();
        let root = language.class(
            "R",
            Pattern::caten(["x".into(), Repeat::new("a").lower_bound(2).upper_bound(2).named("None").into()]),
        );
        let grammar = compile(&language, root).unwrap().grammar;
        assert!(expansions_of(&grammar, "None").is_empty());
    }

    #[test]
    fn test_unnamed_reuse_is_rejected() {
        let mut language = Language::new();
        let shared = Pattern::or(["a".into(), "b".into()]);
        let root = language.class("R", Pattern::caten([shared.clone(), shared]));
        assert!(matches!(
            compile(&language, root),
            Err(BuildError::UnnamedReuse { combinator: "Or", .. })
        ));
    }

    #[test]
    fn test_named_reuse_shares_nonterminal() {
        let mut language = Language::new();
        let shared = Pattern::or_named("AorB", ["a".into(), "b".into()]);
        let root = language.class("R", Pattern::caten([shared.clone(), shared]));
        let grammar = compile(&language, root).unwrap().grammar;
        assert_eq!(expansions_of(&grammar, "R"), ["AorB AorB"]);
        assert_eq!(expansions_of(&grammar, "AorB").len(), 2);
    }

    #[test]
    fn test_hidden_array_class_needs_array_capture() {
        let mut language = Language::new();
        let values = language.hidden_class("Values", Pattern::repeat(Pattern::capture_arr("value", "a")));
        let root = language.class("R", Pattern::capture("values", values));
        let error = compile(&language, root).unwrap_err();
        assert!(error
            .to_string()
            .starts_with("A hidden array-capturing class must be captured using an array-capturing match."));
    }

    #[test]
    fn test_capture_kinds() {
        let mut language = Language::new();
        let root = language.class(
            "R",
            Pattern::caten([
                Pattern::capture("token", "a"),
                Pattern::capture_arr("span", Pattern::caten(["b".into(), "c".into()])),
            ]),
        );
        let grammar = compile(&language, root).unwrap().grammar;
        let kinds: Vec<_> = (0..grammar.nonterminal_count())
            .filter_map(|i| grammar.descriptor(Nonterminal::new(i as u32)))
            .map(|descriptor| (descriptor.prop.to_string(), descriptor.kind, descriptor.is_array))
            .collect();
        assert_eq!(kinds[1], ("token".to_string(), MatchKind::Token, false));
        assert_eq!(kinds[2], ("span".to_string(), MatchKind::RawSpan, true));
    }
}
