use std::collections::VecDeque;
use std::ops::Range;

use compact_str::CompactString;
use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::error::{ParseError, ParseFailure, TokenizationError};
use crate::grammar::{AugmentedSymbol, MatchDescriptor, MatchKind};
use crate::lexer::{SrcPosition, Token, TokenStream};
use crate::lr::{ReduceAction, ReducedTable, TableAction};
use crate::pattern::{ClassTable, NodeClass};
use crate::syntax::{Captures, SyntaxNode, Value};

/// A capture while parsing. Arrays are deques so that merging two heads costs
/// the length of the shorter side, whichever side that is.
#[derive(Debug, Clone)]
enum Slot {
    Single(Value),
    Many(VecDeque<Value>),
}

impl Slot {
    fn into_value(self) -> Value {
        match self {
            Self::Single(value) => value,
            Self::Many(items) => Value::Array(items.into()),
        }
    }
}

type Slots = IndexMap<CompactString, Slot, ahash::RandomState>;

fn into_captures(slots: Slots) -> Captures {
    slots
        .into_iter()
        .map(|(prop, slot)| (prop, slot.into_value()))
        .collect()
}

/// One entry of the parse stack: a state with the span of consumed tokens and
/// the captures gathered since the head below it.
#[derive(Debug, Clone)]
struct ParseHead {
    state: usize,
    tokens: Range<usize>,
    values: Slots,
}

impl ParseHead {
    fn new(state: usize, tokens: Range<usize>, values: Slots) -> Self {
        Self {
            state,
            tokens,
            values,
        }
    }
}

/// Stack of parse heads; the initial head is never popped
type ParseStack = Vec<ParseHead>;

struct ParseContext<'a, 'src> {
    table: &'a ReducedTable,
    classes: &'a ClassTable,
    tokens: TokenStream<'src>,
    last_end: SrcPosition,
    /// Every shifted token; heads refer to contiguous ranges of it
    consumed: Vec<Token>,
    stack: ParseStack,
}

/// Run the shift-reduce loop until an accepting state is reached.
///
/// Returns the value captured as `root`.
pub(crate) fn parse(
    table: &ReducedTable,
    classes: &ClassTable,
    tokens: TokenStream<'_>,
) -> Result<Value, ParseFailure> {
    let mut ctx = ParseContext {
        table,
        classes,
        tokens,
        last_end: SrcPosition::default(),
        consumed: Vec::new(),
        stack: vec![ParseHead::new(0, 0..0, Slots::default())],
    };
    let mut lookahead = ctx.next_token()?;

    loop {
        let Some(top) = ctx.stack.last() else {
            return Err(invalid_table(0, "the initial head"));
        };
        let state = top.state;
        let Some(reduced) = table.state(state) else {
            return Err(invalid_table(state, "the current state"));
        };
        if reduced.is_accepting() {
            break;
        }
        if ctx.step(state, &lookahead)? {
            lookahead = ctx.next_token()?;
        }
    }

    let mut values = ctx
        .stack
        .pop()
        .map(|head| head.values)
        .unwrap_or_default();
    Ok(values
        .swap_remove("root")
        .map(Slot::into_value)
        .unwrap_or_default())
}

fn invalid_table(state: usize, symbol: &str) -> ParseFailure {
    ParseFailure::InvalidTable {
        state,
        symbol: symbol.to_string(),
    }
}

impl ParseContext<'_, '_> {
    /// The next token; an end-of-input token is synthesized when the stream ends
    fn next_token(&mut self) -> Result<Token, TokenizationError> {
        match self.tokens.next() {
            Some(Ok(token)) => {
                self.last_end = token.end;
                Ok(token)
            }
            Some(Err(error)) => Err(error),
            None => Ok(Token::end_of_input(self.last_end)),
        }
    }

    /// Perform one action for `lookahead`; returns whether it was consumed
    fn step(&mut self, state: usize, lookahead: &Token) -> Result<bool, ParseFailure> {
        let table = self.table;
        let under = AugmentedSymbol::from(lookahead.lookahead());
        match table.action(state, &under) {
            None => Err(ParseError::new(lookahead.clone(), table.expected(state)).into()),
            Some(TableAction::Shift(target)) => {
                let index = self.consumed.len();
                self.consumed.push(lookahead.clone());
                self.stack
                    .push(ParseHead::new(target, index..index + 1, Slots::default()));
                Ok(true)
            }
            Some(TableAction::Reduce(rule)) => {
                let reduction = table
                    .reduction(rule)
                    .ok_or_else(|| invalid_table(state, &format!("rule {rule}")))?;
                self.reduce(state, reduction, lookahead.start)?;
                Ok(false)
            }
        }
    }

    fn reduce(
        &mut self,
        state: usize,
        reduction: &ReduceAction,
        at: SrcPosition,
    ) -> Result<(), ParseFailure> {
        if reduction.pop_count >= self.stack.len() {
            return Err(invalid_table(state, "a reduction deeper than the stack"));
        }
        let popped = self.stack.split_off(self.stack.len() - reduction.pop_count);

        let tokens = match (popped.first(), popped.last()) {
            (Some(first), Some(last)) => first.tokens.start..last.tokens.end,
            _ => self.consumed.len()..self.consumed.len(),
        };
        let mut values = Slots::default();
        for head in popped {
            merge_slots(&mut values, head.values);
        }

        if let Some(capture) = &reduction.capture {
            let span = self.consumed.get(tokens.clone()).unwrap_or(&[]);
            self.apply_capture(state, capture, span, &mut values, at)?;
        }

        let exposed = self.stack.last().map_or(0, |head| head.state);
        let target = self
            .table
            .goto(exposed, reduction.reduce_into)
            .ok_or_else(|| invalid_table(exposed, &format!("nonterminal {}", reduction.reduce_into.index())))?;
        self.stack.push(ParseHead::new(target, tokens, values));
        Ok(())
    }

    fn apply_capture(
        &self,
        state: usize,
        capture: &MatchDescriptor,
        tokens: &[Token],
        values: &mut Slots,
        at: SrcPosition,
    ) -> Result<(), ParseFailure> {
        let mut splice = false;
        let value = match capture.kind {
            MatchKind::TypedNode(id) => {
                let class = self
                    .classes
                    .get(id)
                    .ok_or_else(|| invalid_table(state, &format!("{id}")))?;
                splice = class.captures_array_value();
                class_value(class, into_captures(std::mem::take(values)))
            }
            MatchKind::Token => Value::Token(
                tokens
                    .first()
                    .cloned()
                    .unwrap_or_else(|| Token::end_of_input(at)),
            ),
            MatchKind::RawSpan => Value::Array(tokens.iter().cloned().map(Value::Token).collect()),
        };
        store_capture(values, capture, value, splice);
        Ok(())
    }
}

/// The value a class capture stores: a node, or the `value` field of a hidden class
fn class_value(class: &NodeClass, mut captured: Captures) -> Value {
    if !class.hidden {
        return SyntaxNode::new(class, captured).into();
    }
    captured.swap_remove("value").unwrap_or_else(|| {
        if class.captures_array_value() {
            Value::Array(Vec::new())
        } else {
            Value::Absent
        }
    })
}

/// Store `value` into its field; `splice` appends array elements one by one
fn store_capture(values: &mut Slots, capture: &MatchDescriptor, value: Value, splice: bool) {
    if !capture.is_array {
        values.insert(capture.prop.clone(), Slot::Single(value));
        return;
    }
    let slot = values
        .entry(capture.prop.clone())
        .or_insert_with(|| Slot::Many(VecDeque::new()));
    if let Slot::Single(_) = slot {
        *slot = Slot::Many(VecDeque::new());
    }
    if let Slot::Many(items) = slot {
        match value {
            Value::Array(elements) if splice => items.extend(elements),
            value => items.push_back(value),
        }
    }
}

/// Merge captures of a later head into those of earlier ones: arrays concatenate,
/// anything else is overwritten.
fn merge_slots(into: &mut Slots, from: Slots) {
    for (prop, slot) in from {
        match into.entry(prop) {
            Entry::Vacant(vacant) => {
                vacant.insert(slot);
            }
            Entry::Occupied(mut occupied) => match (occupied.get_mut(), slot) {
                (Slot::Many(existing), Slot::Many(mut incoming)) => {
                    if existing.len() >= incoming.len() {
                        existing.append(&mut incoming);
                    } else {
                        while let Some(item) = existing.pop_back() {
                            incoming.push_front(item);
                        }
                        *existing = incoming;
                    }
                }
                (existing, slot) => *existing = slot,
            },
        }
    }
}
