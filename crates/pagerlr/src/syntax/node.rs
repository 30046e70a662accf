use compact_str::CompactString;
use indexmap::IndexMap;

use super::Value;
use crate::lexer::Token;
use crate::pattern::{ClassId, NodeClass};

/// Captured fields, in capture order
pub type Captures = IndexMap<CompactString, Value, ahash::RandomState>;

/// A node of the syntax tree: an instance of a visible class.
///
/// Every field of the class is present. Fields the parse did not reach are
/// [`Value::Absent`] or an empty array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    class: ClassId,
    name: CompactString,
    fields: Captures,
}

/// What [`SyntaxNode::traverse`] visits
#[derive(Debug, Clone, Copy)]
pub enum Visit<'a> {
    /// A node; returning `false` skips its children
    Node(&'a SyntaxNode),
    /// A token
    Token(&'a Token),
}

impl SyntaxNode {
    /// Build a node of `class` from its captures, filling in missing fields
    #[must_use]
    pub fn new(class: &NodeClass, mut captures: Captures) -> Self {
        for (prop, &is_array) in &class.fields {
            captures.entry(prop.clone()).or_insert_with(|| {
                if is_array {
                    Value::Array(Vec::new())
                } else {
                    Value::Absent
                }
            });
        }
        Self {
            class: class.id,
            name: class.name.clone(),
            fields: captures,
        }
    }

    /// The class of the node
    #[must_use]
    pub const fn class(&self) -> ClassId {
        self.class
    }

    /// The class name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All fields
    #[must_use]
    pub const fn fields(&self) -> &Captures {
        &self.fields
    }

    /// A field by name
    #[must_use]
    pub fn get(&self, prop: &str) -> Option<&Value> {
        self.fields.get(prop)
    }

    /// A token field
    #[must_use]
    pub fn token(&self, prop: &str) -> Option<&Token> {
        self.get(prop).and_then(Value::as_token)
    }

    /// A node field
    #[must_use]
    pub fn node(&self, prop: &str) -> Option<&SyntaxNode> {
        self.get(prop).and_then(Value::as_node)
    }

    /// An array field; empty when the field is missing or not an array
    #[must_use]
    pub fn array(&self, prop: &str) -> &[Value] {
        self.get(prop).and_then(Value::as_array).unwrap_or(&[])
    }

    /// Visit this node and everything below it in pre-order.
    ///
    /// Array elements are visited in order. Returning `false` for a node skips its
    /// children; the return value for tokens is ignored.
    pub fn traverse<'a, F>(&'a self, mut visit: F)
    where
        F: FnMut(Visit<'a>) -> bool,
    {
        self.traverse_with_ancestors(|_, item| visit(item));
    }

    /// Like [`traverse`](Self::traverse), but also passes the nodes enclosing each
    /// visited item, outermost first. The root is visited with no ancestors.
    pub fn traverse_with_ancestors<'a, F>(&'a self, mut visit: F)
    where
        F: FnMut(&[&'a SyntaxNode], Visit<'a>) -> bool,
    {
        let mut ancestors: Vec<&'a SyntaxNode> = Vec::new();
        if !visit(&ancestors, Visit::Node(self)) {
            return;
        }
        ancestors.push(self);
        // Each pending value remembers how many ancestors enclose it.
        let mut stack: Vec<(usize, &'a Value)> =
            self.fields.values().rev().map(|value| (1, value)).collect();
        while let Some((depth, value)) = stack.pop() {
            ancestors.truncate(depth);
            match value {
                Value::Token(token) => {
                    visit(&ancestors, Visit::Token(token));
                }
                Value::Node(node) => {
                    if visit(&ancestors, Visit::Node(node)) {
                        ancestors.push(node);
                        stack.extend(node.fields.values().rev().map(|value| (depth + 1, value)));
                    }
                }
                Value::Array(items) => stack.extend(items.iter().rev().map(|value| (depth, value))),
                Value::Absent => {}
            }
        }
    }
}

impl Drop for SyntaxNode {
    /// Unlinks children onto a work list so deep trees drop without recursion
    fn drop(&mut self) {
        let mut pending: Vec<Value> = std::mem::take(&mut self.fields).into_values().collect();
        while let Some(value) = pending.pop() {
            match value {
                Value::Node(mut node) => pending.extend(std::mem::take(&mut node.fields).into_values()),
                Value::Array(items) => pending.extend(items),
                Value::Token(_) | Value::Absent => {}
            }
        }
    }
}
