use crate::lexer::Token;

use super::SyntaxNode;

/// A captured value.
///
/// Single-value fields hold a token, a node or (for hidden classes) whatever the
/// hidden class captured as `value`; array fields hold an [`Value::Array`]. Fields a
/// parse never set are [`Value::Absent`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    /// A token captured from a literal
    Token(Token),
    /// A node of a visible class
    Node(Box<SyntaxNode>),
    /// An array capture, or the tokens spanned by a non-literal pattern
    Array(Vec<Value>),
    /// Nothing was captured
    #[default]
    Absent,
}

impl Value {
    /// The token, if this is one
    #[must_use]
    pub const fn as_token(&self) -> Option<&Token> {
        match self {
            Self::Token(token) => Some(token),
            _ => None,
        }
    }

    /// The node, if this is one
    #[must_use]
    pub fn as_node(&self) -> Option<&SyntaxNode> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    /// The elements, if this is an array
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Take the node out of the value
    #[must_use]
    pub fn into_node(self) -> Option<SyntaxNode> {
        match self {
            Self::Node(node) => Some(*node),
            _ => None,
        }
    }

    /// Whether nothing was captured
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl From<Token> for Value {
    fn from(token: Token) -> Self {
        Self::Token(token)
    }
}

impl From<SyntaxNode> for Value {
    fn from(node: SyntaxNode) -> Self {
        Self::Node(Box::new(node))
    }
}
