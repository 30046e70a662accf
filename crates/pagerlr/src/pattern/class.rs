use std::collections::VecDeque;

use compact_str::{format_compact, CompactString};
use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;

use super::{ClassId, MatchTarget, Pattern, PatternId, TrailingDelimiter};
use crate::error::BuildError;

#[derive(Debug, Clone)]
struct ClassDecl {
    name: CompactString,
    hidden: bool,
    pattern: Option<Pattern>,
}

/// A registry of node classes.
///
/// Classes are declared first and defined later so that they can refer to each
/// other:
///
/// ```rust,no_run
/// use pagerlr::pattern::{Language, Pattern};
///
/// let mut language = Language::new();
/// let expr = language.declare("Expr");
/// let group = language.class(
///     "Group",
///     Pattern::caten(["(".into(), Pattern::capture("inner", expr), ")".into()]),
/// );
/// language.define(expr, Pattern::or(["x".into(), Pattern::include(group)]));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Language {
    classes: Vec<ClassDecl>,
}

impl Language {
    /// Create an empty language
    #[must_use]
    pub const fn new() -> Self {
        Self {
            classes: Vec::new(),
        }
    }

    fn push(&mut self, name: CompactString, hidden: bool, pattern: Option<Pattern>) -> ClassId {
        let id = ClassId::new(self.classes.len());
        self.classes.push(ClassDecl {
            name,
            hidden,
            pattern,
        });
        id
    }

    /// Declare a class to be defined later
    pub fn declare(&mut self, name: impl Into<CompactString>) -> ClassId {
        self.push(name.into(), false, None)
    }

    /// Declare a hidden class to be defined later.
    ///
    /// Capturing a hidden class stores its `value` field instead of a node.
    pub fn declare_hidden(&mut self, name: impl Into<CompactString>) -> ClassId {
        self.push(name.into(), true, None)
    }

    /// Give a declared class its pattern, replacing any previous one
    pub fn define(&mut self, class: ClassId, pattern: impl Into<Pattern>) {
        if let Some(decl) = self.classes.get_mut(class.index()) {
            decl.pattern = Some(pattern.into());
        }
    }

    /// Declare and define a class
    pub fn class(&mut self, name: impl Into<CompactString>, pattern: impl Into<Pattern>) -> ClassId {
        self.push(name.into(), false, Some(pattern.into()))
    }

    /// Declare and define a hidden class
    pub fn hidden_class(
        &mut self,
        name: impl Into<CompactString>,
        pattern: impl Into<Pattern>,
    ) -> ClassId {
        self.push(name.into(), true, Some(pattern.into()))
    }

    /// Name of a class
    #[must_use]
    pub fn name(&self, class: ClassId) -> Option<&str> {
        self.classes.get(class.index()).map(|decl| decl.name.as_str())
    }

    /// Pattern of a class, if it has been defined
    #[must_use]
    pub fn pattern(&self, class: ClassId) -> Option<&Pattern> {
        self.classes
            .get(class.index())
            .and_then(|decl| decl.pattern.as_ref())
    }

    /// Number of declared classes
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether no class has been declared
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Fields of a class, mapped to whether they hold arrays
pub type Fields = IndexMap<CompactString, bool, ahash::RandomState>;

/// A class reachable from the root, with its synthesized fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeClass {
    /// Identity within the language
    pub id: ClassId,
    /// Unique name
    pub name: CompactString,
    /// Whether captures store the `value` field instead of a node
    pub hidden: bool,
    /// Every field captured directly by the class pattern
    pub fields: Fields,
}

impl NodeClass {
    /// Whether this is a hidden class whose `value` is an array
    #[must_use]
    pub fn captures_array_value(&self) -> bool {
        self.hidden && self.fields.get("value").copied().unwrap_or(false)
    }
}

/// The classes reachable from a root class
#[derive(Debug, Clone, Default)]
pub struct ClassTable {
    classes: IndexMap<ClassId, NodeClass, ahash::RandomState>,
    by_name: HashMap<CompactString, ClassId, ahash::RandomState>,
}

impl ClassTable {
    /// Collect every class reachable from `root` and synthesize its fields.
    ///
    /// # Errors
    ///
    /// Fails when two reachable classes share a name, a field is captured both as an
    /// array and as a single value, a reachable class was never defined, or a
    /// deferred match was never patched.
    pub fn collect(language: &Language, root: ClassId) -> Result<Self, BuildError> {
        let mut table = Self::default();
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            if table.classes.contains_key(&id) {
                continue;
            }
            let decl = language
                .classes
                .get(id.index())
                .ok_or_else(|| BuildError::UndefinedClass {
                    name: format_compact!("{id}"),
                })?;
            let pattern = decl
                .pattern
                .as_ref()
                .ok_or_else(|| BuildError::UndefinedClass {
                    name: decl.name.clone(),
                })?;
            if table.by_name.contains_key(&decl.name) {
                return Err(BuildError::DuplicateClassName {
                    name: decl.name.clone(),
                });
            }
            let fields = walk_class(pattern, &decl.name, &mut queue)?;
            table.by_name.insert(decl.name.clone(), id);
            table.classes.insert(
                id,
                NodeClass {
                    id,
                    name: decl.name.clone(),
                    hidden: decl.hidden,
                    fields,
                },
            );
        }
        Ok(table)
    }

    /// Look up a class
    #[must_use]
    pub fn get(&self, id: ClassId) -> Option<&NodeClass> {
        self.classes.get(&id)
    }

    /// Look up a class by name
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&NodeClass> {
        self.by_name.get(name).and_then(|id| self.classes.get(id))
    }

    /// Classes in discovery order, root first
    pub fn iter(&self) -> impl Iterator<Item = &NodeClass> {
        self.classes.values()
    }

    /// Number of classes
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Synthesize the fields of a class pattern and queue the classes it refers to.
///
/// Captures inside a pattern target store into the enclosing node at parse time, so
/// they count as fields of the class. Class targets start a new node and are only
/// queued.
fn walk_class(
    pattern: &Pattern,
    class: &CompactString,
    queue: &mut VecDeque<ClassId>,
) -> Result<Fields, BuildError> {
    let mut fields = Fields::default();
    let mut visited: HashSet<PatternId, ahash::RandomState> = HashSet::default();
    let mut stack = vec![pattern];
    while let Some(pattern) = stack.pop() {
        if let Some(id) = pattern.id() {
            if !visited.insert(id) {
                continue;
            }
        }
        match pattern {
            Pattern::Literal(_) => {}
            Pattern::Caten(items) => stack.extend(items.iter().rev()),
            Pattern::Or(or) => stack.extend(or.branches.iter().rev()),
            Pattern::Repeat(repeat) => {
                if let TrailingDelimiter::Pattern(trailing) = &repeat.trailing {
                    stack.push(trailing);
                }
                stack.push(&repeat.delimiter);
                stack.push(&repeat.pattern);
            }
            Pattern::Match(m) => {
                if let Some(prop) = &m.prop {
                    match fields.get(prop) {
                        Some(&is_array) if is_array != m.is_array => {
                            return Err(BuildError::FieldMismatch {
                                class: class.clone(),
                                prop: prop.clone(),
                            });
                        }
                        Some(_) => {}
                        None => {
                            fields.insert(prop.clone(), m.is_array);
                        }
                    }
                }
                match m.target() {
                    None => {
                        return Err(BuildError::UninitializedMatch {
                            context: format!("class \"{class}\""),
                        })
                    }
                    Some(MatchTarget::Class(id)) => queue.push_back(*id),
                    Some(MatchTarget::Pattern(target)) => stack.push(target),
                }
            }
        }
    }
    Ok(fields)
}
