//! JSON encodings of the reduced table.
//!
//! [`SerializedTable`] is the readable encoding; [`MinifiedTable`] packs the same
//! information into arrays. Classes are referred to by name, so loading a table
//! needs the [`ClassTable`] of the language it was generated for.

use std::collections::BTreeMap;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use super::table::{ReduceAction, ReducedState, ReducedTable, TableAction};
use crate::error::TableError;
use crate::grammar::{AugmentedSymbol, MatchDescriptor, MatchKind, Nonterminal};
use crate::pattern::ClassTable;

/// Readable encoding of a [`ReducedTable`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedTable {
    /// States in index order
    pub states: Vec<SerializedState>,
    /// Reduce descriptors keyed by rule index
    pub reduce_infos: BTreeMap<usize, ReduceInfo>,
}

/// A state of a [`SerializedTable`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedState {
    /// Whether reaching the state accepts the input
    pub is_accepting: bool,
    /// Actions in insertion order
    pub transitions: Vec<Transition>,
}

/// One action of a serialized state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Terminal, nonterminal or `null` for the end of input
    pub under: AugmentedSymbol,
    /// What to do
    pub action: SerializedAction,
}

/// A shift (`read`) to a state or a reduction by a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedAction {
    /// Whether this is a shift
    pub read: bool,
    /// Target state for shifts, rule index for reductions
    pub index: usize,
}

/// A serialized reduce descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReduceInfo {
    /// Number of heads to pop
    pub pop_count: usize,
    /// Nonterminal whose goto follows
    pub reduce_into: Nonterminal,
    /// Captured field, `null` without a capture
    pub prop: Option<CompactString>,
    /// Whether the capture is an array capture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_array_match: Option<bool>,
    /// What the capture stores
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<MatchTypeTag>,
}

/// What a serialized capture stores: `["class", name]`, `["pattern"]` or `["token"]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CompactString>", into = "Vec<CompactString>")]
pub enum MatchTypeTag {
    /// A node of the named class
    Class(CompactString),
    /// The tokens of the reduction
    Pattern,
    /// The first token of the reduction
    Token,
}

impl From<MatchTypeTag> for Vec<CompactString> {
    fn from(tag: MatchTypeTag) -> Self {
        match tag {
            MatchTypeTag::Class(name) => vec![CompactString::new("class"), name],
            MatchTypeTag::Pattern => vec![CompactString::new("pattern")],
            MatchTypeTag::Token => vec![CompactString::new("token")],
        }
    }
}

impl TryFrom<Vec<CompactString>> for MatchTypeTag {
    type Error = TableError;

    fn try_from(parts: Vec<CompactString>) -> Result<Self, Self::Error> {
        match parts.as_slice() {
            [kind, name] if kind == "class" => Ok(Self::Class(name.clone())),
            [kind] if kind == "pattern" => Ok(Self::Pattern),
            [kind] if kind == "token" => Ok(Self::Token),
            _ => Err(TableError::MalformedType(parts)),
        }
    }
}

impl SerializedTable {
    /// Encode as JSON
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Json`] if encoding fails.
    pub fn to_json(&self) -> Result<String, TableError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Json`] for malformed input.
    pub fn from_json(json: &str) -> Result<Self, TableError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl ReducedTable {
    /// Encode the table, naming classes through `classes`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::UnknownClass`] if a capture refers to a class missing
    /// from `classes`.
    pub fn to_serialized(&self, classes: &ClassTable) -> Result<SerializedTable, TableError> {
        let states = self
            .states
            .iter()
            .map(|state| SerializedState {
                is_accepting: state.is_accepting,
                transitions: state
                    .actions
                    .iter()
                    .map(|(under, action)| Transition {
                        under: under.clone(),
                        action: match *action {
                            TableAction::Shift(index) => SerializedAction { read: true, index },
                            TableAction::Reduce(index) => SerializedAction { read: false, index },
                        },
                    })
                    .collect(),
            })
            .collect();

        let mut reduce_infos = BTreeMap::new();
        for (&rule, reduction) in &self.reductions {
            let (prop, is_array_match, kind) = match &reduction.capture {
                None => (None, None, None),
                Some(capture) => {
                    let kind = match capture.kind {
                        MatchKind::TypedNode(id) => MatchTypeTag::Class(
                            classes
                                .get(id)
                                .map(|class| class.name.clone())
                                .ok_or_else(|| TableError::UnknownClass(compact_str::format_compact!("{id}")))?,
                        ),
                        MatchKind::Token => MatchTypeTag::Token,
                        MatchKind::RawSpan => MatchTypeTag::Pattern,
                    };
                    (Some(capture.prop.clone()), Some(capture.is_array), Some(kind))
                }
            };
            reduce_infos.insert(
                rule,
                ReduceInfo {
                    pop_count: reduction.pop_count,
                    reduce_into: reduction.reduce_into,
                    prop,
                    is_array_match,
                    kind,
                },
            );
        }
        Ok(SerializedTable {
            states,
            reduce_infos,
        })
    }

    /// Decode and validate a serialized table.
    ///
    /// # Errors
    ///
    /// Fails when the table is empty, a shift targets a missing state, a reduction
    /// has no descriptor, or a capture names a class missing from `classes`.
    pub fn from_serialized(
        serialized: &SerializedTable,
        classes: &ClassTable,
    ) -> Result<Self, TableError> {
        if serialized.states.is_empty() {
            return Err(TableError::Empty);
        }

        let mut states = Vec::with_capacity(serialized.states.len());
        for (index, state) in serialized.states.iter().enumerate() {
            let mut actions = super::table::TableActions::default();
            for transition in &state.transitions {
                let SerializedAction { read, index: target } = transition.action;
                let action = if read {
                    if target >= serialized.states.len() {
                        return Err(TableError::MissingState {
                            state: index,
                            target,
                        });
                    }
                    TableAction::Shift(target)
                } else {
                    if !serialized.reduce_infos.contains_key(&target) {
                        return Err(TableError::MissingReduceInfo {
                            state: index,
                            rule: target,
                        });
                    }
                    TableAction::Reduce(target)
                };
                actions.insert(transition.under.clone(), action);
            }
            states.push(ReducedState::new(state.is_accepting, actions));
        }

        let mut reductions = indexmap::IndexMap::default();
        for (&rule, info) in &serialized.reduce_infos {
            let capture = match (&info.prop, &info.kind) {
                (Some(prop), Some(kind)) => Some(MatchDescriptor {
                    is_array: info.is_array_match.unwrap_or(false),
                    prop: prop.clone(),
                    kind: match kind {
                        MatchTypeTag::Class(name) => MatchKind::TypedNode(
                            classes
                                .by_name(name)
                                .map(|class| class.id)
                                .ok_or_else(|| TableError::UnknownClass(name.clone()))?,
                        ),
                        MatchTypeTag::Pattern => MatchKind::RawSpan,
                        MatchTypeTag::Token => MatchKind::Token,
                    },
                }),
                _ => None,
            };
            reductions.insert(
                rule,
                ReduceAction {
                    pop_count: info.pop_count,
                    reduce_into: info.reduce_into,
                    capture,
                },
            );
        }

        Ok(Self::new(states, reductions))
    }
}

/// Compact encoding of a [`SerializedTable`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinifiedTable {
    /// States as `[isAccepting, transitions]`
    pub s: Vec<MinifiedState>,
    /// Reduce descriptors keyed by rule index
    pub r: BTreeMap<usize, MinifiedReduceInfo>,
}

/// `[isAccepting (0|1), [[under, read (0|1), index], ...]]`
pub type MinifiedState = (u8, Vec<MinifiedTransition>);

/// `[under, read (0|1), index]`
pub type MinifiedTransition = (AugmentedSymbol, u8, usize);

/// A reduce descriptor as an array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MinifiedReduceInfo {
    /// `[popCount, reduceInto]`
    Plain(usize, Nonterminal),
    /// `[popCount, reduceInto, prop, isArray, "pattern" | "token"]`
    Captured(usize, Nonterminal, CompactString, u8, CompactString),
    /// `[popCount, reduceInto, prop, isArray, "class", name]`
    ClassCaptured(usize, Nonterminal, CompactString, u8, CompactString, CompactString),
}

impl From<&SerializedTable> for MinifiedTable {
    fn from(table: &SerializedTable) -> Self {
        let s = table
            .states
            .iter()
            .map(|state| {
                (
                    u8::from(state.is_accepting),
                    state
                        .transitions
                        .iter()
                        .map(|t| (t.under.clone(), u8::from(t.action.read), t.action.index))
                        .collect(),
                )
            })
            .collect();
        let r = table
            .reduce_infos
            .iter()
            .map(|(&rule, info)| {
                let is_array = u8::from(info.is_array_match.unwrap_or(false));
                let minified = match (&info.prop, &info.kind) {
                    (Some(prop), Some(MatchTypeTag::Class(name))) => {
                        MinifiedReduceInfo::ClassCaptured(
                            info.pop_count,
                            info.reduce_into,
                            prop.clone(),
                            is_array,
                            CompactString::new("class"),
                            name.clone(),
                        )
                    }
                    (Some(prop), Some(kind)) => {
                        let tag = Vec::<CompactString>::from(kind.clone())
                            .into_iter()
                            .next()
                            .unwrap_or_default();
                        MinifiedReduceInfo::Captured(
                            info.pop_count,
                            info.reduce_into,
                            prop.clone(),
                            is_array,
                            tag,
                        )
                    }
                    _ => MinifiedReduceInfo::Plain(info.pop_count, info.reduce_into),
                };
                (rule, minified)
            })
            .collect();
        Self { s, r }
    }
}

impl TryFrom<&MinifiedTable> for SerializedTable {
    type Error = TableError;

    fn try_from(table: &MinifiedTable) -> Result<Self, Self::Error> {
        let states = table
            .s
            .iter()
            .map(|(is_accepting, transitions)| SerializedState {
                is_accepting: *is_accepting != 0,
                transitions: transitions
                    .iter()
                    .map(|(under, read, index)| Transition {
                        under: under.clone(),
                        action: SerializedAction {
                            read: *read != 0,
                            index: *index,
                        },
                    })
                    .collect(),
            })
            .collect();

        let mut reduce_infos = BTreeMap::new();
        for (&rule, info) in &table.r {
            let info = match info {
                MinifiedReduceInfo::Plain(pop_count, reduce_into) => ReduceInfo {
                    pop_count: *pop_count,
                    reduce_into: *reduce_into,
                    prop: None,
                    is_array_match: None,
                    kind: None,
                },
                MinifiedReduceInfo::Captured(pop_count, reduce_into, prop, is_array, tag) => {
                    ReduceInfo {
                        pop_count: *pop_count,
                        reduce_into: *reduce_into,
                        prop: Some(prop.clone()),
                        is_array_match: Some(*is_array != 0),
                        kind: Some(MatchTypeTag::try_from(vec![tag.clone()])?),
                    }
                }
                MinifiedReduceInfo::ClassCaptured(pop_count, reduce_into, prop, is_array, tag, name) => {
                    ReduceInfo {
                        pop_count: *pop_count,
                        reduce_into: *reduce_into,
                        prop: Some(prop.clone()),
                        is_array_match: Some(*is_array != 0),
                        kind: Some(MatchTypeTag::try_from(vec![tag.clone(), name.clone()])?),
                    }
                }
            };
            reduce_infos.insert(rule, info);
        }
        Ok(Self {
            states,
            reduce_infos,
        })
    }
}

impl MinifiedTable {
    /// Encode as JSON
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Json`] if encoding fails.
    pub fn to_json(&self) -> Result<String, TableError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Json`] for malformed input.
    pub fn from_json(json: &str) -> Result<Self, TableError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SerializedTable {
        let json = r#"{
            "states": [
                { "isAccepting": false, "transitions": [
                    { "under": "a", "action": { "read": true, "index": 1 } },
                    { "under": 1, "action": { "read": true, "index": 2 } }
                ] },
                { "isAccepting": false, "transitions": [
                    { "under": null, "action": { "read": false, "index": 0 } }
                ] },
                { "isAccepting": true, "transitions": [] }
            ],
            "reduceInfos": {
                "0": { "popCount": 1, "reduceInto": 1, "prop": "root", "isArrayMatch": false, "type": ["token"] },
                "1": { "popCount": 1, "reduceInto": 0, "prop": null }
            }
        }"#;
        SerializedTable::from_json(json).unwrap()
    }

    #[test]
    fn test_readable_format_fields() {
        let table = sample();
        assert_eq!(table.states[0].transitions[1].under, AugmentedSymbol::Nonterminal(Nonterminal::new(1)));
        assert_eq!(table.states[1].transitions[0].under, AugmentedSymbol::End);
        assert_eq!(table.reduce_infos[&0].kind, Some(MatchTypeTag::Token));
        assert_eq!(table.reduce_infos[&1].prop, None);

        let json = table.to_json().unwrap();
        assert!(json.contains(r#""reduceInfos""#));
        assert!(json.contains(r#""prop":null"#));
        assert!(json.contains(r#""type":["token"]"#));
    }

    #[test]
    fn test_minified_shapes() {
        let minified = MinifiedTable::from(&sample());
        let json = minified.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"s":[[0,[["a",1,1],[1,1,2]]],[0,[[null,0,0]]],[1,[]]],"r":{"0":[1,1,"root",0,"token"],"1":[1,0]}}"#
        );
        let back = SerializedTable::try_from(&MinifiedTable::from_json(&json).unwrap()).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_class_capture_minifies_with_name() {
        let info = MinifiedReduceInfo::ClassCaptured(
            2,
            Nonterminal::new(4),
            "body".into(),
            1,
            "class".into(),
            "Block".into(),
        );
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(json, r#"[2,4,"body",1,"class","Block"]"#);
        let back: MinifiedReduceInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
    }

    #[test]
    fn test_malformed_type_tag_is_rejected() {
        let json = r#"{ "popCount": 0, "reduceInto": 1, "prop": "x", "type": ["bogus"] }"#;
        assert!(serde_json::from_str::<ReduceInfo>(json).is_err());
    }

    #[test]
    fn test_missing_state_is_rejected() {
        let mut table = sample();
        table.states[0].transitions[0].action.index = 9;
        assert!(matches!(
            ReducedTable::from_serialized(&table, &ClassTable::default()),
            Err(TableError::MissingState { state: 0, target: 9 })
        ));
    }

    #[test]
    fn test_missing_reduce_info_is_rejected() {
        let mut table = sample();
        table.reduce_infos.remove(&0);
        assert!(matches!(
            ReducedTable::from_serialized(&table, &ClassTable::default()),
            Err(TableError::MissingReduceInfo { state: 1, rule: 0 })
        ));
    }

    #[test]
    fn test_unknown_class_is_rejected() {
        let mut table = sample();
        table.reduce_infos.get_mut(&0).unwrap().kind = Some(MatchTypeTag::Class("Nope".into()));
        assert!(matches!(
            ReducedTable::from_serialized(&table, &ClassTable::default()),
            Err(TableError::UnknownClass(name)) if name == "Nope"
        ));
    }
}
