//! Owned YAML tree.

use crate::Mark;
use serde::{Deserialize, Serialize};

/// The content of a [`Node`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeValue {
    /// Placeholder for a missing node
    #[default]
    None,
    Scalar {
        value: String,
        /// True when the source used single or double quotes
        quoted: bool,
    },
    Sequence(Vec<Node>),
    /// Pairs in source order. Keys are always scalars; duplicates are kept.
    Mapping(Vec<(Node, Node)>),
}

/// A materialized YAML node with its tag and source position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub value: NodeValue,
    /// Resolved tag; empty for nodes built in code
    pub tag: String,
    /// Start of the node in the source; `None` for nodes built in code
    pub mark: Option<Mark>,
}

impl Node {
    pub fn new(value: NodeValue) -> Self {
        Self {
            value,
            tag: String::new(),
            mark: None,
        }
    }

    pub fn scalar(value: impl Into<String>, quoted: bool) -> Self {
        Self::new(NodeValue::Scalar {
            value: value.into(),
            quoted,
        })
    }

    pub fn sequence(items: Vec<Node>) -> Self {
        Self::new(NodeValue::Sequence(items))
    }

    pub fn mapping(pairs: Vec<(Node, Node)>) -> Self {
        Self::new(NodeValue::Mapping(pairs))
    }

    pub fn is_none(&self) -> bool {
        matches!(self.value, NodeValue::None)
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.value, NodeValue::Scalar { .. })
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.value, NodeValue::Sequence(_))
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self.value, NodeValue::Mapping(_))
    }

    /// The scalar text, if this is a scalar.
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            NodeValue::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn is_quoted(&self) -> bool {
        matches!(self.value, NodeValue::Scalar { quoted: true, .. })
    }

    pub fn items(&self) -> Option<&[Node]> {
        match &self.value {
            NodeValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn pairs(&self) -> Option<&[(Node, Node)]> {
        match &self.value {
            NodeValue::Mapping(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Value of the first pair whose key text is `key`.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.get_all(key).next()
    }

    /// Values of every pair whose key text is `key`, in source order.
    pub fn get_all<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a Node> {
        self.pairs()
            .unwrap_or_default()
            .iter()
            .filter(move |(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Number of items or pairs; zero for scalars and `None`.
    pub fn len(&self) -> usize {
        match &self.value {
            NodeValue::Sequence(items) => items.len(),
            NodeValue::Mapping(pairs) => pairs.len(),
            NodeValue::None | NodeValue::Scalar { .. } => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compare shape, child order, scalar text and quoting, ignoring tags
    /// and marks.
    pub fn structurally_eq(&self, other: &Node) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((left, right)) = pending.pop() {
            match (&left.value, &right.value) {
                (NodeValue::None, NodeValue::None) => {}
                (
                    NodeValue::Scalar {
                        value: a,
                        quoted: qa,
                    },
                    NodeValue::Scalar {
                        value: b,
                        quoted: qb,
                    },
                ) => {
                    if a != b || qa != qb {
                        return false;
                    }
                }
                (NodeValue::Sequence(a), NodeValue::Sequence(b)) => {
                    if a.len() != b.len() {
                        return false;
                    }
                    pending.extend(a.iter().zip(b));
                }
                (NodeValue::Mapping(a), NodeValue::Mapping(b)) => {
                    if a.len() != b.len() {
                        return false;
                    }
                    for ((ka, va), (kb, vb)) in a.iter().zip(b) {
                        pending.push((ka, kb));
                        pending.push((va, vb));
                    }
                }
                _ => return false,
            }
        }
        true
    }
}
