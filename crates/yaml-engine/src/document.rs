//! The composed node graph.
//!
//! A [`Document`] is a flat pool of nodes addressed by 1-based [`NodeId`]
//! handles. The first node added is the root. Collections refer to their
//! children by handle, so the same pool serves both the composer (which
//! fills it from the event stream) and callers building a document for the
//! emitter through the `add_*`/`append_*` primitives.

use crate::Mark;
use std::fmt;

pub const DEFAULT_SCALAR_TAG: &str = "tag:yaml.org,2002:str";
pub const DEFAULT_SEQUENCE_TAG: &str = "tag:yaml.org,2002:seq";
pub const DEFAULT_MAPPING_TAG: &str = "tag:yaml.org,2002:map";

/// Handle of a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The 1-based position of the node in its document's pool.
    pub fn get(self) -> usize {
        self.0
    }

    fn slot(self) -> usize {
        self.0 - 1
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Presentation style of a scalar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ScalarStyle {
    /// Let the emitter choose
    #[default]
    Any,
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodePair {
    pub key: NodeId,
    pub value: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Scalar { value: String, style: ScalarStyle },
    Sequence { items: Vec<NodeId> },
    Mapping { pairs: Vec<NodePair> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub tag: String,
    pub data: NodeData,
    pub start_mark: Mark,
    pub end_mark: Mark,
}

impl Node {
    pub fn kind_name(&self) -> &'static str {
        match self.data {
            NodeData::Scalar { .. } => "scalar",
            NodeData::Sequence { .. } => "sequence",
            NodeData::Mapping { .. } => "mapping",
        }
    }
}

/// Why an append was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppendError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("node {0} is not a sequence")]
    NotASequence(NodeId),
    #[error("node {0} is not a mapping")]
    NotAMapping(NodeId),
    #[error("node {0} already belongs to a collection")]
    AlreadyOwned(NodeId),
    #[error("appending node {item} to {container} would create a cycle")]
    Cycle { container: NodeId, item: NodeId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
    /// Owning collection of each node, parallel to `nodes`
    parents: Vec<Option<NodeId>>,
    pub start_implicit: bool,
    pub end_implicit: bool,
    pub start_mark: Mark,
    pub end_mark: Mark,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document with implicit start and end.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            parents: Vec::new(),
            start_implicit: true,
            end_implicit: true,
            start_mark: Mark::default(),
            end_mark: Mark::default(),
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(NodeId(1))
        }
    }

    pub fn root_node(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.slot())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add_scalar(&mut self, tag: Option<&str>, value: &str, style: ScalarStyle) -> NodeId {
        self.push(
            tag.unwrap_or(DEFAULT_SCALAR_TAG).to_string(),
            NodeData::Scalar {
                value: value.to_string(),
                style,
            },
            Mark::default(),
        )
    }

    pub fn add_sequence(&mut self, tag: Option<&str>) -> NodeId {
        self.push(
            tag.unwrap_or(DEFAULT_SEQUENCE_TAG).to_string(),
            NodeData::Sequence { items: Vec::new() },
            Mark::default(),
        )
    }

    pub fn add_mapping(&mut self, tag: Option<&str>) -> NodeId {
        self.push(
            tag.unwrap_or(DEFAULT_MAPPING_TAG).to_string(),
            NodeData::Mapping { pairs: Vec::new() },
            Mark::default(),
        )
    }

    /// Append `item` to the end of `sequence`.
    ///
    /// Every node may belong to at most one collection and never to itself
    /// or to one of its descendants, so documents built this way stay trees.
    pub fn append_sequence_item(
        &mut self,
        sequence: NodeId,
        item: NodeId,
    ) -> Result<(), AppendError> {
        self.check_append(sequence, item)?;
        match &mut self.nodes[sequence.slot()].data {
            NodeData::Sequence { items } => items.push(item),
            _ => return Err(AppendError::NotASequence(sequence)),
        }
        self.parents[item.slot()] = Some(sequence);
        Ok(())
    }

    /// Append a `key`/`value` pair to `mapping`. Keys are not deduplicated.
    pub fn append_mapping_pair(
        &mut self,
        mapping: NodeId,
        key: NodeId,
        value: NodeId,
    ) -> Result<(), AppendError> {
        self.check_append(mapping, key)?;
        self.check_append(mapping, value)?;
        if key == value {
            return Err(AppendError::AlreadyOwned(value));
        }
        match &mut self.nodes[mapping.slot()].data {
            NodeData::Mapping { pairs } => pairs.push(NodePair { key, value }),
            _ => return Err(AppendError::NotAMapping(mapping)),
        }
        self.parents[key.slot()] = Some(mapping);
        self.parents[value.slot()] = Some(mapping);
        Ok(())
    }

    fn check_append(&self, container: NodeId, item: NodeId) -> Result<(), AppendError> {
        for id in [container, item] {
            if self.node(id).is_none() {
                return Err(AppendError::UnknownNode(id));
            }
        }
        if self.parents[item.slot()].is_some() {
            return Err(AppendError::AlreadyOwned(item));
        }
        let mut ancestor = Some(container);
        while let Some(id) = ancestor {
            if id == item {
                return Err(AppendError::Cycle { container, item });
            }
            ancestor = self.parents[id.slot()];
        }
        Ok(())
    }

    fn push(&mut self, tag: String, data: NodeData, mark: Mark) -> NodeId {
        self.nodes.push(Node {
            tag,
            data,
            start_mark: mark,
            end_mark: mark,
        });
        self.parents.push(None);
        NodeId(self.nodes.len())
    }

    // Composer access: aliases may attach one node in several places, so the
    // tree checks of the public append primitives do not apply here.

    pub(crate) fn push_node(&mut self, tag: String, data: NodeData, mark: Mark) -> NodeId {
        self.push(tag, data, mark)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.slot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_node_is_root() {
        let mut doc = Document::new();
        assert_eq!(doc.root(), None);
        let map = doc.add_mapping(None);
        let key = doc.add_scalar(None, "a", ScalarStyle::Plain);
        assert_eq!(doc.root(), Some(map));
        assert_eq!(map.get(), 1);
        assert_eq!(key.get(), 2);
        assert_eq!(doc.node(key).unwrap().tag, DEFAULT_SCALAR_TAG);
    }

    #[test]
    fn test_append_keeps_order_and_duplicates() {
        let mut doc = Document::new();
        let map = doc.add_mapping(None);
        for value in ["1", "2"] {
            let key = doc.add_scalar(None, "a", ScalarStyle::Any);
            let value = doc.add_scalar(None, value, ScalarStyle::Any);
            doc.append_mapping_pair(map, key, value).unwrap();
        }
        let NodeData::Mapping { pairs } = &doc.node(map).unwrap().data else {
            panic!("expected mapping");
        };
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].key.get(), 2);
        assert_eq!(pairs[1].value.get(), 5);
    }

    #[test]
    fn test_append_rejects_wrong_kinds() {
        let mut doc = Document::new();
        let seq = doc.add_sequence(None);
        let scalar = doc.add_scalar(None, "x", ScalarStyle::Any);
        assert_eq!(
            doc.append_sequence_item(scalar, seq),
            Err(AppendError::NotASequence(scalar))
        );
        let other = doc.add_scalar(None, "y", ScalarStyle::Any);
        assert_eq!(
            doc.append_mapping_pair(seq, scalar, other),
            Err(AppendError::NotAMapping(seq))
        );
    }

    #[test]
    fn test_append_rejects_unknown_handles() {
        let mut big = Document::new();
        big.add_sequence(None);
        big.add_sequence(None);
        let far = big.add_sequence(None);

        let mut doc = Document::new();
        let seq = doc.add_sequence(None);
        assert_eq!(
            doc.append_sequence_item(seq, far),
            Err(AppendError::UnknownNode(far))
        );
    }

    #[test]
    fn test_append_rejects_shared_and_cyclic_items() {
        let mut doc = Document::new();
        let outer = doc.add_sequence(None);
        let inner = doc.add_sequence(None);
        let item = doc.add_scalar(None, "x", ScalarStyle::Any);

        doc.append_sequence_item(outer, inner).unwrap();
        doc.append_sequence_item(inner, item).unwrap();

        assert_eq!(
            doc.append_sequence_item(outer, item),
            Err(AppendError::AlreadyOwned(item))
        );
        assert_eq!(
            doc.append_sequence_item(inner, outer),
            Err(AppendError::Cycle {
                container: inner,
                item: outer
            })
        );
        assert_eq!(
            doc.append_sequence_item(outer, outer),
            Err(AppendError::Cycle {
                container: outer,
                item: outer
            })
        );
    }
}
