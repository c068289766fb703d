//! Materialized documents and the builder used to emit them.

use crate::error::{BuildFailure, Error, Result, YamlError};
use crate::{Mark, Node, NodeValue};
use serde::{Deserialize, Serialize};
use yaml_engine::{NodeData, NodeId, NodePair};

/// Presentation style requested for a scalar added to a [`DocumentBuilder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarStyle {
    #[default]
    Any,
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

impl From<ScalarStyle> for yaml_engine::ScalarStyle {
    fn from(style: ScalarStyle) -> Self {
        match style {
            ScalarStyle::Any => yaml_engine::ScalarStyle::Any,
            ScalarStyle::Plain => yaml_engine::ScalarStyle::Plain,
            ScalarStyle::SingleQuoted => yaml_engine::ScalarStyle::SingleQuoted,
            ScalarStyle::DoubleQuoted => yaml_engine::ScalarStyle::DoubleQuoted,
            ScalarStyle::Literal => yaml_engine::ScalarStyle::Literal,
            ScalarStyle::Folded => yaml_engine::ScalarStyle::Folded,
        }
    }
}

/// A loaded document. Empty when the stream held no further document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    root: Option<Node>,
}

/// Children of a collection being copied.
enum Children<'g> {
    Items(&'g [NodeId]),
    Pairs(&'g [NodePair]),
}

/// An open collection during materialization.
struct Frame<'g> {
    children: Children<'g>,
    cursor: usize,
    built: Node,
    /// Key of the pair whose value is being copied
    key: Option<Node>,
}

impl Frame<'_> {
    fn attach(&mut self, child: Node) {
        match &mut self.built.value {
            NodeValue::Sequence(items) => items.push(child),
            NodeValue::Mapping(pairs) => {
                if let Some(key) = self.key.take() {
                    pairs.push((key, child));
                }
            }
            NodeValue::None | NodeValue::Scalar { .. } => {}
        }
    }
}

impl Document {
    /// Collections nested deeper than this are rejected.
    pub const MAX_NESTING_DEPTH: usize = 100;

    pub fn new(root: Node) -> Self {
        Self { root: Some(root) }
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    pub fn into_root(self) -> Option<Node> {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Copy a composed node graph into an owned tree.
    ///
    /// The walk keeps its own stack, so the nesting limit is the only bound
    /// on depth. Aliases are copied at every use; an alias cycle therefore
    /// trips the nesting limit. Nothing bounds the total size: nested aliases
    /// to aliased collections grow the tree exponentially, so untrusted input
    /// can take a long time and a lot of memory to materialize.
    pub(crate) fn materialize(graph: &yaml_engine::Document) -> Result<Self> {
        let Some(root) = graph.root() else {
            return Ok(Self::default());
        };
        let mut stack: Vec<Frame<'_>> = Vec::new();
        if let Some(scalar) = enter(graph, root, &mut stack)? {
            return Ok(Self::new(scalar));
        }

        loop {
            let next = match stack.last_mut() {
                Some(frame) => next_child(graph, frame)?,
                None => return Ok(Self::default()),
            };
            let completed = match next {
                Some(id) => enter(graph, id, &mut stack)?,
                None => stack.pop().map(|frame| frame.built),
            };
            if let Some(node) = completed {
                match stack.last_mut() {
                    Some(parent) => parent.attach(node),
                    None => return Ok(Self::new(node)),
                }
            }
        }
    }
}

fn lookup(graph: &yaml_engine::Document, id: NodeId) -> Result<&yaml_engine::Node> {
    graph.node(id).ok_or(Error::OutOfBounds(id))
}

/// Start copying node `id`. Scalars are returned finished; collections are
/// pushed as a new frame.
fn enter<'g>(
    graph: &'g yaml_engine::Document,
    id: NodeId,
    stack: &mut Vec<Frame<'g>>,
) -> Result<Option<Node>> {
    let node = lookup(graph, id)?;
    let (children, value) = match &node.data {
        NodeData::Scalar { .. } => return copy_scalar(node).map(Some),
        NodeData::Sequence { items } => (
            Children::Items(items),
            NodeValue::Sequence(Vec::with_capacity(items.len())),
        ),
        NodeData::Mapping { pairs } => (
            Children::Pairs(pairs),
            NodeValue::Mapping(Vec::with_capacity(pairs.len())),
        ),
    };
    if stack.len() >= Document::MAX_NESTING_DEPTH {
        return Err(BuildFailure::TooManyNestedLayers {
            limit: Document::MAX_NESTING_DEPTH,
        }
        .into());
    }
    let mark = Mark::from(node.start_mark);
    stack.push(Frame {
        children,
        cursor: 0,
        built: Node {
            value,
            tag: checked(&node.tag, mark)?,
            mark: Some(mark),
        },
        key: None,
    });
    Ok(None)
}

/// Advance `frame` to its next child. For mappings the key is copied here
/// and the value handle returned.
fn next_child(graph: &yaml_engine::Document, frame: &mut Frame<'_>) -> Result<Option<NodeId>> {
    let index = frame.cursor;
    frame.cursor += 1;
    match frame.children {
        Children::Items(items) => Ok(items.get(index).copied()),
        Children::Pairs(pairs) => {
            let Some(pair) = pairs.get(index) else {
                return Ok(None);
            };
            let key = lookup(graph, pair.key)?;
            if !matches!(key.data, NodeData::Scalar { .. }) {
                return Err(YamlError::policy(
                    "invalid mapping key",
                    Some(Mark::from(key.start_mark)),
                )
                .into());
            }
            frame.key = Some(copy_scalar(key)?);
            Ok(Some(pair.value))
        }
    }
}

fn copy_scalar(node: &yaml_engine::Node) -> Result<Node> {
    let mark = Mark::from(node.start_mark);
    let NodeData::Scalar { value, style } = &node.data else {
        return Err(YamlError::policy("expected a scalar", Some(mark)).into());
    };
    Ok(Node {
        value: NodeValue::Scalar {
            value: checked(value, mark)?,
            quoted: matches!(
                style,
                yaml_engine::ScalarStyle::SingleQuoted | yaml_engine::ScalarStyle::DoubleQuoted
            ),
        },
        tag: checked(&node.tag, mark)?,
        mark: Some(mark),
    })
}

/// C0 controls other than TAB, LF and CR, and DEL.
fn is_disallowed(ch: char) -> bool {
    matches!(ch, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{7F}')
}

fn checked(text: &str, mark: Mark) -> Result<String> {
    if text.chars().any(is_disallowed) {
        return Err(YamlError::policy("unsupported control character", Some(mark)).into());
    }
    Ok(text.to_string())
}

/// Builds a node pool for [`Emitter::dump`](crate::Emitter::dump).
///
/// The first node added is the root. Appends keep the pool a tree: every
/// node belongs to at most one collection and no collection can contain
/// itself.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    graph: yaml_engine::Document,
}

/// Where a copied node goes in [`DocumentBuilder::from_node`].
enum Slot {
    Root,
    Item(NodeId),
    Value { mapping: NodeId, key: NodeId },
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_scalar(&mut self, value: &str, style: ScalarStyle) -> NodeId {
        self.graph.add_scalar(None, value, style.into())
    }

    pub fn add_sequence(&mut self) -> NodeId {
        self.graph.add_sequence(None)
    }

    pub fn add_mapping(&mut self) -> NodeId {
        self.graph.add_mapping(None)
    }

    pub fn append_sequence_item(&mut self, sequence: NodeId, item: NodeId) -> Result<()> {
        Ok(self.graph.append_sequence_item(sequence, item)?)
    }

    pub fn append_mapping_pair(&mut self, mapping: NodeId, key: NodeId, value: NodeId) -> Result<()> {
        Ok(self.graph.append_mapping_pair(mapping, key, value)?)
    }

    pub fn node(&self, handle: NodeId) -> Result<&yaml_engine::Node> {
        self.graph.node(handle).ok_or(Error::OutOfBounds(handle))
    }

    pub fn root(&self) -> Option<NodeId> {
        self.graph.root()
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Mirror a materialized tree. Quoted scalars are requested
    /// double-quoted, unquoted multi-line ones literal and the rest plain;
    /// `None` nodes become empty
    /// scalars, except at the root where they leave the builder empty.
    pub fn from_node(root: &Node) -> Result<Self> {
        let mut builder = Self::new();
        if root.is_none() {
            return Ok(builder);
        }
        let mut pending = vec![(root, Slot::Root)];
        while let Some((node, slot)) = pending.pop() {
            let id = builder.add_node(node);
            match slot {
                Slot::Root => {}
                Slot::Item(sequence) => builder.append_sequence_item(sequence, id)?,
                Slot::Value { mapping, key } => builder.append_mapping_pair(mapping, key, id)?,
            }
            match &node.value {
                NodeValue::Sequence(items) => {
                    pending.extend(items.iter().rev().map(|item| (item, Slot::Item(id))));
                }
                NodeValue::Mapping(pairs) => {
                    let mut values = Vec::with_capacity(pairs.len());
                    for (key, value) in pairs {
                        if !key.is_scalar() {
                            return Err(YamlError::policy("invalid mapping key", key.mark).into());
                        }
                        let key = builder.add_node(key);
                        values.push((value, Slot::Value { mapping: id, key }));
                    }
                    pending.extend(values.into_iter().rev());
                }
                NodeValue::None | NodeValue::Scalar { .. } => {}
            }
        }
        Ok(builder)
    }

    fn add_node(&mut self, node: &Node) -> NodeId {
        match &node.value {
            NodeValue::None => self.add_scalar("", ScalarStyle::Any),
            NodeValue::Scalar { value, quoted } => {
                let style = if *quoted {
                    ScalarStyle::DoubleQuoted
                } else if value.contains('\n') {
                    ScalarStyle::Literal
                } else {
                    ScalarStyle::Plain
                };
                self.add_scalar(value, style)
            }
            NodeValue::Sequence(_) => self.add_sequence(),
            NodeValue::Mapping(_) => self.add_mapping(),
        }
    }

    pub(crate) fn into_graph(self) -> yaml_engine::Document {
        self.graph
    }
}
