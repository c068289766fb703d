//! Parser: reader + yaml-rust2 + composer.
//!
//! The composer implements `MarkedEventReceiver` and turns the yaml-rust2
//! event stream into a [`Document`] node pool. Nodes are added in document
//! order and attached to their parent as soon as they start, so the root is
//! always the first node. Aliases attach the anchored node again instead of
//! copying it, which means a composed graph may share nodes and, through an
//! alias inside its own anchor, contain cycles.

use crate::document::{
    DEFAULT_MAPPING_TAG, DEFAULT_SCALAR_TAG, DEFAULT_SEQUENCE_TAG, NodeData, NodePair,
};
use crate::reader::{self, Encoding};
use crate::{Document, EngineError, Mark, NodeId, Result, ScalarStyle};
use std::collections::HashMap;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser as EventParser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// Loads documents from an in-memory input.
#[derive(Debug, Default)]
pub struct Parser {
    input: Vec<u8>,
    encoding: Encoding,
    stream_ended: bool,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_input(&mut self, input: Vec<u8>) {
        self.input = input;
        self.stream_ended = false;
    }

    /// Fix the input encoding instead of sniffing a BOM.
    pub fn set_encoding(&mut self, encoding: Encoding) {
        self.encoding = encoding;
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Compose the first document of the input.
    ///
    /// Once the stream has been consumed, further calls return an empty
    /// document.
    pub fn load(&mut self) -> Result<Document> {
        if self.stream_ended {
            return Ok(Document::new());
        }
        self.stream_ended = true;

        let text = reader::decode(&self.input, self.encoding)?;
        let mut composer = Composer::default();
        let mut events = EventParser::new_from_str(&text);
        events.load(&mut composer, false)?;
        composer.finish()
    }
}

/// An open collection on the composer stack.
enum Frame {
    Sequence(NodeId),
    Mapping {
        id: NodeId,
        pending_key: Option<NodeId>,
    },
}

#[derive(Default)]
struct Composer {
    document: Document,
    stack: Vec<Frame>,
    anchors: HashMap<usize, NodeId>,
    error: Option<EngineError>,
}

impl Composer {
    fn finish(self) -> Result<Document> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.document),
        }
    }

    fn add(&mut self, anchor: usize, tag: String, data: NodeData, mark: Mark) -> NodeId {
        let id = self.document.push_node(tag, data, mark);
        if anchor > 0 {
            self.anchors.insert(anchor, id);
        }
        self.attach(id);
        id
    }

    fn attach(&mut self, child: NodeId) {
        let Some(frame) = self.stack.last_mut() else {
            return;
        };
        match frame {
            Frame::Sequence(id) => {
                if let Some(node) = self.document.node_mut(*id) {
                    if let NodeData::Sequence { items } = &mut node.data {
                        items.push(child);
                    }
                }
            }
            Frame::Mapping { id, pending_key } => match pending_key.take() {
                None => {
                    *pending_key = Some(child);
                    let mapping = *id;
                    self.pull_start_to_key(mapping, child);
                }
                Some(key) => {
                    if let Some(node) = self.document.node_mut(*id) {
                        if let NodeData::Mapping { pairs } = &mut node.data {
                            pairs.push(NodePair { key, value: child });
                        }
                    }
                }
            },
        }
    }

    /// yaml-rust2 marks a block mapping at its first `:`; start it at the
    /// first key instead.
    fn pull_start_to_key(&mut self, mapping: NodeId, key: NodeId) {
        let Some(key_mark) = self.document.node(key).map(|node| node.start_mark) else {
            return;
        };
        if let Some(node) = self.document.node_mut(mapping) {
            let unpaired = matches!(&node.data, NodeData::Mapping { pairs } if pairs.is_empty());
            if unpaired && key_mark < node.start_mark {
                node.start_mark = key_mark;
            }
        }
    }

    fn close(&mut self, mark: Mark) {
        let id = match self.stack.pop() {
            Some(Frame::Sequence(id)) | Some(Frame::Mapping { id, .. }) => id,
            None => return,
        };
        if let Some(node) = self.document.node_mut(id) {
            node.end_mark = mark;
        }
    }
}

impl MarkedEventReceiver for Composer {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        if self.error.is_some() {
            return;
        }
        let mark = Mark::from(&marker);
        match ev {
            Event::Scalar(value, style, anchor, tag) => {
                let data = NodeData::Scalar {
                    value,
                    style: convert_style(style),
                };
                let tag = resolve_tag(tag, DEFAULT_SCALAR_TAG);
                let id = self.add(anchor, tag, data, mark);
                if let Some(node) = self.document.node_mut(id) {
                    node.end_mark = mark;
                }
            }
            Event::SequenceStart(anchor, tag) => {
                let tag = resolve_tag(tag, DEFAULT_SEQUENCE_TAG);
                let id = self.add(anchor, tag, NodeData::Sequence { items: Vec::new() }, mark);
                self.stack.push(Frame::Sequence(id));
            }
            Event::MappingStart(anchor, tag) => {
                let tag = resolve_tag(tag, DEFAULT_MAPPING_TAG);
                let id = self.add(anchor, tag, NodeData::Mapping { pairs: Vec::new() }, mark);
                self.stack.push(Frame::Mapping {
                    id,
                    pending_key: None,
                });
            }
            Event::SequenceEnd | Event::MappingEnd => self.close(mark),
            Event::Alias(anchor) => match self.anchors.get(&anchor).copied() {
                Some(id) => self.attach(id),
                None => {
                    self.error = Some(EngineError::composer("found undefined alias", mark));
                }
            },
            Event::DocumentStart { .. } => self.document.start_mark = mark,
            Event::DocumentEnd { .. } => self.document.end_mark = mark,
            _ => {}
        }
    }
}

fn convert_style(style: TScalarStyle) -> ScalarStyle {
    match style {
        TScalarStyle::Plain => ScalarStyle::Plain,
        TScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
        TScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
        TScalarStyle::Literal => ScalarStyle::Literal,
        TScalarStyle::Folded => ScalarStyle::Folded,
        #[allow(unreachable_patterns)]
        _ => ScalarStyle::Any,
    }
}

/// Untagged and non-specific (`!`) nodes get the default tag of their kind.
fn resolve_tag(tag: Option<Tag>, default: &str) -> String {
    let Some(tag) = tag else {
        return default.to_string();
    };
    let full = if tag.handle == "!!" {
        format!("tag:yaml.org,2002:{}", tag.suffix)
    } else {
        format!("{}{}", tag.handle, tag.suffix)
    };
    if full.is_empty() || full == "!" {
        default.to_string()
    } else {
        full
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(text: &str) -> Document {
        let mut parser = Parser::new();
        parser.set_input(text.as_bytes().to_vec());
        parser.load().unwrap()
    }

    fn scalar(doc: &Document, id: NodeId) -> (&str, ScalarStyle) {
        match &doc.node(id).unwrap().data {
            NodeData::Scalar { value, style } => (value, *style),
            other => panic!("expected scalar, got {:?}", other),
        }
    }

    #[test]
    fn test_compose_mapping() {
        let doc = load("a: b\nc: 'd'\n");
        let root = doc.root().unwrap();
        let NodeData::Mapping { pairs } = &doc.node(root).unwrap().data else {
            panic!("expected mapping");
        };
        assert_eq!(pairs.len(), 2);
        assert_eq!(scalar(&doc, pairs[0].key), ("a", ScalarStyle::Plain));
        assert_eq!(scalar(&doc, pairs[1].value), ("d", ScalarStyle::SingleQuoted));
        assert_eq!(doc.node(root).unwrap().tag, DEFAULT_MAPPING_TAG);
    }

    #[test]
    fn test_block_mapping_starts_at_first_key() {
        let doc = load("top: 1\nnested:\n  xy: 1\n");
        let root = doc.root_node().unwrap();
        assert_eq!((root.start_mark.line, root.start_mark.column), (0, 0));
        let NodeData::Mapping { pairs } = &root.data else {
            panic!("expected mapping");
        };
        let nested = doc.node(pairs[1].value).unwrap();
        assert_eq!((nested.start_mark.line, nested.start_mark.column), (2, 2));

        let doc = load("{a: 1}");
        assert_eq!(doc.root_node().unwrap().start_mark.column, 0);
    }

    #[test]
    fn test_compose_preorder_ids() {
        let doc = load("- [x, y]\n- z\n");
        let root = doc.root().unwrap();
        let NodeData::Sequence { items } = &doc.node(root).unwrap().data else {
            panic!("expected sequence");
        };
        assert_eq!(items.iter().map(|id| id.get()).collect::<Vec<_>>(), vec![2, 5]);
        assert_eq!(scalar(&doc, items[1]).0, "z");
    }

    #[test]
    fn test_explicit_tags() {
        let doc = load("a: !!int 3\nb: !custom x\nc: ! y\n");
        let NodeData::Mapping { pairs } = &doc.root_node().unwrap().data else {
            panic!("expected mapping");
        };
        assert_eq!(doc.node(pairs[0].value).unwrap().tag, "tag:yaml.org,2002:int");
        assert_eq!(doc.node(pairs[1].value).unwrap().tag, "!custom");
        assert_eq!(doc.node(pairs[2].value).unwrap().tag, DEFAULT_SCALAR_TAG);
    }

    #[test]
    fn test_alias_shares_node() {
        let doc = load("a: &x [1]\nb: *x\n");
        let NodeData::Mapping { pairs } = &doc.root_node().unwrap().data else {
            panic!("expected mapping");
        };
        assert_eq!(pairs[0].value, pairs[1].value);
    }

    #[test]
    fn test_empty_input_has_no_root() {
        assert!(load("").root().is_none());
    }

    #[test]
    fn test_second_load_is_empty() {
        let mut parser = Parser::new();
        parser.set_input(b"a: b".to_vec());
        assert!(parser.load().unwrap().root().is_some());
        assert!(parser.load().unwrap().root().is_none());
    }

    #[test]
    fn test_reader_errors_surface() {
        let mut parser = Parser::new();
        parser.set_input(b"a: \x01".to_vec());
        let err = parser.load().unwrap_err();
        assert_eq!(err.stage, crate::ErrorStage::Reader);
    }

    #[test]
    fn test_syntax_errors_carry_marks() {
        let mut parser = Parser::new();
        parser.set_input(b"a: 'unterminated".to_vec());
        let err = parser.load().unwrap_err();
        assert!(err.problem_mark.is_some());
        assert!(!err.problem.is_empty());
    }
}
