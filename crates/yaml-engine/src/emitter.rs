//! Event-driven block-style emitter.
//!
//! Text is accumulated in an internal buffer and handed to the [`Output`]
//! callback on [`Emitter::flush`], at the end of every document, at the end of
//! the stream, and whenever the buffer grows past a threshold. Only
//! [`Emitter::flush`] also asks the output to flush itself. An output that
//! reports failure turns into a writer error.

use crate::document::{NodeData, NodeId};
use crate::scalar::{self, Placement};
use crate::{Document, Encoding, EngineError, Event, Result, ScalarStyle};
use tracing::{debug, trace};

const FLUSH_THRESHOLD: usize = 16 * 1024;

/// Destination of the emitted bytes.
pub trait Output {
    /// Write all of `bytes`; returning `false` reports a write failure.
    fn write(&mut self, bytes: &[u8]) -> bool;

    /// Push written bytes to their final destination; `false` reports a
    /// failure.
    fn flush(&mut self) -> bool {
        true
    }
}

impl<F> Output for F
where
    F: FnMut(&[u8]) -> bool,
{
    fn write(&mut self, bytes: &[u8]) -> bool {
        self(bytes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    StreamStart,
    FirstDocumentStart,
    DocumentStart,
    DocumentContent,
    DocumentEnd,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CollectionKind {
    Sequence,
    Mapping,
}

/// How the first entry of a collection is positioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opening {
    /// At the start of a line (document root)
    LineStart,
    /// On the same line, right after a sequence dash
    Inline,
    /// On the next line, after a mapping key
    NewLine,
}

#[derive(Debug, Clone, Copy)]
struct Level {
    kind: CollectionKind,
    indent: usize,
    opening: Opening,
    count: usize,
    expect_value: bool,
}

/// Where the next node goes.
enum Slot {
    Root,
    Item { indent: usize },
    Key,
    Value { indent: usize },
}

pub struct Emitter<O> {
    output: O,
    encoding: Encoding,
    indent: usize,
    buffer: String,
    column: usize,
    state: State,
    levels: Vec<Level>,
}

impl<O: Output> Emitter<O> {
    pub fn new(output: O) -> Self {
        Self {
            output,
            encoding: Encoding::Any,
            indent: 2,
            buffer: String::new(),
            column: 0,
            state: State::StreamStart,
            levels: Vec::new(),
        }
    }

    /// Output encoding; `Any` defers to the `StreamStart` event, then UTF-8.
    pub fn set_encoding(&mut self, encoding: Encoding) {
        self.encoding = encoding;
    }

    /// Indentation step, clamped to 2..=9.
    pub fn set_indent(&mut self, indent: usize) {
        self.indent = indent.clamp(2, 9);
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn into_output(self) -> O {
        self.output
    }

    pub fn emit(&mut self, event: Event) -> Result<()> {
        trace!(event = event.name(), "emit");
        match self.state {
            State::StreamStart => self.emit_stream_start(event)?,
            State::FirstDocumentStart | State::DocumentStart => self.emit_document_start(event)?,
            State::DocumentContent => self.emit_node(event)?,
            State::DocumentEnd => self.emit_document_end(event)?,
            State::End => return Err(EngineError::emitter("expected nothing")),
        }
        if self.buffer.len() >= FLUSH_THRESHOLD {
            self.write_buffer()?;
        }
        Ok(())
    }

    /// Emit a whole document, opening the stream first if needed.
    ///
    /// A document without a root closes the stream.
    pub fn dump(&mut self, document: Document) -> Result<()> {
        if self.state == State::StreamStart {
            self.emit(Event::StreamStart {
                encoding: Encoding::Any,
            })?;
        }
        let Some(root) = document.root() else {
            debug!("dumping empty document, closing stream");
            return self.emit(Event::StreamEnd);
        };
        debug!(nodes = document.len(), "dumping document");
        self.emit(Event::DocumentStart {
            implicit: document.start_implicit,
        })?;

        enum Step {
            Enter(NodeId),
            Leave(NodeId, CollectionKind),
        }
        let mut on_path = vec![false; document.len()];
        let mut stack = vec![Step::Enter(root)];
        while let Some(step) = stack.pop() {
            let (id, kind) = match step {
                Step::Leave(id, kind) => {
                    on_path[id.get() - 1] = false;
                    self.emit(match kind {
                        CollectionKind::Sequence => Event::SequenceEnd,
                        CollectionKind::Mapping => Event::MappingEnd,
                    })?;
                    continue;
                }
                Step::Enter(id) => {
                    let node = document
                        .node(id)
                        .ok_or_else(|| EngineError::emitter(format!("invalid node reference {id}")))?;
                    match &node.data {
                        NodeData::Scalar { value, style } => {
                            self.emit(Event::Scalar {
                                value: value.clone(),
                                style: *style,
                            })?;
                            continue;
                        }
                        NodeData::Sequence { items } => {
                            stack.push(Step::Leave(id, CollectionKind::Sequence));
                            stack.extend(items.iter().rev().map(|item| Step::Enter(*item)));
                            (id, CollectionKind::Sequence)
                        }
                        NodeData::Mapping { pairs } => {
                            stack.push(Step::Leave(id, CollectionKind::Mapping));
                            for pair in pairs.iter().rev() {
                                stack.push(Step::Enter(pair.value));
                                stack.push(Step::Enter(pair.key));
                            }
                            (id, CollectionKind::Mapping)
                        }
                    }
                }
            };
            if std::mem::replace(&mut on_path[id.get() - 1], true) {
                return Err(EngineError::emitter(format!("recursive node reference {id}")));
            }
            self.emit(match kind {
                CollectionKind::Sequence => Event::SequenceStart,
                CollectionKind::Mapping => Event::MappingStart,
            })?;
        }

        self.emit(Event::DocumentEnd {
            implicit: document.end_implicit,
        })
    }

    /// Hand everything buffered so far to the output, then flush it.
    pub fn flush(&mut self) -> Result<()> {
        self.write_buffer()?;
        if self.output.flush() {
            Ok(())
        } else {
            Err(EngineError::writer("flush error"))
        }
    }

    fn write_buffer(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.buffer);
        let written = match self.encoding {
            Encoding::Utf16Le => {
                let bytes: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
                self.output.write(&bytes)
            }
            Encoding::Utf16Be => {
                let bytes: Vec<u8> = text.encode_utf16().flat_map(u16::to_be_bytes).collect();
                self.output.write(&bytes)
            }
            Encoding::Utf8 | Encoding::Any => self.output.write(text.as_bytes()),
        };
        if written {
            Ok(())
        } else {
            Err(EngineError::writer("write error"))
        }
    }

    fn emit_stream_start(&mut self, event: Event) -> Result<()> {
        let Event::StreamStart { encoding } = event else {
            return Err(expected("STREAM-START", &event));
        };
        if self.encoding == Encoding::Any {
            self.encoding = encoding;
        }
        if self.encoding == Encoding::Any {
            self.encoding = Encoding::Utf8;
        }
        if matches!(self.encoding, Encoding::Utf16Le | Encoding::Utf16Be) {
            self.buffer.push('\u{FEFF}');
        }
        self.state = State::FirstDocumentStart;
        Ok(())
    }

    fn emit_document_start(&mut self, event: Event) -> Result<()> {
        match event {
            Event::DocumentStart { implicit } => {
                if !implicit || self.state != State::FirstDocumentStart {
                    self.write("---\n");
                }
                self.state = State::DocumentContent;
                Ok(())
            }
            Event::StreamEnd => {
                self.state = State::End;
                self.write_buffer()
            }
            other => Err(expected("DOCUMENT-START or STREAM-END", &other)),
        }
    }

    fn emit_document_end(&mut self, event: Event) -> Result<()> {
        let Event::DocumentEnd { implicit } = event else {
            return Err(expected("DOCUMENT-END", &event));
        };
        if !implicit {
            self.write("...\n");
        }
        self.state = State::DocumentStart;
        self.write_buffer()
    }

    fn emit_node(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Scalar { value, style } => self.emit_scalar(&value, style),
            Event::SequenceStart => self.open(CollectionKind::Sequence),
            Event::MappingStart => self.open(CollectionKind::Mapping),
            Event::SequenceEnd => self.close(CollectionKind::Sequence),
            Event::MappingEnd => self.close(CollectionKind::Mapping),
            other => Err(expected("SCALAR, SEQUENCE-START or MAPPING-START", &other)),
        }
    }

    fn begin_node(&mut self, is_scalar: bool) -> Result<Slot> {
        let step = self.indent;
        let Some(level) = self.levels.last().copied() else {
            return Ok(Slot::Root);
        };
        match (level.kind, level.expect_value) {
            (CollectionKind::Sequence, _) => {
                self.begin_entry(level);
                self.write("- ");
                Ok(Slot::Item {
                    indent: level.indent + step,
                })
            }
            (CollectionKind::Mapping, false) => {
                if !is_scalar {
                    return Err(EngineError::emitter("expected a scalar mapping key"));
                }
                self.begin_entry(level);
                self.set_expect_value(true);
                Ok(Slot::Key)
            }
            (CollectionKind::Mapping, true) => {
                self.set_expect_value(false);
                Ok(Slot::Value {
                    indent: level.indent + step,
                })
            }
        }
    }

    fn begin_entry(&mut self, level: Level) {
        if level.count == 0 && level.opening == Opening::NewLine {
            self.write("\n");
        }
        self.pad_to(level.indent);
        if let Some(top) = self.levels.last_mut() {
            top.count += 1;
        }
    }

    fn set_expect_value(&mut self, expect_value: bool) {
        if let Some(top) = self.levels.last_mut() {
            top.expect_value = expect_value;
        }
    }

    fn emit_scalar(&mut self, value: &str, style: ScalarStyle) -> Result<()> {
        match self.begin_node(true)? {
            Slot::Root => {
                self.write_scalar(value, style, Placement::Value, self.indent);
                self.state = State::DocumentEnd;
            }
            Slot::Item { indent } => self.write_scalar(value, style, Placement::Value, indent),
            Slot::Key => {
                self.write_scalar(value, style, Placement::Key, 0);
                self.write(":");
            }
            Slot::Value { indent } => {
                self.write(" ");
                self.write_scalar(value, style, Placement::Value, indent);
            }
        }
        Ok(())
    }

    fn open(&mut self, kind: CollectionKind) -> Result<()> {
        let (indent, opening) = match self.begin_node(false)? {
            Slot::Root => (0, Opening::LineStart),
            Slot::Item { indent } => (indent, Opening::Inline),
            Slot::Value { indent } => (indent, Opening::NewLine),
            Slot::Key => return Err(EngineError::emitter("expected a scalar mapping key")),
        };
        self.levels.push(Level {
            kind,
            indent,
            opening,
            count: 0,
            expect_value: false,
        });
        Ok(())
    }

    fn close(&mut self, kind: CollectionKind) -> Result<()> {
        let level = match self.levels.last().copied() {
            Some(level) if level.kind == kind => level,
            _ => {
                return Err(EngineError::emitter(format!(
                    "unexpected {}",
                    match kind {
                        CollectionKind::Sequence => "SEQUENCE-END",
                        CollectionKind::Mapping => "MAPPING-END",
                    }
                )));
            }
        };
        if level.expect_value {
            return Err(EngineError::emitter("expected a mapping value"));
        }
        self.levels.pop();
        if level.count == 0 {
            if level.opening == Opening::NewLine {
                self.write(" ");
            }
            self.write(match kind {
                CollectionKind::Sequence => "[]\n",
                CollectionKind::Mapping => "{}\n",
            });
        }
        if self.levels.is_empty() {
            self.state = State::DocumentEnd;
        }
        Ok(())
    }

    /// Write a scalar; values end their line, keys do not.
    fn write_scalar(&mut self, value: &str, style: ScalarStyle, placement: Placement, indent: usize) {
        let style = scalar::resolve_style(value, style, placement);
        match style {
            ScalarStyle::Literal | ScalarStyle::Folded => {
                self.write_block(value, style == ScalarStyle::Folded, indent);
                return;
            }
            ScalarStyle::SingleQuoted => self.write(&scalar::single_quoted(value)),
            ScalarStyle::DoubleQuoted => self.write(&scalar::double_quoted(value)),
            ScalarStyle::Plain | ScalarStyle::Any => self.write(value),
        }
        if placement == Placement::Value {
            self.write("\n");
        }
    }

    fn write_block(&mut self, value: &str, folded: bool, indent: usize) {
        let block = scalar::block(value);
        self.write(if folded { ">" } else { "|" });
        self.write(block.chomping);
        self.write("\n");
        let last = block.lines.len().saturating_sub(1);
        for (i, line) in block.lines.iter().enumerate() {
            if !line.is_empty() {
                self.pad_to(indent);
                self.write(line);
            }
            self.write("\n");
            // A single break between two lines would fold into a space.
            if folded && i < last && !line.is_empty() {
                self.write("\n");
            }
        }
        for _ in 0..block.extra_breaks {
            self.write("\n");
        }
    }

    fn pad_to(&mut self, column: usize) {
        if self.column < column {
            let padding = " ".repeat(column - self.column);
            self.write(&padding);
        }
    }

    fn write(&mut self, text: &str) {
        self.buffer.push_str(text);
        match text.rfind('\n') {
            Some(pos) => self.column = text[pos + 1..].chars().count(),
            None => self.column += text.chars().count(),
        }
    }
}

fn expected(what: &str, found: &Event) -> EngineError {
    EngineError::emitter(format!("expected {what}, found {}", found.name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorStage;

    fn emit_all(events: Vec<Event>) -> Result<String> {
        let mut out = Vec::new();
        {
            let mut emitter = Emitter::new(|bytes: &[u8]| {
                out.extend_from_slice(bytes);
                true
            });
            for event in events {
                emitter.emit(event)?;
            }
            emitter.flush()?;
        }
        Ok(String::from_utf8(out).unwrap())
    }

    fn scalar(value: &str) -> Event {
        Event::Scalar {
            value: value.to_string(),
            style: ScalarStyle::Any,
        }
    }

    fn document(body: Vec<Event>) -> Vec<Event> {
        let mut events = vec![
            Event::StreamStart {
                encoding: Encoding::Utf8,
            },
            Event::DocumentStart { implicit: true },
        ];
        events.extend(body);
        events.push(Event::DocumentEnd { implicit: true });
        events.push(Event::StreamEnd);
        events
    }

    #[test]
    fn test_emit_nested_block_collections() {
        let text = emit_all(document(vec![
            Event::MappingStart,
            scalar("name"),
            scalar("demo"),
            scalar("items"),
            Event::SequenceStart,
            scalar("a"),
            Event::MappingStart,
            scalar("x"),
            scalar("1"),
            scalar("y"),
            scalar("2"),
            Event::MappingEnd,
            Event::SequenceStart,
            scalar("b"),
            scalar("c"),
            Event::SequenceEnd,
            Event::SequenceEnd,
            scalar("empty"),
            Event::MappingStart,
            Event::MappingEnd,
            Event::MappingEnd,
        ]))
        .unwrap();
        assert_eq!(
            text,
            "name: demo\nitems:\n  - a\n  - x: 1\n    y: 2\n  - - b\n    - c\nempty: {}\n"
        );
    }

    #[test]
    fn test_emit_scalar_styles() {
        let styled = |value: &str, style| Event::Scalar {
            value: value.to_string(),
            style,
        };
        let text = emit_all(document(vec![
            Event::MappingStart,
            scalar("plain"),
            styled("123", ScalarStyle::Plain),
            scalar("single"),
            styled("123", ScalarStyle::SingleQuoted),
            scalar("double"),
            styled("a\"b", ScalarStyle::DoubleQuoted),
            scalar("literal"),
            styled("one\ntwo\n", ScalarStyle::Literal),
            scalar("folded"),
            styled("one\ntwo", ScalarStyle::Folded),
            Event::MappingEnd,
        ]))
        .unwrap();
        assert_eq!(
            text,
            "plain: 123\nsingle: '123'\ndouble: \"a\\\"b\"\nliteral: |\n  one\n  two\nfolded: >-\n  one\n\n  two\n"
        );
    }

    #[test]
    fn test_explicit_documents() {
        let text = emit_all(vec![
            Event::StreamStart {
                encoding: Encoding::Any,
            },
            Event::DocumentStart { implicit: true },
            scalar("a"),
            Event::DocumentEnd { implicit: true },
            Event::DocumentStart { implicit: true },
            Event::SequenceStart,
            Event::SequenceEnd,
            Event::DocumentEnd { implicit: false },
            Event::StreamEnd,
        ])
        .unwrap();
        assert_eq!(text, "a\n---\n[]\n...\n");
    }

    #[test]
    fn test_event_order_is_validated() {
        let err = emit_all(vec![Event::DocumentStart { implicit: true }]).unwrap_err();
        assert_eq!(err.stage, ErrorStage::Emitter);
        assert!(err.problem.starts_with("expected STREAM-START"));

        let err = emit_all(document(vec![
            Event::MappingStart,
            Event::SequenceStart,
            Event::SequenceEnd,
            Event::MappingEnd,
        ]))
        .unwrap_err();
        assert_eq!(err.problem, "expected a scalar mapping key");

        let err = emit_all(document(vec![
            Event::MappingStart,
            scalar("k"),
            Event::MappingEnd,
        ]))
        .unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"emitter error: expected a mapping value");

        let mut events = document(vec![scalar("a")]);
        events.push(Event::StreamEnd);
        let err = emit_all(events).unwrap_err();
        assert_eq!(err.problem, "expected nothing");
    }

    #[test]
    fn test_failed_write_is_writer_error() {
        let mut emitter = Emitter::new(|_: &[u8]| false);
        emitter
            .emit(Event::StreamStart {
                encoding: Encoding::Utf8,
            })
            .unwrap();
        emitter.emit(Event::DocumentStart { implicit: true }).unwrap();
        emitter.emit(scalar("a")).unwrap();
        let err = emitter
            .emit(Event::DocumentEnd { implicit: true })
            .unwrap_err();
        assert_eq!(err.stage, ErrorStage::Writer);
    }

    #[test]
    fn test_failed_output_flush_is_writer_error() {
        struct Unflushable(Vec<u8>);

        impl Output for Unflushable {
            fn write(&mut self, bytes: &[u8]) -> bool {
                self.0.extend_from_slice(bytes);
                true
            }

            fn flush(&mut self) -> bool {
                false
            }
        }

        let mut emitter = Emitter::new(Unflushable(Vec::new()));
        emitter
            .emit(Event::StreamStart {
                encoding: Encoding::Utf8,
            })
            .unwrap();
        emitter.emit(Event::DocumentStart { implicit: true }).unwrap();
        emitter.emit(scalar("a")).unwrap();
        emitter.emit(Event::DocumentEnd { implicit: true }).unwrap();
        let err = emitter.flush().unwrap_err();
        assert_eq!(err.stage, ErrorStage::Writer);
        assert_eq!(err.problem, "flush error");
        assert_eq!(emitter.into_output().0, b"a\n");
    }

    #[test]
    fn test_dump_document() {
        let mut doc = Document::new();
        let map = doc.add_mapping(None);
        let key = doc.add_scalar(None, "list", ScalarStyle::Any);
        let seq = doc.add_sequence(None);
        doc.append_mapping_pair(map, key, seq).unwrap();
        for value in ["x", "y"] {
            let item = doc.add_scalar(None, value, ScalarStyle::Any);
            doc.append_sequence_item(seq, item).unwrap();
        }

        let mut out = Vec::new();
        let mut emitter = Emitter::new(|bytes: &[u8]| {
            out.extend_from_slice(bytes);
            true
        });
        emitter.dump(doc).unwrap();
        emitter.dump(Document::new()).unwrap();
        drop(emitter);
        assert_eq!(String::from_utf8(out).unwrap(), "list:\n  - x\n  - y\n");
    }

    #[test]
    fn test_utf16_output_has_bom() {
        let mut out = Vec::new();
        let mut emitter = Emitter::new(|bytes: &[u8]| {
            out.extend_from_slice(bytes);
            true
        });
        emitter.set_encoding(Encoding::Utf16Le);
        emitter.dump(Document::new()).unwrap();
        drop(emitter);
        assert_eq!(out, vec![0xFF, 0xFE]);
    }
}
