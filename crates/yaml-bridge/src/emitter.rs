//! Writing YAML to an `io::Write` sink.

use crate::error::{Result, from_emitter_error};
use crate::{DocumentBuilder, ScalarStyle};
use std::io::Write;
use tracing::{debug, error};
use yaml_engine::{Encoding, Output};

/// One step of the emission protocol.
///
/// Events are consumed by [`Emitter::emit`] and cannot be reused.
#[derive(Debug, PartialEq, Eq)]
pub struct Event(yaml_engine::Event);

impl Event {
    pub fn stream_start() -> Self {
        Self(yaml_engine::Event::StreamStart {
            encoding: Encoding::Utf8,
        })
    }

    pub fn stream_end() -> Self {
        Self(yaml_engine::Event::StreamEnd)
    }

    pub fn document_start() -> Self {
        Self(yaml_engine::Event::DocumentStart { implicit: true })
    }

    pub fn document_end() -> Self {
        Self(yaml_engine::Event::DocumentEnd { implicit: true })
    }

    pub fn sequence_start() -> Self {
        Self(yaml_engine::Event::SequenceStart)
    }

    pub fn sequence_end() -> Self {
        Self(yaml_engine::Event::SequenceEnd)
    }

    pub fn mapping_start() -> Self {
        Self(yaml_engine::Event::MappingStart)
    }

    pub fn mapping_end() -> Self {
        Self(yaml_engine::Event::MappingEnd)
    }

    pub fn scalar(value: impl Into<String>, style: ScalarStyle) -> Self {
        Self(yaml_engine::Event::Scalar {
            value: value.into(),
            style: style.into(),
        })
    }
}

/// Engine output that forwards to an `io::Write` sink.
struct SinkOutput<W> {
    sink: W,
}

impl<W: Write> Output for SinkOutput<W> {
    fn write(&mut self, bytes: &[u8]) -> bool {
        match self.sink.write_all(bytes) {
            Ok(()) => true,
            Err(err) => {
                error!(error = %err, len = bytes.len(), "failed to write YAML output");
                false
            }
        }
    }

    fn flush(&mut self) -> bool {
        match self.sink.flush() {
            Ok(()) => true,
            Err(err) => {
                error!(error = %err, "failed to flush YAML output");
                false
            }
        }
    }
}

/// Emits UTF-8 block-style YAML into a sink.
pub struct Emitter<W: Write> {
    engine: yaml_engine::Emitter<SinkOutput<W>>,
}

impl<W: Write> Emitter<W> {
    pub fn new(sink: W) -> Self {
        let mut engine = yaml_engine::Emitter::new(SinkOutput { sink });
        engine.set_encoding(Encoding::Utf8);
        Self { engine }
    }

    pub fn emit(&mut self, event: Event) -> Result<()> {
        self.engine.emit(event.0).map_err(from_emitter_error)
    }

    /// Emit a whole document, starting the stream if needed. An empty
    /// builder ends the stream.
    pub fn dump(&mut self, document: DocumentBuilder) -> Result<()> {
        debug!(nodes = document.len(), "dumping YAML document");
        self.engine
            .dump(document.into_graph())
            .map_err(from_emitter_error)
    }

    /// Write out buffered text and flush the sink.
    pub fn flush(&mut self) -> Result<()> {
        self.engine.flush().map_err(from_emitter_error)
    }

    pub fn get_ref(&self) -> &W {
        &self.engine.output().sink
    }

    /// Flush and return the sink.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.engine.into_output().sink)
    }
}
