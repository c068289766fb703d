//! Emitter events.

use crate::{Encoding, ScalarStyle};

/// One step of the emission protocol.
///
/// A well-formed stream is `StreamStart`, any number of documents, then
/// `StreamEnd`. A document is `DocumentStart`, exactly one node, then
/// `DocumentEnd`; a node is a `Scalar` or a `SequenceStart`/`MappingStart`
/// with its children and the matching end event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    StreamStart { encoding: Encoding },
    StreamEnd,
    DocumentStart { implicit: bool },
    DocumentEnd { implicit: bool },
    Scalar { value: String, style: ScalarStyle },
    SequenceStart,
    SequenceEnd,
    MappingStart,
    MappingEnd,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::StreamStart { .. } => "STREAM-START",
            Event::StreamEnd => "STREAM-END",
            Event::DocumentStart { .. } => "DOCUMENT-START",
            Event::DocumentEnd { .. } => "DOCUMENT-END",
            Event::Scalar { .. } => "SCALAR",
            Event::SequenceStart => "SEQUENCE-START",
            Event::SequenceEnd => "SEQUENCE-END",
            Event::MappingStart => "MAPPING-START",
            Event::MappingEnd => "MAPPING-END",
        }
    }
}
