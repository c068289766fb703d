//! # yaml-engine
//!
//! The low-level YAML machinery underneath `yaml-bridge`.
//!
//! Scanning and parsing are delegated to `yaml-rust2`; this crate adds what
//! the bridge needs on top of it:
//!
//! - a reader that decodes UTF-8/UTF-16 input and rejects control characters
//! - a composer that turns parser events into an index-addressed node graph,
//!   with anchors and aliases resolved to shared node references
//! - an append API for building node graphs by hand
//! - a block-style emitter driven by [`Event`]s that writes through an
//!   [`Output`] callback
//!
//! Every failure is an [`EngineError`] tagged with the [`ErrorStage`] that
//! produced it.

mod document;
mod emitter;
mod error;
mod event;
mod mark;
mod parser;
mod reader;
mod scalar;

pub use document::{
    AppendError, DEFAULT_MAPPING_TAG, DEFAULT_SCALAR_TAG, DEFAULT_SEQUENCE_TAG, Document, Node,
    NodeData, NodeId, NodePair, ScalarStyle,
};
pub use emitter::{Emitter, Output};
pub use error::{EngineError, ErrorStage, Result};
pub use event::Event;
pub use mark::Mark;
pub use parser::Parser;
pub use reader::{Encoding, decode, is_printable};
