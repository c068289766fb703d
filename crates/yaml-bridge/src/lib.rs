//! # yaml-bridge
//!
//! Load YAML from bytes in whatever encoding they arrive in, materialize it
//! into an owned [`Node`] tree, and write YAML back out.
//!
//! ## Loading
//!
//! Input is normalized first: byte order marks are stripped, BOM-less
//! UTF-16 is recognized heuristically, and anything that is not valid UTF-8
//! is read as Windows-1252. The composed document is then copied into an
//! owned tree with an explicit stack, so hostile nesting fails with
//! [`BuildFailure::TooManyNestedLayers`] instead of exhausting the call
//! stack.
//!
//! ```rust,no_run
//! use yaml_bridge::Parser;
//!
//! let mut parser = Parser::from_bytes(b"\xEF\xBB\xBFtitle: My Document\n");
//! let document = parser.load()?;
//! let title = document.root().and_then(|root| root.get("title"));
//! assert_eq!(title.and_then(|t| t.as_str()), Some("My Document"));
//! # Ok::<(), yaml_bridge::Error>(())
//! ```
//!
//! ## Emitting
//!
//! Documents are written either event by event or by building a node pool
//! with [`DocumentBuilder`] and handing it to [`Emitter::dump`].

mod document;
mod emitter;
mod encoding;
mod error;
mod mark;
mod node;
mod parser;

pub use document::{Document, DocumentBuilder, ScalarStyle};
pub use emitter::{Emitter, Event};
pub use encoding::{Detection, NormalizedInput, normalize};
pub use error::{BuildFailure, Error, ErrorKind, Result, YamlError};
pub use mark::Mark;
pub use node::{Node, NodeValue};
pub use parser::Parser;
pub use yaml_engine::{Encoding, ErrorStage, NodeId};
