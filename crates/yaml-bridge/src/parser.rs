//! Loading documents from text, bytes, or readers.

use crate::encoding::{Detection, NormalizedInput, normalize};
use crate::error::{Result, from_parser_error};
use crate::Document;
use sha2::{Digest, Sha256};
use std::io::Read;
use tracing::debug;
use yaml_engine::Encoding;

/// Loads one document per [`Parser::load`] call from a normalized input.
#[derive(Debug)]
pub struct Parser {
    engine: yaml_engine::Parser,
    encoding: Encoding,
    detection: Detection,
}

impl Parser {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Self {
        Self::from_bytes(text.as_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::from_normalized(normalize(bytes.to_vec()))
    }

    /// Read `reader` to the end and parse what it produced.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self::from_normalized(normalize(bytes)))
    }

    /// Like [`Parser::from_reader`], also returning the SHA-256 digest of the
    /// raw bytes read.
    pub fn from_reader_with_hash<R: Read>(reader: R) -> Result<(Self, [u8; 32])> {
        let mut hashing = HashingReader {
            inner: reader,
            hasher: Sha256::new(),
        };
        let mut bytes = Vec::new();
        hashing.read_to_end(&mut bytes)?;
        let digest: [u8; 32] = hashing.hasher.finalize().into();
        Ok((Self::from_normalized(normalize(bytes)), digest))
    }

    fn from_normalized(input: NormalizedInput) -> Self {
        let mut engine = yaml_engine::Parser::new();
        engine.set_encoding(input.encoding);
        engine.set_input(input.bytes);
        Self {
            engine,
            encoding: input.encoding,
            detection: input.detection,
        }
    }

    /// The encoding the engine reads the input as.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn detection(&self) -> Detection {
        self.detection
    }

    /// Load the next document.
    ///
    /// Only the first document of a stream is read; later calls return an
    /// empty document.
    pub fn load(&mut self) -> Result<Document> {
        let graph = self.engine.load().map_err(from_parser_error)?;
        debug!(nodes = graph.len(), "composed YAML document");
        Document::materialize(&graph)
    }
}

/// Feeds every byte read through a SHA-256 hasher.
struct HashingReader<R> {
    inner: R,
    hasher: Sha256,
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }
}
