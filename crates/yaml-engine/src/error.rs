//! Failure records reported by every engine operation.

use crate::Mark;
use std::fmt;
use yaml_rust2::ScanError;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// The engine stage that reported a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorStage {
    /// No error. Never attached to a failure produced by this crate.
    None,
    Memory,
    Reader,
    Scanner,
    Parser,
    Composer,
    Writer,
    Emitter,
}

impl fmt::Display for ErrorStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorStage::None => "no",
            ErrorStage::Memory => "memory",
            ErrorStage::Reader => "reader",
            ErrorStage::Scanner => "scanner",
            ErrorStage::Parser => "parser",
            ErrorStage::Composer => "composer",
            ErrorStage::Writer => "writer",
            ErrorStage::Emitter => "emitter",
        };
        f.write_str(name)
    }
}

/// A failure reported by the reader, scanner, parser, composer, writer or
/// emitter.
///
/// Which fields are meaningful depends on `stage`: reader failures fill
/// `problem_offset` and `problem_value`, scanner/parser/composer failures
/// fill the marks, writer/emitter failures only carry `problem`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{stage} error: {problem}")]
pub struct EngineError {
    pub stage: ErrorStage,
    pub problem: String,
    pub problem_mark: Option<Mark>,
    pub context: Option<String>,
    pub context_mark: Option<Mark>,
    /// Byte offset into the raw input (reader failures)
    pub problem_offset: usize,
    /// The offending byte or code point (reader failures)
    pub problem_value: Option<u32>,
}

impl EngineError {
    fn new(stage: ErrorStage, problem: impl Into<String>) -> Self {
        Self {
            stage,
            problem: problem.into(),
            problem_mark: None,
            context: None,
            context_mark: None,
            problem_offset: 0,
            problem_value: None,
        }
    }

    pub fn reader(problem: impl Into<String>, offset: usize, value: u32) -> Self {
        Self {
            problem_offset: offset,
            problem_value: Some(value),
            ..Self::new(ErrorStage::Reader, problem)
        }
    }

    pub fn composer(problem: impl Into<String>, mark: Mark) -> Self {
        Self {
            problem_mark: Some(mark),
            ..Self::new(ErrorStage::Composer, problem)
        }
    }

    pub fn writer(problem: impl Into<String>) -> Self {
        Self::new(ErrorStage::Writer, problem)
    }

    pub fn emitter(problem: impl Into<String>) -> Self {
        Self::new(ErrorStage::Emitter, problem)
    }
}

impl From<ScanError> for EngineError {
    fn from(err: ScanError) -> Self {
        let info = err.info();
        let (context, problem) = split_context(info);
        Self {
            problem_mark: Some(Mark::from(err.marker())),
            context: context.map(str::to_string),
            ..Self::new(classify(info), problem)
        }
    }
}

/// yaml-rust2 reports scanner and parser failures through the same type;
/// recover the stage from the message shape.
fn classify(info: &str) -> ErrorStage {
    if info.contains("unknown anchor") {
        ErrorStage::Composer
    } else if info.starts_with("while parsing")
        || info.starts_with("did not find expected")
        || info.starts_with("found incompatible")
    {
        ErrorStage::Parser
    } else {
        ErrorStage::Scanner
    }
}

/// Split "while scanning a quoted scalar, found unexpected end of stream"
/// into its context and problem halves.
fn split_context(info: &str) -> (Option<&str>, &str) {
    if info.starts_with("while ") {
        if let Some((context, problem)) = info.split_once(", ") {
            return (Some(context), problem);
        }
    }
    (None, info)
}
