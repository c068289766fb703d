//! Error types for loading and emitting YAML.
//!
//! Engine failures are translated into [`YamlError`] exactly once, at the
//! parser and emitter boundaries; nothing else in the crate sees an
//! [`EngineError`].

use crate::Mark;
use serde::{Deserialize, Serialize};
use std::fmt;
use yaml_engine::{AppendError, EngineError, ErrorStage, NodeId};

/// Result type alias for yaml-bridge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The stage that rejected the input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Memory,
    Reader,
    Scanner,
    Parser,
    Composer,
    Writer,
    Emitter,
    /// Content the engine accepted but this crate refuses to materialize
    Policy,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Memory => "memory",
            ErrorKind::Reader => "reader",
            ErrorKind::Scanner => "scanner",
            ErrorKind::Parser => "parser",
            ErrorKind::Composer => "composer",
            ErrorKind::Writer => "writer",
            ErrorKind::Emitter => "emitter",
            ErrorKind::Policy => "policy",
        };
        f.write_str(name)
    }
}

/// A YAML-level failure with whatever position information its stage provides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YamlError {
    pub kind: ErrorKind,
    pub problem: String,
    pub mark: Option<Mark>,
    pub context: Option<String>,
    pub context_mark: Option<Mark>,
    /// Byte offset into the normalized input (reader failures)
    pub offset: Option<usize>,
    /// The offending byte or code point (reader failures)
    pub value: Option<u32>,
}

impl YamlError {
    pub fn new(kind: ErrorKind, problem: impl Into<String>) -> Self {
        Self {
            kind,
            problem: problem.into(),
            mark: None,
            context: None,
            context_mark: None,
            offset: None,
            value: None,
        }
    }

    pub(crate) fn policy(problem: impl Into<String>, mark: Option<Mark>) -> Self {
        Self {
            mark,
            ..Self::new(ErrorKind::Policy, problem)
        }
    }
}

impl fmt::Display for YamlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.kind, self.problem)?;
        if let Some(mark) = &self.mark {
            write!(f, " at {}", mark)?;
        }
        if let Some(offset) = self.offset {
            write!(f, " at offset {}", offset)?;
        }
        if let Some(value) = self.value {
            write!(f, " (value {:#X})", value)?;
        }
        if let Some(context) = &self.context {
            write!(f, ", {}", context)?;
            if let Some(mark) = &self.context_mark {
                write!(f, " at {}", mark)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for YamlError {}

/// Why a document could not be built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildFailure {
    #[error("too many nested layers (limit {limit})")]
    TooManyNestedLayers { limit: usize },

    #[error(transparent)]
    Append(AppendError),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Yaml(#[from] YamlError),

    #[error("unexpected error type in {origin}")]
    UnexpectedErrorType {
        origin: &'static str,
        stage: ErrorStage,
    },

    #[error("failed to build document: {0}")]
    BuildFailed(#[from] BuildFailure),

    #[error("node handle {0} is out of bounds")]
    OutOfBounds(NodeId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The YAML-level failure, if this is one.
    pub fn as_yaml(&self) -> Option<&YamlError> {
        match self {
            Error::Yaml(err) => Some(err),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.as_yaml().map(|err| err.kind)
    }
}

impl From<AppendError> for Error {
    fn from(err: AppendError) -> Self {
        match err {
            AppendError::UnknownNode(id) => Error::OutOfBounds(id),
            other => Error::BuildFailed(BuildFailure::Append(other)),
        }
    }
}

fn with_marks(kind: ErrorKind, err: EngineError) -> YamlError {
    YamlError {
        mark: err.problem_mark.map(Mark::from),
        context: err.context,
        context_mark: err.context_mark.map(Mark::from),
        ..YamlError::new(kind, err.problem)
    }
}

/// Translate a failure reported while loading.
pub(crate) fn from_parser_error(err: EngineError) -> Error {
    match err.stage {
        ErrorStage::Memory => YamlError::new(ErrorKind::Memory, err.problem).into(),
        ErrorStage::Reader => YamlError {
            offset: Some(err.problem_offset),
            value: err.problem_value,
            ..YamlError::new(ErrorKind::Reader, err.problem)
        }
        .into(),
        ErrorStage::Scanner => with_marks(ErrorKind::Scanner, err).into(),
        ErrorStage::Parser => with_marks(ErrorKind::Parser, err).into(),
        ErrorStage::Composer => with_marks(ErrorKind::Composer, err).into(),
        stage => Error::UnexpectedErrorType {
            origin: "Parser::load",
            stage,
        },
    }
}

/// Translate a failure reported while emitting.
pub(crate) fn from_emitter_error(err: EngineError) -> Error {
    match err.stage {
        ErrorStage::Memory => YamlError::new(ErrorKind::Memory, err.problem).into(),
        ErrorStage::Writer => YamlError::new(ErrorKind::Writer, err.problem).into(),
        ErrorStage::Emitter => YamlError::new(ErrorKind::Emitter, err.problem).into(),
        stage => Error::UnexpectedErrorType {
            origin: "Emitter",
            stage,
        },
    }
}
