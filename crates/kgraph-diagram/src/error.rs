//! Error types for the diagram engine.

use thiserror::Error;

/// Result type alias for diagram operations.
pub type DiagramResult<T> = Result<T, DiagramError>;

/// Errors that can occur while editing, compiling or rendering a diagram.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagramError {
    /// The diagram source text could not be parsed.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// A key or attribute path is malformed.
    #[error("invalid key {0:?}: {1}")]
    InvalidKey(String, String),

    /// The shape to create already exists.
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// The shape or connection to modify does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The diagram could not be rendered.
    #[error("render error: {0}")]
    Render(String),
}
