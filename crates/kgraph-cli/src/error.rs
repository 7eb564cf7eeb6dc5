//! CLI error types.

use kgraph_proto::ProtoError;
use kgraph_server::GraphError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The watch request could not be read from standard input.
    #[error("reading request from stdin: {0}")]
    Stdin(std::io::Error),

    /// The watch request could not be encoded.
    #[error(transparent)]
    Proto(#[from] ProtoError),

    /// The graph server failed.
    #[error(transparent)]
    Server(#[from] GraphError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_error_display_invalid_argument() {
        let err = CliError::InvalidArgument("agent id must be positive".into());
        assert_eq!(err.to_string(), "invalid argument: agent id must be positive");
    }

    #[test]
    fn test_cli_error_display_stdin() {
        let err = CliError::Stdin(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"));
        assert_eq!(err.to_string(), "reading request from stdin: closed");
    }

    #[test]
    fn test_cli_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err = CliError::from(io_err);
        assert!(matches!(cli_err, CliError::Io(_)));
    }

    #[test]
    fn test_cli_error_from_graph_error_is_transparent() {
        let err = CliError::from(GraphError::Dial("refused".into()));
        assert_eq!(err.to_string(), "WebSocket dial: refused");
    }
}
