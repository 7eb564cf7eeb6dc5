//! Error types for the graph server.

use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kgraph_diagram::DiagramError;
use kgraph_proto::{ProtoError, WatchError};
use thiserror::Error;

/// Result type alias for graph server operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors that end a graph stream or the server.
///
/// None of them is retried: the user reloads the page to start over with a
/// fresh upstream connection.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Failed to bind the local listener.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(SocketAddr, std::io::Error),

    /// The local HTTP server failed.
    #[error("serve: {0}")]
    Serve(std::io::Error),

    /// The upstream WebSocket connection could not be established.
    #[error("WebSocket dial: {0}")]
    Dial(String),

    /// Writing to the upstream connection failed.
    #[error("WebSocket write: {0}")]
    Write(String),

    /// Reading from the upstream connection failed.
    #[error("WebSocket read: {0}")]
    Read(String),

    /// The upstream sent a frame that is not a text frame.
    #[error("unexpected message type")]
    UnexpectedMessageType,

    /// A frame could not be decoded.
    #[error(transparent)]
    Decode(#[from] ProtoError),

    /// The upstream reported a terminal error.
    #[error(transparent)]
    Upstream(#[from] WatchError),

    /// Applying graph mutations to the diagram failed.
    #[error("graph builder: {0}")]
    Graph(DiagramError),

    /// Compiling a snapshot failed.
    #[error("compile: {0}")]
    Compile(DiagramError),

    /// Rendering a compiled diagram failed.
    #[error("render: {0}")]
    Render(DiagramError),

    /// The watch request payload is unusable.
    #[error("invalid watch request: {0}")]
    InvalidRequest(String),

    /// A pipeline stage went away without reporting an error.
    #[error("graph stream closed")]
    StreamClosed,

    /// The request was cancelled.
    #[error("request cancelled")]
    Cancelled,

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for GraphError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_error_response_is_500_with_text() {
        let response = GraphError::Dial("connection refused".into()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"WebSocket dial: connection refused");
    }

    #[test]
    fn test_upstream_error_display() {
        let err = GraphError::from(WatchError {
            code: 16,
            code_string: "Unauthenticated".into(),
            reason: "bad token".into(),
        });
        assert_eq!(err.to_string(), "Unauthenticated (16): bad token");
    }

    #[test]
    fn test_decode_error_display() {
        let err = GraphError::from(ProtoError::Decoding("EOF".into()));
        assert_eq!(err.to_string(), "JSON unmarshal: EOF");
    }

    #[test]
    fn test_graph_error_display() {
        let err = GraphError::Graph(DiagramError::AlreadyExists(r#""a""#.into()));
        assert_eq!(err.to_string(), r#"graph builder: "a" already exists"#);
    }
}
