//! Route configuration for the graph server.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, Router};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::GraphResult;
use crate::pipeline::spawn_pipeline;
use crate::render::ServeLoop;
use crate::state::GraphState;
use crate::stream::spawn_reader;
use crate::upstream;

/// Create the router. Only `GET /` is served.
pub fn create_router(state: Arc<GraphState>) -> Router {
    Router::new()
        .route("/", get(stream_graph))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Stream the live graph as a sequence of images.
///
/// Each request gets its own upstream connection; nothing is shared with
/// other requests.
pub async fn stream_graph(State(state): State<Arc<GraphState>>) -> Response {
    match open_stream(&state).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "Failed to start graph stream");
            e.into_response()
        }
    }
}

async fn open_stream(state: &GraphState) -> GraphResult<Response> {
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();

    let upstream = upstream::connect(state.config()).await?;
    info!("Graph stream started");
    let frames = spawn_reader(upstream, cancel.clone());
    let snapshots = spawn_pipeline(frames, cancel.clone());
    ServeLoop::new(state.engine(), snapshots, cancel)
        .into_response(guard)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::config::ServerConfig;

    fn make_test_state() -> Arc<GraphState> {
        // nothing listens on port 1
        let config = ServerConfig::new("ws://127.0.0.1:1/graph", "Bearer pat:1:t", b"{}".to_vec())
            .with_open_browser(false);
        Arc::new(GraphState::new(config))
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let app = create_router(make_test_state());

        let response = app
            .oneshot(Request::builder().uri("/graph").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_post_root_is_rejected() {
        let app = create_router(make_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_500() {
        let app = create_router(make_test_state());

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with("WebSocket dial:"));
    }
}
