//! End-to-end tests against a fake graph API.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use futures::{SinkExt, StreamExt};
use http_body_util::BodyExt;
use kgraph_server::{routes::create_router, GraphState, ServerConfig};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::handshake::server::{
    ErrorResponse, Request as WsRequest, Response as WsResponse,
};
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tower::ServiceExt;

/// What the fake graph API saw from the client.
#[derive(Debug)]
struct Handshake {
    authorization: Option<String>,
    subprotocol: Option<String>,
    watch_request: String,
}

/// A fake graph API accepting a single connection.
struct FakeGraphApi {
    addr: SocketAddr,
    frames: mpsc::UnboundedSender<String>,
    handshake: oneshot::Receiver<Handshake>,
}

impl FakeGraphApi {
    /// Accept one connection, record its handshake, then relay queued frames
    /// until the client leaves.
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (frames_tx, mut frames_rx) = mpsc::unbounded_channel::<String>();
        let (handshake_tx, handshake_rx) = oneshot::channel();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut authorization = None;
            let mut subprotocol = None;
            let callback = |request: &WsRequest,
                            mut response: WsResponse|
             -> Result<WsResponse, ErrorResponse> {
                let get = |name: &str| {
                    request
                        .headers()
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .map(ToString::to_string)
                };
                authorization = get("authorization");
                subprotocol = get("sec-websocket-protocol");
                response.headers_mut().insert(
                    "sec-websocket-protocol",
                    HeaderValue::from_static("gitlab-agent-graph-api"),
                );
                Ok(response)
            };
            let mut ws = tokio_tungstenite::accept_hdr_async(stream, callback)
                .await
                .unwrap();

            let watch_request = match ws.next().await {
                Some(Ok(Message::Text(text))) => text.to_string(),
                other => panic!("expected watch request, got {other:?}"),
            };
            let _ = handshake_tx.send(Handshake {
                authorization,
                subprotocol,
                watch_request,
            });

            loop {
                tokio::select! {
                    Some(frame) = frames_rx.recv() => {
                        if ws.send(Message::Text(frame.into())).await.is_err() {
                            return;
                        }
                    }
                    incoming = ws.next() => {
                        if !matches!(incoming, Some(Ok(_))) {
                            return;
                        }
                    }
                }
            }
        });

        Self {
            addr,
            frames: frames_tx,
            handshake: handshake_rx,
        }
    }

    fn send(&self, frame: &str) {
        self.frames.send(frame.to_string()).unwrap();
    }

    fn state(&self) -> Arc<GraphState> {
        let config = ServerConfig::new(
            format!("http://{}/graph", self.addr),
            "Bearer pat:42:secret",
            br#"{"queries":[]}"#.to_vec(),
        )
        .with_open_browser(false);
        Arc::new(GraphState::new(config))
    }
}

async fn get_root(state: Arc<GraphState>) -> axum::response::Response {
    create_router(state)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_streams_rendered_graph() {
    let api = FakeGraphApi::start().await;
    api.send(r#"{"actions":[{"svx":{"vx":{"v":"v1","r":"pods","ns":"default","n":"web-1"}}}]}"#);

    let response = get_root(api.state()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("multipart/x-mixed-replace;boundary="));

    let mut body = response.into_body().into_data_stream();
    let first = body.next().await.unwrap().unwrap();
    let first = String::from_utf8_lossy(&first).into_owned();
    assert!(first.contains("Content-Type: image/svg+xml"));
    assert!(first.contains("web-1"));

    api.send(r#"{"actions":[{"sarc":{"s":{"v":"v1","r":"pods","ns":"default","n":"web-1"},"d":{"v":"v1","r":"nodes","n":"node-a"},"t":"r"}}]}"#);
    let second = body.next().await.unwrap().unwrap();
    assert!(String::from_utf8_lossy(&second).contains("node-a"));

    api.send(r#"{"error":{"code":14,"code_string":"Unavailable","reason":"agent went away"}}"#);
    assert!(body.next().await.unwrap().is_err());

    let handshake = api.handshake.await.unwrap();
    assert_eq!(handshake.authorization.as_deref(), Some("Bearer pat:42:secret"));
    assert_eq!(handshake.subprotocol.as_deref(), Some("gitlab-agent-graph-api"));
    assert_eq!(handshake.watch_request, r#"{"queries":[]}"#);
}

#[tokio::test]
async fn test_upstream_error_before_first_image_is_500() {
    let api = FakeGraphApi::start().await;
    api.send(r#"{"warnings":[{"t":"ObjectProcessingError","m":"slow"}],"error":{"code":16,"code_string":"Unauthenticated","reason":"bad token"}}"#);

    let response = get_root(api.state()).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"Unauthenticated (16): bad token");
}

#[tokio::test]
async fn test_malformed_frame_before_first_image_is_500() {
    let api = FakeGraphApi::start().await;
    api.send("{not json");

    let response = get_root(api.state()).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&body).starts_with("JSON unmarshal:"));
}
