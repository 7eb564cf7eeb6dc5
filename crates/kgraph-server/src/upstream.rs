//! Connection to the graph API.

use futures::SinkExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header, HeaderValue};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_with_config, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::error::{GraphError, GraphResult};

/// An established graph API connection.
pub type Upstream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Map an HTTP endpoint URL to its WebSocket form.
#[must_use]
pub fn websocket_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        url.to_string()
    }
}

/// Open a connection and send the watch request as its first frame.
///
/// # Errors
///
/// Returns [`GraphError::Dial`] if the handshake fails or times out,
/// [`GraphError::InvalidRequest`] if the watch request is not UTF-8 and
/// [`GraphError::Write`] if it cannot be sent.
pub async fn connect(config: &ServerConfig) -> GraphResult<Upstream> {
    let url = websocket_url(&config.graph_api_url);
    let mut request = url
        .as_str()
        .into_client_request()
        .map_err(|e| GraphError::Dial(e.to_string()))?;
    let headers = request.headers_mut();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&config.authorization)
            .map_err(|e| GraphError::Dial(format!("invalid authorization: {e}")))?,
    );
    headers.insert(
        header::SEC_WEBSOCKET_PROTOCOL,
        HeaderValue::from_str(&config.subprotocol)
            .map_err(|e| GraphError::Dial(format!("invalid subprotocol: {e}")))?,
    );

    let mut ws_config = WebSocketConfig::default();
    ws_config.max_message_size = Some(config.read_limit);
    ws_config.max_frame_size = Some(config.read_limit);

    debug!(url = %url, "Dialing graph API");
    let (mut upstream, response) = timeout(
        config.connect_timeout,
        connect_async_with_config(request, Some(ws_config), false),
    )
    .await
    .map_err(|_| GraphError::Dial(format!("timed out after {:?}", config.connect_timeout)))?
    .map_err(|e| GraphError::Dial(e.to_string()))?;
    info!(url = %url, status = %response.status(), "Connected to graph API");

    let watch_request = String::from_utf8(config.watch_request.clone())
        .map_err(|e| GraphError::InvalidRequest(e.to_string()))?;
    upstream
        .send(Message::Text(watch_request.into()))
        .await
        .map_err(|e| GraphError::Write(e.to_string()))?;

    Ok(upstream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("https://kas.example.com/k8s-proxy/graph", "wss://kas.example.com/k8s-proxy/graph" ; "https")]
    #[test_case("http://localhost:8080/graph", "ws://localhost:8080/graph" ; "http")]
    #[test_case("wss://kas.example.com/graph", "wss://kas.example.com/graph" ; "already websocket")]
    fn test_websocket_url(input: &str, expected: &str) {
        assert_eq!(websocket_url(input), expected);
    }

    #[tokio::test]
    async fn test_connect_refused_is_dial_error() {
        // bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = ServerConfig::new(format!("ws://{addr}/graph"), "Bearer pat:1:x", b"{}".to_vec());
        let err = connect(&config).await.unwrap_err();

        assert!(matches!(err, GraphError::Dial(_)));
    }

    #[tokio::test]
    async fn test_invalid_authorization_is_dial_error() {
        let config = ServerConfig::new("ws://127.0.0.1:1/graph", "bad\nvalue", b"{}".to_vec());
        let err = connect(&config).await.unwrap_err();

        assert!(err.to_string().contains("invalid authorization"));
    }
}
