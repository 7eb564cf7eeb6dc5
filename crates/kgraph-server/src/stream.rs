//! Reads upstream WebSocket frames into a channel of decoded responses.

use futures::{Stream, StreamExt};
use kgraph_proto::WatchResponse;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{GraphError, GraphResult};

/// A decoded upstream frame, or the error that ended the stream.
pub type FrameResult = GraphResult<WatchResponse>;

/// Send a value unless the token is cancelled first.
///
/// Returns `false` if the value was not delivered.
pub(crate) async fn send_or_cancel<T>(
    tx: &mpsc::Sender<T>,
    cancel: &CancellationToken,
    value: T,
) -> bool {
    tokio::select! {
        () = cancel.cancelled() => false,
        sent = tx.send(value) => sent.is_ok(),
    }
}

/// Spawn a task that reads `stream` until it fails or `cancel` fires.
///
/// Every decoded frame is delivered in order. The first error is delivered
/// once and ends the task.
pub fn spawn_reader<S>(stream: S, cancel: CancellationToken) -> mpsc::Receiver<FrameResult>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(read_frames(stream, tx, cancel));
    rx
}

async fn read_frames<S>(mut stream: S, tx: mpsc::Sender<FrameResult>, cancel: CancellationToken)
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        let next = tokio::select! {
            () = cancel.cancelled() => break,
            next = stream.next() => next,
        };
        let frame = match next {
            Some(Ok(Message::Text(text))) => {
                WatchResponse::from_json(text.as_bytes()).map_err(GraphError::from)
            }
            // control frames are answered by the protocol layer
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            Some(Ok(Message::Close(frame))) => Err(GraphError::Read(match frame {
                Some(frame) => format!("closed by peer: {} {}", frame.code, frame.reason),
                None => "closed by peer".to_string(),
            })),
            Some(Ok(_)) => Err(GraphError::UnexpectedMessageType),
            Some(Err(e)) => Err(GraphError::Read(e.to_string())),
            None => Err(GraphError::Read("connection closed".to_string())),
        };
        let failed = frame.is_err();
        if !send_or_cancel(&tx, &cancel, frame).await || failed {
            break;
        }
    }
    debug!("Upstream reader stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    type WsItem = Result<Message, tungstenite::Error>;

    fn text(json: &str) -> WsItem {
        Ok(Message::Text(json.to_string().into()))
    }

    async fn collect(items: Vec<WsItem>) -> Vec<FrameResult> {
        let mut rx = spawn_reader(stream::iter(items), CancellationToken::new());
        let mut out = Vec::new();
        while let Some(frame) = rx.recv().await {
            out.push(frame);
        }
        out
    }

    #[tokio::test]
    async fn test_frames_delivered_in_order_then_error() {
        let frames = collect(vec![
            text(r#"{"actions":[{"svx":{"vx":{"v":"v1","r":"nodes","n":"a"}}}]}"#),
            text(r#"{"warnings":[{"t":"W","m":"slow"}]}"#),
        ])
        .await;

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].as_ref().unwrap().actions.len(), 1);
        assert_eq!(frames[1].as_ref().unwrap().warnings.len(), 1);
        assert!(matches!(frames[2], Err(GraphError::Read(_))));
    }

    #[tokio::test]
    async fn test_binary_frame_is_fatal() {
        let frames = collect(vec![
            Ok(Message::Binary(vec![1, 2, 3].into())),
            text("{}"),
        ])
        .await;

        assert_eq!(frames.len(), 1);
        assert!(matches!(frames[0], Err(GraphError::UnexpectedMessageType)));
    }

    #[tokio::test]
    async fn test_decode_error_is_fatal() {
        let frames = collect(vec![text("not json"), text("{}")]).await;

        assert_eq!(frames.len(), 1);
        assert!(matches!(frames[0], Err(GraphError::Decode(_))));
    }

    #[tokio::test]
    async fn test_control_frames_are_skipped() {
        let frames = collect(vec![
            Ok(Message::Ping(Vec::new().into())),
            text("{}"),
            Ok(Message::Close(None)),
        ])
        .await;

        assert_eq!(frames.len(), 2);
        assert!(frames[0].is_ok());
        assert!(matches!(frames[1], Err(GraphError::Read(_))));
    }

    #[tokio::test]
    async fn test_read_error_is_delivered_once() {
        let frames = collect(vec![
            Err(tungstenite::Error::ConnectionClosed),
            text("{}"),
        ])
        .await;

        assert_eq!(frames.len(), 1);
        assert!(matches!(frames[0], Err(GraphError::Read(_))));
    }

    #[tokio::test]
    async fn test_cancel_stops_blocked_reader() {
        let cancel = CancellationToken::new();
        let mut rx = spawn_reader(stream::pending::<WsItem>(), cancel.clone());

        cancel.cancel();
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_stops_blocked_send() {
        let cancel = CancellationToken::new();
        let items: Vec<WsItem> = (0..10).map(|_| text("{}")).collect();
        let mut rx = spawn_reader(stream::iter(items), cancel.clone());

        // the reader is now parked on a full channel
        assert!(rx.recv().await.unwrap().is_ok());
        cancel.cancel();

        let mut remaining = 0;
        while rx.recv().await.is_some() {
            remaining += 1;
        }
        assert!(remaining < 9);
    }
}
