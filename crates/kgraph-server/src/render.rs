//! The serve loop: pulls snapshots, renders them and streams the images.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{header, StatusCode};
use axum::response::Response;
use futures::{Stream, StreamExt};
use kgraph_diagram::DiagramEngine;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error};

use crate::error::{GraphError, GraphResult};
use crate::multipart::MultipartWriter;
use crate::pipeline::{SnapshotResult, Snapshots};

/// Renders snapshots on demand, signalling readiness for each one.
pub struct ServeLoop {
    engine: Arc<dyn DiagramEngine>,
    snapshots: mpsc::Receiver<SnapshotResult>,
    ready: mpsc::Sender<()>,
    cancel: CancellationToken,
    offered: bool,
}

impl ServeLoop {
    /// Create a loop consuming the given pipeline.
    #[must_use]
    pub fn new(engine: Arc<dyn DiagramEngine>, pipeline: Snapshots, cancel: CancellationToken) -> Self {
        Self {
            engine,
            snapshots: pipeline.snapshots,
            ready: pipeline.ready,
            cancel,
            offered: false,
        }
    }

    /// Wait for the next snapshot and render it.
    ///
    /// Readiness is signalled once per image, so the pipeline never builds a
    /// snapshot the loop is not about to take.
    ///
    /// # Errors
    ///
    /// Returns the pipeline's error, a compile or render error, or
    /// [`GraphError::Cancelled`].
    pub async fn next_image(&mut self) -> GraphResult<Vec<u8>> {
        loop {
            tokio::select! {
                () = self.cancel.cancelled() => return Err(GraphError::Cancelled),
                // a closed ready channel means the pipeline ended; its error
                // is still waiting in the snapshot channel
                _ = self.ready.send(()), if !self.offered => self.offered = true,
                snapshot = self.snapshots.recv() => {
                    self.offered = false;
                    let source = snapshot.unwrap_or(Err(GraphError::StreamClosed))?;
                    return self.render(&source);
                }
            }
        }
    }

    fn render(&self, source: &str) -> GraphResult<Vec<u8>> {
        let diagram = self.engine.compile(source).map_err(GraphError::Compile)?;
        let image = self.engine.render(&diagram).map_err(GraphError::Render)?;
        debug!(
            shapes = diagram.shapes.len(),
            connections = diagram.connections.len(),
            bytes = image.len(),
            "Rendered snapshot"
        );
        Ok(image)
    }

    /// Stream the rendered images as a `multipart/x-mixed-replace` response.
    ///
    /// Waits for the first image before answering, so failures that happen
    /// before any image exists become an error response. Later failures end
    /// the body abruptly. `guard` is held by the body and cancels the
    /// request's tasks when the client goes away.
    ///
    /// No `Transfer-Encoding` header is set: the HTTP server frames the
    /// body itself, and an aborted body ends without its final chunk.
    ///
    /// # Errors
    ///
    /// Returns the error that prevented the first image.
    pub async fn into_response(mut self, guard: DropGuard) -> GraphResult<Response> {
        let first = self.next_image().await?;
        let mut multipart = MultipartWriter::new(self.engine.content_type());
        let content_type = multipart.content_type();
        let head = multipart.frame(&first);

        let body = futures::stream::once(async move { Ok(head) })
            .chain(image_parts(self, multipart, guard));

        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CACHE_CONTROL, "no-cache")
            .body(Body::from_stream(body))
            .map_err(|e| GraphError::Internal(e.to_string()))
    }
}

/// The remaining parts of the body after the first one.
fn image_parts(
    serve: ServeLoop,
    multipart: MultipartWriter,
    guard: DropGuard,
) -> impl Stream<Item = GraphResult<Bytes>> + Send {
    futures::stream::unfold(Some((serve, multipart, guard)), |state| async move {
        let (mut serve, mut multipart, guard) = state?;
        match serve.next_image().await {
            Ok(image) => {
                let part = multipart.frame(&image);
                Some((Ok(part), Some((serve, multipart, guard))))
            }
            Err(e) => {
                error!(error = %e, "Graph stream failed, aborting response");
                Some((Err(e), None))
            }
        }
    })
}

impl std::fmt::Debug for ServeLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServeLoop")
            .field("content_type", &self.engine.content_type())
            .field("offered", &self.offered)
            .finish_non_exhaustive()
    }
}
