//! Coalesces decoded frames into diagram snapshots for a paced consumer.
//!
//! The pipeline applies every frame to a [`GraphBuilder`] as soon as it
//! arrives but only emits a snapshot once the consumer has asked for one.
//! Frames that arrive while the consumer is busy are folded into the next
//! snapshot, so a slow renderer never falls behind the stream.

use kgraph_proto::Warning;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::builder::GraphBuilder;
use crate::error::{GraphError, GraphResult};
use crate::stream::{send_or_cancel, FrameResult};

/// Diagram source text of a snapshot, or the error that ended the pipeline.
pub type SnapshotResult = GraphResult<String>;

/// Consumer side of a running pipeline.
#[derive(Debug)]
pub struct Snapshots {
    /// Snapshots, ending with at most one error.
    pub snapshots: mpsc::Receiver<SnapshotResult>,
    /// Send `()` when ready to take the next snapshot.
    pub ready: mpsc::Sender<()>,
}

/// Spawn a pipeline task fed by `frames`.
pub fn spawn_pipeline(frames: mpsc::Receiver<FrameResult>, cancel: CancellationToken) -> Snapshots {
    let (snapshot_tx, snapshot_rx) = mpsc::channel(1);
    let (ready_tx, ready_rx) = mpsc::channel(1);
    tokio::spawn(run_pipeline(frames, ready_rx, snapshot_tx, cancel));
    Snapshots {
        snapshots: snapshot_rx,
        ready: ready_tx,
    }
}

/// Run the pipeline until an error is delivered or `cancel` fires.
///
/// A snapshot is sent when both a frame has been applied since the last send
/// and the consumer signalled readiness. A snapshot equal to the previously
/// sent one is skipped; the consumer stays ready for the next change.
pub async fn run_pipeline(
    mut frames: mpsc::Receiver<FrameResult>,
    mut ready: mpsc::Receiver<()>,
    snapshots: mpsc::Sender<SnapshotResult>,
    cancel: CancellationToken,
) {
    let mut builder = match GraphBuilder::new() {
        Ok(builder) => builder,
        Err(e) => {
            send_or_cancel(&snapshots, &cancel, Err(GraphError::Graph(e))).await;
            return;
        }
    };
    let mut producer_ready = false;
    let mut consumer_ready = false;
    let mut last_sent = String::new();

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            Some(()) = ready.recv() => consumer_ready = true,
            frame = frames.recv() => {
                let result = match frame {
                    Some(frame) => apply_frame(&mut builder, frame),
                    None => Err(GraphError::StreamClosed),
                };
                if let Err(e) = result {
                    send_or_cancel(&snapshots, &cancel, Err(e)).await;
                    break;
                }
                producer_ready = true;
            }
        }

        if producer_ready && consumer_ready {
            producer_ready = false;
            let snapshot = builder.snapshot();
            if snapshot == last_sent {
                debug!("Diagram unchanged, skipping snapshot");
                continue;
            }
            if !send_or_cancel(&snapshots, &cancel, Ok(snapshot.clone())).await {
                break;
            }
            consumer_ready = false;
            last_sent = snapshot;
        }
    }
    debug!("Pipeline stopped");
}

/// Apply one frame: warnings are logged first, then a terminal error ends
/// the stream before any action of the same frame is applied.
fn apply_frame(builder: &mut GraphBuilder, frame: FrameResult) -> GraphResult<()> {
    let frame = frame?;
    log_warnings(&frame.warnings);
    if let Some(error) = frame.error {
        return Err(error.into());
    }
    builder.apply_actions(&frame.actions).map_err(GraphError::Graph)
}

fn log_warnings(warnings: &[Warning]) {
    for warning in warnings {
        warn!("{warning}");
    }
}
