//! # kgraph-server
//!
//! Streams a live picture of a Kubernetes object graph to a local browser.
//!
//! Each `GET /` opens its own connection to the graph API and runs three
//! stages connected by single-slot channels:
//!
//! - **Reader**: decodes upstream WebSocket frames into graph mutations
//! - **Pipeline**: applies mutations to a [`GraphBuilder`] and hands out a
//!   diagram snapshot whenever the renderer is ready for one
//! - **Serve loop**: renders snapshots to SVG and writes them as parts of a
//!   `multipart/x-mixed-replace` response, which browsers display as an
//!   image that updates in place
//!
//! Closing the browser tab tears all three down.
//!
//! ## Example
//!
//! ```rust,no_run
//! use kgraph_server::{GraphServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::new(
//!         "https://kas.example.com/k8s-proxy/graph",
//!         "Bearer pat:42:glpat-xxxx",
//!         br#"{"queries":[]}"#.to_vec(),
//!     );
//!     let server = GraphServer::new(config);
//!     // server.serve().await.unwrap();
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod config;
pub mod error;
pub mod multipart;
pub mod pipeline;
pub mod render;
pub mod routes;
pub mod server;
pub mod state;
pub mod stream;
pub mod styles;
pub mod upstream;

pub use builder::GraphBuilder;
pub use config::{ServerConfig, DEFAULT_READ_LIMIT, GRAPH_API_SUBPROTOCOL};
pub use error::{GraphError, GraphResult};
pub use pipeline::{spawn_pipeline, Snapshots};
pub use render::ServeLoop;
pub use server::GraphServer;
pub use state::GraphState;
pub use stream::spawn_reader;
