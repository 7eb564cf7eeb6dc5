//! # kgraph-cli
//!
//! Command line entry point for the live Kubernetes object graph viewer.
//!
//! The `kgraph` binary parses the selection flags into a watch request,
//! formats the agent credentials and hands both to
//! [`kgraph_server::GraphServer`], which streams the rendered graph to a
//! browser until interrupted.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod error;
pub mod run;
pub mod watch_request;

pub use error::{CliError, CliResult};
pub use run::{authorization_header, graph_api_url, run, server_config};
pub use watch_request::{build_watch_request, watch_request_payload};
