//! # kgraph-proto
//!
//! Wire types for the Kubernetes object graph watch API.
//!
//! The upstream server streams JSON text frames, each one a [`WatchResponse`]
//! carrying an ordered batch of graph mutations:
//!
//! ```text
//! { "actions":  [ {"svx": {...}} | {"dvx": {...}} | {"sarc": {...}} | {"darc": {...}} ],
//!   "warnings": [ {"t": "...", "m": "...", "a": {...}} ],
//!   "error":    {"code": 1, "code_string": "...", "reason": "..."} }
//! ```
//!
//! The first frame sent by the client is a [`WatchRequest`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod action;
pub mod error;
pub mod request;
pub mod response;
pub mod vertex;

pub use action::{Action, DeleteArc, DeleteVertex, SetArc, SetVertex};
pub use error::ProtoError;
pub use request::{
    Namespaces, Query, QueryExclude, QueryInclude, QueryIncludeObject, Roots, RootsIndividual,
    RootsSelector, WatchRequest,
};
pub use response::{Warning, WatchError, WatchResponse};
pub use vertex::{ArcAttributes, ArcType, GraphArc, Vertex, NAMESPACES_RESOURCE};
