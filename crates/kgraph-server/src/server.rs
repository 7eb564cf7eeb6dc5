//! Graph server implementation.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use kgraph_diagram::DiagramEngine;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::{GraphError, GraphResult};
use crate::routes::create_router;
use crate::state::GraphState;

/// Local HTTP server streaming the live object graph to a browser.
#[derive(Debug, Clone)]
pub struct GraphServer {
    state: Arc<GraphState>,
}

impl GraphServer {
    /// Create a server rendering with the built-in SVG engine.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            state: Arc::new(GraphState::new(config)),
        }
    }

    /// Create a server rendering with the given engine.
    #[must_use]
    pub fn with_engine(config: ServerConfig, engine: Arc<dyn DiagramEngine>) -> Self {
        Self {
            state: Arc::new(GraphState::with_engine(config, engine)),
        }
    }

    /// Get the server state for external access.
    #[must_use]
    pub fn state(&self) -> Arc<GraphState> {
        Arc::clone(&self.state)
    }

    /// Bind the configured listen address.
    ///
    /// # Errors
    ///
    /// Returns an error if binding fails.
    pub async fn bind(&self) -> GraphResult<TcpListener> {
        let addr = self.state.config().listen_addr;
        TcpListener::bind(addr)
            .await
            .map_err(|e| GraphError::BindFailed(addr, e))
    }

    /// Start the server and listen for connections.
    ///
    /// This method runs until the server encounters a fatal error.
    ///
    /// # Errors
    ///
    /// Returns an error if binding or serving fails.
    pub async fn serve(&self) -> GraphResult<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Start the server with graceful shutdown support.
    ///
    /// The server will shut down when the provided future completes.
    ///
    /// # Errors
    ///
    /// Returns an error if binding or serving fails.
    pub async fn serve_with_shutdown<F>(&self, shutdown: F) -> GraphResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = self.bind().await?;
        self.serve_listener(listener, shutdown).await
    }

    /// Serve on an already bound listener.
    ///
    /// Logs the URL to open and, if configured, launches a browser on it.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener address is unavailable or serving fails.
    pub async fn serve_listener<F>(&self, listener: TcpListener, shutdown: F) -> GraphResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr().map_err(GraphError::Serve)?;
        let url = local_url(addr);
        info!("Listening on {url}");
        if self.state.config().open_browser {
            open_browser(&url);
        }

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(GraphError::Serve)?;

        info!("Graph server shut down");
        Ok(())
    }

    /// Create the router without starting the server.
    pub fn router(&self) -> axum::Router {
        create_router(self.state())
    }
}

/// URL of the server's only page.
#[must_use]
pub fn local_url(addr: SocketAddr) -> String {
    format!("http://{addr}")
}

fn open_browser(url: &str) {
    match open::that(url) {
        Ok(()) => info!(url = %url, "Opened browser"),
        Err(e) => warn!(error = %e, "Failed to open browser, open {url} manually"),
    }
}
