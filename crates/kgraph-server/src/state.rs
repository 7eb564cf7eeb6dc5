//! Shared state for the graph server.

use std::sync::Arc;

use kgraph_diagram::{DiagramEngine, SvgEngine};

use crate::config::ServerConfig;

/// Everything a request needs to open its own graph stream.
pub struct GraphState {
    config: ServerConfig,
    engine: Arc<dyn DiagramEngine>,
}

impl GraphState {
    /// Create state rendering with the built-in SVG engine.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let engine = SvgEngine::new(config.compile_options, config.render_options.clone());
        Self::with_engine(config, Arc::new(engine))
    }

    /// Create state rendering with the given engine.
    #[must_use]
    pub fn with_engine(config: ServerConfig, engine: Arc<dyn DiagramEngine>) -> Self {
        Self { config, engine }
    }

    /// The server configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The diagram engine.
    #[must_use]
    pub fn engine(&self) -> Arc<dyn DiagramEngine> {
        Arc::clone(&self.engine)
    }
}

impl std::fmt::Debug for GraphState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphState")
            .field("config", &self.config)
            .field("content_type", &self.engine.content_type())
            .finish()
    }
}
