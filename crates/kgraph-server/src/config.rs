//! Graph server configuration.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use kgraph_diagram::{CompileOptions, RenderOptions};

/// WebSocket subprotocol spoken by the graph API.
pub const GRAPH_API_SUBPROTOCOL: &str = "gitlab-agent-graph-api";

/// Largest upstream frame accepted, in bytes.
pub const DEFAULT_READ_LIMIT: usize = 4 * 1024 * 1024;

/// Configuration for the graph server.
///
/// Every browser request opens its own upstream connection with the same
/// URL, credentials and watch request.
#[derive(Clone)]
pub struct ServerConfig {
    /// Address to bind the local HTTP server to.
    pub listen_addr: SocketAddr,
    /// Graph API endpoint (`http(s)://` or `ws(s)://`).
    pub graph_api_url: String,
    /// Value of the `Authorization` header sent upstream.
    pub authorization: String,
    /// Serialized watch request, sent as the first upstream frame.
    pub watch_request: Vec<u8>,
    /// Maximum upstream message size.
    pub read_limit: usize,
    /// WebSocket subprotocol requested upstream.
    pub subprotocol: String,
    /// Time allowed for the upstream handshake.
    pub connect_timeout: Duration,
    /// Launch a browser pointing at the server once it listens.
    pub open_browser: bool,
    /// Layout options for the diagram engine.
    pub compile_options: CompileOptions,
    /// Rendering options for the diagram engine.
    pub render_options: RenderOptions,
}

impl ServerConfig {
    /// Create a configuration for the given upstream endpoint.
    #[must_use]
    pub fn new(
        graph_api_url: impl Into<String>,
        authorization: impl Into<String>,
        watch_request: Vec<u8>,
    ) -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            graph_api_url: graph_api_url.into(),
            authorization: authorization.into(),
            watch_request,
            read_limit: DEFAULT_READ_LIMIT,
            subprotocol: GRAPH_API_SUBPROTOCOL.to_string(),
            connect_timeout: Duration::from_secs(30),
            open_browser: true,
            compile_options: CompileOptions::default(),
            render_options: RenderOptions::default(),
        }
    }

    /// Set the local listen address.
    #[must_use]
    pub const fn with_listen_addr(mut self, addr: SocketAddr) -> Self {
        self.listen_addr = addr;
        self
    }

    /// Set the maximum upstream message size.
    #[must_use]
    pub const fn with_read_limit(mut self, limit: usize) -> Self {
        self.read_limit = limit;
        self
    }

    /// Set the upstream WebSocket subprotocol.
    #[must_use]
    pub fn with_subprotocol(mut self, subprotocol: impl Into<String>) -> Self {
        self.subprotocol = subprotocol.into();
        self
    }

    /// Set the upstream handshake timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Enable or disable launching the browser.
    #[must_use]
    pub const fn with_open_browser(mut self, enabled: bool) -> Self {
        self.open_browser = enabled;
        self
    }

    /// Set the layout options.
    #[must_use]
    pub const fn with_compile_options(mut self, options: CompileOptions) -> Self {
        self.compile_options = options;
        self
    }

    /// Set the rendering options.
    #[must_use]
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("listen_addr", &self.listen_addr)
            .field("graph_api_url", &self.graph_api_url)
            .field("authorization", &"<redacted>")
            .field("watch_request_len", &self.watch_request.len())
            .field("read_limit", &self.read_limit)
            .field("subprotocol", &self.subprotocol)
            .field("connect_timeout", &self.connect_timeout)
            .field("open_browser", &self.open_browser)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_config_new() {
        let config = ServerConfig::new("https://kas.example.com/k8s-proxy/graph", "Bearer x", b"{}".to_vec());

        assert_eq!(config.listen_addr.ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.listen_addr.port(), 0);
        assert_eq!(config.read_limit, 4 * 1024 * 1024);
        assert_eq!(config.subprotocol, "gitlab-agent-graph-api");
        assert!(config.open_browser);
        assert_eq!(config.watch_request, b"{}");
    }

    #[test]
    fn test_config_builder() {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9000);
        let config = ServerConfig::new("ws://localhost/graph", "", Vec::new())
            .with_listen_addr(addr)
            .with_read_limit(1024)
            .with_subprotocol("test-proto")
            .with_connect_timeout(Duration::from_secs(5))
            .with_open_browser(false);

        assert_eq!(config.listen_addr, addr);
        assert_eq!(config.read_limit, 1024);
        assert_eq!(config.subprotocol, "test-proto");
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert!(!config.open_browser);
    }

    #[test]
    fn test_debug_redacts_authorization() {
        let config = ServerConfig::new("ws://localhost/graph", "Bearer pat:1:secret", Vec::new());
        let debug = format!("{config:?}");

        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }
}
