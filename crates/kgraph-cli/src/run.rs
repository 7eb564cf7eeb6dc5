//! Turns parsed flags into a running graph server.

use std::io;

use kgraph_server::{GraphServer, ServerConfig};
use tracing::info;

use crate::cli::Cli;
use crate::error::{CliError, CliResult};
use crate::watch_request::watch_request_payload;

/// Graph API endpoint below the agent server's Kubernetes proxy URL.
#[must_use]
pub fn graph_api_url(k8s_proxy_url: &str) -> String {
    let mut url = k8s_proxy_url.to_string();
    if !url.ends_with('/') {
        url.push('/');
    }
    url.push_str("graph");
    url
}

/// `Authorization` header value for a personal or project access token.
#[must_use]
pub fn authorization_header(agent: i64, token: &str) -> String {
    format!("Bearer pat:{agent}:{token}")
}

/// Build the server configuration for the parsed flags.
///
/// # Errors
///
/// Returns an error if the agent ID is not positive, the token is empty or
/// the watch request cannot be read or encoded.
pub fn server_config(cli: &Cli, stdin: impl io::Read) -> CliResult<ServerConfig> {
    if cli.agent <= 0 {
        return Err(CliError::InvalidArgument(format!(
            "agent id must be positive, got {}",
            cli.agent
        )));
    }
    if cli.token.is_empty() {
        return Err(CliError::InvalidArgument("token must not be empty".into()));
    }

    let watch_request = watch_request_payload(&cli.selection, stdin)?;
    if cli.log_watch_request {
        info!("Watch request: {}", String::from_utf8_lossy(&watch_request));
    }

    Ok(ServerConfig::new(
        graph_api_url(&cli.k8s_proxy_url),
        authorization_header(cli.agent, &cli.token),
        watch_request,
    )
    .with_listen_addr(cli.listen_addr)
    .with_open_browser(!cli.no_browser))
}

/// Serve the graph until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the server fails.
pub async fn run(cli: Cli) -> CliResult<()> {
    let config = server_config(&cli, io::stdin().lock())?;
    let server = GraphServer::new(config);
    server.serve_with_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl-C, shutting down");
    }
}
