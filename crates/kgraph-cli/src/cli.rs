//! Command-line argument parsing with clap.

use std::net::SocketAddr;

use clap::{Args, Parser};

const LONG_ABOUT: &str = "\
Starts a local web server that shows a live view of the Kubernetes object graph
in a browser. It works through the GitLab agent for Kubernetes running in the
cluster.

Resources and namespaces are selected with CEL expressions evaluated by the
agent. Without any selection flag the default query watches common core, apps,
batch and RBAC resources in every namespace except kube-system.

The token must be a personal or project access token with at least the
Developer role in the agent project and the read_api and k8s_proxy scopes.";

const AFTER_HELP: &str = "\
Examples:
  # Run the default query for agent 123
  kgraph -a 123

  # Show common resources from the core and RBAC groups
  kgraph -a 123 --core --rbac

  # Show certain resources in certain namespaces
  kgraph -a 123 -r pods -r configmaps -n my-ns -n my-stuff

  # Select all namespaces that have a certain annotation
  kgraph -a 123 --ns-expression='\"my-annotation\" in annotations'

  # Pass the full watch request via stdin
  echo -n \"$Q\" | kgraph -a 123 --stdin";

/// Live Kubernetes object graph in the browser.
#[derive(Parser, Debug, Clone)]
#[command(name = "kgraph")]
#[command(version, about, long_about = LONG_ABOUT, after_help = AFTER_HELP)]
pub struct Cli {
    /// Kubernetes proxy URL of the GitLab agent server.
    #[arg(long, env = "KGRAPH_K8S_PROXY_URL")]
    pub k8s_proxy_url: String,

    /// The numerical agent ID to connect to.
    #[arg(short, long)]
    pub agent: i64,

    /// Personal or project access token.
    #[arg(long, env = "KGRAPH_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:0")]
    pub listen_addr: SocketAddr,

    /// Do not open a browser, only print the URL.
    #[arg(long)]
    pub no_browser: bool,

    /// Log the watch request. Can be useful for debugging.
    #[arg(long)]
    pub log_watch_request: bool,

    /// What to watch.
    #[command(flatten)]
    pub selection: Selection,
}

/// Namespace and resource selection.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Namespaces to watch. If not specified, all namespaces are watched with
    /// label and field selectors filtering.
    #[arg(short = 'n', long = "namespace", conflicts_with = "stdin")]
    pub namespaces: Vec<String>,

    /// Label selector to select namespaces.
    #[arg(long, conflicts_with = "stdin")]
    pub ns_label_selector: Option<String>,

    /// Field selector to select namespaces.
    #[arg(long, conflicts_with = "stdin")]
    pub ns_field_selector: Option<String>,

    /// CEL expression to select namespaces. Evaluated before a namespace is
    /// watched and on any updates for the namespace object.
    #[arg(long, conflicts_with = "stdin")]
    pub ns_expression: Option<String>,

    /// Resources to watch, e.g. `pods`. See `kubectl api-resources`.
    #[arg(short = 'r', long = "resources", conflicts_with = "stdin")]
    pub resources: Vec<String>,

    /// Watch pods, secrets, configmaps and serviceaccounts in the core/v1 group.
    #[arg(long, conflicts_with = "stdin")]
    pub core: bool,

    /// Watch jobs and cronjobs in the batch/v1 group.
    #[arg(long, conflicts_with = "stdin")]
    pub batch: bool,

    /// Watch deployments, replicasets, daemonsets and statefulsets in the apps/v1 group.
    #[arg(long, conflicts_with = "stdin")]
    pub apps: bool,

    /// Watch roles and rolebindings in the rbac.authorization.k8s.io/v1 group.
    #[arg(long, conflicts_with = "stdin")]
    pub rbac: bool,

    /// Watch clusterroles and clusterrolebindings in the rbac.authorization.k8s.io/v1 group.
    #[arg(long, conflicts_with = "stdin")]
    pub cluster_rbac: bool,

    /// Watch customresourcedefinitions in the apiextensions.k8s.io/v1 group.
    #[arg(long, conflicts_with = "stdin")]
    pub crd: bool,

    /// Read the watch request from standard input.
    #[arg(long)]
    pub stdin: bool,
}
