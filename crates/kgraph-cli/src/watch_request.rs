//! Builds the watch request from the selection flags.

use std::io::Read;

use kgraph_proto::{Namespaces, Query, WatchRequest};

use crate::cli::Selection;
use crate::error::{CliError, CliResult};

/// Pods, secrets, configmaps and serviceaccounts.
pub const CORE_RESOURCES: &str = "group == '' && version == 'v1' && (resource in ['pods', 'secrets', 'configmaps', 'serviceaccounts'])";
/// Jobs and cronjobs.
pub const BATCH_RESOURCES: &str =
    "group == 'batch' && version == 'v1' && (resource in ['jobs', 'cronjobs'])";
/// Deployments, replicasets, daemonsets and statefulsets.
pub const APPS_RESOURCES: &str = "group == 'apps' && version == 'v1' && (resource in ['deployments', 'replicasets', 'daemonsets', 'statefulsets'])";
/// Roles and rolebindings.
pub const RBAC_RESOURCES: &str = "group == 'rbac.authorization.k8s.io' && version == 'v1' && (resource in ['roles', 'rolebindings'])";
/// Clusterroles and clusterrolebindings.
pub const CLUSTER_RBAC_RESOURCES: &str = "group == 'rbac.authorization.k8s.io' && version == 'v1' && (resource in ['clusterroles', 'clusterrolebindings'])";
/// Custom resource definitions.
pub const CRD_RESOURCES: &str = "group == 'apiextensions.k8s.io' && version == 'v1' && resource == 'customresourcedefinitions'";
/// Everything in the RBAC group that is namespaced.
pub const NAMESPACED_RBAC_RESOURCES: &str = "group == 'rbac.authorization.k8s.io' && version == 'v1' && !(resource in ['clusterrolebindings', 'clusterroles'])";
/// Namespace selection used when no namespace flag is given.
pub const DEFAULT_NAMESPACES: &str = "name != 'kube-system'";

/// The watch request payload: read verbatim from `stdin` when requested,
/// built from the selection flags otherwise.
///
/// # Errors
///
/// Returns an error if standard input cannot be read or the request cannot
/// be encoded.
pub fn watch_request_payload(selection: &Selection, mut stdin: impl Read) -> CliResult<Vec<u8>> {
    if selection.stdin {
        let mut payload = Vec::new();
        stdin.read_to_end(&mut payload).map_err(CliError::Stdin)?;
        return Ok(payload);
    }
    Ok(build_watch_request(selection).to_json()?)
}

/// Build the watch request for the selection flags.
///
/// Group flags come first, then the resource list. Without either, the
/// default queries are used.
#[must_use]
pub fn build_watch_request(selection: &Selection) -> WatchRequest {
    let mut queries = group_queries(selection);
    queries.extend(resource_query(&selection.resources));
    if queries.is_empty() {
        queries = default_queries();
    }
    WatchRequest {
        queries,
        namespaces: Some(namespaces(selection)),
        roots: None,
    }
}

/// Queries watched when no resource flag is given.
#[must_use]
pub fn default_queries() -> Vec<Query> {
    [CORE_RESOURCES, APPS_RESOURCES, BATCH_RESOURCES, NAMESPACED_RBAC_RESOURCES]
        .into_iter()
        .map(Query::include_resources)
        .collect()
}

fn group_queries(selection: &Selection) -> Vec<Query> {
    [
        (selection.core, CORE_RESOURCES),
        (selection.batch, BATCH_RESOURCES),
        (selection.apps, APPS_RESOURCES),
        (selection.rbac, RBAC_RESOURCES),
        (selection.cluster_rbac, CLUSTER_RBAC_RESOURCES),
        (selection.crd, CRD_RESOURCES),
    ]
    .into_iter()
    .filter(|(enabled, _)| *enabled)
    .map(|(_, expression)| Query::include_resources(expression))
    .collect()
}

/// A query including the named resources of any group.
fn resource_query(resources: &[String]) -> Option<Query> {
    if resources.is_empty() {
        return None;
    }
    let quoted: Vec<String> = resources.iter().map(|r| format!("'{r}'")).collect();
    Some(Query::include_resources(format!(
        "resource in [{}]",
        quoted.join(",")
    )))
}

fn namespaces(selection: &Selection) -> Namespaces {
    let Selection {
        namespaces,
        ns_label_selector,
        ns_field_selector,
        ns_expression,
        ..
    } = selection;
    if namespaces.is_empty()
        && ns_label_selector.is_none()
        && ns_field_selector.is_none()
        && ns_expression.is_none()
    {
        return Namespaces {
            object_selector_expression: DEFAULT_NAMESPACES.to_string(),
            ..Namespaces::default()
        };
    }
    Namespaces {
        names: namespaces.clone(),
        label_selector: ns_label_selector.clone().unwrap_or_default(),
        field_selector: ns_field_selector.clone().unwrap_or_default(),
        object_selector_expression: ns_expression.clone().unwrap_or_default(),
    }
}
