//! The watch request sent as the first frame of the stream.
//!
//! Selection is expressed with [CEL](https://cel.dev/) expressions evaluated by
//! the server, plus Kubernetes label and field selectors.

use serde::{Deserialize, Serialize};

use crate::error::ProtoError;

/// Top level watch request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchRequest {
    /// Resource queries; an object is watched if any query includes it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub queries: Vec<Query>,
    /// Namespace selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<Namespaces>,
    /// Root objects to start the graph from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roots: Option<Roots>,
}

impl WatchRequest {
    /// Encode the request as the JSON payload of the first frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Encoding`] if serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>, ProtoError> {
        serde_json::to_vec(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }
}

/// A single include/exclude query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// What to include.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<QueryInclude>,
    /// What to exclude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<QueryExclude>,
}

impl Query {
    /// A query including every resource matched by a CEL expression.
    #[must_use]
    pub fn include_resources(expression: impl Into<String>) -> Self {
        Self {
            include: Some(QueryInclude {
                resource_selector_expression: expression.into(),
                object: None,
            }),
            exclude: None,
        }
    }
}

/// Inclusion criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryInclude {
    /// CEL expression over discovery information.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_selector_expression: String,
    /// Per-object filtering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<QueryIncludeObject>,
}

/// Per-object filtering for included resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryIncludeObject {
    /// Kubernetes label selector.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label_selector: String,
    /// Kubernetes field selector.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub field_selector: String,
    /// CEL expression over the object.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub object_selector_expression: String,
    /// JSON path to extract from matching objects.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub json_path: String,
}

/// Exclusion criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryExclude {
    /// CEL expression over discovery information.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_selector_expression: String,
}

/// Namespace selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespaces {
    /// Explicit namespace names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
    /// Label selector over `Namespace` objects.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label_selector: String,
    /// Field selector over `Namespace` objects.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub field_selector: String,
    /// CEL expression over `Namespace` objects.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub object_selector_expression: String,
}

/// Root objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roots {
    /// Individually named roots.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub individual: Vec<RootsIndividual>,
    /// Roots matched by selectors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selector: Vec<RootsSelector>,
}

/// One named root object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootsIndividual {
    /// API group.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
    /// Resource.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource: String,
    /// Namespace.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    /// Name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

/// Root objects matched by selectors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootsSelector {
    /// API group.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
    /// Resource.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource: String,
    /// Label selector.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label_selector: String,
    /// Field selector.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub field_selector: String,
}
