//! Graph vertices and arcs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Resource name of the core `Namespace` kind.
pub const NAMESPACES_RESOURCE: &str = "namespaces";

/// A node of the watched object graph.
///
/// Vertices are plain values: two vertices are the same object if all five
/// coordinates match, so they can be used directly as set and map keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Vertex {
    /// API group, empty for the core group.
    #[serde(rename = "g", default, skip_serializing_if = "String::is_empty")]
    pub group: String,
    /// API version.
    #[serde(rename = "v")]
    pub version: String,
    /// Plural resource name, e.g. `pods`.
    #[serde(rename = "r")]
    pub resource: String,
    /// Namespace, empty for cluster-scoped objects.
    #[serde(rename = "ns", default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    /// Object name.
    #[serde(rename = "n")]
    pub name: String,
}

impl Vertex {
    /// Create a cluster-scoped vertex.
    #[must_use]
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        resource: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            resource: resource.into(),
            namespace: String::new(),
            name: name.into(),
        }
    }

    /// Place the vertex in a namespace.
    #[must_use]
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// The vertex of the core/v1 `Namespace` object with the given name.
    #[must_use]
    pub fn namespace_object(name: impl Into<String>) -> Self {
        Self::new("", "v1", NAMESPACES_RESOURCE, name)
    }

    /// Whether this vertex is itself a `Namespace` object.
    #[must_use]
    pub fn is_namespace(&self) -> bool {
        self.group.is_empty() && self.resource == NAMESPACES_RESOURCE
    }

    /// Whether this vertex lives inside a namespace.
    #[must_use]
    pub fn is_namespaced(&self) -> bool {
        !self.namespace.is_empty()
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{} ns={} n={}",
            self.group, self.version, self.resource, self.namespace, self.name
        )
    }
}

/// Relation kind of an arc.
///
/// Unknown codes are preserved in [`ArcType::Other`] so that a newer server
/// never breaks decoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ArcType {
    /// The source lists the destination in its owner references.
    OwnerReference,
    /// The source references the destination by name (volumes, service accounts, ...).
    Reference,
    /// Relation derived transitively through other objects.
    Transitive,
    /// A relation code this client does not know about.
    Other(String),
}

impl ArcType {
    /// The wire code of this relation kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::OwnerReference => "or",
            Self::Reference => "r",
            Self::Transitive => "t",
            Self::Other(code) => code,
        }
    }
}

impl From<String> for ArcType {
    fn from(code: String) -> Self {
        match code.as_str() {
            "or" => Self::OwnerReference,
            "r" => Self::Reference,
            "t" => Self::Transitive,
            _ => Self::Other(code),
        }
    }
}

impl From<ArcType> for String {
    fn from(arc_type: ArcType) -> Self {
        match arc_type {
            ArcType::Other(code) => code,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ArcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed, typed edge between two vertices.
///
/// Arcs with the same endpoints but a different [`ArcType`] are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphArc {
    /// Source vertex.
    #[serde(rename = "s")]
    pub source: Vertex,
    /// Destination vertex.
    #[serde(rename = "d")]
    pub destination: Vertex,
    /// Relation kind.
    #[serde(rename = "t")]
    pub arc_type: ArcType,
}

impl GraphArc {
    /// Create a new arc.
    #[must_use]
    pub const fn new(source: Vertex, destination: Vertex, arc_type: ArcType) -> Self {
        Self {
            source,
            destination,
            arc_type,
        }
    }
}

/// Extra information attached to a set-arc action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcAttributes {
    /// The owner reference is the controller reference.
    #[serde(rename = "c", default, skip_serializing_if = "std::ops::Not::not")]
    pub controller: bool,
    /// The owner reference blocks deletion of the owner.
    #[serde(rename = "b", default, skip_serializing_if = "std::ops::Not::not")]
    pub block_owner_deletion: bool,
    /// The destination object does not exist (dangling reference).
    #[serde(rename = "e", default, skip_serializing_if = "std::ops::Not::not")]
    pub destination_missing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use test_case::test_case;

    fn pod(ns: &str, name: &str) -> Vertex {
        Vertex::new("", "v1", "pods", name).in_namespace(ns)
    }

    #[test]
    fn test_vertex_decode_omits_empty_group_and_namespace() {
        let v: Vertex =
            serde_json::from_str(r#"{"v":"v1","r":"nodes","n":"worker-1"}"#).unwrap();

        assert_eq!(v, Vertex::new("", "v1", "nodes", "worker-1"));
        assert!(!v.is_namespaced());
        assert_eq!(
            serde_json::to_string(&v).unwrap(),
            r#"{"v":"v1","r":"nodes","n":"worker-1"}"#
        );
    }

    #[test]
    fn test_vertex_decode_full() {
        let v: Vertex = serde_json::from_str(
            r#"{"g":"apps","v":"v1","r":"deployments","ns":"default","n":"web"}"#,
        )
        .unwrap();

        assert_eq!(v.group, "apps");
        assert_eq!(v.namespace, "default");
        assert!(v.is_namespaced());
        assert!(!v.is_namespace());
    }

    #[test_case("", "namespaces", true ; "core namespace")]
    #[test_case("example.com", "namespaces", false ; "custom resource named namespaces")]
    #[test_case("", "pods", false ; "core pod")]
    fn test_is_namespace(group: &str, resource: &str, expected: bool) {
        let v = Vertex::new(group, "v1", resource, "x");
        assert_eq!(v.is_namespace(), expected);
    }

    #[test]
    fn test_vertex_display() {
        assert_eq!(pod("default", "p1").to_string(), "/v1/pods ns=default n=p1");
    }

    #[test]
    fn test_vertex_structural_equality() {
        let mut set = HashSet::new();
        set.insert(pod("default", "p1"));
        set.insert(pod("default", "p1"));
        set.insert(pod("other", "p1"));

        assert_eq!(set.len(), 2);
    }

    #[test_case("or", ArcType::OwnerReference)]
    #[test_case("r", ArcType::Reference)]
    #[test_case("t", ArcType::Transitive)]
    #[test_case("xyz", ArcType::Other("xyz".into()))]
    fn test_arc_type_codes(code: &str, expected: ArcType) {
        let decoded: ArcType = serde_json::from_str(&format!("\"{code}\"")).unwrap();
        assert_eq!(decoded, expected);
        assert_eq!(decoded.as_str(), code);
    }

    #[test]
    fn test_arcs_differing_only_in_type_are_distinct() {
        let a = GraphArc::new(pod("ns", "a"), pod("ns", "b"), ArcType::OwnerReference);
        let b = GraphArc::new(pod("ns", "a"), pod("ns", "b"), ArcType::Reference);

        let set: HashSet<_> = [a.clone(), b, a].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_arc_attributes_default_when_absent() {
        let attrs: ArcAttributes = serde_json::from_str("{}").unwrap();
        assert_eq!(attrs, ArcAttributes::default());

        let attrs: ArcAttributes = serde_json::from_str(r#"{"c":true,"e":true}"#).unwrap();
        assert!(attrs.controller);
        assert!(!attrs.block_owner_deletion);
        assert!(attrs.destination_missing);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn arc_type_code_survives_decoding(code in "[a-z]{0,6}") {
                let decoded: ArcType = serde_json::from_value(serde_json::Value::String(code.clone())).unwrap();
                prop_assert_eq!(decoded.as_str(), code.as_str());
                prop_assert_eq!(String::from(decoded), code);
            }

            #[test]
            fn vertex_display_names_every_coordinate(
                group in "[a-z.]{0,8}",
                resource in "[a-z]{1,8}",
                ns in "[a-z-]{0,8}",
                name in "[a-z0-9-]{1,12}",
            ) {
                let v = Vertex::new(group.clone(), "v1", resource.clone(), name.clone()).in_namespace(ns.clone());
                prop_assert_eq!(v.to_string(), format!("{group}/v1/{resource} ns={ns} n={name}"));
            }
        }
    }
}
