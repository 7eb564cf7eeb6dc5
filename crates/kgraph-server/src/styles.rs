//! Naming and styling of graph elements in the diagram.
//!
//! Every object is a shape keyed by `group/resource/name`. Namespaced objects
//! are nested inside a container shape keyed `/namespaces/<ns>`, so the
//! namespace appears as a box around its members. Shapes and connections are
//! tagged with a class derived from their kind; the classes themselves are
//! defined once, up front, by [`global_styles`].

use kgraph_diagram::{quote, shape_key};
use kgraph_proto::{ArcType, GraphArc, Vertex, NAMESPACES_RESOURCE};

/// Bare key of the container shape for a namespace.
#[must_use]
pub fn namespace_key(namespace: &str) -> String {
    format!("/{NAMESPACES_RESOURCE}/{namespace}")
}

/// Bare key of the shape for a vertex, without its namespace.
#[must_use]
pub fn bare_key(vertex: &Vertex) -> String {
    format!("{}/{}/{}", vertex.group, vertex.resource, vertex.name)
}

/// Full diagram key of the shape drawn for a vertex.
///
/// A `Namespace` object shares the container shape of the namespace it names.
#[must_use]
pub fn vertex_key(vertex: &Vertex) -> String {
    if vertex.is_namespace() {
        quote(&namespace_key(&vertex.name))
    } else if vertex.is_namespaced() {
        shape_key(&[namespace_key(&vertex.namespace), bare_key(vertex)])
    } else {
        quote(&bare_key(vertex))
    }
}

/// Diagram key used to create the connection drawn for an arc.
#[must_use]
pub fn arc_key(arc: &GraphArc) -> String {
    format!("{} -> {}", vertex_key(&arc.source), vertex_key(&arc.destination))
}

/// Class of shapes for objects of the given group and resource.
#[must_use]
pub fn class_for_group_resource(group: &str, resource: &str) -> String {
    format!("{group}_{resource}")
}

/// Class of the shape drawn for a vertex.
#[must_use]
pub fn class_for_vertex(vertex: &Vertex) -> String {
    class_for_group_resource(&vertex.group, &vertex.resource)
}

/// Class of the connection drawn for an arc of the given type.
#[must_use]
pub fn class_for_arc(arc_type: &ArcType) -> String {
    format!("arc_{arc_type}")
}

/// Tooltip shown for a vertex shape.
#[must_use]
pub fn tooltip_for_vertex(vertex: &Vertex) -> String {
    format!("{}/{}", vertex.group, vertex.resource)
}

/// Fill colors for well known kinds.
const KIND_FILLS: &[(&str, &str, &str)] = &[
    ("", NAMESPACES_RESOURCE, "#f4f6fb"),
    ("", "pods", "#dbeafe"),
    ("", "services", "#e0f2fe"),
    ("", "endpoints", "#e0f2fe"),
    ("", "configmaps", "#dcfce7"),
    ("", "secrets", "#fef3c7"),
    ("", "serviceaccounts", "#ede9fe"),
    ("", "persistentvolumeclaims", "#fae8ff"),
    ("", "persistentvolumes", "#fae8ff"),
    ("", "nodes", "#e5e7eb"),
    ("apps", "deployments", "#bfdbfe"),
    ("apps", "replicasets", "#c7d2fe"),
    ("apps", "statefulsets", "#bfdbfe"),
    ("apps", "daemonsets", "#bfdbfe"),
    ("batch", "jobs", "#fed7aa"),
    ("batch", "cronjobs", "#fdba74"),
    ("rbac.authorization.k8s.io", "roles", "#fecaca"),
    ("rbac.authorization.k8s.io", "rolebindings", "#fee2e2"),
    ("rbac.authorization.k8s.io", "clusterroles", "#fecaca"),
    ("rbac.authorization.k8s.io", "clusterrolebindings", "#fee2e2"),
    ("apiextensions.k8s.io", "customresourcedefinitions", "#f5f5f4"),
];

/// Stroke color, stroke dash and width for each known arc type code.
const ARC_STROKES: &[(&str, &str, &str, &str)] = &[
    ("or", "#1d4ed8", "0", "2"),
    ("r", "#7c3aed", "4", "1"),
    ("t", "#9ca3af", "2", "1"),
];

/// Attribute assignments defining the class styles, as `(path, value)` pairs.
///
/// Applied once to a fresh diagram before any object is drawn.
#[must_use]
pub fn global_styles() -> Vec<(String, String)> {
    let mut styles = Vec::new();
    for (group, resource, fill) in KIND_FILLS {
        let class = quote(&class_for_group_resource(group, resource));
        styles.push((format!("classes.{class}.style.fill"), (*fill).to_string()));
    }
    let namespace_class = quote(&class_for_group_resource("", NAMESPACES_RESOURCE));
    styles.push((
        format!("classes.{namespace_class}.style.stroke-dash"),
        "3".to_string(),
    ));
    for (code, stroke, dash, width) in ARC_STROKES {
        let class = quote(&class_for_arc(&ArcType::from((*code).to_string())));
        styles.push((format!("classes.{class}.style.stroke"), (*stroke).to_string()));
        styles.push((format!("classes.{class}.style.stroke-dash"), (*dash).to_string()));
        styles.push((format!("classes.{class}.style.stroke-width"), (*width).to_string()));
    }
    styles
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgraph_diagram::DiagramSource;
    use test_case::test_case;

    fn pod(ns: &str, name: &str) -> Vertex {
        Vertex::new("", "v1", "pods", name).in_namespace(ns)
    }

    #[test_case(Vertex::new("", "v1", "nodes", "n1"), r#""/nodes/n1""# ; "cluster scoped core")]
    #[test_case(
        Vertex::new("rbac.authorization.k8s.io", "v1", "clusterroles", "admin"),
        r#""rbac.authorization.k8s.io/clusterroles/admin""#
        ; "cluster scoped grouped"
    )]
    #[test_case(pod("default", "web-1"), r#""/namespaces/default"."/pods/web-1""# ; "namespaced")]
    #[test_case(Vertex::namespace_object("kube-public"), r#""/namespaces/kube-public""# ; "namespace object")]
    fn test_vertex_key(vertex: Vertex, expected: &str) {
        assert_eq!(vertex_key(&vertex), expected);
    }

    #[test_case("", "pods", "_pods" ; "core group")]
    #[test_case("apps", "deployments", "apps_deployments" ; "named group")]
    fn test_class_for_group_resource(group: &str, resource: &str, expected: &str) {
        assert_eq!(class_for_group_resource(group, resource), expected);
    }

    #[test_case(ArcType::OwnerReference, "arc_or" ; "owner reference")]
    #[test_case(ArcType::Reference, "arc_r" ; "reference")]
    #[test_case(ArcType::Transitive, "arc_t" ; "transitive")]
    #[test_case(ArcType::Other("x".into()), "arc_x" ; "unknown")]
    fn test_class_for_arc(arc_type: ArcType, expected: &str) {
        assert_eq!(class_for_arc(&arc_type), expected);
    }

    #[test]
    fn test_arc_key() {
        let arc = GraphArc::new(
            pod("default", "web-1"),
            Vertex::new("", "v1", "nodes", "n1"),
            ArcType::Reference,
        );
        assert_eq!(
            arc_key(&arc),
            r#""/namespaces/default"."/pods/web-1" -> "/nodes/n1""#
        );
    }

    #[test]
    fn test_tooltip() {
        let deployment = Vertex::new("apps", "v1", "deployments", "web").in_namespace("default");
        assert_eq!(tooltip_for_vertex(&deployment), "apps/deployments");
    }

    #[test]
    fn test_global_styles_apply_cleanly() {
        let mut source = DiagramSource::new();
        for (path, value) in global_styles() {
            source.set(&path, value).unwrap();
        }

        let classes = source.classes();
        assert_eq!(classes["_pods"]["style.fill"], "#dbeafe");
        assert_eq!(classes["rbac.authorization.k8s.io_roles"]["style.fill"], "#fecaca");
        assert_eq!(classes["arc_or"]["style.stroke"], "#1d4ed8");
        assert_eq!(classes["_namespaces"]["style.stroke-dash"], "3");
    }
}
