//! Incremental construction of the diagram from graph mutations.

use std::collections::{HashMap, HashSet};

use kgraph_diagram::{DiagramResult, DiagramSource};
use kgraph_proto::{Action, ArcAttributes, GraphArc, Vertex};
use tracing::{debug, info};

use crate::styles::{
    arc_key, class_for_arc, class_for_group_resource, class_for_vertex, global_styles,
    namespace_key, tooltip_for_vertex, vertex_key,
};

/// Keeps a [`DiagramSource`] in sync with the upstream object graph.
///
/// A namespace container is drawn while at least one object in it is known,
/// or while the `Namespace` object itself is known. Arcs implicitly draw
/// their endpoints.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    source: DiagramSource,
    objects_per_namespace: HashMap<String, u32>,
    known_vertices: HashSet<Vertex>,
    arc_keys: HashMap<GraphArc, String>,
}

impl GraphBuilder {
    /// Create a builder whose diagram holds only the class styles.
    ///
    /// # Errors
    ///
    /// Returns an error if a style assignment is rejected by the diagram.
    pub fn new() -> DiagramResult<Self> {
        let mut source = DiagramSource::new();
        for (path, value) in global_styles() {
            source.set(&path, value)?;
        }
        Ok(Self {
            source,
            objects_per_namespace: HashMap::new(),
            known_vertices: HashSet::new(),
            arc_keys: HashMap::new(),
        })
    }

    /// Apply a batch of mutations in order.
    ///
    /// Stops at the first failing mutation; earlier ones stay applied.
    /// Actions of unknown kinds are skipped.
    ///
    /// # Errors
    ///
    /// Returns the diagram error of the failing mutation.
    pub fn apply_actions(&mut self, actions: &[Action]) -> DiagramResult<()> {
        for action in actions {
            if let Action::Unknown(kinds) = action {
                debug!(?kinds, "Skipping action of unknown kind");
                continue;
            }
            info!("{action}");
            match action {
                Action::SetVertex(set) => self.ensure_vertex(&set.vertex)?,
                Action::DeleteVertex(delete) => self.delete_vertex(&delete.vertex)?,
                Action::SetArc(set) => self.set_arc(&set.arc, &set.attributes)?,
                Action::DeleteArc(delete) => self.delete_arc(&delete.arc)?,
                Action::Unknown(_) => {}
            }
        }
        Ok(())
    }

    /// Draw a vertex (and its namespace container) unless already known.
    ///
    /// # Errors
    ///
    /// Returns an error if the diagram rejects the new shape.
    pub fn ensure_vertex(&mut self, vertex: &Vertex) -> DiagramResult<()> {
        if self.known_vertices.contains(vertex) {
            return Ok(());
        }
        if vertex.is_namespace() {
            self.ensure_namespace(&vertex.name)?;
        } else if vertex.is_namespaced() {
            self.ensure_namespace(&vertex.namespace)?;
            self.draw_vertex(vertex)?;
            *self
                .objects_per_namespace
                .entry(vertex.namespace.clone())
                .or_default() += 1;
        } else {
            self.draw_vertex(vertex)?;
        }
        self.known_vertices.insert(vertex.clone());
        Ok(())
    }

    /// Remove a vertex, and its namespace container once nothing keeps it.
    ///
    /// Connections touching the vertex disappear with its shape, but their
    /// arcs stay recorded until deleted explicitly. Unknown vertices are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the diagram rejects the deletion.
    pub fn delete_vertex(&mut self, vertex: &Vertex) -> DiagramResult<()> {
        if !self.known_vertices.remove(vertex) {
            debug!(vertex = %vertex, "Ignoring deletion of unknown vertex");
            return Ok(());
        }
        if vertex.is_namespace() {
            if !self.is_namespace_populated(&vertex.name) {
                self.source.delete(&vertex_key(vertex))?;
            }
            return Ok(());
        }
        self.source.delete(&vertex_key(vertex))?;
        if vertex.is_namespaced() {
            let remaining = match self.objects_per_namespace.get_mut(&vertex.namespace) {
                Some(count) => {
                    *count = count.saturating_sub(1);
                    *count
                }
                None => 0,
            };
            if remaining == 0 {
                self.objects_per_namespace.remove(&vertex.namespace);
                if !self.is_namespace_object_known(&vertex.namespace) {
                    self.source.delete(&namespace_container(&vertex.namespace))?;
                }
            }
        }
        Ok(())
    }

    /// Draw an arc, drawing its endpoints first. Known arcs are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the diagram rejects a shape or the connection.
    pub fn set_arc(&mut self, arc: &GraphArc, _attributes: &ArcAttributes) -> DiagramResult<()> {
        if self.arc_keys.contains_key(arc) {
            return Ok(());
        }
        self.ensure_vertex(&arc.source)?;
        self.ensure_vertex(&arc.destination)?;
        let key = self.source.create(&arc_key(arc))?;
        self.source
            .set(&format!("{key}.class"), class_for_arc(&arc.arc_type))?;
        self.arc_keys.insert(arc.clone(), key);
        Ok(())
    }

    /// Remove the connection drawn for an arc. Endpoints stay in place, even
    /// when nothing else connects them.
    ///
    /// An arc whose endpoint was deleted keeps its key, and the diagram may
    /// since have issued that key to another arc between the same endpoints.
    /// The connection is then left to its current owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the diagram rejects the deletion.
    pub fn delete_arc(&mut self, arc: &GraphArc) -> DiagramResult<()> {
        match self.arc_keys.remove(arc) {
            Some(key) if self.arc_keys.values().any(|k| *k == key) => {
                debug!(key = %key, "Connection key reissued to another arc, keeping it");
                Ok(())
            }
            Some(key) => self.source.delete(&key),
            None => {
                debug!(
                    source = %arc.source,
                    destination = %arc.destination,
                    "Ignoring deletion of unknown arc"
                );
                Ok(())
            }
        }
    }

    /// Canonical source text of the current diagram.
    #[must_use]
    pub fn snapshot(&self) -> String {
        self.source.format()
    }

    /// The diagram being built.
    #[must_use]
    pub const fn source(&self) -> &DiagramSource {
        &self.source
    }

    /// Whether a vertex has been drawn and not deleted since.
    #[must_use]
    pub fn is_known(&self, vertex: &Vertex) -> bool {
        self.known_vertices.contains(vertex)
    }

    /// Number of known non-namespace objects in a namespace.
    #[must_use]
    pub fn objects_in_namespace(&self, namespace: &str) -> u32 {
        self.objects_per_namespace
            .get(namespace)
            .copied()
            .unwrap_or(0)
    }

    /// Diagram key of the connection drawn for an arc.
    #[must_use]
    pub fn arc_connection_key(&self, arc: &GraphArc) -> Option<&str> {
        self.arc_keys.get(arc).map(String::as_str)
    }

    fn is_namespace_populated(&self, namespace: &str) -> bool {
        self.objects_in_namespace(namespace) > 0
    }

    fn is_namespace_object_known(&self, namespace: &str) -> bool {
        self.known_vertices
            .contains(&Vertex::namespace_object(namespace))
    }

    fn ensure_namespace(&mut self, namespace: &str) -> DiagramResult<()> {
        if self.is_namespace_populated(namespace) || self.is_namespace_object_known(namespace) {
            return Ok(());
        }
        let key = self.source.create(&namespace_container(namespace))?;
        self.source.set(&format!("{key}.label"), namespace)?;
        self.source.set(
            &format!("{key}.class"),
            class_for_group_resource("", kgraph_proto::NAMESPACES_RESOURCE),
        )?;
        Ok(())
    }

    fn draw_vertex(&mut self, vertex: &Vertex) -> DiagramResult<()> {
        let key = self.source.create(&vertex_key(vertex))?;
        self.source.set(&format!("{key}.label"), vertex.name.as_str())?;
        self.source
            .set(&format!("{key}.class"), class_for_vertex(vertex))?;
        self.source
            .set(&format!("{key}.tooltip"), tooltip_for_vertex(vertex))?;
        Ok(())
    }
}

fn namespace_container(namespace: &str) -> String {
    kgraph_diagram::quote(&namespace_key(namespace))
}
