//! Graph mutation actions.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::vertex::{ArcAttributes, GraphArc, Vertex};

/// One incremental mutation of the object graph.
///
/// On the wire each action is an object with one of the keys `svx`, `dvx`,
/// `sarc` or `darc`. An object with none of them decodes as
/// [`Action::Unknown`] so that newer servers can add action kinds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Action {
    /// A vertex was added or updated.
    #[serde(rename = "svx")]
    SetVertex(SetVertex),
    /// A vertex was removed.
    #[serde(rename = "dvx")]
    DeleteVertex(DeleteVertex),
    /// An arc was added or updated.
    #[serde(rename = "sarc")]
    SetArc(SetArc),
    /// An arc was removed.
    #[serde(rename = "darc")]
    DeleteArc(DeleteArc),
    /// An action of a kind this client does not know, with the keys it carried.
    #[serde(skip_serializing)]
    Unknown(Vec<String>),
}

impl Action {
    /// Convenience constructor for a set-vertex action without object data.
    #[must_use]
    pub const fn set_vertex(vertex: Vertex) -> Self {
        Self::SetVertex(SetVertex {
            vertex,
            object: None,
            json_path: None,
        })
    }

    /// Convenience constructor for a delete-vertex action.
    #[must_use]
    pub const fn delete_vertex(vertex: Vertex) -> Self {
        Self::DeleteVertex(DeleteVertex { vertex })
    }

    /// Convenience constructor for a set-arc action with default attributes.
    #[must_use]
    pub fn set_arc(arc: GraphArc) -> Self {
        Self::SetArc(SetArc {
            arc,
            attributes: ArcAttributes::default(),
        })
    }

    /// Convenience constructor for a delete-arc action.
    #[must_use]
    pub const fn delete_arc(arc: GraphArc) -> Self {
        Self::DeleteArc(DeleteArc { arc })
    }
}

/// Wire envelope: every kind is optional, the first one present wins.
#[derive(Deserialize)]
struct RawAction {
    svx: Option<SetVertex>,
    dvx: Option<DeleteVertex>,
    sarc: Option<SetArc>,
    darc: Option<DeleteArc>,
    #[serde(flatten)]
    other: Map<String, Value>,
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawAction::deserialize(deserializer)?;
        Ok(if let Some(sv) = raw.svx {
            Self::SetVertex(sv)
        } else if let Some(dv) = raw.dvx {
            Self::DeleteVertex(dv)
        } else if let Some(sa) = raw.sarc {
            Self::SetArc(sa)
        } else if let Some(da) = raw.darc {
            Self::DeleteArc(da)
        } else {
            Self::Unknown(raw.other.keys().cloned().collect())
        })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetVertex(sv) => write!(f, "Set Vertex {}", sv.vertex),
            Self::DeleteVertex(dv) => write!(f, "Delete Vertex {}", dv.vertex),
            Self::SetArc(sa) => write!(f, "Set Arc ({})->({})", sa.arc.source, sa.arc.destination),
            Self::DeleteArc(da) => {
                write!(f, "Delete Arc ({})->({})", da.arc.source, da.arc.destination)
            }
            Self::Unknown(kinds) => write!(f, "Unknown Action [{}]", kinds.join(", ")),
        }
    }
}

/// Payload of a set-vertex action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetVertex {
    /// The vertex.
    #[serde(rename = "vx")]
    pub vertex: Vertex,
    /// The object itself, if the watch request asked for it.
    #[serde(rename = "o", default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Map<String, Value>>,
    /// Results of the JSON path query, if the watch request had one.
    #[serde(rename = "j", default, skip_serializing_if = "Option::is_none")]
    pub json_path: Option<Vec<Value>>,
}

/// Payload of a delete-vertex action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteVertex {
    /// The vertex.
    #[serde(rename = "vx")]
    pub vertex: Vertex,
}

/// Payload of a set-arc action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetArc {
    /// The arc.
    #[serde(flatten)]
    pub arc: GraphArc,
    /// Arc attributes.
    #[serde(rename = "a", default)]
    pub attributes: ArcAttributes,
}

/// Payload of a delete-arc action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteArc {
    /// The arc.
    #[serde(flatten)]
    pub arc: GraphArc,
}
