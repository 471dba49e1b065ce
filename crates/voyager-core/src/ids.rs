//! Identifiers for rendered graph elements.
//!
//! Node and edge ids are plain strings with a composite encoding:
//!
//! ```text
//! TYPE::User                 a type node
//! FIELD_EDGE::Query::user    an edge owned by the `Query` type
//! Query.user                 short edge form, owned by `Query`
//! ```
//!
//! The owning node of an edge is always recoverable from the edge id alone.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between segments of a canonical id.
pub const ID_SEPARATOR: &str = "::";

/// Kind prefix for type nodes.
pub const TYPE_KIND: &str = "TYPE";

/// Kind prefix for field edges.
pub const FIELD_EDGE_KIND: &str = "FIELD_EDGE";

/// Identifier of a type node in the rendered graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Canonical node id for a named type.
    pub fn for_type(type_name: &str) -> Self {
        Self(format!("{TYPE_KIND}{ID_SEPARATOR}{type_name}"))
    }

    /// The type name this id refers to, if it uses the canonical encoding.
    pub fn type_name(&self) -> Option<&str> {
        self.0
            .strip_prefix(TYPE_KIND)
            .and_then(|rest| rest.strip_prefix(ID_SEPARATOR))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier of a field edge in the rendered graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Canonical edge id for `owner.field`.
    pub fn for_field(owner: &str, field: &str) -> Self {
        Self(format!(
            "{FIELD_EDGE_KIND}{ID_SEPARATOR}{owner}{ID_SEPARATOR}{field}"
        ))
    }

    /// Derive the node that owns this edge.
    ///
    /// Total over every string: canonical ids map to `TYPE::<owner>`, short
    /// `Owner.field` ids map to `Owner`, and anything else is its own owner.
    pub fn owner_node(&self) -> NodeId {
        let id = self.0.as_str();

        let mut segments = id.split(ID_SEPARATOR);
        if let (Some(_kind), Some(owner)) = (segments.next(), segments.next()) {
            return NodeId::for_type(owner);
        }

        match id.split_once('.') {
            Some((owner, _field)) => NodeId::new(owner),
            None => NodeId::new(id),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier of a scalar shown in the side panel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScalarId(pub String);

impl ScalarId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}
