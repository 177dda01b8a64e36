use serde::Serialize;

use crate::geometry::Size;

/// Identity of an external diagram node. Opaque to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub u64);

/// Identity of an external diagram connector. Opaque to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ConnectorId(pub u64);

/// Arena key of a layout vertex. Stable for the vertex's lifetime and
/// never reused within one graph instance, so stale keys cannot alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct VertexId(pub(crate) u32);

/// Arena key of a path (one external connector's chain of graph edges).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PathId(pub(crate) u32);

/// What a layout vertex stands for: a real diagram node, or a synthetic
/// waypoint inserted so that some path spans exactly one layer per edge.
#[derive(Debug, Clone, PartialEq)]
pub enum VertexKind {
    Original { node: NodeId, name: String },
    Dummy { path: PathId },
}

#[derive(Debug, Clone)]
pub struct Vertex {
    pub kind: VertexKind,
    pub size: Size,
    /// Tie-break for sibling ordering, supplied by the host's priority
    /// provider. Dummies inherit 0 and never win ties on it.
    pub priority: i32,
}

impl Vertex {
    pub fn original(node: NodeId, name: impl Into<String>, size: Size, priority: i32) -> Self {
        Self {
            kind: VertexKind::Original {
                node,
                name: name.into(),
            },
            size,
            priority,
        }
    }

    pub fn dummy(path: PathId) -> Self {
        Self {
            kind: VertexKind::Dummy { path },
            size: Size::ZERO,
            priority: 0,
        }
    }

    pub fn is_dummy(&self) -> bool {
        matches!(self.kind, VertexKind::Dummy { .. })
    }

    pub fn node(&self) -> Option<NodeId> {
        match self.kind {
            VertexKind::Original { node, .. } => Some(node),
            VertexKind::Dummy { .. } => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            VertexKind::Original { name, .. } => Some(name),
            VertexKind::Dummy { .. } => None,
        }
    }
}
