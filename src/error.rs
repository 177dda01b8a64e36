use thiserror::Error;

use crate::graph::vertex::{ConnectorId, NodeId};

/// Contract violations raised back to the caller. The host keeps its own
/// mutation log consistent, so hitting one of these means the host is
/// feeding mutations out of order; there are no retry semantics.
///
/// Broken internal invariants (layering, path contiguity) are programming
/// defects, not contract violations, and panic instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("node {0:?} is already present")]
    DuplicateNode(NodeId),
    #[error("node {0:?} is not present")]
    UnknownNode(NodeId),
    #[error("node {0:?} still has connectors attached")]
    NodeStillConnected(NodeId),
    #[error("connector {0:?} is already present")]
    DuplicateConnector(ConnectorId),
    #[error("connector {0:?} is not present")]
    UnknownConnector(ConnectorId),
}
