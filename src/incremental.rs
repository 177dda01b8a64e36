use std::collections::BTreeMap;

use tracing::debug;

use crate::absolute::{self, LayoutSnapshot};
use crate::config::LayoutConfig;
use crate::error::LayoutError;
use crate::geometry::{Point, Route, Size};
use crate::graph::vertex::{ConnectorId, NodeId, PathId, Vertex, VertexId};
use crate::relative::RelativeLayout;

/// One change to the external diagram, in the order the host emitted it.
/// `AddNode` carries the priority the host's priority provider computed.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagramMutation {
    AddNode {
        node: NodeId,
        name: String,
        size: Size,
        priority: i32,
    },
    RemoveNode {
        node: NodeId,
    },
    ResizeNode {
        node: NodeId,
        size: Size,
    },
    AddConnector {
        connector: ConnectorId,
        source: NodeId,
        target: NodeId,
    },
    RemoveConnector {
        connector: ConnectorId,
    },
    Clear,
}

/// One observable layout effect, carrying enough data for the rendering
/// collaborator to animate the transition. Ephemeral: recomputed per
/// batch, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutAction {
    AddNode {
        node: NodeId,
    },
    RemoveNode {
        node: NodeId,
    },
    AddConnector {
        connector: ConnectorId,
    },
    RemoveConnector {
        connector: ConnectorId,
    },
    MoveNode {
        node: NodeId,
        old_center: Point,
        new_center: Point,
    },
    RerouteConnector {
        connector: ConnectorId,
        old_route: Route,
        new_route: Route,
    },
    Clear,
}

/// Stateful façade over the whole pipeline: applies diagram mutations to
/// the relative layout, recomputes the absolute layout, and diffs against
/// the previously emitted snapshot so only real changes are reported.
///
/// The absolute stage is recomputed in full every batch; the diff being
/// minimal relies on its output being deterministic for a given topology,
/// which is why every internal map is ordered.
#[derive(Debug, Default)]
pub struct IncrementalLayoutCalculator {
    config: LayoutConfig,
    relative: RelativeLayout,
    vertex_of: BTreeMap<NodeId, VertexId>,
    node_of: BTreeMap<VertexId, NodeId>,
    path_of: BTreeMap<ConnectorId, PathId>,
    previous: LayoutSnapshot,
}

impl IncrementalLayoutCalculator {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Applies the queued mutations in order, recomputes the absolute
    /// layout once, and returns the actions needed to reconcile the view:
    /// the structural action per mutation, one `MoveNode` per node whose
    /// center moved beyond tolerance, one `RerouteConnector` per connector
    /// whose route changed. Undefined old or new positions never produce
    /// actions.
    pub fn calculate_layout_actions(
        &mut self,
        mutations: &[DiagramMutation],
    ) -> Result<Vec<LayoutAction>, LayoutError> {
        let mut actions = Vec::with_capacity(mutations.len());
        for mutation in mutations {
            if let Some(action) = self.apply(mutation)? {
                actions.push(action);
            }
        }

        let snapshot = absolute::calculate(&self.relative, &self.config);
        let tolerance = self.config.position_tolerance;

        for (&vertex, &new_center) in &snapshot.centers {
            let Some(&node) = self.node_of.get(&vertex) else {
                continue; // dummies move silently with their routes
            };
            if !new_center.is_defined() {
                continue;
            }
            let old_center = self
                .previous
                .centers
                .get(&vertex)
                .copied()
                .unwrap_or(Point::UNDEFINED);
            if !old_center.approx_eq(&new_center, tolerance) {
                actions.push(LayoutAction::MoveNode {
                    node,
                    old_center,
                    new_center,
                });
            }
        }
        for (&path, new_route) in &snapshot.routes {
            if !new_route.is_defined() {
                continue;
            }
            let connector = self.relative.graph().path(path).connector;
            let old_route = self
                .previous
                .routes
                .get(&path)
                .cloned()
                .unwrap_or_default();
            if !old_route.approx_eq(new_route, tolerance) {
                actions.push(LayoutAction::RerouteConnector {
                    connector,
                    old_route,
                    new_route: new_route.clone(),
                });
            }
        }

        debug!(
            mutations = mutations.len(),
            actions = actions.len(),
            "batch reconciled"
        );
        self.previous = snapshot;
        Ok(actions)
    }

    fn apply(&mut self, mutation: &DiagramMutation) -> Result<Option<LayoutAction>, LayoutError> {
        match mutation {
            DiagramMutation::AddNode {
                node,
                name,
                size,
                priority,
            } => {
                if self.vertex_of.contains_key(node) {
                    return Err(LayoutError::DuplicateNode(*node));
                }
                let vertex = self
                    .relative
                    .add_vertex(Vertex::original(*node, name.clone(), *size, *priority));
                self.vertex_of.insert(*node, vertex);
                self.node_of.insert(vertex, *node);
                Ok(Some(LayoutAction::AddNode { node: *node }))
            }
            DiagramMutation::RemoveNode { node } => {
                let vertex = self.vertex(*node)?;
                let attached = self
                    .relative
                    .graph()
                    .paths()
                    .any(|(_, p)| p.source == vertex || p.target == vertex);
                if attached {
                    return Err(LayoutError::NodeStillConnected(*node));
                }
                self.relative.remove_vertex(vertex);
                self.vertex_of.remove(node);
                self.node_of.remove(&vertex);
                Ok(Some(LayoutAction::RemoveNode { node: *node }))
            }
            DiagramMutation::ResizeNode { node, size } => {
                let vertex = self.vertex(*node)?;
                self.relative.resize_vertex(vertex, *size);
                // No structural effect; the diff picks up any fallout.
                Ok(None)
            }
            DiagramMutation::AddConnector {
                connector,
                source,
                target,
            } => {
                if self.path_of.contains_key(connector) {
                    return Err(LayoutError::DuplicateConnector(*connector));
                }
                let source = self.vertex(*source)?;
                let target = self.vertex(*target)?;
                let path = self.relative.add_path(*connector, source, target);
                self.path_of.insert(*connector, path);
                Ok(Some(LayoutAction::AddConnector {
                    connector: *connector,
                }))
            }
            DiagramMutation::RemoveConnector { connector } => {
                let path = self
                    .path_of
                    .remove(connector)
                    .ok_or(LayoutError::UnknownConnector(*connector))?;
                self.relative.remove_path(path);
                Ok(Some(LayoutAction::RemoveConnector {
                    connector: *connector,
                }))
            }
            DiagramMutation::Clear => {
                self.relative = RelativeLayout::new();
                self.vertex_of.clear();
                self.node_of.clear();
                self.path_of.clear();
                self.previous = LayoutSnapshot::default();
                Ok(Some(LayoutAction::Clear))
            }
        }
    }

    fn vertex(&self, node: NodeId) -> Result<VertexId, LayoutError> {
        self.vertex_of
            .get(&node)
            .copied()
            .ok_or(LayoutError::UnknownNode(node))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.vertex_of.keys().copied()
    }

    pub fn connector_ids(&self) -> impl Iterator<Item = ConnectorId> + '_ {
        self.path_of.keys().copied()
    }

    pub fn node_name(&self, node: NodeId) -> Option<&str> {
        let vertex = *self.vertex_of.get(&node)?;
        self.relative.graph().vertex(vertex).name()
    }

    /// (layer index, index within layer) from the relative layout.
    pub fn node_location(&self, node: NodeId) -> Option<(usize, usize)> {
        let vertex = *self.vertex_of.get(&node)?;
        self.relative.location(vertex)
    }

    /// Center as of the last emitted snapshot.
    pub fn node_center(&self, node: NodeId) -> Option<Point> {
        let vertex = *self.vertex_of.get(&node)?;
        self.previous.centers.get(&vertex).copied()
    }

    pub fn node_size(&self, node: NodeId) -> Option<Size> {
        let vertex = *self.vertex_of.get(&node)?;
        Some(self.relative.graph().vertex(vertex).size)
    }

    /// Route as of the last emitted snapshot.
    pub fn connector_route(&self, connector: ConnectorId) -> Option<&Route> {
        let path = *self.path_of.get(&connector)?;
        self.previous.routes.get(&path)
    }

    /// Number of graph edges the connector's path currently spans
    /// (1 + interim dummy count).
    pub fn connector_path_length(&self, connector: ConnectorId) -> Option<usize> {
        let path = *self.path_of.get(&connector)?;
        Some(self.relative.graph().path(path).len())
    }
}
